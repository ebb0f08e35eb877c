//! Error types.

use std::fmt;

/// Why an encoding name could not be turned into a usable codepage.
///
/// Neither variant is retryable: the caller has to pick another name or
/// accept direct-to-font mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// Nothing in the catalog or the host matches the name.
    UnknownEncodingName { name: String },
    /// The host knows the codepage but it is multi-byte.
    UnsupportedMultiByteEncoding { name: String, codepage: u16 },
}

impl EncodingError {
    /// Legacy numeric identifier (`-2` unknown, `-3` multi-byte).
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::UnknownEncodingName { .. } => -2,
            Self::UnsupportedMultiByteEncoding { .. } => -3,
        }
    }

    /// The name the caller asked for.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::UnknownEncodingName { name } | Self::UnsupportedMultiByteEncoding { name, .. } => {
                name
            }
        }
    }
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownEncodingName { name } => write!(f, "unknown encoding name {name:?}"),
            Self::UnsupportedMultiByteEncoding { name, codepage } => write!(
                f,
                "encoding {name:?} (codepage {codepage}) is multi-byte and cannot be used"
            ),
        }
    }
}

impl std::error::Error for EncodingError {}

/// Malformed configuration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { key, value } => write!(f, "invalid value {value:?} for {key}"),
        }
    }
}

impl std::error::Error for ConfigError {}
