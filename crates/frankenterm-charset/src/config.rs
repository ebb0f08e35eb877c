//! Encoding configuration.
//!
//! The charset name is the only persisted artifact; the font fields describe
//! whatever font the renderer loaded.

use crate::error::ConfigError;
use crate::resolver::CodepageId;

/// Environment variable holding the line charset name.
pub const ENV_CHARSET: &str = "FTERM_CHARSET";
/// Environment variable holding the font codepage (decimal, may be negative).
pub const ENV_FONT_CODEPAGE: &str = "FTERM_FONT_CODEPAGE";
/// Environment variable marking the font as double-byte (`1/0/true/false`).
pub const ENV_DBCS_FONT: &str = "FTERM_DBCS_FONT";

/// User encoding settings plus the loaded font's properties.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EncodingConfig {
    /// Line charset name. Empty means "infer from the system locale".
    pub charset: String,
    /// Codepage of the loaded font.
    pub font_codepage: CodepageId,
    /// Whether the loaded font is double-byte.
    pub dbcs_font: bool,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            charset: String::new(),
            font_codepage: CodepageId::ANSI,
            dbcs_font: false,
        }
    }
}

impl EncodingConfig {
    /// Read overrides from the process environment.
    ///
    /// # Errors
    ///
    /// See [`from_env_with`](Self::from_env_with).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Read overrides using a custom environment lookup (for tests).
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for a non-integer font codepage or an
    /// unrecognized boolean.
    pub fn from_env_with<F>(get_env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(charset) = get_env(ENV_CHARSET) {
            config.charset = charset.trim().to_owned();
        }
        if let Some(value) = get_env(ENV_FONT_CODEPAGE) {
            let raw = value
                .trim()
                .parse::<i32>()
                .map_err(|_| invalid(ENV_FONT_CODEPAGE, &value))?;
            config.font_codepage = CodepageId::from_raw(raw);
        }
        if let Some(value) = get_env(ENV_DBCS_FONT) {
            config.dbcs_font = parse_bool(&value).ok_or_else(|| invalid(ENV_DBCS_FONT, &value))?;
        }
        tracing::trace!(
            charset = %config.charset,
            font = config.font_codepage.raw(),
            dbcs_font = config.dbcs_font,
            "encoding config from environment"
        );
        Ok(config)
    }

    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    #[must_use]
    pub fn with_font_codepage(mut self, codepage: CodepageId) -> Self {
        self.font_codepage = codepage;
        self
    }

    #[must_use]
    pub fn with_dbcs_font(mut self, dbcs_font: bool) -> Self {
        self.dbcs_font = dbcs_font;
        self
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_owned(),
        value: value.to_owned(),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn map_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn get_env<'a>(map: &'a HashMap<String, String>) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let env = map_env(&[]);
        let config = EncodingConfig::from_env_with(get_env(&env)).unwrap();
        assert_eq!(config, EncodingConfig::default());
        assert!(config.charset.is_empty());
        assert_eq!(config.font_codepage, CodepageId::ANSI);
    }

    #[test]
    fn overrides_are_applied() {
        let env = map_env(&[
            (ENV_CHARSET, " KOI8-U "),
            (ENV_FONT_CODEPAGE, "932"),
            (ENV_DBCS_FONT, "yes"),
        ]);
        let config = EncodingConfig::from_env_with(get_env(&env)).unwrap();
        assert_eq!(config.charset, "KOI8-U");
        assert_eq!(config.font_codepage, CodepageId::os(932));
        assert!(config.dbcs_font);
    }

    #[test]
    fn negative_font_codepage_is_accepted() {
        let env = map_env(&[(ENV_FONT_CODEPAGE, "-1")]);
        let config = EncodingConfig::from_env_with(get_env(&env)).unwrap();
        assert_eq!(config.font_codepage, CodepageId::FONT_DIRECT);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let env = map_env(&[(ENV_FONT_CODEPAGE, "cp437")]);
        let err = EncodingConfig::from_env_with(get_env(&env)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: ENV_FONT_CODEPAGE.into(),
                value: "cp437".into(),
            }
        );

        let env = map_env(&[(ENV_DBCS_FONT, "maybe")]);
        assert!(EncodingConfig::from_env_with(get_env(&env)).is_err());
    }

    #[test]
    fn builder_setters() {
        let config = EncodingConfig::default()
            .with_charset("UTF-8")
            .with_font_codepage(CodepageId::os(1251))
            .with_dbcs_font(true);
        assert_eq!(config.charset, "UTF-8");
        assert_eq!(config.font_codepage.raw(), 1251);
        assert!(config.dbcs_font);
    }

    #[test]
    fn parse_bool_truthy_and_falsy() {
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("ON"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("garbage"), None);
    }
}
