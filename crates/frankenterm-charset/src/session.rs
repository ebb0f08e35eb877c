//! Per-terminal encoding state.
//!
//! A [`CodepageSession`] owns the host and the active [`ConversionTableSet`].
//! Reconfiguration builds a complete new set off to the side and publishes it
//! with a single pointer swap, so the renderer and input threads only ever
//! see a whole set (old or new), never a partially rebuilt one.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::EncodingConfig;
use crate::convert;
use crate::error::EncodingError;
use crate::glyph::Glyph;
use crate::host::CodepageHost;
use crate::resolver::{self, CodepageId};
use crate::tables::ConversionTableSet;
use crate::word::WordClass;

/// Outcome of applying an [`EncodingConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Line codepage now in effect.
    pub active: CodepageId,
    /// Why the requested charset was not used, if it was not.
    pub error: Option<EncodingError>,
}

impl Resolution {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Encoding state for one terminal.
#[derive(Debug)]
pub struct CodepageSession<H> {
    host: H,
    tables: ArcSwap<ConversionTableSet>,
}

impl<H: CodepageHost> CodepageSession<H> {
    /// Create a session and build its first table set.
    ///
    /// Resolution failures fall back to the font codepage and are logged;
    /// use [`open`](Self::open) to inspect them.
    pub fn new(host: H, config: &EncodingConfig) -> Self {
        Self::open(host, config).0
    }

    /// Like [`new`](Self::new), also returning how the charset resolved.
    pub fn open(host: H, config: &EncodingConfig) -> (Self, Resolution) {
        let (tables, resolution) = build_for(&host, config);
        if let Some(error) = &resolution.error {
            tracing::warn!(charset = %config.charset, %error, "falling back to font encoding");
        }
        let session = Self {
            host,
            tables: ArcSwap::from_pointee(tables),
        };
        (session, resolution)
    }

    /// Resolve `config` and publish a freshly built table set.
    pub fn reconfigure(&self, config: &EncodingConfig) -> Resolution {
        let (tables, resolution) = build_for(&self.host, config);
        if let Some(error) = &resolution.error {
            tracing::warn!(charset = %config.charset, %error, "falling back to font encoding");
        }
        self.tables.store(Arc::new(tables));
        tracing::debug!(line = %resolution.active, "published conversion tables");
        resolution
    }

    /// Snapshot of the active tables.
    #[must_use]
    pub fn tables(&self) -> Arc<ConversionTableSet> {
        self.tables.load_full()
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Line codepage of the current set.
    ///
    /// A concurrent [`reconfigure`](Self::reconfigure) may replace the set
    /// right after this returns. To convert in the line codepage use
    /// [`decode_line`](Self::decode_line) / [`encode_line`](Self::encode_line),
    /// or hold one [`tables`](Self::tables) snapshot for both steps.
    #[must_use]
    pub fn line_codepage(&self) -> CodepageId {
        self.tables.load().line_codepage()
    }

    #[must_use]
    pub fn decode(&self, codepage: CodepageId, bytes: &[u8]) -> Vec<char> {
        self.tables.load().decode(&self.host, codepage, bytes)
    }

    #[must_use]
    pub fn encode(&self, codepage: CodepageId, chars: &[char]) -> Vec<u8> {
        self.tables.load().encode(&self.host, codepage, chars)
    }

    /// Decode bytes from the peer using one snapshot's own line codepage.
    #[must_use]
    pub fn decode_line(&self, bytes: &[u8]) -> Vec<char> {
        let tables = self.tables.load();
        tables.decode(&self.host, tables.line_codepage(), bytes)
    }

    /// Encode text for the peer using one snapshot's own line codepage.
    #[must_use]
    pub fn encode_line(&self, chars: &[char]) -> Vec<u8> {
        let tables = self.tables.load();
        tables.encode(&self.host, tables.line_codepage(), chars)
    }

    #[must_use]
    pub fn class_of(&self, glyph: Glyph) -> WordClass {
        self.tables.load().class_of(glyph)
    }

    #[must_use]
    pub fn is_lead_byte(&self, codepage: CodepageId, byte: u8) -> bool {
        convert::is_lead_byte(&self.host, codepage, byte)
    }
}

fn build_for<H: CodepageHost + ?Sized>(
    host: &H,
    config: &EncodingConfig,
) -> (ConversionTableSet, Resolution) {
    let (requested, error) = match resolver::resolve(host, &config.charset) {
        Ok(id) => (id, None),
        Err(err) => (CodepageId::FONT_DIRECT, Some(err)),
    };
    let tables = ConversionTableSet::build(host, config.font_codepage, requested, config.dbcs_font);
    let resolution = Resolution {
        active: tables.line_codepage(),
        error,
    };
    (tables, resolution)
}
