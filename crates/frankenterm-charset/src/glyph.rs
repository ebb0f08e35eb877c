//! Table slot values and rendered-character tags.
//!
//! A forward table slot is one of three mutually exclusive kinds:
//!
//! - a literal Unicode scalar ([`Glyph::Char`]),
//! - a byte in one of the terminal's 8-bit character sets that still needs a
//!   table lookup ([`Glyph::DirectChar`]),
//! - a glyph index into a loaded font ([`Glyph::DirectFont`]).
//!
//! The renderer hands the same type back to [`class_of`] so it can be
//! de-aliased through the active tables.
//!
//! [`class_of`]: crate::tables::ConversionTableSet::class_of

/// 8-bit character sets whose bytes resolve through a conversion table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Charset {
    /// Plain line character set, resolves through the line table.
    Ascii,
    /// DEC special graphics, resolves through the xterm table.
    LineDrawing,
    /// SCO alternate character set, resolves through the CP437 table.
    ScoAcs,
}

/// Which loaded font a direct glyph index addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontPage {
    /// The screen font, in the font codepage.
    Ansi,
    /// The OEM font, in the host's OEM codepage.
    Oem,
}

/// One slot of a forward table, or one rendered character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Glyph {
    Char(char),
    DirectChar(Charset, u8),
    DirectFont(FontPage, u8),
}

/// Marker for font slots that must never be matched (broken CP437 fonts).
pub const UNMAPPED: char = '\u{FFFF}';

impl Glyph {
    #[must_use]
    pub const fn font(index: u8) -> Self {
        Self::DirectFont(FontPage::Ansi, index)
    }

    #[must_use]
    pub const fn oem(index: u8) -> Self {
        Self::DirectFont(FontPage::Oem, index)
    }

    #[must_use]
    pub const fn is_direct_font(self) -> bool {
        matches!(self, Self::DirectFont(..))
    }

    #[must_use]
    pub const fn is_direct_char(self) -> bool {
        matches!(self, Self::DirectChar(..))
    }

    /// The literal scalar, if this slot holds one.
    #[must_use]
    pub const fn as_char(self) -> Option<char> {
        match self {
            Self::Char(c) => Some(c),
            _ => None,
        }
    }
}

impl From<char> for Glyph {
    fn from(c: char) -> Self {
        Self::Char(c)
    }
}
