//! Word-boundary classification of rendered characters.
//!
//! Used by selection (double-click word extent) and line-drawing decisions.
//! Classes are derived per call and never stored.

use crate::glyph::Glyph;
use crate::tables::ConversionTableSet;

/// Word class of one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum WordClass {
    /// Space, control or format character.
    Break,
    Punctuation,
    /// Alphanumeric, or one of `#+-./\_~`.
    Word,
    /// CJK, Hangul or Kana.
    WideScript,
}

impl WordClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Break => "break",
            Self::Punctuation => "punctuation",
            Self::Word => "word",
            Self::WideScript => "wide-script",
        }
    }
}

/// Inclusive, ascending, non-overlapping.
static RANGES: &[(u32, u32, WordClass)] = &[
    (0x0080, 0x00A0, WordClass::Break),
    (0x00A1, 0x00BF, WordClass::Punctuation),
    (0x00D7, 0x00D7, WordClass::Punctuation),
    (0x00F7, 0x00F7, WordClass::Punctuation),
    (0x037E, 0x037E, WordClass::Punctuation), // Greek question mark
    (0x0387, 0x0387, WordClass::Punctuation), // Greek ano teleia
    (0x055A, 0x055F, WordClass::Punctuation), // Armenian
    (0x0589, 0x0589, WordClass::Punctuation), // Armenian full stop
    (0x0700, 0x070D, WordClass::Punctuation), // Syriac
    (0x104A, 0x104F, WordClass::Punctuation), // Myanmar
    (0x10FB, 0x10FB, WordClass::Punctuation), // Georgian
    (0x1361, 0x1368, WordClass::Punctuation), // Ethiopic
    (0x166D, 0x166E, WordClass::Punctuation), // Canadian Syllabics
    (0x17D4, 0x17DC, WordClass::Punctuation), // Khmer
    (0x1800, 0x180A, WordClass::Punctuation), // Mongolian
    (0x2000, 0x200A, WordClass::Break),
    (0x200B, 0x27FF, WordClass::Punctuation),
    (0x3000, 0x3000, WordClass::Break),
    (0x3001, 0x3020, WordClass::Punctuation),
    (0x303F, 0x309F, WordClass::WideScript), // Hiragana
    (0x30A0, 0x30FF, WordClass::WideScript), // Katakana
    (0x3300, 0x9FFF, WordClass::WideScript), // CJK Ideographs
    (0xAC00, 0xD7A3, WordClass::WideScript), // Hangul Syllables
    (0xF900, 0xFAFF, WordClass::WideScript), // CJK Compatibility Ideographs
    (0xFE30, 0xFE6B, WordClass::Punctuation),
    (0xFF00, 0xFF0F, WordClass::Punctuation),
    (0xFF1A, 0xFF20, WordClass::Punctuation),
    (0xFF3B, 0xFF40, WordClass::Punctuation),
    (0xFF5B, 0xFF64, WordClass::Punctuation),
    (0xFFF0, 0xFFFF, WordClass::Break),
];

/// Class of a plain Unicode scalar, with no table context.
#[must_use]
pub fn classify(ch: char) -> WordClass {
    let code = u32::from(ch);
    if code < 0x80 {
        return if ch <= ' ' || ch == '\x7f' {
            WordClass::Break
        } else if ch.is_ascii_alphanumeric() || "#+-./\\_~".contains(ch) {
            WordClass::Word
        } else {
            WordClass::Punctuation
        };
    }
    let found = RANGES.binary_search_by(|&(start, end, _)| {
        if end < code {
            std::cmp::Ordering::Less
        } else if start > code {
            std::cmp::Ordering::Greater
        } else {
            std::cmp::Ordering::Equal
        }
    });
    match found {
        Ok(index) => RANGES[index].2,
        Err(_) => WordClass::Punctuation,
    }
}

impl ConversionTableSet {
    /// Class of a rendered character, de-aliased through these tables.
    ///
    /// With a double-byte font shared by the line, only spaces break.
    #[must_use]
    pub fn class_of(&self, glyph: Glyph) -> WordClass {
        let Glyph::Char(ch) = self.resolve_glyph(glyph) else {
            return WordClass::Punctuation;
        };
        if self.dbcs_font && self.font_codepage == self.line_codepage {
            return if ch == ' ' {
                WordClass::Break
            } else {
                WordClass::Word
            };
        }
        classify(ch)
    }
}
