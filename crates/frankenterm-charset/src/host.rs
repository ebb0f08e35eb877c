//! Host codepage services.
//!
//! [`CodepageHost`] is the seam to whatever text-encoding services the
//! platform offers: numeric codepage ids in, Unicode out (and back). The
//! charset engine never reimplements these; it only asks for single bytes
//! while building tables and delegates whole runs when a conversion cannot be
//! served from its own tables.
//!
//! [`PortableHost`] is the implementation shipped with the crate. It is
//! backed by `encoding_rs`, plus exact CP437 and Latin-1 tables that
//! `encoding_rs` does not carry.

use std::env;

use bitflags::bitflags;
use encoding_rs::{EncoderResult, Encoding};

use crate::builtin::{CP437_GLYPH_DEL, CP437_GLYPHS_C0, CP437_UPPER};

/// Alias for the host's ANSI codepage (Windows `CP_ACP`).
pub const CP_ACP: u16 = 0;
/// Alias for the host's OEM codepage (Windows `CP_OEMCP`).
pub const CP_OEMCP: u16 = 1;

bitflags! {
    /// Conversion flags passed through to the host.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ConvertFlags: u8 {
        /// Report unmappable input as a failure instead of substituting.
        const ERR_INVALID_CHARS = 1 << 0;
        /// Render control bytes of OEM codepages as their visible glyphs.
        const USE_GLYPH_CHARS   = 1 << 1;
    }
}

/// What the host knows about a codepage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodepageInfo {
    /// Longest byte sequence for one character. Anything above 1 is a
    /// multi-byte codepage.
    pub max_byte_width: u8,
}

impl CodepageInfo {
    #[must_use]
    pub const fn is_single_byte(&self) -> bool {
        self.max_byte_width <= 1
    }
}

/// Platform text-encoding services, addressed by numeric codepage id.
///
/// Ids [`CP_ACP`] and [`CP_OEMCP`] are aliases for the live ANSI and OEM
/// codepages; implementations should accept them wherever an id is taken.
pub trait CodepageHost {
    /// The system ANSI codepage.
    fn default_codepage(&self) -> u16;

    /// The system OEM codepage.
    fn oem_codepage(&self) -> u16;

    /// Describe `codepage`, or `None` if the host does not support it.
    fn describe(&self, codepage: u16) -> Option<CodepageInfo>;

    /// Convert one byte. `None` means the byte has no single-byte mapping.
    fn decode_byte(&self, codepage: u16, flags: ConvertFlags, byte: u8) -> Option<char>;

    /// Convert a byte run. Unsupported codepages yield nothing.
    fn decode(&self, codepage: u16, flags: ConvertFlags, bytes: &[u8]) -> Vec<char>;

    /// Convert a run of scalars. Unmappable scalars become `?`.
    fn encode(&self, codepage: u16, flags: ConvertFlags, chars: &[char]) -> Vec<u8>;

    /// Whether `byte` starts a two-byte sequence in `codepage`.
    fn is_lead_byte(&self, codepage: u16, byte: u8) -> bool;

    /// Replace the ANSI/OEM aliases with their live values.
    fn resolve_alias(&self, codepage: u16) -> u16 {
        match codepage {
            CP_ACP => self.default_codepage(),
            CP_OEMCP => self.oem_codepage(),
            other => other,
        }
    }
}

impl<H: CodepageHost + ?Sized> CodepageHost for &H {
    fn default_codepage(&self) -> u16 {
        (**self).default_codepage()
    }
    fn oem_codepage(&self) -> u16 {
        (**self).oem_codepage()
    }
    fn describe(&self, codepage: u16) -> Option<CodepageInfo> {
        (**self).describe(codepage)
    }
    fn decode_byte(&self, codepage: u16, flags: ConvertFlags, byte: u8) -> Option<char> {
        (**self).decode_byte(codepage, flags, byte)
    }
    fn decode(&self, codepage: u16, flags: ConvertFlags, bytes: &[u8]) -> Vec<char> {
        (**self).decode(codepage, flags, bytes)
    }
    fn encode(&self, codepage: u16, flags: ConvertFlags, chars: &[char]) -> Vec<u8> {
        (**self).encode(codepage, flags, chars)
    }
    fn is_lead_byte(&self, codepage: u16, byte: u8) -> bool {
        (**self).is_lead_byte(codepage, byte)
    }
}

// ---------------------------------------------------------------------------
// Portable host
// ---------------------------------------------------------------------------

/// Codepage services built on `encoding_rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortableHost {
    ansi: u16,
    oem: u16,
}

impl Default for PortableHost {
    fn default() -> Self {
        Self::new(1252, 437)
    }
}

impl PortableHost {
    /// Host with fixed ANSI and OEM codepages.
    #[must_use]
    pub const fn new(ansi: u16, oem: u16) -> Self {
        Self { ansi, oem }
    }

    /// Host whose ANSI/OEM codepages follow the process locale.
    ///
    /// Preference order: `LC_ALL`, `LC_CTYPE`, then `LANG`.
    #[must_use]
    pub fn from_env() -> Self {
        let lc_all = env::var("LC_ALL").ok();
        let lc_ctype = env::var("LC_CTYPE").ok();
        let lang = env::var("LANG").ok();
        let locale = [lc_all, lc_ctype, lang]
            .into_iter()
            .flatten()
            .find(|value| !value.trim().is_empty());
        Self::from_locale(locale.as_deref())
    }

    /// Host for a POSIX locale string such as `ru_RU.UTF-8`.
    #[must_use]
    pub fn from_locale(locale: Option<&str>) -> Self {
        let (ansi, oem) = locale.and_then(codepages_for_locale).unwrap_or((1252, 437));
        tracing::trace!(?locale, ansi, oem, "host codepages from locale");
        Self::new(ansi, oem)
    }
}

#[derive(Debug, Clone, Copy)]
enum Backend {
    Latin1,
    Cp437,
    Encoding(&'static Encoding),
}

fn backend(codepage: u16) -> Option<Backend> {
    let encoding = match codepage {
        437 => return Some(Backend::Cp437),
        28591 => return Some(Backend::Latin1),
        866 => encoding_rs::IBM866,
        874 => encoding_rs::WINDOWS_874,
        1250 => encoding_rs::WINDOWS_1250,
        1251 => encoding_rs::WINDOWS_1251,
        1252 => encoding_rs::WINDOWS_1252,
        1253 => encoding_rs::WINDOWS_1253,
        1254 => encoding_rs::WINDOWS_1254,
        1255 => encoding_rs::WINDOWS_1255,
        1256 => encoding_rs::WINDOWS_1256,
        1257 => encoding_rs::WINDOWS_1257,
        1258 => encoding_rs::WINDOWS_1258,
        10000 => encoding_rs::MACINTOSH,
        10007 => encoding_rs::X_MAC_CYRILLIC,
        20866 => encoding_rs::KOI8_R,
        21866 => encoding_rs::KOI8_U,
        28592 => encoding_rs::ISO_8859_2,
        28593 => encoding_rs::ISO_8859_3,
        28594 => encoding_rs::ISO_8859_4,
        28595 => encoding_rs::ISO_8859_5,
        28596 => encoding_rs::ISO_8859_6,
        28597 => encoding_rs::ISO_8859_7,
        28598 => encoding_rs::ISO_8859_8,
        28600 => encoding_rs::ISO_8859_10,
        28603 => encoding_rs::ISO_8859_13,
        28604 => encoding_rs::ISO_8859_14,
        28605 => encoding_rs::ISO_8859_15,
        28606 => encoding_rs::ISO_8859_16,
        38598 => encoding_rs::ISO_8859_8_I,
        932 => encoding_rs::SHIFT_JIS,
        936 => encoding_rs::GBK,
        949 => encoding_rs::EUC_KR,
        950 => encoding_rs::BIG5,
        20932 | 51932 => encoding_rs::EUC_JP,
        54936 => encoding_rs::GB18030,
        65001 => encoding_rs::UTF_8,
        _ => return None,
    };
    Some(Backend::Encoding(encoding))
}

fn max_byte_width(encoding: &'static Encoding) -> u8 {
    if encoding.is_single_byte() {
        1
    } else if encoding == encoding_rs::UTF_8 || encoding == encoding_rs::GB18030 {
        4
    } else if encoding == encoding_rs::EUC_JP {
        3
    } else {
        2
    }
}

fn has_c0_glyphs(codepage: u16) -> bool {
    matches!(codepage, 437 | 866)
}

fn c0_glyph(byte: u8) -> Option<char> {
    let unit = match byte {
        0x01..=0x1F => CP437_GLYPHS_C0[usize::from(byte)],
        0x7F => CP437_GLYPH_DEL,
        _ => return None,
    };
    char::from_u32(u32::from(unit))
}

fn cp437_decode(byte: u8) -> char {
    if byte < 0x80 {
        return char::from(byte);
    }
    let unit = CP437_UPPER[usize::from(byte - 0x80)];
    char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn cp437_encode(ch: char) -> Option<u8> {
    if ch.is_ascii() {
        return Some(ch as u8);
    }
    let code = u32::from(ch);
    CP437_UPPER
        .iter()
        .position(|&unit| u32::from(unit) == code)
        .map(|pos| 0x80 + pos as u8)
}

impl CodepageHost for PortableHost {
    fn default_codepage(&self) -> u16 {
        self.ansi
    }

    fn oem_codepage(&self) -> u16 {
        self.oem
    }

    fn describe(&self, codepage: u16) -> Option<CodepageInfo> {
        let max_byte_width = match backend(self.resolve_alias(codepage))? {
            Backend::Latin1 | Backend::Cp437 => 1,
            Backend::Encoding(encoding) => max_byte_width(encoding),
        };
        Some(CodepageInfo { max_byte_width })
    }

    fn decode_byte(&self, codepage: u16, flags: ConvertFlags, byte: u8) -> Option<char> {
        let codepage = self.resolve_alias(codepage);
        if flags.contains(ConvertFlags::USE_GLYPH_CHARS)
            && has_c0_glyphs(codepage)
            && let Some(glyph) = c0_glyph(byte)
        {
            return Some(glyph);
        }
        let decoded = match backend(codepage)? {
            Backend::Latin1 => Some(char::from(byte)),
            Backend::Cp437 => Some(cp437_decode(byte)),
            Backend::Encoding(encoding) => encoding
                .decode_without_bom_handling_and_without_replacement(&[byte])
                .and_then(|text| {
                    let mut chars = text.chars();
                    match (chars.next(), chars.next()) {
                        (Some(ch), None) => Some(ch),
                        _ => None,
                    }
                }),
        };
        if decoded.is_none() && !flags.contains(ConvertFlags::ERR_INVALID_CHARS) {
            return Some(char::REPLACEMENT_CHARACTER);
        }
        decoded
    }

    fn decode(&self, codepage: u16, flags: ConvertFlags, bytes: &[u8]) -> Vec<char> {
        let codepage = self.resolve_alias(codepage);
        let Some(backend) = backend(codepage) else {
            tracing::trace!(codepage, "decode on unsupported codepage");
            return Vec::new();
        };
        match backend {
            Backend::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Backend::Cp437 => bytes
                .iter()
                .map(|&b| {
                    if flags.contains(ConvertFlags::USE_GLYPH_CHARS) {
                        c0_glyph(b).unwrap_or_else(|| cp437_decode(b))
                    } else {
                        cp437_decode(b)
                    }
                })
                .collect(),
            Backend::Encoding(encoding) => {
                let (text, _had_errors) = encoding.decode_without_bom_handling(bytes);
                text.chars().collect()
            }
        }
    }

    fn encode(&self, codepage: u16, _flags: ConvertFlags, chars: &[char]) -> Vec<u8> {
        let codepage = self.resolve_alias(codepage);
        let Some(backend) = backend(codepage) else {
            tracing::trace!(codepage, "encode on unsupported codepage");
            return Vec::new();
        };
        let mut out = Vec::with_capacity(chars.len());
        match backend {
            Backend::Latin1 => {
                out.extend(chars.iter().map(|&ch| u8::try_from(u32::from(ch)).unwrap_or(b'?')));
            }
            Backend::Cp437 => {
                out.extend(chars.iter().map(|&ch| cp437_encode(ch).unwrap_or(b'?')));
            }
            Backend::Encoding(encoding) => {
                let mut encoder = encoding.new_encoder();
                let mut utf8 = [0u8; 4];
                let mut buf = [0u8; 16];
                for &ch in chars {
                    let src = ch.encode_utf8(&mut utf8);
                    let (result, _read, written) =
                        encoder.encode_from_utf8_without_replacement(src, &mut buf, false);
                    match result {
                        EncoderResult::InputEmpty => out.extend_from_slice(&buf[..written]),
                        EncoderResult::Unmappable(_) | EncoderResult::OutputFull => out.push(b'?'),
                    }
                }
            }
        }
        out
    }

    fn is_lead_byte(&self, codepage: u16, byte: u8) -> bool {
        let Some(Backend::Encoding(encoding)) = backend(self.resolve_alias(codepage)) else {
            return false;
        };
        if encoding.is_single_byte() {
            return false;
        }
        if encoding == encoding_rs::SHIFT_JIS {
            matches!(byte, 0x81..=0x9F | 0xE0..=0xFC)
        } else if encoding == encoding_rs::EUC_JP {
            matches!(byte, 0x8E | 0x8F | 0xA1..=0xFE)
        } else if encoding == encoding_rs::UTF_8 {
            matches!(byte, 0xC2..=0xF4)
        } else {
            matches!(byte, 0x81..=0xFE)
        }
    }
}

// ---------------------------------------------------------------------------
// Locale discovery
// ---------------------------------------------------------------------------

/// ANSI and OEM codepages a Windows system would use for `raw`.
fn codepages_for_locale(raw: &str) -> Option<(u16, u16)> {
    let raw = raw.trim();
    let raw = raw.split('@').next().unwrap_or(raw);
    let raw = raw.split('.').next().unwrap_or(raw).trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("c") || raw.eq_ignore_ascii_case("posix") {
        return None;
    }
    let mut parts = raw.split(['_', '-']);
    let language = parts.next()?.to_ascii_lowercase();
    let territory = parts.next().map(str::to_ascii_uppercase);

    let pair = match language.as_str() {
        "pl" | "cs" | "sk" | "hu" | "sl" | "hr" | "ro" | "sq" | "bs" => (1250, 437),
        "ru" | "uk" | "be" | "bg" | "sr" | "mk" => (1251, 866),
        "el" => (1253, 437),
        "tr" | "az" => (1254, 437),
        "he" | "iw" => (1255, 437),
        "ar" | "fa" | "ur" => (1256, 437),
        "lt" | "lv" | "et" => (1257, 437),
        "vi" => (1258, 437),
        "th" => (874, 437),
        "ja" => (932, 437),
        "ko" => (949, 437),
        "zh" => match territory.as_deref() {
            Some("TW" | "HK" | "MO") => (950, 437),
            _ => (936, 437),
        },
        _ => (1252, 437),
    };
    Some(pair)
}
