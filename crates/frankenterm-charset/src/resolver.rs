//! Encoding name resolution.
//!
//! Turns a user-facing encoding name into a [`CodepageId`]:
//!
//! 1. An empty name infers a preferred built-in table from the host's ANSI
//!    codepage, or selects direct-to-font when there is no preference.
//! 2. The name is matched against the catalog, ignoring case and everything
//!    except ASCII alphanumerics and `:`. The name only has to be a prefix of
//!    the catalog name (`"iso8859-1"` matches
//!    `"ISO-8859-1:1998 (Latin-1, West Europe)"`).
//! 3. Otherwise the name is read as a literal codepage number, optionally
//!    prefixed by `cp` and/or `ibm`.
//! 4. Host codepages are validated last: unknown ones and multi-byte ones are
//!    rejected.

use std::borrow::Cow;
use std::fmt;

use crate::catalog::{self, CatalogEntry, FONT_ENCODING_CODEPAGE, UTF8_CODEPAGE};
use crate::error::EncodingError;
use crate::host::{CP_ACP, CP_OEMCP, CodepageHost};

/// Display name of the direct-to-font mode.
pub const FONT_ENCODING_NAME: &str = "Use font encoding";

const BUILTIN_BASE: i32 = 65536;

/// A resolved codepage.
///
/// - `-1`: direct-to-font, bytes index the font with no Unicode translation.
/// - `0..65536`: a host codepage number (`0`/`1` are the ANSI/OEM aliases).
/// - `65536 + i`: the built-in table of catalog entry `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CodepageId(i32);

impl CodepageId {
    pub const FONT_DIRECT: Self = Self(FONT_ENCODING_CODEPAGE);
    pub const ANSI: Self = Self(CP_ACP as i32);
    pub const OEM: Self = Self(CP_OEMCP as i32);
    pub const UTF8: Self = Self(UTF8_CODEPAGE);

    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Host codepage `codepage`.
    #[must_use]
    pub const fn os(codepage: u16) -> Self {
        Self(codepage as i32)
    }

    /// Built-in table of catalog entry `index`.
    #[must_use]
    pub const fn builtin(index: usize) -> Self {
        Self(BUILTIN_BASE + index as i32)
    }

    #[must_use]
    pub const fn is_font_direct(self) -> bool {
        self.0 == FONT_ENCODING_CODEPAGE
    }

    #[must_use]
    pub const fn is_utf8(self) -> bool {
        self.0 == UTF8_CODEPAGE
    }

    /// Catalog index for built-in ids.
    #[must_use]
    pub const fn builtin_index(self) -> Option<usize> {
        if self.0 >= BUILTIN_BASE {
            Some((self.0 - BUILTIN_BASE) as usize)
        } else {
            None
        }
    }

    /// Catalog entry for built-in ids.
    #[must_use]
    pub fn builtin_entry(self) -> Option<&'static CatalogEntry> {
        self.builtin_index().and_then(catalog::lookup)
    }

    /// Host codepage number, including the ANSI/OEM aliases and UTF-8.
    #[must_use]
    pub const fn os_codepage(self) -> Option<u16> {
        if self.0 >= 0 && self.0 < BUILTIN_BASE {
            Some(self.0 as u16)
        } else {
            None
        }
    }
}

impl fmt::Display for CodepageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = name_of(*self);
        if name.is_empty() {
            write!(f, "codepage {}", self.0)
        } else {
            f.write_str(&name)
        }
    }
}

/// Resolve an encoding name.
///
/// `CodepageId::FONT_DIRECT` is a successful result: it selects the
/// direct-to-font mode.
///
/// # Errors
///
/// [`EncodingError::UnknownEncodingName`] when neither the catalog nor the
/// host knows the name, [`EncodingError::UnsupportedMultiByteEncoding`] when
/// it names a multi-byte host codepage.
pub fn resolve<H: CodepageHost + ?Sized>(host: &H, name: &str) -> Result<CodepageId, EncodingError> {
    let name = if name.is_empty() {
        preferred_name(host.default_codepage()).unwrap_or("")
    } else {
        name
    };
    if name.is_empty() {
        tracing::debug!(ansi = host.default_codepage(), "no preferred charset, using font encoding");
        return Ok(CodepageId::FONT_DIRECT);
    }

    let id = match match_catalog(host, name) {
        Some(id) => id,
        None => parse_numeric(host, name).ok_or_else(|| unknown(name))?,
    };
    let id = validate(host, name, id)?;
    tracing::debug!(name, id = id.raw(), "resolved charset");
    Ok(id)
}

/// Canonical display name of `id`.
///
/// Built-in ids name the first catalog entry sharing their table, host ids
/// the first entry with the same codepage, or a synthesized `CP###` label.
/// Ids that name nothing yield an empty string.
#[must_use]
pub fn name_of(id: CodepageId) -> Cow<'static, str> {
    if id.is_font_direct() {
        return Cow::Borrowed(FONT_ENCODING_NAME);
    }
    if let Some(index) = id.builtin_index() {
        let Some(target) = catalog::lookup(index) else {
            return Cow::Borrowed("");
        };
        let canonical = catalog::entries()
            .map(|(_, entry)| entry)
            .find(|entry| entry.shares_table_with(target))
            .unwrap_or(target);
        return Cow::Borrowed(canonical.name);
    }
    if id.raw() != 0
        && let Some((_, entry)) = catalog::entries().find(|(_, e)| e.os_codepage == id.raw())
    {
        return Cow::Borrowed(entry.name);
    }
    if id.raw() > 0 {
        Cow::Owned(format!("CP{:03}", id.raw()))
    } else {
        Cow::Borrowed("")
    }
}

/// Built-in table preferred over a Windows ANSI codepage.
///
/// ISO tables keep C1 controls working, which matters more for remote Unix
/// hosts than the extra Windows punctuation.
fn preferred_name(ansi: u16) -> Option<&'static str> {
    let name = match ansi {
        1250 => "ISO-8859-2",
        1251 => "KOI8-U",
        1252 => "ISO-8859-1",
        1253 => "ISO-8859-7",
        1254 => "ISO-8859-9",
        1255 => "ISO-8859-8",
        1256 => "ISO-8859-6",
        1257 => "ISO-8859-13",
        _ => return None,
    };
    Some(name)
}

fn is_significant(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b':'
}

/// Whether `candidate` is a prefix of `catalog_name`, comparing only
/// significant characters and ignoring ASCII case.
fn names_match(candidate: &str, catalog_name: &str) -> bool {
    let mut s = candidate.bytes().filter(|&b| is_significant(b));
    let mut d = catalog_name.bytes().filter(|&b| is_significant(b));
    loop {
        let Some(c) = s.next() else {
            return true;
        };
        match d.next() {
            Some(e) if c.eq_ignore_ascii_case(&e) => {}
            _ => return false,
        }
    }
}

fn match_catalog<H: CodepageHost + ?Sized>(host: &H, name: &str) -> Option<CodepageId> {
    let (index, entry) = catalog::entries().find(|(_, entry)| names_match(name, entry.name))?;
    match entry.os_codepage {
        UTF8_CODEPAGE => Some(CodepageId::UTF8),
        FONT_ENCODING_CODEPAGE => Some(CodepageId::FONT_DIRECT),
        0 => Some(CodepageId::builtin(index)),
        codepage => {
            let supported = u16::try_from(codepage)
                .ok()
                .is_some_and(|cp| host.describe(cp).is_some());
            if supported {
                Some(CodepageId::from_raw(codepage))
            } else {
                tracing::debug!(name, entry = entry.name, codepage, "host rejected catalog codepage");
                None
            }
        }
    }
}

/// Read `cp1252`, `IBM437`, `cpibm850` or a bare number.
fn parse_numeric<H: CodepageHost + ?Sized>(host: &H, name: &str) -> Option<CodepageId> {
    let mut digits = name;
    if digits.get(..2).is_some_and(|p| p.eq_ignore_ascii_case("cp")) {
        digits = &digits[2..];
    }
    if digits.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("ibm")) {
        digits = &digits[3..];
    }
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Overflow only happens far above the codepage range.
    let value = digits.parse::<u64>().unwrap_or(u64::MAX);
    let value = match value {
        0 => u64::from(host.default_codepage()),
        1 => u64::from(host.oem_codepage()),
        other => other,
    };
    tracing::trace!(name, value, "numeric charset name");
    u16::try_from(value).ok().map(CodepageId::os)
}

fn validate<H: CodepageHost + ?Sized>(
    host: &H,
    name: &str,
    id: CodepageId,
) -> Result<CodepageId, EncodingError> {
    if id.is_font_direct() || id.is_utf8() || id.builtin_index().is_some() {
        return Ok(id);
    }
    let Some(codepage) = id.os_codepage() else {
        return Err(unknown(name));
    };
    match host.describe(codepage) {
        None => Err(unknown(name)),
        Some(info) if !info.is_single_byte() => Err(EncodingError::UnsupportedMultiByteEncoding {
            name: name.to_string(),
            codepage,
        }),
        Some(_) => Ok(id),
    }
}

fn unknown(name: &str) -> EncodingError {
    EncodingError::UnknownEncodingName {
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::PortableHost;

    fn index_of(name: &str) -> usize {
        catalog::names().position(|n| n == name).unwrap()
    }

    #[test]
    fn prefix_match_ignores_case_and_punctuation() {
        assert!(names_match("iso8859-1", "ISO-8859-1:1998 (Latin-1, West Europe)"));
        assert!(names_match("Iso 8859 1:1998", "ISO-8859-1:1998 (Latin-1, West Europe)"));
        assert!(!names_match("iso-8859-1:1999", "ISO-8859-1:1998 (Latin-1, West Europe)"));
        assert!(!names_match("KOI8-UX", "KOI8-U"));
    }

    #[test]
    fn colon_is_significant() {
        assert!(!names_match("ISO-8859-1-1998", "ISO-8859-1:1998 (Latin-1, West Europe)"));
    }

    #[test]
    fn first_matching_entry_wins() {
        let host = PortableHost::default();
        // "ISO-8859-1" is also a prefix of the ISO-8859-10 entry.
        assert_eq!(
            resolve(&host, "ISO-8859-1"),
            Ok(CodepageId::builtin(index_of("ISO-8859-1:1998 (Latin-1, West Europe)")))
        );
        assert_eq!(
            resolve(&host, "ISO-8859-10"),
            Ok(CodepageId::builtin(index_of("ISO-8859-10:1998 (Latin-6, Nordic)")))
        );
    }

    #[test]
    fn numeric_prefixes() {
        let host = PortableHost::default();
        assert_eq!(resolve(&host, "cp1251"), Ok(CodepageId::os(1251)));
        assert_eq!(resolve(&host, "IBM437"), Ok(CodepageId::os(437)));
        assert_eq!(resolve(&host, "1253"), Ok(CodepageId::os(1253)));
        assert_eq!(resolve(&host, "cp"), Err(unknown("cp")));
        assert_eq!(resolve(&host, "cp12x"), Err(unknown("cp12x")));
    }

    #[test]
    fn numeric_aliases_follow_host() {
        let host = PortableHost::new(1251, 866);
        assert_eq!(resolve(&host, "cp0"), Ok(CodepageId::os(1251)));
        assert_eq!(resolve(&host, "cp1"), Ok(CodepageId::os(866)));
    }

    #[test]
    fn multi_byte_is_rejected() {
        let host = PortableHost::default();
        let err = resolve(&host, "cp932").unwrap_err();
        assert_eq!(err.code(), -3);
        assert_eq!(resolve(&host, "65001"), Ok(CodepageId::UTF8));
    }

    #[test]
    fn huge_numbers_are_unknown() {
        let host = PortableHost::default();
        assert_eq!(resolve(&host, "cp65536").unwrap_err().code(), -2);
        assert_eq!(resolve(&host, "99999999999999999999999").unwrap_err().code(), -2);
    }

    #[test]
    fn non_ascii_names_do_not_panic() {
        let host = PortableHost::default();
        assert!(resolve(&host, "ç").is_ok());
        assert_eq!(resolve(&host, "cé12").unwrap_err().code(), -2);
    }

    #[test]
    fn empty_name_prefers_iso_tables() {
        let host = PortableHost::new(1251, 866);
        assert_eq!(resolve(&host, ""), resolve(&host, "KOI8-U"));
        let host = PortableHost::new(932, 437);
        assert_eq!(resolve(&host, ""), Ok(CodepageId::FONT_DIRECT));
    }

    #[test]
    fn name_of_builtin_and_host_ids() {
        assert_eq!(name_of(CodepageId::builtin(index_of("KOI8-U"))), "KOI8-U");
        assert_eq!(name_of(CodepageId::os(1252)), "Win1252 (Western)");
        assert_eq!(name_of(CodepageId::os(20866)), "KOI8-R");
        assert_eq!(name_of(CodepageId::os(866)), "CP866");
        assert_eq!(name_of(CodepageId::os(42)), "CP042");
        assert_eq!(name_of(CodepageId::UTF8), "UTF-8");
        assert_eq!(name_of(CodepageId::FONT_DIRECT), FONT_ENCODING_NAME);
        assert_eq!(name_of(CodepageId::builtin(10_000)), "");
        assert_eq!(name_of(CodepageId::ANSI), "");
    }

    #[test]
    fn display_falls_back_to_raw_number() {
        assert_eq!(CodepageId::os(437).to_string(), "CP437");
        assert_eq!(CodepageId::ANSI.to_string(), "codepage 0");
    }
}
