//! Static registry of named encodings.
//!
//! The catalog mixes three kinds of entries:
//!
//! - **Built-in tables**: single-byte codepages compiled into the crate
//!   (ISO-8859 family, KOI8-U, Roman8, VSCII, DEC-MCS, Mazovia).
//! - **Host codepages**: numeric codepage ids resolved through the
//!   [`CodepageHost`](crate::host::CodepageHost).
//! - **Sentinels**: UTF-8 and "use font encoding".
//!
//! Order is significant. When several entries share a table, the first one
//! is the canonical display name for it (see [`resolver::name_of`]).
//!
//! [`resolver::name_of`]: crate::resolver::name_of

use crate::builtin;

/// Host codepage id of the UTF-8 entry (Windows `CP_UTF8`).
pub const UTF8_CODEPAGE: i32 = 65001;

/// Host codepage id of the "use font encoding" entry.
pub const FONT_ENCODING_CODEPAGE: i32 = -1;

/// One named encoding.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    /// User-facing name, also the match target for name resolution.
    pub name: &'static str,
    /// Host codepage id; `0` means the entry is a built-in table.
    pub os_codepage: i32,
    /// Upper-range table for built-in entries.
    pub table: Option<&'static [u16]>,
}

impl CatalogEntry {
    const fn builtin(name: &'static str, table: &'static [u16]) -> Self {
        Self {
            name,
            os_codepage: 0,
            table: Some(table),
        }
    }

    const fn host(name: &'static str, os_codepage: i32) -> Self {
        Self {
            name,
            os_codepage,
            table: None,
        }
    }

    /// Number of upper byte positions covered by the built-in table.
    #[must_use]
    pub fn table_size(&self) -> usize {
        self.table.map_or(0, <[u16]>::len)
    }

    /// Whether this entry is backed by a compiled-in table.
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        self.os_codepage == 0 && self.table.is_some()
    }

    /// Code point for `byte` under this entry's built-in table.
    ///
    /// Bytes below the table's range map to themselves. Returns `None` for
    /// entries without a table.
    #[must_use]
    pub fn lookup(&self, byte: u8) -> Option<char> {
        let table = self.table?;
        let first = 256 - table.len();
        let index = usize::from(byte);
        if index < first {
            return Some(char::from(byte));
        }
        Some(char::from_u32(u32::from(table[index - first])).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    /// Whether this entry and `other` share the same built-in table.
    #[must_use]
    pub fn shares_table_with(&self, other: &CatalogEntry) -> bool {
        match (self.table, other.table) {
            (Some(a), Some(b)) => std::ptr::eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

static CATALOG: [CatalogEntry; 35] = [
    CatalogEntry::builtin("ISO-8859-1:1998 (Latin-1, West Europe)", &builtin::ISO_8859_1),
    CatalogEntry::builtin("ISO-8859-2:1999 (Latin-2, East Europe)", &builtin::ISO_8859_2),
    CatalogEntry::builtin("ISO-8859-3:1999 (Latin-3, South Europe)", &builtin::ISO_8859_3),
    CatalogEntry::builtin("ISO-8859-4:1998 (Latin-4, North Europe)", &builtin::ISO_8859_4),
    CatalogEntry::builtin("ISO-8859-5:1999 (Latin/Cyrillic)", &builtin::ISO_8859_5),
    CatalogEntry::builtin("ISO-8859-6:1999 (Latin/Arabic)", &builtin::ISO_8859_6),
    CatalogEntry::builtin("ISO-8859-7:1987 (Latin/Greek)", &builtin::ISO_8859_7),
    CatalogEntry::builtin("ISO-8859-8:1999 (Latin/Hebrew)", &builtin::ISO_8859_8),
    CatalogEntry::builtin("ISO-8859-9:1999 (Latin-5, Turkish)", &builtin::ISO_8859_9),
    CatalogEntry::builtin("ISO-8859-10:1998 (Latin-6, Nordic)", &builtin::ISO_8859_10),
    CatalogEntry::builtin("ISO-8859-11:2001 (Latin/Thai)", &builtin::ISO_8859_11),
    CatalogEntry::builtin("ISO-8859-13:1998 (Latin-7, Baltic)", &builtin::ISO_8859_13),
    CatalogEntry::builtin("ISO-8859-14:1998 (Latin-8, Celtic)", &builtin::ISO_8859_14),
    CatalogEntry::builtin("ISO-8859-15:1999 (Latin-9, \"euro\")", &builtin::ISO_8859_15),
    CatalogEntry::builtin("ISO-8859-16:2001 (Latin-10, Balkan)", &builtin::ISO_8859_16),
    CatalogEntry::builtin("KOI8-U", &builtin::KOI8_U),
    CatalogEntry::host("KOI8-R", 20866),
    CatalogEntry::builtin("HP-ROMAN8", &builtin::ROMAN8),
    CatalogEntry::builtin("VSCII", &builtin::VSCII),
    CatalogEntry::builtin("DEC-MCS", &builtin::DEC_MCS),
    CatalogEntry::host("UTF-8", UTF8_CODEPAGE),
    CatalogEntry::host("Win1250 (Central European)", 1250),
    CatalogEntry::host("Win1251 (Cyrillic)", 1251),
    CatalogEntry::host("Win1252 (Western)", 1252),
    CatalogEntry::host("Win1253 (Greek)", 1253),
    CatalogEntry::host("Win1254 (Turkish)", 1254),
    CatalogEntry::host("Win1255 (Hebrew)", 1255),
    CatalogEntry::host("Win1256 (Arabic)", 1256),
    CatalogEntry::host("Win1257 (Baltic)", 1257),
    CatalogEntry::host("Win1258 (Vietnamese)", 1258),
    CatalogEntry::host("CP437", 437),
    CatalogEntry::builtin("CP620 (Mazovia)", &builtin::MAZOVIA),
    CatalogEntry::host("CP819", 28591),
    CatalogEntry::host("CP878", 20866),
    CatalogEntry::host("Use font encoding", FONT_ENCODING_CODEPAGE),
];

/// Entry at `index`, if any.
#[must_use]
pub fn lookup(index: usize) -> Option<&'static CatalogEntry> {
    CATALOG.get(index)
}

/// Number of catalog entries.
#[must_use]
pub fn len() -> usize {
    CATALOG.len()
}

/// Display name of entry `index`, for UI enumeration.
#[must_use]
pub fn name(index: usize) -> Option<&'static str> {
    lookup(index).map(|entry| entry.name)
}

/// All entries in catalog order, with their indices.
pub fn entries() -> impl Iterator<Item = (usize, &'static CatalogEntry)> {
    CATALOG.iter().enumerate()
}

/// All display names in catalog order.
pub fn names() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|entry| entry.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_entries_have_no_host_codepage() {
        for (_, entry) in entries() {
            if entry.table.is_some() {
                assert_eq!(entry.os_codepage, 0, "{}", entry.name);
            } else {
                assert_ne!(entry.os_codepage, 0, "{}", entry.name);
            }
        }
    }

    #[test]
    fn table_sizes_are_upper_ranges() {
        for (_, entry) in entries().filter(|(_, e)| e.is_builtin()) {
            assert!(
                matches!(entry.table_size(), 96 | 128 | 256),
                "{} has {} entries",
                entry.name,
                entry.table_size()
            );
        }
    }

    #[test]
    fn lookup_below_table_is_identity() {
        let latin1 = lookup(0).unwrap();
        assert_eq!(latin1.lookup(b'A'), Some('A'));
        assert_eq!(latin1.lookup(0x9F), Some('\u{9F}'));
        assert_eq!(latin1.lookup(0xE9), Some('é'));
    }

    #[test]
    fn unmapped_positions_are_replacement() {
        let latin3 = lookup(2).unwrap();
        assert_eq!(latin3.lookup(0xA5), Some(char::REPLACEMENT_CHARACTER));
    }

    #[test]
    fn host_entries_have_no_table_lookup() {
        let cp437 = names().position(|n| n == "CP437").unwrap();
        assert_eq!(lookup(cp437).unwrap().lookup(0x80), None);
    }

    #[test]
    fn enumeration_stops_at_end() {
        assert_eq!(name(len()), None);
        assert_eq!(name(len() - 1), Some("Use font encoding"));
        assert_eq!(names().count(), len());
    }
}
