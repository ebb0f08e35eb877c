//! End-to-end behavior of name resolution, table construction and
//! conversion, driven through the public API with deterministic hosts.

use frankenterm_charset::host::{CodepageInfo, ConvertFlags};
use frankenterm_charset::tables::fill_table;
use frankenterm_charset::{
    CodepageHost, CodepageId, ConversionTableSet, Glyph, PortableHost, TableMode, WordClass,
    catalog, name_of, resolve,
};

const FULL_LATIN1: &str = "ISO-8859-1:1998 (Latin-1, West Europe)";

fn windows_host() -> PortableHost {
    PortableHost::new(1252, 437)
}

/// A host that claims not to know one codepage.
struct RejectingHost {
    inner: PortableHost,
    rejected: u16,
}

impl CodepageHost for RejectingHost {
    fn default_codepage(&self) -> u16 {
        self.inner.default_codepage()
    }
    fn oem_codepage(&self) -> u16 {
        self.inner.oem_codepage()
    }
    fn describe(&self, codepage: u16) -> Option<CodepageInfo> {
        if self.resolve_alias(codepage) == self.rejected {
            None
        } else {
            self.inner.describe(codepage)
        }
    }
    fn decode_byte(&self, codepage: u16, flags: ConvertFlags, byte: u8) -> Option<char> {
        self.inner.decode_byte(codepage, flags, byte)
    }
    fn decode(&self, codepage: u16, flags: ConvertFlags, bytes: &[u8]) -> Vec<char> {
        self.inner.decode(codepage, flags, bytes)
    }
    fn encode(&self, codepage: u16, flags: ConvertFlags, chars: &[char]) -> Vec<u8> {
        self.inner.encode(codepage, flags, chars)
    }
    fn is_lead_byte(&self, codepage: u16, byte: u8) -> bool {
        self.inner.is_lead_byte(codepage, byte)
    }
}

#[test]
fn koi8u_resolves_to_its_builtin_table() {
    let host = windows_host();
    let index = catalog::names().position(|n| n == "KOI8-U").unwrap();
    let id = resolve(&host, "KOI8-U").unwrap();
    assert_eq!(id, CodepageId::builtin(index));
    assert_eq!(name_of(id), "KOI8-U");
}

#[test]
fn utf8_decodes_ascii_as_identity() {
    let host = windows_host();
    let id = resolve(&host, "UTF-8").unwrap();
    assert_eq!(id, CodepageId::UTF8);
    let tables = ConversionTableSet::build(&host, CodepageId::ANSI, id, false);
    assert_eq!(tables.decode(&host, id, &[0x41, 0x42]), vec!['A', 'B']);
}

#[test]
fn shared_double_byte_codepage_goes_straight_to_font() {
    let host = PortableHost::new(932, 437);
    let cp932 = CodepageId::os(932);
    let tables = ConversionTableSet::build(&host, cp932, cp932, true);
    assert!(tables.is_direct_to_font());
    assert_eq!(tables.line()[65], Glyph::font(65));
    assert!(tables.line().iter().all(|slot| slot.is_direct_font()));
    assert!(tables.reverse().is_none());
}

#[test]
fn word_classes_of_representative_characters() {
    let host = windows_host();
    let latin1 = resolve(&host, "ISO-8859-1").unwrap();
    let tables = ConversionTableSet::build(&host, CodepageId::ANSI, latin1, false);
    assert_eq!(tables.class_of(Glyph::Char('\u{3042}')), WordClass::WideScript);
    assert_eq!(tables.class_of(Glyph::Char(' ')), WordClass::Break);
    assert_eq!(tables.class_of(Glyph::Char('A')), WordClass::Word);
}

#[test]
fn fuzzy_variants_resolve_alike() {
    let host = windows_host();
    let expected = resolve(&host, FULL_LATIN1).unwrap();
    assert_eq!(expected, CodepageId::builtin(0));
    for name in ["iso-8859-1", "ISO8859-1", "iso 8859 1", "Iso_8859_1:1998", "ISO-8859-1:1998 (latin"] {
        assert_eq!(resolve(&host, name).unwrap(), expected, "{name}");
    }
}

#[test]
fn empty_name_follows_system_default() {
    let host = windows_host();
    assert_eq!(resolve(&host, "").unwrap(), resolve(&host, "ISO-8859-1").unwrap());

    let cyrillic = PortableHost::new(1251, 866);
    assert_eq!(resolve(&cyrillic, "").unwrap(), resolve(&cyrillic, "KOI8-U").unwrap());

    let japanese = PortableHost::new(932, 437);
    assert_eq!(resolve(&japanese, "").unwrap(), CodepageId::FONT_DIRECT);
}

#[test]
fn out_of_range_numbers_are_unknown() {
    let host = windows_host();
    for name in ["cp9999999", "70000", "ibm65536"] {
        let err = resolve(&host, name).unwrap_err();
        assert_eq!(err.code(), -2, "{name}");
    }
}

#[test]
fn multi_byte_host_codepages_are_rejected() {
    let host = windows_host();
    let err = resolve(&host, "cp932").unwrap_err();
    assert_eq!(err.code(), -3);
    assert!(resolve(&host, "UTF-8").is_ok());
}

#[test]
fn host_rejection_falls_through_to_numeric_parse() {
    let host = RejectingHost {
        inner: windows_host(),
        rejected: 1252,
    };
    assert_eq!(resolve(&host, "Win1252").unwrap_err().code(), -2);
    assert_eq!(resolve(&host, "cp1252").unwrap_err().code(), -2);
    assert_eq!(resolve(&host, "Win1251").unwrap(), CodepageId::os(1251));
}

#[test]
fn numeric_names_and_aliases() {
    let host = PortableHost::new(1250, 866);
    assert_eq!(resolve(&host, "cp866").unwrap(), CodepageId::os(866));
    assert_eq!(resolve(&host, "IBM437").unwrap(), CodepageId::os(437));
    assert_eq!(resolve(&host, "0").unwrap(), CodepageId::os(1250));
    assert_eq!(resolve(&host, "1").unwrap(), CodepageId::os(866));
    assert_eq!(name_of(CodepageId::os(866)), "CP866");
    assert_eq!(name_of(CodepageId::os(437)), "CP437");
}

#[test]
fn builtin_tables_are_total_with_identity_below_range() {
    let host = windows_host();
    for (index, entry) in catalog::entries().filter(|(_, e)| e.is_builtin()) {
        let mut table = [Glyph::font(0); 256];
        fill_table(&host, CodepageId::builtin(index), TableMode::Line, &mut table);
        let first = 256 - entry.table_size();
        for (byte, slot) in table.iter().enumerate() {
            let ch = slot.as_char().unwrap_or_else(|| panic!("{} slot {byte} unset", entry.name));
            if byte < first {
                assert_eq!(u32::from(ch), byte as u32, "{} slot {byte}", entry.name);
            }
        }
    }
}

#[test]
fn builtin_round_trip_picks_lowest_colliding_byte() {
    let host = windows_host();
    for (index, entry) in catalog::entries().filter(|(_, e)| e.is_builtin()) {
        let id = CodepageId::builtin(index);
        let tables = ConversionTableSet::build(&host, id, id, false);
        for byte in 1..=0xFF_u8 {
            if !matches!(tables.font()[usize::from(byte)], Glyph::Char(_)) {
                continue;
            }
            let decoded = tables.decode(&host, id, &[byte]);
            let encoded = tables.encode(&host, id, &decoded);
            let lowest = (1..=0xFF_u8)
                .find(|&b| entry.lookup(b) == Some(decoded[0]))
                .unwrap();
            assert_eq!(encoded, vec![lowest], "{} byte {byte:#04x}", entry.name);
        }
    }
}

#[test]
fn catalog_enumeration_matches_names() {
    assert_eq!(catalog::len(), catalog::names().count());
    assert_eq!(catalog::name(0), Some(FULL_LATIN1));
    for index in 0..catalog::len() {
        let entry = catalog::lookup(index).unwrap();
        assert_eq!(catalog::name(index), Some(entry.name));
    }
}

#[test]
fn name_of_returns_first_sharing_entry() {
    let host = windows_host();
    for (index, entry) in catalog::entries().filter(|(_, e)| e.is_builtin()) {
        let id = CodepageId::builtin(index);
        assert_eq!(name_of(id), entry.name);
        assert_eq!(resolve(&host, &name_of(id)).unwrap(), id);
    }
    assert_eq!(name_of(CodepageId::FONT_DIRECT), "Use font encoding");
}
