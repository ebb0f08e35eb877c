//! Conversion table construction.
//!
//! A [`ConversionTableSet`] holds everything the renderer and the input path
//! need for one encoding configuration:
//!
//! - `font`: byte -> glyph for the loaded screen font.
//! - `oem`: byte -> glyph for the host's OEM codepage.
//! - `sco`: CP437, used for the SCO alternate character set.
//! - `line`: byte -> glyph for bytes arriving from the remote peer.
//! - `xterm`: `line` with the VT100 special graphics overlaid on `0x60..=0x7F`.
//! - a control mask over the line table,
//! - a sparse reverse table (Unicode -> line byte) for outgoing text.
//!
//! Wherever a `line`/`sco`/`xterm` value also appears in the font table it is
//! replaced by a direct font index, so the renderer can draw straight from the
//! font without a second lookup.
//!
//! A set is immutable once built. Reconfiguration builds a new set and
//! publishes it whole (see [`CodepageSession`](crate::session::CodepageSession)).

use rustc_hash::FxHashMap;

use crate::builtin::VT100_GRAPHICS;
use crate::glyph::{Charset, FontPage, Glyph, UNMAPPED};
use crate::host::{CodepageHost, ConvertFlags};
use crate::resolver::CodepageId;

/// One forward table.
pub type Table = [Glyph; 256];

/// First byte covered by the VT100 special graphics overlay.
pub const LINE_DRAWING_START: u8 = 0x60;

const CP437: CodepageId = CodepageId::os(437);

/// How a forward table is sourced from its codepage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMode {
    /// All 256 positions, control bytes kept as controls.
    Line,
    /// All 256 positions, glyph characters preferred.
    Plain,
    /// Positions 0-127 only, glyph characters preferred.
    GlyphLowHalf,
}

impl TableMode {
    const fn flags(self) -> ConvertFlags {
        match self {
            Self::Line => ConvertFlags::ERR_INVALID_CHARS,
            Self::Plain | Self::GlyphLowHalf => {
                ConvertFlags::ERR_INVALID_CHARS.union(ConvertFlags::USE_GLYPH_CHARS)
            }
        }
    }

    const fn len(self) -> usize {
        match self {
            Self::Line | Self::Plain => 256,
            Self::GlyphLowHalf => 128,
        }
    }
}

/// Fill `table` from `codepage`, leaving positions beyond `mode`'s range untouched.
///
/// Bytes the host cannot convert become U+FFFD.
pub fn fill_table<H: CodepageHost + ?Sized>(
    host: &H,
    codepage: CodepageId,
    mode: TableMode,
    table: &mut Table,
) {
    let len = mode.len();
    if codepage.is_utf8() {
        for (i, slot) in table.iter_mut().take(len).enumerate() {
            *slot = Glyph::Char(char::from(i as u8));
        }
        return;
    }
    if let Some(entry) = codepage.builtin_entry() {
        for (i, slot) in table.iter_mut().take(len).enumerate() {
            let byte = i as u8;
            *slot = Glyph::Char(entry.lookup(byte).unwrap_or(char::from(byte)));
        }
        return;
    }
    let codepage = codepage.os_codepage().map(|cp| host.resolve_alias(cp));
    let flags = mode.flags();
    for (i, slot) in table.iter_mut().take(len).enumerate() {
        let ch = codepage
            .and_then(|cp| host.decode_byte(cp, flags, i as u8))
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        *slot = Glyph::Char(ch);
    }
}

fn table_for<H: CodepageHost + ?Sized>(host: &H, codepage: CodepageId, mode: TableMode) -> Table {
    let mut table = [Glyph::Char(char::REPLACEMENT_CHARACTER); 256];
    fill_table(host, codepage, mode, &mut table);
    table
}

// ---------------------------------------------------------------------------
// Reverse table
// ---------------------------------------------------------------------------

/// Sparse Unicode -> byte map for the line codepage.
///
/// Buckets are keyed by the high byte of a BMP code point and allocated on
/// first use. A zero byte in a bucket means "no mapping", so byte 0 is never
/// recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseTable {
    buckets: Vec<Option<Box<[u8; 256]>>>,
}

impl ReverseTable {
    fn new() -> Self {
        Self {
            buckets: vec![None; 256],
        }
    }

    /// Build from a line table, or `None` if no slot holds a literal scalar.
    ///
    /// Bytes are visited in ascending order and the first byte recorded for a
    /// scalar wins.
    #[must_use]
    pub fn from_line(line: &Table) -> Option<Self> {
        let mut reverse = Self::new();
        for (byte, slot) in line.iter().enumerate() {
            if let Glyph::Char(ch) = *slot {
                reverse.insert(ch, byte as u8);
            }
        }
        (reverse.bucket_count() > 0).then_some(reverse)
    }

    fn insert(&mut self, ch: char, byte: u8) {
        let Ok(code) = u16::try_from(u32::from(ch)) else {
            return;
        };
        let [high, low] = code.to_be_bytes();
        let bucket = self.buckets[usize::from(high)].get_or_insert_with(|| Box::new([0; 256]));
        if byte != 0 && bucket[usize::from(low)] == 0 {
            bucket[usize::from(low)] = byte;
        }
    }

    /// Byte that `ch` encodes to, if any.
    #[must_use]
    pub fn get(&self, ch: char) -> Option<u8> {
        let code = u16::try_from(u32::from(ch)).ok()?;
        let [high, low] = code.to_be_bytes();
        let bucket = self.buckets[usize::from(high)].as_ref()?;
        match bucket[usize::from(low)] {
            0 => None,
            byte => Some(byte),
        }
    }

    /// Number of allocated buckets.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.iter().filter(|b| b.is_some()).count()
    }
}

// ---------------------------------------------------------------------------
// Table set
// ---------------------------------------------------------------------------

/// All conversion tables for one encoding configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTableSet {
    pub(crate) font_codepage: CodepageId,
    pub(crate) line_codepage: CodepageId,
    pub(crate) dbcs_font: bool,
    pub(crate) direct_to_font: bool,
    pub(crate) font: Table,
    pub(crate) oem: Table,
    pub(crate) sco: Table,
    pub(crate) line: Table,
    pub(crate) xterm: Table,
    pub(crate) control: [bool; 256],
    pub(crate) reverse: Option<ReverseTable>,
}

impl ConversionTableSet {
    /// Build the tables for a font codepage, a line codepage and font kind.
    ///
    /// A font codepage `<= 0` means the font's own ANSI encoding (and clears
    /// `dbcs_font`); a line codepage `<= 0` follows the font codepage.
    /// Never fails: positions the host cannot convert hold U+FFFD.
    pub fn build<H: CodepageHost + ?Sized>(
        host: &H,
        font_codepage: CodepageId,
        line_codepage: CodepageId,
        dbcs_font: bool,
    ) -> Self {
        let (font_codepage, dbcs_font) = if font_codepage.raw() <= 0 {
            (CodepageId::ANSI, false)
        } else {
            (font_codepage, dbcs_font)
        };
        let line_codepage = if line_codepage.raw() <= 0 {
            font_codepage
        } else {
            line_codepage
        };
        let font_is_direct = dbcs_font || font_codepage == CodepageId::ANSI;

        let mut font = [Glyph::Char(char::REPLACEMENT_CHARACTER); 256];
        if font_is_direct {
            fill_table(host, font_codepage, TableMode::GlyphLowHalf, &mut font);
            for byte in 0x80..=0xFF_u8 {
                font[usize::from(byte)] = Glyph::font(byte);
            }
        } else {
            fill_table(host, font_codepage, TableMode::Plain, &mut font);
            // CP437 fonts are often broken at both ends.
            if font_codepage == CP437 {
                font[0x00] = Glyph::Char(UNMAPPED);
                font[0xFF] = Glyph::Char(UNMAPPED);
            }
        }

        let oem = table_for(host, CodepageId::OEM, TableMode::Plain);
        let mut sco = table_for(host, CP437, TableMode::Plain);

        let direct_to_font = line_codepage == font_codepage && font_is_direct;
        let mut line = if direct_to_font {
            std::array::from_fn(|i| {
                let byte = i as u8;
                if byte < 0x20 || byte == 0x7F {
                    Glyph::Char(char::from(byte))
                } else {
                    Glyph::font(byte)
                }
            })
        } else {
            table_for(host, line_codepage, TableMode::Line)
        };

        let mut xterm = line;
        for (offset, &unit) in VT100_GRAPHICS.iter().enumerate() {
            let ch = char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER);
            xterm[usize::from(LINE_DRAWING_START) + offset] = Glyph::Char(ch);
        }
        xterm[usize::from(b'_')] = Glyph::Char(' ');

        let reverse = if direct_to_font {
            None
        } else {
            ReverseTable::from_line(&line)
        };
        let control = control_mask(&line);

        let index = FontIndex::new(&font);
        index.link(&mut line);
        index.link(&mut sco);
        index.link(&mut xterm);

        // CJK fonts draw a currency sign at 0x5C but report it as U+005C.
        if dbcs_font && font_codepage != line_codepage {
            line[usize::from(b'\\')] = Glyph::oem(b'\\');
        }

        tracing::debug!(
            font = font_codepage.raw(),
            line = line_codepage.raw(),
            dbcs_font,
            direct_to_font,
            reverse_buckets = reverse.as_ref().map_or(0, ReverseTable::bucket_count),
            "built conversion tables"
        );

        Self {
            font_codepage,
            line_codepage,
            dbcs_font,
            direct_to_font,
            font,
            oem,
            sco,
            line,
            xterm,
            control,
            reverse,
        }
    }

    #[must_use]
    pub fn font_codepage(&self) -> CodepageId {
        self.font_codepage
    }

    #[must_use]
    pub fn line_codepage(&self) -> CodepageId {
        self.line_codepage
    }

    #[must_use]
    pub fn is_dbcs_font(&self) -> bool {
        self.dbcs_font
    }

    /// Whether line bytes address the font directly (no reverse table).
    #[must_use]
    pub fn is_direct_to_font(&self) -> bool {
        self.direct_to_font
    }

    #[must_use]
    pub fn font(&self) -> &Table {
        &self.font
    }

    #[must_use]
    pub fn oem(&self) -> &Table {
        &self.oem
    }

    #[must_use]
    pub fn sco(&self) -> &Table {
        &self.sco
    }

    #[must_use]
    pub fn line(&self) -> &Table {
        &self.line
    }

    #[must_use]
    pub fn xterm(&self) -> &Table {
        &self.xterm
    }

    #[must_use]
    pub fn reverse(&self) -> Option<&ReverseTable> {
        self.reverse.as_ref()
    }

    /// Whether line byte `byte` is a control character.
    #[must_use]
    pub fn is_control(&self, byte: u8) -> bool {
        self.control[usize::from(byte)]
    }

    /// `Some(byte)` if `byte` is a control character under the line table.
    #[must_use]
    pub fn control_byte(&self, byte: u8) -> Option<u8> {
        self.is_control(byte).then_some(byte)
    }

    /// De-alias a glyph: charset bytes go through their table, then direct
    /// font indices go through the font or OEM table.
    #[must_use]
    pub fn resolve_glyph(&self, glyph: Glyph) -> Glyph {
        let glyph = match glyph {
            Glyph::DirectChar(Charset::Ascii, b) => self.line[usize::from(b)],
            Glyph::DirectChar(Charset::LineDrawing, b) => self.xterm[usize::from(b)],
            Glyph::DirectChar(Charset::ScoAcs, b) => self.sco[usize::from(b)],
            other => other,
        };
        match glyph {
            Glyph::DirectFont(FontPage::Ansi, b) => self.font[usize::from(b)],
            Glyph::DirectFont(FontPage::Oem, b) => self.oem[usize::from(b)],
            other => other,
        }
    }
}

fn control_mask(line: &Table) -> [bool; 256] {
    std::array::from_fn(|i| match line[i] {
        Glyph::Char(ch) => matches!(u32::from(ch), 0x00..=0x1F | 0x7F..=0x9F),
        _ => false,
    })
}

/// Scalar -> font index, in the order the font is searched (32 upward, wrapping).
struct FontIndex(FxHashMap<char, u8>);

impl FontIndex {
    fn new(font: &Table) -> Self {
        let mut map = FxHashMap::default();
        for i in 0..256_usize {
            let index = ((32 + i) & 0xFF) as u8;
            if let Glyph::Char(ch) = font[usize::from(index)] {
                map.entry(ch).or_insert(index);
            }
        }
        Self(map)
    }

    fn link(&self, table: &mut Table) {
        for slot in table.iter_mut() {
            if let Glyph::Char(ch) = *slot
                && let Some(&index) = self.0.get(&ch)
            {
                *slot = Glyph::font(index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::host::PortableHost;

    fn builtin(name: &str) -> CodepageId {
        CodepageId::builtin(catalog::names().position(|n| n == name).unwrap())
    }

    #[test]
    fn reverse_table_first_writer_wins() {
        let mut line = [Glyph::Char('x'); 256];
        line[0] = Glyph::Char('a');
        line[5] = Glyph::Char('a');
        line[9] = Glyph::Char('b');
        line[10] = Glyph::font(10);
        line[200] = Glyph::Char('\u{1F600}');
        let reverse = ReverseTable::from_line(&line).unwrap();
        assert_eq!(reverse.get('a'), Some(5));
        assert_eq!(reverse.get('b'), Some(9));
        assert_eq!(reverse.get('x'), Some(1));
        assert_eq!(reverse.get('\u{1F600}'), None);
        assert_eq!(reverse.get('z'), None);
        assert_eq!(reverse.bucket_count(), 1);
    }

    #[test]
    fn reverse_table_absent_without_literals() {
        let line = std::array::from_fn(|i| Glyph::font(i as u8));
        assert!(ReverseTable::from_line(&line).is_none());
    }

    #[test]
    fn builtin_line_table_is_total() {
        let host = PortableHost::default();
        let koi8 = builtin("KOI8-U");
        let mut table = [Glyph::font(0); 256];
        fill_table(&host, koi8, TableMode::Line, &mut table);
        assert_eq!(table[usize::from(b'A')], Glyph::Char('A'));
        assert_eq!(table[0xC1], Glyph::Char('а'));
        assert!(table.iter().all(|g| g.as_char().is_some()));
    }

    #[test]
    fn low_half_mode_leaves_upper_half() {
        let host = PortableHost::default();
        let mut table = [Glyph::font(7); 256];
        fill_table(&host, CodepageId::os(1252), TableMode::GlyphLowHalf, &mut table);
        assert_eq!(table[0x41], Glyph::Char('A'));
        assert_eq!(table[0x80], Glyph::font(7));
    }

    #[test]
    fn utf8_tables_are_identity() {
        let host = PortableHost::default();
        let table = table_for(&host, CodepageId::UTF8, TableMode::Line);
        assert_eq!(table[0xE9], Glyph::Char('\u{E9}'));
    }

    #[test]
    fn xterm_overlay_and_underscore() {
        let host = PortableHost::default();
        let latin1 = builtin("ISO-8859-1:1998 (Latin-1, West Europe)");
        let tables = ConversionTableSet::build(&host, latin1, latin1, false);
        assert_eq!(tables.resolve_glyph(tables.xterm()[0x71]), Glyph::Char('\u{2500}'));
        assert_eq!(tables.resolve_glyph(tables.xterm()[0x5F]), Glyph::Char(' '));
        assert_eq!(tables.resolve_glyph(tables.line()[0x5F]), Glyph::Char('_'));
    }

    #[test]
    fn control_mask_follows_line_values() {
        let host = PortableHost::default();
        let latin1 = builtin("ISO-8859-1:1998 (Latin-1, West Europe)");
        let tables = ConversionTableSet::build(&host, latin1, latin1, false);
        assert_eq!(tables.control_byte(0x1B), Some(0x1B));
        assert_eq!(tables.control_byte(0x85), Some(0x85));
        assert_eq!(tables.control_byte(b'A'), None);
        assert!(tables.is_control(0x7F));
        assert!(!tables.is_control(0xA0));
    }

    #[test]
    fn cp437_font_drops_both_ends() {
        let host = PortableHost::default();
        let tables = ConversionTableSet::build(&host, CP437, CodepageId::os(1252), false);
        assert_eq!(tables.font()[0x00], Glyph::Char(UNMAPPED));
        assert_eq!(tables.font()[0xFF], Glyph::Char(UNMAPPED));
        assert_eq!(tables.font()[0x01], Glyph::Char('\u{263A}'));
    }

    #[test]
    fn line_values_link_to_font_indices() {
        let host = PortableHost::default();
        let tables = ConversionTableSet::build(&host, CodepageId::os(1252), CodepageId::os(1252), false);
        // Search starts at 32, so printable bytes link to themselves.
        assert_eq!(tables.line()[usize::from(b'A')], Glyph::font(b'A'));
        assert_eq!(tables.line()[0xE9], Glyph::font(0xE9));
        // CP437 box drawing is absent from a 1252 font and stays literal.
        assert_eq!(tables.sco()[0xC4], Glyph::Char('\u{2500}'));
    }

    #[test]
    fn dbcs_font_with_other_line_codepage_overrides_backslash() {
        let host = PortableHost::new(932, 437);
        let tables = ConversionTableSet::build(&host, CodepageId::os(932), CodepageId::os(1252), true);
        assert!(!tables.is_direct_to_font());
        assert_eq!(tables.line()[usize::from(b'\\')], Glyph::oem(b'\\'));
        assert_eq!(tables.font()[0x90], Glyph::font(0x90));
        assert!(tables.reverse().is_some());
    }

    #[test]
    fn non_positive_codepages_are_normalized() {
        let host = PortableHost::new(1252, 437);
        let tables = ConversionTableSet::build(&host, CodepageId::FONT_DIRECT, CodepageId::FONT_DIRECT, true);
        assert_eq!(tables.font_codepage(), CodepageId::ANSI);
        assert_eq!(tables.line_codepage(), CodepageId::ANSI);
        assert!(!tables.is_dbcs_font());
        assert!(tables.is_direct_to_font());
        assert!(tables.reverse().is_none());
    }

    /// Host whose codepage 9000 repeats 'A' at byte 5 and has 'Ω' only at byte 6.
    struct LowDuplicateHost(PortableHost);

    const LOW_DUPLICATES: u16 = 9000;

    impl CodepageHost for LowDuplicateHost {
        fn default_codepage(&self) -> u16 {
            self.0.default_codepage()
        }
        fn oem_codepage(&self) -> u16 {
            self.0.oem_codepage()
        }
        fn describe(&self, codepage: u16) -> Option<crate::host::CodepageInfo> {
            self.0.describe(codepage)
        }
        fn decode_byte(&self, codepage: u16, flags: ConvertFlags, byte: u8) -> Option<char> {
            if codepage != LOW_DUPLICATES {
                return self.0.decode_byte(codepage, flags, byte);
            }
            Some(match byte {
                5 => 'A',
                6 => '\u{3A9}',
                other => char::from(other),
            })
        }
        fn decode(&self, codepage: u16, flags: ConvertFlags, bytes: &[u8]) -> Vec<char> {
            self.0.decode(codepage, flags, bytes)
        }
        fn encode(&self, codepage: u16, flags: ConvertFlags, chars: &[char]) -> Vec<u8> {
            self.0.encode(codepage, flags, chars)
        }
        fn is_lead_byte(&self, codepage: u16, byte: u8) -> bool {
            self.0.is_lead_byte(codepage, byte)
        }
    }

    #[test]
    fn font_search_wraps_to_low_indices() {
        let host = PortableHost::default();
        let tables = ConversionTableSet::build(&host, CP437, CodepageId::os(1252), false);
        // U+263A exists only at CP437 font index 1.
        assert_eq!(tables.sco()[0x01], Glyph::font(1));
        assert_eq!(tables.resolve_glyph(tables.sco()[0x01]), Glyph::Char('\u{263A}'));
    }

    #[test]
    fn font_search_prefers_indices_from_32() {
        let host = LowDuplicateHost(PortableHost::default());
        let font = CodepageId::os(LOW_DUPLICATES);
        let latin1 = builtin("ISO-8859-1:1998 (Latin-1, West Europe)");
        let tables = ConversionTableSet::build(&host, font, latin1, false);
        assert_eq!(tables.font()[5], Glyph::Char('A'));
        assert_eq!(tables.line()[usize::from(b'A')], Glyph::font(b'A'));
        // CP437 0xEA is omega, found only after the search wraps.
        assert_eq!(tables.sco()[0xEA], Glyph::font(6));
    }

    #[test]
    fn oem_table_follows_host_oem_codepage() {
        let host = PortableHost::new(1251, 866);
        let cp1251 = CodepageId::os(1251);
        let tables = ConversionTableSet::build(&host, cp1251, cp1251, false);
        assert_eq!(tables.oem()[0x80], Glyph::Char('\u{410}'));
        assert_eq!(tables.font()[0x80], Glyph::Char('\u{402}'));
        assert_eq!(tables.resolve_glyph(Glyph::oem(0x80)), Glyph::Char('\u{410}'));
        assert_eq!(tables.resolve_glyph(Glyph::font(0x80)), Glyph::Char('\u{402}'));
    }

    #[test]
    fn oem_glyphs_classify_through_oem_table() {
        use crate::word::WordClass;

        let host = PortableHost::new(1251, 866);
        let cp1251 = CodepageId::os(1251);
        let tables = ConversionTableSet::build(&host, cp1251, cp1251, false);
        // CP866 0xFF is a no-break space; CP1251 0xFF is a letter.
        assert_eq!(tables.class_of(Glyph::oem(0xFF)), WordClass::Break);
        assert_eq!(tables.class_of(Glyph::font(0xFF)), WordClass::Punctuation);
    }
}
