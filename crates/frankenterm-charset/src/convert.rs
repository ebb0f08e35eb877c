//! Bulk byte <-> Unicode conversion against a table set.
//!
//! Runs in the session's own line codepage are served from the line and
//! reverse tables. Everything else goes to the host, except built-in catalog
//! tables, which the host knows nothing about.

use crate::catalog::CatalogEntry;
use crate::glyph::Glyph;
use crate::host::{CodepageHost, ConvertFlags};
use crate::resolver::CodepageId;
use crate::tables::{ConversionTableSet, ReverseTable};

/// Byte written for scalars the line codepage cannot represent.
pub const UNENCODABLE: u8 = b'.';

impl ConversionTableSet {
    /// Decode `bytes` into `out`, returning the number of scalars written.
    ///
    /// Output is truncated to `out.len()`. Returns 0 for direct-to-font ids
    /// and for codepages the host does not support.
    pub fn decode_into<H: CodepageHost + ?Sized>(
        &self,
        host: &H,
        codepage: CodepageId,
        bytes: &[u8],
        out: &mut [char],
    ) -> usize {
        if let Some(entry) = codepage.builtin_entry() {
            let written = bytes.len().min(out.len());
            let line = codepage == self.line_codepage;
            for (slot, &byte) in out.iter_mut().zip(bytes) {
                *slot = if line {
                    self.decode_line_byte(byte)
                } else {
                    entry.lookup(byte).unwrap_or(char::from(byte))
                };
            }
            return written;
        }
        let Some(os) = codepage.os_codepage() else {
            tracing::trace!(codepage = codepage.raw(), "no decoder for codepage");
            return 0;
        };
        let decoded = host.decode(os, ConvertFlags::empty(), bytes);
        let written = decoded.len().min(out.len());
        out[..written].copy_from_slice(&decoded[..written]);
        written
    }

    /// Decode `bytes`, allocating the output.
    #[must_use]
    pub fn decode<H: CodepageHost + ?Sized>(
        &self,
        host: &H,
        codepage: CodepageId,
        bytes: &[u8],
    ) -> Vec<char> {
        if codepage.builtin_entry().is_none()
            && let Some(os) = codepage.os_codepage()
        {
            return host.decode(os, ConvertFlags::empty(), bytes);
        }
        let mut out = vec!['\0'; bytes.len()];
        let written = self.decode_into(host, codepage, bytes, &mut out);
        out.truncate(written);
        out
    }

    /// Encode `chars` into `out`, returning the number of bytes written.
    ///
    /// When `codepage` is the session's line codepage and a reverse table
    /// exists, every scalar produces exactly one byte; unmappable scalars
    /// become themselves below 0x80 and [`UNENCODABLE`] above.
    ///
    /// # Panics
    ///
    /// On the reverse-table path, if `out` is shorter than `chars`.
    pub fn encode_into<H: CodepageHost + ?Sized>(
        &self,
        host: &H,
        codepage: CodepageId,
        chars: &[char],
        out: &mut [u8],
    ) -> usize {
        if let Some(reverse) = self.reverse_for(codepage) {
            assert!(
                out.len() >= chars.len(),
                "encode output holds {} bytes, input has {} scalars",
                out.len(),
                chars.len()
            );
            for (slot, &ch) in out.iter_mut().zip(chars) {
                *slot = encode_with(reverse, ch);
            }
            return chars.len();
        }
        let encoded = self.encode_fallback(host, codepage, chars);
        let written = encoded.len().min(out.len());
        out[..written].copy_from_slice(&encoded[..written]);
        written
    }

    /// Encode `chars`, allocating the output.
    #[must_use]
    pub fn encode<H: CodepageHost + ?Sized>(
        &self,
        host: &H,
        codepage: CodepageId,
        chars: &[char],
    ) -> Vec<u8> {
        match self.reverse_for(codepage) {
            Some(reverse) => chars.iter().map(|&ch| encode_with(reverse, ch)).collect(),
            None => self.encode_fallback(host, codepage, chars),
        }
    }

    fn reverse_for(&self, codepage: CodepageId) -> Option<&ReverseTable> {
        if codepage.is_utf8() || codepage != self.line_codepage {
            return None;
        }
        self.reverse.as_ref()
    }

    fn encode_fallback<H: CodepageHost + ?Sized>(
        &self,
        host: &H,
        codepage: CodepageId,
        chars: &[char],
    ) -> Vec<u8> {
        if let Some(entry) = codepage.builtin_entry() {
            return chars.iter().map(|&ch| encode_builtin(entry, ch)).collect();
        }
        match codepage.os_codepage() {
            Some(os) => host.encode(os, ConvertFlags::empty(), chars),
            None => {
                tracing::trace!(codepage = codepage.raw(), "no encoder for codepage");
                Vec::new()
            }
        }
    }

    /// Unicode value of a line byte, following any font link.
    fn decode_line_byte(&self, byte: u8) -> char {
        match self.resolve_glyph(self.line[usize::from(byte)]) {
            Glyph::Char(ch) => ch,
            _ => char::REPLACEMENT_CHARACTER,
        }
    }
}

fn encode_with(reverse: &ReverseTable, ch: char) -> u8 {
    reverse.get(ch).unwrap_or_else(|| unencodable(ch))
}

fn encode_builtin(entry: &CatalogEntry, ch: char) -> u8 {
    (1..=0xFF_u8)
        .find(|&byte| entry.lookup(byte) == Some(ch))
        .unwrap_or_else(|| unencodable(ch))
}

fn unencodable(ch: char) -> u8 {
    if ch.is_ascii() { ch as u8 } else { UNENCODABLE }
}

/// Whether `byte` starts a two-byte sequence in `codepage`.
///
/// Built-in tables and sentinels are single-byte.
pub fn is_lead_byte<H: CodepageHost + ?Sized>(host: &H, codepage: CodepageId, byte: u8) -> bool {
    codepage.builtin_entry().is_none()
        && codepage
            .os_codepage()
            .is_some_and(|os| host.is_lead_byte(os, byte))
}
