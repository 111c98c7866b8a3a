//! Single-byte code page tables and `/Differences` arrays
//!
//! Code page maps use the line format `!XX U+XXXX glyphname`, one byte
//! position per line. Positions that do not appear keep the `.notdef` glyph.

use crate::error::{PdfError, Result};
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Glyph name of unmapped slots
pub const NOTDEF: &str = ".notdef";

/// First byte position written to `/Widths` and `/Differences`
pub const FIRST_CHAR: usize = 32;

const CP1252_MAP: &str = include_str!("maps/cp1252.map");

lazy_static::lazy_static! {
    static ref MAP_LINE: Regex =
        Regex::new(r"^!([0-9A-Fa-f]+) U\+([0-9A-Fa-f]+) (\S+)$").expect("map line pattern");
}

/// One byte position of a code page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingEntry {
    /// Unicode code point, or -1 when the slot is unmapped
    pub code_point: i32,
    pub glyph_name: String,
}

impl EncodingEntry {
    fn unmapped() -> Self {
        EncodingEntry {
            code_point: -1,
            glyph_name: NOTDEF.to_string(),
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.glyph_name != NOTDEF
    }
}

/// Fixed 256-slot code page, indexed by byte value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingTable {
    entries: [EncodingEntry; 256],
}

impl EncodingTable {
    /// Load a map file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PdfError::NotFound(path.to_path_buf()),
            _ => PdfError::Io(e),
        })?;
        let table = Self::from_reader(BufReader::new(file))?;
        tracing::debug!(
            "Loaded encoding map {} ({} mapped slots)",
            path.display(),
            table.mapped_count()
        );
        Ok(table)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut table = Self::unmapped();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            table.apply_line(index + 1, &line)?;
        }
        Ok(table)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut table = Self::unmapped();
        for (index, line) in text.lines().enumerate() {
            table.apply_line(index + 1, line)?;
        }
        Ok(table)
    }

    /// The Windows-1252 code page bundled with the crate
    pub fn cp1252() -> Result<Self> {
        Self::parse(CP1252_MAP)
    }

    /// A table where every slot is `.notdef`
    pub fn unmapped() -> Self {
        EncodingTable {
            entries: std::array::from_fn(|_| EncodingEntry::unmapped()),
        }
    }

    fn apply_line(&mut self, line_number: usize, line: &str) -> Result<()> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let captures = MAP_LINE.captures(line).ok_or_else(|| {
            PdfError::ParseError(format!(
                "encoding map line {line_number}: expected `!XX U+XXXX name`, found {line:?}"
            ))
        })?;

        let position = usize::from_str_radix(&captures[1], 16).map_err(|e| {
            PdfError::ParseError(format!("encoding map line {line_number}: {e}"))
        })?;
        if position > 0xFF {
            return Err(PdfError::ParseError(format!(
                "encoding map line {line_number}: map position 0x{position:X} exceeds 0xFF"
            )));
        }
        let code_point = i32::from_str_radix(&captures[2], 16).map_err(|e| {
            PdfError::ParseError(format!("encoding map line {line_number}: {e}"))
        })?;

        self.entries[position] = EncodingEntry {
            code_point,
            glyph_name: captures[3].to_string(),
        };
        Ok(())
    }

    pub fn entry(&self, byte: u8) -> &EncodingEntry {
        &self.entries[byte as usize]
    }

    pub fn glyph_name(&self, byte: u8) -> &str {
        &self.entries[byte as usize].glyph_name
    }

    pub fn entries(&self) -> &[EncodingEntry; 256] {
        &self.entries
    }

    pub fn mapped_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_mapped()).count()
    }
}

/// `/Differences` body describing how `font` deviates from `reference` over
/// byte positions 32 through 255.
///
/// A position number starts every run of consecutive differing slots, and
/// each differing slot contributes its `/glyphname`. Identical tables yield
/// an empty string.
pub fn differences(font: &EncodingTable, reference: &EncodingTable) -> String {
    let mut tokens = Vec::new();
    let mut last = None;

    for position in FIRST_CHAR..256 {
        let name = &font.entries[position].glyph_name;
        if *name == reference.entries[position].glyph_name {
            continue;
        }
        if last != Some(position - 1) {
            tokens.push(position.to_string());
        }
        tokens.push(format!("/{name}"));
        last = Some(position);
    }

    tokens.join(" ")
}
