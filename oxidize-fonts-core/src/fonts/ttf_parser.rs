//! TrueType/OpenType table reader
//!
//! Reads the handful of sfnt tables the metrics extractor needs. Glyph
//! outlines are never touched, so CFF-flavoured OpenType files work as long
//! as the metric tables are present.

use crate::error::{PdfError, Result};
use std::collections::HashMap;

/// Table record from the sfnt directory
#[derive(Debug, Clone, Copy)]
struct TableRecord {
    offset: u32,
    length: u32,
}

/// Font bounding box in font units, as stored in `head`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitsBox {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

/// Values taken from the `OS/2` table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Os2Metrics {
    pub version: u16,
    pub weight_class: u16,
    pub fs_type: u16,
    pub typo_ascender: i16,
    pub typo_descender: i16,
    /// Only present from table version 2 on
    pub cap_height: Option<i16>,
}

/// Values taken from the `post` table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostMetrics {
    pub italic_angle: f64,
    pub underline_position: i16,
    pub underline_thickness: i16,
    pub is_fixed_pitch: bool,
}

/// TrueType font parser
pub struct TtfParser<'a> {
    data: &'a [u8],
    tables: HashMap<[u8; 4], TableRecord>,
}

impl<'a> TtfParser<'a> {
    /// Parse the table directory of an sfnt font
    pub fn new(data: &'a [u8]) -> Result<Self> {
        if data.len() < 12 {
            return Err(PdfError::ParseError("TTF header too small".into()));
        }

        let signature = read_u32(data, 0)?;
        match signature {
            0x0001_0000 | 0x7472_7565 | 0x4F54_544F => {} // 1.0, 'true', 'OTTO'
            0x7474_6366 => {
                return Err(PdfError::ParseError(
                    "TrueType collections (ttcf) are not supported".into(),
                ))
            }
            other => {
                return Err(PdfError::ParseError(format!(
                    "Invalid font signature: 0x{other:08X}"
                )))
            }
        }

        let num_tables = read_u16(data, 4)?;
        let mut tables = HashMap::with_capacity(num_tables as usize);
        let mut offset = 12;
        for _ in 0..num_tables {
            let tag = read_tag(data, offset)?;
            let record = TableRecord {
                offset: read_u32(data, offset + 8)?,
                length: read_u32(data, offset + 12)?,
            };
            tables.insert(tag, record);
            offset += 16;
        }

        Ok(TtfParser { data, tables })
    }

    fn table(&self, tag: &[u8; 4]) -> Option<&'a [u8]> {
        let record = self.tables.get(tag)?;
        let start = record.offset as usize;
        let end = start.checked_add(record.length as usize)?;
        self.data.get(start..end)
    }

    fn required_table(&self, tag: &[u8; 4]) -> Result<&'a [u8]> {
        self.table(tag).ok_or_else(|| {
            PdfError::ParseError(format!(
                "Missing {} table",
                String::from_utf8_lossy(tag).trim_end()
            ))
        })
    }

    pub fn units_per_em(&self) -> Result<u16> {
        let head = self.required_table(b"head")?;
        let units = read_u16(head, 18)?;
        if units == 0 {
            return Err(PdfError::ParseError("unitsPerEm is zero".into()));
        }
        Ok(units)
    }

    pub fn bounding_box(&self) -> Result<UnitsBox> {
        let head = self.required_table(b"head")?;
        Ok(UnitsBox {
            x_min: read_i16(head, 36)?,
            y_min: read_i16(head, 38)?,
            x_max: read_i16(head, 40)?,
            y_max: read_i16(head, 42)?,
        })
    }

    /// `(ascender, descender)` from `hhea`
    pub fn hhea_ascent_descent(&self) -> Result<(i16, i16)> {
        let hhea = self.required_table(b"hhea")?;
        Ok((read_i16(hhea, 4)?, read_i16(hhea, 6)?))
    }

    pub fn num_glyphs(&self) -> Result<u16> {
        let maxp = self.required_table(b"maxp")?;
        read_u16(maxp, 4)
    }

    pub fn os2(&self) -> Result<Option<Os2Metrics>> {
        let Some(os2) = self.table(b"OS/2") else {
            return Ok(None);
        };
        let version = read_u16(os2, 0)?;
        let cap_height = if version >= 2 {
            Some(read_i16(os2, 88)?)
        } else {
            None
        };
        Ok(Some(Os2Metrics {
            version,
            weight_class: read_u16(os2, 4)?,
            fs_type: read_u16(os2, 8)?,
            typo_ascender: read_i16(os2, 68)?,
            typo_descender: read_i16(os2, 70)?,
            cap_height,
        }))
    }

    pub fn post(&self) -> Result<Option<PostMetrics>> {
        let Some(post) = self.table(b"post") else {
            return Ok(None);
        };
        let whole = read_i16(post, 4)?;
        let fraction = read_u16(post, 6)?;
        Ok(Some(PostMetrics {
            italic_angle: f64::from(whole) + f64::from(fraction) / 65536.0,
            underline_position: read_i16(post, 8)?,
            underline_thickness: read_i16(post, 10)?,
            is_fixed_pitch: read_u32(post, 12)? != 0,
        }))
    }

    /// Whether the license bits in `OS/2.fsType` permit embedding.
    /// Fonts without an OS/2 table carry no restriction.
    pub fn is_embeddable(&self) -> Result<bool> {
        Ok(self
            .os2()?
            .map(|os2| os2.fs_type != 2 && os2.fs_type & 0x200 == 0)
            .unwrap_or(true))
    }

    pub fn is_bold(&self) -> Result<bool> {
        Ok(self
            .os2()?
            .map(|os2| os2.weight_class >= 600)
            .unwrap_or(false))
    }

    /// Advance width of every glyph. Glyphs past `numberOfHMetrics` repeat
    /// the last advance.
    pub fn advance_widths(&self) -> Result<Vec<u16>> {
        let hhea = self.required_table(b"hhea")?;
        let hmtx = self.required_table(b"hmtx")?;
        let num_h_metrics = read_u16(hhea, 34)? as usize;
        let num_glyphs = (self.num_glyphs()? as usize).max(num_h_metrics);

        let mut widths = Vec::with_capacity(num_glyphs);
        for glyph in 0..num_h_metrics {
            widths.push(read_u16(hmtx, glyph * 4)?);
        }
        let last = widths.last().copied().unwrap_or(0);
        widths.resize(num_glyphs, last);
        Ok(widths)
    }

    /// PostScript name (name id 6)
    pub fn postscript_name(&self) -> Result<String> {
        let name = self.required_table(b"name")?;
        let count = read_u16(name, 2)? as usize;
        let string_offset = read_u16(name, 4)? as usize;

        let mut fallback = None;
        for i in 0..count {
            let record = 6 + i * 12;
            let platform_id = read_u16(name, record)?;
            let name_id = read_u16(name, record + 6)?;
            if name_id != 6 {
                continue;
            }
            let length = read_u16(name, record + 8)? as usize;
            let offset = string_offset + read_u16(name, record + 10)? as usize;
            let bytes = name.get(offset..offset + length).ok_or_else(|| {
                PdfError::ParseError("name record extends beyond table".into())
            })?;

            match platform_id {
                0 | 3 => {
                    let units: Vec<u16> = bytes
                        .chunks_exact(2)
                        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                        .collect();
                    return Ok(String::from_utf16_lossy(&units));
                }
                _ => {
                    fallback.get_or_insert_with(|| String::from_utf8_lossy(bytes).into_owned());
                }
            }
        }

        fallback.ok_or_else(|| PdfError::ParseError("PostScript name not found".into()))
    }

    /// Unicode code point to glyph index, from the best available cmap
    /// subtable (Windows full repertoire, Windows BMP, Unicode, Mac Roman).
    pub fn char_to_glyph(&self) -> Result<HashMap<u32, u16>> {
        let cmap = self.required_table(b"cmap")?;
        let num_subtables = read_u16(cmap, 2)? as usize;

        let mut best: Option<(u8, usize)> = None;
        for i in 0..num_subtables {
            let record = 4 + i * 8;
            let platform_id = read_u16(cmap, record)?;
            let encoding_id = read_u16(cmap, record + 2)?;
            let offset = read_u32(cmap, record + 4)? as usize;
            let rank = match (platform_id, encoding_id) {
                (3, 10) => 4,
                (3, 1) => 3,
                (0, _) => 2,
                (1, 0) => 1,
                _ => continue,
            };
            if best.map_or(true, |(r, _)| rank > r) {
                best = Some((rank, offset));
            }
        }

        let (_, offset) =
            best.ok_or_else(|| PdfError::ParseError("No usable cmap subtable".into()))?;
        parse_cmap_subtable(cmap, offset)
    }
}

fn parse_cmap_subtable(cmap: &[u8], offset: usize) -> Result<HashMap<u32, u16>> {
    let format = read_u16(cmap, offset)?;
    let mut mappings = HashMap::new();

    match format {
        0 => {
            // Byte encoding table
            for code in 0..256 {
                let glyph = *cmap.get(offset + 6 + code).ok_or_else(|| {
                    PdfError::ParseError("Format 0 cmap subtable too small".into())
                })? as u16;
                if glyph != 0 {
                    mappings.insert(code as u32, glyph);
                }
            }
        }
        4 => {
            // Segment mapping to delta values
            let seg_count = read_u16(cmap, offset + 6)? as usize / 2;
            let end_codes = offset + 14;
            let start_codes = end_codes + seg_count * 2 + 2;
            let id_deltas = start_codes + seg_count * 2;
            let id_range_offsets = id_deltas + seg_count * 2;

            for i in 0..seg_count {
                let end_code = read_u16(cmap, end_codes + i * 2)?;
                let start_code = read_u16(cmap, start_codes + i * 2)?;
                let id_delta = read_u16(cmap, id_deltas + i * 2)?;
                let id_range_offset = read_u16(cmap, id_range_offsets + i * 2)? as usize;

                for code in start_code..=end_code {
                    if code == 0xFFFF {
                        break;
                    }
                    let glyph = if id_range_offset == 0 {
                        code.wrapping_add(id_delta)
                    } else {
                        let address = id_range_offsets
                            + i * 2
                            + id_range_offset
                            + 2 * (code - start_code) as usize;
                        match read_u16(cmap, address)? {
                            0 => 0,
                            glyph => glyph.wrapping_add(id_delta),
                        }
                    };
                    if glyph != 0 {
                        mappings.insert(code as u32, glyph);
                    }
                }
            }
        }
        6 => {
            // Trimmed table mapping
            let first_code = read_u16(cmap, offset + 6)? as u32;
            let entry_count = read_u16(cmap, offset + 8)? as usize;
            for i in 0..entry_count {
                let glyph = read_u16(cmap, offset + 10 + i * 2)?;
                if glyph != 0 {
                    mappings.insert(first_code + i as u32, glyph);
                }
            }
        }
        12 => {
            // Segmented coverage
            let num_groups = read_u32(cmap, offset + 12)? as usize;
            for group in 0..num_groups {
                let base = offset + 16 + group * 12;
                let start_char = read_u32(cmap, base)?;
                let end_char = read_u32(cmap, base + 4)?;
                let start_glyph = read_u32(cmap, base + 8)?;
                if end_char < start_char {
                    return Err(PdfError::ParseError(
                        "Format 12 cmap group is inverted".into(),
                    ));
                }
                if end_char > 0x10FFFF || start_glyph > u32::from(u16::MAX) {
                    return Err(PdfError::ParseError(format!(
                        "Format 12 cmap group out of range: {end_char:#X} -> {start_glyph}"
                    )));
                }
                for i in 0..=(end_char - start_char) {
                    // Glyph ids past u16::MAX cannot exist; the rest of the group is unmapped
                    let Some(glyph) = start_glyph
                        .checked_add(i)
                        .and_then(|glyph| u16::try_from(glyph).ok())
                    else {
                        break;
                    };
                    if glyph != 0 {
                        mappings.insert(start_char + i, glyph);
                    }
                }
            }
        }
        other => {
            return Err(PdfError::ParseError(format!(
                "Unsupported cmap format: {other}"
            )))
        }
    }

    Ok(mappings)
}

fn read_tag(data: &[u8], offset: usize) -> Result<[u8; 4]> {
    data.get(offset..offset + 4)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| PdfError::ParseError("Invalid table directory".into()))
}

fn read_u16(data: &[u8], offset: usize) -> Result<u16> {
    match data.get(offset..offset + 2) {
        Some(bytes) => Ok(u16::from_be_bytes([bytes[0], bytes[1]])),
        None => Err(PdfError::ParseError(format!(
            "Insufficient data for u16 at offset {offset}"
        ))),
    }
}

fn read_i16(data: &[u8], offset: usize) -> Result<i16> {
    read_u16(data, offset).map(|v| v as i16)
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    match data.get(offset..offset + 4) {
        Some(bytes) => Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
        None => Err(PdfError::ParseError(format!(
            "Insufficient data for u32 at offset {offset}"
        ))),
    }
}
