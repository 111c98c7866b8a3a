//! Metrics extraction for TrueType/OpenType fonts
//!
//! All font-unit values are scaled to a 1000-unit em and rounded half away
//! from zero, so `k * 0.5` ties always move outward.

use super::encoding::EncodingTable;
use super::font_descriptor::{FontBBox, FontDescriptor};
use super::ttf_parser::TtfParser;
use super::{FontInfo, FontKind, TrueTypeProgram};
use crate::compression;
use crate::error::{PdfError, Result};
use std::io::Write;
use std::path::Path;

/// Scale a font-unit value by `k` and round half away from zero
pub fn scale(value: impl Into<f64>, k: f64) -> i32 {
    (k * value.into()).round() as i32
}

/// Read a font file and extract its metrics
pub fn extract_file(
    path: impl AsRef<Path>,
    embed: bool,
    encoding: &EncodingTable,
    sink: &mut impl Write,
) -> Result<FontInfo> {
    let data = super::read_file(path.as_ref())?;
    extract(&data, embed, encoding, sink)
}

/// Build a [`FontInfo`] for a TrueType/OpenType font.
///
/// Slots of `encoding` whose code point the font cannot map fall back to
/// the missing width, and a `Character <name> is missing` line is written to
/// `sink`. When `embed` is set the font bytes are kept zlib-compressed.
pub fn extract(
    font_bytes: &[u8],
    embed: bool,
    encoding: &EncodingTable,
    sink: &mut impl Write,
) -> Result<FontInfo> {
    let parser = TtfParser::new(font_bytes)?;

    let program = if embed {
        if !parser.is_embeddable()? {
            let name = parser
                .postscript_name()
                .unwrap_or_else(|_| "unnamed font".to_string());
            return Err(PdfError::EmbeddingNotAllowed(name));
        }
        Some(TrueTypeProgram {
            data: compression::compress(font_bytes)?,
            original_length: font_bytes.len(),
            compressed: true,
        })
    } else {
        None
    };

    let k = 1000.0 / f64::from(parser.units_per_em()?);
    let (ascent, descent) = match parser.os2()? {
        Some(os2) => (os2.typo_ascender, os2.typo_descender),
        None => parser.hhea_ascent_descent()?,
    };
    let cap_height = parser.os2()?.and_then(|os2| os2.cap_height).unwrap_or(0);
    let bbox = parser.bounding_box()?;
    let post = parser.post()?;
    let advances = parser.advance_widths()?;
    let cmap = parser.char_to_glyph()?;

    let mut info = FontInfo::new(FontKind::TrueType(program), parser.postscript_name()?);
    info.is_bold = parser.is_bold()?;
    info.is_fixed_pitch = post.map(|p| p.is_fixed_pitch).unwrap_or(false);
    info.underline_thickness = post.map(|p| scale(p.underline_thickness, k)).unwrap_or(0);
    info.underline_position = post.map(|p| scale(p.underline_position, k)).unwrap_or(0);

    let missing_width = scale(advances.first().copied().unwrap_or(0), k);
    info.descriptor = FontDescriptor {
        ascent: scale(ascent, k),
        descent: scale(descent, k),
        cap_height: scale(cap_height, k),
        italic_angle: post.map(|p| p.italic_angle.floor() as i32).unwrap_or(0),
        font_bbox: FontBBox::new(
            scale(bbox.x_min, k),
            scale(bbox.y_min, k),
            scale(bbox.x_max, k),
            scale(bbox.y_max, k),
        ),
        missing_width,
        ..FontDescriptor::default()
    };

    for (slot, entry) in encoding.entries().iter().enumerate() {
        let mut width = missing_width;
        if entry.is_mapped() {
            match cmap.get(&(entry.code_point as u32)) {
                Some(&glyph) => {
                    if let Some(&advance) = advances.get(glyph as usize) {
                        width = scale(advance, k);
                    }
                }
                None => {
                    tracing::warn!(
                        "{}: character {} is missing",
                        info.postscript_name,
                        entry.glyph_name
                    );
                    writeln!(sink, "Character {} is missing", entry.glyph_name)?;
                }
            }
        }
        info.widths[slot] = width;
    }

    tracing::debug!(
        "Extracted TrueType metrics for {} (units per em {}, embedded {})",
        info.postscript_name,
        (1000.0 / k).round(),
        embed
    );
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::test_fonts::TestFontBuilder;
    use crate::fonts::FontFlags;
    use pretty_assertions::assert_eq;

    fn ascii_map() -> EncodingTable {
        EncodingTable::parse("!20 U+0020 space\n!41 U+0041 A\n!42 U+0042 B\n").unwrap()
    }

    #[test]
    fn test_scale_rounds_half_away_from_zero() {
        assert_eq!(scale(1, 0.5), 1);
        assert_eq!(scale(-1, 0.5), -1);
        assert_eq!(scale(3, 0.5), 2);
        assert_eq!(scale(5, 0.5), 3);
        assert_eq!(scale(1, 0.49), 0);
    }

    #[test]
    fn test_extract_metrics_unscaled() {
        let data = TestFontBuilder::new().build();
        let mut sink = Vec::new();
        let info = extract(&data, false, &ascii_map(), &mut sink).unwrap();

        assert_eq!(info.postscript_name, "TestSans-Regular");
        assert_eq!(info.kind(), &FontKind::TrueType(None));
        assert_eq!(info.descriptor.ascent, 750);
        assert_eq!(info.descriptor.descent, -250);
        assert_eq!(info.descriptor.cap_height, 700);
        assert_eq!(info.descriptor.font_bbox, FontBBox::new(-50, -200, 1000, 900));
        assert_eq!(info.descriptor.missing_width, 500);
        assert_eq!(info.underline_position, -100);
        assert_eq!(info.underline_thickness, 50);
        assert_eq!(info.width(b' '), 250);
        assert_eq!(info.width(b'A'), 600);
        assert_eq!(info.width(b'B'), 650);
        assert_eq!(info.width(b'C'), 500);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_extract_scales_by_units_per_em() {
        let builder = TestFontBuilder {
            units_per_em: 2048,
            typo_ascender: 1901,
            typo_descender: -483,
            advances: vec![1229, 651, 1401, 1405],
            ..TestFontBuilder::default()
        };
        let info = extract(&builder.build(), false, &ascii_map(), &mut Vec::new()).unwrap();

        // 1901 * 1000 / 2048 = 928.22, 483 * 1000 / 2048 = 235.84
        assert_eq!(info.descriptor.ascent, 928);
        assert_eq!(info.descriptor.descent, -236);
        // 1229 * 1000 / 2048 = 600.09
        assert_eq!(info.descriptor.missing_width, 600);
        // 651 * 1000 / 2048 = 317.87
        assert_eq!(info.width(b' '), 318);
        // 1401 * 1000 / 2048 = 684.08
        assert_eq!(info.width(b'A'), 684);
    }

    #[test]
    fn test_half_unit_rounds_outward() {
        // k = 0.5: advances of 1001 and an ascender of 3 land exactly on .5
        let builder = TestFontBuilder {
            units_per_em: 2000,
            typo_ascender: 3,
            typo_descender: -3,
            advances: vec![1001, 1001, 1001, 1001],
            ..TestFontBuilder::default()
        };
        let info = extract(&builder.build(), false, &ascii_map(), &mut Vec::new()).unwrap();

        assert_eq!(info.descriptor.ascent, 2);
        assert_eq!(info.descriptor.descent, -2);
        assert_eq!(info.width(b'A'), 501);
    }

    #[test]
    fn test_missing_glyph_reports_and_falls_back() {
        let map = EncodingTable::parse("!41 U+0041 A\n!80 U+20AC Euro\n").unwrap();
        let data = TestFontBuilder::new().build();
        let mut sink = Vec::new();
        let info = extract(&data, false, &map, &mut sink).unwrap();

        assert_eq!(info.width(0x80), info.descriptor.missing_width);
        assert_eq!(String::from_utf8(sink).unwrap(), "Character Euro is missing\n");
    }

    #[test]
    fn test_unmapped_slots_take_missing_width_silently() {
        let data = TestFontBuilder::new().build();
        let mut sink = Vec::new();
        let info = extract(&data, false, &EncodingTable::unmapped(), &mut sink).unwrap();

        assert!(info.widths.iter().all(|&w| w == 500));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_embed_compresses_program() {
        let data = TestFontBuilder::new().build();
        let info = extract(&data, true, &ascii_map(), &mut Vec::new()).unwrap();

        match info.kind() {
            FontKind::TrueType(Some(program)) => {
                assert!(program.compressed);
                assert_eq!(program.original_length, data.len());
                assert_eq!(compression::decompress(&program.data).unwrap(), data);
            }
            other => panic!("Expected embedded TrueType program, got {other:?}"),
        }
    }

    #[test]
    fn test_embed_forbidden_by_license() {
        let data = TestFontBuilder {
            fs_type: 0x0002,
            ..TestFontBuilder::default()
        }
        .build();

        let err = extract(&data, true, &ascii_map(), &mut Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            PdfError::EmbeddingNotAllowed(ref name) if name == "TestSans-Regular"
        ));

        // Metrics only is still allowed
        assert!(extract(&data, false, &ascii_map(), &mut Vec::new()).is_ok());
    }

    #[test]
    fn test_style_information() {
        let data = TestFontBuilder {
            weight_class: 700,
            italic_angle: -11,
            fixed_pitch: true,
            ..TestFontBuilder::default()
        }
        .build();
        let info = extract(&data, false, &ascii_map(), &mut Vec::new()).unwrap();

        assert!(info.is_bold);
        assert!(info.is_fixed_pitch);
        assert_eq!(info.descriptor.italic_angle, -11);
        // Flags and stem width are left to the descriptor builder
        assert_eq!(info.descriptor.flags, FontFlags::empty());
        assert_eq!(info.descriptor.stem_v, 0);
    }

    #[test]
    fn test_italic_angle_uses_integer_part() {
        // -11.5 in 16.16 is 0xFFF4.8000
        let data = TestFontBuilder {
            italic_angle: -12,
            italic_angle_fraction: 0x8000,
            ..TestFontBuilder::default()
        }
        .build();
        let info = extract(&data, false, &ascii_map(), &mut Vec::new()).unwrap();
        assert_eq!(info.descriptor.italic_angle, -12);
    }

    #[test]
    fn test_hhea_fallback_without_os2() {
        let data = TestFontBuilder {
            include_os2: false,
            ..TestFontBuilder::default()
        }
        .build();
        let info = extract(&data, false, &ascii_map(), &mut Vec::new()).unwrap();

        assert_eq!(info.descriptor.ascent, 800);
        assert_eq!(info.descriptor.descent, -200);
        assert_eq!(info.descriptor.cap_height, 0);
    }

    #[test]
    fn test_extract_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.ttf");
        let err = extract_file(&path, false, &ascii_map(), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, PdfError::NotFound(_)));
    }
}
