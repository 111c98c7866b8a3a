//! Metrics extraction for Type1 fonts
//!
//! The program comes from a PFB file and the metrics from the AFM file with
//! the same base name.

use super::afm::{self, AfmMetrics};
use super::encoding::{EncodingTable, NOTDEF};
use super::font_descriptor::FontDescriptor;
use super::{pfb, FontInfo, FontKind};
use crate::error::Result;
use std::io::Write;
use std::path::Path;

/// Extract a Type1 font from `pfb_path` and its sibling `.afm` file.
/// The PFB file is only read when `embed` is set.
pub fn extract(
    pfb_path: impl AsRef<Path>,
    embed: bool,
    encoding: &EncodingTable,
    sink: &mut impl Write,
) -> Result<FontInfo> {
    let pfb_path = pfb_path.as_ref();
    let afm_path = pfb_path.with_extension("afm");

    let afm_bytes = super::read_file(&afm_path)?;
    let afm_text = String::from_utf8_lossy(&afm_bytes);

    let pfb_data = if embed {
        Some(super::read_file(pfb_path)?)
    } else {
        None
    };

    extract_from_bytes(pfb_data.as_deref(), &afm_text, encoding, sink)
}

/// Build a [`FontInfo`] from already loaded PFB bytes and AFM text.
/// Passing no PFB bytes yields a metrics-only font.
pub fn extract_from_bytes(
    pfb_data: Option<&[u8]>,
    afm_text: &str,
    encoding: &EncodingTable,
    sink: &mut impl Write,
) -> Result<FontInfo> {
    // Validate the container before doing any metrics work
    let program = pfb_data.map(pfb::parse).transpose()?;
    let metrics = afm::parse(afm_text)?;

    let mut info = FontInfo::new(FontKind::Type1(program), metrics.font_name.clone());
    info.is_bold = metrics.is_bold();
    info.is_fixed_pitch = metrics.is_fixed_pitch;
    info.underline_thickness = metrics.underline_thickness;
    info.underline_position = metrics.underline_position;

    let missing_width = metrics.width(NOTDEF).unwrap_or(0);
    info.descriptor = descriptor_from(&metrics, missing_width);
    info.widths = widths_for(&metrics, encoding, missing_width, sink)?;

    tracing::debug!(
        "Extracted Type1 metrics for {} (embedded {})",
        info.postscript_name,
        info.kind().is_embedded()
    );
    Ok(info)
}

fn descriptor_from(metrics: &AfmMetrics, missing_width: i32) -> FontDescriptor {
    FontDescriptor {
        ascent: metrics.ascender,
        descent: metrics.descender,
        cap_height: metrics.cap_height,
        italic_angle: metrics.italic_angle,
        font_bbox: metrics.font_bbox,
        stem_v: metrics.std_vw,
        missing_width,
        ..FontDescriptor::default()
    }
}

fn widths_for(
    metrics: &AfmMetrics,
    encoding: &EncodingTable,
    missing_width: i32,
    sink: &mut impl Write,
) -> Result<[i32; 256]> {
    let mut widths = [missing_width; 256];
    for (slot, entry) in encoding.entries().iter().enumerate() {
        if !entry.is_mapped() {
            continue;
        }
        match metrics.width(&entry.glyph_name) {
            Some(width) => widths[slot] = width,
            None => {
                tracing::warn!(
                    "{}: character {} is missing",
                    metrics.font_name,
                    entry.glyph_name
                );
                writeln!(sink, "Character {} is missing", entry.glyph_name)?;
            }
        }
    }
    Ok(widths)
}
