//! Adobe Font Metrics (AFM) reader
//!
//! Only the global directives and the `C` character metric lines that feed
//! a font descriptor and width table are interpreted; everything else
//! (kerning, composites, comments) is skipped.

use super::font_descriptor::FontBBox;
use crate::error::{PdfError, Result};
use std::collections::HashMap;

/// Metrics read from an AFM file. Numeric directives that are absent stay 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AfmMetrics {
    pub font_name: String,
    /// Lowercased `Weight` value
    pub weight: String,
    pub italic_angle: i32,
    pub ascender: i32,
    pub descender: i32,
    pub underline_thickness: i32,
    pub underline_position: i32,
    pub is_fixed_pitch: bool,
    pub font_bbox: FontBBox,
    pub cap_height: i32,
    pub std_vw: i32,
    /// Advance width per glyph name
    pub widths: HashMap<String, i32>,
}

impl AfmMetrics {
    pub fn is_bold(&self) -> bool {
        matches!(self.weight.as_str(), "bold" | "black")
    }

    /// Width of `glyph`, if the font defines it
    pub fn width(&self, glyph: &str) -> Option<i32> {
        self.widths.get(glyph).copied()
    }
}

/// Parse AFM text
pub fn parse(text: &str) -> Result<AfmMetrics> {
    if text.trim().is_empty() {
        return Err(PdfError::ParseError("empty AFM file".to_string()));
    }

    let mut metrics = AfmMetrics::default();
    let mut font_name = None;

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        let line = line.trim();
        let (key, value) = match line.split_once(char::is_whitespace) {
            Some((key, value)) => (key, value.trim()),
            None => continue,
        };

        match key {
            "C" => {
                if let Some((name, width)) = parse_char_metrics(line, line_number)? {
                    if name == "Delta" {
                        metrics.widths.insert("increment".to_string(), width);
                    }
                    metrics.widths.insert(name, width);
                }
            }
            "FontName" => font_name = Some(value.to_string()),
            "Weight" => {
                metrics.weight = value
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_lowercase()
            }
            "ItalicAngle" => metrics.italic_angle = parse_number(value, line_number)?,
            "Ascender" => metrics.ascender = parse_number(value, line_number)?,
            "Descender" => metrics.descender = parse_number(value, line_number)?,
            "UnderlineThickness" => {
                metrics.underline_thickness = parse_number(value, line_number)?
            }
            "UnderlinePosition" => metrics.underline_position = parse_number(value, line_number)?,
            "IsFixedPitch" => metrics.is_fixed_pitch = value == "true",
            "FontBBox" => {
                let values = value
                    .split_whitespace()
                    .map(|v| parse_number(v, line_number))
                    .collect::<Result<Vec<_>>>()?;
                if values.len() != 4 {
                    return Err(PdfError::ParseError(format!(
                        "AFM line {line_number}: FontBBox needs 4 values, found {}",
                        values.len()
                    )));
                }
                metrics.font_bbox = FontBBox::new(values[0], values[1], values[2], values[3]);
            }
            "CapHeight" => metrics.cap_height = parse_number(value, line_number)?,
            "StdVW" => metrics.std_vw = parse_number(value, line_number)?,
            _ => {}
        }
    }

    metrics.font_name = font_name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| PdfError::ParseError("FontName missing in AFM file".to_string()))?;

    tracing::debug!(
        "Parsed AFM metrics for {} ({} glyph widths)",
        metrics.font_name,
        metrics.widths.len()
    );
    Ok(metrics)
}

/// `C 65 ; WX 722 ; N A ; B 15 0 706 674 ;` yields `("A", 722)`.
/// Lines without both `WX` and `N` are ignored.
fn parse_char_metrics(line: &str, line_number: usize) -> Result<Option<(String, i32)>> {
    let mut width = None;
    let mut name = None;

    for field in line.split(';') {
        let mut parts = field.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("WX"), Some(value)) => width = Some(parse_number(value, line_number)?),
            (Some("N"), Some(value)) => name = Some(value.to_string()),
            _ => {}
        }
    }

    Ok(name.zip(width))
}

/// AFM numbers may be fractional; they are rounded half away from zero
fn parse_number(value: &str, line_number: usize) -> Result<i32> {
    let token = value.split_whitespace().next().unwrap_or(value);
    token
        .parse::<f64>()
        .map(|n| n.round() as i32)
        .map_err(|_| {
            PdfError::ParseError(format!(
                "AFM line {line_number}: invalid number {token:?}"
            ))
        })
}
