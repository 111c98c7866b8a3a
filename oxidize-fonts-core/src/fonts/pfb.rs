//! Binary Type1 (PFB) container
//!
//! A PFB file is a sequence of segments, each introduced by a six byte
//! header: the `0x80` marker, a segment type (1 = clear text, 2 = binary,
//! 3 = end of file) and the payload length as a little-endian `u32`.

use super::Type1Program;
use crate::error::{PdfError, Result};

pub const SEGMENT_MARKER: u8 = 0x80;
pub const SEGMENT_TEXT: u8 = 1;
pub const SEGMENT_BINARY: u8 = 2;

const HEADER_LEN: usize = 6;

/// One segment of a PFB file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PfbSegment<'a> {
    pub segment_type: u8,
    pub data: &'a [u8],
}

/// Read the segment starting at `pos`. Returns the segment and the offset
/// just past its payload.
pub fn read_segment(data: &[u8], pos: usize) -> Result<(PfbSegment<'_>, usize)> {
    let header = data
        .get(pos..pos + HEADER_LEN)
        .ok_or_else(|| PdfError::ParseError(format!("truncated PFB segment header at {pos}")))?;
    if header[0] != SEGMENT_MARKER {
        return Err(PdfError::ParseError(
            "not a valid binary Type1 font".to_string(),
        ));
    }

    let length = u32::from_le_bytes([header[2], header[3], header[4], header[5]]) as usize;
    let start = pos + HEADER_LEN;
    let payload = start
        .checked_add(length)
        .and_then(|end| data.get(start..end))
        .ok_or_else(|| {
            PdfError::ParseError(format!(
                "PFB segment at {pos} declares {length} bytes, only {} available",
                data.len().saturating_sub(start)
            ))
        })?;

    Ok((
        PfbSegment {
            segment_type: header[1],
            data: payload,
        },
        start + length,
    ))
}

/// Split a PFB file into its first two segments and concatenate their
/// payloads without the segment headers.
pub fn parse(data: &[u8]) -> Result<Type1Program> {
    let (first, next) = read_segment(data, 0)?;
    let (second, _) = read_segment(data, next)?;

    if first.segment_type != SEGMENT_TEXT || second.segment_type != SEGMENT_BINARY {
        tracing::debug!(
            "Unexpected PFB segment types {} and {}",
            first.segment_type,
            second.segment_type
        );
    }

    let mut program = Vec::with_capacity(first.data.len() + second.data.len());
    program.extend_from_slice(first.data);
    program.extend_from_slice(second.data);

    Ok(Type1Program {
        data: program,
        segment1_length: first.data.len(),
        segment2_length: second.data.len(),
    })
}
