//! Font embedding and font object serialization
//!
//! Fonts enter through one of the extractors ([`truetype`], [`type1`]) or a
//! saved [`definition`], get their descriptor finalized, are registered in a
//! [`FontRegistry`] under a [`FontKey`] and are finally written out by the
//! [`FontEmitter`].

pub mod afm;
pub mod definition;
pub mod embedder;
pub mod encoding;
pub mod font_descriptor;
pub mod pfb;
pub mod registry;
pub mod truetype;
pub mod ttf_parser;
pub mod type1;

#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_fonts;

pub use definition::{make_font, FontDefinition, MakeFontOptions};
pub use embedder::{EmitOrder, FontEmitter};
pub use encoding::{differences, EncodingEntry, EncodingTable};
pub use font_descriptor::{finalize, FontBBox, FontDescriptor, FontFlags};
pub use registry::{FontRegistry, RegisterOutcome};
pub use ttf_parser::TtfParser;

use crate::error::{PdfError, Result};
use std::fmt;
use std::path::Path;

/// Read a whole file, reporting a missing file as [`PdfError::NotFound`]
pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PdfError::NotFound(path.to_path_buf()),
        _ => PdfError::Io(e),
    })
}

/// Program bytes of an embedded TrueType/OpenType font
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrueTypeProgram {
    /// Stored bytes, zlib-compressed when `compressed` is set
    pub data: Vec<u8>,
    /// Size of the font file before compression
    pub original_length: usize,
    pub compressed: bool,
}

/// Program bytes of an embedded Type1 font: the clear-text segment followed
/// by the binary segment, without PFB headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type1Program {
    pub data: Vec<u8>,
    pub segment1_length: usize,
    pub segment2_length: usize,
}

impl Type1Program {
    /// Split `data` back into its clear-text and binary segments
    pub fn segments(&self) -> (&[u8], &[u8]) {
        let split = self.segment1_length.min(self.data.len());
        let end = split
            .saturating_add(self.segment2_length)
            .min(self.data.len());
        (&self.data[..split], &self.data[split..end])
    }
}

/// Kind of font together with its embedded program, if any.
/// `None` means the font is described by metrics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontKind {
    /// One of the standard 14 fonts, never embedded
    Core,
    TrueType(Option<TrueTypeProgram>),
    Type1(Option<Type1Program>),
}

impl FontKind {
    /// Name used in definition files
    pub fn name(&self) -> &'static str {
        match self {
            FontKind::Core => "Core",
            FontKind::TrueType(_) => "TrueType",
            FontKind::Type1(_) => "Type1",
        }
    }

    /// Value of `/Subtype` in the font dictionary
    pub fn subtype(&self) -> &'static str {
        match self {
            FontKind::Core | FontKind::Type1(_) => "Type1",
            FontKind::TrueType(_) => "TrueType",
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(
            self,
            FontKind::TrueType(Some(_)) | FontKind::Type1(Some(_))
        )
    }
}

/// Everything needed to write one font family/style combination
#[derive(Debug, Clone, PartialEq)]
pub struct FontInfo {
    kind: FontKind,
    pub postscript_name: String,
    pub is_bold: bool,
    pub is_fixed_pitch: bool,
    pub underline_thickness: i32,
    pub underline_position: i32,
    /// Advance per byte value in 1000-unit em space
    pub widths: [i32; 256],
    pub descriptor: FontDescriptor,
    /// `/Differences` body against cp1252, when the font uses another code page
    pub differences: Option<String>,
    /// Name of the program file next to a definition file
    pub file: Option<String>,
    pub(crate) object_index: usize,
    pub(crate) diff_index: Option<usize>,
    pub(crate) font_object_number: Option<u32>,
    pub(crate) stream_object_number: Option<u32>,
    pub(crate) diff_object_number: Option<u32>,
}

impl FontInfo {
    pub fn new(kind: FontKind, postscript_name: impl Into<String>) -> Self {
        FontInfo {
            kind,
            postscript_name: postscript_name.into(),
            is_bold: false,
            is_fixed_pitch: false,
            underline_thickness: 0,
            underline_position: 0,
            widths: [0; 256],
            descriptor: FontDescriptor::default(),
            differences: None,
            file: None,
            object_index: 0,
            diff_index: None,
            font_object_number: None,
            stream_object_number: None,
            diff_object_number: None,
        }
    }

    pub fn kind(&self) -> &FontKind {
        &self.kind
    }

    /// Embedded program bytes as they are written to the stream object
    pub fn program_data(&self) -> Option<&[u8]> {
        match &self.kind {
            FontKind::TrueType(Some(program)) => Some(&program.data),
            FontKind::Type1(Some(program)) => Some(&program.data),
            _ => None,
        }
    }

    /// Position of this font within its registry, used for `/F<n>` names
    pub fn object_index(&self) -> usize {
        self.object_index
    }

    /// 1-based index of this font's differences string in the registry
    pub fn diff_index(&self) -> Option<usize> {
        self.diff_index
    }

    pub fn font_object_number(&self) -> Option<u32> {
        self.font_object_number
    }

    pub fn stream_object_number(&self) -> Option<u32> {
        self.stream_object_number
    }

    pub fn diff_object_number(&self) -> Option<u32> {
        self.diff_object_number
    }

    /// Width of byte value `byte`
    pub fn width(&self, byte: u8) -> i32 {
        self.widths[byte as usize]
    }
}

/// Registry key of a font: lowercase family followed by the normalized
/// uppercase style (`""`, `"B"`, `"I"` or `"BI"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontKey(String);

impl FontKey {
    pub fn new(family: &str, style: &str) -> Self {
        let style: String = style
            .to_uppercase()
            .chars()
            .filter(|c| *c != 'U')
            .collect();
        let style = if style == "IB" { "BI".to_string() } else { style };
        FontKey(format!("{}{}", family.to_lowercase(), style))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FontKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
