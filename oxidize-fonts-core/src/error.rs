use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Font license does not allow embedding: {0}")]
    EmbeddingNotAllowed(String),

    #[error("Unsupported font type: {0}")]
    UnsupportedFontKind(String),

    #[error("Compression error: {0}")]
    CompressionError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Font {family:?} style {style:?}: {source}")]
    Font {
        family: String,
        style: String,
        #[source]
        source: Box<PdfError>,
    },

    #[error("Font session halted by an earlier error: {0}")]
    SessionHalted(String),
}

/// Error categories surfaced to callers of the font subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed encoding map, metrics file, font tables or artifact
    Parse,
    /// Missing font, metrics or encoding file
    NotFound,
    /// Embedding forbidden by the font license
    Policy,
    /// Font kind not recognized
    UnsupportedKind,
    /// Underlying file or stream failure
    Io,
}

impl PdfError {
    /// Classify this error. Context wrappers report the kind of their source.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PdfError::Io(err) if err.kind() == std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            PdfError::Io(_) | PdfError::CompressionError(_) => ErrorKind::Io,
            PdfError::ParseError(_) | PdfError::Serialization(_) => ErrorKind::Parse,
            PdfError::NotFound(_) => ErrorKind::NotFound,
            PdfError::EmbeddingNotAllowed(_) => ErrorKind::Policy,
            PdfError::UnsupportedFontKind(_) => ErrorKind::UnsupportedKind,
            PdfError::Font { source, .. } => source.kind(),
            PdfError::SessionHalted(_) => ErrorKind::Io,
        }
    }

    /// Wrap this error with the family and style of the font being processed.
    pub fn for_font(self, family: impl Into<String>, style: impl Into<String>) -> Self {
        PdfError::Font {
            family: family.into(),
            style: style.into(),
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, PdfError>;
