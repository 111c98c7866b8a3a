//! Font session
//!
//! A [`FontSession`] owns the font registry of one document. Every operation
//! returns a [`Result`]; the first failure is also remembered, and from then
//! on font operations are refused with [`PdfError::SessionHalted`] until the
//! caller collects it with [`FontSession::take_error`].
//!
//! Missing-glyph messages written by the extractors are kept in order and
//! can be read back with [`FontSession::diagnostics`].

use crate::error::{ErrorKind, PdfError, Result};
use crate::fonts::{
    self, finalize, EmitOrder, EncodingTable, FontDefinition, FontEmitter, FontInfo, FontKey,
    FontKind, FontRegistry, RegisterOutcome,
};
use crate::objects::Dictionary;
use crate::writer::ObjectWriter;
use std::path::Path;

/// Names accepted by [`FontSession::add_core`]
pub const STANDARD_FONTS: [&str; 14] = [
    "Courier",
    "Courier-Bold",
    "Courier-Oblique",
    "Courier-BoldOblique",
    "Helvetica",
    "Helvetica-Bold",
    "Helvetica-Oblique",
    "Helvetica-BoldOblique",
    "Times-Roman",
    "Times-Bold",
    "Times-Italic",
    "Times-BoldItalic",
    "Symbol",
    "ZapfDingbats",
];

/// The failure that halted a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&PdfError> for SessionFailure {
    fn from(err: &PdfError) -> Self {
        SessionFailure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Per-document font state
#[derive(Debug)]
pub struct FontSession {
    registry: FontRegistry,
    encoding: EncodingTable,
    /// Differences of `encoding` against cp1252, empty when identical
    differences: String,
    diagnostics: Vec<String>,
    failure: Option<SessionFailure>,
}

impl FontSession {
    /// Session using the bundled cp1252 code page
    pub fn new() -> Result<Self> {
        Self::with_encoding(EncodingTable::cp1252()?)
    }

    /// Session whose extracted fonts use `encoding`
    pub fn with_encoding(encoding: EncodingTable) -> Result<Self> {
        let differences = fonts::differences(&encoding, &EncodingTable::cp1252()?);
        Ok(FontSession {
            registry: FontRegistry::new(),
            encoding,
            differences,
            diagnostics: Vec::new(),
            failure: None,
        })
    }

    /// Extract and register a TrueType/OpenType font file
    pub fn add_truetype(
        &mut self,
        family: &str,
        style: &str,
        path: impl AsRef<Path>,
        embed: bool,
    ) -> Result<RegisterOutcome> {
        let path = path.as_ref();
        self.add_with(family, style, |session, sink| {
            let data = fonts::read_file(path)?;
            fonts::truetype::extract(&data, embed, &session.encoding, sink)
        })
    }

    /// Extract and register a TrueType/OpenType font held in memory
    pub fn add_truetype_bytes(
        &mut self,
        family: &str,
        style: &str,
        data: &[u8],
        embed: bool,
    ) -> Result<RegisterOutcome> {
        self.add_with(family, style, |session, sink| {
            fonts::truetype::extract(data, embed, &session.encoding, sink)
        })
    }

    /// Extract and register a Type1 font from a PFB file and its sibling AFM
    pub fn add_type1(
        &mut self,
        family: &str,
        style: &str,
        pfb_path: impl AsRef<Path>,
        embed: bool,
    ) -> Result<RegisterOutcome> {
        let pfb_path = pfb_path.as_ref();
        self.add_with(family, style, |session, sink| {
            fonts::type1::extract(pfb_path, embed, &session.encoding, sink)
        })
    }

    /// Register a font from a definition file written by
    /// [`make_font`](crate::fonts::make_font)
    pub fn add_definition(
        &mut self,
        family: &str,
        style: &str,
        json_path: impl AsRef<Path>,
    ) -> Result<RegisterOutcome> {
        let json_path = json_path.as_ref();
        self.register_with(family, style, |_| FontDefinition::load(json_path))
    }

    /// Register one of the [`STANDARD_FONTS`]
    pub fn add_core(
        &mut self,
        family: &str,
        style: &str,
        base_font: &str,
    ) -> Result<RegisterOutcome> {
        self.register_with(family, style, |_| {
            if !STANDARD_FONTS.contains(&base_font) {
                return Err(PdfError::UnsupportedFontKind(format!(
                    "{base_font} is not a standard font"
                )));
            }
            Ok(FontInfo::new(FontKind::Core, base_font))
        })
    }

    pub fn lookup(&self, family: &str, style: &str) -> Option<&FontInfo> {
        self.registry.lookup(&FontKey::new(family, style))
    }

    pub fn registry(&self) -> &FontRegistry {
        &self.registry
    }

    /// Write every registered font to `writer`
    pub fn emit<W: ObjectWriter>(&mut self, writer: &mut W, order: EmitOrder) -> Result<()> {
        self.check_halted()?;
        let result = FontEmitter::emit(&mut self.registry, writer, order);
        self.record(result)
    }

    /// `/Font` resource dictionary for the emitted fonts
    pub fn resources(&mut self) -> Result<Dictionary> {
        self.check_halted()?;
        let result = FontEmitter::resources(&self.registry);
        self.record(result)
    }

    /// Messages reported while extracting fonts, such as
    /// `Character Euro is missing`
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<String> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn is_halted(&self) -> bool {
        self.failure.is_some()
    }

    pub fn error(&self) -> Option<&SessionFailure> {
        self.failure.as_ref()
    }

    /// Collect the halting failure, resuming the session
    pub fn take_error(&mut self) -> Option<SessionFailure> {
        self.failure.take()
    }

    /// Extract with `extract`, finalize the descriptor and register
    fn add_with(
        &mut self,
        family: &str,
        style: &str,
        extract: impl FnOnce(&Self, &mut Vec<u8>) -> Result<FontInfo>,
    ) -> Result<RegisterOutcome> {
        let mut messages = Vec::new();
        let result = self.register_with(family, style, |session| {
            let mut info = extract(session, &mut messages)?;
            finalize(&mut info);
            if !session.differences.is_empty() {
                info.differences = Some(session.differences.clone());
            }
            Ok(info)
        });
        self.diagnostics.extend(String::from_utf8_lossy(&messages).lines().map(str::to_string));
        result
    }

    fn register_with(
        &mut self,
        family: &str,
        style: &str,
        load: impl FnOnce(&Self) -> Result<FontInfo>,
    ) -> Result<RegisterOutcome> {
        self.check_halted()?;

        let key = FontKey::new(family, style);
        if let Some(info) = self.registry.lookup(&key) {
            return Ok(RegisterOutcome {
                object_index: info.object_index(),
                already_present: true,
            });
        }

        let result = load(&*self)
            .and_then(|info| self.registry.register(key, info))
            .map_err(|err| err.for_font(family, style));
        self.record(result)
    }

    fn check_halted(&self) -> Result<()> {
        match &self.failure {
            Some(failure) => Err(PdfError::SessionHalted(failure.message.clone())),
            None => Ok(()),
        }
    }

    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            tracing::warn!("Font session halted: {}", err);
            self.failure = Some(SessionFailure::from(err));
        }
        result
    }
}
