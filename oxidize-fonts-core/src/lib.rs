//! # oxidize-fonts
//!
//! Font embedding and font object serialization for PDF generation.
//!
//! ## Features
//!
//! - **TrueType/OpenType**: metrics from the font tables, zlib-compressed embedding
//! - **Type1**: PFB programs with AFM metrics
//! - **Code pages**: `!XX U+XXXX name` encoding maps, cp1252 bundled
//! - **Byte-exact output**: encodings, font programs, widths and descriptors
//!   written with deterministic object numbers
//! - **Font definitions**: extract once with [`make_font`], load the JSON
//!   definition afterwards
//!
//! ## Quick Start
//!
//! ```rust
//! use oxidize_fonts::{EmitOrder, FontSession, PdfObjectWriter, Result};
//!
//! # fn main() -> Result<()> {
//! let mut session = FontSession::new()?;
//! session.add_core("Helvetica", "", "Helvetica")?;
//! session.add_core("Helvetica", "B", "Helvetica-Bold")?;
//!
//! let mut writer = PdfObjectWriter::new_with_writer(Vec::new());
//! writer.write_header()?;
//! session.emit(&mut writer, EmitOrder::Registration)?;
//!
//! // /F0 and /F1 for the page resources
//! let fonts = session.resources()?;
//! assert!(fonts.contains_key("F1"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result`]. A [`FontSession`] stops accepting font
//! operations after the first failure until [`FontSession::take_error`] is
//! called, so a broken font never leads to half-written output.

pub mod compression;
pub mod error;
pub mod fonts;
pub mod objects;
pub mod session;
pub mod writer;

pub use error::{ErrorKind, PdfError, Result};
pub use fonts::{
    make_font, EmitOrder, EncodingTable, FontDefinition, FontDescriptor, FontEmitter, FontInfo,
    FontKey, FontKind, FontRegistry, MakeFontOptions, RegisterOutcome,
};
pub use objects::{Dictionary, Object, ObjectId};
pub use session::{FontSession, SessionFailure};
pub use writer::{ObjectWriter, PdfObjectWriter};

/// Current version of oxidize-fonts
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
