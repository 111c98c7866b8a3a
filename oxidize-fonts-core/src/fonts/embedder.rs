//! Font object emission
//!
//! Writes every registered font into the object graph in three passes:
//! shared encoding objects, embedded font program streams and finally the
//! font, widths and descriptor objects of each font.

use super::encoding::FIRST_CHAR;
use super::registry::FontRegistry;
use super::{FontInfo, FontKind};
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object, ObjectId, Stream};
use crate::writer::ObjectWriter;
use std::collections::HashMap;

/// Last byte value described by `/Widths`
pub const LAST_CHAR: usize = 255;

/// Core fonts that carry their own built-in encoding
const SYMBOLIC_CORE_FONTS: [&str; 2] = ["Symbol", "ZapfDingbats"];

/// Order in which fonts and their objects are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmitOrder {
    /// Registration order
    #[default]
    Registration,
    /// Sorted by differences string, program file and key, so two runs over
    /// the same fonts produce identical files regardless of how the fonts
    /// were registered
    Sorted,
}

/// Writes registered fonts as PDF objects
pub struct FontEmitter;

impl FontEmitter {
    /// Emit every font in `registry` through `writer`, recording the
    /// allocated object numbers back into the registry.
    pub fn emit<W: ObjectWriter>(
        registry: &mut FontRegistry,
        writer: &mut W,
        order: EmitOrder,
    ) -> Result<()> {
        Self::emit_encodings(registry, writer, order)?;
        Self::emit_programs(registry, writer, order)?;

        for index in font_order(registry, order, |key, _| key.as_str().to_string()) {
            let Some(info) = registry.font_mut(index) else {
                continue;
            };
            Self::emit_font(info, writer)?;
        }

        tracing::debug!("Emitted {} fonts", registry.len());
        Ok(())
    }

    /// `/Font` resource dictionary naming each emitted font `/F<index>`
    pub fn resources(registry: &FontRegistry) -> Result<Dictionary> {
        let mut dict = Dictionary::with_capacity(registry.len());
        for (key, info) in registry.iter() {
            let number = info.font_object_number().ok_or_else(|| {
                PdfError::ParseError(format!("font {key} has not been emitted"))
            })?;
            dict.set(
                format!("F{}", info.object_index()),
                Object::Reference(ObjectId::from(number)),
            );
        }
        Ok(dict)
    }

    fn emit_encodings<W: ObjectWriter>(
        registry: &mut FontRegistry,
        writer: &mut W,
        order: EmitOrder,
    ) -> Result<()> {
        let mut diffs: Vec<(usize, String)> = registry
            .differences()
            .iter()
            .enumerate()
            .map(|(i, diff)| (i + 1, diff.clone()))
            .collect();
        if order == EmitOrder::Sorted {
            diffs.sort_by(|a, b| a.1.cmp(&b.1));
        }

        let mut numbers = HashMap::with_capacity(diffs.len());
        for (diff_index, diff) in &diffs {
            let id = writer.allocate_object_id();
            writer.write_object(id, &Object::Dictionary(encoding_dict(diff)?))?;
            numbers.insert(*diff_index, id.number());
        }

        for index in 0..registry.len() {
            if let Some(info) = registry.font_mut(index) {
                info.diff_object_number = info.diff_index.and_then(|i| numbers.get(&i).copied());
            }
        }
        Ok(())
    }

    fn emit_programs<W: ObjectWriter>(
        registry: &mut FontRegistry,
        writer: &mut W,
        order: EmitOrder,
    ) -> Result<()> {
        let indices = font_order(registry, order, |key, info| {
            format!(
                "{}\u{0}{}",
                info.file.as_deref().unwrap_or(&info.postscript_name),
                key
            )
        });

        for index in indices {
            let Some(info) = registry.font_mut(index) else {
                continue;
            };
            let stream = match info.kind() {
                FontKind::Core | FontKind::TrueType(None) | FontKind::Type1(None) => None,
                FontKind::TrueType(Some(program)) => {
                    let mut stream = Stream::new(program.data.clone());
                    if program.compressed {
                        stream.set_filter("FlateDecode");
                    }
                    stream.dictionary_mut().set("Length1", program.original_length);
                    Some(stream)
                }
                FontKind::Type1(Some(program)) => {
                    let (clear, binary) = program.segments();
                    let mut data = Vec::with_capacity(clear.len() + binary.len());
                    data.extend_from_slice(clear);
                    data.extend_from_slice(binary);

                    let mut stream = Stream::new(data);
                    let dict = stream.dictionary_mut();
                    dict.set("Length1", program.segment1_length);
                    dict.set("Length2", program.segment2_length);
                    dict.set("Length3", 0);
                    Some(stream)
                }
            };
            let Some(stream) = stream else {
                info.stream_object_number = None;
                continue;
            };

            let id = writer.allocate_object_id();
            writer.write_object(id, &stream.into_object())?;
            info.stream_object_number = Some(id.number());
            tracing::debug!(
                "Font program for {} written as object {}",
                info.postscript_name,
                id.number()
            );
        }
        Ok(())
    }

    fn emit_font<W: ObjectWriter>(info: &mut FontInfo, writer: &mut W) -> Result<()> {
        let font_id = writer.allocate_object_id();
        info.font_object_number = Some(font_id.number());

        let font_file_key = match info.kind() {
            FontKind::Core => {
                writer.write_object(font_id, &Object::Dictionary(core_font_dict(info)))?;
                return Ok(());
            }
            FontKind::TrueType(_) => "FontFile2",
            FontKind::Type1(_) => "FontFile",
        };

        let widths_id = writer.allocate_object_id();
        let descriptor_id = writer.allocate_object_id();

        let encoding = match (info.diff_index, info.diff_object_number) {
            (None, _) => Object::name("WinAnsiEncoding"),
            (Some(_), Some(number)) => Object::Reference(ObjectId::from(number)),
            (Some(diff_index), None) => {
                return Err(PdfError::ParseError(format!(
                    "{}: encoding {} was not emitted",
                    info.postscript_name, diff_index
                )))
            }
        };

        let mut font = Dictionary::with_capacity(9);
        font.set("Type", Object::name("Font"));
        font.set("BaseFont", Object::name(info.postscript_name.as_str()));
        font.set("Subtype", Object::name(info.kind().subtype()));
        font.set("FirstChar", FIRST_CHAR);
        font.set("LastChar", LAST_CHAR);
        font.set("Widths", Object::Reference(widths_id));
        font.set("FontDescriptor", Object::Reference(descriptor_id));
        font.set("Encoding", encoding);
        writer.write_object(font_id, &Object::Dictionary(font))?;

        let widths = info.widths[FIRST_CHAR..=LAST_CHAR]
            .iter()
            .map(|&w| Object::from(w))
            .collect::<Vec<_>>();
        writer.write_object(widths_id, &Object::Array(widths))?;

        let font_file = info
            .stream_object_number
            .map(|number| (font_file_key, ObjectId::from(number)));
        let descriptor = info.descriptor.to_dict(&info.postscript_name, font_file);
        writer.write_object(descriptor_id, &Object::Dictionary(descriptor))?;

        Ok(())
    }
}

/// Registry positions in the requested order; `sort_key` is only consulted
/// for [`EmitOrder::Sorted`]
fn font_order<F>(registry: &FontRegistry, order: EmitOrder, sort_key: F) -> Vec<usize>
where
    F: Fn(&super::FontKey, &FontInfo) -> String,
{
    let mut entries: Vec<(String, usize)> = registry
        .iter()
        .map(|(key, info)| match order {
            EmitOrder::Registration => (String::new(), info.object_index()),
            EmitOrder::Sorted => (sort_key(key, info), info.object_index()),
        })
        .collect();
    if order == EmitOrder::Sorted {
        entries.sort();
    }
    entries.into_iter().map(|(_, index)| index).collect()
}

fn encoding_dict(differences: &str) -> Result<Dictionary> {
    let array = differences
        .split_whitespace()
        .map(|token| match token.strip_prefix('/') {
            Some(name) => Ok(Object::name(name)),
            None => token
                .parse::<i64>()
                .map(Object::Integer)
                .map_err(|_| PdfError::ParseError(format!("invalid differences token {token:?}"))),
        })
        .collect::<Result<Vec<_>>>()?;

    let mut dict = Dictionary::with_capacity(3);
    dict.set("Type", Object::name("Encoding"));
    dict.set("BaseEncoding", Object::name("WinAnsiEncoding"));
    dict.set("Differences", Object::Array(array));
    Ok(dict)
}

fn core_font_dict(info: &FontInfo) -> Dictionary {
    let mut dict = Dictionary::with_capacity(4);
    dict.set("Type", Object::name("Font"));
    dict.set("BaseFont", Object::name(info.postscript_name.as_str()));
    dict.set("Subtype", Object::name("Type1"));
    if !SYMBOLIC_CORE_FONTS.contains(&info.postscript_name.as_str()) {
        dict.set("Encoding", Object::name("WinAnsiEncoding"));
    }
    dict
}
