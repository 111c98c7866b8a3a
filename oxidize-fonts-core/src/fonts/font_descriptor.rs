//! Font descriptor structures for PDF font embedding

use super::FontInfo;
use crate::objects::{Dictionary, Object, ObjectId};
use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Font descriptor flags as defined in PDF specification
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FontFlags: u32 {
        /// All glyphs have the same width
        const FIXED_PITCH = 1 << 0;
        /// Glyphs have serifs
        const SERIF = 1 << 1;
        /// Font contains glyphs outside Adobe standard Latin set
        const SYMBOLIC = 1 << 2;
        /// Font is a script font
        const SCRIPT = 1 << 3;
        /// Font uses Adobe standard Latin character set
        const NONSYMBOLIC = 1 << 5;
        /// Font is italic
        const ITALIC = 1 << 6;
        /// All glyphs have no visible strokes
        const ALL_CAP = 1 << 16;
        /// All glyphs are small capitals
        const SMALL_CAP = 1 << 17;
        /// Bold font
        const FORCE_BOLD = 1 << 18;
    }
}

/// Stem width used when the font does not provide one
pub const DEFAULT_STEM_V_BOLD: i32 = 120;
pub const DEFAULT_STEM_V_REGULAR: i32 = 70;

/// Font bounding box in 1000-unit em space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FontBBox {
    #[serde(rename = "Xmin")]
    pub x_min: i32,
    #[serde(rename = "Ymin")]
    pub y_min: i32,
    #[serde(rename = "Xmax")]
    pub x_max: i32,
    #[serde(rename = "Ymax")]
    pub y_max: i32,
}

impl FontBBox {
    pub fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Self {
        FontBBox {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn to_array(&self) -> Object {
        Object::Array(vec![
            Object::from(self.x_min),
            Object::from(self.y_min),
            Object::from(self.x_max),
            Object::from(self.y_max),
        ])
    }
}

/// PDF Font Descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FontDescriptor {
    pub ascent: i32,
    /// Typically negative
    pub descent: i32,
    pub cap_height: i32,
    #[serde(serialize_with = "flags_as_bits", deserialize_with = "flags_from_bits")]
    pub flags: FontFlags,
    #[serde(rename = "FontBBox")]
    pub font_bbox: FontBBox,
    pub italic_angle: i32,
    #[serde(rename = "StemV")]
    pub stem_v: i32,
    pub missing_width: i32,
}

impl FontDescriptor {
    /// Fill in derived fields. Running it twice gives the same result.
    pub fn apply_defaults(&mut self, is_bold: bool, is_fixed_pitch: bool) {
        if self.cap_height == 0 {
            self.cap_height = self.ascent;
        }

        self.flags.insert(FontFlags::NONSYMBOLIC);
        self.flags.set(FontFlags::FIXED_PITCH, is_fixed_pitch);
        self.flags.set(FontFlags::ITALIC, self.italic_angle != 0);

        if self.stem_v == 0 {
            self.stem_v = if is_bold {
                DEFAULT_STEM_V_BOLD
            } else {
                DEFAULT_STEM_V_REGULAR
            };
        }
    }

    /// Descriptor dictionary. `font_file` pairs the `/FontFile*` key with the
    /// stream object holding the program.
    pub fn to_dict(&self, font_name: &str, font_file: Option<(&str, ObjectId)>) -> Dictionary {
        let mut dict = Dictionary::with_capacity(11);

        dict.set("Type", Object::name("FontDescriptor"));
        dict.set("FontName", Object::name(font_name));
        dict.set("Ascent", self.ascent);
        dict.set("Descent", self.descent);
        dict.set("CapHeight", self.cap_height);
        dict.set("Flags", Object::Integer(self.flags.bits() as i64));
        dict.set("FontBBox", self.font_bbox.to_array());
        dict.set("ItalicAngle", self.italic_angle);
        dict.set("StemV", self.stem_v);
        dict.set("MissingWidth", self.missing_width);

        if let Some((key, id)) = font_file {
            dict.set(key, Object::Reference(id));
        }

        dict
    }
}

/// Apply descriptor defaults to a freshly extracted font
pub fn finalize(info: &mut FontInfo) {
    let (is_bold, is_fixed_pitch) = (info.is_bold, info.is_fixed_pitch);
    info.descriptor.apply_defaults(is_bold, is_fixed_pitch);
}

fn flags_as_bits<S: Serializer>(flags: &FontFlags, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u32(flags.bits())
}

fn flags_from_bits<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FontFlags, D::Error> {
    u32::deserialize(deserializer).map(FontFlags::from_bits_retain)
}
