//! Font definition files
//!
//! [`make_font`] runs the metrics extractor once, offline, and stores the
//! result as a JSON definition next to the (already compressed) font
//! program. Documents then load the definition with
//! [`FontDefinition::load`] instead of parsing the font again.

use super::encoding::{self, EncodingTable};
use super::font_descriptor::{finalize, FontDescriptor};
use super::{truetype, type1, FontInfo, FontKind, TrueTypeProgram, Type1Program};
use crate::error::{PdfError, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Name recorded for the bundled code page
pub const DEFAULT_ENCODING: &str = "cp1252";

/// Serialized form of a [`FontInfo`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontDefinition {
    #[serde(rename = "Tp")]
    pub kind: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Desc")]
    pub descriptor: FontDescriptor,
    #[serde(rename = "Up")]
    pub underline_position: i32,
    #[serde(rename = "Ut")]
    pub underline_thickness: i32,
    #[serde(rename = "Cw")]
    pub widths: Vec<i32>,
    #[serde(rename = "Enc")]
    pub encoding: String,
    #[serde(rename = "Diff", default)]
    pub differences: String,
    /// Program file, relative to the definition file
    #[serde(rename = "File", default)]
    pub file: String,
    #[serde(rename = "Size1", default)]
    pub size1: usize,
    #[serde(rename = "Size2", default)]
    pub size2: usize,
    #[serde(rename = "OriginalSize", default)]
    pub original_size: usize,
    #[serde(rename = "Bold", default)]
    pub is_bold: bool,
    #[serde(rename = "IsFixedPitch", default)]
    pub is_fixed_pitch: bool,
}

impl FontDefinition {
    /// Describe `info`; `file` names the program file written next to the
    /// definition, if any.
    pub fn from_info(info: &FontInfo, encoding: &str, file: Option<&str>) -> Self {
        let (size1, size2, original_size) = match info.kind() {
            FontKind::TrueType(Some(program)) => (0, 0, program.original_length),
            FontKind::Type1(Some(program)) => (program.segment1_length, program.segment2_length, 0),
            FontKind::Core | FontKind::TrueType(None) | FontKind::Type1(None) => (0, 0, 0),
        };

        FontDefinition {
            kind: info.kind().name().to_string(),
            name: info.postscript_name.clone(),
            descriptor: info.descriptor,
            underline_position: info.underline_position,
            underline_thickness: info.underline_thickness,
            widths: info.widths.to_vec(),
            encoding: encoding.to_string(),
            differences: info.differences.clone().unwrap_or_default(),
            file: file.unwrap_or_default().to_string(),
            size1,
            size2,
            original_size,
            is_bold: info.is_bold,
            is_fixed_pitch: info.is_fixed_pitch,
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a definition file and its program file into a [`FontInfo`]
    /// ready for registration.
    pub fn load(path: impl AsRef<Path>) -> Result<FontInfo> {
        let path = path.as_ref();
        let text = super::read_file(path)?;
        let definition: FontDefinition = serde_json::from_slice(&text)?;

        let program = if definition.file.is_empty() {
            None
        } else {
            let dir = path.parent().unwrap_or_else(|| Path::new(""));
            Some(super::read_file(&dir.join(&definition.file))?)
        };

        let info = definition.into_info(program)?;
        tracing::debug!("Loaded font definition {}", path.display());
        Ok(info)
    }

    /// Rebuild the [`FontInfo`], attaching `program` bytes read from
    /// [`FontDefinition::file`].
    pub fn into_info(self, program: Option<Vec<u8>>) -> Result<FontInfo> {
        let kind = match (self.kind.as_str(), program) {
            ("Core", _) => FontKind::Core,
            ("TrueType", program) => FontKind::TrueType(program.map(|data| TrueTypeProgram {
                data,
                original_length: self.original_size,
                compressed: true,
            })),
            ("Type1", program) => {
                let program = match program {
                    Some(data) => {
                        let declared = self.size1.checked_add(self.size2);
                        if declared.map_or(true, |declared| data.len() < declared) {
                            return Err(PdfError::ParseError(format!(
                                "{}: {} program bytes do not hold segments of {} and {}",
                                self.name,
                                data.len(),
                                self.size1,
                                self.size2
                            )));
                        }
                        Some(Type1Program {
                            data,
                            segment1_length: self.size1,
                            segment2_length: self.size2,
                        })
                    }
                    None => None,
                };
                FontKind::Type1(program)
            }
            (other, _) => return Err(PdfError::UnsupportedFontKind(other.to_string())),
        };

        let widths: [i32; 256] = self.widths.as_slice().try_into().map_err(|_| {
            PdfError::ParseError(format!(
                "{}: expected 256 character widths, found {}",
                self.name,
                self.widths.len()
            ))
        })?;

        let mut info = FontInfo::new(kind, self.name);
        info.descriptor = self.descriptor;
        info.underline_position = self.underline_position;
        info.underline_thickness = self.underline_thickness;
        info.widths = widths;
        info.is_bold = self.is_bold;
        info.is_fixed_pitch = self.is_fixed_pitch;
        info.differences = Some(self.differences).filter(|d| !d.is_empty());
        info.file = Some(self.file).filter(|f| !f.is_empty());
        Ok(info)
    }
}

/// Settings for [`MakeFontOptions::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakeFontOptions {
    /// Store the font program next to the definition
    pub embed: bool,
    /// Code page map; the bundled cp1252 when unset
    pub encoding: Option<PathBuf>,
    /// Output directory; the font's own directory when unset
    pub destination: Option<PathBuf>,
}

impl Default for MakeFontOptions {
    fn default() -> Self {
        MakeFontOptions {
            embed: true,
            encoding: None,
            destination: None,
        }
    }
}

impl MakeFontOptions {
    /// Generate the definition for `font_path`, returning the path of the
    /// written JSON file. Missing glyph diagnostics go to `sink`.
    pub fn run(&self, font_path: impl AsRef<Path>, sink: &mut impl Write) -> Result<PathBuf> {
        let font_path = font_path.as_ref();
        let kind = font_kind_for(font_path)?;
        if !font_path.exists() {
            return Err(PdfError::NotFound(font_path.to_path_buf()));
        }

        let (encoding, encoding_name) = match &self.encoding {
            Some(path) => (EncodingTable::load(path)?, encoding_name(path)),
            None => (EncodingTable::cp1252()?, DEFAULT_ENCODING.to_string()),
        };

        let mut info = match kind {
            SourceKind::TrueType => truetype::extract_file(font_path, self.embed, &encoding, sink)?,
            SourceKind::Type1 => type1::extract(font_path, self.embed, &encoding, sink)?,
        };
        finalize(&mut info);

        if self.encoding.is_some() {
            let diff = encoding::differences(&encoding, &EncodingTable::cp1252()?);
            info.differences = Some(diff).filter(|d| !d.is_empty());
        }

        let dst_dir = match &self.destination {
            Some(dir) => dir.clone(),
            None => font_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };
        let base = font_path
            .file_stem()
            .ok_or_else(|| PdfError::ParseError(format!("{}: no file name", font_path.display())))?
            .to_string_lossy()
            .into_owned();

        let program_file = match info.kind() {
            FontKind::TrueType(Some(program)) => Some((format!("{base}.z"), &program.data)),
            FontKind::Type1(Some(program)) => Some((format!("{base}.t1"), &program.data)),
            _ => None,
        };
        if let Some((file_name, data)) = &program_file {
            std::fs::write(dst_dir.join(file_name), data)?;
            tracing::info!("Font file written to {}", dst_dir.join(file_name).display());
        }

        let file_name = program_file.as_ref().map(|(name, _)| name.as_str());
        let definition = FontDefinition::from_info(&info, &encoding_name, file_name);
        let json_path = dst_dir.join(format!("{base}.json"));
        std::fs::write(&json_path, definition.to_json()?)?;
        tracing::info!("Font definition written to {}", json_path.display());

        Ok(json_path)
    }
}

/// Generate a font definition file.
///
/// `encoding_path` selects the code page map (the bundled cp1252 when
/// `None`) and the definition plus program file are written to `dst_dir`.
pub fn make_font(
    font_path: impl AsRef<Path>,
    encoding_path: Option<&Path>,
    dst_dir: impl AsRef<Path>,
    embed: bool,
    sink: &mut impl Write,
) -> Result<PathBuf> {
    MakeFontOptions {
        embed,
        encoding: encoding_path.map(Path::to_path_buf),
        destination: Some(dst_dir.as_ref().to_path_buf()),
    }
    .run(font_path, sink)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    TrueType,
    Type1,
}

fn font_kind_for(path: &Path) -> Result<SourceKind> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "ttf" | "otf" => Ok(SourceKind::TrueType),
        "pfb" => Ok(SourceKind::Type1),
        _ => Err(PdfError::ParseError(format!(
            "{}: unrecognized extension",
            path.display()
        ))),
    }
}

fn encoding_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fonts::test_fonts::{pfb_bytes, sample_afm, TestFontBuilder};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extension_dispatch() {
        assert_eq!(font_kind_for(Path::new("a.TTF")).unwrap(), SourceKind::TrueType);
        assert_eq!(font_kind_for(Path::new("a.otf")).unwrap(), SourceKind::TrueType);
        assert_eq!(font_kind_for(Path::new("a.Pfb")).unwrap(), SourceKind::Type1);

        let err = font_kind_for(Path::new("a.woff")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("unrecognized extension"));
        assert!(font_kind_for(Path::new("noext")).is_err());
    }

    #[test]
    fn test_make_truetype_definition() {
        let dir = tempfile::tempdir().unwrap();
        let font_path = dir.path().join("TestSans.ttf");
        let font_bytes = TestFontBuilder::new().build();
        std::fs::write(&font_path, &font_bytes).unwrap();

        let mut sink = Vec::new();
        let json_path = make_font(&font_path, None, dir.path(), true, &mut sink).unwrap();
        assert_eq!(json_path, dir.path().join("TestSans.json"));

        let definition =
            FontDefinition::from_json(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(definition.kind, "TrueType");
        assert_eq!(definition.name, "TestSans-Regular");
        assert_eq!(definition.encoding, "cp1252");
        assert_eq!(definition.differences, "");
        assert_eq!(definition.file, "TestSans.z");
        assert_eq!(definition.original_size, font_bytes.len());
        assert_eq!(definition.widths.len(), 256);
        assert_eq!(definition.descriptor.stem_v, 70);

        let compressed = std::fs::read(dir.path().join("TestSans.z")).unwrap();
        assert_eq!(crate::compression::decompress(&compressed).unwrap(), font_bytes);

        // cp1252 has many glyphs the test font lacks
        let report = String::from_utf8(sink).unwrap();
        assert!(report.contains("Character Euro is missing"));
        assert!(!report.contains("Character A is missing"));
    }

    #[test]
    fn test_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let font_path = dir.path().join("TestSans.ttf");
        std::fs::write(&font_path, TestFontBuilder::new().build()).unwrap();
        let json_path =
            make_font(&font_path, None, dir.path(), true, &mut std::io::sink()).unwrap();

        let info = FontDefinition::load(&json_path).unwrap();
        assert_eq!(info.postscript_name, "TestSans-Regular");
        assert_eq!(info.width(b'A'), 600);
        assert_eq!(info.file.as_deref(), Some("TestSans.z"));
        match info.kind() {
            FontKind::TrueType(Some(program)) => {
                assert!(program.compressed);
                assert!(program.original_length > 0);
            }
            other => panic!("Expected embedded TrueType, got {other:?}"),
        }
    }

    #[test]
    fn test_make_type1_definition_with_custom_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let font_path = dir.path().join("serif.pfb");
        std::fs::write(&font_path, pfb_bytes(b"%!FontType1", b"\x01\x02\x03")).unwrap();
        std::fs::write(dir.path().join("serif.afm"), sample_afm("TestSerif-Bold")).unwrap();
        let map_path = dir.path().join("greek.map");
        std::fs::write(&map_path, "!20 U+0020 space\n!41 U+0394 Delta\n").unwrap();

        let out = tempfile::tempdir().unwrap();
        let json_path =
            make_font(&font_path, Some(&map_path), out.path(), true, &mut Vec::new()).unwrap();

        let definition =
            FontDefinition::from_json(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(definition.kind, "Type1");
        assert_eq!(definition.encoding, "greek");
        assert_eq!(definition.file, "serif.t1");
        assert_eq!(definition.size1, 11);
        assert_eq!(definition.size2, 3);
        assert!(definition.differences.starts_with("33 /.notdef"));
        assert!(definition.differences.contains("/.notdef /Delta /.notdef"));
        assert_eq!(definition.widths[0x41], 612);
        assert_eq!(definition.descriptor.stem_v, 85);

        let info = FontDefinition::load(&json_path).unwrap();
        assert_eq!(
            info.kind(),
            &FontKind::Type1(Some(Type1Program {
                data: b"%!FontType1\x01\x02\x03".to_vec(),
                segment1_length: 11,
                segment2_length: 3,
            }))
        );
        assert!(info.differences.is_some());
    }

    #[test]
    fn test_metrics_only_definition() {
        let dir = tempfile::tempdir().unwrap();
        let font_path = dir.path().join("plain.ttf");
        std::fs::write(&font_path, TestFontBuilder::new().build()).unwrap();

        let json_path = MakeFontOptions {
            embed: false,
            ..MakeFontOptions::default()
        }
        .run(&font_path, &mut std::io::sink())
        .unwrap();

        assert_eq!(json_path, dir.path().join("plain.json"));
        assert!(!dir.path().join("plain.z").exists());
        let info = FontDefinition::load(&json_path).unwrap();
        assert_eq!(info.kind(), &FontKind::TrueType(None));
    }

    #[test]
    fn test_missing_font_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = make_font(
            dir.path().join("absent.ttf"),
            None,
            dir.path(),
            true,
            &mut Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_unknown_kind_in_definition() {
        let info = FontInfo::new(FontKind::Core, "Helvetica");
        let mut definition = FontDefinition::from_info(&info, "cp1252", None);
        definition.kind = "Type3".to_string();

        let err = definition.into_info(None).unwrap_err();
        assert!(matches!(err, PdfError::UnsupportedFontKind(ref k) if k == "Type3"));
    }

    #[test]
    fn test_width_count_checked() {
        let info = FontInfo::new(FontKind::Core, "Helvetica");
        let mut definition = FontDefinition::from_info(&info, "cp1252", None);
        definition.widths.truncate(100);
        assert!(matches!(
            definition.into_info(None),
            Err(PdfError::ParseError(_))
        ));
    }

    #[test]
    fn test_type1_segment_sizes_checked() {
        let info = FontInfo::new(FontKind::Type1(None), "Serif");
        let mut definition = FontDefinition::from_info(&info, "cp1252", None);
        definition.size1 = 1;
        definition.size2 = usize::MAX;
        assert!(matches!(
            definition.clone().into_info(Some(vec![1, 2, 3])),
            Err(PdfError::ParseError(_))
        ));

        definition.size2 = 3;
        assert!(definition.clone().into_info(Some(vec![1, 2, 3])).is_err());
        definition.size2 = 2;
        assert!(definition.into_info(Some(vec![1, 2, 3])).is_ok());
    }

    #[test]
    fn test_core_definition_round_trip() {
        let mut info = FontInfo::new(FontKind::Core, "Helvetica");
        info.widths = [556; 256];
        let json = FontDefinition::from_info(&info, "cp1252", None).to_json().unwrap();
        assert!(json.contains("\"Tp\": \"Core\""));

        let back = FontDefinition::from_json(&json).unwrap().into_info(None).unwrap();
        assert_eq!(back, info);
    }
}
