//! End-to-end font embedding tests
//!
//! Fonts are added to a session, emitted through `PdfObjectWriter` and the
//! serialized objects are checked byte for byte.

#[path = "../src/fonts/test_fonts.rs"]
mod test_fonts;

use oxidize_fonts::compression::decompress;
use oxidize_fonts::{
    EmitOrder, EncodingTable, ErrorKind, FontSession, Object, ObjectId, PdfError,
    PdfObjectWriter,
};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;
use test_fonts::{pfb_bytes, sample_afm, TestFontBuilder};

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Bytes between `N 0 obj` and `endobj`
fn object_body(pdf: &[u8], number: u32) -> &[u8] {
    let header = format!("\n{number} 0 obj\n");
    let start = find(pdf, header.as_bytes()).expect("object should be present") + header.len();
    let end = start + find(&pdf[start..], b"\nendobj\n").expect("object should be terminated");
    &pdf[start..end]
}

fn object_text(pdf: &[u8], number: u32) -> String {
    String::from_utf8_lossy(object_body(pdf, number)).into_owned()
}

fn stream_data(body: &[u8]) -> &[u8] {
    let start = find(body, b"\nstream\n").expect("stream keyword") + b"\nstream\n".len();
    let end = body.len() - b"\nendstream".len();
    &body[start..end]
}

/// Writes `serif.pfb` and `serif.afm` into `dir`
fn write_type1(dir: &TempDir) -> std::path::PathBuf {
    let pfb_path = dir.path().join("serif.pfb");
    fs::write(&pfb_path, pfb_bytes(b"%!FontType1", b"\x01\x02\x03")).unwrap();
    fs::write(dir.path().join("serif.afm"), sample_afm("TestSerif-Bold")).unwrap();
    pfb_path
}

#[test]
fn test_embed_truetype_type1_and_core() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let ttf_path = temp_dir.path().join("TestSans.ttf");
    let font_bytes = TestFontBuilder::new().build();
    fs::write(&ttf_path, &font_bytes)?;
    let pfb_path = write_type1(&temp_dir);

    let mut session = FontSession::new()?;
    session.add_truetype("TestSans", "", &ttf_path, true)?;
    session.add_type1("TestSerif", "B", &pfb_path, true)?;
    session.add_core("Helvetica", "", "Helvetica")?;

    let mut writer = PdfObjectWriter::new_with_writer(Vec::new());
    writer.write_header()?;
    session.emit(&mut writer, EmitOrder::Registration)?;
    let resources = session.resources()?;
    let pdf = writer.finish(None)?;

    // Programs first, then font, widths and descriptor per font
    let truetype_stream = object_body(&pdf, 1);
    let compressed = stream_data(truetype_stream);
    assert_eq!(
        String::from_utf8_lossy(&truetype_stream[..find(truetype_stream, b">>").unwrap() + 2]),
        format!(
            "<<\n/Length {}\n/Filter /FlateDecode\n/Length1 {}\n>>",
            compressed.len(),
            font_bytes.len()
        )
    );
    assert_eq!(decompress(compressed)?, font_bytes);

    assert_eq!(
        object_body(&pdf, 2),
        &b"<<\n/Length 14\n/Length1 11\n/Length2 3\n/Length3 0\n>>\n\
           stream\n%!FontType1\x01\x02\x03\nendstream"[..]
    );

    assert_eq!(
        object_text(&pdf, 3),
        "<<\n/Type /Font\n/BaseFont /TestSans-Regular\n/Subtype /TrueType\n/FirstChar 32\n\
         /LastChar 255\n/Widths 4 0 R\n/FontDescriptor 5 0 R\n/Encoding /WinAnsiEncoding\n>>"
    );

    let widths = object_text(&pdf, 4);
    let widths: Vec<&str> = widths
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(' ')
        .collect();
    assert_eq!(widths.len(), 224);
    assert_eq!(widths[0], "250"); // space
    assert_eq!(widths[1], "500"); // exclam, missing
    assert_eq!(widths[usize::from(b'A' - 32)], "600");
    assert_eq!(widths[usize::from(b'B' - 32)], "650");

    assert_eq!(
        object_text(&pdf, 5),
        "<<\n/Type /FontDescriptor\n/FontName /TestSans-Regular\n/Ascent 750\n/Descent -250\n\
         /CapHeight 700\n/Flags 32\n/FontBBox [-50 -200 1000 900]\n/ItalicAngle 0\n/StemV 70\n\
         /MissingWidth 500\n/FontFile2 1 0 R\n>>"
    );

    assert!(object_text(&pdf, 6).contains("/BaseFont /TestSerif-Bold\n/Subtype /Type1"));
    assert_eq!(
        object_text(&pdf, 8),
        "<<\n/Type /FontDescriptor\n/FontName /TestSerif-Bold\n/Ascent 683\n/Descent -217\n\
         /CapHeight 662\n/Flags 96\n/FontBBox [-168 -218 1000 898]\n/ItalicAngle -13\n\
         /StemV 85\n/MissingWidth 333\n/FontFile 2 0 R\n>>"
    );

    assert_eq!(
        object_text(&pdf, 9),
        "<<\n/Type /Font\n/BaseFont /Helvetica\n/Subtype /Type1\n/Encoding /WinAnsiEncoding\n>>"
    );

    assert_eq!(
        resources.get("F1"),
        Some(&Object::Reference(ObjectId::new(6, 0)))
    );
    assert_eq!(
        resources.get("F2"),
        Some(&Object::Reference(ObjectId::new(9, 0)))
    );

    let text = String::from_utf8_lossy(&pdf);
    assert!(text.contains("trailer\n<<\n/Size 10\n>>"));
    assert!(text.ends_with("%%EOF\n"));
    Ok(())
}

#[test]
fn test_shared_differences_object() -> Result<(), Box<dyn std::error::Error>> {
    let encoding = EncodingTable::cp1252()?;
    let mut text = String::new();
    for (position, entry) in encoding.entries().iter().enumerate() {
        if !entry.is_mapped() {
            continue;
        }
        // Replace the euro sign with a Greek capital delta
        let (code_point, name) = if position == 0x80 {
            (0x0394, "Delta")
        } else {
            (entry.code_point, entry.glyph_name.as_str())
        };
        text.push_str(&format!("!{position:02X} U+{code_point:04X} {name}\n"));
    }
    let mut session = FontSession::with_encoding(EncodingTable::parse(&text)?)?;

    let sans = TestFontBuilder::new().build();
    let mono = TestFontBuilder {
        postscript_name: "TestMono".to_string(),
        fixed_pitch: true,
        ..TestFontBuilder::new()
    }
    .build();
    session.add_truetype_bytes("Sans", "", &sans, false)?;
    session.add_truetype_bytes("Mono", "", &mono, false)?;

    let mut writer = PdfObjectWriter::new_with_writer(Vec::new());
    writer.write_header()?;
    session.emit(&mut writer, EmitOrder::Registration)?;
    let pdf = writer.finish(None)?;

    assert_eq!(
        object_text(&pdf, 1),
        "<<\n/Type /Encoding\n/BaseEncoding /WinAnsiEncoding\n/Differences [128 /Delta]\n>>"
    );
    // Neither font is embedded: font, widths and descriptor each
    assert!(object_text(&pdf, 2).ends_with("/Encoding 1 0 R\n>>"));
    assert!(object_text(&pdf, 5).ends_with("/Encoding 1 0 R\n>>"));
    assert!(!object_text(&pdf, 4).contains("/FontFile2"));
    assert!(object_text(&pdf, 7).contains("/Flags 33"));

    let sans_info = session.lookup("sans", "").unwrap();
    assert_eq!(sans_info.diff_index(), Some(1));
    assert_eq!(sans_info.diff_object_number(), Some(1));
    assert_eq!(session.registry().differences(), &["128 /Delta".to_string()]);
    Ok(())
}

#[test]
fn test_sorted_emission_is_order_independent() -> Result<(), Box<dyn std::error::Error>> {
    let alpha = TestFontBuilder {
        postscript_name: "Alpha".to_string(),
        ..TestFontBuilder::new()
    }
    .build();
    let beta = TestFontBuilder {
        postscript_name: "Beta".to_string(),
        weight_class: 700,
        ..TestFontBuilder::new()
    }
    .build();

    let emit = |first: (&str, &[u8]), second: (&str, &[u8])| -> oxidize_fonts::Result<Vec<u8>> {
        let mut session = FontSession::new()?;
        session.add_truetype_bytes(first.0, "", first.1, true)?;
        session.add_core("Times", "", "Times-Roman")?;
        session.add_truetype_bytes(second.0, "", second.1, true)?;
        let mut writer = PdfObjectWriter::new_with_writer(Vec::new());
        writer.write_header()?;
        session.emit(&mut writer, EmitOrder::Sorted)?;
        writer.finish(None)
    };

    let forward = emit(("alpha", alpha.as_slice()), ("beta", beta.as_slice()))?;
    let backward = emit(("beta", beta.as_slice()), ("alpha", alpha.as_slice()))?;
    assert_eq!(forward, backward);

    // Alpha's program sorts ahead of Beta's
    assert!(object_text(&forward, 3).contains("/BaseFont /Alpha"));
    assert!(object_text(&forward, 5).contains("/FontFile2 1 0 R"));
    Ok(())
}

#[test]
fn test_failure_stops_session() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let mut session = FontSession::new()?;
    session.add_core("Courier", "", "Courier")?;

    // A PFB without its AFM cannot be registered
    let lonely = temp_dir.path().join("lonely.pfb");
    fs::write(&lonely, pfb_bytes(b"a", b"b"))?;
    let err = session.add_type1("Lonely", "I", &lonely, true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("\"Lonely\""), "{err}");
    assert!(session.lookup("Lonely", "I").is_none());

    let mut writer = PdfObjectWriter::new_with_writer(Vec::new());
    let halted = session.emit(&mut writer, EmitOrder::Registration).unwrap_err();
    assert!(matches!(halted, PdfError::SessionHalted(_)));
    assert_eq!(writer.next_object_number(), 1, "nothing written while halted");

    let failure = session.take_error().expect("failure recorded");
    assert_eq!(failure.kind, ErrorKind::NotFound);
    assert!(failure.message.contains("lonely.afm"));

    session.emit(&mut writer, EmitOrder::Registration)?;
    assert_eq!(session.registry().len(), 1);
    Ok(())
}

#[test]
fn test_corrupt_type1_container() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let pfb_path = temp_dir.path().join("broken.pfb");
    fs::write(&pfb_path, b"not a pfb")?;
    fs::write(temp_dir.path().join("broken.afm"), sample_afm("Broken"))?;

    let mut session = FontSession::new()?;
    let err = session.add_type1("Broken", "", &pfb_path, true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert!(session.registry().is_empty());

    // Metrics only never touches the program
    session.take_error();
    session.add_type1("Broken", "", &pfb_path, false)?;
    assert_eq!(session.registry().len(), 1);
    Ok(())
}
