//! Synthetic font fixtures shared by unit and integration tests.
//!
//! Only depends on `std` so this crate's integration tests can pull it in
//! with `#[path = "../src/fonts/test_fonts.rs"]`. Other crates enable the
//! `test-utils` feature.
#![allow(dead_code)]

/// Builder for a minimal sfnt file carrying the tables the metrics
/// extractor reads: head, hhea, maxp, hmtx, cmap, OS/2, post and name.
#[derive(Debug, Clone)]
pub struct TestFontBuilder {
    pub units_per_em: u16,
    pub bbox: [i16; 4],
    pub hhea_ascender: i16,
    pub hhea_descender: i16,
    pub typo_ascender: i16,
    pub typo_descender: i16,
    pub cap_height: Option<i16>,
    pub weight_class: u16,
    pub fs_type: u16,
    pub include_os2: bool,
    pub italic_angle: i16,
    /// Fractional part of the 16.16 italic angle
    pub italic_angle_fraction: u16,
    pub underline_position: i16,
    pub underline_thickness: i16,
    pub fixed_pitch: bool,
    pub postscript_name: String,
    pub advances: Vec<u16>,
    /// Unicode code point to glyph id, encoded as a format 4 subtable
    pub cmap: Vec<(u16, u16)>,
}

impl Default for TestFontBuilder {
    fn default() -> Self {
        Self {
            units_per_em: 1000,
            bbox: [-50, -200, 1000, 900],
            hhea_ascender: 800,
            hhea_descender: -200,
            typo_ascender: 750,
            typo_descender: -250,
            cap_height: Some(700),
            weight_class: 400,
            fs_type: 0,
            include_os2: true,
            italic_angle: 0,
            italic_angle_fraction: 0,
            underline_position: -100,
            underline_thickness: 50,
            fixed_pitch: false,
            postscript_name: "TestSans-Regular".to_string(),
            // glyph 0 (.notdef), space, A, B
            advances: vec![500, 250, 600, 650],
            cmap: vec![(0x20, 1), (0x41, 2), (0x42, 3)],
        }
    }
}

impl TestFontBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(&self) -> Vec<u8> {
        let mut tables: Vec<([u8; 4], Vec<u8>)> = vec![
            (*b"cmap", self.cmap_table()),
            (*b"head", self.head_table()),
            (*b"hhea", self.hhea_table()),
            (*b"hmtx", self.hmtx_table()),
            (*b"maxp", self.maxp_table()),
            (*b"name", self.name_table()),
            (*b"post", self.post_table()),
        ];
        if self.include_os2 {
            tables.push((*b"OS/2", self.os2_table()));
        }
        tables.sort_by(|a, b| a.0.cmp(&b.0));

        let num_tables = tables.len() as u16;
        let mut font = Vec::new();
        font.extend(0x0001_0000u32.to_be_bytes());
        font.extend(num_tables.to_be_bytes());
        font.extend([0u8; 6]); // searchRange, entrySelector, rangeShift

        let mut offset = 12 + 16 * tables.len();
        for (tag, data) in &tables {
            font.extend(tag);
            font.extend(0u32.to_be_bytes()); // checksum
            font.extend((offset as u32).to_be_bytes());
            font.extend((data.len() as u32).to_be_bytes());
            offset += padded_len(data.len());
        }
        for (_, data) in &tables {
            font.extend(data);
            font.resize(font.len() + padded_len(data.len()) - data.len(), 0);
        }
        font
    }

    fn head_table(&self) -> Vec<u8> {
        let mut t = Vec::new();
        t.extend(0x0001_0000u32.to_be_bytes()); // version
        t.extend(0x0001_0000u32.to_be_bytes()); // fontRevision
        t.extend(0u32.to_be_bytes()); // checkSumAdjustment
        t.extend(0x5F0F_3CF5u32.to_be_bytes()); // magicNumber
        t.extend(0u16.to_be_bytes()); // flags
        t.extend(self.units_per_em.to_be_bytes());
        t.extend([0u8; 16]); // created, modified
        for v in self.bbox {
            t.extend(v.to_be_bytes());
        }
        t.extend(0u16.to_be_bytes()); // macStyle
        t.extend(8u16.to_be_bytes()); // lowestRecPPEM
        t.extend(2i16.to_be_bytes()); // fontDirectionHint
        t.extend(0i16.to_be_bytes()); // indexToLocFormat
        t.extend(0i16.to_be_bytes()); // glyphDataFormat
        t
    }

    fn hhea_table(&self) -> Vec<u8> {
        let mut t = Vec::new();
        t.extend(0x0001_0000u32.to_be_bytes());
        t.extend(self.hhea_ascender.to_be_bytes());
        t.extend(self.hhea_descender.to_be_bytes());
        t.extend(0i16.to_be_bytes()); // lineGap
        let max_advance = self.advances.iter().copied().max().unwrap_or(0);
        t.extend(max_advance.to_be_bytes());
        t.extend([0u8; 22]); // bearings, extents, caret, reserved, metricDataFormat
        t.extend((self.advances.len() as u16).to_be_bytes());
        t
    }

    fn maxp_table(&self) -> Vec<u8> {
        let mut t = Vec::new();
        t.extend(0x0000_5000u32.to_be_bytes()); // version 0.5
        t.extend((self.advances.len() as u16).to_be_bytes());
        t
    }

    fn hmtx_table(&self) -> Vec<u8> {
        let mut t = Vec::new();
        for advance in &self.advances {
            t.extend(advance.to_be_bytes());
            t.extend(0i16.to_be_bytes()); // lsb
        }
        t
    }

    fn cmap_table(&self) -> Vec<u8> {
        let mut mappings = self.cmap.clone();
        mappings.sort();

        let seg_count = mappings.len() + 1;
        let mut sub = Vec::new();
        sub.extend(4u16.to_be_bytes()); // format
        let length = 16 + 8 * seg_count;
        sub.extend((length as u16).to_be_bytes());
        sub.extend(0u16.to_be_bytes()); // language
        sub.extend(((seg_count * 2) as u16).to_be_bytes());
        sub.extend([0u8; 6]); // searchRange, entrySelector, rangeShift
        for (code, _) in &mappings {
            sub.extend(code.to_be_bytes());
        }
        sub.extend(0xFFFFu16.to_be_bytes());
        sub.extend(0u16.to_be_bytes()); // reservedPad
        for (code, _) in &mappings {
            sub.extend(code.to_be_bytes());
        }
        sub.extend(0xFFFFu16.to_be_bytes());
        for (code, glyph) in &mappings {
            sub.extend(glyph.wrapping_sub(*code).to_be_bytes());
        }
        sub.extend(1u16.to_be_bytes());
        sub.extend(vec![0u8; seg_count * 2]); // idRangeOffset

        let mut t = Vec::new();
        t.extend(0u16.to_be_bytes()); // version
        t.extend(1u16.to_be_bytes()); // numTables
        t.extend(3u16.to_be_bytes()); // platform: Windows
        t.extend(1u16.to_be_bytes()); // encoding: Unicode BMP
        t.extend(12u32.to_be_bytes());
        t.extend(sub);
        t
    }

    fn os2_table(&self) -> Vec<u8> {
        let version: u16 = if self.cap_height.is_some() { 2 } else { 1 };
        let mut t = vec![0u8; if version >= 2 { 96 } else { 86 }];
        t[0..2].copy_from_slice(&version.to_be_bytes());
        t[4..6].copy_from_slice(&self.weight_class.to_be_bytes());
        t[8..10].copy_from_slice(&self.fs_type.to_be_bytes());
        t[68..70].copy_from_slice(&self.typo_ascender.to_be_bytes());
        t[70..72].copy_from_slice(&self.typo_descender.to_be_bytes());
        if let Some(cap_height) = self.cap_height {
            t[88..90].copy_from_slice(&cap_height.to_be_bytes());
        }
        t
    }

    fn post_table(&self) -> Vec<u8> {
        let mut t = Vec::new();
        t.extend(0x0003_0000u32.to_be_bytes()); // version 3
        t.extend(self.italic_angle.to_be_bytes());
        t.extend(self.italic_angle_fraction.to_be_bytes());
        t.extend(self.underline_position.to_be_bytes());
        t.extend(self.underline_thickness.to_be_bytes());
        t.extend(u32::from(self.fixed_pitch).to_be_bytes());
        t.extend([0u8; 16]); // memory usage hints
        t
    }

    fn name_table(&self) -> Vec<u8> {
        let utf16: Vec<u8> = self
            .postscript_name
            .encode_utf16()
            .flat_map(|unit| unit.to_be_bytes())
            .collect();

        let mut t = Vec::new();
        t.extend(0u16.to_be_bytes()); // format
        t.extend(1u16.to_be_bytes()); // count
        t.extend(18u16.to_be_bytes()); // stringOffset
        t.extend(3u16.to_be_bytes()); // platform
        t.extend(1u16.to_be_bytes()); // encoding
        t.extend(0x0409u16.to_be_bytes()); // language
        t.extend(6u16.to_be_bytes()); // nameID: PostScript name
        t.extend((utf16.len() as u16).to_be_bytes());
        t.extend(0u16.to_be_bytes());
        t.extend(utf16);
        t
    }
}

fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

/// Build a binary Type1 container holding the two given segment payloads.
pub fn pfb_bytes(ascii: &[u8], binary: &[u8]) -> Vec<u8> {
    let mut data = Vec::new();
    for (segment_type, payload) in [(1u8, ascii), (2u8, binary)] {
        data.push(0x80);
        data.push(segment_type);
        data.extend((payload.len() as u32).to_le_bytes());
        data.extend(payload);
    }
    // EOF marker
    data.extend([0x80, 0x03]);
    data
}

/// Metrics text for a small Type1 font named `font_name`.
pub fn sample_afm(font_name: &str) -> String {
    format!(
        "StartFontMetrics 4.1\n\
         Comment synthetic metrics\n\
         FontName {font_name}\n\
         FullName Test Serif Bold\n\
         Weight Bold\n\
         ItalicAngle -12.5\n\
         IsFixedPitch false\n\
         FontBBox -168 -218 1000 898\n\
         UnderlinePosition -100\n\
         UnderlineThickness 50\n\
         CapHeight 662\n\
         Ascender 683\n\
         Descender -217\n\
         StdVW 85\n\
         StartCharMetrics 5\n\
         C -1 ; WX 333 ; N .notdef ; B 0 0 0 0 ;\n\
         C 32 ; WX 250 ; N space ; B 0 0 0 0 ;\n\
         C 65 ; WX 722 ; N A ; B 15 0 706 674 ;\n\
         C 66 ; WX 667 ; N B ; B 17 0 593 662 ;\n\
         C -1 ; WX 612 ; N Delta ; B 6 0 608 688 ;\n\
         EndCharMetrics\n\
         EndFontMetrics\n"
    )
}
