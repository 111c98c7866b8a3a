//! Object-graph writer used by the font emitter.
//!
//! The emitter only needs three primitives from the document writer: a
//! monotonically increasing object number, a way to write a numbered object,
//! and raw stream payload emission. [`ObjectWriter`] captures that seam and
//! [`PdfObjectWriter`] implements it over any [`Write`] sink.

use crate::error::Result;
use crate::objects::{Dictionary, Object, ObjectId};
use std::collections::BTreeMap;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Sink for numbered PDF objects.
pub trait ObjectWriter {
    /// Reserve the next object number. Numbers are never reused.
    fn allocate_object_id(&mut self) -> ObjectId;

    /// Write `object` under a previously allocated `id`.
    fn write_object(&mut self, id: ObjectId, object: &Object) -> Result<()>;
}

pub struct PdfObjectWriter<W: Write> {
    writer: W,
    xref_positions: BTreeMap<ObjectId, u64>,
    current_position: u64,
    next_object_number: u32,
}

impl<W: Write> PdfObjectWriter<W> {
    pub fn new_with_writer(writer: W) -> Self {
        Self {
            writer,
            xref_positions: BTreeMap::new(),
            current_position: 0,
            next_object_number: 1,
        }
    }

    /// Continue numbering after objects already written by the caller.
    pub fn starting_at(mut self, next_object_number: u32) -> Self {
        self.next_object_number = next_object_number.max(1);
        self
    }

    /// Number that the next call to `allocate_object_id` will return.
    pub fn next_object_number(&self) -> u32 {
        self.next_object_number
    }

    pub fn current_position(&self) -> u64 {
        self.current_position
    }

    pub fn write_header(&mut self) -> Result<()> {
        self.write_bytes(b"%PDF-1.7\n")?;
        // Binary comment to ensure file is treated as binary
        self.write_bytes(&[b'%', 0xE2, 0xE3, 0xCF, 0xD3, b'\n'])?;
        Ok(())
    }

    /// Emit `stream ... endstream` around an already encoded payload.
    pub fn write_raw_stream(&mut self, data: &[u8]) -> Result<()> {
        self.write_bytes(b"\nstream\n")?;
        self.write_bytes(data)?;
        self.write_bytes(b"\nendstream")
    }

    /// Write the cross-reference table and trailer, then flush.
    pub fn finish(mut self, root: Option<ObjectId>) -> Result<W> {
        let xref_position = self.current_position;
        self.write_xref()?;
        self.write_trailer(root, xref_position)?;
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write_object_value(&mut self, object: &Object) -> Result<()> {
        match object {
            Object::Integer(i) => self.write_bytes(i.to_string().as_bytes())?,
            Object::Name(n) => {
                self.write_bytes(b"/")?;
                self.write_bytes(n.as_bytes())?;
            }
            Object::Array(arr) => {
                self.write_bytes(b"[")?;
                for (i, obj) in arr.iter().enumerate() {
                    if i > 0 {
                        self.write_bytes(b" ")?;
                    }
                    self.write_object_value(obj)?;
                }
                self.write_bytes(b"]")?;
            }
            Object::Dictionary(dict) => self.write_dictionary(dict)?,
            Object::Stream(dict, data) => {
                self.write_dictionary(dict)?;
                self.write_raw_stream(data)?;
            }
            Object::Reference(id) => {
                let ref_str = format!("{} {} R", id.number(), id.generation());
                self.write_bytes(ref_str.as_bytes())?;
            }
        }
        Ok(())
    }

    fn write_dictionary(&mut self, dict: &Dictionary) -> Result<()> {
        self.write_bytes(b"<<")?;
        for (key, value) in dict.entries() {
            self.write_bytes(b"\n/")?;
            self.write_bytes(key.as_bytes())?;
            self.write_bytes(b" ")?;
            self.write_object_value(value)?;
        }
        self.write_bytes(b"\n>>")
    }

    fn write_xref(&mut self) -> Result<()> {
        let max_obj_num = self
            .xref_positions
            .keys()
            .map(|id| id.number())
            .max()
            .unwrap_or(0);

        self.write_bytes(b"xref\n")?;
        self.write_bytes(format!("0 {}\n", max_obj_num + 1).as_bytes())?;
        self.write_bytes(b"0000000000 65535 f \n")?;

        for obj_num in 1..=max_obj_num {
            let position = self
                .xref_positions
                .iter()
                .find(|(id, _)| id.number() == obj_num)
                .map(|(_, position)| *position);
            match position {
                Some(position) => {
                    let entry = format!("{:010} {:05} n \n", position, 0);
                    self.write_bytes(entry.as_bytes())?;
                }
                // Free entry for gap
                None => self.write_bytes(b"0000000000 00000 f \n")?,
            }
        }

        Ok(())
    }

    fn write_trailer(&mut self, root: Option<ObjectId>, xref_position: u64) -> Result<()> {
        let max_obj_num = self
            .xref_positions
            .keys()
            .map(|id| id.number())
            .max()
            .unwrap_or(0);

        let mut trailer = Dictionary::new();
        trailer.set("Size", Object::Integer((max_obj_num + 1) as i64));
        if let Some(root) = root {
            trailer.set("Root", Object::Reference(root));
        }

        self.write_bytes(b"trailer\n")?;
        self.write_dictionary(&trailer)?;
        self.write_bytes(b"\nstartxref\n")?;
        self.write_bytes(xref_position.to_string().as_bytes())?;
        self.write_bytes(b"\n%%EOF\n")?;

        Ok(())
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.current_position += data.len() as u64;
        Ok(())
    }
}

impl<W: Write> ObjectWriter for PdfObjectWriter<W> {
    fn allocate_object_id(&mut self) -> ObjectId {
        let id = ObjectId::new(self.next_object_number, 0);
        self.next_object_number += 1;
        id
    }

    fn write_object(&mut self, id: ObjectId, object: &Object) -> Result<()> {
        self.xref_positions.insert(id, self.current_position);

        let header = format!("{} {} obj\n", id.number(), id.generation());
        self.write_bytes(header.as_bytes())?;

        self.write_object_value(object)?;

        self.write_bytes(b"\nendobj\n")?;
        Ok(())
    }
}

impl PdfObjectWriter<BufWriter<std::fs::File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new_with_writer(BufWriter::new(file)))
    }
}
