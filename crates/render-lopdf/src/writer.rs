//! A PDF writer that streams page content to its sink as soon as a page is
//! finished, keeping only small document-level objects in memory.

use lopdf::{Dictionary, Object, ObjectId, StringFormat, dictionary};
use std::collections::BTreeMap;
use std::io::{self, Seek, Write};

pub struct StreamingPdfWriter<W: Write + Seek> {
    writer: W,
    offsets: BTreeMap<u32, u64>,
    max_id: u32,
    pub catalog_id: ObjectId,
    pub pages_id: ObjectId,
    pub resources_id: ObjectId,
    page_ids: Vec<ObjectId>,
    buffered_objects: BTreeMap<ObjectId, Object>,
}

impl<W: Write + Seek> StreamingPdfWriter<W> {
    pub fn new(mut writer: W, version: &str) -> io::Result<Self> {
        writer.write_all(format!("%PDF-{}\n%âãÏÓ\n", version).as_bytes())?;
        Ok(Self {
            writer,
            offsets: BTreeMap::new(),
            max_id: 3,
            resources_id: (1, 0),
            pages_id: (2, 0),
            catalog_id: (3, 0),
            page_ids: Vec::new(),
            buffered_objects: BTreeMap::new(),
        })
    }

    pub fn new_object_id(&mut self) -> ObjectId {
        self.max_id += 1;
        (self.max_id, 0)
    }

    /// Reserves `count` consecutive ids, used for pages that are referenced
    /// before they are written.
    pub fn reserve_ids(&mut self, count: usize) -> Vec<ObjectId> {
        (0..count).map(|_| self.new_object_id()).collect()
    }

    /// Keeps `object` until [`finish`](Self::finish).
    pub fn buffer_object(&mut self, object: Object) -> ObjectId {
        let id = self.new_object_id();
        self.buffered_objects.insert(id, object);
        id
    }

    pub fn buffer_object_at_id(&mut self, id: ObjectId, object: Object) {
        if id.0 > self.max_id {
            self.max_id = id.0;
        }
        self.buffered_objects.insert(id, object);
    }

    /// Writes `object` to the output right away.
    pub fn write_object(&mut self, object: &Object) -> io::Result<ObjectId> {
        let id = self.new_object_id();
        self.write_object_at_id(id, object)?;
        Ok(id)
    }

    pub fn write_object_at_id(&mut self, id: ObjectId, object: &Object) -> io::Result<()> {
        if id.0 > self.max_id {
            self.max_id = id.0;
        }
        let offset = self.writer.stream_position()?;
        self.offsets.insert(id.0, offset);
        internal_writer::write_indirect_object(&mut self.writer, id, object)
    }

    /// Writes a finished page and appends it to the page tree.
    pub fn add_page(&mut self, id: ObjectId, mut page: Dictionary) -> io::Result<()> {
        page.set("Type", "Page");
        page.set("Parent", self.pages_id);
        self.write_object_at_id(id, &Object::Dictionary(page))?;
        self.page_ids.push(id);
        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Writes the shared resources, page tree, catalog and trailer.
    ///
    /// `catalog_extras` entries are merged into the catalog; `info` becomes
    /// the trailer's document information dictionary.
    pub fn finish(
        mut self,
        resources: Dictionary,
        catalog_extras: Dictionary,
        info: Option<Dictionary>,
    ) -> io::Result<W> {
        self.buffer_object_at_id(self.resources_id, resources.into());

        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => self.page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<Object>>(),
            "Count" => self.page_ids.len() as i64,
        };
        self.buffer_object_at_id(self.pages_id, pages_dict.into());

        let mut catalog_dict = dictionary! { "Type" => "Catalog", "Pages" => self.pages_id };
        for (key, value) in catalog_extras.into_iter() {
            catalog_dict.set(key, value);
        }
        self.buffer_object_at_id(self.catalog_id, catalog_dict.into());

        let info_id = info.map(|dict| self.buffer_object(dict.into()));

        let buffered = std::mem::take(&mut self.buffered_objects);
        for (id, object) in &buffered {
            self.write_object_at_id(*id, object)?;
        }

        let xref_start = self.writer.stream_position()?;
        let size = self.max_id + 1;
        internal_writer::write_xref(&mut self.writer, &self.offsets, size)?;

        let mut trailer = dictionary! { "Size" => size as i64, "Root" => self.catalog_id };
        if let Some(info_id) = info_id {
            trailer.set("Info", info_id);
        }
        writeln!(self.writer, "trailer")?;
        internal_writer::write_dictionary(&mut self.writer, &trailer)?;
        writeln!(self.writer, "\nstartxref")?;
        writeln!(self.writer, "{}", xref_start)?;
        write!(self.writer, "%%EOF")?;

        self.writer.flush()?;
        Ok(self.writer)
    }
}

mod internal_writer {
    use super::*;

    pub fn write_indirect_object<W: Write>(
        writer: &mut W,
        id: ObjectId,
        object: &Object,
    ) -> io::Result<()> {
        writeln!(writer, "{} {} obj", id.0, id.1)?;
        write_object(writer, object)?;
        writeln!(writer, "\nendobj")?;
        Ok(())
    }

    fn format_real(r: f32) -> String {
        if !r.is_finite() {
            return "0".to_string();
        }
        // five decimals keep text matrix shear terms such as 0.21256 intact
        let fixed = format!("{:.5}", r);
        let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
        if trimmed.is_empty() || trimmed == "-0" {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    }

    fn write_name(writer: &mut dyn Write, name: &[u8]) -> io::Result<()> {
        writer.write_all(b"/")?;
        for &byte in name {
            let delimiter = b"()<>[]{}/%#".contains(&byte);
            if delimiter || !(b'!'..=b'~').contains(&byte) {
                write!(writer, "#{:02X}", byte)?;
            } else {
                writer.write_all(&[byte])?;
            }
        }
        Ok(())
    }

    pub fn write_object(writer: &mut dyn Write, object: &Object) -> io::Result<()> {
        match object {
            Object::Null => writer.write_all(b"null"),
            Object::Boolean(b) => writer.write_all(if *b { b"true" } else { b"false" }),
            Object::Integer(i) => write!(writer, "{}", i),
            Object::Real(r) => writer.write_all(format_real(*r as f32).as_bytes()),
            Object::Name(n) => write_name(writer, n),
            Object::String(s, format) => match format {
                StringFormat::Literal => {
                    writer.write_all(b"(")?;
                    for &byte in s {
                        match byte {
                            b'(' | b')' | b'\\' => writer.write_all(&[b'\\', byte])?,
                            b'\r' => writer.write_all(b"\\r")?,
                            b'\n' => writer.write_all(b"\\n")?,
                            _ => writer.write_all(&[byte])?,
                        }
                    }
                    writer.write_all(b")")
                }
                StringFormat::Hexadecimal => {
                    writer.write_all(b"<")?;
                    for byte in s {
                        write!(writer, "{:02X}", byte)?;
                    }
                    writer.write_all(b">")
                }
            },
            Object::Array(arr) => {
                writer.write_all(b"[")?;
                for (i, obj) in arr.iter().enumerate() {
                    if i > 0 {
                        writer.write_all(b" ")?;
                    }
                    write_object(writer, obj)?;
                }
                writer.write_all(b"]")
            }
            Object::Dictionary(dict) => write_dictionary(writer, dict),
            Object::Stream(stream) => {
                let mut dict = stream.dict.clone();
                dict.set("Length", stream.content.len() as i64);
                write_dictionary(writer, &dict)?;
                writer.write_all(b"\nstream\n")?;
                writer.write_all(&stream.content)?;
                writer.write_all(b"\nendstream")
            }
            Object::Reference(id) => write!(writer, "{} {} R", id.0, id.1),
        }
    }

    pub fn write_dictionary(writer: &mut dyn Write, dict: &Dictionary) -> io::Result<()> {
        writer.write_all(b"<<")?;
        let sorted_keys: BTreeMap<_, _> = dict.iter().collect();
        for (key, value) in sorted_keys {
            write_name(writer, key)?;
            writer.write_all(b" ")?;
            write_object(writer, value)?;
            writer.write_all(b" ")?;
        }
        writer.write_all(b">>")
    }

    /// One section covering every id; ids that were never written are free.
    pub fn write_xref<W: Write>(
        writer: &mut W,
        offsets: &BTreeMap<u32, u64>,
        size: u32,
    ) -> io::Result<()> {
        writeln!(writer, "xref")?;
        writeln!(writer, "0 {}", size)?;
        writeln!(writer, "0000000000 65535 f ")?;
        for id in 1..size {
            match offsets.get(&id) {
                Some(offset) => writeln!(writer, "{:010} {:05} n ", offset, 0)?,
                None => writeln!(writer, "0000000000 00001 f ")?,
            }
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn reals_are_trimmed() {
            assert_eq!(format_real(12.5), "12.5");
            assert_eq!(format_real(3.0), "3");
            assert_eq!(format_real(-0.000001), "0");
            assert_eq!(format_real(0.21256), "0.21256");
            assert_eq!(format_real(0.333333), "0.33333");
        }

        #[test]
        fn names_escape_delimiters() {
            let mut out = Vec::new();
            write_name(&mut out, b"A B(1)").unwrap();
            assert_eq!(out, b"/A#20B#281#29".to_vec());
        }
    }
}
