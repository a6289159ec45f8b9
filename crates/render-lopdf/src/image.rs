//! Image and embedded-page XObjects.
//!
//! Raster images become image XObjects; a page of another PDF becomes a
//! form XObject whose resources are deep-copied from the source document.
//! Both are written as soon as they are first placed and shared through
//! the document resource dictionary afterwards.

use crate::writer::StreamingPdfWriter;
use folio_render_core::RenderError;
use folio_traits::ResourceProvider;
use folio_types::{ImageData, ResourceUri};
use image::{ColorType, ExtendedColorType, ImageDecoder, ImageFormat, ImageReader};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Seek, Write};

/// A placed form XObject and the page box it was cut from.
#[derive(Debug, Clone, PartialEq)]
pub struct FormXObject {
    pub name: String,
    pub bbox: [f32; 4],
}

struct ImportedDocument {
    source: Document,
    id_map: HashMap<ObjectId, ObjectId>,
    forms: HashMap<u32, FormXObject>,
}

#[derive(Default)]
pub struct XObjectRegistry {
    entries: BTreeMap<String, ObjectId>,
    rasters: HashMap<String, String>,
    documents: HashMap<String, ImportedDocument>,
}

impl std::fmt::Debug for XObjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XObjectRegistry")
            .field("entries", &self.entries)
            .field("documents", &self.documents.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl XObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn next_name(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.entries.len() + 1)
    }

    /// Resource name of the image XObject for a raster image, writing it on
    /// first use. Images with a source URI are written once per URI.
    pub fn raster<W: Write + Seek>(
        &mut self,
        writer: &mut StreamingPdfWriter<W>,
        source: Option<&ResourceUri>,
        pixel_width: u32,
        pixel_height: u32,
        data: &ImageData,
    ) -> Result<String, RenderError> {
        if let Some(name) = source.and_then(|uri| self.rasters.get(uri.as_str())) {
            return Ok(name.clone());
        }

        let (color_space, filter, bytes, pixel_width, pixel_height) = match data {
            ImageData::Jpeg(bytes) => {
                let (color_space, width, height) = inspect_jpeg(bytes)?;
                if (width, height) != (pixel_width, pixel_height) {
                    log::debug!(
                        "JPEG frame is {}x{}, layout declared {}x{}",
                        width,
                        height,
                        pixel_width,
                        pixel_height
                    );
                }
                (color_space, Some("DCTDecode"), bytes, width, height)
            }
            ImageData::Rgb8(bytes) => {
                check_length(bytes, pixel_width, pixel_height, 3)?;
                ("DeviceRGB", None, bytes, pixel_width, pixel_height)
            }
            ImageData::Gray8(bytes) => {
                check_length(bytes, pixel_width, pixel_height, 1)?;
                ("DeviceGray", None, bytes, pixel_width, pixel_height)
            }
        };
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => pixel_width as i64,
            "Height" => pixel_height as i64,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
        };
        if let Some(filter) = filter {
            dict.set("Filter", filter);
        }
        let id = writer.write_object(&Object::Stream(Stream::new(dict, bytes.clone())))?;

        let name = self.next_name("Im");
        self.entries.insert(name.clone(), id);
        if let Some(uri) = source {
            self.rasters.insert(uri.as_str().to_string(), name.clone());
        }
        Ok(name)
    }

    /// Form XObject showing page `page` (1-based) of the PDF at `uri`.
    ///
    /// The source document is loaded once per path; every failure to load it
    /// or find the page is an error.
    pub fn pdf_page<W: Write + Seek>(
        &mut self,
        writer: &mut StreamingPdfWriter<W>,
        resources: &dyn ResourceProvider,
        uri: &ResourceUri,
        page: u32,
    ) -> Result<FormXObject, RenderError> {
        let path = uri.path().to_string();
        let embedded_error = |message: String| RenderError::EmbeddedDocument {
            uri: uri.to_string(),
            message,
        };

        if !self.documents.contains_key(&path) {
            let bytes = resources.load(&path)?;
            let source = Document::load_mem(&bytes).map_err(|e| embedded_error(e.to_string()))?;
            log::debug!("Loaded embedded document {} ({} pages)", path, source.get_pages().len());
            self.documents.insert(
                path.clone(),
                ImportedDocument {
                    source,
                    id_map: HashMap::new(),
                    forms: HashMap::new(),
                },
            );
        }
        let next_name = self.next_name("Fm");
        let Some(doc) = self.documents.get_mut(&path) else {
            return Err(embedded_error("document cache miss".to_string()));
        };
        if let Some(form) = doc.forms.get(&page) {
            return Ok(form.clone());
        }

        let page_id = *doc
            .source
            .get_pages()
            .get(&page)
            .ok_or_else(|| embedded_error(format!("page {} not found", page)))?;
        let bbox = inherited(&doc.source, page_id, b"MediaBox")
            .and_then(|o| rect_of(&doc.source, &o))
            .unwrap_or([0.0, 0.0, 612.0, 792.0]);
        let content = doc
            .source
            .get_page_content(page_id)
            .map_err(|e| embedded_error(e.to_string()))?;
        let page_resources = match inherited(&doc.source, page_id, b"Resources") {
            Some(obj) => doc.import(writer, &obj).map_err(|e| embedded_error(e.to_string()))?,
            None => Object::Dictionary(Dictionary::new()),
        };

        let form_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => bbox.iter().map(|v| Object::Real(*v)).collect::<Vec<_>>(),
            "Resources" => page_resources,
        };
        let id = writer.write_object(&Object::Stream(Stream::new(form_dict, content)))?;
        let form = FormXObject {
            name: next_name,
            bbox,
        };
        doc.forms.insert(page, form.clone());
        self.entries.insert(form.name.clone(), id);
        Ok(form)
    }

    pub fn to_resource_dictionary(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        for (name, id) in &self.entries {
            dict.set(name.as_bytes().to_vec(), *id);
        }
        dict
    }
}

impl ImportedDocument {
    /// Copies `object` into the output, following references. Every source
    /// object is written at most once.
    fn import<W: Write + Seek>(
        &mut self,
        writer: &mut StreamingPdfWriter<W>,
        object: &Object,
    ) -> Result<Object, RenderError> {
        Ok(match object {
            Object::Reference(id) => Object::Reference(self.import_reference(writer, *id)?),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.import(writer, item))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Object::Dictionary(dict) => Object::Dictionary(self.import_dictionary(writer, dict)?),
            Object::Stream(stream) => {
                let dict = self.import_dictionary(writer, &stream.dict)?;
                Object::Stream(Stream::new(dict, stream.content.clone()))
            }
            other => other.clone(),
        })
    }

    fn import_dictionary<W: Write + Seek>(
        &mut self,
        writer: &mut StreamingPdfWriter<W>,
        dict: &Dictionary,
    ) -> Result<Dictionary, RenderError> {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            copy.set(key.clone(), self.import(writer, value)?);
        }
        Ok(copy)
    }

    fn import_reference<W: Write + Seek>(
        &mut self,
        writer: &mut StreamingPdfWriter<W>,
        id: ObjectId,
    ) -> Result<ObjectId, RenderError> {
        if let Some(mapped) = self.id_map.get(&id) {
            return Ok(*mapped);
        }
        let mapped = writer.new_object_id();
        self.id_map.insert(id, mapped);
        let source = self.source.get_object(id)?.clone();
        let copy = self.import(writer, &source)?;
        writer.write_object_at_id(mapped, &copy)?;
        Ok(mapped)
    }
}

/// Looks `key` up on the page and then its ancestors in the page tree.
fn inherited(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..32 {
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
        let parent = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn rect_of(doc: &Document, object: &Object) -> Option<[f32; 4]> {
    let resolved = match object {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let items = resolved.as_array().ok()?;
    if items.len() != 4 {
        return None;
    }
    let mut out = [0.0; 4];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = match item {
            Object::Integer(i) => *i as f32,
            Object::Real(r) => *r,
            _ => return None,
        };
    }
    Some(out)
}

fn check_length(bytes: &[u8], width: u32, height: u32, components: usize) -> Result<(), RenderError> {
    let expected = width as usize * height as usize * components;
    if bytes.len() != expected {
        return Err(RenderError::InvalidImage(format!(
            "expected {} bytes for {}x{} image, got {}",
            expected,
            width,
            height,
            bytes.len()
        )));
    }
    Ok(())
}

/// Color space and pixel size of a JPEG, read from its frame header.
///
/// CMYK sources decode to RGB, so the original color type decides.
fn inspect_jpeg(bytes: &[u8]) -> Result<(&'static str, u32, u32), RenderError> {
    let invalid = |e: image::ImageError| RenderError::InvalidImage(format!("unreadable JPEG data: {}", e));
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| RenderError::InvalidImage(e.to_string()))?;
    if reader.format() != Some(ImageFormat::Jpeg) {
        return Err(RenderError::InvalidImage("data is not a JPEG".into()));
    }
    let decoder = reader.into_decoder().map_err(invalid)?;
    let (width, height) = decoder.dimensions();
    let color_space = match decoder.original_color_type() {
        ExtendedColorType::Cmyk8 => "DeviceCMYK",
        _ => match decoder.color_type() {
            ColorType::L8 | ColorType::L16 | ColorType::La8 | ColorType::La16 => "DeviceGray",
            _ => "DeviceRGB",
        },
    };
    Ok((color_space, width, height))
}
