//! Turns laid-out documents into one PDF file.
//!
//! ```no_run
//! # use folio::{PdfRendererBuilder, PipelineError};
//! # fn run(doc: &folio::LaidOutDocument) -> Result<(), PipelineError> {
//! let file = std::fs::File::create("out.pdf")?;
//! let mut renderer = PdfRendererBuilder::new().build(file)?;
//! renderer.create_pdf(doc)?;
//! renderer.finish()?;
//! # Ok(())
//! # }
//! ```

use crate::bookmarks::{Bookmark, document_outline, flatten};
use crate::config::RenderConfig;
use crate::error::PipelineError;
use crate::metadata::MetadataList;
use crate::paint::DocumentPainter;
use folio_render_lopdf::{DocumentInfo, LopdfOutputDevice, OutlineEntry};
use folio_traits::{InMemoryResourceProvider, ResourceProvider};
use folio_types::{LaidOutDocument, PageBox};
use regex::Regex;
use std::io::{Seek, Write};
use std::sync::Arc;

/// Hooks into the life of a [`PdfRenderer`].
pub trait CreationListener {
    /// Before the first document is written.
    fn pre_open(&mut self) {}

    /// Before the pages of a document are painted; `metadata` feeds the
    /// document information dictionary and may be adjusted here.
    fn pre_write(&mut self, _page_count: usize, _metadata: &mut MetadataList) {}

    /// Before the file is finished.
    fn on_close(&mut self) {}
}

/// Where an element with an `id` ended up, in points from the bottom-left
/// corner of its page.
#[derive(Debug, Clone, PartialEq)]
pub struct PagePosition {
    pub id: String,
    /// 0-based page within the document.
    pub page_no: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

pub struct PdfRendererBuilder {
    config: RenderConfig,
    resources: Arc<dyn ResourceProvider>,
    listener: Option<Box<dyn CreationListener>>,
}

impl Default for PdfRendererBuilder {
    fn default() -> Self {
        Self {
            config: RenderConfig::default(),
            resources: Arc::new(InMemoryResourceProvider::new()),
            listener: None,
        }
    }
}

impl PdfRendererBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    /// Where embedded PDF pages are loaded from.
    pub fn with_resources(mut self, resources: Arc<dyn ResourceProvider>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_listener(mut self, listener: Box<dyn CreationListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn build<W: Write + Seek>(self, output: W) -> Result<PdfRenderer<W>, PipelineError> {
        self.config.validate()?;
        let device = LopdfOutputDevice::new(
            output,
            self.config.pdf_version.as_str(),
            self.config.device_settings(),
            self.resources,
        )?;
        Ok(PdfRenderer {
            device,
            config: self.config,
            listener: self.listener,
            metadata: MetadataList::new(),
            outline: Vec::new(),
            language: None,
            documents: 0,
        })
    }
}

/// Writes one or more laid-out documents into a single PDF.
pub struct PdfRenderer<W: Write + Seek> {
    device: LopdfOutputDevice<W>,
    config: RenderConfig,
    listener: Option<Box<dyn CreationListener>>,
    metadata: MetadataList,
    outline: Vec<OutlineEntry>,
    language: Option<String>,
    documents: usize,
}

impl<W: Write + Seek> PdfRenderer<W> {
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Metadata collected from the documents written so far.
    pub fn metadata(&self) -> &MetadataList {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut MetadataList {
        &mut self.metadata
    }

    pub fn device(&self) -> &LopdfOutputDevice<W> {
        &self.device
    }

    /// Pages written to the file so far.
    pub fn page_count(&self) -> usize {
        self.device.page_count()
    }

    /// Writes the first document of the file.
    pub fn create_pdf(&mut self, doc: &LaidOutDocument) -> Result<(), PipelineError> {
        if self.documents > 0 {
            return Err(PipelineError::State(
                "create_pdf was already called; use write_next_document".into(),
            ));
        }
        if let Some(listener) = self.listener.as_mut() {
            listener.pre_open();
        }
        self.write_document(doc)
    }

    /// Appends another document; its pages follow the pages already written.
    pub fn write_next_document(&mut self, doc: &LaidOutDocument) -> Result<(), PipelineError> {
        if self.documents == 0 {
            return Err(PipelineError::State("call create_pdf before write_next_document".into()));
        }
        self.write_document(doc)
    }

    fn write_document(&mut self, doc: &LaidOutDocument) -> Result<(), PipelineError> {
        if doc.pages.is_empty() {
            return Err(PipelineError::EmptyDocument);
        }
        self.metadata.load(&doc.elements);
        if self.language.is_none() {
            self.language = doc
                .elements
                .root()
                .and_then(|root| doc.elements.attribute(root, "lang"))
                .map(str::to_string);
        }

        let page_count = doc.pages.len();
        if let Some(listener) = self.listener.as_mut() {
            listener.pre_write(page_count, &mut self.metadata);
        }

        let start = self.device.begin_document(page_count);
        log::info!("Writing document {} ({} pages from page {})", self.documents + 1, page_count, start + 1);
        let painter = DocumentPainter::new(doc, &self.config);
        for page in &doc.pages {
            self.device.paint_page(page, |device| painter.paint_page(device, page))?;
        }

        let bookmarks = document_outline(&doc.elements);
        for (level, bookmark) in flatten(&bookmarks) {
            let dest = self.bookmark_destination(doc, bookmark);
            self.outline.push(OutlineEntry {
                level,
                title: bookmark.name.clone(),
                dest,
            });
        }
        self.documents += 1;
        Ok(())
    }

    fn bookmark_destination(&self, doc: &LaidOutDocument, bookmark: &Bookmark) -> Vec<lopdf::Object> {
        bookmark
            .target(&doc.elements)
            .and_then(|element| doc.boxes.box_for_element(element))
            .and_then(|target| self.device.bookmark_destination(doc, target))
            .or_else(|| self.device.default_destination().cloned())
            .unwrap_or_default()
    }

    /// Writes the outline, document metadata and trailer and returns the output.
    pub fn finish(mut self) -> Result<W, PipelineError> {
        if self.documents == 0 {
            return Err(PipelineError::State("no document was written".into()));
        }
        if let Some(listener) = self.listener.as_mut() {
            listener.on_close();
        }
        self.device.write_outline(&self.outline);
        let info = DocumentInfo {
            title: self.metadata.by_name("title").map(str::to_string),
            author: self.metadata.by_name("author").map(str::to_string),
            subject: self.metadata.by_name("subject").map(str::to_string),
            keywords: self.metadata.by_name("keywords").map(str::to_string),
            language: self.config.language.clone().or(self.language),
        };
        Ok(self.device.finish(&info)?)
    }

    /// Page positions of every element whose `id` matches `pattern`.
    pub fn find_page_positions_by_id(
        &self,
        doc: &LaidOutDocument,
        pattern: &str,
    ) -> Result<Vec<PagePosition>, PipelineError> {
        let pattern = Regex::new(pattern)?;
        Ok(find_page_positions_by_id(doc, &pattern, self.config.dots_per_point))
    }
}

/// Positions are taken on the last page the element's box reaches, sorted by
/// page and then id.
pub fn find_page_positions_by_id(doc: &LaidOutDocument, pattern: &Regex, dots_per_point: f32) -> Vec<PagePosition> {
    let mut positions: Vec<PagePosition> = doc
        .elements
        .anchors()
        .filter(|(id, _)| pattern.is_match(id.as_str()))
        .filter_map(|(id, element)| {
            let b = doc.boxes.get(doc.boxes.box_for_element(element)?)?;
            let page = last_page(doc, b.bounds.bottom())?;
            let x = b.bounds.x + page.margins.left;
            let y = page.bottom - b.bounds.bottom() + page.margins.bottom;
            Some(PagePosition {
                id: id.to_string(),
                page_no: page.page_no,
                x: x / dots_per_point,
                y: y / dots_per_point,
                width: b.bounds.width / dots_per_point,
                height: b.bounds.height / dots_per_point,
            })
        })
        .collect();
    positions.sort_by(|a, b| a.page_no.cmp(&b.page_no).then_with(|| a.id.cmp(&b.id)));
    positions
}

fn last_page(doc: &LaidOutDocument, bottom: f32) -> Option<&PageBox> {
    doc.pages
        .iter()
        .rev()
        .find(|p| p.top < bottom)
        .or_else(|| doc.pages.first())
}
