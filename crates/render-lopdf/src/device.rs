//! The lopdf-backed output device.
//!
//! One device writes one PDF file. Pages are painted strictly in order
//! through [`LopdfOutputDevice::paint_page`], which opens a [`PageSession`],
//! hands the device to the caller and always closes the page afterwards,
//! including when painting fails.

use crate::fonts::FontRegistry;
use crate::graphics::GraphicsStateTracker;
use crate::image::XObjectRegistry;
use crate::links::{LinkAction, LinkAnnotator, fit_h_destination, link_target, resolve_uri, xyz_destination};
use crate::outline::{OutlineEntry, build_outlines};
use crate::page::{PageSession, metadata_stream, xmp_packet};
use crate::path::{PaintIntent, PathRenderer};
use crate::structure::StructureTree;
use crate::tagger::{RunPosition, StructureContext, StructureTagger};
use crate::text::{TextPainter, replace_missing_characters};
use crate::transform::CoordinateTransformer;
use crate::writer::StreamingPdfWriter;
use folio_render_core::{OutputDevice, RenderError, Shape, Stroke};
use folio_traits::ResourceProvider;
use folio_types::{
    AffineTransform, BoxId, Color, ElementId, ElementTree, FsImage, ImageKind, LaidOutDocument, PageBox, Rect,
    TextRun,
};
use lopdf::{Dictionary, Object, ObjectId, dictionary, text_string};
use std::borrow::Cow;
use std::io::{Seek, Write};
use std::sync::Arc;

/// Device units per point used by the layout engine by default (20 per
/// CSS pixel at 96 dpi).
pub const DEFAULT_DOTS_PER_POINT: f32 = 20.0 * 4.0 / 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSettings {
    pub dots_per_point: f32,
    pub tagged: bool,
    pub replace_missing_characters: bool,
    pub missing_character_replacement: char,
    /// Shrink filled rectangles by one device unit in each dimension.
    pub round_rect_dimensions_down: bool,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            dots_per_point: DEFAULT_DOTS_PER_POINT,
            tagged: true,
            replace_missing_characters: false,
            missing_character_replacement: '#',
            round_rect_dimensions_down: false,
        }
    }
}

/// Document-level entries written when the file is finished.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub language: Option<String>,
}

pub struct LopdfOutputDevice<W: Write + Seek> {
    writer: StreamingPdfWriter<W>,
    settings: DeviceSettings,
    transformer: CoordinateTransformer,
    graphics: GraphicsStateTracker,
    fonts: FontRegistry,
    xobjects: XObjectRegistry,
    resources: Arc<dyn ResourceProvider>,
    structure: StructureTree,
    session: Option<PageSession>,
    page_ids: Vec<ObjectId>,
    start_page_no: usize,
    default_destination: Option<Vec<Object>>,
    outline: Option<ObjectId>,
}

impl<W: Write + Seek> LopdfOutputDevice<W> {
    pub fn new(
        output: W,
        version: &str,
        settings: DeviceSettings,
        resources: Arc<dyn ResourceProvider>,
    ) -> Result<Self, RenderError> {
        Ok(Self {
            writer: StreamingPdfWriter::new(output, version)?,
            transformer: CoordinateTransformer::new(settings.dots_per_point),
            settings,
            graphics: GraphicsStateTracker::new(),
            fonts: FontRegistry::new(),
            xobjects: XObjectRegistry::new(),
            resources,
            structure: StructureTree::new(),
            session: None,
            page_ids: Vec::new(),
            start_page_no: 0,
            default_destination: None,
            outline: None,
        })
    }

    pub fn settings(&self) -> &DeviceSettings {
        &self.settings
    }

    pub fn dots_per_point(&self) -> f32 {
        self.settings.dots_per_point
    }

    /// Reserves page objects for a document of `page_count` pages appended
    /// after everything painted so far and returns its first global page index.
    pub fn begin_document(&mut self, page_count: usize) -> usize {
        self.start_page_no = self.page_ids.len();
        let ids = self.writer.reserve_ids(page_count);
        self.page_ids.extend(ids);
        self.start_page_no
    }

    pub fn start_page_no(&self) -> usize {
        self.start_page_no
    }

    /// Page object of page `page_no` of the current document.
    pub fn page_reference(&self, page_no: usize) -> Option<ObjectId> {
        self.page_ids.get(self.start_page_no + page_no).copied()
    }

    pub fn page_count(&self) -> usize {
        self.writer.page_count()
    }

    pub fn default_destination(&self) -> Option<&Vec<Object>> {
        self.default_destination.as_ref()
    }

    pub fn structure(&self) -> &StructureTree {
        &self.structure
    }

    /// Tagging state of the open page.
    pub fn structure_context(&self) -> Option<&StructureContext> {
        self.session.as_ref().map(|s| &s.context)
    }

    /// Global index of the page being painted.
    pub fn current_page(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.index)
    }

    pub fn current_transform(&self) -> &AffineTransform {
        self.transformer.current()
    }

    /// Paints page `page` of the current document with `paint`, then closes
    /// the page even if `paint` failed.
    pub fn paint_page<F>(&mut self, page: &PageBox, paint: F) -> Result<(), RenderError>
    where
        F: FnOnce(&mut Self) -> Result<(), RenderError>,
    {
        self.open_page(page)?;
        let painted = paint(self);
        let closed = self.close_page();
        painted.and(closed)
    }

    fn open_page(&mut self, page: &PageBox) -> Result<(), RenderError> {
        if self.session.is_some() {
            return Err(RenderError::DocumentState("a page is already open".into()));
        }
        let index = self.start_page_no + page.page_no;
        let page_id = *self
            .page_ids
            .get(index)
            .ok_or_else(|| RenderError::DocumentState(format!("page {} was not reserved", index + 1)))?;
        let width = self.transformer.to_points(page.width);
        let height = self.transformer.to_points(page.height);

        let mut session = PageSession::new(index, page_id, width, height);
        session.metadata = page.metadata.clone();
        self.transformer.begin_page(height);
        session.sink.save_state();
        self.graphics.begin_page(&mut session.sink, &self.transformer);
        if self.default_destination.is_none() {
            self.default_destination = Some(fit_h_destination(page_id, height));
        }
        log::debug!("Opened page {} ({}x{}pt)", index + 1, width, height);
        self.session = Some(session);
        Ok(())
    }

    fn close_page(&mut self) -> Result<(), RenderError> {
        let session = self
            .session
            .take()
            .ok_or_else(|| RenderError::DocumentState("no page is open".into()))?;
        let page = session.finish_content()?;

        let contents_id = self
            .writer
            .write_object(&Object::Stream(lopdf::Stream::new(Dictionary::new(), page.content.clone())))?;
        let struct_parents = if self.settings.tagged {
            self.structure.page_key(page.index)
        } else {
            None
        };
        let metadata_id = match &page.metadata {
            Some(body) => Some(self.writer.write_object(&metadata_stream(&xmp_packet(body)))?),
            None => None,
        };
        let dict = page.page_dictionary(self.writer.resources_id, contents_id, struct_parents, metadata_id);
        self.writer.add_page(page.page_id, dict)?;
        log::info!("Wrote page {}", page.index + 1);
        Ok(())
    }

    fn session_mut(&mut self) -> Result<&mut PageSession, RenderError> {
        open_session(&mut self.session)
    }

    /// Paints `run` at device `(x, y)`. With tagging on, the run is wrapped in
    /// the structure elements of `block` as decided by the tagger. `links`
    /// runs after the glyphs and before the run's elements close, so link
    /// annotations made there nest under the run's block.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_text_run<F>(
        &mut self,
        elements: &ElementTree,
        run: &TextRun,
        x: f32,
        y: f32,
        block: Option<ElementId>,
        position: RunPosition,
        links: F,
    ) -> Result<(), RenderError>
    where
        F: FnOnce(&mut Self) -> Result<(), RenderError>,
    {
        let run = self.substitute_missing(run)?;
        if !self.settings.tagged {
            self.paint_glyphs(&run, x, y)?;
            return links(self);
        }

        let session = open_session(&mut self.session)?;
        let index = session.index;
        StructureTagger::new(&mut self.structure, &mut session.sink, index).begin_run(
            &mut session.context,
            elements,
            block,
            position,
        );
        if session.context.should_paint_text() {
            log::debug!("Painting text {:?}", run.text);
            self.paint_glyphs(&run, x, y)?;
        }
        let linked = links(self);
        let session = open_session(&mut self.session)?;
        StructureTagger::new(&mut self.structure, &mut session.sink, index).end_run(&mut session.context);
        linked
    }

    fn paint_glyphs(&mut self, run: &TextRun, x: f32, y: f32) -> Result<(), RenderError> {
        let session = open_session(&mut self.session)?;
        TextPainter::paint(
            &mut session.sink,
            &mut self.graphics,
            &self.transformer,
            &mut self.fonts,
            run,
            x,
            y,
        )
    }

    fn substitute_missing<'a>(&self, run: &'a TextRun) -> Result<Cow<'a, TextRun>, RenderError> {
        if !self.settings.replace_missing_characters {
            return Ok(Cow::Borrowed(run));
        }
        Ok(
            match replace_missing_characters(&run.text, &run.font, self.settings.missing_character_replacement)? {
                Cow::Borrowed(_) => Cow::Borrowed(run),
                Cow::Owned(text) => Cow::Owned(TextRun {
                    text,
                    ..run.clone()
                }),
            },
        )
    }

    /// Wraps whatever `paint` draws in an `/Artifact` sequence when tagging.
    pub fn with_artifact<F>(&mut self, paint: F) -> Result<(), RenderError>
    where
        F: FnOnce(&mut Self) -> Result<(), RenderError>,
    {
        if !self.settings.tagged {
            return paint(self);
        }
        self.session_mut()?.sink.begin_artifact();
        let painted = paint(self);
        if let Some(session) = self.session.as_mut() {
            session.sink.end_marked_content();
        }
        painted
    }

    /// Places an image; with tagging on, images with alternate text become
    /// `Figure` elements and the rest artifacts.
    pub fn draw_image_tagged(
        &mut self,
        image: &FsImage,
        x: f32,
        y: f32,
        alt: Option<&str>,
    ) -> Result<(), RenderError> {
        if image.is_degenerate() {
            return Ok(());
        }
        match alt.filter(|a| !a.trim().is_empty()) {
            Some(alt) if self.settings.tagged => {
                let session = open_session(&mut self.session)?;
                let index = session.index;
                StructureTagger::new(&mut self.structure, &mut session.sink, index).begin_figure(&session.context, alt);
                let painted = self.place_image(image, x, y);
                if let Some(session) = self.session.as_mut() {
                    StructureTagger::new(&mut self.structure, &mut session.sink, index).end_figure();
                }
                painted
            }
            _ => self.with_artifact(|device| device.place_image(image, x, y)),
        }
    }

    /// Tiles `image` from `(x, y)` across `area`, horizontally or vertically,
    /// as one artifact.
    pub fn draw_image_band(
        &mut self,
        image: &FsImage,
        x: f32,
        y: f32,
        area: Rect,
        horizontal: bool,
    ) -> Result<(), RenderError> {
        if image.is_degenerate() {
            return Ok(());
        }
        self.with_artifact(|device| {
            if horizontal {
                let mut cx = x;
                while cx < area.right() {
                    device.place_image(image, cx, y)?;
                    cx += image.width;
                }
            } else {
                let mut cy = y;
                while cy < area.bottom() {
                    device.place_image(image, x, cy)?;
                    cy += image.height;
                }
            }
            Ok(())
        })
    }

    fn place_image(&mut self, image: &FsImage, x: f32, y: f32) -> Result<(), RenderError> {
        if image.is_degenerate() {
            return Ok(());
        }
        let matrix = self.transformer.image_matrix(x, y, image.width, image.height);
        match &image.kind {
            ImageKind::Raster {
                pixel_width,
                pixel_height,
                data,
            } => {
                let name = self.xobjects.raster(
                    &mut self.writer,
                    image.source.as_ref(),
                    *pixel_width,
                    *pixel_height,
                    data,
                )?;
                let sink = &mut self.session_mut()?.sink;
                sink.save_state();
                sink.op("cm", matrix.to_array().into_iter().map(Object::Real).collect());
                sink.op("Do", vec![Object::Name(name.into_bytes())]);
                sink.restore_state();
                Ok(())
            }
            ImageKind::PdfPage {
                uri,
                scale_width,
                scale_height,
                ..
            } => {
                let page_number = image.kind.pdf_page_number().unwrap_or(1);
                let form = self
                    .xobjects
                    .pdf_page(&mut self.writer, self.resources.as_ref(), uri, page_number)?;
                let mut m = matrix;
                m.a = *scale_width;
                m.d = *scale_height;

                let session = open_session(&mut self.session)?;
                let sink = &mut session.sink;
                sink.restore_state();
                sink.save_state();
                sink.op("cm", m.to_array().into_iter().map(Object::Real).collect());
                sink.op("Do", vec![Object::Name(form.name.into_bytes())]);
                sink.restore_state();
                sink.save_state();
                self.graphics.invalidate();
                let clip: Vec<Shape> = self.graphics.clip().to_vec();
                for shape in &clip {
                    PathRenderer::follow_path(sink, &mut self.graphics, &self.transformer, shape, PaintIntent::Clip)?;
                }
                Ok(())
            }
        }
    }

    /// Adds a link annotation for `box_id` if its element is a hyperlink
    /// whose target resolves. Unresolvable links are skipped.
    pub fn process_link(&mut self, doc: &LaidOutDocument, box_id: BoxId) -> Result<(), RenderError> {
        let Some(element) = doc.boxes.get(box_id).and_then(|b| b.element) else {
            return Ok(());
        };
        let Some(href) = link_target(&doc.elements, element) else {
            return Ok(());
        };
        let Some(area) = LinkAnnotator::link_area(&doc.boxes, &self.transformer, box_id) else {
            return Ok(());
        };

        let action = if let Some(anchor) = href.strip_prefix('#') {
            let destination = doc
                .elements
                .by_anchor(anchor)
                .and_then(|target| doc.boxes.box_for_element(target))
                .and_then(|target| self.link_destination(doc, target));
            let Some(destination) = destination else {
                log::debug!("Skipping link to unknown anchor #{}", anchor);
                return Ok(());
            };
            match doc.elements.attribute(element, "onclick").filter(|s| !s.trim().is_empty()) {
                Some(script) => LinkAction::JavaScript(script.to_string()),
                None => LinkAction::GoTo(destination),
            }
        } else {
            let uri = resolve_uri(href, doc.base_url.as_deref());
            if !uri.contains("://") {
                log::debug!("Skipping link without scheme: {}", uri);
                return Ok(());
            }
            LinkAction::Uri(uri)
        };
        if !self.session_mut()?.links.claim(&area) {
            return Ok(());
        }

        let title = doc.elements.attribute(element, "title");
        let contents = title.unwrap_or(href);
        let annotation_id = self.writer.new_object_id();
        let session = open_session(&mut self.session)?;
        let mut annotation = LinkAnnotator::annotation(&area, &action, Some(contents));
        annotation.set("P", session.page_id);

        if self.settings.tagged {
            let parent = session.context.current_node().unwrap_or(StructureTree::document());
            let node = self.structure.add_node("Link", parent);
            if let Some(title) = title {
                self.structure.set_title(node, title);
            }
            let key = self.structure.attach_annotation(node, session.index, annotation_id);
            annotation.set("StructParent", key);
        }
        self.writer.write_object_at_id(annotation_id, &Object::Dictionary(annotation))?;
        session.annotations.push(annotation_id);
        Ok(())
    }

    /// `XYZ` destination for the top edge of `target`, including its top margin.
    pub fn link_destination(&self, doc: &LaidOutDocument, target: BoxId) -> Option<Vec<Object>> {
        let b = doc.boxes.get(target)?;
        self.destination_at(doc, b.page_ref_y(), b.bounds.y + b.margin_top)
    }

    /// `XYZ` destination used by bookmarks: the top of the box's border edge.
    pub fn bookmark_destination(&self, doc: &LaidOutDocument, target: BoxId) -> Option<Vec<Object>> {
        let b = doc.boxes.get(target)?;
        self.destination_at(doc, b.page_ref_y(), b.bounds.y)
    }

    fn destination_at(&self, doc: &LaidOutDocument, page_ref_y: f32, y: f32) -> Option<Vec<Object>> {
        let page = doc.page_for_y(page_ref_y)?;
        let page_id = self.page_reference(page.page_no)?;
        let distance = page.margins.top + y - page.top;
        let top = self.transformer.to_points(page.height) - self.transformer.to_points(distance);
        Some(xyz_destination(page_id, top))
    }

    /// Writes the document outline. Call before [`finish`](Self::finish).
    pub fn write_outline(&mut self, entries: &[OutlineEntry]) {
        if let Some(root) = build_outlines(&mut self.writer, entries) {
            self.outline = Some(root);
        }
    }

    /// Writes shared resources, the structure tree, the catalog and the
    /// trailer and returns the output.
    pub fn finish(mut self, info: &DocumentInfo) -> Result<W, RenderError> {
        if self.session.is_some() {
            self.close_page()?;
        }

        let mut resources = Dictionary::new();
        if !self.fonts.is_empty() {
            resources.set("Font", self.fonts.to_resource_dictionary());
        }
        if !self.xobjects.is_empty() {
            resources.set("XObject", self.xobjects.to_resource_dictionary());
        }

        let mut catalog = Dictionary::new();
        if let Some(outline) = self.outline {
            catalog.set("Outlines", outline);
            catalog.set("PageMode", "UseOutlines");
        }
        if let Some(lang) = &info.language {
            catalog.set("Lang", text_string(lang));
        }
        if self.settings.tagged {
            let root = self.structure.write(&mut self.writer, &self.page_ids)?;
            catalog.set("StructTreeRoot", root);
            catalog.set("MarkInfo", dictionary! { "Marked" => true });
            catalog.set("ViewerPreferences", dictionary! { "DisplayDocTitle" => true });
            let xmp = document_xmp(info.title.as_deref());
            let metadata_id = self.writer.write_object(&metadata_stream(&xmp))?;
            catalog.set("Metadata", metadata_id);
        }

        let mut info_dict = dictionary! { "Producer" => text_string("folio") };
        for (key, value) in [
            ("Title", &info.title),
            ("Author", &info.author),
            ("Subject", &info.subject),
            ("Keywords", &info.keywords),
        ] {
            if let Some(value) = value {
                info_dict.set(key, text_string(value));
            }
        }

        Ok(self.writer.finish(resources, catalog, Some(info_dict))?)
    }
}

fn open_session(session: &mut Option<PageSession>) -> Result<&mut PageSession, RenderError> {
    session
        .as_mut()
        .ok_or_else(|| RenderError::DocumentState("no page is open".into()))
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn document_xmp(title: Option<&str>) -> String {
    let title = title
        .map(|t| {
            format!(
                "<dc:title><rdf:Alt><rdf:li xml:lang=\"x-default\">{}</rdf:li></rdf:Alt></dc:title>",
                escape_xml(t)
            )
        })
        .unwrap_or_default();
    xmp_packet(&format!(
        "<x:xmpmeta xmlns:x=\"adobe:ns:meta/\"><rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\">\
<rdf:Description rdf:about=\"\" xmlns:pdfuaid=\"http://www.aiim.org/pdfua/ns/id/\" xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\
<pdfuaid:part>1</pdfuaid:part>{}</rdf:Description></rdf:RDF></x:xmpmeta>",
        title
    ))
}

impl<W: Write + Seek> OutputDevice for LopdfOutputDevice<W> {
    fn set_color(&mut self, color: &Color) -> Result<(), RenderError> {
        self.graphics.set_color(color)
    }

    fn set_stroke(&mut self, stroke: Stroke) {
        self.graphics.set_stroke(stroke, &self.transformer);
    }

    fn stroke(&self) -> &Stroke {
        self.graphics.original_stroke()
    }

    fn draw(&mut self, shape: &Shape) -> Result<(), RenderError> {
        let sink = &mut open_session(&mut self.session)?.sink;
        PathRenderer::follow_path(sink, &mut self.graphics, &self.transformer, shape, PaintIntent::Stroke)
    }

    fn fill(&mut self, shape: &Shape) -> Result<(), RenderError> {
        let sink = &mut open_session(&mut self.session)?.sink;
        PathRenderer::follow_path(sink, &mut self.graphics, &self.transformer, shape, PaintIntent::Fill)
    }

    fn fill_rect(&mut self, rect: Rect) -> Result<(), RenderError> {
        let rect = if self.settings.round_rect_dimensions_down {
            Rect::new(rect.x, rect.y, rect.width - 1.0, rect.height - 1.0)
        } else {
            rect
        };
        self.fill(&Shape::rect(rect))
    }

    fn clip(&mut self, shape: &Shape) -> Result<(), RenderError> {
        let mapped = shape.transformed(self.transformer.current());
        let session = open_session(&mut self.session)?;
        PathRenderer::follow_path(
            &mut session.sink,
            &mut self.graphics,
            &self.transformer,
            &mapped,
            PaintIntent::Clip,
        )?;
        self.graphics.push_clip(mapped);
        Ok(())
    }

    fn set_clip(&mut self, shape: Option<&Shape>) -> Result<(), RenderError> {
        let mapped = shape.map(|s| s.transformed(self.transformer.current()));
        let session = open_session(&mut self.session)?;
        session.sink.restore_state();
        session.sink.save_state();
        self.graphics.invalidate();
        if let Some(mapped) = &mapped {
            PathRenderer::follow_path(
                &mut session.sink,
                &mut self.graphics,
                &self.transformer,
                mapped,
                PaintIntent::Clip,
            )?;
        }
        self.graphics.replace_clip(mapped);
        Ok(())
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.transformer.translate(tx, ty);
    }

    fn draw_text(&mut self, run: &TextRun, x: f32, y: f32) -> Result<(), RenderError> {
        self.draw_text_run(&ElementTree::new(), run, x, y, None, RunPosition::single(), |_| Ok(()))
    }

    fn draw_image(&mut self, image: &FsImage, x: f32, y: f32) -> Result<(), RenderError> {
        self.draw_image_tagged(image, x, y, None)
    }
}
