//! Builders for small laid-out documents.
//!
//! Pages are 600x800pt (12000x16000 device units at 20 units per point)
//! without margins unless a test asks for them; page `n` covers document Y
//! `[n * 16000, (n + 1) * 16000)`.
#![allow(dead_code)]

use folio_types::{
    BoxId, BoxKind, ElementId, ElementTree, FontDescription, FsImage, ImageData, ImageKind, Insets, LaidOutDocument,
    LayoutBox, PageBox, Rect, TextRun,
};

pub const PAGE_WIDTH: f32 = 12000.0;
pub const PAGE_HEIGHT: f32 = 16000.0;
pub const LINE_HEIGHT: f32 = 400.0;
pub const FONT_SIZE: f32 = 240.0;
pub const BASELINE: f32 = 300.0;

pub struct DocumentBuilder {
    doc: LaidOutDocument,
    pub html: ElementId,
    pub head: ElementId,
    pub body: ElementId,
    pub body_box: BoxId,
}

impl DocumentBuilder {
    pub fn new(page_count: usize) -> Self {
        Self::with_margins(page_count, Insets::default())
    }

    pub fn with_margins(page_count: usize, margins: Insets) -> Self {
        let mut elements = ElementTree::new();
        let html = elements.append(None, "html");
        let head = elements.append(Some(html), "head");
        let body = elements.append(Some(html), "body");

        let content_height = PAGE_HEIGHT - margins.top - margins.bottom;
        let pages = (0..page_count)
            .map(|n| PageBox::new(n, PAGE_WIDTH, PAGE_HEIGHT, n as f32 * content_height, margins))
            .collect();

        let mut doc = LaidOutDocument {
            elements,
            pages,
            ..Default::default()
        };
        let body_box = doc.boxes.push(
            None,
            LayoutBox::new(
                BoxKind::Block,
                Some(body),
                Rect::new(0.0, 0.0, PAGE_WIDTH, content_height * page_count as f32),
            ),
        );
        Self {
            doc,
            html,
            head,
            body,
            body_box,
        }
    }

    pub fn elements(&mut self) -> &mut ElementTree {
        &mut self.doc.elements
    }

    pub fn base_url(mut self, url: &str) -> Self {
        self.doc.base_url = Some(url.to_string());
        self
    }

    pub fn title(&mut self, text: &str) -> &mut Self {
        let title = self.doc.elements.append(Some(self.head), "title");
        self.doc.elements.set_text(title, text);
        self
    }

    pub fn meta(&mut self, name: &str, content: &str) -> &mut Self {
        let meta = self.doc.elements.append(Some(self.head), "meta");
        self.doc.elements.set_attribute(meta, "name", name);
        self.doc.elements.set_attribute(meta, "content", content);
        self
    }

    pub fn element(&mut self, parent: ElementId, name: &str) -> ElementId {
        self.doc.elements.append(Some(parent), name)
    }

    pub fn attribute(&mut self, element: ElementId, name: &str, value: &str) {
        self.doc.elements.set_attribute(element, name, value);
    }

    pub fn block(&mut self, parent: BoxId, element: Option<ElementId>, bounds: Rect) -> BoxId {
        self.doc.boxes.push(Some(parent), LayoutBox::new(BoxKind::Block, element, bounds))
    }

    pub fn inline(&mut self, parent: BoxId, element: Option<ElementId>, bounds: Rect) -> BoxId {
        let b = LayoutBox::new(BoxKind::Inline, element, bounds).with_baseline(BASELINE);
        self.doc.boxes.push(Some(parent), b)
    }

    /// A text fragment whose line box starts at document `(x, y)`.
    pub fn text(&mut self, parent: BoxId, text: &str, x: f32, y: f32) -> BoxId {
        let width = text.chars().count() as f32 * FONT_SIZE / 2.0;
        let run = TextRun::new(text, FontDescription::new("Helvetica"), FONT_SIZE);
        let b = LayoutBox::new(BoxKind::Text(run), None, Rect::new(x, y, width, LINE_HEIGHT)).with_baseline(BASELINE);
        self.doc.boxes.push(Some(parent), b)
    }

    /// A block element under `parent` holding one text line per entry of
    /// `lines`, starting at document `y`.
    pub fn text_block(
        &mut self,
        parent: (ElementId, BoxId),
        name: &str,
        y: f32,
        lines: &[&str],
    ) -> (ElementId, BoxId) {
        let element = self.element(parent.0, name);
        let height = LINE_HEIGHT * lines.len() as f32;
        let block = self.block(parent.1, Some(element), Rect::new(0.0, y, PAGE_WIDTH, height));
        for (i, line) in lines.iter().enumerate() {
            self.text(block, line, 0.0, y + i as f32 * LINE_HEIGHT);
        }
        (element, block)
    }

    pub fn replaced(&mut self, parent: BoxId, element: Option<ElementId>, image: FsImage, x: f32, y: f32) -> BoxId {
        let bounds = Rect::new(x, y, image.width, image.height);
        self.doc
            .boxes
            .push(Some(parent), LayoutBox::new(BoxKind::Replaced(image), element, bounds))
    }

    pub fn layout_box(&mut self, id: BoxId) -> &mut LayoutBox {
        self.doc.boxes.get_mut(id).expect("box exists")
    }

    pub fn root(&self) -> (ElementId, BoxId) {
        (self.body, self.body_box)
    }

    pub fn build(self) -> LaidOutDocument {
        self.doc
    }
}

/// A 2x2 RGB raster, drawn `size` device units square.
pub fn raster_image(size: f32) -> FsImage {
    FsImage {
        width: size,
        height: size,
        source: None,
        kind: ImageKind::Raster {
            pixel_width: 2,
            pixel_height: 2,
            data: ImageData::Rgb8(vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255]),
        },
    }
}

/// `<p>Hello <a href="#x">there</a></p>` followed, on the second page, by
/// an `h2` with id `x`.
pub fn paragraph_with_anchor() -> LaidOutDocument {
    let mut b = DocumentBuilder::new(2);
    let (body, body_box) = b.root();
    let p = b.element(body, "p");
    let a = b.element(p, "a");
    b.attribute(a, "href", "#x");
    let p_box = b.block(body_box, Some(p), Rect::new(0.0, 0.0, PAGE_WIDTH, LINE_HEIGHT));
    b.text(p_box, "Hello ", 0.0, 0.0);
    let a_box = b.inline(p_box, Some(a), Rect::new(1440.0, 0.0, 1200.0, LINE_HEIGHT));
    b.text(a_box, "there", 1440.0, 0.0);

    let h2 = b.element(body, "h2");
    b.attribute(h2, "id", "x");
    let h2_box = b.block(body_box, Some(h2), Rect::new(0.0, 20000.0, PAGE_WIDTH, LINE_HEIGHT));
    b.layout_box(h2_box).margin_top = 200.0;
    b.text(h2_box, "Target", 0.0, 20000.0);
    b.build()
}

/// `<ul><li>A</li><li>B</li></ul>` with a page break between the items.
pub fn list_across_pages() -> LaidOutDocument {
    let mut b = DocumentBuilder::new(2);
    let (body, body_box) = b.root();
    let ul = b.element(body, "ul");
    let ul_box = b.block(body_box, Some(ul), Rect::new(0.0, 15600.0, PAGE_WIDTH, 800.0));
    b.text_block((ul, ul_box), "li", 15600.0, &["A"]);
    b.text_block((ul, ul_box), "li", 16000.0, &["B"]);
    b.build()
}
