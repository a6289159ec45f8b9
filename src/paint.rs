//! Walks the box tree of one document and paints each page slice.

use crate::config::RenderConfig;
use folio_render_core::{BasicStroke, LineCap, OutputDevice, RenderError, Shape, Stroke};
use folio_render_lopdf::{LopdfOutputDevice, RunPosition};
use folio_types::{
    BackgroundImage, BackgroundRepeat, BorderStyle, BoxId, BoxKind, BoxStyle, Color, ElementId, LaidOutDocument,
    PageBox, Rect, Side, TextRun,
};
use std::collections::HashMap;
use std::io::{Seek, Write};

const DEBUG_METRICS_COLOR: Color = Color::Rgb {
    r: 0xFF,
    g: 0x33,
    b: 0xFF,
};

/// Painting plan for one document: boxes in painting order and, for every
/// text box, its block element and position among the block's runs.
pub(crate) struct DocumentPainter<'a> {
    doc: &'a LaidOutDocument,
    config: &'a RenderConfig,
    order: Vec<BoxId>,
    runs: HashMap<BoxId, (Option<ElementId>, RunPosition)>,
}

impl<'a> DocumentPainter<'a> {
    pub(crate) fn new(doc: &'a LaidOutDocument, config: &'a RenderConfig) -> Self {
        let order = doc.boxes.document_order();
        let mut runs = HashMap::new();
        for id in &order {
            let Some(b) = doc.boxes.get(*id) else { continue };
            if !b.is_block() || b.element.is_none() {
                continue;
            }
            let block_runs = doc.boxes.text_runs_of_block(*id);
            let count = block_runs.len();
            for (idx, run) in block_runs.into_iter().enumerate() {
                runs.insert(run, (b.element, RunPosition::new(idx + 1, count)));
            }
        }
        Self {
            doc,
            config,
            order,
            runs,
        }
    }

    /// Paints `page`: page decorations in page space, then every box that
    /// falls on the page, clipped to the content area.
    pub(crate) fn paint_page<W: Write + Seek>(
        &self,
        device: &mut LopdfOutputDevice<W>,
        page: &PageBox,
    ) -> Result<(), RenderError> {
        let page_rect = Rect::new(0.0, 0.0, page.width, page.height);
        self.paint_decorations(device, &page.style, page_rect, page.content_clip())?;

        device.clip(&Shape::rect(page.content_clip()))?;
        let left = page.margins.left;
        let top = -page.top + page.margins.top;
        device.translate(left, top);
        let painted = self.paint_content(device, page);
        device.translate(-left, -top);
        painted?;
        device.set_clip(None)
    }

    fn paint_content<W: Write + Seek>(
        &self,
        device: &mut LopdfOutputDevice<W>,
        page: &PageBox,
    ) -> Result<(), RenderError> {
        for id in &self.order {
            let Some(b) = self.doc.boxes.get(*id) else { continue };
            let on_page = b.bounds.overlaps_band(page.top, page.bottom);

            if on_page && b.style.has_decoration() {
                self.paint_decorations(device, &b.style, b.bounds, b.bounds)?;
            }
            match &b.kind {
                BoxKind::Text(run) if page.contains_y(b.page_ref_y()) => {
                    self.paint_text(device, *id, run)?;
                }
                BoxKind::Replaced(image) if on_page => {
                    let alt = b.element.and_then(|e| self.doc.elements.attribute(e, "alt"));
                    device.draw_image_tagged(image, b.bounds.x, b.bounds.y, alt)?;
                    self.paint_links(device, *id)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn paint_text<W: Write + Seek>(
        &self,
        device: &mut LopdfOutputDevice<W>,
        id: BoxId,
        run: &TextRun,
    ) -> Result<(), RenderError> {
        let Some(b) = self.doc.boxes.get(id) else {
            return Ok(());
        };
        let (block, position) = self.runs.get(&id).copied().unwrap_or((None, RunPosition::single()));
        let x = b.bounds.x;
        let y = b.bounds.y + b.baseline;

        device.set_color(&b.style.color)?;
        device.draw_text_run(&self.doc.elements, run, x, y, block, position, |d| self.paint_links(d, id))?;
        if self.config.debug_font_metrics {
            self.paint_font_metrics(device, run, x, y, b.bounds.width)?;
        }
        Ok(())
    }

    /// Baseline, ascent and descent of a run as one-pixel lines.
    fn paint_font_metrics<W: Write + Seek>(
        &self,
        device: &mut LopdfOutputDevice<W>,
        run: &TextRun,
        x: f32,
        y: f32,
        width: f32,
    ) -> Result<(), RenderError> {
        let previous = device.stroke().clone();
        let line_width = self.config.dots_per_pixel as f32;
        device.with_artifact(|d| {
            d.set_color(&DEBUG_METRICS_COLOR)?;
            d.set_stroke(Stroke::Basic(BasicStroke::new(line_width)));
            d.draw_line(x, y, x + width, y)?;
            d.draw_line(x, y - run.font.ascent, x + width, y - run.font.ascent)?;
            d.draw_line(x, y + run.font.descent, x + width, y + run.font.descent)
        })?;
        device.set_stroke(previous);
        Ok(())
    }

    /// Offers the box and its enclosing inline boxes to the link annotator.
    fn paint_links<W: Write + Seek>(&self, device: &mut LopdfOutputDevice<W>, id: BoxId) -> Result<(), RenderError> {
        let mut current = Some(id);
        while let Some(box_id) = current {
            let Some(b) = self.doc.boxes.get(box_id) else { break };
            if b.is_block() {
                break;
            }
            if b.element.is_some() {
                device.process_link(self.doc, box_id)?;
            }
            current = b.parent;
        }
        Ok(())
    }

    /// Background color, background image and borders of one box.
    fn paint_decorations<W: Write + Seek>(
        &self,
        device: &mut LopdfOutputDevice<W>,
        style: &BoxStyle,
        background_area: Rect,
        border_area: Rect,
    ) -> Result<(), RenderError> {
        if let Some(color) = &style.background {
            device.with_artifact(|d| {
                d.set_color(color)?;
                d.fill_rect(background_area)
            })?;
        }
        if let Some(background) = &style.background_image {
            paint_background_image(device, background, background_area)?;
        }

        let visible: Vec<_> = style
            .borders()
            .into_iter()
            .filter_map(|(side, border)| border.filter(|b| b.is_visible()).map(|b| (side, b)))
            .collect();
        if visible.is_empty() {
            return Ok(());
        }
        device.with_artifact(|d| {
            for (side, border) in visible {
                let w = border.width;
                let stroke = match border.style {
                    BorderStyle::Dashed => BasicStroke::new(w).with_dash(vec![3.0 * w, 3.0 * w], 0.0),
                    BorderStyle::Dotted => BasicStroke::new(w).with_cap(LineCap::Butt).with_dash(vec![w, w], 0.0),
                    _ => BasicStroke::new(w).with_cap(LineCap::Butt),
                };
                d.set_color(&border.color)?;
                d.set_stroke(Stroke::Basic(stroke));
                let r = border_area;
                let half = w / 2.0;
                match side {
                    Side::Top => d.draw_line(r.x, r.y + half, r.right(), r.y + half)?,
                    Side::Right => d.draw_line(r.right() - half, r.y, r.right() - half, r.bottom())?,
                    Side::Bottom => d.draw_line(r.x, r.bottom() - half, r.right(), r.bottom() - half)?,
                    Side::Left => d.draw_line(r.x + half, r.y, r.x + half, r.bottom())?,
                }
            }
            Ok(())
        })
    }
}

fn paint_background_image<W: Write + Seek>(
    device: &mut LopdfOutputDevice<W>,
    background: &BackgroundImage,
    area: Rect,
) -> Result<(), RenderError> {
    match background.repeat {
        BackgroundRepeat::NoRepeat => device.draw_image_tagged(&background.image, area.x, area.y, None),
        BackgroundRepeat::RepeatX => device.draw_image_band(&background.image, area.x, area.y, area, true),
        BackgroundRepeat::RepeatY => device.draw_image_band(&background.image, area.x, area.y, area, false),
    }
}
