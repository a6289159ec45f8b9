//! Tracks what the content stream has already been told so redundant
//! color and stroke operators are skipped.

use crate::sink::ContentSink;
use crate::transform::CoordinateTransformer;
use folio_render_core::{BasicStroke, RenderError, Shape, Stroke};
use folio_types::Color;
use lopdf::Object;

#[derive(Debug, Default)]
pub struct GraphicsStateTracker {
    color: Color,
    fill_emitted: Option<Color>,
    stroke_emitted: Option<Color>,
    /// Stroke as the caller set it, in device units.
    original_stroke: Stroke,
    /// `original_stroke` scaled into points.
    stroke: Stroke,
    last_stroke: Option<Stroke>,
    clip: Vec<Shape>,
}

impl GraphicsStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh state for a new content stream: a one-unit stroke written out in
    /// full and no cached colors.
    pub fn begin_page(&mut self, sink: &mut ContentSink, transformer: &CoordinateTransformer) {
        self.invalidate();
        self.clip.clear();
        let stroke = Stroke::Basic(BasicStroke::default().scaled(transformer.stroke_scale()));
        set_stroke_diff(sink, &stroke, None);
        self.original_stroke = stroke.clone();
        self.stroke = stroke;
    }

    /// Forget every emitted value, e.g. after a `Q` resets the stream state.
    pub fn invalidate(&mut self) {
        self.fill_emitted = None;
        self.stroke_emitted = None;
        self.last_stroke = None;
    }

    /// Forget the emitted line width and dash only.
    pub fn invalidate_stroke(&mut self) {
        self.last_stroke = None;
    }

    pub fn set_color(&mut self, color: &Color) -> Result<(), RenderError> {
        match color {
            Color::Rgb { .. } | Color::Cmyk { .. } => {
                self.color = color.clone();
                Ok(())
            }
            Color::Other { space } => Err(RenderError::UnsupportedColor(space.clone())),
        }
    }

    pub fn color(&self) -> &Color {
        &self.color
    }

    pub fn ensure_fill_color(&mut self, sink: &mut ContentSink) {
        if self.fill_emitted.as_ref() == Some(&self.color) {
            return;
        }
        emit_color(sink, &self.color, false);
        self.fill_emitted = Some(self.color.clone());
    }

    pub fn ensure_stroke_color(&mut self, sink: &mut ContentSink) {
        if self.stroke_emitted.as_ref() == Some(&self.color) {
            return;
        }
        emit_color(sink, &self.color, true);
        self.stroke_emitted = Some(self.color.clone());
    }

    /// Stores `stroke` and its point-space equivalent under the current transform.
    pub fn set_stroke(&mut self, stroke: Stroke, transformer: &CoordinateTransformer) {
        self.stroke = match &stroke {
            Stroke::Basic(basic) => Stroke::Basic(basic.scaled(transformer.stroke_scale())),
            Stroke::Custom(_) => stroke.clone(),
        };
        self.original_stroke = stroke;
    }

    pub fn original_stroke(&self) -> &Stroke {
        &self.original_stroke
    }

    pub fn stroke(&self) -> &Stroke {
        &self.stroke
    }

    /// Writes whatever differs between the last emitted stroke and the current one.
    pub fn apply_stroke(&mut self, sink: &mut ContentSink) {
        set_stroke_diff(sink, &self.stroke, self.last_stroke.as_ref());
        self.last_stroke = Some(self.stroke.clone());
    }

    pub fn push_clip(&mut self, shape: Shape) {
        self.clip.push(shape);
    }

    pub fn replace_clip(&mut self, shape: Option<Shape>) {
        self.clip.clear();
        self.clip.extend(shape);
    }

    /// Active clip shapes, already in PDF page space.
    pub fn clip(&self) -> &[Shape] {
        &self.clip
    }
}

fn emit_color(sink: &mut ContentSink, color: &Color, stroking: bool) {
    match color {
        Color::Rgb { r, g, b } => {
            let operands = [r, g, b]
                .iter()
                .map(|c| Object::Real(**c as f32 / 255.0))
                .collect();
            sink.op(if stroking { "RG" } else { "rg" }, operands);
        }
        Color::Cmyk { c, m, y, k } => {
            let operands = [c, m, y, k].iter().map(|v| Object::Real(**v)).collect();
            sink.op(if stroking { "K" } else { "k" }, operands);
        }
        // set_color rejects everything else
        Color::Other { .. } => {}
    }
}

/// Emits `w`, `J`, `j`, `M` and `d` for every attribute of `new` that differs
/// from `old`; with no `old` everything is written.
pub fn set_stroke_diff(sink: &mut ContentSink, new: &Stroke, old: Option<&Stroke>) {
    let Some(new) = new.as_basic() else { return };
    let old = old.and_then(Stroke::as_basic);
    if old == Some(new) {
        return;
    }
    if old.is_none_or(|o| o.width != new.width) {
        sink.op("w", vec![Object::Real(new.width)]);
    }
    if old.is_none_or(|o| o.cap != new.cap) {
        sink.op("J", vec![Object::Integer(new.cap.pdf_value())]);
    }
    if old.is_none_or(|o| o.join != new.join) {
        sink.op("j", vec![Object::Integer(new.join.pdf_value())]);
    }
    if old.is_none_or(|o| o.miter_limit != new.miter_limit) {
        sink.op("M", vec![Object::Real(new.miter_limit)]);
    }
    let dash_changed = old.is_none_or(|o| o.dash != new.dash || o.dash_phase != new.dash_phase);
    if dash_changed {
        match &new.dash {
            Some(dash) => sink.op(
                "d",
                vec![
                    Object::Array(dash.iter().map(|len| Object::Real(*len)).collect()),
                    Object::Real(new.dash_phase),
                ],
            ),
            None => sink.op("d", vec![Object::Array(vec![]), Object::Integer(0)]),
        }
    }
}
