use crate::error::RenderError;
use crate::shape::Shape;
use crate::stroke::Stroke;
use folio_types::{Color, FsImage, Rect, TextRun};

/// What the page orchestrator needs from a painting backend.
///
/// Coordinates are layout device units in the continuous document space;
/// the device owns the mapping to its own output space.
pub trait OutputDevice {
    /// Sets the color used by subsequent fills, strokes and text.
    fn set_color(&mut self, color: &Color) -> Result<(), RenderError>;

    fn set_stroke(&mut self, stroke: Stroke);

    /// The stroke as last set, before any transform scaling.
    fn stroke(&self) -> &Stroke;

    /// Strokes the outline of `shape`.
    fn draw(&mut self, shape: &Shape) -> Result<(), RenderError>;

    fn fill(&mut self, shape: &Shape) -> Result<(), RenderError>;

    fn fill_rect(&mut self, rect: Rect) -> Result<(), RenderError> {
        self.fill(&Shape::rect(rect))
    }

    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Result<(), RenderError> {
        self.draw(&Shape::line(x1, y1, x2, y2))
    }

    /// Intersects the current clip with `shape`.
    fn clip(&mut self, shape: &Shape) -> Result<(), RenderError>;

    /// Replaces the clip; `None` removes it.
    fn set_clip(&mut self, shape: Option<&Shape>) -> Result<(), RenderError>;

    fn translate(&mut self, tx: f32, ty: f32);

    /// Paints `run` with its baseline origin at `(x, y)`.
    fn draw_text(&mut self, run: &TextRun, x: f32, y: f32) -> Result<(), RenderError>;

    /// Places `image` with its top-left corner at `(x, y)`.
    fn draw_image(&mut self, image: &FsImage, x: f32, y: f32) -> Result<(), RenderError>;
}
