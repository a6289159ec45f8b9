//! Device space to PDF page space.
//!
//! Layout hands us device units with Y growing downward. The current
//! transform starts as a `1/dots_per_point` scale and accumulates
//! translations; normalizing then flips Y against the page height.

use folio_render_core::utils::flip_y;
use folio_types::AffineTransform;

#[derive(Debug, Clone)]
pub struct CoordinateTransformer {
    dots_per_point: f32,
    transform: AffineTransform,
    page_height: f32,
}

impl CoordinateTransformer {
    pub fn new(dots_per_point: f32) -> Self {
        Self {
            dots_per_point,
            transform: AffineTransform::scaling(1.0 / dots_per_point, 1.0 / dots_per_point),
            page_height: 0.0,
        }
    }

    /// Resets the transform for a page `page_height` points tall.
    pub fn begin_page(&mut self, page_height: f32) {
        self.page_height = page_height;
        self.transform = AffineTransform::scaling(1.0 / self.dots_per_point, 1.0 / self.dots_per_point);
    }

    pub fn dots_per_point(&self) -> f32 {
        self.dots_per_point
    }

    pub fn page_height(&self) -> f32 {
        self.page_height
    }

    pub fn current(&self) -> &AffineTransform {
        &self.transform
    }

    pub fn translate(&mut self, tx: f32, ty: f32) {
        self.transform.translate(tx, ty);
    }

    /// `[1 0 0 -1 0 H] × t`.
    pub fn normalize(&self, t: &AffineTransform) -> AffineTransform {
        AffineTransform::page_flip(self.page_height).then(t)
    }

    pub fn normalize_y(&self, y: f32) -> f32 {
        flip_y(y, self.page_height)
    }

    /// Scale factor the current transform applies to lengths.
    pub fn stroke_scale(&self) -> f32 {
        self.transform.determinant().abs().sqrt()
    }

    /// Device length to points.
    pub fn to_points(&self, length: f32) -> f32 {
        length / self.dots_per_point
    }

    /// Device point to PDF page space.
    pub fn to_page_point(&self, x: f32, y: f32) -> (f32, f32) {
        let (px, py) = self.transform.transform_point(x, y);
        (px, self.normalize_y(py))
    }

    /// Text matrix placing the baseline origin at device `(x, y)` with
    /// glyphs upright.
    pub fn text_matrix(&self, x: f32, y: f32) -> AffineTransform {
        let at = self.transform.then(&AffineTransform::translation(x, y));
        self.normalize(&at)
            .then(&AffineTransform::scaling(1.0, -1.0))
            .then(&AffineTransform::scaling(self.dots_per_point, self.dots_per_point))
    }

    /// Matrix mapping the unit square onto a `width × height` device box at
    /// `(x, y)`.
    pub fn image_matrix(&self, x: f32, y: f32, width: f32, height: f32) -> AffineTransform {
        self.normalize(&self.transform)
            .then(&AffineTransform::translation(x, y))
            .then(&AffineTransform::translation(0.0, height))
            .then(&AffineTransform::scaling(width, height))
            .then(&AffineTransform::scaling(1.0, -1.0))
    }
}
