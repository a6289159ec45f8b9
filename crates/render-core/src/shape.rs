//! Geometry handed to an output device.

use folio_types::{AffineTransform, Rect};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WindingRule {
    #[default]
    NonZero,
    EvenOdd,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    /// Control point, end point.
    QuadTo(f32, f32, f32, f32),
    /// Two control points, end point.
    CubicTo(f32, f32, f32, f32, f32, f32),
    Close,
}

impl PathSegment {
    fn map(self, t: &AffineTransform) -> PathSegment {
        let p = |x: f32, y: f32| t.transform_point(x, y);
        match self {
            PathSegment::MoveTo(x, y) => {
                let (x, y) = p(x, y);
                PathSegment::MoveTo(x, y)
            }
            PathSegment::LineTo(x, y) => {
                let (x, y) = p(x, y);
                PathSegment::LineTo(x, y)
            }
            PathSegment::QuadTo(x1, y1, x, y) => {
                let (x1, y1) = p(x1, y1);
                let (x, y) = p(x, y);
                PathSegment::QuadTo(x1, y1, x, y)
            }
            PathSegment::CubicTo(x1, y1, x2, y2, x, y) => {
                let (x1, y1) = p(x1, y1);
                let (x2, y2) = p(x2, y2);
                let (x, y) = p(x, y);
                PathSegment::CubicTo(x1, y1, x2, y2, x, y)
            }
            PathSegment::Close => PathSegment::Close,
        }
    }
}

/// A path plus the rule deciding its inside.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape {
    pub segments: Vec<PathSegment>,
    pub winding: WindingRule,
}

// Cubic approximation constant for quarter ellipses.
const KAPPA: f32 = 0.552_284_8;

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_winding(mut self, winding: WindingRule) -> Self {
        self.winding = winding;
        self
    }

    pub fn move_to(mut self, x: f32, y: f32) -> Self {
        self.segments.push(PathSegment::MoveTo(x, y));
        self
    }

    pub fn line_to(mut self, x: f32, y: f32) -> Self {
        self.segments.push(PathSegment::LineTo(x, y));
        self
    }

    pub fn quad_to(mut self, x1: f32, y1: f32, x: f32, y: f32) -> Self {
        self.segments.push(PathSegment::QuadTo(x1, y1, x, y));
        self
    }

    pub fn cubic_to(mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) -> Self {
        self.segments.push(PathSegment::CubicTo(x1, y1, x2, y2, x, y));
        self
    }

    pub fn close(mut self) -> Self {
        self.segments.push(PathSegment::Close);
        self
    }

    pub fn rect(r: Rect) -> Self {
        Shape::new()
            .move_to(r.x, r.y)
            .line_to(r.right(), r.y)
            .line_to(r.right(), r.bottom())
            .line_to(r.x, r.bottom())
            .close()
    }

    pub fn line(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Shape::new().move_to(x1, y1).line_to(x2, y2)
    }

    /// Ellipse inscribed in `r`, as four cubic segments.
    pub fn ellipse(r: Rect) -> Self {
        let (rx, ry) = (r.width / 2.0, r.height / 2.0);
        let (cx, cy) = (r.x + rx, r.y + ry);
        let (kx, ky) = (rx * KAPPA, ry * KAPPA);
        Shape::new()
            .move_to(cx + rx, cy)
            .cubic_to(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry)
            .cubic_to(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy)
            .cubic_to(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry)
            .cubic_to(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy)
            .close()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// A copy with every point mapped through `t`.
    pub fn transformed(&self, t: &AffineTransform) -> Shape {
        Shape {
            segments: self.segments.iter().map(|s| s.map(t)).collect(),
            winding: self.winding,
        }
    }
}
