use serde::{Deserialize, Serialize};

/// A 2-D affine transform in PDF matrix order `[a b c d e f]`:
///
/// ```text
/// x' = a*x + c*y + e
/// y' = b*x + d*y + f
/// ```
///
/// `translate`, `scale` and `concatenate` compose on the right, so the
/// argument is applied to points before the existing transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub const fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub const fn scaling(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// The Y-flip used to move from a Y-down space into PDF page space:
    /// second row `[0, -1]`, Y translation `page_height`.
    pub const fn page_flip(page_height: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, -1.0, 0.0, page_height)
    }

    pub fn translate(&mut self, tx: f32, ty: f32) {
        self.e += self.a * tx + self.c * ty;
        self.f += self.b * tx + self.d * ty;
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.a *= sx;
        self.b *= sx;
        self.c *= sy;
        self.d *= sy;
    }

    /// `self = self × other`.
    pub fn concatenate(&mut self, other: &AffineTransform) {
        *self = self.then(other);
    }

    /// Returns `self × other` without modifying either operand.
    pub fn then(&self, other: &AffineTransform) -> AffineTransform {
        AffineTransform {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Applies only the linear part, for lengths and directions.
    pub fn delta_transform(&self, dx: f32, dy: f32) -> (f32, f32) {
        (self.a * dx + self.c * dy, self.b * dx + self.d * dy)
    }

    pub fn inverse(&self) -> Option<AffineTransform> {
        let det = self.determinant();
        if det.abs() <= f32::EPSILON {
            return None;
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        let e = -(a * self.e + c * self.f);
        let f = -(b * self.e + d * self.f);
        Some(AffineTransform { a, b, c, d, e, f })
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    pub fn to_array(&self) -> [f32; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: (f32, f32), b: (f32, f32)) -> bool {
        (a.0 - b.0).abs() < 1e-4 && (a.1 - b.1).abs() < 1e-4
    }

    #[test]
    fn concatenation_applies_argument_first() {
        let mut t = AffineTransform::scaling(2.0, 2.0);
        t.concatenate(&AffineTransform::translation(10.0, 0.0));
        assert!(close(t.transform_point(0.0, 0.0), (20.0, 0.0)));

        let mut u = AffineTransform::translation(10.0, 0.0);
        u.concatenate(&AffineTransform::scaling(2.0, 2.0));
        assert!(close(u.transform_point(1.0, 1.0), (12.0, 2.0)));
    }

    #[test]
    fn translate_matches_concatenated_translation() {
        let mut a = AffineTransform::scaling(0.5, 0.5);
        a.translate(4.0, 8.0);
        let b = AffineTransform::scaling(0.5, 0.5).then(&AffineTransform::translation(4.0, 8.0));
        assert_eq!(a, b);
    }

    #[test]
    fn page_flip_inverts_y_against_height() {
        let flip = AffineTransform::page_flip(800.0);
        assert!(close(flip.transform_point(5.0, 100.0), (5.0, 700.0)));
        assert_eq!(flip.b, 0.0);
        assert_eq!(flip.d, -1.0);
    }

    #[test]
    fn inverse_round_trips_points() {
        let mut t = AffineTransform::scaling(3.0, -2.0);
        t.translate(7.0, 1.5);
        let inv = t.inverse().unwrap();
        let p = t.transform_point(11.0, -4.0);
        assert!(close(inv.transform_point(p.0, p.1), (11.0, -4.0)));
        assert!(AffineTransform::scaling(0.0, 1.0).inverse().is_none());
    }

    #[test]
    fn determinant_of_uniform_scale() {
        let t = AffineTransform::scaling(0.25, 0.25);
        assert!((t.determinant() - 0.0625).abs() < f32::EPSILON);
    }
}
