//! Affine matrices and float bounding boxes used while interpreting content
//! streams.

use textorizer_core::Rect;

/// A PDF transformation matrix `[a, b, c, d, e, f]`.
///
/// Points are row vectors: `(x, y) -> (a*x + c*y + e, b*x + d*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix(pub [f32; 6]);

impl Matrix {
    pub const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    pub fn translate(tx: f32, ty: f32) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// Build from six numeric operands, e.g. of `cm`, `Tm` or a `/Matrix`.
    pub fn from_slice(vals: &[f32]) -> Option<Self> {
        match vals {
            [a, b, c, d, e, f] => Some(Matrix([*a, *b, *c, *d, *e, *f])),
            _ => None,
        }
    }

    /// `self` applied first, then `other`.
    pub fn then(&self, other: &Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }

    /// Transform a direction, ignoring translation.
    pub fn apply_vector(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, _, _] = self.0;
        (a * x + c * y, b * x + d * y)
    }

    /// Length of the transformed unit y vector. The rendered size of text
    /// drawn with this matrix is the font size times this factor.
    pub fn vertical_scale(&self) -> f32 {
        let (x, y) = self.apply_vector(0.0, 1.0);
        (x * x + y * y).sqrt()
    }
}

/// Float bounding box in page space. Starts out empty and grows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Default for Bounds {
    fn default() -> Self {
        Bounds::EMPTY
    }
}

impl Bounds {
    pub const EMPTY: Bounds = Bounds {
        x0: f32::INFINITY,
        y0: f32::INFINITY,
        x1: f32::NEG_INFINITY,
        y1: f32::NEG_INFINITY,
    };

    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Bounds { x0, y0, x1, y1 }
    }

    /// Bounds of the transformed rectangle `(x0, y0)-(x1, y1)`.
    pub fn transformed(m: &Matrix, x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        let mut b = Bounds::EMPTY;
        for (x, y) in [(x0, y0), (x1, y0), (x0, y1), (x1, y1)] {
            let (px, py) = m.apply(x, y);
            b.add_point(px, py);
        }
        b
    }

    pub fn is_empty(&self) -> bool {
        !(self.x0 <= self.x1 && self.y0 <= self.y1)
    }

    pub fn add_point(&mut self, x: f32, y: f32) {
        if !(x.is_finite() && y.is_finite()) {
            return;
        }
        self.x0 = self.x0.min(x);
        self.y0 = self.y0.min(y);
        self.x1 = self.x1.max(x);
        self.y1 = self.y1.max(y);
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// Whether the horizontal extents overlap.
    pub fn overlaps_x(&self, other: &Bounds) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1
    }

    pub fn to_rect(&self) -> Rect {
        if self.is_empty() {
            return Rect::EMPTY;
        }
        Rect::enclosing(self.x0, self.y0, self.x1, self.y1)
    }
}

/// Collects the points of the path under construction.
///
/// Curves contribute their control points, so the result is the bounding
/// box of the control hull.
#[derive(Debug, Default)]
pub struct PathBuilder {
    bounds: Bounds,
}

impl PathBuilder {
    pub fn add(&mut self, ctm: &Matrix, x: f32, y: f32) {
        let (px, py) = ctm.apply(x, y);
        self.bounds.add_point(px, py);
    }

    pub fn add_rect(&mut self, ctm: &Matrix, x: f32, y: f32, w: f32, h: f32) {
        self.add(ctm, x, y);
        self.add(ctm, x + w, y);
        self.add(ctm, x, y + h);
        self.add(ctm, x + w, y + h);
    }

    /// Finish the path, returning its bounds if it has any points.
    pub fn take(&mut self) -> Option<Bounds> {
        let bounds = std::mem::take(&mut self.bounds);
        (!bounds.is_empty()).then_some(bounds)
    }

    pub fn clear(&mut self) {
        self.bounds = Bounds::EMPTY;
    }
}
