//! Integer page-space rectangles.
//!
//! Coordinates grow right and down from the top-left page corner. The high
//! edges (`x1`, `y1`) are exclusive, so a rectangle is empty whenever
//! `x0 >= x1` or `y0 >= y1`.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle with integer coordinates.
///
/// Serialized as a 4-element array `[x0, y0, x1, y1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct Rect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Rect {
    /// The empty sentinel. Its inverted extremes make it the identity of
    /// [`Rect::union`].
    pub const EMPTY: Rect = Rect {
        x0: i32::MAX,
        y0: i32::MAX,
        x1: i32::MIN,
        y1: i32::MIN,
    };

    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Rect { x0, y0, x1, y1 }
    }

    /// Smallest integer rectangle enclosing the given float bounds.
    ///
    /// Low edges are floored and high edges ceiled. Non-finite input yields
    /// [`Rect::EMPTY`].
    pub fn enclosing(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
            return Rect::EMPTY;
        }
        Rect {
            x0: x0.floor() as i32,
            y0: y0.floor() as i32,
            x1: x1.ceil() as i32,
            y1: y1.ceil() as i32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    /// Width, or 0 for an empty rectangle.
    pub fn width(&self) -> i32 {
        if self.is_empty() {
            0
        } else {
            self.x1.saturating_sub(self.x0)
        }
    }

    /// Height, or 0 for an empty rectangle.
    pub fn height(&self) -> i32 {
        if self.is_empty() {
            0
        } else {
            self.y1.saturating_sub(self.y0)
        }
    }

    /// Overlapping area of both rectangles, or [`Rect::EMPTY`].
    pub fn intersect(&self, other: &Rect) -> Rect {
        let r = Rect {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        };
        if r.is_empty() {
            Rect::EMPTY
        } else {
            r
        }
    }

    /// Smallest rectangle containing both. An empty operand is ignored.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Whether `other` lies entirely inside `self`. Empty rectangles are
    /// never contained.
    pub fn contains(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x0 <= other.x0
            && self.y0 <= other.y0
            && other.x1 <= self.x1
            && other.y1 <= self.y1
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        self.x0 <= x && x < self.x1 && self.y0 <= y && y < self.y1
    }

    /// Copy of `self` with the right edge moved to `x1`.
    pub fn with_right(&self, x1: i32) -> Rect {
        Rect { x1, ..*self }
    }
}

impl Default for Rect {
    fn default() -> Self {
        Rect::EMPTY
    }
}

impl From<[i32; 4]> for Rect {
    fn from(c: [i32; 4]) -> Self {
        Rect::new(c[0], c[1], c[2], c[3])
    }
}

impl From<Rect> for [i32; 4] {
    fn from(r: Rect) -> Self {
        [r.x0, r.y0, r.x1, r.y1]
    }
}

/// 1-based index of the first box in `boxes` containing `rect`, 0 if none.
///
/// Used both as a containment test and as a sort key that groups text by
/// the background box it sits on.
pub fn membership(rect: &Rect, boxes: &[Rect]) -> usize {
    boxes
        .iter()
        .position(|b| b.contains(rect))
        .map_or(0, |i| i + 1)
}

/// Whether `rect` overlaps any of `boxes`.
pub fn intersects_any(rect: &Rect, boxes: &[Rect]) -> bool {
    boxes.iter().any(|b| rect.intersects(b))
}
