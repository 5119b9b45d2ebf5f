//! Integer screen rectangle.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in integer view pixels.
///
/// The coordinate convention matches what renderers expect: `left`/`top`
/// inclusive, `right`/`bottom` exclusive, so `width = right - left`. A
/// default rectangle is empty at the origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    /// Left edge, inclusive.
    pub left: i32,
    /// Top edge, inclusive.
    pub top: i32,
    /// Right edge, exclusive.
    pub right: i32,
    /// Bottom edge, exclusive.
    pub bottom: i32,
}

impl Rect {
    /// Build a rectangle from its four edges.
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Width in pixels. Negative when the rectangle is inverted.
    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Height in pixels. Negative when the rectangle is inverted.
    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Horizontal center, truncated toward the left edge.
    pub const fn center_x(&self) -> i32 {
        self.left + self.width() / 2
    }

    /// Vertical center, truncated toward the top edge.
    pub const fn center_y(&self) -> i32 {
        self.top + self.height() / 2
    }

    /// True when the rectangle encloses no area.
    pub const fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// Overwrite all four edges in place.
    pub fn set(&mut self, left: i32, top: i32, right: i32, bottom: i32) {
        self.left = left;
        self.top = top;
        self.right = right;
        self.bottom = bottom;
    }

    /// True when `self` and `other` share any area.
    pub const fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}
