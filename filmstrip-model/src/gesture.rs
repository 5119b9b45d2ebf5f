//! Feedback types reported to gesture listeners.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A viewport edge, as used by rubber-band (`on_pull`) and fling-absorb
/// (`on_absorb`) feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EdgeDirection {
    /// Top edge of the viewport.
    Top,
    /// Left edge of the viewport.
    Left,
    /// Bottom edge of the viewport.
    Bottom,
    /// Right edge of the viewport.
    Right,
}

/// Which viewport edges the focused image currently rests against.
///
/// An edge is set when the image cannot scroll any further in that
/// direction at its current scale. Smaller-than-view images touch both
/// opposing edges at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Edges {
    /// The image's left edge is at (or inside) the view's left edge.
    pub left: bool,
    /// The image's right edge is at (or inside) the view's right edge.
    pub right: bool,
    /// The image's top edge is at (or inside) the view's top edge.
    pub top: bool,
    /// The image's bottom edge is at (or inside) the view's bottom edge.
    pub bottom: bool,
}

impl Edges {
    /// True when no edge is touched.
    pub const fn is_none(&self) -> bool {
        !(self.left || self.right || self.top || self.bottom)
    }
}

/// Whether a live pinch scale sits inside the stable scale range.
///
/// Returned by `scale_by`; the live value is intentionally not clamped to
/// the stable range while the gesture is active, so callers use this hint
/// to drive overscale feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ScaleRangeHint {
    /// The intended scale is below the stable minimum.
    Under,
    /// The intended scale is inside the stable range.
    Within,
    /// The intended scale is above the stable maximum.
    Over,
}
