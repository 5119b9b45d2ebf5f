//! Stable-bound computation for the focused box.

use crate::animatable::SharedView;

/// The range the platform X / focused box Y may occupy without exposing
/// empty viewport margin. "Stable" means:
///
/// 1. If the scaled image dimension >= the view dimension, the image edge
///    stays at or outside the view edge in that axis.
/// 2. If the scaled image dimension < the view dimension, the image is
///    centered in that axis: the bound collapses to a single value (the
///    platform's default X horizontally, zero vertically).
///
/// A gesture may leave this region temporarily; snap-back restores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StableBound {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

/// Display width of an image at the given scale, rounded.
pub(crate) fn scaled_width(image_w: i32, scale: f32) -> i32 {
    (image_w as f32 * scale + 0.5) as i32
}

/// Display height of an image at the given scale, rounded.
pub(crate) fn scaled_height(image_h: i32, scale: f32) -> i32 {
    (image_h as f32 * scale + 0.5) as i32
}

/// True when the view is at least as tall as the scaled image.
pub(crate) fn view_taller_than_scaled(view: &SharedView, image_h: i32, scale: f32) -> bool {
    view.view_h >= scaled_height(image_h, scale)
}

/// True when the view is at least as wide as the scaled image.
pub(crate) fn view_wider_than_scaled(view: &SharedView, image_w: i32, scale: f32) -> bool {
    view.view_w >= scaled_width(image_w, scale)
}

/// Compute the stable bound of the focused box at `scale`.
///
/// `horizontal_slack` (usually 0) widens the horizontal range symmetrically;
/// snap-back passes the configured slack so a position resting exactly on
/// the bound is not corrected again.
pub(crate) fn calculate_stable_bound(
    view: &SharedView,
    image_w: i32,
    image_h: i32,
    scale: f32,
    horizontal_slack: i32,
    platform_default_x: i32,
) -> StableBound {
    let w = scaled_width(image_w, scale);
    let h = scaled_height(image_h, scale);

    // When the edge of the view is aligned with the edge of the box.
    let mut bound = StableBound {
        left: (view.view_w + 1) / 2 - (w + 1) / 2 - horizontal_slack,
        right: w / 2 - view.view_w / 2 + horizontal_slack,
        top: (view.view_h + 1) / 2 - (h + 1) / 2,
        bottom: h / 2 - view.view_h / 2,
    };

    if view_taller_than_scaled(view, image_h, scale) {
        bound.top = 0;
        bound.bottom = 0;
    }

    if view_wider_than_scaled(view, image_w, scale) {
        bound.left = platform_default_x;
        bound.right = platform_default_x;
    }

    bound
}
