//! The position controller: gesture surface, per-tick advance, layout and
//! the box re-indexing algorithm.
//!
//! ```text
//!  ___________________________________________________________
//! |   _____       _____       _____       _____       _____   |
//! |  |     |     |     |     |     |     |     |     |     |  |
//! |  | Box |     | Box |     | Box*|     | Box |     | Box |  |
//! |  |_____|.....|_____|.....|_____|.....|_____|.....|_____|  |
//! |          Gap         Gap         Gap         Gap          |
//! |___________________________________________________________|
//!
//!                       <--  Platform  -->
//! ```
//!
//! The focused box (`Box*`, index 0) centers at the platform's
//! `(current_x, current_y)`. Boxes at positive indices hang off their left
//! neighbor through the gap between them; negative indices mirror that to
//! the left. The layout pass therefore runs inside-out from index 0.

use filmstrip_model::{EdgeDirection, Edges, Rect, ScaleRangeHint};
use tracing::{debug, trace, warn};

use crate::animatable::{Animatable, AnimationState, FocusedBox, SharedView};
use crate::bound::{
    StableBound, calculate_stable_bound, scaled_height, scaled_width, view_taller_than_scaled,
    view_wider_than_scaled,
};
use crate::boxes::{BoxEnv, ImageBox};
use crate::config::{ConfigError, ControllerConfig};
use crate::curve::AnimKind;
use crate::gap::{Gap, GapEnv};
use crate::physics::{FilmFlingPhysics, FilmScroller, FlingScroller, PageFlingPhysics};
use crate::platform::{Platform, PlatformEnv};
use crate::range::RangeArray;
use crate::time::{AnimationClock, SystemClock};

/// Number of boxes kept on each side of the focused one.
pub const BOX_MAX: i32 = 3;

/// Total number of boxes in the window (`2 * BOX_MAX + 1`).
pub const BOX_COUNT: usize = (BOX_MAX * 2 + 1) as usize;

// Two scales closer than this are considered the same.
const SCALE_EPSILON: f32 = 0.02;

/// Callbacks the controller raises toward its host.
///
/// `invalidate` and `is_holding` must be implemented; the edge-feedback
/// callbacks default to no-ops for hosts without rubber-band effects.
pub trait Listener {
    /// The layout changed; the host should redraw.
    fn invalidate(&mut self);

    /// True while the user's touch is still down. Suppresses snap-back so
    /// the strip does not fight an active drag.
    fn is_holding(&self) -> bool;

    /// Rubber-band feedback: a scroll tried to move `offset` pixels past a
    /// non-scrollable edge.
    fn on_pull(&mut self, offset: i32, direction: EdgeDirection) {
        let _ = (offset, direction);
    }

    /// The touch that caused `on_pull` ended.
    fn on_release(&mut self) {}

    /// A fling ran into an edge at the given velocity (pixels per second).
    fn on_absorb(&mut self, velocity: i32, direction: EdgeDirection) {
        let _ = (velocity, direction);
    }
}

/// Positions and animates the strip of boxes inside a fixed viewport.
///
/// The controller is single-threaded and tick-driven: the host forwards
/// gesture calls, drives [`advance_animation`](Self::advance_animation) once
/// per render tick, and reads the resulting screen rectangles through
/// [`get_position`](Self::get_position).
pub struct PositionController {
    listener: Box<dyn Listener>,
    clock: Box<dyn AnimationClock>,
    page_scroller: Box<dyn PageFlingPhysics>,
    film_scroller: Box<dyn FilmFlingPhysics>,
    cfg: ControllerConfig,

    view_w: i32,
    view_h: i32,

    film_mode: bool,
    extra_scaling_range: bool,
    // The host's first move_box() sets constrained = true; starting there
    // avoids an unwanted transition animation on the very first call.
    constrained: bool,
    constrained_frame: Rect,
    open_animation_rect: Option<Rect>,

    // A pinch gesture is in progress; its focus point is kept in
    // bitmap-relative coordinates from the picture center.
    in_scale: bool,
    focus_x: f32,
    focus_y: f32,

    has_prev: bool,
    has_next: bool,

    platform: Platform,
    boxes: RangeArray<ImageBox>,
    // The gap at the right of box i is at index i; the gap at its left is
    // at index i - 1.
    gaps: RangeArray<Gap>,
    rects: RangeArray<Rect>,
}

impl std::fmt::Debug for PositionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionController")
            .field("view_w", &self.view_w)
            .field("view_h", &self.view_h)
            .field("film_mode", &self.film_mode)
            .field("constrained", &self.constrained)
            .field("has_prev", &self.has_prev)
            .field("has_next", &self.has_next)
            .field("platform_x", &self.platform.current_x)
            .field("focused_scale", &self.boxes.get(0).current_scale)
            .finish_non_exhaustive()
    }
}

impl PositionController {
    /// Create a controller with the default clock, physics and config.
    pub fn new(listener: Box<dyn Listener>) -> Self {
        Self::build(
            listener,
            Box::new(SystemClock::new()),
            Box::new(FlingScroller::new()),
            Box::new(FilmScroller::new()),
            ControllerConfig::default(),
        )
    }

    /// Create a controller with explicit collaborators, validating the
    /// config. Tests use this to substitute a manual clock and stub physics.
    pub fn with_parts(
        listener: Box<dyn Listener>,
        clock: Box<dyn AnimationClock>,
        page_scroller: Box<dyn PageFlingPhysics>,
        film_scroller: Box<dyn FilmFlingPhysics>,
        cfg: ControllerConfig,
    ) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self::build(listener, clock, page_scroller, film_scroller, cfg))
    }

    fn build(
        listener: Box<dyn Listener>,
        clock: Box<dyn AnimationClock>,
        page_scroller: Box<dyn PageFlingPhysics>,
        film_scroller: Box<dyn FilmFlingPhysics>,
        cfg: ControllerConfig,
    ) -> Self {
        let mut c = Self {
            listener,
            clock,
            page_scroller,
            film_scroller,
            cfg,
            view_w: 640,
            view_h: 480,
            film_mode: false,
            extra_scaling_range: false,
            constrained: true,
            constrained_frame: Rect::default(),
            open_animation_rect: None,
            in_scale: false,
            focus_x: 0.0,
            focus_y: 0.0,
            has_prev: false,
            has_next: false,
            platform: Platform::default(),
            boxes: RangeArray::new_with(-BOX_MAX, BOX_MAX, |_| ImageBox::default()),
            gaps: RangeArray::new_with(-BOX_MAX, BOX_MAX - 1, |_| Gap::default()),
            rects: RangeArray::new_with(-BOX_MAX, BOX_MAX, |_| Rect::default()),
        };
        c.init_platform();
        for i in -BOX_MAX..=BOX_MAX {
            c.init_box(i);
        }
        for i in -BOX_MAX..BOX_MAX {
            c.init_gap(i);
        }
        c
    }

    ////////////////////////////////////////////////////////////////////////
    // Configuration
    ////////////////////////////////////////////////////////////////////////

    /// Screen rectangle the next opening animation starts from.
    pub fn set_open_animation_rect(&mut self, r: Option<Rect>) {
        self.open_animation_rect = r;
    }

    /// Resize the viewport.
    pub fn set_view_size(&mut self, view_w: i32, view_h: i32) {
        if view_w == self.view_w && view_h == self.view_h {
            return;
        }
        self.view_w = view_w;
        self.view_h = view_h;
        self.init_platform();

        for i in -BOX_MAX..=BOX_MAX {
            self.set_box_size(i, view_w, view_h, true);
        }

        self.update_scale_and_gap_limit();
        self.snap_and_redraw();
    }

    /// Set the rectangle the focused box must fit into while constrained.
    pub fn set_constrained_frame(&mut self, f: Rect) {
        if self.constrained_frame == f {
            return;
        }
        self.constrained_frame = f;
        self.update_platform_defaults();
        self.update_scale_and_gap_limit();
        self.snap_and_redraw();
    }

    /// Supply the real image dimensions for a box.
    ///
    /// A zero dimension reinitializes the box to view-sized defaults.
    /// `force` overwrites the dimensions without any layout side effect.
    pub fn set_image_size(&mut self, index: i32, width: i32, height: i32, force: bool) {
        if force {
            let b = self.boxes.get_mut(index);
            b.image_w = width;
            b.image_h = height;
            return;
        }

        if width == 0 || height == 0 {
            self.init_box(index);
        } else if !self.set_box_size(index, width, height, false) {
            return;
        }

        self.update_scale_and_gap_limit();
        self.start_opening_animation_if_needed();
        self.snap_and_redraw();
    }

    /// Switch between film mode (whole image, no zoom) and page mode.
    pub fn set_film_mode(&mut self, enabled: bool) {
        if enabled == self.film_mode {
            return;
        }
        self.film_mode = enabled;

        self.update_platform_defaults();
        self.update_scale_and_gap_limit();
        self.stop_animation();
        self.snap_and_redraw();
    }

    /// Permanently widen the scale bounds by the extra gesture range until
    /// disabled again.
    pub fn set_extra_scaling_range(&mut self, enabled: bool) {
        if self.extra_scaling_range == enabled {
            return;
        }
        self.extra_scaling_range = enabled;
        if !enabled {
            self.snap_and_redraw();
        }
    }

    ////////////////////////////////////////////////////////////////////////
    // Animation control
    ////////////////////////////////////////////////////////////////////////

    /// Freeze all animations at their current values.
    pub fn stop_animation(&mut self) {
        self.platform.anim.halt();
        for i in -BOX_MAX..=BOX_MAX {
            self.boxes.get_mut(i).anim.halt();
        }
        for i in -BOX_MAX..BOX_MAX {
            self.gaps.get_mut(i).anim.halt();
        }
    }

    /// Jump every running animation straight to its target.
    pub fn skip_animation(&mut self) {
        if !self.platform.anim.is_idle() {
            self.platform.current_x = self.platform.to_x;
            self.platform.current_y = self.platform.to_y;
            self.platform.anim.halt();
        }
        for i in -BOX_MAX..=BOX_MAX {
            let b = self.boxes.get_mut(i);
            if b.anim.is_idle() {
                continue;
            }
            b.current_y = b.to_y;
            b.current_scale = b.to_scale;
            b.anim.halt();
        }
        for i in -BOX_MAX..BOX_MAX {
            let g = self.gaps.get_mut(i);
            if g.anim.is_idle() {
                continue;
            }
            g.current_gap = g.to_gap;
            g.anim.halt();
        }
        self.redraw();
    }

    /// Snap every entity back to its stable state if needed.
    pub fn snapback(&mut self) {
        self.snap_and_redraw();
    }

    /// Advance all entities one tick. The host calls this once per render
    /// tick; a single redraw is requested if anything changed.
    pub fn advance_animation(&mut self) {
        let now = self.clock.now_ms();
        let mut changed = self.with_platform(|p, env| p.advance_animation(env, now));
        for i in -BOX_MAX..=BOX_MAX {
            changed |= self.with_box(i, |b, env| b.advance_animation(env, now));
        }
        for i in -BOX_MAX..BOX_MAX {
            changed |= self.with_gap(i, |g, env| g.advance_animation(env, now));
        }
        if changed {
            self.redraw();
        }
    }

    ////////////////////////////////////////////////////////////////////////
    // Gestures on the focused box
    ////////////////////////////////////////////////////////////////////////

    /// Zoom so the tapped point ends up centered at `target_scale`.
    pub fn zoom_in(&mut self, tap_x: f32, tap_y: f32, target_scale: f32) {
        let tap_x = tap_x - (self.view_w / 2) as f32;
        let tap_y = tap_y - (self.view_h / 2) as f32;
        let b = *self.boxes.get(0);

        // Convert the tap position to a distance to center in bitmap
        // coordinates.
        let temp_x = (tap_x - self.platform.current_x as f32) / b.current_scale;
        let temp_y = (tap_y - b.current_y as f32) / b.current_scale;

        let x = round_pixel(-temp_x * target_scale);
        let y = round_pixel(-temp_y * target_scale);

        let bound = self.stable_bound(target_scale, 0);
        let target_x = x.clamp(bound.left, bound.right);
        let target_y = y.clamp(bound.top, bound.bottom);
        let target_scale = target_scale.clamp(b.scale_min, b.scale_max);

        self.start_animation(target_x, target_y, target_scale, AnimKind::Zoom);
    }

    /// Animate back to the default, fully visible view.
    pub fn reset_to_full_view(&mut self) {
        let (default_x, scale_min) = (self.platform.default_x, self.boxes.get(0).scale_min);
        self.start_animation(default_x, 0, scale_min, AnimKind::Zoom);
    }

    /// Record the focus point of a starting pinch gesture.
    pub fn begin_scale(&mut self, focus_x: f32, focus_y: f32) {
        let focus_x = focus_x - (self.view_w / 2) as f32;
        let focus_y = focus_y - (self.view_h / 2) as f32;
        let b = self.boxes.get(0);
        self.in_scale = true;
        self.focus_x =
            round_pixel((focus_x - self.platform.current_x as f32) / b.current_scale) as f32;
        self.focus_y = round_pixel((focus_y - b.current_y as f32) / b.current_scale) as f32;
    }

    /// Scale the focused image by `s`, keeping the recorded focus point
    /// fixed on screen. The live value may overshoot the stable range; the
    /// returned hint reports where the intended scale sits, and snap-back
    /// corrects the overshoot once the gesture ends.
    pub fn scale_by(&mut self, s: f32, focus_x: f32, focus_y: f32) -> ScaleRangeHint {
        let focus_x = focus_x - (self.view_w / 2) as f32;
        let focus_y = focus_y - (self.view_h / 2) as f32;
        let b = *self.boxes.get(0);

        // Keep the focus point on the bitmap where it was when the gesture
        // began: (focus_x' - current_x') / scale' = (focus_x - current_x) / scale
        let s = s * self.target_scale_of_focused();
        let x = if self.film_mode {
            self.platform.current_x
        } else {
            round_pixel(focus_x - s * self.focus_x)
        };
        let y = if self.film_mode {
            b.current_y
        } else {
            round_pixel(focus_y - s * self.focus_y)
        };
        self.start_animation(x, y, s, AnimKind::Scale);

        if s < b.scale_min {
            ScaleRangeHint::Under
        } else if s > b.scale_max {
            ScaleRangeHint::Over
        } else {
            ScaleRangeHint::Within
        }
    }

    /// End the pinch gesture and let snap-back correct any overshoot.
    pub fn end_scale(&mut self) {
        self.in_scale = false;
        self.snap_and_redraw();
    }

    /// Slide the focused box to the center of the view.
    pub fn start_horizontal_slide(&mut self) {
        let (default_x, scale_min) = (self.platform.default_x, self.boxes.get(0).scale_min);
        self.start_animation(default_x, 0, scale_min, AnimKind::Slide);
    }

    /// Slide to center with the capture transition: in addition to the
    /// slide, the focused box, the neighbor at `offset` (`1` or `-1`) and
    /// the gap between the two scale through the capture curve.
    pub fn start_capture_animation_slide(&mut self, offset: i32) {
        debug_assert!(offset == 1 || offset == -1);
        let duration = AnimKind::Capture.base_duration_ms();

        let (default_x, default_y) = (self.platform.default_x, self.platform.default_y);
        self.with_platform(|p, env| {
            p.do_animation(env, default_x, default_y, AnimKind::Capture, duration)
        });
        let scale_min = self.boxes.get(0).scale_min;
        self.with_box(0, |b, env| {
            b.do_animation(env, 0, scale_min, AnimKind::Capture, duration)
        });
        let neighbor_min = self.boxes.get(offset).scale_min;
        self.with_box(offset, |b, env| {
            b.do_animation(env, 0, neighbor_min, AnimKind::Capture, duration)
        });
        // The gap between box 0 and the neighbor: index 0 toward the next
        // box, index -1 toward the previous one.
        let gap_index = offset.min(0);
        let gap_default = self.gaps.get(gap_index).default_size;
        self.with_gap(gap_index, |g, env| {
            g.do_animation(env, gap_default, AnimKind::Capture, duration)
        });
        self.redraw();
    }

    ////////////////////////////////////////////////////////////////////////
    // Scroll and fling
    ////////////////////////////////////////////////////////////////////////

    /// Scroll by a delta. Deltas compose against the in-flight target, not
    /// the current position, so repeated events do not lose distance.
    pub fn start_scroll(&mut self, dx: f32, dy: f32) {
        let x = self.target_x_of_platform() + round_pixel(dx);
        let y = self.target_y_of_focused() + round_pixel(dy);

        if self.film_mode {
            self.scroll_to_film(x, y);
        } else {
            self.scroll_to_page(x, y);
        }
    }

    fn scroll_to_page(&mut self, x: i32, y: i32) {
        let scale = self.boxes.get(0).current_scale;
        let bound = self.stable_bound(scale, 0);
        let (mut x, mut y) = (x, y);

        // Vertical: if there is room to move, rubber-band at the edges.
        // The direction is inverted: exceeding the top bound pulls the
        // bottom edge into view, and vice versa.
        if bound.top != bound.bottom {
            if y < bound.top {
                self.listener.on_pull(bound.top - y, EdgeDirection::Bottom);
            } else if y > bound.bottom {
                self.listener.on_pull(y - bound.bottom, EdgeDirection::Top);
            }
        }
        y = y.clamp(bound.top, bound.bottom);

        // Horizontal: rubber-band when trying to scroll past the first or
        // last image.
        if !self.has_prev && x > bound.right {
            self.listener.on_pull(x - bound.right, EdgeDirection::Left);
            x = bound.right;
        } else if !self.has_next && x < bound.left {
            self.listener.on_pull(bound.left - x, EdgeDirection::Right);
            x = bound.left;
        }

        self.start_animation(x, y, scale, AnimKind::Scroll);
    }

    fn scroll_to_film(&mut self, x: i32, y: i32) {
        let scale = self.boxes.get(0).current_scale;
        let default_x = self.platform.default_x;

        let mut x = x - default_x;
        if !self.has_prev && x > 0 {
            self.listener.on_pull(x, EdgeDirection::Left);
            x = 0;
        } else if !self.has_next && x < 0 {
            self.listener.on_pull(-x, EdgeDirection::Right);
            x = 0;
        }
        x += default_x;

        self.start_animation(x, y, scale, AnimKind::Scroll);
    }

    /// Start a fling. Returns false if the fling is refused (image fits
    /// the view, velocity points into an edge, or already at the end of
    /// the strip in film mode).
    pub fn fling(&mut self, velocity_x: f32, velocity_y: f32) -> bool {
        let vx = round_pixel(velocity_x);
        let vy = round_pixel(velocity_y);
        if self.film_mode {
            self.fling_film(vx)
        } else {
            self.fling_page(vx, vy)
        }
    }

    fn fling_page(&mut self, velocity_x: i32, velocity_y: i32) -> bool {
        let b = *self.boxes.get(0);
        let view = self.shared_view();

        // Fling only makes sense when zoomed past the view in some axis.
        if view_wider_than_scaled(&view, b.image_w, b.current_scale)
            && view_taller_than_scaled(&view, b.image_h, b.current_scale)
        {
            return false;
        }

        // Only fling in directions that will not run off the picture.
        let edges = self.image_at_edges();
        let mut vx = velocity_x;
        let mut vy = velocity_y;
        if (vx > 0 && edges.left) || (vx < 0 && edges.right) {
            vx = 0;
        }
        if (vy > 0 && edges.top) || (vy < 0 && edges.bottom) {
            vy = 0;
        }
        if vx == 0 && vy == 0 {
            return false;
        }

        let bound = self.stable_bound(b.current_scale, 0);
        self.page_scroller.fling(
            self.platform.current_x,
            b.current_y,
            vx,
            vy,
            bound.left,
            bound.right,
            bound.top,
            bound.bottom,
        );
        let target_x = self.page_scroller.final_x();
        let target_y = self.page_scroller.final_y();
        let duration = self.page_scroller.duration_ms();
        self.start_animation_with_duration(
            target_x,
            target_y,
            b.current_scale,
            AnimKind::Fling,
            duration,
        );
        true
    }

    fn fling_film(&mut self, velocity_x: i32) -> bool {
        let b = *self.boxes.get(0);
        let default_x = self.platform.default_x;

        // Already resting against an end with no neighbor beyond it.
        if (!self.has_prev && self.platform.current_x >= default_x)
            || (!self.has_next && self.platform.current_x <= default_x)
        {
            return false;
        }
        if velocity_x == 0 {
            return false;
        }

        let now = self.clock.now_ms();
        self.film_scroller
            .fling(now, self.platform.current_x, velocity_x);
        let target_x = self.film_scroller.final_x();
        // Duration 0: termination is driven by the physics engine's own
        // finished flag, and progress is then trivially 1 every tick.
        self.start_animation_with_duration(
            target_x,
            b.current_y,
            b.current_scale,
            AnimKind::Fling,
            0,
        );
        true
    }

    ////////////////////////////////////////////////////////////////////////
    // Output
    ////////////////////////////////////////////////////////////////////////

    /// The absolute screen rectangle of the box at `index`, as of the most
    /// recent layout pass.
    pub fn get_position(&self, index: i32) -> Rect {
        *self.rects.get(index)
    }

    ////////////////////////////////////////////////////////////////////////
    // Public utilities
    ////////////////////////////////////////////////////////////////////////

    /// True when the focused image is (almost exactly) at its minimal scale.
    pub fn is_at_minimal_scale(&self) -> bool {
        let b = self.boxes.get(0);
        (b.current_scale - b.scale_min).abs() < SCALE_EPSILON
    }

    /// True when the focused box sits at the default position.
    pub fn is_center(&self) -> bool {
        self.platform.current_x == self.platform.default_x && self.boxes.get(0).current_y == 0
    }

    /// Source width of the focused image.
    pub fn image_width(&self) -> i32 {
        self.boxes.get(0).image_w
    }

    /// Source height of the focused image.
    pub fn image_height(&self) -> i32 {
        self.boxes.get(0).image_h
    }

    /// Current scale of the focused image.
    pub fn image_scale(&self) -> f32 {
        self.boxes.get(0).current_scale
    }

    /// Which view edges the focused image currently rests against.
    pub fn image_at_edges(&self) -> Edges {
        let b = self.boxes.get(0);
        let bound = self.stable_bound(b.current_scale, 0);
        Edges {
            // Platform at its left bound means the image's right edge is
            // showing, and so on around.
            right: self.platform.current_x <= bound.left,
            left: self.platform.current_x >= bound.right,
            bottom: b.current_y <= bound.top,
            top: b.current_y >= bound.bottom,
        }
    }

    /// True while the platform is still moving toward a target.
    pub fn is_scrolling(&self) -> bool {
        !self.platform.anim.is_idle() && self.platform.current_x != self.platform.to_x
    }

    /// Retarget the platform's animation to where it is right now.
    pub fn stop_scrolling(&mut self) {
        if self.platform.anim.is_idle() {
            return;
        }
        self.platform.from_x = self.platform.current_x;
        self.platform.to_x = self.platform.current_x;
    }

    ////////////////////////////////////////////////////////////////////////
    // Re-indexing
    ////////////////////////////////////////////////////////////////////////

    /// Re-map boxes and gaps after the focused item changed (focus moved,
    /// items inserted/deleted/reordered).
    ///
    /// `from_index[i]` gives, for each new index `i - BOX_MAX`, the old
    /// index that held the same logical item; `None` marks a box with no
    /// prior identity. Examples over the seven slots:
    ///
    /// ```text
    /// N  N  N  N  N  N  N   -- all new boxes
    /// -3 -2 -1  0  1  2  3  -- nothing changed
    /// -2 -1  0  1  2  3  N  -- focus moved to the next box
    /// N  -3 -2 -1  0  1  2  -- focus moved to the previous box
    /// -3 -2 -1  1  2  3  N  -- the focused box was deleted
    /// ```
    ///
    /// Surviving boxes keep their animation state and visual position;
    /// the platform's coordinate frame shifts so the focused box does not
    /// jump on screen.
    pub fn move_box(
        &mut self,
        from_index: &[Option<i32>],
        has_prev: bool,
        has_next: bool,
        constrained: bool,
    ) {
        debug_assert_eq!(from_index.len(), BOX_COUNT);
        self.has_prev = has_prev;
        self.has_next = has_next;

        // Out-of-range old indices are a caller contract violation: fail
        // fast in debug builds, degrade to "new box" in release.
        let mut from = [None; BOX_COUNT];
        for (slot, j) in from.iter_mut().zip(from_index.iter().copied()) {
            *slot = match j {
                Some(j) if (-BOX_MAX..=BOX_MAX).contains(&j) => Some(j),
                Some(j) => {
                    debug_assert!(false, "old index {j} outside the box window");
                    warn!(old_index = j, "re-index references an out-of-range old index; treating the box as new");
                    None
                }
                None => None,
            };
        }
        let from_at = |i: i32| from[(i + BOX_MAX) as usize];
        debug!(?from, has_prev, has_next, constrained, "move_box");

        let slot = |i: i32| (i + BOX_MAX) as usize;

        // 1. Capture the absolute X coordinate of every box center.
        self.layout_and_set_position();
        for i in -BOX_MAX..=BOX_MAX {
            let center = self.rects.get(i).center_x() - self.view_w / 2;
            self.boxes.get_mut(i).absolute_x = center;
        }

        // 2. Move boxes and gaps to temporary holding storage.
        let mut temp_boxes: Vec<Option<ImageBox>> =
            (-BOX_MAX..=BOX_MAX).map(|i| Some(*self.boxes.get(i))).collect();
        let mut temp_gaps: Vec<Option<Gap>> =
            (-BOX_MAX..BOX_MAX).map(|i| Some(*self.gaps.get(i))).collect();
        let mut new_boxes: Vec<Option<ImageBox>> = vec![None; BOX_COUNT];
        let mut new_gaps: Vec<Option<Gap>> = vec![None; BOX_COUNT - 1];

        // 3. Boxes used in the new arrangement glide over with their
        // animation state untouched.
        for i in -BOX_MAX..=BOX_MAX {
            if let Some(j) = from_at(i) {
                new_boxes[slot(i)] = temp_boxes[slot(j)].take();
            }
        }

        // 4. A gap survives only if both boxes around it stayed together
        // as an adjacent pair.
        for i in -BOX_MAX..BOX_MAX {
            if let (Some(j), Some(k)) = (from_at(i), from_at(i + 1)) {
                if j + 1 == k {
                    new_gaps[slot(i)] = temp_gaps[slot(j)].take();
                }
            }
        }

        // 5. Fill the remaining slots by scavenging leftover boxes in index
        // order; they are reinitialized below.
        let mut leftover_boxes = temp_boxes.into_iter().flatten();
        let mut recycled = Vec::new();
        for i in -BOX_MAX..=BOX_MAX {
            if new_boxes[slot(i)].is_none() {
                new_boxes[slot(i)] = leftover_boxes.next();
                recycled.push(i);
            }
        }
        debug_assert!(new_boxes.iter().all(Option::is_some));
        for i in -BOX_MAX..=BOX_MAX {
            *self.boxes.get_mut(i) = new_boxes[slot(i)].take().unwrap_or_default();
        }
        for &i in &recycled {
            self.init_box(i);
        }

        // 6. Give the recycled boxes a reasonable absolute X position.
        //
        // Find the first and last new index whose absolute X is known.
        let mut first = -BOX_MAX;
        while first <= BOX_MAX && from_at(first).is_none() {
            first += 1;
        }
        let mut last = BOX_MAX;
        while last >= -BOX_MAX && from_at(last).is_none() {
            last -= 1;
        }
        // If no position is known at all, anchor the focused box to the
        // platform.
        if first > BOX_MAX {
            self.boxes.get_mut(0).absolute_x = self.platform.current_x;
            first = 0;
            last = 0;
        }
        // Boxes strictly between first and last inherit the next known
        // box's position. (We could do better, but this is rare.) Boxes
        // outside that span get a default gap size below instead.
        let mut i = last - 1;
        while i > first {
            if from_at(i).is_none() {
                let next_x = self.boxes.get(i + 1).absolute_x;
                self.boxes.get_mut(i).absolute_x = next_x;
            }
            i -= 1;
        }

        // 7. Scavenge leftover gaps for the empty slots. Gaps flanked by
        // known positions get a size computed from the neighbor centers;
        // the rest get the standard default.
        let mut leftover_gaps = temp_gaps.into_iter().flatten();
        for i in -BOX_MAX..BOX_MAX {
            match new_gaps[slot(i)].take() {
                Some(g) => *self.gaps.get_mut(i) = g,
                None => {
                    *self.gaps.get_mut(i) = leftover_gaps.next().unwrap_or_default();
                    let a = self.boxes.get(i);
                    let b = self.boxes.get(i + 1);
                    let wa = scaled_width(a.image_w, a.current_scale);
                    let wb = scaled_width(b.image_w, b.current_scale);
                    if i >= first && i < last {
                        let size = b.absolute_x - a.absolute_x - wb / 2 - (wa - wa / 2);
                        self.init_gap_with_size(i, size);
                    } else {
                        self.init_gap(i);
                    }
                }
            }
        }

        // 8. Shift the platform's coordinate frame so the focused box's
        // screen position does not jump.
        let dx = self.boxes.get(0).absolute_x - self.platform.current_x;
        self.platform.current_x += dx;
        self.platform.from_x += dx;
        self.platform.to_x += dx;
        self.platform.fling_offset += dx;

        if self.constrained != constrained {
            self.constrained = constrained;
            self.update_platform_defaults();
            self.update_scale_and_gap_limit();
        }

        self.snap_and_redraw();
    }

    ////////////////////////////////////////////////////////////////////////
    // Layout
    ////////////////////////////////////////////////////////////////////////

    // Convert the platform/box/gap state into absolute rectangles. Boxes
    // hang off their anchor toward the focus, so the loop runs inside-out.
    fn layout_and_set_position(&mut self) {
        self.convert_box_to_rect(0);
        for i in 1..=BOX_MAX {
            self.convert_box_to_rect(i);
            self.convert_box_to_rect(-i);
        }
        if tracing::enabled!(tracing::Level::TRACE) {
            self.dump_state();
        }
    }

    fn convert_box_to_rect(&mut self, i: i32) {
        let b = *self.boxes.get(i);
        let y = b.current_y + self.platform.current_y + self.view_h / 2;
        let w = scaled_width(b.image_w, b.current_scale);
        let h = scaled_height(b.image_h, b.current_scale);
        let (left, right) = if i == 0 {
            let x = self.platform.current_x + self.view_w / 2;
            let left = x - w / 2;
            (left, left + w)
        } else if i > 0 {
            let anchor = *self.rects.get(i - 1);
            let gap = self.gaps.get(i - 1).current_gap;
            let left = anchor.right + gap;
            (left, left + w)
        } else {
            let anchor = *self.rects.get(i + 1);
            let gap = self.gaps.get(i).current_gap;
            let right = anchor.left - gap;
            (right - w, right)
        };
        let top = y - h / 2;
        self.rects.get_mut(i).set(left, top, right, top + h);
    }

    fn dump_state(&self) {
        for i in -BOX_MAX..BOX_MAX {
            trace!(gap = i, size = self.gaps.get(i).current_gap, "gap");
        }
        for i in -BOX_MAX..=BOX_MAX {
            let r = self.rects.get(i);
            trace!(
                index = i,
                center_x = r.center_x(),
                center_y = r.center_y(),
                width = r.width(),
                height = r.height(),
                "rect"
            );
        }
        for i in -BOX_MAX..=BOX_MAX {
            for j in (i + 1)..=BOX_MAX {
                if self.rects.get(i).intersects(self.rects.get(j)) {
                    trace!(a = i, b = j, "rects intersect");
                }
            }
        }
    }

    ////////////////////////////////////////////////////////////////////////
    // Internals
    ////////////////////////////////////////////////////////////////////////

    fn redraw(&mut self) {
        self.layout_and_set_position();
        self.listener.invalidate();
    }

    fn snap_and_redraw(&mut self) {
        self.with_platform(|p, env| p.start_snapback(env));
        for i in -BOX_MAX..=BOX_MAX {
            self.with_box(i, |b, env| b.start_snapback(env));
        }
        for i in -BOX_MAX..BOX_MAX {
            self.with_gap(i, |g, env| g.start_snapback(env));
        }
        self.redraw();
    }

    fn start_animation(&mut self, target_x: i32, target_y: i32, target_scale: f32, kind: AnimKind) {
        self.start_animation_with_duration(
            target_x,
            target_y,
            target_scale,
            kind,
            kind.base_duration_ms(),
        );
    }

    fn start_animation_with_duration(
        &mut self,
        target_x: i32,
        target_y: i32,
        target_scale: f32,
        kind: AnimKind,
        duration_ms: u32,
    ) {
        let default_y = self.platform.default_y;
        let platform_changed = self.with_platform(|p, env| {
            p.do_animation(env, target_x, default_y, kind, duration_ms)
        });
        let box_changed = self.with_box(0, |b, env| {
            b.do_animation(env, target_y, target_scale, kind, duration_ms)
        });
        if platform_changed || box_changed {
            self.redraw();
        }
    }

    fn shared_view(&self) -> SharedView {
        SharedView {
            view_w: self.view_w,
            view_h: self.view_h,
            film_mode: self.film_mode,
        }
    }

    fn focused_snapshot(&self) -> FocusedBox {
        let b = self.boxes.get(0);
        FocusedBox {
            image_w: b.image_w,
            image_h: b.image_h,
            current_scale: b.current_scale,
            scale_min: b.scale_min,
            scale_max: b.scale_max,
        }
    }

    fn stable_bound(&self, scale: f32, horizontal_slack: i32) -> StableBound {
        let b = self.boxes.get(0);
        calculate_stable_bound(
            &self.shared_view(),
            b.image_w,
            b.image_h,
            scale,
            horizontal_slack,
            self.platform.default_x,
        )
    }

    fn with_platform<R>(&mut self, f: impl FnOnce(&mut Platform, &mut PlatformEnv<'_>) -> R) -> R {
        let view = self.shared_view();
        let focused = self.focused_snapshot();
        let Self {
            platform,
            listener,
            clock,
            page_scroller,
            film_scroller,
            cfg,
            has_prev,
            has_next,
            extra_scaling_range,
            ..
        } = self;
        let mut env = PlatformEnv {
            view,
            focused,
            has_prev: *has_prev,
            has_next: *has_next,
            extra_scaling_range: *extra_scaling_range,
            horizontal_slack: cfg.horizontal_slack,
            scale_min_extra: cfg.scale_min_extra,
            scale_max_extra: cfg.scale_max_extra,
            listener: listener.as_mut(),
            clock: clock.as_mut(),
            page: page_scroller.as_mut(),
            film: film_scroller.as_mut(),
        };
        f(platform, &mut env)
    }

    fn with_box<R>(
        &mut self,
        index: i32,
        f: impl FnOnce(&mut ImageBox, &mut BoxEnv<'_>) -> R,
    ) -> R {
        let view = self.shared_view();
        let focused = self.focused_snapshot();
        let platform_default_x = self.platform.default_x;
        let Self {
            boxes,
            listener,
            clock,
            page_scroller,
            cfg,
            in_scale,
            extra_scaling_range,
            ..
        } = self;
        let mut env = BoxEnv {
            view,
            focused,
            is_focused: index == 0,
            in_scale: *in_scale,
            extra_scaling_range: *extra_scaling_range,
            horizontal_slack: cfg.horizontal_slack,
            scale_min_extra: cfg.scale_min_extra,
            scale_max_extra: cfg.scale_max_extra,
            platform_default_x,
            listener: listener.as_mut(),
            clock: clock.as_mut(),
            page: page_scroller.as_mut(),
        };
        f(boxes.get_mut(index), &mut env)
    }

    fn with_gap<R>(&mut self, index: i32, f: impl FnOnce(&mut Gap, &mut GapEnv<'_>) -> R) -> R {
        let Self { gaps, clock, .. } = self;
        let mut env = GapEnv {
            clock: clock.as_mut(),
        };
        f(gaps.get_mut(index), &mut env)
    }

    fn update_platform_defaults(&mut self) {
        self.platform.update_default_xy(
            self.constrained,
            &self.constrained_frame,
            self.view_w,
            self.view_h,
            self.film_mode,
        );
    }

    // Initialize the platform to rest at the default position.
    fn init_platform(&mut self) {
        self.update_platform_defaults();
        self.platform.current_x = self.platform.default_x;
        self.platform.current_y = self.platform.default_y;
        self.platform.anim.halt();
    }

    // Initialize a box to have the size of the view.
    fn init_box(&mut self, index: i32) {
        let (view_w, view_h) = (self.view_w, self.view_h);
        {
            let b = self.boxes.get_mut(index);
            b.image_w = view_w;
            b.image_h = view_h;
            b.use_view_size = true;
        }
        let (scale_min, scale_max) = {
            let b = self.boxes.get(index);
            (
                self.minimal_scale_for(b, index == 0),
                self.maximal_scale_for(b, index == 0),
            )
        };
        let b = self.boxes.get_mut(index);
        b.scale_min = scale_min;
        b.scale_max = scale_max;
        b.current_y = 0;
        b.current_scale = scale_min;
        b.anim.halt();
    }

    // Initialize a gap to its default size. Only valid once the boxes
    // around it are initialized.
    fn init_gap(&mut self, index: i32) {
        let size = self.default_gap_size(index);
        let g = self.gaps.get_mut(index);
        g.default_size = size;
        g.current_gap = size;
        g.anim.halt();
    }

    fn init_gap_with_size(&mut self, index: i32, size: i32) {
        let default_size = self.default_gap_size(index);
        let g = self.gaps.get_mut(index);
        g.default_size = default_size;
        g.current_gap = size;
        g.anim.halt();
    }

    // Called whenever the scale range of boxes or the default gap size may
    // change: view size, image size, film mode, constrained state or frame.
    fn update_scale_and_gap_limit(&mut self) {
        for i in -BOX_MAX..=BOX_MAX {
            let (scale_min, scale_max) = {
                let b = self.boxes.get(i);
                (
                    self.minimal_scale_for(b, i == 0),
                    self.maximal_scale_for(b, i == 0),
                )
            };
            let b = self.boxes.get_mut(i);
            b.scale_min = scale_min;
            b.scale_max = scale_max;
        }
        for i in -BOX_MAX..BOX_MAX {
            let size = self.default_gap_size(i);
            self.gaps.get_mut(i).default_size = size;
        }
    }

    // Minimal scale for a box: fit the frame (full view, constrained frame
    // for the focused box, or the film-mode envelope), capped at the
    // absolute scale ceiling.
    fn minimal_scale_for(&self, b: &ImageBox, focused: bool) -> f32 {
        let (frame_w, frame_h) = if !self.film_mode
            && self.constrained
            && !self.constrained_frame.is_empty()
            && focused
        {
            (self.constrained_frame.width(), self.constrained_frame.height())
        } else {
            (self.view_w, self.view_h)
        };

        let (w_factor, h_factor) = if self.film_mode {
            if self.view_h > self.view_w {
                // portrait
                (self.cfg.film_portrait_width, self.cfg.film_portrait_height)
            } else {
                // landscape
                (self.cfg.film_landscape_width, self.cfg.film_landscape_height)
            }
        } else {
            (1.0, 1.0)
        };

        let s = (w_factor * frame_w as f32 / b.image_w as f32)
            .min(h_factor * frame_h as f32 / b.image_h as f32);
        s.min(self.cfg.scale_limit)
    }

    // Film mode always shows the whole image: no zooming above minimal.
    fn maximal_scale_for(&self, b: &ImageBox, focused: bool) -> f32 {
        if self.film_mode {
            self.minimal_scale_for(b, focused)
        } else {
            self.cfg.scale_limit
        }
    }

    // The space between a box's edge and the view edge when the box is at
    // its minimal scale, centered:
    //
    //   previous             current             next
    //  ___________       ________________     __________
    // |  _______  |     |   __________   |   |  ______  |
    // | |       | |     |  |   right->|  |   | |      | |
    // | |       |<-------->|<--left   |  |   | |      | |
    // | |_______| |  |  |  |__________|  |   | |______| |
    // |___________|  |  |________________|   |__________|
    //                |  <--> gap_to_side()
    //                |
    // image_gap + max(gap_to_side(previous), gap_to_side(current))
    fn gap_to_side(&self, b: &ImageBox, focused: bool) -> i32 {
        let scale = self.minimal_scale_for(b, focused);
        ((self.view_w as f32 - scale * b.image_w as f32) / 2.0 + 0.5) as i32
    }

    fn default_gap_size(&self, index: i32) -> i32 {
        if self.film_mode {
            return self.cfg.image_gap;
        }
        let a = self.boxes.get(index);
        let b = self.boxes.get(index + 1);
        self.cfg.image_gap
            + self
                .gap_to_side(a, index == 0)
                .max(self.gap_to_side(b, index + 1 == 0))
    }

    // Resize a box, rescaling its animation state by the old/new ratio.
    // Returns false if nothing changed.
    fn set_box_size(&mut self, index: i32, width: i32, height: i32, is_view_size: bool) -> bool {
        let (was_view_size, old_w, old_h) = {
            let b = self.boxes.get(index);
            (b.use_view_size, b.image_w, b.image_h)
        };

        // Once a real image size is known, the view size no longer applies.
        if !was_view_size && is_view_size {
            return false;
        }
        self.boxes.get_mut(index).use_view_size = is_view_size;

        if width == old_w && height == old_h {
            return false;
        }

        // The ratio of the old size and the new size.
        let ratio = (old_w as f32 / width as f32).min(old_h as f32 / height as f32);

        {
            let b = self.boxes.get_mut(index);
            b.image_w = width;
            b.image_h = height;
        }

        if was_view_size && !is_view_size {
            // First real image size: replace the scale directly.
            let scale_min = {
                let b = self.boxes.get(index);
                self.minimal_scale_for(b, index == 0)
            };
            let b = self.boxes.get_mut(index);
            b.current_scale = scale_min;
            b.anim.halt();
        } else {
            // Adjust the scales by the ratio; snap-back animates them into
            // the min/max bounds if necessary.
            let b = self.boxes.get_mut(index);
            b.current_scale *= ratio;
            b.from_scale *= ratio;
            b.to_scale *= ratio;
        }

        if index == 0 {
            self.focus_x /= ratio;
            self.focus_y /= ratio;
        }

        true
    }

    fn start_opening_animation_if_needed(&mut self) {
        let Some(r) = self.open_animation_rect else {
            return;
        };
        if self.boxes.get(0).use_view_size {
            return;
        }
        self.open_animation_rect = None;

        // Start from the supplied screen rectangle.
        self.platform.current_x = r.center_x() - self.view_w / 2;
        {
            let b = self.boxes.get_mut(0);
            b.current_y = r.center_y() - self.view_h / 2;
            b.current_scale = (r.width() as f32 / b.image_w as f32)
                .max(r.height() as f32 / b.image_h as f32);
        }
        let (default_x, scale_min) = (self.platform.default_x, self.boxes.get(0).scale_min);
        self.start_animation(default_x, 0, scale_min, AnimKind::Opening);
    }

    // While an animation runs toward a target (other than snap-back and
    // fling, which are retargeted freely), scroll deltas compose against
    // the target instead of the current value.
    fn use_current_as_target(anim: &AnimationState) -> bool {
        anim.is_idle() || anim.kind == AnimKind::Snapback || anim.kind == AnimKind::Fling
    }

    fn target_x_of_platform(&self) -> i32 {
        if Self::use_current_as_target(&self.platform.anim) {
            self.platform.current_x
        } else {
            self.platform.to_x
        }
    }

    fn target_y_of_focused(&self) -> i32 {
        let b = self.boxes.get(0);
        if Self::use_current_as_target(&b.anim) {
            b.current_y
        } else {
            b.to_y
        }
    }

    fn target_scale_of_focused(&self) -> f32 {
        let b = self.boxes.get(0);
        if Self::use_current_as_target(&b.anim) {
            b.current_scale
        } else {
            b.to_scale
        }
    }
}

// Round a pixel value the way the layout math expects: half-up for
// positive values, truncating toward zero like the integer casts the
// formulas were written for.
fn round_pixel(v: f32) -> i32 {
    (v + 0.5) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullListener;

    impl Listener for NullListener {
        fn invalidate(&mut self) {}

        fn is_holding(&self) -> bool {
            false
        }
    }

    fn controller() -> PositionController {
        PositionController::new(Box::new(NullListener))
    }

    #[test]
    fn initial_layout_centers_focused_box() {
        let mut c = controller();
        c.move_box(
            &[None, None, None, Some(0), None, None, None],
            false,
            false,
            true,
        );
        let r = c.get_position(0);
        // View-sized box at scale 1 fills the 640x480 default view.
        assert_eq!(r.center_x(), 320);
        assert_eq!(r.center_y(), 240);
        assert_eq!(r.width(), 640);
        assert_eq!(r.height(), 480);
    }

    #[test]
    fn neighbors_chain_outward_through_gaps() {
        let c = {
            let mut c = controller();
            c.move_box(
                &[None, None, None, Some(0), None, None, None],
                true,
                true,
                true,
            );
            c
        };
        let focused = c.get_position(0);
        let next = c.get_position(1);
        let prev = c.get_position(-1);
        let gap_right = c.gaps.get(0).current_gap;
        let gap_left = c.gaps.get(-1).current_gap;
        assert_eq!(next.left, focused.right + gap_right);
        assert_eq!(prev.right, focused.left - gap_left);
    }

    #[test]
    fn default_gap_uses_widest_side_margin() {
        let mut c = controller();
        // Focused image narrower than the view at minimal scale leaves side
        // margin; the gap absorbs the larger of the two sides.
        c.set_image_size(0, 320, 480, false);
        let g = c.default_gap_size(0);
        assert!(g > c.cfg.image_gap, "gap {g} should exceed the base margin");
    }

    #[test]
    fn film_mode_uses_fixed_gap() {
        let mut c = controller();
        c.set_film_mode(true);
        assert_eq!(c.default_gap_size(0), c.cfg.image_gap);
    }

    #[test]
    fn scroll_composes_against_target() {
        let mut c = controller();
        c.move_box(
            &[None, None, None, Some(0), None, None, None],
            true,
            true,
            true,
        );
        // Zoom in so there is room to scroll.
        c.set_image_size(0, 2560, 1920, false);
        c.zoom_in(320.0, 240.0, 4.0);
        c.skip_animation();

        let x0 = c.platform.current_x;
        c.start_scroll(30.0, 0.0);
        c.start_scroll(30.0, 0.0);
        // Scroll animations have zero duration; the target reflects both
        // deltas even before any tick.
        assert_eq!(c.platform.current_x, x0 + 60);
    }

    #[test]
    fn stop_scrolling_freezes_target() {
        let mut c = controller();
        c.set_image_size(0, 2560, 1920, false);
        c.zoom_in(0.0, 0.0, 4.0);
        assert!(c.is_scrolling());
        c.stop_scrolling();
        assert_eq!(c.platform.to_x, c.platform.current_x);
        assert!(!c.is_scrolling());
    }
}
