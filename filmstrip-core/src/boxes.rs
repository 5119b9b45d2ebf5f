//! Box: one picture's vertical offset and scale.
//!
//! A box's horizontal position is implicit: it is defined by the platform
//! and the gaps chaining outward from the focused box. The box itself only
//! animates its vertical offset (relative to the view center) and its scale.

use filmstrip_model::EdgeDirection;

use crate::animatable::{Animatable, AnimationState, FocusedBox, SharedView};
use crate::bound::{calculate_stable_bound, view_taller_than_scaled};
use crate::controller::Listener;
use crate::curve::{AnimKind, capture_scale};
use crate::physics::PageFlingPhysics;
use crate::time::AnimationClock;

/// Everything a box reads or signals outside itself during a tick.
pub(crate) struct BoxEnv<'a> {
    pub view: SharedView,
    /// Snapshot of the focused box; equals this box's own values when the
    /// box being driven is the focused one.
    pub focused: FocusedBox,
    pub is_focused: bool,
    pub in_scale: bool,
    pub extra_scaling_range: bool,
    pub horizontal_slack: i32,
    pub scale_min_extra: f32,
    pub scale_max_extra: f32,
    pub platform_default_x: i32,
    pub listener: &'a mut dyn Listener,
    pub clock: &'a mut dyn AnimationClock,
    pub page: &'a mut dyn PageFlingPhysics,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ImageBox {
    pub anim: AnimationState,

    /// Source bitmap dimensions; the view size until the real size arrives.
    pub image_w: i32,
    pub image_h: i32,

    /// True while `image_w/h` still hold the view size. Also doubles as
    /// "no real image ready to show yet".
    pub use_view_size: bool,

    pub scale_min: f32,
    pub scale_max: f32,

    /// Vertical offset of the box center from the view center.
    pub current_y: i32,
    pub from_y: i32,
    pub to_y: i32,

    pub current_scale: f32,
    pub from_scale: f32,
    pub to_scale: f32,

    /// Absolute X of the box center; only meaningful during re-indexing.
    pub absolute_x: i32,
}

impl Default for ImageBox {
    fn default() -> Self {
        Self {
            anim: AnimationState::default(),
            image_w: 0,
            image_h: 0,
            use_view_size: true,
            scale_min: 1.0,
            scale_max: 1.0,
            current_y: 0,
            from_y: 0,
            to_y: 0,
            current_scale: 1.0,
            from_scale: 1.0,
            to_scale: 1.0,
            absolute_x: 0,
        }
    }
}

impl ImageBox {
    /// Start an animation toward the target, unless already there.
    ///
    /// The target scale is clamped to the gesture overshoot range. If the
    /// scaled image is shorter than the view, the vertical target is forced
    /// to center (height only; horizontal stays free so the user can peek
    /// at neighbors).
    pub fn do_animation(
        &mut self,
        env: &mut BoxEnv<'_>,
        target_y: i32,
        target_scale: f32,
        kind: AnimKind,
        duration_ms: u32,
    ) -> bool {
        let target_scale = target_scale.clamp(
            env.scale_min_extra * self.scale_min,
            env.scale_max_extra * self.scale_max,
        );

        let mut target_y = target_y;
        if !env.in_scale
            && view_taller_than_scaled(&env.view, env.focused.image_h, target_scale)
        {
            target_y = 0;
        }

        if self.current_y == target_y
            && self.current_scale == target_scale
            && kind != AnimKind::Capture
        {
            return false;
        }

        self.from_y = self.current_y;
        self.from_scale = self.current_scale;
        self.to_y = target_y;
        self.to_scale = target_scale;
        let start = env.clock.start_time_ms();
        self.anim.begin(kind, duration_ms, start);
        self.advance_animation(env, start);
        true
    }

    fn interpolate_fling_page(&mut self, env: &mut BoxEnv<'_>, progress: f32) -> bool {
        env.page.compute_scroll_offset(progress);
        let bound = calculate_stable_bound(
            &env.view,
            self.image_w,
            self.image_h,
            self.current_scale,
            0,
            env.platform_default_x,
        );

        let old_y = self.current_y;
        self.current_y = env.page.curr_y();

        // Report the moment the trajectory lands on a bound.
        if old_y > bound.top && self.current_y == bound.top {
            let velocity = (-env.page.curr_velocity_y() + 0.5) as i32;
            env.listener.on_absorb(velocity, EdgeDirection::Bottom);
        } else if old_y < bound.bottom && self.current_y == bound.bottom {
            let velocity = (env.page.curr_velocity_y() + 0.5) as i32;
            env.listener.on_absorb(velocity, EdgeDirection::Top);
        }

        progress >= 1.0
    }

    fn interpolate_linear(&mut self, progress: f32) -> bool {
        if progress >= 1.0 {
            self.current_y = self.to_y;
            self.current_scale = self.to_scale;
            return true;
        }
        self.current_y = (self.from_y as f32 + progress * (self.to_y - self.from_y) as f32) as i32;
        self.current_scale = self.from_scale + progress * (self.to_scale - self.from_scale);
        if self.anim.kind == AnimKind::Capture {
            self.current_scale *= capture_scale(progress);
            // Capture's top-level duration governs termination.
            false
        } else {
            self.current_y == self.to_y && self.current_scale == self.to_scale
        }
    }
}

impl Animatable for ImageBox {
    type Env<'a> = BoxEnv<'a>;

    fn state(&self) -> &AnimationState {
        &self.anim
    }

    fn state_mut(&mut self) -> &mut AnimationState {
        &mut self.anim
    }

    fn interpolate(&mut self, env: &mut BoxEnv<'_>, _now_ms: u64, progress: f32) -> bool {
        if self.anim.kind == AnimKind::Fling {
            // A box can only be flung in page mode.
            self.interpolate_fling_page(env, progress)
        } else {
            self.interpolate_linear(progress)
        }
    }

    fn start_snapback(&mut self, env: &mut BoxEnv<'_>) -> bool {
        if !self.anim.is_idle() {
            return false;
        }
        if self.anim.kind == AnimKind::Scroll && env.listener.is_holding() {
            return false;
        }
        if env.in_scale && env.is_focused {
            return false;
        }

        let (y, scale);
        if env.is_focused {
            let (scale_min, scale_max) = if env.extra_scaling_range {
                (
                    self.scale_min * env.scale_min_extra,
                    self.scale_max * env.scale_max_extra,
                )
            } else {
                (self.scale_min, self.scale_max)
            };
            scale = self.current_scale.clamp(scale_min, scale_max);
            if env.view.film_mode {
                y = 0;
            } else {
                let bound = calculate_stable_bound(
                    &env.view,
                    self.image_w,
                    self.image_h,
                    scale,
                    env.horizontal_slack,
                    env.platform_default_x,
                );
                y = self.current_y.clamp(bound.top, bound.bottom);
            }
        } else {
            y = 0;
            scale = self.scale_min;
        }

        if self.current_y != y || self.current_scale != scale {
            self.do_animation(
                env,
                y,
                scale,
                AnimKind::Snapback,
                AnimKind::Snapback.base_duration_ms(),
            )
        } else {
            false
        }
    }
}
