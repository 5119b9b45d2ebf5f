//! Platform: the shared horizontal (and baseline vertical) anchor.
//!
//! Every box is laid out relative to the platform; the focused box centers
//! at its `(current_x, current_y)`. The platform owns the default-position
//! computation for constrained frames and the paged/film snap-back policy,
//! and is the entity a horizontal fling drives.

use filmstrip_model::{EdgeDirection, Rect};

use crate::animatable::{Animatable, AnimationState, FocusedBox, SharedView};
use crate::bound::calculate_stable_bound;
use crate::controller::Listener;
use crate::curve::{AnimKind, capture_slide};
use crate::physics::{FilmFlingPhysics, PageFlingPhysics};
use crate::time::AnimationClock;

/// Everything the platform reads or signals outside itself during a tick.
pub(crate) struct PlatformEnv<'a> {
    pub view: SharedView,
    pub focused: FocusedBox,
    pub has_prev: bool,
    pub has_next: bool,
    pub extra_scaling_range: bool,
    pub horizontal_slack: i32,
    pub scale_min_extra: f32,
    pub scale_max_extra: f32,
    pub listener: &'a mut dyn Listener,
    pub clock: &'a mut dyn AnimationClock,
    pub page: &'a mut dyn PageFlingPhysics,
    pub film: &'a mut dyn FilmFlingPhysics,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Platform {
    pub anim: AnimationState,
    pub current_x: i32,
    pub from_x: i32,
    pub to_x: i32,
    pub default_x: i32,
    pub current_y: i32,
    pub from_y: i32,
    pub to_y: i32,
    pub default_y: i32,
    /// Accumulator added to the film physics output after re-indexing
    /// shifts the platform's coordinate frame mid-fling.
    pub fling_offset: i32,
}

impl Platform {
    /// Recompute the default position. Must be called whenever the
    /// constrained flag, constrained frame, view size or film mode changes.
    ///
    /// The film-mode check is deliberately absent for `default_x`: if it
    /// returned 0 in film mode, leaving film mode because we are centered
    /// would immediately re-enter it because we no longer are.
    pub fn update_default_xy(
        &mut self,
        constrained: bool,
        frame: &Rect,
        view_w: i32,
        view_h: i32,
        film_mode: bool,
    ) {
        if constrained && !frame.is_empty() {
            self.default_x = frame.center_x() - view_w / 2;
            self.default_y = if film_mode {
                0
            } else {
                frame.center_y() - view_h / 2
            };
        } else {
            self.default_x = 0;
            self.default_y = 0;
        }
    }

    /// Start an animation toward the target, unless already there.
    pub fn do_animation(
        &mut self,
        env: &mut PlatformEnv<'_>,
        target_x: i32,
        target_y: i32,
        kind: AnimKind,
        duration_ms: u32,
    ) -> bool {
        if self.current_x == target_x && self.current_y == target_y {
            return false;
        }
        self.from_x = self.current_x;
        self.from_y = self.current_y;
        self.to_x = target_x;
        self.to_y = target_y;
        let start = env.clock.start_time_ms();
        self.anim.begin(kind, duration_ms, start);
        self.fling_offset = 0;
        self.advance_animation(env, start);
        true
    }

    fn interpolate_fling_film(&mut self, env: &mut PlatformEnv<'_>, now_ms: u64) -> bool {
        env.film.compute_scroll_offset(now_ms);
        self.current_x = env.film.curr_x() + self.fling_offset;

        // Overshooting the default position with no neighbor on that side
        // means the fling ran off the end of the strip: absorb it.
        let dir = if self.current_x < self.default_x && !env.has_next {
            Some(EdgeDirection::Right)
        } else if self.current_x > self.default_x && !env.has_prev {
            Some(EdgeDirection::Left)
        } else {
            None
        };
        if let Some(dir) = dir {
            let velocity = (env.film.curr_velocity() + 0.5) as i32;
            env.listener.on_absorb(velocity, dir);
            env.film.force_finished();
            self.current_x = self.default_x;
        }
        env.film.is_finished()
    }

    fn interpolate_fling_page(&mut self, env: &mut PlatformEnv<'_>, progress: f32) -> bool {
        env.page.compute_scroll_offset(progress);
        let bound = calculate_stable_bound(
            &env.view,
            env.focused.image_w,
            env.focused.image_h,
            env.focused.current_scale,
            0,
            self.default_x,
        );

        let old_x = self.current_x;
        self.current_x = env.page.curr_x();

        // Report the moment the trajectory lands on a bound.
        if old_x > bound.left && self.current_x == bound.left {
            let velocity = (-env.page.curr_velocity_x() + 0.5) as i32;
            env.listener.on_absorb(velocity, EdgeDirection::Right);
        } else if old_x < bound.right && self.current_x == bound.right {
            let velocity = (env.page.curr_velocity_x() + 0.5) as i32;
            env.listener.on_absorb(velocity, EdgeDirection::Left);
        }

        progress >= 1.0
    }

    fn interpolate_linear(&mut self, progress: f32) -> bool {
        if progress >= 1.0 {
            self.current_x = self.to_x;
            self.current_y = self.to_y;
            return true;
        }
        let p = if self.anim.kind == AnimKind::Capture {
            capture_slide(progress)
        } else {
            progress
        };
        self.current_x = (self.from_x as f32 + p * (self.to_x - self.from_x) as f32) as i32;
        self.current_y = (self.from_y as f32 + p * (self.to_y - self.from_y) as f32) as i32;
        if self.anim.kind == AnimKind::Capture {
            // Capture's top-level duration governs termination.
            false
        } else {
            self.current_x == self.to_x && self.current_y == self.to_y
        }
    }
}

impl Animatable for Platform {
    type Env<'a> = PlatformEnv<'a>;

    fn state(&self) -> &AnimationState {
        &self.anim
    }

    fn state_mut(&mut self) -> &mut AnimationState {
        &mut self.anim
    }

    fn interpolate(&mut self, env: &mut PlatformEnv<'_>, now_ms: u64, progress: f32) -> bool {
        if self.anim.kind == AnimKind::Fling {
            if env.view.film_mode {
                self.interpolate_fling_film(env, now_ms)
            } else {
                self.interpolate_fling_page(env, progress)
            }
        } else {
            self.interpolate_linear(progress)
        }
    }

    fn start_snapback(&mut self, env: &mut PlatformEnv<'_>) -> bool {
        if !self.anim.is_idle() {
            return false;
        }
        if self.anim.kind == AnimKind::Scroll && env.listener.is_holding() {
            return false;
        }

        let (scale_min, scale_max) = if env.extra_scaling_range {
            (
                env.focused.scale_min * env.scale_min_extra,
                env.focused.scale_max * env.scale_max_extra,
            )
        } else {
            (env.focused.scale_min, env.focused.scale_max)
        };
        let scale = env.focused.current_scale.clamp(scale_min, scale_max);

        let mut x = self.current_x;
        let y = self.default_y;
        if env.view.film_mode {
            if !env.has_next {
                x = x.max(self.default_x);
            }
            if !env.has_prev {
                x = x.min(self.default_x);
            }
        } else {
            let bound = calculate_stable_bound(
                &env.view,
                env.focused.image_w,
                env.focused.image_h,
                scale,
                env.horizontal_slack,
                self.default_x,
            );
            x = x.clamp(bound.left, bound.right);
        }

        if self.current_x != x || self.current_y != y {
            self.do_animation(
                env,
                x,
                y,
                AnimKind::Snapback,
                AnimKind::Snapback.base_duration_ms(),
            )
        } else {
            false
        }
    }
}
