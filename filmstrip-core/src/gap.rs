//! Gap: the animated spacing between two horizontally adjacent boxes.

use crate::animatable::{Animatable, AnimationState};
use crate::curve::{AnimKind, capture_scale};
use crate::time::AnimationClock;

/// A gap only needs the clock from the outside; its snap-back target is
/// always its own default size.
pub(crate) struct GapEnv<'a> {
    pub clock: &'a mut dyn AnimationClock,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Gap {
    pub anim: AnimationState,

    /// Default size between the two neighboring boxes; varies with their
    /// image sizes and with page/film mode.
    pub default_size: i32,

    pub current_gap: i32,
    pub from_gap: i32,
    pub to_gap: i32,
}

impl Gap {
    /// Start an animation toward the target size, unless already there.
    pub fn do_animation(
        &mut self,
        env: &mut GapEnv<'_>,
        target_size: i32,
        kind: AnimKind,
        duration_ms: u32,
    ) -> bool {
        if self.current_gap == target_size && kind != AnimKind::Capture {
            return false;
        }
        self.from_gap = self.current_gap;
        self.to_gap = target_size;
        let start = env.clock.start_time_ms();
        self.anim.begin(kind, duration_ms, start);
        self.advance_animation(env, start);
        true
    }
}

impl Animatable for Gap {
    type Env<'a> = GapEnv<'a>;

    fn state(&self) -> &AnimationState {
        &self.anim
    }

    fn state_mut(&mut self) -> &mut AnimationState {
        &mut self.anim
    }

    fn interpolate(&mut self, _env: &mut GapEnv<'_>, _now_ms: u64, progress: f32) -> bool {
        if progress >= 1.0 {
            self.current_gap = self.to_gap;
            return true;
        }
        self.current_gap =
            (self.from_gap as f32 + progress * (self.to_gap - self.from_gap) as f32) as i32;
        if self.anim.kind == AnimKind::Capture {
            self.current_gap = (self.current_gap as f32 * capture_scale(progress)) as i32;
            // Capture's top-level duration governs termination.
            false
        } else {
            self.current_gap == self.to_gap
        }
    }

    fn start_snapback(&mut self, env: &mut GapEnv<'_>) -> bool {
        if !self.anim.is_idle() {
            return false;
        }
        self.do_animation(
            env,
            self.default_size,
            AnimKind::Snapback,
            AnimKind::Snapback.base_duration_ms(),
        )
    }
}
