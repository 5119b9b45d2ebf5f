//! The shared animation lifecycle of Platform, Box and Gap.
//!
//! Every animated entity runs the same state machine: idle, running toward a
//! target over a fixed duration, and a one-tick "finishing" stage that gives
//! the entity a chance to chain a corrective snap-back before going idle.
//! The entity-specific pieces (which scalars to interpolate, what the stable
//! target is) live in the `interpolate`/`start_snapback` hooks; everything
//! they need from the rest of the controller is handed in as an explicit
//! environment value, never reached through shared state.

use crate::curve::AnimKind;

/// Lifecycle stage of an entity's animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AnimationTimer {
    /// No animation running.
    Idle,
    /// The last interpolation reached its target; the next tick resolves
    /// whether a snap-back must chain before returning to idle.
    Finishing,
    /// Running since the contained clock timestamp.
    Running(u64),
}

/// Timer, kind and duration of the current (or most recent) animation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AnimationState {
    pub timer: AnimationTimer,
    pub kind: AnimKind,
    pub duration_ms: u32,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            timer: AnimationTimer::Idle,
            kind: AnimKind::Snapback,
            duration_ms: 0,
        }
    }
}

impl AnimationState {
    pub fn is_idle(&self) -> bool {
        self.timer == AnimationTimer::Idle
    }

    /// Begin a new animation, discarding whatever was running.
    pub fn begin(&mut self, kind: AnimKind, duration_ms: u32, start_ms: u64) {
        self.kind = kind;
        self.duration_ms = duration_ms;
        self.timer = AnimationTimer::Running(start_ms);
    }

    /// Freeze in place: clear the timer without touching current values.
    pub fn halt(&mut self) {
        self.timer = AnimationTimer::Idle;
    }
}

/// Read-only view geometry shared by all entities during a tick.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SharedView {
    pub view_w: i32,
    pub view_h: i32,
    pub film_mode: bool,
}

/// Snapshot of the focused box taken before advancing an entity that needs
/// to read it (stable bounds, vertical-centering checks).
#[derive(Debug, Clone, Copy)]
pub(crate) struct FocusedBox {
    pub image_w: i32,
    pub image_h: i32,
    pub current_scale: f32,
    pub scale_min: f32,
    pub scale_max: f32,
}

/// An entity driven by the per-tick animation advance.
pub(crate) trait Animatable {
    /// Everything the entity reads or signals outside itself.
    type Env<'a>;

    fn state(&self) -> &AnimationState;
    fn state_mut(&mut self) -> &mut AnimationState;

    /// Apply the eased progress to the entity's scalars. Returns true when
    /// the animation has reached its target (or the physics engine says so).
    fn interpolate(&mut self, env: &mut Self::Env<'_>, now_ms: u64, progress: f32) -> bool;

    /// Start a corrective animation toward the nearest stable state if the
    /// current value is out of bounds. Returns true if one was started.
    fn start_snapback(&mut self, env: &mut Self::Env<'_>) -> bool;

    /// Advance one tick. Returns true if anything visible changed.
    fn advance_animation(&mut self, env: &mut Self::Env<'_>, now_ms: u64) -> bool {
        match self.state().timer {
            AnimationTimer::Idle => false,
            AnimationTimer::Finishing => {
                self.state_mut().timer = AnimationTimer::Idle;
                self.start_snapback(env)
            }
            AnimationTimer::Running(start_ms) => {
                let state = self.state();
                let raw = if state.duration_ms == 0 {
                    1.0
                } else {
                    now_ms.saturating_sub(start_ms) as f32 / state.duration_ms as f32
                };
                let progress = if raw >= 1.0 {
                    1.0
                } else {
                    state.kind.apply(raw)
                };
                let done = self.interpolate(env, now_ms, progress);
                if done {
                    self.state_mut().timer = AnimationTimer::Finishing;
                }
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scalar {
        anim: AnimationState,
        from: i32,
        to: i32,
        current: i32,
        snapbacks: u32,
    }

    impl Animatable for Scalar {
        type Env<'a> = ();

        fn state(&self) -> &AnimationState {
            &self.anim
        }

        fn state_mut(&mut self) -> &mut AnimationState {
            &mut self.anim
        }

        fn interpolate(&mut self, _env: &mut (), _now: u64, progress: f32) -> bool {
            if progress >= 1.0 {
                self.current = self.to;
                return true;
            }
            self.current =
                (self.from as f32 + progress * (self.to - self.from) as f32) as i32;
            self.current == self.to
        }

        fn start_snapback(&mut self, _env: &mut ()) -> bool {
            self.snapbacks += 1;
            false
        }
    }

    fn scalar(kind: AnimKind, duration_ms: u32) -> Scalar {
        let mut s = Scalar {
            anim: AnimationState::default(),
            from: 0,
            to: 100,
            current: 0,
            snapbacks: 0,
        };
        s.anim.begin(kind, duration_ms, 1000);
        s
    }

    #[test]
    fn zero_duration_completes_in_one_tick() {
        let mut s = scalar(AnimKind::Scroll, 0);
        assert!(s.advance_animation(&mut (), 1000));
        assert_eq!(s.current, 100);
        assert_eq!(s.anim.timer, AnimationTimer::Finishing);
    }

    #[test]
    fn finishing_resolves_to_snapback_then_idle() {
        let mut s = scalar(AnimKind::Scroll, 0);
        s.advance_animation(&mut (), 1000);
        // The finishing tick invokes the snap-back hook exactly once.
        s.advance_animation(&mut (), 1016);
        assert_eq!(s.snapbacks, 1);
        assert!(s.anim.is_idle());
        assert!(!s.advance_animation(&mut (), 1032));
        assert_eq!(s.snapbacks, 1);
    }

    #[test]
    fn progress_is_eased_and_clamped() {
        let mut s = scalar(AnimKind::Snapback, 600);
        s.advance_animation(&mut (), 1300);
        // Quintic ease-out is well past the halfway point at t = 0.5.
        assert!(s.current > 90, "got {}", s.current);
        s.advance_animation(&mut (), 1700);
        assert_eq!(s.current, 100);
    }

    #[test]
    fn halt_freezes_mid_animation() {
        let mut s = scalar(AnimKind::Snapback, 600);
        s.advance_animation(&mut (), 1300);
        let frozen = s.current;
        s.anim.halt();
        assert!(!s.advance_animation(&mut (), 1600));
        assert_eq!(s.current, frozen);
    }
}
