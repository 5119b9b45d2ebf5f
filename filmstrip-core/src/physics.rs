//! Fling physics engines.
//!
//! The kernel treats both engines as black boxes behind small seed/step/query
//! traits, so hosts can plug in platform scroll physics and tests can supply
//! deterministic stub trajectories. Two default implementations are provided:
//! [`FlingScroller`] for page mode (bounded, progress-driven) and
//! [`FilmScroller`] for film mode (unbounded, clock-driven, self-terminating).

/// Page-mode fling trajectory: seeded with a velocity and the stable bound,
/// then queried once per tick with the eased progress of the animation.
pub trait PageFlingPhysics {
    /// Seed a new trajectory. Bounds clamp the produced positions.
    #[allow(clippy::too_many_arguments)]
    fn fling(
        &mut self,
        start_x: i32,
        start_y: i32,
        velocity_x: i32,
        velocity_y: i32,
        min_x: i32,
        max_x: i32,
        min_y: i32,
        max_y: i32,
    );

    /// Advance the trajectory to `progress` in `[0, 1]`.
    fn compute_scroll_offset(&mut self, progress: f32);

    /// Current x position.
    fn curr_x(&self) -> i32;
    /// Current y position.
    fn curr_y(&self) -> i32;
    /// Current horizontal velocity in pixels per second (signed).
    fn curr_velocity_x(&self) -> f32;
    /// Current vertical velocity in pixels per second (signed).
    fn curr_velocity_y(&self) -> f32;
    /// Final x position of the trajectory.
    fn final_x(&self) -> i32;
    /// Final y position of the trajectory.
    fn final_y(&self) -> i32;
    /// Duration of the trajectory in milliseconds.
    fn duration_ms(&self) -> u32;
}

/// Film-mode fling trajectory: horizontal only, unbounded, advanced against
/// the animation clock and finished when it says so.
pub trait FilmFlingPhysics {
    /// Seed a new trajectory starting now.
    fn fling(&mut self, now_ms: u64, start_x: i32, velocity_x: i32);

    /// Advance the trajectory to the given clock time.
    fn compute_scroll_offset(&mut self, now_ms: u64);

    /// Current x position.
    fn curr_x(&self) -> i32;
    /// Current velocity magnitude in pixels per second.
    fn curr_velocity(&self) -> f32;
    /// Whether the trajectory has run its course (or was forced to).
    fn is_finished(&self) -> bool;
    /// Terminate the trajectory immediately.
    fn force_finished(&mut self);
    /// Final x position of the trajectory.
    fn final_x(&self) -> i32;
}

// Position formula: x(t) = s + (e - s) * (1 - (1 - t/T)^D)
// Velocity formula: v(t) = D * (e - s) * (1 - t/T)^(D-1) / T
// Thus v(0) = D * (e - s) / T, i.e. e = s + v(0) * T / D.
const DECELERATED_FACTOR: f64 = 4.0;
const FLING_DURATION_PARAM: f64 = 50.0;

/// Default page-mode fling: quartic deceleration toward a clamped endpoint.
#[derive(Debug, Clone, Default)]
pub struct FlingScroller {
    start_x: i32,
    start_y: i32,
    min_x: i32,
    max_x: i32,
    min_y: i32,
    max_y: i32,
    cos_angle: f64,
    sin_angle: f64,
    duration_ms: u32,
    distance: f64,
    final_x: i32,
    final_y: i32,
    curr_x: i32,
    curr_y: i32,
    curr_velocity: f64,
}

impl FlingScroller {
    /// Create an idle scroller; call `fling` to seed a trajectory.
    pub fn new() -> Self {
        Self::default()
    }

    fn decelerated_fraction(progress: f32) -> f64 {
        let f = 1.0 - f64::from(progress.clamp(0.0, 1.0));
        1.0 - f.powf(DECELERATED_FACTOR)
    }

    fn x_at(&self, progress: f32) -> i32 {
        let f = Self::decelerated_fraction(progress);
        let x = f64::from(self.start_x) + self.cos_angle * self.distance * f;
        (x.round() as i32).clamp(self.min_x, self.max_x)
    }

    fn y_at(&self, progress: f32) -> i32 {
        let f = Self::decelerated_fraction(progress);
        let y = f64::from(self.start_y) + self.sin_angle * self.distance * f;
        (y.round() as i32).clamp(self.min_y, self.max_y)
    }

    fn velocity_at(&self, progress: f32) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        let f = 1.0 - f64::from(progress.clamp(0.0, 1.0));
        DECELERATED_FACTOR * self.distance * f.powf(DECELERATED_FACTOR - 1.0)
            / f64::from(self.duration_ms)
            * 1000.0
    }
}

impl PageFlingPhysics for FlingScroller {
    fn fling(
        &mut self,
        start_x: i32,
        start_y: i32,
        velocity_x: i32,
        velocity_y: i32,
        min_x: i32,
        max_x: i32,
        min_y: i32,
        max_y: i32,
    ) {
        self.start_x = start_x;
        self.start_y = start_y;
        self.min_x = min_x;
        self.max_x = max_x;
        self.min_y = min_y;
        self.max_y = max_y;

        let velocity = f64::from(velocity_x).hypot(f64::from(velocity_y));
        if velocity > 0.0 {
            self.cos_angle = f64::from(velocity_x) / velocity;
            self.sin_angle = f64::from(velocity_y) / velocity;
        } else {
            self.cos_angle = 0.0;
            self.sin_angle = 0.0;
        }

        self.duration_ms =
            (FLING_DURATION_PARAM * velocity.powf(1.0 / DECELERATED_FACTOR)).round() as u32;
        self.distance =
            velocity * f64::from(self.duration_ms) / DECELERATED_FACTOR / 1000.0;

        self.final_x = self.x_at(1.0);
        self.final_y = self.y_at(1.0);
        self.compute_scroll_offset(0.0);
    }

    fn compute_scroll_offset(&mut self, progress: f32) {
        self.curr_x = self.x_at(progress);
        self.curr_y = self.y_at(progress);
        self.curr_velocity = self.velocity_at(progress);
    }

    fn curr_x(&self) -> i32 {
        self.curr_x
    }

    fn curr_y(&self) -> i32 {
        self.curr_y
    }

    fn curr_velocity_x(&self) -> f32 {
        (self.cos_angle * self.curr_velocity) as f32
    }

    fn curr_velocity_y(&self) -> f32 {
        (self.sin_angle * self.curr_velocity) as f32
    }

    fn final_x(&self) -> i32 {
        self.final_x
    }

    fn final_y(&self) -> i32 {
        self.final_y
    }

    fn duration_ms(&self) -> u32 {
        self.duration_ms
    }
}

// Deceleration applied to a film-mode fling, in pixels per second squared.
const FILM_DECELERATION: f64 = 3000.0;

/// Default film-mode fling: constant deceleration until the velocity runs
/// out, with its own finished flag.
#[derive(Debug, Clone)]
pub struct FilmScroller {
    start_ms: u64,
    start_x: i32,
    velocity: f64,
    duration_ms: u64,
    final_x: i32,
    curr_x: i32,
    curr_velocity: f64,
    finished: bool,
}

impl FilmScroller {
    /// Create an idle scroller; call `fling` to seed a trajectory.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for FilmScroller {
    fn default() -> Self {
        Self {
            start_ms: 0,
            start_x: 0,
            velocity: 0.0,
            duration_ms: 0,
            final_x: 0,
            curr_x: 0,
            curr_velocity: 0.0,
            finished: true,
        }
    }
}

impl FilmFlingPhysics for FilmScroller {
    fn fling(&mut self, now_ms: u64, start_x: i32, velocity_x: i32) {
        self.start_ms = now_ms;
        self.start_x = start_x;
        self.velocity = f64::from(velocity_x);
        self.duration_ms =
            (self.velocity.abs() / FILM_DECELERATION * 1000.0).round() as u64;
        let travel = self.velocity * self.velocity.abs() / (2.0 * FILM_DECELERATION);
        self.final_x = start_x + travel.round() as i32;
        self.curr_x = start_x;
        self.curr_velocity = self.velocity.abs();
        self.finished = self.duration_ms == 0;
    }

    fn compute_scroll_offset(&mut self, now_ms: u64) {
        if self.finished {
            return;
        }
        let elapsed = now_ms.saturating_sub(self.start_ms);
        if elapsed >= self.duration_ms {
            self.curr_x = self.final_x;
            self.curr_velocity = 0.0;
            self.finished = true;
            return;
        }
        let t = elapsed as f64 / 1000.0;
        let decel = FILM_DECELERATION * self.velocity.signum();
        let x = f64::from(self.start_x) + self.velocity * t - 0.5 * decel * t * t;
        self.curr_x = x.round() as i32;
        self.curr_velocity = self.velocity.abs() - FILM_DECELERATION * t;
    }

    fn curr_x(&self) -> i32 {
        self.curr_x
    }

    fn curr_velocity(&self) -> f32 {
        self.curr_velocity.max(0.0) as f32
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn force_finished(&mut self) {
        self.finished = true;
    }

    fn final_x(&self) -> i32 {
        self.final_x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_fling_reaches_clamped_endpoint() {
        let mut s = FlingScroller::new();
        s.fling(0, 0, 2000, 0, -10_000, 120, 0, 0);
        assert!(s.duration_ms() > 0);
        assert_eq!(s.final_x(), 120, "endpoint clamps to the bound");
        s.compute_scroll_offset(1.0);
        assert_eq!(s.curr_x(), 120);
        assert!(s.curr_velocity_x().abs() < 1e-3);
    }

    #[test]
    fn page_fling_monotonic_and_decelerating() {
        let mut s = FlingScroller::new();
        s.fling(0, 0, -1600, 0, -5000, 5000, 0, 0);
        let mut last_x = 0;
        let mut last_speed = f32::INFINITY;
        for step in 1..=10 {
            s.compute_scroll_offset(step as f32 / 10.0);
            assert!(s.curr_x() <= last_x, "moves left monotonically");
            let speed = s.curr_velocity_x().abs();
            assert!(speed <= last_speed + 1e-3, "never speeds up");
            last_x = s.curr_x();
            last_speed = speed;
        }
        assert_eq!(s.curr_x(), s.final_x());
    }

    #[test]
    fn film_fling_finishes_at_final_position() {
        let mut s = FilmScroller::new();
        s.fling(1000, 50, -900);
        assert!(!s.is_finished());
        let travel = s.final_x() - 50;
        assert!(travel < 0, "travels in velocity direction");
        s.compute_scroll_offset(1000 + 10_000);
        assert!(s.is_finished());
        assert_eq!(s.curr_x(), s.final_x());
        assert_eq!(s.curr_velocity(), 0.0);
    }

    #[test]
    fn film_force_finished_freezes_position() {
        let mut s = FilmScroller::new();
        s.fling(0, 0, 1200);
        s.compute_scroll_offset(100);
        let x = s.curr_x();
        s.force_finished();
        s.compute_scroll_offset(4000);
        assert_eq!(s.curr_x(), x);
        assert!(s.is_finished());
    }
}
