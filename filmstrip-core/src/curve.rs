//! Animation kinds, their nominal durations and easing curves.

use std::f32::consts::PI;

/// What started an animation. The kind picks the easing curve, the nominal
/// duration, and a few kind-specific interpolation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AnimKind {
    Scroll,
    Scale,
    Snapback,
    Slide,
    Zoom,
    Opening,
    Fling,
    Capture,
}

impl AnimKind {
    /// Nominal duration in milliseconds. Fling durations are computed by the
    /// physics engine per use; the base value here is only the fallback.
    pub fn base_duration_ms(self) -> u32 {
        match self {
            AnimKind::Scroll => 0,
            AnimKind::Scale => 50,
            AnimKind::Snapback => 600,
            AnimKind::Slide => 400,
            AnimKind::Zoom => 300,
            AnimKind::Opening => 600,
            AnimKind::Fling => 0,
            AnimKind::Capture => 800,
        }
    }

    /// Map raw elapsed progress in `[0, 1)` through this kind's easing curve.
    pub fn apply(self, progress: f32) -> f32 {
        let f = 1.0 - progress;
        match self {
            // linear
            AnimKind::Scroll | AnimKind::Fling | AnimKind::Capture => 1.0 - f,
            // quadratic ease-out
            AnimKind::Scale => 1.0 - f * f,
            // quintic ease-out
            AnimKind::Snapback | AnimKind::Zoom | AnimKind::Slide | AnimKind::Opening => {
                1.0 - f * f * f * f * f
            }
        }
    }
}

// The capture transition dips the scale by this much before returning.
const CAPTURE_ZOOM_DELTA: f32 = 0.2;

/// Slide curve of the capture transition: accelerate then decelerate.
pub(crate) fn capture_slide(fraction: f32) -> f32 {
    (((fraction + 1.0) * PI).cos() / 2.0) + 0.5
}

/// Scale curve of the capture transition: zoom out over the first half
/// (decelerating), back to identity over the second half (accelerating).
pub(crate) fn capture_scale(fraction: f32) -> f32 {
    if fraction <= 0.5 {
        let t = fraction * 2.0;
        let decelerate = 1.0 - (1.0 - t) * (1.0 - t);
        1.0 - CAPTURE_ZOOM_DELTA * decelerate
    } else {
        let t = (fraction - 0.5) * 2.0;
        let accelerate = t * t;
        (1.0 - CAPTURE_ZOOM_DELTA) + CAPTURE_ZOOM_DELTA * accelerate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_endpoints() {
        for kind in [
            AnimKind::Scroll,
            AnimKind::Scale,
            AnimKind::Snapback,
            AnimKind::Slide,
            AnimKind::Zoom,
            AnimKind::Opening,
            AnimKind::Fling,
            AnimKind::Capture,
        ] {
            assert!((kind.apply(0.0)).abs() < 1e-6, "{kind:?} starts at 0");
            assert!((kind.apply(1.0) - 1.0).abs() < 1e-6, "{kind:?} ends at 1");
        }
    }

    #[test]
    fn ease_out_kinds_run_ahead_of_linear() {
        assert!(AnimKind::Scale.apply(0.5) > 0.5);
        assert!(AnimKind::Snapback.apply(0.5) > AnimKind::Scale.apply(0.5));
    }

    #[test]
    fn capture_slide_is_smooth_s_curve() {
        assert!(capture_slide(0.0).abs() < 1e-6);
        assert!((capture_slide(1.0) - 1.0).abs() < 1e-6);
        assert!((capture_slide(0.5) - 0.5).abs() < 1e-6);
        assert!(capture_slide(0.25) < 0.25, "accelerates in the first half");
    }

    #[test]
    fn capture_scale_dips_and_returns() {
        assert!((capture_scale(0.0) - 1.0).abs() < 1e-6);
        assert!((capture_scale(1.0) - 1.0).abs() < 1e-6);
        let dip = capture_scale(0.5);
        assert!((dip - (1.0 - CAPTURE_ZOOM_DELTA)).abs() < 1e-6);
        assert!(capture_scale(0.25) > dip);
        assert!(capture_scale(0.75) > dip);
    }
}
