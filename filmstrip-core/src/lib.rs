//! Animation and layout kernel for a horizontally scrolling photo strip.
//!
//! A [`PositionController`] manages a sliding window of picture boxes around
//! one focused image, the gaps between them, and a shared platform anchor.
//! The host forwards gestures (scroll, pinch, fling, tap-to-zoom), calls
//! [`PositionController::advance_animation`] once per render tick, and reads
//! back absolute screen rectangles per box.
//!
//! The controller is deliberately renderer-agnostic: it raises redraw and
//! edge-feedback requests through the [`Listener`] trait and takes its clock
//! and fling physics as injectable collaborators, so it runs the same under
//! a real compositor and under a test harness with a manual clock.

pub mod config;
pub mod physics;
pub mod time;

mod animatable;
mod bound;
mod boxes;
mod controller;
mod curve;
mod gap;
mod platform;
mod range;

pub use config::{ConfigError, ControllerConfig};
pub use controller::{BOX_COUNT, BOX_MAX, Listener, PositionController};
pub use physics::{FilmFlingPhysics, FilmScroller, FlingScroller, PageFlingPhysics};
pub use time::{AnimationClock, SystemClock};

// Re-export the geometry and gesture vocabulary so hosts only need this
// crate in the common case.
pub use filmstrip_model::{EdgeDirection, Edges, Rect, ScaleRangeHint};
