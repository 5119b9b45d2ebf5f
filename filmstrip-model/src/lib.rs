//! Shared data model for the filmstrip kernel.
//!
//! The kernel itself lives in `filmstrip-core`; this crate holds the small
//! value types that cross its boundary: the integer screen rectangle handed
//! to renderers, and the edge/scale feedback types reported to gesture
//! listeners. All types are plain data with optional `serde` derives behind
//! the `serde` feature.

pub mod gesture;
pub mod rect;

pub use gesture::{EdgeDirection, Edges, ScaleRangeHint};
pub use rect::Rect;
