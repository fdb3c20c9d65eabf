//! Display surfaces: where presented frames go.
//!
//! A display receives every frame the presentation thread decides to show, in order. Frames with
//! unchanged pixels are not re-presented.

/// Display trait and built-in displays.
pub mod sink;
