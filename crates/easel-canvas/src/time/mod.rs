//! Frame timing for the runtime loop.
//!
//! One [`FrameClock`] per window; call `tick()` once per redraw.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
