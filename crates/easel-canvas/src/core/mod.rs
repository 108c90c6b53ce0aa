//! Contracts between the runtime loop and application code.
//!
//! Applications implement [`App`]; the runtime hands them a [`FrameCtx`] per
//! redraw without exposing winit or wgpu plumbing.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCanvas};
