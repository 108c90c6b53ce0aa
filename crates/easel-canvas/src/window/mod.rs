//! Window + runtime loop.
//!
//! Owns the winit event loop and one window, and wires it to a canvas over
//! the wgpu backend.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
