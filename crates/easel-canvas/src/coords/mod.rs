//! Coordinate and transform types used by the canvas.
//!
//! Canonical CPU space:
//! - pixels, origin top-left
//! - +X right, +Y down
//!
//! Backends convert to NDC in the vertex shader using the view size.

mod affine;
mod rect;
mod stack;
mod vec2;
mod viewport;

pub use affine::Affine2;
pub use rect::Rect;
pub use stack::{TransformStack, TransformStackError, MAX_MATRIX_STACK_DEPTH};
pub use vec2::Vec2;
pub use viewport::Viewport;
