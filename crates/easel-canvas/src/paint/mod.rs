//! Color representations used by draw calls and frame clears.

pub mod color;

pub use color::{ClearColor, Color};
