//! Easel canvas crate.
//!
//! An immediate-mode 2D canvas that turns rect, line and image draws into a
//! small number of batched GPU draw calls, with N frames in flight. The core
//! is backend-agnostic; [`backend::webgpu`] renders through wgpu and
//! [`backend::headless`] records frames on the CPU.

pub mod atlas;
pub mod backend;
pub mod batch;
pub mod canvas;
pub mod config;
pub mod coords;
pub mod core;
pub mod error;
pub mod image;
pub mod logging;
pub mod paint;
pub mod time;
pub mod window;

pub use canvas::{Canvas, FrameState, FrameStats};
pub use config::{BatchStrategy, CanvasConfig};
pub use coords::Rect;
pub use error::{BackendError, CanvasError};
pub use image::{ImageFormat, ImageId, ImageInfo};
pub use paint::{ClearColor, Color};
