//! Error types shared by the canvas core and its backends.

use thiserror::Error;

use crate::canvas::FrameState;

/// Failures reported by a [`Backend`](crate::backend::Backend) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("failed to create {what}: {reason}")]
    ResourceCreation { what: &'static str, reason: String },

    #[error("sync point wait for value {value} did not complete")]
    FenceTimeout { value: u64 },

    #[error("surface lost or outdated; frame skipped")]
    SurfaceLost,

    #[error("surface acquisition timed out; frame skipped")]
    SurfaceTimeout,

    #[error("GPU out of memory")]
    OutOfMemory,

    #[error("backend does not support {0}")]
    Unsupported(String),
}

impl BackendError {
    /// `true` when the frame can simply be skipped and rendering resumed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BackendError::SurfaceLost | BackendError::SurfaceTimeout)
    }
}

/// Errors surfaced by [`Canvas`](crate::canvas::Canvas).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CanvasError {
    #[error("invalid canvas configuration: {0}")]
    InvalidConfig(String),

    #[error("frame lifecycle misuse: expected {expected}, found {found:?}")]
    FrameState {
        expected: &'static str,
        found: FrameState,
    },

    #[error("per-frame vertex buffer limit ({max}) exceeded")]
    VertexBufferLimit { max: usize },

    #[error("per-frame draw batch limit ({max}) exceeded")]
    BatchLimit { max: usize },

    #[error("texture atlas exhausted placing a {width}x{height} image")]
    AtlasExhausted { width: u32, height: u32 },

    #[error("bindless texture table limit ({max}) exceeded")]
    TextureTableLimit { max: usize },

    #[error("cannot create an empty {width}x{height} image")]
    EmptyImage { width: u32, height: u32 },

    #[error("image is not a live render target")]
    InvalidRenderTarget,

    #[error("image pixel data has {actual} bytes, expected {expected}")]
    PixelDataSize { expected: usize, actual: usize },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Logs `err` and aborts the current thread.
///
/// Reserved for conditions where the workload exceeds statically configured
/// limits or the GPU can no longer be synchronized with.
#[track_caller]
pub(crate) fn fatal(err: CanvasError) -> ! {
    log::error!("fatal canvas error: {err}");
    panic!("{err}");
}
