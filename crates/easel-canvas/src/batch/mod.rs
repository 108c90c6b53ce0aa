//! Quad batching: vertex format, per-frame buffer pool and batch building.
//!
//! A frame's draw calls become quads. Each quad is transformed on the CPU and
//! appended to the active vertex buffer; consecutive quads sharing a texture
//! binding extend one [`DrawBatch`]. Backends issue one indexed draw per batch
//! against a shared index buffer holding the fixed quad pattern.

mod builder;
mod list;
mod pool;
mod table;
mod vertex;

pub use builder::BatchBuilder;
pub use list::{DrawBatch, DrawBatchList, TextureBinding};
pub use pool::{VertexBuffer, VertexBufferPool};
pub use table::TextureTable;
pub use vertex::{quad_indices, Vertex, QUAD_INDEX_PATTERN};

use thiserror::Error;

use crate::error::{BackendError, CanvasError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("per-frame vertex buffer limit ({max}) exceeded")]
    VertexBufferLimit { max: usize },
    #[error("per-frame draw batch limit ({max}) exceeded")]
    BatchLimit { max: usize },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl From<BatchError> for CanvasError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::VertexBufferLimit { max } => CanvasError::VertexBufferLimit { max },
            BatchError::BatchLimit { max } => CanvasError::BatchLimit { max },
            BatchError::Backend(e) => CanvasError::Backend(e),
        }
    }
}
