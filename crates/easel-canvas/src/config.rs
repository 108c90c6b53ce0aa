use crate::error::CanvasError;

/// Quads one vertex buffer can hold. Fixed so GPU buffers never reallocate.
pub const MAX_QUADS_PER_BUFFER: usize = 1 << 16;
pub const VERTICES_PER_QUAD: usize = 4;
pub const INDICES_PER_QUAD: usize = 6;
pub const MAX_VERTICES_PER_BUFFER: usize = MAX_QUADS_PER_BUFFER * VERTICES_PER_QUAD;
pub const MAX_INDICES_PER_BUFFER: usize = MAX_QUADS_PER_BUFFER * INDICES_PER_QUAD;

/// How draw calls with different images are grouped into batches.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BatchStrategy {
    /// A new batch starts whenever the image changes.
    PerTexture,
    /// Images are packed into a per-frame atlas; batches split only on buffer overflow.
    Atlas,
    /// Vertices carry a texture-table index; batches split only on buffer overflow.
    Bindless,
}

/// Canvas capacity and batching configuration.
///
/// Limits are per frame. Exceeding them while drawing is fatal, so size them
/// for the expected workload.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasConfig {
    /// Frame slots in flight. The CPU runs at most this many frames ahead of the GPU.
    pub frames_in_flight: usize,

    pub max_vertex_buffers_per_frame: usize,

    pub max_batches_per_frame: usize,

    pub max_matrix_stack_depth: usize,

    pub strategy: BatchStrategy,

    /// Atlas dimensions in pixels; only used with [`BatchStrategy::Atlas`].
    pub atlas_size: (u32, u32),

    /// Texture table capacity; only used with [`BatchStrategy::Bindless`].
    pub max_bindless_textures: usize,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: 2,
            max_vertex_buffers_per_frame: 1 << 7,
            max_batches_per_frame: 1 << 12,
            max_matrix_stack_depth: crate::coords::MAX_MATRIX_STACK_DEPTH,
            strategy: BatchStrategy::PerTexture,
            atlas_size: (4096, 4096),
            max_bindless_textures: 1 << 10,
        }
    }
}

impl CanvasConfig {
    pub fn with_strategy(mut self, strategy: BatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn validate(&self) -> Result<(), CanvasError> {
        let invalid = |msg: &str| Err(CanvasError::InvalidConfig(msg.to_string()));

        if self.frames_in_flight == 0 {
            return invalid("frames_in_flight must be at least 1");
        }
        if self.max_vertex_buffers_per_frame == 0 {
            return invalid("max_vertex_buffers_per_frame must be at least 1");
        }
        if self.max_batches_per_frame == 0 {
            return invalid("max_batches_per_frame must be at least 1");
        }
        if self.strategy == BatchStrategy::Atlas && (self.atlas_size.0 == 0 || self.atlas_size.1 == 0) {
            return invalid("atlas_size must be non-zero in atlas mode");
        }
        if self.strategy == BatchStrategy::Bindless && self.max_bindless_textures == 0 {
            return invalid("max_bindless_textures must be at least 1 in bindless mode");
        }
        Ok(())
    }
}
