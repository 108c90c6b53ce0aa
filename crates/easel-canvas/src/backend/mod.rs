//! The resource contract a GPU backend provides to the canvas.
//!
//! The canvas core owns every decision about batching and frame pacing; a
//! backend only creates and destroys resources, executes submitted frames,
//! and exposes a monotonically increasing sync point per frame slot.

pub mod headless;
pub mod webgpu;

use crate::atlas::AtlasRect;
use crate::batch::{DrawBatch, TextureBinding, VertexBuffer};
use crate::config::BatchStrategy;
use crate::coords::Viewport;
use crate::error::BackendError;
use crate::image::{ImageDesc, ImageId, ImageRegistry, RetiredImage};
use crate::paint::ClearColor;

/// Where a frame is drawn.
pub enum FrameTarget<'a, I> {
    /// The backend's presentable surface.
    Surface,
    /// An image created with [`Backend::create_render_target_image`].
    Image { id: ImageId, image: &'a I },
}

/// The atlas texture and the images placed into it this frame.
pub struct AtlasFrame<'a, I> {
    pub image: &'a I,
    pub width: u32,
    pub height: u32,
    /// Each entry's image must be copied to its rect before batches execute.
    pub placements: &'a [(ImageId, AtlasRect)],
}

/// Everything a backend needs to execute one frame.
pub struct FrameSubmission<'a, B: Backend> {
    /// Monotonic frame counter; also the value the slot's sync point is signaled with.
    pub frame: u64,
    pub slot: usize,
    pub clear_color: ClearColor,
    pub target: FrameTarget<'a, B::Image>,
    pub viewport: Viewport,
    /// Shared index buffer holding the quad pattern.
    pub index_buffer: &'a B::Buffer,
    /// Vertex buffers used this frame; `DrawBatch::buffer` indexes this slice.
    pub vertex_buffers: &'a [VertexBuffer<B::Buffer>],
    pub batches: &'a [DrawBatch],
    pub images: &'a ImageRegistry<B::Image>,
    /// Destroyed images whose backend objects are still alive; draws recorded
    /// before the destroy may reference them.
    pub retired: &'a [RetiredImage<B::Image>],
    pub atlas: Option<AtlasFrame<'a, B::Image>>,
    /// Bindless table; a vertex's `texture_index` indexes this slice.
    pub texture_table: &'a [ImageId],
}

impl<'a, B: Backend> FrameSubmission<'a, B> {
    /// Resolves an image this frame may reference, including one destroyed
    /// after it was drawn.
    pub fn image(&self, id: ImageId) -> Option<&'a B::Image> {
        if let Some(entry) = self.images.get(id) {
            return Some(&entry.gpu);
        }
        self.retired
            .iter()
            .find(|r| r.id == id && r.last_frame >= self.frame)
            .map(|r| &r.image)
    }

    /// Resolves the backend image a batch samples from, if it is a plain image.
    pub fn batch_image(&self, batch: &DrawBatch) -> Option<&'a B::Image> {
        match batch.binding {
            TextureBinding::Image(id) => self.image(id),
            TextureBinding::Atlas => self.atlas.as_ref().map(|a| a.image),
            TextureBinding::Table => None,
        }
    }
}

/// GPU resource contract used by [`Canvas`](crate::canvas::Canvas).
///
/// All calls happen on the canvas' producer thread.
pub trait Backend: Sized {
    type Buffer;
    type Image;
    type SyncPoint;

    /// Size of the presentable surface in pixels.
    fn view_size(&self) -> Viewport;

    /// Whether this backend can execute frames batched with `strategy`.
    fn supports(&self, strategy: BatchStrategy) -> bool {
        strategy != BatchStrategy::Bindless
    }

    fn create_vertex_buffer(&mut self, byte_size: u64) -> Result<Self::Buffer, BackendError>;

    /// Creates the index buffer once, filled with `indices`.
    fn create_index_buffer(&mut self, indices: &[u32]) -> Result<Self::Buffer, BackendError>;

    fn destroy_buffer(&mut self, buffer: Self::Buffer);

    fn create_image(&mut self, desc: &ImageDesc, pixels: &[u8]) -> Result<Self::Image, BackendError>;

    fn create_render_target_image(&mut self, width: u32, height: u32) -> Result<Self::Image, BackendError>;

    /// Creates the backing texture the canvas copies atlas placements into.
    fn create_atlas_image(&mut self, width: u32, height: u32) -> Result<Self::Image, BackendError>;

    fn destroy_image(&mut self, image: Self::Image);

    fn init_frame_sync_point(&mut self) -> Result<Self::SyncPoint, BackendError>;

    /// Marks the point after all work submitted so far; completes with `value`.
    fn signal_frame_sync_point(&mut self, sync: &mut Self::SyncPoint, value: u64);

    /// Blocks until `sync` has reached `value`.
    fn wait_frame_sync_point(&mut self, sync: &mut Self::SyncPoint, value: u64) -> Result<(), BackendError>;

    fn destroy_frame_sync_point(&mut self, sync: Self::SyncPoint);

    /// Executes one frame: atlas copies, clear, then one draw per batch.
    fn submit_frame(&mut self, frame: &FrameSubmission<'_, Self>) -> Result<(), BackendError>;

    /// Displays the last frame submitted to the surface. No-op for image targets.
    fn present(&mut self) -> Result<(), BackendError>;
}
