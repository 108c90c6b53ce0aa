use bytemuck::Zeroable;

use crate::config::{MAX_VERTICES_PER_BUFFER, VERTICES_PER_QUAD};
use crate::error::BackendError;

use super::{BatchError, Vertex};

/// Fixed-capacity vertex storage paired with its backend buffer.
///
/// CPU storage is allocated once at full capacity; `reset` only rewinds the
/// count.
pub struct VertexBuffer<H> {
    handle: H,
    vertices: Box<[Vertex]>,
    vertex_count: usize,
}

impl<H> VertexBuffer<H> {
    fn new(handle: H) -> Self {
        Self {
            handle,
            vertices: vec![Vertex::zeroed(); MAX_VERTICES_PER_BUFFER].into_boxed_slice(),
            vertex_count: 0,
        }
    }

    #[inline]
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Vertices written this frame.
    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices[..self.vertex_count]
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    #[inline]
    pub fn has_room_for_quad(&self) -> bool {
        self.vertex_count + VERTICES_PER_QUAD <= MAX_VERTICES_PER_BUFFER
    }

    /// Writes one quad. Callers check [`has_room_for_quad`](Self::has_room_for_quad) first.
    #[inline]
    pub(crate) fn write_quad(&mut self, quad: [Vertex; VERTICES_PER_QUAD]) {
        let start = self.vertex_count;
        self.vertices[start..start + VERTICES_PER_QUAD].copy_from_slice(&quad);
        self.vertex_count += VERTICES_PER_QUAD;
    }

    #[inline]
    fn reset(&mut self) {
        self.vertex_count = 0;
    }
}

impl<H: std::fmt::Debug> std::fmt::Debug for VertexBuffer<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexBuffer")
            .field("handle", &self.handle)
            .field("vertex_count", &self.vertex_count)
            .finish()
    }
}

/// Per-frame-slot ring of vertex buffers.
///
/// Buffers are created lazily the first time a frame needs more than the pool
/// has ever held, and live until the pool is drained at teardown. The number
/// of created buffers is the pool's high-water mark.
#[derive(Debug)]
pub struct VertexBufferPool<H> {
    buffers: Vec<VertexBuffer<H>>,
    in_use: usize,
    max_per_frame: usize,
}

impl<H> VertexBufferPool<H> {
    pub fn new(max_per_frame: usize) -> Self {
        Self {
            buffers: Vec::new(),
            in_use: 0,
            max_per_frame,
        }
    }

    /// Hands out the next buffer for this frame, creating backend storage
    /// with `create` only when no earlier frame needed this many buffers.
    pub fn allocate<F>(&mut self, create: F) -> Result<usize, BatchError>
    where
        F: FnOnce() -> Result<H, BackendError>,
    {
        if self.in_use >= self.max_per_frame {
            return Err(BatchError::VertexBufferLimit {
                max: self.max_per_frame,
            });
        }

        let index = self.in_use;
        if index == self.buffers.len() {
            let handle = create()?;
            self.buffers.push(VertexBuffer::new(handle));
            log::debug!("vertex buffer pool grew to {}", self.buffers.len());
        }

        self.buffers[index].reset();
        self.in_use += 1;
        Ok(index)
    }

    /// Starts a new frame. Backend storage is kept.
    pub fn reset(&mut self) {
        for buffer in &mut self.buffers[..self.in_use] {
            buffer.reset();
        }
        self.in_use = 0;
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&VertexBuffer<H>> {
        self.buffers[..self.in_use].get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut VertexBuffer<H>> {
        self.buffers[..self.in_use].get_mut(index)
    }

    /// Buffers handed out this frame, in allocation order.
    #[inline]
    pub fn in_use(&self) -> &[VertexBuffer<H>] {
        &self.buffers[..self.in_use]
    }

    #[inline]
    pub fn high_water_mark(&self) -> usize {
        self.buffers.len()
    }

    /// Empties the pool, yielding backend handles for release.
    pub fn drain(&mut self) -> impl Iterator<Item = H> + '_ {
        self.in_use = 0;
        self.buffers.drain(..).map(|b| b.handle)
    }
}
