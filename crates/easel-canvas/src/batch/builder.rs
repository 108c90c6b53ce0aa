use crate::config::{INDICES_PER_QUAD, VERTICES_PER_QUAD};
use crate::coords::Affine2;
use crate::error::BackendError;

use super::{BatchError, DrawBatch, DrawBatchList, TextureBinding, Vertex, VertexBuffer, VertexBufferPool};

/// Turns a stream of quads into vertex data plus an ordered batch list.
///
/// Owns one frame slot's vertex buffer pool and batch list.
#[derive(Debug)]
pub struct BatchBuilder<H> {
    pool: VertexBufferPool<H>,
    batches: DrawBatchList,
    active_buffer: Option<usize>,
    active_batch: Option<usize>,
    quads: usize,
}

impl<H> BatchBuilder<H> {
    pub fn new(max_buffers: usize, max_batches: usize) -> Self {
        Self {
            pool: VertexBufferPool::new(max_buffers),
            batches: DrawBatchList::new(max_batches),
            active_buffer: None,
            active_batch: None,
            quads: 0,
        }
    }

    /// Transforms `quad` by `matrix` and appends it.
    ///
    /// A new buffer is taken from the pool when there is none yet or the
    /// active one is full; switching buffers always starts a new batch. A new
    /// batch also starts when `binding` differs from the active batch's.
    pub fn push_quad<F>(
        &mut self,
        quad: [Vertex; VERTICES_PER_QUAD],
        binding: TextureBinding,
        matrix: &Affine2,
        create_buffer: F,
    ) -> Result<(), BatchError>
    where
        F: FnOnce() -> Result<H, BackendError>,
    {
        let buffer_index = match self.active_buffer {
            Some(i) if self.pool.get(i).is_some_and(VertexBuffer::has_room_for_quad) => i,
            previous => {
                let i = self.pool.allocate(create_buffer)?;
                if previous.is_some() {
                    self.active_batch = None;
                }
                self.active_buffer = Some(i);
                i
            }
        };

        let Some(buffer) = self.pool.get_mut(buffer_index) else {
            unreachable!("active buffer index always refers to an in-use buffer");
        };

        let extend = self
            .active_batch
            .and_then(|b| self.batches.as_slice().get(b))
            .is_some_and(|b| b.binding == binding);

        if !extend {
            let index = self.batches.push(DrawBatch {
                binding,
                buffer: buffer_index,
                offset: buffer.vertex_count() as u32,
                index_count: 0,
            })?;
            self.active_batch = Some(index);
        }

        let transformed = quad.map(|mut v| {
            let p = matrix.transform_point(v.position[0], v.position[1]);
            v.position = p.to_array();
            v
        });
        buffer.write_quad(transformed);

        if let Some(batch) = self.active_batch.and_then(|b| self.batches.get_mut(b)) {
            batch.index_count += INDICES_PER_QUAD as u32;
        }
        self.quads += 1;
        Ok(())
    }

    /// Clears batches and rewinds the pool for a new frame.
    pub fn reset(&mut self) {
        self.pool.reset();
        self.batches.clear();
        self.active_buffer = None;
        self.active_batch = None;
        self.quads = 0;
    }

    #[inline]
    pub fn batches(&self) -> &[DrawBatch] {
        self.batches.as_slice()
    }

    /// Vertex buffers used this frame; `DrawBatch::buffer` indexes this slice.
    #[inline]
    pub fn buffers(&self) -> &[VertexBuffer<H>] {
        self.pool.in_use()
    }

    #[inline]
    pub fn pool(&self) -> &VertexBufferPool<H> {
        &self.pool
    }

    #[inline]
    pub fn pool_mut(&mut self) -> &mut VertexBufferPool<H> {
        &mut self.pool
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.quads
    }
}
