use crate::image::ImageId;

use super::BatchError;

/// Texture a batch samples from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureBinding {
    Image(ImageId),
    /// The frame's texture atlas.
    Atlas,
    /// The frame's bindless texture table.
    Table,
}

/// A contiguous run of quads drawn with one binding.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DrawBatch {
    pub binding: TextureBinding,
    /// Index into the frame's vertex buffers.
    pub buffer: usize,
    /// First vertex of the run inside `buffer`; used as the base vertex.
    pub offset: u32,
    pub index_count: u32,
}

impl DrawBatch {
    #[inline]
    pub fn quad_count(&self) -> u32 {
        self.index_count / crate::config::INDICES_PER_QUAD as u32
    }
}

/// Append-only batch list for one frame. `clear` keeps the allocation.
#[derive(Debug, Clone)]
pub struct DrawBatchList {
    batches: Vec<DrawBatch>,
    max: usize,
}

impl DrawBatchList {
    pub fn new(max: usize) -> Self {
        Self {
            batches: Vec::new(),
            max,
        }
    }

    /// Appends `batch`, returning its position.
    pub fn push(&mut self, batch: DrawBatch) -> Result<usize, BatchError> {
        if self.batches.len() >= self.max {
            return Err(BatchError::BatchLimit { max: self.max });
        }
        self.batches.push(batch);
        Ok(self.batches.len() - 1)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut DrawBatch> {
        self.batches.get_mut(index)
    }

    #[inline]
    pub fn as_slice(&self) -> &[DrawBatch] {
        &self.batches
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn clear(&mut self) {
        self.batches.clear();
    }
}
