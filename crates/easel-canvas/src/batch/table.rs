use std::collections::HashMap;

use crate::image::ImageId;

/// Per-frame bindless texture table.
///
/// Each image used in a frame gets one slot; vertices carry the slot index.
#[derive(Debug, Clone)]
pub struct TextureTable {
    ids: Vec<ImageId>,
    slots: HashMap<ImageId, u32>,
    max: usize,
}

impl TextureTable {
    pub fn new(max: usize) -> Self {
        Self {
            ids: Vec::new(),
            slots: HashMap::new(),
            max,
        }
    }

    /// Slot for `id`, assigning the next free one on first use. `None` when full.
    pub fn slot_for(&mut self, id: ImageId) -> Option<u32> {
        if let Some(&slot) = self.slots.get(&id) {
            return Some(slot);
        }
        if self.ids.len() >= self.max {
            return None;
        }
        let slot = self.ids.len() as u32;
        self.ids.push(id);
        self.slots.insert(id, slot);
        Some(slot)
    }

    #[inline]
    pub fn ids(&self) -> &[ImageId] {
        &self.ids
    }

    #[inline]
    pub fn max(&self) -> usize {
        self.max
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.slots.clear();
    }
}
