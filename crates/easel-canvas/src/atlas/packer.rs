use std::collections::HashMap;
use std::hash::Hash;

use thiserror::Error;

use crate::image::ImageId;

use super::AtlasRect;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum AtlasError {
    #[error("cannot place an empty {width}x{height} rect")]
    EmptyRect { width: u32, height: u32 },
    #[error("no free space for a {width}x{height} rect")]
    Exhausted { width: u32, height: u32 },
}

/// Where an image sits in the atlas for the current session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Placement {
    pub rect: AtlasRect,
    /// `true` when this call placed the image; its pixels still need copying.
    pub fresh: bool,
}

/// First-fit guillotine packer over a fixed-size atlas.
///
/// Free rects never overlap one another or any used rect. A packing session
/// lasts until [`reset`](Self::reset); within a session each key is placed at
/// most once.
#[derive(Debug, Clone)]
pub struct TexturePacker<K = ImageId> {
    width: u32,
    height: u32,
    free: Vec<AtlasRect>,
    used: Vec<AtlasRect>,
    placements: Vec<(K, AtlasRect)>,
    placed: HashMap<K, usize>,
    session: u64,
}

impl<K: Copy + Eq + Hash> TexturePacker<K> {
    pub fn new(width: u32, height: u32) -> Self {
        let mut packer = Self {
            width,
            height,
            free: Vec::new(),
            used: Vec::new(),
            placements: Vec::new(),
            placed: HashMap::new(),
            session: 0,
        };
        packer.reseed();
        packer
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Counts completed resets.
    #[inline]
    pub fn session(&self) -> u64 {
        self.session
    }

    #[inline]
    pub fn free_rects(&self) -> &[AtlasRect] {
        &self.free
    }

    #[inline]
    pub fn used_rects(&self) -> &[AtlasRect] {
        &self.used
    }

    /// Images placed this session, in placement order.
    #[inline]
    pub fn placements(&self) -> &[(K, AtlasRect)] {
        &self.placements
    }

    pub fn placement(&self, key: K) -> Option<AtlasRect> {
        self.placed.get(&key).map(|&i| self.placements[i].1)
    }

    /// Returns the rect for `key`, placing a `width × height` rect on first
    /// use this session.
    pub fn add_image(&mut self, key: K, width: u32, height: u32) -> Result<Placement, AtlasError> {
        if let Some(rect) = self.placement(key) {
            return Ok(Placement { rect, fresh: false });
        }

        let rect = self.add_rect(width, height)?;
        self.placed.insert(key, self.placements.len());
        self.placements.push((key, rect));
        Ok(Placement { rect, fresh: true })
    }

    /// Places an anonymous rect, first fit over the free list.
    pub fn add_rect(&mut self, width: u32, height: u32) -> Result<AtlasRect, AtlasError> {
        if width == 0 || height == 0 {
            return Err(AtlasError::EmptyRect { width, height });
        }

        let slot = self
            .free
            .iter()
            .position(|r| r.can_fit(width, height))
            .ok_or(AtlasError::Exhausted { width, height })?;

        let chosen = self.free.swap_remove(slot);
        let (placed, rest) = chosen.split(width, height);
        self.free.extend_from_slice(rest.as_slice());
        self.used.push(placed);
        Ok(placed)
    }

    /// Starts a new session with the whole atlas free.
    pub fn reset(&mut self) {
        self.reseed();
        self.session += 1;
    }

    fn reseed(&mut self) {
        self.free.clear();
        self.used.clear();
        self.placements.clear();
        self.placed.clear();
        if self.width > 0 && self.height > 0 {
            self.free.push(AtlasRect::new(0, 0, self.width, self.height));
        }
    }
}
