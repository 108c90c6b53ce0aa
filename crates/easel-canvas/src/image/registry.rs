use slotmap::SlotMap;

use super::{ImageId, ImageInfo, ImageKind};

/// A registered image: its backend object plus metadata.
#[derive(Debug)]
pub struct ImageEntry<I> {
    pub gpu: I,
    pub width: u32,
    pub height: u32,
    pub kind: ImageKind,
}

impl<I> ImageEntry<I> {
    #[inline]
    pub fn info(&self) -> ImageInfo {
        ImageInfo {
            width: self.width,
            height: self.height,
            kind: self.kind,
        }
    }
}

/// Backend image whose handle was destroyed, kept alive until the last frame
/// that may sample it has completed.
#[derive(Debug)]
pub struct RetiredImage<I> {
    pub id: ImageId,
    pub image: I,
    pub last_frame: u64,
}

/// Arena of images addressed by [`ImageId`].
#[derive(Debug)]
pub struct ImageRegistry<I> {
    entries: SlotMap<ImageId, ImageEntry<I>>,
}

impl<I> Default for ImageRegistry<I> {
    fn default() -> Self {
        Self {
            entries: SlotMap::with_key(),
        }
    }
}

impl<I> ImageRegistry<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, gpu: I, width: u32, height: u32, kind: ImageKind) -> ImageId {
        self.entries.insert(ImageEntry {
            gpu,
            width,
            height,
            kind,
        })
    }

    pub fn remove(&mut self, id: ImageId) -> Option<ImageEntry<I>> {
        self.entries.remove(id)
    }

    #[inline]
    pub fn get(&self, id: ImageId) -> Option<&ImageEntry<I>> {
        self.entries.get(id)
    }

    /// Removes every entry, yielding the backend objects for release.
    pub fn drain(&mut self) -> impl Iterator<Item = (ImageId, ImageEntry<I>)> + '_ {
        self.entries.drain()
    }
}
