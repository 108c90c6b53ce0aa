use crate::backend::Backend;
use crate::error::CanvasError;
use crate::image::{ImageDesc, ImageFormat, ImageId, ImageInfo, ImageKind, RetiredImage};

use super::frame::FrameState;
use super::Canvas;

impl<B: Backend> Canvas<B> {
    /// Uploads `pixels` (row-major, tightly packed) as a new image.
    pub fn create_image(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[u8],
        format: ImageFormat,
    ) -> Result<ImageId, CanvasError> {
        let desc = ImageDesc {
            width,
            height,
            format,
        };
        self.create_from_desc(&desc, pixels, ImageKind::Texture)
    }

    /// Creates an image that frames can be drawn into and later sampled from.
    pub fn create_render_target_image(&mut self, width: u32, height: u32) -> Result<ImageId, CanvasError> {
        if width == 0 || height == 0 {
            return Err(CanvasError::EmptyImage { width, height });
        }
        let gpu = self.backend.create_render_target_image(width, height)?;
        Ok(self.images.insert(gpu, width, height, ImageKind::RenderTarget))
    }

    /// Destroys an image created by the caller.
    ///
    /// The handle stops resolving for new draws immediately. Draws already
    /// recorded in the current frame keep sampling it, and the backend object
    /// is released once every frame that may still sample it has completed.
    /// Returns `false` for stale handles and canvas-owned images.
    pub fn destroy_image(&mut self, id: ImageId) -> bool {
        if Some(id) == self.white_image {
            log::warn!("refusing to destroy the reserved white image");
            return false;
        }
        let Some(entry) = self.images.remove(id) else {
            return false;
        };

        // A frame being recorded may already reference the image.
        let last_frame = match self.state {
            FrameState::FrameBegun | FrameState::FrameEnded => self.frame_counter,
            FrameState::Idle | FrameState::Presented => self.frame_counter - 1,
        };
        self.retired.push(RetiredImage {
            id,
            image: entry.gpu,
            last_frame,
        });
        self.release_retired_images();
        true
    }

    pub fn image_info(&self, id: ImageId) -> Option<ImageInfo> {
        self.images.get(id).map(|e| e.info())
    }

    pub fn image_width(&self, id: ImageId) -> Option<u32> {
        self.images.get(id).map(|e| e.width)
    }

    pub fn image_height(&self, id: ImageId) -> Option<u32> {
        self.images.get(id).map(|e| e.height)
    }

    /// Destroyed images whose backend objects are still waiting on the GPU.
    pub fn pending_image_releases(&self) -> usize {
        self.retired.len()
    }

    pub(super) fn create_image_of_kind(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[u8],
        kind: ImageKind,
    ) -> Result<ImageId, CanvasError> {
        self.create_from_desc(&ImageDesc::rgba8(width, height), pixels, kind)
    }

    fn create_from_desc(&mut self, desc: &ImageDesc, pixels: &[u8], kind: ImageKind) -> Result<ImageId, CanvasError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(CanvasError::EmptyImage {
                width: desc.width,
                height: desc.height,
            });
        }
        if pixels.len() != desc.byte_len() {
            return Err(CanvasError::PixelDataSize {
                expected: desc.byte_len(),
                actual: pixels.len(),
            });
        }
        let gpu = self.backend.create_image(desc, pixels)?;
        Ok(self.images.insert(gpu, desc.width, desc.height, kind))
    }

    /// Releases backend objects of destroyed images whose frames have completed.
    pub(super) fn release_retired_images(&mut self) {
        let completed = self.completed_frame;
        let mut i = 0;
        while i < self.retired.len() {
            if self.retired[i].last_frame <= completed {
                let retired = self.retired.swap_remove(i);
                self.backend.destroy_image(retired.image);
            } else {
                i += 1;
            }
        }
    }
}
