//! Image handles and the registry that owns backend image objects.

mod registry;

pub use registry::{ImageEntry, ImageRegistry, RetiredImage};

use slotmap::new_key_type;

new_key_type! {
    /// Generation-checked handle to an image owned by a canvas.
    ///
    /// A handle whose image was destroyed never resolves again, even if its
    /// slot is reused.
    pub struct ImageId;
}

/// Pixel layout of caller-supplied image data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// 8-bit RGBA, row-major, tightly packed.
    Rgba8Unorm,
}

impl ImageFormat {
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            ImageFormat::Rgba8Unorm => 4,
        }
    }
}

/// What an image is used for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ImageKind {
    /// Sampled texture with caller-supplied pixels.
    Texture,
    /// Texture a frame can be drawn into and later sampled from.
    RenderTarget,
    /// Created by the canvas itself (white pixel image).
    Internal,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ImageDesc {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

impl ImageDesc {
    pub const fn rgba8(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: ImageFormat::Rgba8Unorm,
        }
    }

    #[inline]
    pub const fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// Metadata returned by image queries.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub kind: ImageKind,
}
