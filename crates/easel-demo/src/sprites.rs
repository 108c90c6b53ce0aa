//! Procedurally generated sprite sheets.

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};

use easel_canvas::backend::Backend;
use easel_canvas::{Canvas, ImageFormat, ImageId};

/// Side of one cell in the sprite sheet.
pub const CELL: u32 = 32;
/// Cells in the sheet, laid out horizontally.
pub const CELLS: u32 = 4;

/// Images used by the demo.
#[derive(Debug, Copy, Clone)]
pub struct SpriteSet {
    pub checker: ImageId,
    pub sheet: ImageId,
    pub spark: ImageId,
}

impl SpriteSet {
    pub fn load<B: Backend>(canvas: &mut Canvas<B>) -> Result<Self> {
        Ok(Self {
            checker: upload(canvas, &checker(64, [240, 240, 240, 255], [90, 90, 110, 255]))
                .context("checker image")?,
            sheet: upload(canvas, &sheet()).context("sprite sheet")?,
            spark: upload(canvas, &disc(8, [255, 255, 255, 255])).context("spark image")?,
        })
    }
}

pub fn upload<B: Backend>(canvas: &mut Canvas<B>, img: &RgbaImage) -> Result<ImageId> {
    let (w, h) = img.dimensions();
    let id = canvas.create_image(w, h, img.as_raw(), ImageFormat::Rgba8Unorm)?;
    log::debug!("uploaded {w}x{h} image");
    Ok(id)
}

/// Two-color checkerboard with 8px squares.
pub fn checker(size: u32, a: [u8; 4], b: [u8; 4]) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 { Rgba(a) } else { Rgba(b) }
    })
}

/// Filled circle on a transparent background.
pub fn disc(size: u32, color: [u8; 4]) -> RgbaImage {
    let r = size as f32 * 0.5;
    RgbaImage::from_fn(size, size, |x, y| {
        let dx = x as f32 + 0.5 - r;
        let dy = y as f32 + 0.5 - r;
        if dx * dx + dy * dy <= r * r { Rgba(color) } else { Rgba([0; 4]) }
    })
}

/// Horizontal strip of `CELLS` frames: a disc that shrinks frame by frame.
pub fn sheet() -> RgbaImage {
    let palette = [[255, 196, 64, 255], [255, 128, 64, 255], [224, 64, 96, 255], [160, 64, 192, 255]];
    RgbaImage::from_fn(CELL * CELLS, CELL, |x, y| {
        let cell = x / CELL;
        let r = CELL as f32 * 0.5 - cell as f32 * 3.0;
        let dx = (x % CELL) as f32 + 0.5 - CELL as f32 * 0.5;
        let dy = y as f32 + 0.5 - CELL as f32 * 0.5;
        if dx * dx + dy * dy <= r * r {
            Rgba(palette[cell as usize])
        } else {
            Rgba([0; 4])
        }
    })
}
