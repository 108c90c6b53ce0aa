use std::mem::size_of;

use crate::backend::Backend;
use crate::batch::{TextureBinding, Vertex};
use crate::config::{BatchStrategy, MAX_VERTICES_PER_BUFFER};
use crate::coords::{Rect, Vec2};
use crate::error::{fatal, CanvasError};
use crate::image::ImageId;
use crate::paint::Color;

use super::frame::FrameState;
use super::Canvas;

/// Source frame covering the whole 2x2 white image.
const WHITE_FRAME: Rect = Rect::new(0.0, 0.0, 2.0, 2.0);

/// Texture coordinates and binding a quad samples with.
struct Sampling {
    binding: TextureBinding,
    /// `[u0, v0, u1, v1]`
    uv: [f32; 4],
    texture_index: u32,
}

impl<B: Backend> Canvas<B> {
    /// Fills an axis-aligned rect (before transform) with `color`.
    pub fn draw_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        let Some(white) = self.drawable_white() else {
            return;
        };
        self.draw_textured(Rect::new(x, y, width, height), WHITE_FRAME, color, white);
    }

    /// Draws a `width`-thick line from `(x0, y0)` to `(x1, y1)`.
    ///
    /// Zero-length lines draw nothing.
    pub fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, width: f32, color: Color) {
        let Some(white) = self.drawable_white() else {
            return;
        };

        let p0 = Vec2::new(x0, y0);
        let p1 = Vec2::new(x1, y1);
        let dir = p1 - p0;
        let len = dir.length();
        if len == 0.0 {
            return;
        }
        let o = dir.perp() * (width * 0.5 / len);

        let Some(sampling) = self.resolve_sampling(white, WHITE_FRAME) else {
            return;
        };
        let [u0, v0, u1, v1] = sampling.uv;
        let corners = [(p1 + o, u0, v0), (p0 + o, u0, v1), (p0 - o, u1, v1), (p1 - o, u1, v0)];
        let quad = corners.map(|(p, u, v)| {
            let mut vertex = Vertex::new(p.x, p.y, u, v, color);
            vertex.texture_index = sampling.texture_index;
            vertex
        });
        self.push_quad(quad, sampling.binding);
    }

    /// Draws the whole image at its natural size.
    pub fn draw_image(&mut self, x: f32, y: f32, image: ImageId) {
        self.draw_image_tinted(x, y, Color::WHITE, image);
    }

    pub fn draw_image_tinted(&mut self, x: f32, y: f32, color: Color, image: ImageId) {
        let Some((w, h)) = self.drawable_size(image) else {
            return;
        };
        self.draw_textured(Rect::new(x, y, w, h), Rect::from_size(w, h), color, image);
    }

    /// Draws the whole image stretched to `width × height`.
    pub fn draw_image_sized(&mut self, x: f32, y: f32, width: f32, height: f32, image: ImageId) {
        self.draw_image_sized_tinted(x, y, width, height, Color::WHITE, image);
    }

    pub fn draw_image_sized_tinted(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color, image: ImageId) {
        let Some((w, h)) = self.drawable_size(image) else {
            return;
        };
        self.draw_textured(Rect::new(x, y, width, height), Rect::from_size(w, h), color, image);
    }

    /// Draws the `frame` sub-rectangle of the image (in image pixels) at its own size.
    pub fn draw_image_frame(&mut self, x: f32, y: f32, frame: Rect, color: Color, image: ImageId) {
        self.draw_image_frame_sized(x, y, frame.width, frame.height, frame, color, image);
    }

    /// Draws the `frame` sub-rectangle of the image stretched to `width × height`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_image_frame_sized(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        frame: Rect,
        color: Color,
        image: ImageId,
    ) {
        if self.drawable_size(image).is_none() {
            return;
        }
        self.draw_textured(Rect::new(x, y, width, height), frame, color, image);
    }

    // ── shared path ──────────────────────────────────────────────────────

    fn draw_textured(&mut self, dst: Rect, frame: Rect, color: Color, image: ImageId) {
        let Some(sampling) = self.resolve_sampling(image, frame) else {
            return;
        };
        let [u0, v0, u1, v1] = sampling.uv;
        let [tl, bl, br, tr] = dst.corners();
        let quad = [(tl, u0, v0), (bl, u0, v1), (br, u1, v1), (tr, u1, v0)].map(|(p, u, v)| {
            let mut vertex = Vertex::new(p.x, p.y, u, v, color);
            vertex.texture_index = sampling.texture_index;
            vertex
        });
        self.push_quad(quad, sampling.binding);
    }

    /// Maps `frame` (image pixels) to texture coordinates for the active strategy.
    ///
    /// In atlas mode this places the image on first use this frame.
    fn resolve_sampling(&mut self, image: ImageId, frame: Rect) -> Option<Sampling> {
        let Some(entry) = self.images.get(image) else {
            self.ignore_stale(image);
            return None;
        };
        let (width, height) = (entry.width, entry.height);

        let sampling = match self.config.strategy {
            BatchStrategy::PerTexture => Sampling {
                binding: TextureBinding::Image(image),
                uv: frame.normalized_in(Vec2::zero(), width as f32, height as f32),
                texture_index: 0,
            },
            BatchStrategy::Atlas => {
                let Some(atlas) = self.atlas.as_mut() else {
                    unreachable!("atlas strategy always owns an atlas");
                };
                let placement = match atlas.packer.add_image(image, width, height) {
                    Ok(p) => p,
                    Err(_) => fatal(CanvasError::AtlasExhausted { width, height }),
                };
                let (aw, ah) = atlas.packer.size();
                Sampling {
                    binding: TextureBinding::Atlas,
                    uv: frame.normalized_in(placement.rect.uv_offset(), aw as f32, ah as f32),
                    texture_index: 0,
                }
            }
            BatchStrategy::Bindless => {
                let Some(slot) = self.texture_table.slot_for(image) else {
                    fatal(CanvasError::TextureTableLimit {
                        max: self.texture_table.max(),
                    });
                };
                Sampling {
                    binding: TextureBinding::Table,
                    uv: frame.normalized_in(Vec2::zero(), width as f32, height as f32),
                    texture_index: slot,
                }
            }
        };
        Some(sampling)
    }

    fn push_quad(&mut self, quad: [Vertex; 4], binding: TextureBinding) {
        let matrix = *self.transforms.current();
        let backend = &mut self.backend;
        let builder = &mut self.slots[self.slot].builder;
        let byte_size = (MAX_VERTICES_PER_BUFFER * size_of::<Vertex>()) as u64;

        if let Err(err) = builder.push_quad(quad, binding, &matrix, || backend.create_vertex_buffer(byte_size)) {
            fatal(err.into());
        }
    }

    // ── guards ───────────────────────────────────────────────────────────

    /// `true` while draw calls are accepted; counts and warns otherwise.
    fn accepting_draws(&mut self) -> bool {
        if self.state == FrameState::FrameBegun {
            return true;
        }
        self.draws_outside_frame += 1;
        self.stats.ignored_draws += 1;
        log::warn!("draw call ignored: no frame begun (state: {})", self.state);
        false
    }

    fn drawable_white(&mut self) -> Option<ImageId> {
        if !self.accepting_draws() {
            return None;
        }
        self.white_image
    }

    fn drawable_size(&mut self, image: ImageId) -> Option<(f32, f32)> {
        if !self.accepting_draws() {
            return None;
        }
        match self.images.get(image) {
            Some(entry) => Some((entry.width as f32, entry.height as f32)),
            None => {
                self.ignore_stale(image);
                None
            }
        }
    }

    fn ignore_stale(&mut self, image: ImageId) {
        self.stats.ignored_draws += 1;
        log::warn!("draw call ignored: stale image handle {image:?}");
    }
}
