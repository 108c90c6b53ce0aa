//! The canvas: transform stack, quad batching and frame pacing over a [`Backend`].
//!
//! Frames go through `begin_frame → draw calls → end_frame → present`. Each
//! frame uses one of `frames_in_flight` slots in rotation. A slot's vertex
//! buffers are only rewritten after `begin_frame` has waited for the GPU to
//! finish the frame that last used them.

mod draw;
mod frame;
mod images;

#[cfg(test)]
mod tests;

pub use frame::{FrameState, FrameStats};

use crate::atlas::TexturePacker;
use crate::backend::{AtlasFrame, Backend, FrameSubmission, FrameTarget};
use crate::batch::{quad_indices, BatchBuilder, TextureTable};
use crate::config::{BatchStrategy, CanvasConfig, MAX_QUADS_PER_BUFFER};
use crate::coords::{Affine2, TransformStack, Viewport};
use crate::error::{fatal, BackendError, CanvasError};
use crate::image::{ImageId, ImageKind, ImageRegistry, RetiredImage};
use crate::paint::ClearColor;

use frame::FrameSlot;

/// Atlas packer plus its lazily created backing texture.
struct CanvasAtlas<I> {
    packer: TexturePacker,
    image: Option<I>,
}

/// Immediate-mode 2D canvas.
pub struct Canvas<B: Backend> {
    backend: B,
    config: CanvasConfig,
    state: FrameState,

    slots: Vec<FrameSlot<B>>,
    slot: usize,
    /// Value the current frame signals at `present`; starts at 1.
    frame_counter: u64,
    /// Highest sync value known to have completed on the GPU.
    completed_frame: u64,

    transforms: TransformStack,
    images: ImageRegistry<B::Image>,
    retired: Vec<RetiredImage<B::Image>>,

    index_buffer: Option<B::Buffer>,
    white_image: Option<ImageId>,
    atlas: Option<CanvasAtlas<B::Image>>,
    texture_table: TextureTable,

    target: Option<ImageId>,
    clear_color: ClearColor,
    viewport: Viewport,

    stats: FrameStats,
    last_stats: FrameStats,
    draws_outside_frame: u64,
}

impl<B: Backend> Canvas<B> {
    /// Creates a canvas over `backend`.
    ///
    /// The shared index buffer and one sync point per frame slot are created
    /// here; the white image and atlas texture are created by the first
    /// `begin_frame`.
    pub fn new(mut backend: B, config: CanvasConfig) -> Result<Self, CanvasError> {
        config.validate()?;
        if !backend.supports(config.strategy) {
            return Err(BackendError::Unsupported(format!("{:?} batching", config.strategy)).into());
        }

        let index_buffer = backend.create_index_buffer(&quad_indices(MAX_QUADS_PER_BUFFER))?;

        let mut slots = Vec::with_capacity(config.frames_in_flight);
        for _ in 0..config.frames_in_flight {
            slots.push(FrameSlot {
                builder: BatchBuilder::new(
                    config.max_vertex_buffers_per_frame,
                    config.max_batches_per_frame,
                ),
                sync: backend.init_frame_sync_point()?,
                wait_value: 0,
            });
        }

        let atlas = (config.strategy == BatchStrategy::Atlas).then(|| CanvasAtlas {
            packer: TexturePacker::new(config.atlas_size.0, config.atlas_size.1),
            image: None,
        });

        log::info!(
            "canvas created: {} frame(s) in flight, {:?} batching",
            config.frames_in_flight,
            config.strategy
        );

        Ok(Self {
            viewport: backend.view_size(),
            backend,
            state: FrameState::Idle,
            slots,
            slot: 0,
            frame_counter: 1,
            completed_frame: 0,
            transforms: TransformStack::new(config.max_matrix_stack_depth),
            images: ImageRegistry::new(),
            retired: Vec::new(),
            index_buffer: Some(index_buffer),
            white_image: None,
            atlas,
            texture_table: TextureTable::new(config.max_bindless_textures),
            target: None,
            clear_color: ClearColor::BLACK,
            stats: FrameStats::default(),
            last_stats: FrameStats::default(),
            draws_outside_frame: 0,
            config,
        })
    }

    // ── accessors ────────────────────────────────────────────────────────

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[inline]
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    #[inline]
    pub fn frame_state(&self) -> FrameState {
        self.state
    }

    /// Slot the current (or next) frame records into.
    #[inline]
    pub fn frame_slot(&self) -> usize {
        self.slot
    }

    /// Counter value of the current (or next) frame.
    #[inline]
    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    /// Stats of the last frame passed to `end_frame`.
    #[inline]
    pub fn last_frame_stats(&self) -> FrameStats {
        self.last_stats
    }

    /// Draw calls rejected because no frame was being recorded.
    #[inline]
    pub fn draws_outside_frame(&self) -> u64 {
        self.draws_outside_frame
    }

    /// The reserved opaque white image, once the first frame has begun.
    #[inline]
    pub fn white_image(&self) -> Option<ImageId> {
        self.white_image
    }

    /// Width of the frame's target, or of the backend surface between frames.
    pub fn view_width(&self) -> f32 {
        self.current_viewport().width
    }

    pub fn view_height(&self) -> f32 {
        self.current_viewport().height
    }

    fn current_viewport(&self) -> Viewport {
        match self.state {
            FrameState::FrameBegun | FrameState::FrameEnded => self.viewport,
            FrameState::Idle | FrameState::Presented => self.backend.view_size(),
        }
    }

    // ── transform stack ──────────────────────────────────────────────────

    #[inline]
    pub fn current_matrix(&self) -> &Affine2 {
        self.transforms.current()
    }

    /// Saves the current matrix. Past the depth bound the push is dropped
    /// with a warning and counted in [`FrameStats::rejected_matrix_ops`].
    pub fn push_matrix(&mut self) {
        if let Err(err) = self.transforms.push() {
            log::warn!("push_matrix ignored: {err}");
            self.stats.rejected_matrix_ops += 1;
        }
    }

    /// Restores the last saved matrix. On an empty stack the pop is dropped
    /// with a warning and counted in [`FrameStats::rejected_matrix_ops`].
    pub fn pop_matrix(&mut self) {
        if let Err(err) = self.transforms.pop() {
            log::warn!("pop_matrix ignored: {err}");
            self.stats.rejected_matrix_ops += 1;
        }
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.transforms.translate(x, y);
    }

    pub fn rotate(&mut self, radians: f32) {
        self.transforms.rotate(radians);
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.transforms.scale(x, y);
    }

    pub fn load_identity(&mut self) {
        self.transforms.load_identity();
    }

    // ── lifecycle ────────────────────────────────────────────────────────

    /// Starts a frame drawn to the backend surface.
    pub fn begin_frame(&mut self, clear: ClearColor) -> Result<(), CanvasError> {
        self.begin(None, clear)
    }

    /// Starts a frame drawn into `target`, which must be a render target image.
    pub fn begin_frame_with_target(&mut self, target: ImageId, clear: ClearColor) -> Result<(), CanvasError> {
        match self.images.get(target) {
            Some(entry) if entry.kind == ImageKind::RenderTarget => self.begin(Some(target), clear),
            _ => Err(CanvasError::InvalidRenderTarget),
        }
    }

    fn begin(&mut self, target: Option<ImageId>, clear: ClearColor) -> Result<(), CanvasError> {
        if !self.state.can_begin() {
            return Err(CanvasError::FrameState {
                expected: "idle or presented",
                found: self.state,
            });
        }

        self.ensure_frame_resources()?;

        let slot = &mut self.slots[self.slot];
        if let Err(err) = self.backend.wait_frame_sync_point(&mut slot.sync, slot.wait_value) {
            fatal(err.into());
        }
        self.completed_frame = self.completed_frame.max(slot.wait_value);
        slot.builder.reset();
        self.release_retired_images();

        if let Some(atlas) = self.atlas.as_mut() {
            atlas.packer.reset();
        }
        self.texture_table.clear();

        self.viewport = match target.and_then(|id| self.images.get(id)) {
            Some(entry) => Viewport::from_pixels(entry.width, entry.height),
            None => self.backend.view_size(),
        };
        self.target = target;
        self.clear_color = clear;
        // Misuse between frames is reported with the frame that follows it.
        self.stats = FrameStats {
            frame: self.frame_counter,
            ignored_draws: self.stats.ignored_draws,
            rejected_matrix_ops: self.stats.rejected_matrix_ops,
            ..FrameStats::default()
        };
        self.state = FrameState::FrameBegun;

        log::trace!("frame {} begun on slot {}", self.frame_counter, self.slot);
        Ok(())
    }

    /// Freezes the frame's batches and hands them to the backend.
    ///
    /// A recoverable backend error (for example a lost surface) means the
    /// frame was skipped; `present` must still be called to advance the slot.
    pub fn end_frame(&mut self) -> Result<(), CanvasError> {
        if self.state != FrameState::FrameBegun {
            return Err(CanvasError::FrameState {
                expected: "frame begun",
                found: self.state,
            });
        }
        self.state = FrameState::FrameEnded;

        let slot = &self.slots[self.slot];
        self.stats.quads = slot.builder.quad_count();
        self.stats.batches = slot.builder.batches().len();
        self.stats.vertex_buffers = slot.builder.buffers().len();
        self.stats.atlas_images = self
            .atlas
            .as_ref()
            .map_or(0, |a| a.packer.placements().len());
        self.stats.texture_table = self.texture_table.ids().len();
        self.last_stats = self.stats;
        self.stats.ignored_draws = 0;
        self.stats.rejected_matrix_ops = 0;

        let target = match self.target {
            None => FrameTarget::Surface,
            Some(id) => match self.images.get(id) {
                Some(entry) => FrameTarget::Image { id, image: &entry.gpu },
                None => {
                    log::warn!("render target destroyed while recording; frame {} skipped", self.frame_counter);
                    return Ok(());
                }
            },
        };

        let Some(index_buffer) = self.index_buffer.as_ref() else {
            unreachable!("index buffer lives until the canvas is dropped");
        };

        let atlas = self.atlas.as_ref().and_then(|a| {
            a.image.as_ref().map(|image| {
                let (width, height) = a.packer.size();
                AtlasFrame {
                    image,
                    width,
                    height,
                    placements: a.packer.placements(),
                }
            })
        });

        let submission = FrameSubmission {
            frame: self.frame_counter,
            slot: self.slot,
            clear_color: self.clear_color,
            target,
            viewport: self.viewport,
            index_buffer,
            vertex_buffers: slot.builder.buffers(),
            batches: slot.builder.batches(),
            images: &self.images,
            retired: &self.retired,
            atlas,
            texture_table: self.texture_table.ids(),
        };

        log::trace!(
            "frame {}: {} quads in {} batches over {} vertex buffers",
            self.stats.frame,
            self.stats.quads,
            self.stats.batches,
            self.stats.vertex_buffers
        );

        self.backend.submit_frame(&submission)?;
        Ok(())
    }

    /// Displays the frame, signals its slot and advances to the next slot.
    ///
    /// The slot is signaled even when the backend fails to present, so
    /// pacing stays consistent after a skipped frame.
    pub fn present(&mut self) -> Result<(), CanvasError> {
        if self.state != FrameState::FrameEnded {
            return Err(CanvasError::FrameState {
                expected: "frame ended",
                found: self.state,
            });
        }

        let presented = match self.target {
            None => self.backend.present(),
            Some(_) => Ok(()),
        };

        let value = self.frame_counter;
        let slot = &mut self.slots[self.slot];
        self.backend.signal_frame_sync_point(&mut slot.sync, value);
        slot.wait_value = value;

        self.frame_counter += 1;
        self.slot = (self.slot + 1) % self.slots.len();
        self.target = None;
        self.state = FrameState::Presented;

        presented.map_err(Into::into)
    }

    /// Creates the white image and the atlas texture on first use.
    fn ensure_frame_resources(&mut self) -> Result<(), CanvasError> {
        if self.white_image.is_none() {
            let id = self.create_image_of_kind(2, 2, &[0xFF; 16], ImageKind::Internal)?;
            log::debug!("created reserved white image");
            self.white_image = Some(id);
        }

        if let Some(atlas) = self.atlas.as_mut() {
            if atlas.image.is_none() {
                let (w, h) = atlas.packer.size();
                atlas.image = Some(self.backend.create_atlas_image(w, h)?);
                log::debug!("created {w}x{h} atlas texture");
            }
        }
        Ok(())
    }
}

impl<B: Backend> Drop for Canvas<B> {
    fn drop(&mut self) {
        for slot in &mut self.slots {
            if let Err(err) = self.backend.wait_frame_sync_point(&mut slot.sync, slot.wait_value) {
                log::error!("teardown wait failed: {err}");
            }
        }

        for mut slot in self.slots.drain(..) {
            for buffer in slot.builder.pool_mut().drain() {
                self.backend.destroy_buffer(buffer);
            }
            self.backend.destroy_frame_sync_point(slot.sync);
        }

        if let Some(buffer) = self.index_buffer.take() {
            self.backend.destroy_buffer(buffer);
        }
        for (_, entry) in self.images.drain() {
            self.backend.destroy_image(entry.gpu);
        }
        for retired in self.retired.drain(..) {
            self.backend.destroy_image(retired.image);
        }
        if let Some(image) = self.atlas.as_mut().and_then(|a| a.image.take()) {
            self.backend.destroy_image(image);
        }

        log::debug!("canvas destroyed after {} frame(s)", self.frame_counter - 1);
    }
}
