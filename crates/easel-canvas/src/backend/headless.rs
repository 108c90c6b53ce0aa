//! CPU-only backend that records what the canvas asks of a GPU.
//!
//! Useful for tests and offscreen tooling. Every resource call is appended to
//! an event log and every submitted frame is copied out, so callers can
//! inspect batches and vertex data after the fact. Long-running callers
//! either drain the log with [`HeadlessLog::take_frames`] and
//! [`HeadlessLog::take_events`] or bound it with
//! [`HeadlessBackend::with_frame_limit`].
//!
//! Sync points model a GPU that finishes work lazily: a signaled value only
//! completes when the CPU waits on it (the wait is then logged as blocking)
//! or when [`HeadlessLog::complete_gpu_work`] is called.

use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::atlas::AtlasRect;
use crate::batch::{DrawBatch, TextureBinding, Vertex};
use crate::config::BatchStrategy;
use crate::coords::Viewport;
use crate::error::BackendError;
use crate::image::{ImageDesc, ImageId};
use crate::paint::ClearColor;

use super::{Backend, FrameSubmission, FrameTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessBuffer {
    pub id: u32,
    pub byte_size: u64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HeadlessImageKind {
    Texture,
    RenderTarget,
    Atlas,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessImage {
    pub id: u32,
    pub width: u32,
    pub height: u32,
    pub kind: HeadlessImageKind,
    pub pixels: Vec<u8>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct HeadlessSyncPoint {
    pub id: u32,
}

/// One backend call, in the order the canvas made it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    CreateVertexBuffer { id: u32, byte_size: u64 },
    CreateIndexBuffer { id: u32, index_count: usize },
    DestroyBuffer { id: u32 },
    CreateImage { id: u32, width: u32, height: u32, kind: HeadlessImageKind },
    DestroyImage { id: u32 },
    InitSyncPoint { id: u32 },
    Signal { id: u32, value: u64 },
    /// `blocked` is set when the value had not completed yet and the CPU stalled on it.
    Wait { id: u32, value: u64, blocked: bool },
    DestroySyncPoint { id: u32 },
    Submit { frame: u64, slot: usize },
    Present,
}

/// Copy of one submitted frame.
#[derive(Debug, Clone)]
pub struct RecordedFrame {
    pub frame: u64,
    pub slot: usize,
    pub clear_color: ClearColor,
    pub target: Option<ImageId>,
    pub viewport: Viewport,
    pub batches: Vec<DrawBatch>,
    /// Backend ids of the vertex buffers used, indexed like `DrawBatch::buffer`.
    pub buffer_ids: Vec<u32>,
    /// Written vertices per used buffer.
    pub vertices: Vec<Vec<Vertex>>,
    pub atlas_uploads: Vec<(ImageId, AtlasRect)>,
    pub texture_table: Vec<ImageId>,
    /// Images referenced by batches, atlas uploads or the texture table that
    /// the submission could not resolve.
    pub unresolved: Vec<ImageId>,
}

impl RecordedFrame {
    /// Vertices of one batch, in draw order.
    pub fn batch_vertices(&self, batch: &DrawBatch) -> &[Vertex] {
        let start = batch.offset as usize;
        let len = batch.quad_count() as usize * crate::config::VERTICES_PER_QUAD;
        &self.vertices[batch.buffer][start..start + len]
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct FenceState {
    signaled: u64,
    completed: u64,
}

#[derive(Debug, Default)]
struct Recording {
    events: Vec<BackendEvent>,
    frames: Vec<RecordedFrame>,
    /// Oldest frames are dropped past this count.
    frame_limit: Option<usize>,
    fences: HashMap<u32, FenceState>,
    live_buffers: usize,
    live_images: usize,
}

/// Shared view of a [`HeadlessBackend`]'s recording; stays valid after the
/// backend (and the canvas owning it) is dropped.
#[derive(Debug, Clone)]
pub struct HeadlessLog(Rc<RefCell<Recording>>);

impl HeadlessLog {
    pub fn events(&self) -> Ref<'_, [BackendEvent]> {
        Ref::map(self.0.borrow(), |r| r.events.as_slice())
    }

    pub fn frames(&self) -> Ref<'_, [RecordedFrame]> {
        Ref::map(self.0.borrow(), |r| r.frames.as_slice())
    }

    pub fn last_frame(&self) -> Option<RecordedFrame> {
        self.0.borrow().frames.last().cloned()
    }

    /// Buffers created and not yet destroyed.
    pub fn live_buffers(&self) -> usize {
        self.0.borrow().live_buffers
    }

    /// Images (including render targets and the atlas) not yet destroyed.
    pub fn live_images(&self) -> usize {
        self.0.borrow().live_images
    }

    pub fn live_sync_points(&self) -> usize {
        self.0.borrow().fences.len()
    }

    /// Counts events matching `pred`.
    pub fn count(&self, pred: impl Fn(&BackendEvent) -> bool) -> usize {
        self.0.borrow().events.iter().filter(|e| pred(e)).count()
    }

    /// Lets the simulated GPU finish everything signaled so far.
    pub fn complete_gpu_work(&self) {
        for fence in self.0.borrow_mut().fences.values_mut() {
            fence.completed = fence.signaled;
        }
    }

    pub fn clear_events(&self) {
        self.0.borrow_mut().events.clear();
    }

    /// Removes and returns every recorded event.
    pub fn take_events(&self) -> Vec<BackendEvent> {
        std::mem::take(&mut self.0.borrow_mut().events)
    }

    /// Removes and returns every retained frame.
    pub fn take_frames(&self) -> Vec<RecordedFrame> {
        std::mem::take(&mut self.0.borrow_mut().frames)
    }
}

/// [`Backend`] that executes nothing and records everything.
#[derive(Debug)]
pub struct HeadlessBackend {
    view: Viewport,
    next_id: u32,
    fail_image_creation: bool,
    recording: Rc<RefCell<Recording>>,
}

impl HeadlessBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            view: Viewport::from_pixels(width, height),
            next_id: 1,
            fail_image_creation: false,
            recording: Rc::default(),
        }
    }

    /// Keeps only the `limit` most recent frames.
    pub fn with_frame_limit(self, limit: usize) -> Self {
        self.recording.borrow_mut().frame_limit = Some(limit);
        self
    }

    pub fn log(&self) -> HeadlessLog {
        HeadlessLog(Rc::clone(&self.recording))
    }

    pub fn set_view_size(&mut self, width: u32, height: u32) {
        self.view = Viewport::from_pixels(width, height);
    }

    /// Makes subsequent image creation fail until reset with `false`.
    pub fn fail_image_creation(&mut self, fail: bool) {
        self.fail_image_creation = fail;
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn record(&self, event: BackendEvent) {
        log::trace!("headless: {event:?}");
        self.recording.borrow_mut().events.push(event);
    }

    fn new_image(
        &mut self,
        width: u32,
        height: u32,
        kind: HeadlessImageKind,
        pixels: Vec<u8>,
    ) -> Result<HeadlessImage, BackendError> {
        if self.fail_image_creation {
            return Err(BackendError::ResourceCreation {
                what: "image",
                reason: "creation disabled on headless backend".to_string(),
            });
        }
        let id = self.next_id();
        self.record(BackendEvent::CreateImage {
            id,
            width,
            height,
            kind,
        });
        self.recording.borrow_mut().live_images += 1;
        Ok(HeadlessImage {
            id,
            width,
            height,
            kind,
            pixels,
        })
    }
}

impl Backend for HeadlessBackend {
    type Buffer = HeadlessBuffer;
    type Image = HeadlessImage;
    type SyncPoint = HeadlessSyncPoint;

    fn view_size(&self) -> Viewport {
        self.view
    }

    fn supports(&self, _strategy: BatchStrategy) -> bool {
        true
    }

    fn create_vertex_buffer(&mut self, byte_size: u64) -> Result<HeadlessBuffer, BackendError> {
        let id = self.next_id();
        self.record(BackendEvent::CreateVertexBuffer { id, byte_size });
        self.recording.borrow_mut().live_buffers += 1;
        Ok(HeadlessBuffer { id, byte_size })
    }

    fn create_index_buffer(&mut self, indices: &[u32]) -> Result<HeadlessBuffer, BackendError> {
        let id = self.next_id();
        self.record(BackendEvent::CreateIndexBuffer {
            id,
            index_count: indices.len(),
        });
        self.recording.borrow_mut().live_buffers += 1;
        Ok(HeadlessBuffer {
            id,
            byte_size: std::mem::size_of_val(indices) as u64,
        })
    }

    fn destroy_buffer(&mut self, buffer: HeadlessBuffer) {
        self.record(BackendEvent::DestroyBuffer { id: buffer.id });
        self.recording.borrow_mut().live_buffers -= 1;
    }

    fn create_image(&mut self, desc: &ImageDesc, pixels: &[u8]) -> Result<HeadlessImage, BackendError> {
        self.new_image(desc.width, desc.height, HeadlessImageKind::Texture, pixels.to_vec())
    }

    fn create_render_target_image(&mut self, width: u32, height: u32) -> Result<HeadlessImage, BackendError> {
        self.new_image(width, height, HeadlessImageKind::RenderTarget, Vec::new())
    }

    fn create_atlas_image(&mut self, width: u32, height: u32) -> Result<HeadlessImage, BackendError> {
        self.new_image(width, height, HeadlessImageKind::Atlas, Vec::new())
    }

    fn destroy_image(&mut self, image: HeadlessImage) {
        self.record(BackendEvent::DestroyImage { id: image.id });
        self.recording.borrow_mut().live_images -= 1;
    }

    fn init_frame_sync_point(&mut self) -> Result<HeadlessSyncPoint, BackendError> {
        let id = self.next_id();
        self.record(BackendEvent::InitSyncPoint { id });
        self.recording
            .borrow_mut()
            .fences
            .insert(id, FenceState::default());
        Ok(HeadlessSyncPoint { id })
    }

    fn signal_frame_sync_point(&mut self, sync: &mut HeadlessSyncPoint, value: u64) {
        self.record(BackendEvent::Signal { id: sync.id, value });
        if let Some(fence) = self.recording.borrow_mut().fences.get_mut(&sync.id) {
            fence.signaled = fence.signaled.max(value);
        }
    }

    fn wait_frame_sync_point(&mut self, sync: &mut HeadlessSyncPoint, value: u64) -> Result<(), BackendError> {
        let blocked = {
            let mut rec = self.recording.borrow_mut();
            let fence = rec.fences.entry(sync.id).or_default();
            if value <= fence.completed {
                false
            } else if value <= fence.signaled {
                fence.completed = fence.signaled;
                true
            } else {
                return Err(BackendError::FenceTimeout { value });
            }
        };
        self.record(BackendEvent::Wait {
            id: sync.id,
            value,
            blocked,
        });
        Ok(())
    }

    fn destroy_frame_sync_point(&mut self, sync: HeadlessSyncPoint) {
        self.record(BackendEvent::DestroySyncPoint { id: sync.id });
        self.recording.borrow_mut().fences.remove(&sync.id);
    }

    fn submit_frame(&mut self, frame: &FrameSubmission<'_, Self>) -> Result<(), BackendError> {
        self.record(BackendEvent::Submit {
            frame: frame.frame,
            slot: frame.slot,
        });

        let target = match frame.target {
            FrameTarget::Surface => None,
            FrameTarget::Image { id, .. } => Some(id),
        };

        let recorded = RecordedFrame {
            frame: frame.frame,
            slot: frame.slot,
            clear_color: frame.clear_color,
            target,
            viewport: frame.viewport,
            batches: frame.batches.to_vec(),
            buffer_ids: frame.vertex_buffers.iter().map(|b| b.handle().id).collect(),
            vertices: frame
                .vertex_buffers
                .iter()
                .map(|b| b.vertices().to_vec())
                .collect(),
            atlas_uploads: frame
                .atlas
                .as_ref()
                .map(|a| a.placements.to_vec())
                .unwrap_or_default(),
            texture_table: frame.texture_table.to_vec(),
            unresolved: unresolved_images(frame),
        };

        let mut rec = self.recording.borrow_mut();
        rec.frames.push(recorded);
        if let Some(limit) = rec.frame_limit {
            let excess = rec.frames.len().saturating_sub(limit);
            rec.frames.drain(..excess);
        }
        Ok(())
    }

    fn present(&mut self) -> Result<(), BackendError> {
        self.record(BackendEvent::Present);
        Ok(())
    }
}

fn unresolved_images(frame: &FrameSubmission<'_, HeadlessBackend>) -> Vec<ImageId> {
    let batches = frame.batches.iter().filter_map(|b| match b.binding {
        TextureBinding::Image(id) => Some(id),
        TextureBinding::Atlas | TextureBinding::Table => None,
    });
    let uploads = frame.atlas.iter().flat_map(|a| a.placements.iter().map(|(id, _)| *id));
    let table = frame.texture_table.iter().copied();

    let mut missing: Vec<ImageId> = batches
        .chain(uploads)
        .chain(table)
        .filter(|id| frame.image(*id).is_none())
        .collect();
    missing.sort_unstable();
    missing.dedup();
    missing
}
