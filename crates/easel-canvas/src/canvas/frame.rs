use std::fmt;

use crate::backend::Backend;
use crate::batch::BatchBuilder;

/// Position in the per-frame lifecycle.
///
/// `Idle → FrameBegun → FrameEnded → Presented → FrameBegun → …`
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FrameState {
    /// No frame has been started yet.
    Idle,
    /// Draw calls are accepted.
    FrameBegun,
    /// Batches are frozen and submitted; waiting for `present`.
    FrameEnded,
    /// The frame was handed to the display and its slot signaled.
    Presented,
}

impl FrameState {
    #[inline]
    pub(crate) fn can_begin(self) -> bool {
        matches!(self, FrameState::Idle | FrameState::Presented)
    }
}

impl fmt::Display for FrameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FrameState::Idle => "idle",
            FrameState::FrameBegun => "frame begun",
            FrameState::FrameEnded => "frame ended",
            FrameState::Presented => "presented",
        };
        f.write_str(s)
    }
}

/// Counters for one frame, finalized by `end_frame`.
///
/// Misuse counters also include calls made between the previous frame's
/// `end_frame` and this frame's `begin_frame`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: u64,
    pub quads: usize,
    pub batches: usize,
    pub vertex_buffers: usize,
    pub atlas_images: usize,
    pub texture_table: usize,
    /// Draws dropped because their image handle was stale or no frame was begun.
    pub ignored_draws: usize,
    /// Matrix pushes past the depth bound and pops on an empty stack.
    pub rejected_matrix_ops: usize,
}

/// Resources owned by one of the N rotating frame slots.
pub(crate) struct FrameSlot<B: Backend> {
    pub builder: BatchBuilder<B::Buffer>,
    pub sync: B::SyncPoint,
    /// Sync value the slot's previous frame signals on completion; 0 before first use.
    pub wait_value: u64,
}
