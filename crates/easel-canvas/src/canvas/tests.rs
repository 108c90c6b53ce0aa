use super::*;
use crate::backend::headless::{BackendEvent, HeadlessBackend, HeadlessLog, RecordedFrame};
use crate::batch::TextureBinding;
use crate::coords::Rect;
use crate::image::ImageFormat;
use crate::paint::Color;

fn canvas_with(config: CanvasConfig) -> (Canvas<HeadlessBackend>, HeadlessLog) {
    let backend = HeadlessBackend::new(320, 240);
    let log = backend.log();
    (Canvas::new(backend, config).unwrap(), log)
}

fn canvas() -> (Canvas<HeadlessBackend>, HeadlessLog) {
    canvas_with(CanvasConfig::default())
}

fn solid_image(c: &mut Canvas<HeadlessBackend>, w: u32, h: u32) -> ImageId {
    let pixels = vec![0x80; (w * h * 4) as usize];
    c.create_image(w, h, &pixels, ImageFormat::Rgba8Unorm).unwrap()
}

fn run_frame(c: &mut Canvas<HeadlessBackend>, draw: impl FnOnce(&mut Canvas<HeadlessBackend>)) {
    c.begin_frame(ClearColor::BLACK).unwrap();
    draw(c);
    c.end_frame().unwrap();
    c.present().unwrap();
}

fn last(log: &HeadlessLog) -> RecordedFrame {
    log.last_frame().expect("a frame was submitted")
}

fn uv_bounds(frame: &RecordedFrame) -> ([f32; 2], [f32; 2]) {
    let v = frame.batch_vertices(&frame.batches[0]);
    (v[0].tex_coord, v[2].tex_coord)
}

// ── construction ─────────────────────────────────────────────────────────

#[test]
fn new_creates_index_buffer_and_one_sync_point_per_slot() {
    let (c, log) = canvas();
    assert_eq!(c.frame_state(), FrameState::Idle);
    assert_eq!(c.frame_counter(), 1);

    let events = log.events();
    assert_eq!(
        events[0],
        BackendEvent::CreateIndexBuffer {
            id: 1,
            index_count: MAX_QUADS_PER_BUFFER * 6,
        }
    );
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, BackendEvent::InitSyncPoint { .. }))
            .count(),
        2
    );
}

#[test]
fn invalid_config_is_rejected() {
    let backend = HeadlessBackend::new(8, 8);
    let config = CanvasConfig {
        frames_in_flight: 0,
        ..Default::default()
    };
    assert!(matches!(Canvas::new(backend, config), Err(CanvasError::InvalidConfig(_))));
}

// ── draw scenarios ───────────────────────────────────────────────────────

#[test]
fn draw_rect_binds_white_image_with_packed_color() {
    let (mut c, log) = canvas();
    run_frame(&mut c, |c| c.draw_rect(10.0, 10.0, 50.0, 20.0, Color(0xFF0000FF)));

    let frame = last(&log);
    let white = c.white_image().unwrap();
    assert_eq!(frame.batches.len(), 1);
    assert_eq!(frame.batches[0].binding, TextureBinding::Image(white));
    assert_eq!(frame.batches[0].index_count, 6);

    let v = frame.batch_vertices(&frame.batches[0]);
    let positions: Vec<[f32; 2]> = v.iter().map(|v| v.position).collect();
    assert_eq!(positions, vec![[10.0, 10.0], [10.0, 30.0], [60.0, 30.0], [60.0, 10.0]]);
    assert!(v.iter().all(|v| v.color == 0xFF0000FF));
}

#[test]
fn draw_rect_corners_follow_current_transform() {
    let (mut c, log) = canvas();
    run_frame(&mut c, |c| {
        c.translate(100.0, 50.0);
        c.scale(2.0, 2.0);
        c.draw_rect(0.0, 0.0, 10.0, 5.0, Color::WHITE);
    });

    let frame = last(&log);
    let v = frame.batch_vertices(&frame.batches[0]);
    assert_eq!(v[0].position, [100.0, 50.0]);
    assert_eq!(v[2].position, [120.0, 60.0]);
}

#[test]
fn whole_image_maps_to_unit_uvs() {
    let (mut c, log) = canvas();
    let img = solid_image(&mut c, 64, 32);
    run_frame(&mut c, |c| c.draw_image(0.0, 0.0, img));

    let frame = last(&log);
    assert_eq!(frame.batches[0].binding, TextureBinding::Image(img));
    assert_eq!(uv_bounds(&frame), ([0.0, 0.0], [1.0, 1.0]));
    let v = frame.batch_vertices(&frame.batches[0]);
    assert_eq!(v[2].position, [64.0, 32.0]);
}

#[test]
fn image_frame_maps_to_sub_rect_uvs() {
    let (mut c, log) = canvas();
    let img = solid_image(&mut c, 64, 32);
    run_frame(&mut c, |c| {
        c.draw_image_frame(5.0, 5.0, Rect::new(16.0, 0.0, 16.0, 16.0), Color::WHITE, img)
    });

    let frame = last(&log);
    assert_eq!(uv_bounds(&frame), ([0.25, 0.0], [0.5, 0.5]));
    let v = frame.batch_vertices(&frame.batches[0]);
    assert_eq!(v[0].position, [5.0, 5.0]);
    assert_eq!(v[2].position, [21.0, 21.0]);
}

#[test]
fn sized_and_tinted_draws_stretch_and_color() {
    let (mut c, log) = canvas();
    let img = solid_image(&mut c, 8, 8);
    let tint = Color::from_rgba8(10, 20, 30, 255);
    run_frame(&mut c, |c| c.draw_image_sized_tinted(0.0, 0.0, 40.0, 16.0, tint, img));

    let frame = last(&log);
    let v = frame.batch_vertices(&frame.batches[0]);
    assert_eq!(v[2].position, [40.0, 16.0]);
    assert_eq!(v[2].tex_coord, [1.0, 1.0]);
    assert!(v.iter().all(|v| v.color == tint.0));
}

#[test]
fn line_is_a_quad_around_its_axis() {
    let (mut c, log) = canvas();
    run_frame(&mut c, |c| c.draw_line(0.0, 0.0, 10.0, 0.0, 4.0, Color::BLACK));

    let frame = last(&log);
    let v = frame.batch_vertices(&frame.batches[0]);
    let positions: Vec<[f32; 2]> = v.iter().map(|v| v.position).collect();
    assert_eq!(positions, vec![[10.0, 2.0], [0.0, 2.0], [0.0, -2.0], [10.0, -2.0]]);
}

#[test]
fn zero_length_line_draws_nothing() {
    let (mut c, log) = canvas();
    run_frame(&mut c, |c| c.draw_line(3.0, 3.0, 3.0, 3.0, 2.0, Color::WHITE));
    assert!(last(&log).batches.is_empty());
}

#[test]
fn same_image_merges_and_alternating_images_split() {
    let (mut c, log) = canvas();
    let a = solid_image(&mut c, 4, 4);
    let b = solid_image(&mut c, 4, 4);

    run_frame(&mut c, |c| {
        for i in 0..6 {
            c.draw_image(i as f32, 0.0, a);
        }
    });
    let merged = last(&log);
    assert_eq!(merged.batches.len(), 1);
    assert_eq!(merged.batches[0].index_count, 36);

    run_frame(&mut c, |c| {
        for i in 0..6 {
            c.draw_image(i as f32, 0.0, if i % 2 == 0 { a } else { b });
        }
    });
    let split = last(&log);
    assert_eq!(split.batches.len(), 6);
    assert!(split.batches.iter().all(|b| b.index_count == 6));
}

// ── frame pacing ─────────────────────────────────────────────────────────

#[test]
fn third_frame_waits_for_first_before_reusing_slot_zero() {
    let (mut c, log) = canvas();
    for _ in 0..3 {
        run_frame(&mut c, |c| c.draw_rect(0.0, 0.0, 1.0, 1.0, Color::WHITE));
    }

    let events = log.events();
    let submit3 = events
        .iter()
        .position(|e| *e == BackendEvent::Submit { frame: 3, slot: 0 })
        .unwrap();
    let wait = events[..submit3]
        .iter()
        .rev()
        .find_map(|e| match e {
            BackendEvent::Wait { value, blocked, .. } => Some((*value, *blocked)),
            _ => None,
        })
        .unwrap();
    assert_eq!(wait, (1, true));

    let frames = log.frames();
    assert_eq!(frames[0].slot, 0);
    assert_eq!(frames[1].slot, 1);
    assert_eq!(frames[2].slot, 0);
    assert_eq!(frames[2].buffer_ids, frames[0].buffer_ids);
}

#[test]
fn present_signals_slot_with_frame_counter() {
    let (mut c, log) = canvas();
    run_frame(&mut c, |_| {});
    run_frame(&mut c, |_| {});

    let signals: Vec<u64> = log
        .events()
        .iter()
        .filter_map(|e| match e {
            BackendEvent::Signal { value, .. } => Some(*value),
            _ => None,
        })
        .collect();
    assert_eq!(signals, vec![1, 2]);
    assert_eq!(c.frame_counter(), 3);
    assert_eq!(c.frame_slot(), 0);
}

#[test]
fn steady_state_frame_only_paces_and_submits() {
    let (mut c, log) = canvas();
    let draw = |c: &mut Canvas<HeadlessBackend>| c.draw_rect(0.0, 0.0, 4.0, 4.0, Color::WHITE);
    run_frame(&mut c, draw);
    run_frame(&mut c, draw);
    log.clear_events();

    run_frame(&mut c, draw);
    let events = log.events();
    assert!(matches!(events[0], BackendEvent::Wait { value: 1, .. }));
    assert!(matches!(events[1], BackendEvent::Submit { frame: 3, slot: 0 }));
    assert_eq!(events[2], BackendEvent::Present);
    assert!(matches!(events[3], BackendEvent::Signal { value: 3, .. }));
    assert_eq!(events.len(), 4);
}

#[test]
fn vertex_buffers_are_never_recreated_across_frames() {
    let (mut c, log) = canvas();
    for _ in 0..6 {
        run_frame(&mut c, |c| c.draw_rect(0.0, 0.0, 1.0, 1.0, Color::WHITE));
    }
    assert_eq!(log.count(|e| matches!(e, BackendEvent::CreateVertexBuffer { .. })), 2);
    assert_eq!(log.count(|e| matches!(e, BackendEvent::DestroyBuffer { .. })), 0);
}

// ── lifecycle misuse ─────────────────────────────────────────────────────

#[test]
fn lifecycle_misuse_returns_frame_state_errors() {
    let (mut c, _log) = canvas();

    assert_eq!(
        c.end_frame(),
        Err(CanvasError::FrameState {
            expected: "frame begun",
            found: FrameState::Idle,
        })
    );
    assert!(matches!(c.present(), Err(CanvasError::FrameState { .. })));

    c.begin_frame(ClearColor::BLACK).unwrap();
    assert!(matches!(
        c.begin_frame(ClearColor::BLACK),
        Err(CanvasError::FrameState {
            found: FrameState::FrameBegun,
            ..
        })
    ));
    assert_eq!(c.frame_state(), FrameState::FrameBegun);

    c.end_frame().unwrap();
    assert!(matches!(c.end_frame(), Err(CanvasError::FrameState { .. })));
    c.present().unwrap();
    assert_eq!(c.frame_state(), FrameState::Presented);
}

#[test]
fn draws_outside_a_frame_are_ignored_and_counted() {
    let (mut c, log) = canvas();
    c.draw_rect(0.0, 0.0, 1.0, 1.0, Color::WHITE);
    assert_eq!(c.draws_outside_frame(), 1);

    run_frame(&mut c, |_| {});
    c.draw_rect(0.0, 0.0, 1.0, 1.0, Color::WHITE);
    assert_eq!(c.draws_outside_frame(), 2);
    assert!(log.frames().iter().all(|f| f.batches.is_empty()));
}

#[test]
fn stack_misuse_soft_fails_and_is_counted() {
    let config = CanvasConfig {
        max_matrix_stack_depth: 1,
        ..Default::default()
    };
    let (mut c, _log) = canvas_with(config);
    c.begin_frame(ClearColor::BLACK).unwrap();
    c.pop_matrix();
    c.translate(5.0, 0.0);
    c.push_matrix();
    c.push_matrix();
    c.pop_matrix();
    c.end_frame().unwrap();

    assert_eq!(c.last_frame_stats().rejected_matrix_ops, 2);
    assert_eq!(c.current_matrix().tx, 5.0);
}

#[test]
fn stale_image_draw_is_ignored() {
    let (mut c, log) = canvas();
    let img = solid_image(&mut c, 4, 4);
    assert!(c.destroy_image(img));
    run_frame(&mut c, |c| c.draw_image(0.0, 0.0, img));

    assert!(last(&log).batches.is_empty());
    assert_eq!(c.last_frame_stats().ignored_draws, 1);
}

// ── images ───────────────────────────────────────────────────────────────

#[test]
fn image_queries_and_validation() {
    let (mut c, _log) = canvas();
    let img = solid_image(&mut c, 64, 32);
    assert_eq!(c.image_width(img), Some(64));
    assert_eq!(c.image_height(img), Some(32));
    assert_eq!(c.image_info(img).unwrap().kind, ImageKind::Texture);

    assert_eq!(
        c.create_image(0, 4, &[], ImageFormat::Rgba8Unorm),
        Err(CanvasError::EmptyImage { width: 0, height: 4 })
    );
    assert_eq!(
        c.create_image(2, 2, &[0; 3], ImageFormat::Rgba8Unorm),
        Err(CanvasError::PixelDataSize {
            expected: 16,
            actual: 3
        })
    );
}

#[test]
fn backend_image_failure_is_returned() {
    let (mut c, _log) = canvas();
    c.backend_mut().fail_image_creation(true);
    let err = c.create_image(1, 1, &[0; 4], ImageFormat::Rgba8Unorm);
    assert!(matches!(err, Err(CanvasError::Backend(BackendError::ResourceCreation { .. }))));
}

#[test]
fn white_image_cannot_be_destroyed() {
    let (mut c, _log) = canvas();
    run_frame(&mut c, |_| {});
    let white = c.white_image().unwrap();
    assert!(!c.destroy_image(white));
    assert_eq!(c.image_width(white), Some(2));
}

#[test]
fn destroyed_image_is_released_after_its_frames_retire() {
    let (mut c, log) = canvas();
    let img = solid_image(&mut c, 4, 4);
    run_frame(&mut c, |c| c.draw_image(0.0, 0.0, img));

    assert!(c.destroy_image(img));
    assert!(!c.destroy_image(img));
    assert_eq!(c.image_width(img), None);
    assert_eq!(c.pending_image_releases(), 1);

    // Frame 2 runs on slot 1; frame 1 has not been waited on yet.
    run_frame(&mut c, |_| {});
    assert_eq!(c.pending_image_releases(), 1);

    // Frame 3 waits for frame 1 on slot 0.
    c.begin_frame(ClearColor::BLACK).unwrap();
    assert_eq!(c.pending_image_releases(), 0);
    assert_eq!(log.count(|e| matches!(e, BackendEvent::DestroyImage { .. })), 1);
}

#[test]
fn image_never_drawn_is_released_immediately() {
    let (mut c, _log) = canvas();
    let img = solid_image(&mut c, 4, 4);
    assert!(c.destroy_image(img));
    assert_eq!(c.pending_image_releases(), 0);
}

#[test]
fn image_destroyed_mid_frame_still_resolves_for_that_frame() {
    let (mut c, log) = canvas();
    let img = solid_image(&mut c, 4, 4);

    c.begin_frame(ClearColor::BLACK).unwrap();
    c.draw_image(0.0, 0.0, img);
    assert!(c.destroy_image(img));
    c.draw_image(8.0, 0.0, img);
    c.end_frame().unwrap();
    c.present().unwrap();

    let frame = last(&log);
    assert_eq!(frame.batches.len(), 1);
    assert_eq!(frame.batches[0].binding, TextureBinding::Image(img));
    assert_eq!(frame.batches[0].quad_count(), 1);
    assert!(frame.unresolved.is_empty());
    assert_eq!(c.last_frame_stats().ignored_draws, 1);
    assert_eq!(c.pending_image_releases(), 1);

    // Frame 2 on slot 1 must not see it; frame 3 waits for frame 1 and releases it.
    run_frame(&mut c, |c| c.draw_image(0.0, 0.0, img));
    assert!(last(&log).batches.is_empty());
    assert_eq!(c.pending_image_releases(), 1);
    c.begin_frame(ClearColor::BLACK).unwrap();
    assert_eq!(c.pending_image_releases(), 0);
}

#[test]
fn atlas_upload_of_image_destroyed_mid_frame_resolves() {
    let config = CanvasConfig::default().with_strategy(BatchStrategy::Atlas);
    let (mut c, log) = canvas_with(config);
    let img = solid_image(&mut c, 4, 4);

    c.begin_frame(ClearColor::BLACK).unwrap();
    c.draw_image(0.0, 0.0, img);
    assert!(c.destroy_image(img));
    c.end_frame().unwrap();
    c.present().unwrap();

    let frame = last(&log);
    assert_eq!(frame.atlas_uploads.len(), 1);
    assert_eq!(frame.atlas_uploads[0].0, img);
    assert_eq!(frame.batches[0].quad_count(), 1);
    assert!(frame.unresolved.is_empty());
}

#[test]
fn render_target_frame_uses_target_size() {
    let (mut c, log) = canvas();
    let target = c.create_render_target_image(64, 48).unwrap();

    c.begin_frame_with_target(target, ClearColor::new(0.0, 0.0, 1.0, 1.0))
        .unwrap();
    assert_eq!(c.view_width(), 64.0);
    assert_eq!(c.view_height(), 48.0);
    c.draw_rect(0.0, 0.0, 8.0, 8.0, Color::WHITE);
    c.end_frame().unwrap();
    c.present().unwrap();

    let frame = last(&log);
    assert_eq!(frame.target, Some(target));
    assert_eq!(frame.viewport, Viewport::new(64.0, 48.0));
    assert_eq!(log.count(|e| *e == BackendEvent::Present), 0);
    assert_eq!(c.view_width(), 320.0);
}

#[test]
fn surface_frame_follows_backend_resize() {
    let (mut c, log) = canvas();
    c.backend_mut().set_view_size(800, 600);
    assert_eq!(c.view_width(), 800.0);

    run_frame(&mut c, |c| c.draw_rect(0.0, 0.0, 1.0, 1.0, Color::WHITE));
    assert_eq!(last(&log).viewport, Viewport::new(800.0, 600.0));
}

#[test]
fn plain_image_is_not_a_render_target() {
    let (mut c, _log) = canvas();
    let img = solid_image(&mut c, 4, 4);
    assert_eq!(
        c.begin_frame_with_target(img, ClearColor::BLACK),
        Err(CanvasError::InvalidRenderTarget)
    );
    assert_eq!(c.frame_state(), FrameState::Idle);
}

// ── atlas ────────────────────────────────────────────────────────────────

#[test]
fn atlas_mode_merges_images_into_one_batch() {
    let config = CanvasConfig {
        atlas_size: (128, 64),
        ..CanvasConfig::default().with_strategy(BatchStrategy::Atlas)
    };
    let (mut c, log) = canvas_with(config);
    let a = solid_image(&mut c, 64, 32);
    let b = solid_image(&mut c, 16, 16);

    run_frame(&mut c, |c| {
        c.draw_image(0.0, 0.0, a);
        c.draw_image(0.0, 0.0, b);
        c.draw_image(0.0, 0.0, a);
    });

    let frame = last(&log);
    assert_eq!(frame.batches.len(), 1);
    assert_eq!(frame.batches[0].binding, TextureBinding::Atlas);
    assert_eq!(frame.batches[0].quad_count(), 3);
    assert_eq!(frame.atlas_uploads.len(), 2);

    // `a` sits at the origin; `b` lands to its right.
    let v = frame.batch_vertices(&frame.batches[0]);
    assert_eq!(v[0].tex_coord, [0.0, 0.0]);
    assert_eq!(v[2].tex_coord, [0.5, 0.5]);
    assert_eq!(v[4].tex_coord, [0.5, 0.0]);
    assert_eq!(v[6].tex_coord, [0.625, 0.25]);
}

#[test]
fn atlas_mode_batches_color_draws_with_images() {
    let config = CanvasConfig {
        atlas_size: (128, 64),
        ..CanvasConfig::default().with_strategy(BatchStrategy::Atlas)
    };
    let (mut c, log) = canvas_with(config);
    let a = solid_image(&mut c, 64, 32);
    let red = Color::from_rgba8(255, 0, 0, 255);

    run_frame(&mut c, |c| {
        c.draw_image(0.0, 0.0, a);
        c.draw_rect(10.0, 10.0, 50.0, 20.0, red);
        c.draw_line(0.0, 0.0, 10.0, 0.0, 2.0, red);
        c.draw_image(0.0, 0.0, a);
    });

    let frame = last(&log);
    assert_eq!(frame.batches.len(), 1);
    assert_eq!(frame.batches[0].binding, TextureBinding::Atlas);
    assert_eq!(frame.batches[0].quad_count(), 4);
    assert_eq!(frame.atlas_uploads.len(), 2);

    let white = c.white_image().unwrap();
    let (_, rect) = frame
        .atlas_uploads
        .iter()
        .copied()
        .find(|(id, _)| *id == white)
        .expect("white image placed in the atlas");
    assert_eq!((rect.width, rect.height), (2, 2));
    let tl = [rect.x as f32 / 128.0, rect.y as f32 / 64.0];
    let br = [(rect.x as f32 + 2.0) / 128.0, (rect.y as f32 + 2.0) / 64.0];

    let v = frame.batch_vertices(&frame.batches[0]);
    // Rect quad, then line quad; both sample only the white texels.
    assert_eq!((v[4].tex_coord, v[6].tex_coord), (tl, br));
    assert_eq!((v[8].tex_coord, v[10].tex_coord), (tl, br));
    assert_eq!(v[4].color, red.packed());
}

#[test]
fn atlas_residency_does_not_carry_over_frames() {
    let config = CanvasConfig::default().with_strategy(BatchStrategy::Atlas);
    let (mut c, log) = canvas_with(config);
    let a = solid_image(&mut c, 32, 32);
    let b = solid_image(&mut c, 32, 32);

    run_frame(&mut c, |c| {
        c.draw_image(0.0, 0.0, a);
        c.draw_image(0.0, 0.0, b);
    });
    run_frame(&mut c, |c| c.draw_image(0.0, 0.0, b));

    let frames = log.frames();
    assert_eq!(frames[0].atlas_uploads.len(), 2);
    assert_eq!(frames[1].atlas_uploads, vec![(b, frames[0].atlas_uploads[0].1)]);
    assert_eq!(c.last_frame_stats().atlas_images, 1);
}

#[test]
#[should_panic(expected = "texture atlas exhausted")]
fn atlas_exhaustion_is_fatal() {
    let config = CanvasConfig {
        atlas_size: (16, 16),
        ..CanvasConfig::default().with_strategy(BatchStrategy::Atlas)
    };
    let (mut c, _log) = canvas_with(config);
    let big = solid_image(&mut c, 32, 8);
    c.begin_frame(ClearColor::BLACK).unwrap();
    c.draw_image(0.0, 0.0, big);
}

// ── bindless ─────────────────────────────────────────────────────────────

#[test]
fn bindless_writes_table_indices_without_splitting() {
    let config = CanvasConfig::default().with_strategy(BatchStrategy::Bindless);
    let (mut c, log) = canvas_with(config);
    let a = solid_image(&mut c, 4, 4);
    let b = solid_image(&mut c, 4, 4);

    run_frame(&mut c, |c| {
        c.draw_image(0.0, 0.0, a);
        c.draw_image(0.0, 0.0, b);
        c.draw_image(0.0, 0.0, a);
    });

    let frame = last(&log);
    assert_eq!(frame.batches.len(), 1);
    assert_eq!(frame.batches[0].binding, TextureBinding::Table);
    assert_eq!(frame.texture_table, vec![a, b]);
    let indices: Vec<u32> = frame
        .batch_vertices(&frame.batches[0])
        .chunks(4)
        .map(|q| q[0].texture_index)
        .collect();
    assert_eq!(indices, vec![0, 1, 0]);
}

#[test]
#[should_panic(expected = "bindless texture table limit")]
fn bindless_table_overflow_is_fatal() {
    let config = CanvasConfig {
        max_bindless_textures: 1,
        ..CanvasConfig::default().with_strategy(BatchStrategy::Bindless)
    };
    let (mut c, _log) = canvas_with(config);
    let a = solid_image(&mut c, 4, 4);
    let b = solid_image(&mut c, 4, 4);
    c.begin_frame(ClearColor::BLACK).unwrap();
    c.draw_image(0.0, 0.0, a);
    c.draw_image(0.0, 0.0, b);
}

// ── limits ───────────────────────────────────────────────────────────────

#[test]
#[should_panic(expected = "per-frame draw batch limit (2) exceeded")]
fn batch_limit_is_fatal() {
    let config = CanvasConfig {
        max_batches_per_frame: 2,
        ..Default::default()
    };
    let (mut c, _log) = canvas_with(config);
    let a = solid_image(&mut c, 4, 4);
    let b = solid_image(&mut c, 4, 4);
    c.begin_frame(ClearColor::BLACK).unwrap();
    c.draw_image(0.0, 0.0, a);
    c.draw_image(0.0, 0.0, b);
    c.draw_image(0.0, 0.0, a);
}

#[test]
#[should_panic(expected = "per-frame vertex buffer limit (1) exceeded")]
fn vertex_buffer_limit_is_fatal() {
    let config = CanvasConfig {
        max_vertex_buffers_per_frame: 1,
        ..Default::default()
    };
    let (mut c, _log) = canvas_with(config);
    c.begin_frame(ClearColor::BLACK).unwrap();
    for _ in 0..=MAX_QUADS_PER_BUFFER {
        c.draw_rect(0.0, 0.0, 1.0, 1.0, Color::WHITE);
    }
}

// ── stats + teardown ─────────────────────────────────────────────────────

#[test]
fn frame_stats_describe_last_frame() {
    let (mut c, _log) = canvas();
    let img = solid_image(&mut c, 4, 4);
    run_frame(&mut c, |c| {
        c.draw_rect(0.0, 0.0, 1.0, 1.0, Color::WHITE);
        c.draw_image(0.0, 0.0, img);
        c.draw_image(0.0, 0.0, img);
    });

    let stats = c.last_frame_stats();
    assert_eq!(stats.frame, 1);
    assert_eq!(stats.quads, 3);
    assert_eq!(stats.batches, 2);
    assert_eq!(stats.vertex_buffers, 1);
}

#[test]
fn misuse_between_frames_is_reported_with_the_next_frame() {
    let (mut c, _log) = canvas();
    c.pop_matrix();
    c.draw_rect(0.0, 0.0, 1.0, 1.0, Color::WHITE);
    run_frame(&mut c, |_| {});

    let stats = c.last_frame_stats();
    assert_eq!((stats.rejected_matrix_ops, stats.ignored_draws), (1, 1));

    c.begin_frame(ClearColor::BLACK).unwrap();
    c.end_frame().unwrap();
    c.pop_matrix();
    c.present().unwrap();
    run_frame(&mut c, |_| {});
    assert_eq!(c.last_frame_stats().rejected_matrix_ops, 1);

    run_frame(&mut c, |_| {});
    assert_eq!(c.last_frame_stats(), FrameStats { frame: 4, ..FrameStats::default() });
}

#[test]
fn headless_recording_can_be_bounded_and_drained() {
    let backend = HeadlessBackend::new(64, 64).with_frame_limit(2);
    let log = backend.log();
    let mut c = Canvas::new(backend, CanvasConfig::default()).unwrap();

    for _ in 0..5 {
        run_frame(&mut c, |c| c.draw_rect(0.0, 0.0, 1.0, 1.0, Color::WHITE));
    }
    let frames: Vec<u64> = log.frames().iter().map(|f| f.frame).collect();
    assert_eq!(frames, vec![4, 5]);

    assert_eq!(log.take_frames().len(), 2);
    assert!(log.frames().is_empty());
    assert!(!log.take_events().is_empty());
    assert!(log.events().is_empty());

    run_frame(&mut c, |_| {});
    assert_eq!(log.frames().len(), 1);
}

#[test]
fn drop_releases_every_backend_object() {
    let config = CanvasConfig::default().with_strategy(BatchStrategy::Atlas);
    let (mut c, log) = canvas_with(config);
    let img = solid_image(&mut c, 4, 4);
    let _target = c.create_render_target_image(8, 8).unwrap();
    for _ in 0..3 {
        run_frame(&mut c, |c| c.draw_image(0.0, 0.0, img));
    }
    c.destroy_image(img);
    c.begin_frame(ClearColor::BLACK).unwrap();
    drop(c);

    assert_eq!(log.live_buffers(), 0);
    assert_eq!(log.live_images(), 0);
    assert_eq!(log.live_sync_points(), 0);
}
