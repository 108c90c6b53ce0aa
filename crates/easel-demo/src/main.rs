//! Sprite batching demo.
//!
//! Bouncing blocks, spinning sprite sheet frames and click-spawned sparks,
//! plus a minimap rendered into an offscreen image every frame.

mod actors;
mod sprites;

use anyhow::{Context, Result};
use clap::Parser;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::keyboard::{Key, NamedKey};

use easel_canvas::core::{App, AppControl, FrameCtx, WindowCanvas};
use easel_canvas::logging::{LoggingConfig, init_logging};
use easel_canvas::window::{Runtime, RuntimeConfig};
use easel_canvas::{BatchStrategy, CanvasConfig, ClearColor, Color, ImageId};

use actors::{Actor, Bounds, Rng, burst, spawn_scene};
use sprites::SpriteSet;

const MINIMAP_SIZE: (u32, u32) = (256, 144);
const BLOCKS: usize = 24;
const SPARKS_PER_CLICK: usize = 48;
const STATS_EVERY: u64 = 240;

#[derive(Parser, Debug)]
#[command(name = "easel-demo", about = "Sprite batching demo")]
struct Options {
    /// Pack images into a per-frame atlas instead of batching per texture
    #[arg(long)]
    atlas: bool,

    /// Number of spinning sprites
    #[arg(long, default_value_t = 2000)]
    count: usize,
}

impl Options {
    fn strategy(&self) -> BatchStrategy {
        if self.atlas {
            BatchStrategy::Atlas
        } else {
            BatchStrategy::PerTexture
        }
    }
}

struct Demo {
    sprite_count: usize,
    rng: Rng,
    actors: Vec<Actor>,
    sprites: Option<SpriteSet>,
    minimap: Option<ImageId>,
    cursor: (f32, f32),
    clicks: Vec<(f32, f32)>,
    elapsed: f32,
}

impl Demo {
    fn new(sprite_count: usize) -> Self {
        Self {
            sprite_count,
            rng: Rng::new(0x5eed),
            actors: Vec::new(),
            sprites: None,
            minimap: None,
            cursor: (0.0, 0.0),
            clicks: Vec::new(),
            elapsed: 0.0,
        }
    }

    fn draw_scene(&self, canvas: &mut WindowCanvas<'_>, sprites: &SpriteSet) {
        canvas.draw_image_sized(0.0, 0.0, canvas.view_width(), canvas.view_height(), sprites.checker);
        for actor in &self.actors {
            actor.draw(canvas, sprites);
        }
        self.draw_orbits(canvas, sprites);
        self.draw_crosshair(canvas);
    }

    /// Moons around planets around the view center, one matrix level each.
    fn draw_orbits(&self, canvas: &mut WindowCanvas<'_>, sprites: &SpriteSet) {
        let t = self.elapsed;
        canvas.push_matrix();
        canvas.translate(canvas.view_width() * 0.5, canvas.view_height() * 0.5);
        canvas.draw_rect(-6.0, -6.0, 12.0, 12.0, Color::from_rgba8(255, 220, 120, 255));
        for planet in 0..3 {
            let radius = 90.0 + planet as f32 * 70.0;
            canvas.push_matrix();
            canvas.rotate(t * (0.9 - planet as f32 * 0.25));
            canvas.draw_line(0.0, 0.0, radius, 0.0, 1.0, Color::from_rgba8(255, 255, 255, 48));
            canvas.translate(radius, 0.0);
            canvas.draw_image_tinted(-4.0, -4.0, Color::from_rgba8(120, 200, 255, 255), sprites.spark);
            for moon in 0..2 {
                canvas.push_matrix();
                canvas.rotate(t * 2.5 + moon as f32 * std::f32::consts::PI);
                canvas.translate(18.0, 0.0);
                canvas.scale(0.5, 0.5);
                canvas.draw_image(-4.0, -4.0, sprites.spark);
                canvas.pop_matrix();
            }
            canvas.pop_matrix();
        }
        canvas.pop_matrix();
    }

    fn draw_crosshair(&self, canvas: &mut WindowCanvas<'_>) {
        let (x, y) = self.cursor;
        let color = Color::from_rgba8(255, 80, 80, 200);
        canvas.draw_line(x - 10.0, y, x + 10.0, y, 2.0, color);
        canvas.draw_line(x, y - 10.0, x, y + 10.0, 2.0, color);
    }

    /// Renders the scene scaled down into the minimap image.
    fn render_minimap(&self, canvas: &mut WindowCanvas<'_>, sprites: &SpriteSet, scene: Bounds) {
        let Some(minimap) = self.minimap else {
            return;
        };
        if let Err(err) = canvas.begin_frame_with_target(minimap, ClearColor::new(0.05, 0.05, 0.08, 1.0)) {
            log::warn!("minimap skipped: {err}");
            return;
        }
        canvas.push_matrix();
        canvas.scale(
            MINIMAP_SIZE.0 as f32 / scene.width,
            MINIMAP_SIZE.1 as f32 / scene.height,
        );
        for actor in &self.actors {
            actor.draw(canvas, sprites);
        }
        canvas.pop_matrix();
        let result = canvas.end_frame().and(canvas.present());
        if let Err(err) = result {
            log::warn!("minimap frame failed: {err}");
        }
    }
}

impl App for Demo {
    fn on_init(&mut self, canvas: &mut WindowCanvas<'_>) -> Result<()> {
        self.sprites = Some(SpriteSet::load(canvas)?);
        self.minimap = Some(
            canvas
                .create_render_target_image(MINIMAP_SIZE.0, MINIMAP_SIZE.1)
                .context("minimap target")?,
        );

        let bounds = Bounds {
            width: canvas.view_width(),
            height: canvas.view_height(),
        };
        self.actors = spawn_scene(&mut self.rng, bounds, self.sprite_count, BLOCKS);
        log::info!(
            "scene ready: {} actors, strategy {:?}",
            self.actors.len(),
            canvas.config().strategy
        );
        Ok(())
    }

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x as f32, position.y as f32);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.clicks.push(self.cursor),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => return AppControl::Exit,
            _ => {}
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(sprites) = self.sprites else {
            return AppControl::Exit;
        };
        let bounds = Bounds {
            width: ctx.canvas.view_width(),
            height: ctx.canvas.view_height(),
        };

        for (x, y) in self.clicks.drain(..) {
            self.actors.extend(burst(&mut self.rng, x, y, SPARKS_PER_CLICK));
        }
        let dt = ctx.time.dt;
        self.elapsed += dt;
        self.actors.retain_mut(|actor| actor.update(dt, bounds));

        self.render_minimap(ctx.canvas, &sprites, bounds);

        let minimap = self.minimap;
        let control = ctx.render(ClearColor::BLACK, |canvas| {
            self.draw_scene(canvas, &sprites);
            if let Some(minimap) = minimap {
                let x = canvas.view_width() - MINIMAP_SIZE.0 as f32 - 16.0;
                let (w, h) = (MINIMAP_SIZE.0 as f32, MINIMAP_SIZE.1 as f32);
                canvas.draw_rect(x - 2.0, 14.0, w + 4.0, h + 4.0, Color::WHITE);
                canvas.draw_image(x, 16.0, minimap);
            }
        });

        if ctx.time.frame_index % STATS_EVERY == 0 {
            let stats = ctx.canvas.last_frame_stats();
            log::info!(
                "frame {}: {} quads in {} batches, {} vertex buffers, {} actors",
                stats.frame,
                stats.quads,
                stats.batches,
                stats.vertex_buffers,
                self.actors.len()
            );
        }
        control
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let opts = Options::parse();
    let config = RuntimeConfig {
        title: "easel demo".to_string(),
        initial_size: LogicalSize::new(1280.0, 720.0),
        canvas: CanvasConfig::default().with_strategy(opts.strategy()),
        ..RuntimeConfig::default()
    };

    Runtime::run(config, Demo::new(opts.count))
}
