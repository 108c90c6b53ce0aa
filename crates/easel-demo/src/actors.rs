//! Things that move around the scene.

use easel_canvas::backend::Backend;
use easel_canvas::{Canvas, Color, Rect};

use crate::sprites::{CELL, CELLS, SpriteSet};

/// Seconds each sprite sheet frame is shown.
const FRAME_TIME: f32 = 0.12;
const SPARK_LIFETIME: f32 = 1.2;
const GRAVITY: f32 = 240.0;

/// Scene bounds in canvas pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Actor {
    /// Solid rect bouncing off the bounds.
    Block {
        x: f32,
        y: f32,
        vx: f32,
        vy: f32,
        size: f32,
        color: Color,
    },
    /// Spinning, animated sprite sheet frame.
    Sprite {
        x: f32,
        y: f32,
        rotation: f32,
        spin: f32,
        scale: f32,
        tint: Color,
        clock: f32,
    },
    /// Short-lived particle falling under gravity.
    Spark {
        x: f32,
        y: f32,
        vx: f32,
        vy: f32,
        age: f32,
    },
}

impl Actor {
    /// Advances by `dt` seconds. Returns `false` once the actor should be removed.
    pub fn update(&mut self, dt: f32, bounds: Bounds) -> bool {
        match self {
            Actor::Block { x, y, vx, vy, size, .. } => {
                *x += *vx * dt;
                *y += *vy * dt;
                bounce(x, vx, 0.0, bounds.width - *size);
                bounce(y, vy, 0.0, bounds.height - *size);
                true
            }
            Actor::Sprite {
                rotation, spin, clock, ..
            } => {
                *rotation += *spin * dt;
                *clock += dt;
                true
            }
            Actor::Spark { x, y, vx, vy, age } => {
                *vy += GRAVITY * dt;
                *x += *vx * dt;
                *y += *vy * dt;
                *age += dt;
                *age < SPARK_LIFETIME && *y < bounds.height
            }
        }
    }

    pub fn draw<B: Backend>(&self, canvas: &mut Canvas<B>, sprites: &SpriteSet) {
        match *self {
            Actor::Block { x, y, size, color, .. } => canvas.draw_rect(x, y, size, size, color),
            Actor::Sprite {
                x,
                y,
                rotation,
                scale,
                tint,
                clock,
                ..
            } => {
                let frame = ((clock / FRAME_TIME) as u32) % CELLS;
                let half = CELL as f32 * 0.5;
                canvas.push_matrix();
                canvas.translate(x, y);
                canvas.rotate(rotation);
                canvas.scale(scale, scale);
                canvas.draw_image_frame(
                    -half,
                    -half,
                    Rect::new((frame * CELL) as f32, 0.0, CELL as f32, CELL as f32),
                    tint,
                    sprites.sheet,
                );
                canvas.pop_matrix();
            }
            Actor::Spark { x, y, age, .. } => {
                let fade = 1.0 - (age / SPARK_LIFETIME).clamp(0.0, 1.0);
                let color = Color::WHITE.with_alpha((fade * 255.0) as u8);
                canvas.draw_image_tinted(x - 4.0, y - 4.0, color, sprites.spark);
            }
        }
    }
}

fn bounce(pos: &mut f32, vel: &mut f32, min: f32, max: f32) {
    if *pos < min {
        *pos = min;
        *vel = vel.abs();
    } else if *pos > max {
        *pos = max;
        *vel = -vel.abs();
    }
}

/// Small xorshift generator; deterministic per seed.
#[derive(Debug, Clone)]
pub struct Rng(u32);

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self(seed.max(1))
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    /// Uniform in `[0, 1)`.
    pub fn unit(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.unit()
    }
}

/// Scene population at startup.
pub fn spawn_scene(rng: &mut Rng, bounds: Bounds, sprites: usize, blocks: usize) -> Vec<Actor> {
    let mut actors = Vec::with_capacity(sprites + blocks);
    for _ in 0..blocks {
        actors.push(Actor::Block {
            x: rng.range(0.0, bounds.width - 24.0),
            y: rng.range(0.0, bounds.height - 24.0),
            vx: rng.range(-120.0, 120.0),
            vy: rng.range(-120.0, 120.0),
            size: 24.0,
            color: Color::from_rgba(rng.unit(), rng.unit(), rng.unit(), 0.8),
        });
    }
    for _ in 0..sprites {
        actors.push(Actor::Sprite {
            x: rng.range(0.0, bounds.width),
            y: rng.range(0.0, bounds.height),
            rotation: rng.range(0.0, std::f32::consts::TAU),
            spin: rng.range(-2.0, 2.0),
            scale: rng.range(0.4, 1.4),
            tint: Color::from_rgba(rng.range(0.5, 1.0), rng.range(0.5, 1.0), rng.range(0.5, 1.0), 1.0),
            clock: rng.range(0.0, 1.0),
        });
    }
    actors
}

/// A burst of sparks at `(x, y)`.
pub fn burst(rng: &mut Rng, x: f32, y: f32, count: usize) -> impl Iterator<Item = Actor> + '_ {
    (0..count).map(move |_| Actor::Spark {
        x,
        y,
        vx: rng.range(-160.0, 160.0),
        vy: rng.range(-260.0, -60.0),
        age: 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_canvas::backend::headless::HeadlessBackend;
    use easel_canvas::{CanvasConfig, ClearColor};

    const BOUNDS: Bounds = Bounds {
        width: 100.0,
        height: 100.0,
    };

    #[test]
    fn block_bounces_off_right_edge() {
        let mut block = Actor::Block {
            x: 70.0,
            y: 10.0,
            vx: 100.0,
            vy: 0.0,
            size: 20.0,
            color: Color::WHITE,
        };
        assert!(block.update(0.5, BOUNDS));
        let Actor::Block { x, vx, .. } = block else { unreachable!() };
        assert_eq!(x, 80.0);
        assert_eq!(vx, -100.0);
    }

    #[test]
    fn spark_expires() {
        let mut spark = Actor::Spark {
            x: 50.0,
            y: 0.0,
            vx: 0.0,
            vy: -500.0,
            age: 0.0,
        };
        assert!(spark.update(0.1, BOUNDS));
        assert!(!spark.update(SPARK_LIFETIME, BOUNDS));
    }

    #[test]
    fn rng_stays_in_range() {
        let mut rng = Rng::new(7);
        for _ in 0..1000 {
            let v = rng.range(-2.0, 3.0);
            assert!((-2.0..3.0).contains(&v));
        }
    }

    #[test]
    fn sprite_draw_restores_matrix_and_picks_frame() {
        let backend = HeadlessBackend::new(200, 200);
        let log = backend.log();
        let mut canvas = Canvas::new(backend, CanvasConfig::default()).unwrap();
        let sprites = SpriteSet::load(&mut canvas).unwrap();

        let sprite = Actor::Sprite {
            x: 100.0,
            y: 100.0,
            rotation: 0.0,
            spin: 0.0,
            scale: 1.0,
            tint: Color::WHITE,
            clock: FRAME_TIME * 2.5,
        };

        canvas.begin_frame(ClearColor::BLACK).unwrap();
        sprite.draw(&mut canvas, &sprites);
        canvas.end_frame().unwrap();
        canvas.present().unwrap();

        assert_eq!(canvas.current_matrix().tx, 0.0);
        let frame = log.last_frame().unwrap();
        let v = frame.batch_vertices(&frame.batches[0]);
        assert_eq!(v[0].position, [84.0, 84.0]);
        assert_eq!(v[0].tex_coord, [0.5, 0.0]);
        assert_eq!(v[2].tex_coord, [0.75, 1.0]);
    }
}
