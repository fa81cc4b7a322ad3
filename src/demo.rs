//! Scripted logic component
//!
//! A deterministic stand-in for the real game logic. It consumes frame ticks
//! from a [`LogicEndpoint`] and answers with state messages in one of the
//! three wire shapes. There is no physics: the ball traces a fixed Lissajous
//! path, the paddle chases it, and bricks break at seeded-random intervals.

use glam::Vec2;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde_json::json;

use crate::bridge::LogicEndpoint;
use crate::consts::{DEFAULT_BRICK_SIZE, NATIVE_FRAME_DT};
use crate::snapshot::{FieldTransform, RawMessage, RenderOffset, WireShape};

/// Brick grid dimensions
const BRICK_ROWS: usize = 5;
const BRICK_COLS: usize = 10;
/// Gap between bricks (render-space pixels)
const BRICK_GAP: f32 = 4.0;
/// Top edge of the grid
const GRID_TOP: f32 = 60.0;

/// Deterministic logic component driven by ticks
pub struct ScriptedLogic {
    endpoint: LogicEndpoint,
    shape: WireShape,
    transform: FieldTransform,
    offset: RenderOffset,
    surface: Vec2,
    rng: Pcg32,

    /// Emit one message per this many ticks
    emit_every: u32,
    /// Break a brick every this many ticks (0 disables)
    break_every: u32,

    tick: u64,
    pending_ticks: u32,
    bricks: Vec<Vec2>,
    sent: u64,
}

impl ScriptedLogic {
    /// `transform` says which fields the bridge expects in logic-space; the
    /// script emits those relative to the surface center.
    pub fn new(
        endpoint: LogicEndpoint,
        shape: WireShape,
        transform: FieldTransform,
        surface: (f32, f32),
        seed: u64,
    ) -> Self {
        let shape = match shape {
            WireShape::Auto => WireShape::G3,
            shape => shape,
        };
        let surface = Vec2::new(surface.0, surface.1);
        Self {
            endpoint,
            shape,
            transform,
            offset: RenderOffset::from_surface(surface.x, surface.y),
            surface,
            rng: Pcg32::seed_from_u64(seed),
            emit_every: 1,
            break_every: 30,
            tick: 0,
            pending_ticks: 0,
            bricks: brick_grid(surface.x),
            sent: 0,
        }
    }

    /// Coalesce ticks: answer only every `n`th one
    pub fn with_emit_every(mut self, n: u32) -> Self {
        self.emit_every = n.max(1);
        self
    }

    pub fn with_break_every(mut self, n: u32) -> Self {
        self.break_every = n;
        self
    }

    pub fn shape(&self) -> WireShape {
        self.shape
    }

    /// Bricks still standing, in render-space
    pub fn bricks(&self) -> &[Vec2] {
        &self.bricks
    }

    pub fn bricks_left(&self) -> usize {
        self.bricks.len()
    }

    /// Messages published so far
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Consume pending ticks and publish whatever they produce.
    /// Returns the number of messages published.
    pub fn step(&mut self) -> usize {
        let ticks = self.endpoint.drain_ticks();
        let mut published = 0;

        for _ in 0..ticks {
            self.tick += 1;
            if self.break_every > 0 && self.tick % self.break_every as u64 == 0 {
                self.break_random_brick();
            }

            self.pending_ticks += 1;
            if self.pending_ticks >= self.emit_every {
                self.pending_ticks = 0;
                let msg = self.message();
                if self.endpoint.publish(msg) {
                    self.sent += 1;
                    published += 1;
                } else {
                    log::debug!("Bridge gone, stopping script");
                    break;
                }
            }
        }

        published
    }

    /// Ball position (render-space) at the current tick
    pub fn ball(&self) -> Vec2 {
        let t = self.tick as f32 * NATIVE_FRAME_DT;
        let center = self.surface * 0.5;
        Vec2::new(
            center.x + self.surface.x * 0.4 * (t * 1.3).cos(),
            center.y + self.surface.y * 0.2 * (t * 0.9).sin() + self.surface.y * 0.1,
        )
    }

    /// Paddle x (render-space): lags the ball
    pub fn paddle_x(&self) -> f32 {
        let center = self.surface.x * 0.5;
        center + (self.ball().x - center) * 0.8
    }

    fn break_random_brick(&mut self) {
        if self.bricks.is_empty() {
            return;
        }
        let idx = self.rng.random_range(0..self.bricks.len());
        let gone = self.bricks.swap_remove(idx);
        log::debug!("Brick at ({}, {}) broken", gone.x, gone.y);
    }

    fn message(&self) -> RawMessage {
        let paddle_x = if self.transform.paddle {
            self.paddle_x() - self.offset.x()
        } else {
            self.paddle_x()
        };
        let ball = if self.transform.ball {
            self.ball() - Vec2::new(self.offset.x(), self.offset.y())
        } else {
            self.ball()
        };

        match self.shape {
            WireShape::G1 => RawMessage::Text(paddle_x.to_string()),
            WireShape::G2 => RawMessage::Text(format!("{},{},{}", paddle_x, ball.x, ball.y)),
            WireShape::G3 | WireShape::Auto => {
                let (w, h) = DEFAULT_BRICK_SIZE;
                let bricks: Vec<_> = self
                    .bricks
                    .iter()
                    .map(|b| {
                        let pos = if self.transform.bricks {
                            *b - Vec2::new(self.offset.x(), self.offset.y())
                        } else {
                            *b
                        };
                        json!({ "x": pos.x, "y": pos.y, "w": w, "h": h })
                    })
                    .collect();
                RawMessage::Structured(json!({
                    "boardX": paddle_x,
                    "ballState": { "x": ball.x, "y": ball.y },
                    "bricksState": bricks,
                }))
            }
        }
    }
}

/// Brick centers, horizontally centered on a surface of the given width
fn brick_grid(surface_width: f32) -> Vec<Vec2> {
    let (w, h) = DEFAULT_BRICK_SIZE;
    let grid_width = BRICK_COLS as f32 * (w + BRICK_GAP) - BRICK_GAP;
    let left = ((surface_width - grid_width) * 0.5).max(0.0).floor();

    let mut bricks = Vec::with_capacity(BRICK_ROWS * BRICK_COLS);
    for row in 0..BRICK_ROWS {
        for col in 0..BRICK_COLS {
            bricks.push(Vec2::new(
                left + col as f32 * (w + BRICK_GAP) + w * 0.5,
                GRID_TOP + row as f32 * (h + BRICK_GAP) + h * 0.5,
            ));
        }
    }
    bricks
}

/// Pick one of the wire shapes at random (native demo `--shape random`)
pub fn random_shape(rng: &mut impl Rng) -> WireShape {
    [WireShape::G1, WireShape::G2, WireShape::G3]
        .choose(rng)
        .copied()
        .unwrap_or_default()
}
