//! Snapshot value types
//!
//! A snapshot is the full authoritative world state at one tick. Every entity
//! group is optional: a `None` field means the wire shape did not carry it,
//! which is different from "carried and empty" (an empty brick list).

use glam::{DVec2, Vec2};
use serde::{Deserialize, Serialize};

/// Inbound wire shape generations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WireShape {
    /// `"<number>"`: paddle offset from center
    G1,
    /// `"<num>,<num>,<num>"`: paddle x, ball x, ball y
    G2,
    /// Structured `{boardX, ballState, bricksState}`
    #[default]
    G3,
    /// Pick the shape per message from its content
    Auto,
}

impl WireShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            WireShape::G1 => "g1",
            WireShape::G2 => "g2",
            WireShape::G3 => "g3",
            WireShape::Auto => "auto",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "g1" | "scalar" => Some(WireShape::G1),
            "g2" | "triple" => Some(WireShape::G2),
            "g3" | "structured" | "json" => Some(WireShape::G3),
            "auto" => Some(WireShape::Auto),
            _ => None,
        }
    }
}

/// One raw inbound message, before decoding
#[derive(Debug, Clone, PartialEq)]
pub enum RawMessage {
    /// String payload (G1, G2, or G3 serialized as JSON text)
    Text(String),
    /// Already-structured payload (G3)
    Structured(serde_json::Value),
}

impl From<&str> for RawMessage {
    fn from(s: &str) -> Self {
        RawMessage::Text(s.to_owned())
    }
}

impl From<String> for RawMessage {
    fn from(s: String) -> Self {
        RawMessage::Text(s)
    }
}

impl From<serde_json::Value> for RawMessage {
    fn from(v: serde_json::Value) -> Self {
        RawMessage::Structured(v)
    }
}

/// Paddle fields. Wire shapes only carry x; y is the configured baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaddleState {
    pub x: f32,
}

/// Exact identity of a brick position.
///
/// Built from the full-precision coordinates before they are narrowed for
/// drawing, so two positions that round to the same `f32` stay distinct.
/// `-0.0` and `0.0` are the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionKey(u64, u64);

impl PositionKey {
    pub fn new(pos: DVec2) -> Self {
        let canon = |v: f64| if v == 0.0 { 0.0f64 } else { v };
        Self(canon(pos.x).to_bits(), canon(pos.y).to_bits())
    }
}

/// One live brick, render-space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrickState {
    pub key: PositionKey,
    pub pos: Vec2,
    pub size: Vec2,
}

impl BrickState {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self::at(DVec2::new(x as f64, y as f64), Vec2::new(w, h))
    }

    /// Brick at a full-precision render-space position
    pub fn at(pos: DVec2, size: Vec2) -> Self {
        Self {
            key: PositionKey::new(pos),
            pos: pos.as_vec2(),
            size,
        }
    }
}

/// Decoded world state, already translated into render-space
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    /// Shape the message was decoded as (never `Auto`)
    pub shape: WireShape,
    pub paddle: Option<PaddleState>,
    pub ball: Option<Vec2>,
    pub bricks: Option<Vec<BrickState>>,
}

impl Snapshot {
    /// True if the message carried nothing the scene can use
    pub fn is_empty(&self) -> bool {
        self.paddle.is_none() && self.ball.is_none() && self.bricks.is_none()
    }

    pub fn brick_count(&self) -> Option<usize> {
        self.bricks.as_ref().map(Vec::len)
    }
}
