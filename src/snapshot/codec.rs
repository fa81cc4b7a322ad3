//! Inbound message decoding
//!
//! Turns one raw message into one [`Snapshot`]. Decoding is all-or-nothing:
//! any malformed field fails the whole message, so the scene never sees a
//! half-applied update.

use glam::DVec2;
use serde::Deserialize;

use super::state::{BrickState, PaddleState, RawMessage, Snapshot, WireShape};
use super::transform::{RenderOffset, ShapeTransforms};
use crate::error::{BridgeError, Result};

/// Codec configuration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CodecConfig {
    /// Shape to decode every message as (`Auto` detects per message)
    pub shape: WireShape,
    /// Per-shape translation flags
    pub transforms: ShapeTransforms,
}

/// G3 payload as the logic component emits it. Numbers keep their JSON
/// (`f64`) precision until brick identity has been taken from them.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireState {
    board_x: Option<f64>,
    ball_state: Option<WirePoint>,
    bricks_state: Option<Vec<WireBrick>>,
}

#[derive(Debug, Deserialize)]
struct WirePoint {
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct WireBrick {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

/// Decodes raw messages into render-space snapshots
#[derive(Debug, Clone)]
pub struct SnapshotCodec {
    config: CodecConfig,
    offset: RenderOffset,
}

impl SnapshotCodec {
    pub fn new(config: CodecConfig, offset: RenderOffset) -> Self {
        Self { config, offset }
    }

    /// Guess the shape of a message from its content
    pub fn detect(raw: &RawMessage) -> WireShape {
        match raw {
            RawMessage::Structured(_) => WireShape::G3,
            RawMessage::Text(text) => {
                let text = text.trim_start();
                if text.starts_with('{') {
                    WireShape::G3
                } else if text.contains(',') {
                    WireShape::G2
                } else {
                    WireShape::G1
                }
            }
        }
    }

    /// Decode one message
    pub fn decode(&self, raw: &RawMessage) -> Result<Snapshot> {
        let shape = match self.config.shape {
            WireShape::Auto => Self::detect(raw),
            shape => shape,
        };

        match raw {
            RawMessage::Text(text) => match shape {
                WireShape::G2 => self.decode_g2(text),
                WireShape::G3 => {
                    let wire: WireState = serde_json::from_str(text)
                        .map_err(|e| BridgeError::decode(shape, e.to_string()))?;
                    self.decode_g3(wire)
                }
                _ => self.decode_g1(text),
            },
            RawMessage::Structured(value) => match shape {
                WireShape::G3 => {
                    let wire = WireState::deserialize(value)
                        .map_err(|e| BridgeError::decode(shape, e.to_string()))?;
                    self.decode_g3(wire)
                }
                shape => Err(BridgeError::decode(
                    shape,
                    "structured payload where a delimited string was expected",
                )),
            },
        }
    }

    /// `"<number>"`
    fn decode_g1(&self, text: &str) -> Result<Snapshot> {
        let t = self.config.transforms.for_shape(WireShape::G1);
        if text.contains(',') {
            return Err(BridgeError::decode(
                WireShape::G1,
                "expected a single number, found a delimited list",
            ));
        }
        let x = parse_number(text, WireShape::G1, "paddle offset")?;

        Ok(Snapshot {
            shape: WireShape::G1,
            paddle: Some(PaddleState {
                x: t.paddle_x(x as f32, &self.offset),
            }),
            ball: None,
            bricks: None,
        })
    }

    /// `"<paddle-x>,<ball-x>,<ball-y>"`
    fn decode_g2(&self, text: &str) -> Result<Snapshot> {
        let t = self.config.transforms.for_shape(WireShape::G2);
        let fields: Vec<&str> = text.split(',').collect();
        let &[paddle_x, ball_x, ball_y] = fields.as_slice() else {
            return Err(BridgeError::decode(
                WireShape::G2,
                format!("expected 3 fields, got {}", fields.len()),
            ));
        };

        let paddle_x = parse_number(paddle_x, WireShape::G2, "paddle x")?;
        let ball = DVec2::new(
            parse_number(ball_x, WireShape::G2, "ball x")?,
            parse_number(ball_y, WireShape::G2, "ball y")?,
        )
        .as_vec2();

        Ok(Snapshot {
            shape: WireShape::G2,
            paddle: Some(PaddleState {
                x: t.paddle_x(paddle_x as f32, &self.offset),
            }),
            ball: Some(t.ball(ball, &self.offset)),
            bricks: None,
        })
    }

    fn decode_g3(&self, wire: WireState) -> Result<Snapshot> {
        let t = self.config.transforms.for_shape(WireShape::G3);

        let paddle = match wire.board_x {
            Some(x) => Some(PaddleState {
                x: t.paddle_x(finite(x, "boardX")? as f32, &self.offset),
            }),
            None => None,
        };

        let ball = match wire.ball_state {
            Some(p) => {
                let pos = DVec2::new(finite(p.x, "ballState.x")?, finite(p.y, "ballState.y")?);
                Some(t.ball(pos.as_vec2(), &self.offset))
            }
            None => None,
        };

        let bricks = match wire.bricks_state {
            Some(list) => {
                let mut bricks = Vec::with_capacity(list.len());
                for b in list {
                    let pos = DVec2::new(
                        finite(b.x, "bricksState.x")?,
                        finite(b.y, "bricksState.y")?,
                    );
                    let size = DVec2::new(
                        finite(b.w, "bricksState.w")?,
                        finite(b.h, "bricksState.h")?,
                    );
                    let pos = t.brick(pos, &self.offset);
                    if !fits_f32(pos.x) || !fits_f32(pos.y) {
                        return Err(BridgeError::decode(
                            WireShape::G3,
                            "bricksState position out of range after translation",
                        ));
                    }
                    bricks.push(BrickState::at(pos, size.as_vec2()));
                }
                Some(bricks)
            }
            None => None,
        };

        Ok(Snapshot {
            shape: WireShape::G3,
            paddle,
            ball,
            bricks,
        })
    }
}

/// Finite, and still finite once narrowed for drawing
fn fits_f32(value: f64) -> bool {
    value.is_finite() && (value as f32).is_finite()
}

fn parse_number(token: &str, shape: WireShape, field: &str) -> Result<f64> {
    let token = token.trim();
    let value: f64 = token
        .parse()
        .map_err(|_| BridgeError::decode(shape, format!("{field}: `{token}` is not a number")))?;
    if !fits_f32(value) {
        return Err(BridgeError::decode(
            shape,
            format!("{field}: `{token}` is not finite"),
        ));
    }
    Ok(value)
}

fn finite(value: f64, field: &str) -> Result<f64> {
    if fits_f32(value) {
        Ok(value)
    } else {
        Err(BridgeError::decode(
            WireShape::G3,
            format!("{field} out of range"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::transform::FieldTransform;
    use glam::Vec2;

    fn codec(shape: WireShape) -> SnapshotCodec {
        SnapshotCodec::new(
            CodecConfig {
                shape,
                transforms: ShapeTransforms::default(),
            },
            RenderOffset::from_surface(800.0, 600.0),
        )
    }

    #[test]
    fn test_g1_adds_offset_to_paddle() {
        let snap = codec(WireShape::G1).decode(&"37.5".into()).unwrap();
        assert_eq!(snap.shape, WireShape::G1);
        assert_eq!(snap.paddle, Some(PaddleState { x: 437.5 }));
        assert!(snap.ball.is_none());
        assert!(snap.bricks.is_none());
    }

    #[test]
    fn test_g1_accepts_signs_and_whitespace() {
        let c = codec(WireShape::G1);
        assert_eq!(c.decode(&"-12".into()).unwrap().paddle.unwrap().x, 388.0);
        assert_eq!(c.decode(&" +3.25\n".into()).unwrap().paddle.unwrap().x, 403.25);
    }

    #[test]
    fn test_g1_rejects_garbage() {
        let c = codec(WireShape::G1);
        for bad in ["", "abc", "12px", "NaN", "inf", "1,2"] {
            let err = c.decode(&bad.into()).unwrap_err();
            assert!(
                matches!(err, BridgeError::Decode { shape: WireShape::G1, .. }),
                "{bad:?} -> {err:?}"
            );
        }
    }

    #[test]
    fn test_g2_triple() {
        let snap = codec(WireShape::G2).decode(&"10,20,30".into()).unwrap();
        assert_eq!(snap.paddle, Some(PaddleState { x: 10.0 }));
        assert_eq!(snap.ball, Some(Vec2::new(20.0, 30.0)));
        assert!(snap.bricks.is_none());
    }

    #[test]
    fn test_g2_field_count_and_tokens() {
        let c = codec(WireShape::G2);
        assert!(c.decode(&"10,20".into()).is_err());
        assert!(c.decode(&"10,20,30,40".into()).is_err());
        assert!(c.decode(&"10,x,30".into()).is_err());
        assert!(c.decode(&"10,,30".into()).is_err());
    }

    #[test]
    fn test_g2_translation_is_configurable() {
        let c = SnapshotCodec::new(
            CodecConfig {
                shape: WireShape::G2,
                transforms: ShapeTransforms {
                    g2: FieldTransform::ALL,
                    ..Default::default()
                },
            },
            RenderOffset::from_surface(100.0, 50.0),
        );
        let snap = c.decode(&"10,20,30".into()).unwrap();
        assert_eq!(snap.paddle.unwrap().x, 60.0);
        assert_eq!(snap.ball, Some(Vec2::new(70.0, 55.0)));
    }

    #[test]
    fn test_g3_text_and_structured_agree() {
        let json = r#"{"boardX":0,"ballState":{"x":12,"y":34},"bricksState":[{"x":0,"y":0,"w":10,"h":5},{"x":20,"y":0,"w":10,"h":5}]}"#;
        let c = codec(WireShape::G3);
        let from_text = c.decode(&json.into()).unwrap();
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        let from_value = c.decode(&value.into()).unwrap();
        assert_eq!(from_text, from_value);

        assert_eq!(from_text.paddle.unwrap().x, 400.0);
        assert_eq!(from_text.ball, Some(Vec2::new(12.0, 34.0)));
        assert_eq!(
            from_text.bricks.unwrap(),
            vec![
                BrickState::new(0.0, 0.0, 10.0, 5.0),
                BrickState::new(20.0, 0.0, 10.0, 5.0)
            ]
        );
    }

    #[test]
    fn test_g3_missing_fields_are_absent() {
        let c = codec(WireShape::G3);
        let snap = c.decode(&r#"{"ballState":{"x":1,"y":2}}"#.into()).unwrap();
        assert!(snap.paddle.is_none());
        assert!(snap.bricks.is_none());
        assert_eq!(snap.ball, Some(Vec2::new(1.0, 2.0)));

        let snap = c.decode(&r#"{"bricksState":[]}"#.into()).unwrap();
        assert_eq!(snap.bricks, Some(Vec::new()));
    }

    #[test]
    fn test_g3_bad_brick_fails_whole_message() {
        let c = codec(WireShape::G3);
        let json = r#"{"boardX":1,"bricksState":[{"x":0,"y":0,"w":10,"h":5},{"x":"oops","y":0,"w":10,"h":5}]}"#;
        assert!(matches!(
            c.decode(&json.into()),
            Err(BridgeError::Decode { shape: WireShape::G3, .. })
        ));
        let huge = r#"{"boardX":1e300}"#;
        assert!(c.decode(&huge.into()).is_err());
        let huge = r#"{"bricksState":[{"x":0,"y":0,"w":1e39,"h":5}]}"#;
        assert!(c.decode(&huge.into()).is_err());
    }

    #[test]
    fn test_g3_brick_identity_keeps_wire_precision() {
        let c = codec(WireShape::G3);
        let snap = c
            .decode(&r#"{"bricksState":[{"x":1.0,"y":0,"w":10,"h":5}]}"#.into())
            .unwrap();
        let near = c
            .decode(&r#"{"bricksState":[{"x":1.00000001,"y":0,"w":10,"h":5}]}"#.into())
            .unwrap();
        let (a, b) = (snap.bricks.unwrap()[0], near.bricks.unwrap()[0]);
        assert_eq!(a.pos, b.pos);
        assert_ne!(a.key, b.key);

        let json = r#"{"bricksState":[{"x":16777216,"y":0,"w":10,"h":5},{"x":16777217,"y":0,"w":10,"h":5}]}"#;
        let bricks = c.decode(&json.into()).unwrap().bricks.unwrap();
        assert_ne!(bricks[0].key, bricks[1].key);
    }

    #[test]
    fn test_g2_precision_beyond_f32_is_accepted() {
        let snap = codec(WireShape::G2).decode(&"1.00000001,2,3".into()).unwrap();
        assert_eq!(snap.paddle.unwrap().x, 1.0);
    }

    #[test]
    fn test_structured_payload_for_text_shape_is_rejected() {
        let value = serde_json::json!({"boardX": 1});
        assert!(codec(WireShape::G1).decode(&value.into()).is_err());
    }

    #[test]
    fn test_auto_detection() {
        assert_eq!(SnapshotCodec::detect(&"37.5".into()), WireShape::G1);
        assert_eq!(SnapshotCodec::detect(&"1,2,3".into()), WireShape::G2);
        assert_eq!(SnapshotCodec::detect(&" {\"boardX\":1}".into()), WireShape::G3);
        assert_eq!(
            SnapshotCodec::detect(&serde_json::json!({}).into()),
            WireShape::G3
        );

        let c = codec(WireShape::Auto);
        assert_eq!(c.decode(&"1,2,3".into()).unwrap().shape, WireShape::G2);
        assert_eq!(c.decode(&"5".into()).unwrap().shape, WireShape::G1);
    }
}
