//! Logic-space to render-space translation
//!
//! Logic coordinates are centered on the surface; render coordinates start at
//! the top-left corner. Whether a given field needs translating depends on the
//! producer generation, so it is configured per wire shape and per field.

use glam::{DVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::state::WireShape;

/// Translation from centered logic-space into top-left render-space.
///
/// Computed once from the surface size at startup; never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOffset(Vec2);

impl RenderOffset {
    /// Offset for a surface of the given size (its center point)
    pub fn from_surface(width: f32, height: f32) -> Self {
        Self(Vec2::new(width / 2.0, height / 2.0))
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.0.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.0.y
    }

    #[inline]
    pub fn apply(&self, pos: Vec2) -> Vec2 {
        pos + self.0
    }

    /// Full-precision translation, for positions that are also identities
    #[inline]
    pub fn apply_exact(&self, pos: DVec2) -> DVec2 {
        pos + self.0.as_dvec2()
    }
}

/// Which fields of one wire shape are logic-space (need the offset)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldTransform {
    pub paddle: bool,
    pub ball: bool,
    pub bricks: bool,
}

impl FieldTransform {
    pub const NONE: Self = Self {
        paddle: false,
        ball: false,
        bricks: false,
    };

    pub const ALL: Self = Self {
        paddle: true,
        ball: true,
        bricks: true,
    };

    #[inline]
    pub fn paddle_x(&self, x: f32, offset: &RenderOffset) -> f32 {
        if self.paddle { x + offset.x() } else { x }
    }

    #[inline]
    pub fn ball(&self, pos: Vec2, offset: &RenderOffset) -> Vec2 {
        if self.ball { offset.apply(pos) } else { pos }
    }

    #[inline]
    pub fn brick(&self, pos: DVec2, offset: &RenderOffset) -> DVec2 {
        if self.bricks { offset.apply_exact(pos) } else { pos }
    }
}

/// Per-shape translation flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeTransforms {
    pub g1: FieldTransform,
    pub g2: FieldTransform,
    pub g3: FieldTransform,
}

impl Default for ShapeTransforms {
    fn default() -> Self {
        Self {
            // G1 is an offset from center
            g1: FieldTransform {
                paddle: true,
                ..FieldTransform::NONE
            },
            // G2 producers added the offset upstream
            g2: FieldTransform::NONE,
            // G3 reports the board relative to center, ball and bricks in render-space
            g3: FieldTransform {
                paddle: true,
                ..FieldTransform::NONE
            },
        }
    }
}

impl ShapeTransforms {
    /// Flags for a concrete shape. `Auto` has no flags of its own.
    pub fn for_shape(&self, shape: WireShape) -> FieldTransform {
        match shape {
            WireShape::G1 => self.g1,
            WireShape::G2 => self.g2,
            WireShape::G3 => self.g3,
            WireShape::Auto => FieldTransform::NONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_is_surface_center() {
        let offset = RenderOffset::from_surface(800.0, 600.0);
        assert_eq!(offset.x(), 400.0);
        assert_eq!(offset.y(), 300.0);
        assert_eq!(offset.apply(Vec2::new(-400.0, -300.0)), Vec2::ZERO);
    }

    #[test]
    fn test_field_transform_only_touches_flagged_fields() {
        let offset = RenderOffset::from_surface(200.0, 100.0);
        let t = FieldTransform {
            paddle: true,
            ..FieldTransform::NONE
        };
        assert_eq!(t.paddle_x(5.0, &offset), 105.0);
        assert_eq!(t.ball(Vec2::new(1.0, 2.0), &offset), Vec2::new(1.0, 2.0));
        assert_eq!(
            FieldTransform::ALL.brick(DVec2::new(1.0, 2.0), &offset),
            DVec2::new(101.0, 52.0)
        );
        // Sub-f32 differences survive the translation
        let near = FieldTransform::ALL.brick(DVec2::new(1.000_000_01, 2.0), &offset);
        assert_ne!(near, DVec2::new(101.0, 52.0));
    }

    #[test]
    fn test_default_flags_per_shape() {
        let t = ShapeTransforms::default();
        assert!(t.for_shape(WireShape::G1).paddle);
        assert_eq!(t.for_shape(WireShape::G2), FieldTransform::NONE);
        assert!(t.for_shape(WireShape::G3).paddle);
        assert!(!t.for_shape(WireShape::G3).ball);
    }
}
