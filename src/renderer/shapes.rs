//! Shape generation for placeholder visuals

use glam::Vec2;
use std::f32::consts::PI;

use super::placeholders::{Placeholder, PlaceholderScene};
use super::vertex::{Vertex, colors};
use crate::scene::EntityKind;

/// Segments used for ball circles
const CIRCLE_SEGMENTS: u32 = 24;

/// Axis-aligned filled rectangle centered on `center`
pub fn rect(center: Vec2, size: Vec2, color: [f32; 4]) -> Vec<Vertex> {
    let half = size * 0.5;
    let min = center - half;
    let max = center + half;

    vec![
        Vertex::new(min.x, min.y, color),
        Vertex::new(max.x, min.y, color),
        Vertex::new(min.x, max.y, color),
        Vertex::new(min.x, max.y, color),
        Vertex::new(max.x, min.y, color),
        Vertex::new(max.x, max.y, color),
    ]
}

/// Filled circle as a triangle fan
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(
            center.x + radius * theta1.cos(),
            center.y + radius * theta1.sin(),
            color,
        ));
        vertices.push(Vertex::new(
            center.x + radius * theta2.cos(),
            center.y + radius * theta2.sin(),
            color,
        ));
    }

    vertices
}

/// Vertices for one placeholder. Balls are circles, everything else a rectangle.
pub fn placeholder(visual: &Placeholder) -> Vec<Vertex> {
    let color = colors::for_kind(visual.kind);
    match visual.kind {
        EntityKind::Ball => circle(
            visual.pos,
            visual.size.min_element() * 0.5,
            color,
            CIRCLE_SEGMENTS,
        ),
        EntityKind::Paddle | EntityKind::Brick => rect(visual.pos, visual.size, color),
    }
}

/// Vertices for a whole scene. Bricks first, then paddle, then ball on top.
pub fn scene_vertices(scene: &PlaceholderScene) -> Vec<Vertex> {
    let mut vertices = Vec::new();
    for kind in [EntityKind::Brick, EntityKind::Paddle, EntityKind::Ball] {
        for visual in scene.iter().filter(|v| v.kind == kind) {
            vertices.extend(placeholder(visual));
        }
    }
    vertices
}
