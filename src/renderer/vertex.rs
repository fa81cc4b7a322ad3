//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// 2D vertex with position (logical pixels until mapped to NDC) and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Placeholder colors
pub mod colors {
    use crate::scene::EntityKind;

    pub const PADDLE: [f32; 4] = [0.2, 0.8, 0.4, 1.0];
    pub const BALL: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const BRICK: [f32; 4] = [0.4, 0.7, 1.0, 1.0];
    pub const BACKGROUND: [f32; 4] = [0.02, 0.02, 0.05, 1.0];

    pub fn for_kind(kind: EntityKind) -> [f32; 4] {
        match kind {
            EntityKind::Paddle => PADDLE,
            EntityKind::Ball => BALL,
            EntityKind::Brick => BRICK,
        }
    }
}
