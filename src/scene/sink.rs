//! Rendering backend seam
//!
//! The reconciler never touches display objects directly; it asks a
//! [`SceneSink`] to create, move, resize, or destroy them. Every call can fail
//! on its own without invalidating the rest of the batch.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::SinkError;

/// Entity kinds the logic component reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Paddle,
    Ball,
    Brick,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Paddle => "paddle",
            EntityKind::Ball => "ball",
            EntityKind::Brick => "brick",
        }
    }
}

/// Scene operations, for failure reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneOp {
    Create,
    SetPosition,
    SetSize,
    Destroy,
}

/// Adapter that applies scene operations to real display objects
pub trait SceneSink {
    /// Backend handle for one live visual
    type Handle: fmt::Debug;

    /// Create a placeholder at `pos` (render-space). `size` is `None` when the
    /// entity kind does not report one.
    fn create_visual(
        &mut self,
        kind: EntityKind,
        pos: Vec2,
        size: Option<Vec2>,
    ) -> Result<Self::Handle, SinkError>;

    fn set_position(&mut self, handle: &Self::Handle, pos: Vec2) -> Result<(), SinkError>;

    fn set_size(&mut self, handle: &Self::Handle, size: Vec2) -> Result<(), SinkError>;

    /// Remove a placeholder. The handle must not be used afterwards.
    fn destroy_visual(&mut self, handle: &Self::Handle) -> Result<(), SinkError>;
}
