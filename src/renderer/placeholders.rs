//! Placeholder scene backend
//!
//! Visuals are plain colored rectangles and circles held in a slot arena.
//! Handles carry a generation so a destroyed visual's handle never aliases
//! the visual that later reuses its slot.

use std::fmt;

use glam::Vec2;

use crate::consts::{DEFAULT_BALL_SIZE, DEFAULT_BRICK_SIZE, DEFAULT_PADDLE_SIZE};
use crate::error::SinkError;
use crate::scene::{EntityKind, SceneSink};

/// Handle to one live placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualHandle {
    index: u32,
    generation: u32,
}

impl fmt::Display for VisualHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// One placeholder visual. `pos` is its center in render-space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placeholder {
    pub kind: EntityKind,
    pub pos: Vec2,
    pub size: Vec2,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    visual: Option<Placeholder>,
}

/// Scene of placeholder visuals, drawn by [`RenderState`](super::RenderState)
#[derive(Debug, Clone)]
pub struct PlaceholderScene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    capacity: usize,
}

/// Size used when the logic component does not report one
pub fn default_size(kind: EntityKind) -> Vec2 {
    let (w, h) = match kind {
        EntityKind::Paddle => DEFAULT_PADDLE_SIZE,
        EntityKind::Ball => DEFAULT_BALL_SIZE,
        EntityKind::Brick => DEFAULT_BRICK_SIZE,
    };
    Vec2::new(w, h)
}

fn check_pos(pos: Vec2) -> Result<(), SinkError> {
    if pos.is_finite() {
        Ok(())
    } else {
        Err(SinkError::InvalidGeometry(format!("position {pos}")))
    }
}

fn check_size(size: Vec2) -> Result<(), SinkError> {
    if size.is_finite() && size.x >= 0.0 && size.y >= 0.0 {
        Ok(())
    } else {
        Err(SinkError::InvalidGeometry(format!("size {size}")))
    }
}

impl PlaceholderScene {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, handle: &VisualHandle) -> Option<&Placeholder> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.visual.as_ref())
    }

    /// Live visuals in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Placeholder> {
        self.slots.iter().filter_map(|slot| slot.visual.as_ref())
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.iter().filter(|p| p.kind == kind).count()
    }

    fn get_mut(&mut self, handle: &VisualHandle) -> Result<&mut Placeholder, SinkError> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.visual.as_mut())
            .ok_or_else(|| SinkError::StaleHandle(handle.to_string()))
    }
}

impl SceneSink for PlaceholderScene {
    type Handle = VisualHandle;

    fn create_visual(
        &mut self,
        kind: EntityKind,
        pos: Vec2,
        size: Option<Vec2>,
    ) -> Result<VisualHandle, SinkError> {
        if self.live >= self.capacity {
            return Err(SinkError::CapacityExhausted {
                capacity: self.capacity,
            });
        }
        check_pos(pos)?;
        let size = size.unwrap_or_else(|| default_size(kind));
        check_size(size)?;

        let visual = Some(Placeholder { kind, pos, size });
        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.visual = visual;
                VisualHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    visual,
                });
                VisualHandle {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        };
        self.live += 1;
        log::trace!("Created {} {}", kind.as_str(), handle);
        Ok(handle)
    }

    fn set_position(&mut self, handle: &VisualHandle, pos: Vec2) -> Result<(), SinkError> {
        check_pos(pos)?;
        self.get_mut(handle)?.pos = pos;
        Ok(())
    }

    fn set_size(&mut self, handle: &VisualHandle, size: Vec2) -> Result<(), SinkError> {
        check_size(size)?;
        self.get_mut(handle)?.size = size;
        Ok(())
    }

    fn destroy_visual(&mut self, handle: &VisualHandle) -> Result<(), SinkError> {
        self.get_mut(handle)?;
        let slot = &mut self.slots[handle.index as usize];
        slot.visual = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        log::trace!("Destroyed {}", handle);
        Ok(())
    }
}
