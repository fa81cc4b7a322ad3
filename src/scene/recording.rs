//! In-memory sink that records every call
//!
//! Used by tests and headless runs to observe exactly which operations a
//! reconciliation pass issued. Can be told to reject creates or destroys.

use std::collections::BTreeMap;

use glam::Vec2;

use super::sink::{EntityKind, SceneSink};
use crate::error::SinkError;

/// One successful sink call
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Create {
        handle: u32,
        kind: EntityKind,
        pos: Vec2,
        size: Option<Vec2>,
    },
    SetPosition {
        handle: u32,
        pos: Vec2,
    },
    SetSize {
        handle: u32,
        size: Vec2,
    },
    Destroy {
        handle: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct LiveVisual {
    kind: EntityKind,
    pos: Vec2,
    size: Option<Vec2>,
}

/// Recording sink with sequential `u32` handles
#[derive(Debug, Default)]
pub struct RecordingSink {
    next_handle: u32,
    live: BTreeMap<u32, LiveVisual>,
    calls: Vec<SinkCall>,
    create_attempts: usize,
    fail_create_at: Option<usize>,
    fail_destroys: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successful calls since creation or the last [`clear_calls`](Self::clear_calls)
    pub fn calls(&self) -> &[SinkCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn count_creates(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, SinkCall::Create { .. }))
            .count()
    }

    pub fn count_destroys(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, SinkCall::Destroy { .. }))
            .count()
    }

    /// Number of live visuals of one kind
    pub fn live_count(&self, kind: EntityKind) -> usize {
        self.live.values().filter(|v| v.kind == kind).count()
    }

    /// Positions of live visuals of one kind, in handle order
    pub fn live_positions(&self, kind: EntityKind) -> Vec<Vec2> {
        self.live
            .values()
            .filter(|v| v.kind == kind)
            .map(|v| v.pos)
            .collect()
    }

    /// Reject the `n`th create attempt (0-based)
    pub fn fail_nth_create(&mut self, n: usize) {
        self.fail_create_at = Some(self.create_attempts + n);
    }

    /// Reject every destroy until turned off
    pub fn fail_destroys(&mut self, fail: bool) {
        self.fail_destroys = fail;
    }

    fn live_mut(&mut self, handle: u32) -> Result<&mut LiveVisual, SinkError> {
        self.live
            .get_mut(&handle)
            .ok_or_else(|| SinkError::StaleHandle(handle.to_string()))
    }
}

impl SceneSink for RecordingSink {
    type Handle = u32;

    fn create_visual(
        &mut self,
        kind: EntityKind,
        pos: Vec2,
        size: Option<Vec2>,
    ) -> Result<u32, SinkError> {
        let attempt = self.create_attempts;
        self.create_attempts += 1;
        if self.fail_create_at == Some(attempt) {
            return Err(SinkError::Rejected(format!("create #{attempt}")));
        }

        let handle = self.next_handle;
        self.next_handle += 1;
        self.live.insert(handle, LiveVisual { kind, pos, size });
        self.calls.push(SinkCall::Create {
            handle,
            kind,
            pos,
            size,
        });
        Ok(handle)
    }

    fn set_position(&mut self, handle: &u32, pos: Vec2) -> Result<(), SinkError> {
        self.live_mut(*handle)?.pos = pos;
        self.calls.push(SinkCall::SetPosition {
            handle: *handle,
            pos,
        });
        Ok(())
    }

    fn set_size(&mut self, handle: &u32, size: Vec2) -> Result<(), SinkError> {
        self.live_mut(*handle)?.size = Some(size);
        self.calls.push(SinkCall::SetSize {
            handle: *handle,
            size,
        });
        Ok(())
    }

    fn destroy_visual(&mut self, handle: &u32) -> Result<(), SinkError> {
        if self.fail_destroys {
            return Err(SinkError::Rejected(format!("destroy {handle}")));
        }
        self.live
            .remove(handle)
            .ok_or_else(|| SinkError::StaleHandle(handle.to_string()))?;
        self.calls.push(SinkCall::Destroy { handle: *handle });
        Ok(())
    }
}
