//! Error types for the reconciliation bridge
//!
//! Three failure classes with three recovery policies:
//! - `ComponentNotFound`: fatal at startup, no session is created
//! - `Decode`: one inbound message is dropped in full, the next is unaffected
//! - `Sink`: one scene operation failed, the rest of the batch still runs

use thiserror::Error;

use crate::snapshot::WireShape;

/// Failures reported by a [`SceneSink`](crate::scene::SceneSink) for a single operation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SinkError {
    /// Backend has no room for another visual
    #[error("visual capacity exhausted ({capacity} live)")]
    CapacityExhausted { capacity: usize },

    /// Handle does not refer to a live visual
    #[error("stale visual handle {0}")]
    StaleHandle(String),

    /// Position or size the backend cannot represent
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Backend refused the operation for its own reasons
    #[error("backend rejected operation: {0}")]
    Rejected(String),
}

/// Bridge errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    /// A mount point required at startup is missing
    #[error("component not found: {selector}")]
    ComponentNotFound { selector: String },

    /// An inbound message could not be decoded
    #[error("cannot decode {shape:?} message: {reason}")]
    Decode { shape: WireShape, reason: String },

    /// A scene operation was rejected by the backend
    #[error("scene operation failed: {0}")]
    Sink(#[from] SinkError),
}

impl BridgeError {
    pub fn component_not_found(selector: impl Into<String>) -> Self {
        Self::ComponentNotFound {
            selector: selector.into(),
        }
    }

    pub fn decode(shape: WireShape, reason: impl Into<String>) -> Self {
        Self::Decode {
            shape,
            reason: reason.into(),
        }
    }

    /// True for errors that end the session
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ComponentNotFound { .. })
    }
}

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;
