//! Breakout Bridge - keeps a rendered scene in step with an external game-logic component
//!
//! Core modules:
//! - `snapshot`: Wire decoding (three message shapes) and logic-space translation
//! - `scene`: Positional reconciliation of snapshots against a display sink
//! - `bridge`: Frame clock, logic channel, and the session that drives them
//! - `renderer`: Placeholder scene backend and its WebGPU pipeline
//! - `settings`: Persisted bridge configuration
//! - `demo`: Scripted logic component for headless runs and tests

pub mod bridge;
pub mod demo;
pub mod error;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod snapshot;

pub use bridge::{HeadlessHost, HostEnvironment, LogicEndpoint, Session, SessionStats};
pub use error::{BridgeError, Result, SinkError};
pub use scene::{EntityKind, ReconcileReport, SceneReconciler, SceneSink};
pub use settings::BridgeSettings;
pub use snapshot::{RawMessage, Snapshot, SnapshotCodec, WireShape};

/// Bridge configuration constants
pub mod consts {
    /// Frame interval assumed for the first tick (60 Hz)
    pub const NATIVE_FRAME_DT: f32 = 1.0 / 60.0;
    /// Frames averaged for the FPS readout
    pub const FPS_WINDOW: usize = 60;
    /// Ticks the logic component may fall behind before new ones are dropped
    pub const TICK_BACKLOG: usize = 120;

    /// Paddle baseline, measured up from the bottom of the surface
    pub const PADDLE_BASELINE_MARGIN: f32 = 40.0;
    /// Paddle y when nothing better is known
    pub const DEFAULT_PADDLE_Y: f32 = 0.0;

    /// Placeholder sizes (render-space pixels)
    pub const DEFAULT_PADDLE_SIZE: (f32, f32) = (100.0, 15.0);
    pub const DEFAULT_BALL_SIZE: (f32, f32) = (16.0, 16.0);
    pub const DEFAULT_BRICK_SIZE: (f32, f32) = (60.0, 20.0);

    /// Visual capacity of the placeholder backend
    pub const DEFAULT_MAX_VISUALS: usize = 512;
}
