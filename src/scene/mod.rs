//! Scene state and reconciliation
//!
//! - `sink`: the backend seam (`SceneSink`) and entity kinds
//! - `reconciler`: positional diffing of snapshots against live visuals
//! - `recording`: a sink that records calls, for tests and headless runs

pub mod reconciler;
pub mod recording;
pub mod sink;

pub use reconciler::{OpFailure, ReconcileReport, ReconcilerConfig, SceneReconciler, VisibleObject};
pub use recording::{RecordingSink, SinkCall};
pub use sink::{EntityKind, SceneOp, SceneSink};
