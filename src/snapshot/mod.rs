//! Snapshot decoding
//!
//! Inbound messages come in three wire generations. Each is decoded into the
//! same [`Snapshot`] value, with absent entity groups left as `None` and all
//! coordinates translated into render-space.

pub mod codec;
pub mod state;
pub mod transform;

pub use codec::{CodecConfig, SnapshotCodec};
pub use state::{BrickState, PaddleState, PositionKey, RawMessage, Snapshot, WireShape};
pub use transform::{FieldTransform, RenderOffset, ShapeTransforms};
