//! Frame clock, logic channel, and the session that ties them to the scene
//!
//! Data flow per frame:
//! clock tick → channel (tick out) → logic component → channel (state in)
//! → codec → reconciler → sink

pub mod channel;
pub mod clock;
pub mod host;
pub mod session;

pub use channel::{FrameAdvance, LogicChannel, LogicEndpoint, SnapshotPublisher};
pub use clock::{FrameClock, FrameTick};
pub use host::{HeadlessHost, HostEnvironment};
pub use session::{Session, SessionStats};
