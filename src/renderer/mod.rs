//! Placeholder rendering
//!
//! The scene backend the reconciler drives, and the WebGPU pipeline that
//! draws it as flat rectangles and circles.

pub mod pipeline;
pub mod placeholders;
pub mod shapes;
pub mod vertex;

pub use pipeline::RenderState;
pub use placeholders::{Placeholder, PlaceholderScene, VisualHandle};
pub use vertex::Vertex;
