pub mod config;
pub mod error;
pub mod id;
pub mod model;
pub mod path;
pub mod physics;
pub mod snap;
pub mod space;
pub mod viewport;

pub use config::EngineConfig;
pub use error::GraphError;
pub use id::{EdgeId, NodeId};
pub use model::*;
pub use path::{EdgePath, PathKind};
pub use physics::Simulation;
pub use snap::{ResizeDirs, SnapAxis, SnapGuide, SnapResult};
pub use space::*;
pub use viewport::{Viewport, ViewportAnimation};

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
