pub mod hit;
pub mod query;

pub use hit::NodeZone;
pub use query::{GeometryRenderer, RenderQuery};
