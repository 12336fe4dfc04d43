pub mod actors;
pub mod detector;

pub use actors::CollisionStageActor;
pub use detector::*;
