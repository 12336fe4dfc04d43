pub mod actors;
pub mod aggregate;
pub mod control;

pub use actors::{ArenaStageActor, ArenaStageSettings};
pub use aggregate::*;
pub use control::RunControl;
