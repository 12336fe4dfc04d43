pub mod actors;
pub mod agent;
pub mod manager;
pub mod perception;
pub mod policy;

pub use actors::{AgentStageActor, AgentStageSettings};
pub use agent::Agent;
pub use manager::AgentManager;
pub use perception::*;
pub use policy::*;
