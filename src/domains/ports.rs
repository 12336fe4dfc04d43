use crate::common::{AgentSnapshot, ArenaSnapshot, DomainResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Persistence port for experiment data. The arena stage calls `new_run`
/// once at the start of a run, `save` once per tick after that, and
/// `close` once when the run ends.
#[async_trait]
pub trait RunRecorder: Send + Sync {
    async fn new_run(&self, run: u32, objects: &ArenaSnapshot, agents: &AgentSnapshot) -> DomainResult<()>;

    async fn save(
        &self,
        run: u32,
        tick: u64,
        objects: &ArenaSnapshot,
        agents: &AgentSnapshot,
    ) -> DomainResult<()>;

    async fn close(&self, run: u32) -> DomainResult<()>;
}

pub type DynRecorder = Arc<dyn RunRecorder>;
