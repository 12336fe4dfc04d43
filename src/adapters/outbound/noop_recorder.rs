use crate::common::{AgentSnapshot, ArenaSnapshot, DomainResult};
use crate::domains::ports::RunRecorder;
use async_trait::async_trait;

/// Discards everything; the default when nothing is persisted.
#[derive(Debug, Default)]
pub struct NoopRecorder;

#[async_trait]
impl RunRecorder for NoopRecorder {
    async fn new_run(&self, _run: u32, _objects: &ArenaSnapshot, _agents: &AgentSnapshot) -> DomainResult<()> {
        Ok(())
    }

    async fn save(
        &self,
        _run: u32,
        _tick: u64,
        _objects: &ArenaSnapshot,
        _agents: &AgentSnapshot,
    ) -> DomainResult<()> {
        Ok(())
    }

    async fn close(&self, _run: u32) -> DomainResult<()> {
        Ok(())
    }
}
