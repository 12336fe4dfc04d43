use crate::common::{AgentSnapshot, ArenaSnapshot, DomainError, DomainResult};
use crate::domains::ports::RunRecorder;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// One call the arena stage made on the recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderEvent {
    NewRun { run: u32 },
    Save { run: u32, tick: u64 },
    Close { run: u32 },
}

#[derive(Debug, Default)]
struct Recording {
    events: Vec<RecorderEvent>,
    frames: BTreeMap<u32, Vec<(ArenaSnapshot, AgentSnapshot)>>,
}

/// Keeps every frame in memory, for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryRecorder {
    inner: RwLock<Recording>,
}

impl InMemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<RecorderEvent> {
        self.inner.read().await.events.clone()
    }

    /// Frames of `run` in recording order, the `new_run` frame first.
    pub async fn frames(&self, run: u32) -> Vec<(ArenaSnapshot, AgentSnapshot)> {
        self.inner
            .read()
            .await
            .frames
            .get(&run)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl RunRecorder for InMemoryRecorder {
    async fn new_run(&self, run: u32, objects: &ArenaSnapshot, agents: &AgentSnapshot) -> DomainResult<()> {
        let mut store = self.inner.write().await;
        if store.frames.contains_key(&run) {
            return Err(DomainError::InvalidState {
                reason: format!("run {} recorded twice", run),
            });
        }
        store.events.push(RecorderEvent::NewRun { run });
        store.frames.insert(run, vec![(objects.clone(), agents.clone())]);
        Ok(())
    }

    async fn save(
        &self,
        run: u32,
        tick: u64,
        objects: &ArenaSnapshot,
        agents: &AgentSnapshot,
    ) -> DomainResult<()> {
        let mut store = self.inner.write().await;
        let frames = store.frames.get_mut(&run).ok_or_else(|| DomainError::InvalidState {
            reason: format!("save for run {} before new_run", run),
        })?;
        frames.push((objects.clone(), agents.clone()));
        store.events.push(RecorderEvent::Save { run, tick });
        Ok(())
    }

    async fn close(&self, run: u32) -> DomainResult<()> {
        self.inner.write().await.events.push(RecorderEvent::Close { run });
        Ok(())
    }
}
