use crate::common::{
    AgentSnapshot, ApplicationError, ApplicationResult, ArenaPhase, ArenaSnapshot, Corrections,
    DetectorInput, StageReport,
};
use crate::domains::geometry::Shape;
use crate::domains::logger::DynLogger;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use super::manager::AgentManager;

pub const STAGE: &str = "agents";

#[derive(Debug, Clone)]
pub struct AgentStageSettings {
    pub num_runs: u32,
    /// Ticks per run counting tick 0; `None` runs until the arena finishes.
    pub ticks_limit: Option<u64>,
}

/// Follows the arena tick by tick: decides, moves, asks the collision
/// stage for corrections and publishes the resulting kinematic snapshot.
pub struct AgentStageActor {
    manager: AgentManager,
    arena_shape: Shape,
    settings: AgentStageSettings,
    arena_rx: watch::Receiver<ArenaSnapshot>,
    agents_tx: watch::Sender<AgentSnapshot>,
    detector_tx: mpsc::Sender<DetectorInput>,
    corrections_rx: mpsc::Receiver<Corrections>,
    logger: DynLogger,
}

impl AgentStageActor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        manager: AgentManager,
        arena_shape: Shape,
        settings: AgentStageSettings,
        arena_rx: watch::Receiver<ArenaSnapshot>,
        agents_tx: watch::Sender<AgentSnapshot>,
        detector_tx: mpsc::Sender<DetectorInput>,
        corrections_rx: mpsc::Receiver<Corrections>,
        logger: DynLogger,
    ) -> Self {
        Self {
            manager,
            arena_shape,
            settings,
            arena_rx,
            agents_tx,
            detector_tx,
            corrections_rx,
            logger,
        }
    }

    pub async fn run(mut self) -> ApplicationResult<StageReport> {
        let mut report = StageReport::new(STAGE);

        'runs: for run in 1..=self.settings.num_runs {
            let Some(arena) = self.await_arena(run, 0).await? else {
                break;
            };
            if let Err(e) = self
                .manager
                .initialize(arena.seed, &self.arena_shape, &arena.objects)
            {
                self.logger.error(&format!("[{}] run {}: {}", STAGE, run, e));
                return Err(e.into());
            }
            info!(stage = STAGE, run, seed = arena.seed, "agents initialized");
            self.agents_tx.send_replace(self.manager.snapshot(run, 0));
            report.record(run, 0);

            let mut tick = 1;
            while self.settings.ticks_limit.map_or(true, |limit| tick < limit) {
                let Some(arena) = self.await_arena(run, tick).await? else {
                    break 'runs;
                };
                self.manager.step(tick, &self.arena_shape, &arena.objects)?;

                self.detector_tx
                    .send(self.manager.detector_input(run, tick))
                    .await
                    .map_err(|_| ApplicationError::channel_closed(STAGE, "detector input"))?;
                let corrections = self
                    .corrections_rx
                    .recv()
                    .await
                    .ok_or_else(|| ApplicationError::channel_closed(STAGE, "corrections"))?;
                self.manager.apply_corrections(&corrections, run, tick)?;

                self.agents_tx.send_replace(self.manager.snapshot(run, tick));
                report.record(run, tick);
                debug!(stage = STAGE, run, tick, corrected = corrections.count(), "tick done");
                tick += 1;
            }
            info!(stage = STAGE, run, "run finished");
        }

        self.manager.close();
        info!(stage = STAGE, "agent stage closed");
        Ok(report)
    }

    /// Latest arena snapshot at or past `tick` of `run`, or `None` once the
    /// arena has finished the experiment.
    async fn await_arena(&mut self, run: u32, tick: u64) -> ApplicationResult<Option<ArenaSnapshot>> {
        loop {
            {
                let snapshot = self.arena_rx.borrow_and_update();
                if snapshot.phase == ArenaPhase::Finished {
                    return Ok(None);
                }
                if snapshot.phase == ArenaPhase::Running
                    && snapshot.run == run
                    && snapshot.tick >= tick
                {
                    return Ok(Some(snapshot.clone()));
                }
            }
            self.arena_rx
                .changed()
                .await
                .map_err(|_| ApplicationError::channel_closed(STAGE, "arena snapshots"))?;
        }
    }
}
