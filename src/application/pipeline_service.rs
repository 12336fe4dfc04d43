use crate::common::{
    AgentSnapshot, ApplicationError, ApplicationResult, ArenaSnapshot, StageReport,
};
use crate::config::Config;
use crate::domains::agents::{AgentManager, AgentStageActor, AgentStageSettings};
use crate::domains::arena::{Arena, ArenaStageActor, ArenaStageSettings, RunControl};
use crate::domains::collision::{CollisionDetector, CollisionStageActor};
use crate::domains::logger::DynLogger;
use crate::domains::ports::DynRecorder;
use std::future::Future;
use tokio::sync::{mpsc, watch};
use tokio::task::{AbortHandle, JoinSet};
use tracing::{error, info};

const CONTROL_CAPACITY: usize = 16;

/// What a finished experiment reports back.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub runs_completed: u32,
    pub arena: StageReport,
    pub agents: StageReport,
    pub collision: StageReport,
}

/// The renderer side of a running pipeline.
pub struct PipelineHandle {
    pub control: mpsc::Sender<RunControl>,
    pub agents: watch::Receiver<AgentSnapshot>,
    pub arena: watch::Receiver<ArenaSnapshot>,
}

/// Stages spawned and wired, waiting to be joined.
pub struct RunningPipeline {
    stages: JoinSet<(&'static str, ApplicationResult<StageReport>)>,
    aborts: Vec<AbortHandle>,
    logger: DynLogger,
}

pub struct PipelineService {
    config: Config,
    recorder: DynRecorder,
    logger: DynLogger,
}

impl PipelineService {
    pub fn new(config: Config, recorder: DynRecorder, logger: DynLogger) -> Self {
        Self {
            config,
            recorder,
            logger,
        }
    }

    /// Builds the three stages, connects them and spawns them on the
    /// current runtime. Configuration errors surface here, before any
    /// stage runs.
    pub fn start(self) -> ApplicationResult<(PipelineHandle, RunningPipeline)> {
        let config = self.config;
        if let Err(e) = config.validate() {
            self.logger.error(&format!("configuration rejected: {}", e));
            return Err(e.into());
        }
        let sim = &config.simulation;
        let ticks_limit = config.ticks_limit();

        let arena = Arena::new(&config.arena, config.objects.clone())?;
        let arena_shape = arena.shape().clone();

        let (arena_tx, arena_rx) = watch::channel(ArenaSnapshot::idle());
        let (agents_tx, agents_rx) = watch::channel(AgentSnapshot::idle());
        let (detector_tx, detector_rx) = mpsc::channel(1);
        let (corrections_tx, corrections_rx) = mpsc::channel(1);
        let (control_tx, control_rx) = mpsc::channel(CONTROL_CAPACITY);

        let handle = PipelineHandle {
            control: control_tx,
            agents: agents_rx.clone(),
            arena: arena_rx.clone(),
        };

        let arena_actor = ArenaStageActor::new(
            arena,
            ArenaStageSettings {
                num_runs: sim.num_runs,
                ticks_limit,
                random_seed: sim.random_seed,
                start_paused: config.gui.render,
            },
            arena_tx,
            agents_rx,
            control_rx,
            self.recorder,
            self.logger.clone(),
        );
        let agent_actor = AgentStageActor::new(
            AgentManager::new(config.agents.clone(), sim.ticks_per_second),
            arena_shape.clone(),
            AgentStageSettings {
                num_runs: sim.num_runs,
                ticks_limit,
            },
            arena_rx.clone(),
            agents_tx,
            detector_tx,
            corrections_rx,
            self.logger.clone(),
        );
        let collision_actor = CollisionStageActor::new(
            CollisionDetector::new(arena_shape, sim.collisions),
            arena_rx,
            detector_rx,
            corrections_tx,
        );

        let mut running = RunningPipeline {
            stages: JoinSet::new(),
            aborts: Vec::new(),
            logger: self.logger,
        };
        running.spawn(crate::domains::arena::actors::STAGE, arena_actor.run());
        running.spawn(crate::domains::agents::actors::STAGE, agent_actor.run());
        running.spawn(crate::domains::collision::actors::STAGE, collision_actor.run());
        info!(
            runs = sim.num_runs,
            ticks_limit = ?ticks_limit,
            agents = config.agents.values().map(|g| g.number).sum::<usize>(),
            objects = config.objects.values().map(|g| g.number).sum::<usize>(),
            "pipeline started"
        );
        Ok((handle, running))
    }

    /// Runs the experiment to completion without a renderer attached.
    pub async fn run(self) -> ApplicationResult<PipelineReport> {
        let (handle, running) = self.start()?;
        drop(handle);
        running.wait().await
    }
}

impl RunningPipeline {
    fn spawn<F>(&mut self, stage: &'static str, stage_future: F)
    where
        F: Future<Output = ApplicationResult<StageReport>> + Send + 'static,
    {
        let inner = tokio::spawn(stage_future);
        self.aborts.push(inner.abort_handle());
        self.stages.spawn(async move {
            let outcome = match inner.await {
                Ok(result) => result,
                Err(e) if e.is_panic() => Err(ApplicationError::StagePanicked {
                    stage: stage.to_string(),
                }),
                Err(_) => Err(ApplicationError::StageFailed {
                    stage: stage.to_string(),
                    reason: "cancelled".to_string(),
                }),
            };
            (stage, outcome)
        });
    }

    fn abort_all(&mut self) {
        for handle in &self.aborts {
            handle.abort();
        }
    }

    /// Joins every stage. The first failure tears the others down; the
    /// reported error is the root cause rather than a sibling's lost channel.
    pub async fn wait(mut self) -> ApplicationResult<PipelineReport> {
        let mut report = PipelineReport::default();
        let mut failures: Vec<ApplicationError> = Vec::new();

        while let Some(joined) = self.stages.join_next().await {
            let (stage, outcome) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    failures.push(ApplicationError::StageFailed {
                        stage: "supervisor".to_string(),
                        reason: e.to_string(),
                    });
                    self.abort_all();
                    continue;
                }
            };
            match outcome {
                Ok(stage_report) => match stage {
                    crate::domains::arena::actors::STAGE => report.arena = stage_report,
                    crate::domains::agents::actors::STAGE => report.agents = stage_report,
                    _ => report.collision = stage_report,
                },
                Err(e) => {
                    if failures.is_empty() {
                        error!(stage, error = %e, "stage failed, tearing down pipeline");
                        self.abort_all();
                    }
                    failures.push(e);
                }
            }
        }

        if !failures.is_empty() {
            let root = failures
                .iter()
                .position(|e| {
                    !matches!(
                        e,
                        ApplicationError::ChannelClosed { .. } | ApplicationError::StageFailed { .. }
                    )
                })
                .unwrap_or(0);
            let failure = failures.swap_remove(root);
            self.logger.error(&format!("experiment aborted: {}", failure));
            return Err(failure);
        }

        report.runs_completed = report.arena.runs().len() as u32;
        info!(runs = report.runs_completed, "pipeline finished");
        self.logger.info(&format!(
            "experiment finished after {} run(s)",
            report.runs_completed
        ));
        Ok(report)
    }
}
