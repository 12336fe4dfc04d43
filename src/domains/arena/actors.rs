use crate::common::{
    run_seed, AgentSnapshot, ApplicationError, ApplicationResult, ArenaPhase, ArenaSnapshot,
    StageReport,
};
use crate::domains::logger::DynLogger;
use crate::domains::ports::DynRecorder;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::aggregate::Arena;
use super::control::RunControl;

pub const STAGE: &str = "arena";

#[derive(Debug, Clone)]
pub struct ArenaStageSettings {
    pub num_runs: u32,
    /// Ticks per run counting tick 0; `None` runs until `Quit`.
    pub ticks_limit: Option<u64>,
    pub random_seed: i64,
    /// Wait for `Start` (or `Step`) before the first tick.
    pub start_paused: bool,
}

enum Permission {
    Advance,
    Quit,
}

/// Drives the run/tick lifecycle: publishes object snapshots and waits for
/// the agent stage to catch up before advancing.
pub struct ArenaStageActor {
    arena: Arena,
    settings: ArenaStageSettings,
    arena_tx: watch::Sender<ArenaSnapshot>,
    agents_rx: watch::Receiver<AgentSnapshot>,
    control_rx: mpsc::Receiver<RunControl>,
    recorder: DynRecorder,
    logger: DynLogger,
    running: bool,
    step_pending: bool,
    control_open: bool,
}

impl ArenaStageActor {
    pub fn new(
        arena: Arena,
        settings: ArenaStageSettings,
        arena_tx: watch::Sender<ArenaSnapshot>,
        agents_rx: watch::Receiver<AgentSnapshot>,
        control_rx: mpsc::Receiver<RunControl>,
        recorder: DynRecorder,
        logger: DynLogger,
    ) -> Self {
        let running = !settings.start_paused;
        Self {
            arena,
            settings,
            arena_tx,
            agents_rx,
            control_rx,
            recorder,
            logger,
            running,
            step_pending: false,
            control_open: true,
        }
    }

    pub async fn run(mut self) -> ApplicationResult<StageReport> {
        let mut report = StageReport::new(STAGE);
        let mut quit = false;

        for run in 1..=self.settings.num_runs {
            let seed = run_seed(self.settings.random_seed, run);
            if let Err(e) = self.arena.reset(run, seed) {
                self.logger.error(&format!("[{}] run {}: {}", STAGE, run, e));
                return Err(e.into());
            }
            let snapshot = self.arena.snapshot(0, ArenaPhase::Running);
            info!(stage = STAGE, run, seed, objects = snapshot.object_count(), "run started");
            self.arena_tx.send_replace(snapshot.clone());
            report.record(run, 0);

            let agents = self.await_agents(run, 0).await?;
            self.recorder.new_run(run, &snapshot, &agents).await?;

            let mut tick = 1;
            while self.settings.ticks_limit.map_or(true, |limit| tick < limit) {
                if let Permission::Quit = self.next_permission().await {
                    info!(stage = STAGE, run, tick, "quit requested");
                    quit = true;
                    break;
                }
                let snapshot = self.arena.snapshot(tick, ArenaPhase::Running);
                self.arena_tx.send_replace(snapshot.clone());
                report.record(run, tick);
                debug!(stage = STAGE, run, tick, "tick published");

                let agents = self.await_agents(run, tick).await?;
                self.recorder.save(run, tick, &snapshot, &agents).await?;
                tick += 1;
            }

            self.recorder.close(run).await?;
            self.arena.close();
            info!(stage = STAGE, run, ticks = tick, "run finished");
            if quit {
                break;
            }
        }

        let mut last = self.arena.snapshot(0, ArenaPhase::Finished);
        last.tick = report.ticks.last().map(|(_, t)| *t).unwrap_or(0);
        self.arena_tx.send_replace(last);
        info!(stage = STAGE, "arena stage closed");
        Ok(report)
    }

    /// Waits until the agent stage has published `tick` of `run`.
    async fn await_agents(&mut self, run: u32, tick: u64) -> ApplicationResult<AgentSnapshot> {
        loop {
            {
                let snapshot = self.agents_rx.borrow_and_update();
                if snapshot.run == run && snapshot.tick >= tick {
                    return Ok(snapshot.clone());
                }
            }
            self.agents_rx
                .changed()
                .await
                .map_err(|_| ApplicationError::channel_closed(STAGE, "agent snapshots"))?;
        }
    }

    fn apply(&mut self, control: RunControl) -> Option<Permission> {
        match control {
            RunControl::Start => self.running = true,
            RunControl::Stop => self.running = false,
            RunControl::Step => self.step_pending = true,
            RunControl::Quit => return Some(Permission::Quit),
        }
        None
    }

    /// Gates the next tick on the run-control state. A paused arena whose
    /// controller went away resumes.
    async fn next_permission(&mut self) -> Permission {
        loop {
            while self.control_open {
                match self.control_rx.try_recv() {
                    Ok(control) => {
                        if let Some(permission) = self.apply(control) {
                            return permission;
                        }
                    }
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => self.control_open = false,
                }
            }
            if self.running {
                return Permission::Advance;
            }
            if self.step_pending {
                self.step_pending = false;
                return Permission::Advance;
            }
            if !self.control_open {
                warn!(stage = STAGE, "controller detached while paused, resuming");
                self.running = true;
                return Permission::Advance;
            }
            match self.control_rx.recv().await {
                Some(control) => {
                    if let Some(permission) = self.apply(control) {
                        return permission;
                    }
                }
                None => self.control_open = false,
            }
        }
    }
}
