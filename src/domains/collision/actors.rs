use crate::common::{
    ApplicationError, ApplicationResult, ArenaSnapshot, Corrections, DetectorInput, StageReport,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use super::detector::CollisionDetector;

pub const STAGE: &str = "collision";

/// Answers every detector input with a correction set, using whatever object
/// snapshot the arena published last.
pub struct CollisionStageActor {
    detector: CollisionDetector,
    arena_rx: watch::Receiver<ArenaSnapshot>,
    input_rx: mpsc::Receiver<DetectorInput>,
    corrections_tx: mpsc::Sender<Corrections>,
}

impl CollisionStageActor {
    pub fn new(
        detector: CollisionDetector,
        arena_rx: watch::Receiver<ArenaSnapshot>,
        input_rx: mpsc::Receiver<DetectorInput>,
        corrections_tx: mpsc::Sender<Corrections>,
    ) -> Self {
        Self {
            detector,
            arena_rx,
            input_rx,
            corrections_tx,
        }
    }

    /// Runs until the agent stage hangs up its side of the input channel.
    pub async fn run(mut self) -> ApplicationResult<StageReport> {
        let mut report = StageReport::new(STAGE);
        info!(stage = STAGE, enabled = self.detector.enabled(), "collision stage started");

        while let Some(input) = self.input_rx.recv().await {
            let corrections = {
                let arena = self.arena_rx.borrow();
                self.detector.detect(&input, &arena.objects)
            };
            debug!(
                stage = STAGE,
                run = input.run,
                tick = input.tick,
                corrected = corrections.count(),
                "corrections computed"
            );
            report.record(input.run, input.tick);
            self.corrections_tx
                .send(corrections)
                .await
                .map_err(|_| ApplicationError::channel_closed(STAGE, "corrections"))?;
        }

        info!(stage = STAGE, "collision stage closed");
        Ok(report)
    }
}
