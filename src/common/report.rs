use serde::{Deserialize, Serialize};

/// Ticks a stage worked through, as `(run, tick)` pairs in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: String,
    pub ticks: Vec<(u32, u64)>,
}

impl StageReport {
    pub fn new(stage: &str) -> Self {
        Self {
            stage: stage.to_string(),
            ticks: Vec::new(),
        }
    }

    pub fn record(&mut self, run: u32, tick: u64) {
        self.ticks.push((run, tick));
    }

    /// Ticks processed during `run`.
    pub fn ticks_of(&self, run: u32) -> Vec<u64> {
        self.ticks
            .iter()
            .filter(|(r, _)| *r == run)
            .map(|(_, t)| *t)
            .collect()
    }

    pub fn runs(&self) -> Vec<u32> {
        let mut runs: Vec<u32> = self.ticks.iter().map(|(r, _)| *r).collect();
        runs.dedup();
        runs
    }
}
