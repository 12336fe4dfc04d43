use serde::{Deserialize, Serialize};

/// Signals a renderer/controller can push into the arena stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunControl {
    /// Resume advancing ticks.
    Start,
    /// Pause before the next tick.
    Stop,
    /// Advance exactly one tick while paused.
    Step,
    /// End the experiment after the current tick.
    Quit,
}
