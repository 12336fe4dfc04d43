//! Per-tick payloads exchanged between the pipeline stages.
//!
//! Each payload is produced by exactly one stage and owned by value once it
//! crosses a channel; no shape or entity is shared across stage boundaries.

use crate::domains::geometry::{Shape, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Layout version carried by every payload.
pub const SNAPSHOT_VERSION: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArenaPhase {
    /// Nothing published yet.
    Idle,
    Running,
    /// The experiment is over; consumers should wind down.
    Finished,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectState {
    pub name: String,
    pub shape: Shape,
    pub position: Vector3,
    pub orientation: f64,
    pub strength: f64,
    pub uncertainty: f64,
    pub movable: bool,
}

/// Arena -> agents / collision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaSnapshot {
    pub version: u16,
    pub run: u32,
    pub tick: u64,
    pub seed: u64,
    pub phase: ArenaPhase,
    pub objects: BTreeMap<String, Vec<ObjectState>>,
}

impl ArenaSnapshot {
    pub fn idle() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            run: 0,
            tick: 0,
            seed: 0,
            phase: ArenaPhase::Idle,
            objects: BTreeMap::new(),
        }
    }

    pub fn object_count(&self) -> usize {
        self.objects.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    pub name: String,
    pub shape: Shape,
    pub position: Vector3,
    pub orientation: f64,
    pub forward_vector: Vector3,
    pub max_speed: f64,
    pub lattice: Option<Vec<u8>>,
}

/// Agents -> arena / renderer: kinematic state after the policies ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub version: u16,
    pub run: u32,
    pub tick: u64,
    pub agents: BTreeMap<String, Vec<AgentState>>,
}

impl AgentSnapshot {
    pub fn idle() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            run: 0,
            tick: 0,
            agents: BTreeMap::new(),
        }
    }

    pub fn agent_count(&self) -> usize {
        self.agents.values().map(Vec::len).sum()
    }

    pub fn find(&self, name: &str) -> Option<&AgentState> {
        self.agents.values().flatten().find(|a| a.name == name)
    }
}

/// What the collision detector needs to know about one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionBody {
    pub name: String,
    pub shape: Shape,
    pub max_speed: f64,
    pub heading_vector: Vector3,
    /// Position before this tick's move; `shape` is already moved.
    pub position: Vector3,
}

/// Agents -> collision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorInput {
    pub version: u16,
    pub run: u32,
    pub tick: u64,
    pub agents: BTreeMap<String, Vec<CollisionBody>>,
}

/// Collision -> agents. `None` leaves an agent where its policy put it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Corrections {
    pub version: u16,
    pub run: u32,
    pub tick: u64,
    pub corrections: BTreeMap<String, Vec<Option<Vector3>>>,
}

impl Corrections {
    pub fn for_agent(&self, group: &str, index: usize) -> Option<Vector3> {
        self.corrections
            .get(group)
            .and_then(|list| list.get(index).copied().flatten())
    }

    pub fn count(&self) -> usize {
        self.corrections.values().flatten().filter(|c| c.is_some()).count()
    }
}
