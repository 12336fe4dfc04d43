use crate::common::{DomainResult, ObjectState, SimRng};
use crate::domains::geometry::{Shape, Vector3};
use crate::domains::spin_lattice::{speed_fraction_from_width, SpinLattice, SpinLatticeParams};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::perception::{egocentric_bearing, field_direction, object_field, visual_field, PeerView};

/// Decision policy as configured on an agent group, tagged by `kind`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyConfig {
    #[default]
    RandomWalk,
    RandomWaypoint(WaypointParams),
    SpinLattice(SpinLatticePolicyParams),
    Vision(VisionParams),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaypointParams {
    /// Distance at which a waypoint counts as reached.
    pub reach: f64,
}

impl Default for WaypointParams {
    fn default() -> Self {
        Self { reach: 0.05 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinLatticePolicyParams {
    pub lattice: SpinLatticeParams,
    /// Objects farther than this are not perceived. Unlimited when unset.
    pub perception_range: Option<f64>,
    pub steps_per_tick: usize,
    pub pre_run_steps: usize,
}

impl Default for SpinLatticePolicyParams {
    fn default() -> Self {
        Self {
            lattice: SpinLatticeParams::default(),
            perception_range: None,
            steps_per_tick: 10,
            pre_run_steps: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionParams {
    pub sectors: usize,
    pub perception_range: f64,
}

impl Default for VisionParams {
    fn default() -> Self {
        Self { sectors: 36, perception_range: 1.0 }
    }
}

impl PolicyConfig {
    pub fn validate(&self, subject: &str) -> DomainResult<()> {
        use crate::common::DomainError;
        match self {
            PolicyConfig::RandomWalk => Ok(()),
            PolicyConfig::RandomWaypoint(p) if p.reach <= 0.0 => {
                Err(DomainError::configuration(subject, "waypoint reach must be positive"))
            }
            PolicyConfig::RandomWaypoint(_) => Ok(()),
            PolicyConfig::SpinLattice(p) => {
                if p.perception_range.is_some_and(|r| r <= 0.0) {
                    return Err(DomainError::configuration(subject, "perception_range must be positive"));
                }
                p.lattice.validate(subject)
            }
            PolicyConfig::Vision(p) if p.sectors == 0 || p.perception_range <= 0.0 => Err(
                DomainError::configuration(subject, "vision needs sectors > 0 and a positive perception_range"),
            ),
            PolicyConfig::Vision(_) => Ok(()),
        }
    }
}

/// Everything a policy may look at when deciding one tick.
pub struct PolicyContext<'a> {
    pub tick: u64,
    pub position: Vector3,
    /// Heading in degrees.
    pub orientation: f64,
    /// Largest turn allowed this tick, in degrees.
    pub max_turn: f64,
    pub shape: &'a Shape,
    pub arena: &'a Shape,
    pub objects: &'a BTreeMap<String, Vec<ObjectState>>,
    pub peers: &'a [PeerView],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub turn_degrees: f64,
    pub speed_fraction: f64,
}

impl Decision {
    pub fn hold() -> Self {
        Self { turn_degrees: 0.0, speed_fraction: 1.0 }
    }
}

/// Live decision policy of one agent.
#[derive(Debug, Clone)]
pub enum DecisionPolicy {
    RandomWalk,
    RandomWaypoint {
        reach: f64,
        waypoint: Option<Vector3>,
    },
    SpinLattice {
        lattice: Box<SpinLattice>,
        perception_range: Option<f64>,
        steps_per_tick: usize,
        pre_run_steps: usize,
    },
    Vision {
        sectors: usize,
        perception_range: f64,
    },
}

fn clamp_turn(turn: f64, max_turn: f64) -> f64 {
    turn.clamp(-max_turn.abs(), max_turn.abs())
}

fn random_turn(rng: &mut SimRng, max_turn: f64) -> f64 {
    let limit = max_turn.abs();
    if limit > 0.0 {
        rng.gen_range(-limit..=limit)
    } else {
        0.0
    }
}

impl DecisionPolicy {
    pub fn from_config(config: &PolicyConfig, rng: &mut SimRng) -> Self {
        match config {
            PolicyConfig::RandomWalk => DecisionPolicy::RandomWalk,
            PolicyConfig::RandomWaypoint(p) => DecisionPolicy::RandomWaypoint {
                reach: p.reach,
                waypoint: None,
            },
            PolicyConfig::SpinLattice(p) => DecisionPolicy::SpinLattice {
                lattice: Box::new(SpinLattice::new(p.lattice.clone(), rng)),
                perception_range: p.perception_range,
                steps_per_tick: p.steps_per_tick,
                pre_run_steps: p.pre_run_steps,
            },
            PolicyConfig::Vision(p) => DecisionPolicy::Vision {
                sectors: p.sectors,
                perception_range: p.perception_range,
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DecisionPolicy::RandomWalk => "random_walk",
            DecisionPolicy::RandomWaypoint { .. } => "random_waypoint",
            DecisionPolicy::SpinLattice { .. } => "spin_lattice",
            DecisionPolicy::Vision { .. } => "vision",
        }
    }

    /// Called once after placement, before the first tick. Runs the lattice
    /// burn-in against the initial object field.
    pub fn prepare(&mut self, ctx: &PolicyContext<'_>, rng: &mut SimRng) -> DomainResult<()> {
        if let DecisionPolicy::SpinLattice {
            lattice,
            perception_range,
            pre_run_steps,
            ..
        } = self
        {
            if *pre_run_steps > 0 {
                let field = object_field(
                    lattice.angles(),
                    &ctx.position,
                    ctx.orientation,
                    ctx.objects,
                    *perception_range,
                );
                lattice.update_external_field(&field)?;
                lattice.pre_run(*pre_run_steps, rng);
            }
        }
        Ok(())
    }

    pub fn decide(&mut self, ctx: &PolicyContext<'_>, rng: &mut SimRng) -> DomainResult<Decision> {
        match self {
            DecisionPolicy::RandomWalk => Ok(Decision {
                turn_degrees: random_turn(rng, ctx.max_turn),
                speed_fraction: 1.0,
            }),
            DecisionPolicy::RandomWaypoint { reach, waypoint } => {
                let reached = waypoint.map_or(true, |w| w.planar_distance(&ctx.position) <= *reach);
                if reached {
                    *waypoint = Some(ctx.shape.random_point_inside(rng, ctx.arena));
                }
                let target = waypoint.unwrap_or(ctx.position);
                if target.planar_distance(&ctx.position) <= f64::EPSILON {
                    return Ok(Decision::hold());
                }
                let bearing = egocentric_bearing(&ctx.position, ctx.orientation, &target);
                Ok(Decision {
                    turn_degrees: clamp_turn(bearing.to_degrees(), ctx.max_turn),
                    speed_fraction: 1.0,
                })
            }
            DecisionPolicy::SpinLattice {
                lattice,
                perception_range,
                steps_per_tick,
                ..
            } => {
                let field = object_field(
                    lattice.angles(),
                    &ctx.position,
                    ctx.orientation,
                    ctx.objects,
                    *perception_range,
                );
                lattice.update_external_field(&field)?;
                lattice.run(*steps_per_tick, rng);
                let turn = lattice
                    .average_direction_of_activity()
                    .map(|d| clamp_turn(d.to_degrees(), ctx.max_turn))
                    .unwrap_or(0.0);
                Ok(Decision {
                    turn_degrees: turn,
                    speed_fraction: speed_fraction_from_width(lattice.width_of_activity()),
                })
            }
            DecisionPolicy::Vision {
                sectors,
                perception_range,
            } => {
                let field = visual_field(
                    *sectors,
                    &ctx.position,
                    ctx.orientation,
                    ctx.peers,
                    *perception_range,
                );
                let turn = match field_direction(&field) {
                    Some(direction) => clamp_turn(direction.to_degrees(), ctx.max_turn),
                    None => random_turn(rng, ctx.max_turn),
                };
                Ok(Decision {
                    turn_degrees: turn,
                    speed_fraction: 1.0,
                })
            }
        }
    }

    /// Current lattice cells, for snapshots.
    pub fn lattice_states(&self) -> Option<Vec<u8>> {
        match self {
            DecisionPolicy::SpinLattice { lattice, .. } => Some(lattice.states().to_vec()),
            _ => None,
        }
    }

    pub fn lattice(&self) -> Option<&SpinLattice> {
        match self {
            DecisionPolicy::SpinLattice { lattice, .. } => Some(lattice),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_config_parses_tagged_tables() {
        let cfg: PolicyConfig = toml::from_str("kind = \"vision\"\nsectors = 12\n").unwrap();
        assert_eq!(
            cfg,
            PolicyConfig::Vision(VisionParams { sectors: 12, perception_range: 1.0 })
        );
        let cfg: PolicyConfig = toml::from_str("kind = \"random_walk\"\n").unwrap();
        assert_eq!(cfg, PolicyConfig::RandomWalk);
    }
}
