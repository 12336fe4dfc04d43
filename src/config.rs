use crate::common::{DomainError, DomainResult};
use crate::domains::agents::PolicyConfig;
use crate::domains::geometry::ShapeSpec;
use crate::domains::messaging::MessagingConfig;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub arena: ArenaConfig,
    #[serde(default)]
    pub gui: GuiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub agents: BTreeMap<String, AgentGroupConfig>,
    #[serde(default)]
    pub objects: BTreeMap<String, ObjectGroupConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub num_runs: u32,
    pub ticks_per_second: u32,
    /// Seconds per run; 0 runs until stopped from the GUI.
    pub time_limit: u64,
    /// Base seed of run 1; negative draws fresh entropy every run.
    pub random_seed: i64,
    pub collisions: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_runs: 1,
            ticks_per_second: 10,
            time_limit: 10,
            random_seed: -1,
            collisions: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// abstract, none, circle, square or rectangle.
    pub kind: String,
    pub radius: f64,
    pub side: f64,
    pub width: f64,
    pub length: f64,
    pub height: f64,
    pub color: String,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            kind: "square".to_string(),
            radius: 1.0,
            side: 2.0,
            width: 2.0,
            length: 2.0,
            height: 1.0,
            color: "gray".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiConfig {
    pub render: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: Option<String>,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: None,
            level: "info".to_string(),
        }
    }
}

fn default_number() -> usize {
    1
}

fn default_shape() -> String {
    "sphere".to_string()
}

fn default_dimension() -> f64 {
    0.1
}

fn default_color() -> String {
    "white".to_string()
}

fn default_linear_velocity() -> f64 {
    0.1
}

fn default_angular_velocity() -> f64 {
    10.0
}

fn default_strength() -> f64 {
    1.0
}

fn default_uncertainty() -> f64 {
    0.1
}

/// One `[agents.<type>]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentGroupConfig {
    #[serde(default = "default_number")]
    pub number: usize,
    #[serde(default = "default_shape")]
    pub shape: String,
    #[serde(default = "default_dimension")]
    pub diameter: f64,
    #[serde(default = "default_dimension")]
    pub width: f64,
    #[serde(default = "default_dimension")]
    pub depth: f64,
    #[serde(default = "default_dimension")]
    pub height: f64,
    #[serde(default = "default_color")]
    pub color: String,
    /// Units per second.
    #[serde(default = "default_linear_velocity")]
    pub linear_velocity: f64,
    /// Degrees per second.
    #[serde(default = "default_angular_velocity")]
    pub angular_velocity: f64,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    /// Explicit planar positions; entities without one are placed randomly.
    #[serde(default)]
    pub positions: Vec<[f64; 2]>,
    /// Explicit headings in degrees.
    #[serde(default)]
    pub orientations: Vec<f64>,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub messages: Option<MessagingConfig>,
}

impl Default for AgentGroupConfig {
    fn default() -> Self {
        Self {
            number: default_number(),
            shape: default_shape(),
            diameter: default_dimension(),
            width: default_dimension(),
            depth: default_dimension(),
            height: default_dimension(),
            color: default_color(),
            linear_velocity: default_linear_velocity(),
            angular_velocity: default_angular_velocity(),
            is_static: false,
            positions: Vec::new(),
            orientations: Vec::new(),
            policy: PolicyConfig::default(),
            messages: None,
        }
    }
}

impl AgentGroupConfig {
    pub fn shape_spec(&self) -> ShapeSpec {
        ShapeSpec {
            shape: self.shape.clone(),
            diameter: self.diameter,
            width: self.width,
            height: self.height,
            depth: self.depth,
            color: self.color.clone(),
        }
    }
}

/// One `[objects.<type>]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectGroupConfig {
    #[serde(default = "default_number")]
    pub number: usize,
    #[serde(default = "default_shape")]
    pub shape: String,
    #[serde(default = "default_dimension")]
    pub diameter: f64,
    #[serde(default = "default_dimension")]
    pub width: f64,
    #[serde(default = "default_dimension")]
    pub depth: f64,
    #[serde(default = "default_dimension")]
    pub height: f64,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_true", rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub positions: Vec<[f64; 2]>,
    #[serde(default)]
    pub orientations: Vec<f64>,
    #[serde(default = "default_strength")]
    pub strength: f64,
    #[serde(default = "default_uncertainty")]
    pub uncertainty: f64,
}

fn default_true() -> bool {
    true
}

impl Default for ObjectGroupConfig {
    fn default() -> Self {
        Self {
            number: default_number(),
            shape: default_shape(),
            diameter: default_dimension(),
            width: default_dimension(),
            depth: default_dimension(),
            height: default_dimension(),
            color: default_color(),
            is_static: true,
            positions: Vec::new(),
            orientations: Vec::new(),
            strength: default_strength(),
            uncertainty: default_uncertainty(),
        }
    }
}

impl ObjectGroupConfig {
    pub fn shape_spec(&self) -> ShapeSpec {
        ShapeSpec {
            shape: self.shape.clone(),
            diameter: self.diameter,
            width: self.width,
            height: self.height,
            depth: self.depth,
            color: self.color.clone(),
        }
    }
}

fn check_explicit(subject: &str, number: usize, positions: usize, orientations: usize) -> DomainResult<()> {
    if positions > 0 && positions != number {
        return Err(DomainError::configuration(
            subject,
            format!("{} positions given for {} entities", positions, number),
        ));
    }
    if orientations > 0 && orientations != number {
        return Err(DomainError::configuration(
            subject,
            format!("{} orientations given for {} entities", orientations, number),
        ));
    }
    Ok(())
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::from_toml(&content)?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Number of ticks per run, counting tick 0. `None` means unbounded.
    pub fn ticks_limit(&self) -> Option<u64> {
        let sim = &self.simulation;
        if sim.time_limit == 0 {
            None
        } else {
            Some(sim.time_limit * u64::from(sim.ticks_per_second) + 1)
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        let sim = &self.simulation;
        if sim.num_runs == 0 {
            return Err(DomainError::configuration("simulation", "num_runs must be at least 1"));
        }
        if sim.ticks_per_second == 0 {
            return Err(DomainError::configuration("simulation", "ticks_per_second must be at least 1"));
        }
        if sim.time_limit == 0 && !self.gui.render {
            return Err(DomainError::configuration(
                "simulation",
                "time_limit 0 runs forever and needs gui.render to be stopped",
            ));
        }

        crate::domains::arena::arena_shape(&self.arena)?;

        for (name, group) in &self.agents {
            let subject = format!("agents.{}", name);
            crate::domains::geometry::Shape::from_spec(
                crate::domains::geometry::ShapeRole::Entity,
                &group.shape_spec(),
            )
            .map_err(|e| DomainError::configuration(subject.clone(), e.to_string()))?;
            if group.linear_velocity < 0.0 || group.angular_velocity < 0.0 {
                return Err(DomainError::configuration(subject, "velocities must not be negative"));
            }
            check_explicit(&subject, group.number, group.positions.len(), group.orientations.len())?;
            group.policy.validate(&subject)?;
            if let Some(messages) = &group.messages {
                if messages.comm_range <= 0.0 {
                    return Err(DomainError::configuration(subject, "comm_range must be positive"));
                }
                if messages.messages_per_second < 0.0 {
                    return Err(DomainError::configuration(subject, "messages_per_second must not be negative"));
                }
            }
        }

        for (name, group) in &self.objects {
            let subject = format!("objects.{}", name);
            crate::domains::geometry::Shape::from_spec(
                crate::domains::geometry::ShapeRole::Entity,
                &group.shape_spec(),
            )
            .map_err(|e| DomainError::configuration(subject.clone(), e.to_string()))?;
            if group.uncertainty < 0.0 {
                return Err(DomainError::configuration(subject, "uncertainty must not be negative"));
            }
            check_explicit(&subject, group.number, group.positions.len(), group.orientations.len())?;
        }
        Ok(())
    }
}
