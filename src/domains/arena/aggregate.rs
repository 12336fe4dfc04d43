use crate::common::{
    entity_rng, ArenaPhase, ArenaSnapshot, DomainError, DomainResult, ObjectState, SimRng,
    SNAPSHOT_VERSION,
};
use crate::config::{ArenaConfig, ObjectGroupConfig};
use crate::domains::geometry::{Density, Shape, ShapeKind, ShapeRole, ShapeSpec, Vector3};
use crate::domains::placement::place;
use rand::Rng;
use std::collections::BTreeMap;

/// Builds the arena boundary described by `config`.
pub fn arena_shape(config: &ArenaConfig) -> DomainResult<Shape> {
    let subject = format!("arena '{}'", config.kind);
    let kind = match config.kind.as_str() {
        "abstract" | "none" => return Ok(Shape::point(ShapeRole::Arena, &config.color)),
        "circle" => ShapeKind::Cylinder {
            radius: config.radius,
            height: config.height,
        },
        "square" => ShapeKind::Cuboid {
            width: config.side,
            height: config.height,
            depth: config.side,
        },
        "rectangle" => ShapeKind::Cuboid {
            width: config.width,
            height: config.height,
            depth: config.length,
        },
        _ => {
            return Err(DomainError::configuration(
                subject,
                "valid arenas are: abstract, none, circle, square, rectangle",
            ))
        }
    };
    let positive = match kind {
        ShapeKind::Cylinder { radius, .. } => radius > 0.0,
        ShapeKind::Cuboid { width, depth, .. } => width > 0.0 && depth > 0.0,
        _ => true,
    };
    if !positive || config.height < 0.0 {
        return Err(DomainError::configuration(subject, "dimensions must be positive"));
    }
    Ok(Shape::new(kind, ShapeRole::Arena, Density::Flat, &config.color))
}

/// A passive entity: a stimulus source or an obstacle.
#[derive(Debug, Clone)]
pub struct SimObject {
    name: String,
    shape: Shape,
    orientation: f64,
    start_position: Vector3,
    start_orientation: f64,
    strength: f64,
    uncertainty: f64,
    movable: bool,
}

impl SimObject {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn position(&self) -> Vector3 {
        self.shape.center()
    }

    pub fn orientation(&self) -> f64 {
        self.orientation
    }

    pub fn start_position(&self) -> Vector3 {
        self.start_position
    }

    pub fn start_orientation(&self) -> f64 {
        self.start_orientation
    }

    pub fn is_movable(&self) -> bool {
        self.movable
    }

    pub fn state(&self) -> ObjectState {
        ObjectState {
            name: self.name.clone(),
            shape: self.shape.clone(),
            position: self.position(),
            orientation: self.orientation,
            strength: self.strength,
            uncertainty: self.uncertainty,
            movable: self.movable,
        }
    }
}

/// World geometry plus the objects of the current run.
#[derive(Debug, Clone)]
pub struct Arena {
    shape: Shape,
    groups: BTreeMap<String, ObjectGroupConfig>,
    objects: BTreeMap<String, Vec<SimObject>>,
    run: u32,
    seed: u64,
}

impl Arena {
    pub fn new(config: &ArenaConfig, groups: BTreeMap<String, ObjectGroupConfig>) -> DomainResult<Self> {
        Ok(Self {
            shape: arena_shape(config)?,
            groups,
            objects: BTreeMap::new(),
            run: 0,
            seed: 0,
        })
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn run(&self) -> u32 {
        self.run
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn objects(&self) -> &BTreeMap<String, Vec<SimObject>> {
        &self.objects
    }

    /// Instantiates and places every object for `run`.
    pub fn reset(&mut self, run: u32, seed: u64) -> DomainResult<()> {
        self.run = run;
        self.seed = seed;
        self.objects.clear();

        let mut placed: Vec<Shape> = Vec::new();
        for (group, config) in &self.groups {
            let entity_type = format!("object_{}", group);
            let config_json = serde_json::to_string(config).map_err(|e| DomainError::InvalidState {
                reason: format!("cannot serialize {}: {}", entity_type, e),
            })?;
            let spec: ShapeSpec = config.shape_spec();
            let mut list = Vec::with_capacity(config.number);

            for id in 0..config.number {
                let name = format!("{}_{}", entity_type, id);
                let mut rng: SimRng = entity_rng(&config_json, seed, &entity_type, id);
                let mut shape = Shape::from_spec(ShapeRole::Entity, &spec)?;

                let orientation = match config.orientations.get(id) {
                    Some(o) => *o,
                    None => rng.gen_range(0.0..360.0),
                };
                shape.set_rotation(orientation);

                match config.positions.get(id) {
                    Some([x, y]) => shape.translate(Vector3::new(*x, *y, shape.rest_height())),
                    None => {
                        let peers: Vec<&Shape> = placed
                            .iter()
                            .filter(|s| s.density() == shape.density())
                            .collect();
                        place(&mut shape, &mut rng, &self.shape, &peers, &name)?;
                    }
                }

                placed.push(shape.clone());
                list.push(SimObject {
                    name,
                    start_position: shape.center(),
                    start_orientation: orientation,
                    orientation,
                    shape,
                    strength: config.strength,
                    uncertainty: config.uncertainty,
                    movable: !config.is_static,
                });
            }
            self.objects.insert(group.clone(), list);
        }
        Ok(())
    }

    pub fn snapshot(&self, tick: u64, phase: ArenaPhase) -> ArenaSnapshot {
        ArenaSnapshot {
            version: SNAPSHOT_VERSION,
            run: self.run,
            tick,
            seed: self.seed,
            phase,
            objects: self
                .objects
                .iter()
                .map(|(group, list)| (group.clone(), list.iter().map(SimObject::state).collect()))
                .collect(),
        }
    }

    /// Drops the objects of the finished run.
    pub fn close(&mut self) {
        self.objects.clear();
    }
}
