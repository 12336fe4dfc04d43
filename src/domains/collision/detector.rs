use crate::common::{CollisionBody, Corrections, DetectorInput, ObjectState, SNAPSHOT_VERSION};
use crate::domains::geometry::{Density, Shape, ShapeKind, ShapeRole, Vector3};
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

/// Share of the penetration depth applied as separation per tick.
pub const SEPARATION_GAIN: f64 = 0.1;
/// Length of the inward push applied on every boundary contact.
pub const BOUNDARY_NUDGE: f64 = 1e-3;

/// Computes per-agent position corrections from one tick's snapshots.
#[derive(Debug, Clone)]
pub struct CollisionDetector {
    arena: Shape,
    enabled: bool,
}

impl CollisionDetector {
    pub fn new(arena: Shape, enabled: bool) -> Self {
        Self { arena, enabled }
    }

    pub fn arena(&self) -> &Shape {
        &self.arena
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// One correction slot per agent, in input order.
    pub fn detect(
        &self,
        input: &DetectorInput,
        objects: &BTreeMap<String, Vec<ObjectState>>,
    ) -> Corrections {
        let corrections = input
            .agents
            .iter()
            .map(|(group, bodies)| {
                let list = bodies
                    .iter()
                    .map(|body| {
                        if self.enabled {
                            self.correct(body, &input.agents, objects)
                        } else {
                            None
                        }
                    })
                    .collect();
                (group.clone(), list)
            })
            .collect();
        Corrections {
            version: SNAPSHOT_VERSION,
            run: input.run,
            tick: input.tick,
            corrections,
        }
    }

    fn correct(
        &self,
        body: &CollisionBody,
        agents: &BTreeMap<String, Vec<CollisionBody>>,
        objects: &BTreeMap<String, Vec<ObjectState>>,
    ) -> Option<Vector3> {
        let shape = &body.shape;
        // Overlaps are tested where the agent moved to; corrections start
        // from where it was.
        let here = shape.center();
        let position = body.position;
        let mut correction: Option<Vector3> = None;
        let mut peer_push = Vector3::ZERO;

        for peer in agents.values().flatten() {
            if peer.name == body.name {
                continue;
            }
            let delta = (here - peer.shape.center()).planar();
            let reach = shape.get_radius() + peer.shape.get_radius();
            let distance = delta.magnitude();
            if distance > reach {
                continue;
            }
            let overlap = shape.check_overlap(&peer.shape);
            if !overlap.collided {
                continue;
            }
            let normal = collision_normal(&overlap.witness, &peer.shape, body.max_speed);
            let velocity = normal - body.heading_vector + peer.heading_vector;
            let separation = delta.normalize() * ((reach - distance) * SEPARATION_GAIN);
            peer_push += normal + peer.heading_vector;
            correction = Some(correction.unwrap_or(position) + velocity + separation);
        }

        for object in objects.values().flatten() {
            if object.shape.density() != Density::Dense {
                continue;
            }
            let delta = (here - object.shape.center()).planar();
            let reach = shape.get_radius() + object.shape.footprint_radius();
            let distance = delta.magnitude();
            if distance > reach {
                continue;
            }
            let overlap = shape.check_overlap(&object.shape);
            if !overlap.collided {
                continue;
            }
            let normal = collision_normal(&overlap.witness, &object.shape, body.max_speed);
            let velocity = normal - body.heading_vector;
            let separation = delta.normalize() * ((reach - distance) * SEPARATION_GAIN);
            correction = Some(correction.unwrap_or(position) + velocity + separation);
        }

        let overlap = shape.check_overlap(&self.arena);
        if overlap.collided {
            let normal = collision_normal(&overlap.witness, &self.arena, body.max_speed);
            let velocity = normal - body.heading_vector - peer_push;
            let nudge = (self.arena.center() - here).planar().normalize() * BOUNDARY_NUDGE;
            let candidate = correction.unwrap_or(position) + velocity + nudge;

            let mut probe = shape.clone();
            probe.translate(candidate.with_z(shape.center().z));
            correction = if probe.check_overlap(&self.arena).collided {
                Some(position + velocity + nudge)
            } else {
                Some(candidate)
            };
        }

        correction.map(|c| c.with_z(position.z))
    }
}

/// Direction (scaled by `speed`) pushing away from `peer` at `witness`.
///
/// Circular peers push along the line through their center; box peers push
/// perpendicular to the extent edge nearest the witness. The arena pushes
/// inward, every other peer pushes outward.
pub fn collision_normal(witness: &Vector3, peer: &Shape, speed: f64) -> Vector3 {
    let inward = peer.role() == ShapeRole::Arena;
    match peer.kind() {
        ShapeKind::Point => Vector3::ZERO,
        ShapeKind::Sphere { .. } | ShapeKind::Cylinder { .. } => {
            let outward = (*witness - peer.center()).planar().normalize();
            let direction = if inward { -outward } else { outward };
            direction * speed
        }
        ShapeKind::Cuboid { .. } => {
            let min = peer.min_extent();
            let max = peer.max_extent();
            // (distance to edge, inward normal of that edge)
            let edges = [
                ((witness.x - min.x).abs(), Vector3::new(1.0, 0.0, 0.0)),
                ((witness.x - max.x).abs(), Vector3::new(-1.0, 0.0, 0.0)),
                ((witness.y - min.y).abs(), Vector3::new(0.0, 1.0, 0.0)),
                ((witness.y - max.y).abs(), Vector3::new(0.0, -1.0, 0.0)),
            ];
            let Some((_, normal)) = edges.iter().min_by_key(|(d, _)| OrderedFloat(*d)) else {
                return Vector3::ZERO;
            };
            let direction = if inward { *normal } else { -*normal };
            direction * speed
        }
    }
}
