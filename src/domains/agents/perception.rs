//! What an agent senses: a stimulus field over its lattice angles built from
//! the objects around it, and a visual field built from its peers.

use crate::common::ObjectState;
use crate::domains::geometry::{wrap_angle, Vector3};
use std::collections::BTreeMap;
use std::f64::consts::{PI, TAU};

/// Smallest angular spread an object's stimulus is allowed to have.
pub const MIN_UNCERTAINTY: f64 = 0.05;

/// Another agent as seen from the perceiving one.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerView {
    pub name: String,
    pub position: Vector3,
    pub radius: f64,
}

/// Bearing of `target` relative to an observer at `from` facing
/// `heading_degrees`, in (-PI, PI].
pub fn egocentric_bearing(from: &Vector3, heading_degrees: f64, target: &Vector3) -> f64 {
    let delta = *target - *from;
    wrap_angle(delta.y.atan2(delta.x) - heading_degrees.to_radians())
}

/// Stimulus per unit angle: the sum over perceived objects of
/// `strength * exp(-d^2 / (2 sigma^2))`, where `d` is the wrapped difference
/// between the unit angle and the object's bearing.
pub fn object_field(
    angles: &[f64],
    position: &Vector3,
    heading_degrees: f64,
    objects: &BTreeMap<String, Vec<ObjectState>>,
    range: Option<f64>,
) -> Vec<f64> {
    let mut field = vec![0.0; angles.len()];
    for object in objects.values().flatten() {
        let distance = position.planar_distance(&object.position);
        if range.is_some_and(|r| distance > r) || distance == 0.0 {
            continue;
        }
        let bearing = egocentric_bearing(position, heading_degrees, &object.position);
        let sigma = object.uncertainty.max(MIN_UNCERTAINTY);
        let denom = 2.0 * sigma * sigma;
        for (value, angle) in field.iter_mut().zip(angles) {
            let d = wrap_angle(angle - bearing);
            *value += object.strength * (-(d * d) / denom).exp();
        }
    }
    field
}

fn sector_center(sector: usize, sectors: usize) -> f64 {
    -PI + (sector as f64 + 0.5) * TAU / sectors as f64
}

fn sector_of(angle: f64, sectors: usize) -> usize {
    let idx = ((wrap_angle(angle) + PI) / TAU * sectors as f64).floor() as usize;
    idx.min(sectors - 1)
}

/// Egocentric visual field of `sectors` bins. A bin holds the largest
/// angular size among the peers covering it.
pub fn visual_field(
    sectors: usize,
    position: &Vector3,
    heading_degrees: f64,
    peers: &[PeerView],
    range: f64,
) -> Vec<f64> {
    let mut field = vec![0.0; sectors];
    if sectors == 0 {
        return field;
    }
    for peer in peers {
        let distance = position.planar_distance(&peer.position);
        if distance == 0.0 || distance > range {
            continue;
        }
        let bearing = egocentric_bearing(position, heading_degrees, &peer.position);
        let half = (peer.radius / distance).min(1.0).asin();
        let size = 2.0 * half;

        let hit = sector_of(bearing, sectors);
        field[hit] = field[hit].max(size);
        for (k, value) in field.iter_mut().enumerate() {
            if wrap_angle(sector_center(k, sectors) - bearing).abs() <= half {
                *value = value.max(size);
            }
        }
    }
    field
}

/// Weighted circular mean of a visual field. `None` when nothing is seen.
pub fn field_direction(field: &[f64]) -> Option<f64> {
    let sectors = field.len();
    let (x, y) = field
        .iter()
        .enumerate()
        .filter(|(_, w)| **w > 0.0)
        .fold((0.0, 0.0), |(x, y), (k, w)| {
            let a = sector_center(k, sectors);
            (x + w * a.cos(), y + w * a.sin())
        });
    if x.hypot(y) < 1e-12 {
        None
    } else {
        Some(y.atan2(x))
    }
}
