use crate::common::{DomainError, DomainResult, SimRng};
use crate::domains::geometry::{Shape, ShapeKind};

/// Rejection-sampling budget per entity.
pub const MAX_PLACEMENT_ATTEMPTS: usize = 500;

/// Moves `shape` to a random resting position inside `arena` where it
/// neither crosses the boundary nor overlaps any of `obstacles`.
///
/// In an abstract arena every entity sits at the arena center unchecked.
pub fn place(
    shape: &mut Shape,
    rng: &mut SimRng,
    arena: &Shape,
    obstacles: &[&Shape],
    entity: &str,
) -> DomainResult<()> {
    let rest = shape.rest_height();
    if arena.kind() == ShapeKind::Point {
        shape.translate(arena.center().with_z(rest));
        return Ok(());
    }
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let candidate = shape.random_point_inside(rng, arena).with_z(rest);
        shape.translate(candidate);
        if shape.check_overlap(arena).collided {
            continue;
        }
        if obstacles.iter().any(|o| shape.check_overlap(o).collided) {
            continue;
        }
        return Ok(());
    }
    Err(DomainError::PlacementExhausted {
        entity: entity.to_string(),
        attempts: MAX_PLACEMENT_ATTEMPTS,
    })
}
