use arena_sim::common::{seeded, DomainError};
use arena_sim::domains::geometry::Vector3;
use arena_sim::domains::spatial::*;
use rand::Rng;

fn scatter(n: usize, seed: u64) -> Vec<GridEntry> {
    let mut rng = seeded(seed);
    (0..n)
        .map(|id| GridEntry {
            id,
            name: format!("agent_a_{}", id),
            position: Vector3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), 0.0),
        })
        .collect()
}

#[test]
fn test_neighbors_match_brute_force() {
    let entries = scatter(80, 1);
    for cell in [0.05, 0.1, 0.3] {
        let mut grid = SpatialGrid::new(cell).unwrap();
        grid.rebuild(entries.iter().cloned());
        for range in [0.02, 0.1, 0.25, 0.7] {
            for e in &entries {
                let mut expected: Vec<usize> = entries
                    .iter()
                    .filter(|o| o.id != e.id && o.position.planar_distance(&e.position) <= range)
                    .map(|o| o.id)
                    .collect();
                expected.sort_unstable();
                let found: Vec<usize> = grid.neighbors(e.id, range).iter().map(|n| n.id).collect();
                assert_eq!(found, expected, "cell {} range {} entity {}", cell, range, e.id);
            }
        }
    }
}

#[test]
fn test_insertion_order_does_not_matter() {
    let entries = scatter(30, 2);
    let mut forward = SpatialGrid::new(0.1).unwrap();
    forward.rebuild(entries.iter().cloned());
    let mut backward = SpatialGrid::new(0.1).unwrap();
    backward.rebuild(entries.iter().rev().cloned());
    for e in &entries {
        assert_eq!(forward.neighbors(e.id, 0.3), backward.neighbors(e.id, 0.3));
    }
}

#[test]
fn test_reinserting_moves_an_entry() {
    let mut grid = SpatialGrid::new(0.1).unwrap();
    grid.insert(0, "agent_a_0", Vector3::ZERO);
    grid.insert(1, "agent_a_1", Vector3::new(0.05, 0.0, 0.0));
    assert_eq!(grid.neighbors(0, 0.1).len(), 1);
    grid.insert(1, "agent_a_1", Vector3::new(0.9, 0.9, 0.0));
    assert!(grid.neighbors(0, 0.1).is_empty());
    assert_eq!(grid.len(), 2);
    grid.clear();
    assert!(grid.is_empty());
}

#[test]
fn test_cell_size_must_be_positive() {
    for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        assert!(matches!(SpatialGrid::new(bad), Err(DomainError::Configuration { .. })));
    }
}
