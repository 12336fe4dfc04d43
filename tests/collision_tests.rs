use arena_sim::common::{CollisionBody, DetectorInput, SNAPSHOT_VERSION};
use arena_sim::config::{AgentGroupConfig, ArenaConfig};
use arena_sim::domains::agents::AgentManager;
use arena_sim::domains::arena::arena_shape;
use arena_sim::domains::collision::*;
use arena_sim::domains::geometry::*;
use std::collections::BTreeMap;

fn square_arena(side: f64) -> Shape {
    arena_shape(&ArenaConfig {
        kind: "square".into(),
        side,
        ..ArenaConfig::default()
    })
    .unwrap()
}

fn single_agent(position: [f64; 2], heading: f64, speed: f64) -> BTreeMap<String, AgentGroupConfig> {
    let mut groups = BTreeMap::new();
    groups.insert(
        "a".to_string(),
        AgentGroupConfig {
            number: 1,
            shape: "circle".into(),
            diameter: 0.1,
            linear_velocity: speed,
            angular_velocity: 0.0,
            positions: vec![position],
            orientations: vec![heading],
            ..AgentGroupConfig::default()
        },
    );
    groups
}

fn body(name: &str, x: f64, heading: Vector3) -> CollisionBody {
    let mut spec = ShapeSpec::new("circle");
    spec.diameter = 0.1;
    let mut shape = Shape::from_spec(ShapeRole::Entity, &spec).unwrap();
    shape.translate(Vector3::new(x, 0.0, 0.0));
    CollisionBody {
        name: name.to_string(),
        shape,
        max_speed: 0.02,
        heading_vector: heading,
        position: Vector3::new(x, 0.0, 0.0),
    }
}

#[test]
fn test_agent_driving_into_wall_is_pushed_back_inside() {
    let arena = square_arena(2.0);
    let objects = BTreeMap::new();
    let detector = CollisionDetector::new(arena.clone(), true);
    let mut manager = AgentManager::new(single_agent([0.0, 0.0], 0.0, 0.02), 1);
    manager.initialize(1, &arena, &objects).unwrap();

    let mut corrected = Vec::new();
    for tick in 1..=100 {
        manager.step(tick, &arena, &objects).unwrap();
        let moved_into_wall = manager.agents()["a"][0].shape().check_overlap(&arena).collided;

        let input = manager.detector_input(1, tick);
        let corrections = detector.detect(&input, &objects);
        let correction = corrections.for_agent("a", 0);
        assert_eq!(
            correction.is_some(),
            moved_into_wall,
            "tick {}: overlap and correction disagree",
            tick
        );
        if let Some(position) = correction {
            assert!((-1.0..=1.0).contains(&position.x));
            assert!((-1.0..=1.0).contains(&position.y));
            corrected.push(tick);
        }

        manager.apply_corrections(&corrections, 1, tick).unwrap();
        let agent = &manager.agents()["a"][0];
        assert!(
            !agent.shape().check_overlap(&arena).collided,
            "tick {}: agent left overlapping the wall at x={:.3}",
            tick,
            agent.position().x
        );
    }

    // 0.05 radius at 0.02 per tick first crosses x = 1 on the move to 0.96.
    assert_eq!(corrected.first(), Some(&48));
}

#[test]
fn test_disabled_detector_never_corrects() {
    let arena = square_arena(2.0);
    let detector = CollisionDetector::new(arena, false);
    let mut agents = BTreeMap::new();
    agents.insert(
        "a".to_string(),
        vec![body("agent_a_0", 0.99, Vector3::new(0.02, 0.0, 0.0))],
    );
    let input = DetectorInput {
        version: SNAPSHOT_VERSION,
        run: 1,
        tick: 1,
        agents,
    };
    let corrections = detector.detect(&input, &BTreeMap::new());
    assert_eq!(corrections.count(), 0);
    assert_eq!(corrections.corrections["a"].len(), 1);
}

#[test]
fn test_head_on_agents_are_pushed_apart() {
    let detector = CollisionDetector::new(square_arena(2.0), true);
    let mut agents = BTreeMap::new();
    agents.insert(
        "a".to_string(),
        vec![
            body("agent_a_0", -0.04, Vector3::new(0.02, 0.0, 0.0)),
            body("agent_a_1", 0.04, Vector3::new(-0.02, 0.0, 0.0)),
        ],
    );
    let input = DetectorInput {
        version: SNAPSHOT_VERSION,
        run: 1,
        tick: 3,
        agents,
    };
    let corrections = detector.detect(&input, &BTreeMap::new());
    let left = corrections.for_agent("a", 0).unwrap();
    let right = corrections.for_agent("a", 1).unwrap();
    assert!(left.x < -0.04);
    assert!(right.x > 0.04);
    assert_eq!(corrections.tick, 3);
}

#[test]
fn test_separated_agents_get_no_correction() {
    let detector = CollisionDetector::new(square_arena(2.0), true);
    let mut agents = BTreeMap::new();
    agents.insert(
        "a".to_string(),
        vec![
            body("agent_a_0", -0.5, Vector3::new(0.02, 0.0, 0.0)),
            body("agent_a_1", 0.5, Vector3::new(-0.02, 0.0, 0.0)),
        ],
    );
    let input = DetectorInput {
        version: SNAPSHOT_VERSION,
        run: 1,
        tick: 1,
        agents,
    };
    assert_eq!(detector.detect(&input, &BTreeMap::new()).count(), 0);
}

#[test]
fn test_box_normal_uses_nearest_edge() {
    let arena = square_arena(2.0);
    let normal = collision_normal(&Vector3::new(1.01, 0.2, 0.0), &arena, 0.5);
    assert!((normal.x + 0.5).abs() < 1e-12);
    assert!(normal.y.abs() < 1e-12);

    let mut spec = ShapeSpec::new("cube");
    spec.width = 0.4;
    spec.depth = 0.4;
    let obstacle = Shape::from_spec(ShapeRole::Entity, &spec).unwrap();
    let outward = collision_normal(&Vector3::new(0.0, 0.19, 0.0), &obstacle, 1.0);
    assert!((outward.y - 1.0).abs() < 1e-12);
}
