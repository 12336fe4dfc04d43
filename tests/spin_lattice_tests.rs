use arena_sim::common::seeded;
use arena_sim::domains::geometry::wrap_angle;
use arena_sim::domains::spin_lattice::*;

fn lattice(params: SpinLatticeParams) -> SpinLattice {
    let mut rng = seeded(11);
    SpinLattice::new(params, &mut rng)
}

#[test]
fn test_zero_coupling_and_field_accepts_every_flip() {
    let lattice = lattice(SpinLatticeParams {
        coupling: 0.0,
        ..SpinLatticeParams::default()
    });
    let state = lattice.states().to_vec();
    for idx in 0..lattice.len() {
        let delta = lattice.flip_delta(&state, idx);
        assert_eq!(delta, 0.0);
        assert_eq!(lattice.acceptance_probability(delta), 1.0);
    }
}

#[test]
fn test_single_active_unit_gives_its_angle() {
    let mut lattice = lattice(SpinLatticeParams::default());
    for group in 0..lattice.num_groups() {
        let mut states = vec![0u8; lattice.len()];
        let idx = group * lattice.num_spins_per_group();
        states[idx] = 1;
        lattice.set_states(&states).unwrap();
        let direction = lattice.average_direction_of_activity().unwrap();
        assert!((direction - wrap_angle(lattice.angles()[idx])).abs() < 1e-12);
        assert_eq!(lattice.width_of_activity(), None);
        assert_eq!(speed_fraction_from_width(lattice.width_of_activity()), 1.0);
    }
}

#[test]
fn test_all_or_nothing_active_has_no_direction() {
    let mut lattice = lattice(SpinLatticeParams::default());
    lattice.set_states(&vec![1u8; lattice.len()]).unwrap();
    assert_eq!(lattice.average_direction_of_activity(), None);
    lattice.set_states(&vec![0u8; lattice.len()]).unwrap();
    assert_eq!(lattice.average_direction_of_activity(), None);
}

#[test]
fn test_focused_bump_moves_faster_than_dispersed_one() {
    let mut lattice = lattice(SpinLatticeParams::default());
    let per_group = lattice.num_spins_per_group();

    let mut focused = vec![0u8; lattice.len()];
    focused[..per_group].iter_mut().for_each(|s| *s = 1);
    lattice.set_states(&focused).unwrap();
    let fast = speed_fraction_from_width(lattice.width_of_activity());

    let mut dispersed = vec![0u8; lattice.len()];
    dispersed[0] = 1;
    dispersed[3 * per_group] = 1;
    dispersed[6 * per_group] = 1;
    lattice.set_states(&dispersed).unwrap();
    let slow = speed_fraction_from_width(lattice.width_of_activity());

    assert_eq!(fast, 1.0);
    assert!(slow < fast);
    assert!((0.0..=1.0).contains(&slow));
}

#[test]
fn test_history_is_bounded_by_time_delay() {
    let mut lattice = lattice(SpinLatticeParams {
        time_delay: 3,
        ..SpinLatticeParams::default()
    });
    let mut rng = seeded(5);
    lattice.run(500, &mut rng);
    assert!(lattice.history_len() <= 3);
}

#[test]
fn test_pre_run_clears_history() {
    let mut lattice = lattice(SpinLatticeParams {
        time_delay: 4,
        ..SpinLatticeParams::default()
    });
    let mut rng = seeded(5);
    lattice.run(10, &mut rng);
    lattice.pre_run(100, &mut rng);
    assert_eq!(lattice.history_len(), 1);
}

#[test]
fn test_strong_field_attracts_activity() {
    let mut lattice = lattice(SpinLatticeParams {
        temperature: 0.05,
        ..SpinLatticeParams::default()
    });
    let target = lattice.angles()[3 * lattice.num_spins_per_group()];
    let field: Vec<f64> = lattice
        .angles()
        .iter()
        .map(|a| {
            let d = wrap_angle(a - target);
            5.0 * (-(d * d) / (2.0 * 0.6 * 0.6)).exp()
        })
        .collect();
    lattice.update_external_field(&field).unwrap();
    let mut rng = seeded(9);
    lattice.run(5_000, &mut rng);
    let direction = lattice.average_direction_of_activity().unwrap();
    assert!(wrap_angle(direction - target).abs() < 0.3);
}

#[test]
fn test_glauber_probability_is_capped() {
    let lattice = lattice(SpinLatticeParams {
        dynamics: Dynamics::Glauber,
        ..SpinLatticeParams::default()
    });
    for delta in [-50.0, -1.0, 0.0, 1.0, 50.0] {
        let p = lattice.acceptance_probability(delta);
        assert!((0.0..=1.0).contains(&p));
    }
}

#[test]
fn test_field_length_is_checked() {
    let mut lattice = lattice(SpinLatticeParams::default());
    assert!(lattice.update_external_field(&[0.0; 3]).is_err());
}

fn pair(time_delay: usize) -> SpinLattice {
    // Two aligned units with strong coupling and a field that discourages
    // activity: switching one on costs energy when its partner is off and
    // pays off when its partner is on.
    let mut lattice = lattice(SpinLatticeParams {
        num_groups: 1,
        num_spins_per_group: 2,
        coupling: 2.0,
        temperature: 1e-6,
        time_delay,
        dynamics: Dynamics::Metropolis,
        ..SpinLatticeParams::default()
    });
    lattice.set_states(&[1, 1]).unwrap();
    lattice.set_states(&[0, 0]).unwrap();
    lattice.update_external_field(&[-0.5, -0.5]).unwrap();
    lattice
}

#[test]
fn test_time_delay_evaluates_flip_against_oldest_state() {
    let live = pair(0);
    assert!(live.flip_delta(&[0, 0], 0) > 0.0);
    assert!(live.flip_delta(&[0, 1], 0) < 0.0);

    let mut rng = seeded(21);
    let mut undelayed = pair(0);
    assert!(!undelayed.step(&mut rng), "live state makes every flip uphill");
    assert_eq!(undelayed.states(), &[0, 0]);

    // Oldest retained state is [1, 1]; the chosen unit takes its live value
    // and sees an active partner, so the flip goes downhill.
    let mut delayed = pair(2);
    assert!(delayed.step(&mut rng));
    assert_eq!(delayed.states().iter().filter(|s| **s == 1).count(), 1);
}
