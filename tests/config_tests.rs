use arena_sim::config::Config;
use arena_sim::domains::agents::PolicyConfig;
use arena_sim::domains::messaging::{Delivery, Disclosure};
use arena_sim::domains::spin_lattice::Dynamics;
use std::io::Write;
use tempfile::NamedTempFile;
use tokio_test::{assert_err, assert_ok};

const EXPERIMENT: &str = r#"
[simulation]
num_runs = 3
ticks_per_second = 20
time_limit = 5
random_seed = 7

[arena]
kind = "rectangle"
width = 3.0
length = 2.0
color = "gray"

[agents.scout]
number = 2
shape = "sphere"
diameter = 0.1
linear_velocity = 0.2
angular_velocity = 45.0
positions = [[0.0, 0.0], [0.5, 0.5]]

[agents.scout.policy]
kind = "spin_lattice"
steps_per_tick = 25
perception_range = 1.5

[agents.scout.policy.lattice]
num_groups = 8
dynamics = "glauber"

[agents.scout.messages]
messages_per_second = 2.0
comm_range = 0.3
type = "hand_shake"
kind = "id"

[objects.light]
number = 1
shape = "circle"
diameter = 0.2
strength = 3.0
uncertainty = 0.2
"#;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_load_experiment_from_file() {
    let file = write_config(EXPERIMENT);
    let config = Config::from_file(file.path()).await.unwrap();

    assert_eq!(config.simulation.num_runs, 3);
    assert_eq!(config.ticks_limit(), Some(101));
    assert_eq!(config.arena.kind, "rectangle");

    let scout = &config.agents["scout"];
    assert_eq!(scout.number, 2);
    assert_eq!(scout.positions, vec![[0.0, 0.0], [0.5, 0.5]]);
    match &scout.policy {
        PolicyConfig::SpinLattice(params) => {
            assert_eq!(params.steps_per_tick, 25);
            assert_eq!(params.perception_range, Some(1.5));
            assert_eq!(params.lattice.num_groups, 8);
            assert_eq!(params.lattice.num_spins_per_group, 10);
            assert_eq!(params.lattice.dynamics, Dynamics::Glauber);
        }
        other => panic!("unexpected policy {:?}", other),
    }
    let messages = scout.messages.as_ref().unwrap();
    assert_eq!(messages.delivery, Delivery::HandShake);
    assert_eq!(messages.kind, Disclosure::Id);
    assert!(messages.enable);

    assert_eq!(config.objects["light"].strength, 3.0);
    assert!(config.objects["light"].is_static);
}

#[tokio::test]
async fn test_missing_file_is_an_error() {
    assert_err!(Config::from_file("/nonexistent/arena-sim.toml").await);
}

#[test]
fn test_defaults_are_valid() {
    let config = Config::default();
    assert_ok!(config.validate());
    assert_eq!(config.ticks_limit(), Some(101));
}

#[test]
fn test_unbounded_run_requires_render() {
    let headless = "[simulation]\ntime_limit = 0\n";
    assert_err!(Config::from_toml(headless));

    let rendered = "[simulation]\ntime_limit = 0\n[gui]\nrender = true\n";
    let config = assert_ok!(Config::from_toml(rendered));
    assert_eq!(config.ticks_limit(), None);
}

#[test]
fn test_rejections_name_the_offending_group() {
    let cases = [
        ("[arena]\nkind = \"hexagon\"\n", "hexagon"),
        ("[agents.bad]\nshape = \"blob\"\n", "agents.bad"),
        ("[objects.rock]\nshape = \"cube\"\nwidth = -1.0\n", "objects.rock"),
        ("[agents.a]\nnumber = 3\npositions = [[0.0, 0.0]]\n", "agents.a"),
        ("[agents.a.messages]\ncomm_range = 0.0\n", "agents.a"),
        ("[simulation]\nnum_runs = 0\n", "simulation"),
    ];
    for (content, subject) in cases {
        let err = Config::from_toml(content).unwrap_err();
        assert!(err.to_string().contains(subject), "{} -> {}", subject, err);
    }
}

#[test]
fn test_messages_table_enables_messaging_unless_switched_off() {
    let on = assert_ok!(Config::from_toml(
        "[agents.a.messages]\ncomm_range = 0.2\n"
    ));
    assert!(on.agents["a"].messages.as_ref().unwrap().enable);

    let off = assert_ok!(Config::from_toml(
        "[agents.a.messages]\nenable = false\ncomm_range = 0.2\n"
    ));
    assert!(!off.agents["a"].messages.as_ref().unwrap().enable);

    let silent = assert_ok!(Config::from_toml("[agents.a]\nnumber = 2\n"));
    assert!(silent.agents["a"].messages.is_none());
}
