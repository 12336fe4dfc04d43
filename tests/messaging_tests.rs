use arena_sim::domains::geometry::Vector3;
use arena_sim::domains::messaging::*;
use arena_sim::domains::spatial::GridEntry;
use serde_json::json;

fn entry(id: usize, name: &str, x: f64) -> GridEntry {
    GridEntry {
        id,
        name: name.to_string(),
        position: Vector3::new(x, 0.0, 0.0),
    }
}

fn bus(config: MessagingConfig) -> MessageBus {
    let mut bus = MessageBus::new(config, ["a", "b", "c"]).unwrap();
    bus.update_grid(vec![entry(0, "a", 0.0), entry(1, "b", 0.05), entry(2, "c", 1.0)]);
    bus
}

#[test]
fn test_broadcast_reaches_only_agents_in_range() {
    let mut bus = bus(MessagingConfig {
        comm_range: 0.1,
        delivery: Delivery::Broadcast,
        ..MessagingConfig::default()
    });

    let delivered = bus.send(0, "a", Message::new(7, json!({ "tick": 7 })));
    assert_eq!(delivered, 1);

    let inbox = bus.receive("b");
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].tick, 7);
    assert_eq!(inbox[0].from, None);

    assert!(bus.receive("c").is_empty());
    assert!(bus.receive("a").is_empty());
    assert!(bus.receive("b").is_empty(), "receive drains the mailbox");
}

#[test]
fn test_id_disclosure_stamps_sender() {
    let mut bus = bus(MessagingConfig {
        kind: Disclosure::Id,
        ..MessagingConfig::default()
    });
    bus.send(1, "b", Message::new(1, json!(null)));
    let inbox = bus.receive("a");
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].from.as_deref(), Some("b"));
}

#[test]
fn test_hand_shake_delivers_to_addressee_only() {
    let mut bus = MessageBus::new(
        MessagingConfig {
            delivery: Delivery::HandShake,
            comm_range: 0.2,
            ..MessagingConfig::default()
        },
        ["a", "b", "c"],
    )
    .unwrap();
    bus.update_grid(vec![entry(0, "a", 0.0), entry(1, "b", 0.05), entry(2, "c", -0.05)]);

    let delivered = bus.send(0, "a", Message::new(3, json!({})).addressed_to("c"));
    assert_eq!(delivered, 1);
    assert!(bus.receive("b").is_empty());
    assert_eq!(bus.receive("c").len(), 1);
}

#[test]
fn test_non_members_get_no_mailbox() {
    let mut bus = MessageBus::new(MessagingConfig::default(), ["a"]).unwrap();
    bus.update_grid(vec![entry(0, "a", 0.0), entry(1, "x", 0.05)]);
    assert_eq!(bus.send(0, "a", Message::new(1, json!({}))), 0);
    assert!(!bus.is_member("x"));
}

#[test]
fn test_reset_clears_pending_messages() {
    let mut bus = bus(MessagingConfig::default());
    bus.send(0, "a", Message::new(1, json!({})));
    assert_eq!(bus.pending("b"), 1);
    bus.reset_mailboxes();
    assert_eq!(bus.pending("b"), 0);
}

#[test]
fn test_send_cadence_follows_messages_per_second() {
    let config = MessagingConfig {
        messages_per_second: 2.0,
        ..MessagingConfig::default()
    };
    let due: Vec<u64> = (0..=12).filter(|t| config.should_send(*t, 10)).collect();
    assert_eq!(due, vec![1, 6, 11]);

    let every_tick = MessagingConfig {
        messages_per_second: 50.0,
        ..MessagingConfig::default()
    };
    assert_eq!(every_tick.send_interval(10), 1);
}

#[test]
fn test_relayed_message_counts_hops() {
    let original = Message::new(4, json!({ "tick": 4 }));
    let relayed = original.relayed().relayed();
    assert_eq!(relayed.hops, 2);
    assert_eq!(relayed.tick, 4);
}

fn relay_chain(max_hops: u32, messages_per_second: f64) -> arena_sim::domains::agents::AgentManager {
    use arena_sim::config::{AgentGroupConfig, ArenaConfig};
    use arena_sim::domains::agents::AgentManager;
    use arena_sim::domains::arena::arena_shape;
    use std::collections::BTreeMap;

    let mut groups = BTreeMap::new();
    groups.insert(
        "relay".to_string(),
        AgentGroupConfig {
            number: 3,
            shape: "circle".into(),
            diameter: 0.02,
            is_static: true,
            positions: vec![[0.0, 0.0], [0.05, 0.0], [0.1, 0.0]],
            messages: Some(MessagingConfig {
                messages_per_second,
                comm_range: 0.06,
                delivery: Delivery::Rebroadcast,
                max_hops,
                ..MessagingConfig::default()
            }),
            ..AgentGroupConfig::default()
        },
    );
    let arena = arena_shape(&ArenaConfig::default()).unwrap();
    let mut manager = AgentManager::new(groups, 10);
    manager.initialize(1, &arena, &BTreeMap::new()).unwrap();
    manager
}

fn origin_x(message: &Message) -> f64 {
    message.body["position"][0].as_f64().unwrap()
}

#[test]
fn test_rebroadcast_forwards_across_slow_send_ticks() {
    // Two messages per second at ten ticks per second: sends on 1, 6, 11.
    let mut manager = relay_chain(2, 2.0);
    for tick in 1..=5 {
        manager.exchange_messages(tick);
    }
    let middle = manager.find("agent_relay_1").unwrap();
    assert_eq!(middle.relay_queue().len(), 2, "mail heard on tick 1 waits for the next send");

    manager.exchange_messages(6);
    let far = manager.find("agent_relay_2").unwrap();
    let relayed_from_first: Vec<&Message> = far
        .inbox()
        .iter()
        .filter(|m| m.hops == 1 && origin_x(m).abs() < 1e-9)
        .collect();
    assert_eq!(relayed_from_first.len(), 1);
    assert_eq!(relayed_from_first[0].tick, 1);
    assert!(far.inbox().iter().all(|m| m.hops > 0 || (origin_x(m) - 0.05).abs() < 1e-9));
}

#[test]
fn test_rebroadcast_stops_at_max_hops() {
    for max_hops in [1, 2] {
        let mut manager = relay_chain(max_hops, 2.0);
        let mut deepest = 0;
        for tick in 1..=30 {
            manager.exchange_messages(tick);
            for agent in manager.agents()["relay"].iter() {
                deepest = agent.inbox().iter().map(|m| m.hops).fold(deepest, u32::max);
            }
        }
        assert_eq!(deepest, max_hops);
    }
}
