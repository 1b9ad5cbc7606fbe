//! Integration tests for replay determinism
//!
//! The same seed must produce the same scenarios, and the same scenario must
//! produce the same faults, whichever manager or network replays it.

use std::sync::Arc;

use moonpool_byzantine::{
    BroadcastNetwork, ByzantineConfiguration, ByzantineInjector, ByzantineManager, FaultFlags,
    FaultInjectingNetwork, Message, Scenario, ScenarioGenerator, ScenarioSet, SimRandom,
    TraitorBehavior,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();
}

fn generator(scenario_count: usize) -> ScenarioGenerator {
    ScenarioGenerator::new(ByzantineConfiguration {
        scenario_count,
        max_nodes: 5,
        max_messages_per_node: 16,
        ..ByzantineConfiguration::default()
    })
    .expect("valid config")
}

/// Every node broadcasts a few messages; returns what each node received
fn exchange(network: &mut FaultInjectingNetwork) -> Vec<Vec<Vec<i32>>> {
    let nodes = network.node_count();
    for round in 0..6i32 {
        for owner in 0..nodes {
            let value = owner as i32 * 100 + round;
            network
                .broadcast(Message::new(owner, vec![value, value + 1]))
                .expect("owner in range");
        }
    }
    (0..nodes)
        .map(|node| {
            let mut received = Vec::new();
            while let Some(message) = network.receive(node).expect("node in range") {
                received.push(message.into_payload());
            }
            received
        })
        .collect()
}

/// Identical seeds generate identical scenario sets
#[test]
fn test_same_seed_same_scenarios() {
    init_tracing();
    let first = generator(8).create_scenarios(&mut SimRandom::new(1234), 0);
    let second = generator(8).create_scenarios(&mut SimRandom::new(1234), 0);
    assert_eq!(*first, *second);

    let other = generator(8).create_scenarios(&mut SimRandom::new(4321), 0);
    assert_ne!(*first, *other);
}

/// Two networks of the same scenario see identical faults
#[test]
fn test_networks_replay_identically() {
    init_tracing();
    let mut generator = generator(6);
    generator.create_scenarios(&mut SimRandom::new(99), 0);

    for scenario_id in 0..6 {
        let mut first = generator.build_network(scenario_id).expect("scenario exists");
        let mut second = generator.build_network(scenario_id).expect("scenario exists");
        assert_eq!(exchange(&mut first), exchange(&mut second));
        assert_eq!(first.stats(), second.stats());
    }
}

/// Rebinding a network restarts the scenario from the top
#[test]
fn test_rebinding_replays_run() {
    init_tracing();
    let mut generator = generator(3);
    generator.create_scenarios(&mut SimRandom::new(7), 0);

    let mut network = generator.build_network(2).expect("scenario exists");
    let first = exchange(&mut network);
    network.begin_simulation(2).expect("scenario exists");
    let second = exchange(&mut network);
    assert_eq!(first, second);
}

/// A zero error stream shifts every value by -15 on send
#[test]
fn test_zero_stream_send_corruption() {
    init_tracing();
    let same_errors =
        TraitorBehavior::new(FaultFlags::SEND_SAME_ERRORS).expect("valid behavior");
    let scenario = Scenario::new(
        vec![same_errors, TraitorBehavior::NORMAL, TraitorBehavior::NORMAL],
        vec![0; 4],
    );
    let scenarios = Arc::new(ScenarioSet::new(0, vec![scenario]));
    let mut network = BroadcastNetwork::with_injector(3, ByzantineInjector::new(scenarios));
    network.begin_simulation(0).expect("scenario exists");

    assert_eq!(network.broadcast(Message::new(0, vec![10, 20, 30])), Ok(2));
    for node in [1, 2] {
        let message = network
            .receive(node)
            .expect("node in range")
            .expect("copy delivered");
        assert_eq!(message.into_payload(), vec![-5, 5, 15]);
    }
}

/// Independent managers bound to the same scenario agree
#[test]
fn test_managers_replay_identically() {
    init_tracing();
    let set = generator(1).create_scenarios(&mut SimRandom::new(21), 0);
    let scenario = set.get(0).expect("scenario 0");

    let run = || {
        let mut manager = ByzantineManager::new();
        manager.reset(scenario);
        (0..40i32)
            .map(|i| {
                let mut message = Message::new(0, vec![i * 3, -i]);
                let kept = manager.modify(&mut message, i % 3 != 0, i % 4 == 0);
                (kept, message.into_payload())
            })
            .collect::<Vec<_>>()
    };

    assert_eq!(run(), run());
}
