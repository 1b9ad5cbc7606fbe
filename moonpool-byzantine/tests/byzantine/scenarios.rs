//! Integration tests for scenario generation
//!
//! Tests verify that generated scenarios:
//! - Only use fault classes allowed by the mask
//! - Never combine both corruption flags on one node
//! - Keep at least one honest node
//! - Are reused when regeneration is disabled

use std::sync::Arc;

use moonpool_byzantine::{ByzantineConfiguration, FaultFlags, ScenarioGenerator, SimRandom};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();
}

fn config(mask: FaultFlags, scenario_count: usize, max_nodes: usize) -> ByzantineConfiguration {
    ByzantineConfiguration {
        scenario_count,
        allowed_fault_mask: mask,
        max_nodes,
        max_messages_per_node: 8,
        ..ByzantineConfiguration::default()
    }
}

/// Traitors only receive subsets of the allowed mask
#[test]
fn test_mask_restricts_behaviors() {
    init_tracing();
    let mask = FaultFlags::SEND_SAME_ERRORS | FaultFlags::SELDOMLY_SEND;
    let mut generator = ScenarioGenerator::new(config(mask, 16, 7)).expect("valid config");

    let mut traitors_seen = 0;
    for seed in 0..20 {
        let set = generator.create_scenarios(&mut SimRandom::new(seed), seed);
        for scenario in set.iter() {
            for behavior in scenario.traitors().iter().filter(|b| !b.is_normal()) {
                assert!(
                    matches!(behavior.bits(), 1 | 4 | 5),
                    "seed {seed}: unexpected behavior {behavior}"
                );
                traitors_seen += 1;
            }
        }
    }
    assert!(traitors_seen > 0, "no traitor generated across 20 seeds");
}

/// Both corruption flags are never assigned to the same node
#[test]
fn test_corruption_flags_exclusive() {
    init_tracing();
    let mut generator =
        ScenarioGenerator::new(config(FaultFlags::all(), 32, 9)).expect("valid config");

    for seed in 0..20 {
        let set = generator.create_scenarios(&mut SimRandom::new(seed), seed);
        for scenario in set.iter() {
            for behavior in scenario.traitors() {
                assert!(!(behavior.corrupts_on_send() && behavior.corrupts_on_delivery()));
            }
        }
    }
}

/// Traitor count is drawn below the node count
#[test]
fn test_some_node_stays_honest() {
    init_tracing();
    let mut generator =
        ScenarioGenerator::new(config(FaultFlags::all(), 64, 3)).expect("valid config");
    let set = generator.create_scenarios(&mut SimRandom::new(77), 0);

    assert_eq!(set.len(), 64);
    for scenario in set.iter() {
        assert_eq!(scenario.node_count(), 3);
        assert!(scenario.traitor_count() < scenario.node_count());
    }
}

/// An empty mask yields honest nodes but still fills the error stream
#[test]
fn test_disabled_mask_generates_honest_scenarios() {
    init_tracing();
    let mut config = ByzantineConfiguration::disabled();
    config.scenario_count = 4;
    config.max_nodes = 5;
    let stream_len = config.error_stream_len();

    let mut generator = ScenarioGenerator::new(config).expect("valid config");
    let mut random = SimRandom::new(3);
    let set = generator.create_scenarios(&mut random, 0);

    for scenario in set.iter() {
        assert_eq!(scenario.traitor_count(), 0);
        assert_eq!(scenario.error_stream().len(), stream_len);
    }
    // Only stream values were drawn
    assert_eq!(random.call_count(), (4 * stream_len) as u64);
}

/// Without regeneration the first set is kept and no randomness is drawn
#[test]
fn test_scenarios_reused_without_regeneration() {
    init_tracing();
    let mut config = config(FaultFlags::all(), 2, 4);
    config.regenerate_scenarios = false;
    let mut generator = ScenarioGenerator::new(config).expect("valid config");

    let first = generator.create_scenarios(&mut SimRandom::new(1), 0);
    let mut random = SimRandom::new(2);
    let second = generator.create_scenarios(&mut random, 1);

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.generation(), 0);
    assert_eq!(random.call_count(), 0);
}

/// With regeneration every generation gets a fresh set
#[test]
fn test_scenarios_regenerated_each_generation() {
    init_tracing();
    let mut generator =
        ScenarioGenerator::new(config(FaultFlags::all(), 2, 4)).expect("valid config");
    let mut random = SimRandom::new(5);

    let first = generator.create_scenarios(&mut random, 0);
    let second = generator.create_scenarios(&mut random, 1);

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(second.generation(), 1);
    assert!(Arc::ptr_eq(&second, &generator.scenarios()));
    assert_ne!(first.get(0).ok(), second.get(0).ok());
}

/// A random configuration is always usable
#[test]
fn test_random_configurations_generate() {
    init_tracing();
    for seed in 0..16 {
        let mut random = SimRandom::new(seed);
        let config = ByzantineConfiguration::random_for_seed(&mut random);
        let mask = config.allowed_fault_mask;
        let mut generator = ScenarioGenerator::new(config).expect("valid config");
        let set = generator.create_scenarios(&mut random, 0);
        for scenario in set.iter() {
            for behavior in scenario.traitors() {
                assert!(mask.contains(behavior.flags()));
            }
        }
    }
}
