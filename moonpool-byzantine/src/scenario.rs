//! Scenario generation.
//!
//! A [`Scenario`] fixes everything random about one simulation run up front:
//! which nodes are traitors, how they misbehave, and the error stream the
//! [`ByzantineManager`](crate::ByzantineManager) consumes to decide drops and
//! corrupted values. Runs of the same scenario are therefore identical, which
//! lets every candidate program of a generation be evaluated against exactly
//! the same faults.
//!
//! ## Traitor placement
//!
//! For each scenario with `n` nodes and a non-empty fault mask, two draws
//! `x`, `y` are taken in `[0, n)`. If `0 < y < x`, `y` wins, which biases
//! toward fewer traitors. That many distinct nodes are then picked by
//! rejection sampling and each receives a behavior from
//! [`sample_behavior`](crate::sample_behavior).

use std::sync::Arc;

use crate::config::ByzantineConfiguration;
use crate::error::{ByzantineError, ByzantineResult};
use crate::message::NodeIndex;
use crate::network::{BroadcastNetwork, ByzantineInjector, FaultInjectingNetwork};
use crate::random::RandomSource;
use crate::traitor::{FaultFlags, TraitorBehavior, sample_behavior};

/// Traitor assignment and error stream for one simulation run.
///
/// Immutable once built. The error stream is reference-counted so managers of
/// concurrent runs share it without copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    traitors: Box<[TraitorBehavior]>,
    error_stream: Arc<[i32]>,
}

impl Scenario {
    /// Build a scenario from an explicit traitor row and error stream.
    pub fn new(traitors: Vec<TraitorBehavior>, error_stream: Vec<i32>) -> Self {
        Self {
            traitors: traitors.into_boxed_slice(),
            error_stream: Arc::from(error_stream),
        }
    }

    /// Behavior of every node, indexed by node.
    pub fn traitors(&self) -> &[TraitorBehavior] {
        &self.traitors
    }

    /// Behavior of `node`; nodes outside the row are honest.
    pub fn traitor(&self, node: NodeIndex) -> TraitorBehavior {
        self.traitors
            .get(node)
            .copied()
            .unwrap_or(TraitorBehavior::NORMAL)
    }

    /// Number of nodes in the scenario.
    pub fn node_count(&self) -> usize {
        self.traitors.len()
    }

    /// Number of nodes with at least one fault assigned.
    pub fn traitor_count(&self) -> usize {
        self.traitors.iter().filter(|b| !b.is_normal()).count()
    }

    /// The pre-generated error stream.
    pub fn error_stream(&self) -> &Arc<[i32]> {
        &self.error_stream
    }
}

/// Scenarios of one generation, indexed by scenario id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScenarioSet {
    generation: u64,
    scenarios: Vec<Scenario>,
}

impl ScenarioSet {
    /// Wrap already-built scenarios.
    pub fn new(generation: u64, scenarios: Vec<Scenario>) -> Self {
        Self {
            generation,
            scenarios,
        }
    }

    /// Generation these scenarios were created for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Look up a scenario by id.
    pub fn get(&self, id: usize) -> ByzantineResult<&Scenario> {
        self.scenarios
            .get(id)
            .ok_or(ByzantineError::UnknownScenario {
                id,
                count: self.scenarios.len(),
            })
    }

    /// Number of scenarios.
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether no scenario has been generated yet.
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Iterate over scenarios in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter()
    }
}

/// Produces the scenarios of each generation and builds networks for them.
///
/// The generator is the explicit factory for fault-injecting networks: pass it
/// (or its [`ScenarioSet`]) to whatever drives the runs.
#[derive(Debug, Clone)]
pub struct ScenarioGenerator {
    config: ByzantineConfiguration,
    node_counts: Vec<usize>,
    current: Arc<ScenarioSet>,
}

impl ScenarioGenerator {
    /// Create a generator where every scenario has `max_nodes` nodes.
    pub fn new(config: ByzantineConfiguration) -> ByzantineResult<Self> {
        config.validate()?;
        let node_counts = vec![config.max_nodes; config.scenario_count];
        Ok(Self {
            config,
            node_counts,
            current: Arc::new(ScenarioSet::default()),
        })
    }

    /// Override the node count of each scenario.
    ///
    /// `node_counts` needs one entry per scenario, none above `max_nodes`.
    pub fn with_node_counts(mut self, node_counts: Vec<usize>) -> ByzantineResult<Self> {
        if node_counts.len() != self.config.scenario_count {
            return Err(ByzantineError::InvalidConfiguration(format!(
                "expected {} node counts, got {}",
                self.config.scenario_count,
                node_counts.len()
            )));
        }
        if let Some(&count) = node_counts.iter().find(|&&c| c > self.config.max_nodes) {
            return Err(ByzantineError::InvalidConfiguration(format!(
                "node count {} exceeds max_nodes {}",
                count, self.config.max_nodes
            )));
        }
        self.node_counts = node_counts;
        Ok(self)
    }

    /// The generator's configuration.
    pub fn config(&self) -> &ByzantineConfiguration {
        &self.config
    }

    /// Node count of scenario `scenario`, or 0 if it does not exist.
    pub fn node_count(&self, scenario: usize) -> usize {
        self.node_counts.get(scenario).copied().unwrap_or(0)
    }

    /// The current generation's scenarios.
    pub fn scenarios(&self) -> Arc<ScenarioSet> {
        Arc::clone(&self.current)
    }

    /// Generate the scenarios for `generation`.
    ///
    /// Output depends only on the sequence of values drawn from `random`.
    /// With `regenerate_scenarios` off, only the first call generates; later
    /// calls return that set without drawing.
    pub fn create_scenarios<R: RandomSource + ?Sized>(
        &mut self,
        random: &mut R,
        generation: u64,
    ) -> Arc<ScenarioSet> {
        if !self.config.regenerate_scenarios && !self.current.is_empty() {
            tracing::debug!(
                generation,
                created_for = self.current.generation(),
                "Reusing scenario set"
            );
            return self.scenarios();
        }

        let allowed = self.config.allowed_fault_mask;
        let stream_len = self.config.error_stream_len();
        let scenarios: Vec<Scenario> = self
            .node_counts
            .iter()
            .map(|&node_count| generate_scenario(random, node_count, allowed, stream_len))
            .collect();

        tracing::debug!(
            generation,
            scenarios = scenarios.len(),
            traitors = ?scenarios.iter().map(Scenario::traitor_count).collect::<Vec<_>>(),
            "Created scenario set"
        );

        self.current = Arc::new(ScenarioSet::new(generation, scenarios));
        self.scenarios()
    }

    /// Build a network for `scenario_id` of the current generation.
    ///
    /// The network is sized to the scenario's node count and already bound:
    /// `begin_simulation(scenario_id)` has run.
    pub fn build_network(&self, scenario_id: usize) -> ByzantineResult<FaultInjectingNetwork> {
        let scenarios = self.scenarios();
        let node_count = scenarios.get(scenario_id)?.node_count();
        let mut network =
            BroadcastNetwork::with_injector(node_count, ByzantineInjector::new(scenarios));
        network.begin_simulation(scenario_id)?;
        Ok(network)
    }
}

fn generate_scenario<R: RandomSource + ?Sized>(
    random: &mut R,
    node_count: usize,
    allowed: FaultFlags,
    stream_len: usize,
) -> Scenario {
    let mut traitors = vec![TraitorBehavior::NORMAL; node_count];

    if !allowed.is_empty() && node_count > 0 {
        // Validated to fit when the generator was built
        let bound = node_count as u32;
        let mut count = random.random_below(bound);
        let alternative = random.random_below(bound);
        if 0 < alternative && alternative < count {
            count = alternative;
        }

        for _ in 0..count {
            let node = loop {
                let candidate = random.random_below(bound) as usize;
                if traitors[candidate].is_normal() {
                    break candidate;
                }
            };
            traitors[node] = sample_behavior(random, allowed);
        }
    }

    let error_stream = (0..stream_len).map(|_| random.random_i32()).collect();
    Scenario::new(traitors, error_stream)
}
