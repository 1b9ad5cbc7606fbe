//! Broadcast network with pluggable fault injection.
//!
//! [`BroadcastNetwork`] is a minimal in-memory substrate: a broadcast goes
//! through the injector's send hook once, then one copy per recipient goes
//! through the deliver hook before landing in that node's inbox. Without an
//! injector every message passes through untouched.
//!
//! [`ByzantineInjector`] is the fault strategy. It looks up the sender's
//! [`TraitorBehavior`] in the bound scenario and hands the message to its
//! [`ByzantineManager`]:
//!
//! | Hook | Corrupts when | Drops when |
//! |------|---------------|------------|
//! | send | `SEND_SAME_ERRORS` | `SELDOMLY_SEND` |
//! | deliver | `SEND_DIFFERENT_ERRORS` | `SELDOMLY_RECEIVED` |
//!
//! Send-side corruption happens before fan-out, so all recipients see the same
//! wrong value. Deliver-side corruption runs once per recipient, so recipients
//! may disagree about what the traitor said.
//!
//! ## Run lifecycle
//!
//! ```text
//!  Init ──begin_simulation(id)──> Bound ──first hook──> Running
//!                                   ^                      │
//!                                   └──begin_simulation────┘
//! ```
//!
//! A `begin_simulation` naming an unknown scenario returns the injector to
//! `Init` and leaves the network's inboxes and counters as they were.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::{ByzantineError, ByzantineResult};
use crate::manager::{ByzantineManager, FaultStats};
use crate::message::{ByzantineMessage, Message, NodeIndex};
use crate::scenario::ScenarioSet;
use crate::traitor::TraitorBehavior;

/// Outcome of a fault hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Hand the message to the substrate.
    Forward,
    /// Discard the message.
    Drop,
}

impl Verdict {
    /// `Forward` if `kept`, else `Drop`.
    pub fn from_kept(kept: bool) -> Self {
        if kept {
            Self::Forward
        } else {
            Self::Drop
        }
    }

    /// Whether the message continues.
    pub fn is_forward(self) -> bool {
        self == Self::Forward
    }
}

/// Fault strategy plugged into a [`BroadcastNetwork`].
pub trait FaultInjector {
    /// Bind the strategy to `scenario_id` for the next run.
    fn begin_simulation(&mut self, scenario_id: usize) -> ByzantineResult<()>;

    /// Inspect (and possibly rewrite) a message before fan-out.
    fn on_send(&mut self, message: &mut Message) -> ByzantineResult<Verdict>;

    /// Inspect (and possibly rewrite) one recipient's copy of a message.
    fn on_deliver(&mut self, message: &mut Message, to: NodeIndex) -> ByzantineResult<Verdict>;
}

/// Strategy that forwards everything unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFaults;

impl FaultInjector for NoFaults {
    fn begin_simulation(&mut self, _scenario_id: usize) -> ByzantineResult<()> {
        Ok(())
    }

    fn on_send(&mut self, _message: &mut Message) -> ByzantineResult<Verdict> {
        Ok(Verdict::Forward)
    }

    fn on_deliver(&mut self, _message: &mut Message, _to: NodeIndex) -> ByzantineResult<Verdict> {
        Ok(Verdict::Forward)
    }
}

/// Per-run delivery counters of a [`BroadcastNetwork`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkStats {
    /// Messages handed to `broadcast`.
    pub broadcasts: u64,
    /// Messages vetoed by the send hook.
    pub dropped_on_send: u64,
    /// Copies queued into inboxes.
    pub delivered: u64,
    /// Copies vetoed by the deliver hook.
    pub dropped_on_delivery: u64,
}

/// In-memory broadcast substrate.
#[derive(Debug)]
pub struct BroadcastNetwork<F = NoFaults> {
    inboxes: Vec<VecDeque<Message>>,
    injector: Option<F>,
    stats: NetworkStats,
}

/// Broadcast network driven by a [`ByzantineInjector`].
pub type FaultInjectingNetwork = BroadcastNetwork<ByzantineInjector>;

impl BroadcastNetwork<NoFaults> {
    /// Network of `node_count` nodes without fault injection.
    pub fn new(node_count: usize) -> Self {
        Self {
            inboxes: vec![VecDeque::new(); node_count],
            injector: None,
            stats: NetworkStats::default(),
        }
    }
}

impl<F: FaultInjector> BroadcastNetwork<F> {
    /// Network of `node_count` nodes routing every message through `injector`.
    pub fn with_injector(node_count: usize, injector: F) -> Self {
        Self {
            inboxes: vec![VecDeque::new(); node_count],
            injector: Some(injector),
            stats: NetworkStats::default(),
        }
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.inboxes.len()
    }

    /// The fault strategy, if any.
    pub fn injector(&self) -> Option<&F> {
        self.injector.as_ref()
    }

    /// Mutable access to the fault strategy, if any.
    pub fn injector_mut(&mut self) -> Option<&mut F> {
        self.injector.as_mut()
    }

    /// Counters for the current run.
    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    /// Start a run of `scenario_id`: rebind the injector and empty every inbox.
    ///
    /// The network is left untouched if the injector rejects the scenario.
    pub fn begin_simulation(&mut self, scenario_id: usize) -> ByzantineResult<()> {
        if let Some(injector) = self.injector.as_mut() {
            injector.begin_simulation(scenario_id)?;
        }
        self.inboxes.iter_mut().for_each(VecDeque::clear);
        self.stats = NetworkStats::default();
        Ok(())
    }

    /// Send `message` from its owner to every other node.
    ///
    /// Returns the number of copies queued.
    pub fn broadcast(&mut self, mut message: Message) -> ByzantineResult<usize> {
        let owner = message.owner();
        self.check_node(owner)?;
        self.stats.broadcasts += 1;

        if let Some(injector) = self.injector.as_mut() {
            if !injector.on_send(&mut message)?.is_forward() {
                self.stats.dropped_on_send += 1;
                return Ok(0);
            }
        }

        let mut delivered = 0;
        for to in (0..self.inboxes.len()).filter(|&to| to != owner) {
            let mut copy = message.clone();
            if let Some(injector) = self.injector.as_mut() {
                if !injector.on_deliver(&mut copy, to)?.is_forward() {
                    self.stats.dropped_on_delivery += 1;
                    continue;
                }
            }
            self.inboxes[to].push_back(copy);
            delivered += 1;
        }
        self.stats.delivered += delivered as u64;
        Ok(delivered)
    }

    /// Pop the oldest message queued for `node`.
    pub fn receive(&mut self, node: NodeIndex) -> ByzantineResult<Option<Message>> {
        self.check_node(node)?;
        Ok(self.inboxes[node].pop_front())
    }

    /// Number of messages queued for `node`.
    pub fn pending(&self, node: NodeIndex) -> usize {
        self.inboxes.get(node).map_or(0, VecDeque::len)
    }

    fn check_node(&self, node: NodeIndex) -> ByzantineResult<()> {
        if node < self.inboxes.len() {
            Ok(())
        } else {
            Err(ByzantineError::NodeOutOfRange {
                node,
                node_count: self.inboxes.len(),
            })
        }
    }
}

/// Lifecycle phase of a [`ByzantineInjector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Constructed or given a new scenario set; not usable until bound.
    Init,
    /// Bound to a scenario, no message seen yet.
    Bound,
    /// Messages are flowing.
    Running,
}

/// Fault strategy applying a scenario's traitor behaviors.
///
/// Owns its [`ByzantineManager`]. Each concurrently running network needs
/// its own injector; only the [`ScenarioSet`] is shared.
#[derive(Debug)]
pub struct ByzantineInjector {
    scenarios: Arc<ScenarioSet>,
    scenario_id: usize,
    phase: RunPhase,
    manager: ByzantineManager,
}

impl ByzantineInjector {
    /// Unbound injector over `scenarios`.
    pub fn new(scenarios: Arc<ScenarioSet>) -> Self {
        Self {
            scenarios,
            scenario_id: 0,
            phase: RunPhase::Init,
            manager: ByzantineManager::new(),
        }
    }

    /// Switch to another generation's scenarios. The next run must be bound
    /// again with `begin_simulation`.
    pub fn set_scenarios(&mut self, scenarios: Arc<ScenarioSet>) {
        self.scenarios = scenarios;
        self.phase = RunPhase::Init;
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Scenario of the current run, once bound.
    pub fn scenario_id(&self) -> Option<usize> {
        match self.phase {
            RunPhase::Init => None,
            RunPhase::Bound | RunPhase::Running => Some(self.scenario_id),
        }
    }

    /// Fault counters of the current run.
    pub fn fault_stats(&self) -> &FaultStats {
        self.manager.stats()
    }

    /// The underlying manager.
    pub fn manager(&self) -> &ByzantineManager {
        &self.manager
    }

    fn behavior_of(&mut self, owner: NodeIndex) -> ByzantineResult<TraitorBehavior> {
        if self.phase == RunPhase::Init {
            tracing::warn!(owner, "Fault hook called before begin_simulation");
            return Err(ByzantineError::NotBound);
        }
        self.phase = RunPhase::Running;
        Ok(self.scenarios.get(self.scenario_id)?.traitor(owner))
    }
}

impl FaultInjector for ByzantineInjector {
    fn begin_simulation(&mut self, scenario_id: usize) -> ByzantineResult<()> {
        if self.phase == RunPhase::Running {
            tracing::debug!(
                scenario_id = self.scenario_id,
                stats = ?self.manager.stats(),
                "Byzantine run finished"
            );
        }

        let scenario = match self.scenarios.get(scenario_id) {
            Ok(scenario) => scenario,
            Err(err) => {
                self.phase = RunPhase::Init;
                return Err(err);
            }
        };
        self.manager.reset(scenario);
        self.scenario_id = scenario_id;
        self.phase = RunPhase::Bound;

        tracing::debug!(
            scenario_id,
            generation = self.scenarios.generation(),
            traitors = scenario.traitor_count(),
            "Byzantine run bound"
        );
        Ok(())
    }

    fn on_send(&mut self, message: &mut Message) -> ByzantineResult<Verdict> {
        let behavior = self.behavior_of(message.owner())?;
        let kept = self.manager.modify(
            message,
            behavior.corrupts_on_send(),
            behavior.drops_on_send(),
        );
        Ok(Verdict::from_kept(kept))
    }

    fn on_deliver(&mut self, message: &mut Message, to: NodeIndex) -> ByzantineResult<Verdict> {
        let behavior = self.behavior_of(message.owner())?;
        let kept = self.manager.modify(
            message,
            behavior.corrupts_on_delivery(),
            behavior.drops_on_delivery(),
        );
        if !kept {
            tracing::trace!(owner = message.owner(), to, "Copy dropped on delivery");
        }
        Ok(Verdict::from_kept(kept))
    }
}
