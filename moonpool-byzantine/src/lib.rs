//! # Moonpool Byzantine Fault Injection
//!
//! Deterministic, scenario-based Byzantine faults for evaluating distributed
//! programs that exchange small integer messages over a broadcast network.
//!
//! ## Why Scenarios?
//!
//! Candidate programs must be compared against exactly the same adversary.
//! All randomness is therefore drawn up front, once per generation: each
//! [`Scenario`] fixes which nodes are traitors, how they misbehave, and an
//! error stream that drives every later drop and corruption decision. Running
//! a scenario twice replays the same faults bit for bit.
//!
//! ## Core Components
//!
//! - [`ScenarioGenerator`]: Builds a [`ScenarioSet`] per generation from a [`RandomSource`]
//! - [`TraitorBehavior`]: Validated per-node fault word over [`FaultFlags`]
//! - [`ByzantineManager`]: Applies drops and corruption driven by the error stream
//! - [`FaultInjectingNetwork`]: Broadcast network routing messages through a [`ByzantineInjector`]
//!
//! ## Fault Classes
//!
//! | Flag | Where | Effect |
//! |------|-------|--------|
//! | `SEND_SAME_ERRORS` | send | One corrupted payload, every recipient agrees |
//! | `SEND_DIFFERENT_ERRORS` | deliver | Each recipient gets its own corruption |
//! | `SELDOMLY_SEND` | send | Message may never leave the sender |
//! | `SELDOMLY_RECEIVED` | deliver | Individual copies may be lost |
//!
//! ## Quick Start
//!
//! ```rust
//! use moonpool_byzantine::{ByzantineConfiguration, Message, ScenarioGenerator, SimRandom};
//!
//! let mut config = ByzantineConfiguration::default();
//! config.scenario_count = 4;
//! config.max_nodes = 5;
//!
//! let mut generator = ScenarioGenerator::new(config)?;
//! generator.create_scenarios(&mut SimRandom::new(42), 0);
//!
//! for scenario_id in 0..4 {
//!     let mut network = generator.build_network(scenario_id)?;
//!     network.broadcast(Message::new(0, vec![1, 2]))?;
//!     while let Some(message) = network.receive(1)? {
//!         let _ = message.into_payload();
//!     }
//! }
//! # Ok::<(), moonpool_byzantine::ByzantineError>(())
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

/// Bounded table of recently observed payload values.
pub mod cache;

/// Scenario generation and fault configuration.
pub mod config;

/// Error types.
pub mod error;

/// Drop and corruption engine.
pub mod manager;

/// Messages as seen by the fault layer.
pub mod message;

/// Broadcast network and fault injectors.
pub mod network;

/// Seeded random sources.
pub mod random;

/// Scenarios and their generator.
pub mod scenario;

/// Error stream cursor.
pub mod stream;

/// Traitor classification.
pub mod traitor;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use cache::{CACHE_SLOTS, RecentValueCache};
pub use config::ByzantineConfiguration;
pub use error::{ByzantineError, ByzantineResult};
pub use manager::{ByzantineManager, FaultStats};
pub use message::{ByzantineMessage, Message, NodeIndex};
pub use network::{
    BroadcastNetwork, ByzantineInjector, FaultInjectingNetwork, FaultInjector, NetworkStats,
    NoFaults, RunPhase, Verdict,
};
pub use random::{RandomSource, SimRandom};
pub use scenario::{Scenario, ScenarioGenerator, ScenarioSet};
pub use stream::ErrorCursor;
pub use traitor::{ERROR_SET, FaultFlags, TraitorBehavior, sample_behavior};
