//! Error types for Byzantine fault injection.

use thiserror::Error;

/// Errors raised at the boundaries of the fault-injection layer.
///
/// Corrupting or dropping a message is intended behavior and never surfaces
/// here. These variants cover invalid inputs (flag words, configuration,
/// scenario ids, node indices) and lifecycle misuse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ByzantineError {
    /// A traitor word carried both `SEND_SAME_ERRORS` and `SEND_DIFFERENT_ERRORS`.
    #[error(
        "conflicting traitor behavior {0:#x}: SEND_SAME_ERRORS and SEND_DIFFERENT_ERRORS are mutually exclusive"
    )]
    ConflictingBehavior(u32),

    /// A flag word carried bits outside the known fault set.
    #[error("unknown fault bits in {0:#x}")]
    UnknownFaultBits(u32),

    /// The configuration cannot produce usable scenarios.
    #[error("invalid byzantine configuration: {0}")]
    InvalidConfiguration(String),

    /// The requested scenario does not exist in the current generation.
    #[error("unknown scenario {id} (generation has {count} scenarios)")]
    UnknownScenario {
        /// Requested scenario id.
        id: usize,
        /// Number of scenarios available.
        count: usize,
    },

    /// A node index fell outside the network.
    #[error("node {node} out of range for a network of {node_count} nodes")]
    NodeOutOfRange {
        /// Offending node index.
        node: usize,
        /// Number of nodes in the network.
        node_count: usize,
    },

    /// A send or deliver hook ran before `begin_simulation` bound a scenario.
    #[error("fault injector used before begin_simulation bound a scenario")]
    NotBound,
}

/// A type alias for `Result<T, ByzantineError>`.
pub type ByzantineResult<T> = Result<T, ByzantineError>;
