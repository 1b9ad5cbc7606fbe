//! # Byzantine Fault Configuration
//!
//! Configuration for scenario generation and fault injection.
//!
//! | Option | Field | Default | Meaning |
//! |--------|-------|---------|---------|
//! | Scenarios per generation | `scenario_count` | 1 | Parallel runs evaluated per generation |
//! | Allowed faults | `allowed_fault_mask` | all | Flags that may ever be sampled; empty means pass-through |
//! | Node bound | `max_nodes` | 16 | Largest network of any scenario |
//! | Message bound | `max_messages_per_node` | 64 | Sizes the error stream |
//! | Payload bound | `max_message_size` | 2 | Sizes the error stream (capped at 2) |
//! | Regeneration | `regenerate_scenarios` | true | New scenarios every generation, or one set for all |
//!
//! ## Configuration Examples
//!
//! ### Pass-through (No Faults)
//! ```rust
//! use moonpool_byzantine::ByzantineConfiguration;
//!
//! let config = ByzantineConfiguration::disabled();
//! assert!(config.allowed_fault_mask.is_empty());
//! ```
//!
//! ### Restricted Fault Classes
//! ```rust
//! use moonpool_byzantine::{ByzantineConfiguration, FaultFlags};
//!
//! let mut config = ByzantineConfiguration::default();
//! config.allowed_fault_mask = FaultFlags::SEND_SAME_ERRORS | FaultFlags::SELDOMLY_SEND;
//! config.max_nodes = 5;
//! assert_eq!(config.error_stream_len(), 5 * 64 * 2);
//! ```

use crate::error::{ByzantineError, ByzantineResult};
use crate::random::RandomSource;
use crate::traitor::{ERROR_SET, FaultFlags};

/// Configuration for Byzantine scenario generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByzantineConfiguration {
    /// Number of scenarios generated per generation.
    pub scenario_count: usize,

    /// Fault classes that may be sampled for traitors.
    ///
    /// An empty mask disables injection entirely: every node is honest and
    /// messages pass through untouched.
    pub allowed_fault_mask: FaultFlags,

    /// Maximum number of nodes in any scenario.
    pub max_nodes: usize,

    /// Maximum number of messages a node sends during one run.
    pub max_messages_per_node: usize,

    /// Maximum payload length of a message.
    ///
    /// Only sizes the error stream, at most two stream values per message.
    pub max_message_size: usize,

    /// Regenerate scenarios every generation instead of once.
    pub regenerate_scenarios: bool,
}

impl Default for ByzantineConfiguration {
    fn default() -> Self {
        Self {
            scenario_count: 1,
            allowed_fault_mask: FaultFlags::all(),
            max_nodes: 16,
            max_messages_per_node: 64,
            max_message_size: 2,
            regenerate_scenarios: true,
        }
    }
}

impl ByzantineConfiguration {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration that never injects faults.
    pub fn disabled() -> Self {
        Self {
            allowed_fault_mask: FaultFlags::empty(),
            ..Self::default()
        }
    }

    /// Create a configuration with a randomly chosen fault mask.
    ///
    /// The mask is any subset of the known flags, including the empty one, so
    /// some seeds exercise the pass-through path.
    pub fn random_for_seed<R: RandomSource + ?Sized>(random: &mut R) -> Self {
        Self {
            allowed_fault_mask: FaultFlags::from_bits_truncate(random.random_below(ERROR_SET)),
            ..Self::default()
        }
    }

    /// Number of stream values generated per scenario.
    pub fn error_stream_len(&self) -> usize {
        self.max_nodes * self.max_messages_per_node * self.max_message_size.min(2)
    }

    /// Check that the configuration can produce usable scenarios.
    pub fn validate(&self) -> ByzantineResult<()> {
        if self.scenario_count == 0 {
            return Err(ByzantineError::InvalidConfiguration(
                "scenario_count must be at least 1".to_string(),
            ));
        }
        if self.max_nodes == 0 {
            return Err(ByzantineError::InvalidConfiguration(
                "max_nodes must be at least 1".to_string(),
            ));
        }
        if u32::try_from(self.max_nodes).is_err() {
            return Err(ByzantineError::InvalidConfiguration(format!(
                "max_nodes {} does not fit in 32 bits",
                self.max_nodes
            )));
        }
        if self.error_stream_len() == 0 {
            return Err(ByzantineError::InvalidConfiguration(format!(
                "error stream is empty (max_messages_per_node = {}, max_message_size = {})",
                self.max_messages_per_node, self.max_message_size
            )));
        }
        Ok(())
    }
}
