//! Traitor classification: the fault flags a node can carry and how they are
//! sampled.
//!
//! | Flag | Bit | Effect |
//! |------|-----|--------|
//! | `SEND_SAME_ERRORS` | 1 | Payload corrupted once at send, every recipient sees the same value |
//! | `SEND_DIFFERENT_ERRORS` | 2 | Payload corrupted per recipient at delivery |
//! | `SELDOMLY_SEND` | 4 | Messages may be dropped before fan-out |
//! | `SELDOMLY_RECEIVED` | 8 | Copies may be dropped per recipient |
//!
//! The two corruption flags are mutually exclusive for one node in one
//! scenario. [`FaultFlags`] is a free-form mask (it restricts what may be
//! sampled), while [`TraitorBehavior`] is a validated per-node word.

use std::fmt;

use bitflags::bitflags;

use crate::error::{ByzantineError, ByzantineResult};
use crate::random::RandomSource;

bitflags! {
    /// Set of fault classes.
    ///
    /// Any combination of known bits is a valid mask. Use
    /// [`TraitorBehavior`] for the word actually assigned to a node.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FaultFlags: u32 {
        /// Corrupt the payload once on send, before fan-out.
        const SEND_SAME_ERRORS = 1 << 0;

        /// Corrupt the payload independently for each recipient.
        const SEND_DIFFERENT_ERRORS = 1 << 1;

        /// Occasionally drop messages on send.
        const SELDOMLY_SEND = 1 << 2;

        /// Occasionally drop copies on delivery.
        const SELDOMLY_RECEIVED = 1 << 3;
    }
}

/// The two corruption flags; a behavior may hold at most one of them.
const SEND_ERRORS: FaultFlags =
    FaultFlags::SEND_SAME_ERRORS.union(FaultFlags::SEND_DIFFERENT_ERRORS);

/// Smallest power of two above every fault flag, used as the sampling ceiling.
pub const ERROR_SET: u32 = (FaultFlags::all().bits() + 1).next_power_of_two();

/// Validated fault word for one node in one scenario.
///
/// Construction rejects words holding both `SEND_SAME_ERRORS` and
/// `SEND_DIFFERENT_ERRORS`, so holders of a `TraitorBehavior` never re-check it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraitorBehavior(FaultFlags);

impl TraitorBehavior {
    /// An honest node.
    pub const NORMAL: Self = Self(FaultFlags::empty());

    /// Validate a flag set as a per-node behavior.
    pub fn new(flags: FaultFlags) -> ByzantineResult<Self> {
        if flags.contains(SEND_ERRORS) {
            return Err(ByzantineError::ConflictingBehavior(flags.bits()));
        }
        Ok(Self(flags))
    }

    /// Parse a raw flag word, rejecting unknown bits and conflicting flags.
    pub fn from_bits(bits: u32) -> ByzantineResult<Self> {
        let flags = FaultFlags::from_bits(bits).ok_or(ByzantineError::UnknownFaultBits(bits))?;
        Self::new(flags)
    }

    /// The underlying flags.
    pub const fn flags(self) -> FaultFlags {
        self.0
    }

    /// The raw flag word.
    pub const fn bits(self) -> u32 {
        self.0.bits()
    }

    /// Whether no fault is assigned.
    pub const fn is_normal(self) -> bool {
        self.0.is_empty()
    }

    /// `SEND_SAME_ERRORS`: corrupt once at send.
    pub const fn corrupts_on_send(self) -> bool {
        self.0.contains(FaultFlags::SEND_SAME_ERRORS)
    }

    /// `SEND_DIFFERENT_ERRORS`: corrupt per recipient at delivery.
    pub const fn corrupts_on_delivery(self) -> bool {
        self.0.contains(FaultFlags::SEND_DIFFERENT_ERRORS)
    }

    /// `SELDOMLY_SEND`: may drop at send.
    pub const fn drops_on_send(self) -> bool {
        self.0.contains(FaultFlags::SELDOMLY_SEND)
    }

    /// `SELDOMLY_RECEIVED`: may drop at delivery.
    pub const fn drops_on_delivery(self) -> bool {
        self.0.contains(FaultFlags::SELDOMLY_RECEIVED)
    }
}

impl Default for TraitorBehavior {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl TryFrom<u32> for TraitorBehavior {
    type Error = ByzantineError;

    fn try_from(bits: u32) -> ByzantineResult<Self> {
        Self::from_bits(bits)
    }
}

impl TryFrom<FaultFlags> for TraitorBehavior {
    type Error = ByzantineError;

    fn try_from(flags: FaultFlags) -> ByzantineResult<Self> {
        Self::new(flags)
    }
}

impl fmt::Display for TraitorBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_normal() {
            return f.write_str("NORMAL");
        }
        for (i, (name, _)) in self.0.iter_names().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

/// Sample a behavior restricted to `allowed`.
///
/// An empty mask yields [`TraitorBehavior::NORMAL`] without drawing. Otherwise
/// draws `random_below(ERROR_SET) & allowed` until the result is non-empty
/// and does not combine both corruption flags.
pub fn sample_behavior<R: RandomSource + ?Sized>(
    random: &mut R,
    allowed: FaultFlags,
) -> TraitorBehavior {
    if allowed.is_empty() {
        return TraitorBehavior::NORMAL;
    }
    loop {
        let candidate = FaultFlags::from_bits_truncate(random.random_below(ERROR_SET)) & allowed;
        if candidate.is_empty() {
            continue;
        }
        if let Ok(behavior) = TraitorBehavior::new(candidate) {
            return behavior;
        }
    }
}
