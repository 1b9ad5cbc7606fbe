//! Fault application engine.
//!
//! [`ByzantineManager::modify`] decides whether a message survives and, for
//! corrupting traitors, rewrites its payload. Every decision is driven by the
//! scenario's error stream, never by a live RNG, so a run replays bit for bit.
//!
//! ## Corruption
//!
//! Each corrupted value is either a recently observed payload value (taken
//! from the [`RecentValueCache`]) or the original value shifted by a small
//! non-zero offset in `[-16, 16]`. Draws repeat until the new value differs
//! from the original.
//!
//! ```text
//!  payload ──reverse scan──> cache warm-up (coin flip per cold slot)
//!     │
//!     ├── drop requested? ──stream bit 0──> dropped
//!     │
//!     └── corrupt requested? ──per value──┬─ bit 1: probe cache for an observed value
//!                                          └─ bit 0: original + offset
//! ```

use crate::cache::RecentValueCache;
use crate::message::ByzantineMessage;
use crate::scenario::Scenario;
use crate::stream::ErrorCursor;

/// Counters describing what a manager did during the current run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultStats {
    /// Calls to `modify`.
    pub messages_inspected: u64,
    /// Messages vetoed by a drop decision.
    pub messages_dropped: u64,
    /// Payload values rewritten.
    pub values_corrupted: u64,
    /// Rewrites that used a cached value.
    pub cache_substitutions: u64,
    /// Rewrites that used an offset.
    pub offset_substitutions: u64,
    /// Rewrites forced onto an offset because the stream was cycling.
    pub cycle_fallbacks: u64,
}

/// Applies drops and corruption to messages for one run at a time.
///
/// Bind it to a scenario with [`reset`](Self::reset) before each run. A
/// manager is owned by exactly one network; concurrent runs each need their
/// own.
#[derive(Debug, Clone, Default)]
pub struct ByzantineManager {
    cursor: ErrorCursor,
    cache: RecentValueCache,
    stats: FaultStats,
}

impl ByzantineManager {
    /// Create an unbound manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a run of `scenario`: rewind its error stream and forget cached values.
    pub fn reset(&mut self, scenario: &Scenario) {
        self.cursor = ErrorCursor::new(scenario.error_stream().clone());
        self.cache.reset();
        self.stats = FaultStats::default();
    }

    /// Draw the next error stream value.
    pub fn next_stream_value(&mut self) -> i32 {
        self.cursor.next_value()
    }

    /// Position of the next stream value to be drawn.
    pub fn stream_position(&self) -> usize {
        self.cursor.position()
    }

    /// Stream values consumed since the last reset.
    pub fn values_drawn(&self) -> u64 {
        self.cursor.drawn()
    }

    /// Counters for the current run.
    pub fn stats(&self) -> &FaultStats {
        &self.stats
    }

    /// Apply the requested faults to `message`.
    ///
    /// Returns `true` if the message should continue to the substrate. With
    /// neither `corrupt` nor `drop` the payload is left untouched and the
    /// result is always `true`, though the cache still observes the payload.
    pub fn modify<M: ByzantineMessage + ?Sized>(
        &mut self,
        message: &mut M,
        corrupt: bool,
        drop: bool,
    ) -> bool {
        self.stats.messages_inspected += 1;
        self.observe(message.payload());

        if drop && !self.cursor.next_bit() {
            self.stats.messages_dropped += 1;
            tracing::trace!(owner = message.owner(), "Byzantine drop");
            return false;
        }

        if corrupt {
            let owner = message.owner();
            for value in message.payload_mut() {
                let original = *value;
                *value = self.substitute(original);
                tracing::trace!(owner, original, corrupted = *value, "Byzantine corruption");
            }
        }

        true
    }

    /// Warm the cache with `payload`, scanning from the last value.
    ///
    /// A slot already holding an observed value is always overwritten;
    /// otherwise a stream bit decides, so the stream is only consumed for cold
    /// slots.
    fn observe(&mut self, payload: &[i32]) {
        for &value in payload.iter().rev() {
            if self.cache.holds(RecentValueCache::slot(value)) || self.cursor.next_bit() {
                self.cache.store(value);
            }
        }
    }

    /// Draw a replacement for `original` that differs from it.
    fn substitute(&mut self, original: i32) -> i32 {
        let mut failures = 0;
        loop {
            // A failing draw depends only on the cursor position, so more
            // failures than stream positions means the cursor is in a cycle.
            if failures > self.cursor.len() {
                tracing::warn!(
                    original,
                    stream_len = self.cursor.len(),
                    "Error stream cycling without a distinct substitute, using an offset"
                );
                self.stats.cycle_fallbacks += 1;
                self.stats.offset_substitutions += 1;
                self.stats.values_corrupted += 1;
                return original.wrapping_add(stream_offset(self.cursor.next_value()));
            }

            if self.cursor.next_bit() {
                // Nothing observed yet: the probe would never find a slot
                if self.cache.observed() > 0 {
                    let start = self.cursor.next_value();
                    if let Some(candidate) = self.cache.probe_from(start) {
                        if candidate != original {
                            self.stats.cache_substitutions += 1;
                            self.stats.values_corrupted += 1;
                            return candidate;
                        }
                    }
                }
            } else {
                let candidate = original.wrapping_add(stream_offset(self.cursor.next_value()));
                if candidate != original {
                    self.stats.offset_substitutions += 1;
                    self.stats.values_corrupted += 1;
                    return candidate;
                }
            }
            failures += 1;
        }
    }
}

/// Map a stream value to a non-zero offset in `[-16, 16]`.
fn stream_offset(value: i32) -> i32 {
    match (value & 31) - 15 {
        0 => -16,
        offset => offset,
    }
}
