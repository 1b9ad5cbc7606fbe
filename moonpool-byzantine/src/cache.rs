//! Bounded table of recently observed payload values.
//!
//! Corrupted values are drawn either from a small offset around the original
//! or from this table, so substitutes stay plausible: they are values some
//! node actually sent during the run.

/// Number of slots in the table.
pub const CACHE_SLOTS: usize = 16384;

const SLOT_MASK: i32 = (CACHE_SLOTS - 1) as i32;

/// `valid` flag of a slot that holds a value observed during the current run.
///
/// Reset sets every slot to `!OBSERVED`. The names read inverted (a "valid"
/// slot is one with nothing cached yet), but substitution only ever probes
/// for `OBSERVED` slots, so a run never substitutes a value it has not seen.
/// Flipping this constant changes which values are substituted and breaks
/// replay of recorded scenarios.
const OBSERVED: bool = false;

/// Fixed-capacity value cache keyed by `value & (CACHE_SLOTS - 1)`.
#[derive(Debug, Clone)]
pub struct RecentValueCache {
    values: Box<[i32]>,
    valid: Box<[bool]>,
    observed: usize,
}

impl RecentValueCache {
    /// Empty cache in the post-reset state.
    pub fn new() -> Self {
        Self {
            values: vec![0; CACHE_SLOTS].into_boxed_slice(),
            valid: vec![!OBSERVED; CACHE_SLOTS].into_boxed_slice(),
            observed: 0,
        }
    }

    /// Forget every observed value.
    pub fn reset(&mut self) {
        self.valid.fill(!OBSERVED);
        self.observed = 0;
    }

    /// Slot a value maps to.
    pub fn slot(value: i32) -> usize {
        (value & SLOT_MASK) as usize
    }

    /// Whether `slot` holds a value observed since the last reset.
    pub fn holds(&self, slot: usize) -> bool {
        self.valid[slot] == OBSERVED
    }

    /// Record `value` in its slot, replacing whatever was there.
    pub fn store(&mut self, value: i32) {
        let slot = Self::slot(value);
        if self.valid[slot] != OBSERVED {
            self.valid[slot] = OBSERVED;
            self.observed += 1;
        }
        self.values[slot] = value;
    }

    /// First observed value at or after `start`, probing forward with wrap-around.
    ///
    /// Returns `None` when nothing has been observed since the last reset.
    pub fn probe_from(&self, start: i32) -> Option<i32> {
        if self.observed == 0 {
            return None;
        }
        let mut slot = Self::slot(start);
        while self.valid[slot] != OBSERVED {
            slot = (slot + 1) & (CACHE_SLOTS - 1);
        }
        Some(self.values[slot])
    }

    /// Number of slots holding an observed value.
    pub fn observed(&self) -> usize {
        self.observed
    }
}

impl Default for RecentValueCache {
    fn default() -> Self {
        Self::new()
    }
}
