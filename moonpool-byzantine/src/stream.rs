//! Wrapping cursor over a scenario's error stream.

use std::sync::Arc;

/// Ring cursor over a pre-generated error stream.
///
/// Each draw returns the value under the cursor and advances it, wrapping at
/// the end of the stream, so the stream is never exhausted. The stream itself
/// is shared read-only with every other run of the same scenario.
///
/// An unbound cursor (empty stream) yields zeros.
#[derive(Debug, Clone)]
pub struct ErrorCursor {
    stream: Arc<[i32]>,
    position: usize,
    drawn: u64,
}

impl ErrorCursor {
    /// Cursor at the start of `stream`.
    pub fn new(stream: Arc<[i32]>) -> Self {
        Self {
            stream,
            position: 0,
            drawn: 0,
        }
    }

    /// Cursor over an empty stream.
    pub fn unbound() -> Self {
        Self::new(Arc::from(Vec::new()))
    }

    /// Return the current value and advance with wrap-around.
    pub fn next_value(&mut self) -> i32 {
        let Some(&value) = self.stream.get(self.position) else {
            return 0;
        };
        self.position = (self.position + 1) % self.stream.len();
        self.drawn += 1;
        value
    }

    /// Draw a value and report whether its low bit is set.
    pub fn next_bit(&mut self) -> bool {
        self.next_value() & 1 != 0
    }

    /// Index of the next value to be drawn.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Length of the underlying stream.
    pub fn len(&self) -> usize {
        self.stream.len()
    }

    /// Whether the cursor has no stream bound.
    pub fn is_empty(&self) -> bool {
        self.stream.is_empty()
    }

    /// Values drawn since the cursor was created.
    pub fn drawn(&self) -> u64 {
        self.drawn
    }
}

impl Default for ErrorCursor {
    fn default() -> Self {
        Self::unbound()
    }
}
