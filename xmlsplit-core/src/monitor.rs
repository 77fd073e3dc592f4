//! Byte budget tracking for the chunk being written
//!
//! The monitor does no I/O. Its answers depend only on the sequence of
//! [`SizeMonitor::add`] and [`SizeMonitor::reset`] calls made on it.

/// Tracks how many payload bytes the current chunk holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeMonitor {
    max_bytes: u64,
    current_bytes: u64,
}

impl SizeMonitor {
    /// Create a monitor with an empty budget of `max_bytes`
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            current_bytes: 0,
        }
    }

    /// Account for `data` having been written to the current chunk
    pub fn add(&mut self, data: &[u8]) {
        self.current_bytes = self.current_bytes.saturating_add(data.len() as u64);
    }

    /// Whether writing `data` would push the chunk past the budget.
    ///
    /// The comparison is strict, so a chunk may be filled to exactly
    /// `max_bytes`.
    pub fn would_exceed(&self, data: &[u8]) -> bool {
        self.current_bytes.saturating_add(data.len() as u64) > self.max_bytes
    }

    /// Start accounting for a fresh chunk
    pub fn reset(&mut self) {
        self.current_bytes = 0;
    }

    /// Bytes accounted since the last reset
    pub fn current_bytes(&self) -> u64 {
        self.current_bytes
    }

    /// Configured budget
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Bytes left before the budget is reached (zero once exceeded)
    pub fn remaining(&self) -> u64 {
        self.max_bytes.saturating_sub(self.current_bytes)
    }
}
