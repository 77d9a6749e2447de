//! Single-resource quota tracker
//!
//! Counts consumption of one resource against a cap. The window lives a
//! level up: the controller resets all of a user's trackers together.

/// Usage counter for one capped resource
#[derive(Debug)]
pub struct QuotaTracker {
    cap: u64,
    used: u64,
}

impl QuotaTracker {
    /// Create a tracker with the given cap
    pub fn new(cap: u64) -> Self {
        Self { cap, used: 0 }
    }

    /// Would consuming `amount` push usage past the cap?
    pub fn would_exceed(&self, amount: u64) -> bool {
        self.used + amount > self.cap
    }

    /// Record consumption unconditionally
    pub fn consume(&mut self, amount: u64) {
        self.used += amount;
    }

    /// True once recorded consumption has passed the cap
    pub fn exceeded(&self) -> bool {
        self.used > self.cap
    }

    /// Usage recorded in the current window
    pub fn used(&self) -> u64 {
        self.used
    }

    /// Clear usage for a new window
    pub fn reset(&mut self) {
        self.used = 0;
    }
}
