//! State machine tuning

/// Default readiness tolerance in seconds
pub const DEFAULT_EPSILON: f64 = 0.1;

/// Configuration for [`SyncMachine`](super::SyncMachine)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncConfig {
    /// Two positions agree if they differ by at most this many seconds
    pub epsilon: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl SyncConfig {
    /// Set the readiness tolerance
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon.abs();
        self
    }

    /// Whether two positions are in agreement
    pub fn agrees(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.epsilon
    }
}
