//! Tiering configuration

use std::time::Duration;

/// When and how far expression sites get promoted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TieringConfig {
    /// Calls within one window after which a site counts as hot
    pub tenuring_threshold: u64,
    /// Length of the counting window
    pub time_span: Duration,
    /// Maximum number of live compiled artifacts across all sites
    pub max_tenured: usize,
    /// Promote hot sites from `get` without being asked
    pub auto_promotion: bool,
}

impl Default for TieringConfig {
    fn default() -> Self {
        Self {
            tenuring_threshold: 50,
            time_span: Duration::from_millis(100),
            max_tenured: 1500,
            auto_promotion: false,
        }
    }
}

impl TieringConfig {
    /// Promote as soon as a site has been called a handful of times
    pub fn eager() -> Self {
        Self {
            tenuring_threshold: 5,
            time_span: Duration::from_secs(1),
            max_tenured: 1500,
            auto_promotion: true,
        }
    }

    /// Small, deterministic configuration for tests
    pub fn for_testing() -> Self {
        Self {
            tenuring_threshold: 3,
            time_span: Duration::from_secs(60),
            max_tenured: 4,
            auto_promotion: true,
        }
    }

    /// Set the hotness threshold
    pub fn with_tenuring_threshold(mut self, threshold: u64) -> Self {
        self.tenuring_threshold = threshold;
        self
    }

    /// Set the counting window
    pub fn with_time_span(mut self, span: Duration) -> Self {
        self.time_span = span;
        self
    }

    /// Set the artifact cap
    pub fn with_max_tenured(mut self, max: usize) -> Self {
        self.max_tenured = max;
        self
    }

    /// Turn automatic promotion on or off
    pub fn with_auto_promotion(mut self, enabled: bool) -> Self {
        self.auto_promotion = enabled;
        self
    }
}
