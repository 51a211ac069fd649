//! Tiering statistics

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide tiering counters
#[derive(Debug, Default)]
pub struct TierStats {
    promotions: AtomicU64,
    failed_promotions: AtomicU64,
    deoptimizations: AtomicU64,
    reclaimed: AtomicU64,
}

/// Point-in-time copy of [`TierStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierSnapshot {
    /// Sites that went from interpreted to compiled
    pub promotions: u64,
    /// Promotion attempts that ended interpreted: the optimizer refused,
    /// or the guard reclaimed the slot before the install
    pub failed_promotions: u64,
    /// Explicit demotions back to the interpreted accessor
    pub deoptimizations: u64,
    /// Demotions forced by the admission guard
    pub reclaimed: u64,
}

impl TierStats {
    /// All counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_promotion(&self) {
        self.promotions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed_promotion(&self) {
        self.failed_promotions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_deoptimization(&self) {
        self.deoptimizations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reclaimed(&self, count: u64) {
        self.reclaimed.fetch_add(count, Ordering::Relaxed);
    }

    /// Current counter values
    pub fn snapshot(&self) -> TierSnapshot {
        TierSnapshot {
            promotions: self.promotions.load(Ordering::Relaxed),
            failed_promotions: self.failed_promotions.load(Ordering::Relaxed),
            deoptimizations: self.deoptimizations.load(Ordering::Relaxed),
            reclaimed: self.reclaimed.load(Ordering::Relaxed),
        }
    }
}
