//! Tiered dynamic optimization for expression sites
//!
//! This crate provides:
//! - Tiered accessors: expression sites that start interpreted and can be
//!   promoted to compiled accessors, and demoted back at any time
//! - An admission guard capping the number of live compiled artifacts
//! - The optimizer seam through which compiled accessors are obtained
//! - Tiering configuration and statistics
//!
//! All sites built from one [`DynamicOptimizer`] share its optimizer,
//! guard and statistics. The handle is created once at startup and passed
//! to whoever builds sites; nothing here is a hidden global.
//!
//! # Example
//!
//! ```
//! use core_types::{SourceRange, Value};
//! use dynamic_optimizer::{DynamicOptimizer, NoOptimizer, OptimizeKind, TieringConfig};
//! use interpreter::{Accessor, AccessorNode, MapScope};
//! use std::sync::Arc;
//!
//! let handle = DynamicOptimizer::new(Arc::new(NoOptimizer), TieringConfig::default());
//! let site = handle.site(
//!     "total",
//!     SourceRange::new(0, 5),
//!     OptimizeKind::Regular,
//!     Arc::new(AccessorNode::property("total")),
//! );
//!
//! let ctx = Value::map([(Value::from("total"), Value::Int(7))]);
//! assert_eq!(site.get(&ctx, &ctx, &MapScope::new()).unwrap(), Value::Int(7));
//! assert!(!site.is_optimized());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod guard;
pub mod optimizer;
pub mod stats;
pub mod tiered;

// Re-export main types at crate root
pub use config::TieringConfig;
pub use error::OptimizationError;
pub use guard::{AdmissionGuard, SiteId, Tenured};
pub use optimizer::{AccessorOptimizer, NoOptimizer, OptimizeKind, OptimizeRequest};
pub use stats::{TierSnapshot, TierStats};
pub use tiered::TieredAccessor;

use core_types::SourceRange;
use interpreter::Accessor;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared tiering state: optimizer, admission guard, configuration and
/// statistics
pub struct DynamicOptimizer {
    optimizer: Arc<dyn AccessorOptimizer>,
    guard: AdmissionGuard,
    config: TieringConfig,
    stats: TierStats,
    next_site: AtomicU64,
}

impl DynamicOptimizer {
    /// Create the handle; the guard is sized from `config.max_tenured`
    pub fn new(optimizer: Arc<dyn AccessorOptimizer>, config: TieringConfig) -> Arc<Self> {
        Arc::new(Self {
            optimizer,
            guard: AdmissionGuard::new(config.max_tenured),
            config,
            stats: TierStats::new(),
            next_site: AtomicU64::new(1),
        })
    }

    /// Wrap `safe` into a new tiered site
    pub fn site(
        self: &Arc<Self>,
        expr: impl Into<String>,
        range: SourceRange,
        kind: OptimizeKind,
        safe: Arc<dyn Accessor>,
    ) -> Arc<TieredAccessor> {
        let id = SiteId(self.next_site.fetch_add(1, Ordering::Relaxed));
        TieredAccessor::new(Arc::clone(self), id, expr.into(), range, kind, safe)
    }

    /// The optimizer sites are promoted with
    pub fn optimizer(&self) -> &dyn AccessorOptimizer {
        self.optimizer.as_ref()
    }

    /// The admission guard
    pub fn guard(&self) -> &AdmissionGuard {
        &self.guard
    }

    /// The configuration
    pub fn config(&self) -> &TieringConfig {
        &self.config
    }

    /// Current statistics
    pub fn stats(&self) -> TierSnapshot {
        self.stats.snapshot()
    }

    pub(crate) fn stats_ref(&self) -> &TierStats {
        &self.stats
    }

    /// Demote every promoted site; returns how many were demoted
    pub fn reset(&self) -> usize {
        let reclaimed = self.guard.reset();
        tracing::debug!(reclaimed, "tiering reset");
        reclaimed
    }
}

impl fmt::Debug for DynamicOptimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicOptimizer")
            .field("optimizer", &self.optimizer.name())
            .field("guard", &self.guard)
            .field("config", &self.config)
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}
