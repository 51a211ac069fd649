//! Tiered accessor
//!
//! A [`TieredAccessor`] stands in for one expression site. It starts out
//! delegating to the safe, interpreted accessor chain it was built with
//! and may be promoted to a compiled accessor obtained from the
//! [`AccessorOptimizer`](crate::AccessorOptimizer). Demotion restores the
//! safe accessor, which is never dropped.
//!
//! Every `get` and `set` counts towards the site's hotness. With automatic
//! promotion enabled, a `get` that finds the count above the threshold
//! while the counting window is still open promotes the site; a window
//! that closed before the site got hot starts over.
//!
//! Lock order is promotion mutex, then the live accessor lock. Calls only
//! ever take the live lock for reading, long enough to clone the current
//! accessor out of it, so an in-flight call finishes against whichever
//! accessor it picked up.
//!
//! A promoting site holds its guard slot while the optimizer runs. If the
//! guard reclaims the slot before the compiled accessor is installed, the
//! promotion is revoked and the site stays interpreted. Revocation and
//! installation both happen under the live write lock, so a site is never
//! compiled without holding a slot.

use core_types::{EvalResult, SourceRange, Value, ValueType};
use crossbeam::atomic::AtomicCell;
use interpreter::{Accessor, VariableScope};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;
use tracing::{debug, warn};

use crate::guard::{SiteId, Tenured};
use crate::optimizer::{OptimizeKind, OptimizeRequest};
use crate::DynamicOptimizer;

/// Expression site that can switch between interpreted and compiled
/// accessors
pub struct TieredAccessor {
    id: SiteId,
    expr: String,
    range: SourceRange,
    kind: OptimizeKind,
    safe: Arc<dyn Accessor>,
    live: RwLock<Arc<dyn Accessor>>,
    optimized: AtomicBool,
    revoked: AtomicBool,
    run_count: AtomicU64,
    stamp: AtomicCell<Instant>,
    promoting: Mutex<()>,
    handle: Arc<DynamicOptimizer>,
    this: Weak<TieredAccessor>,
}

impl TieredAccessor {
    pub(crate) fn new(
        handle: Arc<DynamicOptimizer>,
        id: SiteId,
        expr: String,
        range: SourceRange,
        kind: OptimizeKind,
        safe: Arc<dyn Accessor>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            id,
            expr,
            range,
            kind,
            live: RwLock::new(Arc::clone(&safe)),
            safe,
            optimized: AtomicBool::new(false),
            revoked: AtomicBool::new(false),
            run_count: AtomicU64::new(0),
            stamp: AtomicCell::new(Instant::now()),
            promoting: Mutex::new(()),
            handle,
            this: this.clone(),
        })
    }

    /// Identity of this site
    pub fn site_id(&self) -> SiteId {
        self.id
    }

    /// Source text the site was compiled from
    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// Range of the site inside [`TieredAccessor::expr`]
    pub fn range(&self) -> SourceRange {
        self.range
    }

    /// Which optimizer entry point promotion uses
    pub fn kind(&self) -> OptimizeKind {
        self.kind
    }

    /// Whether a compiled accessor is live
    pub fn is_optimized(&self) -> bool {
        self.optimized.load(Ordering::Acquire)
    }

    /// Calls counted in the current window
    pub fn run_count(&self) -> u64 {
        self.run_count.load(Ordering::Relaxed)
    }

    /// The interpreted accessor this site falls back to
    pub fn safe_accessor(&self) -> &Arc<dyn Accessor> {
        &self.safe
    }

    /// The accessor calls currently go to
    pub fn live_accessor(&self) -> Arc<dyn Accessor> {
        self.live.read().clone()
    }

    /// Promote the site now, evaluating it once in the process
    ///
    /// Regular sites take the value the optimizer computed while
    /// compiling; object-creation sites evaluate the new accessor. When
    /// another thread is already promoting this site, when it is promoted
    /// already, or when the optimizer fails, the call is evaluated by the
    /// live accessor instead. A site whose guard slot is reclaimed while the
    /// optimizer runs, or a handle whose guard admits nothing, also stays
    /// interpreted.
    pub fn promote(&self, ctx: &Value, root: &Value, scope: &dyn VariableScope) -> EvalResult<Value> {
        let Some(_promoting) = self.promoting.try_lock() else {
            return self.live_accessor().get(ctx, root, scope);
        };
        if self.is_optimized() {
            return self.live_accessor().get(ctx, root, scope);
        }
        let Some(this) = self.this.upgrade() else {
            return self.safe.get(ctx, root, scope);
        };
        if self.handle.guard().max_tenured() == 0 {
            debug!(site = %self.id, "no compiled accessors admitted, staying interpreted");
            self.reset_window();
            return self.safe.get(ctx, root, scope);
        }

        self.revoked.store(false, Ordering::Release);
        let this: Arc<dyn Tenured> = this;
        self.handle.guard().admit(self.id, Arc::downgrade(&this));

        let request = OptimizeRequest {
            expr: &self.expr,
            range: self.range,
            ctx,
            root,
            scope,
        };
        let optimizer = self.handle.optimizer();
        let outcome = match self.kind {
            OptimizeKind::Regular => optimizer
                .optimize_accessor(&request)
                .map(|(accessor, value)| (accessor, Some(value))),
            OptimizeKind::ObjectCreation => optimizer
                .optimize_object_creation(&request)
                .map(|accessor| (accessor, None)),
        };

        match outcome {
            Ok((accessor, value)) => {
                if !self.install(Arc::clone(&accessor)) {
                    debug!(site = %self.id, expr = %self.expr, "guard slot reclaimed, staying interpreted");
                    self.handle.stats_ref().record_failed_promotion();
                    self.reset_window();
                    return match value {
                        Some(value) => Ok(value),
                        None => self.safe.get(ctx, root, scope),
                    };
                }
                match value {
                    Some(value) => Ok(value),
                    None => accessor.get(ctx, root, scope),
                }
            }
            Err(err) => {
                warn!(
                    site = %self.id,
                    expr = %self.expr,
                    optimizer = optimizer.name(),
                    error = %err,
                    "optimization failed, staying interpreted"
                );
                self.handle.guard().release(self.id);
                self.handle.stats_ref().record_failed_promotion();
                self.reset_window();
                self.safe.get(ctx, root, scope)
            }
        }
    }

    /// Go back to the interpreted accessor and restart the counting window
    ///
    /// Returns whether the site was promoted.
    pub fn deoptimize(&self) -> bool {
        let was_optimized = self.demote();
        if was_optimized {
            self.handle.guard().release(self.id);
            self.handle.stats_ref().record_deoptimization();
            debug!(site = %self.id, expr = %self.expr, "deoptimized");
        }
        was_optimized
    }

    /// Make `accessor` live unless the guard took the slot back meanwhile
    fn install(&self, accessor: Arc<dyn Accessor>) -> bool {
        {
            let mut live = self.live.write();
            if self.revoked.swap(false, Ordering::AcqRel) {
                return false;
            }
            *live = accessor;
            self.optimized.store(true, Ordering::Release);
        }
        self.handle.stats_ref().record_promotion();
        debug!(site = %self.id, expr = %self.expr, kind = %self.kind, "promoted");
        true
    }

    fn demote(&self) -> bool {
        let mut live = self.live.write();
        *live = Arc::clone(&self.safe);
        let was_optimized = self.optimized.swap(false, Ordering::AcqRel);
        drop(live);
        self.reset_window();
        was_optimized
    }

    fn reset_window(&self) {
        self.run_count.store(0, Ordering::Relaxed);
        self.stamp.store(Instant::now());
    }

    fn count_call(&self) -> u64 {
        self.run_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Whether this call should promote the site
    fn is_hot(&self, count: u64) -> bool {
        let config = self.handle.config();
        if !config.auto_promotion || self.is_optimized() || count <= config.tenuring_threshold {
            return false;
        }
        if self.stamp.load().elapsed() < config.time_span {
            true
        } else {
            self.reset_window();
            false
        }
    }
}

impl Accessor for TieredAccessor {
    fn get(&self, ctx: &Value, root: &Value, scope: &dyn VariableScope) -> EvalResult<Value> {
        let count = self.count_call();
        if self.is_hot(count) {
            return self.promote(ctx, root, scope);
        }
        self.live_accessor().get(ctx, root, scope)
    }

    fn set(
        &self,
        ctx: &Value,
        root: &Value,
        scope: &dyn VariableScope,
        value: Value,
    ) -> EvalResult<Value> {
        self.count_call();
        self.live_accessor().set(ctx, root, scope, value)
    }

    fn egress_type(&self) -> ValueType {
        self.safe.egress_type()
    }
}

impl Tenured for TieredAccessor {
    fn reclaim(&self) -> bool {
        let mut live = self.live.write();
        if !self.optimized.swap(false, Ordering::AcqRel) {
            // Still promoting: the pending install must not go ahead.
            self.revoked.store(true, Ordering::Release);
            return false;
        }
        *live = Arc::clone(&self.safe);
        drop(live);
        self.reset_window();
        self.handle.stats_ref().record_reclaimed(1);
        true
    }
}

impl fmt::Debug for TieredAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TieredAccessor")
            .field("id", &self.id)
            .field("expr", &self.expr)
            .field("kind", &self.kind)
            .field("optimized", &self.is_optimized())
            .field("run_count", &self.run_count())
            .finish()
    }
}
