//! The compiled-accessor optimizer seam
//!
//! Producing compiled accessors is not this crate's business. An
//! [`AccessorOptimizer`] is supplied by the embedder and consulted when a
//! site is promoted; whatever it returns is used as an opaque [`Accessor`].

use core_types::{SourceRange, Value};
use interpreter::{Accessor, VariableScope};
use std::fmt;
use std::sync::Arc;

use crate::error::OptimizationError;

/// What kind of expression a site evaluates
///
/// Each kind has its own optimizer entry point and they are never
/// interchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptimizeKind {
    /// Property, map-entry and method access
    Regular,
    /// Object construction
    ObjectCreation,
}

impl fmt::Display for OptimizeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizeKind::Regular => write!(f, "regular"),
            OptimizeKind::ObjectCreation => write!(f, "object-creation"),
        }
    }
}

/// Everything an optimizer gets to see about a site and a live call
pub struct OptimizeRequest<'a> {
    /// Source text the site was compiled from
    pub expr: &'a str,
    /// Range of the site inside `expr`
    pub range: SourceRange,
    /// Context value of the triggering call
    pub ctx: &'a Value,
    /// Root value of the triggering call
    pub root: &'a Value,
    /// Scope of the triggering call
    pub scope: &'a dyn VariableScope,
}

impl fmt::Debug for OptimizeRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimizeRequest")
            .field("expr", &self.expr)
            .field("range", &self.range)
            .field("ctx", self.ctx)
            .finish()
    }
}

/// Produces compiled accessors
pub trait AccessorOptimizer: Send + Sync {
    /// Compile an access expression and evaluate it once against the
    /// request's live values, returning the accessor and that result
    fn optimize_accessor(
        &self,
        request: &OptimizeRequest<'_>,
    ) -> Result<(Arc<dyn Accessor>, Value), OptimizationError>;

    /// Compile an object-construction expression
    fn optimize_object_creation(
        &self,
        request: &OptimizeRequest<'_>,
    ) -> Result<Arc<dyn Accessor>, OptimizationError>;

    /// Name used in log output
    fn name(&self) -> &str {
        "optimizer"
    }
}

/// Optimizer that never compiles anything
///
/// Sites built against it stay interpreted; promotion attempts are
/// recorded as failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOptimizer;

impl AccessorOptimizer for NoOptimizer {
    fn optimize_accessor(
        &self,
        request: &OptimizeRequest<'_>,
    ) -> Result<(Arc<dyn Accessor>, Value), OptimizationError> {
        Err(OptimizationError::Unsupported {
            expr: request.expr.to_string(),
        })
    }

    fn optimize_object_creation(
        &self,
        request: &OptimizeRequest<'_>,
    ) -> Result<Arc<dyn Accessor>, OptimizationError> {
        Err(OptimizationError::Unsupported {
            expr: request.expr.to_string(),
        })
    }

    fn name(&self) -> &str {
        "none"
    }
}
