//! Optimizer failures

use core_types::{EvalError, SourceRange};
use thiserror::Error;

/// Why an expression site could not be compiled
///
/// Optimization failures never reach the caller of a tiered accessor; the
/// site stays interpreted. The conversion into [`EvalError`] exists for
/// optimizers that want to report through the common error type.
#[derive(Debug, Clone, Error)]
pub enum OptimizationError {
    /// The optimizer does not handle this kind of expression
    #[error("optimization not supported for: {expr}")]
    Unsupported {
        /// Source text of the site
        expr: String,
    },

    /// The optimizer tried and failed
    #[error("optimization of {expr} at {range:?} failed: {reason}")]
    Failed {
        /// Source text of the site
        expr: String,
        /// Location of the site
        range: SourceRange,
        /// What went wrong
        reason: String,
    },
}

impl From<OptimizationError> for EvalError {
    fn from(err: OptimizationError) -> Self {
        EvalError::optimization(err.to_string())
    }
}
