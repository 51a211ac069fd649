//! Evaluation error types.
//!
//! Every failure surfaced by the evaluation core is an [`EvalError`]. The
//! [`ErrorKind`] says which part of the taxonomy the failure belongs to, so
//! callers can tell a malformed context apart from a failed conversion
//! without parsing messages.

use std::fmt;

use crate::SourceRange;

/// The kind of evaluation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The runtime value at a chain step does not support the operation
    /// (for example a map-entry step applied to a non-map)
    ContextShape,
    /// Dispatch of a method call failed
    Invocation,
    /// A value could not be converted to the requested type
    Conversion,
    /// Promotion to a compiled accessor failed
    Optimization,
    /// Name resolution found more than one equally valid candidate
    Ambiguity,
    /// A compile-time type expectation was not met
    Compile,
    /// A write was requested that the chain cannot perform
    Assignment,
    /// Internal engine error
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::ContextShape => "context shape error",
            ErrorKind::Invocation => "invocation error",
            ErrorKind::Conversion => "conversion error",
            ErrorKind::Optimization => "optimization error",
            ErrorKind::Ambiguity => "ambiguity error",
            ErrorKind::Compile => "compile error",
            ErrorKind::Assignment => "assignment error",
            ErrorKind::Internal => "internal error",
        };
        f.write_str(name)
    }
}

/// An evaluation error with message, optional source range and cause.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, EvalError};
///
/// let error = EvalError::new(ErrorKind::ContextShape, "expected a map, found Int");
/// assert_eq!(error.kind, ErrorKind::ContextShape);
/// assert_eq!(error.to_string(), "context shape error: expected a map, found Int");
/// ```
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct EvalError {
    /// The type of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Expression range the error was raised for, when known
    pub source_range: Option<SourceRange>,
    /// The failure this error wraps
    #[source]
    pub cause: Option<Box<EvalError>>,
}

/// Result alias used throughout the evaluation core.
pub type EvalResult<T> = Result<T, EvalError>;

impl EvalError {
    /// Create an error of the given kind
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source_range: None,
            cause: None,
        }
    }

    /// Shorthand for [`ErrorKind::ContextShape`]
    pub fn context_shape(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ContextShape, message)
    }

    /// Shorthand for [`ErrorKind::Invocation`]
    pub fn invocation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Invocation, message)
    }

    /// Shorthand for [`ErrorKind::Conversion`]
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conversion, message)
    }

    /// Shorthand for [`ErrorKind::Optimization`]
    pub fn optimization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Optimization, message)
    }

    /// Shorthand for [`ErrorKind::Ambiguity`]
    pub fn ambiguity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Ambiguity, message)
    }

    /// Shorthand for [`ErrorKind::Compile`]
    pub fn compile(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Compile, message)
    }

    /// Shorthand for [`ErrorKind::Assignment`]
    pub fn assignment(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Assignment, message)
    }

    /// Attach the expression range this error belongs to
    pub fn with_range(mut self, range: SourceRange) -> Self {
        self.source_range = Some(range);
        self
    }

    /// Wrap `cause` as the underlying failure of this error
    pub fn caused_by(mut self, cause: EvalError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}
