//! Conversion failures.

use core_types::{ErrorKind, EvalError, ValueType};

/// Why a value could not be converted to a target type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// No converter is registered for this source/target pairing
    #[error("cannot convert type: {from} to: {target}")]
    Unsupported {
        /// Runtime type name of the input
        from: String,
        /// Requested target type
        target: ValueType,
    },
    /// The input's text could not be parsed as the target type
    #[error("cannot convert \"{text}\" to: {target}: {reason}")]
    Unparsable {
        /// Text that failed to parse
        text: String,
        /// Requested target type
        target: ValueType,
        /// Parser diagnostic
        reason: String,
    },
    /// The input is a number the target cannot represent at all (NaN or
    /// infinite into an arbitrary precision integer)
    #[error("cannot represent {value} as: {target}")]
    NotRepresentable {
        /// Rendered input value
        value: String,
        /// Requested target type
        target: ValueType,
    },
}

impl From<ConversionError> for EvalError {
    fn from(err: ConversionError) -> Self {
        EvalError::new(ErrorKind::Conversion, err.to_string())
    }
}
