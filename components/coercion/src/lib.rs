//! Type coercion for method arguments and typed assignment.
//!
//! A [`ConversionRegistry`] maps each target type to a
//! [`ConversionHandler`]; the standard handlers are [`ConversionTable`]s
//! keyed by source type, with the `Object` entry acting as a
//! stringify-then-parse fallback for maps, lists and host objects.
//!
//! # Examples
//!
//! ```
//! use coercion::ConversionRegistry;
//! use core_types::{Value, ValueType};
//!
//! let registry = ConversionRegistry::new();
//! assert_eq!(registry.convert(&Value::Int(300), ValueType::Byte).unwrap(), Value::Byte(44));
//! assert!(registry.convert(&Value::from("abc"), ValueType::Int).is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod handler;
mod registry;
pub mod targets;

pub use error::ConversionError;
pub use handler::{ConversionHandler, ConversionTable, Converter};
pub use registry::ConversionRegistry;
