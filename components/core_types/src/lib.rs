//! Core value types and error handling for the expression evaluation core.
//!
//! This crate provides the foundational types shared by every component:
//! the dynamic value representation, static type tags, the host object
//! model that expressions navigate, and the error taxonomy.
//!
//! # Overview
//!
//! - [`Value`] - Runtime value of the expression language
//! - [`ValueType`] - Static type tag (egress/ingress types, coercion keys)
//! - [`Class`], [`Method`], [`Instance`] - Host object model
//! - [`EvalError`] - Evaluation errors, classified by [`ErrorKind`]
//! - [`SourceRange`] - Character range of an expression site
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, EvalError, Value, ValueType};
//!
//! let num = Value::Int(42);
//! assert_eq!(num.value_type(), ValueType::Int);
//!
//! let error = EvalError::new(ErrorKind::ContextShape, "expected a map");
//! assert_eq!(error.kind, ErrorKind::ContextShape);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod object;
mod source;
mod value;

pub use error::{ErrorKind, EvalError, EvalResult};
pub use object::{Class, ClassBuilder, DisplayFn, Instance, InvokeError, Method, NativeFn};
pub use source::SourceRange;
pub use value::{ListRef, MapRef, ObjectRef, Value, ValueType};
