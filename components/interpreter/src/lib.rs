//! Expression evaluation core
//!
//! This crate evaluates compiled expression trees against host values:
//! - Accessor chains for property paths, map entries and method calls,
//!   with a three-stage method dispatch that latches into argument coercion
//! - Variable scopes resolving names (map backed) or registers (indexed)
//! - Executable statements wrapping nodes, literals and accessor chains
//! - `do .. while` / `do .. until` loops with a per-evaluation body scope
//! - A parser context and a shared parser configuration with import
//!   resolution and a bounded negative cache
//!
//! # Example
//!
//! ```
//! use interpreter::{Accessor, AccessorNode, MapScope};
//! use core_types::Value;
//!
//! let ctx = Value::map([(Value::from("total"), Value::Int(3))]);
//! let chain = AccessorNode::property("total");
//! let scope = MapScope::new();
//!
//! assert_eq!(chain.get(&ctx, &ctx, &scope).unwrap(), Value::Int(3));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod accessor;
pub mod ast;
pub mod config;
pub mod math;
pub mod null_handler;
pub mod parser_context;
pub mod scope;
pub mod statement;

// Re-export main types at crate root
pub use accessor::{
    Accessor, AccessorKind, AccessorNode, DispatchSnapshot, IndexedIncrementAccessor,
    MapEntryAccessor, MethodAccessor, PropertyAccessor, RegexAccessor, VariableAccessor,
};
pub use ast::{DoNode, DoUntilNode, Node};
pub use config::{ClassPath, Import, MethodStub, ParserConfiguration};
pub use math::Operator;
pub use null_handler::PropertyHandler;
pub use parser_context::{ExpressionCompiler, ParserContext};
pub use scope::{IndexedScope, MapScope, VariableResolver, VariableScope};
pub use statement::{
    ExecutableAccessor, ExecutableAccessorSafe, ExecutableChain, ExecutableLiteral,
    ExecutableStatement, TypeRule,
};
