//! Compile-time context
//!
//! The parser context tracks what the compiler knows while it builds a
//! tree: which variables are declared in which lexical scope, the types of
//! inputs, and the register assignment of indexed variables. Its scope
//! stack is purely a compile-time device and is unrelated to the runtime
//! [`VariableScope`](crate::VariableScope) objects.

use core_types::{EvalResult, SourceRange, ValueType};
use std::collections::HashMap;
use std::sync::Arc;

use crate::accessor::PropertyAccessor;
use crate::config::{Import, ParserConfiguration};
use crate::statement::ExecutableStatement;

/// Compiles a range of source text into an executable statement
///
/// Provided by the surrounding parser; nodes that contain sub-expressions
/// (loops, for instance) call back into it.
pub trait ExpressionCompiler {
    /// Compile the characters of `expr` covered by `range`
    fn compile(
        &self,
        expr: &str,
        range: SourceRange,
        ctx: &mut ParserContext,
    ) -> EvalResult<Arc<dyn ExecutableStatement>>;
}

/// State shared by one compilation
#[derive(Debug)]
pub struct ParserContext {
    configuration: Arc<ParserConfiguration>,
    variable_scopes: Vec<HashMap<String, ValueType>>,
    inputs: HashMap<String, ValueType>,
    indexed_var_names: Vec<String>,
    strict_typing: bool,
}

impl ParserContext {
    /// Fresh context with a single (outermost) variable scope
    pub fn new(configuration: Arc<ParserConfiguration>) -> Self {
        Self {
            configuration,
            variable_scopes: vec![HashMap::new()],
            inputs: HashMap::new(),
            indexed_var_names: Vec::new(),
            strict_typing: false,
        }
    }

    /// Require statically known types where the compiler checks them
    pub fn with_strict_typing(mut self, strict: bool) -> Self {
        self.strict_typing = strict;
        self
    }

    /// Whether strict typing is on
    pub fn is_strict_typing(&self) -> bool {
        self.strict_typing
    }

    /// The parser configuration (imports and flags)
    pub fn configuration(&self) -> &Arc<ParserConfiguration> {
        &self.configuration
    }

    /// Open a nested variable scope
    pub fn push_variable_scope(&mut self) {
        self.variable_scopes.push(HashMap::new());
    }

    /// Close the innermost variable scope, dropping its declarations
    ///
    /// The outermost scope is never popped.
    pub fn pop_variable_scope(&mut self) {
        if self.variable_scopes.len() > 1 {
            self.variable_scopes.pop();
        }
    }

    /// Number of open variable scopes (at least 1)
    pub fn scope_depth(&self) -> usize {
        self.variable_scopes.len()
    }

    /// Declare a variable in the innermost scope
    pub fn add_variable(&mut self, name: impl Into<String>, ty: ValueType) {
        if let Some(scope) = self.variable_scopes.last_mut() {
            scope.insert(name.into(), ty);
        }
    }

    /// Declare an input (a variable supplied by the caller)
    pub fn add_input(&mut self, name: impl Into<String>, ty: ValueType) {
        self.inputs.insert(name.into(), ty);
    }

    /// Whether `name` is a variable visible from the innermost scope
    pub fn has_variable(&self, name: &str) -> bool {
        self.variable_scopes.iter().any(|scope| scope.contains_key(name))
    }

    /// Whether `name` is a visible variable or an input
    pub fn has_var_or_input(&self, name: &str) -> bool {
        self.has_variable(name) || self.inputs.contains_key(name)
    }

    /// Type of the innermost visible variable named `name`, else of the
    /// input
    pub fn get_var_or_input_type(&self, name: &str) -> Option<ValueType> {
        self.variable_scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
            .or_else(|| self.inputs.get(name).copied())
    }

    /// Assign registers to variable names, in order
    pub fn set_indexed_var_names(&mut self, names: Vec<String>) {
        self.indexed_var_names = names;
    }

    /// Register assignment
    pub fn indexed_var_names(&self) -> &[String] {
        &self.indexed_var_names
    }

    /// Register of `name`, if it has one
    pub fn variable_index_of(&self, name: &str) -> Option<usize> {
        self.indexed_var_names.iter().position(|n| n == name)
    }

    /// Property step for `name`, null-safe when the configuration is
    pub fn property_accessor(&self, name: impl Into<String>) -> PropertyAccessor {
        PropertyAccessor::new(name).null_safe(self.configuration.is_null_safe())
    }

    /// Resolve a bare name through the configured imports
    ///
    /// Variables shadow imports; dynamic package lookups may fail with an
    /// ambiguity error.
    pub fn resolve_import(&self, name: &str) -> EvalResult<Option<Import>> {
        if self.has_var_or_input(name) {
            return Ok(None);
        }
        if self.configuration.has_import(name)? {
            Ok(self.configuration.get_static_or_class_import(name))
        } else {
            Ok(None)
        }
    }
}
