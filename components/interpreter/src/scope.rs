//! Variable resolution scopes
//!
//! A scope maps names to [`VariableResolver`] cells and delegates lookups it
//! cannot answer to its parent. Parents are borrowed, never owned: a child
//! scope lives on the stack of whoever evaluates a nested construct (a loop
//! body, for instance) and is dropped when that evaluation returns.

use core_types::{Value, ValueType};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A named, typed, mutable variable cell
///
/// Resolvers are shared handles: every lookup of the same name in the same
/// scope yields the same cell, so a write through one handle is visible
/// through all others.
pub struct VariableResolver {
    name: String,
    ty: ValueType,
    value: RwLock<Value>,
}

impl VariableResolver {
    /// Create an untyped cell holding `value`
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self::typed(name, ValueType::Object, value)
    }

    /// Create a cell with a declared type
    pub fn typed(name: impl Into<String>, ty: ValueType, value: Value) -> Self {
        Self {
            name: name.into(),
            ty,
            value: RwLock::new(value),
        }
    }

    /// Variable name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type (`Object` when untyped)
    pub fn ty(&self) -> ValueType {
        self.ty
    }

    /// Current value
    pub fn get_value(&self) -> Value {
        self.value.read().clone()
    }

    /// Replace the current value
    pub fn set_value(&self, value: Value) {
        *self.value.write() = value;
    }
}

impl fmt::Debug for VariableResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableResolver")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("value", &*self.value.read())
            .finish()
    }
}

/// Name to resolver lookup with parent delegation
pub trait VariableScope {
    /// Find the resolver for `name` here or in any ancestor
    fn get_resolver(&self, name: &str) -> Option<Arc<VariableResolver>>;

    /// Whether `name` is defined here or in any ancestor
    fn is_resolvable(&self, name: &str) -> bool {
        self.get_resolver(name).is_some()
    }

    /// Whether `name` is defined in this scope itself
    fn is_target(&self, name: &str) -> bool;

    /// Assign `value` to `name`.
    ///
    /// An existing local variable is updated; otherwise an ancestor that can
    /// resolve the name is updated; otherwise a new local variable is
    /// created.
    fn create_variable(&self, name: &str, value: Value) -> Arc<VariableResolver>;

    /// Resolver for the variable in register `index`, if this scope (or an
    /// ancestor) is indexed
    fn get_indexed_resolver(&self, index: usize) -> Option<Arc<VariableResolver>> {
        self.parent().and_then(|parent| parent.get_indexed_resolver(index))
    }

    /// The enclosing scope, if any
    fn parent(&self) -> Option<&dyn VariableScope>;
}

/// Hash map backed scope
///
/// # Examples
///
/// ```
/// use core_types::Value;
/// use interpreter::{MapScope, VariableScope};
///
/// let outer = MapScope::new();
/// outer.create_variable("x", Value::Int(1));
///
/// let inner = MapScope::with_parent(&outer);
/// inner.create_variable("x", Value::Int(2));
/// inner.create_variable("y", Value::Int(3));
///
/// assert_eq!(outer.get_resolver("x").unwrap().get_value(), Value::Int(2));
/// assert!(!outer.is_resolvable("y"));
/// ```
#[derive(Default)]
pub struct MapScope<'p> {
    variables: RwLock<HashMap<String, Arc<VariableResolver>>>,
    parent: Option<&'p dyn VariableScope>,
}

impl<'p> MapScope<'p> {
    /// Create a root scope
    pub fn new() -> Self {
        Self {
            variables: RwLock::new(HashMap::new()),
            parent: None,
        }
    }

    /// Create an empty scope that delegates to `parent`
    pub fn with_parent(parent: &'p dyn VariableScope) -> Self {
        Self {
            variables: RwLock::new(HashMap::new()),
            parent: Some(parent),
        }
    }

    /// Create a root scope pre-populated with `variables`
    pub fn from_values(variables: impl IntoIterator<Item = (String, Value)>) -> Self {
        let map = variables
            .into_iter()
            .map(|(name, value)| {
                let resolver = Arc::new(VariableResolver::new(name.clone(), value));
                (name, resolver)
            })
            .collect();
        Self {
            variables: RwLock::new(map),
            parent: None,
        }
    }

    /// Declare a typed local variable, replacing any previous local
    pub fn declare(&self, name: &str, ty: ValueType, value: Value) -> Arc<VariableResolver> {
        let resolver = Arc::new(VariableResolver::typed(name, ty, value));
        self.variables
            .write()
            .insert(name.to_string(), Arc::clone(&resolver));
        resolver
    }

    /// Number of local variables
    pub fn len(&self) -> usize {
        self.variables.read().len()
    }

    /// Whether no local variable is defined
    pub fn is_empty(&self) -> bool {
        self.variables.read().is_empty()
    }
}

impl VariableScope for MapScope<'_> {
    fn get_resolver(&self, name: &str) -> Option<Arc<VariableResolver>> {
        if let Some(resolver) = self.variables.read().get(name) {
            return Some(Arc::clone(resolver));
        }
        self.parent.and_then(|parent| parent.get_resolver(name))
    }

    fn is_target(&self, name: &str) -> bool {
        self.variables.read().contains_key(name)
    }

    fn create_variable(&self, name: &str, value: Value) -> Arc<VariableResolver> {
        if let Some(resolver) = self.variables.read().get(name) {
            resolver.set_value(value);
            return Arc::clone(resolver);
        }
        if let Some(parent) = self.parent {
            if parent.is_resolvable(name) {
                return parent.create_variable(name, value);
            }
        }
        let resolver = Arc::new(VariableResolver::new(name, value));
        self.variables
            .write()
            .insert(name.to_string(), Arc::clone(&resolver));
        resolver
    }

    fn parent(&self) -> Option<&dyn VariableScope> {
        self.parent
    }
}

/// Register-indexed scope
///
/// Variables are addressed by their position in a fixed name list, as
/// assigned at compile time. Names outside the list are delegated to the
/// parent, or kept in a local overflow map when there is none.
pub struct IndexedScope<'p> {
    names: Vec<String>,
    registers: Vec<Arc<VariableResolver>>,
    overflow: MapScope<'p>,
}

impl<'p> IndexedScope<'p> {
    /// Create a scope with one register per name, all initially `Null`
    pub fn new(names: Vec<String>) -> Self {
        Self::build(names, MapScope::new())
    }

    /// Create an indexed scope that delegates unknown names to `parent`
    pub fn with_parent(names: Vec<String>, parent: &'p dyn VariableScope) -> Self {
        Self::build(names, MapScope::with_parent(parent))
    }

    fn build(names: Vec<String>, overflow: MapScope<'p>) -> Self {
        let registers = names
            .iter()
            .map(|name| Arc::new(VariableResolver::new(name.clone(), Value::Null)))
            .collect();
        Self {
            names,
            registers,
            overflow,
        }
    }

    /// Set the value held in register `index`; returns false when the
    /// register does not exist
    pub fn set_register(&self, index: usize, value: Value) -> bool {
        match self.registers.get(index) {
            Some(resolver) => {
                resolver.set_value(value);
                true
            }
            None => false,
        }
    }

    fn register_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

impl VariableScope for IndexedScope<'_> {
    fn get_resolver(&self, name: &str) -> Option<Arc<VariableResolver>> {
        match self.register_of(name) {
            Some(index) => self.registers.get(index).cloned(),
            None => self.overflow.get_resolver(name),
        }
    }

    fn is_target(&self, name: &str) -> bool {
        self.register_of(name).is_some() || self.overflow.is_target(name)
    }

    fn create_variable(&self, name: &str, value: Value) -> Arc<VariableResolver> {
        match self.register_of(name).and_then(|index| self.registers.get(index)) {
            Some(resolver) => {
                resolver.set_value(value);
                Arc::clone(resolver)
            }
            None => self.overflow.create_variable(name, value),
        }
    }

    fn get_indexed_resolver(&self, index: usize) -> Option<Arc<VariableResolver>> {
        self.registers.get(index).cloned()
    }

    fn parent(&self) -> Option<&dyn VariableScope> {
        self.overflow.parent()
    }
}
