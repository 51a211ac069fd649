//! Accessor chains
//!
//! An accessor chain reads or writes one property path such as
//! `user.address["city"]` or `order.total(rate).amount`. Each
//! [`AccessorNode`] resolves a single step against the value handed to it
//! and passes its result on as the context of the next node. The last node
//! (the terminal) performs the actual read or write.
//!
//! Chains are built once at compile time and evaluated many times,
//! possibly from several threads at once, so every node is `Send + Sync`
//! and keeps its mutable bookkeeping in atomics.

mod indexed;
mod method;
mod property;
mod regex_match;

pub use indexed::{increment_register, IndexedIncrementAccessor};
pub use method::{DispatchSnapshot, MethodAccessor};
pub use property::{MapEntryAccessor, PropertyAccessor, VariableAccessor};
pub use regex_match::{PatternCache, RegexAccessor};

use core_types::{EvalError, EvalResult, Value, ValueType};
use std::fmt;

use crate::scope::VariableScope;

/// Something that can read and write a value relative to a context
///
/// Implemented by [`AccessorNode`] chains and by anything that stands in
/// for one, such as a compiled replacement produced by an optimizer.
pub trait Accessor: Send + Sync {
    /// Read the value at this accessor's path, starting from `ctx`
    fn get(&self, ctx: &Value, root: &Value, scope: &dyn VariableScope) -> EvalResult<Value>;

    /// Write `value` at this accessor's path and return the assigned value
    fn set(
        &self,
        ctx: &Value,
        root: &Value,
        scope: &dyn VariableScope,
        value: Value,
    ) -> EvalResult<Value>;

    /// Statically known type of the value [`Accessor::get`] produces
    fn egress_type(&self) -> ValueType;
}

/// The step a single node performs
pub enum AccessorKind {
    /// Scope variable lookup; ignores the inbound context
    Variable(VariableAccessor),
    /// Named field of an object, or string-keyed entry of a map
    Property(PropertyAccessor),
    /// Entry of a key-value mapping
    MapEntry(MapEntryAccessor),
    /// Method call on the inbound context
    Method(MethodAccessor),
    /// Whole-text regular expression match of the inbound context
    RegexMatch(RegexAccessor),
    /// Pre-increment of an indexed scope variable
    IndexedIncrement(IndexedIncrementAccessor),
}

impl AccessorKind {
    fn resolve(&self, ctx: &Value, root: &Value, scope: &dyn VariableScope) -> EvalResult<Value> {
        match self {
            AccessorKind::Variable(step) => step.get(scope),
            AccessorKind::Property(step) => step.get(ctx, scope),
            AccessorKind::MapEntry(step) => step.get(ctx),
            AccessorKind::Method(step) => step.invoke(ctx, root, scope),
            AccessorKind::RegexMatch(step) => Ok(step.matches(ctx)),
            AccessorKind::IndexedIncrement(step) => step.increment(scope),
        }
    }

    /// Value handed to the next node on the write path
    fn resolve_for_set(
        &self,
        ctx: &Value,
        root: &Value,
        scope: &dyn VariableScope,
    ) -> EvalResult<Value> {
        match self {
            // A method step does not take part in writes; the write goes on
            // against the same context.
            AccessorKind::Method(_) => Ok(ctx.clone()),
            AccessorKind::IndexedIncrement(_) => {
                Err(EvalError::assignment(format!("cannot assign through {}", self)))
            }
            _ => self.resolve(ctx, root, scope),
        }
    }

    fn assign(&self, ctx: &Value, scope: &dyn VariableScope, value: Value) -> EvalResult<Value> {
        match self {
            AccessorKind::Variable(step) => Ok(step.set(scope, value)),
            AccessorKind::Property(step) => step.set(ctx, value),
            AccessorKind::MapEntry(step) => step.set(ctx, value),
            _ => Err(EvalError::assignment(format!("cannot assign to {}", self))),
        }
    }

    fn egress_type(&self) -> ValueType {
        match self {
            AccessorKind::Variable(step) => step.egress_type(),
            AccessorKind::Property(step) => step.egress_type(),
            AccessorKind::MapEntry(_) => ValueType::Object,
            AccessorKind::Method(step) => step.egress_type(),
            AccessorKind::RegexMatch(_) => ValueType::Boolean,
            AccessorKind::IndexedIncrement(step) => step.egress_type(),
        }
    }
}

impl fmt::Display for AccessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessorKind::Variable(step) => write!(f, "Variable Accessor -> {}", step.name()),
            AccessorKind::Property(step) => write!(f, "Property Accessor -> {}", step.name()),
            AccessorKind::MapEntry(step) => write!(f, "Map Accessor -> [{}]", step.key()),
            AccessorKind::Method(step) => write!(f, "Method Accessor -> {}", step.method().signature()),
            AccessorKind::RegexMatch(step) => write!(f, "Regex Accessor -> {}", step.pattern()),
            AccessorKind::IndexedIncrement(step) => {
                write!(f, "Indexed Increment -> #{}", step.register())
            }
        }
    }
}

/// One link of an accessor chain
///
/// A node exclusively owns its successor, so a chain is a non-cyclic
/// singly linked list with exactly one terminal node.
///
/// # Examples
///
/// ```
/// use core_types::Value;
/// use interpreter::{Accessor, AccessorNode, MapScope};
///
/// let chain = AccessorNode::property("address").then(AccessorNode::map_entry(Value::from("city")));
///
/// let address = Value::map([(Value::from("city"), Value::from("Lyon"))]);
/// let person = Value::map([(Value::from("address"), address)]);
/// let scope = MapScope::new();
///
/// assert_eq!(chain.get(&person, &person, &scope).unwrap(), Value::from("Lyon"));
/// chain.set(&person, &person, &scope, Value::from("Nice")).unwrap();
/// assert_eq!(chain.get(&person, &person, &scope).unwrap(), Value::from("Nice"));
/// ```
pub struct AccessorNode {
    kind: AccessorKind,
    next: Option<Box<AccessorNode>>,
}

impl AccessorNode {
    /// Terminal node performing `kind`
    pub fn new(kind: AccessorKind) -> Self {
        Self { kind, next: None }
    }

    /// Terminal property node
    pub fn property(name: impl Into<String>) -> Self {
        Self::new(AccessorKind::Property(PropertyAccessor::new(name)))
    }

    /// Terminal map-entry node
    pub fn map_entry(key: Value) -> Self {
        Self::new(AccessorKind::MapEntry(MapEntryAccessor::new(key)))
    }

    /// Terminal scope variable node
    pub fn variable(name: impl Into<String>) -> Self {
        Self::new(AccessorKind::Variable(VariableAccessor::new(name)))
    }

    /// Terminal method node
    pub fn method(accessor: MethodAccessor) -> Self {
        Self::new(AccessorKind::Method(accessor))
    }

    /// Append `tail` after the current terminal node
    pub fn then(mut self, tail: AccessorNode) -> Self {
        self.append(tail);
        self
    }

    fn append(&mut self, tail: AccessorNode) {
        if let Some(next) = self.next.as_mut() {
            next.append(tail);
        } else {
            self.next = Some(Box::new(tail));
        }
    }

    /// Replace this node's successor, returning the previous one
    pub fn set_next(&mut self, next: Option<AccessorNode>) -> Option<AccessorNode> {
        std::mem::replace(&mut self.next, next.map(Box::new)).map(|node| *node)
    }

    /// The step this node performs
    pub fn kind(&self) -> &AccessorKind {
        &self.kind
    }

    /// The successor, if this is not the terminal node
    pub fn next(&self) -> Option<&AccessorNode> {
        self.next.as_deref()
    }

    /// Whether this node has no successor
    pub fn is_terminal(&self) -> bool {
        self.next.is_none()
    }

    /// Number of nodes from here to the terminal, inclusive
    pub fn len(&self) -> usize {
        1 + self.next.as_ref().map_or(0, |next| next.len())
    }

    /// Always false; a chain has at least one node
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The terminal node of this chain
    pub fn terminal(&self) -> &AccessorNode {
        match &self.next {
            Some(next) => next.terminal(),
            None => self,
        }
    }
}

impl Accessor for AccessorNode {
    fn get(&self, ctx: &Value, root: &Value, scope: &dyn VariableScope) -> EvalResult<Value> {
        let value = self.kind.resolve(ctx, root, scope)?;
        match &self.next {
            Some(next) => next.get(&value, root, scope),
            None => Ok(value),
        }
    }

    fn set(
        &self,
        ctx: &Value,
        root: &Value,
        scope: &dyn VariableScope,
        value: Value,
    ) -> EvalResult<Value> {
        match &self.next {
            Some(next) => {
                let intermediate = self.kind.resolve_for_set(ctx, root, scope)?;
                next.set(&intermediate, root, scope, value)
            }
            None => self.kind.assign(ctx, scope, value),
        }
    }

    fn egress_type(&self) -> ValueType {
        self.terminal().kind.egress_type()
    }
}

impl fmt::Display for AccessorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(next) = &self.next {
            write!(f, " | {}", next)?;
        }
        Ok(())
    }
}

impl fmt::Debug for AccessorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessorNode({})", self)
    }
}
