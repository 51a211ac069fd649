//! Executable statements
//!
//! An executable statement is the uniform face of anything compiled:
//! callers (and loop nodes) only ever `get_value` / `set_value` it,
//! whether it wraps an AST node, a constant, or an accessor chain that may
//! be promoted to a compiled form behind the scenes.

use core_types::{EvalError, EvalResult, Value, ValueType};
use std::sync::Arc;

use crate::accessor::Accessor;
use crate::ast::Node;
use crate::scope::VariableScope;

/// Compiled, evaluable unit
pub trait ExecutableStatement: Send + Sync {
    /// Evaluate against `ctx` with `el_ctx` as the root / `this` value
    fn get_value(&self, ctx: &Value, el_ctx: &Value, scope: &dyn VariableScope) -> EvalResult<Value>;

    /// Evaluate with the same value as context and root
    fn get_value_static(&self, static_ctx: &Value, scope: &dyn VariableScope) -> EvalResult<Value> {
        self.get_value(static_ctx, static_ctx, scope)
    }

    /// Assign `value` through the statement, returning the assigned value
    fn set_value(
        &self,
        _ctx: &Value,
        _el_ctx: &Value,
        _scope: &dyn VariableScope,
        _value: Value,
    ) -> EvalResult<Value> {
        Err(EvalError::assignment(format!(
            "cannot assign to: {}",
            self.node_expr()
        )))
    }

    /// Type the caller expects, if declared
    fn known_ingress_type(&self) -> Option<ValueType> {
        None
    }

    /// Type the statement produces
    fn known_egress_type(&self) -> ValueType;

    /// Whether the produced type is directly assignable to the expected
    /// type, as computed by the statement's type rule
    fn is_convertable_ingress_egress(&self) -> bool {
        false
    }

    /// Whether the statement is a bare constant
    fn is_literal_only(&self) -> bool {
        false
    }

    /// Whether there is nothing to evaluate
    fn is_empty_statement(&self) -> bool {
        false
    }

    /// Whether the statement is an explicit type cast
    fn is_explicit_cast(&self) -> bool {
        false
    }

    /// Source-like rendering of the statement
    fn node_expr(&self) -> String;
}

/// Ingress/egress bookkeeping shared by the statement wrappers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeRule {
    ingress: Option<ValueType>,
    egress: ValueType,
    convertable: bool,
}

impl TypeRule {
    /// Rule for a statement producing `egress` with no declared ingress
    pub fn new(egress: ValueType) -> Self {
        Self {
            ingress: None,
            egress,
            convertable: false,
        }
    }

    /// Declare the expected type
    pub fn set_ingress(&mut self, ty: ValueType) {
        self.ingress = Some(ty);
    }

    /// Override the produced type
    pub fn set_egress(&mut self, ty: ValueType) {
        self.egress = ty;
    }

    /// Recompute convertibility; a no-op until an ingress type is known
    pub fn compute(&mut self) {
        if let Some(ingress) = self.ingress {
            self.convertable = ingress.is_assignable_from(self.egress);
        }
    }

    /// Declared ingress type
    pub fn ingress(&self) -> Option<ValueType> {
        self.ingress
    }

    /// Produced type
    pub fn egress(&self) -> ValueType {
        self.egress
    }

    /// Last computed convertibility
    pub fn is_convertable(&self) -> bool {
        self.convertable
    }
}

/// Wraps an AST node; writes go through the node when it is assignable
///
/// # Examples
///
/// ```
/// use core_types::Value;
/// use interpreter::{ExecutableAccessor, ExecutableStatement, MapScope, Node};
///
/// let statement = ExecutableAccessor::new(Node::var("total"));
/// let scope = MapScope::new();
///
/// statement.set_value(&Value::Null, &Value::Null, &scope, Value::Int(3)).unwrap();
/// assert_eq!(statement.get_value(&Value::Null, &Value::Null, &scope).unwrap(), Value::Int(3));
/// ```
pub struct ExecutableAccessor {
    node: Node,
    types: TypeRule,
}

impl ExecutableAccessor {
    /// Wrap `node`, taking its egress type
    pub fn new(node: Node) -> Self {
        let types = TypeRule::new(node.egress_type());
        Self { node, types }
    }

    /// Wrap `node`, declaring the produced type
    pub fn with_return_type(node: Node, egress: ValueType) -> Self {
        Self {
            node,
            types: TypeRule::new(egress),
        }
    }

    /// Mutable access to the type rule
    pub fn type_rule_mut(&mut self) -> &mut TypeRule {
        &mut self.types
    }

    /// The wrapped node
    pub fn node(&self) -> &Node {
        &self.node
    }
}

impl ExecutableStatement for ExecutableAccessor {
    fn get_value(&self, ctx: &Value, el_ctx: &Value, scope: &dyn VariableScope) -> EvalResult<Value> {
        self.node.reduce(ctx, el_ctx, scope)
    }

    fn set_value(
        &self,
        ctx: &Value,
        el_ctx: &Value,
        scope: &dyn VariableScope,
        value: Value,
    ) -> EvalResult<Value> {
        self.node.assign_value(ctx, el_ctx, scope, value)
    }

    fn known_ingress_type(&self) -> Option<ValueType> {
        self.types.ingress()
    }

    fn known_egress_type(&self) -> ValueType {
        self.types.egress()
    }

    fn is_convertable_ingress_egress(&self) -> bool {
        self.types.is_convertable()
    }

    fn is_explicit_cast(&self) -> bool {
        matches!(self.node, Node::TypeCast(_))
    }

    fn node_expr(&self) -> String {
        self.node.to_string()
    }
}

/// Read-only wrapper; writes are ignored and yield `Null`
pub struct ExecutableAccessorSafe {
    node: Option<Node>,
    types: TypeRule,
}

impl ExecutableAccessorSafe {
    /// Wrap `node`, declaring the produced type
    pub fn new(node: Node, egress: ValueType) -> Self {
        Self {
            node: Some(node),
            types: TypeRule::new(egress),
        }
    }

    /// A statement with nothing to evaluate
    pub fn empty() -> Self {
        Self {
            node: None,
            types: TypeRule::new(ValueType::Null),
        }
    }

    /// Mutable access to the type rule
    pub fn type_rule_mut(&mut self) -> &mut TypeRule {
        &mut self.types
    }

    /// The wrapped node
    pub fn node(&self) -> Option<&Node> {
        self.node.as_ref()
    }
}

impl ExecutableStatement for ExecutableAccessorSafe {
    fn get_value(&self, ctx: &Value, el_ctx: &Value, scope: &dyn VariableScope) -> EvalResult<Value> {
        match &self.node {
            Some(node) => node.reduce(ctx, el_ctx, scope),
            None => Ok(Value::Null),
        }
    }

    fn set_value(
        &self,
        _ctx: &Value,
        _el_ctx: &Value,
        _scope: &dyn VariableScope,
        _value: Value,
    ) -> EvalResult<Value> {
        Ok(Value::Null)
    }

    fn known_ingress_type(&self) -> Option<ValueType> {
        self.types.ingress()
    }

    fn known_egress_type(&self) -> ValueType {
        self.types.egress()
    }

    fn is_convertable_ingress_egress(&self) -> bool {
        self.types.is_convertable()
    }

    fn is_empty_statement(&self) -> bool {
        self.node.is_none()
    }

    fn is_explicit_cast(&self) -> bool {
        matches!(self.node, Some(Node::TypeCast(_)))
    }

    fn node_expr(&self) -> String {
        self.node.as_ref().map(|node| node.to_string()).unwrap_or_default()
    }
}

/// A constant
#[derive(Debug, Clone)]
pub struct ExecutableLiteral {
    value: Value,
    types: TypeRule,
}

impl ExecutableLiteral {
    /// Constant statement producing `value`
    pub fn new(value: Value) -> Self {
        let types = TypeRule::new(value.value_type());
        Self { value, types }
    }

    /// Mutable access to the type rule
    pub fn type_rule_mut(&mut self) -> &mut TypeRule {
        &mut self.types
    }

    /// The constant
    pub fn literal(&self) -> &Value {
        &self.value
    }
}

impl ExecutableStatement for ExecutableLiteral {
    fn get_value(&self, _ctx: &Value, _el_ctx: &Value, _scope: &dyn VariableScope) -> EvalResult<Value> {
        Ok(self.value.clone())
    }

    fn known_ingress_type(&self) -> Option<ValueType> {
        self.types.ingress()
    }

    fn known_egress_type(&self) -> ValueType {
        self.types.egress()
    }

    fn is_convertable_ingress_egress(&self) -> bool {
        self.types.is_convertable()
    }

    fn is_literal_only(&self) -> bool {
        true
    }

    fn node_expr(&self) -> String {
        self.value.to_string()
    }
}

/// Adapts an accessor (a plain chain or a tiered one) to the statement
/// contract
pub struct ExecutableChain {
    accessor: Arc<dyn Accessor>,
    expr: String,
    types: TypeRule,
}

impl ExecutableChain {
    /// Wrap `accessor`, compiled from source text `expr`
    pub fn new(accessor: Arc<dyn Accessor>, expr: impl Into<String>) -> Self {
        let types = TypeRule::new(accessor.egress_type());
        Self {
            accessor,
            expr: expr.into(),
            types,
        }
    }

    /// Mutable access to the type rule
    pub fn type_rule_mut(&mut self) -> &mut TypeRule {
        &mut self.types
    }

    /// The wrapped accessor
    pub fn accessor(&self) -> &Arc<dyn Accessor> {
        &self.accessor
    }
}

impl ExecutableStatement for ExecutableChain {
    fn get_value(&self, ctx: &Value, el_ctx: &Value, scope: &dyn VariableScope) -> EvalResult<Value> {
        self.accessor.get(ctx, el_ctx, scope)
    }

    fn set_value(
        &self,
        ctx: &Value,
        el_ctx: &Value,
        scope: &dyn VariableScope,
        value: Value,
    ) -> EvalResult<Value> {
        self.accessor.set(ctx, el_ctx, scope, value)
    }

    fn known_ingress_type(&self) -> Option<ValueType> {
        self.types.ingress()
    }

    fn known_egress_type(&self) -> ValueType {
        self.types.egress()
    }

    fn is_convertable_ingress_egress(&self) -> bool {
        self.types.is_convertable()
    }

    fn node_expr(&self) -> String {
        self.expr.clone()
    }
}
