//! Reducible expression nodes
//!
//! The compiled form of an expression is a tree of [`Node`]s. Reducing a
//! node evaluates it against a context value, a `this` value and a
//! variable scope. Property paths are not modelled as nodes of their own;
//! they are delegated to accessor chains through [`Node::Access`].

mod expr;
mod loops;

pub use expr::{IndexedPrefixIncNode, RegexMatchNode, TypeCast};
pub use loops::{expect_type, DoNode, DoUntilNode};

use coercion::ConversionRegistry;
use core_types::{EvalError, EvalResult, Value, ValueType};
use std::fmt;
use std::sync::Arc;

use crate::accessor::Accessor;
use crate::math::{self, Operator};
use crate::scope::VariableScope;
use crate::statement::ExecutableStatement;

/// A reducible expression node
pub enum Node {
    /// Constant
    Literal(Value),
    /// The `this` value
    This,
    /// Scope variable read
    Var(String),
    /// Property path evaluated by an accessor chain against the context
    Access {
        /// Source text of the path
        expr: String,
        /// The chain (or a tiered wrapper around one)
        chain: Arc<dyn Accessor>,
    },
    /// `name = value`
    Assign {
        /// Target variable
        name: String,
        /// Assigned expression
        value: Box<Node>,
    },
    /// Statements evaluated in order; yields the last value
    Block(Vec<Node>),
    /// `lhs op rhs`
    BinaryOp {
        /// Operator
        op: Operator,
        /// Left operand
        lhs: Box<Node>,
        /// Right operand
        rhs: Box<Node>,
    },
    /// `(Type) expr`
    TypeCast(TypeCast),
    /// `subject ~= pattern`
    RegexMatch(RegexMatchNode),
    /// `++i` on an indexed variable
    IndexedPrefixInc(IndexedPrefixIncNode),
    /// `do { .. } while (cond)`
    Do(DoNode),
    /// `do { .. } until (cond)`
    DoUntil(DoUntilNode),
    /// An already compiled sub-statement
    Statement(Arc<dyn ExecutableStatement>),
}

impl Node {
    /// Constant node
    pub fn literal(value: impl Into<Value>) -> Self {
        Node::Literal(value.into())
    }

    /// Variable read
    pub fn var(name: impl Into<String>) -> Self {
        Node::Var(name.into())
    }

    /// Accessor-chain node
    pub fn access(expr: impl Into<String>, chain: Arc<dyn Accessor>) -> Self {
        Node::Access {
            expr: expr.into(),
            chain,
        }
    }

    /// Assignment node
    pub fn assign(name: impl Into<String>, value: Node) -> Self {
        Node::Assign {
            name: name.into(),
            value: Box::new(value),
        }
    }

    /// Binary operation node
    pub fn binary(op: Operator, lhs: Node, rhs: Node) -> Self {
        Node::BinaryOp {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Explicit cast node
    pub fn cast(target: ValueType, node: Node, registry: Arc<ConversionRegistry>) -> Self {
        Node::TypeCast(TypeCast::new(target, node, registry))
    }

    /// Evaluate the node
    pub fn reduce(&self, ctx: &Value, this: &Value, scope: &dyn VariableScope) -> EvalResult<Value> {
        match self {
            Node::Literal(value) => Ok(value.clone()),
            Node::This => Ok(this.clone()),
            Node::Var(name) => scope
                .get_resolver(name)
                .map(|resolver| resolver.get_value())
                .ok_or_else(|| EvalError::context_shape(format!("unresolvable variable: {}", name))),
            Node::Access { chain, .. } => chain.get(ctx, this, scope),
            Node::Assign { name, value } => {
                let value = value.reduce(ctx, this, scope)?;
                scope.create_variable(name, value.clone());
                Ok(value)
            }
            Node::Block(nodes) => {
                let mut last = Value::Null;
                for node in nodes {
                    last = node.reduce(ctx, this, scope)?;
                }
                Ok(last)
            }
            Node::BinaryOp { op, lhs, rhs } => {
                let left = lhs.reduce(ctx, this, scope)?;
                match (op, left.as_bool()) {
                    (Operator::And, Some(false)) => return Ok(Value::Boolean(false)),
                    (Operator::Or, Some(true)) => return Ok(Value::Boolean(true)),
                    _ => {}
                }
                let right = rhs.reduce(ctx, this, scope)?;
                math::apply(*op, &left, &right)
            }
            Node::TypeCast(cast) => cast.reduce(ctx, this, scope),
            Node::RegexMatch(node) => node.reduce(ctx, this, scope),
            Node::IndexedPrefixInc(node) => node.reduce(scope),
            Node::Do(node) => node.reduce(ctx, this, scope),
            Node::DoUntil(node) => node.reduce(ctx, this, scope),
            Node::Statement(statement) => statement.get_value(ctx, this, scope),
        }
    }

    /// Write `value` through the node
    ///
    /// Only variables, accessor chains and compiled sub-statements are
    /// assignable.
    pub fn assign_value(
        &self,
        ctx: &Value,
        this: &Value,
        scope: &dyn VariableScope,
        value: Value,
    ) -> EvalResult<Value> {
        match self {
            Node::Var(name) => {
                scope.create_variable(name, value.clone());
                Ok(value)
            }
            Node::Access { chain, .. } => chain.set(ctx, this, scope, value),
            Node::Statement(statement) => statement.set_value(ctx, this, scope, value),
            other => Err(EvalError::assignment(format!("cannot assign to: {}", other))),
        }
    }

    /// Statically known type of the reduced value
    pub fn egress_type(&self) -> ValueType {
        match self {
            Node::Literal(value) => value.value_type(),
            Node::This | Node::Var(_) => ValueType::Unknown,
            Node::Access { chain, .. } => chain.egress_type(),
            Node::Assign { value, .. } => value.egress_type(),
            Node::Block(nodes) => nodes.last().map_or(ValueType::Null, Node::egress_type),
            Node::BinaryOp { op, lhs, rhs } => {
                math::result_type(*op, lhs.egress_type(), rhs.egress_type())
            }
            Node::TypeCast(cast) => cast.target(),
            Node::RegexMatch(_) => ValueType::Boolean,
            Node::IndexedPrefixInc(node) => node.egress_type(),
            Node::Do(_) | Node::DoUntil(_) => ValueType::Null,
            Node::Statement(statement) => statement.known_egress_type(),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Literal(Value::String(s)) => write!(f, "'{}'", s),
            Node::Literal(value) => write!(f, "{}", value),
            Node::This => write!(f, "this"),
            Node::Var(name) => write!(f, "{}", name),
            Node::Access { expr, .. } => write!(f, "{}", expr),
            Node::Assign { name, value } => write!(f, "{} = {}", name, value),
            Node::Block(nodes) => {
                let parts: Vec<String> = nodes.iter().map(|n| n.to_string()).collect();
                write!(f, "{}", parts.join("; "))
            }
            Node::BinaryOp { op, lhs, rhs } => write!(f, "{} {} {}", lhs, op, rhs),
            Node::TypeCast(cast) => write!(f, "({}) {}", cast.target(), cast.node()),
            Node::RegexMatch(node) => write!(f, "{} ~= {}", node.subject(), node.pattern()),
            Node::IndexedPrefixInc(node) => write!(f, "++#{}", node.register()),
            Node::Do(node) => write!(f, "do {{ {} }} while ({})", node.block().node_expr(), node.condition().node_expr()),
            Node::DoUntil(node) => write!(f, "do {{ {} }} until ({})", node.block().node_expr(), node.condition().node_expr()),
            Node::Statement(statement) => write!(f, "{}", statement.node_expr()),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self)
    }
}
