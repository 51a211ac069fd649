//! Cast, regex match and indexed increment nodes

use coercion::ConversionRegistry;
use core_types::{EvalError, EvalResult, Value, ValueType};
use std::sync::Arc;

use super::Node;
use crate::accessor::{increment_register, PatternCache};
use crate::parser_context::ParserContext;
use crate::scope::VariableScope;

/// Explicit conversion of a reduced value to `target`
pub struct TypeCast {
    target: ValueType,
    node: Box<Node>,
    registry: Arc<ConversionRegistry>,
}

impl TypeCast {
    /// Cast `node` to `target` using `registry`
    pub fn new(target: ValueType, node: Node, registry: Arc<ConversionRegistry>) -> Self {
        Self {
            target,
            node: Box::new(node),
            registry,
        }
    }

    /// Cast target type
    pub fn target(&self) -> ValueType {
        self.target
    }

    /// Operand
    pub fn node(&self) -> &Node {
        &self.node
    }

    pub(crate) fn reduce(&self, ctx: &Value, this: &Value, scope: &dyn VariableScope) -> EvalResult<Value> {
        let value = self.node.reduce(ctx, this, scope)?;
        Ok(self.registry.convert(&value, self.target)?)
    }
}

/// Whole-text regular expression match; both sides are computed at runtime
pub struct RegexMatchNode {
    subject: Box<Node>,
    pattern: Box<Node>,
    cache: PatternCache,
}

impl RegexMatchNode {
    /// Match the text of `subject` against the text of `pattern`
    pub fn new(subject: Node, pattern: Node) -> Self {
        Self {
            subject: Box::new(subject),
            pattern: Box::new(pattern),
            cache: PatternCache::new(),
        }
    }

    /// Node producing the text to test
    pub fn subject(&self) -> &Node {
        &self.subject
    }

    /// Node producing the pattern
    pub fn pattern(&self) -> &Node {
        &self.pattern
    }

    pub(crate) fn reduce(&self, ctx: &Value, this: &Value, scope: &dyn VariableScope) -> EvalResult<Value> {
        let pattern = self.pattern.reduce(ctx, this, scope)?.to_string();
        let regex = self.cache.get(&pattern)?;
        let subject = self.subject.reduce(ctx, this, scope)?.to_string();
        Ok(Value::Boolean(regex.is_match(&subject)))
    }
}

/// `++name` where `name` lives in a register of an indexed scope
#[derive(Debug, Clone, Copy)]
pub struct IndexedPrefixIncNode {
    register: usize,
    egress: ValueType,
}

impl IndexedPrefixIncNode {
    /// Node for `register`, typed after the variable the parser context
    /// assigned to that register
    pub fn new(register: usize, ctx: &ParserContext) -> EvalResult<Self> {
        let name = ctx.indexed_var_names().get(register).ok_or_else(|| {
            EvalError::compile(format!("no indexed variable for register {}", register))
        })?;
        let egress = ctx.get_var_or_input_type(name).unwrap_or(ValueType::Object);
        Ok(Self { register, egress })
    }

    /// Register index
    pub fn register(&self) -> usize {
        self.register
    }

    /// Declared type of the incremented variable
    pub fn egress_type(&self) -> ValueType {
        self.egress
    }

    pub(crate) fn reduce(&self, scope: &dyn VariableScope) -> EvalResult<Value> {
        increment_register(scope, self.register)
    }
}
