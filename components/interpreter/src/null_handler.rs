//! Substitutes for null read results

use core_types::{EvalResult, Value};

use crate::scope::VariableScope;

/// Supplies a replacement when a property read or method call yields
/// `Null`.
pub trait PropertyHandler: Send + Sync {
    /// Produce the substitute for property (or method) `name` read from
    /// `ctx`
    fn get_property(&self, name: &str, ctx: &Value, scope: &dyn VariableScope) -> EvalResult<Value>;
}

/// Always substitutes the same value
#[derive(Debug, Clone)]
pub struct DefaultValue(pub Value);

impl PropertyHandler for DefaultValue {
    fn get_property(&self, _name: &str, _ctx: &Value, _scope: &dyn VariableScope) -> EvalResult<Value> {
        Ok(self.0.clone())
    }
}

/// Substitutes the value of the scope variable named like the property,
/// or `Null` when there is none
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeFallback;

impl PropertyHandler for ScopeFallback {
    fn get_property(&self, name: &str, _ctx: &Value, scope: &dyn VariableScope) -> EvalResult<Value> {
        Ok(scope
            .get_resolver(name)
            .map(|resolver| resolver.get_value())
            .unwrap_or(Value::Null))
    }
}
