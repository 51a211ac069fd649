//! Indexed pre-increment step

use core_types::{EvalError, EvalResult, Value, ValueType};

use crate::math;
use crate::scope::VariableScope;

/// Adds one to the indexed variable in `register` and returns the new value
pub fn increment_register(scope: &dyn VariableScope, register: usize) -> EvalResult<Value> {
    let resolver = scope.get_indexed_resolver(register).ok_or_else(|| {
        EvalError::context_shape(format!("no indexed variable in register {}", register))
    })?;
    let incremented = math::increment(&resolver.get_value())?;
    resolver.set_value(incremented.clone());
    Ok(incremented)
}

/// Pre-increments a register-indexed scope variable (`++i`)
#[derive(Debug, Clone, Copy)]
pub struct IndexedIncrementAccessor {
    register: usize,
    egress: ValueType,
}

impl IndexedIncrementAccessor {
    /// Step for `register`, producing values of type `egress`
    pub fn new(register: usize, egress: ValueType) -> Self {
        Self { register, egress }
    }

    /// Register index
    pub fn register(&self) -> usize {
        self.register
    }

    pub(crate) fn egress_type(&self) -> ValueType {
        self.egress
    }

    pub(crate) fn increment(&self, scope: &dyn VariableScope) -> EvalResult<Value> {
        increment_register(scope, self.register)
    }
}
