//! Target-type keyed registry of conversion handlers.

use core_types::{Value, ValueType};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ConversionError;
use crate::handler::ConversionHandler;
use crate::targets;

/// Lookup from target type to the handler producing it.
///
/// Built once and shared read-only (typically behind an `Arc`) by every
/// call site that needs argument coercion.
///
/// # Examples
///
/// ```
/// use coercion::ConversionRegistry;
/// use core_types::{Value, ValueType};
///
/// let registry = ConversionRegistry::new();
/// assert_eq!(registry.convert(&Value::from("7"), ValueType::Long).unwrap(), Value::Long(7));
/// assert!(registry.can_convert(ValueType::Int, ValueType::String));
/// assert!(!registry.can_convert(ValueType::Char, ValueType::Double));
/// ```
#[derive(Clone)]
pub struct ConversionRegistry {
    handlers: HashMap<ValueType, Arc<dyn ConversionHandler>>,
}

impl ConversionRegistry {
    /// Registry with the standard handler for every primitive target
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for table in targets::standard_tables() {
            registry.register(Arc::new(table));
        }
        registry
    }

    /// Registry without any handlers
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Install `handler`, replacing any previous handler for its target
    pub fn register(&mut self, handler: Arc<dyn ConversionHandler>) {
        self.handlers.insert(handler.target(), handler);
    }

    /// Handler producing `target`, if one is registered
    pub fn handler(&self, target: ValueType) -> Option<&Arc<dyn ConversionHandler>> {
        self.handlers.get(&target)
    }

    /// Whether a value of type `source` can be turned into `target`,
    /// either because it is already assignable or because a converter
    /// exists. Performs no conversion.
    pub fn can_convert(&self, target: ValueType, source: ValueType) -> bool {
        target.is_assignable_from(source)
            || self
                .handlers
                .get(&target)
                .is_some_and(|handler| handler.can_convert_from(source))
    }

    /// Convert `value` to `target`.
    ///
    /// Null passes through unchanged, as does any value already assignable
    /// to `target`.
    pub fn convert(&self, value: &Value, target: ValueType) -> Result<Value, ConversionError> {
        if target.is_assignable_from(value.value_type()) {
            return Ok(value.clone());
        }
        match self.handlers.get(&target) {
            Some(handler) => handler.convert_from(value),
            None => Err(ConversionError::Unsupported {
                from: value.type_name(),
                target,
            }),
        }
    }

    /// Convert every argument to the corresponding parameter type
    pub fn convert_all(
        &self,
        args: &[Value],
        parameter_types: &[ValueType],
    ) -> Result<Vec<Value>, ConversionError> {
        args.iter()
            .zip(parameter_types)
            .map(|(arg, target)| self.convert(arg, *target))
            .collect()
    }
}

impl Default for ConversionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConversionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut targets: Vec<&'static str> = self.handlers.keys().map(|t| t.name()).collect();
        targets.sort_unstable();
        f.debug_struct("ConversionRegistry")
            .field("targets", &targets)
            .finish()
    }
}
