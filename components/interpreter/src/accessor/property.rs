//! Variable, property and map-entry steps

use core_types::{Class, EvalError, EvalResult, Value, ValueType};
use std::fmt;
use std::sync::Arc;

use crate::null_handler::PropertyHandler;
use crate::scope::VariableScope;

/// Reads and writes a scope variable
#[derive(Debug, Clone)]
pub struct VariableAccessor {
    name: String,
    egress: ValueType,
}

impl VariableAccessor {
    /// Untyped variable step
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            egress: ValueType::Object,
        }
    }

    /// Declare the variable's static type
    pub fn with_egress_type(mut self, ty: ValueType) -> Self {
        self.egress = ty;
        self
    }

    /// Variable name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn egress_type(&self) -> ValueType {
        self.egress
    }

    pub(crate) fn get(&self, scope: &dyn VariableScope) -> EvalResult<Value> {
        scope
            .get_resolver(&self.name)
            .map(|resolver| resolver.get_value())
            .ok_or_else(|| EvalError::context_shape(format!("unresolvable variable: {}", self.name)))
    }

    pub(crate) fn set(&self, scope: &dyn VariableScope, value: Value) -> Value {
        scope.create_variable(&self.name, value.clone());
        value
    }
}

/// Reads and writes a named property
///
/// On an object the property is a declared field; on a map it is the entry
/// keyed by the property name as a string.
#[derive(Clone)]
pub struct PropertyAccessor {
    name: String,
    egress: ValueType,
    null_safe: bool,
    null_handler: Option<Arc<dyn PropertyHandler>>,
}

impl fmt::Debug for PropertyAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyAccessor")
            .field("name", &self.name)
            .field("egress", &self.egress)
            .field("null_safe", &self.null_safe)
            .field("has_null_handler", &self.null_handler.is_some())
            .finish()
    }
}

impl PropertyAccessor {
    /// Untyped property step
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            egress: ValueType::Object,
            null_safe: false,
            null_handler: None,
        }
    }

    /// Property step for a declared field of `class`, typed by the field's
    /// declared type
    pub fn for_field(class: &Class, name: &str) -> EvalResult<Self> {
        let ty = class.field_type(name).ok_or_else(|| {
            EvalError::compile(format!("could not access property: {} on: {}", name, class.name()))
        })?;
        Ok(Self::new(name).with_egress_type(ty))
    }

    /// Declare the property's static type
    pub fn with_egress_type(mut self, ty: ValueType) -> Self {
        self.egress = ty;
        self
    }

    /// Read `Null` instead of failing when the context is `Null`
    pub fn null_safe(mut self, null_safe: bool) -> Self {
        self.null_safe = null_safe;
        self
    }

    /// Substitute `Null` read results through `handler`
    pub fn with_null_handler(mut self, handler: Arc<dyn PropertyHandler>) -> Self {
        self.null_handler = Some(handler);
        self
    }

    /// Property name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn egress_type(&self) -> ValueType {
        self.egress
    }

    pub(crate) fn get(&self, ctx: &Value, scope: &dyn VariableScope) -> EvalResult<Value> {
        let value = match ctx {
            Value::Object(instance) => instance.get_field(&self.name).ok_or_else(|| {
                EvalError::context_shape(format!(
                    "could not access property: {} on: {}",
                    self.name,
                    instance.class().name()
                ))
            })?,
            Value::Map(map) => map
                .read()
                .get(&Value::from(self.name.as_str()))
                .cloned()
                .unwrap_or(Value::Null),
            Value::Null if self.null_safe => Value::Null,
            other => {
                return Err(EvalError::context_shape(format!(
                    "could not access property: {} on: {}",
                    self.name,
                    other.type_name()
                )))
            }
        };

        match (&value, &self.null_handler) {
            (Value::Null, Some(handler)) => handler.get_property(&self.name, ctx, scope),
            _ => Ok(value),
        }
    }

    pub(crate) fn set(&self, ctx: &Value, value: Value) -> EvalResult<Value> {
        match ctx {
            Value::Object(instance) => {
                if instance.set_field(&self.name, value.clone()) {
                    Ok(value)
                } else {
                    Err(EvalError::context_shape(format!(
                        "could not assign property: {} on: {}",
                        self.name,
                        instance.class().name()
                    )))
                }
            }
            Value::Map(map) => {
                map.write().insert(Value::from(self.name.as_str()), value.clone());
                Ok(value)
            }
            other => Err(EvalError::context_shape(format!(
                "could not assign property: {} on: {}",
                self.name,
                other.type_name()
            ))),
        }
    }
}

/// Reads and writes one entry of a key-value mapping
///
/// The inbound context must be a map; anything else is a context-shape
/// error.
#[derive(Debug, Clone)]
pub struct MapEntryAccessor {
    key: Value,
}

impl MapEntryAccessor {
    /// Entry step for `key`
    pub fn new(key: Value) -> Self {
        Self { key }
    }

    /// The entry key
    pub fn key(&self) -> &Value {
        &self.key
    }

    pub(crate) fn get(&self, ctx: &Value) -> EvalResult<Value> {
        let map = self.require_map(ctx)?;
        let value = map.read().get(&self.key).cloned().unwrap_or(Value::Null);
        Ok(value)
    }

    pub(crate) fn set(&self, ctx: &Value, value: Value) -> EvalResult<Value> {
        self.require_map(ctx)?
            .write()
            .insert(self.key.clone(), value.clone());
        Ok(value)
    }

    fn require_map<'v>(&self, ctx: &'v Value) -> EvalResult<&'v core_types::MapRef> {
        ctx.as_map().ok_or_else(|| {
            EvalError::context_shape(format!(
                "map entry [{}] requires a map, found {}",
                self.key,
                ctx.type_name()
            ))
        })
    }
}
