//! Per-target conversion tables.

use core_types::{Value, ValueType};
use std::collections::HashMap;
use std::fmt;

use crate::error::ConversionError;

/// Converts a value of one specific source type into the table's target.
pub type Converter = fn(&Value) -> Result<Value, ConversionError>;

/// Converts values into a single target type.
pub trait ConversionHandler: Send + Sync {
    /// The type every successful conversion produces
    fn target(&self) -> ValueType;

    /// Convert `value` to [`ConversionHandler::target`]
    fn convert_from(&self, value: &Value) -> Result<Value, ConversionError>;

    /// Whether values of type `source` are accepted
    fn can_convert_from(&self, source: ValueType) -> bool;
}

/// A [`ConversionHandler`] backed by a source-type to converter map.
///
/// The `Object` entry, when present, doubles as the fallback for maps,
/// lists and host objects that have no entry of their own.
///
/// # Examples
///
/// ```
/// use coercion::{ConversionHandler, ConversionTable};
/// use core_types::{Value, ValueType};
///
/// let table = ConversionTable::new(ValueType::Int)
///     .with(ValueType::Boolean, |v| Ok(Value::Int(i32::from(v.as_bool() == Some(true)))));
///
/// assert!(table.can_convert_from(ValueType::Boolean));
/// assert_eq!(table.convert_from(&Value::Boolean(true)).unwrap(), Value::Int(1));
/// ```
#[derive(Clone)]
pub struct ConversionTable {
    target: ValueType,
    converters: HashMap<ValueType, Converter>,
}

impl ConversionTable {
    /// Empty table producing `target`
    pub fn new(target: ValueType) -> Self {
        Self {
            target,
            converters: HashMap::new(),
        }
    }

    /// Register `converter` for inputs of type `source`
    pub fn with(mut self, source: ValueType, converter: Converter) -> Self {
        self.converters.insert(source, converter);
        self
    }

    /// Register the same converter for several source types
    pub fn with_all(mut self, sources: &[ValueType], converter: Converter) -> Self {
        for source in sources {
            self.converters.insert(*source, converter);
        }
        self
    }

    /// Source types with a dedicated entry
    pub fn sources(&self) -> impl Iterator<Item = ValueType> + '_ {
        self.converters.keys().copied()
    }

    fn lookup(&self, source: ValueType) -> Option<Converter> {
        self.converters.get(&source).copied().or_else(|| {
            if matches!(source, ValueType::Map | ValueType::List | ValueType::Object) {
                self.converters.get(&ValueType::Object).copied()
            } else {
                None
            }
        })
    }
}

impl ConversionHandler for ConversionTable {
    fn target(&self) -> ValueType {
        self.target
    }

    fn convert_from(&self, value: &Value) -> Result<Value, ConversionError> {
        match self.lookup(value.value_type()) {
            Some(converter) => converter(value),
            None => Err(ConversionError::Unsupported {
                from: value.type_name(),
                target: self.target,
            }),
        }
    }

    fn can_convert_from(&self, source: ValueType) -> bool {
        self.lookup(source).is_some()
    }
}

impl fmt::Debug for ConversionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sources: Vec<&'static str> = self.converters.keys().map(|t| t.name()).collect();
        sources.sort_unstable();
        f.debug_struct("ConversionTable")
            .field("target", &self.target)
            .field("sources", &sources)
            .finish()
    }
}
