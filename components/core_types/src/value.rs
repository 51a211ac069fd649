//! Dynamic value representation.
//!
//! This module provides the [`Value`] enum that every accessor, statement and
//! converter passes around, together with [`ValueType`], the static type tag
//! used for egress/ingress types and for coercion lookups.

use num_bigint::BigInt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::object::Instance;

/// Shared, lockable key-value mapping.
pub type MapRef = Arc<RwLock<HashMap<Value, Value>>>;

/// Shared, lockable list.
pub type ListRef = Arc<RwLock<Vec<Value>>>;

/// Shared host object instance.
pub type ObjectRef = Arc<Instance>;

/// Static type tag of a value.
///
/// `Object` is the top type: every value is assignable to it. `Unknown` is
/// used for egress types that cannot be determined at compile time and is
/// treated like `Object` for assignability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// The absent value
    Null,
    /// `true` / `false`
    Boolean,
    /// 8-bit signed integer
    Byte,
    /// 16-bit signed integer
    Short,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// 32-bit IEEE 754 float
    Float,
    /// 64-bit IEEE 754 float
    Double,
    /// Unicode scalar value
    Char,
    /// Text
    String,
    /// Arbitrary precision integer
    BigInt,
    /// Key-value mapping
    Map,
    /// Ordered list
    List,
    /// Any value, including host object instances
    Object,
    /// Statically unknown
    Unknown,
}

impl ValueType {
    /// Whether a value of type `source` can be used where `self` is expected
    /// without any conversion.
    ///
    /// `Null` is assignable everywhere; `Object` and `Unknown` accept
    /// everything; otherwise the types must be identical.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::ValueType;
    ///
    /// assert!(ValueType::Int.is_assignable_from(ValueType::Int));
    /// assert!(ValueType::Object.is_assignable_from(ValueType::String));
    /// assert!(!ValueType::Int.is_assignable_from(ValueType::Long));
    /// ```
    pub fn is_assignable_from(self, source: ValueType) -> bool {
        self == source
            || source == ValueType::Null
            || matches!(self, ValueType::Object | ValueType::Unknown)
    }

    /// Whether this is one of the numeric types
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ValueType::Byte
                | ValueType::Short
                | ValueType::Int
                | ValueType::Long
                | ValueType::Float
                | ValueType::Double
                | ValueType::BigInt
        )
    }

    /// Type name used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Null => "Null",
            ValueType::Boolean => "Boolean",
            ValueType::Byte => "Byte",
            ValueType::Short => "Short",
            ValueType::Int => "Int",
            ValueType::Long => "Long",
            ValueType::Float => "Float",
            ValueType::Double => "Double",
            ValueType::Char => "Char",
            ValueType::String => "String",
            ValueType::BigInt => "BigInt",
            ValueType::Map => "Map",
            ValueType::List => "List",
            ValueType::Object => "Object",
            ValueType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Represents any runtime value of the expression language.
///
/// Containers (`Map`, `List`, `Object`) are shared handles: cloning the value
/// clones the handle, and equality between containers is identity.
///
/// # Examples
///
/// ```
/// use core_types::{Value, ValueType};
///
/// let number = Value::Int(42);
/// assert_eq!(number.value_type(), ValueType::Int);
/// assert_eq!(number.to_string(), "42");
///
/// let map = Value::map([(Value::from("a"), Value::Int(1))]);
/// assert_eq!(map.value_type(), ValueType::Map);
/// ```
#[derive(Clone)]
pub enum Value {
    /// The absent value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 8-bit signed integer
    Byte(i8),
    /// 16-bit signed integer
    Short(i16),
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 32-bit float
    Float(f32),
    /// 64-bit float
    Double(f64),
    /// Single character
    Char(char),
    /// Text value
    String(String),
    /// Arbitrary precision integer
    BigInt(BigInt),
    /// Shared key-value mapping
    Map(MapRef),
    /// Shared list
    List(ListRef),
    /// Host object instance
    Object(ObjectRef),
}

impl Value {
    /// Build a map value from key-value pairs
    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Value::Map(Arc::new(RwLock::new(entries.into_iter().collect())))
    }

    /// Build an empty map value
    pub fn empty_map() -> Self {
        Value::Map(Arc::new(RwLock::new(HashMap::new())))
    }

    /// Build a list value
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(Arc::new(RwLock::new(items.into_iter().collect())))
    }

    /// Wrap a host object instance
    pub fn object(instance: Instance) -> Self {
        Value::Object(Arc::new(instance))
    }

    /// The runtime type tag of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Byte(_) => ValueType::Byte,
            Value::Short(_) => ValueType::Short,
            Value::Int(_) => ValueType::Int,
            Value::Long(_) => ValueType::Long,
            Value::Float(_) => ValueType::Float,
            Value::Double(_) => ValueType::Double,
            Value::Char(_) => ValueType::Char,
            Value::String(_) => ValueType::String,
            Value::BigInt(_) => ValueType::BigInt,
            Value::Map(_) => ValueType::Map,
            Value::List(_) => ValueType::List,
            Value::Object(_) => ValueType::Object,
        }
    }

    /// Runtime type name, using the class name for host objects
    pub fn type_name(&self) -> String {
        match self {
            Value::Object(instance) => instance.class().name().to_string(),
            other => other.value_type().name().to_string(),
        }
    }

    /// Returns true for [`Value::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The boolean payload, if this is a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The host object, if this is one
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// The map handle, if this is a map
    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Value::Byte(n) => f.debug_tuple("Byte").field(n).finish(),
            Value::Short(n) => f.debug_tuple("Short").field(n).finish(),
            Value::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Value::Long(n) => f.debug_tuple("Long").field(n).finish(),
            Value::Float(n) => f.debug_tuple("Float").field(n).finish(),
            Value::Double(n) => f.debug_tuple("Double").field(n).finish(),
            Value::Char(c) => f.debug_tuple("Char").field(c).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::BigInt(n) => f.debug_tuple("BigInt").field(n).finish(),
            Value::Map(map) => f.debug_map().entries(map.read().iter()).finish(),
            Value::List(list) => f.debug_list().entries(list.read().iter()).finish(),
            Value::Object(instance) => write!(f, "Object({})", instance.class().name()),
        }
    }
}

/// Equality is structural for scalars and identity for containers.
///
/// Floating point payloads compare by bit pattern so that values can serve
/// as map keys (`NaN` equals itself, `0.0` differs from `-0.0`).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(b) => b.hash(state),
            Value::Byte(n) => n.hash(state),
            Value::Short(n) => n.hash(state),
            Value::Int(n) => n.hash(state),
            Value::Long(n) => n.hash(state),
            Value::Float(n) => n.to_bits().hash(state),
            Value::Double(n) => n.to_bits().hash(state),
            Value::Char(c) => c.hash(state),
            Value::String(s) => s.hash(state),
            Value::BigInt(n) => n.hash(state),
            Value::Map(map) => (Arc::as_ptr(map) as *const () as usize).hash(state),
            Value::List(list) => (Arc::as_ptr(list) as *const () as usize).hash(state),
            Value::Object(instance) => (Arc::as_ptr(instance) as *const () as usize).hash(state),
        }
    }
}

/// Textual rendering, used by string conversion and the generic
/// stringify-then-parse coercion fallback.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Byte(n) => write!(f, "{}", n),
            Value::Short(n) => write!(f, "{}", n),
            Value::Int(n) => write!(f, "{}", n),
            Value::Long(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Double(n) => write!(f, "{}", n),
            Value::Char(c) => write!(f, "{}", c),
            Value::String(s) => write!(f, "{}", s),
            Value::BigInt(n) => write!(f, "{}", n),
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.read().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::List(list) => {
                write!(f, "[")?;
                for (i, item) in list.read().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(instance) => write!(f, "{}", instance),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
