//! Host object model.
//!
//! Host applications expose their data to expressions as [`Instance`]s of a
//! [`Class`]. A class declares typed fields, public [`Method`]s and public
//! constants. Method handles emulate reflective dispatch: [`Method::invoke`]
//! rejects arguments whose runtime type is not assignable to the declared
//! parameter type before the native body ever runs.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::{EvalError, Value, ValueType};

/// Native body of a method: `(receiver, arguments) -> result`.
pub type NativeFn = Arc<dyn Fn(&Value, &[Value]) -> Result<Value, EvalError> + Send + Sync>;

/// Custom text rendering for instances of a class.
pub type DisplayFn = Arc<dyn Fn(&Instance) -> String + Send + Sync>;

/// Failure of a reflective method call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InvokeError {
    /// An argument's runtime type is not assignable to the parameter type
    #[error("argument {index} of {method}: expected {expected}, found {found}")]
    ArgumentMismatch {
        /// Signature of the method
        method: String,
        /// Zero-based argument position
        index: usize,
        /// Declared parameter type
        expected: ValueType,
        /// Runtime type of the supplied argument
        found: ValueType,
    },
    /// Wrong number of arguments
    #[error("{method} takes {expected} argument(s), {found} supplied")]
    ArgumentCount {
        /// Signature of the method
        method: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        found: usize,
    },
    /// The method body itself failed
    #[error("{method} failed: {source}")]
    Failed {
        /// Signature of the method
        method: String,
        /// Error raised by the body
        #[source]
        source: EvalError,
    },
}

impl InvokeError {
    /// Whether the failure is an argument type/count mismatch
    pub fn is_argument_mismatch(&self) -> bool {
        matches!(
            self,
            InvokeError::ArgumentMismatch { .. } | InvokeError::ArgumentCount { .. }
        )
    }
}

impl From<InvokeError> for EvalError {
    fn from(err: InvokeError) -> Self {
        let message = err.to_string();
        match err {
            InvokeError::Failed { source, .. } => EvalError::invocation(message).caused_by(source),
            _ => EvalError::invocation(message),
        }
    }
}

/// A public method of a host class.
pub struct Method {
    name: String,
    declaring_class: String,
    parameter_types: Vec<ValueType>,
    return_type: ValueType,
    body: NativeFn,
}

impl Method {
    /// Create a method handle
    pub fn new(
        name: impl Into<String>,
        declaring_class: impl Into<String>,
        parameter_types: Vec<ValueType>,
        return_type: ValueType,
        body: NativeFn,
    ) -> Self {
        Self {
            name: name.into(),
            declaring_class: declaring_class.into(),
            parameter_types,
            return_type,
            body,
        }
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the class that declares this method
    pub fn declaring_class(&self) -> &str {
        &self.declaring_class
    }

    /// Declared parameter types
    pub fn parameter_types(&self) -> &[ValueType] {
        &self.parameter_types
    }

    /// Declared return type
    pub fn return_type(&self) -> ValueType {
        self.return_type
    }

    /// `Class.name(Type, Type)` form used in diagnostics
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.parameter_types.iter().map(|t| t.name()).collect();
        format!("{}.{}({})", self.declaring_class, self.name, params.join(", "))
    }

    /// Invoke the method on `receiver` with already evaluated arguments.
    ///
    /// Arguments are passed untouched; any argument that is not assignable
    /// to its parameter type yields [`InvokeError::ArgumentMismatch`].
    pub fn invoke(&self, receiver: &Value, args: &[Value]) -> Result<Value, InvokeError> {
        if args.len() != self.parameter_types.len() {
            return Err(InvokeError::ArgumentCount {
                method: self.signature(),
                expected: self.parameter_types.len(),
                found: args.len(),
            });
        }

        for (index, (expected, arg)) in self.parameter_types.iter().zip(args).enumerate() {
            if !expected.is_assignable_from(arg.value_type()) {
                return Err(InvokeError::ArgumentMismatch {
                    method: self.signature(),
                    index,
                    expected: *expected,
                    found: arg.value_type(),
                });
            }
        }

        (self.body)(receiver, args).map_err(|source| InvokeError::Failed {
            method: self.signature(),
            source,
        })
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("signature", &self.signature())
            .field("return_type", &self.return_type)
            .finish()
    }
}

/// A host class: named, optionally derived from a parent class.
pub struct Class {
    name: String,
    parent: Option<Arc<Class>>,
    fields: Vec<(String, ValueType)>,
    methods: Vec<Arc<Method>>,
    constants: Vec<(String, Value)>,
    display: Option<DisplayFn>,
}

impl Class {
    /// Start building a class called `name`
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder {
            class: Class {
                name: name.into(),
                parent: None,
                fields: Vec::new(),
                methods: Vec::new(),
                constants: Vec::new(),
                display: None,
            },
        }
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent class, if any
    pub fn parent(&self) -> Option<&Arc<Class>> {
        self.parent.as_ref()
    }

    /// Whether this class is `name` or derives from it
    pub fn is_subclass_of(&self, name: &str) -> bool {
        self.name == name || self.parent.as_ref().is_some_and(|p| p.is_subclass_of(name))
    }

    /// Declared type of field `name`, searching parent classes
    pub fn field_type(&self, name: &str) -> Option<ValueType> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| *t)
            .or_else(|| self.parent.as_ref().and_then(|p| p.field_type(name)))
    }

    /// All declared fields, own fields first
    pub fn all_fields(&self) -> Vec<(String, ValueType)> {
        let mut fields = self.fields.clone();
        if let Some(parent) = &self.parent {
            for (name, ty) in parent.all_fields() {
                if !fields.iter().any(|(n, _)| *n == name) {
                    fields.push((name, ty));
                }
            }
        }
        fields
    }

    /// Public methods, own methods first, then inherited methods that are
    /// not overridden (same name and parameter types).
    pub fn methods(&self) -> Vec<Arc<Method>> {
        let mut methods = self.methods.clone();
        if let Some(parent) = &self.parent {
            for inherited in parent.methods() {
                let overridden = methods.iter().any(|m| {
                    m.name() == inherited.name() && m.parameter_types() == inherited.parameter_types()
                });
                if !overridden {
                    methods.push(inherited);
                }
            }
        }
        methods
    }

    /// Find a method by exact name and parameter types
    pub fn find_method(&self, name: &str, parameter_types: &[ValueType]) -> Option<Arc<Method>> {
        self.methods()
            .into_iter()
            .find(|m| m.name() == name && m.parameter_types() == parameter_types)
    }

    /// Public constants of this class
    pub fn constants(&self) -> &[(String, Value)] {
        &self.constants
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name().to_string()))
            .field("fields", &self.fields)
            .field("methods", &self.methods)
            .finish()
    }
}

/// Builder for [`Class`].
///
/// # Examples
///
/// ```
/// use core_types::{Class, Value, ValueType};
/// use std::sync::Arc;
///
/// let point = Class::builder("Point")
///     .field("x", ValueType::Int)
///     .method("twice", vec![ValueType::Int], ValueType::Int, Arc::new(|_: &Value, args: &[Value]| {
///         match &args[0] {
///             Value::Int(n) => Ok(Value::Int(n * 2)),
///             _ => Ok(Value::Null),
///         }
///     }))
///     .build();
///
/// assert_eq!(point.field_type("x"), Some(ValueType::Int));
/// assert_eq!(point.methods()[0].signature(), "Point.twice(Int)");
/// ```
pub struct ClassBuilder {
    class: Class,
}

impl ClassBuilder {
    /// Derive from `parent`
    pub fn extends(mut self, parent: Arc<Class>) -> Self {
        self.class.parent = Some(parent);
        self
    }

    /// Declare a field
    pub fn field(mut self, name: impl Into<String>, ty: ValueType) -> Self {
        self.class.fields.push((name.into(), ty));
        self
    }

    /// Declare a public method; the declaring class is this class
    pub fn method(
        mut self,
        name: impl Into<String>,
        parameter_types: Vec<ValueType>,
        return_type: ValueType,
        body: NativeFn,
    ) -> Self {
        let method = Method::new(name, self.class.name.clone(), parameter_types, return_type, body);
        self.class.methods.push(Arc::new(method));
        self
    }

    /// Declare a public constant
    pub fn constant(mut self, name: impl Into<String>, value: Value) -> Self {
        self.class.constants.push((name.into(), value));
        self
    }

    /// Render instances with `display` instead of the default field dump
    pub fn display(mut self, display: DisplayFn) -> Self {
        self.class.display = Some(display);
        self
    }

    /// Finish the class
    pub fn build(self) -> Arc<Class> {
        Arc::new(self.class)
    }
}

/// An instance of a host class with interior-mutable fields.
pub struct Instance {
    class: Arc<Class>,
    fields: RwLock<HashMap<String, Value>>,
}

impl Instance {
    /// Create an instance with every declared field set to `Null`
    pub fn new(class: Arc<Class>) -> Self {
        let fields = class
            .all_fields()
            .into_iter()
            .map(|(name, _)| (name, Value::Null))
            .collect();
        Self {
            class,
            fields: RwLock::new(fields),
        }
    }

    /// Set a field while building the instance
    pub fn with_field(self, name: &str, value: Value) -> Self {
        self.fields.write().insert(name.to_string(), value);
        self
    }

    /// The instance's runtime class
    pub fn class(&self) -> &Arc<Class> {
        &self.class
    }

    /// Read a declared field; `None` if the class has no such field
    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.read().get(name).cloned()
    }

    /// Write a declared field; returns false if the class has no such field
    pub fn set_field(&self, name: &str, value: Value) -> bool {
        let mut fields = self.fields.write();
        match fields.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(display) = &self.class.display {
            return f.write_str(&display(self));
        }
        write!(f, "{}{{", self.class.name)?;
        let fields = self.fields.read();
        let mut names: Vec<&String> = fields.keys().collect();
        names.sort();
        for (i, name) in names.into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, fields[name])?;
        }
        write!(f, "}}")
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name)
            .field("fields", &*self.fields.read())
            .finish()
    }
}
