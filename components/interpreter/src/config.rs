//! Reusable parser configuration
//!
//! A [`ParserConfiguration`] is shared by every compilation that uses it.
//! It owns the import table (classes, static method handles and constant
//! values under short names), the list of package imports, and the class
//! path that package imports are resolved against.
//!
//! Resolving a bare name through the package imports is comparatively
//! expensive, so names that resolved to nothing are remembered in a
//! bounded negative cache. The cache evicts its oldest entry first.

use core_types::{Class, EvalError, EvalResult, Method, Value};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Upper bound of remembered failed lookups
pub const NEGATIVE_CACHE_CAPACITY: usize = 1000;

/// A static method imported under a short name
#[derive(Debug, Clone)]
pub struct MethodStub {
    method: Arc<Method>,
}

impl MethodStub {
    /// Wrap a method handle
    pub fn new(method: Arc<Method>) -> Self {
        Self { method }
    }

    /// The wrapped method
    pub fn method(&self) -> &Arc<Method> {
        &self.method
    }

    /// Call the method without a receiver
    pub fn call(&self, args: &[Value]) -> EvalResult<Value> {
        Ok(self.method.invoke(&Value::Null, args)?)
    }
}

/// Something a short name can be imported as
#[derive(Debug, Clone)]
pub enum Import {
    /// A class
    Class(Arc<Class>),
    /// A static method
    Method(MethodStub),
    /// A constant value
    Value(Value),
}

/// Classes known by their fully qualified name (`pkg.sub.Name`)
#[derive(Debug, Default)]
pub struct ClassPath {
    classes: HashMap<String, Arc<Class>>,
}

impl ClassPath {
    /// Empty class path
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `class` loadable under its own name
    pub fn register(&mut self, class: Arc<Class>) {
        self.classes.insert(class.name().to_string(), class);
    }

    /// Make `class` loadable under `qualified_name`
    pub fn register_as(&mut self, qualified_name: impl Into<String>, class: Arc<Class>) {
        self.classes.insert(qualified_name.into(), class);
    }

    /// Look a class up by fully qualified name
    pub fn load(&self, qualified_name: &str) -> Option<Arc<Class>> {
        self.classes.get(qualified_name).cloned()
    }

    /// Number of loadable classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether nothing is loadable
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Names that failed dynamic resolution, oldest first
#[derive(Debug, Default)]
struct NegativeCache {
    order: VecDeque<String>,
    members: HashSet<String>,
}

impl NegativeCache {
    fn contains(&self, name: &str) -> bool {
        self.members.contains(name)
    }

    fn insert(&mut self, name: &str) {
        if self.members.contains(name) {
            return;
        }
        if self.order.len() > NEGATIVE_CACHE_CAPACITY {
            if let Some(evicted) = self.order.pop_front() {
                debug!(name = %evicted, "negative import cache eviction");
                self.members.remove(&evicted);
            }
        }
        self.order.push_back(name.to_string());
        self.members.insert(name.to_string());
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }
}

/// Import table and flags shared between compilations
pub struct ParserConfiguration {
    imports: RwLock<HashMap<String, Import>>,
    package_imports: RwLock<Vec<String>>,
    class_path: RwLock<ClassPath>,
    negative_cache: Mutex<NegativeCache>,
    null_safe: bool,
}

impl Default for ParserConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserConfiguration {
    /// Configuration without imports; null safety off
    pub fn new() -> Self {
        Self {
            imports: RwLock::new(HashMap::new()),
            package_imports: RwLock::new(Vec::new()),
            class_path: RwLock::new(ClassPath::new()),
            negative_cache: Mutex::new(NegativeCache::default()),
            null_safe: false,
        }
    }

    /// Use `class_path` for dynamic imports
    pub fn with_class_path(self, class_path: ClassPath) -> Self {
        *self.class_path.write() = class_path;
        self
    }

    /// Treat property reads on `Null` as yielding `Null`
    pub fn with_null_safe(mut self, null_safe: bool) -> Self {
        self.null_safe = null_safe;
        self
    }

    /// Whether property reads on `Null` yield `Null`
    ///
    /// Applied to the property steps built through
    /// [`ParserContext::property_accessor`](crate::ParserContext::property_accessor).
    pub fn is_null_safe(&self) -> bool {
        self.null_safe
    }

    /// Make another class loadable for dynamic imports
    pub fn register_class(&self, qualified_name: impl Into<String>, class: Arc<Class>) {
        self.class_path.write().register_as(qualified_name, class);
    }

    /// Import `class` under the last segment of its name
    pub fn add_class_import(&self, class: Arc<Class>) {
        let name = simple_name(class.name()).to_string();
        self.add_import(name, Import::Class(class));
    }

    /// Import a static method under `name`
    pub fn add_method_import(&self, name: impl Into<String>, method: Arc<Method>) {
        self.add_import(name, Import::Method(MethodStub::new(method)));
    }

    /// Import a constant under `name`
    pub fn add_value_import(&self, name: impl Into<String>, value: Value) {
        self.add_import(name, Import::Value(value));
    }

    /// Import anything under `name`, replacing a previous import
    pub fn add_import(&self, name: impl Into<String>, import: Import) {
        self.imports.write().insert(name.into(), import);
    }

    /// Import every entry of `imports`
    pub fn add_all_imports(&self, imports: impl IntoIterator<Item = (String, Import)>) {
        self.imports.write().extend(imports);
    }

    /// Add a package to search dynamic imports in
    ///
    /// When the name is itself a class on the class path, that class's
    /// public constants are imported as values as well.
    pub fn add_package_import(&self, package: impl Into<String>) {
        let package = package.into();
        if let Some(class) = self.class_path.read().load(&package) {
            let mut imports = self.imports.write();
            for (name, value) in class.constants() {
                imports.insert(name.clone(), Import::Value(value.clone()));
            }
        }
        let mut packages = self.package_imports.write();
        if !packages.contains(&package) {
            packages.push(package);
        }
    }

    /// Package imports, in insertion order
    pub fn package_imports(&self) -> Vec<String> {
        self.package_imports.read().clone()
    }

    /// Whether anything has been imported at all
    pub fn has_imports(&self) -> bool {
        !self.imports.read().is_empty() || !self.package_imports.read().is_empty()
    }

    /// Whether `name` is imported, resolving it through the package
    /// imports if it is not imported yet
    ///
    /// A name found in more than one package is an ambiguity error.
    pub fn has_import(&self, name: &str) -> EvalResult<bool> {
        if self.imports.read().contains_key(name) {
            return Ok(true);
        }
        self.check_for_dynamic_import(name)
    }

    /// Imported class named `name`
    pub fn get_import(&self, name: &str) -> Option<Arc<Class>> {
        match self.imports.read().get(name) {
            Some(Import::Class(class)) => Some(Arc::clone(class)),
            _ => None,
        }
    }

    /// Imported static method named `name`
    pub fn get_static_import(&self, name: &str) -> Option<MethodStub> {
        match self.imports.read().get(name) {
            Some(Import::Method(stub)) => Some(stub.clone()),
            _ => None,
        }
    }

    /// Whatever is imported under `name`
    pub fn get_static_or_class_import(&self, name: &str) -> Option<Import> {
        self.imports.read().get(name).cloned()
    }

    /// Forget every failed dynamic lookup
    pub fn flush_caches(&self) {
        self.negative_cache.lock().clear();
    }

    /// Number of remembered failed lookups
    pub fn negative_cache_len(&self) -> usize {
        self.negative_cache.lock().len()
    }

    /// Whether `name` is remembered as unresolvable
    pub fn is_known_unresolvable(&self, name: &str) -> bool {
        self.negative_cache.lock().contains(name)
    }

    fn check_for_dynamic_import(&self, name: &str) -> EvalResult<bool> {
        let packages = self.package_imports.read().clone();
        if packages.is_empty() {
            return Ok(false);
        }
        match name.chars().next() {
            Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
            _ => return Ok(false),
        }
        if self.negative_cache.lock().contains(name) {
            return Ok(false);
        }

        let found: Vec<Arc<Class>> = {
            let class_path = self.class_path.read();
            packages
                .iter()
                .filter_map(|package| class_path.load(&format!("{}.{}", package, name)))
                .collect()
        };

        match found.as_slice() {
            [] => {
                self.negative_cache.lock().insert(name);
                Ok(false)
            }
            [class] => {
                self.add_import(name, Import::Class(Arc::clone(class)));
                Ok(true)
            }
            _ => Err(EvalError::ambiguity(format!("ambiguous class name: {}", name))),
        }
    }
}

impl fmt::Debug for ParserConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserConfiguration")
            .field("imports", &self.imports.read().len())
            .field("package_imports", &*self.package_imports.read())
            .field("null_safe", &self.null_safe)
            .finish()
    }
}

fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}
