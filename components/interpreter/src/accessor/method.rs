//! Method invocation step
//!
//! Dispatch goes through up to three stages:
//!
//! 1. Exact: arguments are evaluated and passed untouched.
//! 2. Overload: when stage 1 rejects the arguments and the receiver's class
//!    is not the method's declaring class, a public method of the
//!    receiver's class that accepts the arguments as they are is invoked
//!    instead.
//! 3. Coerced: arguments are converted to the declared parameter types
//!    through the conversion registry, then the method is invoked.
//!
//! The first argument mismatch that stage 2 cannot absorb latches the node
//! into stage 3 for the rest of its life. Later calls whose arguments would
//! match exactly still take the coerced path: the latch trades the cost of
//! a failed exact attempt on every call for an always-converting call, and
//! it is never reset.

use coercion::ConversionRegistry;
use core_types::{EvalError, EvalResult, Method, Value, ValueType};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::null_handler::PropertyHandler;
use crate::scope::VariableScope;
use crate::statement::ExecutableStatement;

#[derive(Debug, Default)]
struct DispatchCounters {
    exact: AtomicU64,
    overload: AtomicU64,
    coerced: AtomicU64,
}

/// How many calls completed through each dispatch stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSnapshot {
    /// Calls served by the exact invocation
    pub exact: u64,
    /// Calls served by an overload of the receiver's class
    pub overload: u64,
    /// Calls served after argument coercion
    pub coerced: u64,
}

/// Invokes a resolved method on the inbound context
pub struct MethodAccessor {
    method: Arc<Method>,
    params: Vec<Arc<dyn ExecutableStatement>>,
    coercion_needed: AtomicBool,
    null_handler: Option<Arc<dyn PropertyHandler>>,
    registry: Arc<ConversionRegistry>,
    counters: DispatchCounters,
}

impl MethodAccessor {
    /// Create a method step whose arguments are produced by `params`
    pub fn new(
        method: Arc<Method>,
        params: Vec<Arc<dyn ExecutableStatement>>,
        registry: Arc<ConversionRegistry>,
    ) -> Self {
        Self {
            method,
            params,
            coercion_needed: AtomicBool::new(false),
            null_handler: None,
            registry,
            counters: DispatchCounters::default(),
        }
    }

    /// Substitute `Null` results of exact and overload calls through
    /// `handler`
    pub fn with_null_handler(mut self, handler: Arc<dyn PropertyHandler>) -> Self {
        self.null_handler = Some(handler);
        self
    }

    /// The resolved method
    pub fn method(&self) -> &Arc<Method> {
        &self.method
    }

    /// Whether the coercion latch has flipped
    pub fn is_coercion_needed(&self) -> bool {
        self.coercion_needed.load(Ordering::Acquire)
    }

    /// Per-stage call counts
    pub fn dispatch_stats(&self) -> DispatchSnapshot {
        DispatchSnapshot {
            exact: self.counters.exact.load(Ordering::Relaxed),
            overload: self.counters.overload.load(Ordering::Relaxed),
            coerced: self.counters.coerced.load(Ordering::Relaxed),
        }
    }

    /// `name(arg, arg)` rendering of the call site
    pub fn invoke_name(&self) -> String {
        let args: Vec<String> = self.params.iter().map(|p| p.node_expr()).collect();
        format!("{}({})", self.method.name(), args.join(", "))
    }

    pub(crate) fn egress_type(&self) -> ValueType {
        self.method.return_type()
    }

    /// Arguments are evaluated once per call; the call that trips the latch
    /// coerces the values already evaluated for the exact attempt.
    pub(crate) fn invoke(&self, ctx: &Value, root: &Value, scope: &dyn VariableScope) -> EvalResult<Value> {
        let args = self.evaluate_args(root, scope)?;
        if self.is_coercion_needed() {
            return self.invoke_coerced(ctx, args);
        }

        trace!(method = %self.method.signature(), stage = "exact", "invoking method");
        match self.method.invoke(ctx, &args) {
            Ok(result) => {
                self.counters.exact.fetch_add(1, Ordering::Relaxed);
                self.substitute_null(self.method.name(), result, ctx, scope)
            }
            Err(err) if err.is_argument_mismatch() => {
                if let Some(candidate) = self.find_overload(ctx, &args) {
                    trace!(method = %candidate.signature(), stage = "overload", "invoking method");
                    let result = candidate.invoke(ctx, &args).map_err(|source| {
                        EvalError::invocation(format!(
                            "unable to invoke method: {}",
                            candidate.signature()
                        ))
                        .caused_by(source.into())
                    })?;
                    self.counters.overload.fetch_add(1, Ordering::Relaxed);
                    return self.substitute_null(candidate.name(), result, ctx, scope);
                }

                if !self.coercion_needed.swap(true, Ordering::AcqRel) {
                    debug!(
                        method = %self.method.signature(),
                        reason = %err,
                        "argument mismatch, coercing arguments from now on"
                    );
                }
                self.invoke_coerced(ctx, args)
            }
            Err(err) => Err(self.invocation_error(err.into())),
        }
    }

    fn invoke_coerced(&self, ctx: &Value, args: Vec<Value>) -> EvalResult<Value> {
        trace!(method = %self.method.signature(), stage = "coerced", "invoking method");
        let converted = self
            .registry
            .convert_all(&args, self.method.parameter_types())
            .map_err(|err| self.invocation_error(err.into()))?;
        let result = self
            .method
            .invoke(ctx, &converted)
            .map_err(|err| self.invocation_error(err.into()))?;
        self.counters.coerced.fetch_add(1, Ordering::Relaxed);
        Ok(result)
    }

    fn evaluate_args(&self, root: &Value, scope: &dyn VariableScope) -> EvalResult<Vec<Value>> {
        self.params
            .iter()
            .map(|param| param.get_value_static(root, scope))
            .collect()
    }

    /// Best public method of the receiver's own class that accepts `args`
    /// without conversion. Candidates matching more argument types exactly
    /// win.
    fn find_overload(&self, ctx: &Value, args: &[Value]) -> Option<Arc<Method>> {
        let class = ctx.as_object()?.class();
        if class.name() == self.method.declaring_class() {
            return None;
        }

        class
            .methods()
            .into_iter()
            .filter(|candidate| {
                candidate.name() == self.method.name()
                    && !Arc::ptr_eq(candidate, &self.method)
                    && candidate.parameter_types().len() == args.len()
                    && candidate
                        .parameter_types()
                        .iter()
                        .zip(args)
                        .all(|(ty, arg)| ty.is_assignable_from(arg.value_type()))
            })
            .max_by_key(|candidate| {
                candidate
                    .parameter_types()
                    .iter()
                    .zip(args)
                    .filter(|(ty, arg)| **ty == arg.value_type())
                    .count()
            })
    }

    fn substitute_null(
        &self,
        name: &str,
        result: Value,
        ctx: &Value,
        scope: &dyn VariableScope,
    ) -> EvalResult<Value> {
        match (&result, &self.null_handler) {
            (Value::Null, Some(handler)) => handler.get_property(name, ctx, scope),
            _ => Ok(result),
        }
    }

    fn invocation_error(&self, cause: EvalError) -> EvalError {
        EvalError::invocation(format!("cannot invoke method: {}", self.method.signature()))
            .caused_by(cause)
    }
}

impl fmt::Debug for MethodAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodAccessor")
            .field("method", &self.method.signature())
            .field("coercion_needed", &self.is_coercion_needed())
            .finish()
    }
}
