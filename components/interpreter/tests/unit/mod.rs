//! Unit tests for interpreter components

use coercion::ConversionRegistry;
use core_types::{Class, ErrorKind, EvalError, EvalResult, Instance, NativeFn, SourceRange, Value, ValueType};
use interpreter::null_handler::DefaultValue;
use interpreter::{
    Accessor, AccessorKind, AccessorNode, DoNode, DoUntilNode, ExecutableAccessor,
    ExecutableAccessorSafe, ExecutableChain, ExecutableLiteral, ExecutableStatement,
    ExpressionCompiler, IndexedIncrementAccessor, IndexedScope, MapScope, MethodAccessor, Node,
    Operator, ParserConfiguration, ParserContext, PropertyAccessor, RegexAccessor, VariableScope,
};
use std::cell::RefCell;
use std::sync::{Arc, Mutex};

fn literal(value: Value) -> Arc<dyn ExecutableStatement> {
    Arc::new(ExecutableLiteral::new(value))
}

fn returning(value: &'static str) -> NativeFn {
    Arc::new(move |_: &Value, _: &[Value]| Ok(Value::from(value)))
}

fn doubler() -> NativeFn {
    Arc::new(|_: &Value, args: &[Value]| match args.first() {
        Some(Value::Int(n)) => Ok(Value::Int(n * 2)),
        _ => Ok(Value::Null),
    })
}

// ============================================================================
// Method dispatch
// ============================================================================

#[test]
fn test_latch_survives_matching_arguments() {
    let class = Class::builder("Calc")
        .method("double", vec![ValueType::Int], ValueType::Int, doubler())
        .build();
    let method = class.methods()[0].clone();
    let arg: Arc<dyn ExecutableStatement> = Arc::new(ExecutableAccessor::new(Node::var("arg")));
    let step = MethodAccessor::new(method, vec![arg], Arc::new(ConversionRegistry::new()));
    let chain = AccessorNode::method(step);
    let receiver = Value::object(Instance::new(class));
    let scope = MapScope::new();

    scope.create_variable("arg", Value::from("21"));
    assert_eq!(chain.get(&receiver, &Value::Null, &scope).unwrap(), Value::Int(42));

    scope.create_variable("arg", Value::Int(5));
    assert_eq!(chain.get(&receiver, &Value::Null, &scope).unwrap(), Value::Int(10));

    let AccessorKind::Method(step) = chain.kind() else {
        panic!("expected a method node");
    };
    assert!(step.is_coercion_needed());
    let stats = step.dispatch_stats();
    assert_eq!(stats.exact, 0);
    assert_eq!(stats.coerced, 2);
}

#[test]
fn test_arguments_are_evaluated_once_per_call() {
    struct CountingArg {
        calls: Mutex<u32>,
    }

    impl ExecutableStatement for CountingArg {
        fn get_value(&self, _ctx: &Value, _el_ctx: &Value, _scope: &dyn VariableScope) -> EvalResult<Value> {
            *self.calls.lock().unwrap() += 1;
            Ok(Value::from("4"))
        }

        fn known_egress_type(&self) -> ValueType {
            ValueType::String
        }

        fn node_expr(&self) -> String {
            "arg".to_string()
        }
    }

    let class = Class::builder("Calc")
        .method("double", vec![ValueType::Int], ValueType::Int, doubler())
        .build();
    let arg = Arc::new(CountingArg { calls: Mutex::new(0) });
    let step = MethodAccessor::new(
        class.methods()[0].clone(),
        vec![arg.clone() as Arc<dyn ExecutableStatement>],
        Arc::new(ConversionRegistry::new()),
    );
    let chain = AccessorNode::method(step);
    let receiver = Value::object(Instance::new(class));

    assert_eq!(chain.get(&receiver, &Value::Null, &MapScope::new()).unwrap(), Value::Int(8));
    assert_eq!(*arg.calls.lock().unwrap(), 1);
}

#[test]
fn test_overload_of_receiver_class_is_preferred() {
    let base = Class::builder("Shape")
        .method("describe", vec![ValueType::Int], ValueType::String, returning("int"))
        .build();
    let derived = Class::builder("Circle")
        .extends(base.clone())
        .method("describe", vec![ValueType::String], ValueType::String, returning("string"))
        .build();
    let method = base.methods()[0].clone();
    let step = MethodAccessor::new(
        method,
        vec![literal(Value::from("x"))],
        Arc::new(ConversionRegistry::new()),
    );
    let chain = AccessorNode::method(step);
    let receiver = Value::object(Instance::new(derived));
    let scope = MapScope::new();

    assert_eq!(chain.get(&receiver, &Value::Null, &scope).unwrap(), Value::from("string"));
    let AccessorKind::Method(step) = chain.kind() else {
        panic!("expected a method node");
    };
    assert!(!step.is_coercion_needed());
    assert_eq!(step.dispatch_stats().overload, 1);
}

#[test]
fn test_declaring_class_receiver_skips_overload_search() {
    let base = Class::builder("Shape")
        .method("describe", vec![ValueType::Int], ValueType::String, returning("int"))
        .build();
    let step = MethodAccessor::new(
        base.methods()[0].clone(),
        vec![literal(Value::from("7"))],
        Arc::new(ConversionRegistry::new()),
    );
    let chain = AccessorNode::method(step);
    let receiver = Value::object(Instance::new(base));

    assert_eq!(chain.get(&receiver, &Value::Null, &MapScope::new()).unwrap(), Value::from("int"));
    let AccessorKind::Method(step) = chain.kind() else {
        panic!("expected a method node");
    };
    assert!(step.is_coercion_needed());
}

#[test]
fn test_null_result_is_substituted_on_exact_call() {
    let class = Class::builder("Repo")
        .method(
            "find",
            vec![ValueType::Int],
            ValueType::Object,
            Arc::new(|_: &Value, _: &[Value]| Ok(Value::Null)),
        )
        .build();
    let step = MethodAccessor::new(
        class.methods()[0].clone(),
        vec![literal(Value::Int(1))],
        Arc::new(ConversionRegistry::new()),
    )
    .with_null_handler(Arc::new(DefaultValue(Value::from("none"))));
    let chain = AccessorNode::method(step);
    let receiver = Value::object(Instance::new(class));

    assert_eq!(chain.get(&receiver, &Value::Null, &MapScope::new()).unwrap(), Value::from("none"));
}

#[test]
fn test_method_body_failure_is_wrapped() {
    let class = Class::builder("Repo")
        .method(
            "load",
            vec![],
            ValueType::Object,
            Arc::new(|_: &Value, _: &[Value]| Err(EvalError::context_shape("disk on fire"))),
        )
        .build();
    let step = MethodAccessor::new(class.methods()[0].clone(), vec![], Arc::new(ConversionRegistry::new()));
    let chain = AccessorNode::method(step);
    let receiver = Value::object(Instance::new(class));

    let err = chain.get(&receiver, &Value::Null, &MapScope::new()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Invocation);
    assert!(err.message.contains("Repo.load()"));
    assert!(err.cause.is_some());
}

#[test]
fn test_method_then_property() {
    let point = Class::builder("Point").field("x", ValueType::Int).build();
    let point_for_body = point.clone();
    let factory = Class::builder("Factory")
        .method(
            "origin",
            vec![],
            ValueType::Object,
            Arc::new(move |_: &Value, _: &[Value]| {
                Ok(Value::object(Instance::new(point_for_body.clone()).with_field("x", Value::Int(0))))
            }),
        )
        .build();
    let step = MethodAccessor::new(factory.methods()[0].clone(), vec![], Arc::new(ConversionRegistry::new()));
    let chain = AccessorNode::method(step).then(AccessorNode::property("x"));
    let receiver = Value::object(Instance::new(factory));

    assert_eq!(chain.get(&receiver, &Value::Null, &MapScope::new()).unwrap(), Value::Int(0));
    assert_eq!(chain.len(), 2);
    drop(point);
}

// ============================================================================
// Property and map-entry accessors
// ============================================================================

#[test]
fn test_property_get_then_set_is_idempotent() {
    let class = Class::builder("Person").field("name", ValueType::String).build();
    let person = Value::object(Instance::new(class).with_field("name", Value::from("Ann")));
    let chain = AccessorNode::property("name");
    let scope = MapScope::new();

    let before = chain.get(&person, &person, &scope).unwrap();
    chain.set(&person, &person, &scope, before.clone()).unwrap();
    assert_eq!(chain.get(&person, &person, &scope).unwrap(), before);
}

#[test]
fn test_map_entry_get_then_set_is_idempotent() {
    let ctx = Value::map([(Value::Int(1), Value::from("one"))]);
    let chain = AccessorNode::map_entry(Value::Int(1));
    let scope = MapScope::new();

    let before = chain.get(&ctx, &ctx, &scope).unwrap();
    chain.set(&ctx, &ctx, &scope, before.clone()).unwrap();
    assert_eq!(chain.get(&ctx, &ctx, &scope).unwrap(), before);
    assert_eq!(ctx.as_map().unwrap().read().len(), 1);
}

#[test]
fn test_missing_field_is_context_shape_error() {
    let class = Class::builder("Person").field("name", ValueType::String).build();
    let person = Value::object(Instance::new(class));
    let err = AccessorNode::property("age")
        .get(&person, &person, &MapScope::new())
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ContextShape);
}

#[test]
fn test_null_safe_property_on_null() {
    let chain = AccessorNode::new(AccessorKind::Property(PropertyAccessor::new("name").null_safe(true)));
    assert_eq!(chain.get(&Value::Null, &Value::Null, &MapScope::new()).unwrap(), Value::Null);
}

#[test]
fn test_configured_null_safety_reaches_property_steps() {
    let scope = MapScope::new();
    let person = Value::map([(Value::from("address"), Value::Null)]);

    let lenient = ParserContext::new(Arc::new(ParserConfiguration::new().with_null_safe(true)));
    let chain = AccessorNode::property("address")
        .then(AccessorNode::new(AccessorKind::Property(lenient.property_accessor("city"))));
    assert_eq!(chain.get(&person, &person, &scope).unwrap(), Value::Null);

    let strict = ParserContext::new(Arc::new(ParserConfiguration::new()));
    let chain = AccessorNode::property("address")
        .then(AccessorNode::new(AccessorKind::Property(strict.property_accessor("city"))));
    let err = chain.get(&person, &person, &scope).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ContextShape);
}

#[test]
fn test_chain_display() {
    let chain = AccessorNode::property("a").then(AccessorNode::map_entry(Value::from("b")));
    assert!(chain.to_string().contains(" | "));
}

// ============================================================================
// Regex and indexed steps
// ============================================================================

#[test]
fn test_regex_step_after_property() {
    let ctx = Value::map([(Value::from("name"), Value::from("Alice"))]);
    let chain = AccessorNode::property("name")
        .then(AccessorNode::new(AccessorKind::RegexMatch(RegexAccessor::new("A.*").unwrap())));
    assert_eq!(chain.egress_type(), ValueType::Boolean);
    assert_eq!(chain.get(&ctx, &ctx, &MapScope::new()).unwrap(), Value::Boolean(true));
}

#[test]
fn test_bad_pattern_is_compile_error() {
    let err = RegexAccessor::new("(unclosed").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Compile);
}

#[test]
fn test_indexed_increment_step() {
    let scope = IndexedScope::new(vec!["i".to_string(), "j".to_string()]);
    scope.set_register(1, Value::Int(41));
    let chain = AccessorNode::new(AccessorKind::IndexedIncrement(IndexedIncrementAccessor::new(
        1,
        ValueType::Int,
    )));

    assert_eq!(chain.get(&Value::Null, &Value::Null, &scope).unwrap(), Value::Int(42));
    assert_eq!(scope.get_resolver("j").unwrap().get_value(), Value::Int(42));
    assert_eq!(
        chain
            .set(&Value::Null, &Value::Null, &scope, Value::Int(0))
            .unwrap_err()
            .kind,
        ErrorKind::Assignment
    );
}

#[test]
fn test_indexed_increment_reaches_parent_registers() {
    let outer = IndexedScope::new(vec!["n".to_string()]);
    outer.set_register(0, Value::Long(1));
    let inner = MapScope::with_parent(&outer);
    let chain = AccessorNode::new(AccessorKind::IndexedIncrement(IndexedIncrementAccessor::new(
        0,
        ValueType::Long,
    )));
    assert_eq!(chain.get(&Value::Null, &Value::Null, &inner).unwrap(), Value::Long(2));
}

// ============================================================================
// Executable statements
// ============================================================================

#[test]
fn test_safe_statement_ignores_writes() {
    let scope = MapScope::new();
    scope.create_variable("x", Value::Int(1));
    let statement = ExecutableAccessorSafe::new(Node::var("x"), ValueType::Int);

    assert_eq!(statement.set_value(&Value::Null, &Value::Null, &scope, Value::Int(9)).unwrap(), Value::Null);
    assert_eq!(statement.get_value(&Value::Null, &Value::Null, &scope).unwrap(), Value::Int(1));
    assert!(ExecutableAccessorSafe::empty().is_empty_statement());
}

#[test]
fn test_chain_statement_writes_through() {
    let ctx = Value::empty_map();
    let statement = ExecutableChain::new(Arc::new(AccessorNode::property("total")), "total");
    let scope = MapScope::new();

    statement.set_value(&ctx, &ctx, &scope, Value::Int(7)).unwrap();
    assert_eq!(statement.get_value_static(&ctx, &scope).unwrap(), Value::Int(7));
    assert_eq!(statement.node_expr(), "total");
}

#[test]
fn test_literal_statement_flags() {
    let statement = ExecutableLiteral::new(Value::Int(3));
    assert!(statement.is_literal_only());
    assert!(!statement.is_empty_statement());
    assert_eq!(statement.known_egress_type(), ValueType::Int);
}

#[test]
fn test_type_rule_convertibility() {
    let mut statement = ExecutableLiteral::new(Value::Int(3));
    statement.type_rule_mut().set_ingress(ValueType::Object);
    statement.type_rule_mut().compute();
    assert!(statement.is_convertable_ingress_egress());

    let mut statement = ExecutableLiteral::new(Value::Int(3));
    statement.type_rule_mut().set_ingress(ValueType::String);
    statement.type_rule_mut().compute();
    assert!(!statement.is_convertable_ingress_egress());
}

#[test]
fn test_explicit_cast_statement() {
    let registry = Arc::new(ConversionRegistry::new());
    let statement = ExecutableAccessor::new(Node::cast(ValueType::Int, Node::literal("12"), registry));
    assert!(statement.is_explicit_cast());
    assert_eq!(statement.known_egress_type(), ValueType::Int);
    assert_eq!(
        statement.get_value(&Value::Null, &Value::Null, &MapScope::new()).unwrap(),
        Value::Int(12)
    );
}

// ============================================================================
// Loops
// ============================================================================

/// Loop body that counts its own iterations in a body-local variable and
/// bumps the caller's `runs`
struct LocalCounter {
    seen: Mutex<Vec<i32>>,
}

impl ExecutableStatement for LocalCounter {
    fn get_value(&self, _ctx: &Value, _el_ctx: &Value, scope: &dyn VariableScope) -> EvalResult<Value> {
        let count = match scope.get_resolver("count").map(|r| r.get_value()) {
            Some(Value::Int(n)) => n,
            _ => 0,
        };
        self.seen.lock().unwrap().push(count);
        scope.create_variable("count", Value::Int(count + 1));

        let runs = match scope.get_resolver("runs").map(|r| r.get_value()) {
            Some(Value::Int(n)) => n,
            _ => 0,
        };
        scope.create_variable("runs", Value::Int(runs + 1));
        Ok(Value::Null)
    }

    fn known_egress_type(&self) -> ValueType {
        ValueType::Null
    }

    fn node_expr(&self) -> String {
        "count++".to_string()
    }
}

#[test]
fn test_body_scope_persists_across_iterations_only() {
    let body = Arc::new(LocalCounter { seen: Mutex::new(Vec::new()) });
    let condition: Arc<dyn ExecutableStatement> = Arc::new(ExecutableAccessor::new(Node::binary(
        Operator::Lt,
        Node::var("runs"),
        Node::literal(3),
    )));
    let node = DoNode::new(condition, body.clone() as Arc<dyn ExecutableStatement>);
    let scope = MapScope::new();

    scope.create_variable("runs", Value::Int(0));
    node.reduce(&Value::Null, &Value::Null, &scope).unwrap();
    scope.create_variable("runs", Value::Int(0));
    node.reduce(&Value::Null, &Value::Null, &scope).unwrap();

    assert_eq!(*body.seen.lock().unwrap(), vec![0, 1, 2, 0, 1, 2]);
    assert!(!scope.is_resolvable("count"));
}

#[test]
fn test_loop_as_node_yields_null() {
    let scope = MapScope::new();
    scope.create_variable("runs", Value::Int(0));
    let body: Arc<dyn ExecutableStatement> = Arc::new(ExecutableAccessor::new(Node::assign(
        "runs",
        Node::binary(Operator::Add, Node::var("runs"), Node::literal(1)),
    )));
    let condition: Arc<dyn ExecutableStatement> = Arc::new(ExecutableAccessor::new(Node::binary(
        Operator::Eq,
        Node::var("runs"),
        Node::literal(4),
    )));
    let node = Node::DoUntil(DoUntilNode::new(condition, body));

    assert_eq!(node.reduce(&Value::Null, &Value::Null, &scope).unwrap(), Value::Null);
    assert_eq!(scope.get_resolver("runs").unwrap().get_value(), Value::Int(4));
    assert_eq!(node.egress_type(), ValueType::Null);
}

/// Compiler stand-in: `flag` is a Boolean literal, digits are Int literals,
/// `fail` is a compile error and anything else is an empty statement
struct ScriptedCompiler {
    depths: RefCell<Vec<usize>>,
}

impl ScriptedCompiler {
    fn new() -> Self {
        Self {
            depths: RefCell::new(Vec::new()),
        }
    }
}

impl ExpressionCompiler for ScriptedCompiler {
    fn compile(
        &self,
        expr: &str,
        range: SourceRange,
        ctx: &mut ParserContext,
    ) -> EvalResult<Arc<dyn ExecutableStatement>> {
        self.depths.borrow_mut().push(ctx.scope_depth());
        let text = range
            .slice(expr)
            .ok_or_else(|| EvalError::compile("range out of bounds"))?;
        match text {
            "flag" => Ok(literal(Value::Boolean(true))),
            "fail" => Err(EvalError::compile("unexpected token")),
            t if t.chars().all(|c| c.is_ascii_digit()) && !t.is_empty() => {
                Ok(literal(Value::Int(t.parse().unwrap_or(0))))
            }
            _ => {
                ctx.add_variable("local", ValueType::Int);
                Ok(Arc::new(ExecutableAccessorSafe::empty()))
            }
        }
    }
}

fn parser_context() -> ParserContext {
    ParserContext::new(Arc::new(ParserConfiguration::new()))
}

#[test]
fn test_compile_body_under_pushed_scope() {
    let expr = "flag;body";
    let compiler = ScriptedCompiler::new();
    let mut ctx = parser_context();

    let node = DoNode::compile(expr, SourceRange::new(0, 4), SourceRange::new(5, 4), &mut ctx, &compiler).unwrap();

    assert_eq!(*compiler.depths.borrow(), vec![1, 2]);
    assert_eq!(ctx.scope_depth(), 1);
    assert!(!ctx.has_variable("local"));
    assert!(node.block().is_empty_statement());
}

#[test]
fn test_compile_pops_scope_on_body_error() {
    let expr = "flag;fail";
    let compiler = ScriptedCompiler::new();
    let mut ctx = parser_context();

    let err = DoUntilNode::compile(expr, SourceRange::new(0, 4), SourceRange::new(5, 4), &mut ctx, &compiler)
        .err()
        .unwrap();

    assert_eq!(err.kind, ErrorKind::Compile);
    assert_eq!(err.source_range, Some(SourceRange::new(5, 4)));
    assert_eq!(ctx.scope_depth(), 1);
}

#[test]
fn test_compile_rejects_non_boolean_condition() {
    let expr = "42;body";
    let compiler = ScriptedCompiler::new();
    let mut ctx = parser_context();

    let err = DoNode::compile(expr, SourceRange::new(0, 2), SourceRange::new(3, 4), &mut ctx, &compiler)
        .err()
        .unwrap();

    assert_eq!(err.kind, ErrorKind::Compile);
    assert_eq!(*compiler.depths.borrow(), vec![1]);
}
