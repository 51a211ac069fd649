//! Evaluation Pipeline Integration Tests
//!
//! Tests statements, loops, accessor chains, method dispatch and coercion
//! working together against host objects.

use coercion::ConversionRegistry;
use core_types::{ErrorKind, Value, ValueType};
use integration_tests::fixtures::{order, order_class};
use interpreter::accessor::RegexAccessor;
use interpreter::ast::IndexedPrefixIncNode;
use interpreter::null_handler::ScopeFallback;
use interpreter::{
    Accessor, AccessorKind, AccessorNode, DoNode, DoUntilNode, ExecutableAccessor,
    ExecutableAccessorSafe, ExecutableLiteral, ExecutableStatement, IndexedScope, MapScope,
    MethodAccessor, Node, Operator, ParserConfiguration, ParserContext, PropertyAccessor,
    VariableScope,
};
use std::sync::Arc;

fn statement(node: Node) -> Arc<dyn ExecutableStatement> {
    Arc::new(ExecutableAccessor::new(node))
}

fn method_chain(name: &str, args: Vec<Arc<dyn ExecutableStatement>>) -> Arc<AccessorNode> {
    let class = order_class();
    let method = class
        .methods()
        .into_iter()
        .find(|m| m.name() == name)
        .expect("fixture method");
    Arc::new(AccessorNode::method(MethodAccessor::new(
        method,
        args,
        Arc::new(ConversionRegistry::new()),
    )))
}

/// Test: a loop body calls a method whose argument needs coercion
#[test]
fn test_loop_calls_method_with_coerced_argument() {
    let class = order_class();
    let target = order(&class, 0, "ann");
    let scope = MapScope::new();
    scope.create_variable("step", Value::from("5"));

    let add = method_chain("add", vec![statement(Node::var("step"))]);
    let body = statement(Node::access("add(step)", add.clone()));
    let condition = statement(Node::binary(
        Operator::Ge,
        Node::access("total", Arc::new(AccessorNode::property("total"))),
        Node::literal(20),
    ));

    let result = DoUntilNode::new(condition, body)
        .reduce(&target, &target, &scope)
        .expect("loop failed");

    assert_eq!(result, Value::Null);
    assert_eq!(target.as_object().unwrap().get_field("total"), Some(Value::Int(20)));
    let AccessorKind::Method(step) = add.kind() else {
        panic!("expected a method node");
    };
    assert!(step.is_coercion_needed());
    assert_eq!(step.dispatch_stats().coerced, 4);
    assert_eq!(step.dispatch_stats().exact, 0);
}

/// Test: method result flows into a regex step
#[test]
fn test_method_then_regex_match() {
    let class = order_class();
    let target = order(&class, 0, "ann");
    let scope = MapScope::new();
    let label = MethodAccessor::new(
        class.find_method("label", &[ValueType::String]).expect("fixture method"),
        vec![Arc::new(ExecutableLiteral::new(Value::from("Dear ")))],
        Arc::new(ConversionRegistry::new()),
    );

    let call = AccessorNode::method(label);
    assert_eq!(call.get(&target, &target, &scope).unwrap(), Value::from("Dear ann"));

    let chain = call.then(AccessorNode::new(AccessorKind::RegexMatch(
        RegexAccessor::new("Dear [a-z]+").unwrap(),
    )));
    assert_eq!(chain.egress_type(), ValueType::Boolean);
    assert_eq!(chain.get(&target, &target, &scope).unwrap(), Value::Boolean(true));
}

/// Test: property read falls back to a scope variable when null
#[test]
fn test_null_property_falls_back_to_scope() {
    let ctx = Value::empty_map();
    let scope = MapScope::new();
    scope.create_variable("discount", Value::Int(5));
    let chain = AccessorNode::new(AccessorKind::Property(
        PropertyAccessor::new("discount").with_null_handler(Arc::new(ScopeFallback)),
    ));
    assert_eq!(chain.get(&ctx, &ctx, &scope).unwrap(), Value::Int(5));
}

/// Test: an indexed counter loop
#[test]
fn test_indexed_counter_loop() {
    let mut parser_ctx = ParserContext::new(Arc::new(ParserConfiguration::new()));
    parser_ctx.add_variable("i", ValueType::Int);
    parser_ctx.set_indexed_var_names(vec!["i".to_string()]);

    let increment = IndexedPrefixIncNode::new(0, &parser_ctx).unwrap();
    assert_eq!(increment.egress_type(), ValueType::Int);
    let body = statement(Node::IndexedPrefixInc(increment));
    let condition = statement(Node::binary(Operator::Lt, Node::var("i"), Node::literal(10)));

    let scope = IndexedScope::new(vec!["i".to_string()]);
    scope.set_register(0, Value::Int(0));
    DoNode::new(condition, body)
        .reduce(&Value::Null, &Value::Null, &scope)
        .unwrap();

    assert_eq!(scope.get_resolver("i").unwrap().get_value(), Value::Int(10));
}

/// Test: casts go through the coercion registry; safe statements ignore writes
#[test]
fn test_cast_and_safe_statement() {
    let registry = Arc::new(ConversionRegistry::new());
    let scope = MapScope::new();
    scope.create_variable("raw", Value::from("300"));

    let cast = ExecutableAccessorSafe::new(
        Node::cast(ValueType::Short, Node::var("raw"), registry.clone()),
        ValueType::Short,
    );
    assert!(cast.is_explicit_cast());
    assert_eq!(cast.get_value(&Value::Null, &Value::Null, &scope).unwrap(), Value::Short(300));
    assert_eq!(cast.set_value(&Value::Null, &Value::Null, &scope, Value::Int(1)).unwrap(), Value::Null);

    let bad = ExecutableAccessor::new(Node::cast(ValueType::Boolean, Node::literal("maybe"), registry));
    let err = bad.get_value(&Value::Null, &Value::Null, &scope).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conversion);
}

/// Test: a non-map context fails the whole chain with a context shape error
#[test]
fn test_context_shape_error_surfaces() {
    let chain = AccessorNode::property("a").then(AccessorNode::map_entry(Value::from("b")));
    let ctx = Value::map([(Value::from("a"), Value::Int(1))]);
    let err = chain.get(&ctx, &ctx, &MapScope::new()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ContextShape);
    assert!(err.message.contains("Int"));
}
