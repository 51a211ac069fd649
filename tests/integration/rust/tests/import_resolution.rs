//! Import Resolution Integration Tests
//!
//! Tests the parser configuration and parser context together: package
//! imports resolved against a class path, the negative lookup cache,
//! imported constants and static methods, and loops compiled through a
//! context that resolves names on the way.

use core_types::{Class, ErrorKind, EvalError, EvalResult, SourceRange, Value, ValueType};
use integration_tests::fixtures::order_class;
use interpreter::{
    ClassPath, DoUntilNode, ExecutableAccessor, ExecutableStatement, ExpressionCompiler, Import,
    MapScope, Node, Operator, ParserConfiguration, ParserContext, VariableScope,
};
use std::sync::Arc;

fn tax_class() -> Arc<Class> {
    Class::builder("billing.Tax")
        .method(
            "rate",
            vec![ValueType::Int],
            ValueType::Int,
            Arc::new(|_receiver: &Value, args: &[Value]| match args.first() {
                Some(Value::Int(n)) => Ok(Value::Int(n / 10)),
                _ => Err(EvalError::context_shape("rate needs an Int")),
            }),
        )
        .build()
}

fn shop_configuration() -> ParserConfiguration {
    let mut class_path = ClassPath::new();
    class_path.register(order_class());
    class_path.register(tax_class());
    ParserConfiguration::new().with_class_path(class_path)
}

/// Test: a package import resolves short names lazily
#[test]
fn test_package_import_resolves_class() {
    let config = shop_configuration();
    config.add_package_import("shop");

    assert!(config.get_import("Order").is_none());
    assert!(config.has_import("Order").unwrap());
    assert_eq!(config.get_import("Order").unwrap().name(), "shop.Order");
}

/// Test: misses are remembered until the caches are flushed
#[test]
fn test_negative_cache_remembers_misses() {
    let config = shop_configuration();
    config.add_package_import("shop");

    assert!(!config.has_import("Invoice").unwrap());
    assert!(config.is_known_unresolvable("Invoice"));

    config.register_class("shop.Invoice", Class::builder("shop.Invoice").build());
    assert!(!config.has_import("Invoice").unwrap());

    config.flush_caches();
    assert!(config.has_import("Invoice").unwrap());
    assert_eq!(config.negative_cache_len(), 0);
}

/// Test: a name found in two packages is ambiguous
#[test]
fn test_same_name_in_two_packages_is_ambiguous() {
    let config = shop_configuration();
    config.register_class("legacy.Order", order_class());
    config.add_package_import("shop");
    config.add_package_import("legacy");

    let err = config.has_import("Order").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Ambiguity);
    assert!(err.message.contains("Order"));
}

/// Test: importing a class as a package brings in its constants
#[test]
fn test_class_as_package_imports_constants() {
    let config = shop_configuration();
    config.add_package_import("shop.Order");

    match config.get_static_or_class_import("MAX_ITEMS") {
        Some(Import::Value(value)) => assert_eq!(value, Value::Int(99)),
        other => panic!("expected a constant, got {:?}", other),
    }
}

/// Test: an imported static method is callable through its stub
#[test]
fn test_static_method_import() {
    let config = shop_configuration();
    let rate = tax_class().find_method("rate", &[ValueType::Int]).unwrap();
    config.add_method_import("rate", rate);

    let stub = config.get_static_import("rate").unwrap();
    assert_eq!(stub.call(&[Value::Int(250)]).unwrap(), Value::Int(25));
    assert!(config.get_import("rate").is_none());
}

/// Test: variables shadow imports in the parser context
#[test]
fn test_variables_shadow_imports() {
    let config = Arc::new(shop_configuration());
    config.add_package_import("shop");
    let mut ctx = ParserContext::new(config);

    assert!(matches!(ctx.resolve_import("Order").unwrap(), Some(Import::Class(_))));
    ctx.add_variable("Order", ValueType::Object);
    assert!(ctx.resolve_import("Order").unwrap().is_none());
}

/// Compiles the two statements of `n = n + 1;n >= MAX_ITEMS`
struct CounterCompiler;

impl ExpressionCompiler for CounterCompiler {
    fn compile(
        &self,
        expr: &str,
        range: SourceRange,
        ctx: &mut ParserContext,
    ) -> EvalResult<Arc<dyn ExecutableStatement>> {
        let text = range
            .slice(expr)
            .ok_or_else(|| EvalError::compile("range outside of expression"))?;
        let node = match text {
            "n = n + 1" => {
                ctx.add_variable("n", ValueType::Int);
                Node::assign(
                    "n",
                    Node::binary(Operator::Add, Node::var("n"), Node::literal(1)),
                )
            }
            "n >= MAX_ITEMS" => match ctx.resolve_import("MAX_ITEMS")? {
                Some(Import::Value(limit)) => {
                    Node::binary(Operator::Ge, Node::var("n"), Node::Literal(limit))
                }
                _ => return Err(EvalError::compile("unresolved name: MAX_ITEMS")),
            },
            other => return Err(EvalError::compile(format!("unexpected: {}", other))),
        };
        Ok(Arc::new(ExecutableAccessor::new(node)))
    }
}

/// Test: a loop compiled through the context uses an imported constant
#[test]
fn test_compiled_loop_uses_imported_constant() {
    let config = Arc::new(shop_configuration());
    config.add_package_import("shop.Order");
    let mut ctx = ParserContext::new(config);

    let expr = "n = n + 1;n >= MAX_ITEMS";
    let looped = DoUntilNode::compile(
        expr,
        SourceRange::new(10, 14),
        SourceRange::new(0, 9),
        &mut ctx,
        &CounterCompiler,
    )
    .unwrap();
    assert_eq!(ctx.scope_depth(), 1);
    assert!(!ctx.has_variable("n"));

    let scope = MapScope::new();
    scope.create_variable("n", Value::Int(0));
    looped.reduce(&Value::Null, &Value::Null, &scope).unwrap();
    assert_eq!(scope.get_resolver("n").unwrap().get_value(), Value::Int(99));
}

/// Test: an unresolved name in the condition fails with its range
#[test]
fn test_unresolved_condition_reports_range() {
    let mut ctx = ParserContext::new(Arc::new(shop_configuration()));
    let err = DoUntilNode::compile(
        "n = n + 1;n >= MAX_ITEMS",
        SourceRange::new(10, 14),
        SourceRange::new(0, 9),
        &mut ctx,
        &CounterCompiler,
    )
    .err()
    .unwrap();

    assert_eq!(err.kind, ErrorKind::Compile);
    assert_eq!(err.source_range, Some(SourceRange::new(10, 14)));
}
