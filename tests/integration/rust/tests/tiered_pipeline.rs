//! Tiered Pipeline Integration Tests
//!
//! Tests tiered sites embedded in statements and loops: automatic
//! promotion while a loop runs, deoptimization between runs and the
//! admission guard shared by many sites.

use core_types::{SourceRange, Value};
use dynamic_optimizer::{DynamicOptimizer, OptimizeKind, TieredAccessor, TieringConfig};
use integration_tests::fixtures::MapKeyOptimizer;
use interpreter::{
    Accessor, AccessorNode, DoNode, ExecutableAccessor, ExecutableChain, ExecutableStatement,
    MapScope, Node, Operator, VariableScope,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn setup(config: TieringConfig) -> (Arc<DynamicOptimizer>, Arc<MapKeyOptimizer>) {
    let optimizer = Arc::new(MapKeyOptimizer::default());
    let handle = DynamicOptimizer::new(optimizer.clone(), config);
    (handle, optimizer)
}

fn key_site(handle: &Arc<DynamicOptimizer>, key: &str) -> Arc<TieredAccessor> {
    handle.site(
        key,
        SourceRange::new(0, key.len()),
        OptimizeKind::Regular,
        Arc::new(AccessorNode::property(key)),
    )
}

/// `do { sum = sum + count } while (sum < limit)` with `count` read
/// through `site`
fn summing_loop(site: &Arc<TieredAccessor>, limit: i32) -> DoNode {
    let body: Arc<dyn ExecutableStatement> = Arc::new(ExecutableAccessor::new(Node::assign(
        "sum",
        Node::binary(
            Operator::Add,
            Node::var("sum"),
            Node::access("count", site.clone()),
        ),
    )));
    let condition: Arc<dyn ExecutableStatement> = Arc::new(ExecutableAccessor::new(Node::binary(
        Operator::Lt,
        Node::var("sum"),
        Node::literal(limit),
    )));
    DoNode::new(condition, body)
}

/// Test: a hot site inside a loop gets promoted and keeps producing the
/// same values
#[test]
fn test_loop_promotes_hot_site() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let (handle, optimizer) = setup(TieringConfig::for_testing());
    let site = key_site(&handle, "count");
    let ctx = Value::map([(Value::from("count"), Value::Int(2))]);
    let scope = MapScope::new();
    scope.create_variable("sum", Value::Int(0));

    summing_loop(&site, 20).reduce(&ctx, &ctx, &scope).unwrap();

    assert_eq!(scope.get_resolver("sum").unwrap().get_value(), Value::Int(20));
    assert!(site.is_optimized());
    assert_eq!(handle.stats().promotions, 1);
    assert!(optimizer.hits.load(Ordering::SeqCst) > 0);
    assert_eq!(handle.guard().tenured_count(), 1);
}

/// Test: deoptimizing between runs leaves results unchanged
#[test]
fn test_deoptimize_between_runs() {
    let (handle, _optimizer) = setup(TieringConfig::for_testing());
    let site = key_site(&handle, "count");
    let ctx = Value::map([(Value::from("count"), Value::Int(5))]);
    let scope = MapScope::new();
    scope.create_variable("sum", Value::Int(0));
    let looped = summing_loop(&site, 50);

    looped.reduce(&ctx, &ctx, &scope).unwrap();
    assert!(site.is_optimized());

    assert!(site.deoptimize());
    assert_eq!(handle.guard().tenured_count(), 0);
    assert_eq!(site.run_count(), 0);

    scope.create_variable("sum", Value::Int(0));
    looped.reduce(&ctx, &ctx, &scope).unwrap();
    assert_eq!(scope.get_resolver("sum").unwrap().get_value(), Value::Int(50));
    assert_eq!(handle.stats().deoptimizations, 1);
}

/// Test: a compiled site still writes through its statement
#[test]
fn test_promoted_site_accepts_writes() {
    let (handle, optimizer) = setup(TieringConfig::default());
    let site = key_site(&handle, "total");
    let ctx = Value::map([(Value::from("total"), Value::Int(1))]);
    let scope = MapScope::new();

    assert_eq!(site.promote(&ctx, &ctx, &scope).unwrap(), Value::Int(1));
    let statement = ExecutableChain::new(site.clone(), "total");
    statement.set_value(&ctx, &ctx, &scope, Value::Int(9)).unwrap();

    assert_eq!(statement.get_value(&ctx, &ctx, &scope).unwrap(), Value::Int(9));
    assert_eq!(site.safe_accessor().get(&ctx, &ctx, &scope).unwrap(), Value::Int(9));
    assert_eq!(optimizer.hits.load(Ordering::SeqCst), 3);
}

/// Test: the guard demotes the oldest sites once the cap is reached
#[test]
fn test_guard_demotes_oldest_sites() {
    let (handle, _optimizer) = setup(TieringConfig::for_testing());
    let max = handle.config().max_tenured;
    let keys: Vec<String> = (0..max + 2).map(|i| format!("k{}", i)).collect();
    let ctx = Value::map(keys.iter().map(|k| (Value::from(k.as_str()), Value::Int(1))));
    let scope = MapScope::new();

    let sites: Vec<_> = keys.iter().map(|k| key_site(&handle, k)).collect();
    for site in &sites {
        assert_eq!(site.promote(&ctx, &ctx, &scope).unwrap(), Value::Int(1));
    }

    assert!(!sites[0].is_optimized());
    assert!(!sites[1].is_optimized());
    assert!(sites[2..].iter().all(|site| site.is_optimized()));
    assert_eq!(handle.guard().tenured_count(), max);
    assert_eq!(handle.stats().reclaimed, 2);

    for site in &sites {
        assert_eq!(site.get(&ctx, &ctx, &scope).unwrap(), Value::Int(1));
    }
}

/// Test: resetting the handle demotes every site
#[test]
fn test_reset_demotes_all_sites() {
    let (handle, _optimizer) = setup(TieringConfig::default());
    let ctx = Value::map([(Value::from("a"), Value::Int(1)), (Value::from("b"), Value::Int(2))]);
    let scope = MapScope::new();
    let a = key_site(&handle, "a");
    let b = key_site(&handle, "b");
    a.promote(&ctx, &ctx, &scope).unwrap();
    b.promote(&ctx, &ctx, &scope).unwrap();

    assert_eq!(handle.reset(), 2);
    assert!(!a.is_optimized());
    assert!(!b.is_optimized());
    assert_eq!(b.get(&ctx, &ctx, &scope).unwrap(), Value::Int(2));
}
