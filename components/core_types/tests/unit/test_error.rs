//! Unit tests for EvalError and ErrorKind

use core_types::{ErrorKind, EvalError, SourceRange};
use std::error::Error;

#[test]
fn test_shorthand_constructors_set_kind() {
    assert_eq!(EvalError::context_shape("x").kind, ErrorKind::ContextShape);
    assert_eq!(EvalError::invocation("x").kind, ErrorKind::Invocation);
    assert_eq!(EvalError::conversion("x").kind, ErrorKind::Conversion);
    assert_eq!(EvalError::optimization("x").kind, ErrorKind::Optimization);
    assert_eq!(EvalError::ambiguity("x").kind, ErrorKind::Ambiguity);
    assert_eq!(EvalError::compile("x").kind, ErrorKind::Compile);
    assert_eq!(EvalError::assignment("x").kind, ErrorKind::Assignment);
}

#[test]
fn test_new_error_has_no_range_or_cause() {
    let error = EvalError::new(ErrorKind::Internal, "oops");
    assert!(error.source_range.is_none());
    assert!(error.cause.is_none());
    assert!(error.source().is_none());
}

#[test]
fn test_nested_causes_chain() {
    let root = EvalError::conversion("cannot convert type: String to: Byte");
    let wrapped = EvalError::invocation("cannot invoke method Bag.put(Byte)")
        .with_range(SourceRange::new(0, 12))
        .caused_by(root);

    let mut depth = 0;
    let mut current: Option<&dyn Error> = Some(&wrapped);
    while let Some(err) = current {
        depth += 1;
        current = err.source();
    }
    assert_eq!(depth, 2);
    assert_eq!(wrapped.source_range.map(|r| r.end()), Some(12));
}
