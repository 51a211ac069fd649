//! Arithmetic and comparison on dynamic values
//!
//! Binary numeric operations promote both operands to a common type:
//! integral types below `Int` widen to `Int`, `Long` beats `Int`, a big
//! integer beats both, and any floating point operand makes the result
//! floating (`Double` when the other side is `Double`, `Long` or a big
//! integer). `Int` and `Long` arithmetic wraps on overflow.

use core_types::{EvalError, EvalResult, Value, ValueType};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::cmp::Ordering;
use std::fmt;

/// Binary operators understood by [`apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `+` (numeric addition or string concatenation)
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `&&`
    And,
    /// `||`
    Or,
}

impl Operator {
    /// Whether the operator always produces a boolean
    pub fn is_boolean(self) -> bool {
        !matches!(self, Operator::Add | Operator::Sub | Operator::Mul)
    }

    fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::And => "&&",
            Operator::Or => "||",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    Int,
    Long,
    Big,
    Float,
    Double,
}

fn rank_of(ty: ValueType) -> Option<Rank> {
    match ty {
        ValueType::Byte | ValueType::Short | ValueType::Int | ValueType::Char => Some(Rank::Int),
        ValueType::Long => Some(Rank::Long),
        ValueType::BigInt => Some(Rank::Big),
        ValueType::Float => Some(Rank::Float),
        ValueType::Double => Some(Rank::Double),
        _ => None,
    }
}

fn promote(a: Rank, b: Rank) -> Rank {
    match (a.max(b), a.min(b)) {
        (Rank::Float, Rank::Long | Rank::Big) => Rank::Double,
        (top, _) => top,
    }
}

/// Static result type of `lhs op rhs`, or `Unknown` when it depends on
/// runtime values
pub fn result_type(op: Operator, lhs: ValueType, rhs: ValueType) -> ValueType {
    if op.is_boolean() {
        return ValueType::Boolean;
    }
    if op == Operator::Add && (lhs == ValueType::String || rhs == ValueType::String) {
        return ValueType::String;
    }
    match (rank_of(lhs), rank_of(rhs)) {
        (Some(a), Some(b)) => match promote(a, b) {
            Rank::Int => ValueType::Int,
            Rank::Long => ValueType::Long,
            Rank::Big => ValueType::BigInt,
            Rank::Float => ValueType::Float,
            Rank::Double => ValueType::Double,
        },
        _ => ValueType::Unknown,
    }
}

fn as_i64(value: &Value) -> i64 {
    match value {
        Value::Byte(n) => i64::from(*n),
        Value::Short(n) => i64::from(*n),
        Value::Int(n) => i64::from(*n),
        Value::Long(n) => *n,
        Value::Char(c) => i64::from(u32::from(*c)),
        Value::BigInt(n) => n.to_i64().unwrap_or(0),
        Value::Float(n) => *n as i64,
        Value::Double(n) => *n as i64,
        _ => 0,
    }
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Float(n) => f64::from(*n),
        Value::Double(n) => *n,
        Value::BigInt(n) => n.to_f64().unwrap_or(f64::NAN),
        other => as_i64(other) as f64,
    }
}

fn as_big(value: &Value) -> BigInt {
    match value {
        Value::BigInt(n) => n.clone(),
        other => BigInt::from(as_i64(other)),
    }
}

/// `value + 1`, keeping the value's own type where it is `Int` or wider
pub fn increment(value: &Value) -> EvalResult<Value> {
    apply(Operator::Add, value, &Value::Int(1))
}

/// Evaluate `lhs op rhs` on already reduced operands
pub fn apply(op: Operator, lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    match op {
        Operator::And | Operator::Or => {
            let (Some(a), Some(b)) = (lhs.as_bool(), rhs.as_bool()) else {
                return Err(operand_error(op, lhs, rhs));
            };
            Ok(Value::Boolean(if op == Operator::And { a && b } else { a || b }))
        }
        Operator::Eq => Ok(Value::Boolean(loosely_equal(lhs, rhs))),
        Operator::Ne => Ok(Value::Boolean(!loosely_equal(lhs, rhs))),
        Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge => {
            let ordering = compare(lhs, rhs).ok_or_else(|| operand_error(op, lhs, rhs))?;
            Ok(Value::Boolean(match op {
                Operator::Lt => ordering == Ordering::Less,
                Operator::Le => ordering != Ordering::Greater,
                Operator::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        Operator::Add if matches!(lhs, Value::String(_)) || matches!(rhs, Value::String(_)) => {
            Ok(Value::String(format!("{}{}", lhs, rhs)))
        }
        Operator::Add | Operator::Sub | Operator::Mul => arithmetic(op, lhs, rhs),
    }
}

fn arithmetic(op: Operator, lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    let rank = match (rank_of(lhs.value_type()), rank_of(rhs.value_type())) {
        (Some(a), Some(b)) => promote(a, b),
        _ => return Err(operand_error(op, lhs, rhs)),
    };
    let result = match rank {
        Rank::Int => {
            let (a, b) = (as_i64(lhs) as i32, as_i64(rhs) as i32);
            Value::Int(match op {
                Operator::Add => a.wrapping_add(b),
                Operator::Sub => a.wrapping_sub(b),
                _ => a.wrapping_mul(b),
            })
        }
        Rank::Long => {
            let (a, b) = (as_i64(lhs), as_i64(rhs));
            Value::Long(match op {
                Operator::Add => a.wrapping_add(b),
                Operator::Sub => a.wrapping_sub(b),
                _ => a.wrapping_mul(b),
            })
        }
        Rank::Big => {
            let (a, b) = (as_big(lhs), as_big(rhs));
            Value::BigInt(match op {
                Operator::Add => a + b,
                Operator::Sub => a - b,
                _ => a * b,
            })
        }
        Rank::Float => {
            let (a, b) = (as_f64(lhs) as f32, as_f64(rhs) as f32);
            Value::Float(match op {
                Operator::Add => a + b,
                Operator::Sub => a - b,
                _ => a * b,
            })
        }
        Rank::Double => {
            let (a, b) = (as_f64(lhs), as_f64(rhs));
            Value::Double(match op {
                Operator::Add => a + b,
                Operator::Sub => a - b,
                _ => a * b,
            })
        }
    };
    Ok(result)
}

fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => match promote(rank_of(lhs.value_type())?, rank_of(rhs.value_type())?) {
            Rank::Int | Rank::Long => Some(as_i64(lhs).cmp(&as_i64(rhs))),
            Rank::Big => Some(as_big(lhs).cmp(&as_big(rhs))),
            Rank::Float | Rank::Double => as_f64(lhs).partial_cmp(&as_f64(rhs)),
        },
    }
}

/// Numbers compare by value across types; everything else uses `Value`
/// equality
fn loosely_equal(lhs: &Value, rhs: &Value) -> bool {
    match (rank_of(lhs.value_type()), rank_of(rhs.value_type())) {
        (Some(_), Some(_)) => compare(lhs, rhs) == Some(Ordering::Equal),
        _ => lhs == rhs,
    }
}

fn operand_error(op: Operator, lhs: &Value, rhs: &Value) -> EvalError {
    EvalError::context_shape(format!(
        "unable to apply {} to: {} and: {}",
        op,
        lhs.type_name(),
        rhs.type_name()
    ))
}
