//! The standard conversion tables, one per target type.
//!
//! Integral narrowing keeps the low bits (two's complement wrap), so an
//! `Int` of 300 becomes the `Byte` 44. Floating point sources are first
//! truncated toward zero into `i32` (or `i64` for `Long`) with saturation,
//! then narrowed. Strings are parsed strictly: surrounding whitespace or
//! trailing garbage is an error.

use core_types::{Value, ValueType};
use num_bigint::{BigInt, Sign};
use num_traits::{FromPrimitive, ToPrimitive};
use std::str::FromStr;

use crate::error::ConversionError;
use crate::handler::ConversionTable;

use core_types::ValueType as T;

const INTEGRAL: &[ValueType] = &[T::Byte, T::Short, T::Int, T::Long, T::BigInt];
const FLOATING: &[ValueType] = &[T::Float, T::Double];
const TEXTUAL: &[ValueType] = &[T::String, T::Object];

/// Every standard table
pub fn standard_tables() -> Vec<ConversionTable> {
    vec![
        byte_table(),
        short_table(),
        int_table(),
        long_table(),
        float_table(),
        double_table(),
        boolean_table(),
        char_table(),
        string_table(),
        big_int_table(),
    ]
}

/// Conversions into [`ValueType::Byte`]
pub fn byte_table() -> ConversionTable {
    ConversionTable::new(T::Byte)
        .with_all(TEXTUAL, |v| parse::<i8>(v, T::Byte).map(Value::Byte))
        .with_all(INTEGRAL, |v| Ok(Value::Byte(integral(v, T::Byte)? as i8)))
        .with_all(FLOATING, |v| Ok(Value::Byte(floating(v, T::Byte)? as i32 as i8)))
        .with(T::Char, |v| Ok(Value::Byte(integral(v, T::Byte)? as i8)))
}

/// Conversions into [`ValueType::Short`]
pub fn short_table() -> ConversionTable {
    ConversionTable::new(T::Short)
        .with_all(TEXTUAL, |v| parse::<i16>(v, T::Short).map(Value::Short))
        .with_all(INTEGRAL, |v| Ok(Value::Short(integral(v, T::Short)? as i16)))
        .with_all(FLOATING, |v| Ok(Value::Short(floating(v, T::Short)? as i32 as i16)))
        .with(T::Char, |v| Ok(Value::Short(integral(v, T::Short)? as i16)))
}

/// Conversions into [`ValueType::Int`]
pub fn int_table() -> ConversionTable {
    ConversionTable::new(T::Int)
        .with_all(TEXTUAL, |v| parse::<i32>(v, T::Int).map(Value::Int))
        .with_all(INTEGRAL, |v| Ok(Value::Int(integral(v, T::Int)? as i32)))
        .with_all(FLOATING, |v| Ok(Value::Int(floating(v, T::Int)? as i32)))
        .with(T::Char, |v| Ok(Value::Int(integral(v, T::Int)? as i32)))
        .with(T::Boolean, |v| Ok(Value::Int(i32::from(v.as_bool() == Some(true)))))
}

/// Conversions into [`ValueType::Long`]
pub fn long_table() -> ConversionTable {
    ConversionTable::new(T::Long)
        .with_all(TEXTUAL, |v| parse::<i64>(v, T::Long).map(Value::Long))
        .with_all(INTEGRAL, |v| Ok(Value::Long(integral(v, T::Long)?)))
        .with_all(FLOATING, |v| Ok(Value::Long(floating(v, T::Long)? as i64)))
        .with(T::Char, |v| Ok(Value::Long(integral(v, T::Long)?)))
        .with(T::Boolean, |v| Ok(Value::Long(i64::from(v.as_bool() == Some(true)))))
}

/// Conversions into [`ValueType::Float`]
pub fn float_table() -> ConversionTable {
    ConversionTable::new(T::Float)
        .with_all(TEXTUAL, |v| parse::<f32>(v, T::Float).map(Value::Float))
        .with_all(&[T::Byte, T::Short, T::Int, T::Long], |v| {
            Ok(Value::Float(integral(v, T::Float)? as f32))
        })
        .with_all(FLOATING, |v| Ok(Value::Float(floating(v, T::Float)? as f32)))
        .with(T::BigInt, |v| Ok(Value::Float(big_to_f64(v) as f32)))
}

/// Conversions into [`ValueType::Double`]
pub fn double_table() -> ConversionTable {
    ConversionTable::new(T::Double)
        .with_all(TEXTUAL, |v| parse::<f64>(v, T::Double).map(Value::Double))
        .with_all(&[T::Byte, T::Short, T::Int, T::Long], |v| {
            Ok(Value::Double(integral(v, T::Double)? as f64))
        })
        .with_all(FLOATING, |v| Ok(Value::Double(floating(v, T::Double)?)))
        .with(T::BigInt, |v| Ok(Value::Double(big_to_f64(v))))
}

/// Conversions into [`ValueType::Boolean`]
///
/// Text accepts `true`/`false`, `yes`/`no` and `on`/`off` in any case.
/// Numbers are true when non-zero.
pub fn boolean_table() -> ConversionTable {
    ConversionTable::new(T::Boolean)
        .with_all(TEXTUAL, |v| parse_bool(&v.to_string()).map(Value::Boolean))
        .with(T::Boolean, |v| Ok(v.clone()))
        .with_all(INTEGRAL, |v| match v {
            Value::BigInt(n) => Ok(Value::Boolean(n.sign() != Sign::NoSign)),
            other => Ok(Value::Boolean(integral(other, T::Boolean)? != 0)),
        })
        .with_all(FLOATING, |v| Ok(Value::Boolean(floating(v, T::Boolean)? != 0.0)))
        .with(T::Char, |v| parse_bool(&v.to_string()).map(Value::Boolean))
}

/// Conversions into [`ValueType::Char`]
///
/// Text must be exactly one character long. Integers are read as code
/// points.
pub fn char_table() -> ConversionTable {
    ConversionTable::new(T::Char)
        .with_all(TEXTUAL, |v| {
            let text = v.to_string();
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(unparsable(text, T::Char, "expected a single character")),
            }
        })
        .with(T::Char, |v| Ok(v.clone()))
        .with_all(&[T::Byte, T::Short, T::Int, T::Long], |v| {
            let code = integral(v, T::Char)?;
            u32::try_from(code)
                .ok()
                .and_then(char::from_u32)
                .map(Value::Char)
                .ok_or_else(|| ConversionError::NotRepresentable {
                    value: code.to_string(),
                    target: T::Char,
                })
        })
}

/// Conversions into [`ValueType::String`]; every value has a rendering
pub fn string_table() -> ConversionTable {
    ConversionTable::new(T::String).with_all(
        &[
            T::Boolean,
            T::Byte,
            T::Short,
            T::Int,
            T::Long,
            T::Float,
            T::Double,
            T::Char,
            T::String,
            T::BigInt,
            T::Object,
        ],
        |v| Ok(Value::String(v.to_string())),
    )
}

/// Conversions into [`ValueType::BigInt`]
///
/// Floating point sources truncate toward zero; NaN and infinities are
/// rejected.
pub fn big_int_table() -> ConversionTable {
    ConversionTable::new(T::BigInt)
        .with_all(TEXTUAL, |v| parse::<BigInt>(v, T::BigInt).map(Value::BigInt))
        .with(T::BigInt, |v| Ok(v.clone()))
        .with_all(&[T::Byte, T::Short, T::Int, T::Long, T::Char], |v| {
            Ok(Value::BigInt(BigInt::from(integral(v, T::BigInt)?)))
        })
        .with_all(FLOATING, |v| {
            let x = floating(v, T::BigInt)?;
            BigInt::from_f64(x.trunc())
                .map(Value::BigInt)
                .ok_or_else(|| ConversionError::NotRepresentable {
                    value: x.to_string(),
                    target: T::BigInt,
                })
        })
}

/// Integral payload widened to `i64`. Big integers contribute their low
/// 64 bits.
fn integral(value: &Value, target: ValueType) -> Result<i64, ConversionError> {
    match value {
        Value::Byte(n) => Ok(i64::from(*n)),
        Value::Short(n) => Ok(i64::from(*n)),
        Value::Int(n) => Ok(i64::from(*n)),
        Value::Long(n) => Ok(*n),
        Value::Char(c) => Ok(i64::from(u32::from(*c))),
        Value::BigInt(n) => Ok(low_bits(n)),
        other => Err(unsupported(other, target)),
    }
}

fn floating(value: &Value, target: ValueType) -> Result<f64, ConversionError> {
    match value {
        Value::Float(n) => Ok(f64::from(*n)),
        Value::Double(n) => Ok(*n),
        other => Err(unsupported(other, target)),
    }
}

fn low_bits(n: &BigInt) -> i64 {
    let (sign, digits) = n.to_u64_digits();
    let low = digits.first().copied().unwrap_or(0) as i64;
    if sign == Sign::Minus {
        low.wrapping_neg()
    } else {
        low
    }
}

fn big_to_f64(value: &Value) -> f64 {
    match value {
        Value::BigInt(n) => n.to_f64().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn parse<N>(value: &Value, target: ValueType) -> Result<N, ConversionError>
where
    N: FromStr,
    N::Err: std::fmt::Display,
{
    let text = value.to_string();
    text.parse::<N>()
        .map_err(|err| unparsable(text.clone(), target, err.to_string()))
}

fn parse_bool(text: &str) -> Result<bool, ConversionError> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "y" | "t" => Ok(true),
        "false" | "no" | "off" | "n" | "f" => Ok(false),
        _ => Err(unparsable(text.to_string(), T::Boolean, "not a boolean")),
    }
}

fn unsupported(value: &Value, target: ValueType) -> ConversionError {
    ConversionError::Unsupported {
        from: value.type_name(),
        target,
    }
}

fn unparsable(text: String, target: ValueType, reason: impl Into<String>) -> ConversionError {
    ConversionError::Unparsable {
        text,
        target,
        reason: reason.into(),
    }
}
