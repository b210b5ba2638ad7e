//! Static evaluation of constant operator calls
//!
//! Anything that cannot be computed exactly at compile time (non-constant
//! operands, overflow, division by zero, set operators) reports
//! [`Unsupported`] and the caller keeps the unfolded call.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use std::cmp::Ordering;
use std::str::FromStr;

use crate::ir::{ConstValue, Expr, OperatorCall, Set};
use crate::schema::{OperatorKind, Schema, TypeRef};

/// The expression cannot be folded; not an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unsupported;

type EvalResult<T> = std::result::Result<T, Unsupported>;

pub fn evaluate(call: &OperatorCall, schema: &Schema) -> EvalResult<ConstValue> {
    let args = call
        .args
        .iter()
        .map(|arg| evaluate_set(&arg.expr, schema))
        .collect::<EvalResult<Vec<_>>>()?;
    let op = call
        .func_shortname
        .strip_prefix("std::")
        .unwrap_or(&call.func_shortname);
    let value = match (call.operator_kind, args.as_slice()) {
        (OperatorKind::Infix, [left, right]) => infix(op, left, right)?,
        (OperatorKind::Prefix, [operand]) => prefix(op, operand)?,
        _ => return Err(Unsupported),
    };
    fit_to_type(value, &call.typeref, schema)
}

/// Constants, casts of constants and nested constant calls
pub fn evaluate_set(set: &Set, schema: &Schema) -> EvalResult<ConstValue> {
    match &set.expr {
        Expr::Constant(value) => Ok(value.clone()),
        Expr::TypeCast { expr, to, .. } => cast_value(evaluate_set(expr, schema)?, to, schema),
        Expr::OperatorCall(call) => evaluate(call, schema),
        _ => Err(Unsupported),
    }
}

// ============ Operators ============

fn infix(op: &str, left: &ConstValue, right: &ConstValue) -> EvalResult<ConstValue> {
    match op {
        "+" | "-" | "*" | "/" | "//" | "%" | "^" => arithmetic(op, left, right),
        "++" => match (left, right) {
            (ConstValue::Str(a), ConstValue::Str(b)) => Ok(ConstValue::Str(format!("{a}{b}"))),
            (ConstValue::Bytes(a), ConstValue::Bytes(b)) => {
                Ok(ConstValue::Bytes([a.as_slice(), b.as_slice()].concat()))
            }
            _ => Err(Unsupported),
        },
        "=" | "!=" | "<" | "<=" | ">" | ">=" => {
            let ord = compare(left, right)?;
            Ok(ConstValue::Bool(match op {
                "=" => ord == Ordering::Equal,
                "!=" => ord != Ordering::Equal,
                "<" => ord == Ordering::Less,
                "<=" => ord != Ordering::Greater,
                ">" => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            }))
        }
        "AND" | "OR" => match (left, right) {
            (ConstValue::Bool(a), ConstValue::Bool(b)) => Ok(ConstValue::Bool(if op == "AND" {
                *a && *b
            } else {
                *a || *b
            })),
            _ => Err(Unsupported),
        },
        _ => Err(Unsupported),
    }
}

fn prefix(op: &str, operand: &ConstValue) -> EvalResult<ConstValue> {
    match (op, operand) {
        ("-", ConstValue::Int(v)) => v.checked_neg().map(ConstValue::Int).ok_or(Unsupported),
        ("-", ConstValue::Float(v)) => Ok(ConstValue::Float(-v)),
        ("-", ConstValue::Decimal(v)) => Ok(ConstValue::Decimal((-parse_decimal(v)?).to_string())),
        ("+", ConstValue::Int(_) | ConstValue::Float(_) | ConstValue::Decimal(_)) => {
            Ok(operand.clone())
        }
        ("NOT", ConstValue::Bool(v)) => Ok(ConstValue::Bool(!v)),
        _ => Err(Unsupported),
    }
}

fn arithmetic(op: &str, left: &ConstValue, right: &ConstValue) -> EvalResult<ConstValue> {
    match (left, right) {
        (ConstValue::Int(a), ConstValue::Int(b)) => int_arithmetic(op, *a, *b),
        (ConstValue::Float(a), ConstValue::Float(b)) => {
            float_arithmetic(op, *a, *b).map(ConstValue::Float)
        }
        (ConstValue::Decimal(a), ConstValue::Decimal(b)) => {
            decimal_arithmetic(op, parse_decimal(a)?, parse_decimal(b)?)
                .map(|d| ConstValue::Decimal(d.to_string()))
        }
        // Legacy string concatenation
        (ConstValue::Str(a), ConstValue::Str(b)) if op == "+" => {
            Ok(ConstValue::Str(format!("{a}{b}")))
        }
        _ => Err(Unsupported),
    }
}

fn int_arithmetic(op: &str, a: i64, b: i64) -> EvalResult<ConstValue> {
    let value = match op {
        "+" => a.checked_add(b),
        "-" => a.checked_sub(b),
        "*" => a.checked_mul(b),
        "//" => floor_div(a, b),
        "%" => floor_mod(a, b),
        "/" if b != 0 => return Ok(ConstValue::Float(a as f64 / b as f64)),
        "^" => return finite((a as f64).powf(b as f64)).map(ConstValue::Float),
        _ => None,
    };
    value.map(ConstValue::Int).ok_or(Unsupported)
}

fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    let r = a.checked_rem(b)?;
    Some(if r != 0 && ((r < 0) != (b < 0)) { q - 1 } else { q })
}

fn floor_mod(a: i64, b: i64) -> Option<i64> {
    let r = a.checked_rem(b)?;
    Some(if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r })
}

fn float_arithmetic(op: &str, a: f64, b: f64) -> EvalResult<f64> {
    let value = match op {
        "+" => a + b,
        "-" => a - b,
        "*" => a * b,
        "/" | "//" | "%" if b == 0.0 => return Err(Unsupported),
        "/" => a / b,
        "//" => (a / b).floor(),
        "%" => a - b * (a / b).floor(),
        "^" => a.powf(b),
        _ => return Err(Unsupported),
    };
    finite(value)
}

fn decimal_arithmetic(op: &str, a: Decimal, b: Decimal) -> EvalResult<Decimal> {
    let value = match op {
        "+" => a.checked_add(b),
        "-" => a.checked_sub(b),
        "*" => a.checked_mul(b),
        "/" => a.checked_div(b),
        "//" => a.checked_div(b).map(|q| q.floor()),
        "%" => a.checked_rem(b).map(|r| {
            if !r.is_zero() && (r.is_sign_negative() != b.is_sign_negative()) {
                r + b
            } else {
                r
            }
        }),
        _ => None,
    };
    value.ok_or(Unsupported)
}

fn compare(left: &ConstValue, right: &ConstValue) -> EvalResult<Ordering> {
    match (left, right) {
        (ConstValue::Int(a), ConstValue::Int(b)) => Ok(a.cmp(b)),
        (ConstValue::Float(a), ConstValue::Float(b)) => a.partial_cmp(b).ok_or(Unsupported),
        (ConstValue::Decimal(a), ConstValue::Decimal(b)) => {
            Ok(parse_decimal(a)?.cmp(&parse_decimal(b)?))
        }
        (ConstValue::Str(a), ConstValue::Str(b)) => Ok(a.cmp(b)),
        (ConstValue::Bool(a), ConstValue::Bool(b)) => Ok(a.cmp(b)),
        (ConstValue::Bytes(a), ConstValue::Bytes(b)) => Ok(a.cmp(b)),
        _ => Err(Unsupported),
    }
}

// ============ Casts ============

/// Range-check a computed value against the declared result type
fn fit_to_type(value: ConstValue, typeref: &TypeRef, schema: &Schema) -> EvalResult<ConstValue> {
    let TypeRef::Scalar(name) = typeref else {
        return Ok(value);
    };
    match (schema.material_scalar(name).as_str(), value) {
        ("std::int16", ConstValue::Int(v)) => {
            i16::try_from(v).map(|_| ConstValue::Int(v)).map_err(|_| Unsupported)
        }
        ("std::int32", ConstValue::Int(v)) => {
            i32::try_from(v).map(|_| ConstValue::Int(v)).map_err(|_| Unsupported)
        }
        ("std::float32", ConstValue::Float(v)) => {
            finite(v as f32 as f64).map(ConstValue::Float)
        }
        (_, value) => Ok(value),
    }
}

pub fn cast_value(value: ConstValue, to: &TypeRef, schema: &Schema) -> EvalResult<ConstValue> {
    let TypeRef::Scalar(name) = to else {
        return Err(Unsupported);
    };
    let value = match schema.material_scalar(name).as_str() {
        "std::str" => ConstValue::Str(to_str(value)?),
        "std::int16" | "std::int32" | "std::int64" => ConstValue::Int(to_int(value)?),
        "std::float32" | "std::float64" => ConstValue::Float(to_float(value)?),
        "std::decimal" => ConstValue::Decimal(to_decimal(value)?.to_string()),
        "std::bool" => ConstValue::Bool(to_bool(value)?),
        _ => return Err(Unsupported),
    };
    fit_to_type(value, to, schema)
}

fn to_str(value: ConstValue) -> EvalResult<String> {
    match value {
        ConstValue::Str(s) | ConstValue::Decimal(s) => Ok(s),
        ConstValue::Int(v) => Ok(v.to_string()),
        ConstValue::Float(v) => Ok(v.to_string()),
        ConstValue::Bool(v) => Ok(v.to_string()),
        ConstValue::Bytes(_) => Err(Unsupported),
    }
}

/// Floats and decimals round half to even
fn to_int(value: ConstValue) -> EvalResult<i64> {
    match value {
        ConstValue::Int(v) => Ok(v),
        ConstValue::Float(v) => {
            let rounded = finite(v)?.round_ties_even();
            if (-9.223_372_036_854_776e18..9.223_372_036_854_776e18).contains(&rounded) {
                Ok(rounded as i64)
            } else {
                Err(Unsupported)
            }
        }
        ConstValue::Decimal(s) => parse_decimal(&s)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
            .to_i64()
            .ok_or(Unsupported),
        ConstValue::Str(s) => s.trim().parse().map_err(|_| Unsupported),
        ConstValue::Bool(v) => Ok(i64::from(v)),
        ConstValue::Bytes(_) => Err(Unsupported),
    }
}

fn to_float(value: ConstValue) -> EvalResult<f64> {
    match value {
        ConstValue::Int(v) => Ok(v as f64),
        ConstValue::Float(v) => Ok(v),
        ConstValue::Decimal(s) => parse_decimal(&s)?.to_f64().ok_or(Unsupported),
        ConstValue::Str(s) => s.trim().parse().map_err(|_| Unsupported),
        ConstValue::Bool(_) | ConstValue::Bytes(_) => Err(Unsupported),
    }
}

fn to_decimal(value: ConstValue) -> EvalResult<Decimal> {
    match value {
        ConstValue::Int(v) => Ok(Decimal::from(v)),
        ConstValue::Float(v) => Decimal::from_f64(v).ok_or(Unsupported),
        ConstValue::Decimal(s) => parse_decimal(&s),
        ConstValue::Str(s) => parse_decimal(s.trim()),
        ConstValue::Bool(_) | ConstValue::Bytes(_) => Err(Unsupported),
    }
}

fn to_bool(value: ConstValue) -> EvalResult<bool> {
    match value {
        ConstValue::Bool(v) => Ok(v),
        ConstValue::Int(v) => Ok(v != 0),
        ConstValue::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(Unsupported),
        },
        _ => Err(Unsupported),
    }
}

fn parse_decimal(text: &str) -> EvalResult<Decimal> {
    Decimal::from_str(text).map_err(|_| Unsupported)
}

fn finite(value: f64) -> EvalResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(v: i64) -> ConstValue {
        ConstValue::Int(v)
    }

    #[test]
    fn integer_arithmetic_is_checked() {
        assert_eq!(infix("+", &int(40), &int(2)), Ok(int(42)));
        assert_eq!(infix("+", &int(i64::MAX), &int(1)), Err(Unsupported));
        assert_eq!(infix("//", &int(1), &int(0)), Err(Unsupported));
        assert_eq!(infix("//", &int(i64::MIN), &int(-1)), Err(Unsupported));
    }

    #[test]
    fn floor_division_and_modulo_follow_divisor_sign() {
        assert_eq!(infix("//", &int(-7), &int(2)), Ok(int(-4)));
        assert_eq!(infix("%", &int(-7), &int(2)), Ok(int(1)));
        assert_eq!(infix("%", &int(7), &int(-2)), Ok(int(-1)));
        assert_eq!(infix("/", &int(7), &int(2)), Ok(ConstValue::Float(3.5)));
    }

    #[test]
    fn decimal_arithmetic_is_exact() {
        let a = ConstValue::Decimal("0.1".into());
        let b = ConstValue::Decimal("0.2".into());
        assert_eq!(infix("+", &a, &b), Ok(ConstValue::Decimal("0.3".into())));
    }

    #[test]
    fn comparisons_and_logic() {
        assert_eq!(infix("<", &int(1), &int(2)), Ok(ConstValue::Bool(true)));
        assert_eq!(
            infix("=", &ConstValue::Float(f64::NAN), &ConstValue::Float(1.0)),
            Err(Unsupported)
        );
        assert_eq!(
            infix("AND", &ConstValue::Bool(true), &ConstValue::Bool(false)),
            Ok(ConstValue::Bool(false))
        );
        assert_eq!(prefix("NOT", &ConstValue::Bool(false)), Ok(ConstValue::Bool(true)));
        assert_eq!(prefix("-", &int(i64::MIN)), Err(Unsupported));
    }

    #[test]
    fn casts_between_scalars() {
        let schema = Schema::std();
        let t = |name: &str| TypeRef::scalar(name);
        assert_eq!(
            cast_value(int(123), &t("std::str"), &schema),
            Ok(ConstValue::Str("123".into()))
        );
        assert_eq!(
            cast_value(ConstValue::Float(123.45), &t("std::int64"), &schema),
            Ok(int(123))
        );
        assert_eq!(
            cast_value(ConstValue::Float(2.5), &t("std::int64"), &schema),
            Ok(int(2))
        );
        assert_eq!(
            cast_value(ConstValue::Str("123.45".into()), &t("std::float64"), &schema),
            Ok(ConstValue::Float(123.45))
        );
        assert_eq!(
            cast_value(int(70000), &t("std::int16"), &schema),
            Err(Unsupported)
        );
        assert_eq!(
            cast_value(ConstValue::Str("nope".into()), &t("std::int64"), &schema),
            Err(Unsupported)
        );
    }
}
