//! Operator semantics over runtime values.
//!
//! Direct enum-based dispatch: the value set is fixed, so pattern matching
//! beats trait objects and keeps exhaustiveness checked. Integer arithmetic
//! is checked throughout — overflow is an evaluation error, never a wrap.
//!
//! Division semantics follow the expression language, not the host: `/` is
//! true division and always yields a float, `//` floors, `%` takes the sign
//! of the divisor, and `**` with a negative exponent yields a float.

use crate::errors::{EvalError, EvalResult};
use sift_ir::ast::{BinaryOp, CmpOp, UnaryOp};
use sift_ir::Value;
use std::cmp::Ordering;

/// Numeric view of a value; booleans count as 0/1.
#[derive(Clone, Copy, Debug)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn of(value: &Value) -> Option<Num> {
        match value {
            Value::Int(n) => Some(Num::Int(*n)),
            Value::Float(f) => Some(Num::Float(*f)),
            Value::Bool(b) => Some(Num::Int(i64::from(*b))),
            _ => None,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(n) => n as f64,
            Num::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Num::Int(n) => n == 0,
            Num::Float(f) => f == 0.0,
        }
    }
}

fn invalid_binary(op: BinaryOp, left: &Value, right: &Value) -> EvalError {
    EvalError::InvalidBinaryOp {
        op: op.symbol(),
        left: left.type_name().to_owned(),
        right: right.type_name().to_owned(),
    }
}

/// Floor division on integers (quotient rounded toward negative infinity).
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    let r = a.checked_rem(b)?;
    if r != 0 && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

/// Modulo with the sign of the divisor.
fn floor_mod(a: i64, b: i64) -> Option<i64> {
    let q = floor_div(a, b)?;
    a.checked_sub(q.checked_mul(b)?)
}

/// Float modulo with the sign of the divisor.
fn floor_mod_f(a: f64, b: f64) -> f64 {
    a - (a / b).floor() * b
}

/// `+` shared with `sum()`: numeric addition, string and list
/// concatenation.
pub(crate) fn add_values(left: &Value, right: &Value) -> EvalResult {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => {
            let mut s = String::with_capacity(a.len() + b.len());
            s.push_str(a);
            s.push_str(b);
            Ok(Value::string(s))
        }
        (Value::List(a), Value::List(b)) => {
            let mut items = a.as_ref().clone();
            items.extend(b.iter().cloned());
            Ok(Value::list(items))
        }
        _ => match (Num::of(left), Num::of(right)) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => a
                .checked_add(b)
                .map(Value::Int)
                .ok_or(EvalError::IntegerOverflow { op: "addition" }),
            (Some(a), Some(b)) => Ok(Value::Float(a.as_f64() + b.as_f64())),
            _ => Err(invalid_binary(BinaryOp::Add, left, right)),
        },
    }
}

/// `**` shared with `pow()`.
pub(crate) fn pow_values(left: &Value, right: &Value) -> EvalResult {
    let (Some(base), Some(exp)) = (Num::of(left), Num::of(right)) else {
        return Err(invalid_binary(BinaryOp::Pow, left, right));
    };
    if base.is_zero() {
        let negative = match exp {
            Num::Int(n) => n < 0,
            Num::Float(f) => f < 0.0,
        };
        if negative {
            return Err(EvalError::DivisionByZero);
        }
    }
    match (base, exp) {
        (Num::Int(b), Num::Int(e)) if e >= 0 => {
            let e = u32::try_from(e).map_err(|_| EvalError::IntegerOverflow { op: "power" })?;
            b.checked_pow(e)
                .map(Value::Int)
                .ok_or(EvalError::IntegerOverflow { op: "power" })
        }
        (b, e) => Ok(Value::Float(b.as_f64().powf(e.as_f64()))),
    }
}

/// Repeat a sequence `count` times (`'ab' * 3`, `[0] * 4`).
fn repeat_seq(value: &Value, count: i64) -> EvalResult {
    let count = usize::try_from(count.max(0)).map_err(|_| EvalError::IntegerOverflow {
        op: "sequence repetition",
    })?;
    match value {
        Value::Str(s) => Ok(Value::string(s.repeat(count))),
        Value::List(items) => {
            let mut out = Vec::with_capacity(items.len().saturating_mul(count));
            for _ in 0..count {
                out.extend(items.iter().cloned());
            }
            Ok(Value::list(out))
        }
        _ => Err(EvalError::InvalidBinaryOp {
            op: "*",
            left: value.type_name().to_owned(),
            right: "int".to_owned(),
        }),
    }
}

/// Evaluate a strict binary operator.
pub(crate) fn evaluate_binary(op: BinaryOp, left: &Value, right: &Value) -> EvalResult {
    match op {
        BinaryOp::Add => add_values(left, right),
        BinaryOp::Pow => pow_values(left, right),
        BinaryOp::Mul => match (left, right) {
            (Value::Str(_) | Value::List(_), Value::Int(n)) => repeat_seq(left, *n),
            (Value::Int(n), Value::Str(_) | Value::List(_)) => repeat_seq(right, *n),
            _ => match (Num::of(left), Num::of(right)) {
                (Some(Num::Int(a)), Some(Num::Int(b))) => a
                    .checked_mul(b)
                    .map(Value::Int)
                    .ok_or(EvalError::IntegerOverflow {
                        op: "multiplication",
                    }),
                (Some(a), Some(b)) => Ok(Value::Float(a.as_f64() * b.as_f64())),
                _ => Err(invalid_binary(op, left, right)),
            },
        },
        BinaryOp::Sub => match (Num::of(left), Num::of(right)) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => a
                .checked_sub(b)
                .map(Value::Int)
                .ok_or(EvalError::IntegerOverflow { op: "subtraction" }),
            (Some(a), Some(b)) => Ok(Value::Float(a.as_f64() - b.as_f64())),
            _ => Err(invalid_binary(op, left, right)),
        },
        BinaryOp::TrueDiv => match (Num::of(left), Num::of(right)) {
            (Some(a), Some(b)) => {
                if b.is_zero() {
                    Err(EvalError::DivisionByZero)
                } else {
                    Ok(Value::Float(a.as_f64() / b.as_f64()))
                }
            }
            _ => Err(invalid_binary(op, left, right)),
        },
        BinaryOp::FloorDiv => match (Num::of(left), Num::of(right)) {
            (Some(_), Some(b)) if b.is_zero() => Err(EvalError::DivisionByZero),
            (Some(Num::Int(a)), Some(Num::Int(b))) => floor_div(a, b)
                .map(Value::Int)
                .ok_or(EvalError::IntegerOverflow { op: "floor division" }),
            (Some(a), Some(b)) => Ok(Value::Float((a.as_f64() / b.as_f64()).floor())),
            _ => Err(invalid_binary(op, left, right)),
        },
        BinaryOp::Mod => match (Num::of(left), Num::of(right)) {
            (Some(_), Some(b)) if b.is_zero() => Err(EvalError::ModuloByZero),
            (Some(Num::Int(a)), Some(Num::Int(b))) => floor_mod(a, b)
                .map(Value::Int)
                .ok_or(EvalError::IntegerOverflow { op: "modulo" }),
            (Some(a), Some(b)) => Ok(Value::Float(floor_mod_f(a.as_f64(), b.as_f64()))),
            _ => Err(invalid_binary(op, left, right)),
        },
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
            match (Num::of(left), Num::of(right)) {
                (Some(Num::Int(a)), Some(Num::Int(b))) => Ok(Value::Int(match op {
                    BinaryOp::BitAnd => a & b,
                    BinaryOp::BitOr => a | b,
                    _ => a ^ b,
                })),
                _ => Err(invalid_binary(op, left, right)),
            }
        }
        BinaryOp::Shl | BinaryOp::Shr => match (Num::of(left), Num::of(right)) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => {
                let amount =
                    u32::try_from(b).map_err(|_| EvalError::ShiftOutOfRange { amount: b })?;
                if amount > 63 {
                    return Err(EvalError::ShiftOutOfRange { amount: b });
                }
                if op == BinaryOp::Shr {
                    return Ok(Value::Int(a >> amount));
                }
                let shifted = a << amount;
                // A left shift that cannot round-trip lost bits.
                if (shifted >> amount) != a {
                    return Err(EvalError::IntegerOverflow { op: "left shift" });
                }
                Ok(Value::Int(shifted))
            }
            _ => Err(invalid_binary(op, left, right)),
        },
    }
}

/// Evaluate a unary operator.
pub(crate) fn evaluate_unary(op: UnaryOp, value: &Value) -> EvalResult {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
        UnaryOp::Pos => match Num::of(value) {
            Some(Num::Int(n)) => Ok(Value::Int(n)),
            Some(Num::Float(f)) => Ok(Value::Float(f)),
            None => Err(EvalError::InvalidUnaryOp {
                op: "+",
                type_name: value.type_name().to_owned(),
            }),
        },
        UnaryOp::Neg => match Num::of(value) {
            Some(Num::Int(n)) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or(EvalError::IntegerOverflow { op: "negation" }),
            Some(Num::Float(f)) => Ok(Value::Float(-f)),
            None => Err(EvalError::InvalidUnaryOp {
                op: "-",
                type_name: value.type_name().to_owned(),
            }),
        },
        UnaryOp::BitNot => match Num::of(value) {
            Some(Num::Int(n)) => Ok(Value::Int(!n)),
            _ => Err(EvalError::InvalidUnaryOp {
                op: "~",
                type_name: value.type_name().to_owned(),
            }),
        },
    }
}

/// Ordering between two values for `< <= > >=`, where one exists.
fn compare_order(left: &Value, right: &Value) -> Result<Ordering, EvalError> {
    let not_orderable = || EvalError::NotOrderable {
        left: left.type_name().to_owned(),
        right: right.type_name().to_owned(),
    };
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        _ => match (Num::of(left), Num::of(right)) {
            (Some(a), Some(b)) => a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .ok_or_else(not_orderable),
            _ => Err(not_orderable()),
        },
    }
}

/// Membership test for `in` / `not in`.
fn contains(container: &Value, item: &Value) -> Result<bool, EvalError> {
    match container {
        Value::List(items) => Ok(items.iter().any(|v| v == item)),
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(needle.as_ref())),
            other => Err(EvalError::InvalidBinaryOp {
                op: "in",
                left: other.type_name().to_owned(),
                right: "str".to_owned(),
            }),
        },
        other => Err(EvalError::NotContainer {
            type_name: other.type_name().to_owned(),
        }),
    }
}

/// Evaluate one link of a comparison chain.
pub(crate) fn evaluate_compare(op: CmpOp, left: &Value, right: &Value) -> Result<bool, EvalError> {
    match op {
        CmpOp::Eq => Ok(left == right),
        CmpOp::NotEq => Ok(left != right),
        CmpOp::Lt => Ok(compare_order(left, right)? == Ordering::Less),
        CmpOp::LtEq => Ok(matches!(
            compare_order(left, right)?,
            Ordering::Less | Ordering::Equal
        )),
        CmpOp::Gt => Ok(compare_order(left, right)? == Ordering::Greater),
        CmpOp::GtEq => Ok(matches!(
            compare_order(left, right)?,
            Ordering::Greater | Ordering::Equal
        )),
        CmpOp::In => contains(right, left),
        CmpOp::NotIn => Ok(!contains(right, left)?),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn int(n: i64) -> Value {
        Value::int(n)
    }

    #[test]
    fn true_division_yields_float() {
        assert_eq!(
            evaluate_binary(BinaryOp::TrueDiv, &int(6), &int(2)).unwrap(),
            Value::float(3.0)
        );
        assert_eq!(
            evaluate_binary(BinaryOp::TrueDiv, &int(7), &int(2)).unwrap(),
            Value::float(3.5)
        );
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(
            evaluate_binary(BinaryOp::TrueDiv, &int(1), &int(0)).unwrap_err(),
            EvalError::DivisionByZero
        );
        assert_eq!(
            evaluate_binary(BinaryOp::FloorDiv, &int(1), &int(0)).unwrap_err(),
            EvalError::DivisionByZero
        );
        assert_eq!(
            evaluate_binary(BinaryOp::Mod, &int(1), &int(0)).unwrap_err(),
            EvalError::ModuloByZero
        );
    }

    #[test]
    fn floor_division_rounds_down() {
        assert_eq!(
            evaluate_binary(BinaryOp::FloorDiv, &int(7), &int(2)).unwrap(),
            int(3)
        );
        assert_eq!(
            evaluate_binary(BinaryOp::FloorDiv, &int(-7), &int(2)).unwrap(),
            int(-4)
        );
        assert_eq!(
            evaluate_binary(BinaryOp::FloorDiv, &int(7), &int(-2)).unwrap(),
            int(-4)
        );
    }

    #[test]
    fn modulo_takes_divisor_sign() {
        assert_eq!(
            evaluate_binary(BinaryOp::Mod, &int(-7), &int(3)).unwrap(),
            int(2)
        );
        assert_eq!(
            evaluate_binary(BinaryOp::Mod, &int(7), &int(-3)).unwrap(),
            int(-2)
        );
        assert_eq!(
            evaluate_binary(BinaryOp::Mod, &int(7), &int(3)).unwrap(),
            int(1)
        );
    }

    #[test]
    fn power_semantics() {
        assert_eq!(pow_values(&int(2), &int(10)).unwrap(), int(1024));
        assert_eq!(pow_values(&int(2), &int(-1)).unwrap(), Value::float(0.5));
        assert_eq!(
            pow_values(&int(0), &int(-1)).unwrap_err(),
            EvalError::DivisionByZero
        );
        assert_eq!(
            pow_values(&int(i64::MAX), &int(2)).unwrap_err(),
            EvalError::IntegerOverflow { op: "power" }
        );
    }

    #[test]
    fn overflow_is_an_error_not_a_wrap() {
        assert_eq!(
            evaluate_binary(BinaryOp::Add, &int(i64::MAX), &int(1)).unwrap_err(),
            EvalError::IntegerOverflow { op: "addition" }
        );
        assert_eq!(
            evaluate_binary(BinaryOp::Mul, &int(i64::MAX), &int(2)).unwrap_err(),
            EvalError::IntegerOverflow {
                op: "multiplication"
            }
        );
        assert_eq!(
            evaluate_unary(UnaryOp::Neg, &int(i64::MIN)).unwrap_err(),
            EvalError::IntegerOverflow { op: "negation" }
        );
    }

    #[test]
    fn string_and_list_concat() {
        assert_eq!(
            add_values(&Value::string("ab"), &Value::string("cd")).unwrap(),
            Value::string("abcd")
        );
        assert_eq!(
            add_values(
                &Value::list(vec![int(1)]),
                &Value::list(vec![int(2)])
            )
            .unwrap(),
            Value::list(vec![int(1), int(2)])
        );
        assert!(add_values(&Value::string("a"), &int(1)).is_err());
    }

    #[test]
    fn sequence_repetition() {
        assert_eq!(
            evaluate_binary(BinaryOp::Mul, &Value::string("ab"), &int(3)).unwrap(),
            Value::string("ababab")
        );
        assert_eq!(
            evaluate_binary(BinaryOp::Mul, &int(2), &Value::list(vec![int(0)])).unwrap(),
            Value::list(vec![int(0), int(0)])
        );
        // Negative counts yield the empty sequence.
        assert_eq!(
            evaluate_binary(BinaryOp::Mul, &Value::string("ab"), &int(-1)).unwrap(),
            Value::string("")
        );
    }

    #[test]
    fn bitwise_and_shifts() {
        assert_eq!(
            evaluate_binary(BinaryOp::BitAnd, &int(6), &int(3)).unwrap(),
            int(2)
        );
        assert_eq!(
            evaluate_binary(BinaryOp::BitOr, &int(6), &int(1)).unwrap(),
            int(7)
        );
        assert_eq!(
            evaluate_binary(BinaryOp::BitXor, &int(6), &int(3)).unwrap(),
            int(5)
        );
        assert_eq!(
            evaluate_binary(BinaryOp::Shl, &int(1), &int(4)).unwrap(),
            int(16)
        );
        assert_eq!(
            evaluate_binary(BinaryOp::Shr, &int(-16), &int(2)).unwrap(),
            int(-4)
        );
        assert_eq!(
            evaluate_binary(BinaryOp::Shl, &int(1), &int(64)).unwrap_err(),
            EvalError::ShiftOutOfRange { amount: 64 }
        );
        assert_eq!(
            evaluate_binary(BinaryOp::Shl, &int(1), &int(-1)).unwrap_err(),
            EvalError::ShiftOutOfRange { amount: -1 }
        );
        assert_eq!(
            evaluate_binary(BinaryOp::Shl, &int(i64::MAX), &int(1)).unwrap_err(),
            EvalError::IntegerOverflow { op: "left shift" }
        );
    }

    #[test]
    fn bitnot_is_twos_complement() {
        assert_eq!(evaluate_unary(UnaryOp::BitNot, &int(5)).unwrap(), int(-6));
        assert_eq!(evaluate_unary(UnaryOp::BitNot, &int(-1)).unwrap(), int(0));
    }

    #[test]
    fn booleans_count_as_ints() {
        assert_eq!(
            evaluate_binary(BinaryOp::Add, &Value::Bool(true), &int(1)).unwrap(),
            int(2)
        );
    }

    #[test]
    fn comparisons() {
        assert!(evaluate_compare(CmpOp::Lt, &int(0), &int(1)).unwrap());
        assert!(evaluate_compare(CmpOp::LtEq, &int(1), &Value::float(1.0)).unwrap());
        assert!(evaluate_compare(CmpOp::Eq, &Value::string("a"), &Value::string("a")).unwrap());
        assert!(
            evaluate_compare(CmpOp::Lt, &Value::string("abc"), &Value::string("abd")).unwrap()
        );
        assert_eq!(
            evaluate_compare(CmpOp::Lt, &int(1), &Value::string("a")).unwrap_err(),
            EvalError::NotOrderable {
                left: "int".into(),
                right: "str".into()
            }
        );
    }

    #[test]
    fn membership() {
        let list = Value::list(vec![int(1), int(2)]);
        assert!(evaluate_compare(CmpOp::In, &int(2), &list).unwrap());
        assert!(evaluate_compare(CmpOp::NotIn, &int(3), &list).unwrap());
        assert!(evaluate_compare(
            CmpOp::In,
            &Value::string("ell"),
            &Value::string("hello")
        )
        .unwrap());
        assert_eq!(
            evaluate_compare(CmpOp::In, &int(1), &int(2)).unwrap_err(),
            EvalError::NotContainer {
                type_name: "int".into()
            }
        );
    }
}
