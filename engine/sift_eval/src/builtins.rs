//! Default builtin surface: the constants and functions a registry exposes
//! before the host adds anything.
//!
//! All builtins are positional-only (their calling convention exposes no
//! parameter names), so a keyword argument against them fails validation as
//! an unknown named parameter. Variadic ones validate arity themselves.

use crate::operators;
use sift_ir::{FunctionDescriptor, HostFn, Value};
use std::cmp::Ordering;

/// Default constants.
pub(crate) fn default_constants() -> Vec<(&'static str, Value)> {
    vec![
        ("True", Value::Bool(true)),
        ("False", Value::Bool(false)),
        ("None", Value::Null),
    ]
}

/// Default functions with their descriptors.
pub(crate) fn default_functions() -> Vec<(&'static str, HostFn, FunctionDescriptor)> {
    vec![
        ("abs", abs, FunctionDescriptor::positional(&["x"])),
        ("all", all, FunctionDescriptor::positional(&["iterable"])),
        ("any", any, FunctionDescriptor::positional(&["iterable"])),
        ("bin", bin, FunctionDescriptor::positional(&["x"])),
        ("chr", chr, FunctionDescriptor::positional(&["i"])),
        ("float", float, FunctionDescriptor::positional(&["x"])),
        ("hex", hex, FunctionDescriptor::positional(&["x"])),
        ("int", int, FunctionDescriptor::positional(&["x"])),
        ("len", len, FunctionDescriptor::positional(&["obj"])),
        ("max", max, FunctionDescriptor::variadic()),
        ("min", min, FunctionDescriptor::variadic()),
        ("oct", oct, FunctionDescriptor::positional(&["x"])),
        ("ord", ord, FunctionDescriptor::positional(&["c"])),
        ("pow", pow, FunctionDescriptor::positional(&["base", "exp"])),
        ("range", range, FunctionDescriptor::variadic()),
        ("round", round, FunctionDescriptor::variadic()),
        ("sorted", sorted, FunctionDescriptor::positional(&["iterable"])),
        ("str", str_, FunctionDescriptor::positional(&["object"])),
        ("sum", sum, FunctionDescriptor::variadic()),
    ]
}

/// Items of a sequence value: a list's elements, or a string's characters
/// as one-character strings.
fn seq_items(value: &Value) -> Result<Vec<Value>, String> {
    match value {
        Value::List(items) => Ok(items.as_ref().clone()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::string(c.to_string())).collect()),
        other => Err(format!("'{}' object is not iterable", other.type_name())),
    }
}

/// Ordering between two values, where one exists.
fn cmp_values(a: &Value, b: &Value) -> Result<Ordering, String> {
    #[allow(clippy::cast_precision_loss)]
    let ord = match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Int(x), Value::Float(y)) => (*x as f64)
            .partial_cmp(y)
            .ok_or_else(|| "float NaN is not orderable".to_owned())?,
        (Value::Float(x), Value::Int(y)) => x
            .partial_cmp(&(*y as f64))
            .ok_or_else(|| "float NaN is not orderable".to_owned())?,
        (Value::Float(x), Value::Float(y)) => x
            .partial_cmp(y)
            .ok_or_else(|| "float NaN is not orderable".to_owned())?,
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        _ => {
            return Err(format!(
                "'<' not supported between instances of '{}' and '{}'",
                a.type_name(),
                b.type_name()
            ));
        }
    };
    Ok(ord)
}

fn abs(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Int(n) => n
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| "integer overflow in abs()".to_owned()),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        other => Err(format!("bad operand type for abs(): '{}'", other.type_name())),
    }
}

fn all(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Bool(
        seq_items(&args[0])?.iter().all(Value::is_truthy),
    ))
}

fn any(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Bool(
        seq_items(&args[0])?.iter().any(Value::is_truthy),
    ))
}

fn to_radix(value: &Value, prefix: &str, render: impl Fn(u64) -> String) -> Result<Value, String> {
    match value {
        Value::Int(n) => {
            let sign = if *n < 0 { "-" } else { "" };
            Ok(Value::string(format!(
                "{sign}{prefix}{}",
                render(n.unsigned_abs())
            )))
        }
        other => Err(format!(
            "'{}' object cannot be interpreted as an integer",
            other.type_name()
        )),
    }
}

fn bin(args: &[Value]) -> Result<Value, String> {
    to_radix(&args[0], "0b", |n| format!("{n:b}"))
}

fn hex(args: &[Value]) -> Result<Value, String> {
    to_radix(&args[0], "0x", |n| format!("{n:x}"))
}

fn oct(args: &[Value]) -> Result<Value, String> {
    to_radix(&args[0], "0o", |n| format!("{n:o}"))
}

fn chr(args: &[Value]) -> Result<Value, String> {
    let Value::Int(code) = &args[0] else {
        return Err(format!(
            "'{}' object cannot be interpreted as an integer",
            args[0].type_name()
        ));
    };
    u32::try_from(*code)
        .ok()
        .and_then(char::from_u32)
        .map(|c| Value::string(c.to_string()))
        .ok_or_else(|| "chr() arg not in range(0x110000)".to_owned())
}

fn ord(args: &[Value]) -> Result<Value, String> {
    let Value::Str(s) = &args[0] else {
        return Err(format!(
            "ord() expected string of length 1, but {} found",
            args[0].type_name()
        ));
    };
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Value::int(i64::from(u32::from(c)))),
        _ => Err(format!(
            "ord() expected a character, but string of length {} found",
            s.chars().count()
        )),
    }
}

#[allow(clippy::cast_precision_loss)]
fn float(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| format!("could not convert string to float: '{s}'")),
        other => Err(format!(
            "float() argument must be a string or a number, not '{}'",
            other.type_name()
        )),
    }
}

fn int(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        #[allow(clippy::cast_possible_truncation)]
        Value::Float(f) => {
            let t = f.trunc();
            // i64 range check before the cast; 2^63 is exact in f64.
            if t >= -9_223_372_036_854_775_808.0 && t < 9_223_372_036_854_775_808.0 {
                Ok(Value::int(t as i64))
            } else {
                Err("float too large to convert to int".to_owned())
            }
        }
        Value::Bool(b) => Ok(Value::int(i64::from(*b))),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| format!("invalid literal for int(): '{s}'")),
        other => Err(format!(
            "int() argument must be a string or a number, not '{}'",
            other.type_name()
        )),
    }
}

fn len(args: &[Value]) -> Result<Value, String> {
    let n = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.len(),
        other => {
            return Err(format!(
                "object of type '{}' has no len()",
                other.type_name()
            ));
        }
    };
    i64::try_from(n)
        .map(Value::Int)
        .map_err(|_| "length does not fit in an integer".to_owned())
}

fn extremum(args: &[Value], name: &str, keep: Ordering) -> Result<Value, String> {
    let items = match args {
        [] => return Err(format!("{name} expected at least 1 argument, got 0")),
        [single] => seq_items(single)?,
        many => many.to_vec(),
    };
    let mut iter = items.into_iter();
    let Some(mut best) = iter.next() else {
        return Err(format!("{name}() arg is an empty sequence"));
    };
    for item in iter {
        if cmp_values(&item, &best)? == keep {
            best = item;
        }
    }
    Ok(best)
}

fn max(args: &[Value]) -> Result<Value, String> {
    extremum(args, "max", Ordering::Greater)
}

fn min(args: &[Value]) -> Result<Value, String> {
    extremum(args, "min", Ordering::Less)
}

fn pow(args: &[Value]) -> Result<Value, String> {
    operators::pow_values(&args[0], &args[1]).map_err(|e| e.to_string())
}

fn range(args: &[Value]) -> Result<Value, String> {
    let as_int = |v: &Value| -> Result<i64, String> {
        match v {
            Value::Int(n) => Ok(*n),
            other => Err(format!(
                "'{}' object cannot be interpreted as an integer",
                other.type_name()
            )),
        }
    };
    let (start, stop, step) = match args {
        [stop] => (0, as_int(stop)?, 1),
        [start, stop] => (as_int(start)?, as_int(stop)?, 1),
        [start, stop, step] => (as_int(start)?, as_int(stop)?, as_int(step)?),
        _ => {
            return Err(format!(
                "range expected at most 3 arguments, got {}",
                args.len()
            ));
        }
    };
    if step == 0 {
        return Err("range() arg 3 must not be zero".to_owned());
    }
    let mut items = Vec::new();
    let mut current = start;
    while (step > 0 && current < stop) || (step < 0 && current > stop) {
        items.push(Value::int(current));
        match current.checked_add(step) {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(Value::list(items))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn round(args: &[Value]) -> Result<Value, String> {
    let ndigits = match args {
        [_] => None,
        [_, Value::Int(n)] => Some(*n),
        [_, other] => {
            return Err(format!(
                "'{}' object cannot be interpreted as an integer",
                other.type_name()
            ));
        }
        _ => {
            return Err(format!(
                "round expected 1 or 2 arguments, got {}",
                args.len()
            ));
        }
    };
    match (&args[0], ndigits) {
        (Value::Int(n), None | Some(0)) => Ok(Value::int(*n)),
        (Value::Int(n), Some(d)) if d > 0 => Ok(Value::int(*n)),
        (Value::Int(n), Some(d)) => {
            // Negative ndigits rounds to tens, hundreds, ... with ties to
            // even, like the float path.
            let scale = 10f64.powi(d.unsigned_abs().min(18) as i32);
            let rounded = ((*n as f64) / scale).round_ties_even() * scale;
            Ok(Value::int(rounded as i64))
        }
        (Value::Float(f), None) => {
            let r = f.round_ties_even();
            if r >= -9_223_372_036_854_775_808.0 && r < 9_223_372_036_854_775_808.0 {
                Ok(Value::int(r as i64))
            } else {
                Err("float too large to round to int".to_owned())
            }
        }
        (Value::Float(f), Some(d)) => {
            let scale = 10f64.powi(d.clamp(-18, 18) as i32);
            Ok(Value::Float((f * scale).round_ties_even() / scale))
        }
        (other, _) => Err(format!(
            "type {} doesn't define a rounding behavior",
            other.type_name()
        )),
    }
}

fn sorted(args: &[Value]) -> Result<Value, String> {
    let mut items = seq_items(&args[0])?;
    // Validate comparability up front so the sort itself cannot fail.
    for pair in items.windows(2) {
        cmp_values(&pair[0], &pair[1])?;
    }
    items.sort_by(|a, b| cmp_values(a, b).unwrap_or(Ordering::Equal));
    Ok(Value::list(items))
}

fn str_(args: &[Value]) -> Result<Value, String> {
    Ok(Value::string(args[0].to_string()))
}

fn sum(args: &[Value]) -> Result<Value, String> {
    let items = match args {
        [seq] => seq_items(seq)?,
        [seq, start] => {
            let mut items = vec![start.clone()];
            items.extend(seq_items(seq)?);
            items
        }
        _ => {
            return Err(format!(
                "sum expected 1 or 2 arguments, got {}",
                args.len()
            ));
        }
    };
    let mut acc = Value::int(0);
    for item in items {
        acc = operators::add_values(&acc, &item).map_err(|e| e.to_string())?;
    }
    Ok(acc)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn abs_int_and_float() {
        assert_eq!(abs(&[Value::int(-4)]).unwrap(), Value::int(4));
        assert_eq!(abs(&[Value::float(-2.5)]).unwrap(), Value::float(2.5));
        assert!(abs(&[Value::int(i64::MIN)]).is_err());
    }

    #[test]
    fn radix_formatting() {
        assert_eq!(bin(&[Value::int(10)]).unwrap(), Value::string("0b1010"));
        assert_eq!(bin(&[Value::int(-5)]).unwrap(), Value::string("-0b101"));
        assert_eq!(hex(&[Value::int(255)]).unwrap(), Value::string("0xff"));
        assert_eq!(oct(&[Value::int(8)]).unwrap(), Value::string("0o10"));
    }

    #[test]
    fn chr_ord_roundtrip() {
        assert_eq!(chr(&[Value::int(97)]).unwrap(), Value::string("a"));
        assert_eq!(ord(&[Value::string("a")]).unwrap(), Value::int(97));
        assert!(chr(&[Value::int(-1)]).is_err());
        assert!(ord(&[Value::string("ab")]).is_err());
    }

    #[test]
    fn conversions() {
        assert_eq!(int(&[Value::string(" 42 ")]).unwrap(), Value::int(42));
        assert_eq!(int(&[Value::float(2.9)]).unwrap(), Value::int(2));
        assert_eq!(int(&[Value::float(-2.9)]).unwrap(), Value::int(-2));
        assert!(int(&[Value::string("1.5")]).is_err());
        assert_eq!(float(&[Value::int(2)]).unwrap(), Value::float(2.0));
        assert_eq!(
            float(&[Value::string("2.5")]).unwrap(),
            Value::float(2.5)
        );
        assert_eq!(str_(&[Value::float(3.0)]).unwrap(), Value::string("3.0"));
        assert_eq!(str_(&[Value::Null]).unwrap(), Value::string("None"));
    }

    #[test]
    fn len_counts_chars_and_items() {
        assert_eq!(len(&[Value::string("héllo")]).unwrap(), Value::int(5));
        assert_eq!(
            len(&[Value::list(vec![Value::int(1), Value::int(2)])]).unwrap(),
            Value::int(2)
        );
        assert!(len(&[Value::int(3)]).is_err());
    }

    #[test]
    fn max_min_over_args_and_sequences() {
        assert_eq!(
            max(&[Value::int(1), Value::int(3), Value::int(2)]).unwrap(),
            Value::int(3)
        );
        assert_eq!(
            min(&[Value::list(vec![Value::int(4), Value::int(2)])]).unwrap(),
            Value::int(2)
        );
        assert!(max(&[Value::list(vec![])]).is_err());
        assert!(max(&[]).is_err());
    }

    #[test]
    fn range_variants() {
        assert_eq!(
            range(&[Value::int(3)]).unwrap(),
            Value::list(vec![Value::int(0), Value::int(1), Value::int(2)])
        );
        assert_eq!(
            range(&[Value::int(1), Value::int(4)]).unwrap(),
            Value::list(vec![Value::int(1), Value::int(2), Value::int(3)])
        );
        assert_eq!(
            range(&[Value::int(5), Value::int(1), Value::int(-2)]).unwrap(),
            Value::list(vec![Value::int(5), Value::int(3)])
        );
        assert!(range(&[Value::int(0), Value::int(1), Value::int(0)]).is_err());
    }

    #[test]
    fn round_is_bankers() {
        assert_eq!(round(&[Value::float(2.5)]).unwrap(), Value::int(2));
        assert_eq!(round(&[Value::float(3.5)]).unwrap(), Value::int(4));
        assert_eq!(
            round(&[Value::float(2.675), Value::int(2)]).unwrap(),
            // Binary representation of 2.675 is just below the midpoint.
            Value::float(2.67)
        );
        assert_eq!(
            round(&[Value::int(1234), Value::int(-2)]).unwrap(),
            Value::int(1200)
        );
    }

    #[test]
    fn sorted_homogeneous() {
        assert_eq!(
            sorted(&[Value::list(vec![
                Value::int(3),
                Value::int(1),
                Value::int(2)
            ])])
            .unwrap(),
            Value::list(vec![Value::int(1), Value::int(2), Value::int(3)])
        );
        assert!(sorted(&[Value::list(vec![Value::int(1), Value::string("a")])]).is_err());
    }

    #[test]
    fn sum_ints_and_floats() {
        assert_eq!(
            sum(&[Value::list(vec![Value::int(1), Value::int(2)])]).unwrap(),
            Value::int(3)
        );
        assert_eq!(
            sum(&[Value::list(vec![Value::int(1), Value::float(0.5)])]).unwrap(),
            Value::float(1.5)
        );
        assert_eq!(
            sum(&[Value::list(vec![Value::int(1)]), Value::int(10)]).unwrap(),
            Value::int(11)
        );
    }

    #[test]
    fn all_any_truthiness() {
        assert_eq!(
            all(&[Value::list(vec![Value::int(1), Value::int(2)])]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            all(&[Value::list(vec![Value::int(1), Value::int(0)])]).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            any(&[Value::list(vec![Value::int(0), Value::int(0)])]).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(all(&[Value::list(vec![])]).unwrap(), Value::Bool(true));
        assert_eq!(any(&[Value::list(vec![])]).unwrap(), Value::Bool(false));
    }
}
