//! Whitelisted method dispatch.
//!
//! By the time a method call evaluates, the validator has already checked
//! the name against the registry's allowed-method set; dispatch here only
//! decides whether the receiver's type has that method. Opaque host objects
//! get the call forwarded through their [`HostObject`] seam.
//!
//! String behavior follows the expression language's conventions (character
//! indices, not byte offsets; `find` returns -1, `index` fails).

use crate::errors::{EvalError, EvalResult};
use sift_ir::{HostObject, Value};

/// Invoke a whitelisted method on a receiver.
pub(crate) fn call_method(receiver: &Value, name: &str, args: &[Value]) -> EvalResult {
    match receiver {
        Value::Str(s) => str_method(s, name, args),
        Value::List(items) => list_method(items, name, args),
        Value::Opaque(obj) => opaque_method(obj.as_ref(), name, args),
        other => Err(EvalError::NoSuchMethod {
            type_name: other.type_name().to_owned(),
            name: name.to_owned(),
        }),
    }
}

fn method_error(type_name: &str, method: &str, message: impl Into<String>) -> EvalError {
    EvalError::Method {
        type_name: type_name.to_owned(),
        method: method.to_owned(),
        message: message.into(),
    }
}

fn check_arity(
    type_name: &str,
    method: &str,
    args: &[Value],
    min: usize,
    max: usize,
) -> Result<(), EvalError> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            format!("{min}")
        } else {
            format!("{min} to {max}")
        };
        return Err(method_error(
            type_name,
            method,
            format!("expected {expected} arguments, got {}", args.len()),
        ));
    }
    Ok(())
}

fn str_arg<'a>(
    type_name: &str,
    method: &str,
    args: &'a [Value],
    index: usize,
) -> Result<&'a str, EvalError> {
    match &args[index] {
        Value::Str(s) => Ok(s),
        other => Err(method_error(
            type_name,
            method,
            format!(
                "argument {} must be str, not {}",
                index + 1,
                other.type_name()
            ),
        )),
    }
}

fn opaque_method(obj: &dyn HostObject, name: &str, args: &[Value]) -> EvalResult {
    obj.call_method(name, args)
        .map_err(|message| method_error(obj.type_name(), name, message))
}

/// Character index of `needle` in `haystack`, if present.
fn char_index_of(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .find(needle)
        .map(|byte_idx| haystack[..byte_idx].chars().count())
}

/// `true` if the string has at least one cased character and every cased
/// character passes `pred`.
fn all_cased(s: &str, pred: impl Fn(char) -> bool) -> bool {
    let mut any_cased = false;
    for c in s.chars() {
        if c.is_uppercase() || c.is_lowercase() {
            any_cased = true;
            if !pred(c) {
                return false;
            }
        }
    }
    any_cased
}

/// Minimal `format`: `{}` consumes the next argument, `{N}` picks one,
/// `{{`/`}}` escape the braces.
fn format_str(type_name: &str, template: &str, args: &[Value]) -> EvalResult {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut next_positional = 0usize;
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => field.push(c),
                        None => {
                            return Err(method_error(
                                type_name,
                                "format",
                                "single '{' in format string",
                            ));
                        }
                    }
                }
                let index = if field.is_empty() {
                    let i = next_positional;
                    next_positional += 1;
                    i
                } else {
                    field.parse::<usize>().map_err(|_| {
                        method_error(
                            type_name,
                            "format",
                            format!("unsupported format field '{{{field}}}'"),
                        )
                    })?
                };
                let value = args.get(index).ok_or_else(|| {
                    method_error(
                        type_name,
                        "format",
                        format!("replacement index {index} out of range"),
                    )
                })?;
                out.push_str(&value.to_string());
            }
            '}' => {
                return Err(method_error(
                    type_name,
                    "format",
                    "single '}' in format string",
                ));
            }
            c => out.push(c),
        }
    }
    Ok(Value::string(out))
}

#[allow(clippy::too_many_lines)]
fn str_method(s: &str, name: &str, args: &[Value]) -> EvalResult {
    const TY: &str = "str";
    match name {
        // The value model has no byte-string type; encode/decode survive as
        // validation-only passes that insist on utf-8.
        "encode" | "decode" => {
            check_arity(TY, name, args, 0, 1)?;
            if !args.is_empty() {
                let encoding = str_arg(TY, name, args, 0)?.to_ascii_lowercase();
                if !matches!(encoding.as_str(), "utf-8" | "utf8") {
                    return Err(method_error(
                        TY,
                        name,
                        format!("unknown encoding: {encoding}"),
                    ));
                }
            }
            Ok(Value::string(s.to_owned()))
        }
        "split" => {
            check_arity(TY, name, args, 0, 1)?;
            let parts: Vec<Value> = if args.is_empty() {
                s.split_whitespace().map(Value::string).collect()
            } else {
                let sep = str_arg(TY, name, args, 0)?;
                if sep.is_empty() {
                    return Err(method_error(TY, name, "empty separator"));
                }
                s.split(sep).map(Value::string).collect()
            };
            Ok(Value::list(parts))
        }
        "join" => {
            check_arity(TY, name, args, 1, 1)?;
            let Value::List(items) = &args[0] else {
                return Err(method_error(
                    TY,
                    name,
                    format!("can only join a list, not {}", args[0].type_name()),
                ));
            };
            let mut parts = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                match item {
                    Value::Str(part) => parts.push(part.as_ref()),
                    other => {
                        return Err(method_error(
                            TY,
                            name,
                            format!(
                                "sequence item {i}: expected str, {} found",
                                other.type_name()
                            ),
                        ));
                    }
                }
            }
            Ok(Value::string(parts.join(s)))
        }
        "upper" => {
            check_arity(TY, name, args, 0, 0)?;
            Ok(Value::string(s.to_uppercase()))
        }
        "lower" | "casefold" => {
            check_arity(TY, name, args, 0, 0)?;
            Ok(Value::string(s.to_lowercase()))
        }
        "replace" => {
            check_arity(TY, name, args, 2, 2)?;
            let old = str_arg(TY, name, args, 0)?;
            let new = str_arg(TY, name, args, 1)?;
            if old.is_empty() {
                return Err(method_error(TY, name, "empty pattern"));
            }
            Ok(Value::string(s.replace(old, new)))
        }
        "find" => {
            check_arity(TY, name, args, 1, 1)?;
            let needle = str_arg(TY, name, args, 0)?;
            let index = char_index_of(s, needle)
                .and_then(|i| i64::try_from(i).ok())
                .unwrap_or(-1);
            Ok(Value::int(index))
        }
        "index" => {
            check_arity(TY, name, args, 1, 1)?;
            let needle = str_arg(TY, name, args, 0)?;
            match char_index_of(s, needle).and_then(|i| i64::try_from(i).ok()) {
                Some(i) => Ok(Value::int(i)),
                None => Err(method_error(TY, name, "substring not found")),
            }
        }
        "format" => format_str(TY, s, args),
        "isalpha" => {
            check_arity(TY, name, args, 0, 0)?;
            Ok(Value::Bool(
                !s.is_empty() && s.chars().all(char::is_alphabetic),
            ))
        }
        "isdigit" | "isdecimal" => {
            check_arity(TY, name, args, 0, 0)?;
            Ok(Value::Bool(
                !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()),
            ))
        }
        "isnumeric" => {
            check_arity(TY, name, args, 0, 0)?;
            Ok(Value::Bool(!s.is_empty() && s.chars().all(char::is_numeric)))
        }
        "isascii" => {
            check_arity(TY, name, args, 0, 0)?;
            Ok(Value::Bool(s.is_ascii()))
        }
        "isidentifier" => {
            check_arity(TY, name, args, 0, 0)?;
            let mut chars = s.chars();
            let head_ok = chars
                .next()
                .is_some_and(|c| c.is_alphabetic() || c == '_');
            Ok(Value::Bool(
                head_ok && chars.all(|c| c.is_alphanumeric() || c == '_'),
            ))
        }
        "islower" => {
            check_arity(TY, name, args, 0, 0)?;
            Ok(Value::Bool(all_cased(s, |c| !c.is_uppercase())))
        }
        "isupper" => {
            check_arity(TY, name, args, 0, 0)?;
            Ok(Value::Bool(all_cased(s, |c| !c.is_lowercase())))
        }
        "isprintable" => {
            check_arity(TY, name, args, 0, 0)?;
            Ok(Value::Bool(s.chars().all(|c| !c.is_control())))
        }
        "isspace" => {
            check_arity(TY, name, args, 0, 0)?;
            Ok(Value::Bool(
                !s.is_empty() && s.chars().all(char::is_whitespace),
            ))
        }
        "strip" | "lstrip" | "rstrip" => {
            check_arity(TY, name, args, 0, 1)?;
            let trimmed = if args.is_empty() {
                match name {
                    "strip" => s.trim(),
                    "lstrip" => s.trim_start(),
                    _ => s.trim_end(),
                }
                .to_owned()
            } else {
                let set: Vec<char> = str_arg(TY, name, args, 0)?.chars().collect();
                let pred = |c: char| set.contains(&c);
                match name {
                    "strip" => s.trim_matches(pred),
                    "lstrip" => s.trim_start_matches(pred),
                    _ => s.trim_end_matches(pred),
                }
                .to_owned()
            };
            Ok(Value::string(trimmed))
        }
        "startswith" => {
            check_arity(TY, name, args, 1, 1)?;
            Ok(Value::Bool(s.starts_with(str_arg(TY, name, args, 0)?)))
        }
        "endswith" => {
            check_arity(TY, name, args, 1, 1)?;
            Ok(Value::Bool(s.ends_with(str_arg(TY, name, args, 0)?)))
        }
        "rjust" | "ljust" => {
            check_arity(TY, name, args, 1, 2)?;
            let Value::Int(width) = &args[0] else {
                return Err(method_error(TY, name, "width must be an integer"));
            };
            let fill = if args.len() == 2 {
                let fill = str_arg(TY, name, args, 1)?;
                let mut chars = fill.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => c,
                    _ => {
                        return Err(method_error(
                            TY,
                            name,
                            "the fill character must be exactly one character long",
                        ));
                    }
                }
            } else {
                ' '
            };
            let width = usize::try_from(*width).unwrap_or(0);
            let current = s.chars().count();
            let pad: String =
                std::iter::repeat(fill).take(width.saturating_sub(current)).collect();
            let out = if name == "rjust" {
                format!("{pad}{s}")
            } else {
                format!("{s}{pad}")
            };
            Ok(Value::string(out))
        }
        "zfill" => {
            check_arity(TY, name, args, 1, 1)?;
            let Value::Int(width) = &args[0] else {
                return Err(method_error(TY, name, "width must be an integer"));
            };
            let width = usize::try_from(*width).unwrap_or(0);
            let (sign, digits) = match s.strip_prefix(['+', '-']) {
                Some(rest) => (&s[..1], rest),
                None => ("", s),
            };
            let current = s.chars().count();
            let zeros = "0".repeat(width.saturating_sub(current));
            Ok(Value::string(format!("{sign}{zeros}{digits}")))
        }
        _ => Err(EvalError::NoSuchMethod {
            type_name: TY.to_owned(),
            name: name.to_owned(),
        }),
    }
}

fn list_method(items: &[Value], name: &str, args: &[Value]) -> EvalResult {
    const TY: &str = "list";
    match name {
        "index" => {
            check_arity(TY, name, args, 1, 1)?;
            match items.iter().position(|v| v == &args[0]) {
                Some(i) => i64::try_from(i)
                    .map(Value::Int)
                    .map_err(|_| method_error(TY, name, "index does not fit in an integer")),
                None => Err(method_error(
                    TY,
                    name,
                    format!("{} is not in list", args[0].repr()),
                )),
            }
        }
        _ => Err(EvalError::NoSuchMethod {
            type_name: TY.to_owned(),
            name: name.to_owned(),
        }),
    }
}
