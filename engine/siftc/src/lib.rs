//! Thin CLI/REPL over the sift engine.
//!
//! One expression per invocation, or an interactive loop; an optional flat
//! variable table supplies the namespace. The sandbox's job is to report,
//! not to crash the host: expression errors print as `Error: <message>`
//! and leave the exit status at zero. Only host faults (unreadable
//! variable table, malformed flags) are unrecoverable.

use sift_eval::{compile, CapabilityRegistry, Namespace, Value};
use std::io::{BufRead, Write};
use std::sync::Arc;

/// Install the stderr tracing subscriber, filtered by `RUST_LOG`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// Convert a JSON value into an engine value.
///
/// The namespace is flat data: objects are rejected rather than smuggled
/// in as opaque values.
pub fn json_to_value(json: &serde_json::Value) -> Result<Value, String> {
    match json {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::float(f))
            } else {
                Err(format!("number {n} is out of range"))
            }
        }
        serde_json::Value::String(s) => Ok(Value::string(s.clone())),
        serde_json::Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(json_to_value(item)?);
            }
            Ok(Value::list(out))
        }
        serde_json::Value::Object(_) => {
            Err("objects are not supported in the variable table".to_owned())
        }
    }
}

/// Parse a `--vars` file: one flat JSON object of name → value.
pub fn parse_vars_json(text: &str) -> Result<Namespace, String> {
    let json: serde_json::Value =
        serde_json::from_str(text).map_err(|e| format!("invalid JSON: {e}"))?;
    let serde_json::Value::Object(entries) = json else {
        return Err("variable table must be a JSON object".to_owned());
    };
    let mut ns = Namespace::default();
    for (name, value) in &entries {
        ns.insert(name.clone(), json_to_value(value)?);
    }
    Ok(ns)
}

/// Parse one `--var name=value` flag. The value is JSON if it parses as
/// JSON, otherwise a plain string.
pub fn parse_var_flag(flag: &str) -> Result<(String, Value), String> {
    let Some((name, raw)) = flag.split_once('=') else {
        return Err(format!("expected name=value, got '{flag}'"));
    };
    if name.is_empty() {
        return Err(format!("expected name=value, got '{flag}'"));
    }
    let value = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) => json_to_value(&json)?,
        Err(_) => Value::string(raw),
    };
    Ok((name.to_owned(), value))
}

/// Compile and evaluate one expression, reporting the value or the error
/// on stdout. Expression errors are reported, never propagated.
pub fn eval_and_print(registry: &Arc<CapabilityRegistry>, text: &str, namespace: &Namespace) {
    tracing::debug!(expr = text, "evaluating");
    match compile(text, registry) {
        Ok(compiled) => match compiled.eval(namespace) {
            Ok(value) => println!("{value}"),
            Err(err) => println!("Error: {err}"),
        },
        Err(err) => println!("Error: {err}"),
    }
}

/// Interactive loop: prompt, read, evaluate, repeat; an empty line exits.
pub fn repl(registry: &Arc<CapabilityRegistry>, namespace: &Namespace) -> std::io::Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        write!(stdout, "Compute: ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        eval_and_print(registry, line, namespace);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn json_scalars() {
        assert_eq!(
            json_to_value(&serde_json::json!(null)).unwrap(),
            Value::Null
        );
        assert_eq!(
            json_to_value(&serde_json::json!(true)).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            json_to_value(&serde_json::json!(42)).unwrap(),
            Value::int(42)
        );
        assert_eq!(
            json_to_value(&serde_json::json!(2.5)).unwrap(),
            Value::float(2.5)
        );
        assert_eq!(
            json_to_value(&serde_json::json!("hi")).unwrap(),
            Value::string("hi")
        );
    }

    #[test]
    fn json_arrays_nest() {
        assert_eq!(
            json_to_value(&serde_json::json!([1, "a"])).unwrap(),
            Value::list(vec![Value::int(1), Value::string("a")])
        );
    }

    #[test]
    fn json_objects_rejected() {
        assert!(json_to_value(&serde_json::json!({"a": 1})).is_err());
    }

    #[test]
    fn vars_file_must_be_object() {
        let ns = parse_vars_json(r#"{"a": 1, "s": "x"}"#).unwrap();
        assert_eq!(ns.get("a"), Some(&Value::int(1)));
        assert_eq!(ns.get("s"), Some(&Value::string("x")));
        assert!(parse_vars_json("[1, 2]").is_err());
        assert!(parse_vars_json("not json").is_err());
    }

    #[test]
    fn var_flag_json_or_string() {
        assert_eq!(
            parse_var_flag("n=3").unwrap(),
            ("n".to_owned(), Value::int(3))
        );
        assert_eq!(
            parse_var_flag("s=\"quoted\"").unwrap(),
            ("s".to_owned(), Value::string("quoted"))
        );
        // Unparseable JSON falls back to a raw string.
        assert_eq!(
            parse_var_flag("s=hello world").unwrap(),
            ("s".to_owned(), Value::string("hello world"))
        );
        assert!(parse_var_flag("novalue").is_err());
        assert!(parse_var_flag("=1").is_err());
    }
}
