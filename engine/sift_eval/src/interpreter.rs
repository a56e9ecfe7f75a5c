//! The tree-walking evaluator.
//!
//! One `eval` call is strictly linear: build the effective environment,
//! parse the validated tokens, walk the tree, and either produce a value or
//! a terminal error. `and`/`or`, the conditional, and comparison chains
//! short-circuit; an untaken branch is never evaluated, so it may reference
//! absent free variables without failing.

use crate::compile::CompiledExpression;
use crate::environment::Environment;
use crate::errors::{EvalError, EvalResult};
use crate::{methods, operators, Namespace};
use sift_ir::ast::{BoolOp, Expr, ExprKind};
use sift_ir::{FunctionValue, Value};
use smallvec::SmallVec;
use std::collections::BTreeSet;

/// Evaluate a compiled expression against a namespace.
pub(crate) fn evaluate(compiled: &CompiledExpression, namespace: &Namespace) -> EvalResult {
    tracing::debug!(expr = compiled.normalized_text(), "evaluating expression");
    let mut env = Environment::build(compiled, namespace)?;
    let keywords = compiled.registry().keywords();
    let expr = sift_parse::parse(compiled.tokens(), &keywords)?;
    match eval_expr(&expr, &mut env, compiled) {
        Err(EvalError::MissingNames(failed)) => {
            // Report the full potentially-needed set when the failure is
            // about a name the caller could have supplied; otherwise the
            // failure is something else wearing a name (e.g. an identifier
            // excluded from classification) and propagates untouched.
            let missing: BTreeSet<String> = compiled
                .free_variables()
                .iter()
                .filter(|name| !namespace.contains_key(*name))
                .cloned()
                .collect();
            if failed.iter().any(|name| missing.contains(name)) {
                Err(EvalError::MissingNames(missing))
            } else {
                Err(EvalError::MissingNames(failed))
            }
        }
        other => other,
    }
}

fn eval_expr(
    expr: &Expr,
    env: &mut Environment,
    compiled: &CompiledExpression,
) -> EvalResult {
    match &expr.kind {
        ExprKind::Int(n) => Ok(Value::int(*n)),
        ExprKind::Float(f) => Ok(Value::float(*f)),
        ExprKind::Str(s) => Ok(Value::string(s.clone())),
        ExprKind::Name(name) => env.lookup(name).cloned().ok_or_else(|| {
            EvalError::MissingNames(BTreeSet::from([name.clone()]))
        }),
        ExprKind::Unary { op, operand } => {
            let value = eval_expr(operand, env, compiled)?;
            operators::evaluate_unary(*op, &value)
        }
        ExprKind::Binary { op, left, right } => {
            let left = eval_expr(left, env, compiled)?;
            let right = eval_expr(right, env, compiled)?;
            operators::evaluate_binary(*op, &left, &right)
        }
        ExprKind::Bool { op, left, right } => {
            let left = eval_expr(left, env, compiled)?;
            let take_right = match op {
                BoolOp::And => left.is_truthy(),
                BoolOp::Or => !left.is_truthy(),
            };
            if take_right {
                eval_expr(right, env, compiled)
            } else {
                Ok(left)
            }
        }
        ExprKind::Compare { first, rest } => {
            let mut prev = eval_expr(first, env, compiled)?;
            for (op, next) in rest {
                let next = eval_expr(next, env, compiled)?;
                if !operators::evaluate_compare(*op, &prev, &next)? {
                    return Ok(Value::Bool(false));
                }
                prev = next;
            }
            Ok(Value::Bool(true))
        }
        ExprKind::Conditional {
            test,
            if_true,
            if_false,
        } => {
            if eval_expr(test, env, compiled)?.is_truthy() {
                eval_expr(if_true, env, compiled)
            } else {
                eval_expr(if_false, env, compiled)
            }
        }
        ExprKind::Call {
            callee,
            args,
            kwargs,
        } => {
            let callee = eval_expr(callee, env, compiled)?;
            let Value::Function(function) = &callee else {
                return Err(EvalError::NotCallable {
                    type_name: callee.type_name().to_owned(),
                });
            };
            let mut arg_values: SmallVec<[Value; 4]> = SmallVec::new();
            for arg in args {
                arg_values.push(eval_expr(arg, env, compiled)?);
            }
            let mut kwarg_values = Vec::with_capacity(kwargs.len());
            for (name, value) in kwargs {
                kwarg_values.push((name.as_str(), eval_expr(value, env, compiled)?));
            }
            call_function(function, &arg_values, kwarg_values, env)
        }
        ExprKind::MethodCall {
            receiver,
            name,
            args,
        } => {
            // The validator already vetted the name; this re-check keeps
            // directly-constructed token streams inside the whitelist too.
            let receiver = eval_expr(receiver, env, compiled)?;
            if !compiled.registry().is_allowed_method(name) {
                return Err(EvalError::NoSuchMethod {
                    type_name: receiver.type_name().to_owned(),
                    name: name.clone(),
                });
            }
            let mut arg_values: SmallVec<[Value; 4]> = SmallVec::new();
            for arg in args {
                arg_values.push(eval_expr(arg, env, compiled)?);
            }
            methods::call_method(&receiver, name, &arg_values)
        }
        ExprKind::Comprehension {
            body,
            var,
            iter,
            filter,
        } => {
            let iter = eval_expr(iter, env, compiled)?;
            let items = iter_values(&iter)?;
            eval_comprehension(body, var, &items, filter.as_deref(), env, compiled)
        }
    }
}

/// Items produced by iterating a value: list elements, or a string's
/// characters as one-character strings.
fn iter_values(value: &Value) -> Result<Vec<Value>, EvalError> {
    match value {
        Value::List(items) => Ok(items.as_ref().clone()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::string(c.to_string())).collect()),
        other => Err(EvalError::NotIterable {
            type_name: other.type_name().to_owned(),
        }),
    }
}

fn eval_comprehension(
    body: &Expr,
    var: &str,
    items: &[Value],
    filter: Option<&Expr>,
    env: &mut Environment,
    compiled: &CompiledExpression,
) -> EvalResult {
    env.push_local(var.to_owned(), Value::Null);
    let mut out = Vec::new();
    let mut result = Ok(());
    for item in items {
        env.set_local_top(item.clone());
        if let Some(filter) = filter {
            match eval_expr(filter, env, compiled) {
                Ok(keep) if !keep.is_truthy() => continue,
                Ok(_) => {}
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }
        match eval_expr(body, env, compiled) {
            Ok(value) => out.push(value),
            Err(err) => {
                result = Err(err);
                break;
            }
        }
    }
    env.pop_local();
    result?;
    Ok(Value::list(out))
}

/// Bind arguments to a function's descriptor and invoke it.
///
/// Order: positional arguments fill parameters that accept them, keyword
/// arguments bind by name, implied parameters fill from the effective
/// environment unless explicitly overridden, remaining gaps take declared
/// defaults. The host function receives one fully-bound, ordered slice.
fn call_function(
    function: &FunctionValue,
    args: &[Value],
    kwargs: Vec<(&str, Value)>,
    env: &Environment,
) -> EvalResult {
    let descriptor = &function.descriptor;
    let params = descriptor.params();
    let mut slots: Vec<Option<Value>> = vec![None; params.len()];
    let mut extra: Vec<Value> = Vec::new();

    // Positional arguments, in declaration order, skipping parameters that
    // only bind by keyword.
    let positional_capacity = params
        .iter()
        .filter(|p| !p.keyword_only && !p.implied)
        .count();
    if args.len() > positional_capacity && !descriptor.is_variadic() {
        return Err(EvalError::TooManyArgs {
            function: function.name.to_string(),
            expected: positional_capacity,
            got: args.len(),
        });
    }
    let mut next_arg = 0usize;
    for (i, param) in params.iter().enumerate() {
        if param.keyword_only || param.implied {
            continue;
        }
        if next_arg >= args.len() {
            break;
        }
        slots[i] = Some(args[next_arg].clone());
        next_arg += 1;
    }
    extra.extend(args.iter().skip(next_arg).cloned());

    // Keyword arguments bind by name; explicit values win over implied
    // resolution. Positional-only parameters are never keyword targets.
    for (name, value) in kwargs {
        let Some(index) = params
            .iter()
            .position(|p| p.name == name && !p.positional_only)
        else {
            return Err(EvalError::UnexpectedKeywordArg {
                function: function.name.to_string(),
                name: name.to_owned(),
            });
        };
        if slots[index].is_some() {
            return Err(EvalError::DuplicateArg {
                function: function.name.to_string(),
                name: name.to_owned(),
            });
        }
        slots[index] = Some(value);
    }

    // Implied parameters resolve silently from the effective environment.
    let mut unresolved_implied = BTreeSet::new();
    for (i, param) in params.iter().enumerate() {
        if param.implied && slots[i].is_none() {
            match env.lookup(&param.name) {
                Some(value) => slots[i] = Some(value.clone()),
                None => {
                    unresolved_implied.insert(param.name.clone());
                }
            }
        }
    }
    if !unresolved_implied.is_empty() {
        return Err(EvalError::MissingNames(unresolved_implied));
    }

    // Defaults, then arity.
    let mut bound: Vec<Value> = Vec::with_capacity(params.len() + extra.len());
    for (slot, param) in slots.into_iter().zip(params) {
        match slot.or_else(|| param.default.clone()) {
            Some(value) => bound.push(value),
            None => {
                return Err(EvalError::MissingArg {
                    function: function.name.to_string(),
                    name: param.name.clone(),
                });
            }
        }
    }
    bound.extend(extra);

    (function.func)(&bound).map_err(|message| EvalError::Host {
        function: function.name.to_string(),
        message,
    })
}
