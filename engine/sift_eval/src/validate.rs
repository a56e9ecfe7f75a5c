//! The sandbox validator: a single left-to-right pass over the token
//! stream that enforces the syntax bans and classifies every identifier as
//! bound (resolvable from the registry) or free (must come from the
//! caller's namespace).
//!
//! Named-parameter legality is checked against the union of eligible names
//! across the functions mentioned to the left of the `=` — per-expression,
//! not per-call-site. An expression mentioning two functions with
//! overlapping parameter names can therefore pass validation for a label
//! only one of them accepts; the callee still rejects it at evaluation time
//! as an unexpected keyword argument, so this is a documented
//! simplification, not a capability leak.

use crate::errors::ExpressionError;
use crate::registry::CapabilityRegistry;
use rustc_hash::FxHashSet;
use sift_ir::{Token, TokenKind};

/// The validator's output: which names the registry resolves and which the
/// caller must supply.
#[derive(Clone, Debug, Default)]
pub(crate) struct NameClassification {
    pub bound_names: FxHashSet<String>,
    pub free_variables: FxHashSet<String>,
}

/// Single-pass validation. Fails on the first violation.
pub(crate) fn validate(
    tokens: &[Token],
    registry: &CapabilityRegistry,
) -> Result<NameClassification, ExpressionError> {
    let mut seen_names: FxHashSet<&str> = FxHashSet::default();
    let mut available_named_params: FxHashSet<&str> = FxHashSet::default();
    let mut prev: Option<&Token> = None;

    for (i, tok) in tokens.iter().enumerate() {
        match &tok.kind {
            TokenKind::Error => {
                return Err(ExpressionError::lexical_token(tok.span));
            }
            TokenKind::Ident(word) => {
                if matches!(prev.map(|t| &t.kind), Some(TokenKind::Dot)) {
                    // Attribute/method position.
                    if !registry.is_allowed_method(word) {
                        return Err(ExpressionError::illegal_method(tok.span, word));
                    }
                } else if registry.is_keyword(word) || registry.is_allowed_method(word) {
                    // Operators and method words are not value names.
                } else {
                    if let Some(descriptor) = registry.descriptor_for(word) {
                        available_named_params.extend(descriptor.named_parameter_names());
                    }
                    // An identifier directly followed by bare `=` is
                    // tentatively a keyword-argument label; the `=` token's
                    // own rule confirms its eligibility.
                    let labels_kwarg =
                        matches!(tokens.get(i + 1).map(|t| &t.kind), Some(TokenKind::Eq));
                    if !labels_kwarg {
                        seen_names.insert(word.as_str());
                    }
                }
            }
            TokenKind::Eq => match prev.map(|t| &t.kind) {
                Some(TokenKind::Ident(label)) => {
                    if !available_named_params.contains(label.as_str()) {
                        return Err(ExpressionError::no_such_named_parameter(tok.span, label));
                    }
                }
                _ => return Err(ExpressionError::malformed_assignment(tok.span)),
            },
            TokenKind::CompoundAssign(op) => {
                return Err(ExpressionError::illegal_operator(tok.span, op));
            }
            _ => {}
        }
        if !matches!(tok.kind, TokenKind::Eof) {
            prev = Some(tok);
        }
    }

    let mut classification = NameClassification::default();
    for name in seen_names {
        if registry.is_known_name(name) {
            classification.bound_names.insert(name.to_owned());
        } else {
            classification.free_variables.insert(name.to_owned());
        }
    }

    // Implied parameters of every referenced bound function must be
    // resolvable even though the author never writes them.
    let mut implied: Vec<String> = Vec::new();
    for name in &classification.bound_names {
        if let Some(descriptor) = registry.descriptor_for(name) {
            implied.extend(descriptor.implied_parameter_names().map(str::to_owned));
        }
    }
    for name in implied {
        if registry.is_known_name(&name) {
            classification.bound_names.insert(name);
        } else {
            classification.free_variables.insert(name);
        }
    }

    Ok(classification)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::registry::RegistryBuilder;
    use pretty_assertions::assert_eq;
    use sift_ir::{FunctionDescriptor, ParamSpec, Value};

    fn stub(args: &[Value]) -> Result<Value, String> {
        let _ = args;
        Ok(Value::Null)
    }

    fn test_registry() -> CapabilityRegistry {
        RegistryBuilder::with_defaults()
            .register(
                "add",
                stub,
                FunctionDescriptor::new(vec![ParamSpec::new("x"), ParamSpec::new("y")]).unwrap(),
            )
            .register(
                "add_d",
                stub,
                FunctionDescriptor::new(vec![ParamSpec::new("x"), ParamSpec::implied("d")])
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    fn classify(text: &str) -> Result<NameClassification, ExpressionError> {
        let tokens = sift_lexer::scan(text).unwrap();
        validate(&tokens, &test_registry())
    }

    fn names(set: &FxHashSet<String>) -> Vec<&str> {
        let mut v: Vec<&str> = set.iter().map(String::as_str).collect();
        v.sort_unstable();
        v
    }

    #[test]
    fn bound_vs_free() {
        let c = classify("add(b, len(s))").unwrap();
        assert_eq!(names(&c.bound_names), vec!["add", "len"]);
        assert_eq!(names(&c.free_variables), vec!["b", "s"]);
    }

    #[test]
    fn keywords_and_methods_not_classified() {
        let c = classify("a and 'x'.upper()").unwrap();
        assert_eq!(names(&c.free_variables), vec!["a"]);
        assert!(c.bound_names.is_empty());
    }

    #[test]
    fn illegal_method_rejected() {
        let err = classify("1 .bit_length()").unwrap_err();
        assert_eq!(err.to_string(), "Illegal method .bit_length");
    }

    #[test]
    fn allowed_method_passes() {
        assert!(classify("'a b'.split(' ')").is_ok());
    }

    #[test]
    fn kwarg_label_not_a_free_variable() {
        let c = classify("add(x=2, y=b)").unwrap();
        assert_eq!(names(&c.free_variables), vec!["b"]);
    }

    #[test]
    fn unknown_named_parameter_rejected() {
        let err = classify("add(add=2, y=1)").unwrap_err();
        assert_eq!(err.to_string(), "No such named parameter: add");
    }

    #[test]
    fn named_parameter_of_unreferenced_function_rejected() {
        // `d` is implied for add_d, and add_d is not mentioned anyway.
        let err = classify("add(d=2, y=1)").unwrap_err();
        assert_eq!(err.to_string(), "No such named parameter: d");
    }

    #[test]
    fn compound_assignment_rejected() {
        let err = classify("a += 1").unwrap_err();
        assert_eq!(err.to_string(), "Illegal operator +=");
        let err = classify("a := 1").unwrap_err();
        assert_eq!(err.to_string(), "Illegal operator :=");
    }

    #[test]
    fn bare_eq_without_label_rejected() {
        let err = classify("1 = 2").unwrap_err();
        assert_eq!(err.to_string(), "Syntax error");
    }

    #[test]
    fn comparisons_are_not_assignments() {
        assert!(classify("a == b <= c >= d != e").is_ok());
    }

    #[test]
    fn implied_parameter_becomes_free() {
        let c = classify("add_d(10)").unwrap();
        assert_eq!(names(&c.bound_names), vec!["add_d"]);
        assert_eq!(names(&c.free_variables), vec!["d"]);
    }

    #[test]
    fn implied_parameter_of_unreferenced_function_ignored() {
        let c = classify("add(1, 2)").unwrap();
        assert!(!c.free_variables.contains("d"));
    }

    #[test]
    fn constants_are_bound() {
        let c = classify("1 if True else x").unwrap();
        assert_eq!(names(&c.bound_names), vec!["True"]);
        assert_eq!(names(&c.free_variables), vec!["x"]);
    }
}
