//! The effective evaluation environment.
//!
//! Built once per `eval` call: the compile-time base bindings, plus the
//! caller's values for free variables, plus a small scope stack for the
//! comprehension variable. Nothing here is shared between calls.

use crate::compile::CompiledExpression;
use crate::errors::EvalError;
use crate::Namespace;
use rustc_hash::FxHashMap;
use sift_ir::Value;

/// Flat bindings plus a stack of comprehension locals (innermost last).
#[derive(Debug)]
pub(crate) struct Environment {
    bindings: FxHashMap<String, Value>,
    locals: Vec<(String, Value)>,
}

impl Environment {
    /// Build the effective environment for one evaluation.
    ///
    /// Fails fast with the ambiguous-name configuration error if the
    /// namespace supplies a value for a name the registry already binds in
    /// this expression — the host mis-supplied a namespace, and silent
    /// shadowing would be a capability question mark. The check is
    /// deterministic: the smallest colliding name is reported.
    pub fn build(
        compiled: &CompiledExpression,
        namespace: &Namespace,
    ) -> Result<Environment, EvalError> {
        let mut colliding: Option<&str> = None;
        for name in namespace.keys() {
            if compiled.base_environment().contains_key(name)
                && colliding.is_none_or(|current| name.as_str() < current)
            {
                colliding = Some(name);
            }
        }
        if let Some(name) = colliding {
            return Err(EvalError::AmbiguousName(name.to_owned()));
        }

        let mut bindings = compiled.base_environment().clone();
        for name in compiled.free_variables() {
            // Absent free variables stay unbound: a laziness-skipped branch
            // may never need them.
            if let Some(value) = namespace.get(name) {
                bindings.insert(name.clone(), value.clone());
            }
        }
        Ok(Environment {
            bindings,
            locals: Vec::new(),
        })
    }

    /// Look up a name, innermost comprehension scope first.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.locals
            .iter()
            .rev()
            .find(|(local, _)| local == name)
            .map(|(_, value)| value)
            .or_else(|| self.bindings.get(name))
    }

    /// Open a comprehension scope.
    pub fn push_local(&mut self, name: String, value: Value) {
        self.locals.push((name, value));
    }

    /// Rebind the innermost comprehension variable.
    pub fn set_local_top(&mut self, value: Value) {
        if let Some(top) = self.locals.last_mut() {
            top.1 = value;
        }
    }

    /// Close the innermost comprehension scope.
    pub fn pop_local(&mut self) {
        self.locals.pop();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::registry::CapabilityRegistry;
    use crate::{compile, Namespace};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn build_env(text: &str, namespace: &Namespace) -> Result<Environment, EvalError> {
        let registry = Arc::new(CapabilityRegistry::with_defaults());
        let compiled = compile(text, &registry).unwrap();
        Environment::build(&compiled, namespace)
    }

    #[test]
    fn free_variables_come_from_namespace() {
        let mut ns = Namespace::default();
        ns.insert("a".to_owned(), Value::int(1));
        let env = build_env("a + b", &ns).unwrap();
        assert_eq!(env.lookup("a"), Some(&Value::int(1)));
        assert_eq!(env.lookup("b"), None);
    }

    #[test]
    fn namespace_cannot_shadow_bound_names() {
        let mut ns = Namespace::default();
        ns.insert("len".to_owned(), Value::int(1));
        let err = build_env("len(a)", &ns).unwrap_err();
        assert_eq!(err, EvalError::AmbiguousName("len".to_owned()));
    }

    #[test]
    fn unreferenced_registry_names_may_appear_in_namespace() {
        // `len` is registry-bound but not referenced by this expression, so
        // supplying it is not ambiguous.
        let mut ns = Namespace::default();
        ns.insert("len".to_owned(), Value::int(1));
        ns.insert("a".to_owned(), Value::int(2));
        let env = build_env("a + 1", &ns).unwrap();
        assert_eq!(env.lookup("a"), Some(&Value::int(2)));
    }

    #[test]
    fn locals_shadow_bindings() {
        let mut ns = Namespace::default();
        ns.insert("x".to_owned(), Value::int(1));
        let mut env = build_env("x + 0", &ns).unwrap();
        env.push_local("x".to_owned(), Value::int(10));
        assert_eq!(env.lookup("x"), Some(&Value::int(10)));
        env.set_local_top(Value::int(20));
        assert_eq!(env.lookup("x"), Some(&Value::int(20)));
        env.pop_local();
        assert_eq!(env.lookup("x"), Some(&Value::int(1)));
    }
}
