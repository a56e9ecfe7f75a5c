//! The capability registry: what an expression is allowed to reach.
//!
//! Construction is builder-style and validating; the built registry is
//! frozen. The host must opt every name in explicitly — that is the primary
//! control. The fixed unsafe-name blacklist is a defense-in-depth backstop
//! against a host opting in a name whose meaning elsewhere is code
//! execution or introspection, not the mechanism that makes the sandbox
//! safe.

use crate::builtins;
use rustc_hash::{FxHashMap, FxHashSet};
use sift_ir::{FunctionDescriptor, HostFn, Keyword, KeywordSet, Value};
use std::fmt;
use std::sync::Arc;

/// Names that may never be registered, whatever the host intends.
///
/// Immutable, process-wide data: attribute mutators, code
/// compile/exec/eval primitives, introspection, and the type machinery.
pub const KNOWN_UNSAFE_NAMES: &[&str] = &[
    "getattr",
    "setattr",
    "delattr",
    "vars",
    "open",
    "__import__",
    "compile",
    "exec",
    "eval",
    "globals",
    "locals",
    "memoryview",
    "__loader__",
    "__build_class__",
    "property",
    "staticmethod",
    "classmethod",
    "type",
    "object",
    "super",
    "dir",
];

/// Method names permitted after `.` by default: the string-processing
/// surface, which has no capability reach.
pub const DEFAULT_ALLOW_METHODS: &[&str] = &[
    "encode",
    "decode",
    "split",
    "join",
    "upper",
    "lower",
    "casefold",
    "replace",
    "find",
    "format",
    "isalpha",
    "isdigit",
    "isascii",
    "isdecimal",
    "isidentifier",
    "islower",
    "isupper",
    "isnumeric",
    "isprintable",
    "isspace",
    "strip",
    "lstrip",
    "rstrip",
    "startswith",
    "endswith",
    "rjust",
    "ljust",
    "zfill",
    "index",
];

/// A registered function: the callable and its calling convention.
#[derive(Clone)]
pub struct RegisteredFn {
    pub func: HostFn,
    pub descriptor: Arc<FunctionDescriptor>,
}

impl fmt::Debug for RegisteredFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredFn")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Registry construction failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A constant or function name collides with the unsafe-name blacklist.
    #[error("name '{0}' is on the unsafe-name blacklist and cannot be registered")]
    UnsafeName(String),
    /// An allowed-keyword override names a word with no keyword role.
    #[error("'{0}' is not a keyword operator")]
    UnknownKeyword(String),
}

/// Builder for a [`CapabilityRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    constants: FxHashMap<String, Value>,
    functions: FxHashMap<String, RegisteredFn>,
    keyword_override: Option<Vec<String>>,
    method_override: Option<FxHashSet<String>>,
}

impl RegistryBuilder {
    /// An empty capability surface: nothing reachable until opted in.
    pub fn new() -> Self {
        RegistryBuilder::default()
    }

    /// Start from the default surface (builtin constants and functions,
    /// all keywords, the string-method whitelist).
    pub fn with_defaults() -> Self {
        let mut builder = RegistryBuilder::new();
        for (name, value) in builtins::default_constants() {
            builder.constants.insert(name.to_owned(), value);
        }
        for (name, func, descriptor) in builtins::default_functions() {
            builder.functions.insert(
                name.to_owned(),
                RegisteredFn {
                    func,
                    descriptor: Arc::new(descriptor),
                },
            );
        }
        builder
    }

    /// Expose a constant. A later registration under the same name wins.
    #[must_use]
    pub fn constant(mut self, name: impl Into<String>, value: Value) -> Self {
        self.constants.insert(name.into(), value);
        self
    }

    /// Expose a function. A later registration under the same name wins,
    /// which lets a host shadow a default builtin with its own version.
    #[must_use]
    pub fn register(
        mut self,
        name: impl Into<String>,
        func: HostFn,
        descriptor: FunctionDescriptor,
    ) -> Self {
        self.functions.insert(
            name.into(),
            RegisteredFn {
                func,
                descriptor: Arc::new(descriptor),
            },
        );
        self
    }

    /// Override the allowed keyword operators.
    #[must_use]
    pub fn allow_keywords<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keyword_override = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Override the allowed method names.
    #[must_use]
    pub fn allow_methods<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.method_override = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Validate and freeze.
    pub fn build(self) -> Result<CapabilityRegistry, RegistryError> {
        for name in self.constants.keys().chain(self.functions.keys()) {
            if KNOWN_UNSAFE_NAMES.contains(&name.as_str()) {
                return Err(RegistryError::UnsafeName(name.clone()));
            }
        }
        let keywords = match &self.keyword_override {
            None => KeywordSet::ALL,
            Some(names) => {
                for name in names {
                    if Keyword::from_name(name).is_none() {
                        return Err(RegistryError::UnknownKeyword(name.clone()));
                    }
                }
                KeywordSet::from_names(names.iter().map(String::as_str))
            }
        };
        let methods = self.method_override.unwrap_or_else(|| {
            DEFAULT_ALLOW_METHODS
                .iter()
                .map(|&s| s.to_owned())
                .collect()
        });
        Ok(CapabilityRegistry {
            constants: self.constants,
            functions: self.functions,
            keywords,
            methods,
        })
    }
}

/// The frozen capability surface. Immutable; safe for unsynchronized
/// concurrent reads.
#[derive(Debug)]
pub struct CapabilityRegistry {
    constants: FxHashMap<String, Value>,
    functions: FxHashMap<String, RegisteredFn>,
    keywords: KeywordSet,
    methods: FxHashSet<String>,
}

impl CapabilityRegistry {
    /// The default surface with no host additions.
    ///
    /// Defaults are fixed data known to be blacklist-clean, so this cannot
    /// fail.
    pub fn with_defaults() -> Self {
        let mut constants = FxHashMap::default();
        for (name, value) in builtins::default_constants() {
            constants.insert(name.to_owned(), value);
        }
        let mut functions = FxHashMap::default();
        for (name, func, descriptor) in builtins::default_functions() {
            functions.insert(
                name.to_owned(),
                RegisteredFn {
                    func,
                    descriptor: Arc::new(descriptor),
                },
            );
        }
        CapabilityRegistry {
            constants,
            functions,
            keywords: KeywordSet::ALL,
            methods: DEFAULT_ALLOW_METHODS
                .iter()
                .map(|&s| s.to_owned())
                .collect(),
        }
    }

    /// Whether `name` is a registered constant or function.
    pub fn is_known_name(&self, name: &str) -> bool {
        self.constants.contains_key(name) || self.functions.contains_key(name)
    }

    /// Whether `name` may be invoked as a method after `.`.
    pub fn is_allowed_method(&self, name: &str) -> bool {
        self.methods.contains(name)
    }

    /// Whether `word` is an enabled keyword operator.
    pub fn is_keyword(&self, word: &str) -> bool {
        self.keywords.contains_word(word)
    }

    /// The enabled keyword operators.
    pub fn keywords(&self) -> KeywordSet {
        self.keywords
    }

    /// Calling convention of a registered function.
    pub fn descriptor_for(&self, name: &str) -> Option<&Arc<FunctionDescriptor>> {
        self.functions.get(name).map(|f| &f.descriptor)
    }

    /// The bound value for a known name: the constant itself, or the
    /// function as a value.
    pub fn value_of(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.constants.get(name) {
            return Some(value.clone());
        }
        self.functions.get(name).map(|f| {
            Value::function(name.to_owned(), f.func, Arc::clone(&f.descriptor))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sift_ir::ParamSpec;

    fn two(args: &[Value]) -> Result<Value, String> {
        let _ = args;
        Ok(Value::int(2))
    }

    #[test]
    fn defaults_know_builtins() {
        let registry = CapabilityRegistry::with_defaults();
        assert!(registry.is_known_name("len"));
        assert!(registry.is_known_name("True"));
        assert!(!registry.is_known_name("frobnicate"));
        assert!(registry.is_allowed_method("upper"));
        assert!(!registry.is_allowed_method("bit_length"));
        assert!(registry.is_keyword("and"));
        assert!(!registry.is_keyword("lambda"));
    }

    #[test]
    fn blacklist_rejects_registration() {
        let err = RegistryBuilder::with_defaults()
            .register("eval", two, FunctionDescriptor::nullary())
            .build()
            .unwrap_err();
        assert_eq!(err, RegistryError::UnsafeName("eval".into()));
    }

    #[test]
    fn blacklist_rejects_constants_too() {
        let err = RegistryBuilder::new()
            .constant("open", Value::int(1))
            .build()
            .unwrap_err();
        assert_eq!(err, RegistryError::UnsafeName("open".into()));
    }

    #[test]
    fn host_function_shadows_builtin() {
        let registry = RegistryBuilder::with_defaults()
            .register(
                "oct",
                two,
                FunctionDescriptor::new(vec![ParamSpec::new("x")]).unwrap(),
            )
            .build()
            .unwrap();
        let Some(Value::Function(f)) = registry.value_of("oct") else {
            panic!("oct should be a function");
        };
        assert_eq!((f.func)(&[]).unwrap(), Value::int(2));
    }

    #[test]
    fn keyword_override_validates_names() {
        let err = RegistryBuilder::new()
            .allow_keywords(["and", "lambda"])
            .build()
            .unwrap_err();
        assert_eq!(err, RegistryError::UnknownKeyword("lambda".into()));

        let registry = RegistryBuilder::new()
            .allow_keywords(["and", "or"])
            .build()
            .unwrap();
        assert!(registry.is_keyword("and"));
        assert!(!registry.is_keyword("for"));
    }

    #[test]
    fn method_override_replaces_default_set() {
        let registry = RegistryBuilder::new()
            .allow_methods(["upper"])
            .build()
            .unwrap();
        assert!(registry.is_allowed_method("upper"));
        assert!(!registry.is_allowed_method("lower"));
    }

    #[test]
    fn value_of_constant_and_function() {
        let registry = CapabilityRegistry::with_defaults();
        assert_eq!(registry.value_of("True"), Some(Value::Bool(true)));
        assert_eq!(registry.value_of("None"), Some(Value::Null));
        assert!(matches!(registry.value_of("abs"), Some(Value::Function(_))));
        assert_eq!(registry.value_of("nope"), None);
    }
}
