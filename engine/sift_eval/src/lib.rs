//! Capability-sandboxed expression evaluation.
//!
//! A host declares which functions, constants, keyword operators, and
//! method names an expression may use ([`RegistryBuilder`] →
//! [`CapabilityRegistry`]); [`compile`] rejects any expression that would
//! reach outside that set before anything runs; the resulting
//! [`CompiledExpression`] evaluates any number of times against
//! caller-supplied namespaces.
//!
//! ```
//! use sift_eval::{compile, CapabilityRegistry, Namespace, Value};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(CapabilityRegistry::with_defaults());
//! let expr = compile("max(a, 10) * 2", &registry)?;
//!
//! let mut ns = Namespace::default();
//! ns.insert("a".to_owned(), Value::int(21));
//! assert_eq!(expr.eval(&ns)?, Value::int(42));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! There is no timeout and no resource ceiling in the engine itself: a
//! host that must bound evaluation cost (pathological exponents,
//! comprehension sizes) imposes its own limits around the `eval` call.
//! Whitelisting controls reach, not expense.

mod builtins;
mod compile;
mod environment;
mod errors;
mod interpreter;
mod methods;
mod operators;
mod registry;
mod validate;

pub use compile::{compile, CompiledExpression};
pub use errors::{
    CompileError, CompileErrorKind, EvalError, EvalResult, ExpressionError, ExpressionErrorKind,
};
pub use registry::{
    CapabilityRegistry, RegisteredFn, RegistryBuilder, RegistryError, DEFAULT_ALLOW_METHODS,
    KNOWN_UNSAFE_NAMES,
};

// The host-facing vocabulary from the IR crate.
pub use sift_ir::{
    DescriptorError, FunctionDescriptor, FunctionValue, HostFn, HostObject, LineCol, ParamSpec,
    Span, Value,
};

/// A caller-supplied variable table for one evaluation.
pub type Namespace = rustc_hash::FxHashMap<String, Value>;
