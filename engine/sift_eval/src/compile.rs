//! The compiler: scan, validate, snapshot.
//!
//! A [`CompiledExpression`] is immutable after construction and safe to
//! evaluate any number of times, from any thread. It stores the validated
//! token stream rather than a tree: the grammar runs per evaluation, so a
//! grammar error (as opposed to a lexical or sandbox error) surfaces at
//! evaluation time.

use crate::errors::{CompileError, CompileErrorKind};
use crate::interpreter;
use crate::registry::CapabilityRegistry;
use crate::validate;
use crate::Namespace;
use rustc_hash::{FxHashMap, FxHashSet};
use sift_ir::{LineIndex, Token, Value};
use std::sync::Arc;

/// A compiled, reusable expression.
///
/// The registry outlives every compiled expression built against it (held
/// here by `Arc` back-reference); the expression owns its token stream and
/// base environment.
#[derive(Debug)]
pub struct CompiledExpression {
    source: Arc<str>,
    normalized: String,
    tokens: Vec<Token>,
    line_index: LineIndex,
    bound_names: FxHashSet<String>,
    free_variables: FxHashSet<String>,
    base_environment: FxHashMap<String, Value>,
    registry: Arc<CapabilityRegistry>,
}

/// Compile `text` against a registry.
///
/// Runs the scanner and the validator, then snapshots the bound bindings.
/// Pure and deterministic: the same `(text, registry)` always yields an
/// equivalent compiled expression.
pub fn compile(
    text: &str,
    registry: &Arc<CapabilityRegistry>,
) -> Result<CompiledExpression, CompileError> {
    tracing::debug!(len = text.len(), "compiling expression");
    let line_index = LineIndex::new(text);
    let tokens = sift_lexer::scan(text).map_err(|err| CompileError {
        position: line_index.line_col(err.span.start),
        kind: CompileErrorKind::Syntax(err),
    })?;
    let classification = validate::validate(&tokens, registry).map_err(|err| CompileError {
        position: line_index.line_col(err.span.start),
        kind: CompileErrorKind::Expression(err),
    })?;
    let mut base_environment = FxHashMap::default();
    for name in &classification.bound_names {
        if let Some(value) = registry.value_of(name) {
            base_environment.insert(name.clone(), value);
        }
    }
    Ok(CompiledExpression {
        normalized: sift_lexer::normalized_text(text, &tokens),
        source: Arc::from(text),
        tokens,
        line_index,
        bound_names: classification.bound_names,
        free_variables: classification.free_variables,
        base_environment,
        registry: Arc::clone(registry),
    })
}

impl CompiledExpression {
    /// Evaluate against a caller-supplied namespace.
    ///
    /// The namespace is read once and never mutated; absent free variables
    /// only matter if evaluation actually needs them.
    pub fn eval(&self, namespace: &Namespace) -> crate::EvalResult {
        interpreter::evaluate(self, namespace)
    }

    /// The original expression text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The expression with comments and layout normalized away.
    pub fn normalized_text(&self) -> &str {
        &self.normalized
    }

    /// The validated token stream.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Identifiers resolvable without caller input.
    pub fn bound_names(&self) -> &FxHashSet<String> {
        &self.bound_names
    }

    /// Identifiers the caller's namespace must supply.
    pub fn free_variables(&self) -> &FxHashSet<String> {
        &self.free_variables
    }

    /// The compile-time snapshot of bound bindings.
    pub(crate) fn base_environment(&self) -> &FxHashMap<String, Value> {
        &self.base_environment
    }

    /// The registry this expression was compiled against.
    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    /// Line/column of a byte offset in the original source.
    pub fn line_col(&self, offset: u32) -> sift_ir::LineCol {
        self.line_index.line_col(offset)
    }
}
