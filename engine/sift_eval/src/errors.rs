//! Public error taxonomy.
//!
//! Four kinds, split across the two entry points:
//! - compile: [`CompileError`] wrapping a lexical error or a sandbox-rule
//!   violation, both positioned;
//! - evaluate: [`EvalError`], either the recoverable missing-names case
//!   (the caller can retry with a fuller namespace), the ambiguous-name
//!   configuration fault, or an opaque evaluation failure.
//!
//! Nothing is swallowed and nothing retries: every error is terminal for
//! the call that produced it.

use sift_lexer::LexError;
use sift_parse::ParseError;
use sift_ir::{LineCol, Span};
use std::collections::BTreeSet;
use std::fmt;

/// A sandbox-rule violation found by the validator.
///
/// Always the expression author's fault, always positioned.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ExpressionError {
    pub span: Span,
    pub kind: ExpressionErrorKind,
}

/// What sandbox rule was violated.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum ExpressionErrorKind {
    /// `.name` where `name` is not a whitelisted method.
    IllegalMethod { name: String },
    /// Bare `=` whose label is not a named parameter of any referenced
    /// function.
    NoSuchNamedParameter { name: String },
    /// A compound-assignment operator (`+=`, `:=`, ...).
    IllegalOperator { op: String },
    /// Bare `=` not preceded by an identifier.
    MalformedAssignment,
    /// An error token in the stream.
    LexicalToken,
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExpressionErrorKind::IllegalMethod { name } => {
                write!(f, "Illegal method .{name}")
            }
            ExpressionErrorKind::NoSuchNamedParameter { name } => {
                write!(f, "No such named parameter: {name}")
            }
            ExpressionErrorKind::IllegalOperator { op } => {
                write!(f, "Illegal operator {op}")
            }
            ExpressionErrorKind::MalformedAssignment | ExpressionErrorKind::LexicalToken => {
                f.write_str("Syntax error")
            }
        }
    }
}

impl std::error::Error for ExpressionError {}

impl ExpressionError {
    #[cold]
    pub fn illegal_method(span: Span, name: impl Into<String>) -> Self {
        ExpressionError {
            span,
            kind: ExpressionErrorKind::IllegalMethod { name: name.into() },
        }
    }

    #[cold]
    pub fn no_such_named_parameter(span: Span, name: impl Into<String>) -> Self {
        ExpressionError {
            span,
            kind: ExpressionErrorKind::NoSuchNamedParameter { name: name.into() },
        }
    }

    #[cold]
    pub fn illegal_operator(span: Span, op: impl Into<String>) -> Self {
        ExpressionError {
            span,
            kind: ExpressionErrorKind::IllegalOperator { op: op.into() },
        }
    }

    #[cold]
    pub fn malformed_assignment(span: Span) -> Self {
        ExpressionError {
            span,
            kind: ExpressionErrorKind::MalformedAssignment,
        }
    }

    #[cold]
    pub fn lexical_token(span: Span) -> Self {
        ExpressionError {
            span,
            kind: ExpressionErrorKind::LexicalToken,
        }
    }
}

/// Compile-time failure: lexical or sandbox-rule, with its source position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileError {
    pub position: LineCol,
    pub kind: CompileErrorKind,
}

/// Which compile pass failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// Malformed token stream.
    Syntax(LexError),
    /// Sandbox-rule violation over well-formed tokens.
    Expression(ExpressionError),
}

impl CompileError {
    /// 1-based source line of the error.
    pub fn line(&self) -> u32 {
        self.position.line
    }

    /// 1-based source column of the error.
    pub fn column(&self) -> u32 {
        self.position.column
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: ", self.position)?;
        match &self.kind {
            CompileErrorKind::Syntax(err) => write!(f, "{err}"),
            CompileErrorKind::Expression(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CompileError {}

/// Render the missing-name set the way the caller reads it.
fn missing_names_display(names: &BTreeSet<String>) -> String {
    if names.len() == 1 {
        let name = names.iter().next().map(String::as_str).unwrap_or_default();
        format!("No value for name '{name}'")
    } else {
        let joined: Vec<&str> = names.iter().map(String::as_str).collect();
        format!("No value for names: {}", joined.join(", "))
    }
}

/// Evaluation-time failure.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// Free variables the namespace did not supply. Recoverable: the caller
    /// can retry with a fuller namespace. The set is the full
    /// potentially-needed one; laziness may have made some entries
    /// irrelevant to the particular evaluation that failed.
    #[error("{}", missing_names_display(.0))]
    MissingNames(BTreeSet<String>),

    /// The namespace supplies a name that is already bound by the registry:
    /// a host configuration fault, not an author or caller mistake.
    #[error("'{0}' is ambiguous")]
    AmbiguousName(String),

    /// Grammar error, detected when the validated token stream is parsed at
    /// evaluation time.
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("division by zero")]
    DivisionByZero,

    #[error("modulo by zero")]
    ModuloByZero,

    #[error("integer overflow in {op}")]
    IntegerOverflow { op: &'static str },

    #[error("shift amount {amount} out of range (0-63)")]
    ShiftOutOfRange { amount: i64 },

    #[error("unsupported operand type(s) for {op}: {left} and {right}")]
    InvalidBinaryOp {
        op: &'static str,
        left: String,
        right: String,
    },

    #[error("bad operand type for unary {op}: {type_name}")]
    InvalidUnaryOp {
        op: &'static str,
        type_name: String,
    },

    #[error("'{left}' and '{right}' are not orderable")]
    NotOrderable { left: String, right: String },

    #[error("argument of type '{type_name}' is not a container")]
    NotContainer { type_name: String },

    #[error("'{type_name}' object is not iterable")]
    NotIterable { type_name: String },

    #[error("'{type_name}' object is not callable")]
    NotCallable { type_name: String },

    #[error("'{type_name}' object has no method '{name}'")]
    NoSuchMethod { type_name: String, name: String },

    #[error("{function}() got an unexpected keyword argument '{name}'")]
    UnexpectedKeywordArg { function: String, name: String },

    #[error("{function}() got multiple values for argument '{name}'")]
    DuplicateArg { function: String, name: String },

    #[error("{function}() takes {expected} positional arguments but {got} were given")]
    TooManyArgs {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("{function}() missing required argument '{name}'")]
    MissingArg { function: String, name: String },

    /// A host function rejected the call.
    #[error("{function}: {message}")]
    Host { function: String, message: String },

    /// A whitelisted method rejected the call.
    #[error("{type_name}.{method}: {message}")]
    Method {
        type_name: String,
        method: String,
        message: String,
    },
}

/// Shorthand result for evaluation.
pub type EvalResult = Result<sift_ir::Value, EvalError>;
