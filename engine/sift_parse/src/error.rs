//! Parser error types.

use sift_ir::Span;
use std::fmt;

/// A grammar error with its location.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ParseError {
    /// WHERE the error occurred.
    pub span: Span,
    /// WHAT went wrong.
    pub kind: ParseErrorKind,
}

/// What kind of grammar error occurred.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum ParseErrorKind {
    /// The expression has no tokens.
    EmptyExpression,
    /// A token that cannot appear here.
    Unexpected {
        found: String,
        expected: &'static str,
    },
    /// Input continues past a complete expression.
    TrailingInput { found: String },
    /// `.name` not followed by a call: attribute access is only valid as a
    /// method invocation.
    MethodNotCalled { name: String },
    /// A positional argument after a keyword argument.
    PositionalAfterKeyword,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ParseErrorKind::EmptyExpression => f.write_str("empty expression"),
            ParseErrorKind::Unexpected { found, expected } => {
                write!(f, "expected {expected}, found {found}")
            }
            ParseErrorKind::TrailingInput { found } => {
                write!(f, "unexpected {found} after expression")
            }
            ParseErrorKind::MethodNotCalled { name } => {
                write!(f, "method .{name} must be called")
            }
            ParseErrorKind::PositionalAfterKeyword => {
                f.write_str("positional argument follows keyword argument")
            }
        }
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    #[cold]
    pub fn empty(span: Span) -> Self {
        ParseError {
            span,
            kind: ParseErrorKind::EmptyExpression,
        }
    }

    #[cold]
    pub fn unexpected(span: Span, found: impl Into<String>, expected: &'static str) -> Self {
        ParseError {
            span,
            kind: ParseErrorKind::Unexpected {
                found: found.into(),
                expected,
            },
        }
    }

    #[cold]
    pub fn trailing(span: Span, found: impl Into<String>) -> Self {
        ParseError {
            span,
            kind: ParseErrorKind::TrailingInput {
                found: found.into(),
            },
        }
    }

    #[cold]
    pub fn method_not_called(span: Span, name: impl Into<String>) -> Self {
        ParseError {
            span,
            kind: ParseErrorKind::MethodNotCalled { name: name.into() },
        }
    }

    #[cold]
    pub fn positional_after_keyword(span: Span) -> Self {
        ParseError {
            span,
            kind: ParseErrorKind::PositionalAfterKeyword,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_messages() {
        assert_eq!(
            ParseError::unexpected(Span::DUMMY, ")", "an expression").to_string(),
            "expected an expression, found )"
        );
        assert_eq!(
            ParseError::method_not_called(Span::DUMMY, "upper").to_string(),
            "method .upper must be called"
        );
    }
}
