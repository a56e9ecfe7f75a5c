//! Scanner error types.
//!
//! Errors carry WHERE (`span`) and WHAT (`kind`); rendering to
//! line/column happens at the compile boundary where the source text is
//! available.

use sift_ir::Span;
use std::fmt;

/// A lexical error with its location.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct LexError {
    /// WHERE the error occurred.
    pub span: Span,
    /// WHAT went wrong.
    pub kind: LexErrorKind,
}

/// What kind of lexical error occurred.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum LexErrorKind {
    /// Missing closing quote for a string literal.
    UnterminatedString,
    /// Invalid escape in a string literal (e.g. `\q`).
    InvalidEscape { escape_char: char },
    /// A byte or character the grammar has no use for.
    InvalidChar { ch: char },
    /// Integer literal does not fit in 64 bits.
    IntOverflow,
    /// Float literal could not be parsed.
    FloatParse,
    /// Exponent marker with no digits (e.g. `1.5e`).
    EmptyExponent,
    /// Numeric literal ends in `_` or has `__`.
    MalformedUnderscore,
    /// Source exceeds the addressable span range.
    SourceTooLarge,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LexErrorKind::UnterminatedString => f.write_str("unterminated string literal"),
            LexErrorKind::InvalidEscape { escape_char } => {
                write!(f, "invalid escape '\\{escape_char}' in string literal")
            }
            LexErrorKind::InvalidChar { ch } => write!(f, "invalid character {ch:?}"),
            LexErrorKind::IntOverflow => f.write_str("integer literal too large"),
            LexErrorKind::FloatParse => f.write_str("malformed float literal"),
            LexErrorKind::EmptyExponent => f.write_str("exponent has no digits"),
            LexErrorKind::MalformedUnderscore => {
                f.write_str("misplaced underscore in numeric literal")
            }
            LexErrorKind::SourceTooLarge => f.write_str("expression source too large"),
        }
    }
}

impl std::error::Error for LexError {}

impl LexError {
    #[cold]
    pub fn unterminated_string(span: Span) -> Self {
        LexError {
            span,
            kind: LexErrorKind::UnterminatedString,
        }
    }

    #[cold]
    pub fn invalid_escape(span: Span, escape_char: char) -> Self {
        LexError {
            span,
            kind: LexErrorKind::InvalidEscape { escape_char },
        }
    }

    #[cold]
    pub fn invalid_char(span: Span, ch: char) -> Self {
        LexError {
            span,
            kind: LexErrorKind::InvalidChar { ch },
        }
    }

    #[cold]
    pub fn int_overflow(span: Span) -> Self {
        LexError {
            span,
            kind: LexErrorKind::IntOverflow,
        }
    }

    #[cold]
    pub fn float_parse(span: Span) -> Self {
        LexError {
            span,
            kind: LexErrorKind::FloatParse,
        }
    }

    #[cold]
    pub fn empty_exponent(span: Span) -> Self {
        LexError {
            span,
            kind: LexErrorKind::EmptyExponent,
        }
    }

    #[cold]
    pub fn malformed_underscore(span: Span) -> Self {
        LexError {
            span,
            kind: LexErrorKind::MalformedUnderscore,
        }
    }

    #[cold]
    pub fn source_too_large() -> Self {
        LexError {
            span: Span::DUMMY,
            kind: LexErrorKind::SourceTooLarge,
        }
    }
}
