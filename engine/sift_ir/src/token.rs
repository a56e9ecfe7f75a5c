//! Token types for the sift scanner.
//!
//! Keyword operators (`and`, `or`, `not`, `in`, `if`, `else`, `for`) are NOT
//! distinct token kinds: which words act as operators is host configuration
//! (see [`KeywordSet`](crate::KeywordSet)), so they lex as [`TokenKind::Ident`]
//! and acquire meaning downstream.

use super::Span;
use std::fmt;

/// A token with its span in the source.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }

    /// Create a dummy token for testing.
    pub fn dummy(kind: TokenKind) -> Self {
        Token {
            kind,
            span: Span::DUMMY,
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {}", self.kind, self.span)
    }
}

/// Token kinds for the sandbox expression grammar.
///
/// Float literals store bits as `u64` for Eq/Hash compatibility.
#[derive(Clone, Eq, PartialEq, Hash)]
pub enum TokenKind {
    /// Integer literal: 42, `1_000`
    Int(i64),
    /// Float literal: 3.14, 2.5e-8 (stored as bits for Eq/Hash)
    Float(u64),
    /// String literal, escapes already cooked: "hello", 'hello'
    Str(String),
    /// Identifier (includes words with keyword roles)
    Ident(String),

    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    Comma,    // ,
    Dot,      // .

    Eq,         // =
    EqEq,       // ==
    NotEq,      // !=
    Lt,         // <
    LtEq,       // <=
    Shl,        // <<
    Gt,         // >
    GtEq,       // >=
    Shr,        // >>
    Plus,       // +
    Minus,      // -
    Star,       // *
    StarStar,   // **
    Slash,      // /
    SlashSlash, // //
    Percent,    // %
    Amp,        // &
    Pipe,       // |
    Caret,      // ^
    Tilde,      // ~

    /// An `=`-suffixed compound operator the grammar has no use for
    /// (`+=`, `:=`, `<<=`, ...). Carried through so the validator can
    /// reject it with a positioned sandbox error rather than a lex error.
    CompoundAssign(String),

    Eof,

    /// Generic error token for unrecognized input.
    Error,
}

impl TokenKind {
    /// Create a float token from an `f64`.
    #[inline]
    pub fn float(value: f64) -> Self {
        TokenKind::Float(value.to_bits())
    }

    /// The float value, if this is a float token.
    #[inline]
    pub fn float_value(&self) -> Option<f64> {
        match self {
            TokenKind::Float(bits) => Some(f64::from_bits(*bits)),
            _ => None,
        }
    }

    /// Check if this token ends in `=` in source form (validator rule for
    /// assignment bans).
    pub fn ends_in_eq(&self) -> bool {
        matches!(
            self,
            TokenKind::Eq
                | TokenKind::EqEq
                | TokenKind::NotEq
                | TokenKind::LtEq
                | TokenKind::GtEq
                | TokenKind::CompoundAssign(_)
        )
    }

    /// Get a display name for the token.
    pub fn display_name(&self) -> &str {
        match self {
            TokenKind::Int(_) => "integer",
            TokenKind::Float(_) => "float",
            TokenKind::Str(_) => "string",
            TokenKind::Ident(_) => "identifier",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Eq => "=",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Shl => "<<",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::Shr => ">>",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::StarStar => "**",
            TokenKind::Slash => "/",
            TokenKind::SlashSlash => "//",
            TokenKind::Percent => "%",
            TokenKind::Amp => "&",
            TokenKind::Pipe => "|",
            TokenKind::Caret => "^",
            TokenKind::Tilde => "~",
            TokenKind::CompoundAssign(op) => op,
            TokenKind::Eof => "end of expression",
            TokenKind::Error => "error",
        }
    }
}

impl fmt::Debug for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int(n) => write!(f, "Int({n})"),
            TokenKind::Float(bits) => write!(f, "Float({})", f64::from_bits(*bits)),
            TokenKind::Str(s) => write!(f, "Str({s:?})"),
            TokenKind::Ident(name) => write!(f, "Ident({name})"),
            TokenKind::CompoundAssign(op) => write!(f, "CompoundAssign({op})"),
            _ => write!(f, "{}", self.display_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn float_roundtrip() {
        let kind = TokenKind::float(3.25);
        assert_eq!(kind.float_value(), Some(3.25));
    }

    #[test]
    fn float_eq_hash_via_bits() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(TokenKind::float(1.5));
        set.insert(TokenKind::float(1.5));
        set.insert(TokenKind::float(2.5));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn ends_in_eq_classification() {
        assert!(TokenKind::Eq.ends_in_eq());
        assert!(TokenKind::EqEq.ends_in_eq());
        assert!(TokenKind::NotEq.ends_in_eq());
        assert!(TokenKind::LtEq.ends_in_eq());
        assert!(TokenKind::GtEq.ends_in_eq());
        assert!(TokenKind::CompoundAssign("+=".into()).ends_in_eq());
        assert!(!TokenKind::Lt.ends_in_eq());
        assert!(!TokenKind::Plus.ends_in_eq());
    }

    #[test]
    fn token_debug_includes_span() {
        let tok = Token::new(TokenKind::Plus, Span::new(2, 3));
        assert_eq!(format!("{tok:?}"), "+ @ 2..3");
    }
}
