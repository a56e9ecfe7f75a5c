//! Expression grammar for the sift expression engine.
//!
//! Recursive-descent parser from a validated token stream to an expression
//! tree. The precedence ladder is conventional: conditional, `or`, `and`,
//! `not`, chained comparison, `|`, `^`, `&`, shifts, additive,
//! multiplicative, unary sign, `**` (right-associative), postfix call and
//! method access, primary.
//!
//! Which of the seven keyword words (`and or not in if else for`) act as
//! operators comes from the host's [`KeywordSet`]; a withheld keyword leaves
//! its word an ordinary identifier and disables the syntax it carries.

mod error;
mod grammar;

pub use error::{ParseError, ParseErrorKind};

use sift_ir::ast::Expr;
use sift_ir::{Keyword, KeywordSet, Span, Token, TokenKind};

/// Parse a token stream into an expression tree.
///
/// The stream is expected to be trivia-free and `Eof`-terminated, as
/// produced by `sift_lexer::scan`. The whole stream must form one
/// expression; trailing tokens are an error.
pub fn parse(tokens: &[Token], keywords: &KeywordSet) -> Result<Expr, ParseError> {
    tracing::debug!(tokens = tokens.len(), "parsing expression");
    let mut parser = Parser {
        tokens,
        pos: 0,
        keywords,
    };
    if parser.at_eof() {
        return Err(ParseError::empty(parser.current_span()));
    }
    let expr = parser.parse_expr()?;
    if !parser.at_eof() {
        return Err(ParseError::trailing(
            parser.current_span(),
            parser.current_kind().display_name().to_owned(),
        ));
    }
    Ok(expr)
}

/// Parser state: a cursor over the token stream.
pub(crate) struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    keywords: &'a KeywordSet,
}

const EOF_TOKEN: Token = Token {
    kind: TokenKind::Eof,
    span: Span::DUMMY,
};

impl Parser<'_> {
    #[inline]
    pub(crate) fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&EOF_TOKEN)
    }

    #[inline]
    pub(crate) fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    #[inline]
    pub(crate) fn current_span(&self) -> Span {
        self.current().span
    }

    #[inline]
    pub(crate) fn bump(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    #[inline]
    pub(crate) fn at_eof(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    /// Consume the current token if it matches.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.current_kind() == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume the current token or fail with "expected X, found Y".
    pub(crate) fn expect(
        &mut self,
        kind: &TokenKind,
        expected: &'static str,
    ) -> Result<Span, ParseError> {
        if self.current_kind() == kind {
            let span = self.current_span();
            self.bump();
            Ok(span)
        } else {
            Err(ParseError::unexpected(
                self.current_span(),
                self.current_kind().display_name().to_owned(),
                expected,
            ))
        }
    }

    /// Token kind `offset` positions ahead of the current one.
    #[inline]
    pub(crate) fn nth_kind(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| &t.kind)
    }

    /// The keyword role of `word`, if it has one and the host enabled it.
    pub(crate) fn keyword_role(&self, word: &str) -> Option<Keyword> {
        Keyword::from_name(word).filter(|kw| self.keywords.contains(*kw))
    }

    /// Whether the current token is an enabled keyword operator.
    pub(crate) fn at_keyword(&self, kw: Keyword) -> bool {
        matches!(self.current_kind(), TokenKind::Ident(word)
            if word == kw.as_str() && self.keywords.contains(kw))
    }

    /// Whether the next token is an enabled keyword operator.
    pub(crate) fn next_is_keyword(&self, kw: Keyword) -> bool {
        matches!(self.tokens.get(self.pos + 1).map(|t| &t.kind), Some(TokenKind::Ident(word))
            if word == kw.as_str() && self.keywords.contains(kw))
    }

    /// Consume the current token if it is an enabled keyword operator.
    pub(crate) fn eat_keyword(&mut self, kw: Keyword) -> bool {
        if self.at_keyword(kw) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume an enabled keyword operator or fail.
    pub(crate) fn expect_keyword(
        &mut self,
        kw: Keyword,
        expected: &'static str,
    ) -> Result<Span, ParseError> {
        if self.at_keyword(kw) {
            let span = self.current_span();
            self.bump();
            Ok(span)
        } else {
            Err(ParseError::unexpected(
                self.current_span(),
                self.current_kind().display_name().to_owned(),
                expected,
            ))
        }
    }
}
