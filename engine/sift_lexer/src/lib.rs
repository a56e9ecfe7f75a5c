//! Scanner for the sift expression engine.
//!
//! [`scan`] turns raw expression text into a trivia-free, position-tagged
//! token stream. Comments and layout are discarded; an expression may span
//! multiple physical lines without continuation markers. The pass is pure:
//! same text, same tokens.

mod cursor;
mod lex_error;

pub use lex_error::{LexError, LexErrorKind};

use cursor::Cursor;
use sift_ir::{Span, Token, TokenKind};

/// Tokenize `text`.
///
/// Returns the token stream (terminated by [`TokenKind::Eof`]) or the first
/// lexical error with a precise span.
pub fn scan(text: &str) -> Result<Vec<Token>, LexError> {
    if u32::try_from(text.len()).is_err() {
        return Err(LexError::source_too_large());
    }
    let mut scanner = Scanner {
        text,
        cursor: Cursor::new(text.as_bytes()),
        tokens: Vec::new(),
    };
    scanner.run()?;
    Ok(scanner.tokens)
}

/// Rejoin token texts into a single-line normalized form.
///
/// Tokens separated only by same-line layout get a single space; tokens
/// separated by a line break (or a comment, which always ends at one) get a
/// fixed two-space gap; directly adjacent tokens stay adjacent. Original
/// formatting and comments are discarded.
pub fn normalized_text(source: &str, tokens: &[Token]) -> String {
    let mut out = String::with_capacity(source.len());
    let mut prev_end: Option<u32> = None;
    for tok in tokens {
        if tok.kind == TokenKind::Eof {
            break;
        }
        if let Some(end) = prev_end {
            let gap = &source[end as usize..tok.span.start as usize];
            if gap.contains('\n') {
                out.push_str("  ");
            } else if !gap.is_empty() {
                out.push(' ');
            }
        }
        out.push_str(&source[tok.span.to_range()]);
        prev_end = Some(tok.span.end);
    }
    out
}

struct Scanner<'a> {
    text: &'a str,
    cursor: Cursor<'a>,
    tokens: Vec<Token>,
}

impl Scanner<'_> {
    fn run(&mut self) -> Result<(), LexError> {
        loop {
            self.skip_trivia();
            if self.cursor.is_eof() {
                let at = self.cursor.pos();
                self.tokens.push(Token::new(TokenKind::Eof, Span::point(at)));
                return Ok(());
            }
            let start = self.cursor.pos();
            let b = self.cursor.current();
            let kind = match b {
                b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_ident(),
                b'0'..=b'9' => self.scan_number(false)?,
                b'.' if self.cursor.peek().is_ascii_digit() => self.scan_number(true)?,
                b'"' | b'\'' => self.scan_string()?,
                _ => self.scan_operator()?,
            };
            let span = Span::new(start, self.cursor.pos());
            self.tokens.push(Token::new(kind, span));
        }
    }

    /// Skip whitespace and `#` comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.cursor.current() {
                b' ' | b'\t' | b'\r' | b'\n' => self.cursor.bump(),
                b'#' => {
                    while !self.cursor.is_eof() && self.cursor.current() != b'\n' {
                        self.cursor.bump();
                    }
                }
                _ => return,
            }
        }
    }

    fn scan_ident(&mut self) -> TokenKind {
        let start = self.cursor.pos();
        while matches!(self.cursor.current(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.cursor.bump();
        }
        let text = &self.text[start as usize..self.cursor.pos() as usize];
        TokenKind::Ident(text.to_owned())
    }

    /// Scan an int or float literal. `leading_dot` means the literal starts
    /// with `.` (e.g. `.5`).
    fn scan_number(&mut self, leading_dot: bool) -> Result<TokenKind, LexError> {
        let start = self.cursor.pos();
        let mut is_float = leading_dot;
        if leading_dot {
            self.cursor.bump(); // '.'
            self.eat_digits(start)?;
        } else {
            self.eat_digits(start)?;
            if self.cursor.current() == b'.' {
                is_float = true;
                self.cursor.bump();
                if self.cursor.current().is_ascii_digit() {
                    self.eat_digits(start)?;
                }
            }
        }
        if matches!(self.cursor.current(), b'e' | b'E') {
            is_float = true;
            self.cursor.bump();
            if matches!(self.cursor.current(), b'+' | b'-') {
                self.cursor.bump();
            }
            if !self.cursor.current().is_ascii_digit() {
                return Err(LexError::empty_exponent(Span::new(start, self.cursor.pos())));
            }
            self.eat_digits(start)?;
        }
        let span = Span::new(start, self.cursor.pos());
        let raw = &self.text[span.to_range()];
        let digits: String = raw.chars().filter(|&c| c != '_').collect();
        if is_float {
            digits
                .parse::<f64>()
                .map(TokenKind::float)
                .map_err(|_| LexError::float_parse(span))
        } else {
            digits
                .parse::<i64>()
                .map(TokenKind::Int)
                .map_err(|_| LexError::int_overflow(span))
        }
    }

    /// Consume a run of digits with `_` separators; an underscore must sit
    /// between two digits.
    fn eat_digits(&mut self, literal_start: u32) -> Result<(), LexError> {
        let mut prev_underscore = false;
        let mut seen_digit = false;
        loop {
            match self.cursor.current() {
                b'0'..=b'9' => {
                    seen_digit = true;
                    prev_underscore = false;
                    self.cursor.bump();
                }
                b'_' => {
                    if prev_underscore || !seen_digit {
                        return Err(LexError::malformed_underscore(Span::new(
                            literal_start,
                            self.cursor.pos() + 1,
                        )));
                    }
                    prev_underscore = true;
                    self.cursor.bump();
                }
                _ => break,
            }
        }
        if prev_underscore {
            return Err(LexError::malformed_underscore(Span::new(
                literal_start,
                self.cursor.pos(),
            )));
        }
        Ok(())
    }

    fn scan_string(&mut self) -> Result<TokenKind, LexError> {
        let start = self.cursor.pos();
        let quote = self.cursor.current();
        self.cursor.bump();
        let mut cooked = String::new();
        let mut run_start = self.cursor.pos();
        loop {
            let b = self.cursor.current();
            if self.cursor.is_eof() || b == b'\n' {
                return Err(LexError::unterminated_string(Span::new(
                    start,
                    self.cursor.pos(),
                )));
            }
            if b == quote {
                cooked.push_str(
                    &self.text[run_start as usize..self.cursor.pos() as usize],
                );
                self.cursor.bump();
                return Ok(TokenKind::Str(cooked));
            }
            if b == b'\\' {
                cooked.push_str(
                    &self.text[run_start as usize..self.cursor.pos() as usize],
                );
                let esc_start = self.cursor.pos();
                self.cursor.bump();
                let esc = self.cursor.current();
                let replacement = match esc {
                    b'n' => '\n',
                    b't' => '\t',
                    b'r' => '\r',
                    b'\\' => '\\',
                    b'\'' => '\'',
                    b'"' => '"',
                    b'0' => '\0',
                    _ => {
                        let ch = self.char_at(self.cursor.pos());
                        return Err(LexError::invalid_escape(
                            Span::new(esc_start, self.cursor.pos() + 1),
                            ch,
                        ));
                    }
                };
                cooked.push(replacement);
                self.cursor.bump();
                run_start = self.cursor.pos();
            } else {
                self.cursor.bump();
            }
        }
    }

    fn scan_operator(&mut self) -> Result<TokenKind, LexError> {
        let start = self.cursor.pos();
        let b = self.cursor.current();
        self.cursor.bump();
        let kind = match b {
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b',' => TokenKind::Comma,
            b'.' => TokenKind::Dot,
            b'~' => TokenKind::Tilde,
            b'=' => {
                if self.cursor.current() == b'=' {
                    self.cursor.bump();
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }
            b'!' => {
                if self.cursor.current() == b'=' {
                    self.cursor.bump();
                    TokenKind::NotEq
                } else {
                    return Err(LexError::invalid_char(Span::new(start, start + 1), '!'));
                }
            }
            b'<' => match self.cursor.current() {
                b'=' => {
                    self.cursor.bump();
                    TokenKind::LtEq
                }
                b'<' => {
                    self.cursor.bump();
                    self.maybe_compound(TokenKind::Shl, "<<=")
                }
                _ => TokenKind::Lt,
            },
            b'>' => match self.cursor.current() {
                b'=' => {
                    self.cursor.bump();
                    TokenKind::GtEq
                }
                b'>' => {
                    self.cursor.bump();
                    self.maybe_compound(TokenKind::Shr, ">>=")
                }
                _ => TokenKind::Gt,
            },
            b'*' => {
                if self.cursor.current() == b'*' {
                    self.cursor.bump();
                    self.maybe_compound(TokenKind::StarStar, "**=")
                } else {
                    self.maybe_compound(TokenKind::Star, "*=")
                }
            }
            b'/' => {
                if self.cursor.current() == b'/' {
                    self.cursor.bump();
                    self.maybe_compound(TokenKind::SlashSlash, "//=")
                } else {
                    self.maybe_compound(TokenKind::Slash, "/=")
                }
            }
            b'+' => self.maybe_compound(TokenKind::Plus, "+="),
            b'-' => self.maybe_compound(TokenKind::Minus, "-="),
            b'%' => self.maybe_compound(TokenKind::Percent, "%="),
            b'&' => self.maybe_compound(TokenKind::Amp, "&="),
            b'|' => self.maybe_compound(TokenKind::Pipe, "|="),
            b'^' => self.maybe_compound(TokenKind::Caret, "^="),
            b':' => {
                if self.cursor.current() == b'=' {
                    self.cursor.bump();
                    TokenKind::CompoundAssign(":=".to_owned())
                } else {
                    return Err(LexError::invalid_char(Span::new(start, start + 1), ':'));
                }
            }
            _ => {
                let ch = self.char_at(start);
                let end = start + u32::try_from(ch.len_utf8()).unwrap_or(1);
                return Err(LexError::invalid_char(Span::new(start, end), ch));
            }
        };
        Ok(kind)
    }

    /// If the next byte is `=`, the operator is a banned compound-assignment
    /// form; the validator turns it into a positioned sandbox error.
    fn maybe_compound(&mut self, base: TokenKind, compound: &str) -> TokenKind {
        if self.cursor.current() == b'=' {
            self.cursor.bump();
            TokenKind::CompoundAssign(compound.to_owned())
        } else {
            base
        }
    }

    /// Decode the char at a byte offset for error reporting.
    fn char_at(&self, offset: u32) -> char {
        self.text[offset as usize..].chars().next().unwrap_or('\0')
    }
}
