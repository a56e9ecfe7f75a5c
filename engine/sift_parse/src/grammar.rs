//! The expression grammar, one method per precedence level.

use crate::{ParseError, Parser};
use sift_ir::ast::{BinaryOp, BoolOp, CmpOp, Expr, ExprKind, UnaryOp};
use sift_ir::{Keyword, TokenKind};

impl Parser<'_> {
    /// `expr := or_expr ('if' or_expr 'else' expr)?`
    ///
    /// The conditional is value-first: `A if C else B`.
    pub(crate) fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let body = self.parse_or()?;
        if self.eat_keyword(Keyword::If) {
            let test = self.parse_or()?;
            self.expect_keyword(Keyword::Else, "`else`")?;
            let if_false = self.parse_expr()?;
            let span = body.span.merge(if_false.span);
            return Ok(Expr::new(
                ExprKind::Conditional {
                    test: Box::new(test),
                    if_true: Box::new(body),
                    if_false: Box::new(if_false),
                },
                span,
            ));
        }
        Ok(body)
    }

    /// `or_expr := and_expr ('or' and_expr)*`
    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.eat_keyword(Keyword::Or) {
            let right = self.parse_and()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Bool {
                    op: BoolOp::Or,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    /// `and_expr := not_expr ('and' not_expr)*`
    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_not()?;
        while self.eat_keyword(Keyword::And) {
            let right = self.parse_not()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Bool {
                    op: BoolOp::And,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    /// `not_expr := 'not' not_expr | comparison`
    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        // `not in` belongs to the comparison chain, not to unary `not`.
        if self.at_keyword(Keyword::Not) && !self.next_is_keyword(Keyword::In) {
            let kw_span = self.current_span();
            self.bump();
            let operand = self.parse_not()?;
            let span = kw_span.merge(operand.span);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_comparison()
    }

    /// `comparison := bit_or (cmp_op bit_or)*` — chained, evaluated with
    /// short-circuiting conjunction semantics.
    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_bit_or()?;
        let mut rest = Vec::new();
        loop {
            let op = if let Some(op) = self.match_cmp_op() {
                self.bump();
                op
            } else if self.at_keyword(Keyword::In) {
                self.bump();
                CmpOp::In
            } else if self.at_keyword(Keyword::Not) && self.next_is_keyword(Keyword::In) {
                self.bump();
                self.bump();
                CmpOp::NotIn
            } else {
                break;
            };
            rest.push((op, self.parse_bit_or()?));
        }
        if rest.is_empty() {
            return Ok(first);
        }
        let span = rest
            .iter()
            .fold(first.span, |acc, (_, e)| acc.merge(e.span));
        Ok(Expr::new(
            ExprKind::Compare {
                first: Box::new(first),
                rest,
            },
            span,
        ))
    }

    fn match_cmp_op(&self) -> Option<CmpOp> {
        match self.current_kind() {
            TokenKind::EqEq => Some(CmpOp::Eq),
            TokenKind::NotEq => Some(CmpOp::NotEq),
            TokenKind::Lt => Some(CmpOp::Lt),
            TokenKind::LtEq => Some(CmpOp::LtEq),
            TokenKind::Gt => Some(CmpOp::Gt),
            TokenKind::GtEq => Some(CmpOp::GtEq),
            _ => None,
        }
    }

    /// `bit_or := bit_xor ('|' bit_xor)*`
    fn parse_bit_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_bit_xor()?;
        while self.eat(&TokenKind::Pipe) {
            let right = self.parse_bit_xor()?;
            left = binary(BinaryOp::BitOr, left, right);
        }
        Ok(left)
    }

    /// `bit_xor := bit_and ('^' bit_and)*`
    fn parse_bit_xor(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_bit_and()?;
        while self.eat(&TokenKind::Caret) {
            let right = self.parse_bit_and()?;
            left = binary(BinaryOp::BitXor, left, right);
        }
        Ok(left)
    }

    /// `bit_and := shift ('&' shift)*`
    fn parse_bit_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_shift()?;
        while self.eat(&TokenKind::Amp) {
            let right = self.parse_shift()?;
            left = binary(BinaryOp::BitAnd, left, right);
        }
        Ok(left)
    }

    /// `shift := additive (('<<' | '>>') additive)*`
    fn parse_shift(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Shl => BinaryOp::Shl,
                TokenKind::Shr => BinaryOp::Shr,
                _ => break,
            };
            self.bump();
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    /// `additive := multiplicative (('+' | '-') multiplicative)*`
    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.bump();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    /// `multiplicative := unary (('*' | '/' | '//' | '%') unary)*`
    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::TrueDiv,
                TokenKind::SlashSlash => BinaryOp::FloorDiv,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.bump();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    /// `unary := ('+' | '-' | '~') unary | power`
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.current_kind() {
            TokenKind::Plus => Some(UnaryOp::Pos),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            let op_span = self.current_span();
            self.bump();
            let operand = self.parse_unary()?;
            let span = op_span.merge(operand.span);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_power()
    }

    /// `power := postfix ('**' unary)?`
    ///
    /// Right-associative, and the exponent may carry a sign (`2 ** -1`),
    /// while `-2 ** 2` negates the power.
    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_postfix()?;
        if self.eat(&TokenKind::StarStar) {
            let exponent = self.parse_unary()?;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    /// `postfix := primary (call | '.' ident call)*`
    ///
    /// Attribute access exists only as an immediately-invoked method.
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(&TokenKind::LParen) {
                let (args, kwargs, close) = self.parse_call_args()?;
                let span = expr.span.merge(close);
                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                        kwargs,
                    },
                    span,
                );
            } else if self.eat(&TokenKind::Dot) {
                let name_span = self.current_span();
                let TokenKind::Ident(name) = self.current_kind() else {
                    return Err(ParseError::unexpected(
                        name_span,
                        self.current_kind().display_name().to_owned(),
                        "a method name",
                    ));
                };
                let name = name.clone();
                self.bump();
                if !self.eat(&TokenKind::LParen) {
                    return Err(ParseError::method_not_called(name_span, name));
                }
                let (args, kwargs, close) = self.parse_call_args()?;
                if let Some((_, value)) = kwargs.first() {
                    return Err(ParseError::unexpected(
                        value.span,
                        "keyword argument".to_owned(),
                        "a positional argument in a method call",
                    ));
                }
                let span = expr.span.merge(close);
                expr = Expr::new(
                    ExprKind::MethodCall {
                        receiver: Box::new(expr),
                        name,
                        args,
                    },
                    span,
                );
            } else {
                break;
            }
        }
        Ok(expr)
    }

    /// Arguments after `(`, through the matching `)`. Returns positional
    /// arguments, keyword arguments, and the span of the closing paren.
    #[allow(clippy::type_complexity)]
    fn parse_call_args(
        &mut self,
    ) -> Result<(Vec<Expr>, Vec<(String, Expr)>, sift_ir::Span), ParseError> {
        let mut args = Vec::new();
        let mut kwargs: Vec<(String, Expr)> = Vec::new();
        loop {
            if self.current_kind() == &TokenKind::RParen {
                break;
            }
            // A keyword argument is an identifier directly followed by `=`.
            let kwarg_name = match (self.current_kind(), self.nth_kind(1)) {
                (TokenKind::Ident(name), Some(TokenKind::Eq)) => Some(name.clone()),
                _ => None,
            };
            if let Some(name) = kwarg_name {
                self.bump();
                self.bump();
                let value = self.parse_expr()?;
                kwargs.push((name, value));
            } else {
                if !kwargs.is_empty() {
                    return Err(ParseError::positional_after_keyword(self.current_span()));
                }
                args.push(self.parse_expr()?);
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        let close = self.expect(&TokenKind::RParen, "`)` or `,`")?;
        Ok((args, kwargs, close))
    }

    /// `primary := literal | ident | '(' expr ')' | '[' comprehension ']'`
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let span = self.current_span();
        let kind = match self.current_kind() {
            TokenKind::Int(n) => {
                let n = *n;
                self.bump();
                ExprKind::Int(n)
            }
            TokenKind::Float(bits) => {
                let value = f64::from_bits(*bits);
                self.bump();
                ExprKind::Float(value)
            }
            TokenKind::Str(s) => {
                let s = s.clone();
                self.bump();
                ExprKind::Str(s)
            }
            TokenKind::Ident(word) => {
                // An enabled keyword operator cannot stand as a value; a
                // withheld one is an ordinary name.
                if self.keyword_role(word).is_some() {
                    return Err(ParseError::unexpected(
                        span,
                        format!("`{word}`"),
                        "an expression",
                    ));
                }
                let word = word.clone();
                self.bump();
                ExprKind::Name(word)
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expr()?;
                let close = self.expect(&TokenKind::RParen, "`)`")?;
                return Ok(Expr::new(inner.kind, span.merge(close)));
            }
            TokenKind::LBracket => return self.parse_comprehension(),
            other => {
                return Err(ParseError::unexpected(
                    span,
                    other.display_name().to_owned(),
                    "an expression",
                ));
            }
        };
        Ok(Expr::new(kind, span))
    }

    /// `'[' expr 'for' ident 'in' or_expr ('if' or_expr)? ']'`
    ///
    /// One level only: the body may be any expression, but nested
    /// comprehension syntax inside the body goes through `parse_primary`
    /// again and is therefore bounded by the grammar, not recursion depth.
    fn parse_comprehension(&mut self) -> Result<Expr, ParseError> {
        let open = self.current_span();
        self.bump();
        let body = self.parse_expr()?;
        self.expect_keyword(Keyword::For, "`for`")?;
        let var_span = self.current_span();
        let TokenKind::Ident(var) = self.current_kind() else {
            return Err(ParseError::unexpected(
                var_span,
                self.current_kind().display_name().to_owned(),
                "an identifier",
            ));
        };
        if self.keyword_role(var).is_some() {
            return Err(ParseError::unexpected(
                var_span,
                format!("`{var}`"),
                "an identifier",
            ));
        }
        let var = var.clone();
        self.bump();
        self.expect_keyword(Keyword::In, "`in`")?;
        let iter = self.parse_or()?;
        let filter = if self.eat_keyword(Keyword::If) {
            Some(Box::new(self.parse_or()?))
        } else {
            None
        };
        let close = self.expect(&TokenKind::RBracket, "`]`")?;
        Ok(Expr::new(
            ExprKind::Comprehension {
                body: Box::new(body),
                var,
                iter: Box::new(iter),
                filter,
            },
            open.merge(close),
        ))
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::{parse, ParseError, ParseErrorKind};
    use pretty_assertions::assert_eq;
    use sift_ir::ast::{BinaryOp, BoolOp, CmpOp, Expr, ExprKind, UnaryOp};
    use sift_ir::KeywordSet;

    fn parse_text(text: &str) -> Result<Expr, ParseError> {
        let tokens = sift_lexer::scan(text).unwrap();
        parse(&tokens, &KeywordSet::ALL)
    }

    fn kind(text: &str) -> ExprKind {
        parse_text(text).unwrap().kind
    }

    #[test]
    fn precedence_mul_over_add() {
        let ExprKind::Binary { op, right, .. } = kind("1 + 2 * 3") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(
            right.kind,
            ExprKind::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn power_is_right_associative() {
        // 2 ** 3 ** 2 == 2 ** (3 ** 2)
        let ExprKind::Binary { op, left, right } = kind("2 ** 3 ** 2") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Pow);
        assert!(matches!(left.kind, ExprKind::Int(2)));
        assert!(matches!(
            right.kind,
            ExprKind::Binary {
                op: BinaryOp::Pow,
                ..
            }
        ));
    }

    #[test]
    fn negation_of_power() {
        // -2 ** 2 parses as -(2 ** 2)
        let ExprKind::Unary { op, operand } = kind("-2 ** 2") else {
            panic!("expected unary");
        };
        assert_eq!(op, UnaryOp::Neg);
        assert!(matches!(
            operand.kind,
            ExprKind::Binary {
                op: BinaryOp::Pow,
                ..
            }
        ));
    }

    #[test]
    fn signed_exponent() {
        let ExprKind::Binary { op, right, .. } = kind("2 ** -1") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Pow);
        assert!(matches!(
            right.kind,
            ExprKind::Unary {
                op: UnaryOp::Neg,
                ..
            }
        ));
    }

    #[test]
    fn comparison_chains_flatten() {
        let ExprKind::Compare { first, rest } = kind("0 < a <= 2") else {
            panic!("expected compare");
        };
        assert!(matches!(first.kind, ExprKind::Int(0)));
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].0, CmpOp::Lt);
        assert_eq!(rest[1].0, CmpOp::LtEq);
    }

    #[test]
    fn not_in_is_one_operator() {
        let ExprKind::Compare { rest, .. } = kind("a not in b") else {
            panic!("expected compare");
        };
        assert_eq!(rest[0].0, CmpOp::NotIn);
    }

    #[test]
    fn bool_ops_and_not() {
        let ExprKind::Bool { op, right, .. } = kind("a and not b") else {
            panic!("expected bool op");
        };
        assert_eq!(op, BoolOp::And);
        assert!(matches!(
            right.kind,
            ExprKind::Unary {
                op: UnaryOp::Not,
                ..
            }
        ));
    }

    #[test]
    fn comparison_binds_looser_than_bitor() {
        // a | b == c parses as (a | b) == c
        let ExprKind::Compare { first, .. } = kind("a | b == c") else {
            panic!("expected compare");
        };
        assert!(matches!(
            first.kind,
            ExprKind::Binary {
                op: BinaryOp::BitOr,
                ..
            }
        ));
    }

    #[test]
    fn conditional_is_lazy_shaped() {
        let ExprKind::Conditional {
            test,
            if_true,
            if_false,
        } = kind("1 if c else x + 1")
        else {
            panic!("expected conditional");
        };
        assert!(matches!(test.kind, ExprKind::Name(ref n) if n == "c"));
        assert!(matches!(if_true.kind, ExprKind::Int(1)));
        assert!(matches!(if_false.kind, ExprKind::Binary { .. }));
    }

    #[test]
    fn call_with_positional_and_keyword_args() {
        let ExprKind::Call {
            callee,
            args,
            kwargs,
        } = kind("pos_only(1, y=2, z=3)")
        else {
            panic!("expected call");
        };
        assert!(matches!(callee.kind, ExprKind::Name(ref n) if n == "pos_only"));
        assert_eq!(args.len(), 1);
        assert_eq!(kwargs.len(), 2);
        assert_eq!(kwargs[0].0, "y");
        assert_eq!(kwargs[1].0, "z");
    }

    #[test]
    fn trailing_comma_in_call() {
        let ExprKind::Call { args, .. } = kind("f(1, 2,)") else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn positional_after_keyword_rejected() {
        let err = parse_text("f(a=1, 2)").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::PositionalAfterKeyword);
    }

    #[test]
    fn method_call_postfix() {
        let ExprKind::MethodCall {
            receiver,
            name,
            args,
        } = kind("'a b'.split(' ')")
        else {
            panic!("expected method call");
        };
        assert!(matches!(receiver.kind, ExprKind::Str(_)));
        assert_eq!(name, "split");
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn uncalled_attribute_rejected() {
        let err = parse_text("'a'.upper").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::MethodNotCalled {
                name: "upper".into()
            }
        );
    }

    #[test]
    fn comprehension_with_filter() {
        let ExprKind::Comprehension {
            var,
            filter,
            ..
        } = kind("[x * 2 for x in xs if x > 0]")
        else {
            panic!("expected comprehension");
        };
        assert_eq!(var, "x");
        assert!(filter.is_some());
    }

    #[test]
    fn conditional_body_inside_comprehension() {
        let ExprKind::Comprehension { body, .. } = kind("[x if x else 1 for x in xs]") else {
            panic!("expected comprehension");
        };
        assert!(matches!(body.kind, ExprKind::Conditional { .. }));
    }

    #[test]
    fn keyword_as_value_rejected() {
        let err = parse_text("1 + and").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::Unexpected { .. }));
    }

    #[test]
    fn withheld_keyword_is_a_name() {
        let tokens = sift_lexer::scan("for + 1").unwrap();
        let keywords = KeywordSet::from_names(["and", "or", "not"]);
        let expr = parse(&tokens, &keywords).unwrap();
        assert!(matches!(
            expr.kind,
            ExprKind::Binary {
                op: BinaryOp::Add,
                ..
            }
        ));
    }

    #[test]
    fn trailing_input_rejected() {
        let err = parse_text("1 2").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::TrailingInput { .. }));
    }

    #[test]
    fn empty_expression_rejected() {
        let err = parse_text("").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::EmptyExpression);
        let err = parse_text("# only a comment").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::EmptyExpression);
    }

    #[test]
    fn unbalanced_paren_rejected() {
        let err = parse_text("(1 + 2").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::Unexpected { .. }));
    }

    #[test]
    fn parenthesized_span_covers_parens() {
        let expr = parse_text("(1 + 2)").unwrap();
        assert_eq!(expr.span.start, 0);
        assert_eq!(expr.span.end, 7);
    }
}
