use crate::lang::ast::{BinOpKind, Expr};
use crate::lang::error::{ParseError, ParseResult};
use crate::lang::token::{Token, TokenKind};

/// Pratt parser for calculator-style expressions.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse a single expression spanning the whole input.
    pub fn parse_expression(&mut self) -> ParseResult<Expr> {
        if self.is_at_end() {
            return Err(ParseError::new("empty expression"));
        }
        let expr = self.parse_expr(0)?;
        if !self.is_at_end() {
            let tok = self.peek().clone();
            return Err(ParseError::new(format!(
                "unexpected {} after expression",
                describe(&tok.kind)
            ))
            .with_span(tok.span));
        }
        Ok(expr)
    }

    /// Pratt loop: parse expression with given minimum binding power.
    fn parse_expr(&mut self, min_bp: u8) -> ParseResult<Expr> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let (op, left_bp, right_bp) = match self.peek_kind() {
                TokenKind::Plus => (BinOpKind::Add, 1, 2),
                TokenKind::Minus => (BinOpKind::Sub, 1, 2),
                TokenKind::Star => (BinOpKind::Mul, 3, 4),
                TokenKind::Slash => (BinOpKind::Div, 3, 4),
                TokenKind::Percent => (BinOpKind::Mod, 3, 4),
                TokenKind::Caret => (BinOpKind::Pow, 8, 7), // right-associative
                _ => break,
            };

            if left_bp < min_bp {
                break;
            }

            self.advance(); // consume operator
            let rhs = self.parse_expr(right_bp)?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::BinOp {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }

        Ok(lhs)
    }

    /// Parse prefix expression (atom or unary minus).
    fn parse_prefix(&mut self) -> ParseResult<Expr> {
        match self.peek_kind() {
            TokenKind::Number(_) => {
                let tok = self.advance();
                match tok.kind {
                    TokenKind::Number(n) => Ok(Expr::Number(n, tok.span)),
                    _ => unreachable!(),
                }
            }
            TokenKind::Ident(_) => self.parse_ident(),
            TokenKind::LParen => self.parse_grouped(),
            TokenKind::Pipe => self.parse_abs(),
            TokenKind::Minus => {
                let op_span = self.advance().span;
                // Unary minus binds tighter than * / but looser than ^,
                // so -x^2 parses as -(x^2).
                let operand = self.parse_expr(5)?;
                let span = op_span.merge(operand.span());
                Ok(Expr::Neg {
                    operand: Box::new(operand),
                    span,
                })
            }
            _ => {
                let tok = self.peek().clone();
                Err(ParseError::new(format!(
                    "expected expression, found {}",
                    describe(&tok.kind)
                ))
                .with_span(tok.span))
            }
        }
    }

    fn parse_ident(&mut self) -> ParseResult<Expr> {
        let tok = self.advance();
        let name = match tok.kind {
            TokenKind::Ident(name) => name,
            _ => unreachable!(),
        };

        // Identifier followed by '(' is a function call; the lexer has
        // already suppressed implicit multiplication for this case.
        if self.peek_kind() == TokenKind::LParen {
            let open = self.advance();
            let mut args = Vec::new();
            if self.peek_kind() != TokenKind::RParen {
                args.push(self.parse_expr(0)?);
                while self.peek_kind() == TokenKind::Comma {
                    self.advance();
                    args.push(self.parse_expr(0)?);
                }
            }
            let end = self.expect_rparen(open.span)?;
            return Ok(Expr::Call {
                span: tok.span.merge(end.span),
                name_span: tok.span,
                name,
                args,
            });
        }

        Ok(Expr::Ident(name, tok.span))
    }

    fn parse_grouped(&mut self) -> ParseResult<Expr> {
        let open = self.advance(); // '('
        let expr = self.parse_expr(0)?;
        self.expect_rparen(open.span)?;
        Ok(expr)
    }

    fn parse_abs(&mut self) -> ParseResult<Expr> {
        let start = self.advance().span; // '|'
        let inner = self.parse_expr(0)?;
        let close = self.peek().clone();
        if close.kind != TokenKind::Pipe {
            return Err(ParseError::new("unclosed '|' absolute value").with_span(start));
        }
        self.advance();
        // Desugar |x| to abs(x)
        Ok(Expr::Call {
            name: "abs".to_string(),
            name_span: start,
            args: vec![inner],
            span: start.merge(close.span),
        })
    }

    fn expect_rparen(&mut self, open_span: crate::lang::token::Span) -> ParseResult<Token> {
        let tok = self.peek().clone();
        if tok.kind == TokenKind::RParen {
            Ok(self.advance())
        } else {
            Err(ParseError::new("unbalanced parentheses: missing ')'").with_span(open_span))
        }
    }

    // --- Token helpers ---

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens[self.pos].kind.clone()
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn is_at_end(&self) -> bool {
        matches!(self.tokens[self.pos].kind, TokenKind::Eof)
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Number(n) => format!("number '{}'", n),
        TokenKind::Ident(s) => format!("'{}'", s),
        TokenKind::Eof => "end of input".to_string(),
        TokenKind::RParen => "')'".to_string(),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::lexer::Lexer;

    fn parse(input: &str) -> Expr {
        let tokens = Lexer::new(input).tokenize().unwrap();
        Parser::new(tokens).parse_expression().unwrap()
    }

    fn parse_err(input: &str) -> ParseError {
        let tokens = Lexer::new(input).tokenize().unwrap();
        Parser::new(tokens).parse_expression().unwrap_err()
    }

    #[test]
    fn test_precedence() {
        let expr = parse("3 + 4 * 2");
        // Should be Add(3, Mul(4, 2))
        match expr {
            Expr::BinOp {
                op: BinOpKind::Add,
                lhs,
                rhs,
                ..
            } => {
                assert!(matches!(*lhs, Expr::Number(n, _) if n == 3.0));
                assert!(matches!(
                    *rhs,
                    Expr::BinOp {
                        op: BinOpKind::Mul,
                        ..
                    }
                ));
            }
            _ => panic!("unexpected: {:?}", expr),
        }
    }

    #[test]
    fn test_exponentiation_right_assoc() {
        let expr = parse("2^3^4");
        // Should be Pow(2, Pow(3, 4))
        match expr {
            Expr::BinOp {
                op: BinOpKind::Pow,
                rhs,
                ..
            } => {
                assert!(matches!(
                    *rhs,
                    Expr::BinOp {
                        op: BinOpKind::Pow,
                        ..
                    }
                ));
            }
            _ => panic!("unexpected: {:?}", expr),
        }
    }

    #[test]
    fn test_pow_binds_tighter_than_mul() {
        let expr = parse("2*x^2");
        match expr {
            Expr::BinOp {
                op: BinOpKind::Mul,
                rhs,
                ..
            } => {
                assert!(matches!(
                    *rhs,
                    Expr::BinOp {
                        op: BinOpKind::Pow,
                        ..
                    }
                ));
            }
            _ => panic!("unexpected: {:?}", expr),
        }
    }

    #[test]
    fn test_unary_neg_of_power() {
        // -x^2 parses as -(x^2)
        let expr = parse("-x^2");
        match expr {
            Expr::Neg { operand, .. } => {
                assert!(matches!(
                    *operand,
                    Expr::BinOp {
                        op: BinOpKind::Pow,
                        ..
                    }
                ));
            }
            _ => panic!("unexpected: {:?}", expr),
        }
    }

    #[test]
    fn test_func_call() {
        let expr = parse("sin(3.14)");
        match expr {
            Expr::Call { name, args, .. } => {
                assert_eq!(name, "sin");
                assert_eq!(args.len(), 1);
            }
            _ => panic!("unexpected: {:?}", expr),
        }
    }

    #[test]
    fn test_implicit_mul() {
        let expr = parse("3x");
        assert!(matches!(
            expr,
            Expr::BinOp {
                op: BinOpKind::Mul,
                ..
            }
        ));
    }

    #[test]
    fn test_abs_desugars() {
        let expr = parse("|x - 1|");
        match expr {
            Expr::Call { name, args, .. } => {
                assert_eq!(name, "abs");
                assert_eq!(args.len(), 1);
            }
            _ => panic!("unexpected: {:?}", expr),
        }
    }

    #[test]
    fn test_unbalanced_parens() {
        let err = parse_err("2*(x + 1");
        assert!(err.message.contains("unbalanced"));
        assert_eq!(err.offending("2*(x + 1"), Some("("));
    }

    #[test]
    fn test_trailing_garbage() {
        let err = parse_err("x + 1)");
        assert!(err.message.contains("unexpected"));
    }

    #[test]
    fn test_empty_input() {
        let err = parse_err("   ");
        assert!(err.message.contains("empty"));
    }

    #[test]
    fn test_two_arg_log() {
        let expr = parse("log(2, x)");
        match expr {
            Expr::Call { args, .. } => assert_eq!(args.len(), 2),
            _ => panic!("unexpected: {:?}", expr),
        }
    }
}
