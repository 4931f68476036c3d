use crate::lang::error::{ParseError, ParseResult};
use crate::lang::token::{Span, Token, TokenKind};

pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> ParseResult<Vec<Token>> {
        while !self.is_at_end() {
            self.skip_whitespace();
            if self.is_at_end() {
                break;
            }
            let token = self.next_token()?;
            // Insert implicit multiplication if applicable
            if let Some(prev) = self.tokens.last() {
                if prev.kind.can_end_implicit_mul() && token.kind.can_start_implicit_mul() {
                    // Don't insert implicit mul before '(' if previous token is an identifier
                    // (that's a function call, not multiplication)
                    let is_func_call = matches!(&prev.kind, TokenKind::Ident(_))
                        && matches!(&token.kind, TokenKind::LParen);
                    if !is_func_call {
                        let span = Span::new(prev.span.end, token.span.start);
                        self.tokens.push(Token::new(TokenKind::Star, span));
                    }
                }
            }
            self.tokens.push(token);
        }
        self.tokens
            .push(Token::new(TokenKind::Eof, Span::new(self.pos, self.pos)));
        Ok(self.tokens)
    }

    fn next_token(&mut self) -> ParseResult<Token> {
        let start = self.pos;
        let ch = self.advance();

        match ch {
            '+' => Ok(Token::new(TokenKind::Plus, Span::new(start, self.pos))),
            '-' => Ok(Token::new(TokenKind::Minus, Span::new(start, self.pos))),
            '*' => Ok(Token::new(TokenKind::Star, Span::new(start, self.pos))),
            '/' => Ok(Token::new(TokenKind::Slash, Span::new(start, self.pos))),
            '^' => Ok(Token::new(TokenKind::Caret, Span::new(start, self.pos))),
            '%' => Ok(Token::new(TokenKind::Percent, Span::new(start, self.pos))),
            '(' => Ok(Token::new(TokenKind::LParen, Span::new(start, self.pos))),
            ')' => Ok(Token::new(TokenKind::RParen, Span::new(start, self.pos))),
            ',' => Ok(Token::new(TokenKind::Comma, Span::new(start, self.pos))),
            '|' => Ok(Token::new(TokenKind::Pipe, Span::new(start, self.pos))),
            c if c.is_ascii_digit() => self.read_number(start),
            '.' if self.peek().map_or(false, |c| c.is_ascii_digit()) => self.read_number(start),
            // Unicode math symbols. θ is alphabetic, so it must be handled
            // before the identifier arm or it lexes as Ident("θ").
            '\u{00D7}' => Ok(Token::new(TokenKind::Star, Span::new(start, self.pos))), // ×
            '\u{00F7}' => Ok(Token::new(TokenKind::Slash, Span::new(start, self.pos))), // ÷
            '\u{22C5}' => Ok(Token::new(TokenKind::Star, Span::new(start, self.pos))), // ⋅
            '\u{03B8}' => Ok(Token::new(
                TokenKind::Ident("theta".to_string()),
                Span::new(start, self.pos),
            )), // θ
            c if is_ident_start(c) => self.read_identifier(start),
            _ => Err(
                ParseError::new(format!("unexpected character: '{}'", ch))
                    .with_span(Span::new(start, self.pos)),
            ),
        }
    }

    fn read_number(&mut self, start: usize) -> ParseResult<Token> {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        if self.peek() == Some('.') && self.peek_at(1).map_or(false, |c| c.is_ascii_digit()) {
            self.advance(); // consume '.'
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() || c == '_' {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        // Scientific notation: only if the exponent digits are actually there,
        // so `2e` still lexes as `2 * e`.
        if self.peek() == Some('e') || self.peek() == Some('E') {
            let mut lookahead = 1;
            if matches!(self.peek_at(1), Some('+') | Some('-')) {
                lookahead = 2;
            }
            if self.peek_at(lookahead).map_or(false, |c| c.is_ascii_digit()) {
                self.advance(); // 'e'
                if matches!(self.peek(), Some('+') | Some('-')) {
                    self.advance();
                }
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        let text: String = self.source[start..self.pos]
            .iter()
            .filter(|c| **c != '_')
            .collect();
        let val: f64 = text.parse().map_err(|_| {
            ParseError::new(format!("invalid number: {}", text))
                .with_span(Span::new(start, self.pos))
        })?;
        Ok(Token::new(TokenKind::Number(val), Span::new(start, self.pos)))
    }

    fn read_identifier(&mut self, start: usize) -> ParseResult<Token> {
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.advance();
            } else {
                break;
            }
        }
        let text: String = self.source[start..self.pos].iter().collect();
        Ok(Token::new(TokenKind::Ident(text), Span::new(start, self.pos)))
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn advance(&mut self) -> char {
        let ch = self.source[self.pos];
        self.pos += 1;
        ch
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.source.get(self.pos + offset).copied()
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }
}

// θ is excluded so it always forms its own token: `rθ` lexes as
// `r`, `*`, `theta`, never as one identifier.
fn is_ident_start(c: char) -> bool {
    (c.is_alphabetic() || c == '_') && c != '\u{03B8}'
}

fn is_ident_continue(c: char) -> bool {
    (c.is_alphanumeric() || c == '_') && c != '\u{03B8}'
}
