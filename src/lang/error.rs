use crate::lang::token::Span;
use std::fmt;

/// Fatal expression error: the input string cannot become an evaluable
/// function. Reported before any sampling happens.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Option<Span>,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// The offending slice of the original source, if the span is valid.
    pub fn offending<'a>(&self, source: &'a str) -> Option<&'a str> {
        let span = self.span?;
        let start = byte_pos(source, span.start)?;
        let end = byte_pos(source, span.end)?;
        source.get(start..end)
    }
}

// Spans count characters, not bytes; unicode operators like θ make the
// two diverge.
fn byte_pos(source: &str, char_idx: usize) -> Option<usize> {
    source
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(source.len()))
        .nth(char_idx)
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(f, "{} (at {}..{})", self.message, span.start, span.end),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

/// Per-point evaluation failure. The sampler recovers by omitting the
/// point, so this carries no allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainError {
    DivisionByZero,
    LogNonPositive,
    SqrtNegative,
    NonFinite,
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::DivisionByZero => write!(f, "division by zero"),
            DomainError::LogNonPositive => write!(f, "log of non-positive value"),
            DomainError::SqrtNegative => write!(f, "sqrt of negative value"),
            DomainError::NonFinite => write!(f, "result is not finite"),
        }
    }
}

impl std::error::Error for DomainError {}

pub type EvalResult<T> = Result<T, DomainError>;
