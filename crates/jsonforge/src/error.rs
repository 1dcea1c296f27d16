use std::sync::Arc;

use thiserror::Error;

/// Error raised when a parse aborts.
///
/// Every error carries the byte offset, line, and column at which the parse
/// stopped, plus a bounded snippet of the surrounding input. There is no
/// partial-result return: a parse either completes or fails here.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} at {line}:{column} (offset {offset}) near {snippet:?}")]
pub struct ParseError {
    pub(crate) kind: ErrorKind,
    /// Byte offset into the input at which the error was detected.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number, in characters.
    pub column: usize,
    /// A bounded window of the input around the failure offset.
    pub snippet: Arc<str>,
}

impl ParseError {
    /// The classification of this error.
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

/// Classification of parse failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorKind {
    /// Malformed token or unexpected token for the current grammar position.
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    /// The autotype discriminator resolved to a disallowed or unknown type
    /// under a strict policy.
    #[error("autotype is not allowed for {0:?}")]
    Security(Arc<str>),
    /// Object/array nesting exceeded the fixed cap.
    #[error("nesting depth exceeds {0}")]
    DepthLimit(usize),
    /// A numeric literal exceeded the maximum literal length.
    #[error("numeric literal longer than {0} bytes")]
    LiteralTooLong(usize),
    /// A malformed `$ref` payload, or (in strict mode) an unresolvable one.
    #[error("bad reference: {0}")]
    Reference(Arc<str>),
    /// A type binder rejected a key or could not finish an instance.
    #[error("binding error: {0}")]
    Binding(Arc<str>),
}

/// Detail for [`ErrorKind::Syntax`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyntaxError {
    #[error("invalid character '{0}'")]
    InvalidCharacter(char),
    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscape(char),
    #[error("invalid unicode escape")]
    InvalidUnicodeEscape,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("invalid number literal")]
    InvalidNumber,
    #[error("invalid hex literal")]
    InvalidHex,
    #[error("unexpected token {found}, expected {expected}")]
    UnexpectedToken {
        /// Display name of the token that was found.
        found: &'static str,
        /// What the grammar position called for.
        expected: &'static str,
    },
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    #[error("read past end of input")]
    PastEndOfInput,
    #[error("{0}")]
    Message(&'static str),
}

/// Builds a [`ParseError`] for a failure at byte `offset` of `input`.
///
/// Line and column are recomputed by a single scan; errors are cold paths,
/// so the lexer does not track them per character.
pub(crate) fn error_at(input: &str, offset: usize, kind: ErrorKind) -> ParseError {
    let mut offset = offset.min(input.len());
    while offset > 0 && !input.is_char_boundary(offset) {
        offset -= 1;
    }
    let mut line = 1usize;
    let mut column = 1usize;
    for ch in input[..offset].chars() {
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    ParseError {
        kind,
        offset,
        line,
        column,
        snippet: snippet_around(input, offset),
    }
}

const SNIPPET_RADIUS: usize = 40;

fn snippet_around(input: &str, offset: usize) -> Arc<str> {
    let mut start = offset.saturating_sub(SNIPPET_RADIUS);
    let mut end = (offset + SNIPPET_RADIUS).min(input.len());
    while start > 0 && !input.is_char_boundary(start) {
        start -= 1;
    }
    while end < input.len() && !input.is_char_boundary(end) {
        end += 1;
    }
    Arc::from(&input[start..end])
}
