//! The tokenizer.
//!
//! A byte-cursor scanner over a borrowed `&str`. Exactly one token is
//! current at any time; [`Lexer::next_token`] replaces it. Structural bytes
//! are matched directly; strings take a zero-copy slice of the source until
//! the first escape forces the scratch buffer; numbers pick their kind
//! (machine int, big int, double, decimal, float) while scanning.
//!
//! Beyond the token stream the lexer exposes the fast-path field scans
//! (`scan_field_*`, see [`fastpath`]): one-pass matches of an expected
//! field-name/colon/typed-value sequence that avoid materializing generic
//! tokens, with a guaranteed cursor rollback on mismatch.

mod date;
mod fastpath;
mod number;
mod scratch;
mod strings;

pub use date::scan_iso8601_if_match;
pub use fastpath::FieldScan;

use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use num_bigint::BigInt;

use crate::error::{error_at, ErrorKind, ParseError, SyntaxError};
use crate::options::DecodeOptions;
use crate::symbol::SymbolTable;
use scratch::ScratchGuard;
use strings::Scanned;

/// One lexical token. Payload-carrying variants hold the decoded value; the
/// scanner decides numeric kinds, the parser never re-guesses them.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Colon,
    Comma,
    Null,
    True,
    False,
    Int(i64),
    BigInt(BigInt),
    Double(f64),
    Decimal(BigDecimal),
    Float(f32),
    Str(Arc<str>),
    Date(DateTime<Utc>),
    /// Hex blob literal `x'4D5A'`.
    Hex(Vec<u8>),
    /// The `new` pseudo-constructor keyword.
    New,
    /// The `Set` collection-literal keyword.
    SetKw,
    /// The `TreeSet` collection-literal keyword.
    TreeSetKw,
    /// The `undefined` keyword, decoded as null by the parser.
    Undefined,
    /// A bare identifier (unquoted key, constructor name).
    Ident(Arc<str>),
    Eof,
}

impl Token {
    /// Display name used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Token::LBrace => "'{'",
            Token::RBrace => "'}'",
            Token::LBracket => "'['",
            Token::RBracket => "']'",
            Token::LParen => "'('",
            Token::RParen => "')'",
            Token::Colon => "':'",
            Token::Comma => "','",
            Token::Null => "null",
            Token::True => "true",
            Token::False => "false",
            Token::Int(_) | Token::BigInt(_) => "integer",
            Token::Double(_) | Token::Decimal(_) | Token::Float(_) => "number",
            Token::Str(_) => "string",
            Token::Date(_) => "date",
            Token::Hex(_) => "hex literal",
            Token::New => "new",
            Token::SetKw => "Set",
            Token::TreeSetKw => "TreeSet",
            Token::Undefined => "undefined",
            Token::Ident(_) => "identifier",
            Token::Eof => "end of input",
        }
    }
}

/// Grammar-position hint for [`Lexer::next_token_expect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Expect {
    /// Directly after a value only `,` `}` `]` `)` or end of input are legal.
    AfterValue,
    /// At an object-key position a quoted string (or `}`) is the common case.
    ObjectKey,
}

/// Dialect switches the lexer consults, copied out of [`DecodeOptions`] at
/// construction so the lexer carries no borrow of the options.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LexFlags {
    pub allow_comments: bool,
    pub allow_single_quotes: bool,
    pub allow_iso8601_dates: bool,
    pub use_big_decimal: bool,
}

impl LexFlags {
    pub(crate) fn from_options(options: &DecodeOptions) -> Self {
        Self {
            allow_comments: options.allow_comments,
            allow_single_quotes: options.allow_single_quotes,
            allow_iso8601_dates: options.allow_iso8601_dates,
            use_big_decimal: options.use_big_decimal,
        }
    }
}

pub(crate) struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    /// Byte offset at which the current token started.
    token_start: usize,
    token: Token,
    eof_seen: bool,
    flags: LexFlags,
    symbols: Arc<SymbolTable>,
    scratch: ScratchGuard,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(input: &'a str, flags: LexFlags, symbols: Arc<SymbolTable>) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            token_start: 0,
            token: Token::Eof,
            eof_seen: false,
            flags,
            symbols,
            scratch: ScratchGuard::acquire(),
        }
    }

    pub(crate) fn current(&self) -> &Token {
        &self.token
    }

    /// Byte offset of the start of the current token.
    pub(crate) fn token_start(&self) -> usize {
        self.token_start
    }

    pub(crate) fn offset(&self) -> usize {
        self.pos
    }

    pub(crate) fn input(&self) -> &'a str {
        self.input
    }

    pub(crate) fn symbols(&self) -> &Arc<SymbolTable> {
        &self.symbols
    }

    pub(crate) fn error_here(&self, kind: ErrorKind) -> ParseError {
        error_at(self.input, self.pos, kind)
    }

    pub(crate) fn error_at_token(&self, kind: ErrorKind) -> ParseError {
        error_at(self.input, self.token_start, kind)
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    #[inline]
    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    /// Skips whitespace, and comments when the dialect allows them.
    fn skip_filler(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\n' | b'\r' | 0x0C | 0x0B) => self.pos += 1,
                Some(b'/') if self.flags.allow_comments => self.skip_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn skip_comment(&mut self) -> Result<(), ParseError> {
        match self.peek_at(1) {
            Some(b'/') => {
                self.pos += 2;
                while let Some(b) = self.peek() {
                    self.pos += 1;
                    if b == b'\n' {
                        break;
                    }
                }
                Ok(())
            }
            Some(b'*') => {
                let open = self.pos;
                self.pos += 2;
                loop {
                    match self.peek() {
                        Some(b'*') if self.peek_at(1) == Some(b'/') => {
                            self.pos += 2;
                            return Ok(());
                        }
                        Some(_) => self.pos += 1,
                        None => {
                            return Err(error_at(
                                self.input,
                                open,
                                ErrorKind::Syntax(SyntaxError::UnterminatedComment),
                            ))
                        }
                    }
                }
            }
            _ => Err(self.error_here(ErrorKind::Syntax(SyntaxError::InvalidCharacter('/')))),
        }
    }

    /// Scans the next token into `self.token`.
    ///
    /// A single end-of-input yields [`Token::Eof`]; scanning past that is a
    /// syntax error.
    pub(crate) fn next_token(&mut self) -> Result<(), ParseError> {
        self.skip_filler()?;
        self.token_start = self.pos;
        let Some(b) = self.peek() else {
            if self.eof_seen {
                return Err(self.error_here(ErrorKind::Syntax(SyntaxError::PastEndOfInput)));
            }
            self.eof_seen = true;
            self.token = Token::Eof;
            return Ok(());
        };
        match b {
            b'{' => self.structural(Token::LBrace),
            b'}' => self.structural(Token::RBrace),
            b'[' => self.structural(Token::LBracket),
            b']' => self.structural(Token::RBracket),
            b'(' => self.structural(Token::LParen),
            b')' => self.structural(Token::RParen),
            b':' => self.structural(Token::Colon),
            b',' => self.structural(Token::Comma),
            b'"' => {
                let scanned = self.scan_quoted(b'"')?;
                self.token = self.string_token(&scanned);
                Ok(())
            }
            b'\'' if self.flags.allow_single_quotes => {
                let scanned = self.scan_quoted(b'\'')?;
                self.token = self.string_token(&scanned);
                Ok(())
            }
            b'0'..=b'9' | b'-' => {
                self.token = self.scan_number()?;
                Ok(())
            }
            b'x' if self.peek_at(1) == Some(b'\'') => {
                self.token = self.scan_hex_blob()?;
                Ok(())
            }
            b'A'..=b'Z' | b'a'..=b'z' | b'_' | b'$' => {
                self.token = self.scan_ident();
                Ok(())
            }
            _ => {
                let ch = self.decode_char_here();
                Err(self.error_here(ErrorKind::Syntax(SyntaxError::InvalidCharacter(ch))))
            }
        }
    }

    /// Biased variant of [`next_token`] for known grammar positions.
    ///
    /// The hot positions (after a value, at an object key) are matched with a
    /// couple of byte comparisons; anything else falls back to the general
    /// scan.
    ///
    /// [`next_token`]: Lexer::next_token
    pub(crate) fn next_token_expect(&mut self, expect: Expect) -> Result<(), ParseError> {
        self.skip_filler()?;
        self.token_start = self.pos;
        match (expect, self.peek()) {
            (Expect::AfterValue, Some(b',')) => self.structural(Token::Comma),
            (Expect::AfterValue, Some(b'}')) => self.structural(Token::RBrace),
            (Expect::AfterValue, Some(b']')) => self.structural(Token::RBracket),
            (Expect::AfterValue, Some(b')')) => self.structural(Token::RParen),
            (Expect::ObjectKey, Some(b'"')) => {
                let scanned = self.scan_quoted(b'"')?;
                self.token = self.string_token(&scanned);
                Ok(())
            }
            (Expect::ObjectKey, Some(b'}')) => self.structural(Token::RBrace),
            _ => self.next_token(),
        }
    }

    fn structural(&mut self, token: Token) -> Result<(), ParseError> {
        self.pos += 1;
        self.token = token;
        Ok(())
    }

    /// Builds a string token, first offering the text to the date scanner
    /// when the dialect decodes embedded dates.
    fn string_token(&self, scanned: &Scanned<'a>) -> Token {
        let text = scanned.as_str();
        if self.flags.allow_iso8601_dates {
            if let Some(date) = scan_iso8601_if_match(text) {
                return Token::Date(date);
            }
        }
        Token::Str(Arc::from(text))
    }

    /// Scans an identifier and classifies the keywords the dialect knows.
    /// The symbol hash is rolled during the scan so interning needs no
    /// second pass.
    fn scan_ident(&mut self) -> Token {
        let start = self.pos;
        let mut hash = 0u32;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'$' {
                hash = hash.wrapping_mul(31).wrapping_add(u32::from(b));
                self.pos += 1;
            } else {
                break;
            }
        }
        match &self.input[start..self.pos] {
            "null" => Token::Null,
            "true" => Token::True,
            "false" => Token::False,
            "new" => Token::New,
            "undefined" => Token::Undefined,
            "Set" => Token::SetKw,
            "TreeSet" => Token::TreeSetKw,
            "NaN" => Token::Double(f64::NAN),
            ident => Token::Ident(self.symbols.intern(ident, hash)),
        }
    }

    /// Scans `x'4D5A'` into raw bytes. The digit count must be even.
    fn scan_hex_blob(&mut self) -> Result<Token, ParseError> {
        debug_assert_eq!(self.peek(), Some(b'x'));
        self.pos += 2; // x'
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_hexdigit() {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.peek() != Some(b'\'') {
            return Err(self.error_here(ErrorKind::Syntax(SyntaxError::InvalidHex)));
        }
        let digits = &self.bytes[start..self.pos];
        self.pos += 1;
        if digits.len() % 2 != 0 {
            return Err(self.error_here(ErrorKind::Syntax(SyntaxError::InvalidHex)));
        }
        let mut out = Vec::with_capacity(digits.len() / 2);
        for pair in digits.chunks_exact(2) {
            let hi = hex_value(pair[0]);
            let lo = hex_value(pair[1]);
            out.push((hi << 4) | lo);
        }
        Ok(Token::Hex(out))
    }

    fn decode_char_here(&self) -> char {
        let (ch, _) = bstr::decode_utf8(&self.bytes[self.pos..]);
        ch.unwrap_or('\u{FFFD}')
    }

    /// Snapshot of the cursor for the fast-path rollback guarantee.
    pub(crate) fn save(&self) -> LexerMark {
        LexerMark {
            pos: self.pos,
            token_start: self.token_start,
            eof_seen: self.eof_seen,
            token: self.token.clone(),
        }
    }

    pub(crate) fn restore(&mut self, mark: LexerMark) {
        self.pos = mark.pos;
        self.token_start = mark.token_start;
        self.eof_seen = mark.eof_seen;
        self.token = mark.token;
    }
}

/// Saved cursor state; restoring leaves the lexer exactly as it was,
/// `current()` included.
#[derive(Debug, Clone)]
pub(crate) struct LexerMark {
    pos: usize,
    token_start: usize,
    eof_seen: bool,
    token: Token,
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{Expect, LexFlags, Lexer, Token};
    use crate::error::{ErrorKind, SyntaxError};
    use crate::symbol::SymbolTable;

    fn lexer(input: &str) -> Lexer<'_> {
        Lexer::new(input, LexFlags::default(), Arc::new(SymbolTable::new()))
    }

    fn lexer_with(input: &str, flags: LexFlags) -> Lexer<'_> {
        Lexer::new(input, flags, Arc::new(SymbolTable::new()))
    }

    fn all_tokens(lexer: &mut Lexer<'_>) -> Vec<Token> {
        let mut out = Vec::new();
        loop {
            lexer.next_token().unwrap();
            let token = lexer.current().clone();
            let done = token == Token::Eof;
            out.push(token);
            if done {
                return out;
            }
        }
    }

    #[test]
    fn structural_stream() {
        let mut lx = lexer("{}[]:,");
        assert_eq!(
            all_tokens(&mut lx),
            vec![
                Token::LBrace,
                Token::RBrace,
                Token::LBracket,
                Token::RBracket,
                Token::Colon,
                Token::Comma,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn eof_exactly_once() {
        let mut lx = lexer("  ");
        lx.next_token().unwrap();
        assert_eq!(lx.current(), &Token::Eof);
        let err = lx.next_token().unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::Syntax(SyntaxError::PastEndOfInput)
        );
    }

    #[test]
    fn keywords_classified() {
        let mut lx = lexer("null true false new undefined Set TreeSet other");
        let tokens = all_tokens(&mut lx);
        assert_eq!(tokens[0], Token::Null);
        assert_eq!(tokens[1], Token::True);
        assert_eq!(tokens[2], Token::False);
        assert_eq!(tokens[3], Token::New);
        assert_eq!(tokens[4], Token::Undefined);
        assert_eq!(tokens[5], Token::SetKw);
        assert_eq!(tokens[6], Token::TreeSetKw);
        assert!(matches!(&tokens[7], Token::Ident(s) if &**s == "other"));
    }

    #[test]
    fn comments_gated() {
        let flags = LexFlags {
            allow_comments: true,
            ..LexFlags::default()
        };
        let mut lx = lexer_with("// line\n/* block */ null", flags);
        lx.next_token().unwrap();
        assert_eq!(lx.current(), &Token::Null);

        let mut strict = lexer("// line\nnull");
        assert!(strict.next_token().is_err());
    }

    #[test]
    fn unterminated_block_comment() {
        let flags = LexFlags {
            allow_comments: true,
            ..LexFlags::default()
        };
        let mut lx = lexer_with("/* never closed", flags);
        let err = lx.next_token().unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::Syntax(SyntaxError::UnterminatedComment)
        );
    }

    #[test]
    fn hex_blob() {
        let mut lx = lexer("x'4D5A90'");
        lx.next_token().unwrap();
        assert_eq!(lx.current(), &Token::Hex(vec![0x4D, 0x5A, 0x90]));
    }

    #[test]
    fn hex_blob_odd_digits_rejected() {
        let mut lx = lexer("x'4D5'");
        assert!(lx.next_token().is_err());
    }

    #[test]
    fn expect_after_value_fast_path() {
        let mut lx = lexer(", } ] )");
        for expected in [Token::Comma, Token::RBrace, Token::RBracket, Token::RParen] {
            lx.next_token_expect(Expect::AfterValue).unwrap();
            assert_eq!(lx.current(), &expected);
        }
    }

    #[test]
    fn single_quotes_gated() {
        let mut strict = lexer("'abc'");
        assert!(strict.next_token().is_err());

        let flags = LexFlags {
            allow_single_quotes: true,
            ..LexFlags::default()
        };
        let mut lx = lexer_with("'abc'", flags);
        lx.next_token().unwrap();
        assert!(matches!(lx.current(), Token::Str(s) if &**s == "abc"));
    }

    #[test]
    fn save_restore_round_trip() {
        let mut lx = lexer("[1, 2]");
        let mark = lx.save();
        lx.next_token().unwrap();
        lx.next_token().unwrap();
        lx.restore(mark);
        lx.next_token().unwrap();
        assert_eq!(lx.current(), &Token::LBracket);
    }

    #[test]
    fn restore_rewinds_the_current_token() {
        let mut lx = lexer("1 2");
        lx.next_token().unwrap();
        assert_eq!(lx.current(), &Token::Int(1));
        let mark = lx.save();
        lx.next_token().unwrap();
        assert_eq!(lx.current(), &Token::Int(2));
        lx.restore(mark);
        assert_eq!(lx.current(), &Token::Int(1));
        lx.next_token().unwrap();
        assert_eq!(lx.current(), &Token::Int(2));
    }
}
