//! String scanning.
//!
//! The fast path slices the literal straight out of the source; characters
//! are copied into the pooled scratch buffer only once an escape shows up.

use crate::error::{error_at, ErrorKind, ParseError, SyntaxError};

use super::{Expect, Lexer, Token};

/// Result of scanning one string literal: a zero-copy slice when the
/// literal had no escapes, otherwise the decoded owned text.
#[derive(Debug)]
pub(crate) enum Scanned<'a> {
    Borrowed(&'a str),
    Owned(String),
}

impl Scanned<'_> {
    pub(crate) fn as_str(&self) -> &str {
        match self {
            Scanned::Borrowed(s) => s,
            Scanned::Owned(s) => s,
        }
    }
}

impl<'a> Lexer<'a> {
    /// Scans a string literal delimited by `quote`, cursor on the opening
    /// quote. Leaves the cursor after the closing quote.
    pub(crate) fn scan_quoted(&mut self, quote: u8) -> Result<Scanned<'a>, ParseError> {
        let open = self.pos;
        self.pos += 1;
        let start = self.pos;
        loop {
            match self.peek() {
                Some(b) if b == quote => {
                    let slice = &self.input[start..self.pos];
                    self.pos += 1;
                    return Ok(Scanned::Borrowed(slice));
                }
                Some(b'\\') => {
                    // First escape: stage what we have and decode the rest.
                    let input = self.input;
                    self.scratch.clear();
                    self.scratch.push_str(&input[start..self.pos]);
                    return self.scan_quoted_escaped(quote, open);
                }
                Some(_) => self.pos += 1,
                None => {
                    return Err(error_at(
                        self.input,
                        open,
                        ErrorKind::Syntax(SyntaxError::UnterminatedString),
                    ))
                }
            }
        }
    }

    /// Slow path entered at the first backslash. The scratch buffer already
    /// holds the escape-free prefix.
    fn scan_quoted_escaped(&mut self, quote: u8, open: usize) -> Result<Scanned<'a>, ParseError> {
        loop {
            match self.peek() {
                Some(b) if b == quote => {
                    self.pos += 1;
                    return Ok(Scanned::Owned(self.scratch.to_string()));
                }
                Some(b'\\') => {
                    self.pos += 1;
                    let decoded = self.decode_escape()?;
                    self.scratch.push(decoded);
                }
                Some(b) if b < 0x80 => {
                    self.scratch.push(b as char);
                    self.pos += 1;
                }
                Some(_) => {
                    let (ch, len) = bstr::decode_utf8(&self.bytes[self.pos..]);
                    self.scratch.push(ch.unwrap_or('\u{FFFD}'));
                    self.pos += len;
                }
                None => {
                    return Err(error_at(
                        self.input,
                        open,
                        ErrorKind::Syntax(SyntaxError::UnterminatedString),
                    ))
                }
            }
        }
    }

    /// Decodes one escape sequence, cursor just past the backslash.
    fn decode_escape(&mut self) -> Result<char, ParseError> {
        let Some(b) = self.peek() else {
            return Err(self.error_here(ErrorKind::Syntax(SyntaxError::UnexpectedEndOfInput)));
        };
        self.pos += 1;
        let decoded = match b {
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'b' => '\u{0008}',
            b'f' => '\u{000C}',
            b'v' => '\u{000B}',
            b'\'' => '\'',
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            // Octal digit shorthand: \0 through \7.
            b'0'..=b'7' => char::from(b - b'0'),
            b'x' => {
                let hi = self.escape_hex_digit()?;
                let lo = self.escape_hex_digit()?;
                char::from((hi << 4) | lo)
            }
            b'u' => return self.decode_unicode_escape(),
            other => {
                self.pos -= 1;
                let ch = if other < 0x80 {
                    other as char
                } else {
                    self.decode_char_here()
                };
                return Err(self.error_here(ErrorKind::Syntax(SyntaxError::InvalidEscape(ch))));
            }
        };
        Ok(decoded)
    }

    fn escape_hex_digit(&mut self) -> Result<u8, ParseError> {
        match self.peek() {
            Some(b) if b.is_ascii_hexdigit() => {
                self.pos += 1;
                Ok(super::hex_value(b))
            }
            _ => Err(self.error_here(ErrorKind::Syntax(SyntaxError::InvalidUnicodeEscape))),
        }
    }

    /// `\uHHHH`, with surrogate pairs combined; a lone surrogate is an
    /// error.
    fn decode_unicode_escape(&mut self) -> Result<char, ParseError> {
        let unit = self.unicode_unit()?;
        match unit {
            0xD800..=0xDBFF => {
                if self.peek() == Some(b'\\') && self.peek_at(1) == Some(b'u') {
                    self.pos += 2;
                    let low = self.unicode_unit()?;
                    if !(0xDC00..=0xDFFF).contains(&low) {
                        return Err(
                            self.error_here(ErrorKind::Syntax(SyntaxError::InvalidUnicodeEscape))
                        );
                    }
                    let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                    char::from_u32(code).ok_or_else(|| {
                        self.error_here(ErrorKind::Syntax(SyntaxError::InvalidUnicodeEscape))
                    })
                } else {
                    Err(self.error_here(ErrorKind::Syntax(SyntaxError::InvalidUnicodeEscape)))
                }
            }
            0xDC00..=0xDFFF => {
                Err(self.error_here(ErrorKind::Syntax(SyntaxError::InvalidUnicodeEscape)))
            }
            code => char::from_u32(code).ok_or_else(|| {
                self.error_here(ErrorKind::Syntax(SyntaxError::InvalidUnicodeEscape))
            }),
        }
    }

    fn unicode_unit(&mut self) -> Result<u32, ParseError> {
        let mut unit = 0u32;
        for _ in 0..4 {
            unit = (unit << 4) | u32::from(self.escape_hex_digit()?);
        }
        Ok(unit)
    }

    /// Scans an object key at the cursor, interning it through the symbol
    /// table. The symbol hash is rolled during the zero-copy scan, so the
    /// common repeated-key case costs one probe and no allocation.
    ///
    /// Falls back to the general scanner for anything that is not a plain
    /// quoted key (escapes included).
    pub(crate) fn scan_key_token(&mut self) -> Result<(), ParseError> {
        self.skip_filler()?;
        self.token_start = self.pos;
        let quote = match self.peek() {
            Some(b'"') => b'"',
            Some(b'\'') if self.flags.allow_single_quotes => b'\'',
            _ => return self.next_token_expect(Expect::ObjectKey),
        };
        let mark = self.save();
        self.pos += 1;
        let start = self.pos;
        let mut hash = 0u32;
        loop {
            match self.peek() {
                Some(b) if b == quote => {
                    let text = &self.input[start..self.pos];
                    self.pos += 1;
                    self.token = Token::Str(self.symbols.intern(text, hash));
                    return Ok(());
                }
                Some(b'\\') | None => {
                    // Escaped or unterminated: let the general path decode
                    // and report.
                    self.restore(mark);
                    return self.next_token();
                }
                Some(b) => {
                    hash = hash.wrapping_mul(31).wrapping_add(u32::from(b));
                    self.pos += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::{LexFlags, Lexer, Token};
    use crate::error::{ErrorKind, SyntaxError};
    use crate::symbol::SymbolTable;

    fn scan(input: &str) -> Result<Token, crate::ParseError> {
        let mut lx = Lexer::new(input, LexFlags::default(), Arc::new(SymbolTable::new()));
        lx.next_token()?;
        Ok(lx.current().clone())
    }

    fn scan_str(input: &str) -> String {
        match scan(input).unwrap() {
            Token::Str(s) => s.to_string(),
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn zero_copy_plain_string() {
        assert_eq!(scan_str(r#""hello world""#), "hello world");
    }

    #[test]
    fn named_escapes() {
        assert_eq!(scan_str(r#""a\nb\tc\rd\fe\bf\vg""#), "a\nb\tc\rd\u{C}e\u{8}f\u{B}g");
        assert_eq!(scan_str(r#""q\"s\\t\/u""#), "q\"s\\t/u");
    }

    #[test]
    fn octal_shorthand_escapes() {
        assert_eq!(scan_str(r#""\0\1\7""#), "\u{0}\u{1}\u{7}");
    }

    #[test]
    fn hex_and_unicode_escapes() {
        assert_eq!(scan_str(r#""\x41B""#), "AB");
        assert_eq!(scan_str(r#""\u4E2D""#), "中");
    }

    #[test]
    fn surrogate_pair_combined() {
        assert_eq!(scan_str(r#""\uD83D\uDE00""#), "😀");
    }

    #[test]
    fn lone_surrogate_rejected() {
        let err = scan(r#""\uD83D!""#).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::Syntax(SyntaxError::InvalidUnicodeEscape)
        );
    }

    #[test]
    fn unterminated_string_is_fatal() {
        let err = scan(r#""never ends"#).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::Syntax(SyntaxError::UnterminatedString)
        );
    }

    #[test]
    fn unknown_escape_rejected() {
        let err = scan(r#""\q""#).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::Syntax(SyntaxError::InvalidEscape('q'))
        );
    }

    #[test]
    fn non_ascii_passthrough_after_escape() {
        assert_eq!(scan_str(r#""中\n文""#), "中\n文");
    }

    #[test]
    fn key_scan_interns_repeats() {
        let table = Arc::new(SymbolTable::new());
        let mut lx = Lexer::new(r#""name" "name""#, LexFlags::default(), Arc::clone(&table));
        lx.scan_key_token().unwrap();
        let Token::Str(first) = lx.current().clone() else {
            panic!()
        };
        lx.scan_key_token().unwrap();
        let Token::Str(second) = lx.current().clone() else {
            panic!()
        };
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn key_scan_falls_back_on_escape() {
        let mut lx = Lexer::new(
            r#""name""#,
            LexFlags::default(),
            Arc::new(SymbolTable::new()),
        );
        lx.scan_key_token().unwrap();
        assert!(matches!(lx.current(), Token::Str(s) if &**s == "name"));
    }
}
