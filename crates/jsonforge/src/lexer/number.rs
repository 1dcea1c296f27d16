//! Number scanning.
//!
//! The scanner fixes the literal's kind: a typed suffix (`L S B F D`) or the
//! presence of a fraction/exponent selects integer vs floating, machine
//! integers promote to big integers when accumulation overflows, and the
//! decimal path uses an integer-division shortcut for short, exponent-free
//! literals.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::error::{error_at, ErrorKind, ParseError, SyntaxError};
use crate::options::MAX_NUMBER_LITERAL_LEN;

use super::{Lexer, Token};

/// Digit count below which an exponent-free decimal fits the fast
/// integer-division path without precision loss.
const FAST_DECIMAL_DIGITS: usize = 17;

impl Lexer<'_> {
    /// Scans a numeric literal, cursor on `-` or the first digit.
    pub(crate) fn scan_number(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;
        let negative = self.peek() == Some(b'-');
        if negative {
            self.pos += 1;
        }

        let int_start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if self.pos == int_start {
            return Err(error_at(
                self.input,
                start,
                ErrorKind::Syntax(SyntaxError::InvalidNumber),
            ));
        }

        let mut frac_len = 0usize;
        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9')) {
            self.pos += 1;
            let frac_start = self.pos;
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
            frac_len = self.pos - frac_start;
        }

        let mut has_exp = false;
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let exp_mark = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if matches!(self.peek(), Some(b'0'..=b'9')) {
                while matches!(self.peek(), Some(b'0'..=b'9')) {
                    self.pos += 1;
                }
                has_exp = true;
            } else {
                // Not an exponent after all; reject rather than backtrack
                // into an identifier.
                self.pos = exp_mark;
                return Err(error_at(
                    self.input,
                    start,
                    ErrorKind::Syntax(SyntaxError::InvalidNumber),
                ));
            }
        }

        let span = &self.input[start..self.pos];
        if span.len() > MAX_NUMBER_LITERAL_LEN {
            return Err(error_at(
                self.input,
                start,
                ErrorKind::LiteralTooLong(MAX_NUMBER_LITERAL_LEN),
            ));
        }

        let suffix = match self.peek() {
            Some(s @ (b'L' | b'S' | b'B' | b'F' | b'D')) => {
                self.pos += 1;
                Some(s)
            }
            _ => None,
        };

        let floating = frac_len > 0 || has_exp;
        let token = match suffix {
            Some(b'F') => Token::Float(parse_or_invalid::<f32>(self.input, start, span)?),
            Some(b'D') => Token::Double(parse_or_invalid::<f64>(self.input, start, span)?),
            Some(b'L' | b'S' | b'B') if floating => {
                return Err(error_at(
                    self.input,
                    start,
                    ErrorKind::Syntax(SyntaxError::InvalidNumber),
                ))
            }
            Some(_) | None if !floating => integer_token(span, negative),
            _ => self.decimal_token(start, span, negative, frac_len, has_exp)?,
        };
        Ok(token)
    }

    /// Decimal literal. Short, exponent-free spans convert through integer
    /// division; everything else goes to the library parser on the exact
    /// substring.
    #[allow(clippy::cast_precision_loss)]
    fn decimal_token(
        &self,
        start: usize,
        span: &str,
        negative: bool,
        frac_len: usize,
        has_exp: bool,
    ) -> Result<Token, ParseError> {
        let significant = span.len()
            - usize::from(negative)
            - usize::from(frac_len > 0);
        if !has_exp && significant < FAST_DECIMAL_DIGITS {
            let mut mantissa = 0i64;
            for b in span.bytes() {
                if b.is_ascii_digit() {
                    mantissa = mantissa * 10 + i64::from(b - b'0');
                }
            }
            if negative {
                mantissa = -mantissa;
            }
            if self.flags.use_big_decimal {
                return Ok(Token::Decimal(BigDecimal::new(
                    BigInt::from(mantissa),
                    i64::try_from(frac_len).unwrap_or(i64::MAX),
                )));
            }
            let divisor = 10f64.powi(i32::try_from(frac_len).unwrap_or(i32::MAX));
            return Ok(Token::Double(mantissa as f64 / divisor));
        }
        if self.flags.use_big_decimal {
            let decimal = BigDecimal::from_str(span).map_err(|_| {
                error_at(
                    self.input,
                    start,
                    ErrorKind::Syntax(SyntaxError::InvalidNumber),
                )
            })?;
            Ok(Token::Decimal(decimal))
        } else {
            Ok(Token::Double(parse_or_invalid::<f64>(
                self.input, start, span,
            )?))
        }
    }
}

/// Integer accumulation with promotion: an i64 overflow re-parses the same
/// digit span as a big integer.
fn integer_token(span: &str, negative: bool) -> Token {
    let digits = if negative { &span[1..] } else { span };
    let mut acc = 0i64;
    for b in digits.bytes() {
        let d = i64::from(b - b'0');
        // Accumulate negatively so i64::MIN round-trips.
        match acc.checked_mul(10).and_then(|a| a.checked_sub(d)) {
            Some(a) => acc = a,
            None => return Token::BigInt(BigInt::from_str(span).unwrap_or_default()),
        }
    }
    if negative {
        Token::Int(acc)
    } else if acc == i64::MIN {
        Token::BigInt(BigInt::from_str(span).unwrap_or_default())
    } else {
        Token::Int(-acc)
    }
}

fn parse_or_invalid<T: FromStr>(input: &str, start: usize, span: &str) -> Result<T, ParseError> {
    span.parse::<T>().map_err(|_| {
        error_at(
            input,
            start,
            ErrorKind::Syntax(SyntaxError::InvalidNumber),
        )
    })
}
