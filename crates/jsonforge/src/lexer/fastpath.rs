//! Fast-path field scans.
//!
//! When the expected field order of an object is known in advance, a field
//! can be decoded in one pass: match the literal `"name":` prefix, scan a
//! value of the expected kind, and detect the trailing delimiter, all
//! without materializing generic tokens. On any mismatch the cursor is
//! restored to where the scan began, so the caller can fall back to the
//! general scanner with nothing lost.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::error::ParseError;

use super::{date::scan_iso8601_if_match, Expect, Lexer};

/// Outcome of one fast-path field scan.
///
/// `NotMatchName` means the field-name prefix itself did not match;
/// `NotMatch` means the prefix matched but the value shape did not. In both
/// cases the cursor is guaranteed untouched. `Value`/`ValueNull` mean the
/// field matched and more fields follow; `End`/`EndNull` mean it was the
/// last field and the enclosing object is closed, with the following token
/// already primed.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldScan<T> {
    NotMatchName,
    NotMatch,
    Value(T),
    ValueNull,
    End(T),
    EndNull,
}

impl<T> FieldScan<T> {
    /// Whether the caller must fall back to generic parsing.
    #[must_use]
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::NotMatchName | Self::NotMatch)
    }

    /// Whether this field closed the enclosing object.
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End(_) | Self::EndNull)
    }
}

/// What followed the value: another field, or the object close.
enum Tail {
    More,
    Close,
}

impl<'a> Lexer<'a> {
    /// Matches `"name":` at the cursor. Leaves the cursor after the colon on
    /// success, untouched on failure.
    fn match_field_prefix(&mut self, name: &str) -> Result<bool, ParseError> {
        let mark = self.save();
        self.skip_filler()?;
        if self.peek() != Some(b'"') {
            self.restore(mark);
            return Ok(false);
        }
        self.pos += 1;
        if !self.eat_lit(name.as_bytes()) {
            self.restore(mark);
            return Ok(false);
        }
        if self.peek() != Some(b'"') {
            self.restore(mark);
            return Ok(false);
        }
        self.pos += 1;
        self.skip_filler()?;
        if self.peek() != Some(b':') {
            self.restore(mark);
            return Ok(false);
        }
        self.pos += 1;
        self.skip_filler()?;
        Ok(true)
    }

    fn eat_lit(&mut self, lit: &[u8]) -> bool {
        if self.bytes[self.pos..].starts_with(lit) {
            self.pos += lit.len();
            true
        } else {
            false
        }
    }

    /// Consumes the delimiter after a matched value. `Close` also primes the
    /// token that follows the object.
    fn field_tail(&mut self) -> Result<Option<Tail>, ParseError> {
        self.skip_filler()?;
        match self.peek() {
            Some(b',') => {
                self.pos += 1;
                Ok(Some(Tail::More))
            }
            Some(b'}') => {
                self.pos += 1;
                self.next_token_expect(Expect::AfterValue)?;
                Ok(Some(Tail::Close))
            }
            _ => Ok(None),
        }
    }

    fn finish_scan<T>(&mut self, value: T) -> Result<FieldScan<T>, ParseError> {
        match self.field_tail()? {
            Some(Tail::More) => Ok(FieldScan::Value(value)),
            Some(Tail::Close) => Ok(FieldScan::End(value)),
            None => Ok(FieldScan::NotMatch),
        }
    }

    fn finish_scan_null<T>(&mut self) -> Result<FieldScan<T>, ParseError> {
        match self.field_tail()? {
            Some(Tail::More) => Ok(FieldScan::ValueNull),
            Some(Tail::Close) => Ok(FieldScan::EndNull),
            None => Ok(FieldScan::NotMatch),
        }
    }

    /// One-pass scan of `"name": <i64>`.
    pub(crate) fn scan_field_i64(&mut self, name: &str) -> Result<FieldScan<i64>, ParseError> {
        let mark = self.save();
        if !self.match_field_prefix(name)? {
            return Ok(FieldScan::NotMatchName);
        }
        if self.eat_lit(b"null") {
            let scan = self.finish_scan_null();
            return self.rollback_if_miss(mark, scan);
        }
        let Some(value) = self.scan_raw_i64() else {
            self.restore(mark);
            return Ok(FieldScan::NotMatch);
        };
        let scan = self.finish_scan(value);
        self.rollback_if_miss(mark, scan)
    }

    /// One-pass scan of `"name": <i32>`.
    pub(crate) fn scan_field_i32(&mut self, name: &str) -> Result<FieldScan<i32>, ParseError> {
        let mark = self.save();
        match self.scan_field_i64(name)? {
            FieldScan::Value(v) => match i32::try_from(v) {
                Ok(v) => Ok(FieldScan::Value(v)),
                Err(_) => {
                    self.restore(mark);
                    Ok(FieldScan::NotMatch)
                }
            },
            FieldScan::End(v) => match i32::try_from(v) {
                Ok(v) => Ok(FieldScan::End(v)),
                Err(_) => {
                    self.restore(mark);
                    Ok(FieldScan::NotMatch)
                }
            },
            FieldScan::ValueNull => Ok(FieldScan::ValueNull),
            FieldScan::EndNull => Ok(FieldScan::EndNull),
            FieldScan::NotMatch => Ok(FieldScan::NotMatch),
            FieldScan::NotMatchName => Ok(FieldScan::NotMatchName),
        }
    }

    /// One-pass scan of `"name": true|false`.
    pub(crate) fn scan_field_bool(&mut self, name: &str) -> Result<FieldScan<bool>, ParseError> {
        let mark = self.save();
        if !self.match_field_prefix(name)? {
            return Ok(FieldScan::NotMatchName);
        }
        if self.eat_lit(b"null") {
            let scan = self.finish_scan_null();
            return self.rollback_if_miss(mark, scan);
        }
        let value = if self.eat_lit(b"true") {
            true
        } else if self.eat_lit(b"false") {
            false
        } else {
            self.restore(mark);
            return Ok(FieldScan::NotMatch);
        };
        let scan = self.finish_scan(value);
        self.rollback_if_miss(mark, scan)
    }

    /// One-pass scan of `"name": "<text>"`. Escaped strings miss; the
    /// generic path decodes them.
    pub(crate) fn scan_field_str(&mut self, name: &str) -> Result<FieldScan<Arc<str>>, ParseError> {
        let mark = self.save();
        if !self.match_field_prefix(name)? {
            return Ok(FieldScan::NotMatchName);
        }
        if self.eat_lit(b"null") {
            let scan = self.finish_scan_null();
            return self.rollback_if_miss(mark, scan);
        }
        let Some(text) = self.scan_raw_str() else {
            self.restore(mark);
            return Ok(FieldScan::NotMatch);
        };
        let value = Arc::from(text);
        let scan = self.finish_scan(value);
        self.rollback_if_miss(mark, scan)
    }

    /// Like [`scan_field_str`], interning the value through the symbol
    /// table (for enum-like fields with few distinct values).
    ///
    /// [`scan_field_str`]: Lexer::scan_field_str
    pub(crate) fn scan_field_symbol(
        &mut self,
        name: &str,
    ) -> Result<FieldScan<Arc<str>>, ParseError> {
        let mark = self.save();
        if !self.match_field_prefix(name)? {
            return Ok(FieldScan::NotMatchName);
        }
        if self.eat_lit(b"null") {
            let scan = self.finish_scan_null();
            return self.rollback_if_miss(mark, scan);
        }
        let Some(text) = self.scan_raw_str() else {
            self.restore(mark);
            return Ok(FieldScan::NotMatch);
        };
        let mut hash = 0u32;
        for b in text.bytes() {
            hash = hash.wrapping_mul(31).wrapping_add(u32::from(b));
        }
        let value = self.symbols.intern(text, hash);
        let scan = self.finish_scan(value);
        self.rollback_if_miss(mark, scan)
    }

    /// One-pass scan of `"name": <date>` where the value is a quoted date
    /// literal or a bare epoch-millisecond integer.
    pub(crate) fn scan_field_date(
        &mut self,
        name: &str,
    ) -> Result<FieldScan<DateTime<Utc>>, ParseError> {
        let mark = self.save();
        if !self.match_field_prefix(name)? {
            return Ok(FieldScan::NotMatchName);
        }
        if self.eat_lit(b"null") {
            let scan = self.finish_scan_null();
            return self.rollback_if_miss(mark, scan);
        }
        let value = if self.peek() == Some(b'"') {
            let Some(text) = self.scan_raw_str() else {
                self.restore(mark);
                return Ok(FieldScan::NotMatch);
            };
            match scan_iso8601_if_match(text) {
                Some(date) => date,
                None => {
                    self.restore(mark);
                    return Ok(FieldScan::NotMatch);
                }
            }
        } else {
            let Some(millis) = self.scan_raw_i64() else {
                self.restore(mark);
                return Ok(FieldScan::NotMatch);
            };
            match Utc.timestamp_millis_opt(millis).single() {
                Some(date) => date,
                None => {
                    self.restore(mark);
                    return Ok(FieldScan::NotMatch);
                }
            }
        };
        let scan = self.finish_scan(value);
        self.rollback_if_miss(mark, scan)
    }

    /// One-pass scan of `"name": ["a", null, …]` with escape-free string
    /// elements.
    #[allow(clippy::type_complexity)]
    pub(crate) fn scan_field_str_array(
        &mut self,
        name: &str,
    ) -> Result<FieldScan<Vec<Option<Arc<str>>>>, ParseError> {
        let mark = self.save();
        if !self.match_field_prefix(name)? {
            return Ok(FieldScan::NotMatchName);
        }
        if self.eat_lit(b"null") {
            let scan = self.finish_scan_null();
            return self.rollback_if_miss(mark, scan);
        }
        if self.peek() != Some(b'[') {
            self.restore(mark);
            return Ok(FieldScan::NotMatch);
        }
        self.pos += 1;
        let mut items: Vec<Option<Arc<str>>> = Vec::new();
        self.skip_filler()?;
        if self.peek() == Some(b']') {
            self.pos += 1;
        } else {
            loop {
                self.skip_filler()?;
                if self.eat_lit(b"null") {
                    items.push(None);
                } else if self.peek() == Some(b'"') {
                    let Some(text) = self.scan_raw_str() else {
                        self.restore(mark);
                        return Ok(FieldScan::NotMatch);
                    };
                    items.push(Some(Arc::from(text)));
                } else {
                    self.restore(mark);
                    return Ok(FieldScan::NotMatch);
                }
                self.skip_filler()?;
                match self.peek() {
                    Some(b',') => self.pos += 1,
                    Some(b']') => {
                        self.pos += 1;
                        break;
                    }
                    _ => {
                        self.restore(mark);
                        return Ok(FieldScan::NotMatch);
                    }
                }
            }
        }
        let scan = self.finish_scan(items);
        self.rollback_if_miss(mark, scan)
    }

    /// Bare signed digit run as i64; `None` (no digits or overflow) means
    /// the caller misses.
    fn scan_raw_i64(&mut self) -> Option<i64> {
        let negative = self.peek() == Some(b'-');
        if negative {
            self.pos += 1;
        }
        let start = self.pos;
        let mut acc = 0i64;
        while let Some(b @ b'0'..=b'9') = self.peek() {
            acc = acc
                .checked_mul(10)?
                .checked_sub(i64::from(b - b'0'))?;
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        // A fraction, exponent, or suffix is not a plain integer.
        if matches!(self.peek(), Some(b'.' | b'e' | b'E' | b'L' | b'S' | b'B' | b'F' | b'D')) {
            return None;
        }
        if negative {
            Some(acc)
        } else {
            acc.checked_neg()
        }
    }

    /// Escape-free quoted string slice; `None` on escapes or no quote.
    fn scan_raw_str(&mut self) -> Option<&'a str> {
        if self.peek() != Some(b'"') {
            return None;
        }
        self.pos += 1;
        let start = self.pos;
        loop {
            match self.peek() {
                Some(b'"') => {
                    let text = &self.input[start..self.pos];
                    self.pos += 1;
                    return Some(text);
                }
                Some(b'\\') | None => return None,
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Propagates errors, and restores the mark when the tail turned a
    /// matched value into a miss.
    fn rollback_if_miss<T>(
        &mut self,
        mark: super::LexerMark,
        scan: Result<FieldScan<T>, ParseError>,
    ) -> Result<FieldScan<T>, ParseError> {
        match scan {
            Ok(s) if s.is_miss() => {
                self.restore(mark);
                Ok(s)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::{LexFlags, Lexer, Token};
    use super::FieldScan;
    use crate::symbol::SymbolTable;

    fn lexer(input: &str) -> Lexer<'_> {
        Lexer::new(input, LexFlags::default(), Arc::new(SymbolTable::new()))
    }

    #[test]
    fn int_field_hit_with_more_fields() {
        let mut lx = lexer(r#""id":42,"next":1}"#);
        assert_eq!(lx.scan_field_i64("id").unwrap(), FieldScan::Value(42));
        // Cursor sits at the next field name.
        assert_eq!(lx.scan_field_i64("next").unwrap(), FieldScan::End(1));
        assert_eq!(lx.current(), &Token::Eof);
    }

    #[test]
    fn name_miss_leaves_cursor_untouched() {
        let mut lx = lexer(r#""other":42}"#);
        let before = lx.offset();
        assert_eq!(lx.scan_field_i64("id").unwrap(), FieldScan::NotMatchName);
        assert_eq!(lx.offset(), before);
    }

    #[test]
    fn value_shape_miss_leaves_cursor_untouched() {
        let mut lx = lexer(r#""id":"not a number"}"#);
        let before = lx.offset();
        assert_eq!(lx.scan_field_i64("id").unwrap(), FieldScan::NotMatch);
        assert_eq!(lx.offset(), before);
    }

    #[test]
    fn decimal_value_misses_integer_scan() {
        let mut lx = lexer(r#""id":4.5}"#);
        assert_eq!(lx.scan_field_i64("id").unwrap(), FieldScan::NotMatch);
    }

    #[test]
    fn null_statuses() {
        let mut lx = lexer(r#""a":null,"b":null}"#);
        assert_eq!(lx.scan_field_i64("a").unwrap(), FieldScan::ValueNull);
        assert_eq!(lx.scan_field_str("b").unwrap(), FieldScan::EndNull);
    }

    #[test]
    fn bool_field() {
        let mut lx = lexer(r#""on":true,"off":false}"#);
        assert_eq!(lx.scan_field_bool("on").unwrap(), FieldScan::Value(true));
        assert_eq!(lx.scan_field_bool("off").unwrap(), FieldScan::End(false));
    }

    #[test]
    fn str_field_zero_copy() {
        let mut lx = lexer(r#""name":"alice"}"#);
        assert_eq!(
            lx.scan_field_str("name").unwrap(),
            FieldScan::End(Arc::from("alice"))
        );
    }

    #[test]
    fn escaped_str_misses() {
        let mut lx = lexer(r#""name":"al\nice"}"#);
        assert_eq!(lx.scan_field_str("name").unwrap(), FieldScan::NotMatch);
    }

    #[test]
    fn i32_range_check() {
        let mut lx = lexer(r#""n":4294967296}"#);
        assert_eq!(lx.scan_field_i32("n").unwrap(), FieldScan::NotMatch);
        let mut lx = lexer(r#""n":7}"#);
        assert_eq!(lx.scan_field_i32("n").unwrap(), FieldScan::End(7));
    }

    #[test]
    fn symbol_field_interns() {
        let table = Arc::new(SymbolTable::new());
        let mut a = Lexer::new(r#""k":"RUNNING"}"#, LexFlags::default(), Arc::clone(&table));
        let mut b = Lexer::new(r#""k":"RUNNING"}"#, LexFlags::default(), Arc::clone(&table));
        let (FieldScan::End(x), FieldScan::End(y)) = (
            a.scan_field_symbol("k").unwrap(),
            b.scan_field_symbol("k").unwrap(),
        ) else {
            panic!("expected hits");
        };
        assert!(Arc::ptr_eq(&x, &y));
    }

    #[test]
    fn date_field_from_string_and_millis() {
        use chrono::{TimeZone, Utc};
        let expected = Utc.with_ymd_and_hms(2021, 1, 2, 3, 4, 5).unwrap();
        let mut lx = lexer(r#""at":"2021-01-02T03:04:05"}"#);
        assert_eq!(lx.scan_field_date("at").unwrap(), FieldScan::End(expected));

        let millis = expected.timestamp_millis();
        let input = format!(r#""at":{millis}}}"#);
        let mut lx = lexer(&input);
        assert_eq!(lx.scan_field_date("at").unwrap(), FieldScan::End(expected));
    }

    #[test]
    fn str_array_field() {
        let mut lx = lexer(r#""tags":["a",null,"b"],"#);
        assert_eq!(
            lx.scan_field_str_array("tags").unwrap(),
            FieldScan::Value(vec![
                Some(Arc::from("a")),
                None,
                Some(Arc::from("b")),
            ])
        );
    }

    #[test]
    fn empty_str_array_field() {
        let mut lx = lexer(r#""tags":[]}"#);
        assert_eq!(lx.scan_field_str_array("tags").unwrap(), FieldScan::End(vec![]));
    }

    #[test]
    fn whitespace_tolerated_in_prefix() {
        let mut lx = lexer("\"id\" : 42 }");
        assert_eq!(lx.scan_field_i64("id").unwrap(), FieldScan::End(42));
    }
}
