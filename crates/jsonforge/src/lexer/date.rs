//! Embedded date recognition.
//!
//! [`scan_iso8601_if_match`] accepts the date layouts the dialect knows and
//! reports anything else as "not a date" (`None`), so callers can fall back
//! to treating the literal as a plain string:
//!
//! - `yyyyMMdd`, `yyyyMMddHHmmss`, `yyyyMMddHHmmssSSS`
//! - `yyyy-MM-dd` / `yyyy/MM/dd`, optionally followed by `T` or a space and
//!   `HH:mm:ss[.SSS]` and a zone (`Z`, `±HH:mm`, `±HHmm`, `±HH`)
//! - `dd.MM.yyyy`, `dd-MM-yyyy`
//! - `yyyy年MM月dd日`, optionally `HH時mm分ss秒`
//! - a pure digit run decoded as epoch milliseconds
//!
//! Calendar fields are range-checked before the instant is committed; a
//! second of 60 (leap tolerance) is clamped to 59. A literal without a zone
//! reads as UTC, which keeps parses host-independent.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Byte cursor for the fixed-width date layouts.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Reads exactly `n` ASCII digits as one number.
    fn digits(&mut self, n: usize) -> Option<u32> {
        let end = self.pos.checked_add(n)?;
        let span = self.bytes.get(self.pos..end)?;
        let mut acc = 0u32;
        for &b in span {
            if !b.is_ascii_digit() {
                return None;
            }
            acc = acc * 10 + u32::from(b - b'0');
        }
        self.pos = end;
        Some(acc)
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.bytes.get(self.pos) == Some(&b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip(&mut self, n: usize) {
        self.pos += n;
    }

    fn done(&self) -> bool {
        self.pos >= self.bytes.len()
    }
}

/// Attempts to decode `s` as one of the supported date layouts.
#[must_use]
pub fn scan_iso8601_if_match(s: &str) -> Option<DateTime<Utc>> {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return None;
    }
    if bytes.iter().all(u8::is_ascii_digit) {
        return match bytes.len() {
            8 => {
                let mut c = Cursor::new(bytes);
                let (y, m, d) = (c.digits(4)?, c.digits(2)?, c.digits(2)?);
                build(y, m, d, 0, 0, 0, 0, 0)
            }
            14 | 17 => {
                let mut c = Cursor::new(bytes);
                let (y, m, d) = (c.digits(4)?, c.digits(2)?, c.digits(2)?);
                let (h, min, sec) = (c.digits(2)?, c.digits(2)?, c.digits(2)?);
                let millis = if bytes.len() == 17 { c.digits(3)? } else { 0 };
                build(y, m, d, h, min, sec, millis, 0)
            }
            _ => {
                let millis: i64 = s.parse().ok()?;
                Utc.timestamp_millis_opt(millis).single()
            }
        };
    }
    if s.contains('年') {
        return scan_cjk(s);
    }
    if bytes.len() >= 10 && matches!(bytes[4], b'-' | b'/') && bytes[7] == bytes[4] {
        return scan_ymd(bytes);
    }
    if bytes.len() == 10 && matches!(bytes[2], b'.' | b'-') && bytes[5] == bytes[2] {
        let mut c = Cursor::new(bytes);
        let d = c.digits(2)?;
        c.skip(1);
        let m = c.digits(2)?;
        c.skip(1);
        let y = c.digits(4)?;
        return build(y, m, d, 0, 0, 0, 0, 0);
    }
    None
}

/// `yyyy-MM-dd` (or `/`) with an optional time and zone tail.
fn scan_ymd(bytes: &[u8]) -> Option<DateTime<Utc>> {
    let mut c = Cursor::new(bytes);
    let y = c.digits(4)?;
    c.skip(1);
    let m = c.digits(2)?;
    c.skip(1);
    let d = c.digits(2)?;
    if c.done() {
        return build(y, m, d, 0, 0, 0, 0, 0);
    }
    if !(c.eat(b'T') || c.eat(b' ')) {
        return None;
    }
    let h = c.digits(2)?;
    if !c.eat(b':') {
        return None;
    }
    let min = c.digits(2)?;
    if !c.eat(b':') {
        return None;
    }
    let sec = c.digits(2)?;
    let millis = if c.eat(b'.') { c.digits(3)? } else { 0 };
    let offset = if c.done() { 0 } else { scan_zone(&mut c)? };
    if !c.done() {
        return None;
    }
    build(y, m, d, h, min, sec, millis, offset)
}

/// Zone suffix; returns the offset from UTC in seconds.
fn scan_zone(c: &mut Cursor<'_>) -> Option<i32> {
    if c.eat(b'Z') {
        return if c.done() { Some(0) } else { None };
    }
    let sign = if c.eat(b'+') {
        1
    } else if c.eat(b'-') {
        -1
    } else {
        return None;
    };
    let hours = c.digits(2)?;
    let minutes = if c.done() {
        0
    } else {
        c.eat(b':');
        c.digits(2)?
    };
    if hours > 18 || minutes > 59 {
        return None;
    }
    #[allow(clippy::cast_possible_wrap)]
    Some(sign * ((hours * 3600 + minutes * 60) as i32))
}

/// `yyyy年MM月dd日`, optionally `HH時mm分ss秒`.
fn scan_cjk(s: &str) -> Option<DateTime<Utc>> {
    let (date_part, time_part) = match s.split_once('日') {
        Some((date, rest)) => (date, rest),
        None => return None,
    };
    let (y_str, rest) = date_part.split_once('年')?;
    let (m_str, d_str) = rest.split_once('月')?;
    let y: u32 = y_str.parse().ok()?;
    let m: u32 = m_str.parse().ok()?;
    let d: u32 = d_str.parse().ok()?;
    if time_part.is_empty() {
        return build(y, m, d, 0, 0, 0, 0, 0);
    }
    let (h_str, rest) = time_part.split_once('時')?;
    let (min_str, rest) = rest.split_once('分')?;
    let sec_str = rest.strip_suffix('秒')?;
    let h: u32 = h_str.parse().ok()?;
    let min: u32 = min_str.parse().ok()?;
    let sec: u32 = sec_str.parse().ok()?;
    build(y, m, d, h, min, sec, 0, 0)
}

/// Range-checks the calendar fields and commits the instant.
#[allow(clippy::too_many_arguments)]
fn build(
    y: u32,
    m: u32,
    d: u32,
    h: u32,
    min: u32,
    sec: u32,
    millis: u32,
    offset_secs: i32,
) -> Option<DateTime<Utc>> {
    if !(1..=12).contains(&m) || !(1..=31).contains(&d) {
        return None;
    }
    if h > 23 || min > 59 || sec > 60 || millis > 999 {
        return None;
    }
    // Leap-second tolerance: clamp rather than reject.
    let sec = sec.min(59);
    let date = NaiveDate::from_ymd_opt(i32::try_from(y).ok()?, m, d)?;
    let naive = date.and_hms_milli_opt(h, min, sec, millis)?;
    let utc = naive - chrono::Duration::seconds(i64::from(offset_secs));
    Some(Utc.from_utc_datetime(&utc))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    use super::scan_iso8601_if_match;

    #[rstest]
    #[case("2021-01-02T03:04:05")]
    #[case("2021-01-02 03:04:05")]
    #[case("20210102030405")]
    fn layouts_agree_on_the_instant(#[case] input: &str) {
        let expected = Utc.with_ymd_and_hms(2021, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(scan_iso8601_if_match(input), Some(expected));
    }

    #[test]
    fn date_only_layouts() {
        let expected = Utc.with_ymd_and_hms(2021, 1, 2, 0, 0, 0).unwrap();
        for input in ["20210102", "2021-01-02", "2021/01/02", "02.01.2021", "02-01-2021"] {
            assert_eq!(scan_iso8601_if_match(input), Some(expected), "{input}");
        }
    }

    #[test]
    fn millis_and_zone() {
        let expected = Utc
            .with_ymd_and_hms(2021, 1, 2, 3, 4, 5)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(678))
            .unwrap();
        assert_eq!(
            scan_iso8601_if_match("2021-01-02T03:04:05.678Z"),
            Some(expected)
        );
        // +08:00 shifts the instant back eight hours.
        let shifted = Utc.with_ymd_and_hms(2021, 1, 1, 19, 4, 5).unwrap();
        assert_eq!(
            scan_iso8601_if_match("2021-01-02T03:04:05+08:00"),
            Some(shifted)
        );
        assert_eq!(
            scan_iso8601_if_match("2021-01-02T03:04:05+0800"),
            Some(shifted)
        );
    }

    #[test]
    fn cjk_layout() {
        let expected = Utc.with_ymd_and_hms(2021, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(scan_iso8601_if_match("2021年01月02日"), Some(expected));
        let with_time = Utc.with_ymd_and_hms(2021, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            scan_iso8601_if_match("2021年01月02日03時04分05秒"),
            Some(with_time)
        );
    }

    #[test]
    fn epoch_millis() {
        let expected = Utc.timestamp_millis_opt(1_609_555_445_000).single().unwrap();
        assert_eq!(scan_iso8601_if_match("1609555445000"), Some(expected));
    }

    #[test]
    fn leap_second_clamped() {
        assert!(scan_iso8601_if_match("2016-12-31T23:59:60").is_some());
    }

    #[test]
    fn non_dates_report_no_match() {
        for input in [
            "hello",
            "2021-13-01",
            "2021-00-10",
            "2021-01-32",
            "2021-01-02T25:00:00",
            "2021-01-02X03:04:05",
            "02/01/2021",
            "",
        ] {
            assert_eq!(scan_iso8601_if_match(input), None, "{input}");
        }
    }
}
