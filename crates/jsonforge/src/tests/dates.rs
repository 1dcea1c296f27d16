use chrono::{TimeZone, Utc};
use rstest::rstest;

use crate::{parse_value, DecodeOptions, Value};

fn options() -> DecodeOptions {
    DecodeOptions {
        allow_iso8601_dates: true,
        ..DecodeOptions::default()
    }
}

fn parse_date(text: &str) -> Value {
    parse_value(&format!("\"{text}\""), &options()).unwrap()
}

#[rstest]
#[case::dashed("2024-05-02")]
#[case::slashed("2024/05/02")]
#[case::compact("20240502")]
#[case::dotted_dmy("02.05.2024")]
#[case::dashed_dmy("02-05-2024")]
fn date_only_layouts_agree(#[case] text: &str) {
    let expected = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
    assert_eq!(parse_date(text), Value::Date(expected));
}

#[rstest]
#[case::t_sep("2024-05-02T03:04:05")]
#[case::space_sep("2024-05-02 03:04:05")]
#[case::zulu("2024-05-02T03:04:05Z")]
#[case::compact("20240502030405")]
fn date_time_layouts_agree(#[case] text: &str) {
    let expected = Utc.with_ymd_and_hms(2024, 5, 2, 3, 4, 5).unwrap();
    assert_eq!(parse_date(text), Value::Date(expected));
}

#[test]
fn millisecond_precision() {
    let expected = Utc
        .with_ymd_and_hms(2024, 5, 2, 3, 4, 5)
        .unwrap()
        .checked_add_signed(chrono::Duration::milliseconds(123))
        .unwrap();
    assert_eq!(parse_date("2024-05-02T03:04:05.123Z"), Value::Date(expected));
}

#[test]
fn explicit_offset_normalizes_to_utc() {
    let v = parse_date("2024-05-02T03:04:05+02:00");
    let expected = Utc.with_ymd_and_hms(2024, 5, 2, 1, 4, 5).unwrap();
    assert_eq!(v, Value::Date(expected));
}

#[test]
fn epoch_millis_digit_string() {
    let v = parse_date("1714608000000");
    let Value::Date(d) = v else {
        panic!("expected date, got {v:?}")
    };
    assert_eq!(d.timestamp_millis(), 1_714_608_000_000);
}

#[test]
fn cjk_layout() {
    let expected = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
    assert_eq!(parse_date("2024年05月02日"), Value::Date(expected));
}

#[rstest]
#[case::bad_month("2024-13-02")]
#[case::bad_day("2024-05-32")]
#[case::bad_hour("2024-05-02T25:00:00")]
#[case::prose("not a date")]
#[case::partial("2024-05")]
fn non_dates_stay_strings(#[case] text: &str) {
    let v = parse_date(text);
    assert_eq!(v.as_str(), Some(text), "{text:?} should stay a string");
}

#[test]
fn dates_off_by_default() {
    let v = crate::parse("\"2024-05-02\"").unwrap();
    assert_eq!(v.as_str(), Some("2024-05-02"));
}

#[test]
fn date_inside_structure() {
    let v = parse_value(r#"{"created": "2024-05-02T00:00:00Z"}"#, &options()).unwrap();
    assert!(matches!(v.get("created"), Some(Value::Date(_))));
}
