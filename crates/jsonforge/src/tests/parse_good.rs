use std::sync::Arc;

use crate::{parse, parse_document, parse_value, DecodeOptions, Value};

#[test]
fn scalars() {
    assert_eq!(parse("null").unwrap(), Value::Null);
    assert_eq!(parse("true").unwrap(), Value::Bool(true));
    assert_eq!(parse("false").unwrap(), Value::Bool(false));
    assert_eq!(parse("42").unwrap(), Value::Int(42));
    assert_eq!(parse("-7").unwrap(), Value::Int(-7));
    assert_eq!(parse("1.5").unwrap(), Value::Double(1.5));
    assert_eq!(parse(r#""hi""#).unwrap(), Value::Str(Arc::from("hi")));
}

#[test]
fn empty_containers() {
    assert_eq!(parse("[]").unwrap(), Value::Array(vec![]));
    assert_eq!(parse("{}").unwrap(), Value::Object(crate::Map::new()));
}

#[test]
fn nested_structure() {
    let v = parse(r#"{"a": [1, {"b": null}], "c": "x"}"#).unwrap();
    assert_eq!(v.get("c").and_then(Value::as_str), Some("x"));
    let a = v.get("a").unwrap();
    assert_eq!(v.get("a").and_then(Value::as_array).map(Vec::len), Some(2));
    assert_eq!(a.at(0).and_then(Value::as_i64), Some(1));
    assert!(a.at(1).unwrap().get("b").unwrap().is_null());
}

#[test]
fn string_escapes() {
    let v = parse(r#""a\"b\\c\/d\n\tA""#).unwrap();
    assert_eq!(v.as_str(), Some("a\"b\\c/d\n\tA"));
}

#[test]
fn non_ascii_passes_through() {
    let v = parse(r#""日本語 😀""#).unwrap();
    assert_eq!(v.as_str(), Some("日本語 😀"));
}

#[test]
fn surrogate_pair_escape() {
    let v = parse(r#""\uD83D\uDE00""#).unwrap();
    assert_eq!(v.as_str(), Some("\u{1F600}"));
}

#[test]
fn whitespace_everywhere() {
    let v = parse(" \t\r\n { \"a\" : [ 1 , 2 ] } \n").unwrap();
    assert_eq!(v.get("a").unwrap().at(1).and_then(Value::as_i64), Some(2));
}

#[test]
fn keys_sorted_by_default() {
    let v = parse(r#"{"b": 1, "a": 2, "c": 3}"#).unwrap();
    let keys: Vec<&str> = v.as_object().unwrap().keys().map(|k| &**k).collect();
    assert_eq!(keys, ["a", "b", "c"]);
}

#[test]
fn ordered_field_preserves_insertion_order() {
    let options = DecodeOptions {
        ordered_field: true,
        ..DecodeOptions::default()
    };
    let v = parse_value(r#"{"b": 1, "a": 2, "c": 3}"#, &options).unwrap();
    let keys: Vec<&str> = v.as_object().unwrap().keys().map(|k| &**k).collect();
    assert_eq!(keys, ["b", "a", "c"]);
}

#[test]
fn duplicate_keys_last_value_wins() {
    let v = parse(r#"{"a": 1, "a": 2}"#).unwrap();
    assert_eq!(v.get("a").and_then(Value::as_i64), Some(2));
    assert_eq!(v.as_object().unwrap().len(), 1);
}

#[test]
fn document_lookup_by_id() {
    let doc = parse_document(r#"{"a": [true]}"#, &DecodeOptions::default()).unwrap();
    let a = doc.get_key(doc.root(), "a").unwrap();
    let elem = doc.get_index(a, 0).unwrap();
    assert_eq!(doc.node(elem), &crate::ValueNode::Bool(true));
}

#[test]
fn determinism_same_input_same_tree() {
    let input = r#"{"z": [1, 2.5, "x"], "a": {"n": null}}"#;
    assert_eq!(parse(input).unwrap(), parse(input).unwrap());
}

#[test]
fn shared_symbol_table_reuses_keys() {
    let symbols = Arc::new(crate::SymbolTable::new());
    let options = DecodeOptions {
        symbols: Some(Arc::clone(&symbols)),
        ..DecodeOptions::default()
    };
    let a = parse_value(r#"{"name": 1}"#, &options).unwrap();
    let b = parse_value(r#"{"name": 2}"#, &options).unwrap();
    let (ka, _) = a.as_object().unwrap().get_key_value("name").unwrap();
    let (kb, _) = b.as_object().unwrap().get_key_value("name").unwrap();
    assert!(Arc::ptr_eq(ka, kb));
}

#[test]
fn display_renders_parse_result() {
    let options = DecodeOptions {
        ordered_field: true,
        ..DecodeOptions::default()
    };
    let v = parse_value(r#"{"a":1,"b":[null,true],"c":"x"}"#, &options).unwrap();
    assert_eq!(v.to_string(), r#"{"a":1,"b":[null,true],"c":"x"}"#);
}
