use std::str::FromStr;
use std::sync::Arc;

use num_bigint::BigInt;
use quickcheck_macros::quickcheck;

use crate::{parse, Value};

// Same input, same outcome, success or failure. Debug text sidesteps the
// NaN inequality of a direct comparison.
#[quickcheck]
fn parsing_is_deterministic(input: String) -> bool {
    let a = format!("{:?}", parse(&input));
    let b = format!("{:?}", parse(&input));
    a == b
}

#[quickcheck]
fn machine_integers_round_trip(n: i64) -> bool {
    parse(&n.to_string()) == Ok(Value::Int(n))
}

#[quickcheck]
fn oversized_integers_promote_exactly(tail: u64) -> bool {
    // Always wider than i64 regardless of the tail digits.
    let text = format!("9223372036854775808{tail}");
    parse(&text) == Ok(Value::BigInt(BigInt::from_str(&text).unwrap()))
}

#[quickcheck]
fn strings_survive_render_and_reparse(s: String) -> bool {
    let rendered = Value::Str(Arc::from(s.as_str())).to_string();
    parse(&rendered) == Ok(Value::Str(Arc::from(s.as_str())))
}

#[quickcheck]
fn integer_arrays_round_trip(items: Vec<i64>) -> bool {
    let rendered = Value::Array(items.iter().copied().map(Value::Int).collect()).to_string();
    let expected: Vec<Value> = items.into_iter().map(Value::Int).collect();
    parse(&rendered) == Ok(Value::Array(expected))
}

// Interning never changes content, whatever hashes collide.
#[quickcheck]
fn interning_preserves_content(keys: Vec<String>) -> bool {
    let table = crate::SymbolTable::with_size(64);
    keys.iter().all(|k| {
        let interned = table.intern(k, crate::symbol_hash(k));
        *interned == **k
    })
}

#[quickcheck]
fn object_keys_sort_deterministically(keys: Vec<u16>) -> bool {
    let mut source = String::from("{");
    for (i, k) in keys.iter().enumerate() {
        if i > 0 {
            source.push(',');
        }
        source.push_str(&format!("\"k{k}\":{i}"));
    }
    source.push('}');
    let Ok(v) = parse(&source) else { return false };
    let parsed: Vec<&str> = v.as_object().unwrap().keys().map(|k| &**k).collect();
    let mut sorted = parsed.clone();
    sorted.sort_unstable();
    parsed == sorted
}
