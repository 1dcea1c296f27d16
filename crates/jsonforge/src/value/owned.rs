//! The owned, acyclic value tree.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;
use std::sync::Arc;

/// Object payload: insertion-ordered mapping from interned key to value.
pub type Map = IndexMap<Arc<str>, Value>;

/// Array payload.
pub type Array = Vec<Value>;

/// A decoded value as an owned tree.
///
/// Produced by [`ValueDoc::materialize`] and handed to type binders and
/// extra-field hooks. Documents whose `$ref`s form cycles cannot take this
/// shape; use [`ValueDoc`] for those.
///
/// # Examples
///
/// ```
/// use jsonforge::Value;
///
/// let v = jsonforge::parse(r#"{"n": 42, "s": "hi"}"#).unwrap();
/// assert_eq!(v.get("n").and_then(Value::as_i64), Some(42));
/// assert_eq!(v.get("s").and_then(Value::as_str), Some("hi"));
/// ```
///
/// [`ValueDoc`]: crate::ValueDoc
/// [`ValueDoc::materialize`]: crate::ValueDoc::materialize
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    BigInt(BigInt),
    Double(f64),
    Decimal(BigDecimal),
    Float(f32),
    Str(Arc<str>),
    Date(DateTime<Utc>),
    Bytes(Vec<u8>),
    Array(Array),
    Object(Map),
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl Value {
    /// Returns `true` if the value is [`Null`].
    ///
    /// [`Null`]: Value::Null
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for [`Array`] and [`Object`].
    ///
    /// [`Array`]: Value::Array
    /// [`Object`]: Value::Object
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Array(_) | Self::Object(_))
    }

    /// The boolean payload, if this is a [`Bool`].
    ///
    /// [`Bool`]: Value::Bool
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The machine-integer payload, if this is an [`Int`].
    ///
    /// [`Int`]: Value::Int
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// A lossy numeric view over [`Int`], [`Double`], and [`Float`].
    ///
    /// [`Int`]: Value::Int
    /// [`Double`]: Value::Double
    /// [`Float`]: Value::Float
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Double(n) => Some(*n),
            Self::Float(n) => Some(f64::from(*n)),
            _ => None,
        }
    }

    /// The string payload, if this is a [`Str`].
    ///
    /// [`Str`]: Value::Str
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The elements, if this is an [`Array`].
    ///
    /// [`Array`]: Value::Array
    #[must_use]
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The fields, if this is an [`Object`].
    ///
    /// [`Object`]: Value::Object
    #[must_use]
    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Field lookup on objects; `None` for everything else.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Element lookup on arrays; `None` for everything else.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|items| items.get(index))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(Arc::from(v))
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(v)
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Self::Object(v)
    }
}

/// Escapes `src` for inclusion inside a JSON string literal.
///
/// Quotes, backslashes, and control characters become escape sequences;
/// everything else passes through.
pub(crate) fn write_escaped_string<W: std::fmt::Write>(src: &str, f: &mut W) -> std::fmt::Result {
    for c in src.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            c if c.is_ascii_control() => write!(f, "\\u{:04X}", c as u32)?,
            _ => f.write_char(c)?,
        }
    }
    Ok(())
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            Value::Int(n) => write!(f, "{n}"),
            Value::BigInt(n) => write!(f, "{n}"),
            Value::Double(n) => write!(f, "{n}"),
            Value::Decimal(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Str(s) => {
                f.write_str("\"")?;
                write_escaped_string(s, f)?;
                f.write_str("\"")
            }
            Value::Date(d) => write!(f, "\"{}\"", d.to_rfc3339()),
            Value::Bytes(b) => {
                f.write_str("x'")?;
                for byte in b {
                    write!(f, "{byte:02X}")?;
                }
                f.write_str("'")
            }
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str("\"")?;
                    write_escaped_string(key, f)?;
                    write!(f, "\":{value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{Map, Value};

    #[test]
    fn display_round_trips_simple_shapes() {
        let mut map = Map::new();
        map.insert(Arc::from("a"), Value::Int(1));
        map.insert(Arc::from("b"), Value::Array(vec![Value::Null, Value::Bool(true)]));
        let v = Value::Object(map);
        assert_eq!(v.to_string(), r#"{"a":1,"b":[null,true]}"#);
    }

    #[test]
    fn display_escapes_controls_and_quotes() {
        let v = Value::Str(Arc::from("a\"b\n"));
        assert_eq!(v.to_string(), "\"a\\\"b\\u000A\"");
    }

    #[test]
    fn accessors() {
        let v = Value::Array(vec![Value::Int(3)]);
        assert_eq!(v.at(0).and_then(Value::as_i64), Some(3));
        assert!(v.as_object().is_none());
        assert_eq!(v.at(0).unwrap().as_f64(), Some(3.0));
    }
}
