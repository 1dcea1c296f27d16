//! The typed-decoding seam.
//!
//! Object mapping lives outside the core: a [`TypeBinder`] describes a
//! target type (its name, its fields in declared order, and how to build an
//! instance), and the parser drives it. The declared field order and kinds
//! let the parser prefer the one-pass fast-path field scans; everything the
//! binder does not recognize is fully parsed and offered to the extra-field
//! hook.

use std::borrow::Cow;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::value::Value;

/// The value kind a binder declares for a field, selecting the fast-path
/// scan the parser will attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    I32,
    I64,
    F64,
    Str,
    /// A string field with few distinct values, interned while scanning.
    Symbol,
    Date,
    StrArray,
    /// No fast path; the field is parsed generically.
    Any,
}

/// One field of a bound type, in the binder's declared order.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// The raw (language-side) field name; the configured naming strategy
    /// maps it to the wire name.
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// A decoded field value handed to an [`InstanceBuilder`].
///
/// Fast-path hits arrive as the typed variants; generic fallbacks arrive as
/// [`FieldValue::Any`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F64(f64),
    Str(Arc<str>),
    Date(DateTime<Utc>),
    StrArray(Vec<Option<Arc<str>>>),
    Any(Value),
}

impl FieldValue {
    /// Coerces a generic value into the kind a field declared. `None` means
    /// the shapes are incompatible.
    #[must_use]
    pub(crate) fn coerce(kind: FieldKind, value: Value) -> Option<Self> {
        if value.is_null() {
            return Some(Self::Null);
        }
        match kind {
            FieldKind::Bool => value.as_bool().map(Self::Bool),
            FieldKind::I32 => value
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .map(Self::I32),
            FieldKind::I64 => value.as_i64().map(Self::I64),
            FieldKind::F64 => value.as_f64().map(Self::F64),
            FieldKind::Str | FieldKind::Symbol => match value {
                Value::Str(s) => Some(Self::Str(s)),
                _ => None,
            },
            FieldKind::Date => match value {
                Value::Date(d) => Some(Self::Date(d)),
                Value::Int(millis) => chrono::TimeZone::timestamp_millis_opt(&Utc, millis)
                    .single()
                    .map(Self::Date),
                _ => None,
            },
            FieldKind::StrArray => match value {
                Value::Array(items) => {
                    let mut out = Vec::with_capacity(items.len());
                    for item in items {
                        match item {
                            Value::Null => out.push(None),
                            Value::Str(s) => out.push(Some(s)),
                            _ => return None,
                        }
                    }
                    Some(Self::StrArray(out))
                }
                _ => None,
            },
            FieldKind::Any => Some(Self::Any(value)),
        }
    }
}

/// A failure reported by a binder.
#[derive(Debug, Clone, PartialEq)]
pub struct BindError(pub String);

impl BindError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Describes a target type to the parser.
pub trait TypeBinder {
    /// The finished instance type.
    type Instance;
    /// The accumulating builder type.
    type Builder: InstanceBuilder<Instance = Self::Instance>;

    /// The wire discriminator this binder answers to (autotype).
    fn type_name(&self) -> &str;

    /// Fields in declared order; the parser tries fast-path scans in this
    /// order.
    fn fields(&self) -> &[FieldSpec];

    /// Starts a fresh instance.
    fn builder(&self) -> Self::Builder;
}

/// Consumes (field, value) pairs and produces an instance.
pub trait InstanceBuilder {
    type Instance;

    /// Accepts one decoded field. The name is the raw (declared) name, not
    /// the wire name.
    ///
    /// # Errors
    /// A binder may reject a value it cannot store.
    fn set(&mut self, name: &str, value: FieldValue) -> Result<(), BindError>;

    /// Finishes the instance.
    ///
    /// # Errors
    /// Fails when required fields are missing or inconsistent.
    fn finish(self) -> Result<Self::Instance, BindError>;
}

/// Hook receiving fields a binder did not recognize, fully parsed.
pub type ExtraProcessor<'h> = dyn FnMut(&str, Value) + 'h;

/// Maps raw property names to wire names.
///
/// Raw names are split into words on `_`, `-`, and lower-to-upper case
/// boundaries, then rejoined per strategy, so any reasonable raw convention
/// maps predictably.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NamingStrategy {
    /// Wire name equals the raw name.
    #[default]
    Identity,
    /// `field_name`
    SnakeCase,
    /// `fieldName`
    CamelCase,
    /// `FieldName`
    PascalCase,
    /// `field-name`
    KebabCase,
}

impl NamingStrategy {
    /// The wire name for a raw property name.
    #[must_use]
    pub fn wire_name<'n>(&self, raw: &'n str) -> Cow<'n, str> {
        match self {
            Self::Identity => Cow::Borrowed(raw),
            Self::SnakeCase => Cow::Owned(join(&words(raw), "_", Casing::Lower)),
            Self::KebabCase => Cow::Owned(join(&words(raw), "-", Casing::Lower)),
            Self::CamelCase => Cow::Owned(join(&words(raw), "", Casing::CamelTail)),
            Self::PascalCase => Cow::Owned(join(&words(raw), "", Casing::Capitalize)),
        }
    }
}

enum Casing {
    Lower,
    Capitalize,
    /// Capitalize every word but the first.
    CamelTail,
}

fn words(raw: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in raw.chars() {
        if ch == '_' || ch == '-' {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.extend(ch.to_lowercase());
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn join(words: &[String], sep: &str, casing: Casing) -> String {
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        let capitalize = match casing {
            Casing::Lower => false,
            Casing::Capitalize => true,
            Casing::CamelTail => i > 0,
        };
        if capitalize {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        } else {
            out.push_str(word);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{FieldKind, FieldValue, NamingStrategy};
    use crate::value::Value;

    #[test]
    fn naming_strategies() {
        let raw = "user_name";
        assert_eq!(NamingStrategy::Identity.wire_name(raw), "user_name");
        assert_eq!(NamingStrategy::SnakeCase.wire_name("userName"), "user_name");
        assert_eq!(NamingStrategy::CamelCase.wire_name(raw), "userName");
        assert_eq!(NamingStrategy::PascalCase.wire_name(raw), "UserName");
        assert_eq!(NamingStrategy::KebabCase.wire_name(raw), "user-name");
    }

    #[test]
    fn coerce_matches_kinds() {
        assert_eq!(
            FieldValue::coerce(FieldKind::I64, Value::Int(9)),
            Some(FieldValue::I64(9))
        );
        assert_eq!(
            FieldValue::coerce(FieldKind::I32, Value::Int(i64::from(i32::MAX) + 1)),
            None
        );
        assert_eq!(
            FieldValue::coerce(FieldKind::Str, Value::Str(Arc::from("x"))),
            Some(FieldValue::Str(Arc::from("x")))
        );
        assert_eq!(FieldValue::coerce(FieldKind::Bool, Value::Int(1)), None);
        assert_eq!(
            FieldValue::coerce(FieldKind::F64, Value::Int(2)),
            Some(FieldValue::F64(2.0))
        );
        assert_eq!(
            FieldValue::coerce(FieldKind::Str, Value::Null),
            Some(FieldValue::Null)
        );
    }

    #[test]
    fn coerce_str_array() {
        let value = Value::Array(vec![
            Value::Str(Arc::from("a")),
            Value::Null,
        ]);
        assert_eq!(
            FieldValue::coerce(FieldKind::StrArray, value),
            Some(FieldValue::StrArray(vec![Some(Arc::from("a")), None]))
        );
        let bad = Value::Array(vec![Value::Int(1)]);
        assert_eq!(FieldValue::coerce(FieldKind::StrArray, bad), None);
    }
}
