//! An extended-dialect JSON decoding engine.
//!
//! `jsonforge` parses JSON text into either an owned [`Value`] tree or a
//! [`ValueDoc`] node arena, with a dialect that (behind explicit switches)
//! extends RFC 8259: comments, single-quoted strings, unquoted keys, typed
//! numeric suffixes, embedded date literals, hex blobs, and a `$ref`
//! reference protocol that can express shared and circular structure.
//!
//! Numerics are exact: integers that overflow `i64` promote to [`BigInt`],
//! and an opt-in switch decodes decimal literals as arbitrary-precision
//! [`BigDecimal`] values instead of `f64`.
//!
//! ```rust
//! use jsonforge::{parse, Value};
//!
//! let value = parse(r#"{"id": 7, "tags": ["a", "b"]}"#).unwrap();
//! assert_eq!(value.get("id").and_then(Value::as_i64), Some(7));
//! ```
//!
//! Non-default dialects and typed decoding go through [`DecodeOptions`] and
//! the [`TypeBinder`] seam; see [`parse_document`] and [`parse_with`].

mod error;
mod lexer;
mod options;
mod parser;
mod symbol;
mod value;

#[cfg(test)]
mod tests;

pub use bigdecimal::BigDecimal;
pub use chrono::{DateTime, Utc};
pub use num_bigint::BigInt;

pub use error::{ErrorKind, ParseError, SyntaxError};
pub use options::{
    AutoTypePolicy, DecodeOptions, MAX_NESTING_DEPTH, MAX_NUMBER_LITERAL_LEN, REFERENCE_KEY,
    TYPE_KEY,
};
pub use parser::{
    BindError, ExtraProcessor, FieldKind, FieldSpec, FieldValue, InstanceBuilder, NamingStrategy,
    Parser, TypeBinder,
};
pub use symbol::{symbol_hash, SymbolTable};
pub use value::{Array, Map, NodeId, NodeMap, Value, ValueDoc, ValueNode};

use std::sync::Arc;

/// Parses strict JSON into an owned [`Value`] tree using default options.
///
/// # Errors
/// Fails on malformed input or violated structural limits. A document whose
/// references form a cycle cannot materialize into an owned tree and is
/// reported as a reference error; parse such documents with
/// [`parse_document`] instead.
pub fn parse(input: &str) -> Result<Value, ParseError> {
    let options = DecodeOptions::default();
    parse_value(input, &options)
}

/// Parses into an owned [`Value`] tree with explicit options.
///
/// # Errors
/// See [`parse`].
pub fn parse_value(input: &str, options: &DecodeOptions) -> Result<Value, ParseError> {
    let doc = Parser::new(input, options).parse_document()?;
    doc.materialize().ok_or_else(|| {
        error::error_at(
            input,
            input.len(),
            ErrorKind::Reference(Arc::from(
                "document is cyclic and cannot materialize into an owned tree",
            )),
        )
    })
}

/// Parses into a [`ValueDoc`] node arena, the form that can represent
/// shared and circular reference structure.
///
/// # Errors
/// Fails on malformed input, violated structural limits, strict autotype
/// rejection, and (under `strict_references`) unresolvable references.
pub fn parse_document(input: &str, options: &DecodeOptions) -> Result<ValueDoc, ParseError> {
    Parser::new(input, options).parse_document()
}

/// Decodes one top-level object through a type binder.
///
/// # Errors
/// Everything [`parse_document`] reports, plus binding failures.
pub fn parse_with<B: TypeBinder>(
    input: &str,
    options: &DecodeOptions,
    binder: &B,
) -> Result<B::Instance, ParseError> {
    Parser::new(input, options).parse_into(binder)
}

/// Like [`parse_with`], handing fields the binder does not recognize to
/// `extra` instead of dropping them.
///
/// # Errors
/// See [`parse_with`].
pub fn parse_with_extra<B: TypeBinder>(
    input: &str,
    options: &DecodeOptions,
    binder: &B,
    extra: &mut ExtraProcessor<'_>,
) -> Result<B::Instance, ParseError> {
    Parser::new(input, options).parse_into_with_extra(binder, extra)
}
