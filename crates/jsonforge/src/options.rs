#![allow(clippy::struct_excessive_bools)]

use std::sync::Arc;

use crate::parser::NamingStrategy;
use crate::symbol::SymbolTable;

/// Configuration for the decoder.
///
/// Each switch independently widens (or narrows) the accepted dialect. All
/// switches default to `false` except [`tolerant_unknown_fields`], which
/// matches the permissive reference behavior.
///
/// There is no ambient global configuration: callers build one
/// `DecodeOptions` value and thread it through every parse.
///
/// # Examples
///
/// ```rust
/// use jsonforge::DecodeOptions;
///
/// let options = DecodeOptions {
///     allow_comments: true,
///     allow_single_quotes: true,
///     ..Default::default()
/// };
/// let doc = jsonforge::parse_document("{'a': 1 /* one */}", &options).unwrap();
/// ```
///
/// [`tolerant_unknown_fields`]: DecodeOptions::tolerant_unknown_fields
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Accept `//` line comments and `/* */` block comments anywhere
    /// whitespace is legal.
    pub allow_comments: bool,

    /// Accept `'…'` string literals in addition to `"…"`.
    pub allow_single_quotes: bool,

    /// Accept bare-identifier object keys (`{a: 1}`).
    pub allow_unquoted_field_names: bool,

    /// Tolerate stray or duplicated commas in objects and arrays
    /// (`[1,,2,]`, `{"a":1,,}`).
    pub allow_arbitrary_commas: bool,

    /// Decode date-shaped string literals as [`Date`] values instead of
    /// plain strings. See the module documentation of `lexer::date` for the
    /// accepted layouts.
    ///
    /// [`Date`]: crate::Value::Date
    pub allow_iso8601_dates: bool,

    /// Decode decimal literals as arbitrary-precision [`Decimal`] values
    /// rather than `f64`.
    ///
    /// [`Decimal`]: crate::Value::Decimal
    pub use_big_decimal: bool,

    /// Preserve object key insertion order. When off, keys of each completed
    /// object are sorted, which keeps the unordered mode deterministic.
    pub ordered_field: bool,

    /// Skip all parse-context and `$ref` bookkeeping. Fastest mode; any
    /// `"$ref"` key is stored as an ordinary field.
    pub disable_circular_reference_detect: bool,

    /// Stop treating `"$ref"` and `"@type"` as special keys.
    pub disable_special_key_detect: bool,

    /// Accept the `"@type"` discriminator key but never act on it; the value
    /// is stored verbatim as a plain field.
    pub ignore_auto_type: bool,

    /// During typed decoding, skip keys the binder does not recognize
    /// (after offering them to the extra-field hook) instead of failing.
    ///
    /// Defaults to `true`.
    pub tolerant_unknown_fields: bool,

    /// Fail the parse when a `$ref` target cannot be located after the
    /// document completes. When off (default), the referring slot is left
    /// null.
    pub strict_references: bool,

    /// Policy consulted for every `"@type"` discriminator.
    pub auto_type: AutoTypePolicy,

    /// How raw binder field names map to wire names during typed decoding.
    pub naming: NamingStrategy,

    /// Key-interning table shared across parses. When `None`, a private
    /// table is created per parser.
    pub symbols: Option<Arc<SymbolTable>>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            allow_comments: false,
            allow_single_quotes: false,
            allow_unquoted_field_names: false,
            allow_arbitrary_commas: false,
            allow_iso8601_dates: false,
            use_big_decimal: false,
            ordered_field: false,
            disable_circular_reference_detect: false,
            disable_special_key_detect: false,
            ignore_auto_type: false,
            tolerant_unknown_fields: true,
            strict_references: false,
            auto_type: AutoTypePolicy::default(),
            naming: NamingStrategy::default(),
            symbols: None,
        }
    }
}

/// Allow/deny policy for the `"@type"` discriminator.
///
/// Resolution order: a matching deny prefix rejects, then a matching allow
/// prefix accepts, then the default is deny. An accepted name still only
/// instantiates when a binder was registered for it; accepted-but-unbound
/// names fall back to the rejected handling.
///
/// Rejected names are stored verbatim as a plain `"@type"` field unless
/// [`strict`] is set, in which case the parse fails with a security error.
///
/// [`strict`]: AutoTypePolicy::strict
#[derive(Debug, Clone, Default)]
pub struct AutoTypePolicy {
    /// Name prefixes that may be instantiated.
    pub allow: Vec<String>,
    /// Name prefixes that are always rejected, before the allow list.
    pub deny: Vec<String>,
    /// Upgrade rejection from store-verbatim to a fatal security error.
    pub strict: bool,
}

impl AutoTypePolicy {
    /// A policy allowing the given prefixes, non-strict.
    #[must_use]
    pub fn allowing<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allow: prefixes.into_iter().map(Into::into).collect(),
            deny: Vec::new(),
            strict: false,
        }
    }

    /// Whether `name` passes the deny-then-allow check.
    #[must_use]
    pub fn permits(&self, name: &str) -> bool {
        if self.deny.iter().any(|p| name.starts_with(p.as_str())) {
            return false;
        }
        self.allow.iter().any(|p| name.starts_with(p.as_str()))
    }
}

/// Maximum nesting depth for objects and arrays, including object keys that
/// are themselves containers.
pub const MAX_NESTING_DEPTH: usize = 512;

/// Maximum byte length of a single numeric literal.
pub const MAX_NUMBER_LITERAL_LEN: usize = 65535;

/// The reserved reference key.
pub const REFERENCE_KEY: &str = "$ref";

/// The reserved type-discriminator key.
pub const TYPE_KEY: &str = "@type";
