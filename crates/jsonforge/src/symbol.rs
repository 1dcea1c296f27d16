//! A best-effort string-interning cache for object keys.
//!
//! Repeated keys dominate allocation in object-heavy documents. The table
//! trades completeness for speed: each bucket holds at most one canonical
//! string, forever. A hash/length/content match returns the canonical
//! `Arc<str>` (cheap clone, pointer-comparable); any other content hashing
//! to the same bucket gets a fresh, non-interned string. No eviction, no
//! chaining, no resize.
//!
//! Buckets are `OnceLock`s, so one table can be shared across concurrently
//! running parses: the first writer of a bucket wins, losers silently fall
//! back to fresh allocations, and readers never observe a torn entry.

use std::sync::{Arc, OnceLock};

/// Default number of buckets. Must be a power of two.
pub const DEFAULT_TABLE_SIZE: usize = 4096;

struct SymbolEntry {
    hash: u32,
    text: Arc<str>,
}

/// Fixed-size, share-friendly intern cache. See the module docs.
pub struct SymbolTable {
    buckets: Box<[OnceLock<SymbolEntry>]>,
    mask: usize,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::with_size(DEFAULT_TABLE_SIZE)
    }
}

impl std::fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolTable")
            .field("buckets", &self.buckets.len())
            .finish()
    }
}

impl SymbolTable {
    /// Creates a table with [`DEFAULT_TABLE_SIZE`] buckets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with `size` buckets, rounded up to a power of two.
    /// The bucket array is allocated once and never resized.
    #[must_use]
    pub fn with_size(size: usize) -> Self {
        let size = size.next_power_of_two().max(16);
        let buckets = (0..size).map(|_| OnceLock::new()).collect::<Vec<_>>();
        Self {
            buckets: buckets.into_boxed_slice(),
            mask: size - 1,
        }
    }

    /// Returns a canonical `Arc<str>` for `text` under `hash`.
    ///
    /// The caller computes `hash` with [`symbol_hash`] (the lexer rolls it
    /// while scanning, avoiding a second pass here). Interning is best
    /// effort: on a bucket collision with different content the returned
    /// string is fresh and not cached.
    #[must_use]
    pub fn intern(&self, text: &str, hash: u32) -> Arc<str> {
        let bucket = &self.buckets[(hash as usize) & self.mask];
        let entry = bucket.get_or_init(|| SymbolEntry {
            hash,
            text: Arc::from(text),
        });
        if entry.hash == hash && entry.text.len() == text.len() && *entry.text == *text {
            Arc::clone(&entry.text)
        } else {
            Arc::from(text)
        }
    }
}

/// The 31-multiplier rolling hash used for symbol lookup.
///
/// Incremental form for scanners: start from 0 and fold each byte with
/// `h = h.wrapping_mul(31).wrapping_add(b)`.
#[must_use]
pub fn symbol_hash(text: &str) -> u32 {
    text.bytes()
        .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(u32::from(b)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{symbol_hash, SymbolTable};

    #[test]
    fn repeated_intern_returns_same_allocation() {
        let table = SymbolTable::with_size(64);
        let a = table.intern("name", symbol_hash("name"));
        let b = table.intern("name", symbol_hash("name"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(&*a, "name");
    }

    #[test]
    fn colliding_content_gets_fresh_string() {
        let table = SymbolTable::with_size(16);
        // Force a collision: same bucket, different content.
        let h = symbol_hash("first");
        let a = table.intern("first", h);
        let b = table.intern("second", h);
        assert_eq!(&*a, "first");
        assert_eq!(&*b, "second");
        // The bucket is still owned by the first occupant.
        let c = table.intern("first", h);
        assert!(Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn shared_across_threads() {
        let table = Arc::new(SymbolTable::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let table = Arc::clone(&table);
                std::thread::spawn(move || table.intern("key", symbol_hash("key")))
            })
            .collect();
        let interned: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for s in &interned {
            assert_eq!(&**s, "key");
        }
    }

    #[test]
    fn hash_matches_incremental_form() {
        let mut h = 0u32;
        for b in "field_name".bytes() {
            h = h.wrapping_mul(31).wrapping_add(u32::from(b));
        }
        assert_eq!(h, symbol_hash("field_name"));
    }
}
