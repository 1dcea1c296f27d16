//! Per-call scratch buffer reuse.
//!
//! Escape decoding and number staging want a growable `String` that lives
//! for exactly one parse call. Buffers are pooled per thread: a guard takes
//! one at parser construction and its `Drop` returns it, on success and
//! error paths alike. A parse never shares its buffer, so there is no
//! synchronization.

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};

const MAX_POOLED: usize = 8;
const MAX_RETAINED_CAPACITY: usize = 1 << 20;

thread_local! {
    static POOL: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// A pooled `String` held for the duration of one parse call.
#[derive(Debug)]
pub(crate) struct ScratchGuard {
    buf: String,
}

impl ScratchGuard {
    pub(crate) fn acquire() -> Self {
        let buf = POOL.with(|pool| pool.borrow_mut().pop()).unwrap_or_default();
        Self { buf }
    }
}

impl Drop for ScratchGuard {
    fn drop(&mut self) {
        let mut buf = std::mem::take(&mut self.buf);
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        buf.clear();
        POOL.with(|pool| {
            let mut pool = pool.borrow_mut();
            if pool.len() < MAX_POOLED {
                pool.push(buf);
            }
        });
    }
}

impl Deref for ScratchGuard {
    type Target = String;

    fn deref(&self) -> &String {
        &self.buf
    }
}

impl DerefMut for ScratchGuard {
    fn deref_mut(&mut self) -> &mut String {
        &mut self.buf
    }
}
