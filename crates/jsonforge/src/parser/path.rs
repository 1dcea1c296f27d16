//! Reference path expressions.
//!
//! A `$ref` payload that is none of the three sentinels (`@`, `..`, `$`) is
//! a path rooted at the document: `$` followed by `.key`, `[index]`, or
//! `["key"]` segments. This is the subset the reference protocol needs, not
//! a general JSON path engine.

use crate::value::{NodeId, ValueDoc};

/// One path segment.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PathSeg {
    Key(String),
    Index(usize),
}

/// Parses `$`-rooted path text. `None` means the payload is not a valid
/// path expression.
pub(crate) fn parse_ref_path(text: &str) -> Option<Vec<PathSeg>> {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'$') {
        return None;
    }
    let mut segs = Vec::new();
    let mut pos = 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'.' => {
                pos += 1;
                let start = pos;
                while pos < bytes.len() && !matches!(bytes[pos], b'.' | b'[') {
                    pos += 1;
                }
                if pos == start {
                    return None;
                }
                segs.push(PathSeg::Key(text[start..pos].to_owned()));
            }
            b'[' => {
                pos += 1;
                if bytes.get(pos) == Some(&b'"') {
                    pos += 1;
                    let start = pos;
                    while pos < bytes.len() && bytes[pos] != b'"' {
                        pos += 1;
                    }
                    if pos >= bytes.len() {
                        return None;
                    }
                    let key = text[start..pos].to_owned();
                    pos += 1;
                    if bytes.get(pos) != Some(&b']') {
                        return None;
                    }
                    pos += 1;
                    segs.push(PathSeg::Key(key));
                } else {
                    let start = pos;
                    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                        pos += 1;
                    }
                    if pos == start || bytes.get(pos) != Some(&b']') {
                        return None;
                    }
                    let index = text[start..pos].parse().ok()?;
                    pos += 1;
                    segs.push(PathSeg::Index(index));
                }
            }
            _ => return None,
        }
    }
    Some(segs)
}

/// Evaluates a parsed path against the tree built so far. `None` means the
/// target does not exist (yet).
pub(crate) fn eval_path(doc: &ValueDoc, root: NodeId, segs: &[PathSeg]) -> Option<NodeId> {
    let mut current = root;
    for seg in segs {
        current = match seg {
            PathSeg::Key(key) => doc.get_key(current, key)?,
            PathSeg::Index(index) => doc.get_index(current, *index)?,
        };
    }
    Some(current)
}
