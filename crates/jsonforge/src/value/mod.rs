//! Decoded value representations.
//!
//! Two shapes come out of a parse:
//!
//! - [`ValueDoc`], an arena of nodes addressed by [`NodeId`]. This is the
//!   primary generic output. Because containers hold ids rather than owned
//!   children, a resolved `$ref` is plain id reuse: self-referential and
//!   circular documents are representable with no `Rc` cycles, and reference
//!   identity is testable as id equality.
//! - [`Value`], an owned acyclic tree materialized from a doc. This is the
//!   convenient form for assertions, binder payloads, and extra-field hooks.
//!
//! The numeric variants mirror what the scanner decides: a literal's kind is
//! fixed at scan time (suffix, decimal point, exponent, overflow) and never
//! re-guessed here.

mod owned;

pub use owned::{Array, Map, Value};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;
use std::sync::Arc;

/// Index of a node within a [`ValueDoc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[must_use]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Object payload inside a [`ValueDoc`]: insertion-ordered keys to node ids.
pub type NodeMap = IndexMap<Arc<str>, NodeId>;

/// One decoded node.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueNode {
    Null,
    Bool(bool),
    /// A machine integer. Promoted to [`BigInt`] by the scanner on overflow.
    Int(i64),
    BigInt(BigInt),
    Double(f64),
    /// Exact decimal, produced under the `use_big_decimal` switch.
    Decimal(BigDecimal),
    /// Single-precision literal (`1.0F` suffix).
    Float(f32),
    Str(Arc<str>),
    Date(DateTime<Utc>),
    /// Hex blob literal `x'…'`.
    Bytes(Vec<u8>),
    Array(Vec<NodeId>),
    Object(NodeMap),
}

impl ValueNode {
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Array(_) | Self::Object(_))
    }
}

/// A fully parsed document: node arena plus root id.
///
/// Nodes are only ever appended during a parse; ids handed out stay valid
/// for the life of the doc.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueDoc {
    nodes: Vec<ValueNode>,
    root: NodeId,
}

impl ValueDoc {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: NodeId(0),
        }
    }

    pub(crate) fn alloc(&mut self, node: ValueNode) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(node);
        id
    }

    pub(crate) fn set_root(&mut self, id: NodeId) {
        self.root = id;
    }

    /// The id of the top-level value.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The node behind `id`.
    ///
    /// # Panics
    /// Panics if `id` did not come from this doc.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &ValueNode {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut ValueNode {
        &mut self.nodes[id.index()]
    }

    /// Number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty (only before a parse completes).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up the id reached from `id` by object key `key`.
    #[must_use]
    pub fn get_key(&self, id: NodeId, key: &str) -> Option<NodeId> {
        match self.node(id) {
            ValueNode::Object(map) => map.get(key).copied(),
            _ => None,
        }
    }

    /// Looks up the id reached from `id` by array index `index`.
    #[must_use]
    pub fn get_index(&self, id: NodeId, index: usize) -> Option<NodeId> {
        match self.node(id) {
            ValueNode::Array(items) => items.get(index).copied(),
            _ => None,
        }
    }

    /// Converts the doc into an owned [`Value`] tree.
    ///
    /// Returns `None` when the doc contains a reference cycle, which an
    /// owned tree cannot represent. Shared acyclic nodes are deep-copied.
    #[must_use]
    pub fn materialize(&self) -> Option<Value> {
        let mut on_path = vec![false; self.nodes.len()];
        self.materialize_from(self.root, &mut on_path)
    }

    /// Converts the subtree under `id` into an owned [`Value`], with the
    /// same cycle handling as [`materialize`](ValueDoc::materialize).
    #[must_use]
    pub fn materialize_node(&self, id: NodeId) -> Option<Value> {
        let mut on_path = vec![false; self.nodes.len()];
        self.materialize_from(id, &mut on_path)
    }

    /// Renders the subtree under `id` as source text, used for containers
    /// appearing in key position. A cyclic subtree renders as `null`.
    pub(crate) fn render_node(&self, id: NodeId) -> String {
        match self.materialize_node(id) {
            Some(value) => value.to_string(),
            None => Value::Null.to_string(),
        }
    }

    fn materialize_from(&self, id: NodeId, on_path: &mut [bool]) -> Option<Value> {
        if on_path[id.index()] {
            return None;
        }
        let value = match self.node(id) {
            ValueNode::Null => Value::Null,
            ValueNode::Bool(b) => Value::Bool(*b),
            ValueNode::Int(n) => Value::Int(*n),
            ValueNode::BigInt(n) => Value::BigInt(n.clone()),
            ValueNode::Double(n) => Value::Double(*n),
            ValueNode::Decimal(n) => Value::Decimal(n.clone()),
            ValueNode::Float(n) => Value::Float(*n),
            ValueNode::Str(s) => Value::Str(Arc::clone(s)),
            ValueNode::Date(d) => Value::Date(*d),
            ValueNode::Bytes(b) => Value::Bytes(b.clone()),
            ValueNode::Array(items) => {
                on_path[id.index()] = true;
                let mut out = Vec::with_capacity(items.len());
                for &item in items {
                    out.push(self.materialize_from(item, on_path)?);
                }
                on_path[id.index()] = false;
                Value::Array(out)
            }
            ValueNode::Object(map) => {
                on_path[id.index()] = true;
                let mut out = Map::with_capacity(map.len());
                for (key, &child) in map {
                    out.insert(Arc::clone(key), self.materialize_from(child, on_path)?);
                }
                on_path[id.index()] = false;
                Value::Object(out)
            }
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{NodeMap, Value, ValueDoc, ValueNode};

    #[test]
    fn materialize_shared_node() {
        let mut doc = ValueDoc::new();
        let shared = doc.alloc(ValueNode::Int(7));
        let arr = doc.alloc(ValueNode::Array(vec![shared, shared]));
        doc.set_root(arr);
        let value = doc.materialize().unwrap();
        assert_eq!(value, Value::Array(vec![Value::Int(7), Value::Int(7)]));
    }

    #[test]
    fn materialize_rejects_cycle() {
        let mut doc = ValueDoc::new();
        let obj = doc.alloc(ValueNode::Object(NodeMap::new()));
        let ValueNode::Object(map) = doc.node_mut(obj) else {
            unreachable!()
        };
        map.insert(Arc::from("self"), obj);
        doc.set_root(obj);
        assert!(doc.materialize().is_none());
    }

    #[test]
    fn key_and_index_lookup() {
        let mut doc = ValueDoc::new();
        let leaf = doc.alloc(ValueNode::Bool(true));
        let arr = doc.alloc(ValueNode::Array(vec![leaf]));
        let mut map = NodeMap::new();
        map.insert(Arc::from("a"), arr);
        let obj = doc.alloc(ValueNode::Object(map));
        doc.set_root(obj);

        let a = doc.get_key(doc.root(), "a").unwrap();
        assert_eq!(a, arr);
        assert_eq!(doc.get_index(a, 0), Some(leaf));
        assert_eq!(doc.get_index(a, 1), None);
        assert_eq!(doc.get_key(doc.root(), "b"), None);
    }
}
