//! Parse-context bookkeeping for reference resolution.
//!
//! Every container under construction gets a [`ParseContext`] recording its
//! parent, the field name or index that reached it, and (once allocated) its
//! node in the value arena. Contexts live in an index-addressed arena, so
//! parent links are plain indices and never form ownership cycles even when
//! the values they describe are mutually referential.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::value::NodeId;

/// Index of a context within the [`ContextArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ContextId(u32);

/// How a container was reached from its parent.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PathField {
    /// The document root.
    Root,
    /// Reached through an object key.
    Key(Arc<str>),
    /// Reached through an array index.
    Index(usize),
}

#[derive(Debug)]
pub(crate) struct ParseContext {
    pub parent: Option<ContextId>,
    pub field: PathField,
    /// The container's node, back-filled when the node is allocated.
    pub object: Option<NodeId>,
    pub level: u16,
}

/// Arena of contexts for one parse invocation. Contexts are only appended;
/// a context's parent always has a smaller index.
#[derive(Debug, Default)]
pub(crate) struct ContextArena {
    nodes: Vec<ParseContext>,
}

impl ContextArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, parent: Option<ContextId>, field: PathField) -> ContextId {
        let level = parent.map_or(0, |p| self.get(p).level.saturating_add(1));
        let id = ContextId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(ParseContext {
            parent,
            field,
            object: None,
            level,
        });
        id
    }

    pub fn get(&self, id: ContextId) -> &ParseContext {
        &self.nodes[id.0 as usize]
    }

    pub fn set_object(&mut self, id: ContextId, node: NodeId) {
        self.nodes[id.0 as usize].object = Some(node);
    }

    /// The printable path of a context: `$`, `$.a`, `$.a[0]`, derived by
    /// walking parent links.
    pub fn path(&self, id: ContextId) -> String {
        let mut segments = Vec::new();
        let mut cursor = Some(id);
        while let Some(c) = cursor {
            let ctx = self.get(c);
            segments.push(&ctx.field);
            cursor = ctx.parent;
        }
        let mut out = String::from("$");
        for field in segments.iter().rev() {
            match field {
                PathField::Root => {}
                PathField::Key(key) => {
                    let _ = write!(out, ".{key}");
                }
                PathField::Index(index) => {
                    let _ = write!(out, "[{index}]");
                }
            }
        }
        out
    }

    /// Walks from `id` toward the root looking for the first context whose
    /// node satisfies `pred`, excluding `id` itself.
    pub fn find_enclosing<F>(&self, id: ContextId, mut pred: F) -> Option<NodeId>
    where
        F: FnMut(NodeId) -> bool,
    {
        let mut cursor = self.get(id).parent;
        while let Some(c) = cursor {
            let ctx = self.get(c);
            if let Some(node) = ctx.object {
                if pred(node) {
                    return Some(node);
                }
            }
            cursor = ctx.parent;
        }
        None
    }

    /// The root context's node, if already allocated.
    pub fn root_object(&self) -> Option<NodeId> {
        self.nodes.first().and_then(|ctx| ctx.object)
    }
}

/// The assignment slot a deferred reference writes into once its target is
/// known.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Slot {
    ObjectField(NodeId, Arc<str>),
    ArrayElem(NodeId, usize),
    Root,
}

/// A reference whose target did not exist when it was first seen. Consumed
/// exactly once, in creation order, after the top-level value completes.
#[derive(Debug)]
pub(crate) struct ResolveTask {
    pub context: ContextId,
    pub reference: Arc<str>,
    pub slot: Slot,
}
