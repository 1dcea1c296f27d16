//! The recursive-descent parser.
//!
//! Drives the lexer token by token, building a [`ValueDoc`] arena or
//! feeding a [`TypeBinder`]. Dispatch is an explicit match over the current
//! token at each grammar position, which keeps the state machine auditable
//! and the hot arms inlinable. There is no backtracking except the bounded
//! fast-path fallback, whose miss statuses guarantee an untouched cursor.
//!
//! Containers push a [`ParseContext`](context::ParseContext) on entry and
//! back-fill it with the node they allocate, which is what makes the three
//! `$ref` sentinels and path references resolvable without re-walking the
//! source. Deferred references accumulate as resolve tasks and drain
//! exactly once, in creation order, after the top-level value finishes.

mod autotype;
mod binder;
mod context;
mod path;

pub use binder::{
    BindError, ExtraProcessor, FieldKind, FieldSpec, FieldValue, InstanceBuilder, NamingStrategy,
    TypeBinder,
};

use std::sync::Arc;

use autotype::{check_auto_type, AutoTypeDecision};
use context::{ContextArena, ContextId, PathField, ResolveTask, Slot};

use crate::error::{error_at, ErrorKind, ParseError, SyntaxError};
use crate::lexer::{Expect, FieldScan, LexFlags, Lexer, Token};
use crate::options::{DecodeOptions, MAX_NESTING_DEPTH, REFERENCE_KEY, TYPE_KEY};
use crate::symbol::SymbolTable;
use crate::value::{NodeId, NodeMap, Value, ValueDoc, ValueNode};

/// A single parse invocation: one input, one options value, one output.
///
/// Parsing is strictly call-and-return; the parser is not reusable and not
/// shareable across threads. See [`crate::parse`] and
/// [`crate::parse_document`] for the convenience entry points.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    options: &'a DecodeOptions,
    doc: ValueDoc,
    contexts: ContextArena,
    tasks: Vec<ResolveTask>,
    depth: usize,
}

/// Outcome of a single reference-resolution attempt.
enum RefResolution {
    Resolved(NodeId),
    Deferred,
    Malformed,
}

impl<'a> Parser<'a> {
    /// Creates a parser over `input`. The symbol table comes from the
    /// options when shared, otherwise a private one is created.
    #[must_use]
    pub fn new(input: &'a str, options: &'a DecodeOptions) -> Self {
        let symbols = options
            .symbols
            .clone()
            .unwrap_or_else(|| Arc::new(SymbolTable::new()));
        Self {
            lexer: Lexer::new(input, LexFlags::from_options(options), symbols),
            options,
            doc: ValueDoc::new(),
            contexts: ContextArena::new(),
            tasks: Vec::new(),
            depth: 0,
        }
    }

    /// Parses the whole input into a [`ValueDoc`].
    ///
    /// # Errors
    /// Fails on malformed input, violated structural limits, strict
    /// autotype rejection, and (under `strict_references`) unresolvable
    /// references.
    pub fn parse_document(mut self) -> Result<ValueDoc, ParseError> {
        tracing::trace!(len = self.lexer.input().len(), "parse start");
        self.lexer.next_token()?;
        let root = self.parse_value(None, PathField::Root, Slot::Root)?;
        self.doc.set_root(root);
        self.expect_eof()?;
        self.drain_tasks()?;
        Ok(self.doc)
    }

    /// Parses the whole input through a type binder.
    ///
    /// # Errors
    /// Everything [`parse_document`](Parser::parse_document) reports, plus
    /// binding failures.
    pub fn parse_into<B: TypeBinder>(self, target: &B) -> Result<B::Instance, ParseError> {
        self.parse_into_inner(target, None)
    }

    /// Like [`parse_into`](Parser::parse_into), handing unrecognized fields
    /// to `extra` instead of dropping them.
    ///
    /// # Errors
    /// See [`parse_into`](Parser::parse_into).
    pub fn parse_into_with_extra<B: TypeBinder>(
        self,
        target: &B,
        extra: &mut ExtraProcessor<'_>,
    ) -> Result<B::Instance, ParseError> {
        self.parse_into_inner(target, Some(extra))
    }

    fn parse_into_inner<B: TypeBinder>(
        mut self,
        target: &B,
        mut extra: Option<&mut ExtraProcessor<'_>>,
    ) -> Result<B::Instance, ParseError> {
        self.lexer.next_token()?;
        let instance = self.parse_typed(target, extra.as_deref_mut())?;
        self.expect_eof()?;
        Ok(instance)
    }

    fn expect_eof(&self) -> Result<(), ParseError> {
        match self.lexer.current() {
            Token::Eof => Ok(()),
            other => Err(self.lexer.error_at_token(ErrorKind::Syntax(
                SyntaxError::UnexpectedToken {
                    found: other.name(),
                    expected: "end of input",
                },
            ))),
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        self.lexer
            .error_at_token(ErrorKind::Syntax(SyntaxError::UnexpectedToken {
                found: self.lexer.current().name(),
                expected,
            }))
    }

    // --------------------------------------------------------------------
    // Generic value parsing
    // --------------------------------------------------------------------

    /// Parses the value at the current token. `slot` names where the parent
    /// will store the result, which is what a deferred reference needs to
    /// finish the assignment later.
    fn parse_value(
        &mut self,
        parent: Option<ContextId>,
        field: PathField,
        slot: Slot,
    ) -> Result<NodeId, ParseError> {
        let node = match self.lexer.current().clone() {
            Token::Null | Token::Undefined => ValueNode::Null,
            Token::True => ValueNode::Bool(true),
            Token::False => ValueNode::Bool(false),
            Token::Int(n) => ValueNode::Int(n),
            Token::BigInt(n) => ValueNode::BigInt(n),
            Token::Double(n) => ValueNode::Double(n),
            Token::Decimal(n) => ValueNode::Decimal(n),
            Token::Float(n) => ValueNode::Float(n),
            Token::Str(s) => ValueNode::Str(s),
            Token::Date(d) => ValueNode::Date(d),
            Token::Hex(b) => ValueNode::Bytes(b),
            Token::LBrace => return self.parse_object(parent, field, slot),
            Token::LBracket => return self.parse_array(parent, field, false),
            Token::SetKw => return self.parse_collection_literal(parent, field, false),
            Token::TreeSetKw => return self.parse_collection_literal(parent, field, true),
            Token::New => return self.parse_ctor(),
            Token::Eof => {
                return Err(self
                    .lexer
                    .error_at_token(ErrorKind::Syntax(SyntaxError::UnexpectedEndOfInput)))
            }
            _ => return Err(self.unexpected("value")),
        };
        let id = self.doc.alloc(node);
        self.lexer.next_token_expect(Expect::AfterValue)?;
        Ok(id)
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(self
                .lexer
                .error_at_token(ErrorKind::DepthLimit(MAX_NESTING_DEPTH)));
        }
        Ok(())
    }

    fn parse_object(
        &mut self,
        parent: Option<ContextId>,
        field: PathField,
        slot: Slot,
    ) -> Result<NodeId, ParseError> {
        self.enter()?;
        let result = self.parse_object_body(parent, field, slot);
        self.depth -= 1;
        result
    }

    #[allow(clippy::too_many_lines)]
    fn parse_object_body(
        &mut self,
        parent: Option<ContextId>,
        field: PathField,
        slot: Slot,
    ) -> Result<NodeId, ParseError> {
        let track_refs = !self.options.disable_circular_reference_detect;
        let special_keys = !self.options.disable_special_key_detect;
        let id = self.doc.alloc(ValueNode::Object(NodeMap::new()));
        let ctx = if track_refs {
            let c = self.contexts.push(parent, field);
            self.contexts.set_object(c, id);
            Some(c)
        } else {
            None
        };

        // Cursor is just past '{'.
        self.lexer.scan_key_token()?;
        self.skip_stray_commas(true)?;
        loop {
            let mut key_was_container = false;
            let key: Arc<str> = match self.lexer.current().clone() {
                Token::RBrace => break,
                Token::Str(s) => s,
                Token::Ident(s) if self.options.allow_unquoted_field_names => s,
                Token::Int(n) => Arc::from(n.to_string()),
                Token::LBrace | Token::LBracket => {
                    // A container as a key decodes to its rendered text. The
                    // rendered tree is detached, so references inside it have
                    // no resolvable slot and are discarded.
                    key_was_container = true;
                    let tasks_before = self.tasks.len();
                    let key_node = self.parse_value(ctx, PathField::Root, Slot::Root)?;
                    self.tasks.truncate(tasks_before);
                    Arc::from(self.doc.render_node(key_node))
                }
                _ => return Err(self.unexpected("object key")),
            };
            if !key_was_container {
                // A container key already advanced onto the colon.
                self.lexer.next_token()?;
            }
            if self.lexer.current() != &Token::Colon {
                return Err(self.unexpected("':'"));
            }
            self.lexer.next_token()?;

            let object_is_empty = match self.doc.node(id) {
                ValueNode::Object(map) => map.is_empty(),
                _ => false,
            };

            // The reference key, only special in an otherwise-empty object.
            if let Some(ctx) = ctx {
                if special_keys && &*key == REFERENCE_KEY && object_is_empty {
                    if let Some(resolved) = self.parse_reference_object(id, ctx, &slot)? {
                        return Ok(resolved);
                    }
                    // Fell through: "$ref" plus more fields, stored as data.
                    continue;
                }
            }

            if special_keys && &*key == TYPE_KEY {
                if let Token::Str(type_name) = self.lexer.current().clone() {
                    match check_auto_type(self.options, &type_name) {
                        AutoTypeDecision::Reject => {
                            return Err(self
                                .lexer
                                .error_at_token(ErrorKind::Security(type_name)));
                        }
                        // The generic tree has no instances to build; a
                        // permitted name is data here just like an inert one.
                        AutoTypeDecision::Permit | AutoTypeDecision::StoreVerbatim => {}
                    }
                }
            }

            let value = self.parse_value(
                ctx,
                PathField::Key(Arc::clone(&key)),
                Slot::ObjectField(id, Arc::clone(&key)),
            )?;
            self.insert_field(id, key, value);

            match self.lexer.current() {
                Token::Comma => {
                    self.lexer.scan_key_token()?;
                    self.skip_stray_commas(false)?;
                }
                Token::RBrace => break,
                _ => return Err(self.unexpected("',' or '}'")),
            }
        }

        if !self.options.ordered_field {
            if let ValueNode::Object(map) = self.doc.node_mut(id) {
                map.sort_keys();
            }
        }
        self.lexer.next_token_expect(Expect::AfterValue)?;
        Ok(id)
    }

    /// Skips over stray commas at a key position. After a real comma a `}`
    /// is itself a stray-comma artifact, so it is only legal when tolerated.
    fn skip_stray_commas(&mut self, leading: bool) -> Result<(), ParseError> {
        if self.options.allow_arbitrary_commas {
            while self.lexer.current() == &Token::Comma {
                self.lexer.scan_key_token()?;
            }
        } else if !leading && self.lexer.current() == &Token::RBrace {
            return Err(self.unexpected("object key"));
        }
        Ok(())
    }

    fn insert_field(&mut self, object: NodeId, key: Arc<str>, value: NodeId) {
        if let ValueNode::Object(map) = self.doc.node_mut(object) {
            map.insert(key, value);
        }
    }

    /// Handles the value and close of a `{"$ref": …}` object. Returns the
    /// node the enclosing container should store, or `None` when the object
    /// turned out not to be a pure reference.
    fn parse_reference_object(
        &mut self,
        id: NodeId,
        ctx: ContextId,
        slot: &Slot,
    ) -> Result<Option<NodeId>, ParseError> {
        let Token::Str(reference) = self.lexer.current().clone() else {
            return Err(self
                .lexer
                .error_at_token(ErrorKind::Reference(Arc::from("reference value must be a string"))));
        };
        self.lexer.next_token_expect(Expect::AfterValue)?;
        match self.lexer.current() {
            Token::RBrace => {
                self.lexer.next_token_expect(Expect::AfterValue)?;
                match self.resolve_reference(ctx, &reference) {
                    RefResolution::Resolved(target) => Ok(Some(target)),
                    RefResolution::Deferred => {
                        // Leave a null placeholder; the drained task
                        // overwrites the owning slot.
                        *self.doc.node_mut(id) = ValueNode::Null;
                        self.tasks.push(ResolveTask {
                            context: ctx,
                            reference,
                            slot: slot.clone(),
                        });
                        Ok(Some(id))
                    }
                    RefResolution::Malformed => Err(self.lexer.error_at_token(
                        ErrorKind::Reference(Arc::from(format!(
                            "malformed reference {reference:?}"
                        ))),
                    )),
                }
            }
            Token::Comma => {
                // More fields follow: "$ref" is ordinary data here.
                let value = self.doc.alloc(ValueNode::Str(reference));
                self.insert_field(id, Arc::from(REFERENCE_KEY), value);
                self.lexer.scan_key_token()?;
                self.skip_stray_commas(false)?;
                Ok(None)
            }
            _ => Err(self.unexpected("',' or '}'")),
        }
    }

    /// The three sentinel forms and the path form, shared by the immediate
    /// attempt and the post-parse drain.
    fn resolve_reference(&self, ctx: ContextId, reference: &str) -> RefResolution {
        match reference {
            "@" => {
                let found = self.contexts.find_enclosing(ctx, |node| {
                    matches!(self.doc.node(node), ValueNode::Array(_))
                });
                found.map_or(RefResolution::Deferred, RefResolution::Resolved)
            }
            ".." => {
                let parent = self.contexts.get(ctx).parent;
                let object = parent.and_then(|p| self.contexts.get(p).object);
                object.map_or(RefResolution::Deferred, RefResolution::Resolved)
            }
            "$" => self
                .contexts
                .root_object()
                .map_or(RefResolution::Deferred, RefResolution::Resolved),
            text => match path::parse_ref_path(text) {
                None => RefResolution::Malformed,
                Some(segs) => {
                    let Some(root) = self.contexts.root_object() else {
                        return RefResolution::Deferred;
                    };
                    path::eval_path(&self.doc, root, &segs)
                        .map_or(RefResolution::Deferred, RefResolution::Resolved)
                }
            },
        }
    }

    /// Drains accumulated resolve tasks, in creation order, performing each
    /// deferred assignment against the finished tree.
    fn drain_tasks(&mut self) -> Result<(), ParseError> {
        let tasks = std::mem::take(&mut self.tasks);
        if tasks.is_empty() {
            return Ok(());
        }
        tracing::debug!(count = tasks.len(), "resolving deferred references");
        for task in tasks {
            match self.resolve_reference(task.context, &task.reference) {
                RefResolution::Resolved(target) => match &task.slot {
                    Slot::ObjectField(owner, key) => {
                        if let ValueNode::Object(map) = self.doc.node_mut(*owner) {
                            map.insert(Arc::clone(key), target);
                        }
                    }
                    Slot::ArrayElem(owner, index) => {
                        if let ValueNode::Array(items) = self.doc.node_mut(*owner) {
                            if let Some(slot) = items.get_mut(*index) {
                                *slot = target;
                            }
                        }
                    }
                    Slot::Root => self.doc.set_root(target),
                },
                RefResolution::Deferred | RefResolution::Malformed => {
                    if self.options.strict_references {
                        let input = self.lexer.input();
                        return Err(error_at(
                            input,
                            input.len(),
                            ErrorKind::Reference(Arc::from(format!(
                                "unresolved reference {:?} at {}",
                                task.reference,
                                self.contexts.path(task.context)
                            ))),
                        ));
                    }
                    tracing::debug!(
                        reference = &*task.reference,
                        "reference target not found, leaving slot null"
                    );
                }
            }
        }
        Ok(())
    }

    fn parse_array(
        &mut self,
        parent: Option<ContextId>,
        field: PathField,
        sorted: bool,
    ) -> Result<NodeId, ParseError> {
        self.enter()?;
        let result = self.parse_array_body(parent, field, sorted);
        self.depth -= 1;
        result
    }

    fn parse_array_body(
        &mut self,
        parent: Option<ContextId>,
        field: PathField,
        sorted: bool,
    ) -> Result<NodeId, ParseError> {
        let track_refs = !self.options.disable_circular_reference_detect;
        let id = self.doc.alloc(ValueNode::Array(Vec::new()));
        let ctx = if track_refs {
            let c = self.contexts.push(parent, field);
            self.contexts.set_object(c, id);
            Some(c)
        } else {
            None
        };

        self.lexer.next_token()?;
        loop {
            if self.options.allow_arbitrary_commas {
                while self.lexer.current() == &Token::Comma {
                    self.lexer.next_token()?;
                }
            }
            if self.lexer.current() == &Token::RBracket {
                break;
            }
            let index = match self.doc.node(id) {
                ValueNode::Array(items) => items.len(),
                _ => 0,
            };
            let element =
                self.parse_value(ctx, PathField::Index(index), Slot::ArrayElem(id, index))?;
            if let ValueNode::Array(items) = self.doc.node_mut(id) {
                items.push(element);
            }
            match self.lexer.current() {
                Token::Comma => {
                    self.lexer.next_token()?;
                    if self.lexer.current() == &Token::RBracket
                        && !self.options.allow_arbitrary_commas
                    {
                        return Err(self.unexpected("value"));
                    }
                }
                Token::RBracket => break,
                _ => return Err(self.unexpected("',' or ']'")),
            }
        }

        if sorted {
            self.sort_array(id);
        }
        self.lexer.next_token_expect(Expect::AfterValue)?;
        Ok(id)
    }

    /// `Set[...]` / `TreeSet[...]`: a collection literal decoding to an
    /// array, sorted for the tree variant.
    fn parse_collection_literal(
        &mut self,
        parent: Option<ContextId>,
        field: PathField,
        sorted: bool,
    ) -> Result<NodeId, ParseError> {
        self.lexer.next_token()?;
        if self.lexer.current() != &Token::LBracket {
            return Err(self.unexpected("'['"));
        }
        self.parse_array(parent, field, sorted)
    }

    fn sort_array(&mut self, id: NodeId) {
        let ValueNode::Array(items) = self.doc.node(id) else {
            return;
        };
        let mut keyed: Vec<(String, NodeId)> = items
            .iter()
            .map(|&item| (self.doc.render_node(item), item))
            .collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        if let ValueNode::Array(items) = self.doc.node_mut(id) {
            *items = keyed.into_iter().map(|(_, item)| item).collect();
        }
    }

    /// `new Date(millis)`, the one constructor literal the dialect accepts.
    fn parse_ctor(&mut self) -> Result<NodeId, ParseError> {
        self.lexer.next_token()?;
        match self.lexer.current().clone() {
            Token::Ident(name) if &*name == "Date" => {}
            _ => return Err(self.unexpected("Date")),
        }
        self.lexer.next_token()?;
        if self.lexer.current() != &Token::LParen {
            return Err(self.unexpected("'('"));
        }
        self.lexer.next_token()?;
        let &Token::Int(millis) = self.lexer.current() else {
            return Err(self.unexpected("milliseconds"));
        };
        let Some(date) = chrono::TimeZone::timestamp_millis_opt(&chrono::Utc, millis).single()
        else {
            return Err(self.unexpected("milliseconds"));
        };
        self.lexer.next_token_expect(Expect::AfterValue)?;
        if self.lexer.current() != &Token::RParen {
            return Err(self.unexpected("')'"));
        }
        let id = self.doc.alloc(ValueNode::Date(date));
        self.lexer.next_token_expect(Expect::AfterValue)?;
        Ok(id)
    }

    // --------------------------------------------------------------------
    // Typed (binder-driven) parsing
    // --------------------------------------------------------------------

    /// Decodes one object through a binder, preferring the fast-path field
    /// scans in the binder's declared order and falling back to generic
    /// parsing for the remainder on the first miss.
    fn parse_typed<B: TypeBinder>(
        &mut self,
        target: &B,
        mut extra: Option<&mut ExtraProcessor<'_>>,
    ) -> Result<B::Instance, ParseError> {
        if self.lexer.current() != &Token::LBrace {
            return Err(self.unexpected("'{'"));
        }
        let mut builder = target.builder();
        let naming = self.options.naming;

        let mut closed = false;
        for spec in target.fields() {
            let wire = naming.wire_name(spec.name);
            let outcome = self.scan_typed_field(&mut builder, spec.name, spec.kind, &wire)?;
            match outcome {
                TypedScan::Hit => {}
                TypedScan::HitEnd => {
                    closed = true;
                    break;
                }
                TypedScan::Miss => break,
            }
        }

        if !closed {
            self.parse_typed_rest(target, &mut builder, extra.as_deref_mut())?;
        }
        builder
            .finish()
            .map_err(|e| self.lexer.error_at_token(ErrorKind::Binding(Arc::from(e.0))))
    }

    /// One fast-path attempt for a declared field.
    fn scan_typed_field<BB: InstanceBuilder>(
        &mut self,
        builder: &mut BB,
        raw_name: &str,
        kind: FieldKind,
        wire: &str,
    ) -> Result<TypedScan, ParseError> {
        macro_rules! apply {
            ($scan:expr, $wrap:path) => {
                match $scan {
                    FieldScan::Value(v) => {
                        self.bind(builder, raw_name, $wrap(v))?;
                        TypedScan::Hit
                    }
                    FieldScan::End(v) => {
                        self.bind(builder, raw_name, $wrap(v))?;
                        TypedScan::HitEnd
                    }
                    FieldScan::ValueNull => {
                        self.bind(builder, raw_name, FieldValue::Null)?;
                        TypedScan::Hit
                    }
                    FieldScan::EndNull => {
                        self.bind(builder, raw_name, FieldValue::Null)?;
                        TypedScan::HitEnd
                    }
                    FieldScan::NotMatchName | FieldScan::NotMatch => TypedScan::Miss,
                }
            };
        }
        let outcome = match kind {
            FieldKind::Bool => apply!(self.lexer.scan_field_bool(wire)?, FieldValue::Bool),
            FieldKind::I32 => apply!(self.lexer.scan_field_i32(wire)?, FieldValue::I32),
            FieldKind::I64 => apply!(self.lexer.scan_field_i64(wire)?, FieldValue::I64),
            FieldKind::Str => apply!(self.lexer.scan_field_str(wire)?, FieldValue::Str),
            FieldKind::Symbol => apply!(self.lexer.scan_field_symbol(wire)?, FieldValue::Str),
            FieldKind::Date => apply!(self.lexer.scan_field_date(wire)?, FieldValue::Date),
            FieldKind::StrArray => {
                apply!(self.lexer.scan_field_str_array(wire)?, FieldValue::StrArray)
            }
            // No fast path for these kinds.
            FieldKind::F64 | FieldKind::Any => TypedScan::Miss,
        };
        Ok(outcome)
    }

    fn bind<BB: InstanceBuilder>(
        &self,
        builder: &mut BB,
        name: &str,
        value: FieldValue,
    ) -> Result<(), ParseError> {
        builder
            .set(name, value)
            .map_err(|e| self.lexer.error_at_token(ErrorKind::Binding(Arc::from(e.0))))
    }

    /// Generic remainder of a typed object, entered after the fast-path
    /// phase stops. Handles declared fields in any order, the discriminator
    /// key, and unknown fields.
    fn parse_typed_rest<B: TypeBinder>(
        &mut self,
        target: &B,
        builder: &mut B::Builder,
        mut extra: Option<&mut ExtraProcessor<'_>>,
    ) -> Result<(), ParseError> {
        let naming = self.options.naming;
        let special_keys = !self.options.disable_special_key_detect;
        self.lexer.scan_key_token()?;
        self.skip_stray_commas(true)?;
        loop {
            let key: Arc<str> = match self.lexer.current().clone() {
                Token::RBrace => break,
                Token::Str(s) => s,
                Token::Ident(s) if self.options.allow_unquoted_field_names => s,
                _ => return Err(self.unexpected("object key")),
            };
            self.lexer.next_token()?;
            if self.lexer.current() != &Token::Colon {
                return Err(self.unexpected("':'"));
            }
            self.lexer.next_token()?;

            // Fully parse the value first so the cursor stays consistent
            // regardless of what we do with it.
            let value = self.parse_detached_value()?;

            let spec = target
                .fields()
                .iter()
                .find(|spec| naming.wire_name(spec.name) == *key);
            if let Some(spec) = spec {
                match FieldValue::coerce(spec.kind, value) {
                    Some(field_value) => self.bind(builder, spec.name, field_value)?,
                    None => {
                        return Err(self.lexer.error_at_token(ErrorKind::Binding(Arc::from(
                            format!("value shape does not fit field {:?}", spec.name),
                        ))))
                    }
                }
            } else if special_keys && &*key == TYPE_KEY {
                self.typed_discriminator(target, &key, value, extra.as_deref_mut())?;
            } else if let Some(hook) = extra.as_deref_mut() {
                hook(&key, value);
            } else if !self.options.tolerant_unknown_fields {
                return Err(self.lexer.error_at_token(ErrorKind::Binding(Arc::from(
                    format!("no field matches key {key:?}"),
                ))));
            }

            match self.lexer.current() {
                Token::Comma => {
                    self.lexer.scan_key_token()?;
                    self.skip_stray_commas(false)?;
                }
                Token::RBrace => break,
                _ => return Err(self.unexpected("',' or '}'")),
            }
        }
        self.lexer.next_token_expect(Expect::AfterValue)?;
        Ok(())
    }

    /// Parses one value as a document of its own, used for the generic
    /// remainder of a typed object. The value gets a fresh context scope
    /// whose tasks drain before the scope is discarded, so a reference in
    /// one field can never reach another field's containers and
    /// `strict_references` applies to each field independently.
    fn parse_detached_value(&mut self) -> Result<Value, ParseError> {
        let outer_contexts = std::mem::take(&mut self.contexts);
        let outer_tasks = std::mem::take(&mut self.tasks);
        let outer_root = self.doc.root();
        let result = self
            .parse_value(None, PathField::Root, Slot::Root)
            .and_then(|node| {
                self.doc.set_root(node);
                self.drain_tasks()?;
                Ok(self.doc.root())
            });
        self.contexts = outer_contexts;
        self.tasks = outer_tasks;
        self.doc.set_root(outer_root);
        let node = result?;
        Ok(self.doc.materialize_node(node).unwrap_or(Value::Null))
    }

    /// The discriminator inside a typed object: the security check runs
    /// before the binder is trusted, even though the binder would happily
    /// build its own type.
    fn typed_discriminator<B: TypeBinder>(
        &self,
        target: &B,
        key: &Arc<str>,
        value: Value,
        extra: Option<&mut ExtraProcessor<'_>>,
    ) -> Result<(), ParseError> {
        if let Value::Str(type_name) = &value {
            match check_auto_type(self.options, type_name) {
                AutoTypeDecision::Reject => {
                    return Err(self
                        .lexer
                        .error_at_token(ErrorKind::Security(Arc::clone(type_name))));
                }
                AutoTypeDecision::Permit if &**type_name == target.type_name() => {
                    return Ok(());
                }
                AutoTypeDecision::Permit | AutoTypeDecision::StoreVerbatim => {}
            }
        }
        if let Some(hook) = extra {
            hook(key, value);
        }
        Ok(())
    }
}

/// Outcome of one typed fast-path field attempt.
enum TypedScan {
    Hit,
    HitEnd,
    Miss,
}
