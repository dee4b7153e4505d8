//! The composed node graph of a document.
//!
//! Nodes live in an arena owned by their [`Document`] and refer to each other by [`NodeId`]. An
//! alias is stored as the [`NodeId`] of the node it names, which makes shared nodes identical
//! rather than copies and lets the graph hold cycles.

use std::cell::OnceCell;

use strata_parser::{CollectionStyle, Marker, ScalarStyle, Span, Tag, TagDirective, Version};

use crate::{construct::Construct, DiagnosticSink, LoadError, NodeKind, Schema, Value};

/// The index of a node in the arena of its [`Document`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Return the position of the node in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// The content of a node.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Content {
    /// A scalar, its value and how it was written.
    Scalar(String, ScalarStyle),
    /// A sequence of nodes.
    Sequence(Vec<NodeId>, CollectionStyle),
    /// An ordered list of key/value pairs.
    Mapping(Vec<(NodeId, NodeId)>, CollectionStyle),
}

/// A vertex of the node graph.
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) content: Content,
    pub(crate) anchor: Option<String>,
    pub(crate) tag: Option<Tag>,
    pub(crate) span: Span,
    pub(crate) resolved: OnceCell<String>,
}

impl Node {
    pub(crate) fn new(
        content: Content,
        anchor: Option<String>,
        tag: Option<Tag>,
        span: Span,
    ) -> Self {
        Node {
            content,
            anchor,
            tag,
            span,
            resolved: OnceCell::new(),
        }
    }

    /// Return the content of the node.
    #[must_use]
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Return the kind of the node.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self.content {
            Content::Scalar(..) => NodeKind::Scalar,
            Content::Sequence(..) => NodeKind::Sequence,
            Content::Mapping(..) => NodeKind::Mapping,
        }
    }

    /// Return the anchor written on the node, if any.
    #[must_use]
    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    /// Return the tag written on the node, if any, with its handle expanded.
    #[must_use]
    pub fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }

    /// Return the span of the node in the input, properties included.
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Return the tag the node was resolved to, if resolution already happened.
    #[must_use]
    pub fn resolved_tag(&self) -> Option<&str> {
        self.resolved.get().map(String::as_str)
    }

    /// Return the resolved tag, resolving it under `schema` if needed.
    pub(crate) fn resolve(&self, schema: &Schema) -> Result<&str, LoadError> {
        if let Some(tag) = self.resolved.get() {
            return Ok(tag);
        }
        let tag = schema.resolve(self)?;
        Ok(self.resolved.get_or_init(|| tag))
    }

    /// Return the scalar style, if the node is a scalar.
    #[must_use]
    pub fn scalar_style(&self) -> Option<ScalarStyle> {
        match self.content {
            Content::Scalar(_, style) => Some(style),
            _ => None,
        }
    }

    /// Return the collection style, if the node is a sequence or a mapping.
    #[must_use]
    pub fn collection_style(&self) -> Option<CollectionStyle> {
        match self.content {
            Content::Scalar(..) => None,
            Content::Sequence(_, style) | Content::Mapping(_, style) => Some(style),
        }
    }
}

/// A composed YAML document.
///
/// A document owns the nodes of its graph. Dropping it releases them all at once, regardless of
/// whether aliases made the graph cyclic.
#[derive(Clone, Debug, Default)]
pub struct Document {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: Option<NodeId>,
    pub(crate) version: Option<Version>,
    pub(crate) tag_handles: Vec<TagDirective>,
    pub(crate) anchors: Vec<(String, NodeId)>,
    pub(crate) explicit_start: bool,
    pub(crate) explicit_end: bool,
    pub(crate) span: Span,
}

impl Document {
    /// Return the root node, or `None` if the document holds no node.
    #[must_use]
    pub fn root(&self) -> Option<NodeRef<'_>> {
        self.root.map(|id| NodeRef { doc: self, id })
    }

    /// Return the node with the given id, if it belongs to the arena.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id.0 < self.nodes.len()).then_some(NodeRef { doc: self, id })
    }

    /// Return the number of nodes in the arena. Aliases do not count as nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Return whether the document holds no node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Return the `%YAML` directive of the document, if any.
    #[must_use]
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    /// Return the tag handles in effect in the document, defaults included.
    #[must_use]
    pub fn tag_handles(&self) -> &[TagDirective] {
        &self.tag_handles
    }

    /// Whether the document started with `---`.
    #[must_use]
    pub fn explicit_start(&self) -> bool {
        self.explicit_start
    }

    /// Whether the document ended with `...`.
    #[must_use]
    pub fn explicit_end(&self) -> bool {
        self.explicit_end
    }

    /// Return the span of the whole document, markers included.
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Iterate over the anchors defined in the document, in source order.
    ///
    /// A name defined more than once appears once per definition.
    pub fn anchors(&self) -> impl Iterator<Item = (&str, NodeRef<'_>)> {
        self.anchors
            .iter()
            .map(move |(name, id)| (name.as_str(), NodeRef { doc: self, id: *id }))
    }

    /// Return the node bound to `name` at the end of the document.
    #[must_use]
    pub fn anchor(&self, name: &str) -> Option<NodeRef<'_>> {
        self.anchors
            .iter()
            .rev()
            .find(|(anchor, _)| anchor == name)
            .map(|(_, id)| NodeRef { doc: self, id: *id })
    }

    /// Visit every node reachable from the root exactly once, depth-first, parents first.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            doc: self,
            visited: vec![false; self.nodes.len()],
            stack: self.root.into_iter().collect(),
        }
    }

    /// Whether a node of the document is among its own descendants.
    #[must_use]
    pub fn is_cyclic(&self) -> bool {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Open,
            Done,
        }

        let Some(root) = self.root else {
            return false;
        };
        let mut marks = vec![Mark::New; self.nodes.len()];
        // (node, index of the next child to visit)
        let mut stack = vec![(root, 0)];
        marks[root.0] = Mark::Open;
        while let Some(top) = stack.last_mut() {
            let (id, next) = *top;
            top.1 += 1;
            match self.child(id, next) {
                Some(child) => match marks[child.0] {
                    Mark::Open => return true,
                    Mark::New => {
                        marks[child.0] = Mark::Open;
                        stack.push((child, 0));
                    }
                    Mark::Done => {}
                },
                None => {
                    marks[id.0] = Mark::Done;
                    stack.pop();
                }
            }
        }
        false
    }

    /// Give every node its resolved tag under `schema`.
    ///
    /// Nodes that already have one keep it.
    ///
    /// # Errors
    /// Returns [`LoadError::Resolution`] for the first node the schema cannot resolve.
    pub fn resolve(&self, schema: &Schema) -> Result<(), LoadError> {
        for node in &self.nodes {
            node.resolve(schema)?;
        }
        Ok(())
    }

    /// Construct the native value of the document.
    ///
    /// An empty document constructs to [`Value::Null`].
    ///
    /// # Errors
    /// Returns an error if a node cannot be resolved or constructed. No partial value is
    /// returned.
    pub fn construct(&self, schema: &Schema) -> Result<Value, LoadError> {
        Construct::new(schema, self, None).construct_document()
    }

    /// Construct the native value of the document, reporting warnings to `sink`.
    ///
    /// # Errors
    /// See [`Document::construct`].
    pub fn construct_with(
        &self,
        schema: &Schema,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Value, LoadError> {
        Construct::new(schema, self, Some(sink)).construct_document()
    }

    fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        (0..).map_while(move |n| self.child(id, n))
    }

    /// Return the `n`-th child of a node. Mapping keys and values alternate.
    fn child(&self, id: NodeId, n: usize) -> Option<NodeId> {
        match &self.nodes[id.0].content {
            Content::Scalar(..) => None,
            Content::Sequence(items, _) => items.get(n).copied(),
            Content::Mapping(pairs, _) => {
                pairs
                    .get(n / 2)
                    .map(|&(key, value)| if n % 2 == 0 { key } else { value })
            }
        }
    }
}

/// Iterator over the nodes of a document, see [`Document::walk`].
pub struct Walk<'d> {
    doc: &'d Document,
    visited: Vec<bool>,
    stack: Vec<NodeId>,
}

impl<'d> Iterator for Walk<'d> {
    type Item = NodeRef<'d>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            if std::mem::replace(&mut self.visited[id.0], true) {
                continue;
            }
            let len = self.stack.len();
            self.stack.extend(self.doc.children(id));
            self.stack[len..].reverse();
            return Some(NodeRef { doc: self.doc, id });
        }
        None
    }
}

/// A node of a [`Document`], borrowed along with its document.
///
/// Two `NodeRef`s compare equal when they designate the same node of the same document, which is
/// how an alias relates to its anchor.
#[derive(Clone, Copy, Debug)]
pub struct NodeRef<'d> {
    doc: &'d Document,
    id: NodeId,
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl<'d> NodeRef<'d> {
    /// Return the id of the node in its document.
    #[must_use]
    pub fn id(self) -> NodeId {
        self.id
    }

    /// Return the document the node belongs to.
    #[must_use]
    pub fn document(self) -> &'d Document {
        self.doc
    }

    /// Return the underlying node.
    #[must_use]
    pub fn node(self) -> &'d Node {
        &self.doc.nodes[self.id.0]
    }

    /// Return the kind of the node.
    #[must_use]
    pub fn kind(self) -> NodeKind {
        self.node().kind()
    }

    /// Return the anchor written on the node, if any.
    #[must_use]
    pub fn anchor(self) -> Option<&'d str> {
        self.node().anchor()
    }

    /// Return the tag written on the node, if any.
    #[must_use]
    pub fn tag(self) -> Option<&'d Tag> {
        self.node().tag()
    }

    /// Return the tag the node was resolved to, if resolution already happened.
    #[must_use]
    pub fn resolved_tag(self) -> Option<&'d str> {
        self.node().resolved_tag()
    }

    /// Return the span of the node in the input.
    #[must_use]
    pub fn span(self) -> Span {
        self.node().span
    }

    /// Return the position at which the node starts.
    #[must_use]
    pub fn mark(self) -> Marker {
        self.node().span.start
    }

    /// Return the value of the node if it is a scalar.
    #[must_use]
    pub fn as_scalar(self) -> Option<&'d str> {
        match &self.node().content {
            Content::Scalar(value, _) => Some(value),
            _ => None,
        }
    }

    /// Return the items of the node if it is a sequence.
    #[must_use]
    pub fn as_sequence(self) -> Option<impl ExactSizeIterator<Item = NodeRef<'d>>> {
        let doc = self.doc;
        match &self.node().content {
            Content::Sequence(items, _) => Some(items.iter().map(move |&id| NodeRef { doc, id })),
            _ => None,
        }
    }

    /// Return the entries of the node if it is a mapping.
    #[must_use]
    pub fn as_mapping(self) -> Option<impl ExactSizeIterator<Item = (NodeRef<'d>, NodeRef<'d>)>> {
        let doc = self.doc;
        match &self.node().content {
            Content::Mapping(pairs, _) => Some(
                pairs
                    .iter()
                    .map(move |&(k, v)| (NodeRef { doc, id: k }, NodeRef { doc, id: v })),
            ),
            _ => None,
        }
    }

    /// Return the number of items or entries of a collection, `0` for a scalar.
    #[must_use]
    pub fn len(self) -> usize {
        match &self.node().content {
            Content::Scalar(..) => 0,
            Content::Sequence(items, _) => items.len(),
            Content::Mapping(pairs, _) => pairs.len(),
        }
    }

    /// Return whether the node is a scalar or an empty collection.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Return the value of the first entry whose key is the scalar `key`.
    ///
    /// Returns `None` if the node is not a mapping or has no such key.
    #[must_use]
    pub fn get(self, key: &str) -> Option<NodeRef<'d>> {
        self.as_mapping()?
            .find(|(k, _)| k.as_scalar() == Some(key))
            .map(|(_, v)| v)
    }

    /// Return the item at `index` if the node is a sequence.
    #[must_use]
    pub fn at(self, index: usize) -> Option<NodeRef<'d>> {
        match &self.node().content {
            Content::Sequence(items, _) => {
                items.get(index).map(|&id| NodeRef { doc: self.doc, id })
            }
            _ => None,
        }
    }

    /// Return the value of the node, failing if it is not a scalar.
    ///
    /// # Errors
    /// Returns [`LoadError::Kind`] if the node is not a scalar.
    pub fn expect_scalar(self) -> Result<&'d str, LoadError> {
        self.as_scalar().ok_or_else(|| self.kind_error(NodeKind::Scalar))
    }

    /// Return the items of the node, failing if it is not a sequence.
    ///
    /// # Errors
    /// Returns [`LoadError::Kind`] if the node is not a sequence.
    pub fn expect_sequence(
        self,
    ) -> Result<impl ExactSizeIterator<Item = NodeRef<'d>>, LoadError> {
        self.as_sequence()
            .ok_or_else(|| self.kind_error(NodeKind::Sequence))
    }

    /// Return the entries of the node, failing if it is not a mapping.
    ///
    /// # Errors
    /// Returns [`LoadError::Kind`] if the node is not a mapping.
    pub fn expect_mapping(
        self,
    ) -> Result<impl ExactSizeIterator<Item = (NodeRef<'d>, NodeRef<'d>)>, LoadError> {
        self.as_mapping()
            .ok_or_else(|| self.kind_error(NodeKind::Mapping))
    }

    fn kind_error(self, expected: NodeKind) -> LoadError {
        LoadError::Kind {
            mark: self.mark(),
            expected,
            found: self.kind(),
        }
    }
}
