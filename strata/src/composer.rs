//! Build the node graph of a document out of parser events.

use std::collections::HashMap;

use strata_parser::{
    Directives, Event, Input, NodeProps, Parser, Span, SpannedEventReceiver, TagDirective,
    CORE_SCHEMA_PREFIX,
};

use crate::{
    node::{Content, Node, NodeId},
    Document, LoadError,
};

/// Builds a [`Document`] from the events of a single YAML document.
///
/// The composer is a [`SpannedEventReceiver`] and is usually driven through [`Composer::compose`].
/// Events past the end of the first document it receives are ignored.
///
/// Anchors are bound as soon as the node carrying them is created, before any of its children.
/// An alias met inside the node it names thus refers to it, which makes the graph cyclic.
#[derive(Debug, Default)]
pub struct Composer {
    doc: Document,
    /// The collections being filled, innermost last.
    stack: Vec<NodeId>,
    /// For each mapping in `stack`, the key waiting for its value.
    keys: Vec<Option<NodeId>>,
    /// The current binding of every anchor name.
    anchors: HashMap<String, NodeId>,
    started: bool,
    finished: bool,
    error: Option<LoadError>,
}

impl SpannedEventReceiver for Composer {
    fn on_event(&mut self, ev: Event, span: Span) {
        if self.finished {
            return;
        }
        match ev {
            Event::StreamStart | Event::StreamEnd => {}
            Event::DocumentStart(explicit, directives) => {
                self.start_document(explicit, directives, span);
            }
            Event::DocumentEnd(explicit) => {
                self.doc.explicit_end = explicit;
                self.doc.span.end = span.end;
                self.finished = true;
            }
            // Once an error is recorded, the rest of the document is only drained.
            _ if self.error.is_some() => {}
            Event::Alias(name) => match self.anchors.get(&name) {
                Some(&id) => self.attach(id),
                None => {
                    self.error = Some(LoadError::resolution(
                        span.start,
                        format!("unresolved alias `*{name}`"),
                    ));
                }
            },
            Event::Scalar(value, style, props) => {
                let id = self.insert_node(Content::Scalar(value, style), props, span);
                self.attach(id);
            }
            Event::SequenceStart(style, props) => {
                let id = self.insert_node(Content::Sequence(Vec::new(), style), props, span);
                self.attach(id);
                self.stack.push(id);
            }
            Event::MappingStart(style, props) => {
                let id = self.insert_node(Content::Mapping(Vec::new(), style), props, span);
                self.attach(id);
                self.stack.push(id);
                self.keys.push(None);
            }
            Event::SequenceEnd => self.close_collection(span),
            Event::MappingEnd => {
                self.keys.pop();
                self.close_collection(span);
            }
        }
    }
}

impl Composer {
    /// Create a composer, waiting for a document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compose the next document of `parser`.
    ///
    /// # Return
    /// Returns `Ok(None)` if the stream holds no more documents.
    ///
    /// # Errors
    /// Returns the error of the parser, or a [`LoadError::Resolution`] for an alias to an anchor
    /// not defined before it in the document. In the latter case, the parser has been run to the
    /// end of the document and may be used to compose the next one.
    pub fn compose<T: Input>(parser: &mut Parser<T>) -> Result<Option<Document>, LoadError> {
        let mut composer = Composer::new();
        parser.load(&mut composer, false)?;
        composer.finish()
    }

    /// Return the document built from the events received so far.
    ///
    /// # Return
    /// Returns `Ok(None)` if the end of a document was not received.
    ///
    /// # Errors
    /// Returns the first error met while composing.
    pub fn finish(self) -> Result<Option<Document>, LoadError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.finished.then_some(self.doc)),
        }
    }

    fn start_document(&mut self, explicit: bool, directives: Directives, span: Span) {
        if std::mem::replace(&mut self.started, true) {
            return;
        }
        self.doc.explicit_start = explicit;
        self.doc.version = directives.version;
        self.doc.span = span;
        self.doc.tag_handles = vec![
            TagDirective {
                handle: "!".to_owned(),
                prefix: "!".to_owned(),
            },
            TagDirective {
                handle: "!!".to_owned(),
                prefix: CORE_SCHEMA_PREFIX.to_owned(),
            },
        ];
        for directive in directives.tags {
            match self
                .doc
                .tag_handles
                .iter_mut()
                .find(|known| known.handle == directive.handle)
            {
                Some(known) => known.prefix = directive.prefix,
                None => self.doc.tag_handles.push(directive),
            }
        }
    }

    /// Add a node to the arena, binding its anchor if it has one.
    fn insert_node(&mut self, content: Content, props: NodeProps, span: Span) -> NodeId {
        let id = NodeId(self.doc.nodes.len());
        if let Some(anchor) = &props.anchor {
            self.anchors.insert(anchor.clone(), id);
            self.doc.anchors.push((anchor.clone(), id));
        }
        self.doc
            .nodes
            .push(Node::new(content, props.anchor, props.tag, span));
        id
    }

    /// Make `id` the next child of the innermost open collection, or the root.
    fn attach(&mut self, id: NodeId) {
        let Some(&parent) = self.stack.last() else {
            self.doc.root = Some(id);
            return;
        };
        match &mut self.doc.nodes[parent.0].content {
            Content::Sequence(items, _) => items.push(id),
            Content::Mapping(pairs, _) => {
                if let Some(pending) = self.keys.last_mut() {
                    match pending.take() {
                        Some(key) => pairs.push((key, id)),
                        None => *pending = Some(id),
                    }
                }
            }
            Content::Scalar(..) => {}
        }
    }

    fn close_collection(&mut self, span: Span) {
        if let Some(id) = self.stack.pop() {
            let node = &mut self.doc.nodes[id.0];
            if span.end.index() > node.span.end.index() {
                node.span.end = span.end;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use strata_parser::{CollectionStyle, Parser, ScalarStyle};

    use super::Composer;
    use crate::{node::Content, LoadError};

    #[test]
    fn test_compose_documents_one_at_a_time() {
        let mut parser = Parser::new_from_str("a\n--- [b]\n...\n");
        let first = Composer::compose(&mut parser).unwrap().unwrap();
        assert!(!first.explicit_start());
        assert_eq!(first.root().unwrap().as_scalar(), Some("a"));
        let second = Composer::compose(&mut parser).unwrap().unwrap();
        assert!(second.explicit_start());
        assert!(second.explicit_end());
        assert_eq!(second.root().unwrap().at(0).unwrap().as_scalar(), Some("b"));
        assert!(Composer::compose(&mut parser).unwrap().is_none());
    }

    #[test]
    fn test_presentation_is_kept() {
        let mut parser = Parser::new_from_str("- 'quoted'\n- {a: b}\n");
        let doc = Composer::compose(&mut parser).unwrap().unwrap();
        let root = doc.root().unwrap();
        assert_eq!(root.node().collection_style(), Some(CollectionStyle::Block));
        let quoted = root.at(0).unwrap().node();
        assert_eq!(
            quoted.content(),
            &Content::Scalar("quoted".into(), ScalarStyle::SingleQuoted)
        );
        assert_eq!(
            root.at(1).unwrap().node().collection_style(),
            Some(CollectionStyle::Flow)
        );
    }

    #[test]
    fn test_unresolved_alias() {
        let mut parser = Parser::new_from_str("- *nope\n- x\n--- y\n");
        let err = Composer::compose(&mut parser).unwrap_err();
        assert!(matches!(err, LoadError::Resolution { .. }));
        assert_eq!(err.to_string(), "unresolved alias `*nope` at line 1 column 3");
        // The parser stopped at the end of the broken document.
        let next = Composer::compose(&mut parser).unwrap().unwrap();
        assert_eq!(next.root().unwrap().as_scalar(), Some("y"));
    }

    #[test]
    fn test_alias_to_later_anchor_is_unresolved() {
        let mut parser = Parser::new_from_str("[*a, &a x]");
        assert!(Composer::compose(&mut parser).is_err());
    }

    #[test]
    fn test_tag_handles_do_not_leak_between_documents() {
        let mut parser =
            Parser::new_from_str("%TAG !e! tag:example.com,2000:\n--- !e!a x\n...\n--- y\n");
        let first = Composer::compose(&mut parser).unwrap().unwrap();
        assert_eq!(first.tag_handles().len(), 3);
        assert_eq!(
            first.root().unwrap().tag().unwrap().uri(),
            "tag:example.com,2000:a"
        );
        let second = Composer::compose(&mut parser).unwrap().unwrap();
        assert_eq!(second.tag_handles().len(), 2);
        assert!(second.anchors().next().is_none());
    }

    #[test]
    fn test_anchor_rebinding() {
        let mut parser = Parser::new_from_str("- &a 1\n- *a\n- &a 2\n- *a\n");
        let doc = Composer::compose(&mut parser).unwrap().unwrap();
        let root = doc.root().unwrap();
        assert_eq!(root.at(1).unwrap(), root.at(0).unwrap());
        assert_eq!(root.at(3).unwrap(), root.at(2).unwrap());
        assert_ne!(root.at(1).unwrap(), root.at(3).unwrap());
        assert_eq!(doc.anchors().count(), 2);
        assert_eq!(doc.anchor("a").unwrap().as_scalar(), Some("2"));
    }
}
