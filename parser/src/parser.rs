//! Home to the YAML Parser.
//!
//! The parser takes input from the [`crate::scanner::Scanner`], performs final checks for YAML
//! compliance, and emits a stream of YAML events. This stream can for instance be used to create
//! YAML objects.

use std::{collections::HashMap, fmt};

use crate::{
    diagnostic::Diagnostic,
    input::{str::StrInput, BufferedInput, Input},
    scanner::{
        Marker, ScalarStyle, ScanError, Scanner, Span, TagToken, Token, TokenType,
    },
};

/// The prefix the `!!` handle expands to unless a `%TAG` directive says otherwise.
pub const CORE_SCHEMA_PREFIX: &str = "tag:yaml.org,2002:";

#[derive(Clone, Copy, PartialEq, Debug, Eq)]
enum State {
    StreamStart,
    ImplicitDocumentStart,
    DocumentStart,
    DocumentContent,
    DocumentEnd,
    BlockNode,
    BlockSequenceEntry,
    IndentlessSequenceEntry,
    BlockMappingKey,
    BlockMappingValue,
    FlowSequenceFirstEntry,
    FlowSequenceEntry,
    FlowSequenceEntryMappingKey,
    FlowSequenceEntryMappingValue,
    FlowSequenceEntryMappingEnd,
    FlowMappingFirstKey,
    FlowMappingKey,
    FlowMappingValue,
    FlowMappingEmptyValue,
    End,
}

/// Whether a collection was written with indentation or with brackets.
#[derive(Clone, Copy, PartialEq, Debug, Eq, Hash)]
pub enum CollectionStyle {
    /// Indentation-delimited.
    Block,
    /// `[ ... ]` or `{ ... }`.
    Flow,
}

/// The version from a `%YAML` directive.
#[derive(Clone, Copy, PartialEq, Debug, Eq, Hash)]
pub struct Version {
    /// Major version number.
    pub major: u32,
    /// Minor version number.
    pub minor: u32,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A `%TAG` directive.
#[derive(Clone, PartialEq, Debug, Eq, Hash)]
pub struct TagDirective {
    /// The handle, including its `!` characters.
    pub handle: String,
    /// The prefix the handle expands to.
    pub prefix: String,
}

/// The directives that preceded a document.
#[derive(Clone, PartialEq, Debug, Eq, Default)]
pub struct Directives {
    /// The `%YAML` directive, if any.
    pub version: Option<Version>,
    /// The `%TAG` directives, in source order. Default handles are not listed.
    pub tags: Vec<TagDirective>,
}

/// A YAML tag, with its handle expanded.
#[derive(Clone, PartialEq, Debug, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    /// The prefix the handle expanded to (`tag:yaml.org,2002:` for `!!`). Empty for verbatim
    /// tags.
    pub handle: String,
    /// The rest of the tag.
    pub suffix: String,
}

impl Tag {
    /// The full tag.
    #[must_use]
    pub fn uri(&self) -> String {
        format!("{}{}", self.handle, self.suffix)
    }

    /// Whether this is the non-specific `!` tag.
    #[must_use]
    pub fn is_non_specific(&self) -> bool {
        self.handle == "!" && self.suffix.is_empty()
    }

    /// Whether the tag lives in the `tag:yaml.org,2002:` namespace.
    #[must_use]
    pub fn is_yaml_core_schema(&self) -> bool {
        self.handle == CORE_SCHEMA_PREFIX
            || (self.handle.is_empty() && self.suffix.starts_with(CORE_SCHEMA_PREFIX))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.handle, self.suffix)
    }
}

/// Node properties: the anchor and tag written before a node.
#[derive(Clone, PartialEq, Debug, Eq, Default)]
pub struct NodeProps {
    /// The anchor name, without `&`.
    pub anchor: Option<String>,
    /// The tag, with its handle expanded.
    pub tag: Option<Tag>,
}

impl NodeProps {
    /// Whether neither an anchor nor a tag was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchor.is_none() && self.tag.is_none()
    }
}

/// An event generated by the YAML parser.
///
/// Events are used in the low-level event-based API (push parser). The API entrypoint is the
/// [`EventReceiver`] trait.
#[derive(Clone, PartialEq, Debug, Eq)]
pub enum Event {
    /// Event generated at the very beginning of parsing.
    StreamStart,
    /// Last event that will be generated by the parser. Signals EOF.
    StreamEnd,
    /// The start of a YAML document.
    ///
    /// The flag tells whether the document started with `---`.
    DocumentStart(bool, Directives),
    /// The end of a YAML document.
    ///
    /// The flag tells whether the document ended with `...`.
    DocumentEnd(bool),
    /// A reference to an anchored node, by name.
    Alias(String),
    /// Value, style, properties.
    Scalar(String, ScalarStyle, NodeProps),
    /// The start of a YAML sequence (array).
    SequenceStart(CollectionStyle, NodeProps),
    /// The end of a YAML sequence (array).
    SequenceEnd,
    /// The start of a YAML mapping (object, hash).
    MappingStart(CollectionStyle, NodeProps),
    /// The end of a YAML mapping (object, hash).
    MappingEnd,
}

impl Event {
    /// Create an empty plain scalar, standing for an omitted node.
    fn empty_scalar() -> Event {
        Event::Scalar(String::new(), ScalarStyle::Plain, NodeProps::default())
    }
}

/// Trait to be implemented in order to use the low-level parsing API.
///
/// The low-level parsing API is event-based (a push parser), calling [`EventReceiver::on_event`]
/// for each YAML [`Event`] that occurs.
/// The [`EventReceiver`] trait only receives events. In order to receive both events and their
/// location in the source, use [`SpannedEventReceiver`]. Note that [`EventReceiver`]s
/// implement [`SpannedEventReceiver`] automatically.
///
/// # Event hierarchy
/// The event stream starts with an [`Event::StreamStart`] event followed by an
/// [`Event::DocumentStart`] event. If the YAML document starts with a mapping (an object), an
/// [`Event::MappingStart`] event is emitted. If it starts with a sequence (an array), an
/// [`Event::SequenceStart`] event is emitted. Otherwise, an [`Event::Scalar`] event is emitted.
///
/// In a mapping, key-values are sent as consecutive events. The first event after an
/// [`Event::MappingStart`] will be the key, and following its value. If the mapping contains no
/// sub-mapping or sub-sequence, then even events (starting from 0) will always be keys and odd
/// ones will always be values. The mapping ends when an [`Event::MappingEnd`] event is received.
///
/// In a sequence, values are sent consecutively until the [`Event::SequenceEnd`] event.
///
/// If a value is a sub-mapping or a sub-sequence, an [`Event::MappingStart`] or
/// [`Event::SequenceStart`] event will be sent respectively. Following events until the
/// associated [`Event::MappingStart`] or [`Event::SequenceEnd`] (beware of nested mappings or
/// sequences) are part of the value and not another key-value pair or element in the sequence.
pub trait EventReceiver {
    /// Handler called for each YAML event that is emitted by the parser.
    fn on_event(&mut self, ev: Event);
}

/// Trait to be implemented for using the low-level parsing API.
///
/// Functionally similar to [`EventReceiver`], but receives a [`Span`] as well as the event.
pub trait SpannedEventReceiver {
    /// Handler called for each event that occurs.
    fn on_event(&mut self, ev: Event, span: Span);
}

impl<R: EventReceiver> SpannedEventReceiver for R {
    fn on_event(&mut self, ev: Event, _span: Span) {
        EventReceiver::on_event(self, ev);
    }
}

/// A convenience alias for a `Result` of a parser event.
pub type ParseResult = Result<(Event, Span), ScanError>;

/// A YAML parser.
#[derive(Debug)]
pub struct Parser<T> {
    /// The underlying scanner from which we pull tokens.
    scanner: Scanner<T>,
    /// The stack of _previous_ states we were in.
    ///
    /// States are pushed in the context of subobjects to this stack. The top-most element is the
    /// state in which to come back to when exiting the current state.
    states: Vec<State>,
    /// The state in which we currently are.
    state: State,
    /// Where each open collection started, for error reports.
    marks: Vec<Marker>,
    /// The next token from the scanner.
    token: Option<Token>,
    /// The next YAML event to emit.
    current: Option<(Event, Span)>,
    /// Tag handles in effect for the current document, mapped to their prefix.
    tags: HashMap<String, String>,
    /// Whether the last document was closed by `...` (or no document was parsed yet).
    ///
    /// Directives and bare documents may only follow such a document.
    explicit_end: bool,
    /// Warnings not yet collected by the caller.
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Parser<StrInput<'a>> {
    /// Create a new instance of a parser from a &str.
    #[must_use]
    pub fn new_from_str(value: &'a str) -> Self {
        Parser::new(StrInput::new(value))
    }
}

impl<T> Parser<BufferedInput<T>>
where
    T: Iterator<Item = char>,
{
    /// Create a new instance of a parser from an iterator of `char`s.
    ///
    /// Characters are pulled from the iterator only as parsing progresses.
    #[must_use]
    pub fn new_from_iter(iter: T) -> Self {
        Parser::new(BufferedInput::new(iter))
    }
}

impl<T: Input> Parser<T> {
    /// Create a new instance of a parser from the given input.
    pub fn new(src: T) -> Parser<T> {
        Parser {
            scanner: Scanner::new(src),
            states: Vec::new(),
            state: State::StreamStart,
            marks: Vec::new(),
            token: None,
            current: None,
            tags: HashMap::new(),
            explicit_end: true,
            diagnostics: Vec::new(),
        }
    }

    /// Try to load the next event and return it, but do not consuming it from `self`.
    ///
    /// Any subsequent call to [`Parser::peek`] will return the same value, until a call to
    /// [`Iterator::next`] or [`Parser::load`].
    ///
    /// # Errors
    /// Returns `ScanError` when loading the next event fails.
    pub fn peek(&mut self) -> Option<Result<&(Event, Span), ScanError>> {
        if self.current.is_none() {
            match self.next_event()? {
                Ok(ev) => self.current = Some(ev),
                Err(e) => return Some(Err(e)),
            }
        }
        self.current.as_ref().map(Ok)
    }

    /// Try to load the next event and return it, consuming it from `self`.
    ///
    /// Returns `None` once [`Event::StreamEnd`] has been returned, or after an error.
    ///
    /// # Errors
    /// Returns `ScanError` when loading the next event fails.
    pub fn next_event(&mut self) -> Option<ParseResult> {
        if let Some(ev) = self.current.take() {
            return Some(Ok(ev));
        }
        if self.state == State::End {
            return None;
        }
        let result = self.state_machine();
        match &result {
            Ok((ev, span)) => {
                debug_print!("\n\x1B[;33mEvent: {:?} {:?}\x1B[;0m", ev, span);
            }
            Err(e) => {
                debug_print!("\n\x1B[;31mError: {}\x1B[;0m", e);
                self.state = State::End;
            }
        }
        Some(result)
    }

    /// Return the position the scanner has reached.
    #[must_use]
    pub fn mark(&self) -> Marker {
        self.scanner.mark()
    }

    /// Return the warnings emitted since the last call, oldest first.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Resume parsing after an error.
    ///
    /// The input is skipped up to the next `---` or `...` line (or the end of the stream) and
    /// parsing restarts there as if at a document boundary. Events of the document in which the
    /// error occurred are not replayed.
    pub fn recover(&mut self) {
        // The document marker that revealed the error may already have been scanned.
        match self.token.take() {
            Some(tok @ Token(_, TokenType::DocumentStart | TokenType::DocumentEnd)) => {
                self.scanner.reset();
                self.token = Some(tok);
            }
            _ => self.scanner.recover(),
        }
        self.current = None;
        self.states.clear();
        self.marks.clear();
        self.tags.clear();
        self.explicit_end = true;
        self.state = if self.scanner.stream_ended() {
            State::End
        } else {
            State::DocumentStart
        };
    }

    /// Load the YAML from the stream in `self`, pushing events into `recv`.
    ///
    /// The contents of the stream are parsed and the corresponding events are sent into the
    /// recveiver. For detailed explanations about how events work, see [`EventReceiver`].
    ///
    /// If `multi` is set to `true`, the parser will allow parsing of multiple YAML documents
    /// inside the stream. Otherwise, it returns once the first document has been pushed.
    ///
    /// Note that any [`EventReceiver`] is also a [`SpannedEventReceiver`], so implementing the
    /// former is enough to call this function.
    /// # Errors
    /// Returns `ScanError` when loading fails.
    pub fn load<R: SpannedEventReceiver>(
        &mut self,
        recv: &mut R,
        multi: bool,
    ) -> Result<(), ScanError> {
        loop {
            let (ev, span) = self.next_event_or_end()?;
            match ev {
                Event::StreamStart => recv.on_event(ev, span),
                Event::StreamEnd => {
                    recv.on_event(ev, span);
                    return Ok(());
                }
                Event::DocumentStart(..) => {
                    recv.on_event(ev, span);
                    self.load_document(recv)?;
                    if !multi {
                        return Ok(());
                    }
                }
                _ => {
                    return Err(ScanError::syntax(
                        span.start,
                        "unexpected event outside of a document",
                    ))
                }
            }
        }
    }

    /// Forward events up to and including the [`Event::DocumentEnd`] of the current document.
    fn load_document<R: SpannedEventReceiver>(&mut self, recv: &mut R) -> Result<(), ScanError> {
        loop {
            let (ev, span) = self.next_event_or_end()?;
            match ev {
                Event::DocumentEnd(_) => {
                    recv.on_event(ev, span);
                    return Ok(());
                }
                Event::StreamEnd => {
                    return Err(ScanError::syntax(
                        span.start,
                        "unexpected end of stream within a document",
                    ))
                }
                _ => recv.on_event(ev, span),
            }
        }
    }

    /// Return the next event, or a `StreamEnd` if the parser has stopped.
    fn next_event_or_end(&mut self) -> ParseResult {
        match self.next_event() {
            Some(result) => result,
            None => Ok((Event::StreamEnd, Span::empty(self.scanner.mark()))),
        }
    }

    fn warn(&mut self, mark: Marker, message: impl Into<String>) {
        let diagnostic = Diagnostic::warning(mark, message);
        debug_print!("\x1B[;35m{}\x1B[;0m", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    fn scan_next_token(&mut self) -> Result<Token, ScanError> {
        match self.scanner.next_token()? {
            Some(tok) => {
                debug_print!(
                    "    \x1B[;32m\u{21B3} {:?} \x1B[;36m{:?}\x1B[;m",
                    tok.1,
                    tok.0
                );
                Ok(tok)
            }
            None => Err(ScanError::syntax(
                self.scanner.mark(),
                "unexpected end of stream",
            )),
        }
    }

    fn peek_token(&mut self) -> Result<&Token, ScanError> {
        if self.token.is_none() {
            self.token = Some(self.scan_next_token()?);
        }
        self.token
            .as_ref()
            .ok_or_else(|| ScanError::syntax(self.scanner.mark(), "unexpected end of stream"))
    }

    fn fetch_token(&mut self) -> Result<Token, ScanError> {
        match self.token.take() {
            Some(tok) => Ok(tok),
            None => self.scan_next_token(),
        }
    }

    /// Put back a token obtained from [`Self::fetch_token`].
    fn unfetch_token(&mut self, tok: Token) {
        self.token = Some(tok);
    }

    fn skip(&mut self) {
        self.token = None;
    }

    fn pop_state(&mut self) {
        self.state = self.states.pop().unwrap_or(State::End);
    }

    fn push_state(&mut self, state: State) {
        self.states.push(state);
    }

    fn state_machine(&mut self) -> ParseResult {
        debug_print!("\n\x1B[;33mParser state: {:?} \x1B[;0m", self.state);

        match self.state {
            State::StreamStart => self.stream_start(),

            State::ImplicitDocumentStart => self.document_start(true),
            State::DocumentStart => self.document_start(false),
            State::DocumentContent => self.document_content(),
            State::DocumentEnd => self.document_end(),

            State::BlockNode => self.parse_node(true, false),

            State::BlockMappingKey => self.block_mapping_key(),
            State::BlockMappingValue => self.block_mapping_value(),

            State::BlockSequenceEntry => self.block_sequence_entry(),
            State::IndentlessSequenceEntry => self.indentless_sequence_entry(),

            State::FlowSequenceFirstEntry => self.flow_sequence_entry(true),
            State::FlowSequenceEntry => self.flow_sequence_entry(false),
            State::FlowSequenceEntryMappingKey => self.flow_sequence_entry_mapping_key(),
            State::FlowSequenceEntryMappingValue => self.flow_sequence_entry_mapping_value(),
            State::FlowSequenceEntryMappingEnd => self.flow_sequence_entry_mapping_end(),

            State::FlowMappingFirstKey => self.flow_mapping_key(true),
            State::FlowMappingKey => self.flow_mapping_key(false),
            State::FlowMappingValue => self.flow_mapping_value(false),
            State::FlowMappingEmptyValue => self.flow_mapping_value(true),

            State::End => Err(ScanError::syntax(
                self.scanner.mark(),
                "no more events after the end of the stream",
            )),
        }
    }

    fn stream_start(&mut self) -> ParseResult {
        match *self.peek_token()? {
            Token(span, TokenType::StreamStart) => {
                self.state = State::ImplicitDocumentStart;
                self.skip();
                Ok((Event::StreamStart, span))
            }
            Token(span, _) => Err(ScanError::syntax(
                span.start,
                "did not find expected <stream-start>",
            )),
        }
    }

    fn document_start(&mut self, implicit: bool) -> ParseResult {
        // Extra `...` markers are allowed between documents.
        while let TokenType::DocumentEnd = self.peek_token()?.1 {
            self.skip();
            self.explicit_end = true;
        }

        let bare_allowed = implicit || self.explicit_end;
        match *self.peek_token()? {
            Token(span, TokenType::StreamEnd) => {
                self.state = State::End;
                self.skip();
                Ok((Event::StreamEnd, span))
            }
            Token(
                _,
                TokenType::VersionDirective(..)
                | TokenType::TagDirective(..)
                | TokenType::ReservedDirective(..)
                | TokenType::DocumentStart,
            ) => self.explicit_document_start(),
            Token(span, _) if bare_allowed => {
                // A bare document.
                let directives = self.process_directives()?;
                self.push_state(State::DocumentEnd);
                self.state = State::BlockNode;
                Ok((
                    Event::DocumentStart(false, directives),
                    Span::empty(span.start),
                ))
            }
            Token(span, _) => Err(ScanError::syntax(
                span.start,
                "did not find expected <document start>",
            )),
        }
    }

    fn explicit_document_start(&mut self) -> ParseResult {
        let Token(span, ref tok) = *self.peek_token()?;
        let start = span.start;
        let has_directives = !matches!(tok, TokenType::DocumentStart);
        if has_directives && !self.explicit_end {
            return Err(ScanError::syntax(
                start,
                "directives may only follow a document closed with '...'",
            ));
        }

        let directives = self.process_directives()?;
        match *self.peek_token()? {
            Token(span, TokenType::DocumentStart) => {
                self.push_state(State::DocumentEnd);
                self.state = State::DocumentContent;
                self.skip();
                Ok((
                    Event::DocumentStart(true, directives),
                    Span::new(start, span.end),
                ))
            }
            Token(span, _) => Err(ScanError::syntax(
                span.start,
                "did not find expected <document start>",
            )),
        }
    }

    /// Consume the directives before a document and set up its tag handles.
    fn process_directives(&mut self) -> Result<Directives, ScanError> {
        let mut directives = Directives::default();
        loop {
            let Token(span, tok) = self.fetch_token()?;
            match tok {
                TokenType::VersionDirective(major, minor) => {
                    if directives.version.is_some() {
                        return Err(ScanError::directive(
                            span.start,
                            "found duplicate %YAML directive",
                        ));
                    }
                    let version = Version { major, minor };
                    self.check_version(version, span.start)?;
                    directives.version = Some(version);
                }
                TokenType::TagDirective(handle, prefix) => {
                    if directives.tags.iter().any(|tag| tag.handle == handle) {
                        return Err(ScanError::directive(
                            span.start,
                            format!("found duplicate %TAG directive for handle `{handle}`"),
                        ));
                    }
                    directives.tags.push(TagDirective { handle, prefix });
                }
                TokenType::ReservedDirective(name, _) => {
                    self.warn(span.start, format!("ignoring unknown directive `%{name}`"));
                }
                tok => {
                    self.unfetch_token(Token(span, tok));
                    break;
                }
            }
        }

        self.tags.clear();
        self.tags.insert("!".to_owned(), "!".to_owned());
        self.tags
            .insert("!!".to_owned(), CORE_SCHEMA_PREFIX.to_owned());
        for directive in &directives.tags {
            self.tags
                .insert(directive.handle.clone(), directive.prefix.clone());
        }
        Ok(directives)
    }

    /// Accept any 1.x version, warning when it is not 1.2.
    fn check_version(&mut self, version: Version, mark: Marker) -> Result<(), ScanError> {
        if version.major != 1 {
            return Err(ScanError::directive(
                mark,
                format!("unsupported YAML version {version}"),
            ));
        }
        match version.minor {
            2 => {}
            0 | 1 => self.warn(
                mark,
                format!(
                    "document declares YAML {version}; it is read with 1.2 rules \
                     (e.g. `yes`/`no` are strings and `017` is decimal)"
                ),
            ),
            _ => self.warn(
                mark,
                format!("document declares YAML {version}, newer than 1.2; reading it as 1.2"),
            ),
        }
        Ok(())
    }

    fn document_content(&mut self) -> ParseResult {
        match *self.peek_token()? {
            Token(
                span,
                TokenType::VersionDirective(..)
                | TokenType::TagDirective(..)
                | TokenType::ReservedDirective(..)
                | TokenType::DocumentStart
                | TokenType::DocumentEnd
                | TokenType::StreamEnd,
            ) => {
                // Empty document.
                self.pop_state();
                Ok((Event::empty_scalar(), Span::empty(span.start)))
            }
            _ => self.parse_node(true, false),
        }
    }

    fn document_end(&mut self) -> ParseResult {
        let (explicit, span) = match *self.peek_token()? {
            Token(span, TokenType::DocumentEnd) => {
                self.skip();
                (true, span)
            }
            Token(span, _) => (false, Span::empty(span.start)),
        };

        self.tags.clear();
        self.explicit_end = explicit;
        self.state = State::DocumentStart;
        Ok((Event::DocumentEnd(explicit), span))
    }

    /// Expand a tag token using the handles of the current document.
    fn resolve_tag(&self, raw: TagToken, mark: Marker) -> Result<Tag, ScanError> {
        match raw {
            TagToken::NonSpecific => Ok(Tag {
                handle: "!".to_owned(),
                suffix: String::new(),
            }),
            TagToken::Verbatim(uri) => {
                if uri.is_empty() || uri == "!" {
                    return Err(ScanError::syntax(
                        mark,
                        format!("`!<{uri}>` is not a valid verbatim tag"),
                    ));
                }
                if !uri.starts_with('!') && !has_uri_scheme(&uri) {
                    return Err(ScanError::syntax(
                        mark,
                        format!("verbatim tag `{uri}` is neither a local tag nor a URI"),
                    ));
                }
                Ok(Tag {
                    handle: String::new(),
                    suffix: uri,
                })
            }
            TagToken::Shorthand { handle, suffix } => {
                if suffix.is_empty() {
                    return Err(ScanError::syntax(
                        mark,
                        format!("tag handle `{handle}` requires a non-empty suffix"),
                    ));
                }
                match self.tags.get(&handle) {
                    Some(prefix) => Ok(Tag {
                        handle: prefix.clone(),
                        suffix,
                    }),
                    None => Err(ScanError::syntax(
                        mark,
                        format!("found undefined tag handle `{handle}`"),
                    )),
                }
            }
        }
    }

    /// Parse a node: its properties, then its content.
    ///
    /// `indentless_sequence` allows a sequence whose `-` are at the indentation of the mapping
    /// holding it.
    fn parse_node(&mut self, block: bool, indentless_sequence: bool) -> ParseResult {
        let mut anchor = None;
        let mut tag = None;
        let mut start = None;
        loop {
            let Token(span, tok) = self.fetch_token()?;
            match tok {
                TokenType::Alias(name) if anchor.is_none() && tag.is_none() => {
                    self.pop_state();
                    return Ok((Event::Alias(name), span));
                }
                TokenType::Alias(_) => {
                    return Err(ScanError::syntax(
                        span.start,
                        "an alias cannot have an anchor or a tag",
                    ));
                }
                TokenType::Anchor(name) if anchor.is_none() => {
                    start.get_or_insert(span.start);
                    anchor = Some(name);
                }
                TokenType::Tag(raw) if tag.is_none() => {
                    start.get_or_insert(span.start);
                    tag = Some(self.resolve_tag(raw, span.start)?);
                }
                TokenType::Anchor(_) | TokenType::Tag(_) => {
                    return Err(ScanError::syntax(
                        span.start,
                        "a node may have at most one anchor and one tag",
                    ));
                }
                tok => {
                    self.unfetch_token(Token(span, tok));
                    break;
                }
            }
        }

        let props = NodeProps { anchor, tag };
        let Token(span, tok) = self.fetch_token()?;
        let start = start.unwrap_or(span.start);
        match tok {
            TokenType::BlockEntry if indentless_sequence => {
                self.unfetch_token(Token(span, TokenType::BlockEntry));
                self.state = State::IndentlessSequenceEntry;
                Ok((
                    Event::SequenceStart(CollectionStyle::Block, props),
                    Span::new(start, span.start),
                ))
            }
            TokenType::Scalar(style, value) => {
                self.pop_state();
                Ok((Event::Scalar(value, style, props), Span::new(start, span.end)))
            }
            TokenType::FlowSequenceStart => {
                self.marks.push(span.start);
                self.state = State::FlowSequenceFirstEntry;
                Ok((
                    Event::SequenceStart(CollectionStyle::Flow, props),
                    Span::new(start, span.end),
                ))
            }
            TokenType::FlowMappingStart => {
                self.marks.push(span.start);
                self.state = State::FlowMappingFirstKey;
                Ok((
                    Event::MappingStart(CollectionStyle::Flow, props),
                    Span::new(start, span.end),
                ))
            }
            TokenType::BlockSequenceStart if block => {
                self.marks.push(span.start);
                self.state = State::BlockSequenceEntry;
                Ok((
                    Event::SequenceStart(CollectionStyle::Block, props),
                    Span::new(start, span.end),
                ))
            }
            TokenType::BlockMappingStart if block => {
                self.marks.push(span.start);
                self.state = State::BlockMappingKey;
                Ok((
                    Event::MappingStart(CollectionStyle::Block, props),
                    Span::new(start, span.end),
                ))
            }
            // Properties on an otherwise empty node.
            tok if !props.is_empty() => {
                self.unfetch_token(Token(span, tok));
                self.pop_state();
                Ok((
                    Event::Scalar(String::new(), ScalarStyle::Plain, props),
                    Span::new(start, span.start),
                ))
            }
            _ => Err(ScanError::syntax(
                span.start,
                if block {
                    "while parsing a block node, did not find expected node content"
                } else {
                    "while parsing a flow node, did not find expected node content"
                },
            )),
        }
    }

    /// Build the error for a collection that could not continue.
    fn collection_error(&mut self, what: &str, expected: &str, mark: Marker) -> ScanError {
        let info = match self.marks.pop() {
            Some(start) => format!("while parsing {what} started at {start}, {expected}"),
            None => format!("while parsing {what}, {expected}"),
        };
        ScanError::syntax(mark, info)
    }

    fn block_sequence_entry(&mut self) -> ParseResult {
        match *self.peek_token()? {
            Token(span, TokenType::BlockEnd) => {
                self.pop_state();
                self.marks.pop();
                self.skip();
                Ok((Event::SequenceEnd, span))
            }
            Token(span, TokenType::BlockEntry) => {
                self.skip();
                if let TokenType::BlockEntry | TokenType::BlockEnd = self.peek_token()?.1 {
                    self.state = State::BlockSequenceEntry;
                    Ok((Event::empty_scalar(), Span::empty(span.end)))
                } else {
                    self.push_state(State::BlockSequenceEntry);
                    self.parse_node(true, false)
                }
            }
            Token(span, _) => Err(self.collection_error(
                "a block sequence",
                "did not find expected '-' indicator",
                span.start,
            )),
        }
    }

    fn indentless_sequence_entry(&mut self) -> ParseResult {
        match *self.peek_token()? {
            Token(span, TokenType::BlockEntry) => {
                self.skip();
                if let TokenType::BlockEntry
                | TokenType::Key
                | TokenType::Value
                | TokenType::BlockEnd = self.peek_token()?.1
                {
                    self.state = State::IndentlessSequenceEntry;
                    Ok((Event::empty_scalar(), Span::empty(span.end)))
                } else {
                    self.push_state(State::IndentlessSequenceEntry);
                    self.parse_node(true, false)
                }
            }
            Token(span, _) => {
                self.pop_state();
                Ok((Event::SequenceEnd, Span::empty(span.start)))
            }
        }
    }

    fn block_mapping_key(&mut self) -> ParseResult {
        match *self.peek_token()? {
            Token(span, TokenType::Key) => {
                self.skip();
                if let TokenType::Key | TokenType::Value | TokenType::BlockEnd =
                    self.peek_token()?.1
                {
                    self.state = State::BlockMappingValue;
                    Ok((Event::empty_scalar(), Span::empty(span.end)))
                } else {
                    self.push_state(State::BlockMappingValue);
                    self.parse_node(true, true)
                }
            }
            // A `:` without a key.
            Token(span, TokenType::Value) => {
                self.state = State::BlockMappingValue;
                Ok((Event::empty_scalar(), Span::empty(span.start)))
            }
            Token(span, TokenType::BlockEnd) => {
                self.pop_state();
                self.marks.pop();
                self.skip();
                Ok((Event::MappingEnd, span))
            }
            Token(span, _) => Err(self.collection_error(
                "a block mapping",
                "did not find expected key",
                span.start,
            )),
        }
    }

    fn block_mapping_value(&mut self) -> ParseResult {
        match *self.peek_token()? {
            Token(span, TokenType::Value) => {
                self.skip();
                if let TokenType::Key | TokenType::Value | TokenType::BlockEnd =
                    self.peek_token()?.1
                {
                    self.state = State::BlockMappingKey;
                    Ok((Event::empty_scalar(), Span::empty(span.end)))
                } else {
                    self.push_state(State::BlockMappingKey);
                    self.parse_node(true, true)
                }
            }
            Token(span, _) => {
                self.state = State::BlockMappingKey;
                Ok((Event::empty_scalar(), Span::empty(span.start)))
            }
        }
    }

    fn flow_sequence_entry(&mut self, first: bool) -> ParseResult {
        if let Token(span, TokenType::FlowSequenceEnd) = *self.peek_token()? {
            self.pop_state();
            self.marks.pop();
            self.skip();
            return Ok((Event::SequenceEnd, span));
        }

        if !first {
            match *self.peek_token()? {
                Token(_, TokenType::FlowEntry) => self.skip(),
                Token(span, _) => {
                    return Err(self.collection_error(
                        "a flow sequence",
                        "did not find expected ',' or ']'",
                        span.start,
                    ));
                }
            }
        }

        match *self.peek_token()? {
            Token(span, TokenType::FlowSequenceEnd) => {
                self.pop_state();
                self.marks.pop();
                self.skip();
                Ok((Event::SequenceEnd, span))
            }
            // A single-pair mapping: `[ a: b ]`, `[ ? a : b ]` or `[ : b ]`.
            Token(span, TokenType::Key) => {
                self.skip();
                self.state = State::FlowSequenceEntryMappingKey;
                Ok((
                    Event::MappingStart(CollectionStyle::Flow, NodeProps::default()),
                    Span::empty(span.start),
                ))
            }
            Token(span, TokenType::Value) => {
                self.state = State::FlowSequenceEntryMappingKey;
                Ok((
                    Event::MappingStart(CollectionStyle::Flow, NodeProps::default()),
                    Span::empty(span.start),
                ))
            }
            _ => {
                self.push_state(State::FlowSequenceEntry);
                self.parse_node(false, false)
            }
        }
    }

    fn flow_sequence_entry_mapping_key(&mut self) -> ParseResult {
        match *self.peek_token()? {
            Token(span, TokenType::Value | TokenType::FlowEntry | TokenType::FlowSequenceEnd) => {
                self.state = State::FlowSequenceEntryMappingValue;
                Ok((Event::empty_scalar(), Span::empty(span.start)))
            }
            _ => {
                self.push_state(State::FlowSequenceEntryMappingValue);
                self.parse_node(false, false)
            }
        }
    }

    fn flow_sequence_entry_mapping_value(&mut self) -> ParseResult {
        match *self.peek_token()? {
            Token(_, TokenType::Value) => {
                self.skip();
                if let Token(next, TokenType::FlowEntry | TokenType::FlowSequenceEnd) =
                    *self.peek_token()?
                {
                    self.state = State::FlowSequenceEntryMappingEnd;
                    Ok((Event::empty_scalar(), Span::empty(next.start)))
                } else {
                    self.push_state(State::FlowSequenceEntryMappingEnd);
                    self.parse_node(false, false)
                }
            }
            Token(span, _) => {
                self.state = State::FlowSequenceEntryMappingEnd;
                Ok((Event::empty_scalar(), Span::empty(span.start)))
            }
        }
    }

    fn flow_sequence_entry_mapping_end(&mut self) -> ParseResult {
        let span = self.peek_token()?.0;
        self.state = State::FlowSequenceEntry;
        Ok((Event::MappingEnd, Span::empty(span.start)))
    }

    fn flow_mapping_key(&mut self, first: bool) -> ParseResult {
        if let Token(span, TokenType::FlowMappingEnd) = *self.peek_token()? {
            self.pop_state();
            self.marks.pop();
            self.skip();
            return Ok((Event::MappingEnd, span));
        }

        if !first {
            match *self.peek_token()? {
                Token(_, TokenType::FlowEntry) => self.skip(),
                Token(span, _) => {
                    return Err(self.collection_error(
                        "a flow mapping",
                        "did not find expected ',' or '}'",
                        span.start,
                    ));
                }
            }
        }

        match *self.peek_token()? {
            Token(span, TokenType::FlowMappingEnd) => {
                self.pop_state();
                self.marks.pop();
                self.skip();
                Ok((Event::MappingEnd, span))
            }
            Token(_, TokenType::Key) => {
                self.skip();
                if let Token(
                    span,
                    TokenType::Value | TokenType::FlowEntry | TokenType::FlowMappingEnd,
                ) = *self.peek_token()?
                {
                    self.state = State::FlowMappingValue;
                    Ok((Event::empty_scalar(), Span::empty(span.start)))
                } else {
                    self.push_state(State::FlowMappingValue);
                    self.parse_node(false, false)
                }
            }
            // `{ : value }`
            Token(span, TokenType::Value) => {
                self.state = State::FlowMappingValue;
                Ok((Event::empty_scalar(), Span::empty(span.start)))
            }
            // `{ key }`: a key without a value.
            _ => {
                self.push_state(State::FlowMappingEmptyValue);
                self.parse_node(false, false)
            }
        }
    }

    fn flow_mapping_value(&mut self, empty: bool) -> ParseResult {
        let span = self.peek_token()?.0;
        if empty {
            self.state = State::FlowMappingKey;
            return Ok((Event::empty_scalar(), Span::empty(span.start)));
        }

        if let TokenType::Value = self.peek_token()?.1 {
            self.skip();
            let Token(span, ref tok) = *self.peek_token()?;
            if !matches!(tok, TokenType::FlowEntry | TokenType::FlowMappingEnd) {
                self.push_state(State::FlowMappingKey);
                return self.parse_node(false, false);
            }
            self.state = State::FlowMappingKey;
            return Ok((Event::empty_scalar(), Span::empty(span.start)));
        }

        self.state = State::FlowMappingKey;
        Ok((Event::empty_scalar(), Span::empty(span.start)))
    }
}

impl<T: Input> Iterator for Parser<T> {
    type Item = Result<(Event, Span), ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event()
    }
}

/// Whether `s` starts with a URI scheme (`[A-Za-z][A-Za-z0-9+.-]*:`).
fn has_uri_scheme(s: &str) -> bool {
    let Some((scheme, _)) = s.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

#[cfg(test)]
mod test {
    use super::{has_uri_scheme, Event, Parser, Tag};

    #[test]
    fn test_peek_eq_parse() {
        let s = "
a0 bb: val
a1: &x
    b1: 4
    b2: d
a2: 4
a3: [1, 2, 3]
a4:
    - [a1, a2]
    - 2
a5: *x
";
        let mut p = Parser::new_from_str(s);
        loop {
            let event_peek = p.peek().unwrap().unwrap().clone();
            let event = p.next_event().unwrap().unwrap();
            assert_eq!(event, event_peek);
            if event.0 == Event::StreamEnd {
                break;
            }
        }
    }

    #[test]
    fn uri_schemes() {
        assert!(has_uri_scheme("tag:yaml.org,2002:str"));
        assert!(has_uri_scheme("x-y.z+1:foo"));
        assert!(!has_uri_scheme("1tag:foo"));
        assert!(!has_uri_scheme("no scheme"));
    }

    #[test]
    fn tag_helpers() {
        let tag = Tag {
            handle: "tag:yaml.org,2002:".to_owned(),
            suffix: "str".to_owned(),
        };
        assert!(tag.is_yaml_core_schema());
        assert_eq!(tag.uri(), "tag:yaml.org,2002:str");
        let verbatim = Tag {
            handle: String::new(),
            suffix: "tag:yaml.org,2002:int".to_owned(),
        };
        assert!(verbatim.is_yaml_core_schema());
        let bang = Tag {
            handle: "!".to_owned(),
            suffix: String::new(),
        };
        assert!(bang.is_non_specific());
    }

    #[test]
    fn recover_after_bad_document() {
        let mut p = Parser::new_from_str("[unclosed\n--- ok\n");
        let mut seen_error = false;
        while let Some(ev) = p.next_event() {
            if ev.is_err() {
                seen_error = true;
            }
        }
        assert!(seen_error);
        p.recover();
        let events: Vec<_> = p.map(|ev| ev.unwrap().0).collect();
        assert!(matches!(events[0], Event::DocumentStart(true, _)));
        assert!(matches!(&events[1], Event::Scalar(v, _, _) if v == "ok"));
        assert_eq!(events.last(), Some(&Event::StreamEnd));
    }
}
