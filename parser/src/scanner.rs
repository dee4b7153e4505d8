//! Home to the YAML Scanner.
//!
//! The scanner is the lowest-level parsing utility. It is the lexer / tokenizer, reading input a
//! character at a time and emitting tokens that can later be interpreted by the
//! [`crate::parser`] to check for more context and validity.
//!
//! Due to the grammar of YAML, the scanner has to have some context and is not error-free.

#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

use std::{collections::VecDeque, error::Error, fmt};

use crate::{
    char_traits::{
        as_hex, is_alpha, is_anchor_char, is_blank, is_blank_or_breakz, is_bom, is_break,
        is_breakz, is_digit, is_flow, is_hex, is_printable, is_tag_char, is_uri_char, is_z,
    },
    input::Input,
};

/// The deepest nesting of flow collections the scanner accepts.
const MAX_FLOW_DEPTH: usize = 256;

/// How far (in characters) the scanner looks for the `:` of an implicit key.
const SIMPLE_KEY_WINDOW: usize = 1024;

/// The style as which the scalar was written in the YAML document.
#[derive(Clone, Copy, PartialEq, Debug, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarStyle {
    /// A YAML plain scalar.
    Plain,
    /// A YAML single quoted scalar.
    SingleQuoted,
    /// A YAML double quoted scalar.
    DoubleQuoted,
    /// A YAML literal block (`|` block).
    Literal,
    /// A YAML folded block (`>` block).
    Folded,
}

impl ScalarStyle {
    /// Whether the scalar was written without quotes or block indicator.
    #[must_use]
    pub fn is_plain(self) -> bool {
        self == ScalarStyle::Plain
    }
}

/// A location in a yaml document.
#[derive(Clone, Copy, PartialEq, Debug, Eq, Default, Hash)]
pub struct Marker {
    /// The index (in chars) in the input string.
    index: usize,
    /// The line (1-indexed).
    line: usize,
    /// The column (0-indexed).
    col: usize,
}

impl Marker {
    /// Create a new [`Marker`] at the given position.
    #[must_use]
    pub fn new(index: usize, line: usize, col: usize) -> Marker {
        Marker { index, line, col }
    }

    /// Return the index (in chars) of the marker in the source.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Return the line of the marker in the source (1-indexed).
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Return the column of the marker in the source (0-indexed).
    #[must_use]
    pub fn col(&self) -> usize {
        self.col
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.line, self.col + 1)
    }
}

/// A range of locations in a Yaml document.
#[derive(Clone, Copy, PartialEq, Debug, Eq, Default, Hash)]
pub struct Span {
    /// The start (inclusive) of the range.
    pub start: Marker,
    /// The end (exclusive) of the range.
    pub end: Marker,
}

impl Span {
    /// Create a new [`Span`] for the given range.
    #[must_use]
    pub fn new(start: Marker, end: Marker) -> Span {
        Span { start, end }
    }

    /// Create a empty [`Span`] at a given location.
    ///
    /// An empty span doesn't contain any characters, but its position may still be meaningful.
    /// For example, for an indented sequence [`SequenceEnd`] has a location but an empty span.
    ///
    /// [`SequenceEnd`]: crate::Event::SequenceEnd
    #[must_use]
    pub fn empty(mark: Marker) -> Span {
        Span {
            start: mark,
            end: mark,
        }
    }

    /// Return the length of the span (in characters).
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.index - self.start.index
    }

    /// Return whether the [`Span`] has a length of zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The stage of the pipeline that rejected the input.
#[derive(Clone, Copy, PartialEq, Debug, Eq, Hash)]
pub enum ErrorKind {
    /// A malformed token: bad escape, illegal character, broken block scalar header, ...
    Lexical,
    /// A grammar violation: bad indentation, missing indicator, undeclared tag handle, ...
    Syntax,
    /// A malformed, duplicate or unsupported directive.
    Directive,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Lexical => "lexical error",
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Directive => "directive error",
        })
    }
}

/// An error that occurred while scanning or parsing.
#[derive(Clone, PartialEq, Debug, Eq)]
pub struct ScanError {
    /// The position at which the error happened in the source.
    mark: Marker,
    /// Human-readable details about the error.
    info: String,
    /// Which family of error this is.
    kind: ErrorKind,
}

impl ScanError {
    /// Create a new error from a kind, a location and a human-readable description.
    #[must_use]
    pub fn new(kind: ErrorKind, mark: Marker, info: impl Into<String>) -> ScanError {
        ScanError {
            mark,
            info: info.into(),
            kind,
        }
    }

    /// Create a new [`ErrorKind::Lexical`] error.
    #[must_use]
    pub fn lexical(mark: Marker, info: impl Into<String>) -> ScanError {
        ScanError::new(ErrorKind::Lexical, mark, info)
    }

    /// Create a new [`ErrorKind::Syntax`] error.
    #[must_use]
    pub fn syntax(mark: Marker, info: impl Into<String>) -> ScanError {
        ScanError::new(ErrorKind::Syntax, mark, info)
    }

    /// Create a new [`ErrorKind::Directive`] error.
    #[must_use]
    pub fn directive(mark: Marker, info: impl Into<String>) -> ScanError {
        ScanError::new(ErrorKind::Directive, mark, info)
    }

    /// Return the marker pointing to the error in the source.
    #[must_use]
    pub fn marker(&self) -> &Marker {
        &self.mark
    }

    /// Return the information string describing the error that happened.
    #[must_use]
    pub fn info(&self) -> &str {
        self.info.as_ref()
    }

    /// Return the family of the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl Error for ScanError {}

impl fmt::Display for ScanError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(
            formatter,
            "{} at index {} line {} column {}",
            self.info,
            self.mark.index,
            self.mark.line,
            self.mark.col + 1,
        )
    }
}

/// A tag as written in the source, before handle expansion.
#[derive(Clone, PartialEq, Debug, Eq)]
pub enum TagToken {
    /// The non-specific tag `!`.
    NonSpecific,
    /// `!<uri>`. The content is kept as written, with `%` escapes decoded.
    Verbatim(String),
    /// `!suffix`, `!!suffix` or `!name!suffix`.
    Shorthand {
        /// The handle, including its `!` characters.
        handle: String,
        /// The suffix, with `%` escapes decoded. May be empty.
        suffix: String,
    },
}

/// The contents of a scanner token.
#[derive(Clone, PartialEq, Debug, Eq)]
pub enum TokenType {
    /// The start of the stream. Sent first, before even [`TokenType::DocumentStart`].
    StreamStart,
    /// The end of the stream, EOF.
    StreamEnd,
    /// A `%YAML` directive, with its major and minor version.
    VersionDirective(u32, u32),
    /// A `%TAG` directive, with its handle and prefix.
    TagDirective(String, String),
    /// Any other directive, with its name and parameters.
    ReservedDirective(String, Vec<String>),
    /// The start of a document (`---`).
    DocumentStart,
    /// The end of a document (`...`).
    DocumentEnd,
    /// The start of a sequence block.
    ///
    /// Sequence blocks are arrays starting with a `-`.
    BlockSequenceStart,
    /// The start of a mapping block.
    ///
    /// Mapping blocks are associative arrays starting with a key and a `:`.
    BlockMappingStart,
    /// End of the corresponding `BlockSequenceStart` or `BlockMappingStart`.
    BlockEnd,
    /// Start of an inline sequence (`[ a, b ]`).
    FlowSequenceStart,
    /// End of an inline sequence.
    FlowSequenceEnd,
    /// Start of an inline mapping (`{ a: b, c: d }`).
    FlowMappingStart,
    /// End of an inline mapping.
    FlowMappingEnd,
    /// An entry in a block sequence (`-`).
    BlockEntry,
    /// An entry in a flow sequence or mapping (`,`).
    FlowEntry,
    /// A key in a mapping, either explicit (`?`) or implicit.
    Key,
    /// A value in a mapping (`:`).
    Value,
    /// A reference to an anchor (`*name`).
    Alias(String),
    /// A YAML anchor (`&name`).
    Anchor(String),
    /// A node tag.
    Tag(TagToken),
    /// A regular YAML scalar.
    Scalar(ScalarStyle, String),
}

/// A scanner token.
#[derive(Clone, PartialEq, Debug, Eq)]
pub struct Token(pub Span, pub TokenType);

/// A scalar that was parsed and may correspond to a simple key.
///
/// Upon scanning the following yaml:
/// ```yaml
/// a: b
/// ```
/// We do not know that `a` is a key for a map until we have reached the following `:`. For this
/// YAML, we would store `a` as a scalar token in the [`Scanner`], but not emit it yet. It would be
/// kept inside the scanner until more context is fetched and we are able to know whether it is a
/// plain scalar or a key.
///
/// For example, see the following 2 yaml documents:
/// ```yaml
/// ---
/// a: b # Here, `a` is a key.
/// ...
/// ---
/// a # Here, `a` is a plain scalar.
/// ...
/// ```
/// An instance of [`SimpleKey`] is created in the [`Scanner`] when such ambiguity occurs.
#[derive(Clone, PartialEq, Debug, Eq)]
struct SimpleKey {
    /// Whether the token this [`SimpleKey`] refers to may still be a key.
    possible: bool,
    /// Whether the token this [`SimpleKey`] refers to must be a key.
    ///
    /// In block context, a scalar sitting at the indentation of the current mapping has to be
    /// a key.
    required: bool,
    /// Whether the key must end on its own line and within [`SIMPLE_KEY_WINDOW`] characters.
    ///
    /// True in block context and for compact single-pair mappings in flow sequences.
    bounded: bool,
    /// The index of the token referred to by the [`SimpleKey`], counting every token the scanner
    /// emitted or still holds.
    token_number: usize,
    /// The position at which the token the [`SimpleKey`] refers to is.
    mark: Marker,
}

impl SimpleKey {
    fn new(mark: Marker) -> SimpleKey {
        SimpleKey {
            possible: false,
            required: false,
            bounded: true,
            token_number: 0,
            mark,
        }
    }
}

/// An indentation level on the stack of indentations.
#[derive(Clone, Debug, Default)]
struct Indent {
    /// The former indentation level.
    indent: isize,
    /// Whether, upon closing, this indent generates a `BlockEnd` token.
    ///
    /// Indents pushed for the content of a `-` or a `:` only force further lines to be indented
    /// and do not open a collection.
    needs_block_end: bool,
}

/// The kind of flow collection the scanner is in.
#[derive(Clone, Copy, PartialEq, Debug, Eq)]
enum FlowKind {
    Sequence,
    Mapping,
}

/// What [`Scanner::skip_ws_to_eol`] went over.
#[derive(Clone, Copy, Debug, Default)]
struct Whitespace {
    /// At least one tab was skipped.
    tabs: bool,
    /// At least one space was skipped.
    spaces: bool,
}

/// Trailing line break policy of a block scalar.
#[derive(Clone, Copy, PartialEq, Debug, Eq)]
enum Chomping {
    /// `-`: no trailing line break.
    Strip,
    /// Default: a single trailing line break.
    Clip,
    /// `+`: every trailing line break.
    Keep,
}

/// A convenience alias for scanner functions that may fail without returning a value.
pub type ScanResult = Result<(), ScanError>;

/// The YAML scanner.
///
/// This corresponds to the low-level interface when reading YAML. The scanner emits tokens as
/// they are read (akin to a lexer), but it also holds sufficient context to be able to
/// disambiguate some of the constructs. It has understanding of indentation and whitespace and
/// is able to generate error messages for some invalid YAML constructs.
///
/// It is however not a full parser and needs [`crate::parser::Parser`] to fully detect invalid
/// YAML documents.
#[derive(Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct Scanner<I> {
    /// The input source.
    input: I,
    /// The position of the cursor within the input.
    mark: Marker,
    /// Buffer for tokens to be returned.
    ///
    /// A scalar may turn out to be a key once a `:` is found, in which case a
    /// [`TokenType::Key`] has to be inserted before it. Tokens stay here until such a decision
    /// can no longer affect them.
    tokens: VecDeque<Token>,
    /// The last error that happened.
    error: Option<ScanError>,
    /// Whether we have already emitted the `StreamStart` token.
    stream_start_produced: bool,
    /// Whether we have already emitted the `StreamEnd` token.
    stream_end_produced: bool,
    /// In flow context, a `:` directly following a JSON-like key (quoted scalar or flow
    /// collection) is a value indicator. This holds the index at which such a `:` may be.
    adjacent_value_allowed_at: usize,
    /// Whether a simple key could potentially start at the current position.
    simple_key_allowed: bool,
    /// One potential simple key per flow level, plus one for block context.
    simple_keys: Vec<SimpleKey>,
    /// The current indentation level.
    indent: isize,
    /// List of all block indentation levels we are in (except the current one).
    indents: Vec<Indent>,
    /// The flow collections we are nested in, innermost last.
    flows: Vec<FlowKind>,
    /// The number of tokens that have been returned from the scanner.
    tokens_parsed: usize,
    /// Whether a token is ready to be taken from [`Self::tokens`].
    token_available: bool,
    /// Whether all characters encountered since the last newline were whitespace.
    leading_whitespace: bool,
}

impl<I: Input> Iterator for Scanner<I> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.error.is_some() {
            return None;
        }
        match self.next_token() {
            Ok(Some(tok)) => {
                debug_print!(
                    "    \x1B[;32m\u{21B3} {:?} \x1B[;36m{:?}\x1B[;m",
                    tok.1,
                    tok.0
                );
                Some(tok)
            }
            Ok(tok) => tok,
            Err(e) => {
                self.error = Some(e);
                None
            }
        }
    }
}

impl<I: Input> Scanner<I> {
    /// Creates the YAML tokenizer.
    pub fn new(input: I) -> Scanner<I> {
        Scanner {
            input,
            mark: Marker::new(0, 1, 0),
            tokens: VecDeque::new(),
            error: None,
            stream_start_produced: false,
            stream_end_produced: false,
            adjacent_value_allowed_at: 0,
            simple_key_allowed: true,
            simple_keys: Vec::new(),
            indent: -1,
            indents: Vec::new(),
            flows: Vec::new(),
            tokens_parsed: 0,
            token_available: false,
            leading_whitespace: true,
        }
    }

    /// Get a copy of the last error that was encountered, if any.
    #[inline]
    #[must_use]
    pub fn get_error(&self) -> Option<ScanError> {
        self.error.clone()
    }

    /// Return whether the [`TokenType::StreamStart`] token has been emitted.
    #[inline]
    #[must_use]
    pub fn stream_started(&self) -> bool {
        self.stream_start_produced
    }

    /// Return whether the [`TokenType::StreamEnd`] token has been emitted.
    #[inline]
    #[must_use]
    pub fn stream_ended(&self) -> bool {
        self.stream_end_produced
    }

    /// Get the current position in the input stream.
    #[inline]
    #[must_use]
    pub fn mark(&self) -> Marker {
        self.mark
    }

    /// Discard all state after an error and move to the next document marker.
    ///
    /// Input is skipped until a line starting with `---` or `...`, or until the end of the
    /// stream. Indentation, flow and simple key state are reset, as are buffered tokens.
    pub fn recover(&mut self) {
        self.reset();
        if self.stream_end_produced {
            return;
        }

        loop {
            self.input.lookahead(4);
            let c = self.ch();
            if is_z(c) || (self.mark.col == 0 && self.input.next_is_document_indicator()) {
                break;
            }
            if is_break(c) {
                self.skip_linebreak();
            } else {
                self.skip_non_blank();
            }
        }
        self.leading_whitespace = true;
        debug_print!("scanner recovered at {:?}", self.mark);
    }

    /// Discard the error and all block, flow and simple key state, keeping the position.
    pub fn reset(&mut self) {
        self.error = None;
        self.tokens.clear();
        self.token_available = false;
        self.indent = -1;
        self.indents.clear();
        self.flows.clear();
        self.simple_keys.clear();
        self.simple_keys.push(SimpleKey::new(self.mark));
        self.simple_key_allowed = true;
        self.adjacent_value_allowed_at = 0;
    }

    /// Return the next token in the stream.
    ///
    /// # Errors
    /// Returns `ScanError` when scanning fails to find an expected next token.
    pub fn next_token(&mut self) -> Result<Option<Token>, ScanError> {
        if self.stream_end_produced {
            return Ok(None);
        }

        if !self.token_available {
            self.fetch_more_tokens()?;
        }
        let Some(t) = self.tokens.pop_front() else {
            return Err(ScanError::syntax(
                self.mark,
                "did not find expected next token",
            ));
        };
        self.token_available = false;
        self.tokens_parsed += 1;

        if let TokenType::StreamEnd = t.1 {
            self.stream_end_produced = true;
        }
        Ok(Some(t))
    }

    /// Fetch tokens until the first buffered one can no longer become a key.
    ///
    /// # Errors
    /// Returns `ScanError` when loading fails.
    pub fn fetch_more_tokens(&mut self) -> ScanResult {
        loop {
            let need_more = if self.tokens.is_empty() {
                true
            } else {
                self.stale_simple_keys()?;
                let next_token = self.tokens_parsed;
                self.simple_keys
                    .iter()
                    .any(|sk| sk.possible && sk.token_number == next_token)
            };

            if !need_more {
                break;
            }
            self.fetch_next_token()?;
        }
        self.token_available = true;

        Ok(())
    }

    /// Fetch the next token in the stream.
    ///
    /// # Errors
    /// Returns `ScanError` when the scanner does not find the next expected token.
    pub fn fetch_next_token(&mut self) -> ScanResult {
        self.input.lookahead(1);

        if !self.stream_start_produced {
            self.fetch_stream_start();
            return Ok(());
        }
        self.skip_to_next_token()?;

        debug_print!(
            "  \x1B[38;5;244m\u{2192} fetch_next_token after whitespace {:?} {:?}\x1B[m",
            self.mark,
            self.ch()
        );

        self.stale_simple_keys()?;

        let mark = self.mark;
        self.unroll_indent(mark.col as isize);

        self.input.lookahead(4);

        if is_z(self.ch()) {
            return self.fetch_stream_end();
        }

        if self.mark.col == 0 {
            if self.ch() == '%' {
                return self.fetch_directive();
            }
            if self.input.next_is_document_start() {
                return self.fetch_document_indicator(TokenType::DocumentStart);
            }
            if self.input.next_is_document_end() {
                self.fetch_document_indicator(TokenType::DocumentEnd)?;
                self.skip_ws_to_eol(true)?;
                if !is_breakz(self.ch()) {
                    return Err(ScanError::syntax(
                        self.mark,
                        "invalid content after document end marker",
                    ));
                }
                return Ok(());
            }
        }

        if (self.mark.col as isize) < self.indent {
            return Err(ScanError::syntax(self.mark, "invalid indentation"));
        }

        let c = self.ch();
        let nc = self.input.peek_nth(1);
        let in_flow = self.in_flow();
        match c {
            '[' => self.fetch_flow_collection_start(FlowKind::Sequence),
            '{' => self.fetch_flow_collection_start(FlowKind::Mapping),
            ']' => self.fetch_flow_collection_end(TokenType::FlowSequenceEnd),
            '}' => self.fetch_flow_collection_end(TokenType::FlowMappingEnd),
            ',' => self.fetch_flow_entry(),
            '-' if is_blank_or_breakz(nc) => self.fetch_block_entry(),
            '?' if is_blank_or_breakz(nc) => self.fetch_key(),
            ':' if is_blank_or_breakz(nc)
                || (in_flow
                    && (is_flow(nc) || self.mark.index == self.adjacent_value_allowed_at)) =>
            {
                self.fetch_value()
            }
            '*' => self.fetch_anchor(true),
            '&' => self.fetch_anchor(false),
            '!' => self.fetch_tag(),
            '|' if !in_flow => self.fetch_block_scalar(true),
            '>' if !in_flow => self.fetch_block_scalar(false),
            '\'' => self.fetch_flow_scalar(true),
            '"' => self.fetch_flow_scalar(false),
            '-' if !is_blank_or_breakz(nc) => self.fetch_plain_scalar(),
            ':' | '?' if !is_blank_or_breakz(nc) && !in_flow => self.fetch_plain_scalar(),
            '%' | '@' | '`' => Err(ScanError::lexical(
                self.mark,
                format!("unexpected character: `{c}'"),
            )),
            c if !is_printable(c) => Err(ScanError::lexical(
                self.mark,
                format!("found character that cannot start any token: {:#x}", c as u32),
            )),
            _ => self.fetch_plain_scalar(),
        }
    }

    /// Mark simple keys that can no longer be keys as such.
    ///
    /// # Errors
    /// This function returns an error if one of the keys we would stale was required to be a
    /// key.
    fn stale_simple_keys(&mut self) -> ScanResult {
        let mark = self.mark;
        for sk in &mut self.simple_keys {
            if sk.possible
                && sk.bounded
                && (sk.mark.line < mark.line || sk.mark.index + SIMPLE_KEY_WINDOW < mark.index)
            {
                if sk.required {
                    return Err(ScanError::syntax(mark, "simple key expected ':'"));
                }
                sk.possible = false;
            }
        }
        Ok(())
    }

    // ---- character-level helpers ----

    #[inline]
    fn ch(&self) -> char {
        self.input.peek()
    }

    #[inline]
    fn look_ch(&mut self) -> char {
        self.input.look_ch()
    }

    /// Consume the next character. It is assumed the next character is a blank.
    #[inline]
    fn skip_blank(&mut self) {
        self.input.skip();
        self.mark.index += 1;
        self.mark.col += 1;
    }

    /// Consume the next character. It is assumed the next character is not a blank.
    #[inline]
    fn skip_non_blank(&mut self) {
        self.input.skip();
        self.mark.index += 1;
        self.mark.col += 1;
        self.leading_whitespace = false;
    }

    /// Consume the next characters. It is assumed none of the next characters are blanks.
    #[inline]
    fn skip_n_non_blank(&mut self, n: usize) {
        self.input.skip_n(n);
        self.mark.index += n;
        self.mark.col += n;
        self.leading_whitespace = false;
    }

    /// Consume the next character. It is assumed the next character is a newline.
    #[inline]
    fn skip_nl(&mut self) {
        self.input.skip();
        self.mark.index += 1;
        self.mark.col = 0;
        self.mark.line += 1;
        self.leading_whitespace = true;
    }

    /// Consume a byte order mark. It does not occupy a column.
    #[inline]
    fn skip_bom(&mut self) {
        self.input.skip();
        self.mark.index += 1;
    }

    /// Consume a linebreak (either CR, LF or CRLF), if any. Do nothing if there's none.
    #[inline]
    fn skip_linebreak(&mut self) {
        self.input.lookahead(2);
        if self.input.next_2_are('\r', '\n') {
            self.skip_blank();
            self.skip_nl();
        } else if is_break(self.ch()) {
            self.skip_nl();
        }
    }

    /// Consume a line break and push a normalized `\n` into `s`.
    #[inline]
    fn read_break(&mut self, s: &mut String) {
        self.skip_linebreak();
        s.push('\n');
    }

    /// Whether the cursor is on a `---` or `...` line.
    ///
    /// 4 characters must have been loaded.
    #[inline]
    fn at_document_indicator(&self) -> bool {
        self.mark.col == 0 && self.input.next_is_document_indicator()
    }

    #[inline]
    fn in_flow(&self) -> bool {
        !self.flows.is_empty()
    }

    /// Return whether the scanner is inside a block but outside of a flow sequence.
    #[inline]
    fn is_within_block(&self) -> bool {
        !self.indents.is_empty()
    }

    fn allow_simple_key(&mut self) {
        self.simple_key_allowed = true;
    }

    fn disallow_simple_key(&mut self) {
        self.simple_key_allowed = false;
    }

    // ---- whitespace ----

    /// Skip over all whitespace and comments until the next token.
    ///
    /// # Errors
    /// This function returns an error if a tabulation is encountered where there should not be
    /// one.
    fn skip_to_next_token(&mut self) -> ScanResult {
        loop {
            match self.look_ch() {
                // Tabs may not be used as block indentation, unless nothing follows them on
                // that line.
                '\t' if self.is_within_block()
                    && self.leading_whitespace
                    && (self.mark.col as isize) < self.indent =>
                {
                    self.skip_ws_to_eol(true)?;
                    if !is_breakz(self.ch()) {
                        return Err(ScanError::lexical(
                            self.mark,
                            "tabs disallowed within this context (block indentation)",
                        ));
                    }
                }
                '\t' | ' ' => self.skip_blank(),
                '\n' | '\r' => {
                    self.skip_linebreak();
                    if !self.in_flow() {
                        self.allow_simple_key();
                    }
                }
                '#' => {
                    while !is_breakz(self.look_ch()) {
                        self.skip_non_blank();
                    }
                }
                c if is_bom(c) && self.mark.col == 0 => self.skip_bom(),
                _ => break,
            }
        }
        Ok(())
    }

    /// Skip over YAML whitespace (` `, `\n`, `\r`) and comments.
    ///
    /// # Errors
    /// This function returns an error if no whitespace was found.
    fn skip_yaml_whitespace(&mut self) -> ScanResult {
        let mut need_whitespace = true;
        loop {
            match self.look_ch() {
                ' ' => {
                    self.skip_blank();
                    need_whitespace = false;
                }
                '\n' | '\r' => {
                    self.skip_linebreak();
                    if !self.in_flow() {
                        self.allow_simple_key();
                    }
                    need_whitespace = false;
                }
                '#' => {
                    while !is_breakz(self.look_ch()) {
                        self.skip_non_blank();
                    }
                }
                _ => break,
            }
        }

        if need_whitespace {
            Err(ScanError::lexical(self.mark, "expected whitespace"))
        } else {
            Ok(())
        }
    }

    /// Skip whitespace and a comment, up to (not including) the end of the line.
    ///
    /// # Errors
    /// A comment must be separated from what precedes it by whitespace.
    fn skip_ws_to_eol(&mut self, skip_tabs: bool) -> Result<Whitespace, ScanError> {
        let mut skipped = Whitespace::default();
        loop {
            match self.look_ch() {
                ' ' => {
                    skipped.spaces = true;
                    self.skip_blank();
                }
                '\t' if skip_tabs => {
                    skipped.tabs = true;
                    self.skip_blank();
                }
                '#' if !skipped.tabs && !skipped.spaces => {
                    return Err(ScanError::lexical(
                        self.mark,
                        "comments must be separated from other tokens by whitespace",
                    ));
                }
                '#' => {
                    while !is_breakz(self.look_ch()) {
                        self.skip_non_blank();
                    }
                }
                _ => break,
            }
        }
        Ok(skipped)
    }

    // ---- stream, directives, documents ----

    fn fetch_stream_start(&mut self) {
        if is_bom(self.ch()) {
            self.skip_bom();
        }
        let mark = self.mark;
        self.indent = -1;
        self.stream_start_produced = true;
        self.allow_simple_key();
        self.tokens
            .push_back(Token(Span::empty(mark), TokenType::StreamStart));
        self.simple_keys.push(SimpleKey::new(mark));
    }

    fn fetch_stream_end(&mut self) -> ScanResult {
        // Force a new line.
        if self.mark.col != 0 {
            self.mark.col = 0;
            self.mark.line += 1;
        }

        // No more context will come. Keys that were still possible are not keys, unless they
        // were required to be.
        for sk in &mut self.simple_keys {
            if sk.required && sk.possible {
                return Err(ScanError::syntax(self.mark, "simple key expected ':'"));
            }
            sk.possible = false;
        }

        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.disallow_simple_key();

        self.tokens
            .push_back(Token(Span::empty(self.mark), TokenType::StreamEnd));
        Ok(())
    }

    fn fetch_directive(&mut self) -> ScanResult {
        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.disallow_simple_key();

        let tok = self.scan_directive()?;
        self.tokens.push_back(tok);
        Ok(())
    }

    fn scan_directive(&mut self) -> Result<Token, ScanError> {
        let start_mark = self.mark;
        self.skip_non_blank();

        let name = self.scan_directive_name()?;
        let tok = match name.as_ref() {
            "YAML" => self.scan_version_directive_value(&start_mark)?,
            "TAG" => self.scan_tag_directive_value(&start_mark)?,
            _ => {
                let params = self.scan_reserved_directive_params();
                TokenType::ReservedDirective(name, params)
            }
        };
        let end_mark = self.mark;

        self.skip_ws_to_eol(true)?;

        if is_breakz(self.ch()) {
            self.skip_linebreak();
            Ok(Token(Span::new(start_mark, end_mark), tok))
        } else {
            Err(ScanError::directive(
                start_mark,
                "while scanning a directive, did not find expected comment or line break",
            ))
        }
    }

    fn scan_directive_name(&mut self) -> Result<String, ScanError> {
        let start_mark = self.mark;
        let mut string = String::new();
        while is_alpha(self.look_ch()) {
            string.push(self.ch());
            self.skip_non_blank();
        }

        if string.is_empty() {
            return Err(ScanError::directive(
                start_mark,
                "while scanning a directive, could not find expected directive name",
            ));
        }

        if !is_blank_or_breakz(self.ch()) {
            return Err(ScanError::directive(
                start_mark,
                "while scanning a directive, found unexpected non-alphabetical character",
            ));
        }

        Ok(string)
    }

    fn scan_version_directive_value(&mut self, mark: &Marker) -> Result<TokenType, ScanError> {
        while is_blank(self.look_ch()) {
            self.skip_blank();
        }

        let major = self.scan_version_directive_number(mark)?;

        if self.ch() != '.' {
            return Err(ScanError::directive(
                *mark,
                "while scanning a YAML directive, did not find expected digit or '.' character",
            ));
        }
        self.skip_non_blank();

        let minor = self.scan_version_directive_number(mark)?;

        Ok(TokenType::VersionDirective(major, minor))
    }

    fn scan_version_directive_number(&mut self, mark: &Marker) -> Result<u32, ScanError> {
        let mut val = 0u32;
        let mut length = 0usize;
        while let Some(digit) = self.look_ch().to_digit(10) {
            if length == 9 {
                return Err(ScanError::directive(
                    *mark,
                    "while scanning a YAML directive, found extremely long version number",
                ));
            }
            length += 1;
            val = val * 10 + digit;
            self.skip_non_blank();
        }

        if length == 0 {
            return Err(ScanError::directive(
                *mark,
                "while scanning a YAML directive, did not find expected version number",
            ));
        }

        Ok(val)
    }

    fn scan_tag_directive_value(&mut self, mark: &Marker) -> Result<TokenType, ScanError> {
        while is_blank(self.look_ch()) {
            self.skip_blank();
        }
        let handle = self.scan_tag_handle(true, mark)?;

        if !is_blank(self.look_ch()) {
            return Err(ScanError::directive(
                *mark,
                "while scanning a TAG directive, did not find expected whitespace",
            ));
        }
        while is_blank(self.look_ch()) {
            self.skip_blank();
        }

        let prefix = self.scan_tag_prefix(mark)?;

        if is_blank_or_breakz(self.look_ch()) {
            Ok(TokenType::TagDirective(handle, prefix))
        } else {
            Err(ScanError::directive(
                *mark,
                "while scanning a TAG directive, did not find expected whitespace or line break",
            ))
        }
    }

    /// Collect the whitespace-separated parameters of a reserved directive.
    fn scan_reserved_directive_params(&mut self) -> Vec<String> {
        let mut params = Vec::new();
        loop {
            while is_blank(self.look_ch()) {
                self.skip_blank();
            }
            if is_breakz(self.ch()) || self.ch() == '#' {
                break;
            }
            let mut param = String::new();
            while !is_blank_or_breakz(self.look_ch()) {
                param.push(self.ch());
                self.skip_non_blank();
            }
            params.push(param);
        }
        params
    }

    fn fetch_document_indicator(&mut self, t: TokenType) -> ScanResult {
        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.disallow_simple_key();

        let mark = self.mark;
        self.skip_n_non_blank(3);

        self.tokens.push_back(Token(Span::new(mark, self.mark), t));
        Ok(())
    }

    // ---- tags, anchors, aliases ----

    fn fetch_tag(&mut self) -> ScanResult {
        self.save_simple_key();
        self.disallow_simple_key();

        let tok = self.scan_tag()?;
        self.tokens.push_back(tok);
        Ok(())
    }

    fn scan_tag(&mut self) -> Result<Token, ScanError> {
        let start_mark = self.mark;

        self.input.lookahead(2);
        let tag = if self.input.peek_nth(1) == '<' {
            TagToken::Verbatim(self.scan_verbatim_tag(&start_mark)?)
        } else {
            let handle = self.scan_tag_handle(false, &start_mark)?;
            if handle.len() >= 2 && handle.ends_with('!') {
                // `!!suffix` or `!name!suffix`.
                let suffix = self.scan_tag_shorthand_suffix(&start_mark)?;
                TagToken::Shorthand { handle, suffix }
            } else {
                // `!suffix`: what was read as a handle is the start of the suffix.
                let mut suffix = handle[1..].to_owned();
                suffix.push_str(&self.scan_tag_shorthand_suffix(&start_mark)?);
                if suffix.is_empty() {
                    TagToken::NonSpecific
                } else {
                    TagToken::Shorthand {
                        handle: "!".to_owned(),
                        suffix,
                    }
                }
            }
        };

        if is_blank_or_breakz(self.look_ch()) || (self.in_flow() && is_flow(self.ch())) {
            Ok(Token(Span::new(start_mark, self.mark), TokenType::Tag(tag)))
        } else {
            Err(ScanError::lexical(
                start_mark,
                "while scanning a tag, did not find expected whitespace or line break",
            ))
        }
    }

    fn scan_tag_handle(&mut self, directive: bool, mark: &Marker) -> Result<String, ScanError> {
        let mut string = String::new();
        if self.look_ch() != '!' {
            return Err(ScanError::lexical(
                *mark,
                "while scanning a tag, did not find expected '!'",
            ));
        }

        string.push('!');
        self.skip_non_blank();

        while is_alpha(self.look_ch()) {
            string.push(self.ch());
            self.skip_non_blank();
        }

        if self.ch() == '!' {
            string.push('!');
            self.skip_non_blank();
        } else if directive && string != "!" {
            // In a %TAG directive, a named handle must be closed by a `!`. In a tag, the
            // characters read so far are part of the suffix.
            return Err(ScanError::directive(
                *mark,
                "while parsing a tag directive, did not find expected '!'",
            ));
        }
        Ok(string)
    }

    /// Scan a tag prefix of a `%TAG` directive.
    ///
    /// A local prefix starts with `!`; a global one with a tag character.
    fn scan_tag_prefix(&mut self, start_mark: &Marker) -> Result<String, ScanError> {
        let mut string = String::new();

        if self.look_ch() == '!' {
            string.push('!');
            self.skip_non_blank();
        } else if !is_tag_char(self.ch()) {
            return Err(ScanError::directive(
                *start_mark,
                "invalid global tag character",
            ));
        }

        while is_uri_char(self.look_ch()) {
            if self.ch() == '%' {
                string.push(self.scan_uri_escapes(start_mark)?);
            } else {
                string.push(self.ch());
                self.skip_non_blank();
            }
        }

        Ok(string)
    }

    /// Scan a verbatim tag. The leading `!<` must not have been skipped.
    fn scan_verbatim_tag(&mut self, start_mark: &Marker) -> Result<String, ScanError> {
        self.skip_n_non_blank(2);

        let mut string = String::new();
        while is_uri_char(self.look_ch()) {
            if self.ch() == '%' {
                string.push(self.scan_uri_escapes(start_mark)?);
            } else {
                string.push(self.ch());
                self.skip_non_blank();
            }
        }

        if self.ch() != '>' {
            return Err(ScanError::lexical(
                *start_mark,
                "while scanning a verbatim tag, did not find the expected '>'",
            ));
        }
        self.skip_non_blank();

        Ok(string)
    }

    fn scan_tag_shorthand_suffix(&mut self, mark: &Marker) -> Result<String, ScanError> {
        let mut string = String::new();
        while is_tag_char(self.look_ch()) {
            if self.ch() == '%' {
                string.push(self.scan_uri_escapes(mark)?);
            } else {
                string.push(self.ch());
                self.skip_non_blank();
            }
        }
        Ok(string)
    }

    /// Decode a `%XX` sequence (possibly several, for a multi-byte UTF-8 character).
    fn scan_uri_escapes(&mut self, mark: &Marker) -> Result<char, ScanError> {
        let mut octets = Vec::with_capacity(4);
        let mut width = 0usize;
        loop {
            self.input.lookahead(3);
            let (Some(high), Some(low)) = (as_hex(self.input.peek_nth(1)), as_hex(self.input.peek_nth(2)))
            else {
                return Err(ScanError::lexical(
                    *mark,
                    "while parsing a tag, did not find URI escaped octet",
                ));
            };
            if self.ch() != '%' {
                return Err(ScanError::lexical(
                    *mark,
                    "while parsing a tag, did not find URI escaped octet",
                ));
            }

            let octet = ((high << 4) + low) as u8;
            if width == 0 {
                width = match octet {
                    _ if octet & 0x80 == 0x00 => 1,
                    _ if octet & 0xE0 == 0xC0 => 2,
                    _ if octet & 0xF0 == 0xE0 => 3,
                    _ if octet & 0xF8 == 0xF0 => 4,
                    _ => {
                        return Err(ScanError::lexical(
                            *mark,
                            "while parsing a tag, found an incorrect leading UTF-8 octet",
                        ));
                    }
                };
            } else if octet & 0xC0 != 0x80 {
                return Err(ScanError::lexical(
                    *mark,
                    "while parsing a tag, found an incorrect trailing UTF-8 octet",
                ));
            }
            octets.push(octet);
            self.skip_n_non_blank(3);

            if octets.len() == width {
                break;
            }
        }

        std::str::from_utf8(&octets)
            .ok()
            .and_then(|s| s.chars().next())
            .ok_or_else(|| {
                ScanError::lexical(*mark, "while parsing a tag, found an invalid UTF-8 codepoint")
            })
    }

    fn fetch_anchor(&mut self, alias: bool) -> ScanResult {
        self.save_simple_key();
        self.disallow_simple_key();

        let tok = self.scan_anchor(alias)?;
        self.tokens.push_back(tok);
        Ok(())
    }

    fn scan_anchor(&mut self, alias: bool) -> Result<Token, ScanError> {
        let mut string = String::new();
        let start_mark = self.mark;

        self.skip_non_blank();
        while is_anchor_char(self.look_ch()) {
            string.push(self.ch());
            self.skip_non_blank();
        }

        if string.is_empty() {
            return Err(ScanError::lexical(
                start_mark,
                "while scanning an anchor or alias, did not find expected anchor name",
            ));
        }

        let span = Span::new(start_mark, self.mark);
        if alias {
            Ok(Token(span, TokenType::Alias(string)))
        } else {
            Ok(Token(span, TokenType::Anchor(string)))
        }
    }

    // ---- flow collections ----

    fn fetch_flow_collection_start(&mut self, kind: FlowKind) -> ScanResult {
        // `[` and `{` may start a simple key.
        self.save_simple_key();

        self.roll_one_col_indent();
        self.increase_flow_level(kind)?;

        self.allow_simple_key();

        let start_mark = self.mark;
        self.skip_non_blank();
        let span = Span::new(start_mark, self.mark);

        self.skip_ws_to_eol(true)?;

        let tok = match kind {
            FlowKind::Sequence => TokenType::FlowSequenceStart,
            FlowKind::Mapping => TokenType::FlowMappingStart,
        };
        self.tokens.push_back(Token(span, tok));
        Ok(())
    }

    fn fetch_flow_collection_end(&mut self, tok: TokenType) -> ScanResult {
        self.remove_simple_key()?;
        self.decrease_flow_level();

        self.disallow_simple_key();

        let start_mark = self.mark;
        self.skip_non_blank();
        let span = Span::new(start_mark, self.mark);
        self.skip_ws_to_eol(true)?;

        // A flow collection may be a key in a flow mapping, in which case the `:` may be
        // adjacent: `[ {a: b}:value ]`.
        if self.in_flow() {
            self.adjacent_value_allowed_at = self.mark.index;
        }

        self.tokens.push_back(Token(span, tok));
        Ok(())
    }

    fn fetch_flow_entry(&mut self) -> ScanResult {
        self.remove_simple_key()?;
        self.allow_simple_key();

        let start_mark = self.mark;
        self.skip_non_blank();
        let span = Span::new(start_mark, self.mark);
        self.skip_ws_to_eol(true)?;

        self.tokens.push_back(Token(span, TokenType::FlowEntry));
        Ok(())
    }

    fn increase_flow_level(&mut self, kind: FlowKind) -> ScanResult {
        if self.flows.len() >= MAX_FLOW_DEPTH {
            return Err(ScanError::syntax(self.mark, "recursion limit exceeded"));
        }
        self.simple_keys.push(SimpleKey::new(self.mark));
        self.flows.push(kind);
        Ok(())
    }

    fn decrease_flow_level(&mut self) {
        if self.flows.pop().is_some() {
            self.simple_keys.pop();
        }
    }

    // ---- block collections ----

    /// Push the `Block*` token(s) and skip over the `-`.
    fn fetch_block_entry(&mut self) -> ScanResult {
        if self.in_flow() {
            return Err(ScanError::syntax(
                self.mark,
                r#""-" is only valid inside a block"#,
            ));
        }
        if !self.simple_key_allowed {
            return Err(ScanError::syntax(
                self.mark,
                "block sequence entries are not allowed in this context",
            ));
        }

        // Properties in column 0 cannot belong to a sequence that starts in column 0 below them
        // when we are already nested in a block.
        if let Some(Token(span, TokenType::Anchor(..) | TokenType::Tag(..))) = self.tokens.back() {
            if self.mark.col == 0 && span.start.col == 0 && self.indent > -1 {
                return Err(ScanError::syntax(
                    span.start,
                    "invalid indentation for node properties",
                ));
            }
        }

        let mark = self.mark;
        self.roll_indent(mark.col, None, TokenType::BlockSequenceStart, mark);
        self.skip_non_blank();
        let span = Span::new(mark, self.mark);

        let ws = self.skip_ws_to_eol(true)?;
        self.input.lookahead(2);
        if ws.tabs && self.ch() == '-' && is_blank_or_breakz(self.input.peek_nth(1)) {
            return Err(ScanError::lexical(
                self.mark,
                "'-' must be followed by a valid YAML whitespace",
            ));
        }

        if is_break(self.ch()) || is_flow(self.ch()) {
            self.roll_one_col_indent();
        }

        self.remove_simple_key()?;
        self.allow_simple_key();

        self.tokens.push_back(Token(span, TokenType::BlockEntry));
        Ok(())
    }

    /// Push a `Key` token for an explicit `?` key.
    fn fetch_key(&mut self) -> ScanResult {
        let start_mark = self.mark;
        if self.in_flow() {
            // The parser opens a single-pair mapping when it finds a `Key` in a flow sequence.
        } else {
            if !self.simple_key_allowed {
                return Err(ScanError::syntax(
                    self.mark,
                    "mapping keys are not allowed in this context",
                ));
            }
            self.roll_indent(
                start_mark.col,
                None,
                TokenType::BlockMappingStart,
                start_mark,
            );
        }

        self.remove_simple_key()?;

        if self.in_flow() {
            self.disallow_simple_key();
        } else {
            self.allow_simple_key();
        }

        self.skip_non_blank();
        let span = Span::new(start_mark, self.mark);
        self.skip_yaml_whitespace()?;
        if self.ch() == '\t' {
            return Err(ScanError::lexical(
                self.mark,
                "tabs disallowed in this context",
            ));
        }
        self.tokens.push_back(Token(span, TokenType::Key));
        Ok(())
    }

    /// Push a `Value` token (after a `:`), inserting the pending simple key if any.
    fn fetch_value(&mut self) -> ScanResult {
        let Some(sk) = self.simple_keys.last().cloned() else {
            return Err(ScanError::syntax(self.mark, "unexpected ':'"));
        };
        let start_mark = self.mark;

        self.skip_non_blank();
        let span = Span::new(start_mark, self.mark);
        if self.look_ch() == '\t'
            && !self.skip_ws_to_eol(true)?.spaces
            && (self.ch() == '-' || is_alpha(self.ch()))
        {
            return Err(ScanError::lexical(
                self.mark,
                "':' must be followed by a valid YAML whitespace",
            ));
        }

        if sk.possible {
            let index = sk.token_number - self.tokens_parsed;
            self.tokens
                .insert(index, Token(Span::empty(sk.mark), TokenType::Key));

            self.roll_indent(
                sk.mark.col,
                Some(sk.token_number),
                TokenType::BlockMappingStart,
                sk.mark,
            );
            self.roll_one_col_indent();

            if let Some(last) = self.simple_keys.last_mut() {
                last.possible = false;
            }
            self.disallow_simple_key();
        } else {
            // The `:` follows an explicit key, or has no key at all.
            if !self.in_flow() {
                if !self.simple_key_allowed {
                    return Err(ScanError::syntax(
                        start_mark,
                        "mapping values are not allowed in this context",
                    ));
                }

                self.roll_indent(
                    start_mark.col,
                    None,
                    TokenType::BlockMappingStart,
                    start_mark,
                );
            }
            self.roll_one_col_indent();

            if self.in_flow() {
                self.disallow_simple_key();
            } else {
                self.allow_simple_key();
            }
        }
        self.tokens.push_back(Token(span, TokenType::Value));

        Ok(())
    }

    /// Add an indentation level to the stack with the given block token, if needed.
    ///
    /// An indentation level is added only outside of flow collections and if `col` is further
    /// indented than the current level.
    fn roll_indent(&mut self, col: usize, number: Option<usize>, tok: TokenType, mark: Marker) {
        if self.in_flow() {
            return;
        }

        // A pending non-block indent at this column turns out to be a block indent.
        if self.indent <= col as isize {
            if let Some(indent) = self.indents.last() {
                if !indent.needs_block_end {
                    self.indent = indent.indent;
                    self.indents.pop();
                }
            }
        }

        if self.indent < col as isize {
            self.indents.push(Indent {
                indent: self.indent,
                needs_block_end: true,
            });
            self.indent = col as isize;
            let token = Token(Span::empty(mark), tok);
            match number {
                Some(n) => self.tokens.insert(n - self.tokens_parsed, token),
                None => self.tokens.push_back(token),
            }
        }
    }

    /// Pop indentation levels further indented than `col`, emitting `BlockEnd` tokens.
    fn unroll_indent(&mut self, col: isize) {
        if self.in_flow() {
            return;
        }
        while self.indent > col {
            let Some(indent) = self.indents.pop() else {
                break;
            };
            self.indent = indent.indent;
            if indent.needs_block_end {
                self.tokens
                    .push_back(Token(Span::empty(self.mark), TokenType::BlockEnd));
            }
        }
    }

    /// Add an indentation level of 1 column that does not start a block.
    fn roll_one_col_indent(&mut self) {
        if !self.in_flow()
            && self
                .indents
                .last()
                .is_some_and(|indent| indent.needs_block_end)
        {
            self.indents.push(Indent {
                indent: self.indent,
                needs_block_end: false,
            });
            self.indent += 1;
        }
    }

    /// Unroll all last indents created with [`Self::roll_one_col_indent`].
    fn unroll_non_block_indents(&mut self) {
        while let Some(indent) = self.indents.last() {
            if indent.needs_block_end {
                break;
            }
            self.indent = indent.indent;
            self.indents.pop();
        }
    }

    /// Mark the next token to be pushed as a potential simple key.
    fn save_simple_key(&mut self) {
        if !self.simple_key_allowed {
            return;
        }
        let required = !self.in_flow()
            && self.indent == (self.mark.col as isize)
            && self
                .indents
                .last()
                .is_some_and(|indent| indent.needs_block_end);
        let sk = SimpleKey {
            possible: true,
            required,
            bounded: self.flows.last().map_or(true, |kind| *kind == FlowKind::Sequence),
            token_number: self.tokens_parsed + self.tokens.len(),
            mark: self.mark,
        };
        if let Some(last) = self.simple_keys.last_mut() {
            *last = sk;
        } else {
            self.simple_keys.push(sk);
        }
    }

    fn remove_simple_key(&mut self) -> ScanResult {
        if let Some(last) = self.simple_keys.last_mut() {
            if last.possible && last.required {
                return Err(ScanError::syntax(self.mark, "simple key expected ':'"));
            }
            last.possible = false;
        }
        Ok(())
    }

    // ---- scalars ----

    fn fetch_block_scalar(&mut self, literal: bool) -> ScanResult {
        self.save_simple_key();
        self.allow_simple_key();
        let tok = self.scan_block_scalar(literal)?;

        self.tokens.push_back(tok);
        Ok(())
    }

    /// Scan the `|` or `>` header: chomping and indentation indicators, in either order.
    fn scan_block_scalar_header(&mut self, start_mark: Marker) -> Result<(Chomping, usize), ScanError> {
        let mut chomping = Chomping::Clip;
        let mut increment = 0;
        for _ in 0..2 {
            match self.look_ch() {
                '+' | '-' if chomping == Chomping::Clip => {
                    chomping = if self.ch() == '+' {
                        Chomping::Keep
                    } else {
                        Chomping::Strip
                    };
                    self.skip_non_blank();
                }
                '0' if increment == 0 => {
                    return Err(ScanError::lexical(
                        start_mark,
                        "while scanning a block scalar, found an indentation indicator equal to 0",
                    ));
                }
                c if is_digit(c) && increment == 0 => {
                    increment = (c as usize) - ('0' as usize);
                    self.skip_non_blank();
                }
                _ => break,
            }
        }
        Ok((chomping, increment))
    }

    fn scan_block_scalar(&mut self, literal: bool) -> Result<Token, ScanError> {
        let start_mark = self.mark;
        let style = if literal {
            ScalarStyle::Literal
        } else {
            ScalarStyle::Folded
        };

        let mut string = String::new();
        let mut leading_break = String::new();
        let mut trailing_breaks = String::new();

        // Skip `|` or `>`.
        self.skip_non_blank();
        self.unroll_non_block_indents();

        let (chomping, increment) = self.scan_block_scalar_header(start_mark)?;

        self.skip_ws_to_eol(true)?;

        if !is_breakz(self.look_ch()) {
            return Err(ScanError::lexical(
                start_mark,
                "while scanning a block scalar, did not find expected comment or line break",
            ));
        }

        self.skip_linebreak();

        if self.look_ch() == '\t' {
            return Err(ScanError::lexical(
                start_mark,
                "a block scalar content cannot start with a tab",
            ));
        }

        let mut indent = if increment == 0 {
            0
        } else if self.indent >= 0 {
            (self.indent + increment as isize) as usize
        } else {
            increment
        };

        if indent == 0 {
            indent = self.detect_block_scalar_indent(&mut trailing_breaks);
        } else {
            self.skip_block_scalar_indent(indent, &mut trailing_breaks);
        }

        // End of stream with no content (`- |+` at the very end).
        if is_z(self.ch()) {
            // The line break of the header is not content.
            let contents = match chomping {
                Chomping::Keep => trailing_breaks,
                Chomping::Strip | Chomping::Clip => String::new(),
            };
            let span = Span::new(start_mark, self.mark);
            return Ok(Token(span, TokenType::Scalar(style, contents)));
        }

        if self.mark.col < indent && (self.mark.col as isize) > self.indent {
            return Err(ScanError::lexical(
                self.mark,
                "wrongly indented line in block scalar",
            ));
        }

        let mut leading_blank = false;
        while self.mark.col == indent && !is_z(self.ch()) {
            if indent == 0 {
                self.input.lookahead(4);
                if self.at_document_indicator() {
                    break;
                }
            }

            // First content character of a content line.
            let trailing_blank = is_blank(self.ch());
            if !literal && !leading_break.is_empty() && !leading_blank && !trailing_blank {
                // Fold: a single break between two regular lines becomes a space.
                string.push_str(&trailing_breaks);
                if trailing_breaks.is_empty() {
                    string.push(' ');
                }
            } else {
                string.push_str(&leading_break);
                string.push_str(&trailing_breaks);
            }

            leading_break.clear();
            trailing_breaks.clear();

            leading_blank = is_blank(self.ch());

            while !is_breakz(self.look_ch()) {
                string.push(self.ch());
                self.skip_blank();
            }

            if is_z(self.ch()) {
                break;
            }

            self.read_break(&mut leading_break);
            self.skip_block_scalar_indent(indent, &mut trailing_breaks);
        }

        // Chomp the tail.
        if chomping != Chomping::Strip {
            string.push_str(&leading_break);
            // The last line ended with the stream rather than a line break.
            if is_z(self.ch()) && self.mark.col >= indent.max(1) {
                string.push('\n');
            }
        }

        if chomping == Chomping::Keep {
            string.push_str(&trailing_breaks);
        }

        Ok(Token(
            Span::new(start_mark, self.mark),
            TokenType::Scalar(style, string),
        ))
    }

    /// Skip the block scalar indentation and empty lines.
    fn skip_block_scalar_indent(&mut self, indent: usize, breaks: &mut String) {
        loop {
            // Tabs cannot be used as indentation.
            while self.mark.col < indent && self.look_ch() == ' ' {
                self.skip_blank();
            }

            if is_break(self.look_ch()) {
                self.read_break(breaks);
            } else {
                break;
            }
        }
    }

    /// Skip leading empty lines and return the content indentation of a block scalar.
    ///
    /// The indentation is that of the first non-empty line, but never less than the longest
    /// leading empty line nor less than one more than the parent's.
    fn detect_block_scalar_indent(&mut self, breaks: &mut String) -> usize {
        let mut max_indent = 0;
        loop {
            while self.look_ch() == ' ' {
                self.skip_blank();
            }

            max_indent = max_indent.max(self.mark.col);

            if is_break(self.ch()) {
                self.read_break(breaks);
            } else {
                break;
            }
        }

        // At the top level (`self.indent == -1`), content may start in column 0.
        let indent = max_indent.max((self.indent + 1) as usize);
        if self.indent > 0 {
            indent.max(1)
        } else {
            indent
        }
    }

    fn fetch_flow_scalar(&mut self, single: bool) -> ScanResult {
        self.save_simple_key();
        self.disallow_simple_key();

        let tok = self.scan_flow_scalar(single)?;

        // A JSON-like key inside a flow collection may be followed by an adjacent `:`.
        self.skip_to_next_token()?;
        self.adjacent_value_allowed_at = self.mark.index;

        self.tokens.push_back(tok);
        Ok(())
    }

    fn scan_flow_scalar(&mut self, single: bool) -> Result<Token, ScanError> {
        let start_mark = self.mark;

        let mut string = String::new();
        let mut leading_break = String::new();
        let mut trailing_breaks = String::new();
        let mut whitespaces = String::new();

        // Eat the left quote.
        self.skip_non_blank();

        loop {
            self.input.lookahead(4);

            if self.at_document_indicator() {
                return Err(ScanError::lexical(
                    start_mark,
                    "while scanning a quoted scalar, found unexpected document indicator",
                ));
            }

            if is_z(self.ch()) {
                return Err(ScanError::lexical(
                    start_mark,
                    "while scanning a quoted scalar, found unexpected end of stream",
                ));
            }

            if (self.mark.col as isize) < self.indent {
                return Err(ScanError::lexical(
                    start_mark,
                    "invalid indentation in quoted scalar",
                ));
            }

            let mut leading_blanks =
                self.consume_flow_scalar_non_whitespace_chars(single, &mut string, &start_mark)?;

            match self.look_ch() {
                '\'' if single => break,
                '"' if !single => break,
                _ => {}
            }

            // Consume blank characters.
            while is_blank(self.ch()) || is_break(self.ch()) {
                if is_blank(self.ch()) {
                    if !leading_blanks {
                        whitespaces.push(self.ch());
                    } else if self.ch() == '\t' && (self.mark.col as isize) < self.indent {
                        return Err(ScanError::lexical(
                            self.mark,
                            "tab cannot be used as indentation",
                        ));
                    }
                    self.skip_blank();
                } else if leading_blanks {
                    self.read_break(&mut trailing_breaks);
                } else {
                    whitespaces.clear();
                    self.read_break(&mut leading_break);
                    leading_blanks = true;
                }
                self.input.lookahead(1);
            }

            // Join the whitespaces or fold line breaks.
            if leading_blanks {
                if !leading_break.is_empty() {
                    if trailing_breaks.is_empty() {
                        string.push(' ');
                    } else {
                        string.push_str(&trailing_breaks);
                    }
                }
                // An escaped line break (`\` at the end of a line) joins without a space.
                else {
                    string.push_str(&trailing_breaks);
                }
                trailing_breaks.clear();
                leading_break.clear();
            } else {
                string.push_str(&whitespaces);
                whitespaces.clear();
            }
        }

        // Eat the right quote.
        self.skip_non_blank();
        let end_mark = self.mark;
        self.skip_ws_to_eol(true)?;
        match self.ch() {
            ',' | '}' | ']' if self.in_flow() => {}
            c if is_breakz(c) => {}
            // A key: in block context it must stay on one line.
            ':' if self.in_flow() || start_mark.line == self.mark.line => {}
            _ => {
                return Err(ScanError::lexical(
                    self.mark,
                    "invalid trailing content after quoted scalar",
                ));
            }
        }

        let style = if single {
            ScalarStyle::SingleQuoted
        } else {
            ScalarStyle::DoubleQuoted
        };
        Ok(Token(
            Span::new(start_mark, end_mark),
            TokenType::Scalar(style, string),
        ))
    }

    /// Consume successive non-whitespace characters from a quoted scalar, resolving escapes.
    ///
    /// Stops at whitespace, the end of the stream or the closing quote. Returns whether an
    /// escaped line break was consumed.
    fn consume_flow_scalar_non_whitespace_chars(
        &mut self,
        single: bool,
        string: &mut String,
        start_mark: &Marker,
    ) -> Result<bool, ScanError> {
        self.input.lookahead(2);
        while !is_blank_or_breakz(self.ch()) {
            match self.ch() {
                '\'' if single && self.input.peek_nth(1) == '\'' => {
                    string.push('\'');
                    self.skip_n_non_blank(2);
                }
                '\'' if single => break,
                '"' if !single => break,
                '\\' if !single && is_break(self.input.peek_nth(1)) => {
                    self.skip_non_blank();
                    self.skip_linebreak();
                    return Ok(true);
                }
                '\\' if !single => {
                    string.push(self.resolve_flow_scalar_escape_sequence(start_mark)?);
                }
                c => {
                    string.push(c);
                    self.skip_non_blank();
                }
            }
            self.input.lookahead(2);
        }
        Ok(false)
    }

    /// Decode the escape sequence starting at the current `\`.
    fn resolve_flow_scalar_escape_sequence(
        &mut self,
        start_mark: &Marker,
    ) -> Result<char, ScanError> {
        let code_length = match self.input.peek_nth(1) {
            'x' => 2,
            'u' => 4,
            'U' => 8,
            c => {
                let ret = match c {
                    '0' => '\0',
                    'a' => '\x07',
                    'b' => '\x08',
                    't' | '\t' => '\t',
                    'n' => '\n',
                    'v' => '\x0b',
                    'f' => '\x0c',
                    'r' => '\x0d',
                    'e' => '\x1b',
                    ' ' => ' ',
                    '"' => '"',
                    '/' => '/',
                    '\\' => '\\',
                    'N' => '\u{85}',
                    '_' => '\u{A0}',
                    'L' => '\u{2028}',
                    'P' => '\u{2029}',
                    _ => {
                        return Err(ScanError::lexical(
                            *start_mark,
                            "while parsing a quoted scalar, found unknown escape character",
                        ))
                    }
                };
                self.skip_n_non_blank(2);
                return Ok(ret);
            }
        };
        self.skip_n_non_blank(2);

        self.input.lookahead(code_length);
        let mut value = 0u32;
        for i in 0..code_length {
            let c = self.input.peek_nth(i);
            let Some(digit) = as_hex(c).filter(|_| is_hex(c)) else {
                return Err(ScanError::lexical(
                    *start_mark,
                    "while parsing a quoted scalar, did not find expected hexadecimal number",
                ));
            };
            value = (value << 4) + digit;
        }

        let Some(ch) = char::from_u32(value) else {
            return Err(ScanError::lexical(
                *start_mark,
                "while parsing a quoted scalar, found invalid Unicode character escape code",
            ));
        };
        self.skip_n_non_blank(code_length);
        Ok(ch)
    }

    fn fetch_plain_scalar(&mut self) -> ScanResult {
        self.save_simple_key();
        self.disallow_simple_key();

        let tok = self.scan_plain_scalar()?;

        self.tokens.push_back(tok);
        Ok(())
    }

    /// Scan a plain scalar, possibly spanning several lines.
    fn scan_plain_scalar(&mut self) -> Result<Token, ScanError> {
        self.unroll_non_block_indents();
        let indent = self.indent + 1;
        let start_mark = self.mark;
        let mut end_mark = self.mark;
        let in_flow = self.in_flow();

        if in_flow && (start_mark.col as isize) < indent {
            return Err(ScanError::lexical(
                start_mark,
                "invalid indentation in flow construct",
            ));
        }

        let mut string = String::with_capacity(32);
        let mut leading_break = String::new();
        let mut trailing_breaks = String::new();
        let mut whitespaces = String::new();

        loop {
            self.input.lookahead(4);
            if self.at_document_indicator() || self.ch() == '#' {
                break;
            }

            if in_flow && self.ch() == '-' && is_flow(self.input.peek_nth(1)) {
                return Err(ScanError::lexical(
                    self.mark,
                    "plain scalar cannot start with '-' followed by ,[]{}",
                ));
            }

            if !is_blank_or_breakz(self.ch()) && self.input.next_can_be_plain_scalar(in_flow) {
                if self.leading_whitespace {
                    if leading_break.is_empty() {
                        string.push_str(&trailing_breaks);
                    } else if trailing_breaks.is_empty() {
                        string.push(' ');
                    } else {
                        string.push_str(&trailing_breaks);
                    }
                    leading_break.clear();
                    trailing_breaks.clear();
                    self.leading_whitespace = false;
                } else if !whitespaces.is_empty() {
                    string.push_str(&whitespaces);
                    whitespaces.clear();
                }

                string.push(self.ch());
                self.skip_non_blank();
                self.input.lookahead(2);

                while !is_blank_or_breakz(self.ch()) && self.input.next_can_be_plain_scalar(in_flow)
                {
                    string.push(self.ch());
                    self.skip_non_blank();
                    self.input.lookahead(2);
                }
                end_mark = self.mark;
            }

            // The scalar ends at the end of the stream, at `: ` or at a flow indicator.
            if !(is_blank(self.ch()) || is_break(self.ch())) {
                break;
            }

            while is_blank(self.look_ch()) || is_break(self.ch()) {
                if is_blank(self.ch()) {
                    if !self.leading_whitespace {
                        whitespaces.push(self.ch());
                        self.skip_blank();
                    } else if (self.mark.col as isize) < indent && self.ch() == '\t' {
                        // Tabs in indentation are only allowed on otherwise empty lines.
                        self.skip_ws_to_eol(true)?;
                        if !is_breakz(self.ch()) {
                            return Err(ScanError::lexical(
                                start_mark,
                                "while scanning a plain scalar, found a tab",
                            ));
                        }
                    } else {
                        self.skip_blank();
                    }
                } else if self.leading_whitespace {
                    self.read_break(&mut trailing_breaks);
                } else {
                    whitespaces.clear();
                    self.read_break(&mut leading_break);
                    self.leading_whitespace = true;
                }
            }

            if !in_flow && (self.mark.col as isize) < indent {
                break;
            }
        }

        if self.leading_whitespace {
            self.allow_simple_key();
        }

        Ok(Token(
            Span::new(start_mark, end_mark),
            TokenType::Scalar(ScalarStyle::Plain, string),
        ))
    }
}
