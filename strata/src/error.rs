//! Errors raised while loading a stream.

use std::fmt;

use strata_parser::{Diagnostic, ErrorKind, Marker, ScanError};
use thiserror::Error;

/// The shape of a composed node.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum NodeKind {
    /// A scalar node.
    Scalar,
    /// A sequence node.
    Sequence,
    /// A mapping node.
    Mapping,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Scalar => "scalar",
            NodeKind::Sequence => "sequence",
            NodeKind::Mapping => "mapping",
        })
    }
}

/// An error that happened when loading a YAML document.
///
/// Every variant carries the position in the input the error applies to (see
/// [`LoadError::marker`]).
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum LoadError {
    /// A malformed token, or bytes that are not valid in the declared encoding.
    #[error("{0}")]
    Lexical(ScanError),
    /// A grammar violation.
    #[error("{0}")]
    Syntax(ScanError),
    /// A malformed, duplicate or unsupported directive.
    #[error("{0}")]
    Directive(ScanError),
    /// The node could not be given a tag: an unresolved alias, or a plain scalar no rule of a
    /// strict schema matches.
    #[error("{info} at {mark}")]
    Resolution {
        /// Where the node starts.
        mark: Marker,
        /// Human-readable details.
        info: String,
    },
    /// The tag of the node is known but its content cannot be turned into a native value.
    #[error("{info} at {mark}")]
    Construction {
        /// Where the node starts.
        mark: Marker,
        /// Human-readable details.
        info: String,
    },
    /// The node inspected is not of the kind the caller expected.
    #[error("expected a {expected}, found a {found} at {mark}")]
    Kind {
        /// Where the node starts.
        mark: Marker,
        /// What the caller asked for.
        expected: NodeKind,
        /// What the node is.
        found: NodeKind,
    },
    /// A single document was requested but the stream holds a different number of them.
    #[error("expected a single document, found {found} at {mark}")]
    DocumentCount {
        /// The start of the second document, or the end of the stream if there was none.
        mark: Marker,
        /// How many documents the stream holds.
        found: usize,
    },
}

impl LoadError {
    /// Create a new [`LoadError::Resolution`].
    #[must_use]
    pub fn resolution(mark: Marker, info: impl Into<String>) -> Self {
        LoadError::Resolution {
            mark,
            info: info.into(),
        }
    }

    /// Create a new [`LoadError::Construction`].
    #[must_use]
    pub fn construction(mark: Marker, info: impl Into<String>) -> Self {
        LoadError::Construction {
            mark,
            info: info.into(),
        }
    }

    /// Return the position in the input the error applies to.
    #[must_use]
    pub fn marker(&self) -> Marker {
        match self {
            LoadError::Lexical(e) | LoadError::Syntax(e) | LoadError::Directive(e) => *e.marker(),
            LoadError::Resolution { mark, .. }
            | LoadError::Construction { mark, .. }
            | LoadError::Kind { mark, .. }
            | LoadError::DocumentCount { mark, .. } => *mark,
        }
    }

    /// Whether the error was raised by the scanner or the parser.
    ///
    /// After such an error, the parser must be resynchronised before more events can be read.
    #[must_use]
    pub fn is_scan_error(&self) -> bool {
        matches!(
            self,
            LoadError::Lexical(_) | LoadError::Syntax(_) | LoadError::Directive(_)
        )
    }

    /// Turn the error into a [`Diagnostic`] for a diagnostics sink.
    #[must_use]
    pub fn to_diagnostic(&self) -> Diagnostic {
        let message = match self {
            LoadError::Lexical(e) | LoadError::Syntax(e) | LoadError::Directive(e) => {
                e.info().to_owned()
            }
            LoadError::Resolution { info, .. } | LoadError::Construction { info, .. } => {
                info.clone()
            }
            LoadError::Kind {
                expected, found, ..
            } => format!("expected a {expected}, found a {found}"),
            LoadError::DocumentCount { found, .. } => {
                format!("expected a single document, found {found}")
            }
        };
        Diagnostic::error(self.marker(), message)
    }
}

impl From<ScanError> for LoadError {
    fn from(error: ScanError) -> Self {
        match error.kind() {
            ErrorKind::Lexical => LoadError::Lexical(error),
            ErrorKind::Syntax => LoadError::Syntax(error),
            ErrorKind::Directive => LoadError::Directive(error),
        }
    }
}

/// An error in the definition of a [`Schema`].
///
/// [`Schema`]: crate::Schema
#[derive(Clone, Debug, Error)]
pub enum SchemaError {
    /// A resolver pattern is not a valid regular expression.
    #[error("invalid pattern `{pattern}` for tag `{tag}`: {source}")]
    Pattern {
        /// The pattern, as given to the builder.
        pattern: String,
        /// The tag the rule resolves to.
        tag: String,
        /// Why the pattern was rejected.
        #[source]
        source: regex::Error,
    },
    /// A tag URI is empty.
    #[error("tag URIs must not be empty")]
    EmptyTag,
    /// A resolver rule or the fallback names a tag the schema cannot construct.
    #[error("no constructor for tag `{0}`")]
    MissingConstructor(String),
}
