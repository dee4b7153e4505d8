// Copyright 2015, Yuheng Chen.
// Copyright 2023, Ethiraric.
// See the LICENSE file at the top-level directory of this distribution.

//! YAML 1.2 loader in pure Rust.
//!
//! `strata` follows the processing model of the YAML specification. The events of
//! [`strata_parser`] are composed into a [`Document`], a graph of nodes in which aliases share
//! the node they refer to. The tags of the nodes are then resolved with a [`Schema`], and the
//! document may finally be constructed into a native [`Value`].
//!
//! # Examples
//!
//! Load every document of a stream with the core schema:
//!
//! ```
//! use strata::Value;
//!
//! let docs = Value::load_from_str("[1, 2, 3]\n--- {a: .inf}").unwrap();
//! assert_eq!(docs[0][0].as_integer(), Some(1));
//! assert_eq!(docs[1]["a"].as_floating_point(), Some(f64::INFINITY));
//! ```
//!
//! Inspect the node graph before, or instead of, constructing it:
//!
//! ```
//! use strata::Schema;
//!
//! let yaml = "
//! bill-to: &id001
//!   city: East Centerville
//! ship-to: *id001
//! ";
//! let doc = strata::load_single(yaml).unwrap();
//! let root = doc.root().unwrap();
//! let bill_to = root.get("bill-to").unwrap();
//! assert_eq!(bill_to, root.get("ship-to").unwrap());
//! assert_eq!(bill_to.anchor(), Some("id001"));
//!
//! let value = doc.construct(Schema::core()).unwrap();
//! assert_eq!(value["ship-to"]["city"].as_str(), Some("East Centerville"));
//! ```
//!
//! # Schemas
//!
//! Plain scalars without a tag are resolved by the rules of the schema: with the core schema,
//! `12` is an `!!int` and `~` is a `!!null`, while the failsafe schema leaves every scalar a
//! string. Explicit tags are kept as they are. A tag the schema has no constructor for is an
//! error when the document is constructed, unless the schema was built with
//! [`UnknownTags::Keep`], in which case the node is constructed as if it had no tag and wrapped
//! in a [`Value::Tagged`].
//!
//! Out-of-range integers, duplicate mapping keys and unknown tags are handled according to the
//! policies of the schema. See [`SchemaBuilder`].
//!
//! # Errors and diagnostics
//!
//! By default, the first error aborts loading. A [`DiagnosticSink`] given to a [`Loader`]
//! receives warnings and errors instead, and loading resumes at the next document:
//!
//! ```
//! use strata::{Diagnostic, Loader};
//!
//! let mut diagnostics: Vec<Diagnostic> = Vec::new();
//! let values = Loader::new()
//!     .with_sink(&mut diagnostics)
//!     .load_from_str("- *unknown\n--- ok\n")
//!     .unwrap();
//! assert_eq!(values.len(), 1);
//! assert_eq!(diagnostics[0].message, "unresolved alias `*unknown`");
//! ```
//!
//! # Features
//! **Note:** With all features disabled, this crate's MSRV is `1.70.0`.
//!
//! #### `encoding` (_enabled by default_)
//! Enables encoding detection and decoding of byte streams (UTF-8, UTF-16 and UTF-32), see
//! [`decode`] and [`Loader::load_from_slice`].
//!
//! #### `debug_prints`
//! Enables the debug prints of `strata-parser`.

#![warn(missing_docs, clippy::pedantic)]

#[macro_use]
mod macros;

mod composer;
mod construct;
#[cfg(feature = "encoding")]
mod encoding;
mod error;
mod loader;
mod node;
mod schema;
mod value;

// Re-export main components.
pub use crate::composer::Composer;
pub use crate::construct::{parse_core_schema_fp, Construct};
pub use crate::error::{LoadError, NodeKind, SchemaError};
pub use crate::loader::{DiagnosticSink, Documents, Loader};
pub use crate::node::{Content, Document, Node, NodeId, NodeRef, Walk};
pub use crate::schema::{
    tag, Constructor, DuplicateKeys, Fallback, IntOverflow, ResolverRule, Schema, SchemaBuilder,
    UnknownTags,
};
pub use crate::value::{Accessor, Mapping, Sequence, Value};

#[cfg(feature = "encoding")]
pub use crate::encoding::{decode, Encoding};

// Re-export from the parser
pub use strata_parser::{
    BufferedInput, CollectionStyle, Diagnostic, Input, Marker, ScalarStyle, ScanError, Severity,
    Span, StrInput, Tag, TagDirective, Version,
};

/// Lazily load the documents of `source` with the core schema.
///
/// The iterator stops after yielding the first error. Use a [`Loader`] to pick another schema or
/// to collect diagnostics.
#[must_use]
pub fn load(source: &str) -> Documents<'static, StrInput<'_>> {
    Loader::new().documents_from_str(source)
}

/// Load the single document of `source` with the core schema.
///
/// # Errors
/// Returns [`LoadError::DocumentCount`] if `source` does not hold exactly one document, and any
/// error met while composing or resolving it.
pub fn load_single(source: &str) -> Result<Document, LoadError> {
    Loader::new().single_document_from_str(source)
}
