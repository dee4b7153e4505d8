// Copyright 2015, Yuheng Chen.
// Copyright 2023, Ethiraric.
// See the LICENSE file at the top-level directory of this distribution.

//! YAML 1.2 scanner and event parser in pure Rust.
//!
//! **If you want to load YAML into native values or inspect the node graph of a document, use
//! `strata` instead of `strata-parser`. This crate contains only the parser.**
//!
//! This crate turns a stream of characters into a stream of YAML events: stream and document
//! boundaries, scalars, collections and aliases, each with its [`Span`] in the source. Tag
//! shorthands are expanded using the `%TAG` directives of each document. No schema is applied;
//! every scalar is delivered as the string that was written.
//!
//! # Usage
//!
//! ```
//! use strata_parser::{Event, Parser};
//!
//! let events: Vec<Event> = Parser::new_from_str("- a\n- b")
//!     .map(|ev| ev.map(|(ev, _span)| ev))
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(events.len(), 8);
//! ```
//!
//! Input may be a `&str` ([`Parser::new_from_str`]) or any iterator of `char`s
//! ([`Parser::new_from_iter`]), which is only pulled as far as parsing requires.
//!
//! # Features
//!
//! #### `debug_prints`
//! Enables the `debug` module and usage of debug prints in the scanner and the parser. Traces
//! are written to stderr when the `STRATA_DEBUG` environment variable is set. Do not enable if
//! you are consuming the crate rather than working on it as this can significantly decrease
//! performance.

#![warn(missing_docs, clippy::pedantic)]

mod char_traits;
#[macro_use]
mod debug;
mod diagnostic;
pub mod input;
mod parser;
mod scanner;

pub use crate::diagnostic::{Diagnostic, Severity};
pub use crate::input::{str::StrInput, BufferedInput, Input};
pub use crate::parser::{
    CollectionStyle, Directives, Event, EventReceiver, NodeProps, ParseResult, Parser,
    SpannedEventReceiver, Tag, TagDirective, Version, CORE_SCHEMA_PREFIX,
};
pub use crate::scanner::{
    ErrorKind, Marker, ScalarStyle, ScanError, Scanner, Span, TagToken, Token, TokenType,
};
