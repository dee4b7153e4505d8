//! Drive the loading pipeline over a stream of documents.

use std::fmt;

use strata_parser::{BufferedInput, Diagnostic, Input, Parser, StrInput};

use crate::{Composer, Document, LoadError, Schema, Value};

/// A collector for the warnings and errors met while loading.
///
/// When a [`Loader`] has a sink, errors no longer abort the stream: they are reported and
/// loading resumes with the next document.
///
/// ```
/// use strata::{Diagnostic, Loader};
///
/// let mut diagnostics: Vec<Diagnostic> = Vec::new();
/// let values = Loader::new()
///     .with_sink(&mut diagnostics)
///     .load_from_str("\"open\n--- ok\n")
///     .unwrap();
/// assert_eq!(values.len(), 1);
/// assert_eq!(diagnostics.len(), 1);
/// ```
pub trait DiagnosticSink {
    /// Collect a diagnostic.
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<F: FnMut(Diagnostic)> DiagnosticSink for F {
    fn report(&mut self, diagnostic: Diagnostic) {
        self(diagnostic);
    }
}

/// Configure and run the loading of YAML streams.
///
/// A loader is a one-shot builder: pick a schema and, optionally, a diagnostics sink, then call
/// one of the loading methods.
///
/// ```
/// use strata::{Loader, Schema};
///
/// let values = Loader::new()
///     .with_schema(Schema::failsafe())
///     .load_from_str("[1, 2, 3]")
///     .unwrap();
/// assert_eq!(values[0][0].as_str(), Some("1"));
/// ```
pub struct Loader<'s> {
    schema: &'s Schema,
    sink: Option<&'s mut dyn DiagnosticSink>,
}

impl Default for Loader<'_> {
    fn default() -> Self {
        Self {
            schema: Schema::core(),
            sink: None,
        }
    }
}

impl fmt::Debug for Loader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("schema", &self.schema.name())
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl<'s> Loader<'s> {
    /// Create a loader with the core schema and no diagnostics sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve and construct with `schema`.
    #[must_use]
    pub fn with_schema(mut self, schema: &'s Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Report warnings and errors to `sink` and keep loading past failed documents.
    #[must_use]
    pub fn with_sink(mut self, sink: &'s mut dyn DiagnosticSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Lazily compose and resolve the documents of `source`.
    pub fn documents_from_str<'i>(self, source: &'i str) -> Documents<'s, StrInput<'i>> {
        Documents::new(Parser::new_from_str(source), self)
    }

    /// Lazily compose and resolve the documents of a stream of characters.
    ///
    /// Characters are pulled from `source` only as documents are requested.
    pub fn documents_from_iter<I: Iterator<Item = char>>(
        self,
        source: I,
    ) -> Documents<'s, BufferedInput<I>> {
        Documents::new(Parser::new_from_iter(source), self)
    }

    /// Load the values of every document of `source`.
    ///
    /// # Errors
    /// Without a sink, returns the first error met. With a sink, failed documents are reported
    /// and skipped and this function does not fail.
    pub fn load_from_str(self, source: &str) -> Result<Vec<Value>, LoadError> {
        self.documents_from_str(source).into_values()
    }

    /// Load the value of the single document of `source`.
    ///
    /// # Errors
    /// Returns [`LoadError::DocumentCount`] if `source` does not hold exactly one document, and
    /// any error met while loading it.
    pub fn load_single_from_str(self, source: &str) -> Result<Value, LoadError> {
        let schema = self.schema;
        let mut documents = self.documents_from_str(source);
        let document = documents.single()?;
        match documents.sink.as_deref_mut() {
            Some(sink) => document.construct_with(schema, sink),
            None => document.construct(schema),
        }
    }

    /// Compose and resolve the single document of `source`, without constructing it.
    ///
    /// # Errors
    /// Returns [`LoadError::DocumentCount`] if `source` does not hold exactly one document, and
    /// any error met while composing or resolving it.
    pub fn single_document_from_str(self, source: &str) -> Result<Document, LoadError> {
        self.documents_from_str(source).single()
    }

    /// Detect the encoding of `bytes`, decode them and load the values of every document.
    ///
    /// # Errors
    /// Returns a [`LoadError::Lexical`] if the bytes cannot be decoded. See
    /// [`Loader::load_from_str`] for other errors.
    #[cfg(feature = "encoding")]
    pub fn load_from_slice(self, bytes: &[u8]) -> Result<Vec<Value>, LoadError> {
        let source = crate::encoding::decode(bytes, None)?;
        self.load_from_str(&source)
    }
}

/// A lazy iterator over the documents of a stream.
///
/// Each item is a document that was composed and whose tags were resolved with the schema of
/// the [`Loader`] it was created from. Without a diagnostics sink, the iterator stops after
/// yielding the first error.
pub struct Documents<'s, T: Input> {
    parser: Parser<T>,
    schema: &'s Schema,
    sink: Option<&'s mut dyn DiagnosticSink>,
    done: bool,
}

impl<'s, T: Input> Documents<'s, T> {
    fn new(parser: Parser<T>, loader: Loader<'s>) -> Self {
        Self {
            parser,
            schema: loader.schema,
            sink: loader.sink,
            done: false,
        }
    }

    /// Return the schema documents are resolved with.
    #[must_use]
    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Construct the native value of `document`, reporting warnings to the sink.
    ///
    /// # Errors
    /// See [`Document::construct`].
    pub fn construct(&mut self, document: &Document) -> Result<Value, LoadError> {
        match self.sink.as_deref_mut() {
            Some(sink) => document.construct_with(self.schema, sink),
            None => document.construct(self.schema),
        }
    }

    /// Construct the values of the remaining documents.
    fn into_values(mut self) -> Result<Vec<Value>, LoadError> {
        let mut values = Vec::new();
        while let Some(document) = self.next() {
            match self.construct(&document?) {
                Ok(value) => values.push(value),
                Err(error) => self.report(error)?,
            }
        }
        Ok(values)
    }

    /// Return the only remaining document.
    fn single(&mut self) -> Result<Document, LoadError> {
        let Some(first) = self.next().transpose()? else {
            return Err(LoadError::DocumentCount {
                mark: self.parser.mark(),
                found: 0,
            });
        };
        match self.next().transpose()? {
            None => Ok(first),
            Some(second) => Err(LoadError::DocumentCount {
                mark: second.span().start,
                found: 2 + self.by_ref().filter(Result::is_ok).count(),
            }),
        }
    }

    /// Hand `error` to the sink, or give it back if there is none.
    fn report(&mut self, error: LoadError) -> Result<(), LoadError> {
        match self.sink.as_deref_mut() {
            Some(sink) => {
                sink.report(error.to_diagnostic());
                Ok(())
            }
            None => Err(error),
        }
    }

    fn flush_warnings(&mut self) {
        let diagnostics = self.parser.take_diagnostics();
        if let Some(sink) = self.sink.as_deref_mut() {
            for diagnostic in diagnostics {
                sink.report(diagnostic);
            }
        }
    }

    fn next_document(&mut self) -> Result<Option<Document>, LoadError> {
        let Some(document) = Composer::compose(&mut self.parser)? else {
            return Ok(None);
        };
        document.resolve(self.schema)?;
        Ok(Some(document))
    }
}

impl<T: Input> Iterator for Documents<'_, T> {
    type Item = Result<Document, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let result = self.next_document();
            self.flush_warnings();
            match result {
                Ok(Some(document)) => return Some(Ok(document)),
                Ok(None) => self.done = true,
                Err(error) => {
                    let scan_error = error.is_scan_error();
                    if let Err(error) = self.report(error) {
                        self.done = true;
                        return Some(Err(error));
                    }
                    if scan_error {
                        self.parser.recover();
                    }
                }
            }
        }
        None
    }
}

impl<T: Input> fmt::Debug for Documents<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Documents")
            .field("schema", &self.schema.name())
            .field("sink", &self.sink.is_some())
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}
