//! Character sources for the scanner.

pub mod buffered;
pub mod str;

#[allow(clippy::module_name_repetitions)]
pub use buffered::BufferedInput;

use crate::char_traits::{is_blank_or_breakz, is_flow};

/// Interface for a source of characters.
///
/// The scanner only ever looks a handful of characters ahead. Implementors may therefore be
/// backed by a fully materialized string or by a lazily-pulled stream, in which case characters
/// are only requested from the underlying source when the scanner needs them.
///
/// Once the source is exhausted, every read returns `\0`.
pub trait Input {
    /// Make sure the next `count` characters are available to [`Input::peek_nth`].
    ///
    /// `count` never exceeds 16. This may be a no-op for sources that hold all their data.
    fn lookahead(&mut self, count: usize);

    /// Return the next character without consuming it.
    ///
    /// The character must have been made available with [`Input::lookahead`].
    #[must_use]
    fn peek(&self) -> char;

    /// Return the `n`-th next character without consuming it (`peek_nth(0) == peek()`).
    ///
    /// The character must have been made available with [`Input::lookahead`].
    #[must_use]
    fn peek_nth(&self, n: usize) -> char;

    /// Consume the next character.
    fn skip(&mut self);

    /// Consume the next `count` characters.
    fn skip_n(&mut self, count: usize) {
        for _ in 0..count {
            self.skip();
        }
    }

    /// Load and return the next character, without consuming it.
    #[inline]
    #[must_use]
    fn look_ch(&mut self) -> char {
        self.lookahead(1);
        self.peek()
    }

    /// Whether the next character is `c`.
    #[inline]
    #[must_use]
    fn next_char_is(&self, c: char) -> bool {
        self.peek() == c
    }

    /// Whether the next 2 characters are `c1` and `c2`.
    #[inline]
    #[must_use]
    fn next_2_are(&self, c1: char, c2: char) -> bool {
        self.peek() == c1 && self.peek_nth(1) == c2
    }

    /// Whether the next 3 characters are `c1`, `c2` and `c3`.
    #[inline]
    #[must_use]
    fn next_3_are(&self, c1: char, c2: char, c3: char) -> bool {
        self.peek() == c1 && self.peek_nth(1) == c2 && self.peek_nth(2) == c3
    }

    /// Whether the next characters are a `---` or `...` marker.
    ///
    /// The caller checks the column; 4 characters must have been loaded.
    #[inline]
    #[must_use]
    fn next_is_document_indicator(&self) -> bool {
        self.next_is_document_start() || self.next_is_document_end()
    }

    /// Whether the next characters are a `---` marker.
    ///
    /// 4 characters must have been loaded.
    #[inline]
    #[must_use]
    fn next_is_document_start(&self) -> bool {
        self.next_3_are('-', '-', '-') && is_blank_or_breakz(self.peek_nth(3))
    }

    /// Whether the next characters are a `...` marker.
    ///
    /// 4 characters must have been loaded.
    #[inline]
    #[must_use]
    fn next_is_document_end(&self) -> bool {
        self.next_3_are('.', '.', '.') && is_blank_or_breakz(self.peek_nth(3))
    }

    /// Whether the next character may continue a plain scalar.
    ///
    /// `: ` ends a plain scalar everywhere; in flow context, so do flow indicators and a `:`
    /// followed by one. 2 characters must have been loaded.
    #[inline]
    #[must_use]
    fn next_can_be_plain_scalar(&self, in_flow: bool) -> bool {
        let next = self.peek_nth(1);
        match self.peek() {
            ':' if is_blank_or_breakz(next) || (in_flow && is_flow(next)) => false,
            c if in_flow && is_flow(c) => false,
            _ => true,
        }
    }
}
