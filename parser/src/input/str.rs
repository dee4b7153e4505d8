//! Zero-copy input over a `&str`.

use crate::input::Input;

/// An [`Input`] reading from a borrowed string.
///
/// All characters are already available, so [`Input::lookahead`] does nothing.
#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Debug)]
pub struct StrInput<'a> {
    /// What remains to be scanned.
    rest: &'a str,
}

impl<'a> StrInput<'a> {
    /// Create a new [`StrInput`] over the given string.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    /// The part of the input that has not been consumed yet.
    #[must_use]
    pub fn remaining(&self) -> &'a str {
        self.rest
    }
}

impl Input for StrInput<'_> {
    #[inline]
    fn lookahead(&mut self, _count: usize) {}

    #[inline]
    fn peek(&self) -> char {
        self.rest.chars().next().unwrap_or('\0')
    }

    #[inline]
    fn peek_nth(&self, n: usize) -> char {
        self.rest.chars().nth(n).unwrap_or('\0')
    }

    #[inline]
    fn skip(&mut self) {
        let mut chars = self.rest.chars();
        chars.next();
        self.rest = chars.as_str();
    }

    #[inline]
    fn skip_n(&mut self, count: usize) {
        let offset = self
            .rest
            .char_indices()
            .nth(count)
            .map_or(self.rest.len(), |(offset, _)| offset);
        self.rest = &self.rest[offset..];
    }
}
