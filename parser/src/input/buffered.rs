//! Input pulled lazily from an iterator of characters.

use crate::input::Input;

use arraydeque::ArrayDeque;

/// The size of the [`BufferedInput`] buffer.
///
/// The longest lookahead the scanner performs is a `\UXXXXXXXX` escape (10 characters).
const BUFFER_LEN: usize = 16;

/// An [`Input`] pulling characters from an iterator.
///
/// Characters are only requested from the iterator when the scanner needs them, so the source
/// may produce its data incrementally (e.g. while decoding a stream).
#[allow(clippy::module_name_repetitions)]
pub struct BufferedInput<T: Iterator<Item = char>> {
    /// The iterator source.
    input: T,
    /// Characters pulled from `input` but not consumed yet.
    buffer: ArrayDeque<char, BUFFER_LEN>,
}

impl<T: Iterator<Item = char>> BufferedInput<T> {
    /// Create a new [`BufferedInput`] with the given input.
    pub fn new(input: T) -> Self {
        Self {
            input,
            buffer: ArrayDeque::new(),
        }
    }
}

impl<T: Iterator<Item = char>> Input for BufferedInput<T> {
    #[inline]
    fn lookahead(&mut self, count: usize) {
        let count = count.min(BUFFER_LEN);
        while self.buffer.len() < count {
            let c = self.input.next().unwrap_or('\0');
            if self.buffer.push_back(c).is_err() {
                break;
            }
        }
    }

    #[inline]
    fn peek(&self) -> char {
        self.buffer.front().copied().unwrap_or('\0')
    }

    #[inline]
    fn peek_nth(&self, n: usize) -> char {
        self.buffer.get(n).copied().unwrap_or('\0')
    }

    #[inline]
    fn skip(&mut self) {
        if self.buffer.pop_front().is_none() {
            self.input.next();
        }
    }

    #[inline]
    fn skip_n(&mut self, count: usize) {
        for _ in 0..count {
            self.skip();
        }
    }
}
