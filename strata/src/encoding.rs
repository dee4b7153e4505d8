//! Encoding detection and decoding. Available only with the `encoding` feature.

use std::fmt;

use encoding_rs::{Decoder, DecoderResult};
use strata_parser::{Marker, ScanError};

use crate::LoadError;

/// The encodings a YAML stream may be written in.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Encoding {
    /// UTF-8, the default.
    Utf8,
    /// Big-endian UTF-16.
    Utf16Be,
    /// Little-endian UTF-16.
    Utf16Le,
    /// Big-endian UTF-32.
    Utf32Be,
    /// Little-endian UTF-32.
    Utf32Le,
}

impl Encoding {
    /// Guess the encoding of `bytes`.
    ///
    /// A leading byte order mark wins. Without one, the YAML stream is expected to start with an
    /// ASCII character, so the encoding is deduced from the pattern of null bytes among the first
    /// four bytes. Anything else is UTF-8.
    ///
    /// ```
    /// use strata::Encoding;
    ///
    /// assert_eq!(Encoding::detect(b"\xff\xfe\0\0"), Encoding::Utf32Le);
    /// assert_eq!(Encoding::detect(b"a\0:\0"), Encoding::Utf16Le);
    /// assert_eq!(Encoding::detect(b"a: 1"), Encoding::Utf8);
    /// ```
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Encoding {
        if let Some((encoding, _)) = Encoding::from_bom(bytes) {
            return encoding;
        }
        match bytes {
            [0, 0, 0, _, ..] => Encoding::Utf32Be,
            [_, 0, 0, 0, ..] => Encoding::Utf32Le,
            [0, _, ..] => Encoding::Utf16Be,
            [_, 0, ..] => Encoding::Utf16Le,
            _ => Encoding::Utf8,
        }
    }

    /// Return the encoding announced by the byte order mark `bytes` start with, and its length.
    #[must_use]
    pub fn from_bom(bytes: &[u8]) -> Option<(Encoding, usize)> {
        // UTF-32LE must be tested before UTF-16LE, whose mark is a prefix of its own.
        [
            Encoding::Utf32Be,
            Encoding::Utf32Le,
            Encoding::Utf16Be,
            Encoding::Utf16Le,
            Encoding::Utf8,
        ]
        .into_iter()
        .find(|encoding| bytes.starts_with(encoding.bom()))
        .map(|encoding| (encoding, encoding.bom().len()))
    }

    /// Return the byte order mark of the encoding.
    #[must_use]
    pub fn bom(self) -> &'static [u8] {
        match self {
            Encoding::Utf8 => b"\xef\xbb\xbf",
            Encoding::Utf16Be => b"\xfe\xff",
            Encoding::Utf16Le => b"\xff\xfe",
            Encoding::Utf32Be => b"\0\0\xfe\xff",
            Encoding::Utf32Le => b"\xff\xfe\0\0",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Utf16Be => "UTF-16BE",
            Encoding::Utf16Le => "UTF-16LE",
            Encoding::Utf32Be => "UTF-32BE",
            Encoding::Utf32Le => "UTF-32LE",
        })
    }
}

/// Decode `bytes` into a string, stripping the byte order mark.
///
/// If `declared` is `None`, the encoding is detected with [`Encoding::detect`].
///
/// # Errors
/// Returns a [`LoadError::Lexical`] if the byte order mark contradicts `declared` or if `bytes`
/// hold an invalid sequence. The error is positioned in the characters decoded so far.
pub fn decode(bytes: &[u8], declared: Option<Encoding>) -> Result<String, LoadError> {
    let (encoding, offset) = match (declared, Encoding::from_bom(bytes)) {
        (Some(declared), Some((found, _))) if found != declared => {
            return Err(lexical(
                Marker::new(0, 1, 0),
                format!("found a {found} byte order mark in a stream declared as {declared}"),
            ))
        }
        (_, Some(bom)) => bom,
        (Some(declared), None) => (declared, 0),
        (None, None) => (Encoding::detect(bytes), 0),
    };

    let input = &bytes[offset..];
    let mut output = String::with_capacity(input.len());
    match encoding {
        Encoding::Utf8 => decode_loop(
            input,
            offset,
            &mut output,
            &mut encoding_rs::UTF_8.new_decoder_without_bom_handling(),
        )?,
        Encoding::Utf16Be => decode_loop(
            input,
            offset,
            &mut output,
            &mut encoding_rs::UTF_16BE.new_decoder_without_bom_handling(),
        )?,
        Encoding::Utf16Le => decode_loop(
            input,
            offset,
            &mut output,
            &mut encoding_rs::UTF_16LE.new_decoder_without_bom_handling(),
        )?,
        Encoding::Utf32Be => decode_utf32(input, offset, &mut output, u32::from_be_bytes)?,
        Encoding::Utf32Le => decode_utf32(input, offset, &mut output, u32::from_le_bytes)?,
    }
    Ok(output)
}

/// Perform a loop of [`Decoder::decode_to_string_without_replacement`], reallocating `output` if
/// needed.
fn decode_loop(
    input: &[u8],
    offset: usize,
    output: &mut String,
    decoder: &mut Decoder,
) -> Result<(), LoadError> {
    let mut total_bytes_read = 0;

    loop {
        match decoder.decode_to_string_without_replacement(&input[total_bytes_read..], output, true)
        {
            // If the input is empty, we processed the whole input.
            (DecoderResult::InputEmpty, _) => break Ok(()),
            // If the output is full, we must reallocate.
            (DecoderResult::OutputFull, bytes_read) => {
                total_bytes_read += bytes_read;
                output.reserve(input.len() / 10 + 4);
            }
            (DecoderResult::Malformed(malformed_len, bytes_after_malformed), bytes_read) => {
                total_bytes_read += bytes_read;
                let malformed_len = malformed_len as usize;
                let byte_idx = total_bytes_read - (malformed_len + bytes_after_malformed as usize);
                let malformed_sequence = &input[byte_idx..byte_idx + malformed_len];
                break Err(invalid_sequence(output, offset + byte_idx, malformed_sequence));
            }
        }
    }
}

/// Decode UTF-32 code units, which `encoding_rs` does not support.
fn decode_utf32(
    input: &[u8],
    offset: usize,
    output: &mut String,
    from_bytes: fn([u8; 4]) -> u32,
) -> Result<(), LoadError> {
    let mut chunks = input.chunks_exact(4);
    for (i, chunk) in chunks.by_ref().enumerate() {
        let unit = from_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        match char::from_u32(unit) {
            Some(c) => output.push(c),
            None => return Err(invalid_sequence(output, offset + i * 4, chunk)),
        }
    }
    let rest = chunks.remainder();
    if rest.is_empty() {
        Ok(())
    } else {
        Err(invalid_sequence(output, offset + input.len() - rest.len(), rest))
    }
}

fn invalid_sequence(decoded: &str, byte_idx: usize, sequence: &[u8]) -> LoadError {
    lexical(
        end_mark(decoded),
        format!("invalid character sequence at byte {byte_idx}: {sequence:?}"),
    )
}

fn lexical(mark: Marker, info: String) -> LoadError {
    LoadError::Lexical(ScanError::lexical(mark, info))
}

/// The position right after `decoded`.
fn end_mark(decoded: &str) -> Marker {
    let mut index = 0;
    let mut line = 1;
    let mut col = 0;
    for c in decoded.chars() {
        index += 1;
        if c == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    Marker::new(index, line, col)
}
