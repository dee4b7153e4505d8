//! Character classes used by the scanner.
//!
//! The names follow the productions of the YAML 1.2 specification where one exists.

/// End of input. Input sources pad with `\0` once exhausted.
#[inline]
#[must_use]
pub fn is_z(c: char) -> bool {
    c == '\0'
}

/// `b-char`: line feed or carriage return.
#[inline]
#[must_use]
pub fn is_break(c: char) -> bool {
    c == '\n' || c == '\r'
}

/// A line break or the end of input.
#[inline]
#[must_use]
pub fn is_breakz(c: char) -> bool {
    is_break(c) || is_z(c)
}

/// `s-white`: space or tab.
#[inline]
#[must_use]
pub fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Whitespace, a line break or the end of input.
#[inline]
#[must_use]
pub fn is_blank_or_breakz(c: char) -> bool {
    is_blank(c) || is_breakz(c)
}

/// `ns-dec-digit`.
#[inline]
#[must_use]
pub fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// Characters allowed in directive names and named tag handles.
#[inline]
#[must_use]
pub fn is_alpha(c: char) -> bool {
    matches!(c, '0'..='9' | 'a'..='z' | 'A'..='Z' | '_' | '-')
}

/// `ns-hex-digit`.
#[inline]
#[must_use]
pub fn is_hex(c: char) -> bool {
    c.is_ascii_hexdigit()
}

/// Value of a hexadecimal digit, if `c` is one.
#[inline]
#[must_use]
pub fn as_hex(c: char) -> Option<u32> {
    c.to_digit(16)
}

/// `c-flow-indicator`: one of `,[]{}`.
#[inline]
#[must_use]
pub fn is_flow(c: char) -> bool {
    matches!(c, ',' | '[' | ']' | '{' | '}')
}

/// The byte order mark, as decoded to a character.
#[inline]
#[must_use]
pub fn is_bom(c: char) -> bool {
    c == '\u{FEFF}'
}

/// `c-printable`, excluding the end-of-input marker.
#[must_use]
pub fn is_printable(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r' | '\x20'..='\x7E' | '\u{85}' | '\u{A0}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// `ns-char`: printable, not a break, not whitespace, not a BOM.
#[inline]
#[must_use]
pub fn is_ns_char(c: char) -> bool {
    !is_blank_or_breakz(c) && !is_bom(c)
}

/// `ns-anchor-char`: anchor and alias names exclude flow indicators.
#[inline]
#[must_use]
pub fn is_anchor_char(c: char) -> bool {
    is_ns_char(c) && !is_flow(c)
}

/// `ns-word-char`.
#[inline]
#[must_use]
pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

/// `ns-uri-char`, with `%` standing for the start of an escape.
#[inline]
#[must_use]
pub fn is_uri_char(c: char) -> bool {
    is_word_char(c) || "#;/?:@&=+$,_.!~*'()[]%".contains(c)
}

/// `ns-tag-char`: a URI character that is neither `!` nor a flow indicator.
#[inline]
#[must_use]
pub fn is_tag_char(c: char) -> bool {
    is_uri_char(c) && !is_flow(c) && c != '!'
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn anchor_chars_exclude_flow_indicators() {
        for c in [',', '[', ']', '{', '}', ' ', '\t', '\n', '\0'] {
            assert!(!is_anchor_char(c), "{c:?}");
        }
        for c in ['a', '0', '-', ':', '*', '&', '\u{e9}'] {
            assert!(is_anchor_char(c), "{c:?}");
        }
    }

    #[test]
    fn tag_chars() {
        assert!(is_tag_char('%'));
        assert!(is_tag_char(':'));
        assert!(!is_tag_char('!'));
        assert!(!is_tag_char(','));
        assert!(is_uri_char('!'));
        assert!(is_uri_char('['));
    }

    #[test]
    fn printable() {
        assert!(is_printable('a'));
        assert!(is_printable('\u{85}'));
        assert!(!is_printable('\x07'));
        assert!(!is_printable('\u{FFFE}'));
    }
}
