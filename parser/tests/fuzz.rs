use core::str;

use quickcheck::{quickcheck, TestResult};
use strata_parser::{Event, Parser, ScanError};

/// Run the parser through the string.
///
/// The parser is run through both the `StrInput` and `BufferedInput` variants. The resulting
/// events are then compared and must match.
///
/// # Returns
/// This function returns the events if parsing succeeds, the error the parser returned otherwise.
///
/// # Panics
/// This function panics if there is a mismatch between the 2 parser invocations with the different
/// input traits.
fn run_parser(input: &str) -> Result<Vec<Event>, ScanError> {
    let str_events: Result<Vec<_>, _> = Parser::new_from_str(input).collect();
    let iter_events: Result<Vec<_>, _> = Parser::new_from_iter(input.chars()).collect();
    assert_eq!(str_events, iter_events);
    Ok(str_events?.into_iter().map(|x| x.0).collect())
}

#[test]
fn fuzz_1() {
    // Crashing with an index out-of-bounds error.
    // In `scan_plain_scalar`, we would lookahead 1 and skip a line break, which requires a
    // lookahead of 2.
    let raw_input: &[u8] = &[
        1, 39, 110, 117, 108, 108, 34, 13, 13, 13, 13, 13, 10, 13, 13, 13, 13,
    ];
    let s = str::from_utf8(raw_input).unwrap();
    let _ = run_parser(s);
}

#[test]
fn fuzz_2() {
    // Imbalance between flow collections opened with `[`/`{` and closed with `]`/`}`.
    let raw_input: &[u8] = &[
        91, 91, 32, 101, 58, 9, 123, 63, 32, 45, 106, 101, 58, 9, 123, 63, 32, 44, 117, 101, 58, 9,
        123, 63, 32, 44, 9, 26, 58, 32, 126, 93, 8, 58, 32, 58, 10, 29, 58, 58, 58, 32, 58, 29, 63,
        32, 44, 9, 26, 58, 32, 126, 93, 8, 58, 32, 58, 10, 78, 32,
    ];
    let s = str::from_utf8(raw_input).unwrap();
    let _ = run_parser(s);
}

#[test]
fn fuzz_3() {
    // Span mismatch between `StrInput` and `BufferedInput` in block scalars, where a byte count
    // was used instead of a char count.
    let raw_input: &[u8] = &[124, 13, 32, 210, 180, 65];
    let s = str::from_utf8(raw_input).unwrap();
    let _ = run_parser(s);
}

#[test]
fn fuzz_unclosed_quote_at_document_marker() {
    assert!(run_parser("'a\n---\n").is_err());
    assert!(run_parser("\"a\n...\n").is_err());
}

#[test]
fn fuzz_recovery_always_progresses() {
    for input in ["{{{{", "- [\n- ]\n---\n]", "a: 'b\n--- c", "!<> x\n--- y", "\t- a"] {
        let mut parser = Parser::new_from_str(input);
        let mut errors = 0;
        while let Some(result) = parser.next_event() {
            match result {
                Ok((Event::StreamEnd, _)) => break,
                Ok(_) => {}
                Err(_) => {
                    errors += 1;
                    assert!(errors <= input.len(), "no progress on {input:?}");
                    parser.recover();
                }
            }
        }
    }
}

quickcheck! {
    fn inputs_agree(input: String) -> TestResult {
        let _ = run_parser(&input);
        TestResult::passed()
    }

    fn yaml_shaped_inputs_agree(pieces: Vec<u8>) -> TestResult {
        const ALPHABET: &[&str] = &[
            "a", "1", " ", "\n", "- ", ": ", "? ", "[", "]", "{", "}", ",", "'", "\"", "|", ">",
            "&x ", "*x", "!!str ", "#c", "---\n", "...\n", "  ", "\t", "\\",
        ];
        let input: String = pieces
            .iter()
            .map(|p| ALPHABET[*p as usize % ALPHABET.len()])
            .collect();
        let _ = run_parser(&input);
        TestResult::passed()
    }
}
