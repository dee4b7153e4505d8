use strata_parser::{Event, EventReceiver, Parser, ScalarStyle, SpannedEventReceiver, Span};

#[derive(Clone, PartialEq, PartialOrd, Debug)]
enum TestEvent {
    OnDocumentStart,
    OnDocumentEnd,
    OnSequenceStart,
    OnSequenceEnd,
    OnMapStart,
    OnMapEnd,
    OnScalar,
    OnAlias,
    OnNull,
}

struct YamlChecker {
    pub evs: Vec<TestEvent>,
}

impl EventReceiver for YamlChecker {
    fn on_event(&mut self, ev: Event) {
        let tev = match ev {
            Event::DocumentStart(..) => TestEvent::OnDocumentStart,
            Event::DocumentEnd(_) => TestEvent::OnDocumentEnd,
            Event::SequenceStart(..) => TestEvent::OnSequenceStart,
            Event::SequenceEnd => TestEvent::OnSequenceEnd,
            Event::MappingStart(..) => TestEvent::OnMapStart,
            Event::MappingEnd => TestEvent::OnMapEnd,
            Event::Scalar(ref v, style, _) => {
                if v.is_empty() && style == ScalarStyle::Plain {
                    TestEvent::OnNull
                } else {
                    TestEvent::OnScalar
                }
            }
            Event::Alias(_) => TestEvent::OnAlias,
            _ => return, // ignore other events
        };
        self.evs.push(tev);
    }
}

fn str_to_test_events(docs: &str) -> Vec<TestEvent> {
    let mut checker = YamlChecker { evs: Vec::new() };
    Parser::new_from_str(docs)
        .load(&mut checker, true)
        .unwrap();

    let mut iter_checker = YamlChecker { evs: Vec::new() };
    Parser::new_from_iter(docs.chars())
        .load(&mut iter_checker, true)
        .unwrap();
    assert_eq!(checker.evs, iter_checker.evs);

    checker.evs
}

macro_rules! assert_next {
    ($v:expr, $p:pat) => {
        match $v.next().unwrap() {
            $p => {}
            e => {
                panic!("unexpected event: {:?} (expected {:?})", e, stringify!($p));
            }
        }
    };
}

use TestEvent::*;

#[test]
fn test_ex2_1_seq_scalars() {
    let mut v = str_to_test_events("- Mark McGwire\n- Sammy Sosa\n- Ken Griffey").into_iter();
    assert_next!(v, OnDocumentStart);
    assert_next!(v, OnSequenceStart);
    assert_next!(v, OnScalar);
    assert_next!(v, OnScalar);
    assert_next!(v, OnScalar);
    assert_next!(v, OnSequenceEnd);
    assert_next!(v, OnDocumentEnd);
    assert!(v.next().is_none());
}

#[test]
fn test_ex2_4_sequence_of_mappings() {
    let ex = "-\n  name: Mark McGwire\n  hr:   65\n  avg:  0.278\n-\n  name: Sammy Sosa\n  hr:   63\n  avg:  0.288";
    let mut v = str_to_test_events(ex).into_iter();
    assert_next!(v, OnDocumentStart);
    assert_next!(v, OnSequenceStart);
    for _ in 0..2 {
        assert_next!(v, OnMapStart);
        for _ in 0..6 {
            assert_next!(v, OnScalar);
        }
        assert_next!(v, OnMapEnd);
    }
    assert_next!(v, OnSequenceEnd);
    assert_next!(v, OnDocumentEnd);
    assert!(v.next().is_none());
}

#[test]
fn test_ex2_7_two_documents_in_a_stream() {
    let ex = "# Ranking of 1998 home runs\n---\n- Mark McGwire\n- Sammy Sosa\n- Ken Griffey\n\n# Team ranking\n---\n- Chicago Cubs\n- St Louis Cardinals";
    let mut v = str_to_test_events(ex).into_iter();
    for n in [3, 2] {
        assert_next!(v, OnDocumentStart);
        assert_next!(v, OnSequenceStart);
        for _ in 0..n {
            assert_next!(v, OnScalar);
        }
        assert_next!(v, OnSequenceEnd);
        assert_next!(v, OnDocumentEnd);
    }
    assert!(v.next().is_none());
}

#[test]
fn test_ex2_10_node_for_sammy_sosa_appears_twice() {
    let ex = "---\nhr:\n  - Mark McGwire\n  # Following node labeled SS\n  - &SS Sammy Sosa\nrbi:\n  - *SS # Subsequent occurrence\n  - Ken Griffey";
    let mut v = str_to_test_events(ex).into_iter();
    assert_next!(v, OnDocumentStart);
    assert_next!(v, OnMapStart);
    assert_next!(v, OnScalar);
    assert_next!(v, OnSequenceStart);
    assert_next!(v, OnScalar);
    assert_next!(v, OnScalar);
    assert_next!(v, OnSequenceEnd);
    assert_next!(v, OnScalar);
    assert_next!(v, OnSequenceStart);
    assert_next!(v, OnAlias);
    assert_next!(v, OnScalar);
    assert_next!(v, OnSequenceEnd);
    assert_next!(v, OnMapEnd);
    assert_next!(v, OnDocumentEnd);
    assert!(v.next().is_none());
}

#[test]
fn test_ex2_11_mapping_between_sequences() {
    let ex = "? - Detroit Tigers\n  - Chicago cubs\n:\n  - 2001-07-23\n\n? [ New York Yankees,\n    Atlanta Braves ]\n: [ 2001-07-02, 2001-08-12,\n    2001-08-14 ]";
    let mut v = str_to_test_events(ex).into_iter();
    assert_next!(v, OnDocumentStart);
    assert_next!(v, OnMapStart);
    for (k, val) in [(2, 1), (2, 3)] {
        assert_next!(v, OnSequenceStart);
        for _ in 0..k {
            assert_next!(v, OnScalar);
        }
        assert_next!(v, OnSequenceEnd);
        assert_next!(v, OnSequenceStart);
        for _ in 0..val {
            assert_next!(v, OnScalar);
        }
        assert_next!(v, OnSequenceEnd);
    }
    assert_next!(v, OnMapEnd);
    assert_next!(v, OnDocumentEnd);
    assert!(v.next().is_none());
}

#[test]
fn test_ex7_3_completely_empty_flow_nodes() {
    let mut v = str_to_test_events("{\n  ? foo :,\n  : bar,\n}").into_iter();
    assert_next!(v, OnDocumentStart);
    assert_next!(v, OnMapStart);
    assert_next!(v, OnScalar);
    assert_next!(v, OnNull);
    assert_next!(v, OnNull);
    assert_next!(v, OnScalar);
    assert_next!(v, OnMapEnd);
    assert_next!(v, OnDocumentEnd);
    assert!(v.next().is_none());
}

#[test]
fn test_ex8_18_implicit_block_mapping_entries() {
    let mut v = str_to_test_events("plain key: in-line value\n: # Both empty\n\"quoted key\":\n- entry").into_iter();
    assert_next!(v, OnDocumentStart);
    assert_next!(v, OnMapStart);
    assert_next!(v, OnScalar);
    assert_next!(v, OnScalar);
    assert_next!(v, OnNull);
    assert_next!(v, OnNull);
    assert_next!(v, OnScalar);
    assert_next!(v, OnSequenceStart);
    assert_next!(v, OnScalar);
    assert_next!(v, OnSequenceEnd);
    assert_next!(v, OnMapEnd);
    assert_next!(v, OnDocumentEnd);
    assert!(v.next().is_none());
}

#[test]
fn test_single_document_load_stops_early() {
    let mut checker = YamlChecker { evs: Vec::new() };
    let mut parser = Parser::new_from_str("a\n--- b\n--- c");
    parser.load(&mut checker, false).unwrap();
    assert_eq!(checker.evs, [OnDocumentStart, OnScalar, OnDocumentEnd]);
    parser.load(&mut checker, false).unwrap();
    assert_eq!(checker.evs.len(), 6);
}

/// Records the spans of every event it receives.
struct SpanRecorder {
    spans: Vec<Span>,
}

impl SpannedEventReceiver for SpanRecorder {
    fn on_event(&mut self, _ev: Event, span: Span) {
        self.spans.push(span);
    }
}

#[test]
fn test_spanned_receiver_sees_ordered_spans() {
    let mut recorder = SpanRecorder { spans: Vec::new() };
    Parser::new_from_str("a: [b, c]\nd: e\n")
        .load(&mut recorder, true)
        .unwrap();
    assert!(recorder
        .spans
        .windows(2)
        .all(|w| w[0].start.index() <= w[1].start.index()));
}
