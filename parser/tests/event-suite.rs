//! Data-driven event tests.
//!
//! Each `tests/cases/<name>.yaml` comes with either `<name>.events`, the expected event tree in
//! the notation of the YAML test suite, or `<name>.error`, naming the kind of error the input
//! must fail with (`lexical`, `syntax` or `directive`).

use std::{
    fs,
    path::{Path, PathBuf},
};

use libtest_mimic::{Arguments, Failed, Trial};

use strata_parser::{
    CollectionStyle, ErrorKind, Event, NodeProps, Parser, ScalarStyle, ScanError, Span,
    SpannedEventReceiver,
};

type Result<T, E = Box<dyn std::error::Error>> = std::result::Result<T, E>;

enum Expected {
    Events(String),
    Error(ErrorKind),
}

struct Case {
    yaml: String,
    expected: Expected,
}

fn main() -> Result<()> {
    let arguments = Arguments::from_args();
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/cases");
    let mut trials = vec![];
    for path in yaml_files(&dir)? {
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or("unexpected file name")?
            .to_owned();
        let case = load_case(&path)?;
        trials.push(Trial::test(name, move || run_case(&case)));
    }
    trials.sort_by(|a, b| a.name().cmp(b.name()));

    libtest_mimic::run(&arguments, trials).exit();
}

fn yaml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = vec![];
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "yaml") {
            files.push(path);
        }
    }
    Ok(files)
}

fn load_case(path: &Path) -> Result<Case> {
    let yaml = fs::read_to_string(path)?;
    let events = path.with_extension("events");
    let error = path.with_extension("error");
    let expected = if events.exists() {
        Expected::Events(fs::read_to_string(events)?)
    } else if error.exists() {
        Expected::Error(match fs::read_to_string(error)?.trim() {
            "lexical" => ErrorKind::Lexical,
            "syntax" => ErrorKind::Syntax,
            "directive" => ErrorKind::Directive,
            other => return Err(format!("unknown error kind `{other}`").into()),
        })
    } else {
        return Err(format!("{} has no .events nor .error file", path.display()).into());
    };
    Ok(Case { yaml, expected })
}

fn run_case(case: &Case) -> Result<(), Failed> {
    match (parse_to_events(&case.yaml), &case.expected) {
        (Ok(reporter), Expected::Events(tree)) => {
            if let Some(diff) = events_differ(&reporter.events, tree) {
                return Err(format!("events differ: {diff}\n### Input:\n{}", case.yaml).into());
            }
            if let Some(failure) = reporter.span_failures.first() {
                return Err(failure.clone().into());
            }
            Ok(())
        }
        (Ok(reporter), Expected::Error(kind)) => Err(format!(
            "no error when expected a {kind}, got {:#?}",
            reporter.events
        )
        .into()),
        (Err(e), Expected::Events(_)) => Err(format!("unexpected error: {e}").into()),
        (Err(e), Expected::Error(kind)) if e.kind() == *kind => Ok(()),
        (Err(e), Expected::Error(kind)) => {
            Err(format!("expected a {kind}, got a {}: {e}", e.kind()).into())
        }
    }
}

fn parse_to_events(source: &str) -> Result<EventReporter, ScanError> {
    let str_events: Result<Vec<_>, _> = Parser::new_from_str(source).collect();
    let iter_events: Result<Vec<_>, _> = Parser::new_from_iter(source.chars()).collect();

    // Both inputs must agree on the events, or on the error.
    assert_eq!(str_events, iter_events);

    let mut reporter = EventReporter::default();
    for (ev, span) in str_events? {
        reporter.on_event(ev, span);
    }
    Ok(reporter)
}

/// A [`SpannedEventReceiver`] rendering events as a tree and checking spans are ordered.
#[derive(Default)]
struct EventReporter {
    events: Vec<String>,
    last_span: Option<(Event, Span)>,
    span_failures: Vec<String>,
}

impl SpannedEventReceiver for EventReporter {
    fn on_event(&mut self, ev: Event, span: Span) {
        if let Some((last_ev, last_span)) = self.last_span.take() {
            if span.start.index() < last_span.start.index() {
                self.span_failures.push(format!(
                    "event {ev:?}@{span:?} came before event {last_ev:?}@{last_span:?}"
                ));
            }
        }
        self.last_span = Some((ev.clone(), span));

        let line = match ev {
            Event::StreamStart => "+STR".to_owned(),
            Event::StreamEnd => "-STR".to_owned(),
            Event::DocumentStart(explicit, _) => {
                if explicit { "+DOC ---" } else { "+DOC" }.to_owned()
            }
            Event::DocumentEnd(explicit) => if explicit { "-DOC ..." } else { "-DOC" }.to_owned(),
            Event::SequenceStart(style, props) => {
                let brackets = if style == CollectionStyle::Flow { " []" } else { "" };
                format!("+SEQ{brackets}{}", format_props(&props))
            }
            Event::SequenceEnd => "-SEQ".to_owned(),
            Event::MappingStart(style, props) => {
                let braces = if style == CollectionStyle::Flow { " {}" } else { "" };
                format!("+MAP{braces}{}", format_props(&props))
            }
            Event::MappingEnd => "-MAP".to_owned(),
            Event::Scalar(text, style, props) => {
                let kind = match style {
                    ScalarStyle::Plain => ":",
                    ScalarStyle::SingleQuoted => "'",
                    ScalarStyle::DoubleQuoted => "\"",
                    ScalarStyle::Literal => "|",
                    ScalarStyle::Folded => ">",
                };
                format!("=VAL{} {kind}{}", format_props(&props), escape_text(&text))
            }
            Event::Alias(name) => format!("=ALI *{name}"),
        };
        self.events.push(line);
    }
}

fn format_props(props: &NodeProps) -> String {
    let mut out = String::new();
    if let Some(anchor) = &props.anchor {
        out.push_str(" &");
        out.push_str(anchor);
    }
    if let Some(tag) = &props.tag {
        out.push_str(&format!(" <{}>", tag.uri()));
    }
    out
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str(r"\\"),
            '\n' => escaped.push_str(r"\n"),
            '\r' => escaped.push_str(r"\r"),
            '\x08' => escaped.push_str(r"\b"),
            '\t' => escaped.push_str(r"\t"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn events_differ(actual: &[String], expected: &str) -> Option<String> {
    let expected: Vec<&str> = expected
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    for (idx, pair) in actual.iter().map(String::as_str).zip(&expected).enumerate() {
        if pair.0 != *pair.1 {
            return Some(format!(
                "line {idx} differs:\n=> expected `{}`\n=>    found `{}`",
                pair.1, pair.0
            ));
        }
    }
    match actual.len().cmp(&expected.len()) {
        std::cmp::Ordering::Equal => None,
        std::cmp::Ordering::Greater => Some(format!("extra actual line: {:?}", actual[expected.len()])),
        std::cmp::Ordering::Less => Some(format!("extra expected line: {:?}", expected[actual.len()])),
    }
}
