use strata::{Diagnostic, IntOverflow, LoadError, Loader, Schema, Severity, Value};

#[test]
fn test_errors_stop_without_sink() {
    let s = "first\n--- *nope\n--- third\n";
    let mut docs = strata::load(s);
    assert!(docs.next().unwrap().is_ok());
    assert!(docs.next().unwrap().is_err());
    assert!(docs.next().is_none());
    assert!(Value::load_from_str(s).is_err());
}

#[test]
fn test_sink_skips_failed_documents() {
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let values = Loader::new()
        .with_sink(&mut diagnostics)
        .load_from_str("first\n--- *nope\n--- third\n")
        .unwrap();
    assert_eq!(values, [Value::from("first"), Value::from("third")]);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert_eq!(diagnostics[0].mark.line(), 2);
    assert_eq!(
        diagnostics[0].to_string(),
        "error: unresolved alias `*nope` at line 2 column 5"
    );
}

#[test]
fn test_version_warnings() {
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let values = Loader::new()
        .with_sink(&mut diagnostics)
        .load_from_str("%YAML 1.1\n--- yes\n")
        .unwrap();
    // The document is still read with YAML 1.2 rules.
    assert_eq!(values, [Value::from("yes")]);
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].is_warning());
    assert_eq!(diagnostics[0].mark.line(), 1);

    diagnostics.clear();
    Loader::new()
        .with_sink(&mut diagnostics)
        .load_from_str("%YAML 1.2\n--- yes\n")
        .unwrap();
    assert!(diagnostics.is_empty());

    // Without a sink, warnings are dropped.
    assert!(Value::load_from_str("%YAML 1.1\n--- yes\n").is_ok());
}

#[test]
fn test_construction_warnings_reach_the_sink() {
    let schema = Schema::core()
        .extend("truncate")
        .int_overflow(IntOverflow::Truncate)
        .build()
        .unwrap();
    let mut messages = Vec::new();
    let mut sink = |diagnostic: Diagnostic| messages.push(diagnostic.to_string());
    let mut docs = Loader::new()
        .with_schema(&schema)
        .with_sink(&mut sink)
        .documents_from_str("[1, 99999999999999999999]\n");
    let document = docs.next().unwrap().unwrap();
    let value = docs.construct(&document).unwrap();
    assert_eq!(value[0].as_integer(), Some(1));
    assert!(value[1].is_integer());
    assert!(docs.next().is_none());
    drop(docs);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("warning: "), "{}", messages[0]);
}

#[test]
fn test_iter_input_agrees_with_str_input() {
    let s = "
a: [1, 2, {b: c}]
d: |
  literal
---
- &x one
- *x
--- !!str 42
";
    let from_str: Vec<_> = strata::load(s).collect::<Result<_, _>>().unwrap();
    let from_iter: Vec<_> = Loader::new()
        .documents_from_iter(s.chars())
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(from_str.len(), 3);
    assert_eq!(from_iter.len(), 3);
    for (lhs, rhs) in from_str.iter().zip(&from_iter) {
        assert_eq!(lhs.span(), rhs.span());
        assert_eq!(
            lhs.construct(Schema::core()).unwrap(),
            rhs.construct(Schema::core()).unwrap()
        );
    }
}

#[test]
fn test_document_count() {
    let err = Value::load_single_from_str("a\n---\nb\n").unwrap_err();
    assert!(matches!(err, LoadError::DocumentCount { found: 2, .. }));
    assert_eq!(err.marker().line(), 2);

    let err = strata::load_single("# nothing").unwrap_err();
    assert!(matches!(err, LoadError::DocumentCount { found: 0, .. }));

    // A lone document marker is one empty document.
    assert_eq!(Value::load_single_from_str("---").unwrap(), Value::Null);
}
