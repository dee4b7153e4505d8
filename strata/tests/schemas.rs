#![allow(clippy::float_cmp)]

use std::thread;

use num_bigint::BigInt;
use strata::{
    tag, Diagnostic, DuplicateKeys, Fallback, IntOverflow, LoadError, Loader, Schema, SchemaError,
    Value,
};

fn load_with(schema: &Schema, s: &str) -> Result<Value, LoadError> {
    Loader::new().with_schema(schema).load_single_from_str(s)
}

#[test]
fn test_core_schema_resolution() {
    let cases: &[(&str, Value)] = &[
        ("null", Value::Null),
        ("~", Value::Null),
        ("true", Value::Boolean(true)),
        ("False", Value::Boolean(false)),
        ("-12", Value::Integer(-12)),
        ("0o17", Value::Integer(15)),
        ("0x1F", Value::Integer(31)),
        ("2.3e4", Value::from(23000.0_f64)),
        (".inf", Value::from(f64::INFINITY)),
        ("-.Inf", Value::from(f64::NEG_INFINITY)),
        ("hello", Value::from("hello")),
        ("yes", Value::from("yes")),
        ("0b101", Value::from("0b101")),
        ("1_000", Value::from("1_000")),
    ];
    for (input, expected) in cases {
        let value = Value::load_single_from_str(input).unwrap();
        assert_eq!(&value, expected, "{input}");
    }
    assert!(Value::load_single_from_str(".nan")
        .unwrap()
        .as_floating_point()
        .unwrap()
        .is_nan());
}

#[test]
fn test_resolved_tags() {
    let doc = strata::load_single("[~, 'x', 1, 1.5, true, {}, []]").unwrap();
    let tags: Vec<_> = doc
        .root()
        .unwrap()
        .as_sequence()
        .unwrap()
        .map(|node| node.resolved_tag().unwrap())
        .collect();
    assert_eq!(
        tags,
        [
            tag::NULL,
            tag::STR,
            tag::INT,
            tag::FLOAT,
            tag::BOOL,
            tag::MAP,
            tag::SEQ
        ]
    );
    assert_eq!(Schema::core().resolve_plain("0x1f"), Some(tag::INT));
    assert_eq!(Schema::failsafe().resolve_plain("0x1f"), Some(tag::STR));
    assert_eq!(Schema::json().resolve_plain("0x1f"), None);
}

#[test]
fn test_json_schema() {
    let json = Schema::json();
    assert_eq!(load_with(json, "null").unwrap(), Value::Null);
    assert_eq!(load_with(json, "-0").unwrap(), Value::Integer(0));
    assert_eq!(load_with(json, "1e3").unwrap(), Value::from(1000.0_f64));
    assert_eq!(load_with(json, "\"True\"").unwrap(), Value::from("True"));
    for rejected in ["True", "~", "+1", "0x1F", ".inf", "hello", "a: "] {
        let err = load_with(json, rejected).unwrap_err();
        assert!(
            matches!(err, LoadError::Resolution { .. }),
            "{rejected}: {err:?}"
        );
    }
    let err = load_with(json, "[1, hello]").unwrap_err();
    assert_eq!(
        err.to_string(),
        "no rule of the json schema matches `hello` at line 1 column 5"
    );
}

#[test]
fn test_failsafe_schema() {
    let failsafe = Schema::failsafe();
    let value = load_with(failsafe, "{a: 1, b: [true, ~]}").unwrap();
    assert_eq!(value["a"].as_str(), Some("1"));
    assert_eq!(value["b"][0].as_str(), Some("true"));
    assert_eq!(value["b"][1].as_str(), Some("~"));
    // The failsafe schema has no constructor for core tags.
    assert!(load_with(failsafe, "!!int 3").is_err());
}

#[test]
fn test_int_overflow_policies() {
    let big = "123456789012345678901234567890";
    let err = Value::load_single_from_str(big).unwrap_err();
    assert!(matches!(err, LoadError::Construction { .. }));

    let bigint = Schema::core()
        .extend("bigint")
        .int_overflow(IntOverflow::BigInt)
        .build()
        .unwrap();
    let value = load_with(&bigint, big).unwrap();
    assert_eq!(
        value.as_big_integer(),
        Some(&big.parse::<BigInt>().unwrap())
    );
    assert_eq!(
        load_with(&bigint, "-9223372036854775808").unwrap(),
        Value::Integer(i64::MIN)
    );

    let truncate = Schema::core()
        .extend("truncate")
        .int_overflow(IntOverflow::Truncate)
        .build()
        .unwrap();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let value = Loader::new()
        .with_schema(&truncate)
        .with_sink(&mut diagnostics)
        .load_single_from_str("0x1_0000_0000_0000_0001")
        .unwrap();
    // Not an integer for the core schema.
    assert!(value.is_string());
    assert!(diagnostics.is_empty());

    let value = Loader::new()
        .with_schema(&truncate)
        .with_sink(&mut diagnostics)
        .load_single_from_str("0x10000000000000001")
        .unwrap();
    assert_eq!(value, Value::Integer(1));
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].is_warning());
}

#[test]
fn test_duplicate_keys() {
    let s = "a: 1\nb: 2\na: 3\n";
    let err = Value::load_single_from_str(s).unwrap_err();
    assert_eq!(
        err.to_string(),
        "duplicate mapping key `a` at line 3 column 1"
    );

    // Keys are compared by value, not by how they were written.
    assert!(Value::load_single_from_str("{1: a, 0x1: b}").is_err());
    assert!(Value::load_single_from_str("{1: a, '1': b}").is_ok());

    let last_wins = Schema::core()
        .extend("last-wins")
        .duplicate_keys(DuplicateKeys::LastWins)
        .build()
        .unwrap();
    let value = load_with(&last_wins, s).unwrap();
    let entries: Vec<_> = value
        .as_mapping()
        .unwrap()
        .iter()
        .map(|(k, v)| (k.as_str().unwrap(), v.as_integer().unwrap()))
        .collect();
    assert_eq!(entries, [("a", 3), ("b", 2)]);
}

#[test]
fn test_builder_validation() {
    let err = Schema::builder("broken").rule("(", tag::STR).build();
    assert!(matches!(err, Err(SchemaError::Pattern { .. })));

    let err = Schema::builder("incomplete")
        .rule("x", "tag:example.com,2000:x")
        .build();
    assert!(matches!(err, Err(SchemaError::MissingConstructor(_))));

    let err = Schema::failsafe()
        .extend("no-fallback")
        .fallback(Fallback::Tag("tag:example.com,2000:nothing".into()))
        .build();
    assert!(matches!(err, Err(SchemaError::MissingConstructor(_))));

    let err = Schema::failsafe().extend("empty").rule("x", "").build();
    assert!(matches!(err, Err(SchemaError::EmptyTag)));
}

#[test]
fn test_rules_match_whole_scalars() {
    let schema = Schema::failsafe()
        .extend("answers")
        .rule("yes|no", tag::BOOL)
        .constructor(tag::BOOL, |_, node| {
            Ok(Value::Boolean(node.expect_scalar()? == "yes"))
        })
        .build()
        .unwrap();
    assert_eq!(load_with(&schema, "yes").unwrap(), Value::Boolean(true));
    assert_eq!(load_with(&schema, "no").unwrap(), Value::Boolean(false));
    assert_eq!(load_with(&schema, "yesno").unwrap(), Value::from("yesno"));
    assert_eq!(load_with(&schema, "nothing").unwrap(), Value::from("nothing"));
}

#[test]
fn test_cleared_rules() {
    let schema = Schema::core()
        .extend("words")
        .clear_rules()
        .rule("yes|no", tag::BOOL)
        .constructor(tag::BOOL, |_, node| {
            Ok(Value::Boolean(node.expect_scalar()? == "yes"))
        })
        .build()
        .unwrap();
    assert_eq!(load_with(&schema, "yes").unwrap(), Value::Boolean(true));
    // The core rules are gone, the core constructors are not.
    assert_eq!(load_with(&schema, "true").unwrap(), Value::from("true"));
    assert_eq!(load_with(&schema, "12").unwrap(), Value::from("12"));
    assert_eq!(load_with(&schema, "~").unwrap(), Value::from("~"));
    assert_eq!(load_with(&schema, "!!int 12").unwrap(), Value::Integer(12));
    assert_eq!(schema.resolve_plain("12"), Some(tag::STR));
}

#[test]
fn test_schema_is_shared_between_threads() {
    let schema = Schema::core()
        .extend("shared")
        .int_overflow(IntOverflow::BigInt)
        .build()
        .unwrap();
    let schema = &schema;
    thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                scope.spawn(move || {
                    let source = format!("n: {i}\nbig: 99999999999999999999\n");
                    load_with(schema, &source).unwrap()
                })
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            let value = handle.join().unwrap();
            assert_eq!(value["n"].as_integer(), Some(i64::try_from(i).unwrap()));
            assert!(value["big"].is_big_integer());
        }
    });
}
