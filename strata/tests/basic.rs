#![allow(clippy::bool_assert_comparison)]
#![allow(clippy::float_cmp)]

use strata::{LoadError, Schema, Value};

#[test]
fn test_api() {
    let s = "
# from yaml-cpp example
- name: Ogre
  position: [0, 5, 0]
  powers:
    - name: Club
      damage: 10
    - name: Fist
      damage: 8
- name: Dragon
  position: [1, 0, 10]
  powers:
    - name: Fire Breath
      damage: 25
    - name: Claws
      damage: 15
- name: Wizard
  position: [5, -3, 0]
  powers:
    - name: Acid Rain
      damage: 50
    - name: Staff
      damage: 3
";
    let docs = Value::load_from_str(s).unwrap();
    let doc = &docs[0];

    assert_eq!(doc[0]["name"].as_str().unwrap(), "Ogre");
    assert_eq!(doc[1]["powers"][0]["damage"].as_integer().unwrap(), 25);
    assert_eq!(doc[2]["position"][1].as_integer().unwrap(), -3);
    assert_eq!(doc.len(), 3);
}

#[test]
fn test_coerce() {
    let s = "---
a: 1
b: 2.2
c: [1, 2]
";
    let out = Value::load_from_str(s).unwrap();
    let doc = &out[0];
    assert_eq!(doc["a"].as_integer().unwrap(), 1i64);
    assert_eq!(doc["b"].as_floating_point().unwrap(), 2.2f64);
    assert_eq!(doc["c"][1].as_integer().unwrap(), 2i64);
    assert!(doc.get("d").is_none());
}

#[test]
fn test_anchor() {
    let s = "
a1: &DEFAULT
    b1: 4
    b2: d
a2: *DEFAULT
";
    let out = Value::load_from_str(s).unwrap();
    let doc = &out[0];
    assert_eq!(doc["a2"]["b1"].as_integer().unwrap(), 4);
    assert_eq!(doc["a1"], doc["a2"]);
}

#[test]
fn test_bad_anchor() {
    let s = "
a1: &DEFAULT
    b1: 4
    b2: *DEFAULT
";
    // The graph composes, but it cannot be turned into a tree.
    let doc = strata::load_single(s).unwrap();
    assert!(doc.is_cyclic());
    let err = doc.construct(Schema::core()).unwrap_err();
    assert!(matches!(err, LoadError::Construction { .. }));
    assert!(Value::load_from_str(s).is_err());
}

#[test]
fn test_plain_datatype() {
    let s = "
- 'string'
- \"string\"
- string
- 123
- -321
- 1.23
- -1e4
- ~
- null
- true
- false
- !!str 0
- !!int 100
- !!float 2
- !!null ~
- !!bool true
- !!bool false
- 0xFF
- 0o77
- [ 0xF, 0xF ]
- +12345
- [ true, false ]
- True
- NULL
-
- .5
- -.INF
- .NaN
";
    let out = Value::load_from_str(s).unwrap();
    let doc = &out[0];

    assert_eq!(doc[0].as_str().unwrap(), "string");
    assert_eq!(doc[1].as_str().unwrap(), "string");
    assert_eq!(doc[2].as_str().unwrap(), "string");
    assert_eq!(doc[3].as_integer().unwrap(), 123);
    assert_eq!(doc[4].as_integer().unwrap(), -321);
    assert_eq!(doc[5].as_floating_point().unwrap(), 1.23);
    assert_eq!(doc[6].as_floating_point().unwrap(), -1e4);
    assert!(doc[7].is_null());
    assert!(doc[8].is_null());
    assert_eq!(doc[9].as_bool().unwrap(), true);
    assert_eq!(doc[10].as_bool().unwrap(), false);
    assert_eq!(doc[11].as_str().unwrap(), "0");
    assert_eq!(doc[12].as_integer().unwrap(), 100);
    assert_eq!(doc[13].as_floating_point().unwrap(), 2.0);
    assert!(doc[14].is_null());
    assert_eq!(doc[15].as_bool().unwrap(), true);
    assert_eq!(doc[16].as_bool().unwrap(), false);
    assert_eq!(doc[17].as_integer().unwrap(), 255);
    assert_eq!(doc[18].as_integer().unwrap(), 63);
    assert_eq!(doc[19][0].as_integer().unwrap(), 15);
    assert_eq!(doc[19][1].as_integer().unwrap(), 15);
    assert_eq!(doc[20].as_integer().unwrap(), 12345);
    assert!(doc[21][0].as_bool().unwrap());
    assert!(!doc[21][1].as_bool().unwrap());
    assert_eq!(doc[22].as_bool().unwrap(), true);
    assert!(doc[23].is_null());
    assert!(doc[24].is_null());
    assert_eq!(doc[25].as_floating_point().unwrap(), 0.5);
    assert_eq!(doc[26].as_floating_point().unwrap(), f64::NEG_INFINITY);
    assert!(doc[27].as_floating_point().unwrap().is_nan());
}

#[test]
fn test_bad_explicit_values() {
    for s in [
        "!!int string",
        "!!float string",
        "!!bool null",
        "!!null val",
        "!!int [1]",
        "!!seq {a: b}",
    ] {
        let err = Value::load_single_from_str(s).unwrap_err();
        assert!(
            matches!(err, LoadError::Construction { .. }),
            "{s}: unexpected error {err:?}"
        );
    }
}

#[test]
fn test_plain_datatype_with_into_methods() {
    let s = "
- 'string'
- 123
- 1.23
- true
- !!str 0
- -.INF
- [a]
- {b: c}
";
    let out = Value::load_from_str(s).unwrap();
    let mut doc = out.into_iter().next().unwrap().into_sequence().unwrap().into_iter();

    assert_eq!(doc.next().unwrap().into_string().unwrap(), "string");
    assert_eq!(doc.next().unwrap().into_integer().unwrap(), 123);
    assert_eq!(doc.next().unwrap().into_floating_point().unwrap(), 1.23);
    assert_eq!(doc.next().unwrap().into_bool().unwrap(), true);
    assert_eq!(doc.next().unwrap().into_string().unwrap(), "0");
    assert_eq!(
        doc.next().unwrap().into_floating_point().unwrap(),
        f64::NEG_INFINITY
    );
    assert_eq!(doc.next().unwrap().into_sequence().unwrap().len(), 1);
    assert_eq!(doc.next().unwrap().into_mapping().unwrap().len(), 1);
    assert!(doc.next().is_none());
}

#[test]
fn test_hash_order() {
    let s = "---
b: ~
a: ~
c: ~
";
    let out = Value::load_from_str(s).unwrap();
    let first = out.into_iter().next().unwrap();
    let mut iter = first.into_mapping().unwrap().into_iter();
    assert_eq!(Some((Value::String("b".into()), Value::Null)), iter.next());
    assert_eq!(Some((Value::String("a".into()), Value::Null)), iter.next());
    assert_eq!(Some((Value::String("c".into()), Value::Null)), iter.next());
    assert_eq!(None, iter.next());
}

#[test]
fn test_integer_key() {
    let s = "
0:
    important: true
1:
    important: false
";
    let out = Value::load_from_str(s).unwrap();
    let first = out.into_iter().next().unwrap();
    assert_eq!(first[0]["important"].as_bool().unwrap(), true);
    assert_eq!(first.get(1).unwrap()["important"].as_bool().unwrap(), false);
}

#[test]
fn test_collection_keys() {
    let s = "
? [a, b]
: pair
? {x: 1}
: map
";
    let doc = Value::load_single_from_str(s).unwrap();
    let key = Value::Sequence(vec![Value::from("a"), Value::from("b")]);
    assert_eq!(doc.as_mapping().unwrap()[&key].as_str(), Some("pair"));
}

#[test]
fn test_empty_documents() {
    assert!(Value::load_from_str("").unwrap().is_empty());
    assert!(Value::load_from_str("# only a comment\n").unwrap().is_empty());
    let docs = Value::load_from_str("---\n...\n---\n").unwrap();
    assert_eq!(docs, vec![Value::Null, Value::Null]);
}

#[test]
fn test_multi_doc() {
    let s = "
'a scalar'
---
'a scalar'
---
'a scalar'
";
    let out = Value::load_from_str(s).unwrap();
    assert_eq!(out.len(), 3);
    assert!(out.iter().all(|doc| doc.as_str() == Some("a scalar")));
}

#[test]
fn test_chomping() {
    let s = "
strip: |-
  text
clip: |
  text


keep: |+
  text


folded: >
  one
  two

  three
";
    let doc = Value::load_single_from_str(s).unwrap();
    assert_eq!(doc["strip"].as_str().unwrap(), "text");
    assert_eq!(doc["clip"].as_str().unwrap(), "text\n");
    assert_eq!(doc["keep"].as_str().unwrap(), "text\n\n\n");
    assert_eq!(doc["folded"].as_str().unwrap(), "one two\nthree\n");
}

#[test]
fn test_empty_block_scalars() {
    for s in ["a: |\n\n", "a: >\n", "a: |\n  \n", "a: |+\n", "a: |\n\nb: 1\n"] {
        let doc = Value::load_single_from_str(s).unwrap();
        assert_eq!(doc["a"].as_str(), Some(""), "{s:?}");
    }
    assert_eq!(Value::load_single_from_str("|\n").unwrap().as_str(), Some(""));
    let doc = Value::load_single_from_str("a: |+\n\n").unwrap();
    assert_eq!(doc["a"].as_str(), Some("\n"));
}

#[test]
fn test_failsafe_and_core() {
    let failsafe = strata::Loader::new()
        .with_schema(Schema::failsafe())
        .load_single_from_str("[1, 2, 3]")
        .unwrap();
    assert_eq!(
        failsafe,
        Value::Sequence(vec!["1".into(), "2".into(), "3".into()])
    );
    let core = Value::load_single_from_str("[1, 2, 3]").unwrap();
    assert_eq!(
        core,
        Value::Sequence(vec![
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3)
        ])
    );
}

#[test]
fn test_invoice() {
    let s = "
--- !<tag:clarkevans.com,2002:invoice>
invoice: 34843
date   : 2001-01-23
bill-to: &id001
    given  : Chris
    family : Dumars
    address:
        lines: |
            458 Walkman Dr.
            Suite #292
        city    : Royal Oak
        state   : MI
        postal  : 48046
ship-to: *id001
product:
    - sku         : BL394D
      quantity    : 4
      description : Basketball
      price       : 450.00
    - sku         : BL4438H
      quantity    : 1
      description : Super Hoop
      price       : 2392.00
tax  : 251.42
total: 4443.52
comments:
    Late afternoon is best.
    Backup contact is Nancy
    Billsmer @ 338-4338.
";
    let doc = strata::load_single(s).unwrap();
    let root = doc.root().unwrap();
    let keys: Vec<_> = root
        .expect_mapping()
        .unwrap()
        .map(|(k, _)| k.as_scalar().unwrap())
        .collect();
    assert_eq!(
        keys,
        [
            "invoice", "date", "bill-to", "ship-to", "product", "tax", "total", "comments"
        ]
    );
    let bill_to = root.get("bill-to").unwrap();
    assert_eq!(bill_to, root.get("ship-to").unwrap());
    assert_eq!(bill_to.anchor(), Some("id001"));
    assert_eq!(
        root.resolved_tag(),
        Some("tag:clarkevans.com,2002:invoice")
    );
    assert_eq!(
        root.get("comments").unwrap().as_scalar(),
        Some("Late afternoon is best. Backup contact is Nancy Billsmer @ 338-4338.")
    );

    // The root tag is unknown to the core schema.
    assert!(doc.construct(Schema::core()).is_err());
    let lenient = Schema::core()
        .extend("lenient")
        .unknown_tags(strata::UnknownTags::Keep)
        .build()
        .unwrap();
    let value = doc.construct(&lenient).unwrap();
    let invoice = value.untagged();
    assert_eq!(invoice["invoice"].as_integer(), Some(34843));
    assert_eq!(invoice["date"].as_str(), Some("2001-01-23"));
    assert_eq!(invoice["bill-to"], invoice["ship-to"]);
    assert_eq!(
        invoice["bill-to"]["address"]["lines"].as_str(),
        Some("458 Walkman Dr.\nSuite #292\n")
    );
    assert_eq!(invoice["product"][1]["price"].as_floating_point(), Some(2392.0));
    assert_eq!(invoice["total"].as_floating_point(), Some(4443.52));
}
