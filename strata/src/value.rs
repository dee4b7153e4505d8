//! Native values constructed from YAML documents.

use std::{fmt, ops::Index};

use hashlink::LinkedHashMap;
use num_bigint::BigInt;
use ordered_float::OrderedFloat;
use strata_parser::Tag;

use crate::{LoadError, Loader};

/// The type of [`Value::Sequence`].
pub type Sequence = Vec<Value>;

/// The type of [`Value::Mapping`]. Entries iterate in document order.
pub type Mapping = LinkedHashMap<Value, Value>;

/// The native value of a YAML node.
///
/// # Examples
///
/// ```
/// use strata::Value;
///
/// let value = Value::load_single_from_str("{port: 8080, hosts: [a, b]}").unwrap();
/// assert_eq!(value["port"].as_integer(), Some(8080));
/// assert_eq!(value["hosts"][1].as_str(), Some("b"));
/// assert!(value.get("missing").is_none());
/// ```
#[derive(Clone, PartialEq, PartialOrd, Debug, Eq, Ord, Hash)]
pub enum Value {
    /// `!!null`.
    Null,
    /// `!!bool`.
    Boolean(bool),
    /// `!!int`, when it fits in 64 bits.
    Integer(i64),
    /// `!!int`, when it does not fit in 64 bits and the schema keeps it whole.
    BigInteger(BigInt),
    /// `!!float`.
    FloatingPoint(OrderedFloat<f64>),
    /// `!!str`.
    String(String),
    /// `!!seq`.
    Sequence(Sequence),
    /// `!!map`.
    Mapping(Mapping),
    /// A node whose tag has no constructor, constructed as if it were untagged.
    Tagged(Tag, Box<Value>),
}

/// A key into a [`Value`], see [`Value::get`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Accessor {
    /// A string key of a mapping.
    Field(String),
    /// An index into a sequence, or an integer key of a mapping.
    Index(usize),
}

impl From<usize> for Accessor {
    fn from(val: usize) -> Self {
        Accessor::Index(val)
    }
}

impl From<&str> for Accessor {
    fn from(val: &str) -> Self {
        Accessor::Field(val.to_owned())
    }
}

impl From<String> for Accessor {
    fn from(val: String) -> Self {
        Accessor::Field(val)
    }
}

impl Value {
    define_as!(as_bool, bool, Boolean);
    define_as!(as_integer, i64, Integer);
    define_as_pattern!(as_floating_point, f64 => Self::FloatingPoint(v) => Some(v.into_inner()));
    define_as_ref!(as_str, &str, String);
    define_as_ref!(as_big_integer, &BigInt, BigInteger);
    define_as_ref!(as_sequence, &Sequence, Sequence);
    define_as_ref!(as_mapping, &Mapping, Mapping);
    define_as_ref_pattern!(as_tagged, (&Tag, &Value) => Self::Tagged(tag, value) => Some((tag, &**value)));

    define_as_ref_mut!(as_sequence_mut, &mut Sequence, Sequence);
    define_as_ref_mut!(as_mapping_mut, &mut Mapping, Mapping);

    define_into!(into_bool, bool, Boolean);
    define_into!(into_integer, i64, Integer);
    define_into_pattern!(into_floating_point, f64 => Self::FloatingPoint(v) => Some(v.into_inner()));
    define_into!(into_string, String, String);
    define_into!(into_sequence, Sequence, Sequence);
    define_into!(into_mapping, Mapping, Mapping);

    define_is!(is_null, Self::Null);
    define_is!(is_boolean, Self::Boolean(_));
    define_is!(is_integer, Self::Integer(_));
    define_is!(is_big_integer, Self::BigInteger(_));
    define_is!(is_floating_point, Self::FloatingPoint(_));
    define_is!(is_string, Self::String(_));
    define_is!(is_sequence, Self::Sequence(_));
    define_is!(is_mapping, Self::Mapping(_));
    define_is!(is_tagged, Self::Tagged(..));

    /// Load the values of every document of a YAML stream, with the core schema.
    ///
    /// # Errors
    /// Returns the first error met. See [`Loader::load_from_str`].
    pub fn load_from_str(source: &str) -> Result<Vec<Value>, LoadError> {
        Loader::new().load_from_str(source)
    }

    /// Load the value of a stream holding exactly one document, with the core schema.
    ///
    /// # Errors
    /// Returns [`LoadError::DocumentCount`] if the stream does not hold exactly one document, or
    /// the first error met. See [`Loader::load_single_from_str`].
    pub fn load_single_from_str(source: &str) -> Result<Value, LoadError> {
        Loader::new().load_single_from_str(source)
    }

    /// Return the value without its [`Value::Tagged`] wrappers.
    #[must_use]
    pub fn untagged(&self) -> &Value {
        let mut value = self;
        while let Value::Tagged(_, inner) = value {
            value = inner;
        }
        value
    }

    /// Access an item of a sequence or an entry of a mapping.
    ///
    /// Integer accessors index sequences and look up integer keys in mappings. String
    /// accessors look up string keys in mappings.
    ///
    /// # Return
    /// Returns `None` if `self` is not a collection or the key is absent.
    pub fn get(&self, key: impl Into<Accessor>) -> Option<&Value> {
        match (self, key.into()) {
            (Value::Sequence(items), Accessor::Index(idx)) => items.get(idx),
            (Value::Mapping(map), Accessor::Index(idx)) => {
                map.get(&Value::Integer(i64::try_from(idx).ok()?))
            }
            (Value::Mapping(map), Accessor::Field(field)) => map.get(&Value::String(field)),
            _ => None,
        }
    }

    /// Return the number of items or entries of a collection, `0` for any other value.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Value::Sequence(items) => items.len(),
            Value::Mapping(map) => map.len(),
            _ => 0,
        }
    }

    /// Return whether the value is not a collection or an empty one.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'key> Index<&'key str> for Value {
    type Output = Value;

    /// Perform indexing if `self` is a mapping.
    ///
    /// # Panics
    /// This function panics if the key given does not exist within `self` (as per [`Index`]).
    ///
    /// This function also panics if `self` is not a [`Value::Mapping`].
    fn index(&self, idx: &'key str) -> &Value {
        match self {
            Value::Mapping(map) => map
                .get(&Value::String(idx.to_owned()))
                .unwrap_or_else(|| panic!("Key '{idx}' not found in mapping")),
            _ => panic!("Attempt to index value with '{idx}' but it's not a mapping"),
        }
    }
}

impl Index<usize> for Value {
    type Output = Value;

    /// Perform indexing if `self` is a sequence or a mapping.
    ///
    /// # Panics
    /// This function panics if the index given is out of range (as per [`Index`]). If `self` is a
    /// [`Value::Sequence`], this is when the index is bigger or equal to the length of the
    /// underlying `Vec`. If `self` is a [`Value::Mapping`], this is when the mapping does not
    /// contain [`Value::Integer`]`(idx)` as a key.
    ///
    /// This function also panics if `self` is not a [`Value::Sequence`] nor a [`Value::Mapping`].
    fn index(&self, idx: usize) -> &Value {
        match self {
            Value::Sequence(items) => items
                .get(idx)
                .unwrap_or_else(|| panic!("Index {idx} out of bounds in sequence")),
            Value::Mapping(map) => {
                let key = i64::try_from(idx)
                    .unwrap_or_else(|_| panic!("Attempt to index mapping with overflowing index"));
                map.get(&Value::Integer(key))
                    .unwrap_or_else(|| panic!("Key '{idx}' not found in mapping"))
            }
            _ => panic!("Attempt to index value with {idx} but it's not a mapping nor a sequence"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::FloatingPoint(OrderedFloat(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Value {
    /// Write the value in YAML flow style. Floats use their canonical forms.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::BigInteger(i) => write!(f, "{i}"),
            Value::FloatingPoint(v) => {
                let v = v.into_inner();
                if v.is_nan() {
                    f.write_str(".nan")
                } else if v.is_infinite() {
                    f.write_str(if v > 0.0 { ".inf" } else { "-.inf" })
                } else if v == 0.0 {
                    f.write_str("0")
                } else {
                    write!(f, "{v:e}")
                }
            }
            Value::String(s) => write!(f, "{s:?}"),
            Value::Sequence(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Mapping(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Tagged(tag, value) => write!(f, "!<{tag}> {value}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Value;

    #[test]
    fn test_accessors() {
        let value = Value::from(vec![Value::Integer(1), Value::from("two"), Value::from(3.5_f64)]);
        assert!(value.is_sequence());
        assert_eq!(value.len(), 3);
        assert_eq!(value[0].as_integer(), Some(1));
        assert_eq!(value[1].as_str(), Some("two"));
        assert_eq!(value[2].as_floating_point(), Some(3.5));
        assert_eq!(value.get(3), None);
        assert_eq!(value.get("a"), None);
        assert!(value[1].as_integer().is_none());
        assert_eq!(value.into_sequence().map(|items| items.len()), Some(3));
    }

    #[test]
    fn test_untagged() {
        let tag = strata_parser::Tag {
            handle: "!".into(),
            suffix: "point".into(),
        };
        let value = Value::Tagged(tag.clone(), Box::new(Value::Integer(3)));
        assert!(value.is_tagged());
        assert_eq!(value.untagged(), &Value::Integer(3));
        let (found, inner) = value.as_tagged().unwrap();
        assert_eq!(found, &tag);
        assert!(inner.is_integer());
    }

    #[test]
    fn test_display() {
        let value = Value::from(vec![
            Value::Null,
            Value::from(f64::NEG_INFINITY),
            Value::from(0.0_f64),
            Value::from(2.3e4_f64),
            Value::from("a b"),
        ]);
        assert_eq!(value.to_string(), r#"[null, -.inf, 0, 2.3e4, "a b"]"#);
        assert_eq!(Value::from(f64::NAN).to_string(), ".nan");
    }

    #[test]
    #[should_panic(expected = "Key 'nope' not found in mapping")]
    fn test_index_missing_key() {
        let value = Value::load_single_from_str("a: 1").unwrap();
        let _ = &value["nope"];
    }
}
