//! Turn resolved nodes into native values.

use std::collections::{HashMap, HashSet};

use num_bigint::{BigInt, Sign};
use ordered_float::OrderedFloat;
use strata_parser::{Diagnostic, Marker, Tag};

use crate::{
    node::NodeId,
    schema::{tag, DuplicateKeys, IntOverflow, UnknownTags},
    DiagnosticSink, Document, LoadError, Mapping, NodeRef, Schema, Value,
};

/// The state of the construction of one document.
///
/// Nodes carrying an anchor are constructed once and their value is cloned for every alias. A
/// node met again while its own construction is under way cannot be constructed and fails with
/// [`LoadError::Construction`].
pub struct Construct<'a> {
    schema: &'a Schema,
    document: &'a Document,
    sink: Option<&'a mut dyn DiagnosticSink>,
    /// Values of the anchored nodes constructed so far.
    done: HashMap<NodeId, Value>,
    /// Nodes whose construction is under way.
    active: HashSet<NodeId>,
}

impl<'a> Construct<'a> {
    pub(crate) fn new(
        schema: &'a Schema,
        document: &'a Document,
        sink: Option<&'a mut dyn DiagnosticSink>,
    ) -> Self {
        Construct {
            schema,
            document,
            sink,
            done: HashMap::new(),
            active: HashSet::new(),
        }
    }

    /// Return the schema driving the construction.
    #[must_use]
    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// Return the document being constructed.
    #[must_use]
    pub fn document(&self) -> &'a Document {
        self.document
    }

    /// Report a warning to the diagnostics sink, if there is one.
    pub fn warn(&mut self, mark: Marker, message: impl Into<String>) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.report(Diagnostic::warning(mark, message));
        }
    }

    /// Construct the value of `node`, which must belong to the document being constructed.
    ///
    /// # Errors
    /// Returns an error if the node or one of its descendants cannot be resolved or constructed.
    pub fn construct(&mut self, node: NodeRef<'_>) -> Result<Value, LoadError> {
        let id = node.id();
        if let Some(value) = self.done.get(&id) {
            return Ok(value.clone());
        }
        if !self.active.insert(id) {
            return Err(LoadError::construction(
                node.mark(),
                "cannot construct a node that contains itself",
            ));
        }
        let result = self.construct_tagged(node);
        self.active.remove(&id);
        let value = result?;
        if node.anchor().is_some() {
            self.done.insert(id, value.clone());
        }
        Ok(value)
    }

    pub(crate) fn construct_document(mut self) -> Result<Value, LoadError> {
        match self.document.root() {
            Some(root) => self.construct(root),
            None => Ok(Value::Null),
        }
    }

    fn construct_tagged(&mut self, node: NodeRef<'_>) -> Result<Value, LoadError> {
        let schema = self.schema;
        let tag = node.node().resolve(schema)?;
        if let Some(constructor) = schema.constructor(tag) {
            return constructor(self, node);
        }
        match schema.unknown_tags() {
            UnknownTags::Reject => Err(LoadError::construction(
                node.mark(),
                format!("the {} schema has no constructor for `{tag}`", schema.name()),
            )),
            UnknownTags::Keep => {
                let untagged = schema.resolve_untagged(node.node())?;
                let constructor = schema.constructor(untagged).ok_or_else(|| {
                    LoadError::construction(
                        node.mark(),
                        format!(
                            "the {} schema has no constructor for `{untagged}`",
                            schema.name()
                        ),
                    )
                })?;
                let inner = constructor(self, node)?;
                let tag = node.tag().cloned().unwrap_or_else(|| Tag {
                    handle: String::new(),
                    suffix: tag.to_owned(),
                });
                Ok(Value::Tagged(tag, Box::new(inner)))
            }
        }
    }
}

/// Return the content of a scalar node, checking it against the rules for `tag`.
fn scalar<'d>(cx: &Construct<'_>, node: NodeRef<'d>, tag: &str) -> Result<&'d str, LoadError> {
    let short = tag.rsplit(':').next().unwrap_or(tag);
    let Some(value) = node.as_scalar() else {
        return Err(LoadError::construction(
            node.mark(),
            format!("!!{short} cannot be applied to a {}", node.kind()),
        ));
    };
    // Untagged scalars got their tag from these very rules.
    if node.tag().is_some() && !cx.schema().accepts(tag, value) {
        return Err(LoadError::construction(
            node.mark(),
            format!("invalid !!{short} value `{value}`"),
        ));
    }
    Ok(value)
}

pub(crate) fn construct_null(
    cx: &mut Construct<'_>,
    node: NodeRef<'_>,
) -> Result<Value, LoadError> {
    scalar(cx, node, tag::NULL).map(|_| Value::Null)
}

pub(crate) fn construct_bool(
    cx: &mut Construct<'_>,
    node: NodeRef<'_>,
) -> Result<Value, LoadError> {
    match scalar(cx, node, tag::BOOL)? {
        "true" | "True" | "TRUE" => Ok(Value::Boolean(true)),
        "false" | "False" | "FALSE" => Ok(Value::Boolean(false)),
        value => Err(LoadError::construction(
            node.mark(),
            format!("invalid !!bool value `{value}`"),
        )),
    }
}

pub(crate) fn construct_int(
    cx: &mut Construct<'_>,
    node: NodeRef<'_>,
) -> Result<Value, LoadError> {
    let value = scalar(cx, node, tag::INT)?;
    let Some(int) = parse_core_schema_int(value) else {
        return Err(LoadError::construction(
            node.mark(),
            format!("invalid !!int value `{value}`"),
        ));
    };
    if let Ok(small) = i64::try_from(&int) {
        return Ok(Value::Integer(small));
    }
    match cx.schema().int_overflow() {
        IntOverflow::BigInt => Ok(Value::BigInteger(int)),
        IntOverflow::Reject => Err(LoadError::construction(
            node.mark(),
            format!("integer `{value}` does not fit in 64 bits"),
        )),
        IntOverflow::Truncate => {
            let truncated = truncate(&int);
            cx.warn(
                node.mark(),
                format!("integer `{value}` truncated to {truncated}"),
            );
            Ok(Value::Integer(truncated))
        }
    }
}

pub(crate) fn construct_float(
    cx: &mut Construct<'_>,
    node: NodeRef<'_>,
) -> Result<Value, LoadError> {
    let value = scalar(cx, node, tag::FLOAT)?;
    parse_core_schema_fp(value)
        .map(|f| Value::FloatingPoint(OrderedFloat(f)))
        .ok_or_else(|| {
            LoadError::construction(node.mark(), format!("invalid !!float value `{value}`"))
        })
}

pub(crate) fn construct_str(
    cx: &mut Construct<'_>,
    node: NodeRef<'_>,
) -> Result<Value, LoadError> {
    scalar(cx, node, tag::STR).map(|value| Value::String(value.to_owned()))
}

pub(crate) fn construct_seq(
    cx: &mut Construct<'_>,
    node: NodeRef<'_>,
) -> Result<Value, LoadError> {
    let Some(items) = node.as_sequence() else {
        return Err(LoadError::construction(
            node.mark(),
            format!("!!seq cannot be applied to a {}", node.kind()),
        ));
    };
    items
        .map(|item| cx.construct(item))
        .collect::<Result<_, _>>()
        .map(Value::Sequence)
}

pub(crate) fn construct_map(
    cx: &mut Construct<'_>,
    node: NodeRef<'_>,
) -> Result<Value, LoadError> {
    let Some(entries) = node.as_mapping() else {
        return Err(LoadError::construction(
            node.mark(),
            format!("!!map cannot be applied to a {}", node.kind()),
        ));
    };
    let mut mapping = Mapping::with_capacity(entries.len());
    for (k, v) in entries {
        let key = cx.construct(k)?;
        let value = cx.construct(v)?;
        match mapping.get_mut(&key) {
            None => {
                mapping.insert(key, value);
            }
            Some(slot) => match cx.schema().duplicate_keys() {
                DuplicateKeys::LastWins => *slot = value,
                DuplicateKeys::Reject => {
                    let shown = k.as_scalar().map_or_else(
                        || format!("{} key", k.kind()),
                        |scalar| format!("key `{scalar}`"),
                    );
                    return Err(LoadError::construction(
                        k.mark(),
                        format!("duplicate mapping {shown}"),
                    ));
                }
            },
        }
    }
    Ok(Value::Mapping(mapping))
}

/// Parse an integer of the core schema: decimal with an optional sign, `0o` octal or `0x`
/// hexadecimal.
fn parse_core_schema_int(v: &str) -> Option<BigInt> {
    let (sign, unsigned) = match v.as_bytes().first() {
        Some(b'-') => (Sign::Minus, &v[1..]),
        Some(b'+') => (Sign::Plus, &v[1..]),
        _ => (Sign::Plus, v),
    };
    let (radix, digits) = if let Some(octal) = unsigned.strip_prefix("0o") {
        (8, octal)
    } else if let Some(hex) = unsigned.strip_prefix("0x") {
        (16, hex)
    } else {
        (10, unsigned)
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let magnitude = BigInt::parse_bytes(digits.as_bytes(), radix)?;
    Some(if sign == Sign::Minus {
        -magnitude
    } else {
        magnitude
    })
}

/// Keep the low 64 bits of `int`, in two's complement.
fn truncate(int: &BigInt) -> i64 {
    let fill = if int.sign() == Sign::Minus { 0xFF } else { 0 };
    let mut low = [fill; 8];
    for (dst, src) in low.iter_mut().zip(int.to_signed_bytes_le()) {
        *dst = src;
    }
    i64::from_le_bytes(low)
}

/// Parse the given string as a floating point according to the core schema.
///
/// See [10.2.1.4](https://yaml.org/spec/1.2.2/#10214-floating-point) for the floating point
/// definition.
///
/// # Return
/// Returns `Some` if parsing succeeds, `None` otherwise.
#[must_use]
pub fn parse_core_schema_fp(v: &str) -> Option<f64> {
    match v {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => Some(f64::NAN),
        // Test that `v` contains a digit so as not to pass in strings like `inf`,
        // which rust will parse as a float.
        _ if v.as_bytes().iter().any(u8::is_ascii_digit) => v.parse::<f64>().ok(),
        _ => None,
    }
}
