//! Tag resolution and native construction policies.
//!
//! A [`Schema`] decides which tag a node without an explicit tag gets, and how a node with a
//! given tag becomes a [`Value`]. The three schemas of YAML 1.2 ship built in
//! ([`Schema::failsafe`], [`Schema::json`], [`Schema::core`]). Other schemas are assembled with a
//! [`SchemaBuilder`], usually starting from [`Schema::core`]:
//!
//! ```
//! use strata::{tag, Loader, Schema, Value};
//!
//! let schema = Schema::core()
//!     .extend("yes-no")
//!     .rule("yes|no", tag::BOOL)
//!     .constructor(tag::BOOL, |_, node| {
//!         let value = node.expect_scalar()?;
//!         Ok(Value::Boolean(matches!(value, "yes" | "true" | "True" | "TRUE")))
//!     })
//!     .build()
//!     .unwrap();
//! let value = Loader::new().with_schema(&schema).load_single_from_str("yes").unwrap();
//! assert_eq!(value.as_bool(), Some(true));
//! ```

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, OnceLock},
};

use regex::Regex;

use crate::{
    construct::{
        construct_bool, construct_float, construct_int, construct_map, construct_null,
        construct_seq, construct_str, Construct,
    },
    node::{Content, Node},
    LoadError, NodeRef, SchemaError, Value,
};

/// URIs of the tags defined by the YAML 1.2 schemas.
pub mod tag {
    /// `!!null`.
    pub const NULL: &str = "tag:yaml.org,2002:null";
    /// `!!bool`.
    pub const BOOL: &str = "tag:yaml.org,2002:bool";
    /// `!!int`.
    pub const INT: &str = "tag:yaml.org,2002:int";
    /// `!!float`.
    pub const FLOAT: &str = "tag:yaml.org,2002:float";
    /// `!!str`.
    pub const STR: &str = "tag:yaml.org,2002:str";
    /// `!!seq`.
    pub const SEQ: &str = "tag:yaml.org,2002:seq";
    /// `!!map`.
    pub const MAP: &str = "tag:yaml.org,2002:map";
}

/// A function turning a node of a given tag into a native value.
///
/// Constructors of collections build their children through [`Construct::construct`].
pub type Constructor =
    Arc<dyn Fn(&mut Construct<'_>, NodeRef<'_>) -> Result<Value, LoadError> + Send + Sync>;

/// Associates plain scalars matching a pattern with a tag.
#[derive(Clone, Debug)]
pub struct ResolverRule {
    source: String,
    pattern: Regex,
    tag: String,
}

impl ResolverRule {
    /// Create a rule. The pattern must match the whole scalar.
    ///
    /// # Errors
    /// Returns [`SchemaError::Pattern`] if `pattern` is not a valid regular expression and
    /// [`SchemaError::EmptyTag`] if `tag` is empty.
    pub fn new(pattern: &str, tag: &str) -> Result<Self, SchemaError> {
        if tag.is_empty() {
            return Err(SchemaError::EmptyTag);
        }
        let compiled = Regex::new(&format!(r"\A(?:{pattern})\z")).map_err(|source| {
            SchemaError::Pattern {
                pattern: pattern.to_owned(),
                tag: tag.to_owned(),
                source,
            }
        })?;
        Ok(ResolverRule {
            source: pattern.to_owned(),
            pattern: compiled,
            tag: tag.to_owned(),
        })
    }

    /// Return the pattern as it was given.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.source
    }

    /// Return the tag the rule resolves to.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Whether the rule applies to `value`.
    #[must_use]
    pub fn is_match(&self, value: &str) -> bool {
        self.pattern.is_match(value)
    }
}

/// What a plain scalar no rule matches resolves to.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Fallback {
    /// The given tag.
    Tag(String),
    /// Nothing: resolution fails with [`LoadError::Resolution`].
    Reject,
}

/// What to do with an integer that does not fit in an `i64`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum IntOverflow {
    /// Keep the low 64 bits and emit a warning.
    Truncate,
    /// Fail with [`LoadError::Construction`].
    #[default]
    Reject,
    /// Construct a [`Value::BigInteger`].
    BigInt,
}

/// What to do with a mapping key appearing twice.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum DuplicateKeys {
    /// Fail with [`LoadError::Construction`].
    #[default]
    Reject,
    /// Keep the first position of the key and the last value.
    LastWins,
}

/// What to do with a tag the schema has no constructor for.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum UnknownTags {
    /// Fail with [`LoadError::Construction`].
    #[default]
    Reject,
    /// Construct the node as if it were untagged and wrap it in a [`Value::Tagged`].
    Keep,
}

/// A set of resolution rules, constructors and policies.
///
/// Schemas are immutable once built and may be shared between threads.
#[derive(Clone)]
pub struct Schema {
    name: String,
    rules: Vec<ResolverRule>,
    constructors: HashMap<String, Constructor>,
    fallback: Fallback,
    int_overflow: IntOverflow,
    duplicate_keys: DuplicateKeys,
    unknown_tags: UnknownTags,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&String> = self.constructors.keys().collect();
        tags.sort();
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("rules", &self.rules)
            .field("constructors", &tags)
            .field("fallback", &self.fallback)
            .field("int_overflow", &self.int_overflow)
            .field("duplicate_keys", &self.duplicate_keys)
            .field("unknown_tags", &self.unknown_tags)
            .finish()
    }
}

static FAILSAFE: OnceLock<Schema> = OnceLock::new();
static JSON: OnceLock<Schema> = OnceLock::new();
static CORE: OnceLock<Schema> = OnceLock::new();

impl Schema {
    /// Start a schema with no rules, no constructors and the strictest policies.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            rules: Vec::new(),
            constructors: HashMap::new(),
            fallback: Fallback::Reject,
            int_overflow: IntOverflow::default(),
            duplicate_keys: DuplicateKeys::default(),
            unknown_tags: UnknownTags::default(),
        }
    }

    /// The failsafe schema: strings, sequences and mappings only.
    pub fn failsafe() -> &'static Schema {
        FAILSAFE.get_or_init(|| {
            builtin(
                Schema::builder("failsafe")
                    .constructor(tag::STR, construct_str)
                    .constructor(tag::SEQ, construct_seq)
                    .constructor(tag::MAP, construct_map)
                    .fallback(Fallback::Tag(tag::STR.to_owned())),
            )
        })
    }

    /// The JSON schema. Plain scalars must be JSON literals.
    pub fn json() -> &'static Schema {
        JSON.get_or_init(|| {
            builtin(
                Schema::failsafe()
                    .extend("json")
                    .rule("null", tag::NULL)
                    .rule("true|false", tag::BOOL)
                    .rule("-?(0|[1-9][0-9]*)", tag::INT)
                    .rule(
                        r"-?(0|[1-9][0-9]*)(\.[0-9]*)?([eE][-+]?[0-9]+)?",
                        tag::FLOAT,
                    )
                    .with_scalar_constructors()
                    .fallback(Fallback::Reject),
            )
        })
    }

    /// The core schema, the default of every loader.
    pub fn core() -> &'static Schema {
        CORE.get_or_init(|| {
            builtin(
                Schema::failsafe()
                    .extend("core")
                    .rule("null|Null|NULL|~|", tag::NULL)
                    .rule("true|True|TRUE|false|False|FALSE", tag::BOOL)
                    .rule("[-+]?[0-9]+", tag::INT)
                    .rule("0o[0-7]+", tag::INT)
                    .rule("0x[0-9a-fA-F]+", tag::INT)
                    .rule(
                        r"[-+]?(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][-+]?[0-9]+)?",
                        tag::FLOAT,
                    )
                    .rule(r"[-+]?(\.inf|\.Inf|\.INF)", tag::FLOAT)
                    .rule(r"\.nan|\.NaN|\.NAN", tag::FLOAT)
                    .with_scalar_constructors(),
            )
        })
    }

    /// Start a new schema with the rules, constructors and policies of `self`.
    #[must_use]
    pub fn extend(&self, name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            rules: self
                .rules
                .iter()
                .map(|rule| (rule.source.clone(), rule.tag.clone()))
                .collect(),
            constructors: self.constructors.clone(),
            fallback: self.fallback.clone(),
            int_overflow: self.int_overflow,
            duplicate_keys: self.duplicate_keys,
            unknown_tags: self.unknown_tags,
        }
    }

    /// Return the name of the schema.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the resolution rules, in the order they are tried.
    #[must_use]
    pub fn rules(&self) -> &[ResolverRule] {
        &self.rules
    }

    /// Return the constructor for `tag`, if any.
    #[must_use]
    pub fn constructor(&self, tag: &str) -> Option<&Constructor> {
        self.constructors.get(tag)
    }

    /// Whether the schema can construct nodes of the given tag.
    #[must_use]
    pub fn recognizes(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    /// Return the fallback for plain scalars no rule matches.
    #[must_use]
    pub fn fallback(&self) -> &Fallback {
        &self.fallback
    }

    /// Return the integer overflow policy.
    #[must_use]
    pub fn int_overflow(&self) -> IntOverflow {
        self.int_overflow
    }

    /// Return the duplicate key policy.
    #[must_use]
    pub fn duplicate_keys(&self) -> DuplicateKeys {
        self.duplicate_keys
    }

    /// Return the policy for tags without a constructor.
    #[must_use]
    pub fn unknown_tags(&self) -> UnknownTags {
        self.unknown_tags
    }

    /// Return the tag of an untagged plain scalar, or `None` if the schema rejects it.
    ///
    /// The first rule that matches wins.
    #[must_use]
    pub fn resolve_plain(&self, value: &str) -> Option<&str> {
        match self.rules.iter().find(|rule| rule.is_match(value)) {
            Some(rule) => Some(&rule.tag),
            None => match &self.fallback {
                Fallback::Tag(tag) => Some(tag),
                Fallback::Reject => None,
            },
        }
    }

    /// Whether a scalar explicitly tagged `tag` may hold `value`.
    ///
    /// When the schema has rules for `tag`, one of them must match. Otherwise, the constructor
    /// alone decides.
    #[must_use]
    pub fn accepts(&self, tag: &str, value: &str) -> bool {
        let mut rules = self.rules.iter().filter(|rule| rule.tag == tag).peekable();
        rules.peek().is_none() || rules.any(|rule| rule.is_match(value))
    }

    /// Return the tag of `node`: its explicit tag, or the one the schema resolves it to.
    pub(crate) fn resolve(&self, node: &Node) -> Result<String, LoadError> {
        match node.tag() {
            Some(tag) if !tag.is_non_specific() => Ok(tag.uri()),
            Some(_) => Ok(match node.content() {
                Content::Scalar(..) => tag::STR,
                Content::Sequence(..) => tag::SEQ,
                Content::Mapping(..) => tag::MAP,
            }
            .to_owned()),
            None => self.resolve_untagged(node).map(str::to_owned),
        }
    }

    /// Return the tag `node` would resolve to if it had no explicit tag.
    pub(crate) fn resolve_untagged<'s>(&'s self, node: &Node) -> Result<&'s str, LoadError> {
        match node.content() {
            Content::Scalar(value, style) if style.is_plain() => {
                self.resolve_plain(value).ok_or_else(|| {
                    LoadError::resolution(
                        node.span().start,
                        format!("no rule of the {} schema matches `{value}`", self.name),
                    )
                })
            }
            Content::Scalar(..) => Ok(tag::STR),
            Content::Sequence(..) => Ok(tag::SEQ),
            Content::Mapping(..) => Ok(tag::MAP),
        }
    }
}

/// Assembles a [`Schema`], see [`Schema::builder`] and [`Schema::extend`].
#[must_use]
pub struct SchemaBuilder {
    name: String,
    rules: Vec<(String, String)>,
    constructors: HashMap<String, Constructor>,
    fallback: Fallback,
    int_overflow: IntOverflow,
    duplicate_keys: DuplicateKeys,
    unknown_tags: UnknownTags,
}

impl SchemaBuilder {
    /// Append a resolution rule. Rules are tried in the order they were added.
    pub fn rule(mut self, pattern: impl Into<String>, tag: impl Into<String>) -> Self {
        self.rules.push((pattern.into(), tag.into()));
        self
    }

    /// Remove every resolution rule added so far.
    pub fn clear_rules(mut self) -> Self {
        self.rules.clear();
        self
    }

    /// Register the constructor for `tag`, replacing any previous one.
    pub fn constructor<F>(mut self, tag: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&mut Construct<'_>, NodeRef<'_>) -> Result<Value, LoadError> + Send + Sync + 'static,
    {
        self.constructors.insert(tag.into(), Arc::new(constructor));
        self
    }

    /// Set what plain scalars no rule matches resolve to.
    pub fn fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Set the integer overflow policy.
    pub fn int_overflow(mut self, policy: IntOverflow) -> Self {
        self.int_overflow = policy;
        self
    }

    /// Set the duplicate key policy.
    pub fn duplicate_keys(mut self, policy: DuplicateKeys) -> Self {
        self.duplicate_keys = policy;
        self
    }

    /// Set the policy for tags without a constructor.
    pub fn unknown_tags(mut self, policy: UnknownTags) -> Self {
        self.unknown_tags = policy;
        self
    }

    /// Validate and build the schema.
    ///
    /// # Errors
    /// Returns an error if a pattern does not compile, a tag is empty, or a rule or the fallback
    /// resolves to a tag without a constructor.
    pub fn build(self) -> Result<Schema, SchemaError> {
        if self.constructors.keys().any(String::is_empty) {
            return Err(SchemaError::EmptyTag);
        }
        let rules = self
            .rules
            .iter()
            .map(|(pattern, tag)| ResolverRule::new(pattern, tag))
            .collect::<Result<Vec<_>, _>>()?;
        let fallback_tag = match &self.fallback {
            Fallback::Tag(tag) if tag.is_empty() => return Err(SchemaError::EmptyTag),
            Fallback::Tag(tag) => Some(tag),
            Fallback::Reject => None,
        };
        if let Some(tag) = rules
            .iter()
            .map(ResolverRule::tag)
            .chain(fallback_tag.map(String::as_str))
            .find(|tag| !self.constructors.contains_key(*tag))
        {
            return Err(SchemaError::MissingConstructor(tag.to_owned()));
        }
        Ok(Schema {
            name: self.name,
            rules,
            constructors: self.constructors,
            fallback: self.fallback,
            int_overflow: self.int_overflow,
            duplicate_keys: self.duplicate_keys,
            unknown_tags: self.unknown_tags,
        })
    }

    fn with_scalar_constructors(self) -> Self {
        self.constructor(tag::NULL, construct_null)
            .constructor(tag::BOOL, construct_bool)
            .constructor(tag::INT, construct_int)
            .constructor(tag::FLOAT, construct_float)
    }
}

fn builtin(builder: SchemaBuilder) -> Schema {
    builder.build().expect("built-in schemas are well-formed")
}
