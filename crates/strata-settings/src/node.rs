//! Values stored inside a [`Settings`] tree.

use std::fmt;
use std::ops::Index;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use strata_core::{Deferred, Mapping, Value};

use crate::error::SettingsResult;
use crate::settings::Settings;

/// Key marking a mapping that must be kept verbatim instead of wrapped.
pub const LITERAL_TYPE_KEY: &str = "type";
/// Value of [`LITERAL_TYPE_KEY`] that triggers the literal escape.
pub const LITERAL_TYPE_HASH: &str = "hash";
/// Key holding the verbatim payload of a literal mapping.
pub const LITERAL_CONTENTS_KEY: &str = "contents";

pub(crate) static NULL: Node = Node::Null;

/// One entry of a settings tree.
///
/// Mirrors [`Value`], except that mappings are wrapped as navigable
/// [`Settings`] trees. Mappings that went through the literal escape
/// (`{type: hash, contents: ...}`) are kept as [`Node::Mapping`] and are
/// never wrapped, at any depth.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Node {
    /// Null.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Integer(i64),
    /// Float.
    Float(f64),
    /// String.
    String(String),
    /// Sequence; mapping elements are wrapped as trees.
    Sequence(Vec<Node>),
    /// Nested settings tree.
    Tree(Settings),
    /// Literal mapping kept verbatim.
    Mapping(IndexMap<String, Node>),
    /// Computation run on every export.
    Deferred(Deferred),
}

impl Node {
    /// Wrap a plain value, turning mappings into trees.
    #[must_use]
    pub fn wrap(val: &Value) -> Self {
        match val {
            Value::Mapping(map) => match literal_contents(map) {
                Some(contents) => Self::literal(contents),
                None => Self::Tree(Settings::from_mapping(map)),
            },
            Value::Sequence(seq) => Self::Sequence(seq.iter().map(Self::wrap).collect()),
            scalar => Self::literal(scalar),
        }
    }

    /// Convert a plain value without wrapping any mapping.
    #[must_use]
    pub fn literal(val: &Value) -> Self {
        match val {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Integer(i) => Self::Integer(*i),
            Value::Float(f) => Self::Float(*f),
            Value::String(s) => Self::String(s.clone()),
            Value::Sequence(seq) => Self::Sequence(seq.iter().map(Self::literal).collect()),
            Value::Mapping(map) => Self::Mapping(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::literal(v)))
                    .collect(),
            ),
            Value::Deferred(d) => Self::Deferred(d.clone()),
        }
    }

    /// Export as a plain value, evaluating deferred leaves.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Integer(i) => Value::Integer(*i),
            Self::Float(f) => Value::Float(*f),
            Self::String(s) => Value::String(s.clone()),
            Self::Sequence(seq) => Value::Sequence(seq.iter().map(Self::to_value).collect()),
            Self::Tree(tree) => tree.to_value(),
            Self::Mapping(map) => Value::Mapping(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect(),
            ),
            Self::Deferred(d) => d.evaluate(),
        }
    }

    /// Deserialize the exported value into a typed struct.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the shape does not match `T`.
    pub fn extract<T: DeserializeOwned>(&self) -> SettingsResult<T> {
        let json = serde_json::to_value(self.to_value())?;
        Ok(serde_json::from_value(json)?)
    }

    /// Short name of the variant, used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Sequence(_) => "sequence",
            Self::Tree(_) => "tree",
            Self::Mapping(_) => "mapping",
            Self::Deferred(_) => "deferred",
        }
    }

    /// Returns `true` for [`Node::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the boolean if this is a [`Node::Bool`].
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer if this is a [`Node::Integer`].
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the number as `f64` for integers and floats.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the string slice if this is a [`Node::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements if this is a [`Node::Sequence`].
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Self::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    /// Returns the nested tree if this is a [`Node::Tree`].
    #[must_use]
    pub fn as_tree(&self) -> Option<&Settings> {
        match self {
            Self::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    /// Mutable access to the nested tree if this is a [`Node::Tree`].
    pub fn as_tree_mut(&mut self) -> Option<&mut Settings> {
        match self {
            Self::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    /// Returns the literal mapping if this is a [`Node::Mapping`].
    #[must_use]
    pub fn as_mapping(&self) -> Option<&IndexMap<String, Node>> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Look up `key` in a nested tree or literal mapping.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Self::Tree(tree) => tree.get(key),
            Self::Mapping(map) => map.get(key),
            _ => None,
        }
    }

    pub(crate) fn freeze(&mut self) {
        match self {
            Self::Tree(tree) => {
                tree.freeze();
            },
            Self::Sequence(seq) => seq.iter_mut().for_each(Self::freeze),
            _ => {},
        }
    }
}

/// The `contents` of a literal-escape mapping, if `map` is one.
fn literal_contents(map: &Mapping) -> Option<&Value> {
    let tag = map.get(LITERAL_TYPE_KEY)?.as_str()?;
    if tag != LITERAL_TYPE_HASH {
        return None;
    }
    Some(map.get(LITERAL_CONTENTS_KEY).unwrap_or(&Value::Null))
}

impl Index<&str> for Node {
    type Output = Node;

    fn index(&self, key: &str) -> &Node {
        self.get(key).unwrap_or(&NULL)
    }
}

impl Index<usize> for Node {
    type Output = Node;

    fn index(&self, idx: usize) -> &Node {
        self.as_sequence()
            .and_then(|seq| seq.get(idx))
            .unwrap_or(&NULL)
    }
}

impl fmt::Display for Node {
    /// Strings print bare; everything else prints as compact JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            other => {
                let json = serde_json::to_string(&other.to_value()).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            },
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl From<Value> for Node {
    fn from(val: Value) -> Self {
        Self::wrap(&val)
    }
}

impl From<&Value> for Node {
    fn from(val: &Value) -> Self {
        Self::wrap(val)
    }
}

impl From<Settings> for Node {
    fn from(tree: Settings) -> Self {
        Self::Tree(tree)
    }
}

impl From<Deferred> for Node {
    fn from(d: Deferred) -> Self {
        Self::Deferred(d)
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Node {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Node {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Node {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<T: Into<Node>> From<Vec<T>> for Node {
    fn from(items: Vec<T>) -> Self {
        Self::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl PartialEq<str> for Node {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for Node {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<String> for Node {
    fn eq(&self, other: &String) -> bool {
        self.as_str() == Some(other.as_str())
    }
}

impl PartialEq<bool> for Node {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

impl PartialEq<i64> for Node {
    fn eq(&self, other: &i64) -> bool {
        self.as_i64() == Some(*other)
    }
}

impl PartialEq<i32> for Node {
    fn eq(&self, other: &i32) -> bool {
        self.as_i64() == Some(i64::from(*other))
    }
}

impl PartialEq<f64> for Node {
    #[allow(clippy::float_cmp)]
    fn eq(&self, other: &f64) -> bool {
        matches!(self, Self::Float(f) if f == other)
    }
}
