//! The plain settings tree.
//!
//! A [`Value`] is what a parsed source file turns into: nested mappings and
//! sequences of scalars, with no navigation behavior attached. Mappings keep
//! their insertion order so exports reproduce the source layout.

mod de;
mod deferred;
mod ser;

use std::fmt;

use indexmap::IndexMap;

pub use deferred::Deferred;

/// Insertion-ordered mapping from key to [`Value`].
pub type Mapping = IndexMap<String, Value>;

/// A node of a plain settings tree.
#[derive(Clone, Default)]
pub enum Value {
    /// Explicit null (`~` in YAML).
    #[default]
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Signed integer scalar.
    Integer(i64),
    /// Floating point scalar.
    Float(f64),
    /// String scalar.
    String(String),
    /// Ordered sequence of values.
    Sequence(Vec<Value>),
    /// Insertion-ordered mapping.
    Mapping(Mapping),
    /// A computation producing a value, run on every export.
    Deferred(Deferred),
}

impl Value {
    /// Create an empty mapping value.
    #[must_use]
    pub fn mapping() -> Self {
        Self::Mapping(Mapping::new())
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
            Self::Mapping(_) => "mapping",
            Self::Deferred(_) => "deferred",
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for [`Value::Mapping`].
    #[must_use]
    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping(_))
    }

    /// Returns the boolean if this is a [`Value::Bool`].
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer if this is a [`Value::Integer`].
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

    /// Returns the string slice if this is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements if this is a [`Value::Sequence`].
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    /// Returns the mapping if this is a [`Value::Mapping`].
    #[must_use]
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Mutable access to the mapping if this is a [`Value::Mapping`].
    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Look up `key` when this value is a mapping.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping()?.get(key)
    }

    /// Navigate nested mappings by path segments.
    #[must_use]
    pub fn pointer(&self, path: &[&str]) -> Option<&Value> {
        let mut current = self;
        for segment in path {
            current = current.get(segment)?;
        }
        Some(current)
    }

    /// Returns `true` if a [`Value::Deferred`] appears anywhere in the tree.
    #[must_use]
    pub fn has_deferred(&self) -> bool {
        match self {
            Self::Deferred(_) => true,
            Self::Sequence(seq) => seq.iter().any(Self::has_deferred),
            Self::Mapping(map) => map.values().any(Self::has_deferred),
            _ => false,
        }
    }

    /// Evaluate every deferred leaf, returning a tree without any.
    ///
    /// Deferred values are invoked each time this is called; nothing is
    /// cached.
    #[must_use]
    pub fn resolve(&self) -> Value {
        match self {
            Self::Deferred(deferred) => deferred.evaluate(),
            Self::Sequence(seq) => Self::Sequence(seq.iter().map(Self::resolve).collect()),
            Self::Mapping(map) => Self::Mapping(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.resolve()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

/// Normalize a non-string mapping key into the string key space.
///
/// Integer, float and boolean keys use their textual form; a null key
/// becomes the empty string.
#[must_use]
pub fn key_from_value(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        other => ser::to_compact_string(other),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            #[allow(clippy::float_cmp)]
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Sequence(a), Self::Sequence(b)) => a == b,
            (Self::Mapping(a), Self::Mapping(b)) => a == b,
            (Self::Deferred(a), Self::Deferred(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Integer(i) => write!(f, "Integer({i})"),
            Self::Float(x) => write!(f, "Float({x:?})"),
            Self::String(s) => write!(f, "String({s:?})"),
            Self::Sequence(seq) => f.debug_list().entries(seq).finish(),
            Self::Mapping(map) => f.debug_map().entries(map).finish(),
            Self::Deferred(d) => d.fmt(f),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Self::Mapping(map)
    }
}

impl From<Deferred> for Value {
    fn from(d: Deferred) -> Self {
        Self::Deferred(d)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::Mapping(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
