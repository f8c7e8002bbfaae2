use std::fmt;

use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use strata_core::{Mapping, Value};

use super::error::{ErrorTree, FieldErrors};
use crate::error::{SettingsError, SettingsResult};

/// Expected type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// A string.
    String,
    /// An integer.
    #[serde(alias = "int")]
    Integer,
    /// A float.
    Float,
    /// An integer or a float.
    Number,
    /// A boolean.
    #[serde(alias = "boolean")]
    Bool,
    /// A sequence.
    #[serde(alias = "array")]
    Sequence,
    /// A mapping.
    #[serde(alias = "hash")]
    Mapping,
}

impl Kind {
    fn matches(self, val: &Value) -> bool {
        match self {
            Self::String => matches!(val, Value::String(_)),
            Self::Integer => matches!(val, Value::Integer(_)),
            Self::Float => matches!(val, Value::Float(_)),
            Self::Number => matches!(val, Value::Integer(_) | Value::Float(_)),
            Self::Bool => matches!(val, Value::Bool(_)),
            Self::Sequence => matches!(val, Value::Sequence(_)),
            Self::Mapping => matches!(val, Value::Mapping(_)),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let article = match self {
            Self::String => "a string",
            Self::Integer => "an integer",
            Self::Float => "a float",
            Self::Number => "a number",
            Self::Bool => "a boolean",
            Self::Sequence => "an array",
            Self::Mapping => "a hash",
        };
        f.write_str(article)
    }
}

/// Constraints on one field.
///
/// ```rust
/// use strata_settings::validate::{Kind, Rule};
///
/// let port = Rule::new().kind(Kind::Integer).min(1.0).max(65535.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Rule {
    required: bool,
    filled: bool,
    kind: Option<Kind>,
    one_of: Vec<Value>,
    min: Option<f64>,
    max: Option<f64>,
    format: Option<Regex>,
    schema: Option<Schema>,
}

impl Rule {
    /// A rule with no constraints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject null and empty strings, sequences and mappings.
    #[must_use]
    pub fn filled(mut self) -> Self {
        self.filled = true;
        self
    }

    /// Require a value type.
    #[must_use]
    pub fn kind(mut self, kind: Kind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Restrict the value to a fixed set.
    #[must_use]
    pub fn one_of<I, V>(mut self, allowed: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.one_of = allowed.into_iter().map(Into::into).collect();
        self
    }

    /// Lower bound for numbers, or minimum length for strings and sequences.
    #[must_use]
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Upper bound for numbers, or maximum length for strings and sequences.
    #[must_use]
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Require strings to match `pattern`.
    #[must_use]
    pub fn format(mut self, pattern: Regex) -> Self {
        self.format = Some(pattern);
        self
    }

    /// Validate a nested mapping against `schema`.
    #[must_use]
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    fn check(&self, val: &Value) -> Option<FieldErrors> {
        if val.is_null() {
            return self.check_null();
        }

        let mut messages = Vec::new();

        if self.filled && is_empty(val) {
            messages.push("must be filled".to_owned());
        }

        if let Some(kind) = self.kind
            && !kind.matches(val)
        {
            messages.push(format!("must be {kind}"));
            return Some(FieldErrors::Messages(messages));
        }

        if !self.one_of.is_empty() && !self.one_of.contains(val) {
            let allowed: Vec<String> = self.one_of.iter().map(display_value).collect();
            messages.push(format!("must be one of: {}", allowed.join(", ")));
        }

        self.check_bounds(val, &mut messages);

        if let (Some(pattern), Some(s)) = (&self.format, val.as_str())
            && !pattern.is_match(s)
        {
            messages.push("is in invalid format".to_owned());
        }

        if let Some(schema) = &self.schema {
            match val.as_mapping() {
                Some(map) => {
                    let nested = schema.check_mapping(map);
                    if messages.is_empty() && !nested.is_empty() {
                        return Some(FieldErrors::Nested(nested));
                    }
                },
                None => messages.push(format!("must be {}", Kind::Mapping)),
            }
        }

        (!messages.is_empty()).then_some(FieldErrors::Messages(messages))
    }

    /// Null only fails the rules that demand a value of some shape.
    fn check_null(&self) -> Option<FieldErrors> {
        let mut messages = Vec::new();
        if self.filled {
            messages.push("must be filled".to_owned());
        }
        if let Some(kind) = self.kind {
            messages.push(format!("must be {kind}"));
        } else if self.schema.is_some() {
            messages.push(format!("must be {}", Kind::Mapping));
        }
        (!messages.is_empty()).then_some(FieldErrors::Messages(messages))
    }

    #[allow(clippy::cast_precision_loss)]
    fn check_bounds(&self, val: &Value, messages: &mut Vec<String>) {
        if self.min.is_none() && self.max.is_none() {
            return;
        }
        let (measure, sized) = match val {
            Value::Integer(_) | Value::Float(_) => (val.as_f64(), false),
            Value::String(s) => (Some(s.chars().count() as f64), true),
            Value::Sequence(seq) => (Some(seq.len() as f64), true),
            _ => (None, false),
        };
        let Some(measure) = measure else {
            return;
        };

        if let Some(min) = self.min.filter(|min| measure < *min) {
            messages.push(if sized {
                format!("size cannot be less than {min}")
            } else {
                format!("must be greater than or equal to {min}")
            });
        }
        if let Some(max) = self.max.filter(|max| measure > *max) {
            messages.push(if sized {
                format!("size cannot be greater than {max}")
            } else {
                format!("must be less than or equal to {max}")
            });
        }
    }
}

fn is_empty(val: &Value) -> bool {
    match val {
        Value::String(s) => s.is_empty(),
        Value::Sequence(seq) => seq.is_empty(),
        Value::Mapping(map) => map.is_empty(),
        _ => false,
    }
}

fn display_value(val: &Value) -> String {
    match val {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Declarative description of the fields a settings tree must carry.
///
/// ```rust
/// use strata_settings::validate::{Kind, Rule, Schema};
///
/// let schema = Schema::new()
///     .required("foo", Rule::new().filled())
///     .optional("deep", Rule::new().schema(
///         Schema::new().required("warn_threshold", Rule::new().kind(Kind::Integer)),
///     ));
/// assert_eq!(schema.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: IndexMap<String, Rule>,
}

impl Schema {
    /// An empty schema; every tree passes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field that must be present.
    #[must_use]
    pub fn required(mut self, field: impl Into<String>, mut rule: Rule) -> Self {
        rule.required = true;
        self.fields.insert(field.into(), rule);
        self
    }

    /// Add a field checked only when present.
    #[must_use]
    pub fn optional(mut self, field: impl Into<String>, mut rule: Rule) -> Self {
        rule.required = false;
        self.fields.insert(field.into(), rule);
        self
    }

    /// Number of top-level fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the schema has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse a YAML schema description.
    ///
    /// The document maps field names to rules:
    ///
    /// ```yaml
    /// foo:
    ///   filled: true
    /// deep:
    ///   required: false
    ///   schema:
    ///     warn_threshold: { type: integer, min: 0 }
    /// ```
    ///
    /// Fields are required unless `required: false` is given.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidSchema`] if the document is malformed
    /// or a `format` is not a valid regular expression.
    pub fn from_yaml(text: &str) -> SettingsResult<Self> {
        let spec: IndexMap<String, RuleSpec> =
            serde_yaml::from_str(text).map_err(|e| SettingsError::InvalidSchema {
                field: String::new(),
                message: e.to_string(),
            })?;
        Self::from_spec(spec, "")
    }

    fn from_spec(spec: IndexMap<String, RuleSpec>, parent: &str) -> SettingsResult<Self> {
        let mut schema = Self::new();
        for (field, rule) in spec {
            let path = if parent.is_empty() {
                field.clone()
            } else {
                format!("{parent}.{field}")
            };
            let required = rule.required;
            let rule = rule.into_rule(&path)?;
            schema = if required {
                schema.required(field, rule)
            } else {
                schema.optional(field, rule)
            };
        }
        Ok(schema)
    }

    /// Check a plain tree, returning the errors per field.
    ///
    /// A non-mapping tree is checked as an empty mapping.
    #[must_use]
    pub fn check(&self, val: &Value) -> ErrorTree {
        match val.as_mapping() {
            Some(map) => self.check_mapping(map),
            None => self.check_mapping(&Mapping::new()),
        }
    }

    fn check_mapping(&self, map: &Mapping) -> ErrorTree {
        let mut errors = ErrorTree::new();
        for (field, rule) in &self.fields {
            let outcome = match map.get(field) {
                Some(val) => rule.check(val),
                None if rule.required => {
                    Some(FieldErrors::Messages(vec!["is missing".to_owned()]))
                },
                None => None,
            };
            if let Some(outcome) = outcome {
                errors.insert(field.clone(), outcome);
            }
        }
        errors
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleSpec {
    #[serde(default = "default_required")]
    required: bool,
    #[serde(default)]
    filled: bool,
    #[serde(default, rename = "type")]
    kind: Option<Kind>,
    #[serde(default)]
    one_of: Vec<Value>,
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    schema: Option<IndexMap<String, RuleSpec>>,
}

fn default_required() -> bool {
    true
}

impl RuleSpec {
    fn into_rule(self, path: &str) -> SettingsResult<Rule> {
        let format = self
            .format
            .map(|pattern| {
                Regex::new(&pattern).map_err(|e| SettingsError::InvalidSchema {
                    field: path.to_owned(),
                    message: e.to_string(),
                })
            })
            .transpose()?;
        let schema = self
            .schema
            .map(|nested| Schema::from_spec(nested, path))
            .transpose()?;

        Ok(Rule {
            required: self.required,
            filled: self.filled,
            kind: self.kind,
            one_of: self.one_of,
            min: self.min,
            max: self.max,
            format,
            schema,
        })
    }
}
