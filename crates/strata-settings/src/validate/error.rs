use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

/// Header line of every validation failure message.
pub const VALIDATION_HEADER: &str = "settings validation failed:";

/// Errors collected for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldErrors {
    /// Messages about the field's own value.
    Messages(Vec<String>),
    /// Errors of the fields of a nested mapping.
    Nested(ErrorTree),
}

/// Field name to errors, in schema order.
pub type ErrorTree = IndexMap<String, FieldErrors>;

/// A settings tree failed its schema.
///
/// Holds the structured error tree; [`Display`](fmt::Display) renders the
/// flattened form:
///
/// ```text
/// settings validation failed:
///
///   SETTINGS.DEEP.NESTED.WARN_THRESHOLD: must be an integer
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    prefix: String,
    errors: ErrorTree,
}

impl ValidationError {
    pub(crate) fn new(prefix: impl Into<String>, errors: ErrorTree) -> Self {
        Self {
            prefix: prefix.into(),
            errors,
        }
    }

    /// The structured error tree.
    #[must_use]
    pub fn errors(&self) -> &ErrorTree {
        &self.errors
    }

    /// The prefix printed before every field path.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Dotted field path to messages, one entry per invalid leaf.
    #[must_use]
    pub fn flatten(&self) -> Vec<(String, &[String])> {
        let mut out = Vec::new();
        flatten_into(&self.errors, "", &mut out);
        out
    }

    /// The per-field lines of the message, without the header.
    #[must_use]
    pub fn format_lines(&self) -> String {
        self.flatten()
            .into_iter()
            .map(|(field, messages)| {
                format!(
                    "  {}.{}: {}",
                    self.prefix,
                    field.to_uppercase(),
                    messages.join("; ")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn flatten_into<'a>(tree: &'a ErrorTree, path: &str, out: &mut Vec<(String, &'a [String])>) {
    for (field, errors) in tree {
        let full = if path.is_empty() {
            field.clone()
        } else {
            format!("{path}.{field}")
        };
        match errors {
            FieldErrors::Messages(messages) => out.push((full, messages)),
            FieldErrors::Nested(nested) => flatten_into(nested, &full, out),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{VALIDATION_HEADER}\n\n{}", self.format_lines())
    }
}

impl std::error::Error for ValidationError {}
