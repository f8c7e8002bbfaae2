use std::io;

use thiserror::Error;

use crate::validate::ValidationError;

/// Settings error type.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A definition was loaded without a source file.
    #[error("source file is not defined")]
    SourceNotDefined,

    /// The environment overlay is enabled but no prefix is configured.
    #[error("environment variable prefix is not defined")]
    EnvPrefixNotDefined,

    /// Unknown environment key converter name.
    #[error("invalid environment variable name converter: {0}")]
    InvalidConverter(String),

    /// Strict access to a field that is absent.
    #[error("key not found: {key}")]
    KeyNotFound {
        /// Name of the missing field.
        key: String,
    },

    /// Mutation attempted on a frozen tree.
    #[error("can't modify frozen settings (key '{key}')")]
    Frozen {
        /// Key being written, or `*` for whole-tree operations.
        key: String,
    },

    /// The merged tree does not satisfy its schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A definition's schema was assigned twice.
    #[error("schema already defined for '{name}'")]
    SchemaAlreadyDefined {
        /// Name of the definition.
        name: String,
    },

    /// A schema description could not be turned into a schema.
    #[error("invalid schema at '{field}': {message}")]
    InvalidSchema {
        /// Field whose rule is malformed.
        field: String,
        /// Description of the problem.
        message: String,
    },

    /// Failed to read a source file.
    #[error("failed to read settings file at {path}: {source}")]
    ReadError {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to parse a source file.
    #[error("failed to parse settings file at {path}: {message}")]
    ParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Parser error description.
        message: String,
    },

    /// A source file exceeds the size limit.
    #[error("settings file at {path} is {size} bytes, exceeding the {limit} byte limit")]
    FileTooLarge {
        /// Path to the oversized file.
        path: String,
        /// Size of the file in bytes.
        size: u64,
        /// Maximum accepted size in bytes.
        limit: u64,
    },

    /// Export serialization failed.
    #[error("failed to serialize settings: {0}")]
    Serialize(String),

    /// A load hook reported a failure.
    #[error("{hook} hook failed: {message}")]
    Hook {
        /// Which hook failed.
        hook: &'static str,
        /// Failure description.
        message: String,
    },
}

impl SettingsError {
    pub(crate) fn frozen(key: impl Into<String>) -> Self {
        Self::Frozen { key: key.into() }
    }

    /// Build a hook failure from any displayable error.
    pub fn hook(hook: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Hook {
            hook,
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

impl From<serde_yaml::Error> for SettingsError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;
