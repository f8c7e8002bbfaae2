//! Process-wide settings options.
//!
//! Every operation that consults a policy takes it from an [`Options`]
//! value. The process-wide instance returned by [`current`] is read at the
//! moment of each call, so toggling it affects later operations only. Code
//! that must not depend on shared state (tests, embedded hosts) passes an
//! explicit `Options` instead.

use std::fmt;
use std::str::FromStr;
use std::sync::{LazyLock, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use strata_core::MergeOptions;

use crate::error::SettingsError;

/// Default separator between environment variable name segments.
pub const DEFAULT_ENV_SEPARATOR: &str = ".";

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "SETTINGS";

/// How environment variable name segments are turned into keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Converter {
    /// Lower-case every segment (`NESTED` → `nested`).
    #[default]
    Downcase,
    /// Keep segments exactly as written.
    None,
}

impl Converter {
    /// Apply the conversion to one name segment.
    #[must_use]
    pub fn convert(self, segment: &str) -> String {
        match self {
            Self::Downcase => segment.to_lowercase(),
            Self::None => segment.to_owned(),
        }
    }
}

impl FromStr for Converter {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "downcase" => Ok(Self::Downcase),
            "none" | "" => Ok(Self::None),
            other => Err(SettingsError::InvalidConverter(other.to_owned())),
        }
    }
}

impl fmt::Display for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Downcase => write!(f, "downcase"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Options for deriving an overlay from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvOptions {
    /// Separator between name segments.
    pub separator: String,
    /// Required leading segment(s); `None` makes the overlay an error.
    pub prefix: Option<String>,
    /// Case folding for the remaining segments.
    pub converter: Converter,
    /// Turn `"true"`, `"42"`, `"3.14"` into typed values.
    pub parse_values: bool,
}

impl Default for EnvOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_ENV_SEPARATOR.to_owned(),
            prefix: Some(DEFAULT_ENV_PREFIX.to_owned()),
            converter: Converter::default(),
            parse_values: true,
        }
    }
}

impl EnvOptions {
    /// Set the prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Clear the prefix.
    #[must_use]
    pub fn without_prefix(mut self) -> Self {
        self.prefix = None;
        self
    }

    /// Set the separator.
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set the converter.
    #[must_use]
    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.converter = converter;
        self
    }

    /// Keep environment values as strings.
    #[must_use]
    pub fn without_value_parsing(mut self) -> Self {
        self.parse_values = false;
        self
    }
}

/// All policies consulted by settings operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Strict attribute access: absent fields fail instead of reading as
    /// null.
    pub fail_on_missing: bool,
    /// Merge the environment overlay while loading.
    pub use_env: bool,
    /// Environment overlay options.
    pub env: EnvOptions,
    /// Deep-merge policies.
    pub merge: MergeOptions,
}

impl Options {
    /// Enable strict attribute access.
    #[must_use]
    pub fn failing_on_missing(mut self) -> Self {
        self.fail_on_missing = true;
        self
    }

    /// Enable the environment overlay.
    #[must_use]
    pub fn with_env(mut self) -> Self {
        self.use_env = true;
        self
    }

    /// Replace the environment options.
    #[must_use]
    pub fn with_env_options(mut self, env: EnvOptions) -> Self {
        self.env = env;
        self
    }

    /// Replace the merge options.
    #[must_use]
    pub fn with_merge_options(mut self, merge: MergeOptions) -> Self {
        self.merge = merge;
        self
    }
}

static GLOBAL: LazyLock<RwLock<Options>> = LazyLock::new(|| RwLock::new(Options::default()));

/// Snapshot of the process-wide options.
#[must_use]
pub fn current() -> Options {
    GLOBAL
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replace the process-wide options, returning the previous ones.
pub fn replace(options: Options) -> Options {
    let mut guard = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *guard, options)
}

/// Modify the process-wide options in place.
pub fn update(f: impl FnOnce(&mut Options)) {
    let mut guard = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard);
}

/// Restore the process-wide options to their defaults.
pub fn reset() {
    replace(Options::default());
}
