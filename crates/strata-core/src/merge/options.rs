use serde::{Deserialize, Serialize};

use crate::Value;

/// Policies applied by the deep-merge engine.
///
/// Type mismatches (a mapping meeting a scalar, say) are always resolved in
/// favor of the incoming value; there is no option to preserve both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    /// Replace sequences wholesale instead of appending to them.
    pub overwrite_arrays: bool,
    /// When appending, keep incoming elements already present on the
    /// current side.
    pub keep_array_duplicates: bool,
    /// Let an incoming null overwrite an existing value.
    pub merge_nil_values: bool,
    /// Marker string that deletes instead of merging.
    ///
    /// A mapping value equal to the marker removes the key. Inside a
    /// sequence, the bare marker clears the current sequence and
    /// `"<marker><item>"` removes `item` from it.
    pub knockout_prefix: Option<String>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            overwrite_arrays: true,
            keep_array_duplicates: true,
            merge_nil_values: false,
            knockout_prefix: None,
        }
    }
}

impl MergeOptions {
    /// Append sequences instead of replacing them.
    #[must_use]
    pub fn appending_arrays(mut self) -> Self {
        self.overwrite_arrays = false;
        self
    }

    /// Drop incoming sequence elements already present when appending.
    #[must_use]
    pub fn without_array_duplicates(mut self) -> Self {
        self.keep_array_duplicates = false;
        self
    }

    /// Let incoming nulls overwrite existing values.
    #[must_use]
    pub fn with_nil_values(mut self) -> Self {
        self.merge_nil_values = true;
        self
    }

    /// Set the knockout marker.
    #[must_use]
    pub fn with_knockout_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.knockout_prefix = Some(prefix.into());
        self
    }

    /// The knockout marker, ignoring an empty string.
    pub(crate) fn knockout(&self) -> Option<&str> {
        self.knockout_prefix.as_deref().filter(|p| !p.is_empty())
    }

    /// Whether `val` is exactly the knockout marker.
    pub(crate) fn is_knockout(&self, val: &Value) -> bool {
        self.knockout().is_some_and(|prefix| val.as_str() == Some(prefix))
    }

    /// Whether `val` is a sequence element carrying the knockout marker.
    pub(crate) fn is_knockout_element(&self, val: &Value) -> bool {
        self.knockout()
            .is_some_and(|prefix| val.as_str().is_some_and(|s| s.starts_with(prefix)))
    }
}
