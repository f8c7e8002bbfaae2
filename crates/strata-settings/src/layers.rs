//! Per-field tracking of which layer set each value.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use strata_core::MergeObserver;

/// Which layer a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// The base source file.
    Base,
    /// The namespace file next to the source.
    Namespace,
    /// The environment variable overlay.
    Environment,
    /// A merge performed after loading, or a load hook.
    Runtime,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => write!(f, "base"),
            Self::Namespace => write!(f, "namespace"),
            Self::Environment => write!(f, "env"),
            Self::Runtime => write!(f, "runtime"),
        }
    }
}

/// Dotted field path → the layer that last set it.
pub type FieldSources = HashMap<String, Layer>;

/// Records merge activity into a [`FieldSources`] map under one layer.
///
/// Removing or replacing a subtree forgets every path below it, so the map
/// only names fields that still exist.
pub struct LayerRecorder<'a> {
    layer: Layer,
    sources: &'a mut FieldSources,
}

impl<'a> LayerRecorder<'a> {
    /// Attribute everything the next merge writes to `layer`.
    pub fn new(layer: Layer, sources: &'a mut FieldSources) -> Self {
        Self { layer, sources }
    }
}

impl MergeObserver for LayerRecorder<'_> {
    fn assigned(&mut self, path: &str) {
        self.sources.insert(path.to_owned(), self.layer);
    }

    fn removed(&mut self, path: &str) {
        if path.is_empty() {
            self.sources.clear();
            return;
        }
        let nested = format!("{path}.");
        self.sources
            .retain(|field, _| field != path && !field.starts_with(&nested));
    }
}
