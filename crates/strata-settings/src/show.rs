//! Rendering a loaded tree for display.
//!
//! The `sources` format lists every leaf with the layer that set it.

use std::fmt::Write as _;
use std::str::FromStr;

use strata_core::Value;

use crate::error::{SettingsError, SettingsResult};
use crate::loader::LoadedSettings;

/// Output format for [`LoadedSettings::show`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShowFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// YAML.
    Yaml,
    /// One `path = value  # [layer]` line per leaf.
    Sources,
}

impl FromStr for ShowFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "sources" => Ok(Self::Sources),
            other => Err(format!("unknown show format '{other}'")),
        }
    }
}

impl LoadedSettings {
    /// Render the tree, or the subtree at the dotted `section` path.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::KeyNotFound`] if `section` does not exist,
    /// or a serialization error.
    pub fn show(&self, format: ShowFormat, section: Option<&str>) -> SettingsResult<String> {
        let val = match section {
            Some(path) => self
                .dig_path(path)
                .map(crate::Node::to_value)
                .ok_or_else(|| SettingsError::KeyNotFound {
                    key: path.to_owned(),
                })?,
            None => self.to_value(),
        };

        match format {
            ShowFormat::Json => Ok(serde_json::to_string_pretty(&val)?),
            ShowFormat::Yaml => Ok(serde_yaml::to_string(&val)?),
            ShowFormat::Sources => Ok(self.show_sources(&val, section.unwrap_or(""))),
        }
    }

    fn show_sources(&self, val: &Value, prefix: &str) -> String {
        let mut output = String::new();

        output.push_str("# Resolved settings\n");
        if !self.loaded_files().is_empty() {
            output.push_str("#\n# Loaded files (in merge order):\n");
            for (i, path) in self.loaded_files().iter().enumerate() {
                let _ = writeln!(output, "#   {}. {}", i.saturating_add(1), path.display());
            }
        }
        output.push('\n');

        let mut leaves = Vec::new();
        collect_leaves(val, prefix, &mut leaves);
        for (path, leaf) in leaves {
            let rendered = serde_json::to_string(leaf).unwrap_or_default();
            match self.field_sources().get(&path) {
                Some(layer) => {
                    let _ = writeln!(output, "{path} = {rendered}  # [{layer}]");
                },
                None => {
                    let _ = writeln!(output, "{path} = {rendered}");
                },
            }
        }

        output
    }
}

fn collect_leaves<'a>(val: &'a Value, path: &str, out: &mut Vec<(String, &'a Value)>) {
    match val {
        Value::Mapping(map) if !map.is_empty() => {
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                collect_leaves(child, &child_path, out);
            }
        },
        leaf => out.push((path.to_owned(), leaf)),
    }
}
