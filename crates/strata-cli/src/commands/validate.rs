//! Validate command - check settings against a schema file.

use std::path::Path;

use strata_settings::{Schema, SettingsError, load};
use tracing::debug;

use super::SourceArgs;
use crate::theme::Theme;

/// Load the settings and validate them against the schema at `schema`.
pub(crate) fn validate_settings(args: &SourceArgs, schema: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(schema)
        .map_err(|e| anyhow::anyhow!("failed to read schema {}: {e}", schema.display()))?;
    let definition = args.definition().with_schema(Schema::from_yaml(&text)?)?;
    let loaded = load(&definition)?;
    debug!(files = loaded.loaded_files().len(), "validating settings");

    match loaded.validate() {
        Ok(()) => {
            println!("{}", Theme::success("Settings are valid"));
            for path in loaded.loaded_files() {
                println!("  {}", Theme::dimmed(&path.display().to_string()));
            }
            Ok(())
        },
        Err(SettingsError::Validation(err)) => {
            println!("{}", Theme::error("Settings are invalid"));
            for (field, messages) in err.flatten() {
                let name = format!("{}.{}", err.prefix(), field.to_uppercase());
                println!("  {}", Theme::kv(&name, &messages.join("; ")));
            }
            anyhow::bail!("{} field(s) failed validation", err.flatten().len())
        },
        Err(other) => Err(other.into()),
    }
}
