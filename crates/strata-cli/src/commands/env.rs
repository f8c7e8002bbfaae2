//! Env command - preview the environment overlay.

use strata_settings::env::{collect_env_vars, overlay_from_env};

use super::env_options;
use crate::theme::Theme;

/// Print the overlay the current environment would apply.
pub(crate) fn show_env_overlay(prefix: Option<&str>, separator: Option<&str>) -> anyhow::Result<()> {
    let options = env_options(prefix, separator);
    let overlay = overlay_from_env(collect_env_vars(), &options)?;

    let is_empty = overlay.as_mapping().is_none_or(|map| map.is_empty());
    if is_empty {
        println!(
            "{}",
            Theme::dimmed(&format!(
                "No variables match prefix '{}'",
                options.prefix.as_deref().unwrap_or_default()
            ))
        );
        return Ok(());
    }

    println!("{}", Theme::header("Environment overlay"));
    print!("{}", serde_yaml::to_string(&overlay)?);
    Ok(())
}
