//! Show command - print the resolved settings.

use strata_settings::{ShowFormat, load};

use super::SourceArgs;

/// Load and print the tree, or one section of it.
pub(crate) fn show_settings(
    args: &SourceArgs,
    format: ShowFormat,
    section: Option<&str>,
) -> anyhow::Result<()> {
    let loaded = load(&args.definition())?;
    let output = loaded.show(format, section)?;
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}
