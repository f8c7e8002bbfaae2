//! Get command - print a single value.

use strata_settings::{Node, load};

use super::SourceArgs;

/// Print the value at a dotted `path`.
///
/// Scalars print bare, trees and lists as YAML.
pub(crate) fn get_value(args: &SourceArgs, path: &str) -> anyhow::Result<()> {
    let loaded = load(&args.definition())?;
    let Some(node) = loaded.dig_path(path) else {
        anyhow::bail!("key not found: {path}");
    };

    match node {
        Node::Tree(_) | Node::Mapping(_) | Node::Sequence(_) => {
            print!("{}", serde_yaml::to_string(&node.to_value())?);
        },
        scalar => println!("{scalar}"),
    }
    Ok(())
}
