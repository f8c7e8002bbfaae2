//! Subcommand implementations.

pub(crate) mod env;
pub(crate) mod get;
pub(crate) mod show;
pub(crate) mod validate;

use std::path::PathBuf;

use clap::Args;
use strata_settings::{Definition, EnvOptions, Options, options};

/// Where to load settings from and how.
#[derive(Debug, Args)]
pub(crate) struct SourceArgs {
    /// Base settings file (YAML, TOML or JSON)
    pub(crate) source: PathBuf,

    /// Namespace overlay, e.g. `production` loads `settings.production.yml`
    #[arg(short, long)]
    pub(crate) namespace: Option<String>,

    /// Overlay environment variables
    #[arg(short, long)]
    pub(crate) env: bool,

    /// Environment variable prefix
    #[arg(long, requires = "env")]
    pub(crate) prefix: Option<String>,

    /// Environment variable name separator
    #[arg(long, requires = "env")]
    pub(crate) separator: Option<String>,

    /// Append arrays from namespace files and the environment instead of
    /// replacing them
    #[arg(long)]
    pub(crate) append_arrays: bool,
}

impl SourceArgs {
    /// Build the definition these arguments describe.
    pub(crate) fn definition(&self) -> Definition {
        let mut definition = Definition::new("cli")
            .source(&self.source)
            .options(self.options());
        if let Some(namespace) = &self.namespace {
            definition = definition.namespace(namespace);
        }
        definition
    }

    /// The process-wide options with these arguments applied.
    pub(crate) fn options(&self) -> Options {
        let mut opts = options::current();
        opts.use_env = self.env;
        opts.env = env_options(self.prefix.as_deref(), self.separator.as_deref());
        if self.append_arrays {
            opts.merge.overwrite_arrays = false;
        }
        opts
    }
}

/// Environment options with CLI overrides applied.
pub(crate) fn env_options(prefix: Option<&str>, separator: Option<&str>) -> EnvOptions {
    let mut env = EnvOptions::default();
    if let Some(prefix) = prefix {
        env = env.with_prefix(prefix);
    }
    if let Some(separator) = separator {
        separator.clone_into(&mut env.separator);
    }
    env
}
