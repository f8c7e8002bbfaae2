//! Strata CLI - inspect layered settings.
//!
//! Loads a settings file the same way applications do (base file, namespace
//! overlay, environment variables) and prints, queries or validates the
//! result.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use strata_settings::ShowFormat;
use strata_telemetry::{LogConfig, LogFormat};

mod commands;
mod theme;

use commands::{SourceArgs, env, get, show, validate};

/// Strata - layered settings inspector
#[derive(Parser)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Log format: pretty, compact, json or full
    #[arg(long, global = true, default_value = "compact")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show resolved settings
    Show {
        #[command(flatten)]
        source: SourceArgs,

        /// Output format: json, yaml or sources
        #[arg(short, long, default_value = "json")]
        format: ShowFormat,

        /// Show only the subtree at this dotted path
        #[arg(short, long)]
        section: Option<String>,
    },

    /// Print the value at a dotted path
    Get {
        #[command(flatten)]
        source: SourceArgs,

        /// Dotted path, e.g. `database.pool.size`
        path: String,
    },

    /// Validate settings against a schema file
    Validate {
        #[command(flatten)]
        source: SourceArgs,

        /// Schema description (YAML)
        #[arg(long)]
        schema: PathBuf,
    },

    /// Preview the overlay derived from the current environment
    Env {
        /// Environment variable prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Environment variable name separator
        #[arg(long)]
        separator: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_verbosity(cli.verbose).with_format(cli.log_format);
    if let Err(e) = strata_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match cli.command {
        Commands::Show {
            source,
            format,
            section,
        } => show::show_settings(&source, format, section.as_deref()),
        Commands::Get { source, path } => get::get_value(&source, &path),
        Commands::Validate { source, schema } => validate::validate_settings(&source, &schema),
        Commands::Env { prefix, separator } => {
            env::show_env_overlay(prefix.as_deref(), separator.as_deref())
        },
    }
}
