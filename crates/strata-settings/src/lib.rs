#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Layered, navigable settings for Strata.
//!
//! A settings profile is declared as a [`Definition`], loaded into a
//! [`Settings`] tree, and optionally validated against a
//! [`Schema`](validate::Schema).
//!
//! # Usage
//!
//! ```rust,no_run
//! use strata_settings::{Definition, Options, Registry};
//!
//! let definition = Definition::new("app")
//!     .source("config/settings.yml")
//!     .namespace("development")
//!     .options(Options::default().with_env());
//!
//! let shared = Registry::global().get_or_load(&definition).unwrap();
//! let settings = shared.read().unwrap();
//! settings.validate().unwrap();
//! println!("{}", settings["server"]);
//! ```
//!
//! # Layering
//!
//! From lowest to highest priority:
//!
//! 1. **Base** source file (YAML, TOML or JSON by extension)
//! 2. **Namespace** file `<stem>.<namespace>.<ext>` next to the source
//! 3. **Environment** variables `SETTINGS.<PATH>` when `use_env` is on
//! 4. **Runtime** merges performed by hooks or callers
//!
//! Policies (array handling, nil handling, knockouts, strict access) come
//! from [`Options`]: the process-wide instance in [`options`] unless a
//! definition carries its own.

/// Environment variable overlay.
pub mod env;
/// Settings error types.
pub mod error;
/// Field provenance tracking.
pub mod layers;
/// Definition loading.
pub mod loader;
/// Values stored in settings trees.
pub mod node;
/// Process-wide and explicit options.
pub mod options;
/// Shared instances per settings identity.
pub mod registry;
/// The navigable settings tree.
pub mod settings;
/// Loaded tree display.
pub mod show;
/// Source file reading and parsing.
pub mod source;
/// Schema validation.
pub mod validate;

pub use error::{SettingsError, SettingsResult};
pub use layers::{FieldSources, Layer};
pub use loader::{Definition, Hook, LoadedSettings, load};
pub use node::Node;
pub use options::{Converter, EnvOptions, Options};
pub use registry::{Registry, RegistryKey, SharedSettings};
pub use settings::Settings;
pub use show::ShowFormat;
pub use strata_core::{Deferred, Mapping, MergeOptions, Value};
pub use validate::{Schema, ValidationError};
