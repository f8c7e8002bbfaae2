//! Loading a settings definition from its files and the environment.
//!
//! # Load order
//!
//! 1. The base source file (`${VAR}` references expanded, parsed by
//!    extension).
//! 2. The namespace file `<stem>.<namespace>.<ext>` next to the source, if a
//!    namespace is set and the file exists.
//! 3. The `before_env` hook.
//! 4. The environment overlay, when `use_env` is on.
//! 5. The `after_load` hook.
//!
//! The base file is taken as written. The namespace file and the environment
//! overlay are merged with the definition's merge options.

use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use strata_core::{MergeOptions, Value, deep_merge_observed};
use tracing::{debug, info};

use crate::env::{collect_env_vars, overlay_from_env};
use crate::error::{SettingsError, SettingsResult};
use crate::layers::{FieldSources, Layer, LayerRecorder};
use crate::options::{self, DEFAULT_ENV_PREFIX, Options};
use crate::settings::Settings;
use crate::source::{load_source, namespace_path, try_load_source};
use crate::validate::{self, Schema};

/// A hook run against the tree while it is being loaded.
pub type Hook = Arc<dyn Fn(&mut Settings) -> SettingsResult<()> + Send + Sync>;

/// Declaration of one settings profile: where it comes from and how it is
/// post-processed.
///
/// ```rust,no_run
/// use strata_settings::{Definition, load};
///
/// let definition = Definition::new("app")
///     .source("config/settings.yml")
///     .namespace("production");
/// let settings = load(&definition).unwrap();
/// println!("{}", settings["server"]);
/// ```
#[derive(Clone, Default)]
pub struct Definition {
    name: String,
    source: Option<PathBuf>,
    namespace: Option<String>,
    schema: OnceLock<Schema>,
    before_env: Option<Hook>,
    after_load: Option<Hook>,
    options: Option<Options>,
    env: Option<HashMap<String, String>>,
}

impl Definition {
    /// Start a definition named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the base source file.
    #[must_use]
    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// Set the namespace whose sibling file overlays the source.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Run `hook` after the files are merged and before the environment
    /// overlay.
    #[must_use]
    pub fn before_env<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Settings) -> SettingsResult<()> + Send + Sync + 'static,
    {
        self.before_env = Some(Arc::new(hook));
        self
    }

    /// Run `hook` once everything else is merged.
    #[must_use]
    pub fn after_load<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Settings) -> SettingsResult<()> + Send + Sync + 'static,
    {
        self.after_load = Some(Arc::new(hook));
        self
    }

    /// Use `options` instead of the process-wide options.
    #[must_use]
    pub fn options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Read template variables and the overlay from `vars` instead of the
    /// process environment.
    #[must_use]
    pub fn env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Attach the validation schema. A schema can be set only once.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::SchemaAlreadyDefined`] on a second call.
    pub fn set_schema(&self, schema: Schema) -> SettingsResult<()> {
        self.schema
            .set(schema)
            .map_err(|_| SettingsError::SchemaAlreadyDefined {
                name: self.name.clone(),
            })
    }

    /// Builder form of [`set_schema`](Self::set_schema).
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::SchemaAlreadyDefined`] if a schema is
    /// already attached.
    pub fn with_schema(self, schema: Schema) -> SettingsResult<Self> {
        self.set_schema(schema)?;
        Ok(self)
    }

    /// Name of the definition.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base source file, if set.
    #[must_use]
    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Namespace, if set.
    #[must_use]
    pub fn namespace_name(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Attached schema, if any.
    #[must_use]
    pub fn schema(&self) -> Option<&Schema> {
        self.schema.get()
    }

    fn effective_options(&self) -> Options {
        self.options.clone().unwrap_or_else(options::current)
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("namespace", &self.namespace)
            .field("has_schema", &self.schema.get().is_some())
            .field("has_before_env", &self.before_env.is_some())
            .field("has_after_load", &self.after_load.is_some())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// A loaded settings tree with the provenance of its fields.
///
/// Dereferences to [`Settings`].
#[derive(Debug, Clone)]
pub struct LoadedSettings {
    settings: Settings,
    source: PathBuf,
    namespace: Option<String>,
    loaded_files: Vec<PathBuf>,
    field_sources: FieldSources,
    schema: Option<Schema>,
    env_prefix: String,
    merge_options: MergeOptions,
}

impl LoadedSettings {
    /// Validate against the definition's schema. No schema passes.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Validation`] listing every invalid field.
    pub fn validate(&self) -> SettingsResult<()> {
        match &self.schema {
            Some(schema) => validate::validate(&self.settings, schema, &self.env_prefix),
            None => Ok(()),
        }
    }

    /// Deep-merge `overlay`, attributing its fields to [`Layer::Runtime`].
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Frozen`] if the tree is frozen.
    pub fn merge(&mut self, overlay: &Value) -> SettingsResult<&mut Self> {
        let mut recorder = LayerRecorder::new(Layer::Runtime, &mut self.field_sources);
        self.settings
            .merge_observed(overlay, &self.merge_options, &mut recorder)?;
        Ok(self)
    }

    /// The base source file.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The namespace, if one was set.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Files that contributed, in merge order.
    #[must_use]
    pub fn loaded_files(&self) -> &[PathBuf] {
        &self.loaded_files
    }

    /// Dotted field path → layer that set it.
    #[must_use]
    pub fn field_sources(&self) -> &FieldSources {
        &self.field_sources
    }

    /// The tree itself.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Take the tree, dropping provenance.
    #[must_use]
    pub fn into_settings(self) -> Settings {
        self.settings
    }
}

impl Deref for LoadedSettings {
    type Target = Settings;

    fn deref(&self) -> &Settings {
        &self.settings
    }
}

impl DerefMut for LoadedSettings {
    fn deref_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }
}

/// Load a definition.
///
/// # Errors
///
/// - [`SettingsError::SourceNotDefined`] if the definition has no source.
/// - [`SettingsError::EnvPrefixNotDefined`] if the overlay is enabled
///   without a prefix.
/// - Read, parse and hook errors as they occur.
pub fn load(definition: &Definition) -> SettingsResult<LoadedSettings> {
    let source = definition
        .source
        .clone()
        .ok_or(SettingsError::SourceNotDefined)?;
    let options = definition.effective_options();
    let env = definition.env.clone().unwrap_or_else(collect_env_vars);

    let mut field_sources = FieldSources::new();
    let mut loaded_files = Vec::new();
    let mut tree = Value::mapping();

    let base = load_source(&source, &env)?;
    deep_merge_observed(
        &mut tree,
        &base,
        &MergeOptions::default(),
        &mut LayerRecorder::new(Layer::Base, &mut field_sources),
    );
    loaded_files.push(source.clone());

    if let Some(namespace) = &definition.namespace {
        let path = namespace_path(&source, namespace);
        if let Some(overlay) = try_load_source(&path, &env)? {
            deep_merge_observed(
                &mut tree,
                &overlay,
                &options.merge,
                &mut LayerRecorder::new(Layer::Namespace, &mut field_sources),
            );
            loaded_files.push(path);
        }
    }

    let mut settings = Settings::wrap(&tree);

    if let Some(hook) = &definition.before_env {
        debug!(definition = %definition.name, "running before_env hook");
        hook(&mut settings)?;
    }

    if options.use_env {
        if options.env.prefix.is_none() {
            return Err(SettingsError::EnvPrefixNotDefined);
        }
        let overlay = overlay_from_env(&env, &options.env)?;
        settings.merge_observed(
            &overlay,
            &options.merge,
            &mut LayerRecorder::new(Layer::Environment, &mut field_sources),
        )?;
    }

    if let Some(hook) = &definition.after_load {
        debug!(definition = %definition.name, "running after_load hook");
        hook(&mut settings)?;
    }

    info!(
        definition = %definition.name,
        source = %source.display(),
        namespace = definition.namespace.as_deref().unwrap_or(""),
        files = loaded_files.len(),
        "loaded settings"
    );

    Ok(LoadedSettings {
        settings,
        source,
        namespace: definition.namespace.clone(),
        loaded_files,
        field_sources,
        schema: definition.schema().cloned(),
        env_prefix: options
            .env
            .prefix
            .unwrap_or_else(|| DEFAULT_ENV_PREFIX.to_owned()),
        merge_options: options.merge,
    })
}
