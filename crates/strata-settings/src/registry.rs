//! One shared loaded instance per settings identity.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::debug;

use crate::error::{SettingsError, SettingsResult};
use crate::loader::{Definition, LoadedSettings, load};

/// A loaded tree shared between every holder of the same identity.
pub type SharedSettings = Arc<RwLock<LoadedSettings>>;

/// Identity of a loaded tree: its source file and namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryKey {
    /// Base source file.
    pub source: PathBuf,
    /// Namespace, if any.
    pub namespace: Option<String>,
}

impl RegistryKey {
    /// Build a key from its parts.
    pub fn new(source: impl Into<PathBuf>, namespace: Option<&str>) -> Self {
        Self {
            source: source.into(),
            namespace: namespace.map(str::to_owned),
        }
    }

    fn for_definition(definition: &Definition) -> SettingsResult<Self> {
        let source = definition
            .source_path()
            .ok_or(SettingsError::SourceNotDefined)?;
        Ok(Self::new(source, definition.namespace_name()))
    }
}

/// Lazily loads each identity once and hands out the same instance after.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Mutex<HashMap<RegistryKey, SharedSettings>>,
}

static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::new);

impl Registry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// The instance for `definition`, loading it on first request.
    ///
    /// The load runs under the registry lock, so concurrent first requests
    /// load once.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::SourceNotDefined`] for a definition without
    /// source, or any error of [`load`]. A failed load is not cached.
    pub fn get_or_load(&self, definition: &Definition) -> SettingsResult<SharedSettings> {
        let key = RegistryKey::for_definition(definition)?;
        let mut entries = self.lock();

        if let Some(shared) = entries.get(&key) {
            return Ok(Arc::clone(shared));
        }

        let shared = Arc::new(RwLock::new(load(definition)?));
        debug!(source = %key.source.display(), "registered settings instance");
        entries.insert(key, Arc::clone(&shared));
        Ok(shared)
    }

    /// The instance for an identity, if loaded.
    #[must_use]
    pub fn get(&self, source: &Path, namespace: Option<&str>) -> Option<SharedSettings> {
        self.lock()
            .get(&RegistryKey::new(source, namespace))
            .map(Arc::clone)
    }

    /// Drop an identity so the next request reloads it.
    pub fn evict(&self, source: &Path, namespace: Option<&str>) -> Option<SharedSettings> {
        self.lock().remove(&RegistryKey::new(source, namespace))
    }

    /// Drop every identity.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of loaded identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RegistryKey, SharedSettings>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::options::Options;

    fn definition(source: &Path) -> Definition {
        Definition::new("app")
            .source(source)
            .options(Options::default())
            .env_vars(Vec::<(String, String)>::new())
    }

    #[test]
    fn test_same_identity_same_instance() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("settings.yml");
        fs::write(&source, "size: 1\n").unwrap();

        let registry = Registry::new();
        let first = registry.get_or_load(&definition(&source)).unwrap();
        let second = registry.get_or_load(&definition(&source)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);

        first.write().unwrap().set("size", 2).unwrap();
        assert_eq!(second.read().unwrap()["size"], 2);
    }

    #[test]
    fn test_namespace_is_part_of_identity() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("settings.yml");
        fs::write(&source, "size: 1\n").unwrap();

        let registry = Registry::new();
        let plain = registry.get_or_load(&definition(&source)).unwrap();
        let namespaced = registry
            .get_or_load(&definition(&source).namespace("test"))
            .unwrap();
        assert!(!Arc::ptr_eq(&plain, &namespaced));
        assert_eq!(registry.len(), 2);
        assert!(registry.get(&source, Some("test")).is_some());
        assert!(registry.get(&source, Some("other")).is_none());
    }

    #[test]
    fn test_evict_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("settings.yml");
        fs::write(&source, "size: 1\n").unwrap();

        let registry = Registry::new();
        let first = registry.get_or_load(&definition(&source)).unwrap();
        fs::write(&source, "size: 2\n").unwrap();

        assert!(registry.evict(&source, None).is_some());
        let reloaded = registry.get_or_load(&definition(&source)).unwrap();
        assert!(!Arc::ptr_eq(&first, &reloaded));
        assert_eq!(reloaded.read().unwrap()["size"], 2);

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_failed_load_not_cached() {
        let registry = Registry::new();
        assert!(matches!(
            registry.get_or_load(&Definition::new("empty")),
            Err(SettingsError::SourceNotDefined)
        ));
        assert!(
            registry
                .get_or_load(&definition(Path::new("/nonexistent/settings.yml")))
                .is_err()
        );
        assert!(registry.is_empty());
    }
}
