//! The navigable settings tree.

use std::ops::Index;

use indexmap::IndexMap;
use indexmap::map::{Iter, Keys, Values};
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use strata_core::{Mapping, MergeObserver, MergeOptions, Value, deep_merge, deep_merge_observed};
use tracing::debug;

use crate::error::{SettingsError, SettingsResult};
use crate::node::{NULL, Node};
use crate::options::{self, Options};

/// Key used in [`SettingsError::Frozen`] for whole-tree operations.
const WHOLE_TREE: &str = "*";

/// A mutable, navigable mapping of settings.
///
/// Every mapping-valued entry is itself a `Settings`, and mapping elements of
/// sequences are wrapped the same way, so nested fields read naturally:
///
/// ```rust
/// use strata_core::Value;
/// use strata_settings::Settings;
///
/// let parsed: Value = serde_yaml::from_str("server:\n  port: 8080\n").unwrap();
/// let settings = Settings::wrap(&parsed);
/// assert_eq!(settings["server"]["port"], 8080);
/// assert_eq!(settings.dig_path("server.port").and_then(|n| n.as_i64()), Some(8080));
/// ```
///
/// Equality compares content only; the frozen flag is ignored.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    entries: IndexMap<String, Node>,
    frozen: bool,
}

impl Settings {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a plain tree. Anything other than a mapping yields an empty tree.
    #[must_use]
    pub fn wrap(val: &Value) -> Self {
        val.as_mapping().map(Self::from_mapping).unwrap_or_default()
    }

    pub(crate) fn from_mapping(map: &Mapping) -> Self {
        Self {
            entries: map
                .iter()
                .map(|(key, val)| (key.clone(), Node::wrap(val)))
                .collect(),
            frozen: false,
        }
    }

    /// Look up a direct entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    /// Mutable access to a direct entry.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Frozen`] if the tree is frozen.
    pub fn get_mut(&mut self, key: &str) -> SettingsResult<Option<&mut Node>> {
        self.ensure_mutable(key)?;
        Ok(self.entries.get_mut(key))
    }

    /// Store `value` under `key`, replacing any previous entry.
    ///
    /// Plain mappings passed as [`Value`] are wrapped into nested trees.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Frozen`] if the tree is frozen.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Node>) -> SettingsResult<()> {
        let key = key.into();
        self.ensure_mutable(&key)?;
        self.entries.insert(key, value.into());
        Ok(())
    }

    /// Remove an entry, keeping the order of the others.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Frozen`] if the tree is frozen.
    pub fn remove(&mut self, key: &str) -> SettingsResult<Option<Node>> {
        self.ensure_mutable(key)?;
        Ok(self.entries.shift_remove(key))
    }

    /// Returns `true` if `key` holds a non-null value.
    ///
    /// `false` is a value, so a key holding `false` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|node| !node.is_null())
    }

    /// The value under `key` when [`contains_key`](Self::contains_key) holds.
    #[must_use]
    pub fn fetch(&self, key: &str) -> Option<&Node> {
        self.entries.get(key).filter(|node| !node.is_null())
    }

    /// The value under `key`, or `default` when it is absent or null.
    #[must_use]
    pub fn fetch_or(&self, key: &str, default: impl Into<Node>) -> Node {
        self.fetch(key).cloned().unwrap_or_else(|| default.into())
    }

    /// The value under `key`, or the result of `fallback` when it is absent
    /// or null. `fallback` only runs in the latter case.
    pub fn fetch_or_else<F, N>(&self, key: &str, fallback: F) -> Node
    where
        F: FnOnce() -> N,
        N: Into<Node>,
    {
        self.fetch(key)
            .cloned()
            .unwrap_or_else(|| fallback().into())
    }

    /// Walk nested trees, literal mappings and sequences by path segments.
    ///
    /// Numeric segments index into sequences. Returns `None` as soon as a
    /// segment is missing.
    #[must_use]
    pub fn dig(&self, path: &[&str]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut current = self.entries.get(*first)?;
        for segment in rest {
            current = match current {
                Node::Sequence(seq) => seq.get(segment.parse::<usize>().ok()?)?,
                other => other.get(segment)?,
            };
        }
        Some(current)
    }

    /// [`dig`](Self::dig) with a dot-separated path such as `"a.b.c"`.
    #[must_use]
    pub fn dig_path(&self, path: &str) -> Option<&Node> {
        let segments: Vec<&str> = path.split('.').collect();
        self.dig(&segments)
    }

    /// Attribute-style read honoring the process-wide `fail_on_missing`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::KeyNotFound`] in strict mode when `name` is
    /// absent or null.
    pub fn attr(&self, name: &str) -> SettingsResult<Option<&Node>> {
        self.attr_with(name, &options::current())
    }

    /// Attribute-style read with explicit options.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::KeyNotFound`] when `options.fail_on_missing`
    /// is set and `name` is absent or null.
    pub fn attr_with(&self, name: &str, options: &Options) -> SettingsResult<Option<&Node>> {
        if options.fail_on_missing && !self.contains_key(name) {
            return Err(SettingsError::KeyNotFound {
                key: name.to_owned(),
            });
        }
        Ok(self.entries.get(name))
    }

    /// Iterate over entries in insertion order, null entries included.
    pub fn iter(&self) -> Iter<'_, String, Node> {
        self.entries.iter()
    }

    /// Iterate over keys in insertion order.
    pub fn keys(&self) -> Keys<'_, String, Node> {
        self.entries.keys()
    }

    /// Iterate over values in insertion order.
    pub fn values(&self) -> Values<'_, String, Node> {
        self.entries.values()
    }

    /// Number of direct entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Export as a plain mapping.
    ///
    /// Deferred leaves are invoked on every call; the result holds no
    /// deferred values and no wrapped trees.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Mapping(
            self.entries
                .iter()
                .map(|(key, node)| (key.clone(), node.to_value()))
                .collect(),
        )
    }

    /// Alias of [`to_value`](Self::to_value).
    #[must_use]
    pub fn export(&self) -> Value {
        self.to_value()
    }

    /// Compact JSON of the exported tree.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Serialize`] if encoding fails.
    pub fn to_json(&self) -> SettingsResult<String> {
        Ok(serde_json::to_string(&self.to_value())?)
    }

    /// Pretty-printed JSON of the exported tree.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Serialize`] if encoding fails.
    pub fn to_json_pretty(&self) -> SettingsResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_value())?)
    }

    /// YAML of the exported tree.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Serialize`] if encoding fails.
    pub fn to_yaml(&self) -> SettingsResult<String> {
        Ok(serde_yaml::to_string(&self.to_value())?)
    }

    /// Deserialize the exported tree into a typed struct.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Serialize`] if the shape does not match `T`.
    pub fn extract<T: DeserializeOwned>(&self) -> SettingsResult<T> {
        let json = serde_json::to_value(self.to_value())?;
        Ok(serde_json::from_value(json)?)
    }

    /// Deep-merge `overlay` into this tree using the process-wide merge
    /// options.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Frozen`] if the tree is frozen.
    pub fn merge(&mut self, overlay: &Value) -> SettingsResult<&mut Self> {
        let options = options::current().merge;
        self.merge_with(overlay, &options)
    }

    /// Deep-merge `overlay` into this tree with explicit merge options.
    ///
    /// The tree is exported, merged and re-wrapped, so existing deferred
    /// leaves are evaluated once and stored as their results. Deferred
    /// leaves carried by `overlay` are kept. An overlay that is not a
    /// mapping leaves the tree untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Frozen`] if the tree is frozen.
    pub fn merge_with(
        &mut self,
        overlay: &Value,
        options: &MergeOptions,
    ) -> SettingsResult<&mut Self> {
        self.ensure_mutable(WHOLE_TREE)?;
        if !overlay.is_mapping() {
            debug!("ignoring non-mapping overlay");
            return Ok(self);
        }
        let mut current = self.to_value();
        deep_merge(&mut current, overlay, options);
        self.replace_content(&current);
        Ok(self)
    }

    /// [`merge_with`](Self::merge_with), reporting touched paths to
    /// `observer`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Frozen`] if the tree is frozen.
    pub fn merge_observed(
        &mut self,
        overlay: &Value,
        options: &MergeOptions,
        observer: &mut dyn MergeObserver,
    ) -> SettingsResult<&mut Self> {
        self.ensure_mutable(WHOLE_TREE)?;
        if !overlay.is_mapping() {
            debug!("ignoring non-mapping overlay");
            return Ok(self);
        }
        let mut current = self.to_value();
        deep_merge_observed(&mut current, overlay, options, observer);
        self.replace_content(&current);
        Ok(self)
    }

    /// Recursively forbid mutation of this tree and every nested tree,
    /// including trees inside sequences. Irreversible.
    pub fn freeze(&mut self) -> &mut Self {
        self.frozen = true;
        self.entries.values_mut().for_each(Node::freeze);
        self
    }

    /// Returns `true` once [`freeze`](Self::freeze) has run.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn replace_content(&mut self, merged: &Value) {
        self.entries = Self::wrap(merged).entries;
        debug!(keys = self.entries.len(), "merged overlay into settings");
    }

    fn ensure_mutable(&self, key: &str) -> SettingsResult<()> {
        if self.frozen {
            return Err(SettingsError::frozen(key));
        }
        Ok(())
    }
}

impl PartialEq for Settings {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Index<&str> for Settings {
    type Output = Node;

    fn index(&self, key: &str) -> &Node {
        self.entries.get(key).unwrap_or(&NULL)
    }
}

impl<'a> IntoIterator for &'a Settings {
    type Item = (&'a String, &'a Node);
    type IntoIter = Iter<'a, String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K: Into<String>, N: Into<Node>> FromIterator<(K, N)> for Settings {
    fn from_iter<I: IntoIterator<Item = (K, N)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, n)| (k.into(), n.into()))
                .collect(),
            frozen: false,
        }
    }
}

impl From<&Value> for Settings {
    fn from(val: &Value) -> Self {
        Self::wrap(val)
    }
}

impl Serialize for Settings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use strata_core::Deferred;

    use super::*;

    fn yaml(src: &str) -> Value {
        serde_yaml::from_str(src).unwrap()
    }

    fn sample() -> Settings {
        Settings::wrap(&yaml(
            "size: 1\n\
             server: google.com\n\
             inner:\n  something1: blah1\n  something2: blah2\n\
             deep:\n  nested:\n    warn_threshold: 100\n\
             array:\n  - {name: first}\n  - [{name: nested}]\n\
             enabled: false\n\
             nothing: ~\n",
        ))
    }

    #[test]
    fn test_wrap_round_trip() {
        let settings = sample();
        assert_eq!(Settings::wrap(&settings.to_value()), settings);
    }

    #[test]
    fn test_wrap_non_mapping_is_empty() {
        assert!(Settings::wrap(&Value::from(vec![1, 2])).is_empty());
        assert!(Settings::wrap(&Value::Null).is_empty());
    }

    #[test]
    fn test_nested_access() {
        let settings = sample();
        assert_eq!(settings["inner"]["something1"], "blah1");
        assert_eq!(settings["deep"]["nested"]["warn_threshold"], 100);
        assert!(settings["array"][0].as_tree().is_some());
        assert_eq!(settings["array"][1][0]["name"], "nested");
        assert!(settings["missing"].is_null());
    }

    #[test]
    fn test_dig() {
        let settings = sample();
        assert_eq!(
            settings.dig(&["deep", "nested", "warn_threshold"]),
            Some(&Node::Integer(100))
        );
        assert_eq!(settings.dig_path("array.1.0.name"), Some(&Node::from("nested")));
        assert_eq!(settings.dig(&["deep", "missing", "x"]), None);
        assert_eq!(settings.dig(&["size", "x"]), None);
        assert_eq!(settings.dig(&[]), None);
    }

    #[test]
    fn test_dig_through_literal_mapping() {
        let settings = Settings::wrap(&yaml("lit:\n  type: hash\n  contents:\n    a: {b: 1}\n"));
        assert!(settings["lit"].as_mapping().is_some());
        assert_eq!(settings.dig(&["lit", "a", "b"]), Some(&Node::Integer(1)));
    }

    #[test]
    fn test_contains_key_and_fetch() {
        let settings = sample();
        assert!(settings.contains_key("size"));
        assert!(settings.contains_key("enabled"));
        assert!(!settings.contains_key("nothing"));
        assert!(!settings.contains_key("missing"));

        assert_eq!(settings.fetch("size"), Some(&Node::Integer(1)));
        assert_eq!(settings.fetch("nothing"), None);
        assert_eq!(settings.fetch_or("missing", "fallback"), "fallback");
        assert_eq!(settings.fetch_or("size", 9), 1);
    }

    #[test]
    fn test_fetch_or_else_runs_only_when_missing() {
        let settings = sample();
        let mut ran = false;
        let found = settings.fetch_or_else("size", || {
            ran = true;
            0
        });
        assert_eq!(found, 1);
        assert!(!ran);
        assert_eq!(settings.fetch_or_else("missing", || "computed"), "computed");
    }

    #[test]
    fn test_attr_with_strict_and_lenient() {
        let settings = sample();
        let lenient = Options::default();
        let strict = Options::default().failing_on_missing();

        assert_eq!(settings.attr_with("not_existing", &lenient).unwrap(), None);
        let err = settings.attr_with("not_existing", &strict).unwrap_err();
        assert_eq!(err.to_string(), "key not found: not_existing");
        assert!(settings.attr_with("nothing", &strict).is_err());
        assert_eq!(
            settings.attr_with("size", &strict).unwrap(),
            Some(&Node::Integer(1))
        );
    }

    #[test]
    fn test_set_and_remove_keep_order() {
        let mut settings = Settings::new();
        settings.set("b", 1).unwrap();
        settings.set("a", 2).unwrap();
        settings.set("c", yaml("x: 1")).unwrap();
        assert_eq!(settings.keys().collect::<Vec<_>>(), ["b", "a", "c"]);
        assert!(settings["c"].as_tree().is_some());

        assert_eq!(settings.remove("a").unwrap(), Some(Node::Integer(2)));
        assert_eq!(settings.keys().collect::<Vec<_>>(), ["b", "c"]);
    }

    #[test]
    fn test_iteration_yields_null_entries() {
        let settings = sample();
        assert!(settings.iter().any(|(k, v)| k == "nothing" && v.is_null()));
        assert_eq!(settings.len(), settings.values().count());
        assert_eq!((&settings).into_iter().count(), settings.len());
    }

    #[test]
    fn test_merge_in_place() {
        let mut settings = sample();
        settings
            .merge_with(&yaml("inner: {something2: changed}\nnew: 1"), &MergeOptions::default())
            .unwrap()
            .merge_with(&yaml("size: 2"), &MergeOptions::default())
            .unwrap();

        assert_eq!(settings["inner"]["something1"], "blah1");
        assert_eq!(settings["inner"]["something2"], "changed");
        assert_eq!(settings["new"], 1);
        assert_eq!(settings["size"], 2);
    }

    #[test]
    fn test_merge_respects_array_policy() {
        let mut replaced = Settings::wrap(&yaml("ary: [1, 2]"));
        replaced
            .merge_with(&yaml("ary: [3]"), &MergeOptions::default())
            .unwrap();
        assert_eq!(replaced.to_value(), yaml("ary: [3]"));

        let mut appended = Settings::wrap(&yaml("ary: [1, 2]"));
        appended
            .merge_with(&yaml("ary: [2, 3]"), &MergeOptions::default().appending_arrays())
            .unwrap();
        assert_eq!(appended.to_value(), yaml("ary: [1, 2, 2, 3]"));
    }

    #[test]
    fn test_freeze_propagates() {
        let mut settings = sample();
        settings.freeze();

        assert!(settings.is_frozen());
        assert!(settings["inner"].as_tree().unwrap().is_frozen());
        assert!(settings["deep"]["nested"].as_tree().unwrap().is_frozen());
        assert!(settings["array"][0].as_tree().unwrap().is_frozen());
        assert!(settings["array"][1][0].as_tree().unwrap().is_frozen());

        assert!(matches!(
            settings.set("size", 2),
            Err(SettingsError::Frozen { .. })
        ));
        assert!(settings.merge_with(&yaml("size: 2"), &MergeOptions::default()).is_err());
        assert!(settings.remove("size").is_err());
        assert!(settings.get_mut("size").is_err());
        assert_eq!(settings["size"], 1);
    }

    #[test]
    fn test_non_mapping_overlay_is_ignored() {
        let mut settings = Settings::wrap(&yaml("a: 1\nb: {c: 2}"));
        settings
            .merge_with(&Value::from("oops"), &MergeOptions::default())
            .unwrap();
        settings
            .merge_with(&yaml("[1, 2]"), &MergeOptions::default())
            .unwrap();
        assert_eq!(settings.to_value(), yaml("a: 1\nb: {c: 2}"));
        assert_eq!(settings.len(), 2);
    }

    #[test]
    fn test_frozen_ignored_by_equality() {
        let mut frozen = sample();
        frozen.freeze();
        assert_eq!(frozen, sample());
    }

    #[test]
    fn test_deferred_reevaluated_on_every_export() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut settings = Settings::new();
        settings
            .set(
                "stamp",
                Deferred::new(move || {
                    Value::from(i64::try_from(counter.fetch_add(1, Ordering::SeqCst)).unwrap())
                }),
            )
            .unwrap();

        assert_eq!(settings.to_value(), yaml("stamp: 0"));
        let second = settings.to_value();
        assert_eq!(second, yaml("stamp: 1"));
        assert!(!second.has_deferred());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_to_json_order_and_floats() {
        let settings = Settings::wrap(&yaml("z: 1\na: 1.0\nm: [x]"));
        assert_eq!(settings.to_json().unwrap(), r#"{"z":1,"a":1.0,"m":["x"]}"#);
    }

    #[test]
    fn test_extract_typed() {
        #[derive(serde::Deserialize)]
        struct Inner {
            something1: String,
            something2: String,
        }
        let settings = sample();
        let inner: Inner = settings["inner"].extract().unwrap();
        assert_eq!(inner.something1, "blah1");
        assert_eq!(inner.something2, "blah2");
    }
}
