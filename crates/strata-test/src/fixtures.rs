//! Fixture settings documents.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// Variable expanded by `${EMBEDDED_VALUE}` in [`SETTINGS_YML`].
pub const EMBEDDED_VAR: &str = "EMBEDDED_VALUE";

/// Base fixture covering every value shape.
pub const SETTINGS_YML: &str = r"bool_true: true
bool_false: false
string: foo
integer: 1
float: 1.0
foo: bar
nested:
  foo: bar
deep:
  nested:
    warn_threshold: 100
ary:
  - foo
  - bar
ary_of_hash:
  - foo: bar
  - baz: bar
ary_of_ary:
  - [foo, bar]
  - [baz, bar]
ary_of_mix:
  - [foo, bar]
  - foo: bar
embedded: ${EMBEDDED_VALUE}
";

/// JSON export of [`SETTINGS_YML`] with [`fixture_env`] applied.
pub const SETTINGS_JSON: &str = concat!(
    r#"{"bool_true":true,"bool_false":false,"string":"foo","integer":1,"float":1.0,"#,
    r#""foo":"bar","nested":{"foo":"bar"},"deep":{"nested":{"warn_threshold":100}},"#,
    r#""ary":["foo","bar"],"ary_of_hash":[{"foo":"bar"},{"baz":"bar"}],"#,
    r#""ary_of_ary":[["foo","bar"],["baz","bar"]],"ary_of_mix":[["foo","bar"],{"foo":"bar"}],"#,
    r#""embedded":6}"#
);

/// Base file of the namespaced fixture.
pub const SETTINGS_WITH_NAMESPACE_YML: &str = r"foo: bar
nested:
  foo: bar
deep:
  nested:
    warn_threshold: 100
ary:
  - foo
  - bar
";

/// `development` overlay of [`SETTINGS_WITH_NAMESPACE_YML`].
pub const SETTINGS_WITH_NAMESPACE_DEVELOPMENT_YML: &str = r"deep:
  nested:
    warn_threshold: 50
    warn_account: foo
";

/// `production` overlay of [`SETTINGS_WITH_NAMESPACE_YML`].
pub const SETTINGS_WITH_NAMESPACE_PRODUCTION_YML: &str = r"deep:
  nested:
    warn_account: foo
";

/// Schema accepted by the `production` namespace.
pub const PRODUCTION_SCHEMA_YML: &str = r"foo:
  filled: true
nested:
  schema:
    foo:
      filled: true
deep:
  schema:
    nested:
      schema:
        warn_threshold:
          filled: true
          type: integer
        warn_account:
          filled: true
";

/// Every fixture file by name.
pub const FIXTURE_FILES: &[(&str, &str)] = &[
    ("settings.yml", SETTINGS_YML),
    ("settings_with_namespace.yml", SETTINGS_WITH_NAMESPACE_YML),
    (
        "settings_with_namespace.development.yml",
        SETTINGS_WITH_NAMESPACE_DEVELOPMENT_YML,
    ),
    (
        "settings_with_namespace.production.yml",
        SETTINGS_WITH_NAMESPACE_PRODUCTION_YML,
    ),
    ("production_schema.yml", PRODUCTION_SCHEMA_YML),
];

/// Variable set the fixtures are loaded with.
#[must_use]
pub fn fixture_env() -> HashMap<String, String> {
    HashMap::from([(EMBEDDED_VAR.to_owned(), "6".to_owned())])
}

/// [`fixture_env`] plus extra variables.
#[must_use]
pub fn fixture_env_with(extra: &[(&str, &str)]) -> HashMap<String, String> {
    let mut env = fixture_env();
    env.extend(
        extra
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned())),
    );
    env
}

/// A temporary directory holding every fixture file.
///
/// Removed when dropped.
#[derive(Debug)]
pub struct FixtureDir {
    dir: TempDir,
}

impl FixtureDir {
    /// Create the directory and write [`FIXTURE_FILES`] into it.
    ///
    /// # Panics
    ///
    /// Panics if the directory or a file cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let fixtures = Self::empty();
        for (name, body) in FIXTURE_FILES {
            fixtures.write(name, body);
        }
        fixtures
    }

    /// Create the directory without any file.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            dir: TempDir::with_prefix("strata-fixtures-").expect("Failed to create temp directory"),
        }
    }

    /// Path of `name` inside the directory, whether or not it exists.
    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write (or overwrite) `name` with `body`, returning its path.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write(&self, name: &str, body: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, body).expect("Failed to write fixture file");
        path
    }
}

impl Default for FixtureDir {
    fn default() -> Self {
        Self::new()
    }
}
