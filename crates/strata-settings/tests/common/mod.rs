//! Shared helpers for the settings integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use strata_core::Value;
use strata_settings::{Definition, Options};
use strata_test::{FixtureDir, fixture_env};

/// A definition over a fixture file, isolated from process state.
pub fn fixture_definition(fixtures: &FixtureDir, file: &str, options: Options) -> Definition {
    fixture_definition_with_env(fixtures, file, options, fixture_env())
}

/// [`fixture_definition`] with an explicit variable set.
pub fn fixture_definition_with_env(
    fixtures: &FixtureDir,
    file: &str,
    options: Options,
    env: HashMap<String, String>,
) -> Definition {
    Definition::new(file)
        .source(fixtures.path(file))
        .options(options)
        .env_vars(env)
}

/// Parse an inline YAML document.
pub fn yaml(src: &str) -> Value {
    serde_yaml::from_str(src).unwrap()
}

/// The export of `settings.yml`, with `replace` merged over it.
pub fn expected_settings(replace: &str) -> Value {
    let mut expected = yaml(strata_test::SETTINGS_YML);
    if let Some(map) = expected.as_mapping_mut() {
        map.insert("embedded".to_owned(), Value::Integer(6));
    }
    if replace.trim().is_empty() {
        return expected;
    }
    strata_core::merged(&expected, &yaml(replace), &strata_core::MergeOptions::default())
}
