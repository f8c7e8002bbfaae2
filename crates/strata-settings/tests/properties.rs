//! Contract-level properties of wrapping, merging, access and loading.

mod common;

use common::yaml;
use strata_core::{MergeOptions, Value, merged};
use strata_settings::env::{cast_value, overlay_from_env};
use strata_settings::validate::validate;
use strata_settings::{
    Definition, EnvOptions, Node, Options, Schema, Settings, SettingsError, load,
};
use strata_test::FixtureDir;

#[test]
fn test_round_trip() {
    let plain = yaml(strata_test::SETTINGS_YML);
    assert_eq!(Settings::wrap(&plain).to_value(), plain);

    let with_nulls = yaml("a: ~\nb: [~, {c: ~}]\nd: {}\n");
    assert_eq!(Settings::wrap(&with_nulls).to_value(), with_nulls);
}

#[test]
fn test_merge_is_right_biased() {
    let options = MergeOptions::default();
    assert_eq!(
        merged(&yaml("a: 1"), &yaml("b: 2"), &options),
        yaml("a: 1\nb: 2")
    );
    assert_eq!(
        merged(&yaml("k: old\nother: x"), &yaml("k: new"), &options),
        yaml("k: new\nother: x")
    );
}

#[test]
fn test_array_overwrite_vs_append() {
    let current = yaml("ary: [1, 2]");
    let incoming = yaml("ary: [3]");

    assert_eq!(
        merged(&current, &incoming, &MergeOptions::default()),
        yaml("ary: [3]")
    );
    assert_eq!(
        merged(&current, &incoming, &MergeOptions::default().appending_arrays()),
        yaml("ary: [1, 2, 3]")
    );
}

#[test]
fn test_duplicate_suppression() {
    let options = MergeOptions::default()
        .appending_arrays()
        .without_array_duplicates();
    assert_eq!(
        merged(&yaml("ary: [1, 2]"), &yaml("ary: [2, 3]"), &options),
        yaml("ary: [1, 2, 3]")
    );
}

#[test]
fn test_nil_policy() {
    let current = yaml("x: 5");
    let incoming = yaml("x: ~");

    assert_eq!(
        merged(&current, &incoming, &MergeOptions::default()),
        yaml("x: 5")
    );
    assert_eq!(
        merged(&current, &incoming, &MergeOptions::default().with_nil_values()),
        yaml("x: ~")
    );
}

#[test]
fn test_strict_access_names_the_field() {
    let tree = Settings::wrap(&yaml("present: 1"));

    let lenient = Options::default();
    assert!(tree.attr_with("missingField", &lenient).unwrap().is_none());

    let strict = Options::default().failing_on_missing();
    let err = tree.attr_with("missingField", &strict).unwrap_err();
    assert!(matches!(&err, SettingsError::KeyNotFound { key } if key == "missingField"));
    assert!(err.to_string().contains("missingField"));
    assert_eq!(*tree.attr_with("present", &strict).unwrap().unwrap(), 1);
}

#[test]
fn test_freeze_propagates() {
    let mut tree = Settings::wrap(&yaml("a: {b: {c: 1}}\nlist: [{d: 2}, [{e: 3}]]\n"));
    tree.freeze();

    assert!(tree["a"].as_tree().unwrap().is_frozen());
    assert!(tree["a"]["b"].as_tree().unwrap().is_frozen());
    assert!(tree["list"][0].as_tree().unwrap().is_frozen());
    assert!(tree["list"][1][0].as_tree().unwrap().is_frozen());

    assert!(matches!(
        tree.merge_with(&yaml("a: 2"), &MergeOptions::default()),
        Err(SettingsError::Frozen { .. })
    ));
    assert!(matches!(tree.set("x", 1), Err(SettingsError::Frozen { .. })));
}

#[test]
fn test_env_overlay_keeps_plain_strings() {
    let overlay = overlay_from_env([("SETTINGS.NESTED.BAZ", "bar")], &EnvOptions::default()).unwrap();
    let result = merged(
        &yaml("nested: {foo: bar}"),
        &overlay,
        &MergeOptions::default(),
    );
    assert_eq!(result, yaml("nested: {foo: bar, baz: bar}"));
    assert_eq!(
        result.pointer(&["nested", "baz"]),
        Some(&Value::String("bar".to_owned()))
    );
}

#[test]
#[allow(clippy::approx_constant)]
fn test_env_auto_typing() {
    assert_eq!(cast_value("true"), Value::Bool(true));
    assert_eq!(cast_value("false"), Value::Bool(false));
    assert_eq!(cast_value("42"), Value::Integer(42));
    assert_eq!(cast_value("3.14"), Value::Float(3.14));
    assert_eq!(cast_value("2.5"), Value::Float(2.5));
    assert_eq!(cast_value("hello"), Value::String("hello".to_owned()));
}

#[test]
fn test_validation_reports_missing_field() {
    let schema = Schema::from_yaml("foo: {filled: true}\n").unwrap();

    let err = validate(&Settings::wrap(&yaml("bar: 1")), &schema, "SETTINGS").unwrap_err();
    assert!(err.to_string().contains("FOO"));

    assert!(validate(&Settings::wrap(&yaml("foo: x")), &schema, "SETTINGS").is_ok());
    assert!(validate(&Settings::wrap(&yaml("foo: ''")), &schema, "SETTINGS").is_err());
}

#[test]
fn test_literal_escape() {
    let tree = Settings::wrap(&yaml("cfg: {type: hash, contents: {a: 1}}"));

    assert!(matches!(tree["cfg"], Node::Mapping(_)));
    assert!(tree["cfg"].as_tree().is_none());
    assert_eq!(tree["cfg"]["a"], 1);
    assert_eq!(tree.to_value(), yaml("cfg: {a: 1}"));
}

#[test]
fn test_registry_returns_one_instance_per_identity() {
    let fixtures = FixtureDir::new();
    let registry = strata_settings::Registry::new();
    let definition = Definition::new("settings")
        .source(fixtures.path("settings_with_namespace.yml"))
        .namespace("production")
        .options(Options::default())
        .env_vars(Vec::<(String, String)>::new());

    let first = registry.get_or_load(&definition).unwrap();
    let second = registry.get_or_load(&definition).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));

    let other = registry
        .get_or_load(&definition.clone().namespace("development"))
        .unwrap();
    assert!(!std::sync::Arc::ptr_eq(&first, &other));
    assert_eq!(registry.len(), 2);

    assert!(load(&Definition::new("nothing")).is_err());
}
