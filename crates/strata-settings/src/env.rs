//! Environment variable overlay.
//!
//! Variables named `<PREFIX><SEP><SEGMENT>...` become a nested mapping that
//! is merged over the loaded settings. With the defaults,
//! `SETTINGS.DEEP.NESTED.BAZ=bar` turns into `{deep: {nested: {baz: "bar"}}}`.

use std::collections::{BTreeMap, HashMap};

use strata_core::{Mapping, Value};
use tracing::debug;

use crate::error::{SettingsError, SettingsResult};
use crate::options::EnvOptions;

/// Build the overlay tree from a set of environment variables.
///
/// Variables are visited in name order, so when two names map onto the same
/// path the later name wins. A scalar sitting where a longer name needs an
/// intermediate mapping is replaced by that mapping.
///
/// # Errors
///
/// Returns [`SettingsError::EnvPrefixNotDefined`] if `vars` is not empty
/// and `options` carries no prefix.
pub fn overlay_from_env<I, K, V>(vars: I, options: &EnvOptions) -> SettingsResult<Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let vars: BTreeMap<String, String> = vars
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();

    if vars.is_empty() {
        return Ok(Value::mapping());
    }

    let prefix = options
        .prefix
        .as_deref()
        .ok_or(SettingsError::EnvPrefixNotDefined)?;
    let separator = options.separator.as_str();
    let prefix_segments: Vec<&str> = split_name(prefix, separator);

    let mut root = Mapping::new();
    let mut applied: usize = 0;

    for (name, raw) in &vars {
        let segments = split_name(name, separator);
        let Some(rest) = segments.strip_prefix(prefix_segments.as_slice()) else {
            continue;
        };
        if rest.is_empty() || rest.iter().any(|s| s.is_empty()) {
            debug!(var = %name, "skipping env var with empty path segment");
            continue;
        }

        let path: Vec<String> = rest.iter().map(|s| options.converter.convert(s)).collect();
        let val = if options.parse_values {
            cast_value(raw)
        } else {
            Value::String(raw.clone())
        };

        insert_path(&mut root, &path, val);
        applied = applied.saturating_add(1);
    }

    if applied > 0 {
        debug!(count = applied, prefix, "derived env overlay");
    }

    Ok(Value::Mapping(root))
}

/// Turn an environment string into a typed value.
///
/// `"true"` and `"false"` become booleans, integer and float literals become
/// numbers, anything else stays a string.
#[must_use]
pub fn cast_value(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {},
    }

    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Integer(i);
    }
    // `f64::from_str` also accepts "inf" and "NaN"; those stay strings.
    if trimmed.bytes().any(|b| b.is_ascii_digit())
        && let Ok(f) = trimmed.parse::<f64>()
        && f.is_finite()
    {
        return Value::Float(f);
    }

    Value::String(raw.to_owned())
}

/// Collect all current environment variables into a map.
///
/// Variables whose name or value is not valid Unicode are skipped.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

fn split_name<'a>(name: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return vec![name];
    }
    name.split(separator).collect()
}

fn insert_path(root: &mut Mapping, path: &[String], val: Value) {
    let Some((leaf, parents)) = path.split_last() else {
        return;
    };

    let mut current = root;
    for segment in parents {
        let slot = current
            .entry(segment.clone())
            .or_insert_with(Value::mapping);
        if !slot.is_mapping() {
            *slot = Value::mapping();
        }
        let Some(next) = slot.as_mapping_mut() else {
            return;
        };
        current = next;
    }

    current.insert(leaf.clone(), val);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Converter;

    fn overlay(pairs: &[(&str, &str)], options: &EnvOptions) -> Value {
        overlay_from_env(pairs.iter().copied(), options).unwrap()
    }

    fn yaml(src: &str) -> Value {
        serde_yaml::from_str(src).unwrap()
    }

    #[test]
    fn test_nested_path() {
        let val = overlay(&[("SETTINGS.NESTED.BAZ", "bar")], &EnvOptions::default());
        assert_eq!(val, yaml("nested: {baz: bar}"));
    }

    #[test]
    fn test_deep_nested_path() {
        let val = overlay(&[("SETTINGS.DEEP.NESTED.BAZ", "bar")], &EnvOptions::default());
        assert_eq!(val, yaml("deep: {nested: {baz: bar}}"));
    }

    #[test]
    fn test_unrelated_vars_ignored() {
        let val = overlay(
            &[("HOME", "/root"), ("SETTINGSX.FOO", "1"), ("SETTINGS", "bare")],
            &EnvOptions::default(),
        );
        assert_eq!(val, Value::mapping());
    }

    #[test]
    fn test_empty_segments_skipped() {
        let val = overlay(
            &[("SETTINGS..FOO", "1"), ("SETTINGS.FOO.", "2"), ("SETTINGS.OK", "3")],
            &EnvOptions::default(),
        );
        assert_eq!(val, yaml("ok: 3"));
    }

    #[test]
    fn test_empty_env_is_empty_overlay_even_without_prefix() {
        let options = EnvOptions::default().without_prefix();
        let val = overlay_from_env(Vec::<(String, String)>::new(), &options).unwrap();
        assert_eq!(val, Value::mapping());
    }

    #[test]
    fn test_missing_prefix_is_error() {
        let options = EnvOptions::default().without_prefix();
        let err = overlay_from_env([("SETTINGS.FOO", "bar")], &options).unwrap_err();
        assert!(matches!(err, SettingsError::EnvPrefixNotDefined));
    }

    #[test]
    fn test_custom_separator_and_multi_segment_prefix() {
        let options = EnvOptions::default()
            .with_separator("__")
            .with_prefix("MY__APP");
        let val = overlay(&[("MY__APP__DB__HOST", "localhost")], &options);
        assert_eq!(val, yaml("db: {host: localhost}"));
    }

    #[test]
    fn test_converter_none_keeps_case() {
        let options = EnvOptions::default().with_converter(Converter::None);
        let val = overlay(&[("SETTINGS.Nested.Baz", "bar")], &options);
        assert_eq!(val, yaml("Nested: {Baz: bar}"));
    }

    #[test]
    fn test_scalar_replaced_by_longer_path() {
        let val = overlay(
            &[("SETTINGS.A", "1"), ("SETTINGS.A.B", "2")],
            &EnvOptions::default(),
        );
        assert_eq!(val, yaml("a: {b: 2}"));
    }

    #[test]
    #[allow(clippy::approx_constant)]
    fn test_auto_typing() {
        assert_eq!(cast_value("true"), Value::Bool(true));
        assert_eq!(cast_value("false"), Value::Bool(false));
        assert_eq!(cast_value("42"), Value::Integer(42));
        assert_eq!(cast_value("-7"), Value::Integer(-7));
        assert_eq!(cast_value("3.14"), Value::Float(3.14));
        assert_eq!(cast_value("2.5"), Value::Float(2.5));
        assert_eq!(cast_value("1e3"), Value::Float(1000.0));
        assert_eq!(cast_value("hello"), Value::from("hello"));
        assert_eq!(cast_value("inf"), Value::from("inf"));
        assert_eq!(cast_value("NaN"), Value::from("NaN"));
        assert_eq!(cast_value("True"), Value::from("True"));
        assert_eq!(cast_value(""), Value::from(""));
    }

    #[test]
    fn test_parse_values_disabled() {
        let options = EnvOptions::default().without_value_parsing();
        let val = overlay(&[("SETTINGS.PORT", "8080")], &options);
        assert_eq!(val, yaml("port: '8080'"));
    }
}
