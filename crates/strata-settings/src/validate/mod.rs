//! Schema validation of settings trees.
//!
//! A [`Schema`] lists the fields a tree must (or may) carry and the rules
//! their values follow. Validation runs against the exported tree, so
//! deferred leaves are checked by their current result. Every field is
//! checked; failures are collected into one [`ValidationError`].

mod error;
mod schema;

pub use error::{ErrorTree, FieldErrors, VALIDATION_HEADER, ValidationError};
pub use schema::{Kind, Rule, Schema};
use tracing::debug;

use crate::error::SettingsResult;
use crate::settings::Settings;

/// Validate `settings` against `schema`.
///
/// `prefix` is printed before every field path of the failure message,
/// usually the environment variable prefix.
///
/// # Errors
///
/// Returns [`SettingsError::Validation`](crate::SettingsError::Validation)
/// listing every invalid field.
pub fn validate(settings: &Settings, schema: &Schema, prefix: &str) -> SettingsResult<()> {
    let errors = schema.check(&settings.to_value());
    if errors.is_empty() {
        return Ok(());
    }
    debug!(fields = errors.len(), "settings failed validation");
    Err(ValidationError::new(prefix, errors).into())
}

#[cfg(test)]
mod tests {
    use regex::Regex;
    use strata_core::Value;

    use super::*;
    use crate::error::SettingsError;

    fn settings(src: &str) -> Settings {
        Settings::wrap(&serde_yaml::from_str::<Value>(src).unwrap())
    }

    fn failure(settings: &Settings, schema: &Schema) -> ValidationError {
        match validate(settings, schema, "SETTINGS") {
            Err(SettingsError::Validation(err)) => err,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_required_field() {
        let schema = Schema::new().required("foo", Rule::new().filled());

        let err = failure(&settings("bar: 1"), &schema);
        assert!(err.to_string().contains("FOO"));
        assert_eq!(
            err.to_string(),
            "settings validation failed:\n\n  SETTINGS.FOO: is missing"
        );

        assert!(validate(&settings("foo: bar"), &schema, "SETTINGS").is_ok());
    }

    #[test]
    fn test_filled_rejects_null_and_empty() {
        let schema = Schema::new().required("foo", Rule::new().filled());
        assert!(validate(&settings("foo: ~"), &schema, "SETTINGS").is_err());
        assert!(validate(&settings("foo: ''"), &schema, "SETTINGS").is_err());
        assert!(validate(&settings("foo: []"), &schema, "SETTINGS").is_err());
        assert!(validate(&settings("foo: false"), &schema, "SETTINGS").is_ok());
    }

    #[test]
    fn test_null_fails_kind_and_nested_schema() {
        let schema = Schema::new()
            .required("port", Rule::new().kind(Kind::Integer))
            .required(
                "nested",
                Rule::new().schema(Schema::new().required("foo", Rule::new().filled())),
            );

        let err = failure(&settings("port: ~\nnested: ~\n"), &schema);
        assert_eq!(
            err.format_lines(),
            "  SETTINGS.PORT: must be an integer\n  SETTINGS.NESTED: must be a hash"
        );

        let err = failure(&settings("port: 1\nnested: {}\n"), &schema);
        assert_eq!(err.format_lines(), "  SETTINGS.NESTED.FOO: is missing");

        let loose = Schema::new().required("anything", Rule::new());
        assert!(validate(&settings("anything: ~"), &loose, "SETTINGS").is_ok());
    }

    #[test]
    fn test_null_with_filled_and_kind_reports_both() {
        let schema = Schema::from_yaml("port: {filled: true, type: integer}\n").unwrap();
        let err = failure(&settings("port: ~"), &schema);
        assert_eq!(
            err.format_lines(),
            "  SETTINGS.PORT: must be filled; must be an integer"
        );
    }

    #[test]
    fn test_empty_schema_passes() {
        assert!(validate(&settings("anything: 1"), &Schema::new(), "SETTINGS").is_ok());
    }

    #[test]
    fn test_nested_errors_flatten() {
        let schema = Schema::new().required(
            "deep",
            Rule::new().schema(Schema::new().required(
                "nested",
                Rule::new().schema(
                    Schema::new()
                        .required("warn_threshold", Rule::new().kind(Kind::Integer).min(0.0))
                        .required("level", Rule::new().one_of(["low", "high"])),
                ),
            )),
        );

        let err = failure(
            &settings("deep:\n  nested:\n    warn_threshold: high\n    level: mid\n"),
            &schema,
        );
        assert_eq!(
            err.format_lines(),
            "  SETTINGS.DEEP.NESTED.WARN_THRESHOLD: must be an integer\n  \
             SETTINGS.DEEP.NESTED.LEVEL: must be one of: low, high"
        );
        assert!(matches!(err.errors()["deep"], FieldErrors::Nested(_)));
    }

    #[test]
    fn test_messages_join_with_semicolon() {
        let schema = Schema::new().required(
            "name",
            Rule::new()
                .min(5.0)
                .format(Regex::new("^[a-z]+$").unwrap()),
        );
        let err = failure(&settings("name: AB"), &schema);
        assert_eq!(
            err.format_lines(),
            "  SETTINGS.NAME: size cannot be less than 5; is in invalid format"
        );
    }

    #[test]
    fn test_numeric_bounds() {
        let schema = Schema::new().required("port", Rule::new().kind(Kind::Number).max(65535.0));
        let err = failure(&settings("port: 70000"), &schema);
        assert_eq!(
            err.format_lines(),
            "  SETTINGS.PORT: must be less than or equal to 65535"
        );
        assert!(validate(&settings("port: 8080.5"), &schema, "SETTINGS").is_ok());
    }

    #[test]
    fn test_optional_field_checked_only_when_present() {
        let schema = Schema::new().optional("mode", Rule::new().kind(Kind::String));
        assert!(validate(&settings("other: 1"), &schema, "APP").is_ok());
        let err = failure(&settings("mode: 1"), &schema);
        assert_eq!(err.flatten()[0].0, "mode");
    }

    #[test]
    fn test_schema_from_yaml() {
        let schema = Schema::from_yaml(
            "foo:\n  filled: true\n\
             deep:\n  required: false\n  schema:\n    warn_threshold: { type: integer, min: 0 }\n",
        )
        .unwrap();
        assert_eq!(schema.len(), 2);

        let err = failure(&settings("deep:\n  warn_threshold: -1\n"), &schema);
        assert_eq!(
            err.format_lines(),
            "  SETTINGS.FOO: is missing\n  SETTINGS.DEEP.WARN_THRESHOLD: must be greater than or equal to 0"
        );
    }

    #[test]
    fn test_schema_from_yaml_rejects_bad_regex() {
        let err = Schema::from_yaml("name:\n  format: '('\n").unwrap_err();
        assert!(matches!(err, SettingsError::InvalidSchema { ref field, .. } if field == "name"));
    }

    #[test]
    fn test_schema_from_yaml_rejects_unknown_rule() {
        assert!(Schema::from_yaml("name:\n  colour: red\n").is_err());
    }
}
