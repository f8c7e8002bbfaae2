//! Reading and parsing settings files.
//!
//! A source file is read whole (bounded by [`MAX_SOURCE_FILE_SIZE`]), has its
//! `${VAR}` references expanded, and is parsed by extension into a plain
//! mapping.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::hash::BuildHasher;
use std::io;
use std::path::{Path, PathBuf};

use strata_core::Value;
use tracing::debug;

use crate::error::{SettingsError, SettingsResult};

/// Maximum accepted source file size (1 MiB).
pub const MAX_SOURCE_FILE_SIZE: u64 = 1_048_576;

/// Document format of a source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SourceFormat {
    /// YAML, the default for unknown extensions.
    #[default]
    Yaml,
    /// TOML.
    Toml,
    /// JSON.
    Json,
}

impl SourceFormat {
    /// Pick the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("toml") => Self::Toml,
            Some("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Read a source file.
///
/// # Errors
///
/// Returns [`SettingsError::ReadError`] if the file is missing or
/// unreadable, and [`SettingsError::FileTooLarge`] past the size limit.
pub fn read_source(path: &Path) -> SettingsResult<String> {
    // Refuse oversized files before reading them into memory.
    let metadata = std::fs::metadata(path).map_err(|e| read_error(path, e))?;
    check_size(path, metadata.len())?;

    let content = std::fs::read_to_string(path).map_err(|e| read_error(path, e))?;
    check_content_size(path, &content)?;
    Ok(content)
}

/// Read a source file, returning `None` if it does not exist.
///
/// Uses a single read so there is no window between an existence check and
/// the read.
///
/// # Errors
///
/// Same as [`read_source`], except for a missing file.
pub fn try_read_source(path: &Path) -> SettingsResult<Option<String>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "settings file not found, skipping");
            return Ok(None);
        },
        Err(e) => return Err(read_error(path, e)),
    };
    check_content_size(path, &content)?;
    Ok(Some(content))
}

fn read_error(path: &Path, source: io::Error) -> SettingsError {
    SettingsError::ReadError {
        path: path.display().to_string(),
        source,
    }
}

fn check_content_size(path: &Path, content: &str) -> SettingsResult<()> {
    check_size(path, u64::try_from(content.len()).unwrap_or(u64::MAX))
}

fn check_size(path: &Path, size: u64) -> SettingsResult<()> {
    if size > MAX_SOURCE_FILE_SIZE {
        return Err(SettingsError::FileTooLarge {
            path: path.display().to_string(),
            size,
            limit: MAX_SOURCE_FILE_SIZE,
        });
    }
    Ok(())
}

/// Replace `${VAR}` references with values from `env`.
///
/// Unknown variables and malformed references (`${}`, an unclosed `${`) are
/// left exactly as written.
#[must_use]
pub fn expand_template<S: BuildHasher>(input: &str, env: &HashMap<String, String, S>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start.saturating_add(2)..];

        match after.find('}') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                if let Some(val) = env.get(name) {
                    out.push_str(val);
                } else {
                    debug!(var = name, "unresolved variable reference in settings file");
                    let _ = write!(out, "${{{name}}}");
                }
                rest = &after[end.saturating_add(1)..];
            },
            _ => {
                out.push_str("${");
                rest = after;
            },
        }
    }

    out.push_str(rest);
    out
}

/// Parse source text into a plain mapping.
///
/// An empty document yields an empty mapping.
///
/// # Errors
///
/// Returns [`SettingsError::ParseError`] on malformed input or when the
/// document root is not a mapping. `origin` names the source in the error.
pub fn parse_source(text: &str, format: SourceFormat, origin: &str) -> SettingsResult<Value> {
    let parse_error = |message: String| SettingsError::ParseError {
        path: origin.to_owned(),
        message,
    };

    let parsed: Value = match format {
        SourceFormat::Yaml if is_blank_yaml(text) => Value::Null,
        SourceFormat::Yaml => serde_yaml::from_str(text).map_err(|e| parse_error(e.to_string()))?,
        SourceFormat::Toml => toml::from_str(text).map_err(|e| parse_error(e.to_string()))?,
        SourceFormat::Json => serde_json::from_str(text).map_err(|e| parse_error(e.to_string()))?,
    };

    match parsed {
        Value::Null => Ok(Value::mapping()),
        Value::Mapping(_) => Ok(parsed),
        other => Err(parse_error(format!(
            "document root must be a mapping, found {}",
            other.kind()
        ))),
    }
}

fn is_blank_yaml(text: &str) -> bool {
    text.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---"
    })
}

/// Read, expand and parse a source file.
///
/// # Errors
///
/// Any error of [`read_source`] or [`parse_source`].
pub fn load_source<S: BuildHasher>(
    path: &Path,
    env: &HashMap<String, String, S>,
) -> SettingsResult<Value> {
    let text = read_source(path)?;
    parse_file(path, &text, env)
}

/// [`load_source`] that returns `None` for a missing file.
///
/// # Errors
///
/// Any error of [`try_read_source`] or [`parse_source`].
pub fn try_load_source<S: BuildHasher>(
    path: &Path,
    env: &HashMap<String, String, S>,
) -> SettingsResult<Option<Value>> {
    try_read_source(path)?
        .map(|text| parse_file(path, &text, env))
        .transpose()
}

fn parse_file<S: BuildHasher>(
    path: &Path,
    text: &str,
    env: &HashMap<String, String, S>,
) -> SettingsResult<Value> {
    let expanded = expand_template(text, env);
    let val = parse_source(&expanded, SourceFormat::from_path(path), &path.display().to_string())?;
    debug!(path = %path.display(), "loaded settings file");
    Ok(val)
}

/// The namespace file next to `base`: `<dir>/<stem>.<namespace>.<ext>`.
#[must_use]
pub fn namespace_path(base: &Path, namespace: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match base.extension() {
        Some(ext) => format!("{stem}.{namespace}.{}", ext.to_string_lossy()),
        None => format!("{stem}.{namespace}"),
    };
    base.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_expand_template() {
        let vars = env(&[("HOST", "db.local"), ("PORT", "5432")]);
        assert_eq!(
            expand_template("url: ${HOST}:${PORT}/app", &vars),
            "url: db.local:5432/app"
        );
    }

    #[test]
    fn test_expand_template_leaves_unknown_and_malformed() {
        let vars = env(&[("A", "1")]);
        assert_eq!(expand_template("${MISSING}", &vars), "${MISSING}");
        assert_eq!(expand_template("${}", &vars), "${}");
        assert_eq!(expand_template("cost: $5 ${A", &vars), "cost: $5 ${A");
        assert_eq!(expand_template("${A}${A}", &vars), "11");
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(SourceFormat::from_path(Path::new("a.yml")), SourceFormat::Yaml);
        assert_eq!(SourceFormat::from_path(Path::new("a.TOML")), SourceFormat::Toml);
        assert_eq!(SourceFormat::from_path(Path::new("a.json")), SourceFormat::Json);
        assert_eq!(SourceFormat::from_path(Path::new("settings")), SourceFormat::Yaml);
    }

    #[test]
    fn test_parse_formats_agree() {
        let yaml = parse_source("a: 1\nb: {c: x}\n", SourceFormat::Yaml, "t").unwrap();
        let toml = parse_source("a = 1\n[b]\nc = \"x\"\n", SourceFormat::Toml, "t").unwrap();
        let json = parse_source(r#"{"a": 1, "b": {"c": "x"}}"#, SourceFormat::Json, "t").unwrap();
        assert_eq!(yaml, toml);
        assert_eq!(yaml, json);
    }

    #[test]
    fn test_parse_empty_yaml() {
        assert_eq!(parse_source("", SourceFormat::Yaml, "t").unwrap(), Value::mapping());
        assert_eq!(
            parse_source("# nothing here\n---\n", SourceFormat::Yaml, "t").unwrap(),
            Value::mapping()
        );
    }

    #[test]
    fn test_parse_rejects_non_mapping_root() {
        let err = parse_source("- a\n- b\n", SourceFormat::Yaml, "list.yml").unwrap_err();
        assert!(matches!(err, SettingsError::ParseError { ref path, .. } if path == "list.yml"));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse_source("a: [1,", SourceFormat::Yaml, "t").is_err());
        assert!(parse_source("a = ", SourceFormat::Toml, "t").is_err());
    }

    #[test]
    fn test_namespace_path() {
        assert_eq!(
            namespace_path(Path::new("/etc/app/settings.yml"), "development"),
            PathBuf::from("/etc/app/settings.development.yml")
        );
        assert_eq!(
            namespace_path(Path::new("settings"), "test"),
            PathBuf::from("settings.test")
        );
    }

    #[test]
    fn test_try_read_source_missing() {
        let result = try_read_source(Path::new("/nonexistent/settings.yml")).unwrap();
        assert!(result.is_none());
        assert!(matches!(
            read_source(Path::new("/nonexistent/settings.yml")),
            Err(SettingsError::ReadError { .. })
        ));
    }

    #[test]
    fn test_oversized_source_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.yml");
        let data = "x: \"".to_owned() + &"a".repeat(1_100_000) + "\"";
        std::fs::write(&path, data).unwrap();

        let result = try_read_source(&path);
        assert!(
            matches!(result, Err(SettingsError::FileTooLarge { .. })),
            "expected FileTooLarge for oversized file, got: {result:?}"
        );
    }

    #[test]
    fn test_required_source_size_checked_from_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.yml");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(MAX_SOURCE_FILE_SIZE.saturating_add(1)).unwrap();

        let result = read_source(&path);
        assert!(
            matches!(
                result,
                Err(SettingsError::FileTooLarge { size, limit, .. })
                    if size == MAX_SOURCE_FILE_SIZE.saturating_add(1) && limit == MAX_SOURCE_FILE_SIZE
            ),
            "expected FileTooLarge from metadata, got: {result:?}"
        );
    }

    #[test]
    fn test_load_source_expands_before_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yml");
        std::fs::write(&path, "port: ${PORT}\nname: ${NAME}\n").unwrap();

        let val = load_source(&path, &env(&[("PORT", "8080")])).unwrap();
        assert_eq!(val.get("port"), Some(&Value::Integer(8080)));
        assert_eq!(val.get("name"), Some(&Value::from("${NAME}")));
    }
}
