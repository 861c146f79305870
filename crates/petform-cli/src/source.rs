//! Loading schemas and values from the catalog or the filesystem.

use std::path::{Path, PathBuf};

use petform::{FormConfiguration, FormError, FormValues};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::catalog;

/// Errors raised while resolving command arguments.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Neither a built-in form, a file, nor a schema in the schema directory.
    #[error("no built-in form, file or schema named {0:?}")]
    UnknownForm(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Form(#[from] FormError),

    #[error("invalid values file {path}: {source}")]
    Values {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Values must be a flat JSON object.
    #[error("values for field {0:?} must be a string, number, boolean or null")]
    NotScalar(String),

    #[error("values file must contain a JSON object")]
    NotAnObject,
}

/// Result type alias for argument loading.
pub type Result<T> = std::result::Result<T, SourceError>;

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves a form argument.
///
/// Built-in names win, then an existing file path, then `<name>.json`
/// inside `schema_dir`.
pub fn load_form(name: &str, schema_dir: Option<&Path>) -> Result<FormConfiguration> {
    if let Some(config) = catalog::form(name)? {
        debug!(form = name, "using built-in form");
        return Ok(config);
    }

    let path = Path::new(name);
    if path.is_file() {
        return load_schema(path);
    }

    if let Some(dir) = schema_dir {
        let candidate = dir.join(format!("{name}.json"));
        if candidate.is_file() {
            return load_schema(&candidate);
        }
    }

    Err(SourceError::UnknownForm(name.to_string()))
}

/// Parses and checks a schema file.
pub fn load_schema(path: &Path) -> Result<FormConfiguration> {
    debug!(path = %path.display(), "loading schema");
    Ok(FormConfiguration::from_json(&read(path)?)?)
}

/// Reads a flat JSON object of field values.
///
/// Numbers and booleans are converted to their text form; `null` becomes
/// an empty value.
pub fn load_values(path: &Path) -> Result<FormValues> {
    let json: Value = serde_json::from_str(&read(path)?).map_err(|source| SourceError::Values {
        path: path.to_path_buf(),
        source,
    })?;
    values_from_json(json)
}

/// Converts a flat JSON object into field values.
pub fn values_from_json(json: Value) -> Result<FormValues> {
    let Value::Object(map) = json else {
        return Err(SourceError::NotAnObject);
    };

    map.into_iter()
        .map(|(field, value)| {
            let text = match value {
                Value::Null => String::new(),
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Array(_) | Value::Object(_) => return Err(SourceError::NotScalar(field)),
            };
            Ok((field, text))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;
    use tempfile::{NamedTempFile, TempDir};

    use super::*;

    const ADOPTION: &str = r#"{
        "id": "adoption",
        "title": "Adoption",
        "fields": [
            { "id": "name", "label": "Name", "type": "TEXT", "validators": [{ "kind": "REQUIRED" }] }
        ]
    }"#;

    #[test]
    fn test_builtin_form_wins() {
        let config = load_form("pet", None).unwrap();
        assert_eq!(config.id, "pet");
    }

    #[test]
    fn test_load_form_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(ADOPTION.as_bytes()).unwrap();

        let path = file.path().to_str().unwrap();
        let config = load_form(path, None).unwrap();
        assert_eq!(config.id, "adoption");
    }

    #[test]
    fn test_load_form_from_schema_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("adoption.json"), ADOPTION).unwrap();

        let config = load_form("adoption", Some(dir.path())).unwrap();
        assert_eq!(config.fields.len(), 1);
        assert!(matches!(
            load_form("grooming", Some(dir.path())),
            Err(SourceError::UnknownForm(name)) if name == "grooming"
        ));
    }

    #[test]
    fn test_bundled_schema() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("schemas");
        let config = load_form("adoption", Some(&dir)).unwrap();
        assert_eq!(config.submit_behavior, petform::SubmitBehavior::DispatchExternal);
        assert_eq!(config.validation_behavior, petform::ValidationBehavior::OnBlur);
        assert_eq!(config.input_fields().count(), 6);
    }

    #[test]
    fn test_invalid_schema_is_reported() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{ "id": "x", "fields": [{ "id": "a" }, { "id": "a" }] }"#)
            .unwrap();
        assert!(matches!(
            load_schema(file.path()),
            Err(SourceError::Form(FormError::DuplicateField(_)))
        ));
    }

    #[test]
    fn test_values_are_stringified() {
        let values = values_from_json(json!({
            "name": "Thor",
            "weight": 12.5,
            "age": 3,
            "neutered": true,
            "notes": null
        }))
        .unwrap();
        assert_eq!(values["name"], "Thor");
        assert_eq!(values["weight"], "12.5");
        assert_eq!(values["age"], "3");
        assert_eq!(values["neutered"], "true");
        assert_eq!(values["notes"], "");
    }

    #[test]
    fn test_nested_values_are_rejected() {
        assert!(matches!(
            values_from_json(json!({ "tags": ["a"] })),
            Err(SourceError::NotScalar(field)) if field == "tags"
        ));
        assert!(matches!(
            values_from_json(json!(["a"])),
            Err(SourceError::NotAnObject)
        ));
    }
}
