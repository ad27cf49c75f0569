//! File loader accepting YAML as well as JSON
//!
//! Registered for file references by the resolve command, so YAML schemas
//! can reference each other and JSON files freely.

use crate::config::is_yaml_path;
use crate::error::{Error, Result};
use deref_schemas::loader::file::resolve_reference_path;
use deref_schemas::{DerefOptions, FileLoader, Loader};
use serde_json::Value;
use std::path::Path;

/// Loads `.yaml`/`.yml` targets as YAML and everything else as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFileLoader {
    json: FileLoader,
}

impl YamlFileLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }
}

impl Loader for YamlFileLoader {
    fn load(&self, ref_value: &str, options: &DerefOptions) -> Option<Value> {
        let path = resolve_reference_path(ref_value, options);
        if !is_yaml_path(&path) {
            return self.json.load(ref_value, options);
        }

        match read_yaml(&path) {
            Ok(value) => {
                tracing::trace!(path = %path.display(), "loaded YAML reference");
                Some(value)
            }
            Err(error) => {
                tracing::debug!(reference = %ref_value, %error, "YAML reference could not be loaded");
                None
            }
        }
    }
}

fn read_yaml(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&content).map_err(|_| Error::InvalidFormat {
        path: path.to_path_buf(),
        expected: "YAML".to_string(),
    })
}

/// Read a schema document, as YAML or JSON by extension
pub fn read_document(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    if is_yaml_path(path) {
        return read_yaml(path);
    }

    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|_| Error::InvalidFormat {
        path: path.to_path_buf(),
        expected: "JSON".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use deref_schemas::{deref, RefType};
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_yaml_and_json_targets() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.yaml"), "definitions:\n  id:\n    type: integer\n").unwrap();
        fs::write(dir.path().join("b.json"), r#"{"name": {"type": "string"}}"#).unwrap();

        let options = DerefOptions::new()
            .with_base_folder(dir.path())
            .with_loader(RefType::File, YamlFileLoader::new());
        let schema = json!({
            "id": {"$ref": "a.yaml#/definitions/id"},
            "name": {"$ref": "./b.json#/name"}
        });

        let result = deref(&schema, &options).unwrap();
        assert_eq!(
            result,
            json!({"id": {"type": "integer"}, "name": {"type": "string"}})
        );
    }

    #[test]
    fn test_invalid_yaml_is_missing() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bad.yml"), "a: [unclosed").unwrap();

        let options = DerefOptions::new().with_base_folder(dir.path());
        assert_eq!(YamlFileLoader::new().load("bad.yml", &options), None);
    }

    #[test]
    fn test_read_document() {
        let dir = tempdir().unwrap();
        let yaml = dir.path().join("schema.yml");
        fs::write(&yaml, "type: object\n").unwrap();
        assert_eq!(read_document(&yaml).unwrap(), json!({"type": "object"}));

        let broken = dir.path().join("schema.json");
        fs::write(&broken, "{").unwrap();
        assert!(matches!(
            read_document(&broken).unwrap_err(),
            Error::InvalidFormat { .. }
        ));

        assert!(matches!(
            read_document(&dir.path().join("none.json")).unwrap_err(),
            Error::FileNotFound { .. }
        ));
    }
}
