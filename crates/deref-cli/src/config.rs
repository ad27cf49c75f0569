//! Configuration management for the CLI
//!
//! This module handles loading configuration from:
//! - Default values
//! - Configuration files (YAML/JSON)
//! - Command-line arguments, which take precedence

use crate::cli::OutputFormat;
use crate::error::{Error, Result};
use deref_schemas::DerefOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dereferencing defaults
    pub resolve: ResolveConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Defaults for the resolve command
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Base directory for relative file references
    pub base_folder: Option<PathBuf>,

    /// Fail on the first unresolved reference
    pub fail_on_missing: bool,

    /// Merge sibling properties onto resolved values
    pub merge_additional_properties: bool,

    /// Strip `$id` from resolved values
    pub remove_ids: bool,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format
    pub format: OutputFormat,

    /// Use colored output by default
    pub color: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); unset follows verbosity
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Human,
            color: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: "compact".to_string(),
        }
    }
}

impl ResolveConfig {
    /// Build dereferencing options from these defaults
    pub fn to_options(&self) -> DerefOptions {
        let mut options = DerefOptions::new()
            .with_fail_on_missing(self.fail_on_missing)
            .with_merge_additional_properties(self.merge_additional_properties)
            .with_remove_ids(self.remove_ids);
        if let Some(base_folder) = &self.base_folder {
            options = options.with_base_folder(base_folder);
        }
        options
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let config = if is_yaml_path(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in &Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        tracing::debug!(path = %path.display(), "Loaded configuration");
                        return Ok(config);
                    }
                    Err(e) => {
                        eprintln!("Warning: Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        // Return default config if no config file found
        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        match file {
            Some(path) if !path.exists() => Err(Error::config(format!(
                "config file {} does not exist",
                path.display()
            ))),
            Some(path) => Self::from_file(path),
            None => Self::load(),
        }
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            // Current directory
            PathBuf::from(".deref.yaml"),
            PathBuf::from(".deref.yml"),
            PathBuf::from(".deref.json"),
        ];

        // User config directory
        if let Some(config_dir) = dirs::config_dir() {
            let deref_dir = config_dir.join("deref");
            paths.push(deref_dir.join("config.yaml"));
            paths.push(deref_dir.join("config.json"));
        }

        paths
    }
}

/// Check whether a path names a YAML file
pub fn is_yaml_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.output.format, OutputFormat::Human);
        assert!(config.output.color);
        assert!(config.logging.level.is_none());
        assert_eq!(config.logging.format, "compact");
        assert!(!config.resolve.fail_on_missing);
    }

    #[test]
    fn test_partial_yaml_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "resolve:\n  fail_on_missing: true\n  base_folder: /schemas\noutput:\n  format: json-pretty\n",
        )
        .unwrap();

        let config = Config::load_with_file(Some(&path)).unwrap();
        assert!(config.resolve.fail_on_missing);
        assert_eq!(config.resolve.base_folder, Some(PathBuf::from("/schemas")));
        assert_eq!(config.output.format, OutputFormat::JsonPretty);
        assert!(config.output.color);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_json_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"resolve": {"remove_ids": true}, "logging": {"level": "debug"}}"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(config.resolve.remove_ids);
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_missing_explicit_config() {
        let error = Config::load_with_file(Some(Path::new("/nonexistent/deref.yaml"))).unwrap_err();
        assert!(matches!(error, Error::Config(_)));
    }

    #[test]
    fn test_to_options() {
        let resolve = ResolveConfig {
            base_folder: Some(PathBuf::from("/schemas")),
            fail_on_missing: true,
            merge_additional_properties: true,
            remove_ids: false,
        };
        let options = resolve.to_options();
        assert_eq!(options.base_folder, Some(PathBuf::from("/schemas")));
        assert!(options.fail_on_missing);
        assert!(options.merge_additional_properties);
        assert!(!options.remove_ids);
    }

    #[test]
    fn test_is_yaml_path() {
        assert!(is_yaml_path(Path::new("a.yaml")));
        assert!(is_yaml_path(Path::new("dir/a.yml")));
        assert!(!is_yaml_path(Path::new("a.json")));
        assert!(!is_yaml_path(Path::new("yaml")));
    }
}
