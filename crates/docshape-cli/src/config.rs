//! Configuration management for the CLI
//!
//! This module handles loading configuration from:
//! - Default values
//! - Configuration files (YAML/JSON/TOML)
//! - Environment variables (through clap and the logging setup)
//! - Command-line arguments

use crate::error::{Error, Result};
use docshape_core::{EmptyPolicy, TransformOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine defaults applied below anything a rule set declares
    pub defaults: DefaultsConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Engine defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Overrides every operator's own optional-source default
    pub source_key_optional: Option<bool>,

    /// Empty-value policy for derive steps
    pub empty: EmptyPolicy,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format
    pub format: String,

    /// Use colored output by default
    pub color: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `-v` flags take precedence
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "human".to_string(),
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

/// Supported configuration file formats, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
    Toml,
}

impl FileFormat {
    /// Detect a format from a file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("toml") => FileFormat::Toml,
            _ => FileFormat::Json,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let config: Config = match FileFormat::from_path(path) {
            FileFormat::Yaml => serde_yaml::from_str(&content)?,
            FileFormat::Toml => toml::from_str(&content)?,
            FileFormat::Json => serde_json::from_str(&content)?,
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
                        tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }

        // Return default config if no config file found
        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            Self::from_file(path)
        } else {
            Self::load()
        }
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".docshape.yaml"),
            PathBuf::from(".docshape.json"),
            PathBuf::from(".docshape.toml"),
        ];

        // User config directory
        if let Some(config_dir) = dirs::config_dir() {
            let docshape_dir = config_dir.join("docshape");
            paths.push(docshape_dir.join("config.yaml"));
            paths.push(docshape_dir.join("config.json"));
            paths.push(docshape_dir.join("config.toml"));
        }

        // Home directory
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".docshape.yaml"));
            paths.push(home_dir.join(".docshape.json"));
            paths.push(home_dir.join(".docshape.toml"));
        }

        paths
    }

    /// Engine options derived from the `defaults` section
    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            source_key_optional: self.defaults.source_key_optional,
            empty: Some(self.defaults.empty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.output.format, "human");
        assert_eq!(config.logging.format, "compact");
        assert_eq!(config.defaults.empty, EmptyPolicy::Cull);
        assert_eq!(
            config.transform_options(),
            TransformOptions {
                source_key_optional: None,
                empty: Some(EmptyPolicy::Cull),
            }
        );
    }

    #[test]
    fn test_load_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "defaults:\n  source_key_optional: true\n  empty: ERROR\noutput:\n  format: yaml\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.defaults.source_key_optional, Some(true));
        assert_eq!(config.defaults.empty, EmptyPolicy::Error);
        assert_eq!(config.output.format, "yaml");
        assert!(config.output.color);
    }

    #[test]
    fn test_load_toml_and_json() {
        let dir = TempDir::new().unwrap();

        let toml_path = dir.path().join("config.toml");
        fs::write(&toml_path, "[logging]\nlevel = \"debug\"\nformat = \"json\"\n").unwrap();
        let config = Config::from_file(&toml_path).unwrap();
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
        assert_eq!(config.logging.format, "json");

        let json_path = dir.path().join("config.json");
        fs::write(&json_path, r#"{"output": {"color": false}}"#).unwrap();
        let config = Config::from_file(&json_path).unwrap();
        assert!(!config.output.color);
        assert_eq!(config.output.format, "human");
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::load_with_file(Some(&dir.path().join("absent.yaml"))).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(Config::from_file(&path).unwrap_err(), Error::Json(_)));
    }
}
