//! Shared utilities for command handlers

use crate::config::FileFormat;
use crate::error::{Error, Result};
use docshape_core::{Path as DocPath, RuleSet};
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Marker for reading from stdin
const STDIN: &str = "-";

/// Read a document from a file, or from stdin when `path` is `None` or `-`
///
/// Files are parsed by extension; stdin is tried as JSON, then as YAML.
pub fn read_document(path: Option<&Path>) -> Result<Value> {
    match path {
        Some(path) if path != Path::new(STDIN) => {
            let content = read_file(path)?;
            parse_as(path, FileFormat::from_path(path), &content)
        }
        _ => {
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content)?;
            debug!(bytes = content.len(), "Read document from stdin");
            parse_stdin(&content)
        }
    }
}

/// Load a rule set from a JSON, YAML or TOML file
pub fn load_rule_set(path: &Path) -> Result<RuleSet> {
    let content = read_file(path)?;
    let format = FileFormat::from_path(path);

    let parsed: std::result::Result<RuleSet, String> = match format {
        FileFormat::Yaml => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
        FileFormat::Toml => toml::from_str(&content).map_err(|e| e.to_string()),
        FileFormat::Json => serde_json::from_str(&content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| invalid_format(path, format, message))
}

/// Write a document as YAML or pretty JSON, chosen by extension
pub fn write_document(path: &Path, document: &Value) -> Result<()> {
    let rendered = match FileFormat::from_path(path) {
        FileFormat::Yaml => serde_yaml::to_string(document)?,
        FileFormat::Toml => {
            return Err(Error::invalid_args(format!(
                "cannot save documents as TOML: {}",
                path.display()
            )))
        }
        FileFormat::Json => format!("{}\n", serde_json::to_string_pretty(document)?),
    };
    fs::write(path, rendered)?;
    debug!(path = %path.display(), "Wrote document");
    Ok(())
}

/// Parse dotted paths given on the command line
pub fn parse_paths(paths: &[String]) -> Result<Vec<DocPath>> {
    paths
        .iter()
        .map(|path| path.parse::<DocPath>().map_err(Error::from))
        .collect()
}

fn read_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = content.len(), "Read file");
    Ok(content)
}

fn parse_as(path: &Path, format: FileFormat, content: &str) -> Result<Value> {
    let parsed: std::result::Result<Value, String> = match format {
        FileFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        FileFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        FileFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| invalid_format(path, format, message))
}

fn parse_stdin(content: &str) -> Result<Value> {
    match serde_json::from_str(content) {
        Ok(value) => Ok(value),
        Err(json_error) => serde_yaml::from_str(content).map_err(|_| Error::InvalidFormat {
            path: PathBuf::from("<stdin>"),
            expected: "JSON or YAML".to_string(),
            message: json_error.to_string(),
        }),
    }
}

fn invalid_format(path: &Path, format: FileFormat, message: String) -> Error {
    let expected = match format {
        FileFormat::Json => "JSON",
        FileFormat::Yaml => "YAML",
        FileFormat::Toml => "TOML",
    };
    Error::InvalidFormat {
        path: path.to_path_buf(),
        expected: expected.to_string(),
        message,
    }
}
