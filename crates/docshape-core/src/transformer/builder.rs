//! Builder for creating derive rules
//!
//! This module provides a fluent builder API for constructing derive rules
//! from paths given either as [`Path`] values or dotted strings.
//!
//! Copyright (c) 2025 Docshape Team
//! Licensed under the Apache-2.0 license

use super::derive::{boxed, DeriveRule};
use super::types::DeriveFn;
use crate::error::{Error, Result};
use crate::path::Path;
use serde_json::Value;

/// A path as handed to the builder, parsed only at `build()`
enum PathSpec {
    Dotted(String),
    Typed(Path),
}

impl PathSpec {
    fn resolve(self) -> Result<Path> {
        match self {
            PathSpec::Dotted(dotted) => dotted.parse(),
            PathSpec::Typed(path) => Ok(path),
        }
    }
}

/// Builder for creating derive rules
#[derive(Default)]
pub struct DeriveRuleBuilder {
    name: Option<String>,
    sources: Vec<PathSpec>,
    targets: Vec<PathSpec>,
    function: Option<DeriveFn>,
    optional: Option<bool>,
}

impl DeriveRuleBuilder {
    /// Create a new rule builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the rule in configuration errors
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append a source path in dotted notation
    pub fn source(mut self, path: impl Into<String>) -> Self {
        self.sources.push(PathSpec::Dotted(path.into()));
        self
    }

    /// Append a source path; keys may contain dots
    pub fn source_path(mut self, path: &Path) -> Self {
        self.sources.push(PathSpec::Typed(path.clone()));
        self
    }

    /// Append a target path in dotted notation
    pub fn target(mut self, path: impl Into<String>) -> Self {
        self.targets.push(PathSpec::Dotted(path.into()));
        self
    }

    /// Append a target path; keys may contain dots
    pub fn target_path(mut self, path: &Path) -> Self {
        self.targets.push(PathSpec::Typed(path.clone()));
        self
    }

    /// Set the derive function
    pub fn function(mut self, function: DeriveFn) -> Self {
        self.function = Some(function);
        self
    }

    /// Set a single-output function, boxed into a one-element list
    pub fn boxed_function<F>(self, function: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        self.function(boxed(function))
    }

    /// Override the batch's optional-source flag
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = Some(optional);
        self
    }

    /// Build the derive rule
    pub fn build(self) -> Result<DeriveRule> {
        let rule = self.name.clone();
        let function = self.function.ok_or_else(|| Error::Configuration {
            message: "derive function is required".to_string(),
            rule: rule.clone(),
        })?;
        if self.sources.is_empty() {
            return Err(Error::Configuration {
                message: "derive needs at least one source path".to_string(),
                rule,
            });
        }

        let sources = resolve_all(self.sources)?;
        let targets = resolve_all(self.targets)?;
        let mut built = DeriveRule::new(sources, function, targets);
        built.optional = self.optional;
        Ok(built)
    }
}

fn resolve_all(paths: Vec<PathSpec>) -> Result<Vec<Path>> {
    paths.into_iter().map(PathSpec::resolve).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use serde_json::json;

    #[test]
    fn test_build_rule() {
        let rule = DeriveRuleBuilder::new()
            .source("subject.age")
            .source_path(&path!("subject", "unit"))
            .target("subject.age_label")
            .boxed_function(|values| Ok(json!(format!("{} {}", values[0], values[1]))))
            .optional(true)
            .build()
            .unwrap();

        assert_eq!(rule.sources, vec![path!("subject", "age"), path!("subject", "unit")]);
        assert_eq!(rule.targets, vec![path!("subject", "age_label")]);
        assert_eq!(rule.optional, Some(true));
    }

    #[test]
    fn test_typed_paths_keep_their_keys() {
        let rule = DeriveRuleBuilder::new()
            .source_path(&path!("files", "data.csv"))
            .target_path(&path!("checksums", " data.csv "))
            .boxed_function(|values| Ok(values[0].clone()))
            .build()
            .unwrap();

        assert_eq!(rule.sources, vec![path!("files", "data.csv")]);
        assert_eq!(rule.targets, vec![path!("checksums", " data.csv ")]);
    }

    #[test]
    fn test_missing_function() {
        let err = DeriveRuleBuilder::new().name("age").source("a").build().unwrap_err();
        assert!(matches!(err, Error::Configuration { rule: Some(ref r), .. } if r == "age"));
    }

    #[test]
    fn test_malformed_source() {
        let err = DeriveRuleBuilder::new()
            .source("a..b")
            .boxed_function(|_| Ok(Value::Null))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::MalformedPath { .. }));
    }
}
