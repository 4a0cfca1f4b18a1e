//! Core types for rule-driven document transformation
//!
//! This module defines the function signatures rules carry, the empty-value
//! policy used by derive, and the report every batch operator returns.
//!
//! Copyright (c) 2025 Docshape Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A derive transform: source values in rule order, output values in target order
pub type DeriveFn = Arc<dyn Fn(Vec<Value>) -> Result<Vec<Value>> + Send + Sync>;

/// A single-value transform used by update and lift
pub type ValueFn = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// Wrap a closure as a [`DeriveFn`]
pub fn derive_fn<F>(function: F) -> DeriveFn
where
    F: Fn(Vec<Value>) -> Result<Vec<Value>> + Send + Sync + 'static,
{
    Arc::new(function)
}

/// Wrap a closure as a [`ValueFn`]
pub fn value_fn<F>(function: F) -> ValueFn
where
    F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(function)
}

/// What derive does with an output that is `null` or zero-length
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyPolicy {
    /// Drop the write for that target silently
    #[default]
    #[serde(alias = "CULL")]
    Cull,
    /// Write the empty value anyway
    #[serde(alias = "OK")]
    Ok,
    /// Fail the rule
    #[serde(alias = "ERROR")]
    Error,
}

impl fmt::Display for EmptyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyPolicy::Cull => write!(f, "cull"),
            EmptyPolicy::Ok => write!(f, "ok"),
            EmptyPolicy::Error => write!(f, "error"),
        }
    }
}

impl FromStr for EmptyPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cull" => Ok(EmptyPolicy::Cull),
            "ok" => Ok(EmptyPolicy::Ok),
            "error" => Ok(EmptyPolicy::Error),
            _ => Err(Error::Configuration {
                message: format!("unknown empty policy {:?}, expected cull, ok or error", s),
                rule: None,
            }),
        }
    }
}

/// Outcome counts of one batch call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Rules that ran to completion
    pub applied: usize,
    /// Rules skipped because an optional source was missing
    pub skipped: usize,
    /// Derive target writes dropped by the `cull` empty policy
    pub culled: usize,
}

impl BatchReport {
    /// Add another report's counts to this one
    pub fn merge(&mut self, other: BatchReport) {
        self.applied += other.applied;
        self.skipped += other.skipped;
        self.culled += other.culled;
    }

    /// Total number of rules seen
    pub fn total(&self) -> usize {
        self.applied + self.skipped
    }
}

/// `null` or a zero-length string, sequence or mapping
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
