//! Error types for the Docshape core library
//!
//! This module defines the error taxonomy shared by every document operation,
//! using thiserror for the error definitions and anyhow for errors raised by
//! caller-supplied transform functions.

use crate::path::Path;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Main error type for Docshape operations
#[derive(Error, Debug)]
pub enum Error {
    /// A path that is not a non-empty key sequence
    #[error("Malformed path: {message}")]
    MalformedPath { message: String },

    /// A read path that does not exist in the document
    #[error("Missing path {path}: did not find {key:?} in {available:?}")]
    MissingPath {
        path: Path,
        key: String,
        available: Vec<String>,
    },

    /// A write that would replace an existing value
    #[error("Target exists: a value already exists at path {path}")]
    TargetExists {
        path: Path,
        /// Snapshot of the document at the time of the collision
        document: Box<Value>,
    },

    /// A path prefix resolved to something other than a mapping
    #[error("Type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Derive outputs and target paths differ in length
    #[error("Arity mismatch: expected {expected} values, found {found}. Did you remember to box your function?")]
    ArityMismatch { expected: usize, found: usize },

    /// An empty derive output under the `error` empty policy
    #[error("Empty value: value to add at {path} may not be empty")]
    EmptyValue { path: Path },

    /// A caller-supplied transform failed
    #[error("Transform failed: {message}")]
    Transform {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A function name that is not in the registry
    #[error("Unknown function: {name}")]
    UnknownFunction { name: String },

    /// Invalid rule configuration
    #[error("Invalid rule configuration: {message}")]
    Configuration {
        message: String,
        rule: Option<String>,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification used when reporting errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedPath,
    MissingPath,
    TargetExists,
    TypeMismatch,
    ArityMismatch,
    EmptyValue,
    Transform,
    UnknownFunction,
    Configuration,
    Json,
}

impl Error {
    /// Create a transform error from a message
    pub fn transform(message: impl Into<String>) -> Self {
        Error::Transform {
            message: message.into(),
            source: None,
        }
    }

    /// Create a malformed path error
    pub fn malformed_path(message: impl Into<String>) -> Self {
        Error::MalformedPath {
            message: message.into(),
        }
    }

    /// The only kind the optional-source policy is allowed to swallow
    pub fn is_missing_path(&self) -> bool {
        matches!(self, Error::MissingPath { .. })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MalformedPath { .. } => ErrorKind::MalformedPath,
            Error::MissingPath { .. } => ErrorKind::MissingPath,
            Error::TargetExists { .. } => ErrorKind::TargetExists,
            Error::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Error::ArityMismatch { .. } => ErrorKind::ArityMismatch,
            Error::EmptyValue { .. } => ErrorKind::EmptyValue,
            Error::Transform { .. } => ErrorKind::Transform,
            Error::UnknownFunction { .. } => ErrorKind::UnknownFunction,
            Error::Configuration { .. } => ErrorKind::Configuration,
            Error::Json { .. } => ErrorKind::Json,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::MalformedPath => write!(f, "malformed-path"),
            ErrorKind::MissingPath => write!(f, "missing-path"),
            ErrorKind::TargetExists => write!(f, "target-exists"),
            ErrorKind::TypeMismatch => write!(f, "type-mismatch"),
            ErrorKind::ArityMismatch => write!(f, "arity-mismatch"),
            ErrorKind::EmptyValue => write!(f, "empty-value"),
            ErrorKind::Transform => write!(f, "transform"),
            ErrorKind::UnknownFunction => write!(f, "unknown-function"),
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::Json => write!(f, "json"),
        }
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Transform {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// Name of a JSON value's type, for diagnostics
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
