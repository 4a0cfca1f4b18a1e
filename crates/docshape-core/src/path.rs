//! Path addressing for nested documents
//!
//! A [`Path`] is an ordered, non-empty sequence of mapping keys. The last key
//! is the target (or source) key; every key before it is a prefix naming an
//! intermediate mapping. Resolution walks the prefix in one of two modes:
//! [`AccessMode::Write`] creates missing prefix mappings on demand, while
//! [`AccessMode::Read`] never creates anything and fails on the first absent
//! key with [`Error::MissingPath`].
//!
//! Resolution stops at mappings. In read mode a prefix that lands on a
//! sequence or scalar holds no keys, so it is reported as
//! [`Error::MissingPath`] with an empty `available` list. In write mode the
//! same prefix cannot be extended and is reported as [`Error::TypeMismatch`].
//! Callers that need to reach into sequence members fetch the sequence and
//! re-address each element.

use crate::error::{value_kind, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// An ordered, non-empty key sequence into a document
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Path(Vec<String>);

/// How a path prefix is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Never create; fail with `MissingPath` on the first absent key
    Read,
    /// Create empty mappings for missing prefix keys
    Write,
}

impl Path {
    /// Create a path from a sequence of keys
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(Error::malformed_path("a path needs at least one key"));
        }
        Ok(Self(segments))
    }

    /// Create a path from a first key and any number of following keys.
    /// Cannot fail, which is what the [`path!`](crate::path!) macro relies on.
    pub fn from_parts(first: impl Into<String>, rest: Vec<String>) -> Self {
        let mut segments = Vec::with_capacity(rest.len() + 1);
        segments.push(first.into());
        segments.extend(rest);
        Self(segments)
    }

    /// Interpret a JSON value as a path.
    ///
    /// Only a non-empty array of strings is a path; anything else is a
    /// programmer error and reported as `MalformedPath`.
    pub fn from_value(value: &Value) -> Result<Self> {
        let items = value.as_array().ok_or_else(|| {
            Error::malformed_path(format!(
                "expected an array of keys, found {}: {}",
                value_kind(value),
                value
            ))
        })?;

        let segments = items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    Error::malformed_path(format!(
                        "path keys must be strings, found {}: {}",
                        value_kind(item),
                        item
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(segments)
    }

    /// All keys of the path
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The prefix keys (everything but the last key)
    pub fn prefix(&self) -> &[String] {
        &self.0[..self.0.len() - 1]
    }

    /// The target/source key
    pub fn key(&self) -> &str {
        &self.0[self.0.len() - 1]
    }

    /// Number of keys, always at least one
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Paths are never empty; provided for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The path of the parent mapping, if the path has a prefix
    pub fn parent(&self) -> Option<Path> {
        if self.0.len() > 1 {
            Some(Self(self.prefix().to_vec()))
        } else {
            None
        }
    }

    /// A new path with `key` appended
    pub fn child(&self, key: impl Into<String>) -> Path {
        let mut segments = self.0.clone();
        segments.push(key.into());
        Self(segments)
    }

    /// A new path with all keys of `other` appended
    pub fn join(&self, other: &Path) -> Path {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    /// Display form of the first `depth` keys, `$` for the document root
    pub(crate) fn display_prefix(&self, depth: usize) -> String {
        if depth == 0 {
            "$".to_string()
        } else {
            self.0[..depth].join(".")
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for Path {
    type Err = Error;

    /// Parse dotted notation, e.g. `contributors.first_name`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::malformed_path("empty path string"));
        }
        let segments: Vec<&str> = s.split('.').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(Error::malformed_path(format!("empty key in path {:?}", s)));
        }
        Self::new(segments)
    }
}

impl TryFrom<Vec<String>> for Path {
    type Error = Error;

    fn try_from(segments: Vec<String>) -> Result<Self> {
        Self::new(segments)
    }
}

impl From<Path> for Vec<String> {
    fn from(path: Path) -> Self {
        path.0
    }
}

/// Construct a [`Path`] from one or more keys.
///
/// ```
/// use docshape_core::path;
///
/// let p = path!("subjects", "species");
/// assert_eq!(p.key(), "species");
/// ```
#[macro_export]
macro_rules! path {
    ($first:expr $(, $rest:expr)* $(,)?) => {
        $crate::Path::from_parts($first, vec![$(::std::string::String::from($rest)),*])
    };
}

/// Read-mode view of a node as a mapping; anything else has no keys
fn as_mapping<'a>(node: &'a Value, path: &Path, depth: usize) -> Result<&'a Map<String, Value>> {
    node.as_object().ok_or_else(|| not_a_mapping(path, depth))
}

fn not_a_mapping(path: &Path, depth: usize) -> Error {
    Error::MissingPath {
        path: path.clone(),
        key: path.segments()[depth].clone(),
        available: Vec::new(),
    }
}

fn as_mapping_mut<'a>(
    node: &'a mut Value,
    path: &Path,
    depth: usize,
    mode: AccessMode,
) -> Result<&'a mut Map<String, Value>> {
    match node {
        Value::Object(map) => Ok(map),
        _ if mode == AccessMode::Read => Err(not_a_mapping(path, depth)),
        other => Err(cannot_extend(path, depth, other)),
    }
}

fn cannot_extend(path: &Path, depth: usize, node: &Value) -> Error {
    Error::TypeMismatch {
        path: path.display_prefix(depth),
        expected: "object",
        found: value_kind(node),
    }
}

fn missing_key(path: &Path, key: &str, map: &Map<String, Value>) -> Error {
    Error::MissingPath {
        path: path.clone(),
        key: key.to_string(),
        available: map.keys().cloned().collect(),
    }
}

/// Resolve the mapping holding the final key, in read mode.
///
/// Fails with `MissingPath` on the first absent prefix key, on a prefix that
/// is not a mapping, or when the final key is absent from the resolved
/// mapping.
pub fn resolve_parent<'a>(doc: &'a Value, path: &Path) -> Result<&'a Map<String, Value>> {
    let mut node = doc;
    for (depth, key) in path.prefix().iter().enumerate() {
        let map = as_mapping(node, path, depth)?;
        node = map.get(key).ok_or_else(|| missing_key(path, key, map))?;
    }

    let parent = as_mapping(node, path, path.prefix().len())?;
    if !parent.contains_key(path.key()) {
        return Err(missing_key(path, path.key(), parent));
    }
    Ok(parent)
}

/// Resolve the mapping holding the final key for mutation.
///
/// In [`AccessMode::Write`] missing prefix mappings are created and the final
/// key is not checked. In [`AccessMode::Read`] nothing is created and the
/// final key must exist.
pub fn resolve_parent_mut<'a>(
    doc: &'a mut Value,
    path: &Path,
    mode: AccessMode,
) -> Result<&'a mut Map<String, Value>> {
    let mut node = doc;
    for (depth, key) in path.prefix().iter().enumerate() {
        let map = as_mapping_mut(node, path, depth, mode)?;
        node = match mode {
            AccessMode::Write => map
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new())),
            AccessMode::Read => {
                if !map.contains_key(key.as_str()) {
                    return Err(missing_key(path, key, map));
                }
                map.get_mut(key.as_str()).ok_or_else(|| Error::MissingPath {
                    path: path.clone(),
                    key: key.clone(),
                    available: Vec::new(),
                })?
            }
        };
    }

    let parent = as_mapping_mut(node, path, path.prefix().len(), mode)?;
    if mode == AccessMode::Read && !parent.contains_key(path.key()) {
        return Err(missing_key(path, path.key(), parent));
    }
    Ok(parent)
}

/// Check that a write to `path` would resolve without touching the document.
///
/// Fails with `TypeMismatch` where [`resolve_parent_mut`] in write mode
/// would, i.e. when an existing prefix value is not a mapping.
pub fn check_writable(doc: &Value, path: &Path) -> Result<()> {
    let mut node = doc;
    for (depth, key) in path.prefix().iter().enumerate() {
        let map = node.as_object().ok_or_else(|| cannot_extend(path, depth, node))?;
        match map.get(key) {
            Some(next) => node = next,
            None => return Ok(()),
        }
    }
    match node {
        Value::Object(_) => Ok(()),
        other => Err(cannot_extend(path, path.prefix().len(), other)),
    }
}

/// Whether one path is the other or lies below it
pub fn overlaps(a: &Path, b: &Path) -> bool {
    a.segments().starts_with(b.segments()) || b.segments().starts_with(a.segments())
}

/// Whether a value exists at `path`; never fails
pub fn exists(doc: &Value, path: &Path) -> bool {
    resolve_parent(doc, path).is_ok()
}
