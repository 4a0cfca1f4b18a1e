//! Atomic document operations
//!
//! These are the only functions that mutate a document directly. Each one
//! addresses a single path and reports the same two data-dependent failures:
//! [`Error::MissingPath`] when a read path is absent and
//! [`Error::TargetExists`] when a write would collide. Whether a given
//! occurrence is fatal is decided by the caller, usually through [`apply`].

use crate::error::{Error, Result};
use crate::path::{exists, resolve_parent, resolve_parent_mut, AccessMode, Path};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What `add` does when the target key already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Fail with `TargetExists`
    FailOnExists,
    /// Replace the existing value
    Overwrite,
}

/// A write that did not happen, handing the value back to the caller
struct Rejected {
    error: Error,
    value: Value,
}

fn try_add(doc: &mut Value, path: &Path, value: Value, policy: WritePolicy) -> std::result::Result<(), Rejected> {
    if policy == WritePolicy::FailOnExists && exists(doc, path) {
        let error = Error::TargetExists {
            path: path.clone(),
            document: Box::new(doc.clone()),
        };
        return Err(Rejected { error, value });
    }

    match resolve_parent_mut(doc, path, AccessMode::Write) {
        Ok(parent) => {
            parent.insert(path.key().to_string(), value);
            Ok(())
        }
        Err(error) => Err(Rejected { error, value }),
    }
}

/// Write `value` at `path`, creating missing prefix mappings
pub fn add(doc: &mut Value, path: &Path, value: Value, policy: WritePolicy) -> Result<()> {
    try_add(doc, path, value, policy).map_err(|rejected| rejected.error)
}

/// Write `value` at `path`, replacing whatever is there
pub fn update(doc: &mut Value, path: &Path, value: Value) -> Result<()> {
    add(doc, path, value, WritePolicy::Overwrite)
}

/// Borrow the value at `path`.
///
/// Does not descend into sequences: a path whose prefix lands on an array
/// or scalar is missing. To reach members, fetch the array and re-address
/// each member.
pub fn get<'a>(doc: &'a Value, path: &Path) -> Result<&'a Value> {
    let parent = resolve_parent(doc, path)?;
    parent.get(path.key()).ok_or_else(|| Error::MissingPath {
        path: path.clone(),
        key: path.key().to_string(),
        available: parent.keys().cloned().collect(),
    })
}

/// Remove the value at `path` from its parent and return it
pub fn pop(doc: &mut Value, path: &Path) -> Result<Value> {
    let parent = resolve_parent_mut(doc, path, AccessMode::Read)?;
    parent.remove(path.key()).ok_or_else(|| Error::MissingPath {
        path: path.clone(),
        key: path.key().to_string(),
        available: Vec::new(),
    })
}

/// Deep-copy the value at `source` to a fresh `target`
pub fn copy(doc: &mut Value, source: &Path, target: &Path) -> Result<()> {
    let value = get(doc, source)?.clone();
    add(doc, target, value, WritePolicy::FailOnExists)
}

/// Move the value at `source` to a fresh `target`.
///
/// If the write fails the value is put back under its original key before
/// the error is returned.
pub fn move_value(doc: &mut Value, source: &Path, target: &Path) -> Result<()> {
    let value = pop(doc, source)?;
    match try_add(doc, target, value, WritePolicy::FailOnExists) {
        Ok(()) => Ok(()),
        Err(Rejected { error, value }) => {
            restore(doc, source, value);
            Err(error)
        }
    }
}

fn restore(doc: &mut Value, source: &Path, value: Value) {
    match resolve_parent_mut(doc, source, AccessMode::Write) {
        Ok(parent) => {
            parent.insert(source.key().to_string(), value);
        }
        Err(e) => {
            log::error!("Could not restore {} after a failed move: {}", source, e);
        }
    }
}

/// Run `op`, converting a `MissingPath` failure into `None` when `optional`.
///
/// Every other error kind propagates unchanged, so malformed paths, write
/// collisions and arity mismatches stay fatal regardless of the flag.
pub fn apply<T, F>(optional: bool, op: F) -> Result<Option<T>>
where
    F: FnOnce() -> Result<T>,
{
    match op() {
        Ok(value) => Ok(Some(value)),
        Err(e) if optional && e.is_missing_path() => {
            log::debug!("Skipping optional source: {}", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
