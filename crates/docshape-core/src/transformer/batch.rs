//! Batch operators over ordered rule lists
//!
//! Each operator applies its rules one at a time, in order, through the atomic
//! operations. Later rules observe the mutations of earlier ones. A rule whose
//! source is missing is skipped when the batch is marked optional; every other
//! failure aborts the batch. All operators are eager and return what they did.
//!
//! Copyright (c) 2025 Docshape Team
//! Licensed under the Apache-2.0 license

use super::types::{BatchReport, ValueFn};
use crate::error::Result;
use crate::ops::{self, WritePolicy};
use crate::path::Path;
use serde_json::Value;

/// Unconditional adds: `[(target_path, value), ...]`
pub fn add(doc: &mut Value, adds: &[(Path, Value)]) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    for (target, value) in adds {
        ops::add(doc, target, value.clone(), WritePolicy::FailOnExists)?;
        report.applied += 1;
    }
    Ok(report)
}

/// Read, transform and overwrite in place: `[(path, function), ...]`
pub fn update(doc: &mut Value, updates: &[(Path, ValueFn)], source_key_optional: bool) -> Result<BatchReport> {
    rewrite(doc, updates, source_key_optional)
}

/// Replace a value with a function of itself: `[(path, function), ...]`.
///
/// Same mechanics as [`update`]; rule sets treat lifts as optional by default
/// because they usually expand references that may not be present.
pub fn lift(doc: &mut Value, lifts: &[(Path, ValueFn)], source_key_optional: bool) -> Result<BatchReport> {
    rewrite(doc, lifts, source_key_optional)
}

fn rewrite(doc: &mut Value, rules: &[(Path, ValueFn)], source_key_optional: bool) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    for (path, function) in rules {
        let done = ops::apply(source_key_optional, || {
            let current = ops::get(doc, path)?.clone();
            let new = function(current)?;
            ops::update(doc, path, new)
        })?;
        tally(&mut report, done.is_some());
    }
    Ok(report)
}

/// Fetch copies of values: `[source_path, ...]`.
///
/// The result has one slot per rule, in rule order; `None` marks an optional
/// source that was missing.
pub fn get(doc: &Value, gets: &[Path], source_key_optional: bool) -> Result<Vec<Option<Value>>> {
    gets.iter()
        .map(|path| ops::apply(source_key_optional, || ops::get(doc, path).cloned()))
        .collect()
}

/// Remove and return values: `[source_path, ...]`, one slot per rule
pub fn pop(doc: &mut Value, pops: &[Path], source_key_optional: bool) -> Result<Vec<Option<Value>>> {
    let mut popped = Vec::with_capacity(pops.len());
    for path in pops {
        popped.push(ops::apply(source_key_optional, || ops::pop(doc, path))?);
    }
    Ok(popped)
}

/// Remove values without returning them: `[source_path, ...]`.
///
/// Use [`pop`] when the removed values need to be observed.
pub fn delete(doc: &mut Value, deletes: &[Path], source_key_optional: bool) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    for path in deletes {
        let removed = ops::apply(source_key_optional, || ops::pop(doc, path))?;
        tally(&mut report, removed.is_some());
    }
    Ok(report)
}

/// Deep copies: `[(source_path, target_path), ...]`
pub fn copy(doc: &mut Value, copies: &[(Path, Path)], source_key_optional: bool) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    for (source, target) in copies {
        let done = ops::apply(source_key_optional, || ops::copy(doc, source, target))?;
        tally(&mut report, done.is_some());
    }
    Ok(report)
}

/// Moves: `[(source_path, target_path), ...]`
pub fn move_values(doc: &mut Value, moves: &[(Path, Path)], source_key_optional: bool) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    for (source, target) in moves {
        let done = ops::apply(source_key_optional, || ops::move_value(doc, source, target))?;
        tally(&mut report, done.is_some());
    }
    Ok(report)
}

/// Copy rules for the same fields under two parents
pub fn copy_all<I, S>(source_parent: &Path, target_parent: &Path, fields: I) -> Vec<(Path, Path)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|field| {
            (
                source_parent.child(field.as_ref()),
                target_parent.child(field.as_ref()),
            )
        })
        .collect()
}

fn tally(report: &mut BatchReport, applied: bool) {
    if applied {
        report.applied += 1;
    } else {
        report.skipped += 1;
    }
}
