//! Derive: N source values through one function into M target paths
//!
//! A derive rule fetches every source path, calls its function with the
//! fetched values in order, and writes the outputs to its target paths. The
//! output count must equal the target count exactly; a mismatch is a rule
//! declaration bug and is never treated as a missing-data condition.
//!
//! Copyright (c) 2025 Docshape Team
//! Licensed under the Apache-2.0 license

use super::types::{is_empty_value, BatchReport, DeriveFn, EmptyPolicy};
use crate::error::{Error, Result};
use crate::ops::{self, WritePolicy};
use crate::path::{check_writable, exists, overlaps, Path};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A single derive rule
#[derive(Clone)]
pub struct DeriveRule {
    /// Paths whose values are passed to the function, in order
    pub sources: Vec<Path>,
    /// Transform from source values to output values
    pub function: DeriveFn,
    /// Paths the outputs are written to, in order; empty for effect-only rules
    pub targets: Vec<Path>,
    /// Per-rule override of the batch's optional-source flag
    pub optional: Option<bool>,
}

impl DeriveRule {
    /// Create a rule writing outputs to `targets`
    pub fn new(sources: Vec<Path>, function: DeriveFn, targets: Vec<Path>) -> Self {
        Self {
            sources,
            function,
            targets,
            optional: None,
        }
    }

    /// Create a rule with no targets.
    ///
    /// The function runs for its side effects and its return value is
    /// discarded. The function only sees copies of the source values, so it
    /// cannot reach back into the document being transformed.
    pub fn effect(sources: Vec<Path>, function: DeriveFn) -> Self {
        Self::new(sources, function, Vec::new())
    }

    /// Override the batch's optional-source flag for this rule
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = Some(optional);
        self
    }
}

impl fmt::Debug for DeriveRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeriveRule")
            .field("sources", &self.sources)
            .field("targets", &self.targets)
            .field("optional", &self.optional)
            .finish_non_exhaustive()
    }
}

/// Box a single-value function so it returns a one-element output list.
///
/// Most derive functions produce one value; wrapping them here keeps the
/// arity contract without every function building its own vector.
pub fn boxed<F>(function: F) -> DeriveFn
where
    F: Fn(Vec<Value>) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(move |values| Ok(vec![function(values)?]))
}

/// Adapt a one-argument function to a derive function.
///
/// The adapted function fails with `ArityMismatch` unless it receives exactly
/// one source value.
pub fn unary<F>(function: F) -> DeriveFn
where
    F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
{
    boxed(move |values| {
        let found = values.len();
        match <[Value; 1]>::try_from(values) {
            Ok([value]) => function(value),
            Err(_) => Err(Error::ArityMismatch { expected: 1, found }),
        }
    })
}

/// Zip two sequences, failing unless both have the same length.
///
/// `expected` and `found` in the error are the full lengths of the first and
/// second sequence respectively.
pub fn zip_eq<A, B, IA, IB>(first: IA, second: IB) -> Result<Vec<(A, B)>>
where
    IA: IntoIterator<Item = A>,
    IB: IntoIterator<Item = B>,
{
    let mut first = first.into_iter();
    let mut second = second.into_iter();
    let mut pairs = Vec::new();

    loop {
        match (first.next(), second.next()) {
            (Some(a), Some(b)) => pairs.push((a, b)),
            (None, None) => return Ok(pairs),
            (a, b) => {
                let expected = pairs.len() + usize::from(a.is_some()) + first.count();
                let found = pairs.len() + usize::from(b.is_some()) + second.count();
                return Err(Error::ArityMismatch { expected, found });
            }
        }
    }
}

/// Apply derive rules in order.
///
/// Per rule:
/// 1. fetch every source; a missing source skips the rule when optional,
/// 2. call the function; with no targets the result is discarded,
/// 3. strictly zip targets with outputs,
/// 4. apply the empty policy to each output,
/// 5. check every surviving target, then write each output.
///
/// A rule that fails at any step writes nothing. Targets must be fresh and
/// must not overlap one another.
pub fn derive(
    doc: &mut Value,
    rules: &[DeriveRule],
    source_key_optional: bool,
    empty: EmptyPolicy,
) -> Result<BatchReport> {
    let mut report = BatchReport::default();

    for rule in rules {
        let optional = rule.optional.unwrap_or(source_key_optional);
        let outputs = ops::apply(optional, || {
            let values = rule
                .sources
                .iter()
                .map(|source| ops::get(doc, source).cloned())
                .collect::<Result<Vec<_>>>()?;
            (rule.function)(values)
        })?;

        let Some(outputs) = outputs else {
            report.skipped += 1;
            continue;
        };

        if rule.targets.is_empty() {
            report.applied += 1;
            continue;
        }

        let mut writes = Vec::with_capacity(rule.targets.len());
        for (target, value) in zip_eq(&rule.targets, outputs)? {
            if is_empty_value(&value) {
                match empty {
                    EmptyPolicy::Cull => {
                        report.culled += 1;
                        continue;
                    }
                    EmptyPolicy::Ok => {}
                    EmptyPolicy::Error => {
                        return Err(Error::EmptyValue { path: target.clone() });
                    }
                }
            }
            writes.push((target, value));
        }

        for (index, (target, _)) in writes.iter().enumerate() {
            let collides = exists(doc, target)
                || writes[..index].iter().any(|(earlier, _)| overlaps(earlier, target));
            if collides {
                return Err(Error::TargetExists {
                    path: (*target).clone(),
                    document: Box::new(doc.clone()),
                });
            }
            check_writable(doc, target)?;
        }

        for (target, value) in writes {
            ops::add(doc, target, value, WritePolicy::FailOnExists)?;
        }
        report.applied += 1;
    }

    log::trace!(
        "derive applied {} rules, skipped {}, culled {} outputs",
        report.applied,
        report.skipped,
        report.culled
    );
    Ok(report)
}
