//! Subpipelines: run a nested pipeline over an extracted sub-document
//!
//! For each descriptor a fresh sub-document is assembled from `(get, add)`
//! path pairs, handed by value to a nested pipeline, and the pipeline's data
//! is merged back into the main document at the descriptor's target. The
//! sub-document is owned by the composer and then by the pipeline; nothing is
//! shared with the main document until the single merge write.
//!
//! All descriptors are assembled before any pipeline runs, so every
//! selection observes the document as it was when the batch started.
//!
//! Copyright (c) 2025 Docshape Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::ops::{self, WritePolicy};
use crate::path::Path;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// A pipeline constructed from an assembled sub-document
pub trait NestedPipeline {
    /// The pipeline's result.
    ///
    /// Stateful pipelines perform their work the first time this is called,
    /// so the composer calls it even when the result is discarded.
    fn data(&mut self) -> Result<Value>;
}

/// Builds a nested pipeline from its sub-document
pub type PipelineFactory = Arc<dyn Fn(Value) -> Result<Box<dyn NestedPipeline>> + Send + Sync>;

/// Wrap a closure as a [`PipelineFactory`]
pub fn pipeline_factory<F>(factory: F) -> PipelineFactory
where
    F: Fn(Value) -> Result<Box<dyn NestedPipeline>> + Send + Sync + 'static,
{
    Arc::new(factory)
}

/// One `(get, add)` pair of a subpipeline descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Where to read in the main document
    pub get: Path,
    /// Where to place the value in the sub-document; `None` replaces the
    /// whole sub-document with the value
    pub add: Option<Path>,
}

/// A subpipeline descriptor
#[derive(Clone)]
pub struct Subpipeline {
    /// Identifies the pipeline in failure records
    pub name: String,
    pub selections: Vec<Selection>,
    pub factory: PipelineFactory,
    /// Where the pipeline's data is merged; `None` discards it
    pub target: Option<Path>,
}

impl Subpipeline {
    /// Create a descriptor with no selections and no target
    pub fn new(name: impl Into<String>, factory: PipelineFactory) -> Self {
        Self {
            name: name.into(),
            selections: Vec::new(),
            factory,
            target: None,
        }
    }

    /// Select `get` from the main document into `add` in the sub-document
    pub fn select(mut self, get: Path, add: Path) -> Self {
        self.selections.push(Selection { get, add: Some(add) });
        self
    }

    /// Use the value at `get` as the whole sub-document
    pub fn select_root(mut self, get: Path) -> Self {
        self.selections.push(Selection { get, add: None });
        self
    }

    /// Merge the pipeline's data at `target`
    pub fn target(mut self, target: Path) -> Self {
        self.target = Some(target);
        self
    }
}

impl fmt::Debug for Subpipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subpipeline")
            .field("name", &self.name)
            .field("selections", &self.selections)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// A descriptor skipped because an optional selection was missing
#[derive(Debug)]
pub struct SubpipelineFailure {
    pub get_path: Path,
    pub error: Error,
    pub pipeline: String,
}

impl fmt::Display for SubpipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: could not select {}: {}", self.pipeline, self.get_path, self.error)
    }
}

/// Everything a subpipeline batch produced
#[derive(Default)]
pub struct SubpipelineOutcome {
    /// Constructed pipelines, in descriptor order, after their merge
    pub pipelines: Vec<(String, Box<dyn NestedPipeline>)>,
    /// Descriptors that were skipped
    pub failures: Vec<SubpipelineFailure>,
}

impl SubpipelineOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Debug for SubpipelineOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.pipelines.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("SubpipelineOutcome")
            .field("pipelines", &names)
            .field("failures", &self.failures)
            .finish()
    }
}

/// Run subpipeline descriptors.
///
/// A missing selection skips its descriptor and records a failure when
/// `source_key_optional` is set; otherwise it aborts the batch. With
/// [`WritePolicy::Overwrite`] the merge replaces an existing target.
pub fn subpipeline(
    doc: &mut Value,
    descriptors: &[Subpipeline],
    merge: WritePolicy,
    source_key_optional: bool,
) -> Result<SubpipelineOutcome> {
    let mut outcome = SubpipelineOutcome::default();
    let mut prepared = Vec::with_capacity(descriptors.len());

    'descriptors: for descriptor in descriptors {
        let mut selected = Value::Object(Map::new());
        for selection in &descriptor.selections {
            let value = match ops::get(doc, &selection.get) {
                Ok(value) => value.clone(),
                Err(error) if source_key_optional && error.is_missing_path() => {
                    log::warn!("Skipping subpipeline '{}': {}", descriptor.name, error);
                    outcome.failures.push(SubpipelineFailure {
                        get_path: selection.get.clone(),
                        error,
                        pipeline: descriptor.name.clone(),
                    });
                    continue 'descriptors;
                }
                Err(error) => return Err(error),
            };

            match &selection.add {
                Some(add) => ops::add(&mut selected, add, value, WritePolicy::FailOnExists)?,
                None => selected = value,
            }
        }
        prepared.push((descriptor, selected));
    }

    for (descriptor, selected) in prepared {
        log::debug!("Running subpipeline '{}'", descriptor.name);
        let mut pipeline = (descriptor.factory)(selected)?;
        let data = pipeline.data()?;
        if let Some(target) = &descriptor.target {
            ops::add(doc, target, data, merge)?;
        }
        outcome.pipelines.push((descriptor.name.clone(), pipeline));
    }

    Ok(outcome)
}
