//! Rule-driven batch transformation of nested documents
//!
//! This module builds ordered batches of rules on top of the atomic
//! operations in [`crate::ops`]: plain batches (add, get, pop, delete, copy,
//! move, update, lift), derive rules that feed N source values through a
//! function into M targets, and subpipelines that run a nested pipeline over
//! an extracted sub-document.
//!
//! # Module Organization
//!
//! - [`types`] - Function signatures, the empty-value policy and batch reports
//! - [`batch`] - Ordered batch operators
//! - [`derive`] - The derive engine and its function combinators
//! - [`subpipeline`] - Nested pipeline composition
//! - [`builder`] - Fluent builder API for derive rules
//! - [`built_in`] - Pre-configured derive functions
//! - [`registry`] - Name to function lookup for declarative rule sets
//!
//! # Examples
//!
//! ## Splitting a name into two fields
//!
//! ```
//! use docshape_core::{derive, path, DeriveRule, EmptyPolicy};
//! use docshape_core::transformer::built_in;
//! use serde_json::json;
//!
//! let mut doc = json!({"contributor": {"name": "Doe, Jane"}});
//! let rule = DeriveRule::new(
//!     vec![path!("contributor", "name")],
//!     built_in::split_name(),
//!     vec![path!("contributor", "first_name"), path!("contributor", "last_name")],
//! );
//!
//! derive(&mut doc, &[rule], true, EmptyPolicy::Cull).unwrap();
//! assert_eq!(doc["contributor"]["first_name"], json!("Jane"));
//! assert_eq!(doc["contributor"]["last_name"], json!("Doe"));
//! ```
//!
//! ## Optional moves
//!
//! ```
//! use docshape_core::{path, transformer::batch};
//! use serde_json::json;
//!
//! let mut doc = json!({"old": 1});
//! let moves = vec![(path!("old"), path!("new")), (path!("gone"), path!("other"))];
//! let report = batch::move_values(&mut doc, &moves, true).unwrap();
//!
//! assert_eq!(doc, json!({"new": 1}));
//! assert_eq!((report.applied, report.skipped), (1, 1));
//! ```
//!
//! Copyright (c) 2025 Docshape Team
//! Licensed under the Apache-2.0 license

// Core types
pub mod types;

// Batch operators
pub mod batch;

// Derive engine
pub mod derive;

// Nested pipelines
pub mod subpipeline;

// Rule builder API
pub mod builder;

// Pre-configured functions
pub mod built_in;

// Named function lookup
pub mod registry;

// Test module
#[cfg(test)]
mod tests;

pub use builder::DeriveRuleBuilder;
pub use derive::{boxed, derive, unary, zip_eq, DeriveRule};
pub use registry::FunctionRegistry;
pub use subpipeline::{
    pipeline_factory, subpipeline, NestedPipeline, PipelineFactory, Selection, Subpipeline,
    SubpipelineFailure, SubpipelineOutcome,
};
pub use types::{derive_fn, is_empty_value, value_fn, BatchReport, DeriveFn, EmptyPolicy, ValueFn};
