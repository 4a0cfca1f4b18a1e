//! Docshape Core - Path-addressed transformation engine for nested documents
//!
//! This crate reshapes tree-structured records (JSON-like mappings,
//! sequences and scalars) in place, driven by ordered rule lists addressed
//! by key paths.
//!
//! # Main Components
//!
//! - **Paths**: Non-empty key sequences with read and write resolution
//! - **Atomic Operations**: add, get, pop, copy and move on a single path
//! - **Batch Transformer**: Ordered rule batches with an optional-source policy
//! - **Derive Engine**: N source values through one function into M targets
//! - **Subpipelines**: Nested pipelines over extracted sub-documents
//! - **Rule Sets**: Declarative steps with functions resolved by name
//!
//! # Example
//!
//! ```
//! use docshape_core::{derive, ops, path, boxed, DeriveRule, EmptyPolicy, Result};
//! use serde_json::json;
//!
//! fn example() -> Result<()> {
//!     let mut doc = json!({"a": {"b": 1}});
//!     let rule = DeriveRule::new(
//!         vec![path!("a", "b")],
//!         boxed(|values| Ok(json!(values[0].as_i64().unwrap_or(0) * 2))),
//!         vec![path!("a", "c")],
//!     );
//!     derive(&mut doc, &[rule], false, EmptyPolicy::Cull)?;
//!     assert_eq!(ops::get(&doc, &path!("a", "c"))?, &json!(2));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod error;
pub mod ops;
pub mod path;
pub mod rules;
pub mod transformer;
pub mod util;

#[cfg(test)]
mod proptest_strategies;

// Re-export main types for convenience
pub use error::{Error, ErrorKind, Result};
pub use ops::WritePolicy;
pub use path::{AccessMode, Path};
pub use rules::{CompiledRuleSet, RulePipeline, RuleSet, RunReport, Step, StepReport, TransformOptions};
pub use transformer::{
    // Function signatures and combinators
    boxed, derive_fn, unary, value_fn, zip_eq, DeriveFn, ValueFn,

    // Derive
    derive, DeriveRule, DeriveRuleBuilder, EmptyPolicy,

    // Subpipelines
    pipeline_factory, subpipeline, NestedPipeline, PipelineFactory, Selection, Subpipeline,
    SubpipelineFailure, SubpipelineOutcome,

    // Reports and registry
    BatchReport, FunctionRegistry,
};
pub use util::{get_all_errors, is_empty_value, query};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
