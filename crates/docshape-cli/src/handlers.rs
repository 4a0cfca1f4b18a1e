//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod apply;
mod completions;
mod errors;
mod get;
mod utils;

pub use apply::handle_apply;
pub use completions::handle_completions;
pub use errors::handle_errors;
pub use get::handle_get;

use crate::cli::{CheckArgs, OutputFormat};
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputWriter;
use docshape_core::FunctionRegistry;
use serde::Serialize;
use utils::load_rule_set;

/// Summary of a rule set that compiled
#[derive(Debug, Serialize)]
struct CheckSummary<'a> {
    name: Option<&'a str>,
    steps: Vec<&'static str>,
}

/// Handle the check command
pub fn handle_check(args: CheckArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    output.info(&format!("Checking rule set: {}", args.rules.display()))?;

    let rules = load_rule_set(&args.rules)?;
    let compiled = rules.compile(&FunctionRegistry::with_built_ins(), &config.transform_options())?;

    let summary = CheckSummary {
        name: rules.name.as_deref(),
        steps: rules.steps.iter().map(|step| step.op()).collect(),
    };

    if output.format() != OutputFormat::Human {
        return output.data(&summary);
    }

    output.success(&format!(
        "✓ Rule set {} is valid: {} step(s)",
        summary.name.unwrap_or("(unnamed)"),
        compiled.len()
    ))?;
    let rows = summary
        .steps
        .iter()
        .enumerate()
        .map(|(i, op)| vec![(i + 1).to_string(), op.to_string()])
        .collect();
    output.table(&["#", "Step"], rows)
}

/// Handle the functions command
pub fn handle_functions(output: &mut OutputWriter) -> Result<()> {
    let registry = FunctionRegistry::with_built_ins();
    let names = registry.names();

    if output.format() != OutputFormat::Human {
        return output.data(&names);
    }

    output.section(&format!("Available functions ({})", names.len()))?;
    for name in names {
        output.writeln(&format!("  • {}", name))?;
    }
    Ok(())
}
