//! Apply command handler

use super::utils::{load_rule_set, read_document, write_document};
use crate::cli::{ApplyArgs, OutputFormat};
use crate::config::Config;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use docshape_core::{FunctionRegistry, RunReport};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

/// Document and report printed together for machine formats
#[derive(Serialize)]
struct ApplyOutput<'a> {
    document: &'a Value,
    report: &'a RunReport,
}

/// Handle the apply command
#[instrument(skip(config, output), fields(rules = %args.rules.display()))]
pub fn handle_apply(args: ApplyArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let timer = Timer::with_details("apply", &args.rules.display().to_string());

    let rules = load_rule_set(&args.rules)?;
    let mut document = read_document(args.document.as_deref())?;

    let registry = FunctionRegistry::with_built_ins();
    let compiled = rules.compile(&registry, &config.transform_options())?;
    debug!(steps = compiled.len(), "Compiled rule set");

    let report = compiled.apply(&mut document)?;
    let totals = report.totals();
    info!(
        applied = totals.applied,
        skipped = totals.skipped,
        culled = totals.culled,
        "Applied rule set"
    );

    match &args.save_to {
        Some(path) => {
            write_document(path, &document)?;
            output.success(&format!("✓ Document saved to {}", path.display()))?;
            if args.report {
                output.section("Report")?;
                output.run_report(&report)?;
            }
        }
        None if args.report && output.format() != OutputFormat::Human => {
            output.data(&ApplyOutput {
                document: &document,
                report: &report,
            })?;
        }
        None => {
            output.data(&document)?;
            if args.report {
                output.section("Report")?;
                output.run_report(&report)?;
            }
        }
    }

    for failure in &report.failures {
        output.warning(&format!("Skipped subpipeline {}", failure))?;
    }

    timer.finish();
    Ok(())
}
