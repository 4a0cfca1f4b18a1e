//! Get command handler

use super::utils::{parse_paths, read_document};
use crate::cli::GetArgs;
use crate::error::Result;
use crate::output::{Lookup, OutputWriter};
use docshape_core::transformer::batch;
use serde_json::Value;
use tracing::{debug, instrument};

/// Handle the get command
///
/// Paths are fetched as optional sources, so a missing path is reported as
/// absent rather than failing the command.
#[instrument(skip(output), fields(document = %args.document.display()))]
pub fn handle_get(args: GetArgs, output: &mut OutputWriter) -> Result<()> {
    let document = read_document(Some(args.document.as_path()))?;
    let lookups = lookup(&document, args.paths)?;
    debug!(
        found = lookups.iter().filter(|lookup| lookup.found).count(),
        total = lookups.len(),
        "Looked up paths"
    );
    output.lookups(&lookups)
}

fn lookup(document: &Value, dotted: Vec<String>) -> Result<Vec<Lookup>> {
    let paths = parse_paths(&dotted)?;
    let values = batch::get(document, &paths, true)?;

    Ok(dotted
        .into_iter()
        .zip(values)
        .map(|(path, value)| Lookup {
            path,
            found: value.is_some(),
            value,
        })
        .collect())
}
