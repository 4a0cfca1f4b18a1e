//! Errors command handler

use super::utils::read_document;
use crate::cli::ErrorsArgs;
use crate::error::Result;
use crate::output::OutputWriter;
use docshape_core::get_all_errors;
use tracing::info;

/// Handle the errors command
pub fn handle_errors(args: ErrorsArgs, output: &mut OutputWriter) -> Result<()> {
    let document = read_document(Some(args.document.as_path()))?;
    let errors = get_all_errors(&document);
    info!(count = errors.len(), "Collected recorded errors");
    output.errors(&errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use crate::output::testing::SharedBuffer;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_errors_collected_from_nested_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(
            &path,
            r#"{"errors": ["top"], "files": {"errors": [{"message": "bad checksum"}]}}"#,
        )
        .unwrap();

        let buffer = SharedBuffer::default();
        let mut output = OutputWriter::with_writer(OutputFormat::Json, false, false, Box::new(buffer.clone()));
        handle_errors(ErrorsArgs { document: path }, &mut output).unwrap();

        assert_eq!(buffer.contents(), "[\"top\",{\"message\":\"bad checksum\"}]\n");
    }
}
