//! Output formatting and writing utilities
//!
//! This module provides utilities for formatting and writing output
//! in various formats (JSON, YAML, human-readable), with dedicated
//! renderings for run reports, path lookups and collected errors.

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::Colorize;
use docshape_core::RunReport;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};
use tracing::{debug, trace};

/// The value found (or not) at one dotted path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lookup {
    pub path: String,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Trait for formatting output with specialized support for common types
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format a run report with per-step counts
    fn format_run_report(&self, report: &RunReport) -> Result<String>;

    /// Format path lookups
    fn format_lookups(&self, lookups: &[Lookup]) -> Result<String>;

    /// Format entries collected from `errors` arrays
    fn format_errors(&self, errors: &[Value]) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            OutputFormat::Human => {
                // Documents read best as pretty JSON
                Ok(serde_json::to_string_pretty(value)?)
            }
        }
    }

    fn format_run_report(&self, report: &RunReport) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_run_report_human(report)),
            _ => self.format(report),
        }
    }

    fn format_lookups(&self, lookups: &[Lookup]) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_lookups_human(lookups)),
            _ => self.format(&lookups),
        }
    }

    fn format_errors(&self, errors: &[Value]) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_errors_human(errors)),
            _ => self.format(&errors),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer on stdout
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self::with_writer(format, use_color, quiet, Box::new(io::stdout()))
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(format: OutputFormat, use_color: bool, quiet: bool, writer: Box<dyn Write>) -> Self {
        Self {
            format,
            use_color,
            quiet,
            writer,
        }
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        debug!("Output info: {}", message);

        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let formatted = self.format.format(value)?;
        trace!(bytes = formatted.len(), "Outputting data");

        if self.format == OutputFormat::Yaml {
            // serde_yaml already ends with a newline
            self.write(&formatted)
        } else {
            self.writeln(&formatted)
        }
    }

    /// Write a run report
    pub fn run_report(&mut self, report: &RunReport) -> Result<()> {
        let formatted = self.format.format_run_report(report)?;
        self.writeln(formatted.trim_end())
    }

    /// Write path lookups
    pub fn lookups(&mut self, lookups: &[Lookup]) -> Result<()> {
        let formatted = self.format.format_lookups(lookups)?;
        self.writeln(formatted.trim_end())
    }

    /// Write collected errors
    pub fn errors(&mut self, errors: &[Value]) -> Result<()> {
        let formatted = self.format.format_errors(errors)?;
        self.writeln(formatted.trim_end())
    }

    /// Write a table (for human format)
    pub fn table(&mut self, headers: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        let rendered = render_table(headers, &rows);
        let mut lines = rendered.lines();
        if let Some(header) = lines.next() {
            if self.use_color {
                self.writeln(&header.bold().to_string())?;
            } else {
                self.writeln(header)?;
            }
        }
        for line in lines {
            self.writeln(line)?;
        }
        Ok(())
    }
}

/// Render rows under headers with padded columns
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let mut output = String::new();
    let header_row = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect::<Vec<_>>()
        .join(" │ ");
    output.push_str(header_row.trim_end());
    output.push('\n');

    let separator = widths
        .iter()
        .map(|w| "─".repeat(*w))
        .collect::<Vec<_>>()
        .join("─┼─");
    output.push_str(&separator);
    output.push('\n');

    for row in rows {
        let row_str = row
            .iter()
            .enumerate()
            .map(|(i, cell)| match widths.get(i) {
                Some(width) => format!("{:width$}", cell, width = *width),
                None => cell.clone(),
            })
            .collect::<Vec<_>>()
            .join(" │ ");
        output.push_str(row_str.trim_end());
        output.push('\n');
    }

    output
}

/// Format a run report for human reading
fn format_run_report_human(report: &RunReport) -> String {
    let headers = ["#", "Step", "Applied", "Skipped", "Culled"];
    let rows: Vec<Vec<String>> = report
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            vec![
                (i + 1).to_string(),
                step.op.to_string(),
                step.report.applied.to_string(),
                step.report.skipped.to_string(),
                step.report.culled.to_string(),
            ]
        })
        .collect();

    let mut output = render_table(&headers, &rows);
    let totals = report.totals();
    output.push_str(&format!(
        "\nTotal: {} applied, {} skipped, {} culled\n",
        totals.applied, totals.skipped, totals.culled
    ));

    if !report.failures.is_empty() {
        output.push_str(&format!("\nSkipped subpipelines ({}):\n", report.failures.len()));
        for failure in &report.failures {
            output.push_str(&format!("  • {}\n", failure));
        }
    }

    output
}

/// Format lookups as `path: value` lines
fn format_lookups_human(lookups: &[Lookup]) -> String {
    let mut output = String::new();
    for lookup in lookups {
        let rendered = match &lookup.value {
            Some(value) => format_value_compact(value),
            None => "<absent>".to_string(),
        };
        output.push_str(&format!("{}: {}\n", lookup.path, rendered));
    }
    output
}

/// Format collected errors as a numbered list
fn format_errors_human(errors: &[Value]) -> String {
    if errors.is_empty() {
        return "No errors recorded\n".to_string();
    }

    let mut output = format!("{} error(s) recorded\n\n", errors.len());
    for (i, error) in errors.iter().enumerate() {
        let rendered = match error {
            Value::String(s) => s.clone(),
            Value::Object(map) => match map.get("message") {
                Some(Value::String(message)) => message.clone(),
                _ => format_value_compact(error),
            },
            other => format_value_compact(other),
        };
        output.push_str(&format!("{}. {}\n", i + 1, rendered));
    }
    output
}

/// Format a JSON value in a compact, human-readable way
fn format_value_compact(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            if arr.len() <= 3 {
                format!(
                    "[{}]",
                    arr.iter().map(format_value_compact).collect::<Vec<_>>().join(", ")
                )
            } else {
                format!("[{} items]", arr.len())
            }
        }
        Value::Object(obj) => {
            if obj.len() <= 2 {
                let items: Vec<String> = obj
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, format_value_compact(v)))
                    .collect();
                format!("{{{}}}", items.join(", "))
            } else {
                format!("{{{} fields}}", obj.len())
            }
        }
    }
}


#[cfg(test)]
mod tests {
    include!("output/tests.rs");
}
