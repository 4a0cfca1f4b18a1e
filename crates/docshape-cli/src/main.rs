//! Docshape CLI - Command-line interface for rule-driven document reshaping
//!
//! This is the main entry point for the Docshape CLI application, providing
//! commands for applying rule sets to JSON and YAML records and for
//! inspecting documents.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands, OutputFormat};
use colored::control;
use config::Config;
use error::{Error, Result};
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;

fn main() {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // Configuration comes first so its logging and output sections apply
    let config = match Config::load_with_file(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => exit_with(&e, !cli.no_color),
    };

    let use_color = cli.use_color() && config.output.color;
    control::set_override(use_color);

    if let Err(e) = init_logging(&cli, &config) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(cli, &config, use_color) {
        Ok(()) => process::exit(0),
        Err(e) => exit_with(&e, use_color),
    }
}

/// Report an error on stderr and exit with its code
fn exit_with(error: &Error, use_color: bool) -> ! {
    eprintln!("{}", error::format_error(error, use_color));

    if error.should_show_help() {
        eprintln!("\nFor more information, try '--help'");
    }

    process::exit(error.exit_code())
}

/// Main application logic
#[instrument(skip(cli, config), fields(command = ?cli.command))]
fn run(cli: Cli, config: &Config, use_color: bool) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let format = resolve_output_format(cli.output, config)?;
    let mut output = OutputWriter::new(format, use_color, cli.quiet);

    tracing::info!(
        command = ?cli.command,
        verbosity = cli.verbosity_level(),
        "Executing command"
    );

    match cli.command {
        Commands::Apply(args) => handlers::handle_apply(args, config, &mut output),
        Commands::Get(args) => handlers::handle_get(args, &mut output),
        Commands::Check(args) => handlers::handle_check(args, config, &mut output),
        Commands::Functions => handlers::handle_functions(&mut output),
        Commands::Errors(args) => handlers::handle_errors(args, &mut output),
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// The `--output` flag, then `output.format` from the config
fn resolve_output_format(flag: Option<OutputFormat>, config: &Config) -> Result<OutputFormat> {
    match flag {
        Some(format) => Ok(format),
        None => OutputFormat::from_config(&config.output.format)
            .ok_or_else(|| Error::config(format!("invalid output format: {}", config.output.format))),
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: &Config) -> Result<()> {
    let verbosity = cli.verbosity_level();

    // Create logging configuration from CLI args, the config file and environment
    let mut logging_config = LoggingConfig::from_verbosity(verbosity);
    logging_config.merge_with_file(&config.logging, verbosity)?;
    logging_config.merge_with_env();

    // If quiet mode, only log errors
    if cli.quiet {
        logging_config.level = "error".to_string();
    }

    logging::init_logging(logging_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["docshape", "functions"]);
        assert_eq!(cli.verbosity_level(), 0);

        let cli = Cli::parse_from(["docshape", "-vv", "check", "rules.json"]);
        assert_eq!(cli.verbosity_level(), 2);

        let cli = Cli::parse_from(["docshape", "--quiet", "errors", "doc.json"]);
        assert_eq!(cli.verbosity_level(), 0);
        assert!(cli.quiet);
    }

    #[test]
    fn test_output_format_precedence() {
        let mut config = Config::default();
        assert_eq!(resolve_output_format(None, &config).unwrap(), OutputFormat::Human);

        config.output.format = "yaml".to_string();
        assert_eq!(resolve_output_format(None, &config).unwrap(), OutputFormat::Yaml);
        assert_eq!(
            resolve_output_format(Some(OutputFormat::Json), &config).unwrap(),
            OutputFormat::Json
        );

        config.output.format = "xml".to_string();
        assert_eq!(resolve_output_format(None, &config).unwrap_err().exit_code(), 5);
    }
}
