//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API,
//! providing a type-safe and well-documented command interface.

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Docshape CLI - Rule-driven reshaping of nested records
///
/// Applies declarative rule sets (move, copy, derive, subpipeline, ...) to
/// JSON and YAML documents and inspects the results.
#[derive(Parser, Debug)]
#[command(
    name = "docshape",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "DOCSHAPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results [default: human, or `output.format` from the config]
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply a rule set to a document
    Apply(ApplyArgs),

    /// Print the values at one or more dotted paths
    Get(GetArgs),

    /// Parse and compile a rule set without applying it
    Check(CheckArgs),

    /// List the functions rule sets can refer to
    Functions,

    /// Collect every entry of every `errors` array in a document
    Errors(ErrorsArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the apply command
#[derive(Parser, Debug)]
pub struct ApplyArgs {
    /// Path to the rule set file (JSON, YAML or TOML)
    #[arg(value_name = "RULES")]
    pub rules: PathBuf,

    /// Path to the document (JSON or YAML); reads stdin when omitted or `-`
    #[arg(value_name = "DOCUMENT")]
    pub document: Option<PathBuf>,

    /// Also print what every step did
    #[arg(long)]
    pub report: bool,

    /// Write the resulting document to a file instead of stdout
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the get command
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Path to the document (JSON or YAML), `-` for stdin
    #[arg(value_name = "DOCUMENT")]
    pub document: PathBuf,

    /// Dotted paths, e.g. `meta.species`
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<String>,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Path to the rule set file (JSON, YAML or TOML)
    #[arg(value_name = "RULES")]
    pub rules: PathBuf,
}

/// Arguments for the errors command
#[derive(Parser, Debug)]
pub struct ErrorsArgs {
    /// Path to the document (JSON or YAML), `-` for stdin
    #[arg(value_name = "DOCUMENT")]
    pub document: PathBuf,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl OutputFormat {
    /// Parse the `output.format` config value
    pub fn from_config(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, true).ok()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        // Verify that the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_level() {
        let cli = Cli {
            verbose: 2,
            quiet: false,
            config: None,
            output: None,
            no_color: false,
            command: Commands::Functions,
        };
        assert_eq!(cli.verbosity_level(), 2);

        let quiet_cli = Cli { quiet: true, ..cli };
        assert_eq!(quiet_cli.verbosity_level(), 0);
    }

    #[test]
    fn test_apply_parsing() {
        let cli = Cli::parse_from(["docshape", "-vv", "apply", "rules.yaml", "doc.json", "--report"]);
        assert_eq!(cli.verbosity_level(), 2);
        match cli.command {
            Commands::Apply(args) => {
                assert_eq!(args.rules, PathBuf::from("rules.yaml"));
                assert_eq!(args.document, Some(PathBuf::from("doc.json")));
                assert!(args.report);
                assert!(args.save_to.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::parse_from(["docshape", "--output", "json-pretty", "apply", "rules.json"]);
        assert_eq!(cli.output, Some(OutputFormat::JsonPretty));
        assert!(matches!(cli.command, Commands::Apply(ApplyArgs { document: None, .. })));
    }

    #[test]
    fn test_get_requires_paths() {
        assert!(Cli::try_parse_from(["docshape", "get", "doc.json"]).is_err());

        let cli = Cli::parse_from(["docshape", "get", "doc.json", "a.b", "c"]);
        match cli.command {
            Commands::Get(args) => assert_eq!(args.paths, vec!["a.b", "c"]),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_output_format_from_config() {
        assert_eq!(OutputFormat::from_config("yaml"), Some(OutputFormat::Yaml));
        assert_eq!(OutputFormat::from_config("JSON-PRETTY"), Some(OutputFormat::JsonPretty));
        assert_eq!(OutputFormat::from_config("xml"), None);
    }
}
