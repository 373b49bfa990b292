//! CLI argument definitions
//!
//! All Clap derive structs for `mediaunlock` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::observability::LogFormat;

// ============================================================================
// Root CLI
// ============================================================================

/// Replay media unlock scenarios against the unlock coordinator.
#[derive(Parser, Debug)]
#[command(name = "mediaunlock", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "MEDIAUNLOCK_COLOR")]
    pub color: ColorChoice,

    /// Log output format.
    #[arg(long, default_value = "human", global = true, env = "MEDIAUNLOCK_LOG_FORMAT")]
    pub log_format: LogFormat,
}

// ============================================================================
// Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a scenario and report which targets unlocked.
    Run(RunArgs),

    /// Validate scenario files without running them.
    Validate(ValidateArgs),
}

/// Arguments for `run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the YAML scenario file.
    #[arg(short, long, env = "MEDIAUNLOCK_SCENARIO")]
    pub scenario: PathBuf,

    /// Write structured JSONL events to this file.
    #[arg(long, env = "MEDIAUNLOCK_EVENTS_FILE")]
    pub events_file: Option<PathBuf>,

    /// Serve Prometheus metrics on 127.0.0.1:<port>.
    #[arg(long, env = "MEDIAUNLOCK_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Fail if any target is still locked at the end of the run.
    #[arg(long)]
    pub require_all: bool,

    /// Report format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Scenario files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,
}

// ============================================================================
// Value Enums
// ============================================================================

/// Color output control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Detect from the terminal.
    #[default]
    Auto,
    /// Always emit ANSI colors.
    Always,
    /// Never emit ANSI colors.
    Never,
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Human,
    /// JSON.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_parses_flags() {
        let cli = Cli::try_parse_from([
            "mediaunlock",
            "-vv",
            "run",
            "--scenario",
            "s.yaml",
            "--require-all",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.scenario, PathBuf::from("s.yaml"));
                assert!(args.require_all);
                assert_eq!(args.format, OutputFormat::Json);
                assert!(args.events_file.is_none());
            }
            Commands::Validate(_) => panic!("expected run"),
        }
    }

    #[test]
    fn validate_requires_files() {
        assert!(Cli::try_parse_from(["mediaunlock", "validate"]).is_err());
    }

    #[test]
    fn global_log_format_after_subcommand() {
        let cli =
            Cli::try_parse_from(["mediaunlock", "validate", "a.yaml", "--log-format", "json"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
    }
}
