//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// kbforge CLI - Extract relation knowledge graphs from stored content.
#[derive(Debug, Parser)]
#[command(name = "kbforge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "KBFORGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Seed content items and collections from a JSON file
    Import(ImportArgs),

    /// Submit an extraction job
    Submit(SubmitArgs),

    /// Show a job record
    Status(JobArgs),

    /// Show the most recently created job
    Latest,

    /// Print the relation graph of a ready job
    Show(JobArgs),

    /// Re-create a failed job as a new pending job
    Retry(JobArgs),

    /// Execute a pending job in the foreground
    Run(RunArgs),

    /// Run the worker pool until Ctrl+C
    Work,
}

/// Arguments for the import command.
#[derive(Debug, Parser)]
pub struct ImportArgs {
    /// JSON file with `items` and `collections` arrays
    pub file: PathBuf,
}

/// Arguments for the submit command.
#[derive(Debug, Parser)]
pub struct SubmitArgs {
    /// Item id to extract from (repeatable)
    #[arg(short, long = "item", value_name = "ID")]
    pub items: Vec<i64>,

    /// Collection id to extract from (repeatable)
    #[arg(long = "collection", value_name = "ID")]
    pub collections: Vec<i64>,

    /// Job name
    #[arg(short, long, default_value = "extraction")]
    pub name: String,

    /// Make the result public
    #[arg(long)]
    pub public: bool,

    /// Run the worker pool in-process until the job finishes
    #[arg(short, long)]
    pub wait: bool,
}

/// Arguments for commands addressing one job.
#[derive(Debug, Parser)]
pub struct JobArgs {
    /// Job id
    pub job_id: String,
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Job id
    pub job_id: String,

    /// Deadline in seconds (defaults to the worker job timeout)
    #[arg(short, long)]
    pub timeout: Option<u64>,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_command() {
        let cli = Cli::parse_from([
            "kbforge",
            "submit",
            "--item",
            "1",
            "-i",
            "2",
            "--collection",
            "10",
            "--public",
        ]);
        match cli.command {
            Command::Submit(args) => {
                assert_eq!(args.items, vec![1, 2]);
                assert_eq!(args.collections, vec![10]);
                assert_eq!(args.name, "extraction");
                assert!(args.public);
                assert!(!args.wait);
            }
            _ => panic!("Expected Submit command"),
        }
    }

    #[test]
    fn test_global_flags_after_command() {
        let cli = Cli::parse_from(["kbforge", "latest", "--format", "json", "--no-color", "-v"]);
        assert!(matches!(cli.command, Command::Latest));
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        assert!(cli.no_color);
        assert!(cli.verbose);
    }

    #[test]
    fn test_run_command() {
        let cli = Cli::parse_from(["kbforge", "run", "abc", "--timeout", "30"]);
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.job_id, "abc");
                assert_eq!(args.timeout, Some(30));
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_missing_command_rejected() {
        assert!(Cli::try_parse_from(["kbforge"]).is_err());
    }
}
