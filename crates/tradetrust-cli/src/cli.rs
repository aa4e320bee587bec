//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// TradeTrust - score trade-compliance results and recover failed certificates.
#[derive(Debug, Parser)]
#[command(name = "tradetrust")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Runtime configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, global = true, default_value = "json")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute provenance confidence for a storage record
    Provenance(ProvenanceArgs),

    /// Compute a trust score
    #[command(subcommand)]
    Score(ScoreCommand),

    /// Summarise a list of scored results
    Summary(InputArgs),

    /// Decide whether a trust score needs expert review
    Escalate(EscalateArgs),

    /// Look up and cross-check source reliability
    Sources(SourcesArgs),

    /// Score a complete workflow against recorded provenance lookups
    Workflow(InputArgs),

    /// Classify a certificate failure and run its recovery strategy
    Recover(RecoverArgs),

    /// Print the effective configuration
    Config,
}

#[derive(Debug, Subcommand)]
pub enum ScoreCommand {
    /// Score an HS classification
    Classification(InputArgs),

    /// Score a USMCA qualification
    Usmca(InputArgs),

    /// Score a tariff savings computation
    Savings(InputArgs),
}

/// A single input document; `-` reads stdin.
#[derive(Debug, Parser)]
pub struct InputArgs {
    /// Input file (YAML or JSON), or `-` for stdin
    pub input: PathBuf,
}

#[derive(Debug, Parser)]
pub struct ProvenanceArgs {
    /// Provenance record file (YAML or JSON), or `-` for stdin
    pub input: PathBuf,

    /// Evaluate as of this RFC 3339 time instead of now
    #[arg(long)]
    pub at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Parser)]
pub struct EscalateArgs {
    /// Trust score in [0, 1]
    pub score: f64,
}

#[derive(Debug, Parser)]
pub struct SourcesArgs {
    /// Source identifiers, e.g. CBP UN_COMTRADE
    pub sources: Vec<String>,
}

#[derive(Debug, Parser)]
pub struct RecoverArgs {
    /// Error message reported by certificate generation
    #[arg(short, long)]
    pub error: String,

    /// Certificate data file (YAML or JSON)
    #[arg(short, long)]
    pub data: Option<PathBuf>,
}
