//! Command line argument parsing for the fuzzyrank CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// fuzzyrank - multi-term fuzzy ranking over JSON records
#[derive(Parser, Debug, Clone)]
#[command(name = "fuzzyrank")]
#[command(about = "Rank JSON records against a free-text query with fuzzy matching")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct FuzzyRankArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl FuzzyRankArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Search a records file
    Search(SearchArgs),

    /// List the searchable fields of a records file
    Fields(FieldsArgs),
}

/// Arguments for searching
#[derive(Parser, Debug, Clone, Default)]
pub struct SearchArgs {
    /// Records file: JSON array, JSONL, or an object of model name to array
    #[arg(value_name = "RECORDS_FILE")]
    pub records_file: PathBuf,

    /// Query string (percent-encoding is decoded)
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Match threshold between 0 and 1
    #[arg(short, long)]
    pub threshold: Option<String>,

    /// Maximum number of results to return
    #[arg(short, long)]
    pub limit: Option<String>,

    /// Per-field weights as a JSON object, e.g. '{"name": 2}'
    #[arg(short, long)]
    pub weights: Option<String>,

    /// Fields to search (comma-separated, default: all fields)
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Model name to tag records with
    #[arg(short, long)]
    pub model: Option<String>,

    /// Leave matched positions out of results
    #[arg(long)]
    pub no_matches: bool,

    /// Report every matching array element
    #[arg(long)]
    pub find_all_matches: bool,

    /// Enable extended search operators (=, ', ^, $, !)
    #[arg(long)]
    pub extended: bool,

    /// Merge per term even for single-term queries
    #[arg(long)]
    pub always_aggregate: bool,

    /// Field holding each record's identity
    #[arg(long, default_value = "id")]
    pub identity_field: String,

    /// Request JSON overlaid by the flags above
    #[arg(long, value_name = "JSON")]
    pub config: Option<String>,
}

/// Arguments for listing fields
#[derive(Parser, Debug, Clone)]
pub struct FieldsArgs {
    /// Records file: JSON array, JSONL, or an object of model name to array
    #[arg(value_name = "RECORDS_FILE")]
    pub records_file: PathBuf,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
