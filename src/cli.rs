//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::service::Environment;
use clap::Parser;
use std::ops::RangeInclusive;
use std::path::PathBuf;

/// Accepted values for `--max-units`.
pub const MAX_UNITS_RANGE: RangeInclusive<usize> = 100..=20_000;

/// HitDash - requester dashboard for Mechanical Turk
///
/// Lists your HITs, summarizes them by HIT type and status, and drills
/// into the completed assignments of one HIT type with decoded answers.
///
/// Examples:
///   hitdash
///   hitdash --env production --max-units 5000
///   hitdash --type-id 3ZKABCDEFXQ9 --export assignments.jsonl
///   hitdash --type-id 3ZKABCDEFXQ9 --from-listing --format json
///   hitdash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Requester environment
    ///
    /// Defaults to the config file setting, or sandbox.
    #[arg(short, long, value_name = "ENV", env = "HITDASH_ENV")]
    pub env: Option<Environment>,

    /// Maximum number of HITs to list for the summary (100 - 20000)
    #[arg(short, long, value_name = "COUNT")]
    pub max_units: Option<usize>,

    /// HIT type to drill into
    ///
    /// Retrieves the assignments of this type's reviewable HITs.
    #[arg(short, long, value_name = "HIT_TYPE_ID")]
    pub type_id: Option<String>,

    /// Drill into the listed HITs of the type instead of reviewable discovery
    #[arg(long, requires = "type_id")]
    pub from_listing: bool,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the retrieved assignments as JSON Lines to this file
    #[arg(long, value_name = "FILE", requires = "type_id")]
    pub export: Option<PathBuf>,

    /// Override the requester API endpoint URL
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .hitdash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .hitdash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(max_units) = self.max_units {
            if !MAX_UNITS_RANGE.contains(&max_units) {
                return Err(format!(
                    "Max units must be between {} and {}",
                    MAX_UNITS_RANGE.start(),
                    MAX_UNITS_RANGE.end()
                ));
            }
        }

        if let Some(ref type_id) = self.type_id {
            if type_id.trim().is_empty() {
                return Err("HIT type id must not be empty".to_string());
            }
        }

        if let Some(ref endpoint) = self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err("Endpoint URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
