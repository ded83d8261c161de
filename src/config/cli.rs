//! Command-line argument parsing
//!
//! Arguments are grouped by category for clarity.

use clap::Parser;

pub use crate::metrics::OutputFormat;
use crate::metrics::DEFAULT_CANARY_KEY;

/// Highest database index accepted by --db
pub const MAX_DB_INDEX: u32 = 15;

/// Collect Redis INFO and CONFIG GET statistics as monitoring items
#[derive(Parser, Debug, Clone)]
#[command(name = "redis-stats-probe")]
#[command(version, about, long_about = None)]
#[command(disable_help_flag = true)]
pub struct CliArgs {
    /// Print help information
    #[arg(long = "help", action = clap::ArgAction::Help)]
    help: Option<bool>,

    // ===== Connection Options =====
    /// Server hostname
    #[arg(short = 'h', long = "host", default_value = "127.0.0.1")]
    pub host: String,

    /// Server port
    #[arg(short = 'p', long = "port", default_value_t = 6379)]
    pub port: u16,

    /// Password for AUTH command (empty means no AUTH)
    #[arg(short = 'a', long = "auth")]
    pub password: Option<String>,

    /// Database number to SELECT (0 skips SELECT)
    #[arg(short = 'n', long = "db", default_value_t = 0)]
    pub db: u32,

    /// Connect and per-read timeout in seconds
    #[arg(long = "timeout", default_value_t = 10)]
    pub timeout_secs: u64,

    // ===== Item Options =====
    /// Host label stamped on every item (defaults to --host)
    #[arg(long = "hostname")]
    pub hostname: Option<String>,

    /// Measure SET/GET latency against this canary key
    #[arg(
        long = "response-check-key",
        num_args = 0..=1,
        default_missing_value = DEFAULT_CANARY_KEY
    )]
    pub response_check_key: Option<String>,

    /// Only emit the database discovery item
    #[arg(long = "discovery")]
    pub discovery: bool,

    /// Maximum number of items buffered per cycle
    #[arg(long = "queue-size", default_value_t = 4096)]
    pub queue_size: usize,

    // ===== Output Options =====
    /// Output format
    #[arg(long = "output-format", value_enum, default_value_t = OutputFormat::Json)]
    pub output_format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl CliArgs {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("--host must not be empty".to_string());
        }

        if self.db > MAX_DB_INDEX {
            return Err(format!("--db must be between 0 and {}", MAX_DB_INDEX));
        }

        if self.timeout_secs == 0 {
            return Err("--timeout must be at least 1 second".to_string());
        }

        if self.queue_size == 0 {
            return Err("--queue-size must be at least 1".to_string());
        }

        if let Some(ref key) = self.response_check_key {
            if key.is_empty() {
                return Err("--response-check-key must not be empty".to_string());
            }
        }

        if self.quiet && self.verbose {
            return Err("--quiet and --verbose are mutually exclusive".to_string());
        }

        Ok(())
    }
}
