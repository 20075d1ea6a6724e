//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Broadcast - send one message to many destinations
#[derive(Parser, Debug)]
#[command(
    name = "broadcast",
    author,
    version,
    about = "Send a message to every configured broadcaster",
    long_about = "Fan a single message (title, body, images) out to every broadcaster \n\
                  named by a connection string such as null://, log:// or \n\
                  file:///var/spool/broadcast?format=jpeg. The first failure \n\
                  cancels the rest."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "BROADCAST_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "BROADCAST_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Serve Prometheus metrics on this port while the command runs
    #[arg(long, global = true, env = "BROADCAST_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Broadcast one message
    Send(SendArgs),

    /// List registered broadcaster schemes
    Schemes(SchemesArgs),

    /// Validate a configuration file and build its broadcasters without sending
    Validate(ValidateArgs),
}

/// Arguments for the `send` command
#[derive(Parser, Debug, Clone)]
pub struct SendArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, env = "BROADCAST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Broadcaster connection string (repeatable, appended after the config list)
    #[arg(short, long = "broadcaster", value_name = "URI")]
    pub broadcasters: Vec<String>,

    /// Message title
    #[arg(long, default_value = "")]
    pub title: String,

    /// Message body
    #[arg(long, default_value = "")]
    pub body: String,

    /// Image file to attach (repeatable)
    #[arg(short, long = "image", value_name = "PATH")]
    pub images: Vec<PathBuf>,

    /// Run broadcasters one at a time instead of concurrently
    #[arg(long)]
    pub sequential: bool,

    /// Cancel the broadcast after this many seconds (0 = no timeout)
    #[arg(long, env = "BROADCAST_TIMEOUT")]
    pub timeout: Option<u64>,
}

/// Arguments for the `schemes` command
#[derive(Parser, Debug)]
pub struct SchemesArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "broadcast.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
