//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// notify-dispatch - Queue-backed notification dispatcher
#[derive(Parser, Debug)]
#[command(
    name = "notify-dispatch",
    author,
    version,
    about = "Queue-backed notification dispatcher",
    long_about = "Deduplicates outbound messages, sends HIGH priority ones immediately and \n\
                  batches the rest per destination before handing them to the configured \n\
                  transport. Also translates list requests into query documents."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "NOTIFY_DISPATCH_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "NOTIFY_DISPATCH_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit messages through the dispatcher
    Send(SendArgs),

    /// Validate configuration file without sending
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),

    /// Translate a list request into a query document
    Query(QueryArgs),
}

/// Arguments for the `send` command
#[derive(Parser, Debug, Clone)]
pub struct SendArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "dispatch.toml",
        env = "NOTIFY_DISPATCH_CONFIG"
    )]
    pub config: PathBuf,

    /// Destination name (single message mode)
    #[arg(short, long, requires = "kind", conflicts_with = "input")]
    pub destination: Option<String>,

    /// Message kind, e.g. OTP_EMAIL (single message mode)
    #[arg(short, long, requires = "destination")]
    pub kind: Option<String>,

    /// JSON payload (single message mode)
    #[arg(long, default_value = "{}")]
    pub payload: String,

    /// Priority: HIGH, MEDIUM or LOW
    #[arg(short, long)]
    pub priority: Option<String>,

    /// JSON-lines file of messages: {"destination", "kind", "payload", "priority"?}
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Use an in-memory transport instead of the configured one
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "NOTIFY_DISPATCH_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "dispatch.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "dispatch.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show destination endpoints and their environment variables
    #[arg(long)]
    pub destinations: bool,
}

/// Arguments for the `query` command
#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// List request as inline JSON
    #[arg(short, long, conflicts_with = "file")]
    pub request: Option<String>,

    /// File containing the list request JSON
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Pretty-print the query document
    #[arg(long)]
    pub pretty: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_send_single() {
        let cli = Cli::try_parse_from([
            "notify-dispatch",
            "send",
            "-d",
            "emailNotifications",
            "-k",
            "OTP_EMAIL",
            "--payload",
            "{\"a\":1}",
            "-p",
            "HIGH",
        ])
        .unwrap();

        match cli.command {
            Commands::Send(args) => {
                assert_eq!(args.destination.as_deref(), Some("emailNotifications"));
                assert_eq!(args.priority.as_deref(), Some("HIGH"));
                assert!(!args.dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_send_destination_requires_kind() {
        let result = Cli::try_parse_from(["notify-dispatch", "send", "-d", "emailNotifications"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_query_request_and_file_conflict() {
        let result = Cli::try_parse_from([
            "notify-dispatch",
            "query",
            "--request",
            "{}",
            "--file",
            "req.json",
        ]);
        assert!(result.is_err());
    }
}
