//! `send` command implementation.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

use contracts::{DispatchConfig, Priority, Transport};
use dispatcher::{create_transport, AnyTransport, DispatcherBuilder, MemoryTransport, SubmitOutcome};

use crate::cli::SendArgs;
use crate::error::CliError;

/// One line of a JSON-lines input file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageSpec {
    pub destination: String,
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub priority: Option<Priority>,
}

/// Counts of submit outcomes
#[derive(Debug, Default)]
struct SendReport {
    delivered: usize,
    enqueued: usize,
    flushed_batches: usize,
    duplicates: usize,
    failed: usize,
}

impl SendReport {
    fn record(&mut self, outcome: &SubmitOutcome) {
        match outcome {
            SubmitOutcome::Delivered { .. } => self.delivered += 1,
            SubmitOutcome::Enqueued { .. } => self.enqueued += 1,
            SubmitOutcome::Flushed { .. } => self.flushed_batches += 1,
            SubmitOutcome::DuplicateSuppressed { .. } => self.duplicates += 1,
        }
    }
}

/// Execute the `send` command
pub async fn run_send(args: &SendArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let messages = collect_messages(args)?;
    if messages.is_empty() {
        warn!("Nothing to send");
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let transport = if args.dry_run {
        info!("Dry run mode - using in-memory transport");
        AnyTransport::Memory(MemoryTransport::new("dry-run"))
    } else {
        create_transport(&config.transport).map_err(CliError::from)?
    };

    dispatch(config, transport, messages).await
}

async fn dispatch(
    config: DispatchConfig,
    transport: AnyTransport,
    messages: Vec<MessageSpec>,
) -> Result<()> {
    info!(
        transport = %transport.name(),
        messages = messages.len(),
        "Starting dispatch"
    );

    let dispatcher = DispatcherBuilder::new(config, transport)
        .build()
        .map_err(CliError::from)?;

    let mut report = SendReport::default();
    for entry in messages {
        match dispatcher
            .submit(&entry.destination, &entry.kind, entry.payload, entry.priority)
            .await
        {
            Ok(outcome) => {
                println!("{:<22} {} -> {:?}", entry.destination, entry.kind, outcome);
                report.record(&outcome);
            }
            Err(e) => {
                println!("{:<22} {} -> error: {}", entry.destination, entry.kind, e);
                report.failed += 1;
            }
        }
    }

    let failures = dispatcher.shutdown().await;
    for failure in &failures {
        println!(
            "flush to {} failed, {} message(s) lost: {}",
            failure.destination,
            failure.messages.len(),
            failure.error
        );
    }

    let metrics = dispatcher.metrics();
    println!("\n=== Dispatch Report ===");
    println!("Delivered immediately: {}", report.delivered);
    println!("Buffered: {}", report.enqueued);
    println!("Flushed on batch size: {}", report.flushed_batches);
    println!("Duplicates suppressed: {}", report.duplicates);
    println!("Rejected: {}", report.failed);
    println!("Batches sent: {}", metrics.batches_sent);
    println!("Messages lost: {}", metrics.messages_lost);
    println!("\n{}", dispatcher.delivery_summary());

    if report.failed > 0 || !failures.is_empty() {
        anyhow::bail!(
            "{} submission(s) rejected, {} flush(es) failed",
            report.failed,
            failures.len()
        );
    }
    Ok(())
}

/// Messages from `--input` or the single-message flags
fn collect_messages(args: &SendArgs) -> Result<Vec<MessageSpec>, CliError> {
    if let Some(path) = &args.input {
        return read_message_file(path);
    }

    let (Some(destination), Some(kind)) = (&args.destination, &args.kind) else {
        return Err(CliError::invalid_input(
            "either --input or --destination with --kind is required",
        ));
    };

    let payload: Value = serde_json::from_str(&args.payload)
        .map_err(|e| CliError::invalid_input(format!("--payload is not valid JSON: {e}")))?;

    let priority = args
        .priority
        .as_deref()
        .map(str::parse::<Priority>)
        .transpose()
        .map_err(|e| CliError::invalid_input(e.to_string()))?;

    Ok(vec![MessageSpec {
        destination: destination.clone(),
        kind: kind.clone(),
        payload,
        priority,
    }])
}

/// Parse a JSON-lines message file; blank lines are skipped
pub fn read_message_file(path: &Path) -> Result<Vec<MessageSpec>, CliError> {
    let content = std::fs::read_to_string(path)?;
    parse_message_lines(&content)
}

fn parse_message_lines(content: &str) -> Result<Vec<MessageSpec>, CliError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line)
                .map_err(|e| CliError::invalid_input(format!("line {}: {}", index + 1, e)))
        })
        .collect()
}
