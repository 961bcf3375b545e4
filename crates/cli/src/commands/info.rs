//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::DispatchConfig;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    transport: TransportInfo,
    dispatcher: DispatcherInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    destinations: Vec<DestinationInfo>,
}

#[derive(Serialize)]
struct TransportInfo {
    kind: String,
    #[serde(skip_serializing_if = "std::collections::HashMap::is_empty")]
    params: std::collections::HashMap<String, String>,
}

#[derive(Serialize)]
struct DispatcherInfo {
    batch_size: usize,
    batch_delay_ms: u64,
    dedup_capacity: usize,
    failure_channel_capacity: usize,
}

#[derive(Serialize)]
struct DestinationInfo {
    name: String,
    endpoint: Option<String>,
    env_var: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&config, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config, args);
    }

    Ok(())
}

fn build_config_info(config: &DispatchConfig, args: &InfoArgs) -> ConfigInfo {
    let destinations = if args.destinations {
        config
            .destinations
            .iter()
            .map(|(name, endpoint)| DestinationInfo {
                name: name.clone(),
                endpoint: Some(endpoint.trim().to_string()).filter(|e| !e.is_empty()),
                env_var: config_loader::endpoint_env_var(name),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", config.version),
        transport: TransportInfo {
            kind: format!("{:?}", config.transport.kind),
            params: config.transport.params.clone(),
        },
        dispatcher: DispatcherInfo {
            batch_size: config.dispatcher.batch_size,
            batch_delay_ms: config.dispatcher.batch_delay_ms,
            dedup_capacity: config.dispatcher.dedup_capacity,
            failure_channel_capacity: config.dispatcher.failure_channel_capacity,
        },
        destinations,
    }
}

fn print_config_info(config: &DispatchConfig, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               notify-dispatch Configuration                  ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📦 Dispatcher");
    println!("   ├─ Version: {:?}", config.version);
    println!("   ├─ Batch size: {}", config.dispatcher.batch_size);
    println!("   ├─ Batch delay: {} ms", config.dispatcher.batch_delay_ms);
    println!("   ├─ Dedup capacity: {}", config.dispatcher.dedup_capacity);
    println!(
        "   └─ Failure channel capacity: {}",
        config.dispatcher.failure_channel_capacity
    );

    println!("\n🚚 Transport: {:?}", config.transport.kind);
    let mut params: Vec<_> = config.transport.params.iter().collect();
    params.sort();
    for (i, (key, value)) in params.iter().enumerate() {
        let prefix = if i == params.len() - 1 { "└─" } else { "├─" };
        println!("   {} {} = {}", prefix, key, value);
    }

    let configured = config.configured_destinations().len();
    println!(
        "\n📤 Destinations ({}, {} configured)",
        config.destinations.len(),
        configured
    );
    if args.destinations {
        for (i, (name, endpoint)) in config.destinations.iter().enumerate() {
            let is_last = i == config.destinations.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            let endpoint = endpoint.trim();
            if endpoint.is_empty() {
                println!(
                    "   {} {} (not configured, set {})",
                    prefix,
                    name,
                    config_loader::endpoint_env_var(name)
                );
            } else {
                println!("   {} {} -> {}", prefix, name, endpoint);
            }
        }
    }

    println!();
}
