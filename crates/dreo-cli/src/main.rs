//! `dreo`: run the Dreo integration from the command line
//!
//! Loads a YAML config, sets up one config entry against the device
//! manager, then lists devices, dumps entity states or calls a service.

mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dreo_client::{DebugTestModeFactory, DebugTestModePayload, DeviceManager};
use dreo_config_entries::{ConfigEntries, ConfigEntriesError};
use dreo_core::ServiceCall;
use dreo_integration::{register, HomeAssistant, ServiceError};
use serde_json::{json, Value};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, DreoConfig};

#[derive(Debug, Parser)]
#[command(name = "dreo", version, about = "Control Dreo devices through the Home Assistant integration")]
struct Cli {
    /// Path to the YAML config file
    #[arg(short, long, env = "DREO_CONFIG", default_value = "dreo.yaml")]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the devices on the account
    Devices,
    /// Print every entity state as JSON
    States,
    /// Call an entity service, e.g. `call light turn_on --data '{"entity_id": "light.office_fan_light"}'`
    Call {
        domain: String,
        service: String,
        /// Service data as a JSON object
        #[arg(long, default_value = "{}")]
        data: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

fn exit_code(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<ConfigError>().is_some() {
        2
    } else if err.downcast_ref::<ConfigEntriesError>().is_some() {
        3
    } else if err.downcast_ref::<ServiceError>().is_some() {
        4
    } else {
        1
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = DreoConfig::load(&cli.config)?;

    let Some(dir) = &config.debug_test_mode_dir else {
        bail!("no cloud transport is available; set debug_test_mode_dir to use a local device payload");
    };
    let payload = DebugTestModePayload::load(dir)
        .with_context(|| format!("loading debug test mode payload from {}", dir.display()))?;
    let factory = Arc::new(DebugTestModeFactory::new(payload));

    let hass = Arc::new(HomeAssistant::new());
    let entries = Arc::new(ConfigEntries::new());
    register(&entries, hass.clone(), factory.clone());

    let entry = entries.add(config.to_entry())?;
    entries.setup(&entry.entry_id).await?;
    info!(entry_id = %entry.entry_id, "Dreo entry loaded");

    let result = match cli.command {
        Command::Devices => {
            let devices = factory
                .last_manager()
                .map(|m| m.devices())
                .unwrap_or_default();
            let listing: Vec<Value> = devices
                .iter()
                .map(|d| {
                    json!({
                        "serial_number": d.serial_number(),
                        "name": d.name(),
                        "model": d.model(),
                        "type": d.device_type().as_str(),
                        "connected": d.is_connected(),
                    })
                })
                .collect();
            print_json(&listing)
        }
        Command::States => print_json(&hass.entities.states()),
        Command::Call {
            domain,
            service,
            data,
        } => {
            let data: Value = serde_json::from_str(&data).context("--data is not valid JSON")?;
            debug!(%domain, %service, %data, "Calling service");
            let states = hass
                .call_service(ServiceCall::new(domain, service, data))
                .await?;
            print_json(&states)
        }
    };

    entries.unload(&entry.entry_id).await?;
    result
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
