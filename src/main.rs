// MIT License - Copyright (c) 2026 Peter Wright
// Lares4 monitor

use std::fmt::Display;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use lares4::{ChangeReceiver, ClientConfig, ConnectionState, Lares4Client};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "lares4-monitor")]
#[command(about = "Log the state of a Ksenia Lares4 panel and every change to it")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "lares4.toml")]
    config: String,

    /// Panel host, overriding the configuration file
    #[arg(long)]
    host: Option<String>,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Config {
    panel: PanelToml,
}

#[derive(Debug, Deserialize)]
struct PanelToml {
    host: String,
    #[serde(default = "default_sender")]
    sender: String,
    pin: String,
    #[serde(default = "default_accept_invalid_certs")]
    accept_invalid_certs: bool,
    /// Unset means wait forever
    #[serde(default)]
    login_timeout_secs: Option<u64>,
    #[serde(default)]
    bootstrap_timeout_secs: Option<u64>,
}

fn default_sender() -> String {
    "lares4-monitor".to_string()
}
fn default_accept_invalid_certs() -> bool {
    true
}

fn build_client_config(panel: &PanelToml, host_override: Option<&str>) -> ClientConfig {
    let mut builder = ClientConfig::builder()
        .host(host_override.unwrap_or(&panel.host))
        .sender(&panel.sender)
        .pin(&panel.pin)
        .accept_invalid_certs(panel.accept_invalid_certs);
    if let Some(secs) = panel.login_timeout_secs {
        builder = builder.login_timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = panel.bootstrap_timeout_secs {
        builder = builder.bootstrap_timeout(Duration::from_secs(secs));
    }
    builder.build()
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity (e.g. RUST_LOG=debug or RUST_LOG=lares4=debug).
    // Default: info.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // systemd journal already adds timestamps, so omit them when running under systemd
    if std::env::var_os("JOURNAL_STREAM").is_some() {
        tracing_subscriber::fmt().without_time().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let cli = Cli::parse();

    let config_text =
        std::fs::read_to_string(&cli.config).context("Failed to read config file")?;
    let config: Config = toml::from_str(&config_text).context("Failed to parse config file")?;
    let client_config = build_client_config(&config.panel, cli.host.as_deref());

    let mut sigterm = signal(SignalKind::terminate())?;

    let mut client = Lares4Client::connect(client_config)
        .await
        .context("Failed to initialize Lares4 client")?;

    print_inventory(&client).await;

    let output_handle = tokio::spawn(log_changes("output", client.subscribe_outputs()));
    let sensor_handle = tokio::spawn(log_changes("sensor", client.subscribe_sensors()));
    let temperature_handle =
        tokio::spawn(log_changes("temperature", client.subscribe_temperatures()));

    let mut connection = client.watch_connection();

    info!("Monitor running. Send SIGINT/SIGTERM to stop.");
    let lost = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT, shutting down...");
            false
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down...");
            false
        }
        _ = connection.wait_for(|state| *state == ConnectionState::Closed) => {
            warn!("Connection to panel closed");
            true
        }
    };

    output_handle.abort();
    sensor_handle.abort();
    temperature_handle.abort();

    if let Err(e) = client.close().await {
        warn!("Error closing client: {e}");
    }

    if lost {
        anyhow::bail!("Lost connection to panel");
    }
    info!("Shutdown complete");
    Ok(())
}

async fn print_inventory(client: &Lares4Client) {
    for light in client.lights().await {
        info!("Light #{}: {}", light.position, light.details.description);
    }
    for dimmer in client.dimmers().await {
        info!("Dimmer #{}: {}", dimmer.position, dimmer.details.description);
    }
    for shutter in client.shutters().await {
        info!("Shutter #{}: {}", shutter.position, shutter.details.description);
    }
    for scenario in client.user_scenarios().await {
        info!("Scenario #{}: {}", scenario.position, scenario.details.description);
    }
    for thermostat in client.thermostats().await {
        match &thermostat.configuration {
            Some(configuration) => info!(
                "Thermostat #{}: {} (mode {}, season {})",
                thermostat.sensor.position,
                thermostat.sensor.details,
                configuration.details.mode,
                configuration.details.season
            ),
            None => info!("Thermostat #{}: {}", thermostat.sensor.position, thermostat.sensor.details),
        }
    }
    for system in client.systems().await {
        info!("{system}");
    }
}

async fn log_changes<T: Clone + Display>(kind: &'static str, mut changes: ChangeReceiver<T>) {
    loop {
        match changes.recv().await {
            Ok(change) => info!("{kind} #{} changed: {}", change.position, change.status),
            Err(RecvError::Lagged(missed)) => warn!("Missed {missed} {kind} changes"),
            Err(RecvError::Closed) => break,
        }
    }
}
