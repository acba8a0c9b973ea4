// MIT License - Copyright (c) 2026 Peter Wright
// Lares4 WebSocket client
//
//! # lares4
//!
//! Client for the WebSocket control protocol of Ksenia Lares4 security and
//! home automation panels.
//!
//! The client logs in with a user PIN, loads a snapshot of the panel's
//! outputs, sensors, system status, thermostats and scenarios, then keeps
//! that snapshot current from the panel's push updates. Changes to outputs,
//! sensors and temperatures are published on broadcast channels, each
//! carrying the entity's fixed position and its new contents.
//!
//! ## Quick Start
//!
//! ```no_run
//! use lares4::{ClientConfig, Lares4Client};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ClientConfig::builder()
//!         .host("192.168.1.100")
//!         .sender("monitor")
//!         .pin("123456")
//!         .build();
//!
//!     let mut client = Lares4Client::connect(config).await?;
//!
//!     let mut sensors = client.subscribe_sensors();
//!     tokio::spawn(async move {
//!         while let Ok(change) = sensors.recv().await {
//!             println!("Sensor #{}: {}", change.position, change.status);
//!         }
//!     });
//!
//!     tokio::signal::ctrl_c().await?;
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod command;
pub mod config;
pub mod constants;
pub mod correlator;
pub mod crc;
pub mod error;
pub mod event;
pub mod gate;
pub mod logger;
pub mod protocol;
pub mod session;
pub mod state;
pub mod transport;

// Re-exports for convenience
pub use cache::{Indexed, PanelState, ThermostatView};
pub use client::Lares4Client;
pub use command::{Command, CommandBuilder, OutputValue, Season, ThermostatMode};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Lares4Error, Result};
pub use event::{ChangeReceiver, StatusChange};
pub use gate::ActionGate;
pub use logger::{Logger, TracingLogger};
pub use protocol::{
    OutputConfig, OutputStatus, Scenario, SensorStatus, SystemStatus, TemperatureStatus,
    ThermostatConfig,
};
pub use state::ConnectionState;
