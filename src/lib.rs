//! # MicroServer Gen8 Exporter
//!
//! A Prometheus metrics exporter for the thermal telemetry of an HP ProLiant
//! MicroServer Gen8, read from its iLO Redfish API.
//!
//! ## Overview
//!
//! The exporter opens one Redfish session at startup, fetches
//! `/redfish/v1/Chassis/1/Thermal/` on every scrape and exposes:
//!
//! - `microserver_gen8_fan_usage{name, health, state}` - fan speed in percent
//! - `microserver_gen8_sensor_state{name, health}` - 1 when the sensor is `Enabled`
//! - `microserver_gen8_temperature_celsius{name}` - current temperature
//! - `microserver_gen8_temperature_upper_critical_celsius{name}` - critical threshold
//! - `microserver_gen8_temperature_upper_fatal_celsius{name}` - fatal threshold
//! - `microserver_gen8_up`, `microserver_gen8_scrape_duration_seconds` and
//!   `microserver_gen8_scrape_errors_total{kind}` - exporter health
//!
//! The session is deleted when the exporter shuts down.
//!
//! ## Quick Start
//!
//! ```no_run
//! use microserver_gen8_exporter::{
//!     client::RedfishClient,
//!     config::Settings,
//!     server::{run, shutdown_signal},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::load(Some("config.yaml"))?;
//!
//!     let client = RedfishClient::new(settings.redfish)?;
//!     run(client, &settings.exporter.listen_address, shutdown_signal()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! The exporter can be configured via:
//! - A configuration file (`config.yaml` by default)
//! - Environment variables (with `MICROSERVER_EXPORTER_` prefix)
//! - Command-line arguments
//!
//! See [`config::Settings`] for details.
//!
//! ## Modules
//!
//! - [`client`] - Redfish session management and thermal requests
//! - [`collector`] - Per-scrape fetch and projection
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling
//! - [`metrics`] - Thermal series definitions and projection
//! - [`registry`] - Prometheus registry and text encoding
//! - [`server`] - HTTP server for exposing metrics
//! - [`thermal`] - Thermal response decoding

pub mod client;
pub mod collector;
pub mod config;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod server;
pub mod thermal;

pub use error::{ExporterError, Result};
