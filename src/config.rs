//! Configuration management for the MicroServer exporter.
//!
//! Supports loading configuration from:
//! - A configuration file (`config.yaml` by default, format inferred from the extension)
//! - Environment variables (with `MICROSERVER_EXPORTER_` prefix)
//! - Command-line arguments (path to the configuration file)

use crate::error::{ExporterError, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default path of the Redfish session collection.
pub const DEFAULT_SESSION_PATH: &str = "/redfish/v1/SessionService/Sessions";

/// Default path of the chassis thermal resource.
pub const DEFAULT_THERMAL_PATH: &str = "/redfish/v1/Chassis/1/Thermal/";

/// Redfish (iLO) connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct RedfishConfig {
    /// Base URL of the management controller (e.g., "https://ilo.example.com")
    pub url: String,

    /// Login used to open the Redfish session
    #[serde(default)]
    pub login: String,

    /// Password used to open the Redfish session
    #[serde(default, alias = "passwd")]
    pub password: String,

    /// Accept invalid TLS certificates (iLO ships a self-signed one)
    #[serde(default)]
    pub insecure: bool,

    /// Optional request timeout in seconds; requests never time out when unset
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// Session collection path, relative to `url`
    #[serde(default = "default_session_path")]
    pub session_path: String,

    /// Thermal resource path, relative to `url`
    #[serde(default = "default_thermal_path")]
    pub thermal_path: String,
}

impl std::fmt::Debug for RedfishConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedfishConfig")
            .field("url", &self.url)
            .field("login", &self.login)
            .field("password", &"***REDACTED***")
            .field("insecure", &self.insecure)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("session_path", &self.session_path)
            .field("thermal_path", &self.thermal_path)
            .finish()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Exporter specific settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExporterConfig {
    /// Address to listen on for metrics endpoint
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log format (text, json)
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

/// Main configuration structure for the exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Redfish connection configuration
    pub redfish: RedfishConfig,

    /// Exporter server configuration
    #[serde(default)]
    pub exporter: ExporterConfig,
}

fn default_session_path() -> String {
    DEFAULT_SESSION_PATH.to_string()
}

fn default_thermal_path() -> String {
    DEFAULT_THERMAL_PATH.to_string()
}

fn default_listen_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Load configuration from a file and environment variables.
    ///
    /// A missing file is not an error; the environment alone may supply
    /// every required setting.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use microserver_gen8_exporter::config::Settings;
    ///
    /// let settings = Settings::load(Some("config.yaml")).unwrap();
    /// ```
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(config::File::with_name(path));
            }
        }

        // e.g. MICROSERVER_EXPORTER_REDFISH__URL
        builder = builder.add_source(
            config::Environment::with_prefix("MICROSERVER_EXPORTER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let settings: Settings = config.try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration settings.
    pub fn validate(&self) -> Result<()> {
        if self.redfish.url.is_empty() {
            return Err(config_error("Redfish url cannot be empty"));
        }

        if let Err(e) = Url::parse(&self.redfish.url) {
            return Err(config_error(&format!(
                "Redfish url '{}' is invalid: {}",
                self.redfish.url, e
            )));
        }

        if self.redfish.login.is_empty() || self.redfish.password.is_empty() {
            return Err(config_error("Redfish login and password are required"));
        }

        Ok(())
    }
}

fn config_error(message: &str) -> ExporterError {
    ExporterError::Config(config::ConfigError::Message(message.to_string()))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            redfish: RedfishConfig {
                url: "https://localhost".to_string(),
                login: String::new(),
                password: String::new(),
                insecure: false,
                timeout_seconds: None,
                session_path: default_session_path(),
                thermal_path: default_thermal_path(),
            },
            exporter: ExporterConfig::default(),
        }
    }
}
