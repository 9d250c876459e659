//! Error types for the MicroServer exporter.
//!
//! This module defines custom error types using `thiserror` for structured
//! error handling throughout the application.

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for exporter operations.
#[derive(Debug, Error)]
pub enum ExporterError {
    /// Error talking to the Redfish API (connection, TLS, body read)
    #[error("Redfish transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Session creation was rejected
    #[error("Authentication failed with status {status}: {body}")]
    Auth { status: StatusCode, body: String },

    /// Redfish answered with an unexpected status code
    #[error("Unexpected status {status} from {operation}")]
    UnexpectedStatus {
        operation: &'static str,
        status: StatusCode,
    },

    /// A required response header was absent or unreadable
    #[error("Missing response header: {0}")]
    MissingHeader(&'static str),

    /// Any other violation of the expected Redfish exchange
    #[error("Redfish protocol error: {0}")]
    Protocol(String),

    /// Error decoding a Redfish response body
    #[error("Failed to decode Redfish response: {0}")]
    Decode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Metrics error
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// HTTP server error
    #[error("HTTP server error: {0}")]
    Server(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExporterError {
    /// Coarse failure class, used as the `kind` label on the scrape error counter.
    pub fn kind(&self) -> &'static str {
        match self {
            ExporterError::Http(_) => "transport",
            ExporterError::Auth { .. }
            | ExporterError::UnexpectedStatus { .. }
            | ExporterError::MissingHeader(_)
            | ExporterError::Protocol(_) => "protocol",
            ExporterError::Decode(_) => "decode",
            ExporterError::Config(_) => "config",
            ExporterError::Metrics(_) | ExporterError::Server(_) | ExporterError::Io(_) => {
                "internal"
            }
        }
    }
}

/// Result type alias for exporter operations.
pub type Result<T> = std::result::Result<T, ExporterError>;
