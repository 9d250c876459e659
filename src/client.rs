//! Redfish API client for the MicroServer Gen8 iLO.
//!
//! This module owns the session lifecycle (create once, delete on shutdown)
//! and the thermal telemetry request issued on every scrape.

use crate::config::RedfishConfig;
use crate::error::{ExporterError, Result};
use crate::thermal::Thermal;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Header carrying the session token, both in the login response and on
/// every authenticated request.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Header carrying the session resource in the login response.
pub const LOCATION_HEADER: &str = "Location";

/// An authenticated Redfish session.
///
/// Created once at startup and shared read-only by every scrape.
#[derive(Clone)]
pub struct Session {
    token: String,
    location: Url,
}

impl Session {
    /// Session token sent as `X-Auth-Token`.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Absolute URL of the session resource, used to close the session.
    pub fn location(&self) -> &Url {
        &self.location
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"***REDACTED***")
            .field("location", &self.location.as_str())
            .finish()
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    #[serde(rename = "UserName")]
    user_name: &'a str,
    #[serde(rename = "Password")]
    password: &'a str,
}

/// Redfish API client.
#[derive(Clone)]
pub struct RedfishClient {
    client: Client,
    config: RedfishConfig,
    base_url: Url,
}

impl RedfishClient {
    /// Create a new Redfish API client.
    ///
    /// No request is sent; call [`RedfishClient::authenticate`] to open a session.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use microserver_gen8_exporter::client::RedfishClient;
    /// use microserver_gen8_exporter::config::Settings;
    ///
    /// let mut settings = Settings::default();
    /// settings.redfish.url = "https://ilo.example.com".to_string();
    /// settings.redfish.login = "admin".to_string();
    /// settings.redfish.password = "secret".to_string();
    /// settings.redfish.insecure = true;
    /// let client = RedfishClient::new(settings.redfish).unwrap();
    /// ```
    pub fn new(config: RedfishConfig) -> Result<Self> {
        let base_url = Url::parse(&config.url).map_err(|e| {
            ExporterError::Config(config::ConfigError::Message(format!(
                "Redfish url '{}' is invalid: {}",
                config.url, e
            )))
        })?;

        let mut builder = Client::builder().danger_accept_invalid_certs(config.insecure);
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.url.trim_end_matches('/'), path)
    }

    /// Open a Redfish session.
    ///
    /// Succeeds only on `201 Created` carrying both the `X-Auth-Token` and
    /// `Location` headers. A relative `Location` is resolved against the base URL.
    pub async fn authenticate(&self) -> Result<Session> {
        let url = self.endpoint(&self.config.session_path);
        debug!("Creating Redfish session at: {}", url);

        let credentials = Credentials {
            user_name: &self.config.login,
            password: &self.config.password,
        };

        let response = self.client.post(&url).json(&credentials).send().await?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = response.text().await?;
            warn!("Failed to create session: {}", status);
            return Err(ExporterError::Auth { status, body });
        }

        let headers = response.headers();
        let token = header_value(headers, AUTH_TOKEN_HEADER)?.to_string();
        let raw_location = header_value(headers, LOCATION_HEADER)?;
        let location = self.base_url.join(raw_location).map_err(|e| {
            ExporterError::Protocol(format!(
                "Invalid session location '{}': {}",
                raw_location, e
            ))
        })?;

        info!("Redfish session opened: {}", location);
        Ok(Session { token, location })
    }

    /// Delete the session. Anything but `200 OK` is an error.
    pub async fn close_session(&self, session: &Session) -> Result<()> {
        debug!("Closing Redfish session: {}", session.location());

        let response = self
            .client
            .delete(session.location().clone())
            .header(CONTENT_TYPE, "application/json")
            .header(AUTH_TOKEN_HEADER, session.token())
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            warn!("Failed to close session: {}", response.status());
            return Err(ExporterError::UnexpectedStatus {
                operation: "session teardown",
                status: response.status(),
            });
        }

        info!("Redfish session closed");
        Ok(())
    }

    /// Fetch fan and temperature readings.
    pub async fn get_thermal(&self, session: &Session) -> Result<Thermal> {
        let url = self.endpoint(&self.config.thermal_path);
        debug!("Fetching thermal telemetry from: {}", url);

        let response = self
            .client
            .get(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTH_TOKEN_HEADER, session.token())
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            warn!("Failed to get thermal telemetry: {}", response.status());
            return Err(ExporterError::UnexpectedStatus {
                operation: "thermal telemetry",
                status: response.status(),
            });
        }

        let body = response.bytes().await?;
        debug!("Raw thermal response: {} bytes", body.len());

        Thermal::decode(&body)
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or(ExporterError::MissingHeader(name))
}
