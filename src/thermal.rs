//! Thermal telemetry records decoded from the Redfish `Thermal` resource.
//!
//! The iLO answers with a single JSON document carrying a `Fans` array and a
//! `Temperatures` array (also accepted as `temperatures`). Both views are
//! decoded from the same body; fields the exporter does not know about are
//! ignored.

use crate::error::{ExporterError, Result};
use serde::Deserialize;

/// One fan as reported by the management controller.
#[derive(Debug, Clone, PartialEq)]
pub struct FanReading {
    pub name: String,
    /// Fan speed, in percent on the Gen8 iLO
    pub current_reading: i64,
    pub health: Option<String>,
    pub state: String,
}

/// One temperature sensor as reported by the management controller.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureReading {
    pub name: String,
    /// Temperature in degrees Celsius
    pub current_reading: f64,
    pub health: Option<String>,
    pub state: String,
    pub upper_threshold_critical: f64,
    pub upper_threshold_fatal: f64,
}

/// Both views of one thermal response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Thermal {
    pub fans: Vec<FanReading>,
    pub temperatures: Vec<TemperatureReading>,
}

impl Thermal {
    /// Decode a raw thermal response body.
    ///
    /// The body is decoded twice, once per array, so a document that only
    /// carries one of them still yields the other as empty.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let fans: FansDocument = serde_json::from_slice(body)
            .map_err(|e| decode_error("fans", &e, body))?;
        let temperatures: TemperaturesDocument = serde_json::from_slice(body)
            .map_err(|e| decode_error("temperatures", &e, body))?;

        Ok(Self {
            fans: fans.fans.into_iter().map(FanReading::from).collect(),
            temperatures: temperatures
                .temperatures
                .into_iter()
                .map(TemperatureReading::from)
                .collect(),
        })
    }
}

fn decode_error(view: &str, err: &serde_json::Error, body: &[u8]) -> ExporterError {
    let preview = String::from_utf8_lossy(&body[..body.len().min(200)]);
    ExporterError::Decode(format!(
        "Failed to parse {}: {}. Body preview: {}...",
        view, err, preview
    ))
}

#[derive(Debug, Default, Deserialize)]
struct FansDocument {
    #[serde(rename = "Fans", default)]
    fans: Vec<WireFan>,
}

#[derive(Debug, Default, Deserialize)]
struct TemperaturesDocument {
    #[serde(default, alias = "Temperatures")]
    temperatures: Vec<WireTemperature>,
}

/// Redfish `Status` object; the Gen8 iLO also inlines these two fields.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireStatus {
    #[serde(alias = "Health")]
    health: Option<String>,
    #[serde(alias = "State")]
    state: Option<String>,
}

impl WireStatus {
    /// Nested `Status` wins over the inline fields.
    fn resolve(inline: WireStatus, nested: Option<WireStatus>) -> (Option<String>, String) {
        let nested = nested.unwrap_or_default();
        let health = nested.health.or(inline.health);
        let state = nested.state.or(inline.state).unwrap_or_default();
        (health, state)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireFan {
    #[serde(rename = "FanName")]
    name: Option<String>,
    #[serde(rename = "CurrentReading")]
    current_reading: Option<i64>,
    #[serde(alias = "Health")]
    health: Option<String>,
    #[serde(alias = "State")]
    state: Option<String>,
    #[serde(rename = "Status", alias = "status")]
    status: Option<WireStatus>,
}

impl From<WireFan> for FanReading {
    fn from(wire: WireFan) -> Self {
        let inline = WireStatus {
            health: wire.health,
            state: wire.state,
        };
        let (health, state) = WireStatus::resolve(inline, wire.status);
        Self {
            name: wire.name.unwrap_or_default(),
            current_reading: wire.current_reading.unwrap_or_default(),
            health,
            state,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireTemperature {
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "CurrentReading")]
    current_reading: Option<f64>,
    #[serde(alias = "Health")]
    health: Option<String>,
    #[serde(alias = "State")]
    state: Option<String>,
    #[serde(rename = "Status", alias = "status")]
    status: Option<WireStatus>,
    #[serde(rename = "UpperThresholdCritical")]
    upper_threshold_critical: Option<f64>,
    #[serde(rename = "UpperThresholdFatal")]
    upper_threshold_fatal: Option<f64>,
}

impl From<WireTemperature> for TemperatureReading {
    fn from(wire: WireTemperature) -> Self {
        let inline = WireStatus {
            health: wire.health,
            state: wire.state,
        };
        let (health, state) = WireStatus::resolve(inline, wire.status);
        Self {
            name: wire.name.unwrap_or_default(),
            current_reading: wire.current_reading.unwrap_or_default(),
            health,
            state,
            upper_threshold_critical: wire.upper_threshold_critical.unwrap_or_default(),
            upper_threshold_fatal: wire.upper_threshold_fatal.unwrap_or_default(),
        }
    }
}
