//! Prometheus series definitions and the thermal projection.
//!
//! The five thermal series are declared once with fixed names and label
//! schemas. [`ThermalSeries`] builds one gauge vector per declaration; a
//! fresh instance is populated on every scrape so concurrent scrapes never
//! share sample state.

use crate::error::{ExporterError, Result};
use crate::thermal::{FanReading, TemperatureReading, Thermal};
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{GaugeVec, Opts};
use tracing::debug;

/// Prefix shared by every series the exporter emits.
pub const NAMESPACE: &str = "microserver_gen8";

/// Sensor state that maps to 1 on the sensor state series.
const ENABLED: &str = "Enabled";

/// A series declaration: name, help text and label schema.
#[derive(Debug, Clone, Copy)]
pub struct SeriesDef {
    pub name: &'static str,
    pub help: &'static str,
    pub labels: &'static [&'static str],
}

impl SeriesDef {
    /// Fully qualified series name.
    pub fn fq_name(&self) -> String {
        format!("{}_{}", NAMESPACE, self.name)
    }

    fn gauge_vec(&self) -> Result<GaugeVec> {
        GaugeVec::new(
            Opts::new(self.name, self.help).namespace(NAMESPACE),
            self.labels,
        )
        .map_err(|e| ExporterError::Metrics(e.to_string()))
    }
}

pub const FAN_USAGE: SeriesDef = SeriesDef {
    name: "fan_usage",
    help: "Fan usage in percent",
    labels: &["name", "health", "state"],
};

pub const SENSOR_STATE: SeriesDef = SeriesDef {
    name: "sensor_state",
    help: "Temperature sensor state (1 = Enabled, 0 = anything else)",
    labels: &["name", "health"],
};

pub const TEMPERATURE: SeriesDef = SeriesDef {
    name: "temperature_celsius",
    help: "Current temperature reading in degrees Celsius",
    labels: &["name"],
};

pub const TEMPERATURE_UPPER_CRITICAL: SeriesDef = SeriesDef {
    name: "temperature_upper_critical_celsius",
    help: "Upper critical temperature threshold in degrees Celsius",
    labels: &["name"],
};

pub const TEMPERATURE_UPPER_FATAL: SeriesDef = SeriesDef {
    name: "temperature_upper_fatal_celsius",
    help: "Upper fatal temperature threshold in degrees Celsius",
    labels: &["name"],
};

/// Every thermal series, in exposition order.
pub const THERMAL_SERIES: [SeriesDef; 5] = [
    FAN_USAGE,
    SENSOR_STATE,
    TEMPERATURE,
    TEMPERATURE_UPPER_CRITICAL,
    TEMPERATURE_UPPER_FATAL,
];

/// The thermal series of one scrape.
#[derive(Clone)]
pub struct ThermalSeries {
    fan_usage: GaugeVec,
    sensor_state: GaugeVec,
    temperature: GaugeVec,
    temperature_upper_critical: GaugeVec,
    temperature_upper_fatal: GaugeVec,
    fans: usize,
    sensors: usize,
}

impl ThermalSeries {
    /// Create empty series from the fixed declarations.
    pub fn new() -> Result<Self> {
        Ok(Self {
            fan_usage: FAN_USAGE.gauge_vec()?,
            sensor_state: SENSOR_STATE.gauge_vec()?,
            temperature: TEMPERATURE.gauge_vec()?,
            temperature_upper_critical: TEMPERATURE_UPPER_CRITICAL.gauge_vec()?,
            temperature_upper_fatal: TEMPERATURE_UPPER_FATAL.gauge_vec()?,
            fans: 0,
            sensors: 0,
        })
    }

    /// Build the series for one decoded thermal response.
    pub fn project(thermal: &Thermal) -> Result<Self> {
        let mut series = Self::new()?;
        for fan in &thermal.fans {
            series.observe_fan(fan);
        }
        for sensor in &thermal.temperatures {
            series.observe_temperature(sensor);
        }
        debug!(
            "Projected {} fans and {} temperature sensors",
            series.fans, series.sensors
        );
        Ok(series)
    }

    /// Fans sharing one label tuple collapse into one sample; the last reading wins.
    fn observe_fan(&mut self, fan: &FanReading) {
        let health = fan.health.as_deref().unwrap_or_default();
        self.fan_usage
            .with_label_values(&[fan.name.as_str(), health, fan.state.as_str()])
            .set(fan.current_reading as f64);
        self.fans += 1;
    }

    fn observe_temperature(&mut self, sensor: &TemperatureReading) {
        let name = sensor.name.as_str();
        let health = sensor.health.as_deref().unwrap_or_default();
        let state = if sensor.state == ENABLED { 1.0 } else { 0.0 };

        self.sensor_state.with_label_values(&[name, health]).set(state);
        self.temperature
            .with_label_values(&[name])
            .set(sensor.current_reading);
        self.temperature_upper_critical
            .with_label_values(&[name])
            .set(sensor.upper_threshold_critical);
        // Reports UpperThresholdCritical, not UpperThresholdFatal; see DESIGN.md.
        self.temperature_upper_fatal
            .with_label_values(&[name])
            .set(sensor.upper_threshold_critical);
        self.sensors += 1;
    }

    fn vecs(&self) -> [&GaugeVec; 5] {
        [
            &self.fan_usage,
            &self.sensor_state,
            &self.temperature,
            &self.temperature_upper_critical,
            &self.temperature_upper_fatal,
        ]
    }
}

impl Collector for ThermalSeries {
    fn desc(&self) -> Vec<&Desc> {
        self.vecs().into_iter().flat_map(|v| v.desc()).collect()
    }

    /// Series without samples are left out; the text encoder rejects empty families.
    fn collect(&self) -> Vec<MetricFamily> {
        let [fan_usage, sensor_vecs @ ..] = self.vecs();
        let mut families = Vec::new();
        if self.fans > 0 {
            families.extend(fan_usage.collect());
        }
        if self.sensors > 0 {
            for vec in sensor_vecs {
                families.extend(vec.collect());
            }
        }
        families
    }
}
