//! Metrics registry and text exposition.
//!
//! Every scrape runs the thermal collector once. A failed fetch does not fail
//! the scrape: the thermal series are left out, `microserver_gen8_up` is 0 and
//! the error counter for the failure kind is incremented.

use crate::collector::ThermalCollector;
use crate::error::{ExporterError, Result};
use crate::metrics::NAMESPACE;
use prometheus::core::Collector;
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, Gauge, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Registry shared by the HTTP handlers.
#[derive(Clone)]
pub struct MetricsRegistry {
    collector: ThermalCollector,
    registry: Registry,
    scrape_errors: IntCounterVec,
}

impl MetricsRegistry {
    /// Create the registry and pre-register the thermal series.
    pub fn new(collector: ThermalCollector) -> Result<Self> {
        let registry = Registry::new();

        #[cfg(target_os = "linux")]
        registry
            .register(Box::new(
                prometheus::process_collector::ProcessCollector::for_self(),
            ))
            .map_err(|e| ExporterError::Metrics(e.to_string()))?;

        let scrape_errors = IntCounterVec::new(
            Opts::new(
                "scrape_errors_total",
                "Failed Redfish scrapes by failure kind",
            )
            .namespace(NAMESPACE),
            &["kind"],
        )
        .map_err(|e| ExporterError::Metrics(e.to_string()))?;
        registry
            .register(Box::new(scrape_errors.clone()))
            .map_err(|e| ExporterError::Metrics(e.to_string()))?;

        // The schema never holds samples; it reserves the thermal series names.
        registry
            .register(Box::new(collector.schema().clone()))
            .map_err(|e| ExporterError::Metrics(e.to_string()))?;

        Ok(Self {
            collector,
            registry,
            scrape_errors,
        })
    }

    /// Run one scrape and gather every metric family to expose.
    pub async fn gather(&self) -> Result<Vec<MetricFamily>> {
        debug!("Collecting thermal metrics");
        let started = Instant::now();

        let up = Gauge::with_opts(
            Opts::new(
                "up",
                "Whether the last Redfish scrape was successful (1 = success, 0 = failure)",
            )
            .namespace(NAMESPACE),
        )
        .map_err(|e| ExporterError::Metrics(e.to_string()))?;
        let duration = Gauge::with_opts(
            Opts::new(
                "scrape_duration_seconds",
                "Duration of the Redfish scrape in seconds",
            )
            .namespace(NAMESPACE),
        )
        .map_err(|e| ExporterError::Metrics(e.to_string()))?;

        let mut families = match self.collector.collect().await {
            Ok(families) => {
                up.set(1.0);
                families
            }
            Err(e) => {
                warn!("Failed to collect thermal metrics: {}", e);
                self.scrape_errors.with_label_values(&[e.kind()]).inc();
                Vec::new()
            }
        };
        duration.set(started.elapsed().as_secs_f64());

        families.extend(up.collect());
        families.extend(duration.collect());
        families.extend(self.registry.gather());
        Ok(families)
    }

    /// Scrape and encode in Prometheus text format.
    pub async fn render(&self) -> Result<String> {
        let families = self.gather().await?;
        info!("Scrape complete");
        encode(&families)
    }
}

/// Encode metric families in Prometheus text format.
pub fn encode(families: &[MetricFamily]) -> Result<String> {
    let mut buffer = Vec::with_capacity(4096);
    TextEncoder::new()
        .encode(families, &mut buffer)
        .map_err(|e| ExporterError::Metrics(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| ExporterError::Metrics(e.to_string()))
}
