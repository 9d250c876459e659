//! Thermal collector: one live fetch and projection per scrape.

use crate::client::{RedfishClient, Session};
use crate::error::Result;
use crate::metrics::ThermalSeries;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use std::sync::Arc;
use tracing::debug;

/// Composes the Redfish client, the shared session and the thermal series.
#[derive(Clone)]
pub struct ThermalCollector {
    client: RedfishClient,
    session: Arc<Session>,
    schema: ThermalSeries,
}

impl ThermalCollector {
    /// Create a collector for an already authenticated session.
    pub fn new(client: RedfishClient, session: Arc<Session>) -> Result<Self> {
        Ok(Self {
            client,
            session,
            schema: ThermalSeries::new()?,
        })
    }

    /// Descriptors of every series [`ThermalCollector::collect`] may emit.
    pub fn describe(&self) -> Vec<&Desc> {
        self.schema.desc()
    }

    /// Series declarations, for registration with a Prometheus registry.
    pub fn schema(&self) -> &ThermalSeries {
        &self.schema
    }

    /// Fetch thermal telemetry and project it onto the thermal series.
    pub async fn collect(&self) -> Result<Vec<MetricFamily>> {
        let thermal = self.client.get_thermal(&self.session).await?;
        debug!(
            "Fetched {} fans and {} temperature sensors",
            thermal.fans.len(),
            thermal.temperatures.len()
        );
        Ok(ThermalSeries::project(&thermal)?.collect())
    }
}
