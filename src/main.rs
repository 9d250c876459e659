use anyhow::Result;
use clap::Parser;
use microserver_gen8_exporter::{
    client::RedfishClient,
    config::{ExporterConfig, LogFormat, Settings},
    server::{run, shutdown_signal},
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// MicroServer Gen8 Exporter - Prometheus metrics exporter for iLO Redfish thermal telemetry
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "MICROSERVER_EXPORTER_CONFIG",
        default_value = "config.yaml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = Settings::load(Some(args.config.as_str()))?;

    init_logging(&settings.exporter)?;

    info!("Starting MicroServer Gen8 Exporter");
    info!("Redfish endpoint: {}", settings.redfish.url);
    info!("Listen address: {}", settings.exporter.listen_address);

    let client = RedfishClient::new(settings.redfish.clone())?;
    run(client, &settings.exporter.listen_address, shutdown_signal()).await?;

    info!("Exporter stopped");
    Ok(())
}

/// Initialize structured logging with tracing.
fn init_logging(exporter: &ExporterConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&exporter.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match exporter.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }

    Ok(())
}
