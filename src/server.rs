//! HTTP server for exposing Prometheus metrics.
//!
//! This module provides an Axum-based HTTP server that serves the `/metrics`
//! endpoint for Prometheus scraping and a `/health` endpoint for health checks.
//! [`run`] ties the server to the lifetime of one Redfish session.

use crate::client::{RedfishClient, Session};
use crate::collector::ThermalCollector;
use crate::error::{ExporterError, Result};
use crate::registry::MetricsRegistry;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use prometheus::TEXT_FORMAT;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared application state.
#[derive(Clone)]
struct AppState {
    metrics: Arc<MetricsRegistry>,
}

/// Build the exporter router.
pub fn router(metrics: MetricsRegistry) -> Router {
    let state = AppState {
        metrics: Arc::new(metrics),
    };

    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/", get(root_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open a Redfish session, serve metrics until `shutdown` resolves, then close
/// the session.
///
/// Once the session exists it is closed exactly once, whether the registry
/// fails to build, the listener fails to bind, the server fails or `shutdown`
/// resolves. The serve error is returned first when both steps fail.
///
/// # Examples
///
/// ```no_run
/// use microserver_gen8_exporter::client::RedfishClient;
/// use microserver_gen8_exporter::config::Settings;
/// use microserver_gen8_exporter::server::{run, shutdown_signal};
///
/// #[tokio::main]
/// async fn main() {
///     let settings = Settings::load(Some("config.yaml")).unwrap();
///     let client = RedfishClient::new(settings.redfish).unwrap();
///     run(client, "0.0.0.0:8080", shutdown_signal()).await.unwrap();
/// }
/// ```
pub async fn run<F>(client: RedfishClient, listen_address: &str, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let session = match client.authenticate().await {
        Ok(session) => Arc::new(session),
        Err(e) => {
            error!("Failed to open Redfish session: {}", e);
            return Err(e);
        }
    };
    info!("Redfish session opened");

    let served = serve_session(&client, session.clone(), listen_address, shutdown).await;
    let closed = client.close_session(&session).await;

    if let Err(e) = &served {
        error!("Server error: {}", e);
    }
    if let Err(e) = &closed {
        error!("Failed to close Redfish session: {}", e);
    }
    served.and(closed)
}

async fn serve_session<F>(
    client: &RedfishClient,
    session: Arc<Session>,
    listen_address: &str,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let collector = ThermalCollector::new(client.clone(), session)?;
    let metrics = MetricsRegistry::new(collector)?;
    info!("Metrics registry initialized");

    info!("Starting HTTP server on {}", listen_address);
    let listener = TcpListener::bind(listen_address).await?;
    serve(listener, metrics, shutdown).await
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, metrics: MetricsRegistry, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(metrics))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ExporterError::Server(e.to_string()))?;

    info!("HTTP server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

/// Handler for /metrics endpoint.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    info!("Received metrics scrape request");

    match state.metrics.render().await {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            warn!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
                .into_response()
        }
    }
}

/// Handler for /health endpoint.
async fn health_handler() -> Response {
    (StatusCode::OK, "OK").into_response()
}

/// Handler for root endpoint.
async fn root_handler() -> Response {
    let html = r#"
<!DOCTYPE html>
<html>
<head>
    <title>MicroServer Gen8 Exporter</title>
    <style>
        body { font-family: Arial, sans-serif; margin: 40px; }
        h1 { color: #333; }
        a { color: #0066cc; text-decoration: none; }
        a:hover { text-decoration: underline; }
        .info { background: #f0f0f0; padding: 15px; border-radius: 5px; margin: 20px 0; }
    </style>
</head>
<body>
    <h1>MicroServer Gen8 Exporter</h1>
    <div class="info">
        <p>Prometheus exporter for HP MicroServer Gen8 fans and temperature sensors (iLO Redfish)</p>
        <p><strong>Endpoints:</strong></p>
        <ul>
            <li><a href="/metrics">/metrics</a> - Prometheus metrics</li>
            <li><a href="/health">/health</a> - Health check</li>
        </ul>
    </div>
</body>
</html>
"#;

    (StatusCode::OK, axum::response::Html(html)).into_response()
}
