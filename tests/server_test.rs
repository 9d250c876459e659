//! HTTP server endpoint tests

use microserver_gen8_exporter::{
    client::RedfishClient,
    collector::ThermalCollector,
    config::{RedfishConfig, DEFAULT_SESSION_PATH, DEFAULT_THERMAL_PATH},
    registry::MetricsRegistry,
    server::{run, serve},
    ExporterError,
};
use mockito::{Server, ServerGuard};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Helper to create test config
fn create_test_config(server_url: &str) -> RedfishConfig {
    RedfishConfig {
        url: server_url.to_string(),
        login: "admin".to_string(),
        password: "secret".to_string(),
        insecure: true,
        timeout_seconds: Some(5),
        session_path: DEFAULT_SESSION_PATH.to_string(),
        thermal_path: DEFAULT_THERMAL_PATH.to_string(),
    }
}

struct Exporter {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<microserver_gen8_exporter::Result<()>>,
}

/// Authenticate against the mock and serve the exporter on an ephemeral port.
async fn spawn_exporter(redfish: &mut ServerGuard) -> Exporter {
    let _login = redfish
        .mock("POST", DEFAULT_SESSION_PATH)
        .with_status(201)
        .with_header("X-Auth-Token", "token-123")
        .with_header("Location", "/redfish/v1/SessionService/Sessions/admin1")
        .create_async()
        .await;

    let client = RedfishClient::new(create_test_config(&redfish.url())).unwrap();
    let session = Arc::new(client.authenticate().await.unwrap());
    let collector = ThermalCollector::new(client, session).unwrap();
    let metrics = MetricsRegistry::new(collector).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(serve(listener, metrics, async move {
        let _ = rx.await;
    }));

    Exporter {
        addr,
        shutdown,
        handle,
    }
}

impl Exporter {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn stop(self) {
        self.shutdown.send(()).unwrap();
        self.handle.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let mut redfish = Server::new_async().await;
    let exporter = spawn_exporter(&mut redfish).await;

    let response = reqwest::get(exporter.url("/health")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "OK");

    exporter.stop().await;
}

#[tokio::test]
async fn test_root_endpoint_links_metrics() {
    let mut redfish = Server::new_async().await;
    let exporter = spawn_exporter(&mut redfish).await;

    let body = reqwest::get(exporter.url("/"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains(r#"href="/metrics""#));

    exporter.stop().await;
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let mut redfish = Server::new_async().await;
    let exporter = spawn_exporter(&mut redfish).await;

    let _mock_thermal = redfish
        .mock("GET", DEFAULT_THERMAL_PATH)
        .match_header("X-Auth-Token", "token-123")
        .with_status(200)
        .with_body(r#"{"Fans": [{"FanName": "Fan 1", "CurrentReading": 12, "Status": {"Health": "OK", "State": "Enabled"}}],
                      "Temperatures": [{"Name": "02-CPU", "CurrentReading": 38, "Status": {"Health": "OK", "State": "Enabled"},
                                        "UpperThresholdCritical": 70, "UpperThresholdFatal": 0}]}"#)
        .create_async()
        .await;

    let response = reqwest::get(exporter.url("/metrics")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    let metrics = response.text().await.unwrap();
    assert!(metrics.contains("# HELP"));
    assert!(metrics.contains("# TYPE"));
    assert!(metrics.contains("microserver_gen8_up 1"));
    assert!(metrics.contains(r#"name="Fan 1""#));
    assert!(metrics.contains(r#"name="02-CPU""#));
    assert!(metrics.contains(r#"microserver_gen8_temperature_celsius{name="02-CPU"} 38"#));

    exporter.stop().await;
}

#[tokio::test]
async fn test_metrics_endpoint_survives_redfish_outage() {
    let mut redfish = Server::new_async().await;
    let exporter = spawn_exporter(&mut redfish).await;

    let _mock_thermal = redfish
        .mock("GET", DEFAULT_THERMAL_PATH)
        .with_status(503)
        .create_async()
        .await;

    // Two scrapes in a row; the exporter keeps serving
    for _ in 0..2 {
        let response = reqwest::get(exporter.url("/metrics")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let metrics = response.text().await.unwrap();
        assert!(metrics.contains("microserver_gen8_up 0"));
        assert!(!metrics.contains("microserver_gen8_fan_usage{"));
    }

    let response = reqwest::get(exporter.url("/health")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    exporter.stop().await;
}

#[tokio::test]
async fn test_concurrent_scrapes_fetch_independently() {
    let mut redfish = Server::new_async().await;
    let exporter = spawn_exporter(&mut redfish).await;

    let mock = redfish
        .mock("GET", DEFAULT_THERMAL_PATH)
        .with_status(200)
        .with_body(r#"{"Fans": [{"FanName": "Fan 1", "CurrentReading": 12}], "temperatures": []}"#)
        .expect(3)
        .create_async()
        .await;

    let scrapes = (0..3).map(|_| reqwest::get(exporter.url("/metrics")));
    for response in spawn_all(scrapes).await {
        assert_eq!(response.status(), reqwest::StatusCode::OK);
    }

    mock.assert_async().await;
    exporter.stop().await;
}

const SESSION_URI: &str = "/redfish/v1/SessionService/Sessions/admin1";

async fn mock_login(redfish: &mut ServerGuard, status: usize) -> mockito::Mock {
    redfish
        .mock("POST", DEFAULT_SESSION_PATH)
        .with_status(status)
        .with_header("X-Auth-Token", "token-123")
        .with_header("Location", SESSION_URI)
        .create_async()
        .await
}

async fn mock_logout(redfish: &mut ServerGuard, hits: usize) -> mockito::Mock {
    redfish
        .mock("DELETE", SESSION_URI)
        .match_header("X-Auth-Token", "token-123")
        .with_status(200)
        .expect(hits)
        .create_async()
        .await
}

#[tokio::test]
async fn test_run_closes_session_on_shutdown() {
    let mut redfish = Server::new_async().await;
    let login = mock_login(&mut redfish, 201).await;
    let logout = mock_logout(&mut redfish, 1).await;

    let client = RedfishClient::new(create_test_config(&redfish.url())).unwrap();
    run(client, "127.0.0.1:0", async {}).await.unwrap();

    login.assert_async().await;
    logout.assert_async().await;
}

#[tokio::test]
async fn test_run_closes_session_when_bind_fails() {
    let mut redfish = Server::new_async().await;
    let _login = mock_login(&mut redfish, 201).await;
    let logout = mock_logout(&mut redfish, 1).await;

    // Keep the port busy so the exporter cannot bind it
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = taken.local_addr().unwrap().to_string();

    let client = RedfishClient::new(create_test_config(&redfish.url())).unwrap();
    let result = run(client, &address, async {}).await;

    assert!(matches!(result, Err(ExporterError::Io(_))));
    logout.assert_async().await;
}

#[tokio::test]
async fn test_run_reports_failed_teardown() {
    let mut redfish = Server::new_async().await;
    let _login = mock_login(&mut redfish, 201).await;
    let logout = redfish
        .mock("DELETE", SESSION_URI)
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let client = RedfishClient::new(create_test_config(&redfish.url())).unwrap();
    let result = run(client, "127.0.0.1:0", async {}).await;

    assert!(result.is_err());
    logout.assert_async().await;
}

#[tokio::test]
async fn test_run_without_session_skips_teardown() {
    let mut redfish = Server::new_async().await;
    let _login = mock_login(&mut redfish, 401).await;
    let logout = mock_logout(&mut redfish, 0).await;

    let client = RedfishClient::new(create_test_config(&redfish.url())).unwrap();
    let result = run(client, "127.0.0.1:0", async {}).await;

    assert!(matches!(result, Err(ExporterError::Auth { .. })));
    logout.assert_async().await;
}

/// Drive all requests concurrently on the test runtime.
async fn spawn_all<F>(requests: impl Iterator<Item = F>) -> Vec<reqwest::Response>
where
    F: std::future::Future<Output = reqwest::Result<reqwest::Response>> + Send + 'static,
{
    let handles: Vec<_> = requests.map(tokio::spawn).collect();
    let mut responses = Vec::new();
    for handle in handles {
        responses.push(handle.await.unwrap().unwrap());
    }
    responses
}
