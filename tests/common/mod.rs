#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use reqwest::Client;

use survey_relay::config::Config;

/// One request as the stub upstream saw it.
#[derive(Debug, Clone)]
pub struct Captured {
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Captured {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("captured body is not JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).unwrap()
    }
}

type Log = Arc<Mutex<Vec<Captured>>>;

/// A stand-in for the spreadsheet script endpoint.
pub struct StubUpstream {
    pub addr: SocketAddr,
    log: Log,
}

impl StubUpstream {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.log.lock().unwrap().clone()
    }
}

fn capture(log: &Log, headers: &HeaderMap, body: &Bytes) {
    log.lock().unwrap().push(Captured {
        content_type: headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string()),
        body: body.to_vec(),
    });
}

async fn echo(State(log): State<Log>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    capture(&log, &headers, &body);
    let ct = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    (StatusCode::OK, [("content-type", ct)], body)
}

async fn ok(State(log): State<Log>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    capture(&log, &headers, &body);
    (
        StatusCode::OK,
        [("content-type", "application/json")],
        r#"{"status":"ok","message":"Dados salvos"}"#,
    )
}

async fn quota(State(log): State<Log>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    capture(&log, &headers, &body);
    (
        StatusCode::OK,
        [("content-type", "application/json")],
        r#"{"status":"error","message":"quota exceeded"}"#,
    )
}

async fn boom(State(log): State<Log>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    capture(&log, &headers, &body);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [("content-type", "text/plain")],
        "Internal Server Error",
    )
}

async fn slow(State(log): State<Log>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    capture(&log, &headers, &body);
    tokio::time::sleep(Duration::from_secs(5)).await;
    (StatusCode::OK, "late")
}

/// Spawn the stub upstream on a random port.
pub async fn spawn_upstream() -> StubUpstream {
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    let app = Router::new()
        .route("/echo", post(echo))
        .route("/ok", post(ok))
        .route("/quota", post(quota))
        .route("/boom", post(boom))
        .route("/slow", post(slow))
        .with_state(log.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind upstream");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Upstream failed");
    });

    StubUpstream { addr, log }
}

/// A running relay instance.
pub struct TestRelay {
    pub addr: SocketAddr,
    pub client: Client,
}

impl TestRelay {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn relay_url(&self) -> String {
        self.url("/api/proxy-to-sheet")
    }
}

pub fn test_config(upstream_url: &str) -> Config {
    Config {
        upstream_url: upstream_url.to_string(),
        forms_secret: None,
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        relay_path: "/api/proxy-to-sheet".to_string(),
        cors_origins: vec![],
        max_body_size: 65_536,
        rate_limit: 0,
        rate_window_secs: 60,
        trusted_proxies: vec![],
        upstream_timeout: Duration::from_secs(2),
        log_level: "warn".to_string(),
    }
}

/// Spawn the relay in front of `upstream_url`.
pub async fn spawn_relay(config: Config) -> TestRelay {
    let (app, _state) = survey_relay::build_app(config).expect("Failed to build relay");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    TestRelay {
        addr,
        client: Client::new(),
    }
}
