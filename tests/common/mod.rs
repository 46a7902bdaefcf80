//! Shared utilities for integration testing: a scriptable mock vendor API
//! and a helper that runs the proxy in front of it.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    Json, Router,
};
use serde_json::Value;
use tokio::net::TcpListener;

use kling_proxy::config::ProxyConfig;
use kling_proxy::http::HttpServer;
use kling_proxy::lifecycle::Shutdown;

pub const ACCESS_KEY_ID: &str = "ak-integration";
pub const ACCESS_KEY_SECRET: &str = "sk-integration";

/// One request as seen by the mock vendor.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

/// Mock vendor that replays scripted responses; the last one repeats.
#[derive(Clone, Default)]
pub struct MockVendor {
    requests: Arc<Mutex<Vec<Recorded>>>,
    script: Arc<Mutex<VecDeque<(u16, Value)>>>,
}

#[allow(dead_code)]
impl MockVendor {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> Recorded {
        self.requests().last().cloned().expect("vendor received no request")
    }
}

async fn vendor_handler(
    State(mock): State<MockVendor>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    mock.requests.lock().unwrap().push(Recorded {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).ok(),
    });

    let mut script = mock.script.lock().unwrap();
    let (status, value) = if script.len() > 1 {
        script.pop_front().unwrap()
    } else {
        script
            .front()
            .cloned()
            .unwrap_or((200, serde_json::json!({ "code": 0, "message": "SUCCEED" })))
    };
    (StatusCode::from_u16(status).unwrap(), Json(value))
}

/// Start a mock vendor on an ephemeral port.
pub async fn start_mock_vendor(script: Vec<(u16, Value)>) -> (SocketAddr, MockVendor) {
    let mock = MockVendor {
        script: Arc::new(Mutex::new(script.into())),
        ..MockVendor::default()
    };
    let app = Router::new().fallback(vendor_handler).with_state(mock.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, mock)
}

/// Proxy configuration pointed at `vendor_base`.
pub fn proxy_config(vendor_base: &str) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.base_url = vendor_base.to_string();
    config.upstream.timeout_secs = 5;
    config.upstream.system_proxy = false;
    config.credentials.access_key_id = ACCESS_KEY_ID.into();
    config.credentials.access_key_secret = ACCESS_KEY_SECRET.into();
    config
}

/// Run the proxy on an ephemeral port. Keep the `Shutdown` alive for the test.
pub async fn start_proxy(config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    (addr, shutdown)
}

/// Vendor + proxy pair.
#[allow(dead_code)]
pub async fn start_stack(script: Vec<(u16, Value)>) -> (SocketAddr, MockVendor, Shutdown) {
    let (vendor_addr, mock) = start_mock_vendor(script).await;
    let (proxy_addr, shutdown) = start_proxy(proxy_config(&format!("http://{}", vendor_addr))).await;
    (proxy_addr, mock, shutdown)
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
