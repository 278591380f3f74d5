//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::Response;
use axum::Router;
use tokio::net::TcpListener;

use finance_proxy::config::ProxyConfig;
use finance_proxy::lifecycle::Shutdown;
use finance_proxy::HttpServer;

/// A request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct Received {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

type Responder = Arc<dyn Fn(u32) -> Response + Send + Sync>;

#[derive(Clone)]
struct MockState {
    calls: Arc<AtomicU32>,
    received: Arc<Mutex<Vec<Received>>>,
    respond: Responder,
}

/// Handle to a running mock backend.
pub struct MockBackend {
    pub addr: SocketAddr,
    calls: Arc<AtomicU32>,
    received: Arc<Mutex<Vec<Received>>>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }
}

/// Start a mock backend on an ephemeral port. `respond` gets the zero-based
/// call index and builds the reply.
pub async fn start_programmable_backend<F>(respond: F) -> MockBackend
where
    F: Fn(u32) -> Response + Send + Sync + 'static,
{
    let state = MockState {
        calls: Arc::new(AtomicU32::new(0)),
        received: Arc::new(Mutex::new(Vec::new())),
        respond: Arc::new(respond),
    };
    let backend = MockBackend {
        addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        calls: state.calls.clone(),
        received: state.received.clone(),
    };

    let listener = TcpListener::bind(backend.addr).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(record).with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockBackend { addr, ..backend }
}

async fn record(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let index = state.calls.fetch_add(1, Ordering::SeqCst);
    state.received.lock().unwrap().push(Received {
        method,
        path: uri.path().to_string(),
        headers,
        body,
    });
    (state.respond)(index)
}

/// Config pointing at `backend_url` with fast retries and loopback allowed.
pub fn test_config(backend_url: &str) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.backend_url = Some(backend_url.to_string());
    config.upstream.allow_loopback = true;
    config.retries.base_delay_ms = 10;
    config.timeouts.request_secs = 5;
    config
}

/// Start the proxy with `config`; returns its address and shutdown handle.
pub async fn start_proxy(config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// A loopback port with nothing listening on it.
pub fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
