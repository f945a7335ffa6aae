//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use resilient_gateway::config::{EndpointConfig, GatewayConfig};
use resilient_gateway::{HttpServer, Shutdown};

pub const ADMIN_KEY: &str = "test-admin-key";

/// A request as seen by the mock upstream.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub target: String,
    pub user_agent: Option<String>,
}

/// Start a programmable mock upstream on an ephemeral port.
///
/// `f` receives each request and returns `(status, body)`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(SeenRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let Some(seen) = read_request(&mut socket).await else {
                    return;
                };
                let (status, body) = f(seen).await;
                let status_text = match status {
                    200 => "200 OK",
                    404 => "404 Not Found",
                    429 => "429 Too Many Requests",
                    500 => "500 Internal Server Error",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<SeenRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf);
    let mut lines = head.lines();
    let target = lines.next()?.split_whitespace().nth(1)?.to_string();
    let user_agent = lines.find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.eq_ignore_ascii_case("user-agent")
            .then(|| value.trim().to_string())
    });

    Some(SeenRequest { target, user_agent })
}

/// Config pointing at `backend` with no pacing delay.
pub fn test_config(backend: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.base_url = format!("http://{backend}");
    config.upstream.request_timeout_secs = 5;
    config.throttle.min_delay_ms = 0;
    config.throttle.max_delay_ms = 0;
    config.throttle.identities = vec!["agent-a".into(), "agent-b".into()];
    config.admin.enabled = true;
    config.admin.api_key = ADMIN_KEY.into();
    config.endpoints = vec![
        EndpointConfig {
            name: "trending".into(),
            path: "/trending".into(),
            ttl_secs: None,
            cacheable: true,
            fallback: Some(json!({ "trends": ["placeholder"] })),
        },
        EndpointConfig {
            name: "suggestions".into(),
            path: "/suggestions".into(),
            ttl_secs: None,
            cacheable: false,
            fallback: Some(json!([])),
        },
    ];
    config
}

/// Start the gateway on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let (tx, updates) = mpsc::unbounded_channel();

    let server = HttpServer::new(config).unwrap();
    tokio::spawn(async move {
        let _tx = tx;
        server.run(listener, updates, rx).await.unwrap();
    });

    (addr, shutdown)
}
