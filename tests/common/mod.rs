//! Shared utilities for gateway integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::{header, Request, Response};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use instance_gateway::config::GatewayConfig;
use instance_gateway::directory::{AllocationRecord, InstanceStatus};
use instance_gateway::http::HttpServer;
use instance_gateway::lifecycle::Shutdown;

/// A gateway instance running on an ephemeral port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

/// Start the gateway under test. The returned handle must be kept alive
/// and `shutdown.trigger()` called at the end of the test.
pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let shutdown = Shutdown::new();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (_config_tx, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    TestGateway { addr, shutdown }
}

/// Config with the given tenants seeded as running allocations.
pub fn config_with_tenants(tenants: &[(&str, Option<u16>)]) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.tenants = tenants
        .iter()
        .map(|(tenant_id, port)| AllocationRecord {
            tenant_id: tenant_id.to_string(),
            port: *port,
            status: InstanceStatus::Running,
        })
        .collect();
    config
}

async fn serve_app(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Backend that mirrors the request it received: method, path, query and
/// selected headers come back as `x-echo-*` headers, the body byte-for-byte.
#[allow(dead_code)]
pub async fn start_echo_backend() -> SocketAddr {
    async fn echo(request: Request<Body>) -> Response<Body> {
        let method = request.method().to_string();
        let path = request.uri().path().to_string();
        let query = request.uri().query().unwrap_or("").to_string();
        let cookie = header_or_empty(&request, header::COOKIE.as_str());
        let user = header_or_empty(&request, "x-st-user");
        let original_host = header_or_empty(&request, "x-original-host");

        let body = axum::body::to_bytes(request.into_body(), usize::MAX)
            .await
            .unwrap_or_default();

        Response::builder()
            .header("x-echo-method", method)
            .header("x-echo-path", path)
            .header("x-echo-query", query)
            .header("x-echo-cookie", cookie)
            .header("x-echo-user", user)
            .header("x-echo-original-host", original_host)
            .body(Body::from(body))
            .unwrap()
    }

    fn header_or_empty(request: &Request<Body>, name: &str) -> String {
        request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string()
    }

    serve_app(Router::new().fallback(echo)).await
}

/// Backend that counts hits, for asserting it was never contacted.
#[allow(dead_code)]
pub async fn start_counting_backend(hits: Arc<AtomicU32>) -> SocketAddr {
    let app = Router::new().fallback(move || {
        let hits = hits.clone();
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            "counted"
        }
    });
    serve_app(app).await
}

/// Backend that sleeps before answering.
#[allow(dead_code)]
pub async fn start_slow_backend(delay: Duration) -> SocketAddr {
    let app = Router::new().fallback(move || async move {
        tokio::time::sleep(delay).await;
        "slow response"
    });
    serve_app(app).await
}

/// Backend that accepts connections but never writes a byte.
#[allow(dead_code)]
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        loop {
            match listener.accept().await {
                Ok((socket, _)) => held.push(socket),
                Err(_) => break,
            }
        }
    });
    addr
}

/// Backend that accepts WebSocket upgrades on any path and echoes frames.
#[allow(dead_code)]
pub async fn start_ws_echo_backend() -> SocketAddr {
    async fn upgrade(ws: WebSocketUpgrade) -> axum::response::Response {
        ws.on_upgrade(echo_frames)
    }

    async fn echo_frames(mut socket: WebSocket) {
        while let Some(Ok(message)) = socket.recv().await {
            match message {
                Message::Text(_) | Message::Binary(_) => {
                    if socket.send(message).await.is_err() {
                        break;
                    }
                }
                Message::Close(_) => break,
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    }

    serve_app(Router::new().fallback(upgrade)).await
}

/// Reserve a port with nothing listening on it.
#[allow(dead_code)]
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}
