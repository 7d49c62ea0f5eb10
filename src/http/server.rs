//! HTTP server setup and the proxy dispatcher.
//!
//! # Responsibilities
//! - Create the Axum router: tenant catch-all + admin surface
//! - Wire up middleware (request ID, tracing)
//! - Dispatch tenant-scoped requests: validate, resolve, rewrite, forward
//! - Hand upgrade requests to the WebSocket forwarder
//! - Convert every backend failure into the stable error contracts

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{ws::WebSocketUpgrade, ConnectInfo, FromRequestParts, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::trace::TraceLayer;

use crate::admin;
use crate::config::GatewayConfig;
use crate::directory::{InMemoryDirectory, InMemoryForwarding};
use crate::http::error::ProxyError;
use crate::http::request::{self, RequestIdExt, RequestIdLayer};
use crate::http::{response, websocket};
use crate::observability::metrics;
use crate::routing;

/// Application state injected into handlers.
///
/// Per-request work shares nothing mutable: the directory supports
/// unlimited concurrent readers and the config is an atomic snapshot swap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ArcSwap<GatewayConfig>>,
    pub directory: Arc<InMemoryDirectory>,
    pub forwarding: Arc<InMemoryForwarding>,
    pub client: Client<HttpConnector, Body>,
}

/// HTTP server for the instance gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new server, seeding the tenant directory and forwarding
    /// store from configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let directory = Arc::new(InMemoryDirectory::seed(config.tenants.clone()));
        let forwarding = Arc::new(InMemoryForwarding::seed(config.forwarding.clone()));

        // The connect timeout is bound into the connector at startup; the
        // response timeout is read from the live config on every request.
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let state = AppState {
            config: Arc::new(ArcSwap::from_pointee(config)),
            directory,
            forwarding,
            client,
        };

        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Admin routes are static paths and take precedence over the tenant
    /// catch-all; everything else flows through the proxy dispatcher.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .merge(admin::admin_router(state.clone()))
            .with_state(state)
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Shared state handle, for wiring collaborators outside the router.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until shutdown is triggered or Ctrl-C arrives.
    ///
    /// `config_updates` feeds hot reloads into the live config snapshot.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "gateway listening");

        let config_swap = self.state.config.clone();
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                tracing::info!("applying reloaded configuration");
                config_swap.store(Arc::new(new_config));
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.recv() => {}
                    _ = ctrl_c() => {}
                }
                tracing::info!("shutdown signal received");
            })
            .await?;

        tracing::info!("gateway stopped");
        Ok(())
    }
}

/// Proxy dispatcher for the tenant-scoped route surface.
///
/// Handles both plain HTTP and WebSocket upgrades on `/{tenant}/st*`. The
/// backend is resolved fresh on every request; nothing about the target is
/// cached across requests.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let request_id = request.request_id().to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let Some(raw_tenant) = routing::match_tenant_route(&path) else {
        tracing::debug!(request_id = %request_id, path = %path, "no tenant route matched");
        metrics::record_request(method.as_str(), StatusCode::NOT_FOUND.as_u16(), "none", start);
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "route_not_matched" })),
        )
            .into_response();
    };
    let tenant = raw_tenant.to_string();

    if !routing::is_valid_tenant_id(&tenant) {
        let error = ProxyError::InvalidTenantToken(tenant);
        tracing::warn!(request_id = %request_id, error = %error, "rejected tenant token");
        metrics::record_request(method.as_str(), error.status().as_u16(), "invalid", start);
        return error.into_response();
    }

    // Fresh resolution on every request: ports move when instances restart.
    let backend = match routing::resolve_backend(state.directory.as_ref(), &tenant) {
        Ok(backend) => backend,
        Err(error) => {
            tracing::warn!(
                request_id = %request_id,
                tenant = %tenant,
                error = %error,
                "tenant resolution failed"
            );
            metrics::record_request(method.as_str(), error.status().as_u16(), &tenant, start);
            return error.into_response();
        }
    };

    let timeouts = state.config.load().timeouts;

    if is_upgrade_request(request.headers()) {
        let (mut parts, body) = request.into_parts();
        let ws = match WebSocketUpgrade::from_request_parts(&mut parts, &()).await {
            Ok(ws) => ws,
            Err(rejection) => {
                tracing::warn!(
                    request_id = %request_id,
                    tenant = %tenant,
                    "malformed websocket upgrade request"
                );
                metrics::record_request(
                    method.as_str(),
                    StatusCode::BAD_REQUEST.as_u16(),
                    &tenant,
                    start,
                );
                return rejection.into_response();
            }
        };
        let request = Request::from_parts(parts, body);

        tracing::debug!(
            request_id = %request_id,
            tenant = %tenant,
            backend = %backend.authority(),
            "forwarding websocket upgrade"
        );
        let response = websocket::forward_upgrade(
            ws,
            &request,
            tenant.clone(),
            backend,
            client_addr.ip(),
            Duration::from_secs(timeouts.connect_secs),
        )
        .await;
        metrics::record_request(method.as_str(), response.status().as_u16(), &tenant, start);
        return response;
    }

    let (parts, body) = request.into_parts();
    let upstream = request::build_upstream_request(parts, body, &tenant, &backend, client_addr.ip());

    tracing::debug!(
        request_id = %request_id,
        tenant = %tenant,
        method = %method,
        backend = %backend.authority(),
        path = %upstream.uri().path(),
        "forwarding request"
    );

    // The deadline covers connection setup and response headers. Once the
    // backend starts streaming, the body is allowed to flow at any pace.
    let deadline = Duration::from_secs(timeouts.idle_secs);
    let response = match tokio::time::timeout(deadline, state.client.request(upstream)).await {
        Ok(Ok(upstream_response)) => response::finalize_response(upstream_response, &tenant),
        Ok(Err(source)) => {
            let error = ProxyError::BackendConnectFailed {
                tenant: tenant.clone(),
                source,
            };
            tracing::warn!(request_id = %request_id, tenant = %tenant, error = %error, "backend request failed");
            error.into_response()
        }
        Err(_) => {
            let error = ProxyError::BackendTimeout {
                tenant: tenant.clone(),
                timeout_secs: timeouts.idle_secs,
            };
            tracing::warn!(request_id = %request_id, tenant = %tenant, error = %error, "backend timed out");
            error.into_response()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), &tenant, start);
    response
}

/// WebSocket upgrade requests are intercepted on the same route surface.
fn is_upgrade_request(headers: &HeaderMap) -> bool {
    headers
        .get(header::UPGRADE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("websocket"))
}

/// Wait for Ctrl-C.
async fn ctrl_c() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %error, "failed to install Ctrl+C handler");
        // Fall back to never resolving; shutdown stays reachable via the
        // broadcast channel.
        std::future::pending::<()>().await;
    }
}
