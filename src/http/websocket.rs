//! WebSocket upgrade forwarding.
//!
//! # Responsibilities
//! - Complete the backend handshake before the client ever sees a 101
//! - Relay frames bidirectionally, message-at-a-time, unbuffered
//! - Tear both sockets down together on every exit path
//!
//! # Data Flow
//! ```text
//! Client ←── WebSocket frames ──→ Gateway ←── WebSocket frames ──→ Backend
//! ```
//!
//! An upgrade session walks Received → TenantValidated → BackendResolved →
//! Connected → Piping → Closed; validation and resolution failures are
//! rejected at the HTTP level in the dispatcher, so this module only deals
//! with the Connected and Piping stages.

use std::net::IpAddr;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ws::{CloseFrame, Message as ClientMessage, WebSocket, WebSocketUpgrade};
use axum::http::{header, HeaderValue, Request};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::CloseFrame as BackendCloseFrame;
use tokio_tungstenite::tungstenite::Message as BackendMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::http::error::ProxyError;
use crate::http::request::{augment_cookie_header, X_FORWARDED_FOR, X_ORIGINAL_HOST, X_ST_USER};
use crate::observability::metrics;
use crate::routing::{rewrite_path, ResolvedBackend};

type BackendSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Forward an upgrade request to the tenant backend.
///
/// The backend connection and its handshake complete first; only then is
/// the client's upgrade accepted. Any backend failure turns into a plain
/// HTTP error response, never a half-upgraded connection.
pub(crate) async fn forward_upgrade(
    ws: WebSocketUpgrade,
    request: &Request<Body>,
    tenant: String,
    backend: ResolvedBackend,
    client_ip: IpAddr,
    connect_timeout: Duration,
) -> Response {
    let rewritten = rewrite_path(request.uri().path(), &tenant);
    let path_and_query = match request.uri().query() {
        Some(query) => format!("{rewritten}?{query}"),
        None => rewritten,
    };
    let target = backend.ws_url(&path_and_query);

    let mut upstream_request = match target.as_str().into_client_request() {
        Ok(upstream_request) => upstream_request,
        Err(source) => return ProxyError::UpgradeHandshakeFailed { tenant, source }.into_response(),
    };

    {
        let headers = upstream_request.headers_mut();
        if let Some(protocol) = request.headers().get(header::SEC_WEBSOCKET_PROTOCOL) {
            headers.insert(header::SEC_WEBSOCKET_PROTOCOL, protocol.clone());
        }
        if let Some(host) = request.headers().get(header::HOST) {
            headers.insert(X_ORIGINAL_HOST, host.clone());
        }
        if let Ok(value) = HeaderValue::from_str(&client_ip.to_string()) {
            headers.insert(X_FORWARDED_FOR, value);
        }
        if let Ok(value) = HeaderValue::from_str(&tenant) {
            headers.insert(X_ST_USER, value);
        }
        let cookie = augment_cookie_header(request.headers().get(header::COOKIE), &tenant);
        headers.insert(header::COOKIE, cookie);
    }

    let (backend_socket, handshake) =
        match tokio::time::timeout(connect_timeout, connect_async(upstream_request)).await {
            Ok(Ok(connected)) => connected,
            Ok(Err(source)) => {
                return ProxyError::UpgradeHandshakeFailed { tenant, source }.into_response();
            }
            Err(_) => {
                return ProxyError::BackendTimeout {
                    tenant,
                    timeout_secs: connect_timeout.as_secs(),
                }
                .into_response();
            }
        };

    tracing::debug!(tenant = %tenant, target = %target, "backend websocket handshake complete");

    // Mirror the subprotocol the backend accepted, if any.
    let ws = match handshake
        .headers()
        .get(header::SEC_WEBSOCKET_PROTOCOL)
        .and_then(|value| value.to_str().ok())
    {
        Some(protocol) => ws.protocols([protocol.to_owned()]),
        None => ws,
    };

    ws.on_upgrade(move |client_socket| pipe_sockets(client_socket, backend_socket, tenant))
}

/// Relay frames until either side closes or errors, then tear down both
/// sockets together. All exit paths drop both halves of both connections.
async fn pipe_sockets(client: WebSocket, backend: BackendSocket, tenant: String) {
    metrics::upgrade_session_opened();

    let (mut backend_tx, mut backend_rx) = backend.split();
    let (mut client_tx, mut client_rx) = client.split();

    let client_to_backend = async {
        while let Some(message) = client_rx.next().await {
            let message = message.map_err(|_| ProxyError::StreamInterrupted)?;
            let forward = match message {
                ClientMessage::Text(text) => BackendMessage::Text(text.to_string().into()),
                ClientMessage::Binary(data) => BackendMessage::Binary(data),
                ClientMessage::Ping(data) => BackendMessage::Ping(data),
                ClientMessage::Pong(data) => BackendMessage::Pong(data),
                ClientMessage::Close(frame) => {
                    let _ = backend_tx
                        .send(BackendMessage::Close(frame.map(close_to_backend)))
                        .await;
                    break;
                }
            };
            backend_tx
                .send(forward)
                .await
                .map_err(|_| ProxyError::StreamInterrupted)?;
        }
        Ok::<(), ProxyError>(())
    };

    let backend_to_client = async {
        while let Some(message) = backend_rx.next().await {
            let message = message.map_err(|_| ProxyError::StreamInterrupted)?;
            let forward = match message {
                BackendMessage::Text(text) => ClientMessage::Text(text.to_string().into()),
                BackendMessage::Binary(data) => ClientMessage::Binary(data),
                BackendMessage::Ping(data) => ClientMessage::Ping(data),
                BackendMessage::Pong(data) => ClientMessage::Pong(data),
                BackendMessage::Close(frame) => {
                    let _ = client_tx
                        .send(ClientMessage::Close(frame.map(close_to_client)))
                        .await;
                    break;
                }
                // Raw frames never surface from a completed handshake read.
                BackendMessage::Frame(_) => continue,
            };
            client_tx
                .send(forward)
                .await
                .map_err(|_| ProxyError::StreamInterrupted)?;
        }
        Ok::<(), ProxyError>(())
    };

    let outcome = tokio::select! {
        result = client_to_backend => result,
        result = backend_to_client => result,
    };

    // Joint teardown: whichever leg finished first, close the other side
    // too before the halves are dropped.
    let _ = client_tx.close().await;
    let _ = backend_tx.close().await;

    match outcome {
        Ok(()) => tracing::debug!(tenant = %tenant, "upgrade session closed"),
        Err(error) => {
            tracing::debug!(tenant = %tenant, error = %error, "upgrade session interrupted")
        }
    }

    metrics::upgrade_session_closed();
}

fn close_to_backend(frame: CloseFrame) -> BackendCloseFrame {
    BackendCloseFrame {
        code: frame.code.into(),
        reason: frame.reason.as_str().to_owned().into(),
    }
}

fn close_to_client(frame: BackendCloseFrame) -> CloseFrame {
    CloseFrame {
        code: frame.code.into(),
        reason: frame.reason.as_str().to_owned().into(),
    }
}
