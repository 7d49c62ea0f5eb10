//! Per-request backend resolution.
//!
//! # Design Decisions
//! - Resolution is an explicit call inside each request handler, never a
//!   construction-time binding: ports move when instances restart, and a
//!   stale address must not outlive the request that resolved it.
//! - Exactly one resolved backend per request/session; a reallocation
//!   mid-request does not retarget an in-flight exchange.

use url::Url;

use crate::directory::TenantDirectory;
use crate::http::error::ProxyError;

/// Backend address resolved for a single request. Ephemeral by contract:
/// derived per-request, never persisted or shared across requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedBackend {
    port: u16,
}

impl ResolvedBackend {
    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` authority for the upstream request.
    pub fn authority(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    /// Base URL of the backend instance.
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://127.0.0.1:{}", self.port))
            .expect("loopback backend url is always well-formed")
    }

    /// WebSocket URL for the given backend-facing path and query.
    pub fn ws_url(&self, path_and_query: &str) -> String {
        format!("ws://127.0.0.1:{}{}", self.port, path_and_query)
    }
}

/// Resolve a validated tenant id to its current backend address.
///
/// Reads a fresh directory snapshot every call; callers must not cache the
/// result beyond the request that asked for it.
pub fn resolve_backend(
    directory: &dyn TenantDirectory,
    tenant_id: &str,
) -> Result<ResolvedBackend, ProxyError> {
    let record = directory
        .lookup(tenant_id)
        .ok_or_else(|| ProxyError::TenantNotFound(tenant_id.to_string()))?;

    let port = record
        .assigned_port()
        .ok_or_else(|| ProxyError::TenantNotProvisioned(tenant_id.to_string()))?;

    Ok(ResolvedBackend { port })
}
