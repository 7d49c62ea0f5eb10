//! Proxy error taxonomy and the stable response contracts.
//!
//! Every failure on the dispatch or upgrade path is caught at the handler
//! boundary and converted here into a deterministic JSON response. Bodies
//! carry the tenant id and a machine-checkable error code; they never
//! expose internal state or raw upstream error text.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while dispatching tenant-scoped traffic.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The tenant path segment is not a safe token.
    #[error("invalid tenant token {0:?}")]
    InvalidTenantToken(String),

    /// The tenant is not registered in the directory.
    #[error("tenant {0} is not registered")]
    TenantNotFound(String),

    /// The tenant is registered but has no usable backend port yet.
    #[error("tenant {0} has no assigned backend port")]
    TenantNotProvisioned(String),

    /// Connecting to or talking to the backend failed.
    #[error("backend request for tenant {tenant} failed")]
    BackendConnectFailed {
        tenant: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    /// The backend did not produce response headers within the deadline.
    #[error("backend for tenant {tenant} timed out after {timeout_secs}s")]
    BackendTimeout { tenant: String, timeout_secs: u64 },

    /// The backend refused or botched its WebSocket handshake.
    #[error("websocket handshake with backend for tenant {tenant} failed")]
    UpgradeHandshakeFailed {
        tenant: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    /// A relay leg of an established stream broke mid-flight.
    #[error("stream interrupted while relaying")]
    StreamInterrupted,
}

/// Result type for proxy dispatch operations.
pub type ProxyResult<T> = Result<T, ProxyError>;

impl ProxyError {
    /// Machine-checkable error code carried in response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ProxyError::InvalidTenantToken(_) => "invalid_tenant_id",
            ProxyError::TenantNotFound(_) => "tenant_not_found",
            ProxyError::TenantNotProvisioned(_) => "instance_not_provisioned",
            ProxyError::BackendConnectFailed { .. }
            | ProxyError::BackendTimeout { .. }
            | ProxyError::UpgradeHandshakeFailed { .. } => "instance_unreachable",
            ProxyError::StreamInterrupted => "stream_interrupted",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidTenantToken(_) => StatusCode::BAD_REQUEST,
            ProxyError::TenantNotFound(_) => StatusCode::NOT_FOUND,
            ProxyError::TenantNotProvisioned(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::BackendConnectFailed { .. }
            | ProxyError::BackendTimeout { .. }
            | ProxyError::UpgradeHandshakeFailed { .. }
            | ProxyError::StreamInterrupted => StatusCode::BAD_GATEWAY,
        }
    }

    fn tenant(&self) -> &str {
        match self {
            ProxyError::InvalidTenantToken(tenant)
            | ProxyError::TenantNotFound(tenant)
            | ProxyError::TenantNotProvisioned(tenant) => tenant,
            ProxyError::BackendConnectFailed { tenant, .. }
            | ProxyError::BackendTimeout { tenant, .. }
            | ProxyError::UpgradeHandshakeFailed { tenant, .. } => tenant,
            ProxyError::StreamInterrupted => "",
        }
    }

    /// Human hint for conditions where the contract includes one.
    fn message(&self) -> Option<&'static str> {
        match self {
            ProxyError::TenantNotProvisioned(_) => {
                Some("no backend port has been assigned yet; contact the operator")
            }
            ProxyError::BackendConnectFailed { .. }
            | ProxyError::BackendTimeout { .. }
            | ProxyError::UpgradeHandshakeFailed { .. } => {
                Some("the instance backend is unreachable; check that it is running")
            }
            _ => None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    tenant_id: &'a str,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code(),
            message: self.message(),
            tenant_id: self.tenant(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_and_code_mapping() {
        let not_found = ProxyError::TenantNotFound("ghost".into());
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.code(), "tenant_not_found");

        let unprovisioned = ProxyError::TenantNotProvisioned("alice".into());
        assert_eq!(unprovisioned.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(unprovisioned.code(), "instance_not_provisioned");
        assert_ne!(unprovisioned.code(), not_found.code());

        let timeout = ProxyError::BackendTimeout {
            tenant: "alice".into(),
            timeout_secs: 60,
        };
        assert_eq!(timeout.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(timeout.code(), "instance_unreachable");
    }

    #[test]
    fn body_carries_tenant_and_code() {
        let err = ProxyError::TenantNotFound("ghost".into());
        let body = serde_json::to_value(ErrorBody {
            error: err.code(),
            message: err.message(),
            tenant_id: err.tenant(),
        })
        .expect("error body serializes");

        assert_eq!(body["error"], "tenant_not_found");
        assert_eq!(body["tenantId"], "ghost");
        assert!(body.get("message").is_none());
    }
}
