use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::access_url::{generate_access_url, AccessUrls};
use crate::directory::{
    AllocationRecord, ForwardingEndpoint, ForwardingEndpoints, InstanceStatus, TenantDirectory,
};
use crate::http::error::ProxyError;
use crate::http::server::AppState;
use crate::routing::is_valid_tenant_id;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Deserialize)]
pub struct UpsertTenant {
    pub port: Option<u16>,
    #[serde(default)]
    pub status: InstanceStatus,
}

#[derive(Deserialize)]
pub struct UpsertForwarding {
    pub address: String,
    pub port: u16,
    #[serde(default)]
    pub active: bool,
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

pub async fn list_tenants(State(state): State<AppState>) -> Json<Vec<AllocationRecord>> {
    Json(state.directory.list())
}

pub async fn upsert_tenant(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Json(body): Json<UpsertTenant>,
) -> Result<Json<AllocationRecord>, ProxyError> {
    if !is_valid_tenant_id(&tenant_id) {
        return Err(ProxyError::InvalidTenantToken(tenant_id));
    }

    let record = AllocationRecord {
        tenant_id,
        port: body.port,
        status: body.status,
    };
    state.directory.upsert(record.clone());

    tracing::info!(
        tenant = %record.tenant_id,
        port = ?record.port,
        "tenant allocation updated"
    );
    Ok(Json(record))
}

pub async fn remove_tenant(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Result<Json<AllocationRecord>, ProxyError> {
    match state.directory.remove(&tenant_id) {
        Some(record) => {
            tracing::info!(tenant = %record.tenant_id, "tenant allocation removed");
            Ok(Json(record))
        }
        None => Err(ProxyError::TenantNotFound(tenant_id)),
    }
}

pub async fn tenant_access_urls(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Result<Json<AccessUrls>, ProxyError> {
    let record = state
        .directory
        .lookup(&tenant_id)
        .ok_or(ProxyError::TenantNotFound(tenant_id))?;

    // Edge settings are read from the live snapshot on every invocation.
    let config = state.config.load();
    let urls = generate_access_url(
        &record.tenant_id,
        record.assigned_port(),
        &config.edge,
        state.forwarding.as_ref(),
    );
    Ok(Json(urls))
}

pub async fn list_forwarding(State(state): State<AppState>) -> Json<Vec<ForwardingEndpoint>> {
    Json(state.forwarding.list_endpoints().unwrap_or_default())
}

pub async fn upsert_forwarding(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<UpsertForwarding>,
) -> Json<ForwardingEndpoint> {
    let endpoint = ForwardingEndpoint {
        id,
        address: body.address,
        port: body.port,
        active: body.active,
    };
    state.forwarding.upsert(endpoint.clone());

    tracing::info!(endpoint = endpoint.id, "forwarding endpoint updated");
    Json(endpoint)
}

pub async fn remove_forwarding(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ForwardingEndpoint>, StatusCode> {
    match state.forwarding.remove(id) {
        Some(endpoint) => {
            tracing::info!(endpoint = endpoint.id, "forwarding endpoint removed");
            Ok(Json(endpoint))
        }
        None => Err(StatusCode::NOT_FOUND),
    }
}
