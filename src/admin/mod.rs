//! Supervisor admin API.
//!
//! The tenant directory and forwarding-endpoint list are owned by the
//! external supervisor; this authenticated surface is where those writes
//! come in. The proxy hot path never goes through here.

pub mod auth;
pub mod handlers;

use std::time::Duration;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use tower_http::timeout::TimeoutLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

/// Admin routes, gated by bearer-token auth. Registered as static paths so
/// they take precedence over the tenant catch-all.
pub fn admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/tenants", get(list_tenants))
        .route(
            "/admin/tenants/{tenant_id}",
            put(upsert_tenant).delete(remove_tenant),
        )
        .route("/admin/tenants/{tenant_id}/urls", get(tenant_access_urls))
        .route("/admin/forwarding", get(list_forwarding))
        .route(
            "/admin/forwarding/{id}",
            put(upsert_forwarding).delete(remove_forwarding),
        )
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        .layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
