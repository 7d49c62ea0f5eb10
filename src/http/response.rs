//! Response transformation.
//!
//! The backend response streams through untouched except for one addition:
//! the tenant context cookie, so later requests from the same client can be
//! correlated in logs and telemetry. The cookie is never read back for
//! routing; selection stays purely path-driven.

use axum::body::Body;
use axum::http::{header, HeaderValue, Response};
use axum::response::Response as AxumResponse;

/// Cookie correlating a client with the tenant instance it talked to.
pub const TENANT_CONTEXT_COOKIE: &str = "st_context";

/// Context cookie lifetime: one day.
pub const TENANT_COOKIE_MAX_AGE_SECS: u64 = 86_400;

/// `Set-Cookie` value scoping the tenant context to the whole site.
pub(crate) fn tenant_cookie(tenant: &str) -> String {
    format!(
        "{TENANT_CONTEXT_COOKIE}={tenant}; Path=/; Max-Age={TENANT_COOKIE_MAX_AGE_SECS}; SameSite=Lax"
    )
}

/// Convert a backend response into the client-facing response, streaming
/// the body through and appending the tenant context cookie.
pub(crate) fn finalize_response<B>(upstream: Response<B>, tenant: &str) -> AxumResponse
where
    B: hyper::body::Body<Data = axum::body::Bytes> + Send + 'static,
    B::Error: Into<axum::BoxError>,
{
    let (parts, body) = upstream.into_parts();
    let mut response = Response::from_parts(parts, Body::new(body));
    if let Ok(value) = HeaderValue::from_str(&tenant_cookie(tenant)) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}
