//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID as early as possible for tracing
//! - Prepare the outbound request for forwarding to the tenant backend:
//!   rewritten URI, backend `Host`, tenant identity headers, augmented
//!   cookie header
//!
//! The original request is left untouched for logging; a modified copy is
//! what travels upstream.

use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{header, HeaderValue, Request, Uri};
use tower::{Layer, Service};
use uuid::Uuid;

use crate::http::response::TENANT_CONTEXT_COOKIE;
use crate::routing::{rewrite_path, ResolvedBackend};

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Header preserving the client-facing `Host` for the backend.
pub const X_ORIGINAL_HOST: &str = "x-original-host";

/// Header carrying the originating client address.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Tenant identity header for backend-side tracing.
pub const X_ST_USER: &str = "x-st-user";

/// Correlation ID attached to every inbound request.
#[derive(Debug, Clone)]
pub struct RequestId(Arc<str>);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Convenience accessor for the request ID stored in request extensions.
pub trait RequestIdExt {
    fn request_id(&self) -> &str;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> &str {
        self.extensions()
            .get::<RequestId>()
            .map(RequestId::as_str)
            .unwrap_or("unknown")
    }
}

/// Tower layer that assigns a UUID v4 request ID to each request, unless
/// the client already supplied one.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for RequestIdService<S>
where
    S: Service<Request<Body>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let id = match request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|value| value.to_str().ok())
        {
            Some(existing) => existing.to_string(),
            None => {
                let generated = Uuid::new_v4().to_string();
                if let Ok(value) = HeaderValue::from_str(&generated) {
                    request.headers_mut().insert(X_REQUEST_ID, value);
                }
                generated
            }
        };
        request.extensions_mut().insert(RequestId(Arc::from(id)));
        self.inner.call(request)
    }
}

/// Append the tenant context cookie to whatever cookies the client sent.
/// Existing cookies are preserved, never replaced.
pub(crate) fn augment_cookie_header(existing: Option<&HeaderValue>, tenant: &str) -> HeaderValue {
    let context = format!("{TENANT_CONTEXT_COOKIE}={tenant}");
    let combined = match existing.and_then(|value| value.to_str().ok()) {
        Some(cookies) if !cookies.is_empty() => format!("{cookies}; {context}"),
        _ => context.clone(),
    };
    HeaderValue::from_str(&combined)
        .unwrap_or_else(|_| HeaderValue::from_str(&context).expect("tenant token is ascii"))
}

/// Build the upstream request for a resolved backend: rewritten path, the
/// backend as `Host`, identity headers, and the streamed inbound body.
pub(crate) fn build_upstream_request(
    parts: axum::http::request::Parts,
    body: Body,
    tenant: &str,
    backend: &ResolvedBackend,
    client_ip: IpAddr,
) -> Request<Body> {
    let rewritten = rewrite_path(parts.uri.path(), tenant);
    let path_and_query = match parts.uri.query() {
        Some(query) => format!("{rewritten}?{query}"),
        None => rewritten,
    };

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Authority::from_str(&backend.authority()).ok();
    uri_parts.path_and_query = PathAndQuery::from_str(&path_and_query).ok();
    let uri = Uri::from_parts(uri_parts).unwrap_or_else(|_| parts.uri.clone());

    let mut headers = parts.headers;
    let original_host = headers.get(header::HOST).cloned();

    if let Ok(value) = HeaderValue::from_str(&backend.authority()) {
        headers.insert(header::HOST, value);
    }
    if let Some(host) = original_host {
        headers.insert(X_ORIGINAL_HOST, host);
    }
    if let Ok(value) = HeaderValue::from_str(&client_ip.to_string()) {
        headers.insert(X_FORWARDED_FOR, value);
    }
    if let Ok(value) = HeaderValue::from_str(tenant) {
        headers.insert(X_ST_USER, value);
    }
    let cookie = augment_cookie_header(headers.get(header::COOKIE), tenant);
    headers.insert(header::COOKIE, cookie);

    let mut upstream = Request::new(body);
    *upstream.method_mut() = parts.method;
    *upstream.uri_mut() = uri;
    *upstream.headers_mut() = headers;
    upstream
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{AllocationRecord, InMemoryDirectory, InstanceStatus};
    use crate::routing::resolve_backend;

    fn resolved(port: u16) -> ResolvedBackend {
        let directory = InMemoryDirectory::seed([AllocationRecord {
            tenant_id: "alice".into(),
            port: Some(port),
            status: InstanceStatus::Running,
        }]);
        resolve_backend(&directory, "alice").expect("alice is provisioned")
    }

    #[test]
    fn cookie_is_appended_not_replaced() {
        let existing = HeaderValue::from_static("session=abc; theme=dark");
        let value = augment_cookie_header(Some(&existing), "alice");
        assert_eq!(value.to_str().unwrap(), "session=abc; theme=dark; st_context=alice");
    }

    #[test]
    fn cookie_without_existing_header() {
        let value = augment_cookie_header(None, "alice");
        assert_eq!(value.to_str().unwrap(), "st_context=alice");
    }

    #[test]
    fn upstream_request_rewrites_uri_and_injects_headers() {
        let inbound = Request::builder()
            .method("POST")
            .uri("http://gateway.example.com/alice/st/api/chat?stream=true")
            .header(header::HOST, "gateway.example.com")
            .header(header::COOKIE, "session=abc")
            .body(Body::empty())
            .unwrap();
        let (parts, body) = inbound.into_parts();

        let upstream = build_upstream_request(
            parts,
            body,
            "alice",
            &resolved(4001),
            "203.0.113.9".parse().unwrap(),
        );

        assert_eq!(upstream.uri().to_string(), "http://127.0.0.1:4001/api/chat?stream=true");
        let headers = upstream.headers();
        assert_eq!(headers.get(header::HOST).unwrap(), "127.0.0.1:4001");
        assert_eq!(headers.get(X_ORIGINAL_HOST).unwrap(), "gateway.example.com");
        assert_eq!(headers.get(X_FORWARDED_FOR).unwrap(), "203.0.113.9");
        assert_eq!(headers.get(X_ST_USER).unwrap(), "alice");
        assert_eq!(
            headers.get(header::COOKIE).unwrap(),
            "session=abc; st_context=alice"
        );
    }
}
