//! Multi-tenant instance gateway library.
//!
//! Routes inbound HTTP and WebSocket traffic for many tenants, each with
//! an isolated backend instance on a private port, through one public
//! entry point. The tenant is encoded in the request path; the backend is
//! resolved fresh on every request.

pub mod access_url;
pub mod admin;
pub mod config;
pub mod directory;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
