//! Tenant-scoped route handling.
//!
//! # Data Flow
//! ```text
//! inbound path "/{tenant}/st/..."
//!     → tenant.rs   (token validation)
//!     → resolver.rs (directory lookup → fresh backend address)
//!     → rewrite.rs  (strip tenant prefix → backend-facing path)
//! ```
//!
//! All of this is pure and non-blocking; the only I/O on the request hot
//! path happens in the HTTP/WebSocket forwarding layers.

pub mod resolver;
pub mod rewrite;
pub mod tenant;

pub use resolver::{resolve_backend, ResolvedBackend};
pub use rewrite::{match_tenant_route, rewrite_path, INSTANCE_SUBPATH};
pub use tenant::is_valid_tenant_id;
