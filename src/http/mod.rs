//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs    (Axum setup, dispatcher)
//!     → request.rs   (request ID, outbound header/cookie injection)
//!     → [routing resolves the tenant backend]
//!     → websocket.rs (upgrade requests: backend handshake + byte pipe)
//!     → response.rs  (stream through, tenant context cookie)
//!     → Send to client
//! ```

pub mod error;
pub mod request;
pub mod response;
pub mod server;
pub mod websocket;

pub use error::{ProxyError, ProxyResult};
pub use request::{RequestId, RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
