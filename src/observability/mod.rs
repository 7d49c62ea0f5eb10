//! Observability subsystem.
//!
//! Structured logs go through `tracing` with tenant and request-id fields
//! attached at the call sites; this module only hosts the Prometheus
//! metrics endpoint and recording helpers.

pub mod metrics;
