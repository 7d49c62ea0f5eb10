//! Tenant directory subsystem.
//!
//! The directory is the gateway's view of which tenant owns which backend
//! port. It is mutated by the supervisor (startup seeding and the admin
//! API); the proxy hot path only reads per-request snapshots.
//!
//! # Design Decisions
//! - Lock-free concurrent reads via `DashMap` (no global lock on the hot path)
//! - Lookups clone the record out, so a reallocation between requests is
//!   always observed and an in-flight request keeps its original target
//! - Port `None` or `Some(0)` means "registered but not yet provisioned"

pub mod forwarding;
pub mod memory;

pub use forwarding::{ForwardingEndpoint, ForwardingEndpoints, ForwardingError, InMemoryForwarding};
pub use memory::InMemoryDirectory;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a tenant's backend instance, as last reported by the
/// supervisor. Informational only: routing never gates on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    Running,
    Starting,
    Stopped,
    #[default]
    Unknown,
}

/// The directory's current knowledge of one tenant's backend allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRecord {
    /// Tenant identifier (first path segment of tenant-scoped routes).
    pub tenant_id: String,

    /// Private backend port. `None` (or `Some(0)`) means not yet provisioned.
    #[serde(default)]
    pub port: Option<u16>,

    /// Last reported instance state.
    #[serde(default)]
    pub status: InstanceStatus,
}

impl AllocationRecord {
    /// The usable backend port, treating 0 as unassigned.
    pub fn assigned_port(&self) -> Option<u16> {
        self.port.filter(|p| *p != 0)
    }
}

/// Read-only lookup interface the proxy core depends on.
///
/// Must be cheap and callable synchronously from the request hot path;
/// implementations are expected to support unlimited concurrent readers.
pub trait TenantDirectory: Send + Sync {
    /// Fetch the current allocation snapshot for a tenant, if registered.
    fn lookup(&self, tenant_id: &str) -> Option<AllocationRecord>;

    /// Snapshot of all current allocations, ordered by tenant id.
    fn list(&self) -> Vec<AllocationRecord>;
}
