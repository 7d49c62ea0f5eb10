//! Registered forwarding endpoints.
//!
//! Forwarding endpoints are alternate public addresses through which a
//! tenant's instance may also be reached. They are display-only input for
//! the access URL composer and never participate in routing.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One externally registered forwarding server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardingEndpoint {
    /// Stable endpoint identifier.
    pub id: u64,

    /// Public address, with or without an `http(s)://` scheme prefix.
    pub address: String,

    /// Public port the endpoint listens on.
    pub port: u16,

    /// Whether the endpoint is currently serving traffic.
    #[serde(default)]
    pub active: bool,
}

/// Errors from the forwarding-endpoint source.
#[derive(Debug, Error)]
pub enum ForwardingError {
    /// The endpoint list could not be fetched.
    #[error("forwarding endpoint list unavailable: {0}")]
    Unavailable(String),
}

/// Source of the registered forwarding-endpoint list.
///
/// A failing source degrades URL composition to an empty alternative list;
/// it never fails primary URL generation.
pub trait ForwardingEndpoints: Send + Sync {
    fn list_endpoints(&self) -> Result<Vec<ForwardingEndpoint>, ForwardingError>;
}

/// Endpoint store backed by a concurrent map, mutated via the admin API.
#[derive(Debug, Default)]
pub struct InMemoryForwarding {
    endpoints: DashMap<u64, ForwardingEndpoint>,
}

impl InMemoryForwarding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(endpoints: impl IntoIterator<Item = ForwardingEndpoint>) -> Self {
        let store = Self::new();
        for endpoint in endpoints {
            store.upsert(endpoint);
        }
        store
    }

    pub fn upsert(&self, endpoint: ForwardingEndpoint) {
        self.endpoints.insert(endpoint.id, endpoint);
    }

    pub fn remove(&self, id: u64) -> Option<ForwardingEndpoint> {
        self.endpoints.remove(&id).map(|(_, endpoint)| endpoint)
    }
}

impl ForwardingEndpoints for InMemoryForwarding {
    fn list_endpoints(&self) -> Result<Vec<ForwardingEndpoint>, ForwardingError> {
        let mut endpoints: Vec<ForwardingEndpoint> =
            self.endpoints.iter().map(|entry| entry.value().clone()).collect();
        endpoints.sort_by_key(|endpoint| endpoint.id);
        Ok(endpoints)
    }
}
