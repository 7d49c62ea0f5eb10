//! Configuration validation.
//!
//! A config is rejected as a whole before it is applied; every problem is
//! reported, not just the first.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::routing::is_valid_tenant_id;

/// A single configuration problem.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("listener bind address {0:?} is not a valid socket address")]
    InvalidBindAddress(String),

    #[error("metrics address {0:?} is not a valid socket address")]
    InvalidMetricsAddress(String),

    #[error("unified entry is enabled but the edge domain is empty")]
    EmptyEdgeDomain,

    #[error("unified entry is enabled but the edge port is 0")]
    ZeroEdgePort,

    #[error("timeout {name} must be greater than zero")]
    ZeroTimeout { name: &'static str },

    #[error("admin API is enabled but the api key is empty")]
    EmptyAdminKey,

    #[error("seeded tenant id {0:?} is not a valid token")]
    InvalidTenantSeed(String),

    #[error("forwarding endpoint {id} has an empty address")]
    EmptyForwardingAddress { id: u64 },
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.edge.enabled {
        if config.edge.domain.is_empty() {
            errors.push(ValidationError::EmptyEdgeDomain);
        }
        if config.edge.port == 0 {
            errors.push(ValidationError::ZeroEdgePort);
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout {
            name: "connect_secs",
        });
    }
    if config.timeouts.idle_secs == 0 {
        errors.push(ValidationError::ZeroTimeout { name: "idle_secs" });
    }

    if config.admin.enabled && config.admin.api_key.is_empty() {
        errors.push(ValidationError::EmptyAdminKey);
    }

    for tenant in &config.tenants {
        if !is_valid_tenant_id(&tenant.tenant_id) {
            errors.push(ValidationError::InvalidTenantSeed(tenant.tenant_id.clone()));
        }
    }

    for endpoint in &config.forwarding {
        if endpoint.address.is_empty() {
            errors.push(ValidationError::EmptyForwardingAddress { id: endpoint.id });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{AllocationRecord, InstanceStatus};

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn rejects_bad_bind_address_and_zero_timeouts() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.idle_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ValidationError::InvalidBindAddress(_)));
        assert!(matches!(errors[1], ValidationError::ZeroTimeout { name: "idle_secs" }));
    }

    #[test]
    fn rejects_enabled_edge_without_domain() {
        let mut config = GatewayConfig::default();
        config.edge.enabled = true;
        config.edge.domain = String::new();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|error| matches!(error, ValidationError::EmptyEdgeDomain)));
    }

    #[test]
    fn rejects_invalid_tenant_seed() {
        let mut config = GatewayConfig::default();
        config.tenants.push(AllocationRecord {
            tenant_id: "../etc".into(),
            port: Some(4001),
            status: InstanceStatus::Running,
        });

        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidTenantSeed(_)));
    }

    #[test]
    fn rejects_enabled_admin_without_key() {
        let mut config = GatewayConfig::default();
        config.admin.enabled = true;
        config.admin.api_key = String::new();

        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::EmptyAdminKey));
    }
}
