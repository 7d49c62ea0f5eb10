//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! gateway. All types derive Serde traits for deserialization from config
//! files; every section has defaults so a bare file still boots.

use serde::{Deserialize, Serialize};

use crate::directory::{AllocationRecord, ForwardingEndpoint};

/// Root configuration for the instance gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Unified entry point settings for public URL composition.
    pub edge: EdgeConfig,

    /// Timeout configuration for backend exchanges.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Supervisor admin API settings.
    pub admin: AdminConfig,

    /// Tenant allocations seeded into the directory at startup.
    pub tenants: Vec<AllocationRecord>,

    /// Forwarding endpoints seeded at startup (display-only alternates).
    pub forwarding: Vec<ForwardingEndpoint>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Unified entry point configuration.
///
/// When enabled, all public traffic arrives on one `domain:port` and is
/// dispatched by path prefix; when disabled, tenants are reached directly
/// on their own ports. Read fresh from the live config snapshot on every
/// URL composition.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Enable path-based unified entry.
    pub enabled: bool,

    /// Public domain of the unified entry point.
    pub domain: String,

    /// Public port of the unified entry point; 80 is elided from URLs.
    pub port: u16,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            domain: "localhost".to_string(),
            port: 80,
        }
    }
}

/// Timeout configuration for talking to tenant backends.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Deadline for the backend to produce response headers, in seconds.
    /// Body streaming after that is never timed out.
    pub idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 60,
            idle_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Supervisor admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin surface.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}
