//! Access URL composition.
//!
//! Builds the user-facing URLs for a tenant instance from the same data
//! the proxy routes on: the allocated port, the unified-entry settings,
//! and the registered forwarding endpoints. Pure formatting and
//! aggregation; a broken forwarding lookup can shrink the alternative
//! list but never fail the primary URL.

use serde::Serialize;

use crate::config::EdgeConfig;
use crate::directory::ForwardingEndpoints;
use crate::routing::INSTANCE_SUBPATH;

/// URLs a tenant can reach their instance on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessUrls {
    /// Primary access address.
    pub main_url: String,

    /// Alternate addresses via registered forwarding endpoints, shown for
    /// display/fallback only.
    pub alternative_urls: Vec<AlternativeUrl>,
}

/// One alternate address, labeled with its endpoint's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeUrl {
    pub url: String,
    pub is_active: bool,
    pub endpoint_id: u64,
}

/// Compose the access URLs for a tenant.
///
/// With unified entry enabled the primary URL goes through the shared
/// domain; otherwise it points at the tenant's own port directly. A tenant
/// without an assigned port in direct mode gets an empty primary URL.
pub fn generate_access_url(
    tenant_id: &str,
    port: Option<u16>,
    edge: &EdgeConfig,
    forwarding: &dyn ForwardingEndpoints,
) -> AccessUrls {
    let main_url = if edge.enabled {
        let port_part = if edge.port == 80 {
            String::new()
        } else {
            format!(":{}", edge.port)
        };
        format!(
            "http://{}{}/{}/{}/",
            edge.domain, port_part, tenant_id, INSTANCE_SUBPATH
        )
    } else {
        port.map(|p| format!("http://localhost:{p}")).unwrap_or_default()
    };

    let alternative_urls = match forwarding.list_endpoints() {
        Ok(endpoints) => endpoints
            .into_iter()
            .map(|endpoint| {
                let address = endpoint.address.to_ascii_lowercase();
                let base = if address.starts_with("http://") || address.starts_with("https://") {
                    endpoint.address.clone()
                } else {
                    format!("http://{}", endpoint.address)
                };
                AlternativeUrl {
                    url: format!(
                        "{}:{}/{}/{}/",
                        base, endpoint.port, tenant_id, INSTANCE_SUBPATH
                    ),
                    is_active: endpoint.active,
                    endpoint_id: endpoint.id,
                }
            })
            .collect(),
        Err(error) => {
            tracing::warn!(error = %error, "forwarding endpoint lookup failed, omitting alternates");
            Vec::new()
        }
    };

    AccessUrls {
        main_url,
        alternative_urls,
    }
}
