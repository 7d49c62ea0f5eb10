//! Tenant prefix matching and path rewriting.

/// Fixed subpath that scopes tenant instance traffic: `/{tenant}/st/...`.
pub const INSTANCE_SUBPATH: &str = "st";

/// Extract the tenant id from a tenant-scoped path.
///
/// Matches `/{tenant}/st` and `/{tenant}/st/...`; anything else is not
/// instance traffic and returns `None`. The returned token is raw and
/// still needs [`super::is_valid_tenant_id`].
pub fn match_tenant_route(path: &str) -> Option<&str> {
    let rest = path.strip_prefix('/')?;
    let (tenant, tail) = rest.split_once('/')?;
    let scoped = tail == INSTANCE_SUBPATH
        || tail.strip_prefix(INSTANCE_SUBPATH).is_some_and(|t| t.starts_with('/'));
    scoped.then_some(tenant)
}

/// Strip the `/{tenant}/st` prefix, producing the path the backend expects.
///
/// An empty remainder (with or without a trailing slash) becomes `/`. A
/// path that does not carry the prefix passes through unmodified; that is
/// a defensive default, not an error.
pub fn rewrite_path(path: &str, tenant: &str) -> String {
    let prefix = format!("/{tenant}/{INSTANCE_SUBPATH}");
    match path.strip_prefix(prefix.as_str()) {
        Some("") | Some("/") => "/".to_string(),
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_instance_routes_only() {
        assert_eq!(match_tenant_route("/alice/st"), Some("alice"));
        assert_eq!(match_tenant_route("/alice/st/"), Some("alice"));
        assert_eq!(match_tenant_route("/alice/st/api/chat"), Some("alice"));

        assert_eq!(match_tenant_route("/"), None);
        assert_eq!(match_tenant_route("/alice"), None);
        assert_eq!(match_tenant_route("/alice/status"), None);
        assert_eq!(match_tenant_route("/alice/other/st"), None);
    }

    #[test]
    fn strips_tenant_prefix() {
        assert_eq!(rewrite_path("/alice/st/api/chat", "alice"), "/api/chat");
        assert_eq!(rewrite_path("/alice/st/ws", "alice"), "/ws");
    }

    #[test]
    fn empty_suffix_rewrites_to_root() {
        assert_eq!(rewrite_path("/alice/st", "alice"), "/");
        assert_eq!(rewrite_path("/alice/st/", "alice"), "/");
    }

    #[test]
    fn missing_prefix_passes_through() {
        assert_eq!(rewrite_path("/health", "alice"), "/health");
        assert_eq!(rewrite_path("/bob/st/api", "alice"), "/bob/st/api");
    }
}
