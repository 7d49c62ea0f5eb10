//! Tenant token validation.
//!
//! A tenant id is taken from an untrusted URL segment and later used in
//! directory lookups, header values, and URL composition. It must be a
//! syntactically safe token before any of that happens.

/// Upper bound on tenant identifier length.
pub const MAX_TENANT_ID_LEN: usize = 64;

/// Returns true if `raw` is a safe tenant token.
///
/// Accepts ASCII alphanumerics, `_` and `-`. Everything else (path
/// traversal dots, control characters, percent escapes, non-ASCII) is
/// rejected before resolution is attempted.
pub fn is_valid_tenant_id(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= MAX_TENANT_ID_LEN
        && raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_tokens() {
        assert!(is_valid_tenant_id("alice"));
        assert!(is_valid_tenant_id("user_01"));
        assert!(is_valid_tenant_id("a-b-c"));
    }

    #[test]
    fn rejects_empty_and_oversized() {
        assert!(!is_valid_tenant_id(""));
        assert!(!is_valid_tenant_id(&"x".repeat(MAX_TENANT_ID_LEN + 1)));
    }

    #[test]
    fn rejects_traversal_and_control_characters() {
        assert!(!is_valid_tenant_id(".."));
        assert!(!is_valid_tenant_id("a/b"));
        assert!(!is_valid_tenant_id("a.b"));
        assert!(!is_valid_tenant_id("a%2eb"));
        assert!(!is_valid_tenant_id("a\u{0}b"));
        assert!(!is_valid_tenant_id("Ã¼ser"));
    }
}
