//! Host and domain name helpers

/// Normalize a user-supplied domain: trim, drop a trailing dot, lowercase
pub fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Normalize a host header value
pub fn normalize_host(host: &str) -> String {
    // Remove port if present
    let host = host.split(':').next().unwrap_or(host);
    normalize_domain(host)
}

/// True when `domain` names the platform's own application host
pub fn is_reserved(domain: &str, reserved_host: &str) -> bool {
    !reserved_host.is_empty() && normalize_domain(domain) == normalize_domain(reserved_host)
}

/// Validate domain format
pub fn is_valid_domain(domain: &str) -> bool {
    // At least one dot, no spaces, alphanumeric + hyphen labels
    if domain.is_empty() || domain.len() > 253 {
        return false;
    }

    let parts: Vec<&str> = domain.split('.').collect();
    if parts.len() < 2 {
        return false;
    }

    for part in parts {
        if part.is_empty() || part.len() > 63 {
            return false;
        }
        if part.starts_with('-') || part.ends_with('-') {
            return false;
        }
        if !part.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("  Example.COM "), "example.com");
        assert_eq!(normalize_domain("example.com."), "example.com");
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("Example.COM"), "example.com");
        assert_eq!(normalize_host("example.com:8080"), "example.com");
        assert_eq!(normalize_host("EXAMPLE.COM:443"), "example.com");
    }

    #[test]
    fn test_is_reserved() {
        assert!(is_reserved("app.platform.com", "app.platform.com"));
        assert!(is_reserved("APP.Platform.com", "app.platform.com"));
        assert!(is_reserved("app.platform.com.", "app.platform.com"));
        assert!(!is_reserved("shop.platform.com", "app.platform.com"));
        assert!(!is_reserved("example.com", ""));
    }

    #[test]
    fn test_is_valid_domain() {
        assert!(is_valid_domain("example.com"));
        assert!(is_valid_domain("mcp.my-company.co.uk"));

        assert!(!is_valid_domain(""));
        assert!(!is_valid_domain("localhost"));
        assert!(!is_valid_domain("-bad.example.com"));
        assert!(!is_valid_domain("bad-.example.com"));
        assert!(!is_valid_domain("two..dots.com"));
        assert!(!is_valid_domain("under_score.com"));
        assert!(!is_valid_domain("space here.com"));
        assert!(!is_valid_domain(&format!("{}.com", "a".repeat(64))));
    }
}
