//! Host-to-tenant resolution
//!
//! A host is servable only when its record exists and is `verified`.
//! Everything else, including lookup failures, sends the visitor back to
//! the platform app.

use std::sync::Arc;

use tracing::debug;

use tenantsite_shared::{
    hostname::{is_valid_domain, normalize_host},
    DomainStatus, TenantId,
};

use crate::cache::SiteCache;
use crate::lookup::{LookupError, RecordLookup};

/// A verified custom domain and its tenant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSite {
    pub domain: String,
    pub tenant_id: TenantId,
}

/// What to do with a request for a given host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The platform app's own host; not handled here
    AppHost,
    Site(ResolvedSite),
    /// Unknown or unverified host
    Redirect,
}

#[derive(Clone)]
pub struct HostResolver {
    lookup: RecordLookup,
    cache: Arc<SiteCache>,
    app_host: String,
}

impl HostResolver {
    pub fn new(lookup: RecordLookup, cache: Arc<SiteCache>, app_host: impl Into<String>) -> Self {
        Self {
            lookup,
            cache,
            app_host: app_host.into(),
        }
    }

    pub fn cache(&self) -> &SiteCache {
        &self.cache
    }

    /// Resolve a raw `Host` header value
    pub async fn resolve(&self, host: &str) -> Result<Resolution, LookupError> {
        let host = normalize_host(host);

        if host == self.app_host {
            return Ok(Resolution::AppHost);
        }

        if !is_valid_domain(&host) {
            debug!(host = %host, "Malformed host, skipping lookup");
            return Ok(Resolution::Redirect);
        }

        if let Some(cached) = self.cache.get(&host) {
            return Ok(cached.map_or(Resolution::Redirect, Resolution::Site));
        }

        let site = self
            .lookup
            .find(&host)
            .await?
            .filter(|record| record.status == DomainStatus::Verified)
            .map(|record| ResolvedSite {
                domain: record.domain,
                tenant_id: record.tenant_id,
            });

        self.cache.set(&host, site.clone());
        Ok(site.map_or(Resolution::Redirect, Resolution::Site))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Server, ServerGuard};
    use serde_json::json;
    use std::time::Duration;

    fn record_json(domain: &str, status: &str) -> String {
        json!({
            "id": uuid::Uuid::new_v4(),
            "domain": domain,
            "tenantId": uuid::Uuid::new_v4(),
            "status": status,
            "verificationToken": "abc",
            "createdAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-01-01T00:00:00Z"
        })
        .to_string()
    }

    fn resolver(server: &ServerGuard) -> HostResolver {
        HostResolver::new(
            RecordLookup::new(server.url()),
            Arc::new(SiteCache::with_ttl(Duration::from_secs(60))),
            "app.platform.com",
        )
    }

    #[tokio::test]
    async fn test_app_host_is_not_looked_up() {
        let mut server = Server::new_async().await;
        let any = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let resolver = resolver(&server);
        assert_eq!(
            resolver.resolve("APP.platform.com:443").await.unwrap(),
            Resolution::AppHost
        );
        assert_eq!(
            resolver.resolve("bad host!").await.unwrap(),
            Resolution::Redirect
        );
        any.assert_async().await;
    }

    #[tokio::test]
    async fn test_verified_host_resolves_and_is_cached() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/records/shop.example.com")
            .with_status(200)
            .with_body(record_json("shop.example.com", "verified"))
            .expect(1)
            .create_async()
            .await;

        let resolver = resolver(&server);
        for _ in 0..3 {
            let resolution = resolver.resolve("Shop.Example.com:8080").await.unwrap();
            assert!(matches!(resolution, Resolution::Site(ref s) if s.domain == "shop.example.com"));
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_pending_and_unknown_hosts_redirect() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/records/pending.example.com")
            .with_status(200)
            .with_body(record_json("pending.example.com", "pending"))
            .create_async()
            .await;
        let unknown = server
            .mock("GET", "/records/unknown.example.com")
            .with_status(404)
            .with_body(r#"{"error":"Domain not found"}"#)
            .expect(1)
            .create_async()
            .await;

        let resolver = resolver(&server);
        assert_eq!(
            resolver.resolve("pending.example.com").await.unwrap(),
            Resolution::Redirect
        );
        assert_eq!(
            resolver.resolve("unknown.example.com").await.unwrap(),
            Resolution::Redirect
        );
        // negative result served from cache
        assert_eq!(
            resolver.resolve("unknown.example.com").await.unwrap(),
            Resolution::Redirect
        );
        unknown.assert_async().await;
    }

    #[tokio::test]
    async fn test_lookup_errors_are_not_cached() {
        let mut server = Server::new_async().await;
        let failing = server
            .mock("GET", "/records/shop.example.com")
            .with_status(502)
            .expect(2)
            .create_async()
            .await;

        let resolver = resolver(&server);
        assert!(matches!(
            resolver.resolve("shop.example.com").await,
            Err(LookupError::Status(502))
        ));
        assert!(resolver.resolve("shop.example.com").await.is_err());
        assert!(resolver.cache().is_empty());
        failing.assert_async().await;
    }
}
