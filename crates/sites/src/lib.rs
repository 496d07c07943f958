//! TenantSite public host router
//!
//! Serves tenant landing pages on verified custom domains and sends every
//! other host back to the platform app.

pub mod cache;
pub mod config;
pub mod lookup;
pub mod pages;
pub mod resolver;
pub mod router;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

pub use config::SitesConfig;
pub use resolver::{HostResolver, Resolution, ResolvedSite};

#[derive(Clone)]
pub struct SitesState {
    pub config: Arc<SitesConfig>,
    pub resolver: HostResolver,
}

impl SitesState {
    pub fn new(config: SitesConfig) -> Self {
        let cache = Arc::new(cache::SiteCache::with_ttl(config.cache_ttl));
        let resolver = HostResolver::new(
            lookup::RecordLookup::new(config.api_url.clone()),
            cache,
            config.app_host.clone(),
        );
        Self {
            config: Arc::new(config),
            resolver,
        }
    }
}

pub fn create_router(state: SitesState) -> Router {
    Router::new()
        .route("/health", get(pages::health))
        .route("/", get(pages::tenant_page))
        .route("/*path", get(pages::tenant_page))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            router::host_router,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
