//! TenantSite public host router

use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use tenantsite_shared::{shutdown::shutdown_signal, telemetry::init_tracing};
use tenantsite_sites::{create_router, SitesConfig, SitesState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("tenantsite_sites=info,tower_http=info");

    let config = SitesConfig::from_env().context("Failed to load configuration")?;
    let bind_address = config.bind_address.clone();
    let ttl = config.cache_ttl;
    info!(app_url = %config.app_url, api_url = %config.api_url, cache_ttl_secs = ttl.as_secs(), "Configuration loaded");

    let state = SitesState::new(config);

    let resolver = state.resolver.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(ttl.max(Duration::from_secs(1)));
        loop {
            interval.tick().await;
            resolver.cache().cleanup();
        }
    });

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    info!("Host router running on {bind_address}");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
