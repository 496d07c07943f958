//! TenantSite API server

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use tenantsite_api::{routes::create_router, AppState, Config};
use tenantsite_shared::{
    create_pool, run_migrations, shutdown::shutdown_signal, telemetry::init_tracing,
    PgRecordStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("tenantsite_api=info,tenantsite_shared=info,tower_http=info");

    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    let bind_address = config.bind_address.clone();
    info!(
        app_url = %config.app_url,
        registrar = %config.registrar.api_url,
        team_scoped = config.registrar.team_id.is_some(),
        "Configuration loaded"
    );

    let state = AppState::new(config, Arc::new(PgRecordStore::new(pool)))?;
    let app = create_router(state);

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    info!("API server running on {bind_address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
