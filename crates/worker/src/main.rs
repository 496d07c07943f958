//! TenantSite background worker
//!
//! Periodically reconciles pending custom domains with the registrar.

mod config;
mod reconcile_job;

use std::sync::Arc;

use anyhow::Context;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;

use tenantsite_api::{registrar::RegistrarClient, ReconciliationService};
use tenantsite_shared::{
    create_pool, shutdown::shutdown_signal, telemetry::init_tracing, PgRecordStore, Records,
};

use crate::config::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("tenantsite_worker=info,tenantsite_api=info,tenantsite_shared=info");

    let config = WorkerConfig::from_env().context("Failed to load configuration")?;
    let pool = create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to connect to database")?;

    let records = Records::new(Arc::new(PgRecordStore::new(pool)), config.app_host.clone());
    let registrar = RegistrarClient::new(config.registrar.clone(), config.app_host.clone());
    let reconciler = ReconciliationService::new(registrar, Some(records.clone()));

    let mut scheduler = JobScheduler::new()
        .await
        .context("Failed to create scheduler")?;

    let job = Job::new_repeated_async(config.reconcile_interval, move |_id, _scheduler| {
        let records = records.clone();
        let reconciler = reconciler.clone();
        Box::pin(async move {
            reconcile_job::reconcile_pending(&records, &reconciler).await;
        })
    })
    .context("Failed to create reconciliation job")?;

    scheduler
        .add(job)
        .await
        .context("Failed to schedule reconciliation job")?;
    scheduler.start().await.context("Failed to start scheduler")?;

    info!(
        interval_secs = config.reconcile_interval.as_secs(),
        "Worker started"
    );

    shutdown_signal().await;
    scheduler
        .shutdown()
        .await
        .context("Failed to stop scheduler")?;
    info!("Worker stopped");
    Ok(())
}
