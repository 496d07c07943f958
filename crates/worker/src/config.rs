//! Worker configuration

use std::env;
use std::time::Duration;

use url::Url;

use tenantsite_api::registrar::{RegistrarConfig, DEFAULT_REGISTRAR_API_URL};

/// Default time between reconciliation passes (5 minutes)
const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    /// Host of `APP_URL`; reserved, never a tenant domain
    pub app_host: String,
    pub registrar: RegistrarConfig,
    pub reconcile_interval: Duration,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let app_url = env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let app_host = Url::parse(&app_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
            .ok_or(ConfigError::InvalidUrl("APP_URL"))?;

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
            app_host,
            registrar: RegistrarConfig {
                api_url: env::var("REGISTRAR_API_URL")
                    .unwrap_or_else(|_| DEFAULT_REGISTRAR_API_URL.to_string()),
                api_token: env::var("REGISTRAR_API_TOKEN")
                    .map_err(|_| ConfigError::Missing("REGISTRAR_API_TOKEN"))?,
                project_id: env::var("REGISTRAR_PROJECT_ID")
                    .map_err(|_| ConfigError::Missing("REGISTRAR_PROJECT_ID"))?,
                team_id: env::var("REGISTRAR_TEAM_ID")
                    .ok()
                    .filter(|v| !v.trim().is_empty()),
            },
            reconcile_interval: env::var("RECONCILE_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_RECONCILE_INTERVAL),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid URL in environment variable: {0}")]
    InvalidUrl(&'static str),
}
