//! Host router configuration

use std::env;
use std::time::Duration;

use url::Url;

use crate::cache::DEFAULT_CACHE_TTL;

#[derive(Debug, Clone)]
pub struct SitesConfig {
    pub bind_address: String,
    /// Platform app URL; unknown hosts are redirected here
    pub app_url: String,
    /// Host of `APP_URL`, passed through untouched
    pub app_host: String,
    /// TenantSite API base URL for record lookups
    pub api_url: String,
    pub cache_ttl: Duration,
}

impl SitesConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let app_url = env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let app_host = Url::parse(&app_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
            .ok_or(ConfigError::InvalidUrl("APP_URL"))?;

        let api_url = env::var("API_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
        Url::parse(&api_url).map_err(|_| ConfigError::InvalidUrl("API_URL"))?;

        Ok(Self {
            bind_address: env::var("SITES_BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:3001".to_string()),
            app_url: app_url.trim_end_matches('/').to_string(),
            app_host,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache_ttl: env::var("SITES_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CACHE_TTL),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid URL in environment variable: {0}")]
    InvalidUrl(&'static str),
}
