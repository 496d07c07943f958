//! Application configuration

use std::env;

use url::Url;

use crate::registrar::{RegistrarConfig, DEFAULT_REGISTRAR_API_URL};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,
    /// Platform dashboard URL, e.g. `https://app.platform.com`
    pub app_url: String,
    /// `APP_URL` as a CORS origin (scheme, host and port, no path)
    pub app_origin: String,
    /// Host of `APP_URL`; reserved, never a tenant domain
    pub app_host: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Authentication
    pub jwt_secret: String,

    // Registrar
    pub registrar: RegistrarConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let app_url = env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let (app_origin, app_host) = parse_app_url(&app_url)?;

        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            app_url: app_url.trim_end_matches('/').to_string(),
            app_origin,
            app_host,

            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),

            // Authentication
            jwt_secret: {
                let secret = env::var("AUTH_JWT_SECRET")
                    .map_err(|_| ConfigError::Missing("AUTH_JWT_SECRET"))?;
                if secret.len() < 32 {
                    return Err(ConfigError::WeakSecret(
                        "AUTH_JWT_SECRET must be at least 32 characters",
                    ));
                }
                secret
            },

            // Registrar
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
        })
    }
}

/// Split `APP_URL` into its origin and lowercase host
fn parse_app_url(app_url: &str) -> Result<(String, String), ConfigError> {
    let parsed = Url::parse(app_url).map_err(|_| ConfigError::InvalidUrl("APP_URL"))?;
    let host = parsed
        .host_str()
        .ok_or(ConfigError::InvalidUrl("APP_URL"))?
        .to_ascii_lowercase();
    Ok((parsed.origin().ascii_serialization(), host))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid URL in environment variable: {0}")]
    InvalidUrl(&'static str),
    #[error("Weak secret: {0}")]
    WeakSecret(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const VARS: &[&str] = &[
        "APP_URL",
        "DATABASE_URL",
        "AUTH_JWT_SECRET",
        "REGISTRAR_API_URL",
        "REGISTRAR_API_TOKEN",
        "REGISTRAR_PROJECT_ID",
        "REGISTRAR_TEAM_ID",
    ];

    fn setup_minimal_config() {
        env::set_var("DATABASE_URL", "postgres://test");
        env::set_var(
            "AUTH_JWT_SECRET",
            "test-jwt-secret-must-be-at-least-32-characters-long",
        );
        env::set_var("REGISTRAR_API_TOKEN", "token");
        env::set_var("REGISTRAR_PROJECT_ID", "prj_123");
    }

    fn cleanup_config() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_minimal_config_uses_defaults() {
        cleanup_config();
        setup_minimal_config();

        let config = Config::from_env().unwrap();
        assert_eq!(config.registrar.api_url, "https://api.vercel.com");
        assert_eq!(config.registrar.team_id, None);
        assert_eq!(config.app_host, "localhost");
        assert_eq!(config.app_origin, "http://localhost:3000");

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_app_url_gives_origin_and_reserved_host() {
        cleanup_config();
        setup_minimal_config();
        env::set_var("APP_URL", "https://App.Platform.com/");
        env::set_var("REGISTRAR_TEAM_ID", "team_42");

        let config = Config::from_env().unwrap();
        assert_eq!(config.app_url, "https://App.Platform.com");
        assert_eq!(config.app_origin, "https://app.platform.com");
        assert_eq!(config.app_host, "app.platform.com");
        assert_eq!(config.registrar.team_id.as_deref(), Some("team_42"));

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_required_variables() {
        cleanup_config();
        setup_minimal_config();
        env::remove_var("REGISTRAR_API_TOKEN");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing("REGISTRAR_API_TOKEN"))
        ));

        setup_minimal_config();
        env::set_var("AUTH_JWT_SECRET", "short");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::WeakSecret(_))
        ));

        setup_minimal_config();
        env::set_var("APP_URL", "not a url");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::InvalidUrl("APP_URL"))
        ));

        cleanup_config();
    }
}
