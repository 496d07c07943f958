//! Shared application state

use std::sync::Arc;

use tenantsite_shared::{RecordStore, Records};

use crate::{
    auth::JwtManager,
    config::{Config, ConfigError},
    reconcile::ReconciliationService,
    registrar::RegistrarClient,
    security::CorsPolicy,
};

/// State handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub records: Records,
    pub registrar: RegistrarClient,
    pub reconciler: ReconciliationService,
    pub jwt: JwtManager,
    pub cors: CorsPolicy,
}

impl AppState {
    /// Wire the registrar, record layer and reconciliation service from
    /// configuration and an injected store.
    pub fn new(config: Config, store: Arc<dyn RecordStore>) -> Result<Self, ConfigError> {
        let records = Records::new(store, config.app_host.clone());
        let registrar = RegistrarClient::new(config.registrar.clone(), config.app_host.clone());
        let reconciler = ReconciliationService::new(registrar.clone(), Some(records.clone()));
        let jwt = JwtManager::new(&config.jwt_secret);
        let cors = CorsPolicy::new(&config.app_origin).ok_or(ConfigError::InvalidUrl("APP_URL"))?;

        Ok(Self {
            config: Arc::new(config),
            records,
            registrar,
            reconciler,
            jwt,
            cors,
        })
    }
}
