//! TenantSite API Library
//!
//! Registrar integration, domain reconciliation and the HTTP API used by the
//! dashboard and the public host router.

pub mod auth;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod registrar;
pub mod routes;
pub mod security;
pub mod state;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use reconcile::{DomainConfiguration, ReconciliationService};
pub use registrar::{RegistrarClient, RegistrarConfig, RegistrarError};
pub use state::AppState;
