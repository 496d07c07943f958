//! Domain reconciliation
//!
//! Merges the registrar's live DNS configuration and verification state into
//! one view of a domain, and keeps the local record's status in step with it.

use serde::Serialize;
use tracing::{error, info, warn};

use tenantsite_shared::{DomainStatus, Records};

use crate::registrar::{
    RegistrarClient, RegistrarDomainConfig, RegistrarDomainInfo, RegistrarError,
};

/// Unified configuration status of a domain
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum DomainConfiguration {
    /// Re-verification in this request succeeded; `info` is the fresh
    /// verify response.
    Verification {
        configured: bool,
        info: RegistrarDomainInfo,
    },
    /// Result of the config and info lookups alone
    Lookup {
        configured: bool,
        config: RegistrarDomainConfig,
        info: RegistrarDomainInfo,
    },
}

impl DomainConfiguration {
    pub fn configured(&self) -> bool {
        match self {
            Self::Verification { configured, .. } | Self::Lookup { configured, .. } => *configured,
        }
    }

    pub fn info(&self) -> &RegistrarDomainInfo {
        match self {
            Self::Verification { info, .. } | Self::Lookup { info, .. } => info,
        }
    }

    pub fn verified(&self) -> bool {
        self.info().verified
    }
}

#[derive(Clone)]
pub struct ReconciliationService {
    registrar: RegistrarClient,
    records: Option<Records>,
}

impl ReconciliationService {
    /// Without `records` the service only reads from the registrar.
    pub fn new(registrar: RegistrarClient, records: Option<Records>) -> Self {
        Self { registrar, records }
    }

    /// Current status without triggering verification
    pub async fn get_status(&self, domain: &str) -> Result<DomainConfiguration, RegistrarError> {
        let (config, info) = self.registrar.get_domain_configuration(domain).await?;
        let result = DomainConfiguration::Lookup {
            configured: config.configured(),
            config,
            info,
        };
        self.sync_record(domain, &result).await;
        Ok(result)
    }

    /// Current status, re-verifying unverified domains first.
    ///
    /// Not idempotent: when the registrar reports the domain unverified a
    /// verification is triggered, which can change registrar-side state.
    /// `configured` always comes from the initial config lookup.
    pub async fn get_domain_configuration(
        &self,
        domain: &str,
    ) -> Result<DomainConfiguration, RegistrarError> {
        let (config, info) = self.registrar.get_domain_configuration(domain).await?;
        let configured = config.configured();

        let result = if info.verified {
            DomainConfiguration::Lookup {
                configured,
                config,
                info,
            }
        } else {
            match self.registrar.verify_domain(domain).await {
                Ok(fresh) if fresh.verified => {
                    info!(domain = %domain, "Domain verified during reconciliation");
                    DomainConfiguration::Verification {
                        configured,
                        info: fresh,
                    }
                }
                Ok(_) => DomainConfiguration::Lookup {
                    configured,
                    config,
                    info,
                },
                Err(e) => {
                    warn!(domain = %domain, error = %e, "Re-verification failed, using lookup result");
                    DomainConfiguration::Lookup {
                        configured,
                        config,
                        info,
                    }
                }
            }
        };

        self.sync_record(domain, &result).await;
        Ok(result)
    }

    /// Trigger verification and sync the local record if it succeeded
    pub async fn verify_domain(&self, domain: &str) -> Result<RegistrarDomainInfo, RegistrarError> {
        let info = self.registrar.verify_domain(domain).await?;
        if info.verified {
            self.mark_verified(domain).await;
        }
        Ok(info)
    }

    async fn sync_record(&self, domain: &str, result: &DomainConfiguration) {
        if result.verified() {
            self.mark_verified(domain).await;
        }
    }

    async fn mark_verified(&self, domain: &str) {
        let Some(records) = &self.records else {
            return;
        };

        let record = match records.find_domain(domain).await {
            Ok(Some(record)) => record,
            Ok(None) => return,
            Err(e) => {
                error!(domain = %domain, error = %e, "Failed to load domain record for sync");
                return;
            }
        };

        if record.status == DomainStatus::Verified {
            return;
        }

        if let Err(e) = records
            .set_status_system(record.id, DomainStatus::Verified)
            .await
        {
            error!(domain = %domain, error = %e, "Failed to sync domain record status");
        }
    }
}
