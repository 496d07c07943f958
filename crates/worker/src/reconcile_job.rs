//! Periodic domain reconciliation
//!
//! Re-checks every pending domain against the registrar. A domain the
//! registrar reports as verified is marked verified locally by the
//! reconciliation service. Failures are logged per domain and never stop
//! the pass; there is no retry within a pass.

use tracing::{error, info};

use tenantsite_api::ReconciliationService;
use tenantsite_shared::Records;

/// Outcome of one reconciliation pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub checked: usize,
    pub verified: usize,
    pub errors: usize,
}

/// Run one pass over all pending domains
pub async fn reconcile_pending(
    records: &Records,
    reconciler: &ReconciliationService,
) -> ReconcileSummary {
    let mut summary = ReconcileSummary::default();

    let pending = match records.pending_domains().await {
        Ok(pending) => pending,
        Err(e) => {
            error!(error = %e, "Failed to list pending domains");
            return summary;
        }
    };

    if pending.is_empty() {
        return summary;
    }

    info!(count = pending.len(), "Reconciling pending domains");

    for record in pending {
        summary.checked += 1;
        match reconciler.get_domain_configuration(&record.domain).await {
            Ok(result) if result.verified() => {
                summary.verified += 1;
                info!(domain = %record.domain, tenant_id = %record.tenant_id, "Pending domain verified");
            }
            Ok(_) => {}
            Err(e) => {
                summary.errors += 1;
                error!(domain = %record.domain, error = %e, "Failed to reconcile domain");
            }
        }
    }

    info!(
        checked = summary.checked,
        verified = summary.verified,
        errors = summary.errors,
        "Reconciliation pass finished"
    );
    summary
}
