//! Tenant-scoped queries and mutations
//!
//! Every mutation requires an [`Identity`]; without one it fails with
//! [`StoreError::NotAuthenticated`] before touching the store. Membership in
//! the owning tenant is checked next ([`StoreError::NotAuthorized`]).

use std::sync::Arc;

use rand::Rng;
use tracing::{info, warn};

use crate::error::{StoreError, StoreResult};
use crate::hostname::{is_reserved, is_valid_domain, normalize_domain};
use crate::store::RecordStore;
use crate::types::{
    DomainId, DomainRecord, DomainStatus, DomainWithPages, Identity, LandingPageDomain,
    LandingPageId, NewDomainRecord, NewLandingPageDomain, Tenant, TenantDetail, TenantId,
    TenantRole, TenantStatus, TenantSummary,
};

const VERIFICATION_TOKEN_LEN: usize = 32;

#[derive(Clone)]
pub struct Records {
    store: Arc<dyn RecordStore>,
    reserved_host: String,
}

impl Records {
    /// `reserved_host` is the platform's own app host; it can never be
    /// registered as a tenant domain.
    pub fn new(store: Arc<dyn RecordStore>, reserved_host: impl Into<String>) -> Self {
        Self {
            store,
            reserved_host: reserved_host.into(),
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub async fn list_tenants(&self) -> StoreResult<Vec<TenantSummary>> {
        self.store.list_tenants().await
    }

    pub async fn get_tenant(&self, id: TenantId) -> StoreResult<TenantDetail> {
        let tenant = self
            .store
            .get_tenant(id)
            .await?
            .ok_or(StoreError::NotFound("Tenant"))?;
        let domains = self.store.list_domains(id).await?;
        let landing_pages = self.store.list_landing_pages(id).await?;

        Ok(TenantDetail {
            tenant,
            domains,
            landing_pages,
        })
    }

    pub async fn list_domains(&self, tenant_id: TenantId) -> StoreResult<Vec<DomainWithPages>> {
        let domains = self.store.list_domains(tenant_id).await?;
        let mut result = Vec::with_capacity(domains.len());
        for record in domains {
            let landing_page_ids = self.store.landing_pages_for_domain(record.id).await?;
            result.push(DomainWithPages {
                record,
                landing_page_ids,
            });
        }
        Ok(result)
    }

    /// Look up a record by host name (normalized before lookup)
    pub async fn find_domain(&self, domain: &str) -> StoreResult<Option<DomainRecord>> {
        self.store.find_domain(&normalize_domain(domain)).await
    }

    pub async fn get_domain(&self, id: DomainId) -> StoreResult<DomainRecord> {
        self.store
            .get_domain(id)
            .await?
            .ok_or(StoreError::NotFound("Domain"))
    }

    // ------------------------------------------------------------------
    // Tenant mutations
    // ------------------------------------------------------------------

    pub async fn create_tenant(&self, identity: Option<&Identity>, name: &str) -> StoreResult<Tenant> {
        let identity = identity.ok_or(StoreError::NotAuthenticated)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation("Tenant name is required".to_string()));
        }

        let tenant = self.store.insert_tenant(name, &identity.subject).await?;
        info!(tenant_id = %tenant.id, owner = %identity.subject, "Tenant created");
        Ok(tenant)
    }

    pub async fn update_tenant(
        &self,
        identity: Option<&Identity>,
        id: TenantId,
        name: &str,
        status: TenantStatus,
    ) -> StoreResult<Tenant> {
        let identity = identity.ok_or(StoreError::NotAuthenticated)?;
        let role = self.require_member(identity, id).await?;
        if !role.can_manage_tenant() {
            return Err(StoreError::NotAuthorized);
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation("Tenant name is required".to_string()));
        }

        self.store
            .update_tenant(id, name, status)
            .await?
            .ok_or(StoreError::NotFound("Tenant"))
    }

    pub async fn remove_tenant(&self, identity: Option<&Identity>, id: TenantId) -> StoreResult<()> {
        let identity = identity.ok_or(StoreError::NotAuthenticated)?;
        if self.require_member(identity, id).await? != TenantRole::Owner {
            return Err(StoreError::NotAuthorized);
        }

        if !self.store.delete_tenant(id).await? {
            return Err(StoreError::NotFound("Tenant"));
        }
        info!(tenant_id = %id, "Tenant removed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Domain mutations
    // ------------------------------------------------------------------

    /// Register a custom domain for a tenant with status `pending`
    pub async fn create_domain(
        &self,
        identity: Option<&Identity>,
        tenant_id: TenantId,
        domain: &str,
    ) -> StoreResult<DomainRecord> {
        let identity = identity.ok_or(StoreError::NotAuthenticated)?;
        self.require_member(identity, tenant_id).await?;

        let domain = self.validate_domain(domain)?;

        if self.store.find_domain(&domain).await?.is_some() {
            return Err(StoreError::Conflict(
                "This domain is already registered".to_string(),
            ));
        }

        let record = self
            .store
            .insert_domain(NewDomainRecord {
                domain,
                tenant_id,
                verification_token: generate_verification_token(),
            })
            .await?;

        info!(domain = %record.domain, tenant_id = %tenant_id, "Domain record created");
        Ok(record)
    }

    /// Mark a tenant's domain as verified
    pub async fn verify_domain(
        &self,
        identity: Option<&Identity>,
        domain_id: DomainId,
    ) -> StoreResult<DomainRecord> {
        self.transition(identity, domain_id, DomainStatus::Verified).await
    }

    /// Mark a tenant's domain as failed verification.
    ///
    /// Only a `pending` record can fail; any other record is returned
    /// unchanged.
    pub async fn fail_domain(
        &self,
        identity: Option<&Identity>,
        domain_id: DomainId,
    ) -> StoreResult<DomainRecord> {
        let identity = identity.ok_or(StoreError::NotAuthenticated)?;
        let record = self.get_domain(domain_id).await?;
        self.require_member(identity, record.tenant_id).await?;

        if record.status != DomainStatus::Pending {
            info!(
                domain = %record.domain,
                status = record.status.as_str(),
                "Domain is not pending, keeping its status"
            );
            return Ok(record);
        }

        let updated = self
            .store
            .set_domain_status(domain_id, DomainStatus::Failed)
            .await?
            .ok_or(StoreError::NotFound("Domain"))?;
        info!(domain = %updated.domain, "Domain marked as failed");
        Ok(updated)
    }

    pub async fn remove_domain(
        &self,
        identity: Option<&Identity>,
        domain_id: DomainId,
    ) -> StoreResult<DomainRecord> {
        let identity = identity.ok_or(StoreError::NotAuthenticated)?;
        let record = self.get_domain(domain_id).await?;
        self.require_member(identity, record.tenant_id).await?;

        if !self.store.delete_domain(domain_id).await? {
            return Err(StoreError::NotFound("Domain"));
        }
        info!(domain = %record.domain, "Domain record removed");
        Ok(record)
    }

    /// Delete a just-created record after a follow-up step failed.
    /// No identity check: callers have already authorized the creation.
    pub async fn discard_domain(&self, domain_id: DomainId) -> StoreResult<()> {
        if !self.store.delete_domain(domain_id).await? {
            warn!(domain_id = %domain_id, "Domain record to discard was already gone");
        }
        Ok(())
    }

    pub async fn attach_to_landing_page(
        &self,
        identity: Option<&Identity>,
        domain_id: DomainId,
        landing_page_id: LandingPageId,
        is_default: bool,
        path: Option<String>,
    ) -> StoreResult<LandingPageDomain> {
        let identity = identity.ok_or(StoreError::NotAuthenticated)?;

        let domain = self.store.get_domain(domain_id).await?;
        let landing_page = self.store.get_landing_page(landing_page_id).await?;
        let (domain, landing_page) = match (domain, landing_page) {
            (Some(d), Some(p)) => (d, p),
            _ => return Err(StoreError::NotFound("Domain or landing page")),
        };

        if domain.tenant_id != landing_page.tenant_id {
            return Err(StoreError::Validation(
                "Domain and landing page must belong to the same tenant".to_string(),
            ));
        }

        self.require_member(identity, domain.tenant_id).await?;

        self.store
            .attach_landing_page(NewLandingPageDomain {
                domain_id,
                landing_page_id,
                is_default,
                path,
            })
            .await
    }

    /// Status transition without an identity, for reconciliation against
    /// the registrar. Returns `None` if the record no longer exists.
    pub async fn set_status_system(
        &self,
        domain_id: DomainId,
        status: DomainStatus,
    ) -> StoreResult<Option<DomainRecord>> {
        let record = self.store.set_domain_status(domain_id, status).await?;
        if let Some(record) = &record {
            info!(domain = %record.domain, status = status.as_str(), "Domain status reconciled");
        }
        Ok(record)
    }

    pub async fn pending_domains(&self) -> StoreResult<Vec<DomainRecord>> {
        self.store.list_domains_by_status(DomainStatus::Pending).await
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Normalize and validate a domain name supplied by a tenant
    pub fn validate_domain(&self, domain: &str) -> StoreResult<String> {
        let domain = normalize_domain(domain);
        if !is_valid_domain(&domain) {
            return Err(StoreError::Validation(
                "Invalid domain format. Please enter a valid domain like 'www.example.com'"
                    .to_string(),
            ));
        }
        if is_reserved(&domain, &self.reserved_host) {
            return Err(StoreError::Validation(format!(
                "{domain} is reserved and cannot be used as a custom domain"
            )));
        }
        Ok(domain)
    }

    /// Require an identity that belongs to `tenant_id`.
    /// For callers that must authorize before an external side effect.
    pub async fn authorize(
        &self,
        identity: Option<&Identity>,
        tenant_id: TenantId,
    ) -> StoreResult<TenantRole> {
        let identity = identity.ok_or(StoreError::NotAuthenticated)?;
        self.require_member(identity, tenant_id).await
    }

    async fn require_member(&self, identity: &Identity, tenant_id: TenantId) -> StoreResult<TenantRole> {
        self.store
            .member_role(tenant_id, &identity.subject)
            .await?
            .ok_or(StoreError::NotAuthorized)
    }

    async fn transition(
        &self,
        identity: Option<&Identity>,
        domain_id: DomainId,
        status: DomainStatus,
    ) -> StoreResult<DomainRecord> {
        let identity = identity.ok_or(StoreError::NotAuthenticated)?;
        let record = self.get_domain(domain_id).await?;
        self.require_member(identity, record.tenant_id).await?;

        let updated = self
            .store
            .set_domain_status(domain_id, status)
            .await?
            .ok_or(StoreError::NotFound("Domain"))?;
        info!(domain = %updated.domain, status = status.as_str(), "Domain status updated");
        Ok(updated)
    }
}

/// Generate a secure verification token
fn generate_verification_token() -> String {
    let mut rng = rand::thread_rng();
    (0..VERIFICATION_TOKEN_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..36u8);
            if idx < 10 {
                (b'0' + idx) as char
            } else {
                (b'a' + idx - 10) as char
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;

    const RESERVED: &str = "app.platform.com";

    fn setup() -> (Arc<MemoryRecordStore>, Records) {
        let store = Arc::new(MemoryRecordStore::new());
        let records = Records::new(store.clone(), RESERVED);
        (store, records)
    }

    fn owner() -> Identity {
        Identity::new("user_owner")
    }

    #[test]
    fn test_verification_token_format() {
        let token = generate_verification_token();
        assert_eq!(token.len(), VERIFICATION_TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[tokio::test]
    async fn test_create_then_verify_round_trip() {
        let (_store, records) = setup();
        let me = owner();
        let tenant = records.create_tenant(Some(&me), "Acme").await.unwrap();

        let created = records
            .create_domain(Some(&me), tenant.id, "Example.COM")
            .await
            .unwrap();
        assert_eq!(created.domain, "example.com");

        let fetched = records.find_domain("example.com").await.unwrap().unwrap();
        assert_eq!(fetched.status, DomainStatus::Pending);

        records.verify_domain(Some(&me), created.id).await.unwrap();
        let fetched = records.find_domain("example.com").await.unwrap().unwrap();
        assert_eq!(fetched.status, DomainStatus::Verified);
    }

    #[tokio::test]
    async fn test_fail_only_moves_pending_records() {
        let (_store, records) = setup();
        let me = owner();
        let tenant = records.create_tenant(Some(&me), "Acme").await.unwrap();

        let pending = records
            .create_domain(Some(&me), tenant.id, "pending.example.com")
            .await
            .unwrap();
        let failed = records.fail_domain(Some(&me), pending.id).await.unwrap();
        assert_eq!(failed.status, DomainStatus::Failed);

        let live = records
            .create_domain(Some(&me), tenant.id, "live.example.com")
            .await
            .unwrap();
        records.verify_domain(Some(&me), live.id).await.unwrap();

        let kept = records.fail_domain(Some(&me), live.id).await.unwrap();
        assert_eq!(kept.status, DomainStatus::Verified);
        let stored = records.get_domain(live.id).await.unwrap();
        assert_eq!(stored.status, DomainStatus::Verified);
    }

    #[tokio::test]
    async fn test_unauthenticated_mutations_do_not_write() {
        let (store, records) = setup();
        let me = owner();
        let tenant = records.create_tenant(Some(&me), "Acme").await.unwrap();
        let domain = records
            .create_domain(Some(&me), tenant.id, "example.com")
            .await
            .unwrap();

        assert!(matches!(
            records.create_tenant(None, "Other").await,
            Err(StoreError::NotAuthenticated)
        ));
        assert!(matches!(
            records
                .update_tenant(None, tenant.id, "Renamed", TenantStatus::Inactive)
                .await,
            Err(StoreError::NotAuthenticated)
        ));
        assert!(matches!(
            records.remove_tenant(None, tenant.id).await,
            Err(StoreError::NotAuthenticated)
        ));
        assert!(matches!(
            records.create_domain(None, tenant.id, "other.com").await,
            Err(StoreError::NotAuthenticated)
        ));
        assert!(matches!(
            records.verify_domain(None, domain.id).await,
            Err(StoreError::NotAuthenticated)
        ));
        assert!(matches!(
            records.remove_domain(None, domain.id).await,
            Err(StoreError::NotAuthenticated)
        ));

        assert_eq!(store.tenant_count(), 1);
        assert_eq!(store.domain_count(), 1);
        let tenant_after = store.get_tenant(tenant.id).await.unwrap().unwrap();
        assert_eq!(tenant_after.name, "Acme");
        assert_eq!(tenant_after.status, TenantStatus::Active);
        let domain_after = store.get_domain(domain.id).await.unwrap().unwrap();
        assert_eq!(domain_after.status, DomainStatus::Pending);
    }

    #[tokio::test]
    async fn test_non_member_is_not_authorized() {
        let (store, records) = setup();
        let me = owner();
        let stranger = Identity::new("user_stranger");
        let tenant = records.create_tenant(Some(&me), "Acme").await.unwrap();

        assert!(matches!(
            records.create_domain(Some(&stranger), tenant.id, "example.com").await,
            Err(StoreError::NotAuthorized)
        ));
        assert_eq!(store.domain_count(), 0);
    }

    #[tokio::test]
    async fn test_authorize_requires_membership() {
        let (_store, records) = setup();
        let me = owner();
        let tenant = records.create_tenant(Some(&me), "Acme").await.unwrap();

        assert_eq!(
            records.authorize(Some(&me), tenant.id).await.unwrap(),
            TenantRole::Owner
        );
        assert!(matches!(
            records.authorize(None, tenant.id).await,
            Err(StoreError::NotAuthenticated)
        ));
        assert!(matches!(
            records
                .authorize(Some(&Identity::new("user_stranger")), tenant.id)
                .await,
            Err(StoreError::NotAuthorized)
        ));
    }

    #[tokio::test]
    async fn test_plain_user_cannot_update_tenant() {
        let (store, records) = setup();
        let me = owner();
        let tenant = records.create_tenant(Some(&me), "Acme").await.unwrap();
        store
            .add_member(tenant.id, "user_plain", TenantRole::User)
            .unwrap();
        store
            .add_member(tenant.id, "user_admin", TenantRole::Admin)
            .unwrap();

        let plain = Identity::new("user_plain");
        assert!(matches!(
            records
                .update_tenant(Some(&plain), tenant.id, "Hacked", TenantStatus::Active)
                .await,
            Err(StoreError::NotAuthorized)
        ));

        let admin = Identity::new("user_admin");
        let updated = records
            .update_tenant(Some(&admin), tenant.id, "Acme Inc", TenantStatus::Inactive)
            .await
            .unwrap();
        assert_eq!(updated.name, "Acme Inc");
        assert_eq!(updated.status, TenantStatus::Inactive);

        assert!(matches!(
            records.remove_tenant(Some(&admin), tenant.id).await,
            Err(StoreError::NotAuthorized)
        ));
        records.remove_tenant(Some(&me), tenant.id).await.unwrap();
        assert_eq!(store.tenant_count(), 0);
    }

    #[tokio::test]
    async fn test_reserved_and_invalid_domains_rejected() {
        let (store, records) = setup();
        let me = owner();
        let tenant = records.create_tenant(Some(&me), "Acme").await.unwrap();

        for bad in ["APP.platform.com", "not a domain", "localhost"] {
            assert!(matches!(
                records.create_domain(Some(&me), tenant.id, bad).await,
                Err(StoreError::Validation(_))
            ));
        }
        assert_eq!(store.domain_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_domain_conflicts() {
        let (_store, records) = setup();
        let me = owner();
        let tenant = records.create_tenant(Some(&me), "Acme").await.unwrap();

        records
            .create_domain(Some(&me), tenant.id, "example.com")
            .await
            .unwrap();
        assert!(matches!(
            records.create_domain(Some(&me), tenant.id, "EXAMPLE.com").await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_attach_keeps_single_default() {
        let (store, records) = setup();
        let me = owner();
        let tenant = records.create_tenant(Some(&me), "Acme").await.unwrap();
        let page = store.add_landing_page(tenant.id, "Launch").unwrap();
        let first = records
            .create_domain(Some(&me), tenant.id, "one.example.com")
            .await
            .unwrap();
        let second = records
            .create_domain(Some(&me), tenant.id, "two.example.com")
            .await
            .unwrap();

        records
            .attach_to_landing_page(Some(&me), first.id, page.id, true, None)
            .await
            .unwrap();
        records
            .attach_to_landing_page(Some(&me), second.id, page.id, true, Some("/launch".into()))
            .await
            .unwrap();

        let mappings = store.mappings_for(page.id);
        assert_eq!(mappings.len(), 2);
        let defaults: Vec<_> = mappings.iter().filter(|m| m.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].domain_id, second.id);

        let page = store.get_landing_page(page.id).await.unwrap().unwrap();
        assert_eq!(page.default_domain_id, Some(second.id));

        let listed = records.list_domains(tenant.id).await.unwrap();
        let one = listed.iter().find(|d| d.record.id == first.id).unwrap();
        assert_eq!(one.landing_page_ids, vec![page.id]);
    }

    #[tokio::test]
    async fn test_attach_across_tenants_rejected() {
        let (store, records) = setup();
        let me = owner();
        let acme = records.create_tenant(Some(&me), "Acme").await.unwrap();
        let globex = records.create_tenant(Some(&me), "Globex").await.unwrap();
        let page = store.add_landing_page(globex.id, "Launch").unwrap();
        let domain = records
            .create_domain(Some(&me), acme.id, "example.com")
            .await
            .unwrap();

        assert!(matches!(
            records
                .attach_to_landing_page(Some(&me), domain.id, page.id, false, None)
                .await,
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            records
                .attach_to_landing_page(Some(&me), DomainId::new(), page.id, false, None)
                .await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_tenant_listing_counts_domains() {
        let (_store, records) = setup();
        let me = owner();
        let tenant = records.create_tenant(Some(&me), "Acme").await.unwrap();
        records
            .create_domain(Some(&me), tenant.id, "a.example.com")
            .await
            .unwrap();
        records
            .create_domain(Some(&me), tenant.id, "b.example.com")
            .await
            .unwrap();

        let tenants = records.list_tenants().await.unwrap();
        assert_eq!(tenants.len(), 1);
        assert_eq!(tenants[0].domains_count, 2);

        let detail = records.get_tenant(tenant.id).await.unwrap();
        assert_eq!(detail.domains.len(), 2);
        assert!(matches!(
            records.get_tenant(TenantId::new()).await,
            Err(StoreError::NotFound("Tenant"))
        ));
    }
}
