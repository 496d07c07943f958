//! Record store for tenants, domains and landing-page mappings
//!
//! The store is a plain persistence seam: it performs no identity or
//! membership checks. Those rules live in [`crate::records::Records`].
//! Each method is atomic for the rows it touches; no operation spans
//! several calls.

mod postgres;
#[cfg(any(test, feature = "test-util"))]
mod memory;

pub use postgres::PgRecordStore;
#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryRecordStore;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::{
    DomainId, DomainRecord, DomainStatus, LandingPage, LandingPageDomain, LandingPageId,
    NewDomainRecord, NewLandingPageDomain, Tenant, TenantId, TenantRole, TenantStatus,
    TenantSummary,
};

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Connectivity check for health probes
    async fn ping(&self) -> StoreResult<()>;

    /// Insert a tenant and its owner membership
    async fn insert_tenant(&self, name: &str, owner_id: &str) -> StoreResult<Tenant>;
    async fn get_tenant(&self, id: TenantId) -> StoreResult<Option<Tenant>>;
    async fn list_tenants(&self) -> StoreResult<Vec<TenantSummary>>;
    async fn update_tenant(
        &self,
        id: TenantId,
        name: &str,
        status: TenantStatus,
    ) -> StoreResult<Option<Tenant>>;
    /// Delete a tenant together with its domains, mappings and memberships
    async fn delete_tenant(&self, id: TenantId) -> StoreResult<bool>;
    async fn member_role(&self, tenant_id: TenantId, user_id: &str)
        -> StoreResult<Option<TenantRole>>;

    /// Fails with `Conflict` if the domain name is already registered
    async fn insert_domain(&self, new: NewDomainRecord) -> StoreResult<DomainRecord>;
    async fn get_domain(&self, id: DomainId) -> StoreResult<Option<DomainRecord>>;
    async fn find_domain(&self, domain: &str) -> StoreResult<Option<DomainRecord>>;
    async fn list_domains(&self, tenant_id: TenantId) -> StoreResult<Vec<DomainRecord>>;
    async fn list_domains_by_status(&self, status: DomainStatus) -> StoreResult<Vec<DomainRecord>>;
    async fn set_domain_status(
        &self,
        id: DomainId,
        status: DomainStatus,
    ) -> StoreResult<Option<DomainRecord>>;
    async fn delete_domain(&self, id: DomainId) -> StoreResult<bool>;

    async fn list_landing_pages(&self, tenant_id: TenantId) -> StoreResult<Vec<LandingPage>>;
    async fn get_landing_page(&self, id: LandingPageId) -> StoreResult<Option<LandingPage>>;
    async fn landing_pages_for_domain(&self, domain_id: DomainId)
        -> StoreResult<Vec<LandingPageId>>;
    /// Insert a mapping; when it is the default, any previous default for the
    /// landing page is cleared and the page's default domain is updated.
    async fn attach_landing_page(&self, new: NewLandingPageDomain)
        -> StoreResult<LandingPageDomain>;
}
