//! In-memory record store for tests

use async_trait::async_trait;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use time::OffsetDateTime;
use uuid::Uuid;

use super::RecordStore;
use crate::error::{StoreError, StoreResult};
use crate::types::{
    DomainId, DomainRecord, DomainStatus, LandingPage, LandingPageDomain, LandingPageId,
    NewDomainRecord, NewLandingPageDomain, Tenant, TenantId, TenantRole, TenantStatus,
    TenantSummary,
};

#[derive(Default)]
struct Tables {
    tenants: Vec<Tenant>,
    members: Vec<(TenantId, String, TenantRole)>,
    domains: Vec<DomainRecord>,
    landing_pages: Vec<LandingPage>,
    mappings: Vec<LandingPageDomain>,
}

/// Thread-safe in-memory store with the same semantics as [`super::PgRecordStore`]
#[derive(Default)]
pub struct MemoryRecordStore {
    tables: RwLock<Tables>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Database("store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Database("store lock poisoned".to_string()))
    }

    /// Add a member to a tenant (seeding helper)
    pub fn add_member(&self, tenant_id: TenantId, user_id: &str, role: TenantRole) -> StoreResult<()> {
        let mut tables = self.write()?;
        tables.members.retain(|(t, u, _)| !(*t == tenant_id && u == user_id));
        tables.members.push((tenant_id, user_id.to_string(), role));
        Ok(())
    }

    /// Create a landing page (seeding helper)
    pub fn add_landing_page(&self, tenant_id: TenantId, title: &str) -> StoreResult<LandingPage> {
        let now = OffsetDateTime::now_utc();
        let page = LandingPage {
            id: LandingPageId::new(),
            tenant_id,
            title: title.to_string(),
            published: false,
            default_domain_id: None,
            created_at: now,
            updated_at: now,
        };
        self.write()?.landing_pages.push(page.clone());
        Ok(page)
    }

    /// Number of stored domain records
    pub fn domain_count(&self) -> usize {
        self.read().map(|t| t.domains.len()).unwrap_or_default()
    }

    /// Number of stored tenants
    pub fn tenant_count(&self) -> usize {
        self.read().map(|t| t.tenants.len()).unwrap_or_default()
    }

    /// All mappings for a landing page
    pub fn mappings_for(&self, landing_page_id: LandingPageId) -> Vec<LandingPageDomain> {
        self.read()
            .map(|t| {
                t.mappings
                    .iter()
                    .filter(|m| m.landing_page_id == landing_page_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn ping(&self) -> StoreResult<()> {
        self.read().map(|_| ())
    }

    async fn insert_tenant(&self, name: &str, owner_id: &str) -> StoreResult<Tenant> {
        let now = OffsetDateTime::now_utc();
        let tenant = Tenant {
            id: TenantId::new(),
            name: name.to_string(),
            status: TenantStatus::Active,
            owner_id: owner_id.to_string(),
            created_at: now,
            updated_at: now,
        };

        let mut tables = self.write()?;
        tables.tenants.push(tenant.clone());
        tables
            .members
            .push((tenant.id, owner_id.to_string(), TenantRole::Owner));
        Ok(tenant)
    }

    async fn get_tenant(&self, id: TenantId) -> StoreResult<Option<Tenant>> {
        Ok(self.read()?.tenants.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tenants(&self) -> StoreResult<Vec<TenantSummary>> {
        let tables = self.read()?;
        Ok(tables
            .tenants
            .iter()
            .rev()
            .map(|tenant| TenantSummary {
                tenant: tenant.clone(),
                domains_count: tables
                    .domains
                    .iter()
                    .filter(|d| d.tenant_id == tenant.id)
                    .count() as u64,
            })
            .collect())
    }

    async fn update_tenant(
        &self,
        id: TenantId,
        name: &str,
        status: TenantStatus,
    ) -> StoreResult<Option<Tenant>> {
        let mut tables = self.write()?;
        Ok(tables.tenants.iter_mut().find(|t| t.id == id).map(|t| {
            t.name = name.to_string();
            t.status = status;
            t.updated_at = OffsetDateTime::now_utc();
            t.clone()
        }))
    }

    async fn delete_tenant(&self, id: TenantId) -> StoreResult<bool> {
        let mut tables = self.write()?;
        let before = tables.tenants.len();
        tables.tenants.retain(|t| t.id != id);
        if tables.tenants.len() == before {
            return Ok(false);
        }

        let domain_ids: Vec<DomainId> = tables
            .domains
            .iter()
            .filter(|d| d.tenant_id == id)
            .map(|d| d.id)
            .collect();
        let page_ids: Vec<LandingPageId> = tables
            .landing_pages
            .iter()
            .filter(|p| p.tenant_id == id)
            .map(|p| p.id)
            .collect();

        tables.domains.retain(|d| d.tenant_id != id);
        tables.landing_pages.retain(|p| p.tenant_id != id);
        tables.members.retain(|(t, _, _)| *t != id);
        tables.mappings.retain(|m| {
            !domain_ids.contains(&m.domain_id) && !page_ids.contains(&m.landing_page_id)
        });
        Ok(true)
    }

    async fn member_role(
        &self,
        tenant_id: TenantId,
        user_id: &str,
    ) -> StoreResult<Option<TenantRole>> {
        Ok(self
            .read()?
            .members
            .iter()
            .find(|(t, u, _)| *t == tenant_id && u == user_id)
            .map(|(_, _, role)| *role))
    }

    async fn insert_domain(&self, new: NewDomainRecord) -> StoreResult<DomainRecord> {
        let mut tables = self.write()?;
        if tables.domains.iter().any(|d| d.domain == new.domain) {
            return Err(StoreError::Conflict(
                "This domain is already registered".to_string(),
            ));
        }

        let now = OffsetDateTime::now_utc();
        let record = DomainRecord {
            id: DomainId::new(),
            domain: new.domain,
            tenant_id: new.tenant_id,
            status: DomainStatus::Pending,
            verification_token: new.verification_token,
            created_at: now,
            updated_at: now,
        };
        tables.domains.push(record.clone());
        Ok(record)
    }

    async fn get_domain(&self, id: DomainId) -> StoreResult<Option<DomainRecord>> {
        Ok(self.read()?.domains.iter().find(|d| d.id == id).cloned())
    }

    async fn find_domain(&self, domain: &str) -> StoreResult<Option<DomainRecord>> {
        Ok(self
            .read()?
            .domains
            .iter()
            .find(|d| d.domain == domain)
            .cloned())
    }

    async fn list_domains(&self, tenant_id: TenantId) -> StoreResult<Vec<DomainRecord>> {
        Ok(self
            .read()?
            .domains
            .iter()
            .rev()
            .filter(|d| d.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn list_domains_by_status(&self, status: DomainStatus) -> StoreResult<Vec<DomainRecord>> {
        Ok(self
            .read()?
            .domains
            .iter()
            .filter(|d| d.status == status)
            .cloned()
            .collect())
    }

    async fn set_domain_status(
        &self,
        id: DomainId,
        status: DomainStatus,
    ) -> StoreResult<Option<DomainRecord>> {
        let mut tables = self.write()?;
        Ok(tables.domains.iter_mut().find(|d| d.id == id).map(|d| {
            d.status = status;
            d.updated_at = OffsetDateTime::now_utc();
            d.clone()
        }))
    }

    async fn delete_domain(&self, id: DomainId) -> StoreResult<bool> {
        let mut tables = self.write()?;
        let before = tables.domains.len();
        tables.domains.retain(|d| d.id != id);
        if tables.domains.len() == before {
            return Ok(false);
        }

        tables.mappings.retain(|m| m.domain_id != id);
        for page in tables.landing_pages.iter_mut() {
            if page.default_domain_id == Some(id) {
                page.default_domain_id = None;
            }
        }
        Ok(true)
    }

    async fn list_landing_pages(&self, tenant_id: TenantId) -> StoreResult<Vec<LandingPage>> {
        Ok(self
            .read()?
            .landing_pages
            .iter()
            .rev()
            .filter(|p| p.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn get_landing_page(&self, id: LandingPageId) -> StoreResult<Option<LandingPage>> {
        Ok(self
            .read()?
            .landing_pages
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn landing_pages_for_domain(
        &self,
        domain_id: DomainId,
    ) -> StoreResult<Vec<LandingPageId>> {
        Ok(self
            .read()?
            .mappings
            .iter()
            .filter(|m| m.domain_id == domain_id)
            .map(|m| m.landing_page_id)
            .collect())
    }

    async fn attach_landing_page(
        &self,
        new: NewLandingPageDomain,
    ) -> StoreResult<LandingPageDomain> {
        let mut tables = self.write()?;
        let now = OffsetDateTime::now_utc();

        if new.is_default {
            for mapping in tables
                .mappings
                .iter_mut()
                .filter(|m| m.landing_page_id == new.landing_page_id && m.is_default)
            {
                mapping.is_default = false;
                mapping.updated_at = now;
            }
            if let Some(page) = tables
                .landing_pages
                .iter_mut()
                .find(|p| p.id == new.landing_page_id)
            {
                page.default_domain_id = Some(new.domain_id);
                page.updated_at = now;
            }
        }

        let mapping = LandingPageDomain {
            id: Uuid::new_v4(),
            domain_id: new.domain_id,
            landing_page_id: new.landing_page_id,
            is_default: new.is_default,
            path: new.path,
            created_at: now,
            updated_at: now,
        };
        tables.mappings.push(mapping.clone());
        Ok(mapping)
    }
}
