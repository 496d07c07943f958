//! PostgreSQL record store

use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::RecordStore;
use crate::error::{StoreError, StoreResult};
use crate::types::{
    DomainId, DomainRecord, DomainStatus, LandingPage, LandingPageDomain, LandingPageId,
    NewDomainRecord, NewLandingPageDomain, Tenant, TenantId, TenantRole, TenantStatus,
    TenantSummary,
};

const DOMAIN_COLUMNS: &str =
    "id, domain, tenant_id, status, verification_token, created_at, updated_at";
const TENANT_COLUMNS: &str = "id, name, status, owner_id, created_at, updated_at";
const LANDING_PAGE_COLUMNS: &str =
    "id, tenant_id, title, published, default_domain_id, created_at, updated_at";

/// Database row for a domain (status stored as TEXT)
#[derive(Debug, sqlx::FromRow)]
struct DomainRow {
    id: Uuid,
    domain: String,
    tenant_id: Uuid,
    status: String,
    verification_token: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<DomainRow> for DomainRecord {
    type Error = StoreError;

    fn try_from(row: DomainRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            domain: row.domain,
            tenant_id: row.tenant_id.into(),
            status: row.status.parse().map_err(StoreError::Database)?,
            verification_token: row.verification_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TenantRow {
    id: Uuid,
    name: String,
    status: String,
    owner_id: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<TenantRow> for Tenant {
    type Error = StoreError;

    fn try_from(row: TenantRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            name: row.name,
            status: row.status.parse().map_err(StoreError::Database)?,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LandingPageRow {
    id: Uuid,
    tenant_id: Uuid,
    title: String,
    published: bool,
    default_domain_id: Option<Uuid>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<LandingPageRow> for LandingPage {
    fn from(row: LandingPageRow) -> Self {
        Self {
            id: row.id.into(),
            tenant_id: row.tenant_id.into(),
            title: row.title,
            published: row.published,
            default_domain_id: row.default_domain_id.map(DomainId::from),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MappingRow {
    id: Uuid,
    domain_id: Uuid,
    landing_page_id: Uuid,
    is_default: bool,
    path: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<MappingRow> for LandingPageDomain {
    fn from(row: MappingRow) -> Self {
        Self {
            id: row.id,
            domain_id: row.domain_id.into(),
            landing_page_id: row.landing_page_id.into(),
            is_default: row.is_default,
            path: row.path,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn domains_from_rows(rows: Vec<DomainRow>) -> StoreResult<Vec<DomainRecord>> {
    rows.into_iter().map(DomainRecord::try_from).collect()
}

/// Record store backed by the `tenants`, `tenant_users`, `domains`,
/// `landing_pages` and `landing_page_domains` tables
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_tenant(&self, name: &str, owner_id: &str) -> StoreResult<Tenant> {
        let mut tx = self.pool.begin().await?;

        let row: TenantRow = sqlx::query_as(&format!(
            "INSERT INTO tenants (name, status, owner_id) VALUES ($1, 'active', $2) RETURNING {TENANT_COLUMNS}"
        ))
        .bind(name)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO tenant_users (tenant_id, user_id, role) VALUES ($1, $2, 'owner')")
            .bind(row.id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        row.try_into()
    }

    async fn get_tenant(&self, id: TenantId) -> StoreResult<Option<Tenant>> {
        let row: Option<TenantRow> =
            sqlx::query_as(&format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = $1"))
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Tenant::try_from).transpose()
    }

    async fn list_tenants(&self) -> StoreResult<Vec<TenantSummary>> {
        #[derive(sqlx::FromRow)]
        struct SummaryRow {
            #[sqlx(flatten)]
            tenant: TenantRow,
            domains_count: i64,
        }

        let rows: Vec<SummaryRow> = sqlx::query_as(
            r#"
            SELECT t.id, t.name, t.status, t.owner_id, t.created_at, t.updated_at,
                   COUNT(d.id) AS domains_count
            FROM tenants t
            LEFT JOIN domains d ON d.tenant_id = t.id
            GROUP BY t.id
            ORDER BY t.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(TenantSummary {
                    tenant: row.tenant.try_into()?,
                    domains_count: u64::try_from(row.domains_count).unwrap_or_default(),
                })
            })
            .collect()
    }

    async fn update_tenant(
        &self,
        id: TenantId,
        name: &str,
        status: TenantStatus,
    ) -> StoreResult<Option<Tenant>> {
        let row: Option<TenantRow> = sqlx::query_as(&format!(
            "UPDATE tenants SET name = $2, status = $3, updated_at = NOW() WHERE id = $1 RETURNING {TENANT_COLUMNS}"
        ))
        .bind(id.0)
        .bind(name)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Tenant::try_from).transpose()
    }

    async fn delete_tenant(&self, id: TenantId) -> StoreResult<bool> {
        // domains, landing pages, mappings and memberships cascade
        let result = sqlx::query("DELETE FROM tenants WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn member_role(
        &self,
        tenant_id: TenantId,
        user_id: &str,
    ) -> StoreResult<Option<TenantRole>> {
        let role: Option<String> = sqlx::query_scalar(
            "SELECT role FROM tenant_users WHERE tenant_id = $1 AND user_id = $2",
        )
        .bind(tenant_id.0)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        role.map(|r| r.parse().map_err(StoreError::Database))
            .transpose()
    }

    async fn insert_domain(&self, new: NewDomainRecord) -> StoreResult<DomainRecord> {
        let row: DomainRow = sqlx::query_as(&format!(
            "INSERT INTO domains (domain, tenant_id, status, verification_token) VALUES ($1, $2, 'pending', $3) RETURNING {DOMAIN_COLUMNS}"
        ))
        .bind(&new.domain)
        .bind(new.tenant_id.0)
        .bind(&new.verification_token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Conflict(_) => {
                StoreError::Conflict("This domain is already registered".to_string())
            }
            other => other,
        })?;

        row.try_into()
    }

    async fn get_domain(&self, id: DomainId) -> StoreResult<Option<DomainRecord>> {
        let row: Option<DomainRow> =
            sqlx::query_as(&format!("SELECT {DOMAIN_COLUMNS} FROM domains WHERE id = $1"))
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await?;

        row.map(DomainRecord::try_from).transpose()
    }

    async fn find_domain(&self, domain: &str) -> StoreResult<Option<DomainRecord>> {
        let row: Option<DomainRow> =
            sqlx::query_as(&format!("SELECT {DOMAIN_COLUMNS} FROM domains WHERE domain = $1"))
                .bind(domain)
                .fetch_optional(&self.pool)
                .await?;

        row.map(DomainRecord::try_from).transpose()
    }

    async fn list_domains(&self, tenant_id: TenantId) -> StoreResult<Vec<DomainRecord>> {
        let rows: Vec<DomainRow> = sqlx::query_as(&format!(
            "SELECT {DOMAIN_COLUMNS} FROM domains WHERE tenant_id = $1 ORDER BY created_at DESC"
        ))
        .bind(tenant_id.0)
        .fetch_all(&self.pool)
        .await?;

        domains_from_rows(rows)
    }

    async fn list_domains_by_status(&self, status: DomainStatus) -> StoreResult<Vec<DomainRecord>> {
        let rows: Vec<DomainRow> = sqlx::query_as(&format!(
            "SELECT {DOMAIN_COLUMNS} FROM domains WHERE status = $1 ORDER BY updated_at ASC"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        domains_from_rows(rows)
    }

    async fn set_domain_status(
        &self,
        id: DomainId,
        status: DomainStatus,
    ) -> StoreResult<Option<DomainRecord>> {
        let row: Option<DomainRow> = sqlx::query_as(&format!(
            "UPDATE domains SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {DOMAIN_COLUMNS}"
        ))
        .bind(id.0)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(DomainRecord::try_from).transpose()
    }

    async fn delete_domain(&self, id: DomainId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM domains WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_landing_pages(&self, tenant_id: TenantId) -> StoreResult<Vec<LandingPage>> {
        let rows: Vec<LandingPageRow> = sqlx::query_as(&format!(
            "SELECT {LANDING_PAGE_COLUMNS} FROM landing_pages WHERE tenant_id = $1 ORDER BY created_at DESC"
        ))
        .bind(tenant_id.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LandingPage::from).collect())
    }

    async fn get_landing_page(&self, id: LandingPageId) -> StoreResult<Option<LandingPage>> {
        let row: Option<LandingPageRow> = sqlx::query_as(&format!(
            "SELECT {LANDING_PAGE_COLUMNS} FROM landing_pages WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(LandingPage::from))
    }

    async fn landing_pages_for_domain(
        &self,
        domain_id: DomainId,
    ) -> StoreResult<Vec<LandingPageId>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT landing_page_id FROM landing_page_domains WHERE domain_id = $1 ORDER BY created_at ASC",
        )
        .bind(domain_id.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(LandingPageId::from).collect())
    }

    async fn attach_landing_page(
        &self,
        new: NewLandingPageDomain,
    ) -> StoreResult<LandingPageDomain> {
        let mut tx = self.pool.begin().await?;

        if new.is_default {
            sqlx::query(
                "UPDATE landing_page_domains SET is_default = FALSE, updated_at = NOW() WHERE landing_page_id = $1 AND is_default",
            )
            .bind(new.landing_page_id.0)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE landing_pages SET default_domain_id = $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(new.landing_page_id.0)
            .bind(new.domain_id.0)
            .execute(&mut *tx)
            .await?;
        }

        let row: MappingRow = sqlx::query_as(
            r#"
            INSERT INTO landing_page_domains (domain_id, landing_page_id, is_default, path)
            VALUES ($1, $2, $3, $4)
            RETURNING id, domain_id, landing_page_id, is_default, path, created_at, updated_at
            "#,
        )
        .bind(new.domain_id.0)
        .bind(new.landing_page_id.0)
        .bind(new.is_default)
        .bind(&new.path)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }
}
