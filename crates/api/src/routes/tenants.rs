//! Tenant and tenant-domain routes used by the dashboard

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use tenantsite_shared::{
    DomainId, DomainRecord, DomainWithPages, Identity, LandingPageDomain, LandingPageId, Tenant,
    TenantDetail, TenantId, TenantStatus, TenantSummary,
};

use crate::{
    error::{ApiError, ApiResult},
    registrar::RegistrarDomainInfo,
    state::AppState,
};

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateTenantRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTenantRequest {
    pub name: String,
    pub status: TenantStatus,
}

#[derive(Debug, Deserialize)]
pub struct CreateDomainRequest {
    /// The custom domain (e.g., "www.example.com")
    pub domain: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachLandingPageRequest {
    pub landing_page_id: LandingPageId,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub path: Option<String>,
}

/// Local record plus the registrar's view of the same domain
#[derive(Debug, Serialize)]
pub struct TenantDomainResponse {
    pub domain: DomainRecord,
    pub registrar: RegistrarDomainInfo,
}

type MaybeIdentity = Option<Extension<Identity>>;

fn identity(ext: &MaybeIdentity) -> Option<&Identity> {
    ext.as_ref().map(|Extension(identity)| identity)
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// Load a domain and check it belongs to the tenant in the path
async fn tenant_domain(
    state: &AppState,
    tenant_id: TenantId,
    domain_id: DomainId,
) -> ApiResult<DomainRecord> {
    let record = state.records.get_domain(domain_id).await?;
    if record.tenant_id != tenant_id {
        return Err(ApiError::NotFound("Domain"));
    }
    Ok(record)
}

// ============================================================================
// Tenants
// ============================================================================

/// GET /tenants
pub async fn list_tenants(State(state): State<AppState>) -> ApiResult<Json<Vec<TenantSummary>>> {
    Ok(Json(state.records.list_tenants().await?))
}

/// POST /tenants
pub async fn create_tenant(
    State(state): State<AppState>,
    auth: MaybeIdentity,
    payload: Result<Json<CreateTenantRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Tenant>)> {
    let req = json_body(payload)?;
    let tenant = state
        .records
        .create_tenant(identity(&auth), &req.name)
        .await?;
    Ok((StatusCode::CREATED, Json(tenant)))
}

/// GET /tenants/:tenant_id
pub async fn get_tenant(
    State(state): State<AppState>,
    Path(tenant_id): Path<TenantId>,
) -> ApiResult<Json<TenantDetail>> {
    Ok(Json(state.records.get_tenant(tenant_id).await?))
}

/// PATCH /tenants/:tenant_id
pub async fn update_tenant(
    State(state): State<AppState>,
    auth: MaybeIdentity,
    Path(tenant_id): Path<TenantId>,
    payload: Result<Json<UpdateTenantRequest>, JsonRejection>,
) -> ApiResult<Json<Tenant>> {
    let req = json_body(payload)?;
    let tenant = state
        .records
        .update_tenant(identity(&auth), tenant_id, &req.name, req.status)
        .await?;
    Ok(Json(tenant))
}

/// DELETE /tenants/:tenant_id
///
/// Registrar removal of the tenant's domains is best effort and happens
/// only after the records are gone.
pub async fn delete_tenant(
    State(state): State<AppState>,
    auth: MaybeIdentity,
    Path(tenant_id): Path<TenantId>,
) -> ApiResult<StatusCode> {
    state.records.authorize(identity(&auth), tenant_id).await?;
    let domains = state.records.list_domains(tenant_id).await?;

    state
        .records
        .remove_tenant(identity(&auth), tenant_id)
        .await?;

    for entry in domains {
        if let Err(e) = state.registrar.remove_domain(&entry.record.domain).await {
            warn!(
                tenant_id = %tenant_id,
                domain = %entry.record.domain,
                error = %e,
                "Failed to remove domain from registrar after tenant deletion"
            );
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Tenant domains
// ============================================================================

/// GET /tenants/:tenant_id/domains
pub async fn list_domains(
    State(state): State<AppState>,
    Path(tenant_id): Path<TenantId>,
) -> ApiResult<Json<Vec<DomainWithPages>>> {
    Ok(Json(state.records.list_domains(tenant_id).await?))
}

/// POST /tenants/:tenant_id/domains
///
/// Creates the local record first, then attaches the domain at the
/// registrar. The record is discarded if the registrar rejects it.
pub async fn create_domain(
    State(state): State<AppState>,
    auth: MaybeIdentity,
    Path(tenant_id): Path<TenantId>,
    payload: Result<Json<CreateDomainRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TenantDomainResponse>)> {
    let req = json_body(payload)?;
    let record = state
        .records
        .create_domain(identity(&auth), tenant_id, &req.domain)
        .await?;

    match state.registrar.add_domain(&record.domain).await {
        Ok(info) => Ok((
            StatusCode::CREATED,
            Json(TenantDomainResponse {
                domain: record,
                registrar: info,
            }),
        )),
        Err(e) => {
            if let Err(discard_err) = state.records.discard_domain(record.id).await {
                error!(
                    domain = %record.domain,
                    error = %discard_err,
                    "Failed to discard domain record after registrar rejection"
                );
            }
            Err(e.into())
        }
    }
}

/// POST /tenants/:tenant_id/domains/:domain_id/verify
pub async fn verify_domain(
    State(state): State<AppState>,
    auth: MaybeIdentity,
    Path((tenant_id, domain_id)): Path<(TenantId, DomainId)>,
) -> ApiResult<Json<TenantDomainResponse>> {
    state.records.authorize(identity(&auth), tenant_id).await?;
    let record = tenant_domain(&state, tenant_id, domain_id).await?;

    match state.registrar.verify_domain(&record.domain).await {
        Ok(info) => {
            let record = if info.verified {
                state
                    .records
                    .verify_domain(identity(&auth), domain_id)
                    .await?
            } else {
                info!(domain = %record.domain, "Domain not yet verified at registrar");
                record
            };
            Ok(Json(TenantDomainResponse {
                domain: record,
                registrar: info,
            }))
        }
        Err(e) => {
            // Only a pending record moves to failed
            if let Err(store_err) = state.records.fail_domain(identity(&auth), domain_id).await {
                error!(
                    domain = %record.domain,
                    error = %store_err,
                    "Failed to record verification failure"
                );
            }
            Err(e.into())
        }
    }
}

/// DELETE /tenants/:tenant_id/domains/:domain_id
pub async fn delete_domain(
    State(state): State<AppState>,
    auth: MaybeIdentity,
    Path((tenant_id, domain_id)): Path<(TenantId, DomainId)>,
) -> ApiResult<StatusCode> {
    state.records.authorize(identity(&auth), tenant_id).await?;
    let record = tenant_domain(&state, tenant_id, domain_id).await?;

    state.registrar.remove_domain(&record.domain).await?;
    state
        .records
        .remove_domain(identity(&auth), domain_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /tenants/:tenant_id/domains/:domain_id/landing-pages
pub async fn attach_landing_page(
    State(state): State<AppState>,
    auth: MaybeIdentity,
    Path((tenant_id, domain_id)): Path<(TenantId, DomainId)>,
    payload: Result<Json<AttachLandingPageRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<LandingPageDomain>)> {
    let req = json_body(payload)?;
    state.records.authorize(identity(&auth), tenant_id).await?;
    tenant_domain(&state, tenant_id, domain_id).await?;

    let mapping = state
        .records
        .attach_to_landing_page(
            identity(&auth),
            domain_id,
            req.landing_page_id,
            req.is_default,
            req.path,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(mapping)))
}
