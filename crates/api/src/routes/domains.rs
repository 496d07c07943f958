//! Registrar-facing domain routes
//!
//! Thin handlers over the registrar client and reconciliation service. Any
//! failure is a 500 with the operation's fixed message; only a missing
//! `domain` query parameter is a 400.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::warn;

use crate::{
    error::{ApiError, ApiResult},
    reconcile::DomainConfiguration,
    registrar::{Operation, RegistrarDomainInfo},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct AddDomainRequest {
    #[serde(default)]
    pub domain: String,
}

#[derive(Debug, Deserialize)]
pub struct DomainQuery {
    pub domain: Option<String>,
}

/// POST /domains
pub async fn add_domain(
    State(state): State<AppState>,
    payload: Result<Json<AddDomainRequest>, JsonRejection>,
) -> ApiResult<Json<RegistrarDomainInfo>> {
    let Json(req) = payload.map_err(|e| {
        warn!(error = %e, "Rejected add-domain body");
        ApiError::Upstream(Operation::Add.failure_message())
    })?;
    let info = state.registrar.add_domain(&req.domain).await?;
    Ok(Json(info))
}

/// GET /domains?domain=
pub async fn get_domain_configuration_query(
    State(state): State<AppState>,
    Query(query): Query<DomainQuery>,
) -> ApiResult<Json<DomainConfiguration>> {
    let domain = query
        .domain
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Domain parameter is required".to_string()))?;

    let result = state.reconciler.get_domain_configuration(&domain).await?;
    Ok(Json(result))
}

/// GET /domains/:domain
///
/// Triggers re-verification for unverified domains; see
/// [`get_domain_status`] for the read-only variant.
pub async fn get_domain_configuration(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> ApiResult<Json<DomainConfiguration>> {
    let result = state.reconciler.get_domain_configuration(&domain).await?;
    Ok(Json(result))
}

/// GET /domains/:domain/status
pub async fn get_domain_status(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> ApiResult<Json<DomainConfiguration>> {
    let result = state.reconciler.get_status(&domain).await?;
    Ok(Json(result))
}

/// POST /domains/:domain/verify
pub async fn verify_domain(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> ApiResult<Json<RegistrarDomainInfo>> {
    let info = state.reconciler.verify_domain(&domain).await?;
    Ok(Json(info))
}

/// DELETE /domains/:domain
pub async fn remove_domain(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> ApiResult<StatusCode> {
    state.registrar.remove_domain(&domain).await?;
    Ok(StatusCode::NO_CONTENT)
}
