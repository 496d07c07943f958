//! Domain record lookup for the public host router

use axum::{
    extract::{Path, State},
    Json,
};

use tenantsite_shared::DomainRecord;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// GET /records/:domain
pub async fn get_record(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> ApiResult<Json<DomainRecord>> {
    state
        .records
        .find_domain(&domain)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Domain"))
}
