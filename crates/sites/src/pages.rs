//! Tenant site handlers

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::resolver::ResolvedSite;

/// Render the landing page for a resolved tenant site
pub async fn tenant_page(site: Option<Extension<ResolvedSite>>) -> Response {
    let Some(Extension(site)) = site else {
        // App host or bypassed path; nothing is served here for those
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };

    Html(format!(
        "<!doctype html>\n<html>\n<head><meta charset=\"utf-8\"><title>{domain}</title></head>\n\
         <body data-tenant-id=\"{tenant}\">\n<h1>{domain}</h1>\n</body>\n</html>\n",
        domain = site.domain,
        tenant = site.tenant_id,
    ))
    .into_response()
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}
