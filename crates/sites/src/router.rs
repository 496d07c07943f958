//! Per-request host routing middleware

use axum::{
    extract::{Request, State},
    http::{header, uri::PathAndQuery},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, warn};

use crate::{resolver::Resolution, SitesState};

/// Paths served by the platform itself regardless of host
pub const BYPASS_PREFIXES: &[&str] = &["/_next", "/favicon.ico", "/api", "/trpc", "/health"];

/// Matches whole path segments, so `/apiary` is not under `/api`
fn is_bypassed(path: &str) -> bool {
    BYPASS_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// Same path and query on the platform app
fn app_redirect(app_url: &str, request: &Request) -> Response {
    let path = request
        .uri()
        .path_and_query()
        .map(PathAndQuery::as_str)
        .unwrap_or("/");
    Redirect::temporary(&format!("{app_url}{path}")).into_response()
}

/// Resolve the `Host` header before any handler runs.
///
/// Verified custom domains get a [`ResolvedSite`](crate::resolver::ResolvedSite)
/// extension. Unknown and unverified hosts, and lookup failures, are
/// redirected to the platform app.
pub async fn host_router(
    State(state): State<SitesState>,
    mut request: Request,
    next: Next,
) -> Response {
    if is_bypassed(request.uri().path()) {
        return next.run(request).await;
    }

    let Some(host) = request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
    else {
        return app_redirect(&state.config.app_url, &request);
    };

    match state.resolver.resolve(&host).await {
        Ok(Resolution::AppHost) => next.run(request).await,
        Ok(Resolution::Site(site)) => {
            debug!(host = %host, tenant_id = %site.tenant_id, "Serving tenant site");
            request.extensions_mut().insert(site);
            next.run(request).await
        }
        Ok(Resolution::Redirect) => {
            debug!(host = %host, "Host not servable, redirecting to app");
            app_redirect(&state.config.app_url, &request)
        }
        Err(e) => {
            warn!(host = %host, error = %e, "Host lookup failed, redirecting to app");
            app_redirect(&state.config.app_url, &request)
        }
    }
}
