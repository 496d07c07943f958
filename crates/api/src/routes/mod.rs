//! API routes

pub mod domains;
pub mod health;
pub mod records;
pub mod tenants;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{auth::optional_auth, security::cors_middleware, state::AppState};

/// Create all API routes
pub fn create_router(state: AppState) -> Router {
    // Health check routes (infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness));

    // Registrar-facing domain routes
    let domain_routes = Router::new()
        .route(
            "/domains",
            get(domains::get_domain_configuration_query).post(domains::add_domain),
        )
        .route(
            "/domains/:domain",
            get(domains::get_domain_configuration).delete(domains::remove_domain),
        )
        .route("/domains/:domain/status", get(domains::get_domain_status))
        .route("/domains/:domain/verify", post(domains::verify_domain));

    // Record lookups for the host router
    let record_routes = Router::new().route("/records/:domain", get(records::get_record));

    // Tenant management (identity checked per mutation)
    let tenant_routes = Router::new()
        .route(
            "/tenants",
            get(tenants::list_tenants).post(tenants::create_tenant),
        )
        .route(
            "/tenants/:tenant_id",
            get(tenants::get_tenant)
                .patch(tenants::update_tenant)
                .delete(tenants::delete_tenant),
        )
        .route(
            "/tenants/:tenant_id/domains",
            get(tenants::list_domains).post(tenants::create_domain),
        )
        .route(
            "/tenants/:tenant_id/domains/:domain_id",
            delete(tenants::delete_domain),
        )
        .route(
            "/tenants/:tenant_id/domains/:domain_id/verify",
            post(tenants::verify_domain),
        )
        .route(
            "/tenants/:tenant_id/domains/:domain_id/landing-pages",
            post(tenants::attach_landing_page),
        )
        .layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            optional_auth,
        ));

    Router::new()
        .merge(health_routes)
        .merge(domain_routes)
        .merge(record_routes)
        .merge(tenant_routes)
        .layer(middleware::from_fn_with_state(
            state.cors.clone(),
            cors_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
