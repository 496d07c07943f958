//! CORS middleware
//!
//! The dashboard is the only browser origin allowed to call the API.
//! Preflight requests are answered here and never reach a handler.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};

const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";
const PREFLIGHT_MAX_AGE: &str = "86400";

/// Allowed origin for cross-origin requests
#[derive(Clone)]
pub struct CorsPolicy {
    allow_origin: HeaderValue,
}

impl CorsPolicy {
    /// Returns `None` if `origin` is not a valid header value
    pub fn new(origin: &str) -> Option<Self> {
        HeaderValue::from_str(origin)
            .ok()
            .map(|allow_origin| Self { allow_origin })
    }

    fn apply(&self, response: &mut Response) {
        let headers = response.headers_mut();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            self.allow_origin.clone(),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
    }
}

pub async fn cors_middleware(
    State(policy): State<CorsPolicy>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        policy.apply(&mut response);
        response.headers_mut().insert(
            header::ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static(PREFLIGHT_MAX_AGE),
        );
        return response;
    }

    let mut response = next.run(request).await;
    policy.apply(&mut response);
    response
}
