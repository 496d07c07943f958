//! Bearer-token identity extraction

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use super::jwt::JwtManager;

/// Attach an [`Identity`](tenantsite_shared::Identity) extension when the
/// request carries a valid bearer token.
///
/// Never rejects: handlers decide whether an identity is required, and the
/// record layer turns a missing one into a 401.
pub async fn optional_auth(
    State(jwt): State<JwtManager>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    if let Some(token) = token {
        match jwt.validate_token(token) {
            Ok(claims) => {
                request.extensions_mut().insert(claims.identity());
            }
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid bearer token");
            }
        }
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        extract::Extension,
        http::{Request as HttpRequest, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Router,
    };
    use tenantsite_shared::Identity;
    use tower::ServiceExt;

    const SECRET: &str = "test-secret-key-at-least-32-chars!";

    async fn whoami(identity: Option<Extension<Identity>>) -> String {
        identity
            .map(|Extension(id)| id.subject)
            .unwrap_or_else(|| "anonymous".to_string())
    }

    fn app() -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(from_fn_with_state(JwtManager::new(SECRET), optional_auth))
    }

    async fn call(auth: Option<String>) -> String {
        let mut builder = HttpRequest::builder().uri("/whoami");
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        let response = app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_sets_identity() {
        let token = JwtManager::new(SECRET).issue_token("user_1", 1).unwrap();
        assert_eq!(call(Some(format!("Bearer {token}"))).await, "user_1");
    }

    #[tokio::test]
    async fn test_missing_or_invalid_token_is_anonymous() {
        assert_eq!(call(None).await, "anonymous");
        assert_eq!(call(Some("Bearer garbage".into())).await, "anonymous");
        assert_eq!(call(Some("Basic dXNlcjpwYXNz".into())).await, "anonymous");
    }
}
