//! API error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use tenantsite_shared::StoreError;

use crate::registrar::RegistrarError;

/// Application error type
///
/// Every variant renders as `{"error": "<message>"}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // Authentication errors
    #[error("Not authenticated")]
    Unauthorized,
    #[error("Not authorized")]
    Forbidden,

    // Validation errors
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    BadRequest(String),

    // Resource errors
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),

    // Upstream errors, carrying the fixed per-operation message
    #[error("{0}")]
    Upstream(&'static str),

    // Internal errors
    #[error("Database error: {0}")]
    Database(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            // Authentication
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),

            // Validation
            ApiError::Validation(msg) | ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            // Resources
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),

            // Upstream
            ApiError::Upstream(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.to_string()),

            // Internal
            ApiError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotAuthenticated => ApiError::Unauthorized,
            StoreError::NotAuthorized => ApiError::Forbidden,
            StoreError::Validation(msg) => ApiError::Validation(msg),
            StoreError::NotFound(what) => ApiError::NotFound(what),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Database(msg) => ApiError::Database(msg),
        }
    }
}

/// Registrar failures, including locally rejected domains, surface as the
/// operation's fixed 500 message.
impl From<RegistrarError> for ApiError {
    fn from(err: RegistrarError) -> Self {
        ApiError::Upstream(err.operation().failure_message())
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registrar::Operation;
    use axum::body::to_bytes;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_store_errors_map_to_status_codes() {
        let cases = [
            (StoreError::NotAuthenticated, StatusCode::UNAUTHORIZED),
            (StoreError::NotAuthorized, StatusCode::FORBIDDEN),
            (StoreError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (StoreError::NotFound("Tenant"), StatusCode::NOT_FOUND),
            (StoreError::Conflict("taken".into()), StatusCode::CONFLICT),
            (StoreError::Database("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            let (status, body) = render(err.into()).await;
            assert_eq!(status, expected);
            assert!(body["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_registrar_errors_use_fixed_message() {
        let reserved = RegistrarError::ReservedDomain {
            domain: "app.platform.com".into(),
            operation: Operation::Remove,
        };
        let (status, body) = render(reserved.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Failed to remove domain" }));

        let (_, body) = render(RegistrarError::Upstream(Operation::GetConfiguration).into()).await;
        assert_eq!(body, json!({ "error": "Failed to get domain configuration" }));
    }

    #[tokio::test]
    async fn test_database_detail_not_leaked() {
        let (_, body) = render(ApiError::Database("relation missing".into())).await;
        assert_eq!(body, json!({ "error": "Database error" }));
    }
}
