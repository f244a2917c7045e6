use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::error::ErrorKind;
use domain::services::{CheckoutError, LifecycleError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The addressed record exists but its state forbids the request.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl ApiError {
    /// Maps a domain classification to the HTTP error carrying `message`.
    pub fn from_kind(kind: ErrorKind, message: String) -> Self {
        match kind {
            ErrorKind::Authorization => ApiError::Forbidden(message),
            ErrorKind::Validation => ApiError::Validation(message),
            ErrorKind::NotFound => ApiError::NotFound(message),
            ErrorKind::InvalidState => ApiError::InvalidState(message),
            ErrorKind::Transient => ApiError::ServiceUnavailable(message),
            ErrorKind::Internal => ApiError::Internal(message),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) | ApiError::InvalidState(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_code, message) = match self {
            ApiError::Unauthorized(msg) => ("unauthorized", msg),
            ApiError::Forbidden(msg) => ("forbidden", msg),
            ApiError::NotFound(msg) => ("not_found", msg),
            ApiError::Validation(msg) => ("validation_error", msg),
            ApiError::InvalidState(msg) => ("invalid_state", msg),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("internal_error", "An internal error occurred".to_string())
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (
                    "service_unavailable",
                    "Service temporarily unavailable. Please retry.".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        let message = match &err {
            // Store failures carry backend detail in their source chain.
            LifecycleError::Unavailable(source) | LifecycleError::Store(source) => {
                source.to_string()
            }
            _ => err.to_string(),
        };
        ApiError::from_kind(err.kind(), message)
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::from_kind(err.kind(), err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::services::StoreError;

    #[test]
    fn test_api_error_status_codes() {
        let cases = [
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::InvalidState("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                ApiError::ServiceUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            format!("{}", ApiError::Unauthorized("test".to_string())),
            "Unauthorized: test"
        );
        assert_eq!(
            format!("{}", ApiError::InvalidState("test".to_string())),
            "Invalid state: test"
        );
    }

    #[test]
    fn test_lifecycle_errors_map_by_kind() {
        let forbidden: ApiError = LifecycleError::AdminRequired.into();
        assert!(matches!(forbidden, ApiError::Forbidden(ref m) if m == "Admin privileges required"));

        let mismatch: ApiError = LifecycleError::EmailMismatch.into();
        assert_eq!(mismatch.status(), StatusCode::FORBIDDEN);

        let cancelled: ApiError = LifecycleError::AlreadyCancelled.into();
        assert!(
            matches!(cancelled, ApiError::InvalidState(ref m) if m == "Invitation already cancelled")
        );

        let conflict: ApiError = LifecycleError::TransitionConflict.into();
        assert_eq!(conflict.status(), StatusCode::BAD_REQUEST);

        let missing: ApiError = LifecycleError::NotFound.into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_store_outage_maps_to_service_unavailable() {
        let err: ApiError =
            LifecycleError::from(StoreError::Unavailable("pool timed out".into())).into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.to_string().contains("pool timed out"));
    }

    #[test]
    fn test_store_failure_maps_to_internal() {
        let err: ApiError = LifecycleError::from(StoreError::Backend("syntax".into())).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_checkout_error_maps_to_validation() {
        let err: ApiError =
            CheckoutError::InvalidRequest("Valid subscription tier is required".into()).into();
        assert!(
            matches!(err, ApiError::Validation(ref m) if m == "Valid subscription tier is required")
        );
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::InvalidState("Invitation already accepted".into()).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["error"], "invalid_state");
        assert_eq!(json["message"], "Invitation already accepted");
    }

    #[tokio::test]
    async fn test_internal_detail_is_not_returned() {
        let response = ApiError::Internal("password=hunter2".into()).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();

        assert!(!text.contains("hunter2"));
    }
}
