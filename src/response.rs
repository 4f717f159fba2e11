//! API Response Envelope & Error Taxonomy
//! Mission: Uniform JSON envelopes and HTTP error mapping for every handler

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

/// Standard response envelope: `{ success, message, data }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    pub data: Value,
}

impl ApiResponse {
    pub fn ok<T: Serialize>(message: &str, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.to_string(),
            data: serde_json::to_value(data).unwrap_or(Value::Null),
        })
    }

    pub fn message(message: &str) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.to_string(),
            data: Value::Null,
        })
    }
}

/// Request-terminal errors surfaced by guards, resolvers, and services.
///
/// `Unauthorized` means "log in again"; `Forbidden` means "insufficient
/// privilege"; clients rely on the distinction.
#[derive(Debug)]
pub enum ApiError {
    /// No Authorization header on a non-public route.
    NoToken,
    /// Malformed scheme, bad signature, or expired token.
    Unauthorized(String),
    /// Authenticated but lacking a required role; message names the role(s).
    Forbidden(String),
    /// Role label outside the recognized set, or other bad input.
    BadRequest(String),
    /// Entity lookup missed; message is entity-specific.
    NotFound(String),
    /// Duplicate unique key on create.
    AlreadyExists(String),
    /// Structured validation failures for a request body.
    Validation(Vec<String>),
    /// Persistence or other internal failure; cause is logged, not leaked.
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NoToken => (
                StatusCode::UNAUTHORIZED,
                "You are not authorized to access this resource".to_string(),
            ),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::AlreadyExists(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Validation(errors) => {
                let body = Json(json!({
                    "success": false,
                    "message": "Validation failed",
                    "data": errors,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "success": false,
            "message": message,
            "data": Value::Null,
        }));
        (status, body).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("internal error: {err:#}");
        ApiError::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            ApiError::NoToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("This resource is only for ADMIN".into())
                .into_response()
                .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound("The minesite with the provided id is not found".into())
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::AlreadyExists("duplicate".into())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_ok_envelope_shape() {
        let resp = ApiResponse::ok("All minesites were retrieved successfully", vec![1, 2, 3]);
        assert!(resp.success);
        assert_eq!(resp.data, json!([1, 2, 3]));
    }
}
