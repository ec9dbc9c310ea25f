//! Error responses for the HTTP API.
//!
//! Every failure leaves the server as
//! `{ "code": "...", "message": "...", "details": {...} }`.
//!
//! ```text
//! CoreError ─┐
//!            ├──► ApiError ──► (StatusCode, Json<ErrorBody>)
//! DbError ───┘
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::error;

use gearbox_core::{CoreError, ValidationError};
use gearbox_db::DbError;

/// API error with an HTTP status and a stable machine-readable code.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "CONFLICT", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    /// Generic 500. The real cause is logged, never sent.
    pub fn database(cause: &dyn std::fmt::Display) -> Self {
        error!(error = %cause, "Database error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "DATABASE_ERROR",
            "Database error",
        )
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Adds one key to the details object, creating it if needed.
    pub fn with_detail(mut self, key: &str, value: impl Serialize) -> Self {
        let Ok(value) = serde_json::to_value(value) else {
            return self;
        };
        match &mut self.details {
            Some(Value::Object(map)) => {
                map.insert(key.to_string(), value);
            }
            _ => {
                let mut map = Map::new();
                map.insert(key.to_string(), value);
                self.details = Some(Value::Object(map));
            }
        }
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code,
            message: &self.message,
            details: self.details.as_ref(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::from(CoreError::Validation(err))
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::ProductNotFound(_) => ApiError::not_found(message),

            CoreError::LineProductNotFound { line_no, product_id } => ApiError::not_found(message)
                .with_details(json!({ "item": line_no, "productId": product_id })),

            CoreError::InsufficientStock {
                line_no,
                product,
                available,
                requested,
            } => ApiError::new(StatusCode::CONFLICT, "INSUFFICIENT_STOCK", message).with_details(
                json!({
                    "item": line_no,
                    "product": product,
                    "available": available,
                    "requested": requested,
                }),
            ),

            CoreError::CategoryInUse { product_count } => ApiError::validation(message)
                .with_details(json!({ "productCount": product_count })),

            CoreError::Validation(ValidationError::LineItem { line_no, .. }) => {
                ApiError::validation(message).with_details(json!({ "item": line_no }))
            }

            CoreError::Validation(_) => ApiError::validation(message),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => core.into(),
            DbError::NotFound { .. } => ApiError::not_found(err.to_string()),
            DbError::UniqueViolation { .. } => ApiError::conflict(err.to_string()),
            DbError::ForeignKeyViolation { .. } => {
                ApiError::validation("Referenced record does not exist")
            }
            other => ApiError::database(&other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_not_found_carries_item() {
        let err = ApiError::from(DbError::Domain(CoreError::LineProductNotFound {
            line_no: 2,
            product_id: "p-9".to_string(),
        }));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "NOT_FOUND");
        assert_eq!(err.message, "Product not found: p-9");
        assert_eq!(err.details, Some(json!({ "item": 2, "productId": "p-9" })));
    }

    #[test]
    fn test_insufficient_stock_is_conflict() {
        let err = ApiError::from(CoreError::InsufficientStock {
            line_no: 1,
            product: "Oil Filter".to_string(),
            available: 5,
            requested: 6,
        });
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "INSUFFICIENT_STOCK");
        assert_eq!(
            err.message,
            "Insufficient stock for Oil Filter. Available: 5, Requested: 6"
        );
    }

    #[test]
    fn test_storage_faults_are_hidden() {
        let err = ApiError::from(DbError::QueryFailed("no such table: sales".to_string()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, "DATABASE_ERROR");
        assert!(!err.message.contains("sales"));

        let err = ApiError::from(DbError::duplicate("barcode", "123"));
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[test]
    fn test_with_detail_merges() {
        let err = ApiError::validation("Valid quantity is required for item 1")
            .with_details(json!({ "item": 1 }))
            .with_detail("line", json!({ "productId": "p", "quantity": 0 }));
        assert_eq!(
            err.details,
            Some(json!({ "item": 1, "line": { "productId": "p", "quantity": 0 } }))
        );
    }
}
