//! Error responses
//!
//! Every failure leaves as `{error, code, details}`. Only the message of a
//! `GwError` is shown; its detail stays in the logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use erpgw_core::{GwError, GwErrorKind};
use serde::Serialize;
use serde_json::{Map, Value};

pub const PRICE_STOCK_FAILED: &str = "PRICE_STOCK_FAILED";

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    pub details: Map<String, Value>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn unauthorised() -> Self {
        Self::from_kind(GwErrorKind::Unauthorised)
    }

    pub fn not_found() -> Self {
        Self::from_kind(GwErrorKind::NotFound)
    }

    pub fn invalid_json() -> Self {
        Self::from_kind(GwErrorKind::InvalidJson)
    }

    /// Errors from the price & stock path: database failures get their own code
    pub fn pricing(err: GwError) -> Self {
        if err.kind() == GwErrorKind::Execution {
            return Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                PRICE_STOCK_FAILED,
                "Failed to load price and stock",
            );
        }
        Self::from(err)
    }

    fn from_kind(kind: GwErrorKind) -> Self {
        Self::new(status_for(kind), kind.code(), default_message(kind))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<GwError> for ApiError {
    fn from(err: GwError) -> Self {
        let kind = err.kind();
        let message = if shows_own_message(kind) && !err.message().is_empty() {
            err.message().to_string()
        } else {
            default_message(kind).to_string()
        };
        Self::new(status_for(kind), kind.code(), message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            code: self.code,
            details: Map::new(),
        };
        (self.status, Json(body)).into_response()
    }
}

pub fn status_for(kind: GwErrorKind) -> StatusCode {
    match kind {
        GwErrorKind::QueryRequired
        | GwErrorKind::MultiStatement
        | GwErrorKind::CommentsNotAllowed
        | GwErrorKind::NotReadOnly
        | GwErrorKind::InvalidParameterName
        | GwErrorKind::InvalidJson
        | GwErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        GwErrorKind::Unauthorised => StatusCode::UNAUTHORIZED,
        GwErrorKind::NotFound => StatusCode::NOT_FOUND,
        GwErrorKind::RowLimitExceeded => StatusCode::PAYLOAD_TOO_LARGE,
        GwErrorKind::ExecutionTimeout => StatusCode::GATEWAY_TIMEOUT,
        GwErrorKind::ResourceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        GwErrorKind::Execution | GwErrorKind::Config | GwErrorKind::Io | GwErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

// Messages of these kinds are written for callers; the rest may carry
// internals and are replaced.
fn shows_own_message(kind: GwErrorKind) -> bool {
    kind.is_validation() || matches!(kind, GwErrorKind::InvalidInput)
}

fn default_message(kind: GwErrorKind) -> &'static str {
    match kind {
        GwErrorKind::QueryRequired => "Query is required",
        GwErrorKind::MultiStatement => "Multiple statements are not allowed",
        GwErrorKind::CommentsNotAllowed => "SQL comments are not allowed",
        GwErrorKind::NotReadOnly => "Only SELECT queries are allowed",
        GwErrorKind::InvalidParameterName => "Invalid parameter name",
        GwErrorKind::InvalidJson => "Invalid JSON body",
        GwErrorKind::InvalidInput => "Invalid request",
        GwErrorKind::Unauthorised => "Unauthorized",
        GwErrorKind::NotFound => "Not found",
        GwErrorKind::RowLimitExceeded => "Row limit exceeded",
        GwErrorKind::ExecutionTimeout => "Query timeout",
        GwErrorKind::Execution => "Query execution failed",
        GwErrorKind::ResourceUnavailable => "Database connection unavailable",
        GwErrorKind::Config | GwErrorKind::Io | GwErrorKind::Internal => "Internal server error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(GwErrorKind::NotReadOnly), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(GwErrorKind::RowLimitExceeded), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(status_for(GwErrorKind::ExecutionTimeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status_for(GwErrorKind::ResourceUnavailable), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_driver_text_not_exposed() {
        let err = GwError::new(GwErrorKind::Execution)
            .with_message("Invalid object name 'dbo.Secret'")
            .with_detail("tds: 208");
        let api = ApiError::from(err);
        assert_eq!(api.message, "Query execution failed");
        assert_eq!(api.code(), "DB_ERROR");
    }

    #[test]
    fn test_pricing_execution_code() {
        let api = ApiError::pricing(GwError::new(GwErrorKind::Execution));
        assert_eq!(api.code(), PRICE_STOCK_FAILED);
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let timeout = ApiError::pricing(GwError::new(GwErrorKind::ExecutionTimeout));
        assert_eq!(timeout.code(), "SQL_TIMEOUT");
    }

    #[test]
    fn test_validation_message_kept() {
        let api = ApiError::from(GwError::new(GwErrorKind::InvalidInput).with_message("userExtId is required"));
        assert_eq!(api.message, "userExtId is required");
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
    }
}
