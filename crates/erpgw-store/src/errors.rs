//! Error helpers for erpgw-store
//!
//! Driver text goes into `detail`, which is logged and never returned to
//! API callers.

use erpgw_core::errors::{GwError, GwErrorKind};

/// Result type alias using GwError
pub type Result<T> = std::result::Result<T, GwError>;

/// A database-reported failure while running a statement
pub fn from_tiberius(op: &str, err: tiberius::error::Error) -> GwError {
    GwError::new(GwErrorKind::Execution)
        .with_op(op.to_string())
        .with_message("Database query failed")
        .with_detail(err.to_string())
}

/// No connection could be obtained or established
pub fn unavailable(op: &str, detail: impl std::fmt::Display) -> GwError {
    GwError::new(GwErrorKind::ResourceUnavailable)
        .with_op(op.to_string())
        .with_message("Database unavailable")
        .with_detail(detail.to_string())
}

/// The result exceeded the configured row cap
pub fn row_limit_exceeded(max_rows: usize) -> GwError {
    GwError::new(GwErrorKind::RowLimitExceeded)
        .with_op("collect_rows")
        .with_message(format!("Result exceeds the {} row limit", max_rows))
}
