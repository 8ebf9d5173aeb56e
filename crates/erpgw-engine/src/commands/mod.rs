//! Command orchestration layer.
//!
//! Each command wraps one externally visible operation with its deadline
//! and its canonical start/end/error log events.

pub mod adhoc_query;
pub mod price_stock;

use std::time::Duration;

use erpgw_core::{GwError, GwErrorKind};

/// The error reported when `op` ran past its deadline
pub(crate) fn deadline_exceeded(op: &str, limit: Duration) -> GwError {
    GwError::new(GwErrorKind::ExecutionTimeout)
        .with_op(op)
        .with_message("Query timed out")
        .with_detail(format!("deadline of {} ms elapsed", limit.as_millis()))
}
