//! Canonical logging macros
//!
//! Callers must also depend on `erpgw-core-types` for the schema constants.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use erpgw_core::log_op_start;
/// log_op_start!("adhoc_query");
/// log_op_start!("price_stock", sku_count = 3);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = erpgw_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = erpgw_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use erpgw_core::log_op_end;
/// log_op_end!("adhoc_query", duration_ms = 42);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = erpgw_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = erpgw_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// Validation failures are logged at `warn`; everything else at `error`
/// with the internal detail attached.
///
/// # Example
///
/// ```
/// # use erpgw_core::log_op_error;
/// use erpgw_core::errors::RejectReason;
/// log_op_error!("adhoc_query", RejectReason::NotReadOnly, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        use $crate::errors::GwError;
        let gw_err: GwError = $err.into();
        if gw_err.kind().is_validation() {
            tracing::warn!(
                component = module_path!(),
                op = $op,
                event = erpgw_core_types::schema::EVENT_END_ERROR,
                duration_ms = $duration,
                err.kind = ?gw_err.kind(),
                err.code = gw_err.code(),
            );
        } else {
            tracing::error!(
                component = module_path!(),
                op = $op,
                event = erpgw_core_types::schema::EVENT_END_ERROR,
                duration_ms = $duration,
                err.kind = ?gw_err.kind(),
                err.code = gw_err.code(),
                err.detail = gw_err.detail().unwrap_or(""),
            );
        }
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        use $crate::errors::GwError;
        let gw_err: GwError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = erpgw_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?gw_err.kind(),
            err.code = gw_err.code(),
            err.detail = gw_err.detail().unwrap_or(""),
            $($field)*
        );
    }};
}
