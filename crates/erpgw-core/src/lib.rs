//! ERP Gateway Core - pure, I/O-free logic
//!
//! - Canonical error facility (`GwError`, `GwErrorKind`)
//! - Structured logging facility and operation macros
//! - The SQL Safety Gate: read-only validation and parameter binding
//! - Scalar/row model shared with the database layer
//! - Pricing domain: discount aggregation, cascade stages, kit stock

pub mod errors;
pub mod gate;
pub mod logging_facility;
pub mod pricing;
pub mod value;

pub use errors::{GwError, GwErrorKind, RejectReason, Result};
pub use gate::{evaluate, QueryRequest, ValidationOutcome};
pub use value::{ResultTable, Row, RowExt, SqlValue};
