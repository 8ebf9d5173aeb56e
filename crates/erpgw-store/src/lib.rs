//! ERP Gateway Store - database access
//!
//! - [`SqlExecutor`]: the seam every query goes through
//! - [`Statement`]: statement text with named, typed parameters
//! - [`tds`]: pooled SQL Server implementation
//! - [`RowCollector`]: multi-result-set accumulation under a row cap

pub mod collect;
pub mod errors;
pub mod executor;
pub mod params;
pub mod tds;

pub use collect::RowCollector;
pub use executor::{SqlExecutor, Statement};
pub use params::ConnectionParams;
pub use tds::{open, TdsExecutor};
