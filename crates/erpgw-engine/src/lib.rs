//! ERP Gateway Engine - Orchestration layer
//!
//! Coordinates the pure core (gate, pricing stages) with the database
//! access layer. Nothing here knows about HTTP.

pub mod commands;
pub mod resolvers;

pub use commands::adhoc_query::{run_adhoc_query, QueryLimits, QueryOutcome};
pub use commands::price_stock::run_price_stock;
pub use resolvers::{resolver_for, Backend, PriceStockResolver, PricingSettings};
