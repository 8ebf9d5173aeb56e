//! Price & stock domain
//!
//! Everything here is pure: the engine reads rows from the ERP and feeds
//! them through these functions.

pub mod cascade;
pub mod discount;
pub mod kit;
pub mod model;
pub mod rule_engine;

pub use discount::{combine, AggregationMode};
pub use model::{
    ItemPricingState, PriceStockItem, PriceStockRequest, PriceStockResult, Provenance,
    StockByWarehouse,
};
