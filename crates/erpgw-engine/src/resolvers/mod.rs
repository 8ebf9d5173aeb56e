//! Backend-specific price & stock strategies
//!
//! Both ERPs answer the same question through [`PriceStockResolver`]; the
//! backend is picked once at startup with [`resolver_for`].

pub mod cascade;
pub mod rule_engine;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use erpgw_core::pricing::{PriceStockRequest, PriceStockResult};
use erpgw_core::{GwError, GwErrorKind, ResultTable};
use erpgw_store::errors::Result;
use erpgw_store::SqlExecutor;
use serde::Deserialize;

pub use cascade::CascadeResolver;
pub use rule_engine::RuleEngineResolver;

/// Which ERP the gateway fronts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Cascading discounts over account hierarchies
    Hasavshevet,
    /// Discount-group rule engine
    Sap,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Hasavshevet => "hasavshevet",
            Backend::Sap => "sap",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = GwError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hasavshevet" => Ok(Backend::Hasavshevet),
            "sap" => Ok(Backend::Sap),
            other => Err(GwError::new(GwErrorKind::Config)
                .with_op("parse_backend")
                .with_message(format!("Unsupported erp '{}'", other))),
        }
    }
}

/// Schema constants and defaults the strategies need
#[derive(Debug, Clone, PartialEq)]
pub struct PricingSettings {
    /// Used when a request names no warehouse
    pub default_warehouses: Vec<String>,
    /// Items on this price list always sell at their last transacted price
    pub last_price_price_list: i64,
    pub invoice_document_id: i64,
    pub order_document_id: i64,
    /// Order numbers with this prefix never reserve stock
    pub excluded_order_prefix: String,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            default_warehouses: vec!["10".to_string()],
            last_price_price_list: 99,
            invoice_document_id: 1,
            order_document_id: 11,
            excluded_order_prefix: "90".to_string(),
        }
    }
}

#[async_trait]
pub trait PriceStockResolver: Send + Sync {
    fn backend(&self) -> Backend;

    /// One item per requested SKU (trimmed, de-duplicated). An empty SKU
    /// list returns no items and touches no database.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for requests the backend cannot answer, otherwise
    /// the first failing data-access error.
    async fn resolve(&self, request: &PriceStockRequest) -> Result<PriceStockResult>;
}

pub fn resolver_for(
    backend: Backend,
    executor: Arc<dyn SqlExecutor>,
    settings: PricingSettings,
) -> Arc<dyn PriceStockResolver> {
    match backend {
        Backend::Hasavshevet => Arc::new(CascadeResolver::new(executor, settings)),
        Backend::Sap => Arc::new(RuleEngineResolver::new(executor, settings)),
    }
}

/// The `index`-th result set, or an empty one when the statement produced
/// fewer sets
pub(crate) fn take_set(sets: &mut [ResultTable], index: usize) -> ResultTable {
    sets.get_mut(index).map(std::mem::take).unwrap_or_default()
}
