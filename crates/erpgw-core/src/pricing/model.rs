use std::collections::{BTreeMap, HashSet};

use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Value};

/// Price-list / document number used when the caller gives no usable hint
pub const DEFAULT_DOCUMENT_ID: i64 = 1;

/// A batch price and stock question for one account
#[derive(Debug, Clone, Default)]
pub struct PriceStockRequest {
    pub skus: Vec<String>,
    pub price_list_hints: Vec<String>,
    pub warehouses: Vec<String>,
    pub account_id: String,
    pub as_of: Option<NaiveDate>,
}

impl PriceStockRequest {
    /// Trimmed, de-duplicated SKUs in first-seen order
    pub fn skus_first_seen(&self) -> Vec<String> {
        unique_trimmed(&self.skus)
    }

    /// Trimmed, de-duplicated SKUs in ascending order
    pub fn skus_sorted(&self) -> Vec<String> {
        let mut skus = unique_trimmed(&self.skus);
        skus.sort();
        skus
    }

    /// Requested warehouses, or `defaults` when none were given
    pub fn warehouses_or(&self, defaults: &[String]) -> Vec<String> {
        let requested = unique_trimmed(&self.warehouses);
        if requested.is_empty() {
            unique_trimmed(defaults)
        } else {
            requested
        }
    }

    pub fn account(&self) -> &str {
        self.account_id.trim()
    }

    pub fn as_of_or_today(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Local::now().date_naive())
    }

    /// First positive integer among the price-list hints
    pub fn document_id(&self) -> i64 {
        self.price_list_hints
            .iter()
            .filter_map(|h| h.trim().parse::<i64>().ok())
            .find(|n| *n > 0)
            .unwrap_or(DEFAULT_DOCUMENT_ID)
    }
}

/// Trim every value, drop blanks and keep the first occurrence of each
pub fn unique_trimmed<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|v| v.as_ref().trim())
        .filter(|v| !v.is_empty() && seen.insert(v.to_string()))
        .map(str::to_string)
        .collect()
}

/// Round to the four decimal places the ERP stores money in
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Which rule produced an item's current price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provenance {
    #[default]
    BasePrice,
    AccountDiscount,
    ParentDiscount,
    SpecialPrice,
    /// Last transacted price undercut the resolved price
    LastPrice,
    /// Item sits on the price list that always sells at the last price
    LastPricePriceList,
}

impl Provenance {
    pub fn tag(&self) -> &'static str {
        match self {
            Provenance::BasePrice => "basePrice",
            Provenance::AccountDiscount => "accountDiscount",
            Provenance::ParentDiscount => "parentDiscount",
            Provenance::SpecialPrice => "specialPrice",
            Provenance::LastPrice => "lastPrice",
            Provenance::LastPricePriceList => "lastPricePriceList",
        }
    }
}

/// Per-SKU accumulator threaded through the cascade stages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPricingState {
    pub sku: String,
    pub known: bool,
    pub base_price: Option<f64>,
    pub currency: Option<String>,
    pub vat_exempt: bool,
    pub discount_code: Option<String>,
    pub discount_pct: f64,
    pub discount_resolved: bool,
    pub special_price: bool,
    pub special_discount_amount: Option<f64>,
    pub price_list: Option<i64>,
    /// Price before the last-price floor
    pub nominal_price: Option<f64>,
    pub resolved_price: Option<f64>,
    pub last_price: Option<f64>,
    pub provenance: Provenance,
}

impl ItemPricingState {
    pub fn new(sku: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            ..Default::default()
        }
    }

    /// Set both the nominal and the effective price
    pub fn set_price(&mut self, price: Option<f64>, provenance: Provenance) {
        self.nominal_price = price;
        self.resolved_price = price;
        self.provenance = provenance;
    }
}

pub type StockByWarehouse = BTreeMap<String, f64>;

/// One entry of the answer, emitted for every requested SKU
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceStockItem {
    pub sku: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub prices: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub stock_by_warehouse: StockByWarehouse,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
}

impl PriceStockItem {
    pub fn empty(sku: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            ..Default::default()
        }
    }

    pub fn put_price(&mut self, label: &str, value: Option<f64>) {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.prices.insert(label.to_string(), v);
        }
    }

    pub fn put_detail(&mut self, key: &str, value: impl Into<Value>) {
        self.details.insert(key.to_string(), value.into());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceStockResult {
    pub items: Vec<PriceStockItem>,
}
