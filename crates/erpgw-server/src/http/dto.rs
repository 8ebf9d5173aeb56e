//! Request and response bodies

use chrono::NaiveDate;
use erpgw_core::pricing::{PriceStockItem, PriceStockRequest};
use erpgw_core::{GwError, GwErrorKind, QueryRequest, ResultTable, Row};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decode exactly one JSON value; anything after it is an error
///
/// # Errors
///
/// `InvalidJson` for malformed input, a type mismatch or trailing data.
pub fn parse_strict<T: DeserializeOwned>(body: &[u8]) -> Result<T, GwError> {
    let mut de = serde_json::Deserializer::from_slice(body);
    let value = T::deserialize(&mut de)?;
    de.end()?;
    Ok(value)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SqlRequest {
    pub query: String,
    pub params: Option<Map<String, Value>>,
}

impl SqlRequest {
    pub fn into_query(self) -> QueryRequest {
        QueryRequest {
            text: self.query,
            parameters: self.params.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlResponse {
    pub api: String,
    pub status: &'static str,
    pub row_count: usize,
    pub rows: Vec<Row>,
    pub recordsets: Vec<ResultTable>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PriceStockBody {
    pub sku_list: Vec<String>,
    pub price_list: Vec<String>,
    pub warehouses: Vec<String>,
    pub user_ext_id: String,
    pub date: Option<String>,
}

impl PriceStockBody {
    /// # Errors
    ///
    /// `InvalidInput` when `date` is present but not `YYYY-MM-DD`.
    pub fn into_request(self) -> Result<PriceStockRequest, GwError> {
        let as_of = match self.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(raw) => Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                GwError::new(GwErrorKind::InvalidInput)
                    .with_op("price_stock")
                    .with_message("date must be YYYY-MM-DD")
            })?),
            None => None,
        };
        Ok(PriceStockRequest {
            skus: self.sku_list,
            price_list_hints: self.price_list,
            warehouses: self.warehouses,
            account_id: self.user_ext_id,
            as_of,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceStockMeta {
    pub duration_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct PriceStockResponse {
    pub items: Vec<PriceStockItem>,
    pub meta: PriceStockMeta,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
