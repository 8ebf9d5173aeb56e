//! Price & stock resolution under a whole-request deadline

use std::time::{Duration, Instant};

use erpgw_core::pricing::{PriceStockRequest, PriceStockResult};
use erpgw_core::{log_op_end, log_op_error, log_op_start};
use erpgw_store::errors::Result;

use super::deadline_exceeded;
use crate::resolvers::PriceStockResolver;

const OP: &str = "price_stock";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(12);

/// Resolve prices and stock for one request.
///
/// Any failing sub-query fails the whole request.
///
/// # Errors
///
/// `ExecutionTimeout` past `timeout`; otherwise whatever the resolver
/// reports, unchanged.
pub async fn run_price_stock(
    resolver: &dyn PriceStockResolver,
    request: &PriceStockRequest,
    timeout: Duration,
) -> Result<PriceStockResult> {
    let started = Instant::now();
    log_op_start!(
        OP,
        backend = resolver.backend().as_str(),
        sku_count = request.skus.len()
    );

    let result = match tokio::time::timeout(timeout, resolver.resolve(request)).await {
        Ok(result) => result,
        Err(_) => Err(deadline_exceeded(OP, timeout)),
    };

    let duration_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(res) => log_op_end!(OP, duration_ms = duration_ms, item_count = res.items.len()),
        Err(err) => log_op_error!(OP, err.clone(), duration_ms = duration_ms),
    }
    result
}
