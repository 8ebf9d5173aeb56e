//! HTTP boundary
//!
//! Routes:
//! - `GET  /api/health`
//! - `POST /api/sql`
//! - `POST /api/priceAndStockHandler`
//!
//! Every request, including unmatched ones and wrong methods (404), passes
//! the request tracker and then the bearer guard.

pub mod access_log;
pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use erpgw_core_types::Sensitive;
use erpgw_engine::{PriceStockResolver, QueryLimits};
use erpgw_store::SqlExecutor;

use crate::config::GatewayConfig;

/// Per-server settings the handlers and middleware read
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub bearer_token: Sensitive<String>,
    pub access_log: bool,
    pub query_limits: QueryLimits,
    pub price_stock_timeout: Duration,
    pub health_timeout: Duration,
    pub max_body_bytes: usize,
}

impl HttpSettings {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            bearer_token: Sensitive::new(config.bearer_token.expose().trim().to_string()),
            access_log: config.debug,
            query_limits: config.query_limits(),
            price_stock_timeout: config.price_stock_timeout(),
            health_timeout: config.health_timeout(),
            max_body_bytes: config.limits.max_body_bytes,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<dyn SqlExecutor>,
    pub resolver: Arc<dyn PriceStockResolver>,
    pub settings: Arc<HttpSettings>,
}

impl AppState {
    pub fn new(
        executor: Arc<dyn SqlExecutor>,
        resolver: Arc<dyn PriceStockResolver>,
        settings: HttpSettings,
    ) -> Self {
        Self {
            executor,
            resolver,
            settings: Arc::new(settings),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let max_body = state.settings.max_body_bytes;
    Router::new()
        .route("/api/health", get(handlers::health).fallback(handlers::not_found))
        .route("/api/sql", post(handlers::sql).fallback(handlers::not_found))
        .route(
            "/api/priceAndStockHandler",
            post(handlers::price_and_stock).fallback(handlers::not_found),
        )
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer))
        .layer(middleware::from_fn_with_state(state.clone(), access_log::track_request))
        .with_state(state)
}
