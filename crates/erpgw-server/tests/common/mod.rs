#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use erpgw_core::pricing::{PriceStockRequest, PriceStockResult};
use erpgw_core::{GwError, ResultTable};
use erpgw_core_types::Sensitive;
use erpgw_engine::{Backend, PriceStockResolver, QueryLimits};
use erpgw_server::{router, AppState, HttpSettings};
use erpgw_store::errors::Result;
use erpgw_store::{SqlExecutor, Statement};
use serde_json::Value;
use tower::ServiceExt;

pub const TOKEN: &str = "secret-token";

pub fn table(rows: Value) -> ResultTable {
    rows.as_array()
        .unwrap()
        .iter()
        .map(|r| r.as_object().unwrap().clone())
        .collect()
}

/// Executor that answers every query with the same sets and records calls
#[derive(Default)]
pub struct FakeExecutor {
    sets: Vec<ResultTable>,
    failure: Option<GwError>,
    ping_failure: Option<GwError>,
    delay: Option<Duration>,
    calls: Mutex<Vec<Statement>>,
}

impl FakeExecutor {
    pub fn returning(sets: Vec<ResultTable>) -> Self {
        Self {
            sets,
            ..Default::default()
        }
    }

    pub fn failing(err: GwError) -> Self {
        Self {
            failure: Some(err),
            ..Default::default()
        }
    }

    pub fn with_ping_failure(mut self, err: GwError) -> Self {
        self.ping_failure = Some(err);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Statement> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SqlExecutor for FakeExecutor {
    async fn query(&self, statement: &Statement) -> Result<Vec<ResultTable>> {
        self.calls.lock().unwrap().push(statement.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(self.sets.clone()),
        }
    }

    async fn ping(&self) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.ping_failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// Resolver with a canned answer
pub struct FixedResolver {
    pub answer: std::result::Result<PriceStockResult, GwError>,
    pub seen: Mutex<Vec<PriceStockRequest>>,
}

impl FixedResolver {
    pub fn new(answer: std::result::Result<PriceStockResult, GwError>) -> Self {
        Self {
            answer,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PriceStockResolver for FixedResolver {
    fn backend(&self) -> Backend {
        Backend::Sap
    }

    async fn resolve(&self, request: &PriceStockRequest) -> Result<PriceStockResult> {
        self.seen.lock().unwrap().push(request.clone());
        self.answer.clone()
    }
}

pub fn settings() -> HttpSettings {
    HttpSettings {
        bearer_token: Sensitive::new(TOKEN.to_string()),
        access_log: true,
        query_limits: QueryLimits::default(),
        price_stock_timeout: Duration::from_secs(12),
        health_timeout: Duration::from_secs(3),
        max_body_bytes: 1 << 20,
    }
}

pub fn app_with(
    executor: Arc<dyn SqlExecutor>,
    resolver: Arc<dyn PriceStockResolver>,
    settings: HttpSettings,
) -> Router {
    router(AppState::new(executor, resolver, settings))
}

pub fn app(executor: Arc<dyn SqlExecutor>) -> Router {
    let resolver = Arc::new(FixedResolver::new(Ok(PriceStockResult::default())));
    app_with(executor, resolver, settings())
}

pub fn post_json(uri: &str, body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {}", TOKEN))
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", format!("Bearer {}", TOKEN))
        .body(Body::empty())
        .unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> (u16, Value, Response<()>) {
    let response = app.oneshot(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (parts.status.as_u16(), json, Response::from_parts(parts, ()))
}
