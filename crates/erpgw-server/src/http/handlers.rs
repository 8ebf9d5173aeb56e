use std::time::Instant;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::Json;
use erpgw_core::GwErrorKind;
use erpgw_engine::{run_adhoc_query, run_price_stock};

use super::dto::{
    parse_strict, HealthResponse, PriceStockBody, PriceStockMeta, PriceStockResponse, SqlRequest,
    SqlResponse,
};
use super::error::ApiError;
use super::AppState;

/// `GET /api/health`: live database probe under the health deadline
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    match tokio::time::timeout(state.settings.health_timeout, state.executor.ping()).await {
        Ok(Ok(())) => Ok(Json(HealthResponse { status: "ok" })),
        Ok(Err(err)) => {
            tracing::warn!(err.code = err.code(), err.detail = err.detail().unwrap_or(""), "health probe failed");
            Err(database_down())
        }
        Err(_) => {
            tracing::warn!("health probe timed out");
            Err(database_down())
        }
    }
}

fn database_down() -> ApiError {
    ApiError::new(
        StatusCode::SERVICE_UNAVAILABLE,
        GwErrorKind::ResourceUnavailable.code(),
        "Database connection failed",
    )
}

/// `POST /api/sql`
pub async fn sql(
    State(state): State<AppState>,
    uri: Uri,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SqlResponse>, ApiError> {
    // an oversized or unreadable body is reported like malformed JSON
    let body = body.map_err(|_| ApiError::invalid_json())?;
    let request = parse_strict::<SqlRequest>(&body)?.into_query();

    let outcome = run_adhoc_query(state.executor.as_ref(), &request, &state.settings.query_limits).await?;

    let rows = outcome.rows().to_vec();
    Ok(Json(SqlResponse {
        api: uri.path().to_string(),
        status: "success",
        row_count: rows.len(),
        rows,
        recordsets: outcome.recordsets,
    }))
}

/// `POST /api/priceAndStockHandler`
pub async fn price_and_stock(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<PriceStockResponse>, ApiError> {
    let started = Instant::now();
    let body = body.map_err(|_| ApiError::invalid_json())?;
    let request = parse_strict::<PriceStockBody>(&body)?.into_request()?;

    let result = run_price_stock(
        state.resolver.as_ref(),
        &request,
        state.settings.price_stock_timeout,
    )
    .await
    .map_err(ApiError::pricing)?;

    Ok(Json(PriceStockResponse {
        items: result.items,
        meta: PriceStockMeta {
            duration_ms: started.elapsed().as_millis() as u64,
        },
    }))
}

pub async fn not_found() -> ApiError {
    ApiError::not_found()
}
