//! Request ids and the access log
//!
//! Each request runs inside a span carrying its `RequestId`, which is
//! echoed in `x-request-id`. With the access log on, one event per request
//! is emitted at a level chosen by the response status.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware::Next;
use axum::response::Response;
use erpgw_core_types::schema::EVENT_ACCESS;
use erpgw_core_types::RequestId;
use tracing::Instrument;

use super::AppState;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

pub async fn track_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(RequestId::from_inbound)
        .unwrap_or_default();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let span = tracing::info_span!("request", request_id = %request_id, method = %method, path = %path);
    let started = Instant::now();
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    if state.settings.access_log {
        log_access(&method, &path, response.status().as_u16(), started, &request_id);
    }
    response
}

fn log_access(method: &Method, path: &str, status: u16, started: Instant, request_id: &RequestId) {
    let duration_ms = started.elapsed().as_millis() as u64;
    let request_id = request_id.as_str();
    match status {
        500..=u16::MAX => tracing::error!(
            event = EVENT_ACCESS,
            method = %method,
            path,
            status,
            duration_ms,
            request_id,
        ),
        400..=499 => tracing::warn!(
            event = EVENT_ACCESS,
            method = %method,
            path,
            status,
            duration_ms,
            request_id,
        ),
        _ => tracing::info!(
            event = EVENT_ACCESS,
            method = %method,
            path,
            status,
            duration_ms,
            request_id,
        ),
    }
}
