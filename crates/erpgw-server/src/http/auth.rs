//! Bearer-token guard for every route

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use sha2::{Digest, Sha256};

use super::error::ApiError;
use super::AppState;

pub async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if !bearer_matches(header, state.settings.bearer_token.expose()) {
        return ApiError::unauthorised().into_response();
    }
    next.run(request).await
}

/// `Authorization: Bearer <token>`, scheme case-insensitive, exactly two
/// fields
pub fn bearer_matches(header: Option<&str>, expected: &str) -> bool {
    let Some(header) = header else {
        return false;
    };
    if expected.is_empty() {
        return false;
    }
    let mut fields = header.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => {
            digests_equal(token, expected)
        }
        _ => false,
    }
}

// Comparing fixed-size digests keeps the timing independent of where the
// inputs first differ and of their lengths.
fn digests_equal(a: &str, b: &str) -> bool {
    let da = Sha256::digest(a.as_bytes());
    let db = Sha256::digest(b.as_bytes());
    da.iter().zip(db.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
