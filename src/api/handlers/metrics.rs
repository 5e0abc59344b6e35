//! Prometheus exposition endpoint

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use prometheus::TEXT_FORMAT;

use crate::api::server::AppState;
use crate::error::Result;

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let body = state.metrics.render()?;
    Ok(([(header::CONTENT_TYPE, TEXT_FORMAT)], body))
}
