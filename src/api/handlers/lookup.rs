//! Redis lookup endpoint

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::api::server::AppState;

/// `GET /redis` - value of the configured key, or the default
pub async fn redis_value(State(state): State<AppState>) -> impl IntoResponse {
    let redis = &state.config.redis;
    let value = state
        .store
        .get_or_default(&redis.value_key, &redis.default_value)
        .await;

    Json(json!({ "redis": value }))
}
