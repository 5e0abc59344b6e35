//! Health and version endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::api::server::AppState;

/// Build identifier: `GIT_COMMIT` at compile time, else the crate version
pub const VERSION: &str = match option_env!("GIT_COMMIT") {
    Some(commit) => commit,
    None => env!("CARGO_PKG_VERSION"),
};

/// Liveness probe; never touches Redis
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "alive": true })))
}

pub async fn ping() -> &'static str {
    "pong"
}

pub async fn version(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "version": VERSION,
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{get, memory_state, router, state_with};
    use crate::store::StoreHandle;
    use serde_json::Value;

    #[tokio::test]
    async fn test_health_check() {
        let (state, _) = memory_state();
        let (status, body) = get(router(state), "/healthz").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("alive"));
    }

    #[tokio::test]
    async fn test_health_check_without_store() {
        let state = state_with(StoreHandle::redis("redis://127.0.0.1:1/0"));
        let store = state.store.clone();

        let (status, _) = get(router(state), "/healthz").await;

        assert_eq!(status, StatusCode::OK);
        assert!(!store.is_initialized());
    }

    #[tokio::test]
    async fn test_ping() {
        let (state, _) = memory_state();
        let (status, body) = get(router(state), "/ping").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "pong");
    }

    #[tokio::test]
    async fn test_version() {
        let (state, _) = memory_state();
        let (_, body) = get(router(state), "/version").await;
        let json: Value = serde_json::from_str(&body).unwrap();

        assert_eq!(json["version"], VERSION);
        assert!(json["uptime_secs"].is_u64());
    }
}
