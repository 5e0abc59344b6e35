//! Route definitions

use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;

use super::handlers;
use super::middleware::RequestLogging;
use super::server::AppState;
use super::websocket;

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Greeting page
        .route("/", get(handlers::hello::index))
        .route("/*name", get(handlers::hello::greet))
        // Demo endpoints
        .route("/fib", get(handlers::fib::fibonacci))
        .route("/redis", get(handlers::lookup::redis_value))
        .route("/stress", get(handlers::stress::stress))
        // Health and introspection
        .route("/healthz", get(handlers::health::health_check))
        .route("/ping", get(handlers::health::ping))
        .route("/version", get(handlers::health::version))
        .route("/metrics", get(handlers::metrics::metrics))
        // Static assets
        .route("/static/*file", get(handlers::assets::serve_asset))
        // Push channel
        .route("/ws", get(websocket::push::push_ws))
        .route_layer(from_fn_with_state(state.clone(), RequestLogging::log_request))
        .with_state(state)
}
