//! Request logging middleware

use axum::body::Body;
use axum::extract::{MatchedPath, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;
use tracing::{debug, info};

use crate::api::server::AppState;

/// Request logging middleware
pub struct RequestLogging;

impl RequestLogging {
    /// Log request details and record request metrics
    pub async fn log_request(
        State(state): State<AppState>,
        req: Request<Body>,
        next: Next,
    ) -> Response {
        let method = req.method().clone();
        let uri = req.uri().clone();
        // Label by route template so `/*name` does not explode cardinality.
        let path = req
            .extensions()
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());
        let start = Instant::now();

        debug!("{} {} - started", method, uri);

        let response = next.run(req).await;

        let duration = start.elapsed();
        let status = response.status();

        info!("{} {} - {} in {:?}", method, uri, status, duration);

        state
            .metrics
            .http_requests
            .with_label_values(&[method.as_str(), path.as_str(), status.as_str()])
            .inc();
        state
            .metrics
            .http_duration
            .with_label_values(&[method.as_str(), path.as_str()])
            .observe(duration.as_secs_f64());

        response
    }
}
