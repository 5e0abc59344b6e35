//! Prometheus metrics

use prometheus::{
    histogram_opts, opts, Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Registry,
    TextEncoder,
};

use crate::error::{AppError, Result};

/// Service metrics, registered on a registry owned by this struct
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub http_requests: IntCounterVec,
    pub http_duration: HistogramVec,
    pub ws_connections: IntGauge,
    pub broadcast_messages: IntCounter,
    pub broadcast_failures: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests = IntCounterVec::new(
            opts!("http_requests_total", "Total HTTP requests handled"),
            &["method", "path", "status"],
        )?;
        let http_duration = HistogramVec::new(
            histogram_opts!(
                "http_request_duration_seconds",
                "HTTP request latency in seconds"
            ),
            &["method", "path"],
        )?;
        let ws_connections = IntGauge::with_opts(opts!(
            "ws_connections",
            "Currently registered push connections"
        ))?;
        let broadcast_messages = IntCounter::with_opts(opts!(
            "broadcast_messages_total",
            "Messages relayed from the pub/sub topic"
        ))?;
        let broadcast_failures = IntCounter::with_opts(opts!(
            "broadcast_write_failures_total",
            "Push writes that failed and dropped the connection"
        ))?;

        registry.register(Box::new(http_requests.clone()))?;
        registry.register(Box::new(http_duration.clone()))?;
        registry.register(Box::new(ws_connections.clone()))?;
        registry.register(Box::new(broadcast_messages.clone()))?;
        registry.register(Box::new(broadcast_failures.clone()))?;

        Ok(Self {
            registry,
            http_requests,
            http_duration,
            ws_connections,
            broadcast_messages,
            broadcast_failures,
        })
    }

    /// Render the registry in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| AppError::Internal(e.to_string()))
    }
}
