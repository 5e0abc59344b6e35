//! Fan-out of one message to every registered connection

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::connection::Connection;
use super::registry::ConnectionRegistry;
use crate::error::{AppError, Result};
use crate::metrics::Metrics;

/// Outcome of a single broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: usize,
}

/// Writes messages to a snapshot of the registry, pruning peers that fail
#[derive(Clone)]
pub struct Broadcaster {
    registry: ConnectionRegistry,
    write_timeout: Duration,
    metrics: Option<Metrics>,
}

impl Broadcaster {
    pub fn new(registry: ConnectionRegistry, write_timeout: Duration) -> Self {
        Self {
            registry,
            write_timeout,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Deliver `message` once to every connection registered right now.
    ///
    /// Each peer is written, and on failure removed and closed, in its own
    /// future; all of them run concurrently. Both the write and the close are
    /// bounded by the write timeout, so one wedged peer never holds up the
    /// others or the next broadcast.
    pub async fn broadcast(&self, message: &str) -> BroadcastReport {
        if let Some(metrics) = &self.metrics {
            metrics.broadcast_messages.inc();
        }

        let targets = self.registry.snapshot();
        if targets.is_empty() {
            debug!("No push connections registered, message discarded");
            return BroadcastReport::default();
        }

        let results = join_all(targets.into_iter().map(|conn| self.deliver(conn, message))).await;

        let mut report = BroadcastReport::default();
        for delivered in results {
            if delivered {
                report.delivered += 1;
            } else {
                report.dropped += 1;
            }
        }

        debug!(
            delivered = report.delivered,
            dropped = report.dropped,
            "Broadcast complete"
        );
        report
    }

    async fn deliver(&self, conn: Arc<Connection>, message: &str) -> bool {
        let Err(e) = self.write(&conn, message).await else {
            return true;
        };

        warn!(
            connection_id = %conn.id(),
            error = %e,
            "Push write failed, dropping connection"
        );
        self.registry.remove(conn.id());
        conn.close_within(self.write_timeout).await;
        if let Some(metrics) = &self.metrics {
            metrics.broadcast_failures.inc();
        }
        false
    }

    async fn write(&self, conn: &Arc<Connection>, message: &str) -> Result<()> {
        match timeout(self.write_timeout, conn.send_text(message)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::WriteTimeout {
                millis: self.write_timeout.as_millis() as u64,
            }),
        }
    }
}
