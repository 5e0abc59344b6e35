//! Registry of live push connections

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use prometheus::IntGauge;

use super::connection::{Connection, ConnectionId};

/// Thread-safe set of connections eligible for broadcast.
///
/// Every operation takes the one internal lock for the duration of the map
/// operation only; callers never see the map and never hold the lock across
/// an await.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<Mutex<HashMap<ConnectionId, Arc<Connection>>>>,
    gauge: Option<IntGauge>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror the registry size into a gauge
    pub fn with_gauge(mut self, gauge: IntGauge) -> Self {
        gauge.set(self.len() as i64);
        self.gauge = Some(gauge);
        self
    }

    /// Register a connection
    pub fn add(&self, conn: Arc<Connection>) {
        let mut map = self.inner.lock();
        map.insert(conn.id(), conn);
        self.update_gauge(map.len());
    }

    /// Unregister a connection. Absent ids are a no-op.
    pub fn remove(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        let mut map = self.inner.lock();
        let removed = map.remove(&id);
        self.update_gauge(map.len());
        removed
    }

    /// Point-in-time copy of the registered connections
    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.inner.lock().values().cloned().collect()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.inner.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update_gauge(&self, len: usize) {
        if let Some(gauge) = &self.gauge {
            gauge.set(len as i64);
        }
    }
}
