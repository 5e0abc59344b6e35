//! Lazily-connected, shared store handle

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::{KeyValueStore, RedisStore};

/// Cheap-to-clone handle to the process-wide store client.
///
/// The Redis connection is opened on first use. Concurrent first callers wait
/// on the same initialization; a failed connect is remembered and the handle
/// stays in degraded mode (`None`) for the rest of the process.
#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<Inner>,
}

struct Inner {
    redis_url: Option<String>,
    cell: OnceCell<Option<Arc<dyn KeyValueStore>>>,
}

impl StoreHandle {
    /// Handle that connects to Redis at `url` on first use
    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                redis_url: Some(url.into()),
                cell: OnceCell::new(),
            }),
        }
    }

    /// Handle around an already constructed store
    pub fn from_store(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                redis_url: None,
                cell: OnceCell::new_with(Some(Some(store))),
            }),
        }
    }

    /// Handle that never has a store
    pub fn unavailable() -> Self {
        Self {
            inner: Arc::new(Inner {
                redis_url: None,
                cell: OnceCell::new_with(Some(None)),
            }),
        }
    }

    /// Get the store, connecting on first call. `None` means degraded mode.
    pub async fn get(&self) -> Option<Arc<dyn KeyValueStore>> {
        self.inner
            .cell
            .get_or_init(|| self.connect())
            .await
            .clone()
    }

    /// Whether the first connection attempt has completed
    pub fn is_initialized(&self) -> bool {
        self.inner.cell.initialized()
    }

    /// Look up `key`, falling back to `default` on a miss, an error, or no store
    pub async fn get_or_default(&self, key: &str, default: &str) -> String {
        if let Some(store) = self.get().await {
            match store.get(key).await {
                Ok(Some(value)) => return value,
                Ok(None) => {}
                Err(e) => warn!(key = %key, error = %e, "Redis lookup failed"),
            }
        }
        default.to_string()
    }

    async fn connect(&self) -> Option<Arc<dyn KeyValueStore>> {
        let url = self.inner.redis_url.as_deref()?;

        match RedisStore::connect(url).await {
            Ok(store) => {
                info!("Using Redis store");
                Some(Arc::new(store))
            }
            Err(e) => {
                warn!(error = %e, "Redis connection failed, using default value");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_get_or_default_hit_and_miss() {
        let store = Arc::new(MemoryStore::new());
        store.set("color", "blue");
        let handle = StoreHandle::from_store(store);

        assert_eq!(handle.get_or_default("color", "none").await, "blue");
        assert_eq!(handle.get_or_default("shape", "none").await, "none");
    }

    #[tokio::test]
    async fn test_unavailable_falls_back() {
        let handle = StoreHandle::unavailable();

        assert!(handle.is_initialized());
        assert!(handle.get().await.is_none());
        assert_eq!(handle.get_or_default("color", "none").await, "none");
    }

    #[tokio::test]
    async fn test_unreachable_redis_degrades_once() {
        // Port 1 is reserved; the connect is refused immediately.
        let handle = StoreHandle::redis("redis://127.0.0.1:1/0");
        assert!(!handle.is_initialized());

        let other = handle.clone();
        let (a, b) = tokio::join!(handle.get(), other.get());
        assert!(a.is_none());
        assert!(b.is_none());
        assert!(handle.is_initialized());

        assert_eq!(handle.get_or_default("k", "fallback").await, "fallback");
    }
}
