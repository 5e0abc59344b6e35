//! In-process store used in tests and local runs without Redis

use std::collections::HashMap;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::warn;

use super::{KeyValueStore, MessageStream};
use crate::error::{AppError, Result};

const CHANNEL_CAPACITY: usize = 1024;

/// Key-value map plus a single broadcast bus carrying `(topic, payload)` pairs
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
    bus: Mutex<Option<broadcast::Sender<(String, String)>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            values: RwLock::new(HashMap::new()),
            bus: Mutex::new(Some(tx)),
        }
    }

    /// Set a key
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.write().insert(key.into(), value.into());
    }

    /// Publish a payload; returns the number of live subscriptions that got it
    pub fn publish(&self, topic: &str, payload: impl Into<String>) -> usize {
        match self.bus.lock().as_ref() {
            Some(tx) => tx.send((topic.to_string(), payload.into())).unwrap_or(0),
            None => 0,
        }
    }

    /// Number of open subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.bus
            .lock()
            .as_ref()
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Close the bus: every open subscription stream ends, new ones fail
    pub fn close(&self) {
        self.bus.lock().take();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    async fn subscribe(&self, topic: &str) -> Result<MessageStream> {
        let rx = self
            .bus
            .lock()
            .as_ref()
            .map(|tx| tx.subscribe())
            .ok_or(AppError::StoreUnavailable)?;

        let topic = topic.to_string();
        let stream = BroadcastStream::new(rx)
            .filter_map(move |item| {
                let topic = topic.clone();
                async move {
                    match item {
                        Ok((t, payload)) if t == topic => Some(payload),
                        Ok(_) => None,
                        Err(BroadcastStreamRecvError::Lagged(n)) => {
                            warn!("Memory subscription lagged, missed {} messages", n);
                            None
                        }
                    }
                }
            })
            .boxed();

        Ok(stream)
    }
}
