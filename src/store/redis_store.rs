//! Redis-backed store

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::{KeyValueStore, MessageStream};
use crate::error::{AppError, Result};

/// How long the initial connect + PING may take before Redis is considered down
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Redis client: a shared connection manager for reads, plus a dedicated
/// connection per subscription.
pub struct RedisStore {
    client: Client,
    manager: ConnectionManager,
}

impl RedisStore {
    /// Connect and verify the server answers PING
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Client::open(url)?;

        let manager = timeout(CONNECT_TIMEOUT, async {
            let mut manager = ConnectionManager::new(client.clone()).await?;
            redis::cmd("PING")
                .query_async::<_, String>(&mut manager)
                .await?;
            Ok::<_, AppError>(manager)
        })
        .await
        .map_err(|_| AppError::StoreUnavailable)??;

        info!("Redis connection established");

        Ok(Self { client, manager })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn subscribe(&self, topic: &str) -> Result<MessageStream> {
        // Pub/sub needs its own connection; the manager is multiplexed.
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(topic).await?;

        debug!(topic = %topic, "Redis subscription opened");

        let stream = pubsub
            .into_on_message()
            .filter_map(|msg| async move {
                match msg.get_payload::<String>() {
                    Ok(payload) => Some(payload),
                    Err(e) => {
                        warn!(error = %e, "Skipping pub/sub message with non-string payload");
                        None
                    }
                }
            })
            .boxed();

        Ok(stream)
    }
}
