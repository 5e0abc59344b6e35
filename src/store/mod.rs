//! External key-value / pub-sub store
//!
//! The service reads one key and consumes one pub/sub topic. Both go through the
//! [`KeyValueStore`] trait so the Redis client can be swapped for
//! [`MemoryStore`] in tests.

mod handle;
mod memory;
mod redis_store;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;

pub use self::handle::StoreHandle;
pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

/// Lazy, ordered sequence of payloads received on a topic.
///
/// Dropping the stream closes the underlying subscription.
pub type MessageStream = BoxStream<'static, String>;

/// Read/subscribe access to the external store
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch a string value; `Ok(None)` when the key does not exist
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Open a subscription to `topic`
    async fn subscribe(&self, topic: &str) -> Result<MessageStream>;
}
