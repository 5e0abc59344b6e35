//! Background pump from the pub/sub topic into the broadcaster

use futures::StreamExt;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::broadcaster::Broadcaster;
use crate::store::StoreHandle;

/// Consumes one topic for the lifetime of the process.
///
/// Each message is broadcast to completion before the next one is pulled, so
/// peers see messages in subscription order.
pub struct UpstreamSubscriber {
    store: StoreHandle,
    topic: String,
    broadcaster: Broadcaster,
}

impl UpstreamSubscriber {
    pub fn new(store: StoreHandle, topic: impl Into<String>, broadcaster: Broadcaster) -> Self {
        Self {
            store,
            topic: topic.into(),
            broadcaster,
        }
    }

    /// Run until the subscription ends or `shutdown` flips to `true`.
    ///
    /// Returns the number of messages relayed. An unavailable store is not an
    /// error: the subscriber logs once and returns immediately.
    #[instrument(skip(self, shutdown), fields(topic = %self.topic))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let Some(store) = self.store.get().await else {
            warn!("Store unavailable, push notifications disabled");
            return 0;
        };

        let mut messages = match store.subscribe(&self.topic).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "Subscription failed, push notifications disabled");
                return 0;
            }
        };

        info!("Subscribed to topic");

        let mut relayed = 0u64;
        loop {
            if *shutdown.borrow() {
                info!("Upstream subscriber shutting down");
                break;
            }

            tokio::select! {
                next = messages.next() => match next {
                    Some(message) => {
                        let report = self.broadcaster.broadcast(&message).await;
                        relayed += 1;
                        debug!(
                            delivered = report.delivered,
                            dropped = report.dropped,
                            "Relayed message"
                        );
                    }
                    None => {
                        info!("Subscription closed");
                        break;
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        info!("Shutdown sender dropped, upstream subscriber stopping");
                        break;
                    }
                }
            }
        }

        // Dropping the stream closes the subscription.
        drop(messages);
        relayed
    }
}
