//! A single push connection

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};
use tokio::time::timeout;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Registry key for a connection
pub type ConnectionId = Uuid;

/// Upper bound on a close handshake when the caller does not pass one
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Outbound half of a push transport
#[async_trait]
pub trait PushSink: Send {
    /// Write one text frame
    async fn send_text(&mut self, text: String) -> Result<()>;

    /// Close the transport
    async fn close(&mut self) -> Result<()>;
}

/// Handle to one connected peer.
///
/// Closing is idempotent: the sink is taken out and closed by whichever path
/// gets there first (peer disconnect or failed broadcast write); later calls
/// are no-ops. Closing also wakes anything waiting in [`Connection::closed`].
pub struct Connection {
    id: ConnectionId,
    sink: Mutex<Option<Box<dyn PushSink>>>,
    closed: watch::Sender<bool>,
}

impl Connection {
    pub fn new<S>(sink: S) -> Arc<Self>
    where
        S: PushSink + 'static,
    {
        let (closed, _) = watch::channel(false);
        Arc::new(Self {
            id: Uuid::new_v4(),
            sink: Mutex::new(Some(Box::new(sink))),
            closed,
        })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_open(&self) -> bool {
        !*self.closed.borrow()
    }

    /// Write a text frame; fails with `ConnectionClosed` once closed
    pub async fn send_text(&self, text: &str) -> Result<()> {
        let mut sink = self.sink.lock().await;
        match sink.as_mut() {
            Some(sink) => sink.send_text(text.to_string()).await,
            None => Err(AppError::ConnectionClosed),
        }
    }

    /// Close the connection. Returns `true` only for the call that closed it.
    pub async fn close(&self) -> bool {
        self.close_within(CLOSE_TIMEOUT).await
    }

    /// Close the connection, giving the sink at most `limit` to finish its
    /// close handshake. A sink that does not finish in time is dropped.
    ///
    /// The closed flag is set before the sink is touched, so waiters in
    /// [`Connection::closed`] wake even when the handshake stalls.
    pub async fn close_within(&self, limit: Duration) -> bool {
        if self.closed.send_replace(true) {
            return false;
        }

        let closing = async {
            let sink = self.sink.lock().await.take();
            match sink {
                Some(mut sink) => sink.close().await,
                None => Ok(()),
            }
        };
        match timeout(limit, closing).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(connection_id = %self.id, error = %e, "Error while closing push sink");
            }
            Err(_) => {
                debug!(
                    connection_id = %self.id,
                    limit_ms = limit.as_millis() as u64,
                    "Push sink close timed out, dropping it"
                );
            }
        }
        true
    }

    /// Resolves once the connection has been closed by any path
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("open", &self.is_open())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSink;
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    #[tokio::test]
    async fn test_send_then_close() {
        let sink = RecordingSink::default();
        let conn = Connection::new(sink.clone());

        tokio_test::assert_ok!(conn.send_text("hello").await);
        assert!(conn.is_open());

        assert!(conn.close().await);
        assert!(!conn.is_open());
        assert_eq!(sink.messages(), vec!["hello".to_string()]);

        let err = tokio_test::assert_err!(conn.send_text("late").await);
        assert!(matches!(err, AppError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let sink = RecordingSink::default();
        let conn = Connection::new(sink.clone());

        let (first, second) = tokio::join!(conn.close(), conn.close());
        assert!(first ^ second);
        assert!(!conn.close().await);
        assert_eq!(sink.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_closed_wakes_waiters() {
        let conn = Connection::new(RecordingSink::default());

        let waiter = {
            let conn = conn.clone();
            tokio::spawn(async move { conn.closed().await })
        };

        conn.close().await;
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();

        // Already closed: returns immediately.
        conn.closed().await;
    }

    #[tokio::test]
    async fn test_close_within_drops_stalled_sink() {
        let sink = RecordingSink::wedged();
        let conn = Connection::new(sink.clone());

        let waiter = {
            let conn = conn.clone();
            tokio::spawn(async move { conn.closed().await })
        };

        let closed = tokio::time::timeout(
            Duration::from_secs(2),
            conn.close_within(Duration::from_millis(50)),
        )
        .await
        .expect("close should give up on the stalled sink");

        assert!(closed);
        assert!(!conn.is_open());
        assert_eq!(sink.closes.load(Ordering::SeqCst), 1);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();

        // The sink is gone, so later closes and writes do nothing.
        assert!(!conn.close().await);
        let err = tokio_test::assert_err!(conn.send_text("late").await);
        assert!(matches!(err, AppError::ConnectionClosed));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Connection::new(RecordingSink::default());
        let b = Connection::new(RecordingSink::default());
        assert_ne!(a.id(), b.id());
    }
}
