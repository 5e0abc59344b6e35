//! Push channel WebSocket handler
//!
//! Each upgraded socket is registered with the broadcast registry and stays
//! there until the peer goes away or a broadcast write to it fails.

use std::time::Duration;

use async_trait::async_trait;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use crate::api::server::AppState;
use crate::error::Result;
use crate::realtime::{Connection, ConnectionRegistry, PushSink};

/// Outbound half of an axum WebSocket
pub struct WsSink(SplitSink<WebSocket, Message>);

#[async_trait]
impl PushSink for WsSink {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.0.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let _ = self.0.send(Message::Close(None)).await;
        self.0.close().await?;
        Ok(())
    }
}

/// `GET /ws`
pub async fn push_ws(
    ws: std::result::Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<AppState>,
) -> Response {
    match ws {
        Ok(ws) => ws
            .on_failed_upgrade(|e| warn!(error = %e, "Push WebSocket upgrade failed"))
            .on_upgrade(move |socket| {
                handle_push_ws(socket, state.registry, state.config.push.write_timeout)
            })
            .into_response(),
        Err(rejection) => {
            warn!(reason = %rejection, "Rejected push WebSocket upgrade");
            rejection.into_response()
        }
    }
}

/// Register the socket and wait for it to end
async fn handle_push_ws(socket: WebSocket, registry: ConnectionRegistry, close_timeout: Duration) {
    let (sender, receiver) = socket.split();
    let conn = Connection::new(WsSink(sender));
    let id = conn.id();

    registry.add(conn.clone());
    info!(connection_id = %id, active = registry.len(), "Push WebSocket connected");

    tokio::select! {
        _ = wait_for_disconnect(receiver) => {
            debug!(connection_id = %id, "Push WebSocket peer went away");
        }
        _ = conn.closed() => {
            debug!(connection_id = %id, "Push WebSocket closed by broadcaster");
        }
    }

    registry.remove(id);
    conn.close_within(close_timeout).await;

    info!(connection_id = %id, active = registry.len(), "Push WebSocket disconnected");
}

/// Drain inbound frames until Close, an error, or end of stream
async fn wait_for_disconnect(mut receiver: SplitStream<WebSocket>) {
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Close(_)) => {
                debug!("Push WebSocket received close");
                break;
            }
            Ok(Message::Ping(_)) => {
                // Pong is handled automatically by axum
            }
            Err(e) => {
                debug!("Push WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }
}
