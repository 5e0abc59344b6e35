//! Real-time broadcast: pub/sub topic → broadcaster → registered WebSocket peers

pub mod broadcaster;
pub mod connection;
pub mod registry;
pub mod subscriber;

pub use broadcaster::{BroadcastReport, Broadcaster};
pub use connection::{Connection, ConnectionId, PushSink};
pub use registry::ConnectionRegistry;
pub use subscriber::UpstreamSubscriber;
