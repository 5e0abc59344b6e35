//! HTTP surface
//!
//! Demo endpoints plus the WebSocket push channel fed by the broadcast core.

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod websocket;

pub use server::{build_router, ApiServer, AppState};
