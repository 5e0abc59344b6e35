//! WebSocket handlers

pub mod push;
