//! Interface adapters - HTTP REST API and WebSocket streams

pub mod http;
pub mod ws;
