//! Payment provider webhooks

pub mod handlers;

pub use handlers::*;
