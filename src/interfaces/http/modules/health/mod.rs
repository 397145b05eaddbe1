//! `GET /health`

mod handlers;

pub use handlers::*;
