//! Users module: the caller's local profile

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
