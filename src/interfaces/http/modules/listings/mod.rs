//! Listings module: publication, lookup and availability

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
