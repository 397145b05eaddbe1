//! Reservations module: checkout, confirmation, cash workflow, cancellation

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
