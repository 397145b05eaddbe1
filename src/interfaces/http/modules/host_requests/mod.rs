//! Host requests module: become-a-host applications and their review

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
