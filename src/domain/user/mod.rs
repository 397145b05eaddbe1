//! User aggregate
//!
//! Guests, hosts and administrators. Identity itself lives with the external
//! auth provider; this aggregate holds what booking flows need (name, email, role).

pub mod model;
pub mod repository;

pub use model::{User, UserRole};
pub use repository::UserRepository;
