pub mod health;
pub mod host_requests;
pub mod listings;
pub mod metrics;
pub mod reservations;
pub mod users;
pub mod webhooks;
