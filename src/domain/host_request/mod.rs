//! Host request aggregate
//!
//! A guest asks to become a host; an administrator approves or rejects.

pub mod model;
pub mod repository;

pub use model::{HostRequest, HostRequestStatus};
pub use repository::HostRequestRepository;
