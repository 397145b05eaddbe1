//! Domain layer - core business entities, rules and repository contracts

pub mod host_request;
pub mod listing;
pub mod payment;
pub mod repositories;
pub mod reservation;
pub mod user;

pub use host_request::{HostRequest, HostRequestStatus};
pub use listing::{Listing, NewListing};
pub use payment::{Payment, PaymentMethod, PaymentStatus};
pub use repositories::{DomainResult, RepositoryProvider};
pub use reservation::{Booking, DateRange, Reservation};
pub use user::{User, UserRole};

pub use crate::shared::errors::DomainError;
