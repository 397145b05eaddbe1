//! Database entities module

pub mod host_request;
pub mod listing;
pub mod payment;
pub mod reservation;
pub mod user;

pub use host_request::Entity as HostRequest;
pub use listing::Entity as Listing;
pub use payment::Entity as Payment;
pub use reservation::Entity as Reservation;
pub use user::Entity as User;
