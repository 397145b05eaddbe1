//! Application layer - use cases orchestrating the domain

pub mod booking;
pub mod events;
pub mod host_requests;
pub mod listings;
pub mod notifications;
pub mod ports;
pub mod users;

pub use booking::{
    AvailabilityChecker, CancellationService, CashApproval, CheckoutService, Reconciler,
    ReservationQueries,
};
pub use events::{create_event_bus, Event, EventBus, EventSubscriber, SharedEventBus};
pub use host_requests::HostRequestService;
pub use listings::ListingService;
pub use notifications::NotificationDispatcher;
pub use users::UserService;
