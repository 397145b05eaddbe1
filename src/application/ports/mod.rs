//! Outbound ports consumed by the booking core
//!
//! - [`PaymentGateway`]: checkout session creation and verification
//! - [`Notifier`]: guest / host notifications (email)

pub mod notifier;
pub mod payment_gateway;

pub use notifier::{
    Audience, HostRequestNotice, Notification, NotificationError, Notifier, ReservationNotice,
};
pub use payment_gateway::{
    metadata_keys, CheckoutRequest, CheckoutSession, CreatedCheckout, GatewayError, PaymentGateway,
};
