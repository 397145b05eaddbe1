pub mod dispatcher;

pub use dispatcher::{DeliveryOutcome, DetachedDelivery, NotificationDispatcher};
