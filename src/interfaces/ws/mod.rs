//! WebSocket interfaces
//!
//! - `notifications`: realtime booking events for dashboards and trip pages

pub mod notifications;

pub use notifications::{create_notification_state, ws_notifications_handler, NotificationState};
