//! Notification delivery adapters
//!
//! - [`SmtpNotifier`]: real email through `lettre`
//! - [`LogNotifier`]: writes the rendered message to the log; used when no
//!   SMTP host is configured

mod log_notifier;
mod smtp;
pub mod templates;

pub use log_notifier::LogNotifier;
pub use smtp::{EmailConfig, EmailError, SmtpNotifier};
