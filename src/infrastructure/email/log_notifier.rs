use async_trait::async_trait;
use tracing::info;

use super::templates::render;
use crate::application::ports::{Notification, NotificationError, Notifier};

/// Renders notifications and writes them to the log instead of sending them.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        let rendered = render(notification);
        info!(
            to = notification.recipient(),
            kind = notification.kind(),
            subject = %rendered.subject,
            "Email delivery disabled, notification logged"
        );
        Ok(())
    }
}
