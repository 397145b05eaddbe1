//! Detached notification delivery
//!
//! Booking flows hand notifications to the dispatcher after their writes
//! have committed. Each delivery runs as its own task bounded by a timeout;
//! its outcome is logged and counted but never reaches the caller.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::application::ports::{Notification, Notifier};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed(String),
    TimedOut,
}

/// Handle to a delivery running in the background. Dropping it does not
/// cancel the delivery.
pub struct DetachedDelivery(JoinHandle<DeliveryOutcome>);

impl DetachedDelivery {
    /// Wait for the delivery to finish.
    pub async fn outcome(self) -> DeliveryOutcome {
        self.0
            .await
            .unwrap_or_else(|e| DeliveryOutcome::Failed(format!("delivery task aborted: {}", e)))
    }
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, timeout: Duration) -> Self {
        Self { notifier, timeout }
    }

    pub fn dispatch(&self, notification: Notification) -> DetachedDelivery {
        let notifier = self.notifier.clone();
        let timeout = self.timeout;

        DetachedDelivery(tokio::spawn(async move {
            let kind = notification.kind();
            let outcome = match tokio::time::timeout(timeout, notifier.send(&notification)).await
            {
                Ok(Ok(())) => DeliveryOutcome::Delivered,
                Ok(Err(e)) => DeliveryOutcome::Failed(e.to_string()),
                Err(_) => DeliveryOutcome::TimedOut,
            };

            match &outcome {
                DeliveryOutcome::Delivered => {
                    debug!(kind, to = notification.recipient(), "Notification delivered")
                }
                DeliveryOutcome::Failed(error) => {
                    metrics::counter!("notifications_failed_total", "kind" => kind).increment(1);
                    warn!(kind, to = notification.recipient(), error = %error, "Notification delivery failed");
                }
                DeliveryOutcome::TimedOut => {
                    metrics::counter!("notifications_failed_total", "kind" => kind).increment(1);
                    warn!(
                        kind,
                        to = notification.recipient(),
                        timeout_ms = timeout.as_millis() as u64,
                        "Notification delivery timed out"
                    );
                }
            }
            outcome
        }))
    }

    pub fn dispatch_all(&self, notifications: impl IntoIterator<Item = Notification>) {
        for notification in notifications {
            self.dispatch(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{HostRequestNotice, NotificationError};
    use async_trait::async_trait;

    struct Scripted(Result<(), &'static str>, Duration);

    #[async_trait]
    impl Notifier for Scripted {
        async fn send(&self, _: &Notification) -> Result<(), NotificationError> {
            tokio::time::sleep(self.1).await;
            self.0.map_err(|e| NotificationError::Transport(e.to_string()))
        }
    }

    fn approved() -> Notification {
        Notification::HostRequestApproved(HostRequestNotice {
            request_id: "HR1".into(),
            user_name: "Gina".into(),
            user_email: "gina@example.com".into(),
        })
    }

    fn dispatcher(result: Result<(), &'static str>, delay_ms: u64) -> NotificationDispatcher {
        NotificationDispatcher::new(
            Arc::new(Scripted(result, Duration::from_millis(delay_ms))),
            Duration::from_millis(50),
        )
    }

    #[tokio::test]
    async fn successful_delivery() {
        let outcome = dispatcher(Ok(()), 0).dispatch(approved()).outcome().await;
        assert_eq!(outcome, DeliveryOutcome::Delivered);
    }

    #[tokio::test]
    async fn failures_are_reported_not_raised() {
        let outcome = dispatcher(Err("smtp down"), 0).dispatch(approved()).outcome().await;
        assert!(matches!(outcome, DeliveryOutcome::Failed(msg) if msg.contains("smtp down")));
    }

    #[tokio::test]
    async fn slow_delivery_times_out() {
        let outcome = dispatcher(Ok(()), 500).dispatch(approved()).outcome().await;
        assert_eq!(outcome, DeliveryOutcome::TimedOut);
    }
}
