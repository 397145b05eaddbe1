//! In-process fan-out of booking events.
//!
//! A thin wrapper over a `tokio::sync::broadcast` channel. Every realtime
//! stream holds its own [`EventSubscriber`]; slow subscribers skip ahead
//! instead of blocking the publishers.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use super::events::{Event, EventMessage};

const BACKLOG: usize = 1024;

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EventMessage>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(BACKLOG)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Stamps and fans out `event`. Having no listeners is fine.
    pub fn publish(&self, event: Event) {
        let message = EventMessage::new(event);
        let kind = message.event.event_type();
        let delivered = self.tx.send(message).unwrap_or(0);
        debug!(kind, delivered, "booking event published");
    }

    pub fn subscribe(&self) -> EventSubscriber {
        let rx = self.tx.subscribe();
        debug!(subscribers = self.subscriber_count(), "event stream attached");
        EventSubscriber { rx }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EventSubscriber {
    rx: broadcast::Receiver<EventMessage>,
}

impl EventSubscriber {
    /// Next event, or `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.rx.recv().await {
                Ok(message) => return Some(message),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event stream fell behind");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

pub type SharedEventBus = Arc<EventBus>;

pub fn create_event_bus() -> SharedEventBus {
    Arc::new(EventBus::new())
}
