//! Realtime booking events
//!
//! Broadcast to WebSocket clients (host dashboards, guest trip pages).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    ReservationCreated(ReservationCreatedEvent),
    PaymentStatusChanged(PaymentStatusChangedEvent),
    ReservationDeleted(ReservationDeletedEvent),
    HostRequestReviewed(HostRequestReviewedEvent),
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::ReservationCreated(_) => "reservation_created",
            Event::PaymentStatusChanged(_) => "payment_status_changed",
            Event::ReservationDeleted(_) => "reservation_deleted",
            Event::HostRequestReviewed(_) => "host_request_reviewed",
        }
    }

    pub fn listing_id(&self) -> Option<&str> {
        match self {
            Event::ReservationCreated(e) => Some(&e.listing_id),
            Event::PaymentStatusChanged(e) => Some(&e.listing_id),
            Event::ReservationDeleted(e) => Some(&e.listing_id),
            Event::HostRequestReviewed(_) => None,
        }
    }

    /// Whether `user_id` is a party to the event (guest, host or applicant).
    pub fn involves_user(&self, user_id: &str) -> bool {
        match self {
            Event::ReservationCreated(e) => e.user_id == user_id || e.host_id == user_id,
            Event::PaymentStatusChanged(e) => e.user_id == user_id || e.host_id == user_id,
            Event::ReservationDeleted(e) => e.user_id == user_id || e.host_id == user_id,
            Event::HostRequestReviewed(e) => e.user_id == user_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationCreatedEvent {
    pub reservation_id: String,
    pub listing_id: String,
    pub user_id: String,
    pub host_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub payment_method: String,
    pub payment_status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusChangedEvent {
    pub payment_id: String,
    pub reservation_id: String,
    pub listing_id: String,
    pub user_id: String,
    pub host_id: String,
    pub old_status: String,
    pub new_status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationDeletedEvent {
    pub reservation_id: String,
    pub listing_id: String,
    pub user_id: String,
    pub host_id: String,
    /// `cancelled` or `cash_rejected`
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostRequestReviewedEvent {
    pub request_id: String,
    pub user_id: String,
    pub status: String,
    pub reviewed_by: String,
    pub timestamp: DateTime<Utc>,
}

/// Wrapper for sending events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}
