//! Notification port
//!
//! Every message the booking flows send is a [`Notification`] variant. The
//! adapters (SMTP, log-only) decide how to render and deliver it.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{HostRequest, Listing, Payment, Reservation, User};

/// Flat record with everything a reservation message needs to render.
#[derive(Debug, Clone)]
pub struct ReservationNotice {
    pub reservation_id: String,
    pub listing_id: String,
    pub listing_title: String,
    pub listing_location: String,
    pub guest_name: String,
    pub guest_email: String,
    pub host_name: String,
    pub host_email: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub nights: i64,
    /// Minor units
    pub total_price: i64,
    pub currency: String,
    pub payment_method: String,
}

impl ReservationNotice {
    pub fn new(
        reservation: &Reservation,
        listing: &Listing,
        guest: &User,
        host: &User,
        payment: &Payment,
    ) -> Self {
        Self {
            reservation_id: reservation.id.clone(),
            listing_id: listing.id.clone(),
            listing_title: listing.title.clone(),
            listing_location: listing.location.clone(),
            guest_name: guest.name.clone(),
            guest_email: guest.email.clone(),
            host_name: host.name.clone(),
            host_email: host.email.clone(),
            start_date: reservation.start_date,
            end_date: reservation.end_date,
            nights: reservation.period().nights(),
            total_price: reservation.total_price,
            currency: payment.currency.clone(),
            payment_method: payment.method.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HostRequestNotice {
    pub request_id: String,
    pub user_name: String,
    pub user_email: String,
}

impl HostRequestNotice {
    pub fn new(request: &HostRequest, user: &User) -> Self {
        Self {
            request_id: request.id.clone(),
            user_name: user.name.clone(),
            user_email: user.email.clone(),
        }
    }
}

/// Which side of a reservation a message goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Guest,
    Host,
}

#[derive(Debug, Clone)]
pub enum Notification {
    /// Guest: cash reservation waiting for the host
    ReservationPending(ReservationNotice),
    /// Host: a guest asked to pay cash on arrival
    CashRequestReceived(ReservationNotice),
    /// Guest: card payment confirmed
    ReservationConfirmed(ReservationNotice),
    /// Host: new confirmed booking
    BookingAlert(ReservationNotice),
    /// Guest: receipt for a card payment
    Invoice {
        notice: ReservationNotice,
        payment_id: String,
        transaction_id: Option<String>,
    },
    /// Guest: host accepted the cash request
    CashAccepted(ReservationNotice),
    /// Guest: host rejected the cash request
    CashRejected {
        notice: ReservationNotice,
        reason: String,
    },
    ReservationCancelled {
        notice: ReservationNotice,
        audience: Audience,
    },
    HostRequestApproved(HostRequestNotice),
    HostRequestRejected {
        notice: HostRequestNotice,
        reason: String,
    },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ReservationPending(_) => "reservation_pending",
            Self::CashRequestReceived(_) => "cash_request_received",
            Self::ReservationConfirmed(_) => "reservation_confirmed",
            Self::BookingAlert(_) => "booking_alert",
            Self::Invoice { .. } => "invoice",
            Self::CashAccepted(_) => "cash_accepted",
            Self::CashRejected { .. } => "cash_rejected",
            Self::ReservationCancelled { .. } => "reservation_cancelled",
            Self::HostRequestApproved(_) => "host_request_approved",
            Self::HostRequestRejected { .. } => "host_request_rejected",
        }
    }

    /// Email address the message is addressed to.
    pub fn recipient(&self) -> &str {
        match self {
            Self::ReservationPending(n)
            | Self::ReservationConfirmed(n)
            | Self::CashAccepted(n)
            | Self::Invoice { notice: n, .. }
            | Self::CashRejected { notice: n, .. } => &n.guest_email,
            Self::CashRequestReceived(n) | Self::BookingAlert(n) => &n.host_email,
            Self::ReservationCancelled { notice, audience } => match audience {
                Audience::Guest => &notice.guest_email,
                Audience::Host => &notice.host_email,
            },
            Self::HostRequestApproved(n) | Self::HostRequestRejected { notice: n, .. } => {
                &n.user_email
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("invalid address: {0}")]
    Address(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError>;
}
