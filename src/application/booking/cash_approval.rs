//! Host decision on cash reservations
//!
//! `PENDING → SUCCESS` on accept; reservation and payment deleted on
//! reject. Only the listing owner may decide, and only while the payment is
//! still a pending cash payment: a second accept is an invalid transition.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::notices::{load_parties, notice};
use crate::application::events::{
    Event, PaymentStatusChangedEvent, ReservationDeletedEvent, SharedEventBus,
};
use crate::application::notifications::NotificationDispatcher;
use crate::application::ports::Notification;
use crate::domain::{
    DomainError, DomainResult, Listing, Payment, PaymentStatus, RepositoryProvider, Reservation,
};

pub const DEFAULT_REJECTION_REASON: &str = "No reason provided";

pub struct CashApproval {
    repos: Arc<dyn RepositoryProvider>,
    dispatcher: NotificationDispatcher,
    events: SharedEventBus,
}

impl CashApproval {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        dispatcher: NotificationDispatcher,
        events: SharedEventBus,
    ) -> Self {
        Self {
            repos,
            dispatcher,
            events,
        }
    }

    pub async fn accept(&self, caller_id: &str, reservation_id: &str) -> DomainResult<Payment> {
        let (reservation, listing, payment) = self.load_pending(caller_id, reservation_id).await?;

        let updated = self
            .repos
            .payments()
            .transition_status(&payment.id, PaymentStatus::Pending, PaymentStatus::Success)
            .await?;

        info!(
            reservation_id,
            payment_id = %updated.id,
            listing_id = %listing.id,
            host_id = caller_id,
            "Cash payment accepted"
        );

        self.events
            .publish(Event::PaymentStatusChanged(PaymentStatusChangedEvent {
                payment_id: updated.id.clone(),
                reservation_id: reservation.id.clone(),
                listing_id: listing.id.clone(),
                user_id: reservation.user_id.clone(),
                host_id: listing.owner_id.clone(),
                old_status: PaymentStatus::Pending.to_string(),
                new_status: updated.status.to_string(),
                timestamp: Utc::now(),
            }));

        if let Some(parties) = load_parties(self.repos.as_ref(), &reservation, &listing).await? {
            self.dispatcher
                .dispatch(Notification::CashAccepted(notice(
                    &parties,
                    &reservation,
                    &listing,
                    &updated,
                )));
        }

        Ok(updated)
    }

    pub async fn reject(
        &self,
        caller_id: &str,
        reservation_id: &str,
        reason: Option<String>,
    ) -> DomainResult<()> {
        let (reservation, listing, payment) = self.load_pending(caller_id, reservation_id).await?;
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string());

        // Loaded before the delete so the message can still describe the stay.
        let parties = load_parties(self.repos.as_ref(), &reservation, &listing).await?;

        // A concurrent accept may have committed since `load_pending`.
        self.repos
            .reservations()
            .delete_pending_cash(&reservation.id)
            .await?;

        info!(
            reservation_id,
            payment_id = %payment.id,
            listing_id = %listing.id,
            host_id = caller_id,
            reason = %reason,
            "Cash reservation rejected"
        );

        self.events
            .publish(Event::ReservationDeleted(ReservationDeletedEvent {
                reservation_id: reservation.id.clone(),
                listing_id: listing.id.clone(),
                user_id: reservation.user_id.clone(),
                host_id: listing.owner_id.clone(),
                reason: "cash_rejected".to_string(),
                timestamp: Utc::now(),
            }));

        if let Some(parties) = parties {
            self.dispatcher.dispatch(Notification::CashRejected {
                notice: notice(&parties, &reservation, &listing, &payment),
                reason,
            });
        }

        Ok(())
    }

    /// Shared guards: reservation exists, caller owns the listing, payment
    /// exists and is a pending cash payment.
    async fn load_pending(
        &self,
        caller_id: &str,
        reservation_id: &str,
    ) -> DomainResult<(Reservation, Listing, Payment)> {
        let reservation = self
            .repos
            .reservations()
            .find_by_id(reservation_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Reservation", "id", reservation_id))?;

        let listing = self
            .repos
            .listings()
            .find_by_id(&reservation.listing_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found("Listing", "id", reservation.listing_id.as_str())
            })?;

        if !listing.is_owned_by(caller_id) {
            return Err(DomainError::Forbidden(
                "Only the listing owner can decide on cash payments".into(),
            ));
        }

        let payment = self
            .repos
            .payments()
            .find_by_reservation(&reservation.id)
            .await?
            .ok_or_else(|| DomainError::not_found("Payment", "reservation_id", reservation_id))?;

        payment.ensure_pending_cash(PaymentStatus::Success)?;

        Ok((reservation, listing, payment))
    }
}
