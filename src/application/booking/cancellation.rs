//! Guest- or host-initiated cancellation

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::notices::{load_parties, notice};
use crate::application::events::{Event, ReservationDeletedEvent, SharedEventBus};
use crate::application::notifications::NotificationDispatcher;
use crate::application::ports::{Audience, Notification};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};

pub struct CancellationService {
    repos: Arc<dyn RepositoryProvider>,
    dispatcher: NotificationDispatcher,
    events: SharedEventBus,
}

impl CancellationService {
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

    /// Delete a reservation with its payment. Allowed for the guest and for
    /// the listing owner; the other side is notified.
    pub async fn cancel(&self, caller_id: &str, reservation_id: &str) -> DomainResult<()> {
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

        let is_guest = reservation.is_guest(caller_id);
        if !is_guest && !listing.is_owned_by(caller_id) {
            return Err(DomainError::Forbidden(
                "Only the guest or the listing owner can cancel this reservation".into(),
            ));
        }

        let payment = self
            .repos
            .payments()
            .find_by_reservation(&reservation.id)
            .await?;
        let parties = load_parties(self.repos.as_ref(), &reservation, &listing).await?;

        self.repos
            .reservations()
            .delete_with_payment(&reservation.id)
            .await?;

        info!(
            reservation_id,
            listing_id = %listing.id,
            cancelled_by = caller_id,
            by_guest = is_guest,
            "Reservation cancelled"
        );

        self.events
            .publish(Event::ReservationDeleted(ReservationDeletedEvent {
                reservation_id: reservation.id.clone(),
                listing_id: listing.id.clone(),
                user_id: reservation.user_id.clone(),
                host_id: listing.owner_id.clone(),
                reason: "cancelled".to_string(),
                timestamp: Utc::now(),
            }));

        if let (Some(parties), Some(payment)) = (parties, payment) {
            let audience = if is_guest {
                Audience::Host
            } else {
                Audience::Guest
            };
            self.dispatcher.dispatch(Notification::ReservationCancelled {
                notice: notice(&parties, &reservation, &listing, &payment),
                audience,
            });
        }

        Ok(())
    }
}
