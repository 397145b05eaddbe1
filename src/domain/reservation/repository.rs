//! Reservation repository interface

use async_trait::async_trait;

use super::model::{Booking, DateRange, Reservation};
use crate::domain::DomainResult;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Find reservation by ID
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Reservation>>;

    /// Find the reservation created for an external payment session
    async fn find_by_session_id(&self, session_id: &str) -> DomainResult<Option<Reservation>>;

    /// Reservations on `listing_id` whose dates overlap `range` (inclusive
    /// bounds), skipping the one created for `exclude_session_id`.
    async fn find_overlapping(
        &self,
        listing_id: &str,
        range: &DateRange,
        exclude_session_id: Option<&str>,
    ) -> DomainResult<Vec<Reservation>>;

    /// All reservations made by a guest, newest stay first
    async fn find_for_guest(&self, user_id: &str) -> DomainResult<Vec<Reservation>>;

    /// All reservations on a listing, ordered by start date
    async fn find_for_listing(&self, listing_id: &str) -> DomainResult<Vec<Reservation>>;

    /// Persist a reservation and its payment in one serializable transaction.
    ///
    /// The overlap query is re-run inside the transaction; an overlap yields
    /// `DomainError::Conflict` and nothing is written. A duplicate payment
    /// session id also yields `DomainError::Conflict`.
    async fn create_with_payment(&self, booking: Booking) -> DomainResult<Booking>;

    /// Delete a reservation and its payment in one transaction.
    async fn delete_with_payment(&self, id: &str) -> DomainResult<()>;

    /// Delete a reservation and its payment only if that payment is still a
    /// pending cash payment, checked in the same transaction as the delete.
    /// Any other payment state yields `DomainError::InvalidTransition` and
    /// nothing is deleted.
    async fn delete_pending_cash(&self, id: &str) -> DomainResult<()>;
}
