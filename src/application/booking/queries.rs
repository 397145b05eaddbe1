//! Reservation read models

use std::sync::Arc;

use crate::domain::{DomainError, DomainResult, Listing, Payment, RepositoryProvider, Reservation};

#[derive(Debug, Clone)]
pub struct ReservationDetails {
    pub reservation: Reservation,
    pub listing: Listing,
    pub payment: Option<Payment>,
}

pub struct ReservationQueries {
    repos: Arc<dyn RepositoryProvider>,
}

impl ReservationQueries {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// A single reservation, visible to its guest and to the listing owner.
    pub async fn get(&self, caller_id: &str, reservation_id: &str) -> DomainResult<ReservationDetails> {
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

        if !reservation.is_guest(caller_id) && !listing.is_owned_by(caller_id) {
            return Err(DomainError::Forbidden(
                "Reservation belongs to another guest".into(),
            ));
        }

        let payment = self
            .repos
            .payments()
            .find_by_reservation(&reservation.id)
            .await?;

        Ok(ReservationDetails {
            reservation,
            listing,
            payment,
        })
    }

    /// The caller's own trips, latest stay first.
    pub async fn trips(&self, caller_id: &str) -> DomainResult<Vec<ReservationDetails>> {
        let reservations = self.repos.reservations().find_for_guest(caller_id).await?;
        let mut trips = Vec::with_capacity(reservations.len());

        for reservation in reservations {
            let Some(listing) = self
                .repos
                .listings()
                .find_by_id(&reservation.listing_id)
                .await?
            else {
                continue;
            };
            let payment = self
                .repos
                .payments()
                .find_by_reservation(&reservation.id)
                .await?;
            trips.push(ReservationDetails {
                reservation,
                listing,
                payment,
            });
        }
        Ok(trips)
    }

    /// Reservations on a listing, for its owner.
    pub async fn for_listing(&self, caller_id: &str, listing_id: &str) -> DomainResult<Vec<Reservation>> {
        let listing = self
            .repos
            .listings()
            .find_by_id(listing_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Listing", "id", listing_id))?;
        if !listing.is_owned_by(caller_id) {
            return Err(DomainError::Forbidden(
                "Only the listing owner can see its reservations".into(),
            ));
        }
        self.repos.reservations().find_for_listing(listing_id).await
    }
}
