//! Availability & conflict checking

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{DateRange, DomainError, DomainResult, Listing, RepositoryProvider};

/// Result of an availability lookup for one listing and stay.
#[derive(Debug, Clone)]
pub struct Availability {
    pub listing: Listing,
    pub range: DateRange,
    pub available: bool,
    /// nights × nightly price, minor units
    pub total_price: i64,
}

#[derive(Clone)]
pub struct AvailabilityChecker {
    repos: Arc<dyn RepositoryProvider>,
}

impl AvailabilityChecker {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Whether any reservation on the listing overlaps `[start, end]`
    /// (touching boundaries count). A reservation created for
    /// `exclude_session_id` is ignored. An empty or inverted range is a
    /// validation error, never "no conflict".
    pub async fn has_conflict(
        &self,
        listing_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        exclude_session_id: Option<&str>,
    ) -> DomainResult<bool> {
        let range = DateRange::new(start, end)?;
        self.conflicts_with(listing_id, &range, exclude_session_id)
            .await
    }

    pub(crate) async fn conflicts_with(
        &self,
        listing_id: &str,
        range: &DateRange,
        exclude_session_id: Option<&str>,
    ) -> DomainResult<bool> {
        let candidates = self
            .repos
            .reservations()
            .find_overlapping(listing_id, range, exclude_session_id)
            .await?;

        let clash = candidates.iter().find(|r| {
            exclude_session_id != Some(r.session_id.as_str()) && r.overlaps(range)
        });

        if let Some(existing) = clash {
            debug!(
                listing_id,
                requested = %range,
                existing_reservation = %existing.id,
                existing_period = %existing.period(),
                "Requested stay overlaps an existing reservation"
            );
        }
        Ok(clash.is_some())
    }

    pub async fn check_availability(
        &self,
        listing_id: &str,
        range: DateRange,
    ) -> DomainResult<Availability> {
        let listing = self
            .repos
            .listings()
            .find_by_id(listing_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Listing", "id", listing_id))?;

        let available = !self.conflicts_with(listing_id, &range, None).await?;
        let total_price = listing.quote(&range);

        Ok(Availability {
            listing,
            range,
            available,
            total_price,
        })
    }
}
