//! Listing publication

use std::sync::Arc;

use tracing::info;

use crate::domain::{DomainError, DomainResult, Listing, NewListing, RepositoryProvider};

pub struct ListingService {
    repos: Arc<dyn RepositoryProvider>,
}

impl ListingService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Publish a listing owned by the caller. Hosts and admins only.
    pub async fn create(&self, caller_id: &str, fields: NewListing) -> DomainResult<Listing> {
        let owner = self
            .repos
            .users()
            .find_by_id(caller_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "id", caller_id))?;
        if !owner.can_list_properties() {
            return Err(DomainError::Forbidden(
                "Only hosts can publish listings".into(),
            ));
        }

        validate(&fields)?;

        let listing = Listing::new(&owner.id, fields);
        self.repos.listings().save(listing.clone()).await?;

        info!(listing_id = %listing.id, owner_id = %owner.id, "Listing published");
        Ok(listing)
    }

    pub async fn get(&self, listing_id: &str) -> DomainResult<Listing> {
        self.repos
            .listings()
            .find_by_id(listing_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Listing", "id", listing_id))
    }
}

fn validate(fields: &NewListing) -> DomainResult<()> {
    if fields.title.trim().is_empty() {
        return Err(DomainError::Validation("title is required".into()));
    }
    if fields.location.trim().is_empty() {
        return Err(DomainError::Validation("location is required".into()));
    }
    if fields.price_per_night <= 0 {
        return Err(DomainError::Validation("price must be positive".into()));
    }
    if fields.guest_count < 1 || fields.room_count < 1 || fields.bathroom_count < 0 {
        return Err(DomainError::Validation(
            "guest and room counts must be at least 1".into(),
        ));
    }
    Ok(())
}
