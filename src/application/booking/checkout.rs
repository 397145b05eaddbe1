//! Opening a provider checkout for a stay

use std::sync::Arc;

use tracing::info;

use super::availability::AvailabilityChecker;
use crate::application::ports::{CheckoutRequest, CreatedCheckout, PaymentGateway};
use crate::domain::{DateRange, DomainError, DomainResult, RepositoryProvider};

pub struct CheckoutService {
    repos: Arc<dyn RepositoryProvider>,
    gateway: Arc<dyn PaymentGateway>,
    availability: AvailabilityChecker,
    currency: String,
}

impl CheckoutService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        gateway: Arc<dyn PaymentGateway>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            availability: AvailabilityChecker::new(repos.clone()),
            repos,
            gateway,
            currency: currency.into().to_lowercase(),
        }
    }

    /// Price the stay from the listing and open a hosted checkout carrying
    /// the stay in its metadata. Fails early when the dates are taken.
    /// Session creation is not idempotent and is therefore not retried.
    pub async fn start_checkout(
        &self,
        caller_id: &str,
        listing_id: &str,
        range: DateRange,
    ) -> DomainResult<CreatedCheckout> {
        let listing = self
            .repos
            .listings()
            .find_by_id(listing_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Listing", "id", listing_id))?;
        let guest = self
            .repos
            .users()
            .find_by_id(caller_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "id", caller_id))?;

        if self.availability.conflicts_with(listing_id, &range, None).await? {
            return Err(DomainError::Conflict(format!(
                "Listing {} is not available for {}",
                listing_id, range
            )));
        }

        let request = CheckoutRequest {
            listing_id: listing.id.clone(),
            listing_title: listing.title.clone(),
            user_id: guest.id.clone(),
            customer_email: Some(guest.email.clone()),
            range,
            amount: listing.quote(&range),
            currency: self.currency.clone(),
        };

        let created = self.gateway.create_checkout_session(&request).await?;
        info!(
            session_id = %created.session_id,
            listing_id,
            user_id = caller_id,
            amount = request.amount,
            "Checkout started"
        );
        Ok(created)
    }
}
