//! Listing repository interface

use async_trait::async_trait;

use super::model::Listing;
use crate::domain::DomainResult;

#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn save(&self, listing: Listing) -> DomainResult<()>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Listing>>;

    async fn find_by_owner(&self, owner_id: &str) -> DomainResult<Vec<Listing>>;
}
