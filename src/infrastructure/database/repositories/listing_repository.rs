//! SeaORM implementation of ListingRepository

use async_trait::async_trait;
use log::debug;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::db_err;
use crate::domain::listing::{Listing, ListingRepository};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::listing;

pub struct SeaOrmListingRepository {
    db: DatabaseConnection,
}

impl SeaOrmListingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: listing::Model) -> Listing {
    Listing {
        id: m.id,
        owner_id: m.owner_id,
        title: m.title,
        description: m.description,
        location: m.location,
        category: m.category,
        price_per_night: m.price_per_night,
        guest_count: m.guest_count,
        room_count: m.room_count,
        bathroom_count: m.bathroom_count,
        created_at: m.created_at,
    }
}

#[async_trait]
impl ListingRepository for SeaOrmListingRepository {
    async fn save(&self, l: Listing) -> DomainResult<()> {
        debug!("Saving listing: {} (owner {})", l.id, l.owner_id);

        let model = listing::ActiveModel {
            id: Set(l.id),
            owner_id: Set(l.owner_id),
            title: Set(l.title),
            description: Set(l.description),
            location: Set(l.location),
            category: Set(l.category),
            price_per_night: Set(l.price_per_night),
            guest_count: Set(l.guest_count),
            room_count: Set(l.room_count),
            bathroom_count: Set(l.bathroom_count),
            created_at: Set(l.created_at),
        };
        model.insert(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Listing>> {
        let model = listing::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_owner(&self, owner_id: &str) -> DomainResult<Vec<Listing>> {
        let models = listing::Entity::find()
            .filter(listing::Column::OwnerId.eq(owner_id))
            .order_by_desc(listing::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }
}
