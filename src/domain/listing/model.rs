//! Listing domain entity

use chrono::{DateTime, Utc};

use crate::domain::reservation::DateRange;

/// A bookable property unit.
#[derive(Debug, Clone)]
pub struct Listing {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: String,
    /// Nightly price in minor units
    pub price_per_night: i64,
    pub guest_count: i32,
    pub room_count: i32,
    pub bathroom_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when a host publishes a listing.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: String,
    pub price_per_night: i64,
    pub guest_count: i32,
    pub room_count: i32,
    pub bathroom_count: i32,
}

impl Listing {
    pub fn new(owner_id: impl Into<String>, fields: NewListing) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            title: fields.title,
            description: fields.description,
            location: fields.location,
            category: fields.category,
            price_per_night: fields.price_per_night,
            guest_count: fields.guest_count,
            room_count: fields.room_count,
            bathroom_count: fields.bathroom_count,
            created_at: Utc::now(),
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    /// Price for the given stay: nights × nightly price.
    pub fn quote(&self, range: &DateRange) -> i64 {
        range.nights() * self.price_per_night
    }
}
