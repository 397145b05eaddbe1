//! Listing DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::booking::Availability;
use crate::domain::Listing;
use crate::shared::money::from_minor_units;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    #[serde(default)]
    pub category: String,
    /// Major units
    #[schema(value_type = String, example = "200.00")]
    pub price: Decimal,
    #[validate(range(min = 1))]
    pub guest_count: i32,
    #[validate(range(min = 1))]
    pub room_count: i32,
    #[validate(range(min = 0))]
    pub bathroom_count: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingDto {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: String,
    #[schema(value_type = String, example = "200.00")]
    pub price: Decimal,
    pub guest_count: i32,
    pub room_count: i32,
    pub bathroom_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Listing> for ListingDto {
    fn from(l: Listing) -> Self {
        Self {
            id: l.id,
            owner_id: l.owner_id,
            title: l.title,
            description: l.description,
            location: l.location,
            category: l.category,
            price: from_minor_units(l.price_per_night),
            guest_count: l.guest_count,
            room_count: l.room_count,
            bathroom_count: l.bathroom_count,
            created_at: l.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListingResponse {
    pub listing: ListingDto,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AvailabilityParams {
    /// `YYYY-MM-DD` or RFC 3339
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub listing_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub available: bool,
    pub nights: i64,
    #[schema(value_type = String, example = "600.00")]
    pub total_price: Decimal,
    pub currency: String,
}

impl AvailabilityResponse {
    pub fn new(availability: Availability, currency: &str) -> Self {
        Self {
            listing_id: availability.listing.id,
            start_date: availability.range.start(),
            end_date: availability.range.end(),
            available: availability.available,
            nights: availability.range.nights(),
            total_price: from_minor_units(availability.total_price),
            currency: currency.to_string(),
        }
    }
}
