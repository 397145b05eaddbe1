//! Listing API handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::{
    AvailabilityParams, AvailabilityResponse, CreateListingRequest, ListingDto, ListingResponse,
};
use crate::domain::reservation::parse_booking_date;
use crate::domain::{DateRange, DomainError, NewListing};
use crate::interfaces::http::common::{ApiError, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::modules::reservations::{ReservationDto, ReservationListResponse};
use crate::interfaces::http::state::AppState;
use crate::shared::money::to_minor_units;

#[utoipa::path(
    post,
    path = "/api/v1/listings",
    tag = "Listings",
    security(("bearer_auth" = [])),
    request_body = CreateListingRequest,
    responses(
        (status = 201, description = "Listing published", body = ListingResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Caller is not a host")
    )
)]
pub async fn create_listing(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(body): ValidatedJson<CreateListingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ListingResponse>>), ApiError> {
    let price_per_night = to_minor_units(body.price)
        .ok_or_else(|| DomainError::Validation("price must have at most two decimal places".into()))?;

    let listing = state
        .listings
        .create(
            &user.user_id,
            NewListing {
                title: body.title,
                description: body.description,
                location: body.location,
                category: body.category,
                price_per_night,
                guest_count: body.guest_count,
                room_count: body.room_count,
                bathroom_count: body.bathroom_count,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ListingResponse {
            listing: ListingDto::from(listing),
        })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}",
    tag = "Listings",
    params(("id" = String, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Listing details", body = ListingResponse),
        (status = 404, description = "Listing not found")
    )
)]
pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ListingResponse> {
    let listing = state.listings.get(&id).await?;
    Ok(Json(ApiResponse::success(ListingResponse {
        listing: listing.into(),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}/availability",
    tag = "Listings",
    params(("id" = String, Path, description = "Listing ID"), AvailabilityParams),
    responses(
        (status = 200, description = "Availability and price for the stay", body = AvailabilityResponse),
        (status = 400, description = "Invalid dates"),
        (status = 404, description = "Listing not found")
    )
)]
pub async fn check_availability(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<AvailabilityParams>,
) -> ApiResult<AvailabilityResponse> {
    let range = DateRange::new(
        parse_booking_date("startDate", &params.start_date)?,
        parse_booking_date("endDate", &params.end_date)?,
    )?;
    let availability = state.availability.check_availability(&id, range).await?;
    Ok(Json(ApiResponse::success(AvailabilityResponse::new(
        availability,
        &state.currency,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}/reservations",
    tag = "Listings",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Reservations on the listing", body = ReservationListResponse),
        (status = 403, description = "Caller does not own the listing"),
        (status = 404, description = "Listing not found")
    )
)]
pub async fn list_listing_reservations(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<ReservationListResponse> {
    let reservations = state.queries.for_listing(&user.user_id, &id).await?;
    Ok(Json(ApiResponse::success(ReservationListResponse {
        reservations: reservations.into_iter().map(ReservationDto::from).collect(),
    })))
}
