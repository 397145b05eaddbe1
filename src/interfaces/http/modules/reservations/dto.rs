//! Reservation DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::booking::{ReconcileOutcome, ReservationDetails};
use crate::application::ports::CreatedCheckout;
use crate::domain::{Payment, Reservation};
use crate::shared::money::from_minor_units;

/// Open a hosted card checkout for a stay
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[validate(length(min = 1, message = "listingId is required"))]
    pub listing_id: String,
    /// `YYYY-MM-DD` or RFC 3339
    #[validate(length(min = 1, message = "startDate is required"))]
    pub start_date: String,
    #[validate(length(min = 1, message = "endDate is required"))]
    pub end_date: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
    /// Hosted payment page to redirect the guest to
    pub url: Option<String>,
}

impl From<CreatedCheckout> for CheckoutResponse {
    fn from(c: CreatedCheckout) -> Self {
        Self {
            session_id: c.session_id,
            url: c.url,
        }
    }
}

/// Confirm a completed card checkout
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    #[validate(length(min = 1, message = "sessionId is required"))]
    pub session_id: String,
}

/// Book now, pay cash on arrival
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashReservationBody {
    #[validate(length(min = 1, message = "listingId is required"))]
    pub listing_id: String,
    #[validate(length(min = 1, message = "userId is required"))]
    pub user_id: String,
    #[validate(length(min = 1, message = "startDate is required"))]
    pub start_date: String,
    #[validate(length(min = 1, message = "endDate is required"))]
    pub end_date: String,
    /// Major units, e.g. `200` or `"199.50"`
    #[schema(value_type = String, example = "200.00")]
    pub total_price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResponse {
    pub reservation_id: String,
    pub payment_id: String,
    /// `true` when the session had already been turned into a reservation
    pub already_confirmed: bool,
}

impl From<ReconcileOutcome> for ReconcileResponse {
    fn from(o: ReconcileOutcome) -> Self {
        Self {
            reservation_id: o.reservation_id,
            payment_id: o.payment_id,
            already_confirmed: o.already_confirmed,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcceptCashRequest {
    #[validate(length(min = 1, message = "reservationId is required"))]
    pub reservation_id: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectCashRequest {
    #[validate(length(min = 1, message = "reservationId is required"))]
    pub reservation_id: String,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDto {
    pub id: String,
    pub reservation_id: Option<String>,
    pub session_id: String,
    pub transaction_id: Option<String>,
    pub method: String,
    pub status: String,
    #[schema(value_type = String, example = "200.00")]
    pub amount: Decimal,
    pub currency: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Payment> for PaymentDto {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id,
            reservation_id: p.reservation_id,
            session_id: p.session_id,
            transaction_id: p.transaction_id,
            method: p.method.to_string(),
            status: p.status.to_string(),
            amount: from_minor_units(p.amount),
            currency: p.currency,
            expires_at: p.expires_at,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AcceptCashResponse {
    pub payment: PaymentDto,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDto {
    pub id: String,
    pub listing_id: String,
    pub user_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub nights: i64,
    #[schema(value_type = String, example = "600.00")]
    pub total_price: Decimal,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentDto>,
}

impl From<Reservation> for ReservationDto {
    fn from(r: Reservation) -> Self {
        Self {
            nights: r.period().nights(),
            id: r.id,
            listing_id: r.listing_id,
            user_id: r.user_id,
            start_date: r.start_date,
            end_date: r.end_date,
            total_price: from_minor_units(r.total_price),
            session_id: r.session_id,
            created_at: r.created_at,
            listing_title: None,
            listing_location: None,
            payment: None,
        }
    }
}

impl From<ReservationDetails> for ReservationDto {
    fn from(d: ReservationDetails) -> Self {
        Self {
            listing_title: Some(d.listing.title),
            listing_location: Some(d.listing.location),
            payment: d.payment.map(PaymentDto::from),
            ..ReservationDto::from(d.reservation)
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationResponse {
    pub reservation: ReservationDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationListResponse {
    pub reservations: Vec<ReservationDto>,
}
