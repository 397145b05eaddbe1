//! Reservation API handlers
//!
//! Thin adapters over the booking services. Authorization beyond "who is
//! calling" is enforced by the services.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tracing::info;

use super::dto::{
    AcceptCashRequest, AcceptCashResponse, CashReservationBody, CheckoutRequest,
    CheckoutResponse, ConfirmPaymentRequest, ReconcileResponse, RejectCashRequest,
    ReservationDto, ReservationListResponse, ReservationResponse,
};
use crate::application::booking::CashReservationRequest;
use crate::domain::reservation::parse_booking_date;
use crate::domain::DateRange;
use crate::interfaces::http::common::{ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/reservations/checkout",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Checkout session created", body = CheckoutResponse),
        (status = 400, description = "Invalid dates"),
        (status = 404, description = "Listing not found"),
        (status = 409, description = "Dates already booked"),
        (status = 502, description = "Payment provider unavailable")
    )
)]
pub async fn start_checkout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(body): ValidatedJson<CheckoutRequest>,
) -> ApiResult<CheckoutResponse> {
    let range = DateRange::new(
        parse_booking_date("startDate", &body.start_date)?,
        parse_booking_date("endDate", &body.end_date)?,
    )?;
    let created = state
        .checkout
        .start_checkout(&user.user_id, &body.listing_id, range)
        .await?;
    Ok(Json(ApiResponse::success(created.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations/confirm",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    request_body = ConfirmPaymentRequest,
    responses(
        (status = 200, description = "Reservation created or already confirmed", body = ReconcileResponse),
        (status = 400, description = "Missing session id or bad metadata"),
        (status = 402, description = "Checkout not paid"),
        (status = 404, description = "Session, listing or user not found"),
        (status = 409, description = "Dates already booked"),
        (status = 502, description = "Payment provider unavailable")
    )
)]
pub async fn confirm_payment(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthenticatedUser>,
    ValidatedJson(body): ValidatedJson<ConfirmPaymentRequest>,
) -> ApiResult<ReconcileResponse> {
    let outcome = state.reconciler.confirm_card_payment(&body.session_id).await?;
    Ok(Json(ApiResponse::success(outcome.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations/cash",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    request_body = CashReservationBody,
    responses(
        (status = 200, description = "Pending cash reservation created", body = ReconcileResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "userId is not the caller"),
        (status = 404, description = "Listing or user not found"),
        (status = 409, description = "Dates already booked")
    )
)]
pub async fn create_cash_reservation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(body): ValidatedJson<CashReservationBody>,
) -> ApiResult<ReconcileResponse> {
    let request = CashReservationRequest {
        listing_id: body.listing_id,
        user_id: body.user_id,
        start_date: body.start_date,
        end_date: body.end_date,
        total_price: body.total_price,
    };
    let outcome = state
        .reconciler
        .create_cash_reservation(&user.user_id, request)
        .await?;
    Ok(Json(ApiResponse::success(outcome.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations/accept-cash",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    request_body = AcceptCashRequest,
    responses(
        (status = 200, description = "Cash payment accepted", body = AcceptCashResponse),
        (status = 403, description = "Caller does not own the listing"),
        (status = 404, description = "Reservation or payment not found"),
        (status = 409, description = "Payment is not a pending cash payment")
    )
)]
pub async fn accept_cash(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(body): ValidatedJson<AcceptCashRequest>,
) -> ApiResult<AcceptCashResponse> {
    let payment = state
        .cash_approval
        .accept(&user.user_id, &body.reservation_id)
        .await?;
    Ok(Json(ApiResponse::success(AcceptCashResponse {
        payment: payment.into(),
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations/reject-cash",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    request_body = RejectCashRequest,
    responses(
        (status = 200, description = "Reservation rejected and removed"),
        (status = 403, description = "Caller does not own the listing"),
        (status = 404, description = "Reservation or payment not found"),
        (status = 409, description = "Payment is not a pending cash payment")
    )
)]
pub async fn reject_cash(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(body): ValidatedJson<RejectCashRequest>,
) -> ApiResult<()> {
    state
        .cash_approval
        .reject(&user.user_id, &body.reservation_id, body.rejection_reason)
        .await?;
    Ok(Json(ApiResponse::ok()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/reservations/{id}",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation cancelled"),
        (status = 403, description = "Caller is neither guest nor host"),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn cancel_reservation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.cancellation.cancel(&user.user_id, &id).await?;
    info!(reservation_id = %id, caller = %user.user_id, "Reservation cancelled via API");
    Ok(Json(ApiResponse::ok()))
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations/{id}",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation with listing and payment", body = ReservationResponse),
        (status = 403, description = "Caller is neither guest nor host"),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn get_reservation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<ReservationResponse> {
    let details = state.queries.get(&user.user_id, &id).await?;
    Ok(Json(ApiResponse::success(ReservationResponse {
        reservation: details.into(),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The caller's trips", body = ReservationListResponse)
    )
)]
pub async fn list_trips(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<ReservationListResponse> {
    let trips = state.queries.trips(&user.user_id).await?;
    Ok(Json(ApiResponse::success(ReservationListResponse {
        reservations: trips.into_iter().map(ReservationDto::from).collect(),
    })))
}
