//! Stripe webhook handler
//!
//! A signed `checkout.session.completed` event drives the same idempotent
//! confirmation as the client-side confirm call, so whichever arrives
//! second sees `alreadyConfirmed`. Every other event type is acknowledged
//! and ignored.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::domain::DomainError;
use crate::interfaces::http::common::{ApiError, ApiResponse, ApiResult};
use crate::interfaces::http::state::AppState;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub received: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already_confirmed: Option<bool>,
    /// Why a verified event did not produce a reservation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored: Option<String>,
}

impl WebhookAck {
    fn ignored(reason: impl Into<String>) -> Self {
        Self {
            received: true,
            reservation_id: None,
            already_confirmed: None,
            ignored: Some(reason.into()),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/webhooks/stripe",
    tag = "Webhooks",
    request_body(content = String, content_type = "application/json"),
    responses(
        (status = 200, description = "Event accepted", body = WebhookAck),
        (status = 400, description = "Missing or invalid signature"),
        (status = 502, description = "Provider unavailable; the event should be redelivered"),
        (status = 500, description = "Storage failure; the event should be redelivered")
    )
)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<WebhookAck> {
    if !state.webhook.is_configured() {
        return Err(ApiError(DomainError::Validation(
            "Webhook secret is not configured".into(),
        )));
    }
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| DomainError::Validation("Missing Stripe-Signature header".into()))?;

    let event = state
        .webhook
        .construct_event(&body, signature)
        .map_err(DomainError::from)?;

    let Some(session_id) = event.completed_checkout_session() else {
        info!(event_id = %event.id, event_type = %event.event_type, "Ignoring webhook event");
        return Ok(Json(ApiResponse::success(WebhookAck::ignored(format!(
            "unhandled event type {}",
            event.event_type
        )))));
    };

    match state.reconciler.confirm_card_payment(session_id).await {
        Ok(outcome) => Ok(Json(ApiResponse::success(WebhookAck {
            received: true,
            reservation_id: Some(outcome.reservation_id),
            already_confirmed: Some(outcome.already_confirmed),
            ignored: None,
        }))),
        // Redelivery may succeed for these.
        Err(err @ (DomainError::PaymentProvider { .. } | DomainError::Storage(_) | DomainError::Busy(_))) => {
            Err(ApiError(err))
        }
        Err(err) => {
            warn!(
                event_id = %event.id,
                session_id,
                error = %err,
                "Completed checkout could not be reconciled"
            );
            Ok(Json(ApiResponse::success(WebhookAck::ignored(err.to_string()))))
        }
    }
}
