//! Stripe Checkout adapter
//!
//! Talks to the Stripe REST API directly with `reqwest`: form-encoded
//! requests, bearer authentication, JSON responses.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::application::ports::{
    metadata_keys, CheckoutRequest, CheckoutSession, CreatedCheckout, GatewayError,
    PaymentGateway,
};

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    /// Overridable for tests and proxies
    pub api_base: String,
    pub success_url: String,
    pub cancel_url: String,
    pub request_timeout: Duration,
}

pub struct StripeGateway {
    client: reqwest::Client,
    config: StripeConfig,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Rejected(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.api_base.trim_end_matches('/'), path)
    }
}

// ── Wire types ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SessionBody {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
    #[serde(default)]
    amount_total: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    /// Either an id or an expanded object
    #[serde(default)]
    payment_intent: Option<serde_json::Value>,
    #[serde(default)]
    payment_method_types: Vec<String>,
}

impl SessionBody {
    fn payment_intent_id(&self) -> Option<String> {
        match self.payment_intent.as_ref()? {
            serde_json::Value::String(id) => Some(id.clone()),
            serde_json::Value::Object(obj) => obj.get("id")?.as_str().map(str::to_string),
            _ => None,
        }
    }
}

impl From<SessionBody> for CheckoutSession {
    fn from(body: SessionBody) -> Self {
        let transaction_id = body.payment_intent_id();
        Self {
            id: body.id,
            payment_status: body.payment_status.unwrap_or_default(),
            metadata: body.metadata,
            amount_total: body.amount_total,
            currency: body.currency,
            transaction_id,
            payment_method: body.payment_method_types.into_iter().next(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

// ── Error classification ────────────────────────────────────────

fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_decode() {
        GatewayError::Rejected(format!("unexpected response: {}", e))
    } else {
        GatewayError::Unavailable(e.to_string())
    }
}

async fn classify_failure(response: reqwest::Response, session_id: Option<&str>) -> GatewayError {
    let status = response.status();
    let body = response.json::<ErrorEnvelope>().await.ok().map(|e| e.error);
    let message = body
        .as_ref()
        .and_then(|b| b.message.clone())
        .unwrap_or_else(|| status.to_string());
    let missing = body.as_ref().and_then(|b| b.code.as_deref()) == Some("resource_missing");

    match (status, session_id) {
        (StatusCode::NOT_FOUND, Some(id)) => GatewayError::SessionNotFound(id.to_string()),
        (_, Some(id)) if missing => GatewayError::SessionNotFound(id.to_string()),
        (StatusCode::TOO_MANY_REQUESTS, _) => GatewayError::Unavailable(message),
        (s, _) if s.is_server_error() => GatewayError::Unavailable(message),
        _ => GatewayError::Rejected(message),
    }
}

// ── PaymentGateway impl ─────────────────────────────────────────

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, GatewayError> {
        debug!(session_id, "Retrieving checkout session");

        let response = self
            .client
            .get(self.url(&format!("checkout/sessions/{}", session_id)))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let err = classify_failure(response, Some(session_id)).await;
            warn!(session_id, error = %err, "Checkout session lookup failed");
            return Err(err);
        }

        let body: SessionBody = response.json().await.map_err(transport_error)?;
        Ok(body.into())
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CreatedCheckout, GatewayError> {
        let start = request.range.start().to_string();
        let end = request.range.end().to_string();
        let amount = request.amount.to_string();
        let product_name = format!(
            "{} ({} night{})",
            request.listing_title,
            request.range.nights(),
            if request.range.nights() == 1 { "" } else { "s" }
        );

        let mut form: Vec<(String, String)> = vec![
            ("mode".into(), "payment".into()),
            ("success_url".into(), self.config.success_url.clone()),
            ("cancel_url".into(), self.config.cancel_url.clone()),
            ("line_items[0][quantity]".into(), "1".into()),
            (
                "line_items[0][price_data][currency]".into(),
                request.currency.to_lowercase(),
            ),
            ("line_items[0][price_data][unit_amount]".into(), amount.clone()),
            (
                "line_items[0][price_data][product_data][name]".into(),
                product_name,
            ),
            ("client_reference_id".into(), request.user_id.clone()),
        ];
        if let Some(email) = &request.customer_email {
            form.push(("customer_email".into(), email.clone()));
        }
        for (key, value) in [
            (metadata_keys::LISTING_ID, request.listing_id.clone()),
            (metadata_keys::USER_ID, request.user_id.clone()),
            (metadata_keys::START_DATE, start),
            (metadata_keys::END_DATE, end),
            (metadata_keys::TOTAL_PRICE, amount),
        ] {
            form.push((format!("metadata[{}]", key), value));
        }

        let response = self
            .client
            .post(self.url("checkout/sessions"))
            .bearer_auth(&self.config.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let err = classify_failure(response, None).await;
            warn!(listing_id = %request.listing_id, error = %err, "Checkout session creation failed");
            return Err(err);
        }

        let body: SessionBody = response.json().await.map_err(transport_error)?;
        info!(
            session_id = %body.id,
            listing_id = %request.listing_id,
            user_id = %request.user_id,
            "Checkout session created"
        );
        Ok(CreatedCheckout {
            session_id: body.id,
            url: body.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_body_maps_to_checkout_session() {
        let body: SessionBody = serde_json::from_value(serde_json::json!({
            "id": "cs_test_1",
            "payment_status": "paid",
            "metadata": {"listingId": "L1", "userId": "U1"},
            "amount_total": 20000,
            "currency": "usd",
            "payment_intent": "pi_123",
            "payment_method_types": ["card"]
        }))
        .unwrap();

        let session: CheckoutSession = body.into();
        assert!(session.is_paid());
        assert_eq!(session.transaction_id.as_deref(), Some("pi_123"));
        assert_eq!(session.payment_method.as_deref(), Some("card"));
        assert_eq!(session.metadata_value(metadata_keys::LISTING_ID), Some("L1"));
    }

    #[test]
    fn expanded_payment_intent_yields_its_id() {
        let body: SessionBody = serde_json::from_value(serde_json::json!({
            "id": "cs_test_2",
            "payment_intent": {"id": "pi_456", "status": "succeeded"}
        }))
        .unwrap();
        assert_eq!(body.payment_intent_id().as_deref(), Some("pi_456"));

        let session: CheckoutSession = body.into();
        assert!(!session.is_paid());
    }

    #[test]
    fn urls_join_without_double_slash() {
        let gateway = StripeGateway::new(StripeConfig {
            secret_key: "sk_test".into(),
            api_base: "http://localhost:12111/".into(),
            success_url: String::new(),
            cancel_url: String::new(),
            request_timeout: Duration::from_secs(1),
        })
        .unwrap();
        assert_eq!(
            gateway.url("checkout/sessions"),
            "http://localhost:12111/v1/checkout/sessions"
        );
    }
}
