//! Stripe webhook signature verification
//!
//! The `Stripe-Signature` header carries a timestamp and one or more `v1`
//! signatures: `t=1700000000,v1=<hex>,v1=<hex>`. A signature is the hex
//! HMAC-SHA256 of `"{t}.{raw body}"` keyed with the endpoint secret.

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use crate::shared::errors::DomainError;

type HmacSha256 = Hmac<Sha256>;

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("malformed signature header")]
    MalformedHeader,

    #[error("timestamp outside the tolerance window")]
    TimestampOutsideTolerance,

    #[error("no signature matches the payload")]
    SignatureMismatch,

    #[error("invalid webhook secret")]
    InvalidSecret,

    #[error("invalid event payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl From<WebhookError> for DomainError {
    fn from(err: WebhookError) -> Self {
        DomainError::Validation(format!("Webhook rejected: {}", err))
    }
}

#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

impl StripeEvent {
    /// Session id of a completed checkout, `None` for any other event.
    pub fn completed_checkout_session(&self) -> Option<&str> {
        if self.event_type != CHECKOUT_SESSION_COMPLETED {
            return None;
        }
        self.data.object.get("id")?.as_str()
    }
}

#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>, tolerance_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs,
        }
    }

    /// An empty secret would let anyone sign events.
    pub fn is_configured(&self) -> bool {
        !self.secret.is_empty()
    }

    /// Verify the signature header and decode the event.
    pub fn construct_event(&self, payload: &[u8], header: &str) -> Result<StripeEvent, WebhookError> {
        self.verify(payload, header, Utc::now().timestamp())?;
        Ok(serde_json::from_slice(payload)?)
    }

    pub fn verify(&self, payload: &[u8], header: &str, now: i64) -> Result<(), WebhookError> {
        let (timestamp, signatures) = parse_header(header)?;

        if (now - timestamp).abs() > self.tolerance_secs {
            return Err(WebhookError::TimestampOutsideTolerance);
        }

        let mac = self.mac(timestamp, payload)?;
        let matched = signatures.iter().any(|candidate| {
            hex::decode(candidate)
                .map(|expected| mac.clone().verify_slice(&expected).is_ok())
                .unwrap_or(false)
        });

        if matched {
            Ok(())
        } else {
            Err(WebhookError::SignatureMismatch)
        }
    }

    /// Header value for `payload` signed at `timestamp`.
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> Result<String, WebhookError> {
        let signature = hex::encode(self.mac(timestamp, payload)?.finalize().into_bytes());
        Ok(format!("t={},v1={}", timestamp, signature))
    }

    fn mac(&self, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, WebhookError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| WebhookError::InvalidSecret)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac)
    }
}

fn parse_header(header: &str) -> Result<(i64, Vec<&str>), WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    match timestamp {
        Some(t) if !signatures.is_empty() => Ok((t, signatures)),
        _ => Err(WebhookError::MalformedHeader),
    }
}
