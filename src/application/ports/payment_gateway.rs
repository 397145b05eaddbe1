//! Payment provider port
//!
//! The single production implementation is
//! [`StripeGateway`](crate::infrastructure::payments::StripeGateway).

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::DateRange;
use crate::shared::errors::DomainError;

/// Keys written into the checkout session metadata when the session is
/// created and read back when it is confirmed.
pub mod metadata_keys {
    pub const LISTING_ID: &str = "listingId";
    pub const USER_ID: &str = "userId";
    pub const START_DATE: &str = "startDate";
    pub const END_DATE: &str = "endDate";
    pub const TOTAL_PRICE: &str = "totalPrice";
}

/// A checkout session as reported by the provider.
#[derive(Debug, Clone, Default)]
pub struct CheckoutSession {
    pub id: String,
    /// Provider payment status, `"paid"` once the charge succeeded
    pub payment_status: String,
    pub metadata: HashMap<String, String>,
    /// Amount charged in minor units
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    /// Provider transaction reference (payment intent)
    pub transaction_id: Option<String>,
    pub payment_method: Option<String>,
}

impl CheckoutSession {
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Everything needed to open a checkout for one stay.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub listing_id: String,
    pub listing_title: String,
    pub user_id: String,
    pub customer_email: Option<String>,
    pub range: DateRange,
    /// Amount in minor units
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct CreatedCheckout {
    pub session_id: String,
    /// Hosted payment page
    pub url: Option<String>,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Unknown or expired session
    #[error("checkout session {0} not found")]
    SessionNotFound(String),

    /// Network failure, timeout, 5xx or rate limiting
    #[error("payment provider unavailable: {0}")]
    Unavailable(String),

    /// The provider refused the request (bad key, invalid parameters)
    #[error("payment provider rejected the request: {0}")]
    Rejected(String),
}

impl GatewayError {
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Unavailable(_))
    }
}

impl From<GatewayError> for DomainError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::SessionNotFound(id) => DomainError::NotFound {
                entity: "CheckoutSession",
                field: "id",
                value: id,
            },
            GatewayError::Unavailable(message) => DomainError::PaymentProvider {
                message,
                transient: true,
            },
            GatewayError::Rejected(message) => DomainError::PaymentProvider {
                message,
                transient: false,
            },
        }
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Look up a checkout session by id.
    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, GatewayError>;

    /// Open a hosted checkout for the given stay.
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CreatedCheckout, GatewayError>;
}
