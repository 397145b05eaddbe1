//! Payment domain entity

use chrono::{DateTime, Utc};

use crate::shared::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Card,
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Cash => "cash",
        }
    }

    /// Stored column value; `None` for anything this service never writes.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "card" => Some(Self::Card),
            "cash" => Some(Self::Cash),
            _ => None,
        }
    }

    /// Method reported by the provider. Anything that is not cash was paid online.
    pub fn from_provider(s: &str) -> Self {
        Self::parse(s).unwrap_or(Self::Card)
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    /// Cash request waiting for the host
    Pending,
    /// Cash request accepted by the host
    Success,
    Failed,
    /// Card payment verified with the provider
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Paid => "PAID",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "SUCCESS" => Some(Self::Success),
            "FAILED" => Some(Self::Failed),
            "PAID" => Some(Self::Paid),
            _ => None,
        }
    }

    /// The only transition the service performs in place.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!((self, next), (Self::Pending, Self::Success))
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One charge attempt or outcome, tied to a reservation.
#[derive(Debug, Clone)]
pub struct Payment {
    pub id: String,
    pub reservation_id: Option<String>,
    pub user_id: String,
    pub listing_id: String,
    /// Unique across payments
    pub session_id: String,
    pub transaction_id: Option<String>,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Amount in minor units
    pub amount: i64,
    pub currency: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// A card payment already verified by the provider.
    #[allow(clippy::too_many_arguments)]
    pub fn paid_card(
        reservation_id: &str,
        user_id: &str,
        listing_id: &str,
        session_id: &str,
        transaction_id: Option<String>,
        method: PaymentMethod,
        amount: i64,
        currency: &str,
    ) -> Self {
        Self::build(
            reservation_id,
            user_id,
            listing_id,
            session_id,
            transaction_id,
            method,
            PaymentStatus::Paid,
            amount,
            currency,
            None,
        )
    }

    /// A cash payment waiting for the host's decision.
    pub fn pending_cash(
        reservation_id: &str,
        user_id: &str,
        listing_id: &str,
        session_id: &str,
        amount: i64,
        currency: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self::build(
            reservation_id,
            user_id,
            listing_id,
            session_id,
            None,
            PaymentMethod::Cash,
            PaymentStatus::Pending,
            amount,
            currency,
            expires_at,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        reservation_id: &str,
        user_id: &str,
        listing_id: &str,
        session_id: &str,
        transaction_id: Option<String>,
        method: PaymentMethod,
        status: PaymentStatus,
        amount: i64,
        currency: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            reservation_id: Some(reservation_id.to_string()),
            user_id: user_id.to_string(),
            listing_id: listing_id.to_string(),
            session_id: session_id.to_string(),
            transaction_id,
            method,
            status,
            amount,
            currency: currency.to_lowercase(),
            expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    /// Guard for the host's accept/reject decision: only pending cash
    /// payments can be decided.
    pub fn ensure_pending_cash(&self, to: PaymentStatus) -> Result<(), DomainError> {
        if self.method != PaymentMethod::Cash || self.status != PaymentStatus::Pending {
            return Err(DomainError::InvalidTransition {
                entity: "Payment",
                from: format!("{} {}", self.method, self.status),
                to: to.to_string(),
            });
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cash() -> Payment {
        Payment::pending_cash("R1", "U1", "L1", "cash_1", 30_000, "USD", None)
    }

    #[test]
    fn cash_payment_starts_pending() {
        let p = cash();
        assert_eq!(p.status, PaymentStatus::Pending);
        assert_eq!(p.method, PaymentMethod::Cash);
        assert_eq!(p.currency, "usd");
        assert_eq!(p.reservation_id.as_deref(), Some("R1"));
    }

    #[test]
    fn card_payment_is_created_paid() {
        let p = Payment::paid_card(
            "R1",
            "U1",
            "L1",
            "cs_test_1",
            Some("pi_1".into()),
            PaymentMethod::Card,
            20_000,
            "usd",
        );
        assert_eq!(p.status, PaymentStatus::Paid);
        assert_eq!(p.transaction_id.as_deref(), Some("pi_1"));
    }

    #[test]
    fn only_pending_to_success_is_allowed() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Success));
        assert!(!PaymentStatus::Success.can_transition_to(PaymentStatus::Success));
        assert!(!PaymentStatus::Paid.can_transition_to(PaymentStatus::Success));
        assert!(!PaymentStatus::Pending.can_transition_to(PaymentStatus::Paid));
    }

    #[test]
    fn decided_or_card_payments_cannot_be_decided_again() {
        let mut p = cash();
        assert!(p.ensure_pending_cash(PaymentStatus::Success).is_ok());

        p.status = PaymentStatus::Success;
        assert!(matches!(
            p.ensure_pending_cash(PaymentStatus::Success),
            Err(DomainError::InvalidTransition { .. })
        ));

        let card = Payment::paid_card("R2", "U1", "L1", "cs_2", None, PaymentMethod::Card, 1, "usd");
        assert!(card.ensure_pending_cash(PaymentStatus::Success).is_err());
    }

    #[test]
    fn status_strings_roundtrip() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Success,
            PaymentStatus::Failed,
            PaymentStatus::Paid,
        ] {
            assert_eq!(PaymentStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn unknown_stored_values_are_not_guessed() {
        assert_eq!(PaymentStatus::parse("paid"), None);
        assert_eq!(PaymentStatus::parse(""), None);
        assert_eq!(PaymentMethod::parse("CASH"), None);
        assert_eq!(PaymentMethod::parse("card"), Some(PaymentMethod::Card));
    }

    #[test]
    fn provider_methods_default_to_card() {
        assert_eq!(PaymentMethod::from_provider("link"), PaymentMethod::Card);
        assert_eq!(PaymentMethod::from_provider("cash"), PaymentMethod::Cash);
    }
}
