//! Reservation domain entity

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::payment::Payment;
use crate::shared::errors::DomainError;

/// A validated stay: `start` strictly before `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DomainError> {
        if start >= end {
            return Err(DomainError::Validation(format!(
                "start date {} must be before end date {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Inclusive on both ends: a stay ending on the 5th conflicts with one
    /// starting on the 5th.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && self.end >= other.start
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Parse a booking date given either as `YYYY-MM-DD` or as an RFC 3339
/// timestamp (its UTC calendar date is used).
pub fn parse_booking_date(field: &str, value: &str) -> Result<NaiveDate, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::Validation(format!("{} is required", field)));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| DomainError::Validation(format!("{} is not a valid date: {}", field, value)))
}

/// A booked date range for a listing by a guest.
#[derive(Debug, Clone)]
pub struct Reservation {
    pub id: String,
    pub listing_id: String,
    pub user_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Total in minor units
    pub total_price: i64,
    /// External payment session id (or `cash_<uuid>`), the idempotency key
    pub session_id: String,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn new(
        listing_id: impl Into<String>,
        user_id: impl Into<String>,
        range: DateRange,
        total_price: i64,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            listing_id: listing_id.into(),
            user_id: user_id.into(),
            start_date: range.start(),
            end_date: range.end(),
            total_price,
            session_id: session_id.into(),
            created_at: Utc::now(),
        }
    }

    /// The stored period. Rows are only ever written from a validated
    /// `DateRange`, so this does not re-validate.
    pub fn period(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }

    pub fn overlaps(&self, range: &DateRange) -> bool {
        self.period().overlaps(range)
    }

    pub fn is_guest(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// A reservation together with the payment created alongside it.
#[derive(Debug, Clone)]
pub struct Booking {
    pub reservation: Reservation,
    pub payment: Payment,
}

// ── Tests ──────────────────────────────────────────────────────
