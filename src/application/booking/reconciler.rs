//! Reservation / payment reconciliation
//!
//! Every reservation is created here, from one of two sources:
//!
//! - a paid provider checkout session (card), confirmed by the client
//!   redirect or by the provider webhook, possibly both and concurrently
//! - a cash request, which starts `PENDING` until the host decides
//!
//! Per attempt: validate input, short-circuit if the session was already
//! reconciled, verify the payment with the provider (card only), check for
//! overlapping stays, then write reservation and payment atomically. The
//! write re-checks overlap inside its transaction and the unique payment
//! session id stops a second confirmation of the same checkout.
//! Notifications go out only after the write has committed.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::availability::AvailabilityChecker;
use super::notices::{notice, Parties};
use crate::application::events::{Event, ReservationCreatedEvent, SharedEventBus};
use crate::application::notifications::NotificationDispatcher;
use crate::application::ports::{metadata_keys, CheckoutSession, Notification, PaymentGateway};
use crate::domain::reservation::parse_booking_date;
use crate::domain::{
    Booking, DateRange, DomainError, DomainResult, Listing, Payment, PaymentMethod,
    RepositoryProvider, Reservation, User,
};
use crate::shared::money::to_minor_units;
use crate::shared::retry::{retry_with_backoff, RetryPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub reservation_id: String,
    pub payment_id: String,
    /// The session had been reconciled by an earlier call; nothing was written.
    pub already_confirmed: bool,
}

/// A guest's request to book and pay cash on arrival.
#[derive(Debug, Clone)]
pub struct CashReservationRequest {
    pub listing_id: String,
    pub user_id: String,
    pub start_date: String,
    pub end_date: String,
    /// Major units, at most two decimal places
    pub total_price: Decimal,
}

/// Stay details recovered and validated from checkout metadata.
struct PaidStay {
    listing_id: String,
    user_id: String,
    range: DateRange,
    total_price: i64,
}

pub struct Reconciler {
    repos: Arc<dyn RepositoryProvider>,
    gateway: Arc<dyn PaymentGateway>,
    availability: AvailabilityChecker,
    dispatcher: NotificationDispatcher,
    events: SharedEventBus,
    retry: RetryPolicy,
    currency: String,
}

impl Reconciler {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        gateway: Arc<dyn PaymentGateway>,
        dispatcher: NotificationDispatcher,
        events: SharedEventBus,
        retry: RetryPolicy,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            availability: AvailabilityChecker::new(repos.clone()),
            repos,
            gateway,
            dispatcher,
            events,
            retry,
            currency: currency.into().to_lowercase(),
        }
    }

    // ── Card ────────────────────────────────────────────────────

    /// Confirm a provider checkout session and create its reservation.
    /// Repeated calls for the same session return the original reservation
    /// with `already_confirmed` set.
    pub async fn confirm_card_payment(&self, session_id: &str) -> DomainResult<ReconcileOutcome> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(DomainError::Validation("sessionId is required".into()));
        }

        if let Some(outcome) = self.already_reconciled(session_id).await? {
            info!(
                session_id,
                reservation_id = %outcome.reservation_id,
                "Checkout session already confirmed"
            );
            return Ok(outcome);
        }

        let session = retry_with_backoff(
            &self.retry,
            || self.gateway.retrieve_session(session_id),
            |e| e.is_transient(),
            "retrieve_checkout_session",
        )
        .await?;

        if !session.is_paid() {
            warn!(session_id, payment_status = %session.payment_status, "Checkout session not paid");
            return Err(DomainError::PaymentNotCompleted(format!(
                "Checkout session {} has payment status '{}'",
                session_id, session.payment_status
            )));
        }

        let stay = paid_stay(&session)?;
        let (listing, guest, host) = self.load_booking_parties(&stay.listing_id, &stay.user_id).await?;

        let reservation = Reservation::new(
            &listing.id,
            &guest.id,
            stay.range,
            stay.total_price,
            session_id,
        );
        let method = session
            .payment_method
            .as_deref()
            .map(PaymentMethod::from_provider)
            .unwrap_or(PaymentMethod::Card);
        let currency = session.currency.clone().unwrap_or_else(|| self.currency.clone());
        let payment = Payment::paid_card(
            &reservation.id,
            &guest.id,
            &listing.id,
            session_id,
            session.transaction_id.clone(),
            method,
            stay.total_price,
            &currency,
        );

        let booking = match self
            .create(&listing, Booking { reservation, payment }, Some(session_id))
            .await
        {
            Ok(booking) => booking,
            Err(DomainError::Conflict(reason)) => {
                // A concurrent confirmation of this session may have won the write.
                if let Some(outcome) = self.already_reconciled(session_id).await? {
                    info!(session_id, "Checkout session confirmed concurrently");
                    return Ok(outcome);
                }
                return Err(DomainError::Conflict(reason));
            }
            Err(e) => return Err(e),
        };

        let parties = Parties { guest, host };
        let n = notice(&parties, &booking.reservation, &listing, &booking.payment);
        self.dispatcher.dispatch_all([
            Notification::ReservationConfirmed(n.clone()),
            Notification::Invoice {
                notice: n.clone(),
                payment_id: booking.payment.id.clone(),
                transaction_id: booking.payment.transaction_id.clone(),
            },
            Notification::BookingAlert(n),
        ]);

        Ok(ReconcileOutcome {
            reservation_id: booking.reservation.id,
            payment_id: booking.payment.id,
            already_confirmed: false,
        })
    }

    async fn already_reconciled(&self, session_id: &str) -> DomainResult<Option<ReconcileOutcome>> {
        let Some(reservation) = self.repos.reservations().find_by_session_id(session_id).await? else {
            return Ok(None);
        };
        let payment = self
            .repos
            .payments()
            .find_by_reservation(&reservation.id)
            .await?
            .ok_or_else(|| {
                DomainError::Storage(format!("Reservation {} has no payment", reservation.id))
            })?;
        Ok(Some(ReconcileOutcome {
            reservation_id: reservation.id,
            payment_id: payment.id,
            already_confirmed: true,
        }))
    }

    // ── Cash ────────────────────────────────────────────────────

    /// Book a stay to be paid in cash on arrival. The payment starts
    /// `PENDING` and expires on the first night.
    pub async fn create_cash_reservation(
        &self,
        caller_id: &str,
        request: CashReservationRequest,
    ) -> DomainResult<ReconcileOutcome> {
        let listing_id = required("listingId", &request.listing_id)?;
        let user_id = required("userId", &request.user_id)?;
        let start = parse_booking_date("startDate", &request.start_date)?;
        let end = parse_booking_date("endDate", &request.end_date)?;
        let range = DateRange::new(start, end)?;
        if request.total_price <= Decimal::ZERO {
            return Err(DomainError::Validation("totalPrice must be positive".into()));
        }
        let total_price = to_minor_units(request.total_price).ok_or_else(|| {
            DomainError::Validation("totalPrice must have at most two decimal places".into())
        })?;

        if user_id != caller_id {
            return Err(DomainError::Forbidden(
                "Cash reservations can only be made for yourself".into(),
            ));
        }

        let (listing, guest, host) = self.load_booking_parties(listing_id, user_id).await?;

        let session_id = format!("cash_{}", uuid::Uuid::new_v4());
        let reservation = Reservation::new(&listing.id, &guest.id, range, total_price, &session_id);
        let expires_at = range.start().and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        let payment = Payment::pending_cash(
            &reservation.id,
            &guest.id,
            &listing.id,
            &session_id,
            total_price,
            &self.currency,
            expires_at,
        );

        let booking = self.create(&listing, Booking { reservation, payment }, None).await?;

        let parties = Parties { guest, host };
        let n = notice(&parties, &booking.reservation, &listing, &booking.payment);
        self.dispatcher.dispatch_all([
            Notification::ReservationPending(n.clone()),
            Notification::CashRequestReceived(n),
        ]);

        Ok(ReconcileOutcome {
            reservation_id: booking.reservation.id,
            payment_id: booking.payment.id,
            already_confirmed: false,
        })
    }

    // ── Shared steps ────────────────────────────────────────────

    async fn load_booking_parties(
        &self,
        listing_id: &str,
        user_id: &str,
    ) -> DomainResult<(Listing, User, User)> {
        let listing = self
            .repos
            .listings()
            .find_by_id(listing_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Listing", "id", listing_id))?;
        let guest = self
            .repos
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "id", user_id))?;
        let host = self
            .repos
            .users()
            .find_by_id(&listing.owner_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "id", listing.owner_id.as_str()))?;
        Ok((listing, guest, host))
    }

    /// Conflict check followed by the atomic write.
    async fn create(
        &self,
        listing: &Listing,
        booking: Booking,
        exclude_session_id: Option<&str>,
    ) -> DomainResult<Booking> {
        let range = booking.reservation.period();
        let method = booking.payment.method.as_str();

        if self
            .availability
            .conflicts_with(&listing.id, &range, exclude_session_id)
            .await?
        {
            metrics::counter!("reservation_conflicts_total", "method" => method).increment(1);
            return Err(DomainError::Conflict(format!(
                "Listing {} is not available for {}",
                listing.id, range
            )));
        }

        let booking = match self.repos.reservations().create_with_payment(booking).await {
            Ok(booking) => booking,
            Err(e) => {
                if matches!(e, DomainError::Conflict(_)) {
                    metrics::counter!("reservation_conflicts_total", "method" => method)
                        .increment(1);
                }
                return Err(e);
            }
        };

        metrics::counter!("reservations_created_total", "method" => method).increment(1);
        info!(
            reservation_id = %booking.reservation.id,
            payment_id = %booking.payment.id,
            listing_id = %listing.id,
            session_id = %booking.payment.session_id,
            status = %booking.payment.status,
            period = %range,
            "Reservation created"
        );

        self.events
            .publish(Event::ReservationCreated(ReservationCreatedEvent {
                reservation_id: booking.reservation.id.clone(),
                listing_id: listing.id.clone(),
                user_id: booking.reservation.user_id.clone(),
                host_id: listing.owner_id.clone(),
                start_date: booking.reservation.start_date,
                end_date: booking.reservation.end_date,
                payment_method: method.to_string(),
                payment_status: booking.payment.status.to_string(),
                timestamp: Utc::now(),
            }));

        Ok(booking)
    }
}

fn required<'a>(field: &str, value: &'a str) -> DomainResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::Validation(format!("{} is required", field)));
    }
    Ok(value)
}

fn metadata<'a>(session: &'a CheckoutSession, key: &str) -> DomainResult<&'a str> {
    session.metadata_value(key).ok_or_else(|| {
        DomainError::Validation(format!(
            "Checkout session {} is missing '{}' metadata",
            session.id, key
        ))
    })
}

fn paid_stay(session: &CheckoutSession) -> DomainResult<PaidStay> {
    let listing_id = metadata(session, metadata_keys::LISTING_ID)?.to_string();
    let user_id = metadata(session, metadata_keys::USER_ID)?.to_string();
    let start = parse_booking_date("startDate", metadata(session, metadata_keys::START_DATE)?)?;
    let end = parse_booking_date("endDate", metadata(session, metadata_keys::END_DATE)?)?;
    let range = DateRange::new(start, end)?;

    let total_price = session
        .metadata_value(metadata_keys::TOTAL_PRICE)
        .and_then(|v| v.parse::<i64>().ok())
        .or(session.amount_total)
        .filter(|amount| *amount > 0)
        .ok_or_else(|| {
            DomainError::Validation(format!(
                "Checkout session {} carries no usable total price",
                session.id
            ))
        })?;

    Ok(PaidStay {
        listing_id,
        user_id,
        range,
        total_price,
    })
}
