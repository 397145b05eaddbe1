//! Card confirmation and cash booking through the reconciler.

mod common;

use std::str::FromStr;

use rust_decimal::Decimal;

use common::{received_kinds, session, TestApp};
use stayhub::application::booking::CashReservationRequest;
use stayhub::application::ports::GatewayError;
use stayhub::domain::{DomainError, PaymentMethod, PaymentStatus, UserRole};

#[tokio::test]
async fn paid_session_creates_reservation_and_paid_payment() {
    let mut app = TestApp::new().await;
    let host = app.user("hank", UserRole::Host).await;
    let guest = app.user("gina", UserRole::Guest).await;
    let listing = app.listing(&host).await;
    app.gateway
        .paid_session("cs_1", &listing.id, &guest.id, "2024-06-06", "2024-06-08", 20_000);

    let outcome = app.state.reconciler.confirm_card_payment("cs_1").await.unwrap();
    assert!(!outcome.already_confirmed);

    let reservation = app
        .state
        .repos
        .reservations()
        .find_by_id(&outcome.reservation_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reservation.listing_id, listing.id);
    assert_eq!(reservation.user_id, guest.id);
    assert_eq!(reservation.total_price, 20_000);
    assert_eq!(reservation.session_id, "cs_1");

    let payment = app
        .state
        .repos
        .payments()
        .find_by_session_id("cs_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.id, outcome.payment_id);
    assert_eq!(payment.status, PaymentStatus::Paid);
    assert_eq!(payment.method, PaymentMethod::Card);
    assert_eq!(payment.reservation_id.as_deref(), Some(reservation.id.as_str()));
    assert_eq!(payment.transaction_id.as_deref(), Some("pi_cs_1"));

    let kinds = received_kinds(&mut app.notifications, 3).await;
    assert_eq!(kinds, vec!["booking_alert", "invoice", "reservation_confirmed"]);
}

#[tokio::test]
async fn second_confirmation_returns_the_original_reservation() {
    let app = TestApp::new().await;
    let host = app.user("hank", UserRole::Host).await;
    let guest = app.user("gina", UserRole::Guest).await;
    let listing = app.listing(&host).await;
    app.gateway
        .paid_session("cs_1", &listing.id, &guest.id, "2024-06-06", "2024-06-08", 20_000);

    let first = app.state.reconciler.confirm_card_payment("cs_1").await.unwrap();
    let second = app.state.reconciler.confirm_card_payment("cs_1").await.unwrap();

    assert!(second.already_confirmed);
    assert_eq!(second.reservation_id, first.reservation_id);
    assert_eq!(second.payment_id, first.payment_id);
    // The short-circuit happens before the provider is asked again.
    assert_eq!(app.gateway.retrievals(), 1);

    let reservations = app
        .state
        .repos
        .reservations()
        .find_for_listing(&listing.id)
        .await
        .unwrap();
    assert_eq!(reservations.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_confirmations_create_one_reservation() {
    let app = TestApp::file_backed().await;
    let host = app.user("hank", UserRole::Host).await;
    let guest = app.user("gina", UserRole::Guest).await;
    let listing = app.listing(&host).await;
    app.gateway
        .paid_session("cs_race", &listing.id, &guest.id, "2024-07-01", "2024-07-04", 30_000);

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let reconciler = app.state.reconciler.clone();
            tokio::spawn(async move { reconciler.confirm_card_payment("cs_race").await })
        })
        .collect();

    let mut created = 0;
    let mut reservation_ids = Vec::new();
    for task in tasks {
        match task.await.unwrap() {
            Ok(outcome) => {
                if !outcome.already_confirmed {
                    created += 1;
                }
                reservation_ids.push(outcome.reservation_id);
            }
            Err(e) => panic!("confirmation lost the race with {e}"),
        }
    }
    assert_eq!(created, 1);
    reservation_ids.sort();
    reservation_ids.dedup();
    assert_eq!(reservation_ids.len(), 1);

    let reservations = app
        .state
        .repos
        .reservations()
        .find_for_listing(&listing.id)
        .await
        .unwrap();
    assert_eq!(reservations.len(), 1);
}

#[tokio::test]
async fn unpaid_session_is_rejected_without_writes() {
    let app = TestApp::new().await;
    let host = app.user("hank", UserRole::Host).await;
    let guest = app.user("gina", UserRole::Guest).await;
    let listing = app.listing(&host).await;
    app.gateway.add_session(session(
        "cs_open",
        "unpaid",
        &listing.id,
        &guest.id,
        "2024-06-06",
        "2024-06-08",
        20_000,
    ));

    let err = app
        .state
        .reconciler
        .confirm_card_payment("cs_open")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::PaymentNotCompleted(_)));
    assert!(app
        .state
        .repos
        .reservations()
        .find_by_session_id("cs_open")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let app = TestApp::new().await;

    let err = app
        .state
        .reconciler
        .confirm_card_payment("cs_missing")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity: "CheckoutSession", .. }));
}

#[tokio::test]
async fn blank_session_id_is_a_validation_error() {
    let app = TestApp::new().await;

    let err = app.state.reconciler.confirm_card_payment("  ").await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
    assert_eq!(app.gateway.retrievals(), 0);
}

#[tokio::test]
async fn transient_provider_failures_are_retried() {
    let app = TestApp::new().await;
    let host = app.user("hank", UserRole::Host).await;
    let guest = app.user("gina", UserRole::Guest).await;
    let listing = app.listing(&host).await;
    app.gateway
        .paid_session("cs_flaky", &listing.id, &guest.id, "2024-06-06", "2024-06-08", 20_000);
    app.gateway.fail_next(GatewayError::Unavailable("timeout".into()));

    let outcome = app
        .state
        .reconciler
        .confirm_card_payment("cs_flaky")
        .await
        .unwrap();
    assert!(!outcome.already_confirmed);
    assert_eq!(app.gateway.retrievals(), 2);
}

#[tokio::test]
async fn exhausted_retries_surface_a_transient_provider_error() {
    let app = TestApp::new().await;
    for _ in 0..3 {
        app.gateway.fail_next(GatewayError::Unavailable("503".into()));
    }

    let err = app
        .state
        .reconciler
        .confirm_card_payment("cs_down")
        .await
        .unwrap_err();
    assert!(err.is_transient());
    assert_eq!(app.gateway.retrievals(), 3);
}

#[tokio::test]
async fn rejected_provider_calls_are_not_retried() {
    let app = TestApp::new().await;
    app.gateway.fail_next(GatewayError::Rejected("invalid api key".into()));

    let err = app
        .state
        .reconciler
        .confirm_card_payment("cs_1")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::PaymentProvider { transient: false, .. }));
    assert_eq!(app.gateway.retrievals(), 1);
}

#[tokio::test]
async fn paid_session_for_taken_dates_conflicts() {
    let app = TestApp::new().await;
    let host = app.user("hank", UserRole::Host).await;
    let guest = app.user("gina", UserRole::Guest).await;
    let other = app.user("olga", UserRole::Guest).await;
    let listing = app.listing(&host).await;
    app.gateway
        .paid_session("cs_1", &listing.id, &guest.id, "2024-06-06", "2024-06-08", 20_000);
    app.gateway
        .paid_session("cs_2", &listing.id, &other.id, "2024-06-07", "2024-06-09", 20_000);

    app.state.reconciler.confirm_card_payment("cs_1").await.unwrap();
    let err = app
        .state
        .reconciler
        .confirm_card_payment("cs_2")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
    assert!(app
        .state
        .repos
        .payments()
        .find_by_session_id("cs_2")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn session_missing_metadata_is_rejected() {
    let app = TestApp::new().await;
    let mut incomplete = session("cs_bare", "paid", "L1", "U1", "2024-06-06", "2024-06-08", 100);
    incomplete.metadata.remove("listingId");
    app.gateway.add_session(incomplete);

    let err = app
        .state
        .reconciler
        .confirm_card_payment("cs_bare")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

fn cash_request(listing_id: &str, user_id: &str, start: &str, end: &str) -> CashReservationRequest {
    CashReservationRequest {
        listing_id: listing_id.into(),
        user_id: user_id.into(),
        start_date: start.into(),
        end_date: end.into(),
        total_price: Decimal::from(200),
    }
}

#[tokio::test]
async fn cash_booking_starts_pending_until_the_first_night() {
    let mut app = TestApp::new().await;
    let host = app.user("hank", UserRole::Host).await;
    let guest = app.user("gina", UserRole::Guest).await;
    let listing = app.listing(&host).await;

    let outcome = app
        .state
        .reconciler
        .create_cash_reservation(
            &guest.id,
            cash_request(&listing.id, &guest.id, "2024-06-06", "2024-06-08"),
        )
        .await
        .unwrap();

    let payment = app
        .state
        .repos
        .payments()
        .find_by_id(&outcome.payment_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.method, PaymentMethod::Cash);
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.amount, 20_000);
    assert!(payment.session_id.starts_with("cash_"));
    assert_eq!(
        payment.expires_at.map(|t| t.to_rfc3339()),
        Some("2024-06-06T00:00:00+00:00".to_string())
    );

    let kinds = received_kinds(&mut app.notifications, 2).await;
    assert_eq!(kinds, vec!["cash_request_received", "reservation_pending"]);
}

#[tokio::test]
async fn cash_booking_for_someone_else_is_forbidden() {
    let app = TestApp::new().await;
    let host = app.user("hank", UserRole::Host).await;
    let guest = app.user("gina", UserRole::Guest).await;
    let other = app.user("olga", UserRole::Guest).await;
    let listing = app.listing(&host).await;

    let err = app
        .state
        .reconciler
        .create_cash_reservation(
            &other.id,
            cash_request(&listing.id, &guest.id, "2024-06-06", "2024-06-08"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
}

#[tokio::test]
async fn cash_booking_input_is_validated() {
    let app = TestApp::new().await;
    let host = app.user("hank", UserRole::Host).await;
    let guest = app.user("gina", UserRole::Guest).await;
    let listing = app.listing(&host).await;
    let reconciler = &app.state.reconciler;

    let inverted = cash_request(&listing.id, &guest.id, "2024-06-08", "2024-06-06");
    assert!(matches!(
        reconciler.create_cash_reservation(&guest.id, inverted).await,
        Err(DomainError::Validation(_))
    ));

    let garbage = cash_request(&listing.id, &guest.id, "next week", "2024-06-06");
    assert!(matches!(
        reconciler.create_cash_reservation(&guest.id, garbage).await,
        Err(DomainError::Validation(_))
    ));

    let mut free = cash_request(&listing.id, &guest.id, "2024-06-06", "2024-06-08");
    free.total_price = Decimal::ZERO;
    assert!(matches!(
        reconciler.create_cash_reservation(&guest.id, free).await,
        Err(DomainError::Validation(_))
    ));

    let mut sub_cent = cash_request(&listing.id, &guest.id, "2024-06-06", "2024-06-08");
    sub_cent.total_price = Decimal::from_str("10.005").unwrap();
    assert!(matches!(
        reconciler.create_cash_reservation(&guest.id, sub_cent).await,
        Err(DomainError::Validation(_))
    ));

    let unknown_listing = cash_request("nope", &guest.id, "2024-06-06", "2024-06-08");
    assert!(matches!(
        reconciler.create_cash_reservation(&guest.id, unknown_listing).await,
        Err(DomainError::NotFound { entity: "Listing", .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_cash_bookings_race_to_a_single_winner() {
    let app = TestApp::file_backed().await;
    let host = app.user("hank", UserRole::Host).await;
    let guest = app.user("gina", UserRole::Guest).await;
    let listing = app.listing(&host).await;

    // Every request covers 2024-08-10, so at most one can be booked.
    let tasks: Vec<_> = (0..16)
        .map(|n| {
            let reconciler = app.state.reconciler.clone();
            let start = format!("2024-08-{:02}", 1 + n % 9);
            let request = cash_request(&listing.id, &guest.id, &start, "2024-08-12");
            let guest_id = guest.id.clone();
            tokio::spawn(async move { reconciler.create_cash_reservation(&guest_id, request).await })
        })
        .collect();

    let mut winners = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => winners += 1,
            Err(DomainError::Conflict(_)) => {}
            Err(e) => panic!("loser should see a conflict, got {e}"),
        }
    }
    assert_eq!(winners, 1);

    let reservations = app
        .state
        .repos
        .reservations()
        .find_for_listing(&listing.id)
        .await
        .unwrap();
    assert_eq!(reservations.len(), 1);
}

#[tokio::test]
async fn broken_notifier_does_not_fail_the_booking() {
    let app = TestApp::with_notifier(std::sync::Arc::new(common::BrokenNotifier)).await;
    let host = app.user("hank", UserRole::Host).await;
    let guest = app.user("gina", UserRole::Guest).await;
    let listing = app.listing(&host).await;
    app.gateway
        .paid_session("cs_1", &listing.id, &guest.id, "2024-06-06", "2024-06-08", 20_000);

    let outcome = app.state.reconciler.confirm_card_payment("cs_1").await;
    assert!(outcome.is_ok());
}
