//! Atomic reservation writes and overlap detection against SQLite.

mod common;

use chrono::NaiveDate;

use common::TestApp;
use stayhub::domain::{Booking, DateRange, DomainError, Payment, PaymentMethod, Reservation, UserRole};

fn range(start: &str, end: &str) -> DateRange {
    DateRange::new(
        NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap(),
        NaiveDate::parse_from_str(end, "%Y-%m-%d").unwrap(),
    )
    .unwrap()
}

fn card_booking(
    listing_id: &str,
    user_id: &str,
    period: DateRange,
    reservation_session: &str,
    payment_session: &str,
) -> Booking {
    let reservation = Reservation::new(listing_id, user_id, period, 20_000, reservation_session);
    let payment = Payment::paid_card(
        &reservation.id,
        user_id,
        listing_id,
        payment_session,
        None,
        PaymentMethod::Card,
        20_000,
        "usd",
    );
    Booking { reservation, payment }
}

#[tokio::test]
async fn failed_payment_insert_rolls_back_the_reservation() {
    let app = TestApp::new().await;
    let host = app.user("hank", UserRole::Host).await;
    let guest = app.user("gina", UserRole::Guest).await;
    let listing = app.listing(&host).await;
    let reservations = app.state.repos.reservations();

    reservations
        .create_with_payment(card_booking(
            &listing.id,
            &guest.id,
            range("2024-06-01", "2024-06-03"),
            "sess_a",
            "sess_dup",
        ))
        .await
        .unwrap();

    // Different dates, but the payment reuses a session id that is taken.
    let err = reservations
        .create_with_payment(card_booking(
            &listing.id,
            &guest.id,
            range("2024-07-01", "2024-07-03"),
            "sess_b",
            "sess_dup",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    assert!(reservations.find_by_session_id("sess_b").await.unwrap().is_none());
    assert_eq!(reservations.find_for_listing(&listing.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn payment_for_a_missing_reservation_leaves_nothing_behind() {
    let app = TestApp::new().await;
    let host = app.user("hank", UserRole::Host).await;
    let guest = app.user("gina", UserRole::Guest).await;
    let listing = app.listing(&host).await;

    let mut booking = card_booking(
        &listing.id,
        &guest.id,
        range("2024-06-01", "2024-06-03"),
        "sess_fk",
        "sess_fk",
    );
    booking.payment.reservation_id = Some("does-not-exist".into());

    let result = app.state.repos.reservations().create_with_payment(booking).await;
    assert!(result.is_err());

    assert!(app
        .state
        .repos
        .reservations()
        .find_by_session_id("sess_fk")
        .await
        .unwrap()
        .is_none());
    assert!(app
        .state
        .repos
        .payments()
        .find_by_session_id("sess_fk")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn write_rechecks_overlap_inside_the_transaction() {
    let app = TestApp::new().await;
    let host = app.user("hank", UserRole::Host).await;
    let guest = app.user("gina", UserRole::Guest).await;
    let listing = app.listing(&host).await;
    let reservations = app.state.repos.reservations();

    reservations
        .create_with_payment(card_booking(
            &listing.id,
            &guest.id,
            range("2024-06-01", "2024-06-05"),
            "sess_1",
            "sess_1",
        ))
        .await
        .unwrap();

    let err = reservations
        .create_with_payment(card_booking(
            &listing.id,
            &guest.id,
            range("2024-06-04", "2024-06-06"),
            "sess_2",
            "sess_2",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
    assert!(app
        .state
        .repos
        .payments()
        .find_by_session_id("sess_2")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn touching_stays_conflict() {
    let app = TestApp::new().await;
    let host = app.user("hank", UserRole::Host).await;
    let guest = app.user("gina", UserRole::Guest).await;
    let listing = app.listing(&host).await;
    app.state
        .repos
        .reservations()
        .create_with_payment(card_booking(
            &listing.id,
            &guest.id,
            range("2024-06-05", "2024-06-08"),
            "sess_1",
            "sess_1",
        ))
        .await
        .unwrap();

    let checker = &app.state.availability;
    let day = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();

    // Checking out on the existing check-in day still counts as a clash.
    assert!(checker
        .has_conflict(&listing.id, day("2024-06-01"), day("2024-06-05"), None)
        .await
        .unwrap());
    assert!(checker
        .has_conflict(&listing.id, day("2024-06-08"), day("2024-06-10"), None)
        .await
        .unwrap());
    assert!(!checker
        .has_conflict(&listing.id, day("2024-06-09"), day("2024-06-12"), None)
        .await
        .unwrap());
    assert!(!checker
        .has_conflict(&listing.id, day("2024-06-01"), day("2024-06-04"), None)
        .await
        .unwrap());

    // The reservation written for a session does not block that session.
    assert!(!checker
        .has_conflict(&listing.id, day("2024-06-06"), day("2024-06-07"), Some("sess_1"))
        .await
        .unwrap());
}

#[tokio::test]
async fn inverted_range_is_not_treated_as_free() {
    let app = TestApp::new().await;
    let host = app.user("hank", UserRole::Host).await;
    let listing = app.listing(&host).await;
    let day = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();

    let result = app
        .state
        .availability
        .has_conflict(&listing.id, day("2024-06-08"), day("2024-06-08"), None)
        .await;
    assert!(matches!(result, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn availability_quotes_the_stay() {
    let app = TestApp::new().await;
    let host = app.user("hank", UserRole::Host).await;
    let listing = app.listing(&host).await;

    let availability = app
        .state
        .availability
        .check_availability(&listing.id, range("2024-06-06", "2024-06-09"))
        .await
        .unwrap();
    assert!(availability.available);
    assert_eq!(availability.range.nights(), 3);
    assert_eq!(availability.total_price, 30_000);

    let missing = app
        .state
        .availability
        .check_availability("nope", range("2024-06-06", "2024-06-09"))
        .await;
    assert!(matches!(missing, Err(DomainError::NotFound { entity: "Listing", .. })));
}

#[tokio::test]
async fn trips_and_host_views_are_scoped() {
    let app = TestApp::new().await;
    let host = app.user("hank", UserRole::Host).await;
    let guest = app.user("gina", UserRole::Guest).await;
    let other = app.user("olga", UserRole::Guest).await;
    let listing = app.listing(&host).await;
    let booking = app
        .state
        .repos
        .reservations()
        .create_with_payment(card_booking(
            &listing.id,
            &guest.id,
            range("2024-06-05", "2024-06-08"),
            "sess_1",
            "sess_1",
        ))
        .await
        .unwrap();

    let trips = app.state.queries.trips(&guest.id).await.unwrap();
    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0].listing.id, listing.id);
    assert!(trips[0].payment.is_some());
    assert!(app.state.queries.trips(&other.id).await.unwrap().is_empty());

    let details = app
        .state
        .queries
        .get(&host.id, &booking.reservation.id)
        .await
        .unwrap();
    assert_eq!(details.reservation.id, booking.reservation.id);
    assert!(matches!(
        app.state.queries.get(&other.id, &booking.reservation.id).await,
        Err(DomainError::Forbidden(_))
    ));

    assert_eq!(
        app.state.queries.for_listing(&host.id, &listing.id).await.unwrap().len(),
        1
    );
    assert!(matches!(
        app.state.queries.for_listing(&guest.id, &listing.id).await,
        Err(DomainError::Forbidden(_))
    ));
}

#[tokio::test]
async fn unknown_stored_payment_values_surface_as_storage_errors() {
    use sea_orm::ConnectionTrait;

    let app = TestApp::new().await;
    let host = app.user("hank", UserRole::Host).await;
    let guest = app.user("gina", UserRole::Guest).await;
    let listing = app.listing(&host).await;
    app.state
        .repos
        .reservations()
        .create_with_payment(card_booking(
            &listing.id,
            &guest.id,
            range("2024-06-05", "2024-06-08"),
            "sess_odd",
            "sess_odd",
        ))
        .await
        .unwrap();

    app.state
        .db
        .execute_unprepared("UPDATE payments SET status = 'REFUNDED' WHERE session_id = 'sess_odd'")
        .await
        .unwrap();

    let result = app.state.repos.payments().find_by_session_id("sess_odd").await;
    assert!(matches!(result, Err(DomainError::Storage(msg)) if msg.contains("REFUNDED")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_overlapping_writes_conflict_instead_of_failing() {
    let app = TestApp::file_backed().await;
    let host = app.user("hank", UserRole::Host).await;
    let guest = app.user("gina", UserRole::Guest).await;
    let listing = app.listing(&host).await;

    let writers: Vec<_> = (0..12)
        .map(|n| {
            let repos = app.state.repos.clone();
            let booking = card_booking(
                &listing.id,
                &guest.id,
                range("2024-09-01", "2024-09-04"),
                &format!("sess_{n}"),
                &format!("sess_{n}"),
            );
            tokio::spawn(async move { repos.reservations().create_with_payment(booking).await })
        })
        .collect();

    let mut written = 0;
    for writer in writers {
        match writer.await.unwrap() {
            Ok(_) => written += 1,
            Err(DomainError::Conflict(_)) => {}
            Err(e) => panic!("overlapping write should conflict, got {e}"),
        }
    }
    assert_eq!(written, 1);
    assert_eq!(
        app.state.repos.reservations().find_for_listing(&listing.id).await.unwrap().len(),
        1
    );
}
