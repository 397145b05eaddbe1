//! SeaORM implementation of ReservationRepository

use async_trait::async_trait;
use log::{debug, warn};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Select, Set, SqlErr,
};

use super::payment_repository::{
    domain_to_active as payment_to_active, model_to_domain as payment_to_domain,
};
use super::{begin_serializable, db_err, lock_retry_policy};
use crate::domain::payment::{PaymentMethod, PaymentStatus};
use crate::domain::reservation::{Booking, DateRange, Reservation, ReservationRepository};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{payment, reservation};
use crate::shared::retry::retry_with_backoff;

pub struct SeaOrmReservationRepository {
    db: DatabaseConnection,
}

impl SeaOrmReservationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: reservation::Model) -> Reservation {
    Reservation {
        id: m.id,
        listing_id: m.listing_id,
        user_id: m.user_id,
        start_date: m.start_date,
        end_date: m.end_date,
        total_price: m.total_price,
        session_id: m.session_id,
        created_at: m.created_at,
    }
}

fn domain_to_active(r: Reservation) -> reservation::ActiveModel {
    reservation::ActiveModel {
        id: Set(r.id),
        listing_id: Set(r.listing_id),
        user_id: Set(r.user_id),
        start_date: Set(r.start_date),
        end_date: Set(r.end_date),
        total_price: Set(r.total_price),
        session_id: Set(r.session_id),
        created_at: Set(r.created_at),
    }
}

/// Inclusive overlap: `existing.start <= new.end AND existing.end >= new.start`.
fn overlapping(
    listing_id: &str,
    range: &DateRange,
    exclude_session_id: Option<&str>,
) -> Select<reservation::Entity> {
    let mut query = reservation::Entity::find()
        .filter(reservation::Column::ListingId.eq(listing_id))
        .filter(reservation::Column::StartDate.lte(range.end()))
        .filter(reservation::Column::EndDate.gte(range.start()));
    if let Some(session_id) = exclude_session_id {
        query = query.filter(reservation::Column::SessionId.ne(session_id));
    }
    query.order_by_asc(reservation::Column::StartDate)
}

async fn find_overlapping_on<C: ConnectionTrait>(
    conn: &C,
    listing_id: &str,
    range: &DateRange,
    exclude_session_id: Option<&str>,
) -> DomainResult<Vec<Reservation>> {
    let models = overlapping(listing_id, range, exclude_session_id)
        .all(conn)
        .await
        .map_err(db_err)?;
    Ok(models.into_iter().map(model_to_domain).collect())
}

// ── ReservationRepository impl ──────────────────────────────────

#[async_trait]
impl ReservationRepository for SeaOrmReservationRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Reservation>> {
        let model = reservation::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_session_id(&self, session_id: &str) -> DomainResult<Option<Reservation>> {
        let model = reservation::Entity::find()
            .filter(reservation::Column::SessionId.eq(session_id))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_overlapping(
        &self,
        listing_id: &str,
        range: &DateRange,
        exclude_session_id: Option<&str>,
    ) -> DomainResult<Vec<Reservation>> {
        find_overlapping_on(&self.db, listing_id, range, exclude_session_id).await
    }

    async fn find_for_guest(&self, user_id: &str) -> DomainResult<Vec<Reservation>> {
        let models = reservation::Entity::find()
            .filter(reservation::Column::UserId.eq(user_id))
            .order_by_desc(reservation::Column::StartDate)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn find_for_listing(&self, listing_id: &str) -> DomainResult<Vec<Reservation>> {
        let models = reservation::Entity::find()
            .filter(reservation::Column::ListingId.eq(listing_id))
            .order_by_asc(reservation::Column::StartDate)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn create_with_payment(&self, booking: Booking) -> DomainResult<Booking> {
        retry_with_backoff(
            &lock_retry_policy(),
            || self.try_create(booking.clone()),
            DomainError::is_busy,
            "create_reservation",
        )
        .await
    }

    async fn delete_with_payment(&self, id: &str) -> DomainResult<()> {
        retry_with_backoff(
            &lock_retry_policy(),
            || self.try_delete(id),
            DomainError::is_busy,
            "delete_reservation",
        )
        .await
    }

    async fn delete_pending_cash(&self, id: &str) -> DomainResult<()> {
        retry_with_backoff(
            &lock_retry_policy(),
            || self.try_delete_pending_cash(id),
            DomainError::is_busy,
            "delete_pending_cash_reservation",
        )
        .await
    }
}

impl SeaOrmReservationRepository {
    async fn try_create(&self, booking: Booking) -> DomainResult<Booking> {
        let Booking {
            reservation,
            payment,
        } = booking;
        let range = reservation.period();
        let session_id = reservation.session_id.clone();

        debug!(
            "Creating reservation {} on listing {} for {} (session {})",
            reservation.id, reservation.listing_id, range, session_id
        );

        // Dropping the transaction on any early return rolls it back.
        let txn = begin_serializable(&self.db).await?;

        let clashes = find_overlapping_on(&txn, &reservation.listing_id, &range, None).await?;
        if let Some(existing) = clashes.first() {
            warn!(
                "Reservation {} overlaps {} ({}..{}) on listing {}",
                reservation.id,
                existing.id,
                existing.start_date,
                existing.end_date,
                reservation.listing_id
            );
            return Err(DomainError::Conflict(format!(
                "Listing {} is already booked between {} and {}",
                reservation.listing_id, existing.start_date, existing.end_date
            )));
        }

        let reservation_model = domain_to_active(reservation)
            .insert(&txn)
            .await
            .map_err(db_err)?;

        let payment_model = payment_to_active(payment)
            .insert(&txn)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => DomainError::Conflict(format!(
                    "Payment session {} is already confirmed",
                    session_id
                )),
                _ => db_err(e),
            })?;

        txn.commit().await.map_err(db_err)?;

        Ok(Booking {
            reservation: model_to_domain(reservation_model),
            payment: payment_to_domain(payment_model)?,
        })
    }

    async fn try_delete(&self, id: &str) -> DomainResult<()> {
        debug!("Deleting reservation {} with its payment", id);

        let txn = begin_serializable(&self.db).await?;

        let existing = reservation::Entity::find_by_id(id.to_string())
            .one(&txn)
            .await
            .map_err(db_err)?;
        if existing.is_none() {
            return Err(DomainError::not_found("Reservation", "id", id));
        }

        payment::Entity::delete_many()
            .filter(payment::Column::ReservationId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        reservation::Entity::delete_by_id(id.to_string())
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(())
    }

    /// Deletes the reservation only while its payment is still pending cash.
    /// The status filter sits on the DELETE itself, so an accept that commits
    /// first leaves nothing to match.
    async fn try_delete_pending_cash(&self, id: &str) -> DomainResult<()> {
        let txn = begin_serializable(&self.db).await?;

        let existing = reservation::Entity::find_by_id(id.to_string())
            .one(&txn)
            .await
            .map_err(db_err)?;
        if existing.is_none() {
            return Err(DomainError::not_found("Reservation", "id", id));
        }

        let removed = payment::Entity::delete_many()
            .filter(payment::Column::ReservationId.eq(id))
            .filter(payment::Column::Method.eq(PaymentMethod::Cash.as_str()))
            .filter(payment::Column::Status.eq(PaymentStatus::Pending.as_str()))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if removed.rows_affected == 0 {
            let current = payment::Entity::find()
                .filter(payment::Column::ReservationId.eq(id))
                .one(&txn)
                .await
                .map_err(db_err)?;
            let from = match current {
                Some(p) => format!("{} {}", p.method, p.status),
                None => "no payment".to_string(),
            };
            debug!("Refusing to reject reservation {}: payment is {}", id, from);
            return Err(DomainError::InvalidTransition {
                entity: "Payment",
                from,
                to: "REJECTED".to_string(),
            });
        }

        reservation::Entity::delete_by_id(id.to_string())
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(())
    }
}
