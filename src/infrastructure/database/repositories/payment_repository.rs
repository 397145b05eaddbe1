//! SeaORM implementation of PaymentRepository

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use super::db_err;
use crate::domain::payment::{Payment, PaymentMethod, PaymentRepository, PaymentStatus};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::payment;

pub struct SeaOrmPaymentRepository {
    db: DatabaseConnection,
}

impl SeaOrmPaymentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

/// Rows carrying a method or status this service never writes are
/// reported as storage errors rather than reinterpreted.
pub(super) fn model_to_domain(m: payment::Model) -> DomainResult<Payment> {
    let method = PaymentMethod::parse(&m.method).ok_or_else(|| {
        DomainError::Storage(format!("payment {} has unknown method {:?}", m.id, m.method))
    })?;
    let status = PaymentStatus::parse(&m.status).ok_or_else(|| {
        DomainError::Storage(format!("payment {} has unknown status {:?}", m.id, m.status))
    })?;
    Ok(Payment {
        id: m.id,
        reservation_id: m.reservation_id,
        user_id: m.user_id,
        listing_id: m.listing_id,
        session_id: m.session_id,
        transaction_id: m.transaction_id,
        method,
        status,
        amount: m.amount,
        currency: m.currency,
        expires_at: m.expires_at,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

pub(super) fn domain_to_active(p: Payment) -> payment::ActiveModel {
    payment::ActiveModel {
        id: Set(p.id),
        reservation_id: Set(p.reservation_id),
        user_id: Set(p.user_id),
        listing_id: Set(p.listing_id),
        session_id: Set(p.session_id),
        transaction_id: Set(p.transaction_id),
        method: Set(p.method.as_str().to_string()),
        status: Set(p.status.as_str().to_string()),
        amount: Set(p.amount),
        currency: Set(p.currency),
        expires_at: Set(p.expires_at),
        created_at: Set(p.created_at),
        updated_at: Set(p.updated_at),
    }
}

// ── PaymentRepository impl ──────────────────────────────────────

#[async_trait]
impl PaymentRepository for SeaOrmPaymentRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Payment>> {
        let model = payment::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn find_by_reservation(&self, reservation_id: &str) -> DomainResult<Option<Payment>> {
        let model = payment::Entity::find()
            .filter(payment::Column::ReservationId.eq(reservation_id))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn find_by_session_id(&self, session_id: &str) -> DomainResult<Option<Payment>> {
        let model = payment::Entity::find()
            .filter(payment::Column::SessionId.eq(session_id))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn transition_status(
        &self,
        id: &str,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> DomainResult<Payment> {
        if !from.can_transition_to(to) {
            return Err(DomainError::InvalidTransition {
                entity: "Payment",
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        debug!("Payment {}: {} -> {}", id, from, to);

        let result = payment::Entity::update_many()
            .col_expr(payment::Column::Status, Expr::value(to.as_str()))
            .col_expr(payment::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(payment::Column::Id.eq(id))
            .filter(payment::Column::Status.eq(from.as_str()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Payment", "id", id))?;

        if result.rows_affected == 0 {
            return Err(DomainError::InvalidTransition {
                entity: "Payment",
                from: current.status.to_string(),
                to: to.to_string(),
            });
        }
        Ok(current)
    }
}
