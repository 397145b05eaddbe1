//! Payment repository interface
//!
//! Payments are created and deleted together with their reservation
//! (see `ReservationRepository`); this trait covers reads and the single
//! in-place status transition.

use async_trait::async_trait;

use super::model::{Payment, PaymentStatus};
use crate::domain::DomainResult;

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Payment>>;

    async fn find_by_reservation(&self, reservation_id: &str) -> DomainResult<Option<Payment>>;

    async fn find_by_session_id(&self, session_id: &str) -> DomainResult<Option<Payment>>;

    /// Compare-and-set status update. Fails with `InvalidTransition` when the
    /// stored status is no longer `from` (e.g. a concurrent accept won).
    async fn transition_status(
        &self,
        id: &str,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> DomainResult<Payment>;
}
