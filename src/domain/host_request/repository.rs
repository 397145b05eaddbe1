//! Host request repository interface

use async_trait::async_trait;

use super::model::{HostRequest, HostRequestStatus};
use crate::domain::DomainResult;

#[async_trait]
pub trait HostRequestRepository: Send + Sync {
    async fn save(&self, request: HostRequest) -> DomainResult<()>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<HostRequest>>;

    async fn find_pending_for_user(&self, user_id: &str) -> DomainResult<Option<HostRequest>>;

    async fn find_all(&self, status: Option<HostRequestStatus>) -> DomainResult<Vec<HostRequest>>;

    /// Persist a decision taken on a pending request. Only succeeds while the
    /// stored row is still `PENDING`; an approval also promotes the user to
    /// the host role in the same transaction.
    async fn record_decision(&self, request: &HostRequest) -> DomainResult<()>;
}
