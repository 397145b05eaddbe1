//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider`: access to every per-aggregate repository
//! - `DomainResult`: result type for domain operations

use super::host_request::HostRequestRepository;
use super::listing::ListingRepository;
use super::payment::PaymentRepository;
use super::reservation::ReservationRepository;
use super::user::UserRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories.
///
/// Constructed once at startup around a single connection pool and shared
/// by every service:
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let listing = repos.listings().find_by_id("L1").await?;
///     let taken = repos.reservations().find_overlapping("L1", &range, None).await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn users(&self) -> &dyn UserRepository;
    fn listings(&self) -> &dyn ListingRepository;
    fn reservations(&self) -> &dyn ReservationRepository;
    fn payments(&self) -> &dyn PaymentRepository;
    fn host_requests(&self) -> &dyn HostRequestRepository;
}
