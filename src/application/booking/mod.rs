//! Booking core
//!
//! - [`AvailabilityChecker`]: overlap detection and quotes
//! - [`Reconciler`]: turns a paid checkout or a cash request into a
//!   reservation + payment pair, idempotently
//! - [`CashApproval`]: host decision on pending cash payments
//! - [`CancellationService`]: guest or host cancels a stay
//! - [`CheckoutService`]: opens a provider checkout for a stay
//! - [`ReservationQueries`]: read models for guests and hosts

pub mod availability;
pub mod cancellation;
pub mod cash_approval;
pub mod checkout;
mod notices;
pub mod queries;
pub mod reconciler;

pub use availability::{Availability, AvailabilityChecker};
pub use cancellation::CancellationService;
pub use cash_approval::{CashApproval, DEFAULT_REJECTION_REASON};
pub use checkout::CheckoutService;
pub use queries::{ReservationDetails, ReservationQueries};
pub use reconciler::{CashReservationRequest, ReconcileOutcome, Reconciler};
