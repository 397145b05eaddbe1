use tracing::warn;

use crate::application::ports::ReservationNotice;
use crate::domain::{DomainResult, Listing, Payment, RepositoryProvider, Reservation, User};

pub(super) struct Parties {
    pub guest: User,
    pub host: User,
}

/// Load guest and host for a reservation. Missing users only cost the
/// notification, so they yield `None` instead of an error.
pub(super) async fn load_parties(
    repos: &dyn RepositoryProvider,
    reservation: &Reservation,
    listing: &Listing,
) -> DomainResult<Option<Parties>> {
    let guest = repos.users().find_by_id(&reservation.user_id).await?;
    let host = repos.users().find_by_id(&listing.owner_id).await?;
    match (guest, host) {
        (Some(guest), Some(host)) => Ok(Some(Parties { guest, host })),
        _ => {
            warn!(
                reservation_id = %reservation.id,
                listing_id = %listing.id,
                "Guest or host profile missing, skipping notifications"
            );
            Ok(None)
        }
    }
}

pub(super) fn notice(
    parties: &Parties,
    reservation: &Reservation,
    listing: &Listing,
    payment: &Payment,
) -> ReservationNotice {
    ReservationNotice::new(reservation, listing, &parties.guest, &parties.host, payment)
}
