//! Plain-text rendering of notifications

use crate::application::ports::{Audience, Notification, ReservationNotice};
use crate::shared::money::from_minor_units;

pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
}

fn amount(notice: &ReservationNotice) -> String {
    format!(
        "{} {}",
        from_minor_units(notice.total_price),
        notice.currency.to_uppercase()
    )
}

fn stay_summary(n: &ReservationNotice) -> String {
    format!(
        "Listing: {} ({})\nDates: {} to {} ({} night{})\nTotal: {}\nPayment method: {}\nReservation: {}",
        n.listing_title,
        n.listing_location,
        n.start_date,
        n.end_date,
        n.nights,
        if n.nights == 1 { "" } else { "s" },
        amount(n),
        n.payment_method,
        n.reservation_id
    )
}

pub fn render(notification: &Notification) -> RenderedEmail {
    match notification {
        Notification::ReservationPending(n) => RenderedEmail {
            subject: format!("Reservation request sent: {}", n.listing_title),
            body: format!(
                "Hi {},\n\nYour request to stay at {} is waiting for {} to accept cash payment on arrival.\n\n{}",
                n.guest_name,
                n.listing_title,
                n.host_name,
                stay_summary(n)
            ),
        },
        Notification::CashRequestReceived(n) => RenderedEmail {
            subject: format!("New cash reservation request: {}", n.listing_title),
            body: format!(
                "Hi {},\n\n{} ({}) would like to book {} and pay cash on arrival. Accept or reject the request from your dashboard.\n\n{}",
                n.host_name,
                n.guest_name,
                n.guest_email,
                n.listing_title,
                stay_summary(n)
            ),
        },
        Notification::ReservationConfirmed(n) => RenderedEmail {
            subject: format!("Reservation confirmed: {}", n.listing_title),
            body: format!(
                "Hi {},\n\nYour payment went through and your stay is confirmed.\n\n{}",
                n.guest_name,
                stay_summary(n)
            ),
        },
        Notification::BookingAlert(n) => RenderedEmail {
            subject: format!("New booking: {}", n.listing_title),
            body: format!(
                "Hi {},\n\n{} booked {}.\n\n{}",
                n.host_name,
                n.guest_name,
                n.listing_title,
                stay_summary(n)
            ),
        },
        Notification::Invoice {
            notice,
            payment_id,
            transaction_id,
        } => RenderedEmail {
            subject: format!("Invoice for your stay at {}", notice.listing_title),
            body: format!(
                "Hi {},\n\nPayment received: {}\nPayment id: {}\nTransaction: {}\n\n{}",
                notice.guest_name,
                amount(notice),
                payment_id,
                transaction_id.as_deref().unwrap_or("n/a"),
                stay_summary(notice)
            ),
        },
        Notification::CashAccepted(n) => RenderedEmail {
            subject: format!("Cash payment accepted: {}", n.listing_title),
            body: format!(
                "Hi {},\n\n{} accepted your cash payment request. Please bring {} on arrival.\n\n{}",
                n.guest_name,
                n.host_name,
                amount(n),
                stay_summary(n)
            ),
        },
        Notification::CashRejected { notice, reason } => RenderedEmail {
            subject: format!("Reservation request declined: {}", notice.listing_title),
            body: format!(
                "Hi {},\n\n{} declined your cash reservation request.\nReason: {}\n\n{}",
                notice.guest_name,
                notice.host_name,
                reason,
                stay_summary(notice)
            ),
        },
        Notification::ReservationCancelled { notice, audience } => {
            let (greeting, by) = match audience {
                Audience::Guest => (&notice.guest_name, &notice.host_name),
                Audience::Host => (&notice.host_name, &notice.guest_name),
            };
            RenderedEmail {
                subject: format!("Reservation cancelled: {}", notice.listing_title),
                body: format!(
                    "Hi {},\n\n{} cancelled the reservation below.\n\n{}",
                    greeting,
                    by,
                    stay_summary(notice)
                ),
            }
        }
        Notification::HostRequestApproved(n) => RenderedEmail {
            subject: "You are now a host".to_string(),
            body: format!(
                "Hi {},\n\nYour request to become a host was approved. You can now publish listings.",
                n.user_name
            ),
        },
        Notification::HostRequestRejected { notice, reason } => RenderedEmail {
            subject: "Your host request was declined".to_string(),
            body: format!(
                "Hi {},\n\nYour request to become a host was declined.\nReason: {}",
                notice.user_name, reason
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn notice() -> ReservationNotice {
        ReservationNotice {
            reservation_id: "R1".into(),
            listing_id: "L1".into(),
            listing_title: "Lake cabin".into(),
            listing_location: "Annecy".into(),
            guest_name: "Gina".into(),
            guest_email: "gina@example.com".into(),
            host_name: "Hank".into(),
            host_email: "hank@example.com".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 6, 6).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 8).unwrap(),
            nights: 2,
            total_price: 30_000,
            currency: "usd".into(),
            payment_method: "cash".into(),
        }
    }

    #[test]
    fn rejection_mentions_reason_and_host() {
        let email = render(&Notification::CashRejected {
            notice: notice(),
            reason: "dates unavailable".into(),
        });
        assert!(email.body.contains("dates unavailable"));
        assert!(email.body.contains("Hank"));
        assert!(email.subject.contains("Lake cabin"));
    }

    #[test]
    fn amounts_render_in_major_units() {
        let email = render(&Notification::CashAccepted(notice()));
        assert!(email.body.contains("300.00 USD"));
        assert!(email.body.contains("2 nights"));
    }
}
