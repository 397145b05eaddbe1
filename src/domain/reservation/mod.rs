//! Reservation aggregate
//!
//! Contains the Reservation entity, the booked date range with its overlap
//! rule, and the repository interface including the atomic
//! reservation + payment write.

pub mod model;
pub mod repository;

pub use model::{parse_booking_date, Booking, DateRange, Reservation};
pub use repository::ReservationRepository;
