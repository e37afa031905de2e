pub mod booking;
mod lenient;
pub mod trip;
pub mod vehicle;

pub use booking::{Booking, BookingStatus};
pub use trip::{Passenger, Trip, TripStatus};
pub use vehicle::{Seat, SeatNumber, SeatNumberError, Vehicle};
