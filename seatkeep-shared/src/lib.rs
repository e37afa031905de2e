pub mod models;
pub mod pii;

pub use models::{
    Booking, BookingStatus, Passenger, Seat, SeatNumber, SeatNumberError, Trip,
    TripStatus, Vehicle,
};
pub use pii::Masked;
