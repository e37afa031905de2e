//! Seat map reconciliation.
//!
//! A vehicle's seat map is only trusted where a passenger on the trip backs it
//! up. Seats marked booked that nobody on the roster claims are stale and get
//! released. The opposite drift (a claimed seat that is not marked booked) is
//! left alone.

use std::collections::HashSet;

use seatkeep_shared::{Booking, Seat, SeatNumber, Trip, Vehicle};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("Passenger on booking {booking_number} claims invalid seat {seat:?}")]
    InvalidSeatClaim {
        booking_number: String,
        seat: String,
    },
    #[error("Vehicle {vehicle_id} lists seat {seat} more than once")]
    DuplicateSeat {
        vehicle_id: String,
        seat: SeatNumber,
    },
}

/// Result of reconciling one trip against one vehicle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeatCorrection {
    /// False when some booking for the trip is missing from its roster.
    pub consistent: bool,
    /// Booking numbers found on bookings but not on the roster.
    pub unmatched_bookings: Vec<String>,
    /// Seats that were marked booked without a passenger claim.
    pub stale_seats: Vec<SeatNumber>,
    /// The full corrected seat map, or empty when nothing needs writing.
    pub updated_seats: Vec<Seat>,
}

impl SeatCorrection {
    fn inconsistent(unmatched_bookings: Vec<String>) -> Self {
        Self {
            consistent: false,
            unmatched_bookings,
            ..Self::default()
        }
    }

    fn clean() -> Self {
        Self {
            consistent: true,
            ..Self::default()
        }
    }

    pub fn requires_write(&self) -> bool {
        !self.updated_seats.is_empty()
    }
}

/// Cross-checks bookings against the trip roster, then releases every seat
/// the vehicle marks booked that no passenger claims.
///
/// Nothing is returned for partial application: either the whole stale set
/// is corrected or an error comes back.
pub fn reconcile(
    trip: &Trip,
    bookings: &[Booking],
    vehicle: &Vehicle,
) -> Result<SeatCorrection, ReconcileError> {
    let roster: HashSet<&str> = trip.booking_numbers().collect();

    let mut unmatched: Vec<String> = Vec::new();
    for booking in bookings {
        if !roster.contains(booking.booking_number.as_str())
            && !unmatched.contains(&booking.booking_number)
        {
            unmatched.push(booking.booking_number.clone());
        }
    }
    if !unmatched.is_empty() {
        return Ok(SeatCorrection::inconsistent(unmatched));
    }

    let claimed = claimed_seats(trip)?;

    let mut seen = HashSet::with_capacity(vehicle.seats.len());
    for seat in &vehicle.seats {
        if !seen.insert(seat.number) {
            return Err(ReconcileError::DuplicateSeat {
                vehicle_id: vehicle.id.clone(),
                seat: seat.number,
            });
        }
    }

    let is_stale = |seat: &Seat| seat.booked && !claimed.contains(&seat.number);

    let stale_seats: Vec<SeatNumber> = vehicle
        .seats
        .iter()
        .filter(|seat| is_stale(*seat))
        .map(|seat| seat.number)
        .collect();

    if stale_seats.is_empty() {
        return Ok(SeatCorrection::clean());
    }

    let updated_seats = vehicle
        .seats
        .iter()
        .map(|seat| if is_stale(seat) { seat.released() } else { seat.clone() })
        .collect();

    Ok(SeatCorrection {
        consistent: true,
        unmatched_bookings: Vec::new(),
        stale_seats,
        updated_seats,
    })
}

fn claimed_seats(trip: &Trip) -> Result<HashSet<SeatNumber>, ReconcileError> {
    let mut claimed = HashSet::with_capacity(trip.passengers.len());
    for passenger in &trip.passengers {
        let seat = passenger
            .claimed_seat()
            .map_err(|_| ReconcileError::InvalidSeatClaim {
                booking_number: passenger.booking_number.clone(),
                seat: passenger.booked_seat.clone(),
            })?;
        if let Some(seat) = seat {
            claimed.insert(seat);
        }
    }
    Ok(claimed)
}
