use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;
use super::vehicle::{SeatNumber, SeatNumberError};
use crate::pii::Masked;

/// Trip lifecycle as written by the scheduling side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripStatus {
    /// Open for sales; the only state the bulk seat reset looks at.
    Booking,
    Boarding,
    Departed,
    Completed,
    Cancelled,
    #[default]
    #[serde(other)]
    Unknown,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Booking => "Booking",
            TripStatus::Boarding => "Boarding",
            TripStatus::Departed => "Departed",
            TripStatus::Completed => "Completed",
            TripStatus::Cancelled => "Cancelled",
            TripStatus::Unknown => "Unknown",
        }
    }
}

/// A passenger entry embedded in a trip's roster.
///
/// Only the booking number and seat are interpreted. Everything else
/// (contact details, payment, next of kin) is carried through untouched and
/// masked in `Debug` output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passenger {
    #[serde(default, deserialize_with = "lenient::text")]
    pub booking_number: String,
    /// Seat number as text, e.g. "14". Empty when no seat was picked yet.
    #[serde(default, deserialize_with = "lenient::text")]
    pub booked_seat: String,
    #[serde(flatten)]
    pub details: Masked<Map<String, Value>>,
}

impl Passenger {
    pub fn new(booking_number: impl Into<String>, booked_seat: impl Into<String>) -> Self {
        Self {
            booking_number: booking_number.into(),
            booked_seat: booked_seat.into(),
            ..Self::default()
        }
    }

    /// The seat this passenger holds, if any.
    ///
    /// A blank `bookedSeat` is "no seat yet"; anything else must be numeric.
    pub fn claimed_seat(&self) -> Result<Option<SeatNumber>, SeatNumberError> {
        if self.booked_seat.trim().is_empty() {
            return Ok(None);
        }
        self.booked_seat.parse().map(Some)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    #[serde(default)]
    pub id: String,
    pub vehicle_id: String,
    #[serde(default)]
    pub status: TripStatus,
    #[serde(default)]
    pub passengers: Vec<Passenger>,
}

impl Trip {
    pub fn booking_numbers(&self) -> impl Iterator<Item = &str> {
        self.passengers.iter().map(|p| p.booking_number.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trip_decodes_firestore_shape() {
        let raw = json!({
            "id": "trip-9",
            "vehicleId": "bus-3",
            "status": "Booking",
            "passengers": [{
                "bookingNumber": "B1",
                "bookedSeat": "4",
                "isCheckedIn": false,
                "firstname": "Ada",
                "lastname": "Obi",
                "phoneNumber": "08030000000",
                "nextOfKin": {"firstname": "Chi"}
            }]
        });

        let trip: Trip = serde_json::from_value(raw).unwrap();
        assert_eq!(trip.status, TripStatus::Booking);
        assert_eq!(trip.passengers[0].claimed_seat().unwrap(), Some(SeatNumber::new(4)));
        assert_eq!(trip.booking_numbers().collect::<Vec<_>>(), vec!["B1"]);
    }

    #[test]
    fn test_untyped_passenger_fields_do_not_break_decoding() {
        let raw = json!({
            "vehicleId": "bus-3",
            "passengers": [
                {"bookingNumber": "B1", "bookedSeat": 1, "paymentAmount": 2500, "phoneNumber": null},
                {"bookingNumber": "B2", "bookedSeat": null, "isCheckedIn": "yes"}
            ]
        });

        let trip: Trip = serde_json::from_value(raw).unwrap();
        assert_eq!(trip.passengers[0].claimed_seat().unwrap(), Some(SeatNumber::new(1)));
        assert_eq!(trip.passengers[1].claimed_seat().unwrap(), None);
        assert_eq!(trip.passengers[0].details.expose()["paymentAmount"], json!(2500));
        assert!(!format!("{:?}", trip.passengers[0]).contains("2500"));
    }

    #[test]
    fn test_unrecognised_status_is_unknown() {
        let trip: Trip =
            serde_json::from_value(json!({"vehicleId": "v", "status": "Delayed"})).unwrap();
        assert_eq!(trip.status, TripStatus::Unknown);
        assert!(trip.passengers.is_empty());
    }

    #[test]
    fn test_claimed_seat_blank_and_invalid() {
        assert_eq!(Passenger::new("B1", "  ").claimed_seat().unwrap(), None);
        assert!(Passenger::new("B1", "window").claimed_seat().is_err());
    }
}
