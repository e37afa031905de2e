use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::lenient;

/// A seat number normalized from either representation found in the data.
///
/// Vehicle seat maps store the number as an integer while passengers carry it
/// as text. Both decode into this type so matching never compares strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SeatNumber(u32);

impl SeatNumber {
    pub const fn new(number: u32) -> Self {
        Self(number)
    }
}

impl fmt::Display for SeatNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid seat number: {0:?}")]
pub struct SeatNumberError(pub String);

impl FromStr for SeatNumber {
    type Err = SeatNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(SeatNumber)
            .map_err(|_| SeatNumberError(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for SeatNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SeatNumberVisitor;

        impl<'de> Visitor<'de> for SeatNumberVisitor {
            type Value = SeatNumber;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer seat number or its decimal text")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<SeatNumber, E> {
                u32::try_from(v)
                    .map(SeatNumber)
                    .map_err(|_| E::custom(SeatNumberError(v.to_string())))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<SeatNumber, E> {
                u32::try_from(v)
                    .map(SeatNumber)
                    .map_err(|_| E::custom(SeatNumberError(v.to_string())))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<SeatNumber, E> {
                // Some writers emit integral seat numbers as doubles (4.0).
                if v.fract() == 0.0 && v >= 0.0 && v <= f64::from(u32::MAX) {
                    Ok(SeatNumber(v as u32))
                } else {
                    Err(E::custom(SeatNumberError(v.to_string())))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<SeatNumber, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(SeatNumberVisitor)
    }
}

/// One entry of a vehicle's seat map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub number: SeatNumber,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub booked: bool,
    #[serde(default, deserialize_with = "lenient::text")]
    pub booked_by: String,
    /// Fields this service does not interpret; written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Seat {
    pub fn new(number: u32) -> Self {
        Self {
            number: SeatNumber(number),
            booked: false,
            booked_by: String::new(),
            extra: Map::new(),
        }
    }

    pub fn booked_by(mut self, booker: impl Into<String>) -> Self {
        self.booked = true;
        self.booked_by = booker.into();
        self
    }

    /// Copy of this seat with the booking cleared.
    pub fn released(&self) -> Self {
        Self {
            booked: false,
            booked_by: String::new(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[serde(default)]
    pub id: String,
    pub seats: Vec<Seat>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_seat_number_accepts_both_representations() {
        let from_int: SeatNumber = serde_json::from_value(json!(7)).unwrap();
        let from_text: SeatNumber = serde_json::from_value(json!(" 7 ")).unwrap();
        let from_double: SeatNumber = serde_json::from_value(json!(7.0)).unwrap();

        assert_eq!(from_int, SeatNumber::new(7));
        assert_eq!(from_text, from_int);
        assert_eq!(from_double, from_int);
    }

    #[test]
    fn test_seat_number_rejects_garbage() {
        assert!("A1".parse::<SeatNumber>().is_err());
        assert!("".parse::<SeatNumber>().is_err());
        assert!(serde_json::from_value::<SeatNumber>(json!(-3)).is_err());
        assert!(serde_json::from_value::<SeatNumber>(json!(2.5)).is_err());
        assert!(serde_json::from_value::<SeatNumber>(json!(true)).is_err());
    }

    #[test]
    fn test_seat_keeps_unknown_fields() {
        let raw = json!({"number": 3, "booked": true, "bookedBy": "u-1", "row": "B"});
        let seat: Seat = serde_json::from_value(raw).unwrap();

        assert_eq!(seat.extra.get("row"), Some(&json!("B")));

        let released = serde_json::to_value(seat.released()).unwrap();
        assert_eq!(
            released,
            json!({"number": 3, "booked": false, "bookedBy": "", "row": "B"})
        );
    }

    #[test]
    fn test_null_booking_fields_read_as_unbooked() {
        let vehicle: Vehicle = serde_json::from_value(json!({"seats": [
            {"number": 1, "booked": true, "bookedBy": null},
            {"number": 2, "booked": null, "bookedBy": null}
        ]}))
        .unwrap();

        assert!(vehicle.seats[0].booked);
        assert_eq!(vehicle.seats[0].booked_by, "");
        assert!(!vehicle.seats[1].booked);
    }

    #[test]
    fn test_vehicle_requires_seat_collection() {
        let missing = serde_json::from_value::<Vehicle>(json!({"id": "bus-1"}));
        assert!(missing.is_err());
    }
}
