use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;
use crate::pii::Masked;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Active,
    Archived,
    Cancelled,
    #[default]
    #[serde(other)]
    Unknown,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Active => "Active",
            BookingStatus::Archived => "Archived",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Unknown => "Unknown",
        }
    }
}

/// A customer's reservation. Only `status` is ever written by this service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub booking_number: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub trip_id: String,
    #[serde(default)]
    pub status: BookingStatus,
    /// Departure date copied from the trip when the booking was made.
    /// Anything other than text is treated as missing.
    #[serde(
        default,
        deserialize_with = "lenient::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub departure_date: Option<String>,
    /// Contact and payment fields, carried through untouched.
    #[serde(flatten)]
    pub details: Masked<Map<String, Value>>,
}

impl Booking {
    pub fn new(id: impl Into<String>, booking_number: impl Into<String>, trip_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            booking_number: booking_number.into(),
            trip_id: trip_id.into(),
            status: BookingStatus::Active,
            ..Self::default()
        }
    }

    pub fn departing(mut self, date: impl Into<String>) -> Self {
        self.departure_date = Some(date.into());
        self
    }
}
