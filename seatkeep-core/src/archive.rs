//! Archival threshold for bookings whose trip has long departed.

use chrono::{Datelike, DateTime, Days, NaiveDate, NaiveDateTime, Utc};
use seatkeep_shared::{Booking, BookingStatus};

const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// `now` with one subtracted from its month, time of day kept. A day that
/// does not exist in the previous month rolls over into the following one,
/// so Mar 31 becomes "Feb 31", which is Mar 3 (Mar 2 in a leap year).
pub fn archive_cutoff(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let (year, month) = match now.month() {
        1 => (now.year() - 1, 12),
        m => (now.year(), m - 1),
    };
    let date = NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_days(Days::new(u64::from(now.day0())))?;
    Some(date.and_time(now.time()).and_utc())
}

/// Parses a stored departure date. Values without an offset are read as UTC.
pub fn parse_departure_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.and_utc());
        }
    }

    DATE_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(raw, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    })
}

/// Active bookings whose departure date is strictly before `cutoff`.
/// Anything unparsable stays where it is.
pub fn is_archivable(booking: &Booking, cutoff: DateTime<Utc>) -> bool {
    if booking.status != BookingStatus::Active {
        return false;
    }
    booking
        .departure_date
        .as_deref()
        .and_then(parse_departure_date)
        .is_some_and(|departure| departure < cutoff)
}

/// Ids of the bookings to flip to `Archived`, in input order.
pub fn select_archivable(bookings: &[Booking], now: DateTime<Utc>) -> Vec<String> {
    let Some(cutoff) = archive_cutoff(now) else {
        return Vec::new();
    };

    bookings
        .iter()
        .filter(|booking| is_archivable(booking, cutoff))
        .map(|booking| booking.id.clone())
        .collect()
}
