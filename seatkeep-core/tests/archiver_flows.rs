//! Store-driven booking archival scenarios.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use seatkeep_core::{BookingArchiver, Collection, CoreError, MemoryStore};
use serde_json::json;

fn booking(store: &MemoryStore, id: &str, status: &str, departure: Option<&str>) {
    let mut body = json!({"bookingNumber": id.to_uppercase(), "tripId": "trip-1", "status": status});
    if let Some(date) = departure {
        body["departureDate"] = json!(date);
    }
    store.insert(Collection::Bookings, id, body);
}

fn status(store: &MemoryStore, id: &str) -> String {
    store.get(Collection::Bookings, id).unwrap()["status"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn archives_only_bookings_past_the_cutoff() {
    let store = Arc::new(MemoryStore::new());
    booking(&store, "old", "Active", Some("2023-01-01"));
    booking(&store, "recent", "Active", Some("2023-02-15"));
    booking(&store, "undated", "Active", None);
    booking(&store, "garbled", "Active", Some("not a date"));
    booking(&store, "already", "Archived", Some("2022-01-01"));
    let archiver = BookingArchiver::new(store.clone());

    let now = Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap();
    let report = archiver.archive_old_bookings(now).await.unwrap();

    assert_eq!(report.archived, vec!["old".to_string()]);
    assert_eq!(report.scanned, 4);
    assert_eq!(status(&store, "old"), "Archived");
    assert_eq!(status(&store, "recent"), "Active");
    assert_eq!(status(&store, "undated"), "Active");
    assert_eq!(status(&store, "garbled"), "Active");
    assert_eq!(store.commits(), 1);

    // Re-running is a no-op.
    let again = archiver.archive_old_bookings(now).await.unwrap();
    assert_eq!(again.archived_count(), 0);
    assert_eq!(store.commits(), 1);
}

#[tokio::test]
async fn undecodable_booking_is_skipped() {
    let store = Arc::new(MemoryStore::new());
    store.insert(
        Collection::Bookings,
        "weird",
        json!({"status": "Active", "tripId": ["trip-1"], "departureDate": "2020-01-01"}),
    );
    booking(&store, "old", "Active", Some("2020-01-01"));
    let archiver = BookingArchiver::new(store.clone());

    let report = archiver.archive_old_bookings(Utc::now()).await.unwrap();

    assert_eq!(report.skipped_invalid, 1);
    assert_eq!(report.archived, vec!["old".to_string()]);
    assert_eq!(status(&store, "weird"), "Active");
}

#[tokio::test]
async fn loosely_typed_contact_fields_do_not_block_archival() {
    let store = Arc::new(MemoryStore::new());
    store.insert(
        Collection::Bookings,
        "b1",
        json!({
            "status": "Active",
            "departureDate": "2020-01-01",
            "paymentAmount": 5000,
            "phoneNumber": null
        }),
    );
    store.insert(
        Collection::Bookings,
        "b2",
        json!({"status": "Active", "departureDate": {"_seconds": 1577836800}}),
    );
    let archiver = BookingArchiver::new(store.clone());

    let report = archiver.archive_old_bookings(Utc::now()).await.unwrap();

    assert_eq!(report.archived, vec!["b1".to_string()]);
    assert_eq!(report.skipped_invalid, 0);
    assert_eq!(status(&store, "b1"), "Archived");
    assert_eq!(store.get(Collection::Bookings, "b1").unwrap()["paymentAmount"], json!(5000));
    assert_eq!(status(&store, "b2"), "Active");
}

#[tokio::test]
async fn store_failure_is_fatal() {
    let store = Arc::new(MemoryStore::new());
    store.set_unavailable(true);
    let archiver = BookingArchiver::new(store);

    let err = archiver.archive_old_bookings(Utc::now()).await.unwrap_err();
    assert!(matches!(err, CoreError::Store(_)));
}
