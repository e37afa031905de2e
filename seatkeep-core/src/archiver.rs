use std::sync::Arc;

use chrono::{DateTime, Utc};
use seatkeep_shared::{Booking, BookingStatus};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::archive::select_archivable;
use crate::store::{fields, Collection, DocumentStore, DocumentUpdate};
use crate::CoreResult;

#[derive(Debug, Clone)]
pub struct ArchiveReport {
    pub run_id: Uuid,
    /// Active bookings examined.
    pub scanned: usize,
    /// Document ids flipped to `Archived`.
    pub archived: Vec<String>,
    /// Booking documents that could not be decoded and were left alone.
    pub skipped_invalid: usize,
}

impl ArchiveReport {
    pub fn archived_count(&self) -> usize {
        self.archived.len()
    }
}

/// Retires active bookings whose departure is more than a month old.
#[derive(Clone)]
pub struct BookingArchiver {
    store: Arc<dyn DocumentStore>,
}

impl BookingArchiver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(name = "archive_bookings", skip(self), fields(run_id = tracing::field::Empty))]
    pub async fn archive_old_bookings(&self, now: DateTime<Utc>) -> CoreResult<ArchiveReport> {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));

        let docs = self
            .store
            .query(
                Collection::Bookings,
                fields::STATUS,
                &json!(BookingStatus::Active.as_str()),
            )
            .await?;

        let mut skipped_invalid = 0;
        let mut bookings: Vec<Booking> = Vec::with_capacity(docs.len());
        for doc in &docs {
            match doc.decode::<Booking>(Collection::Bookings) {
                Ok(mut booking) => {
                    // Writes go to the document key, whatever the body says.
                    booking.id = doc.id.clone();
                    bookings.push(booking);
                }
                Err(e) => {
                    warn!(error = %e, "Skipping undecodable booking");
                    skipped_invalid += 1;
                }
            }
        }

        let archived = select_archivable(&bookings, now);

        if archived.is_empty() {
            info!(scanned = bookings.len(), "No bookings to archive");
        } else {
            let updates = archived
                .iter()
                .map(|id| {
                    DocumentUpdate::new(Collection::Bookings, id.clone())
                        .set(fields::STATUS, BookingStatus::Archived.as_str())
                })
                .collect();
            self.store.atomic_batch(updates).await?;
            info!(count = archived.len(), "{} bookings archived", archived.len());
        }

        Ok(ArchiveReport {
            run_id,
            scanned: bookings.len(),
            archived,
            skipped_invalid,
        })
    }
}
