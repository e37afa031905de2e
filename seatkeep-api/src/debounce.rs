//! Settling delay for vehicle change notifications.
//!
//! Seat maps tend to be edited in bursts. Each notification restarts a timer
//! for its vehicle, and only the last snapshot of a burst gets reconciled once
//! the vehicle has been quiet for the whole delay.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use seatkeep_core::{Document, SeatReconciler, TripOutcome, VehicleOutcome};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct VehicleDebouncer {
    inner: Arc<Inner>,
}

struct Inner {
    reconciler: SeatReconciler,
    delay: Duration,
    pending: Mutex<Pending>,
}

#[derive(Default)]
struct Pending {
    next_generation: u64,
    latest: HashMap<String, (u64, Document)>,
}

impl VehicleDebouncer {
    pub fn new(reconciler: SeatReconciler, delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                reconciler,
                delay,
                pending: Mutex::new(Pending::default()),
            }),
        }
    }

    /// Records `vehicle` as the latest snapshot for its id and (re)starts the
    /// settling timer. The returned task finishes once the timer fires, either
    /// by reconciling or by noticing it was superseded.
    pub fn notify(&self, vehicle: Document) -> JoinHandle<()> {
        let vehicle_id = vehicle.id.clone();
        let generation = {
            let mut pending = self.inner.pending.lock().unwrap_or_else(PoisonError::into_inner);
            pending.next_generation += 1;
            let generation = pending.next_generation;
            pending.latest.insert(vehicle_id.clone(), (generation, vehicle));
            generation
        };
        debug!(%vehicle_id, delay = ?self.inner.delay, "Vehicle change queued");

        let inner = self.inner.clone();
        tokio::spawn(async move {
            tokio::time::sleep(inner.delay).await;

            let Some(snapshot) = inner.take_if_current(&vehicle_id, generation) else {
                debug!(%vehicle_id, "Vehicle change superseded by a newer one");
                return;
            };

            match inner.reconciler.reconcile_vehicle(&snapshot).await {
                Ok(outcome) => log_outcome(&vehicle_id, &outcome),
                Err(e) => error!(%vehicle_id, error = %e, "Error processing vehicle update"),
            }
        })
    }

    /// Vehicles still waiting out their delay.
    pub fn pending(&self) -> usize {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .latest
            .len()
    }
}

impl Inner {
    fn take_if_current(&self, vehicle_id: &str, generation: u64) -> Option<Document> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let is_current = pending
            .latest
            .get(vehicle_id)
            .is_some_and(|(current, _)| *current == generation);
        if is_current {
            pending.latest.remove(vehicle_id).map(|(_, doc)| doc)
        } else {
            None
        }
    }
}

fn log_outcome(vehicle_id: &str, outcome: &VehicleOutcome) {
    match outcome {
        VehicleOutcome::NoTrip => info!(vehicle_id, "No trip found for the vehicle"),
        VehicleOutcome::AmbiguousTrips { trip_ids } => {
            warn!(vehicle_id, ?trip_ids, "Multiple trips found. Terminating process.")
        }
        VehicleOutcome::Reconciled { trip_id, outcome } => match outcome {
            TripOutcome::Corrected { cleared, .. } => {
                info!(vehicle_id, %trip_id, ?cleared, "Invalid booked seats reset successfully")
            }
            TripOutcome::AlreadyConsistent { .. } => {
                info!(vehicle_id, %trip_id, "All booked seats are valid")
            }
            skipped => warn!(vehicle_id, %trip_id, outcome = ?skipped, "Vehicle reconciliation skipped"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatkeep_core::{Collection, MemoryStore};
    use serde_json::json;
    use tokio::time::Instant;

    const DELAY: Duration = Duration::from_secs(180);

    fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.insert(
            Collection::Trips,
            "trip-1",
            json!({"vehicleId": "bus-1", "status": "Booking", "passengers": [
                {"bookingNumber": "B1", "bookedSeat": "1"}
            ]}),
        );
        store.insert(
            Collection::Vehicles,
            "bus-1",
            json!({"id": "bus-1", "seats": [
                {"number": 1, "booked": true, "bookedBy": "u1"},
                {"number": 2, "booked": false, "bookedBy": ""}
            ]}),
        );
        store
    }

    fn snapshot(seat_two_booked: bool) -> Document {
        Document::new(
            "bus-1",
            json!({"id": "bus-1", "seats": [
                {"number": 1, "booked": true, "bookedBy": "u1"},
                {"number": 2, "booked": seat_two_booked, "bookedBy": if seat_two_booked { "u2" } else { "" }}
            ]}),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_out_the_delay_before_reconciling() {
        let store = seeded();
        let debouncer = VehicleDebouncer::new(SeatReconciler::new(store.clone()), DELAY);
        let started = Instant::now();

        let handle = debouncer.notify(snapshot(true));
        assert_eq!(debouncer.pending(), 1);

        tokio::time::sleep(DELAY - Duration::from_secs(1)).await;
        assert_eq!(store.commits(), 0);

        handle.await.unwrap();
        assert!(started.elapsed() >= DELAY);
        assert_eq!(store.commits(), 1);
        assert_eq!(debouncer.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_runs_once_with_latest_snapshot() {
        let store = seeded();
        let debouncer = VehicleDebouncer::new(SeatReconciler::new(store.clone()), DELAY);
        let started = Instant::now();

        // First snapshot has a stale seat, the follow-up edit already fixed it.
        let first = debouncer.notify(snapshot(true));
        tokio::time::sleep(Duration::from_secs(60)).await;
        let second = debouncer.notify(snapshot(false));

        first.await.unwrap();
        assert_eq!(store.commits(), 0);
        assert_eq!(debouncer.pending(), 1);

        second.await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(60) + DELAY);
        // Latest snapshot was clean, so nothing was written.
        assert_eq!(store.commits(), 0);
        assert_eq!(debouncer.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_vehicles_settle_independently() {
        let store = seeded();
        let debouncer = VehicleDebouncer::new(SeatReconciler::new(store.clone()), DELAY);

        let bus = debouncer.notify(snapshot(true));
        let other = debouncer.notify(Document::new("van-7", json!({"seats": []})));
        assert_eq!(debouncer.pending(), 2);

        bus.await.unwrap();
        other.await.unwrap();
        assert_eq!(store.commits(), 1);
    }
}
