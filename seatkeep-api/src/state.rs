use std::sync::Arc;
use std::time::Duration;

use seatkeep_core::{BookingArchiver, DocumentStore, SeatReconciler};

use crate::debounce::VehicleDebouncer;

#[derive(Clone)]
pub struct AppState {
    pub reconciler: SeatReconciler,
    pub archiver: BookingArchiver,
    pub debouncer: VehicleDebouncer,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, settle_delay: Duration) -> Self {
        let reconciler = SeatReconciler::new(store.clone());
        Self {
            debouncer: VehicleDebouncer::new(reconciler.clone(), settle_delay),
            archiver: BookingArchiver::new(store),
            reconciler,
        }
    }
}
