use std::sync::Arc;

use seatkeep_shared::{Booking, SeatNumber, Trip, TripStatus, Vehicle};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::seats::reconcile;
use crate::store::{fields, Collection, Document, DocumentStore, DocumentUpdate, StoreError};
use crate::{CoreError, CoreResult};

/// What happened to one trip/vehicle pair.
#[derive(Debug, Clone, PartialEq)]
pub enum TripOutcome {
    Corrected {
        vehicle_id: String,
        cleared: Vec<SeatNumber>,
    },
    AlreadyConsistent {
        vehicle_id: String,
    },
    /// Some bookings for the trip are not on its roster; nothing was written.
    Inconsistent {
        unmatched_bookings: Vec<String>,
    },
    VehicleMissing {
        vehicle_id: String,
    },
    InvalidData {
        reason: String,
    },
}

impl TripOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            TripOutcome::Inconsistent { .. }
                | TripOutcome::VehicleMissing { .. }
                | TripOutcome::InvalidData { .. }
        )
    }
}

/// Outcome of the reaction to a single vehicle change.
#[derive(Debug, Clone, PartialEq)]
pub enum VehicleOutcome {
    NoTrip,
    /// More than one trip uses the vehicle, so there is no single roster to
    /// check against.
    AmbiguousTrips { trip_ids: Vec<String> },
    Reconciled { trip_id: String, outcome: TripOutcome },
}

#[derive(Debug, Clone)]
pub struct BulkReport {
    pub run_id: Uuid,
    pub trips: Vec<(String, TripOutcome)>,
}

impl BulkReport {
    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    pub fn corrected(&self) -> usize {
        self.trips
            .iter()
            .filter(|(_, o)| matches!(o, TripOutcome::Corrected { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.trips.iter().filter(|(_, o)| o.is_skipped()).count()
    }

    pub fn seats_cleared(&self) -> usize {
        self.trips
            .iter()
            .map(|(_, o)| match o {
                TripOutcome::Corrected { cleared, .. } => cleared.len(),
                _ => 0,
            })
            .sum()
    }
}

/// Runs seat reconciliation against the document store.
///
/// Store failures abort the run and propagate. Everything else (bad data,
/// roster mismatches, missing vehicles) is logged and recorded per trip.
#[derive(Clone)]
pub struct SeatReconciler {
    store: Arc<dyn DocumentStore>,
}

impl SeatReconciler {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Reconciles the single trip that uses `vehicle`, given the vehicle's
    /// latest snapshot.
    #[tracing::instrument(
        name = "vehicle_reconcile",
        skip(self, vehicle),
        fields(run_id = %Uuid::new_v4(), vehicle_id = %vehicle.id)
    )]
    pub async fn reconcile_vehicle(&self, vehicle: &Document) -> CoreResult<VehicleOutcome> {
        let trips = self
            .store
            .query(Collection::Trips, fields::VEHICLE_ID, &json!(vehicle.id))
            .await?;

        match trips.as_slice() {
            [] => {
                info!("No trip found for the vehicle");
                Ok(VehicleOutcome::NoTrip)
            }
            [trip_doc] => {
                let outcome = match trip_doc.decode::<Trip>(Collection::Trips) {
                    Ok(trip) => self.reconcile_trip(&trip, vehicle).await?,
                    Err(e) => invalid(e)?,
                };
                Ok(VehicleOutcome::Reconciled {
                    trip_id: trip_doc.id.clone(),
                    outcome,
                })
            }
            many => {
                let trip_ids: Vec<String> = many.iter().map(|d| d.id.clone()).collect();
                warn!(?trip_ids, "Multiple trips found for vehicle, skipping");
                Ok(VehicleOutcome::AmbiguousTrips { trip_ids })
            }
        }
    }

    /// Reconciles every trip currently open for booking.
    #[tracing::instrument(name = "bulk_reconcile", skip(self), fields(run_id = tracing::field::Empty))]
    pub async fn reconcile_booking_trips(&self) -> CoreResult<BulkReport> {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));

        let trip_docs = self
            .store
            .query(
                Collection::Trips,
                fields::STATUS,
                &json!(TripStatus::Booking.as_str()),
            )
            .await?;
        info!(trips = trip_docs.len(), "Reconciling trips in Booking status");

        let mut trips = Vec::with_capacity(trip_docs.len());
        for trip_doc in &trip_docs {
            let outcome = self.reconcile_trip_doc(trip_doc).await?;
            trips.push((trip_doc.id.clone(), outcome));
        }

        let report = BulkReport { run_id, trips };
        info!(
            corrected = report.corrected(),
            skipped = report.skipped(),
            seats_cleared = report.seats_cleared(),
            "Bulk seat reconciliation finished"
        );
        Ok(report)
    }

    async fn reconcile_trip_doc(&self, trip_doc: &Document) -> CoreResult<TripOutcome> {
        let trip = match trip_doc.decode::<Trip>(Collection::Trips) {
            Ok(trip) => trip,
            Err(e) => return invalid(e),
        };

        let vehicles = self
            .store
            .query(Collection::Vehicles, fields::ID, &json!(trip.vehicle_id))
            .await?;

        let Some(vehicle_doc) = vehicles.first() else {
            info!(trip_id = %trip.id, vehicle_id = %trip.vehicle_id, "No vehicle found for trip");
            return Ok(TripOutcome::VehicleMissing {
                vehicle_id: trip.vehicle_id,
            });
        };
        if vehicles.len() > 1 {
            warn!(vehicle_id = %trip.vehicle_id, count = vehicles.len(), "Vehicle id is not unique, using first match");
        }

        self.reconcile_trip(&trip, vehicle_doc).await
    }

    async fn reconcile_trip(&self, trip: &Trip, vehicle_doc: &Document) -> CoreResult<TripOutcome> {
        let booking_docs = self
            .store
            .query(Collection::Bookings, fields::TRIP_ID, &json!(trip.id))
            .await?;

        let mut bookings = Vec::with_capacity(booking_docs.len());
        for doc in &booking_docs {
            match doc.decode::<Booking>(Collection::Bookings) {
                Ok(booking) => bookings.push(booking),
                Err(e) => return invalid(e),
            }
        }

        let vehicle = match vehicle_doc.decode::<Vehicle>(Collection::Vehicles) {
            Ok(vehicle) => vehicle,
            Err(e) => return invalid(e),
        };

        let correction = match reconcile(trip, &bookings, &vehicle) {
            Ok(correction) => correction,
            Err(e) => return invalid(CoreError::from(e)),
        };

        if !correction.consistent {
            for number in &correction.unmatched_bookings {
                if let Some(booking) = bookings.iter().find(|b| &b.booking_number == number) {
                    warn!(
                        trip_id = %trip.id,
                        booking_number = %number,
                        ?booking,
                        "Booking is not part of the trip roster"
                    );
                }
            }
            return Ok(TripOutcome::Inconsistent {
                unmatched_bookings: correction.unmatched_bookings,
            });
        }

        if !correction.requires_write() {
            info!(trip_id = %trip.id, vehicle_id = %vehicle_doc.id, "All booked seats are valid");
            return Ok(TripOutcome::AlreadyConsistent {
                vehicle_id: vehicle_doc.id.clone(),
            });
        }

        info!(
            trip_id = %trip.id,
            vehicle_id = %vehicle_doc.id,
            seats = ?correction.stale_seats,
            "Resetting stale booked seats"
        );

        let seats = serde_json::to_value(&correction.updated_seats).map_err(StoreError::from)?;
        self.store
            .atomic_batch(vec![
                DocumentUpdate::new(Collection::Vehicles, vehicle_doc.id.clone())
                    .set(fields::SEATS, seats),
            ])
            .await?;

        Ok(TripOutcome::Corrected {
            vehicle_id: vehicle_doc.id.clone(),
            cleared: correction.stale_seats,
        })
    }
}

/// Turns a data problem into a skipped outcome. Store errors pass through.
fn invalid(err: CoreError) -> CoreResult<TripOutcome> {
    match err {
        CoreError::Store(e) => Err(CoreError::Store(e)),
        other => {
            warn!(error = %other, "Skipping reconciliation for invalid data");
            Ok(TripOutcome::InvalidData {
                reason: other.to_string(),
            })
        }
    }
}
