use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use seatkeep_core::Document;
use serde_json::Value;
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/archive-old-bookings",
            post(archive_old_bookings).fallback(method_not_allowed),
        )
        .route(
            "/reset-seats-for-trips",
            post(reset_seats_for_trips).fallback(method_not_allowed),
        )
        .route(
            "/vehicles/{vehicle_id}/changed",
            post(vehicle_changed).fallback(method_not_allowed),
        )
        .route("/health", get(health))
}

async fn method_not_allowed() -> (StatusCode, &'static str) {
    (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

async fn health() -> &'static str {
    "ok"
}

/// POST /archive-old-bookings
async fn archive_old_bookings(State(state): State<AppState>) -> Result<String, AppError> {
    let report = state.archiver.archive_old_bookings(Utc::now()).await?;

    Ok(format!(
        "Old bookings archived successfully ({} archived)",
        report.archived_count()
    ))
}

/// POST /reset-seats-for-trips
async fn reset_seats_for_trips(State(state): State<AppState>) -> Result<String, AppError> {
    let report = state.reconciler.reconcile_booking_trips().await?;

    if report.is_empty() {
        return Err(AppError::NotFound("No trips found in Booking status.".to_string()));
    }

    Ok(format!(
        "Seats reset successfully for {} trips ({} corrected, {} skipped, {} seats released)",
        report.trips.len(),
        report.corrected(),
        report.skipped(),
        report.seats_cleared()
    ))
}

/// POST /vehicles/{vehicle_id}/changed
///
/// Change notification carrying the vehicle document as it is after the
/// update. Reconciliation happens later, once the vehicle settles.
async fn vehicle_changed(
    State(state): State<AppState>,
    Path(vehicle_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<StatusCode, AppError> {
    if !body.is_object() {
        return Err(AppError::BadRequest(
            "Vehicle document must be a JSON object".to_string(),
        ));
    }

    info!(%vehicle_id, "Vehicle change received");
    state.debouncer.notify(Document::new(vehicle_id, body));

    Ok(StatusCode::ACCEPTED)
}
