pub mod archive;
pub mod archiver;
pub mod reconciler;
pub mod seats;
pub mod store;

pub use archiver::{ArchiveReport, BookingArchiver};
pub use reconciler::{BulkReport, SeatReconciler, TripOutcome, VehicleOutcome};
pub use seats::{reconcile, ReconcileError, SeatCorrection};
pub use store::{Collection, Document, DocumentStore, DocumentUpdate, MemoryStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error("Invalid {collection} document {id}: {reason}")]
    InvalidDocument {
        collection: Collection,
        id: String,
        reason: String,
    },
}

pub type CoreResult<T> = Result<T, CoreError>;
