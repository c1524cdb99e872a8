//! Trip storage backend trait and error types.

use thiserror::Error;
use tripcast_core::{DatabaseError, RusqliteErrorExt};

use crate::types::{NewTrip, Trip, TripFields, TripId};

/// Errors that can occur during trip backend operations.
#[derive(Debug, Error)]
pub enum TripBackendError {
    /// Trip was not found.
    #[error("Trip not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TripBackendError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(DatabaseError::QueryFailed(message.into()))
    }
}

impl From<rusqlite::Error> for TripBackendError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.into_database_error())
    }
}

impl From<TripBackendError> for tripcast_core::TripError {
    fn from(e: TripBackendError) -> Self {
        match e {
            TripBackendError::NotFound(id) => Self::NotFound(id),
            other => Self::Persistence(other.to_string()),
        }
    }
}

pub type TripBackendResult<T> = Result<T, TripBackendError>;

/// Document store for trips.
///
/// Implementations don't need to be Sync; `TripStore` serializes access
/// behind a mutex.
pub trait TripBackend: Send {
    /// Insert a trip under a freshly generated id.
    fn insert(&self, trip: &NewTrip) -> TripBackendResult<Trip>;

    /// All trips owned by `owner_id`, in storage order.
    fn list_by_owner(&self, owner_id: &str) -> TripBackendResult<Vec<Trip>>;

    /// Returns `None` if the trip doesn't exist.
    fn get(&self, id: &TripId) -> TripBackendResult<Option<Trip>>;

    /// Overwrite the editable fields of a trip.
    ///
    /// # Errors
    /// Returns `TripBackendError::NotFound` if the trip doesn't exist.
    fn update(&self, id: &TripId, fields: &TripFields) -> TripBackendResult<Trip>;

    /// Delete a trip. Deleting an id that doesn't exist succeeds.
    fn delete(&self, id: &TripId) -> TripBackendResult<()>;
}
