//! Trip records for Tripcast
//!
//! A trip ties a resolved location to a departure/arrival date range and is
//! owned by the account that created it. `TripStore` is the async entry
//! point; storage sits behind the `TripBackend` trait.

pub mod backend;
pub mod sqlite;
pub mod store;
pub mod types;

pub use backend::{TripBackend, TripBackendError, TripBackendResult};
pub use sqlite::SqliteTripStore;
pub use store::TripStore;
pub use types::{DateRange, NewTrip, Trip, TripDraft, TripFields, TripId, TripOwner};
