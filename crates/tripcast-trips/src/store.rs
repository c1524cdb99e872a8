//! Async trip store with a local list cache.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use tripcast_core::TripError;

use crate::backend::TripBackend;
use crate::sqlite::SqliteTripStore;
use crate::types::{Trip, TripDraft, TripId, TripOwner};

/// Trip CRUD over a blocking backend. Backend calls run on the blocking
/// pool; the most recent listing is kept in memory.
#[derive(Clone)]
pub struct TripStore {
    backend: Arc<Mutex<Box<dyn TripBackend>>>,
    cache: Arc<RwLock<Vec<Trip>>>,
}

impl TripStore {
    pub fn new(backend: impl TripBackend + 'static) -> Self {
        Self {
            backend: Arc::new(Mutex::new(Box::new(backend))),
            cache: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn sqlite(store: SqliteTripStore) -> Self {
        Self::new(store)
    }

    async fn with_backend<T, F>(&self, op: F) -> Result<T, TripError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn TripBackend) -> Result<T, TripError> + Send + 'static,
    {
        let backend = self.backend.clone();
        tokio::task::spawn_blocking(move || {
            let guard = backend.lock();
            op(&**guard)
        })
        .await
        .map_err(|e| TripError::Persistence(format!("trip task failed: {}", e)))?
    }

    /// Validate and save a new trip. Nothing is written when validation fails.
    pub async fn create_trip(
        &self,
        owner: Option<&TripOwner>,
        draft: TripDraft,
    ) -> Result<TripId, TripError> {
        let new_trip = draft.validate_new(owner)?;

        let trip = self
            .with_backend(move |b| b.insert(&new_trip).map_err(TripError::from))
            .await?;

        tracing::info!("Saved trip {} to {}", trip.id, trip.city);
        let id = trip.id.clone();
        self.cache.write().push(trip);
        Ok(id)
    }

    /// All trips owned by `owner_id`. Replaces the cached list.
    pub async fn list_trips(&self, owner_id: &str) -> Result<Vec<Trip>, TripError> {
        let owner_id = owner_id.to_string();
        let trips = self
            .with_backend(move |b| b.list_by_owner(&owner_id).map_err(TripError::from))
            .await?;

        tracing::debug!("Loaded {} trips", trips.len());
        *self.cache.write() = trips.clone();
        Ok(trips)
    }

    pub async fn update_trip(&self, id: &TripId, draft: TripDraft) -> Result<(), TripError> {
        let fields = draft.validate_update()?;

        let target = id.clone();
        let updated = self
            .with_backend(move |b| b.update(&target, &fields).map_err(TripError::from))
            .await?;

        let mut cache = self.cache.write();
        if let Some(slot) = cache.iter_mut().find(|t| t.id == updated.id) {
            *slot = updated;
        }
        tracing::info!("Updated trip {}", id);
        Ok(())
    }

    /// Delete a trip. The cached list drops `id` whether or not the backend
    /// call succeeds.
    pub async fn delete_trip(&self, id: &TripId) -> Result<(), TripError> {
        self.cache.write().retain(|t| &t.id != id);

        let target = id.clone();
        let result = self
            .with_backend(move |b| b.delete(&target).map_err(TripError::from))
            .await;

        match &result {
            Ok(()) => tracing::info!("Deleted trip {}", id),
            Err(e) => tracing::warn!("Failed to delete trip {}: {}", id, e),
        }
        result
    }

    /// The most recently loaded trips, including local changes since
    pub fn cached_trips(&self) -> Vec<Trip> {
        self.cache.read().clone()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::backend::{TripBackendError, TripBackendResult};
    use crate::types::{DateRange, NewTrip, TripFields};
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tripcast_weather::Coordinates;

    /// Counts writes and can be told to fail deletes
    struct RecordingBackend {
        inner: SqliteTripStore,
        writes: Arc<AtomicUsize>,
        fail_deletes: bool,
    }

    impl TripBackend for RecordingBackend {
        fn insert(&self, trip: &NewTrip) -> TripBackendResult<Trip> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.insert(trip)
        }

        fn list_by_owner(&self, owner_id: &str) -> TripBackendResult<Vec<Trip>> {
            self.inner.list_by_owner(owner_id)
        }

        fn get(&self, id: &TripId) -> TripBackendResult<Option<Trip>> {
            self.inner.get(id)
        }

        fn update(&self, id: &TripId, fields: &TripFields) -> TripBackendResult<Trip> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.update(id, fields)
        }

        fn delete(&self, id: &TripId) -> TripBackendResult<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_deletes {
                return Err(TripBackendError::storage("permission denied"));
            }
            self.inner.delete(id)
        }
    }

    fn recording_store(fail_deletes: bool) -> (TripStore, Arc<AtomicUsize>) {
        let writes = Arc::new(AtomicUsize::new(0));
        let backend = RecordingBackend {
            inner: SqliteTripStore::in_memory().unwrap(),
            writes: writes.clone(),
            fail_deletes,
        };
        (TripStore::new(backend), writes)
    }

    fn owner() -> TripOwner {
        TripOwner {
            id: "uid-1".into(),
            display_name: Some("Ada".into()),
        }
    }

    fn draft(city: &str) -> TripDraft {
        TripDraft {
            city: city.into(),
            country: "FR".into(),
            coords: Some(Coordinates::new(48.8566, 2.3522)),
            dates: DateRange::new(
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, 7).unwrap(),
            ),
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (store, _) = recording_store(false);

        let id = store.create_trip(Some(&owner()), draft("Paris")).await.unwrap();
        let trips = store.list_trips("uid-1").await.unwrap();

        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].id, id);
        assert_eq!(store.cached_trips(), trips);
    }

    #[tokio::test]
    async fn test_unauthenticated_create_issues_no_write() {
        let (store, writes) = recording_store(false);

        let err = store.create_trip(None, draft("Paris")).await.unwrap_err();

        assert!(matches!(err, TripError::NotAuthenticated));
        assert!(err.is_validation());
        assert_eq!(writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_dates_issue_no_write() {
        let (store, writes) = recording_store(false);
        let mut incomplete = draft("Paris");
        incomplete.dates.from = None;

        let err = store
            .create_trip(Some(&owner()), incomplete)
            .await
            .unwrap_err();
        assert!(matches!(err, TripError::MissingDates));
        assert_eq!(writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_clears_cache() {
        let (store, _) = recording_store(false);
        store.create_trip(Some(&owner()), draft("Paris")).await.unwrap();
        store.list_trips("uid-1").await.unwrap();

        let ghost = TripId::from("does-not-exist");
        store.cache.write().push(Trip {
            id: ghost.clone(),
            ..store.cached_trips()[0].clone()
        });

        store.delete_trip(&ghost).await.unwrap();
        assert!(store.cached_trips().iter().all(|t| t.id != ghost));
        assert_eq!(store.cached_trips().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_delete_still_drops_from_cache() {
        let (store, _) = recording_store(true);
        let id = store.create_trip(Some(&owner()), draft("Paris")).await.unwrap();

        let err = store.delete_trip(&id).await.unwrap_err();
        assert!(matches!(err, TripError::Persistence(_)));
        assert!(store.cached_trips().is_empty());
    }

    #[tokio::test]
    async fn test_update_refreshes_cache() {
        let (store, _) = recording_store(false);
        let id = store.create_trip(Some(&owner()), draft("Paris")).await.unwrap();

        let mut edit = draft("Lyon");
        edit.coords = Some(Coordinates::new(45.76, 4.84));
        store.update_trip(&id, edit).await.unwrap();

        let cached = store.cached_trips();
        assert_eq!(cached[0].city, "Lyon");
        assert_eq!(cached[0].coords, Coordinates::new(45.76, 4.84));
    }

    #[tokio::test]
    async fn test_update_unknown_trip() {
        let (store, _) = recording_store(false);
        let err = store
            .update_trip(&TripId::from("missing"), draft("Paris"))
            .await
            .unwrap_err();
        assert!(matches!(err, TripError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_incomplete_update_rejected() {
        let (store, writes) = recording_store(false);
        let mut edit = draft("Paris");
        edit.country.clear();

        let err = store
            .update_trip(&TripId::from("any"), edit)
            .await
            .unwrap_err();
        assert!(matches!(err, TripError::Incomplete(_)));
        assert_eq!(writes.load(Ordering::SeqCst), 0);
    }
}
