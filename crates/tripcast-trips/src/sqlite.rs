//! SQLite-based trip document storage.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

use tripcast_weather::Coordinates;

use crate::backend::{TripBackend, TripBackendError, TripBackendResult};
use crate::types::{NewTrip, Trip, TripFields, TripId};

const DATE_FORMAT: &str = "%Y-%m-%d";

const SELECT_COLUMNS: &str = "SELECT id, owner_id, owner_name, city, country, lat, lon, \
     departure_date, arrival_date, created_at FROM trips";

/// SQLite-based trip storage.
pub struct SqliteTripStore {
    conn: Connection,
}

impl SqliteTripStore {
    /// Open (or create) the trip database at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory trip store (for testing).
    pub fn in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS trips (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                owner_name TEXT NOT NULL,
                city TEXT NOT NULL,
                country TEXT NOT NULL,
                lat REAL NOT NULL,
                lon REAL NOT NULL,
                departure_date TEXT NOT NULL,
                arrival_date TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_trips_owner ON trips(owner_id);
            "#,
        )?;
        Ok(())
    }

    fn parse_date(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
        NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| conversion_failure(idx, e))
    }

    fn parse_timestamp(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_failure(idx, e))
    }

    fn row_to_trip(row: &rusqlite::Row) -> rusqlite::Result<Trip> {
        let departure_str: String = row.get(7)?;
        let arrival_str: String = row.get(8)?;
        let created_at_str: String = row.get(9)?;

        Ok(Trip {
            id: TripId(row.get(0)?),
            owner_id: row.get(1)?,
            owner_name: row.get(2)?,
            city: row.get(3)?,
            country: row.get(4)?,
            coords: Coordinates::new(row.get(5)?, row.get(6)?),
            departure_date: Self::parse_date(7, &departure_str)?,
            arrival_date: Self::parse_date(8, &arrival_str)?,
            created_at: Self::parse_timestamp(9, &created_at_str)?,
        })
    }

    #[cfg(test)]
    fn count(&self) -> usize {
        self.conn
            .query_row("SELECT COUNT(*) FROM trips", [], |row| row.get::<_, i64>(0))
            .map_or(0, |n| n as usize)
    }
}

fn conversion_failure(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

impl TripBackend for SqliteTripStore {
    fn insert(&self, trip: &NewTrip) -> TripBackendResult<Trip> {
        let id = TripId::generate();
        let now = Utc::now();
        let f = &trip.fields;

        self.conn
            .execute(
                r#"
                INSERT INTO trips (id, owner_id, owner_name, city, country, lat, lon, departure_date, arrival_date, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    id.as_str(),
                    trip.owner_id,
                    trip.owner_name,
                    f.city,
                    f.country,
                    f.coords.lat,
                    f.coords.lon,
                    f.departure_date.format(DATE_FORMAT).to_string(),
                    f.arrival_date.format(DATE_FORMAT).to_string(),
                    now.to_rfc3339(),
                ],
            )
            .map_err(TripBackendError::from)?;

        tracing::debug!("Created trip with ID: {}", id);

        Ok(Trip {
            id,
            owner_id: trip.owner_id.clone(),
            owner_name: trip.owner_name.clone(),
            city: f.city.clone(),
            country: f.country.clone(),
            coords: f.coords,
            departure_date: f.departure_date,
            arrival_date: f.arrival_date,
            created_at: now,
        })
    }

    fn list_by_owner(&self, owner_id: &str) -> TripBackendResult<Vec<Trip>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE owner_id = ?1", SELECT_COLUMNS))
            .map_err(TripBackendError::from)?;

        let rows = stmt
            .query_map(params![owner_id], Self::row_to_trip)
            .map_err(TripBackendError::from)?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(TripBackendError::from)
    }

    fn get(&self, id: &TripId) -> TripBackendResult<Option<Trip>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE id = ?1", SELECT_COLUMNS))
            .map_err(TripBackendError::from)?;

        let mut rows = stmt
            .query(params![id.as_str()])
            .map_err(TripBackendError::from)?;

        match rows.next()? {
            Some(row) => Ok(Some(Self::row_to_trip(row)?)),
            None => Ok(None),
        }
    }

    fn update(&self, id: &TripId, fields: &TripFields) -> TripBackendResult<Trip> {
        let changed = self
            .conn
            .execute(
                r#"
                UPDATE trips
                SET city = ?1, country = ?2, lat = ?3, lon = ?4, departure_date = ?5, arrival_date = ?6
                WHERE id = ?7
                "#,
                params![
                    fields.city,
                    fields.country,
                    fields.coords.lat,
                    fields.coords.lon,
                    fields.departure_date.format(DATE_FORMAT).to_string(),
                    fields.arrival_date.format(DATE_FORMAT).to_string(),
                    id.as_str(),
                ],
            )
            .map_err(TripBackendError::from)?;

        if changed == 0 {
            return Err(TripBackendError::not_found(id.as_str()));
        }

        tracing::debug!("Updated trip: {}", id);
        self.get(id)?
            .ok_or_else(|| TripBackendError::not_found(id.as_str()))
    }

    fn delete(&self, id: &TripId) -> TripBackendResult<()> {
        let removed = self
            .conn
            .execute("DELETE FROM trips WHERE id = ?1", params![id.as_str()])
            .map_err(TripBackendError::from)?;

        if removed == 0 {
            tracing::debug!("Delete of unknown trip {} was a no-op", id);
        } else {
            tracing::debug!("Deleted trip: {}", id);
        }
        Ok(())
    }
}
