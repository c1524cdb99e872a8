//! Location/weather synchronization flow.
//!
//! A trigger resolves a location (device position, search query or the
//! saved initial location), then fetches current conditions and the
//! forecast feed for it. Stores are only written once every step has
//! succeeded; a failing trigger leaves the previous data in place and
//! records the error.
//!
//! Each trigger takes a sequence number. With stale-response discarding
//! enabled, a trigger that finishes after a newer one has already been
//! applied is dropped.

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use tripcast_core::{AppError, LocalStorage, LocationError, INITIAL_LOCATION_KEY};
use tripcast_weather::{
    daily_forecast, hourly_forecast, resolve_current_position, Coordinates, Location,
    PositionSource, WeatherProvider,
};

use crate::notify::Notifier;
use crate::stores::{LocationStore, WeatherBundle, WeatherStore};

const DEFAULT_POSITION_TIMEOUT: Duration = Duration::from_secs(10);

/// What started a sync
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// App start, resolves the device position
    Mount,
    /// Free-text place search
    Search(String),
    /// "Use current location"
    CurrentPosition,
    /// Back to the persisted initial location
    Reset,
    /// Timer; silently repeats the last successful resolution
    Periodic,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Applied(Location),
    /// A newer trigger was applied first
    Discarded,
    /// Periodic refresh with nothing resolved yet
    Skipped,
}

/// How a location was obtained; replayed by the periodic refresh
#[derive(Debug, Clone, PartialEq)]
enum Resolution {
    Position(Coordinates),
    Query(String),
    Saved(Location),
}

enum Request {
    Device,
    Query(String),
    Saved,
    Replay(Resolution),
}

/// What one trigger produced before it was claimed
struct Attempt {
    /// Location freshly geocoded by this trigger; persisted only once claimed
    geocoded: Option<Location>,
    result: Result<(Location, WeatherBundle, Resolution), AppError>,
}

pub struct LocationSync {
    provider: Arc<WeatherProvider>,
    position: Arc<dyn PositionSource>,
    position_timeout: Duration,
    storage: Arc<LocalStorage>,
    location: Arc<LocationStore>,
    weather: Arc<WeatherStore>,
    notifier: Notifier,
    discard_stale: bool,
    issued: AtomicU64,
    applied: Mutex<u64>,
    last: RwLock<Option<Resolution>>,
}

impl LocationSync {
    pub fn new(
        provider: Arc<WeatherProvider>,
        position: Arc<dyn PositionSource>,
        storage: Arc<LocalStorage>,
        notifier: Notifier,
    ) -> Self {
        Self {
            provider,
            position,
            position_timeout: DEFAULT_POSITION_TIMEOUT,
            storage,
            location: Arc::new(LocationStore::new()),
            weather: Arc::new(WeatherStore::new()),
            notifier,
            discard_stale: false,
            issued: AtomicU64::new(0),
            applied: Mutex::new(0),
            last: RwLock::new(None),
        }
    }

    pub fn with_position_timeout(mut self, timeout: Duration) -> Self {
        self.position_timeout = timeout;
        self
    }

    /// Off by default: every response is applied in completion order and
    /// the last one to finish wins.
    pub fn discard_stale_responses(mut self, enabled: bool) -> Self {
        self.discard_stale = enabled;
        self
    }

    pub fn location_store(&self) -> Arc<LocationStore> {
        self.location.clone()
    }

    pub fn weather_store(&self) -> Arc<WeatherStore> {
        self.weather.clone()
    }

    /// The persisted initial location, if one was saved
    pub fn saved_location(&self) -> Option<Location> {
        self.storage.get(INITIAL_LOCATION_KEY)
    }

    /// Run one trigger to completion and report it.
    pub async fn run(&self, trigger: Trigger) -> Result<SyncOutcome, AppError> {
        let request = match &trigger {
            Trigger::Mount | Trigger::CurrentPosition => Request::Device,
            Trigger::Search(query) => Request::Query(query.trim().to_string()),
            Trigger::Reset => Request::Saved,
            Trigger::Periodic => match self.last.read().clone() {
                Some(resolution) => Request::Replay(resolution),
                None => {
                    tracing::debug!("Periodic refresh skipped, nothing resolved yet");
                    return Ok(SyncOutcome::Skipped);
                }
            },
        };

        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.location.begin();
        self.weather.begin();

        let attempt = self.execute(request).await;

        if !self.claim(seq) {
            tracing::debug!("Discarding stale response for {:?} (#{})", trigger, seq);
            return Ok(SyncOutcome::Discarded);
        }

        if let Some(location) = &attempt.geocoded {
            self.persist(location);
        }

        match attempt.result {
            Ok((location, bundle, resolution)) => {
                tracing::info!("Weather loaded for {}", location.label());
                self.location.succeed(location.clone());
                self.weather.apply(bundle);
                *self.last.write() = Some(resolution);
                self.notify_success(&trigger, &location);
                Ok(SyncOutcome::Applied(location))
            }
            Err(e) => {
                let message = e.to_string();
                if trigger == Trigger::Periodic {
                    tracing::warn!("Periodic refresh failed: {}", message);
                } else {
                    tracing::error!("{:?} failed: {}", trigger, message);
                }
                self.location.fail(message.clone());
                self.weather.fail(message);
                self.notify_failure(&trigger, &e);
                Err(e)
            }
        }
    }

    async fn execute(&self, request: Request) -> Attempt {
        let located = match self.locate(request).await {
            Ok(located) => located,
            Err(e) => {
                return Attempt {
                    geocoded: None,
                    result: Err(e),
                }
            }
        };
        let (location, resolution) = located;

        let geocoded = match &resolution {
            Resolution::Position(_) | Resolution::Query(_) => Some(location.clone()),
            Resolution::Saved(_) => None,
        };
        let result = self
            .fetch_weather(location.coords)
            .await
            .map(|bundle| (location, bundle, resolution));

        Attempt { geocoded, result }
    }

    /// Resolve a request to a full location, geocoding where needed
    async fn locate(&self, request: Request) -> Result<(Location, Resolution), AppError> {
        let resolution = match request {
            Request::Device => Resolution::Position(
                resolve_current_position(self.position.as_ref(), self.position_timeout).await?,
            ),
            Request::Query(query) => Resolution::Query(query),
            Request::Saved => Resolution::Saved(
                self.saved_location()
                    .ok_or(AppError::Location(LocationError::NoSavedLocation))?,
            ),
            Request::Replay(resolution) => resolution,
        };

        let location = match &resolution {
            Resolution::Position(coords) => {
                let place = self.provider.reverse_geocode(*coords).await?;
                Location::new(*coords, place)
            }
            Resolution::Query(query) => self.provider.forward_geocode(query).await?,
            Resolution::Saved(location) => location.clone(),
        };

        Ok((location, resolution))
    }

    async fn fetch_weather(&self, coords: Coordinates) -> Result<WeatherBundle, AppError> {
        let current = self.provider.current_weather(coords).await?;
        let feed = self.provider.forecast(coords).await?;

        Ok(WeatherBundle {
            current,
            daily: daily_forecast(&feed),
            hourly: hourly_forecast(&feed),
        })
    }

    fn persist(&self, location: &Location) {
        if let Err(e) = self.storage.set(INITIAL_LOCATION_KEY, location) {
            tracing::warn!("Failed to persist initial location: {:#}", e);
        }
    }

    /// Whether a finished trigger may write to the stores
    fn claim(&self, seq: u64) -> bool {
        if !self.discard_stale {
            return true;
        }
        let mut applied = self.applied.lock();
        if seq < *applied {
            return false;
        }
        *applied = seq;
        true
    }

    fn notify_success(&self, trigger: &Trigger, location: &Location) {
        match trigger {
            Trigger::Search(_) => self.notifier.success(format!(
                "Weather for {}, {} loaded",
                location.city, location.country
            )),
            Trigger::CurrentPosition => self
                .notifier
                .success(format!("Location updated to {}", location.city)),
            Trigger::Reset => self.notifier.success(format!(
                "Reset to {}, {}",
                location.city, location.country
            )),
            Trigger::Mount | Trigger::Periodic => {}
        }
    }

    fn notify_failure(&self, trigger: &Trigger, error: &AppError) {
        match (trigger, error) {
            (Trigger::Periodic, _) => {}
            (Trigger::Mount, e) => self.notifier.error(e.user_message()),
            (Trigger::Search(_), _) => self.notifier.error("Failed to fetch weather data"),
            (Trigger::CurrentPosition, AppError::Location(e)) => {
                self.notifier.error(e.user_message())
            }
            (Trigger::CurrentPosition, _) => {
                self.notifier.error("Unable to get current location")
            }
            (Trigger::Reset, AppError::Location(LocationError::NoSavedLocation)) => {
                self.notifier.error("No initial location saved")
            }
            (Trigger::Reset, _) => self.notifier.error("Reset failed"),
        }
    }

    /// Re-run the last successful resolution every `every` until `cancel`
    /// fires. The first run happens one full interval after the call.
    pub fn spawn_periodic_refresh(
        self: &Arc<Self>,
        every: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let sync = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("Periodic weather refresh stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        // Errors are already recorded in the stores
                        let _ = sync.run(Trigger::Periodic).await;
                    }
                }
            }
        })
    }
}
