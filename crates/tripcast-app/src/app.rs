use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use tripcast_auth::{AuthContext, IdentityToolkitAuth, SessionStorage, User};
use tripcast_core::{AppError, AuthError, Config, LocalStorage, ThemeContext, TripError};
use tripcast_trips::{DateRange, SqliteTripStore, Trip, TripDraft, TripId, TripOwner, TripStore};
use tripcast_weather::{source_from_config, PositionSource, WeatherProvider};

use crate::notify::{Notification, Notifier};
use crate::overlay::{trip_weather_overlay, TripWeatherMap};
use crate::sync::{LocationSync, SyncOutcome, Trigger};

/// Main application state and lifecycle manager
pub struct App {
    config: Arc<Config>,
    theme: Arc<ThemeContext>,
    auth: Arc<AuthContext>,
    provider: Arc<WeatherProvider>,
    trips: TripStore,
    sync: Arc<LocationSync>,
    notifier: Notifier,
    refresh: Option<(CancellationToken, JoinHandle<()>)>,
}

impl App {
    /// Build every service from `config`. Returns the receiving end of the
    /// notification channel alongside the app.
    pub fn new(config: Config, prefers_dark: bool) -> Result<(Self, UnboundedReceiver<Notification>)> {
        let storage_config = &config.storage;
        let storage = Arc::new(LocalStorage::open(&storage_config.local_storage_path())?);
        let theme = Arc::new(ThemeContext::load(storage.clone(), prefers_dark));

        let auth_provider = IdentityToolkitAuth::new(&config.auth)?;
        let auth = Arc::new(AuthContext::new(
            Arc::new(auth_provider),
            SessionStorage::new(&storage_config.session_path()),
        ));

        let provider = Arc::new(WeatherProvider::new(&config.weather)?);
        let trips = TripStore::sqlite(SqliteTripStore::new(storage_config.trips_db_path())?);

        let (notifier, notifications) = Notifier::channel();
        let position: Arc<dyn PositionSource> = Arc::from(source_from_config(&config.location));
        let sync = LocationSync::new(provider.clone(), position, storage, notifier.clone())
            .with_position_timeout(Duration::from_secs(config.location.timeout_secs))
            .discard_stale_responses(config.sync.discard_stale_responses);

        let app = Self {
            config: Arc::new(config),
            theme,
            auth,
            provider,
            trips,
            sync: Arc::new(sync),
            notifier,
            refresh: None,
        };
        Ok((app, notifications))
    }

    /// Restore the auth session
    pub fn initialize(&self) {
        self.auth.init();
        match self.auth.current_user() {
            Some(user) => tracing::info!("Application initialized, signed in as {}", user.email),
            None => tracing::info!("Application initialized, signed out"),
        }
    }

    /// Start the silent periodic weather refresh, if enabled
    pub fn start_refresh(&mut self) {
        let minutes = self.config.weather.refresh_minutes;
        if minutes == 0 || self.refresh.is_some() {
            return;
        }

        let cancel = CancellationToken::new();
        let handle = self.sync.spawn_periodic_refresh(
            Duration::from_secs(u64::from(minutes) * 60),
            cancel.clone(),
        );
        tracing::info!("Weather refresh every {} minutes", minutes);
        self.refresh = Some((cancel, handle));
    }

    /// Stop background work and tear down the auth subscription
    pub async fn shutdown(&mut self) {
        tracing::info!("Shutting down application");

        if let Some((cancel, handle)) = self.refresh.take() {
            cancel.cancel();
            if let Err(e) = handle.await {
                tracing::error!("Weather refresh task ended abnormally: {}", e);
            }
        }

        self.auth.shutdown();
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn theme(&self) -> &ThemeContext {
        &self.theme
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn sync(&self) -> &Arc<LocationSync> {
        &self.sync
    }

    pub fn trips(&self) -> &TripStore {
        &self.trips
    }

    /// Gate for commands that need an account; renews a session close to expiry
    pub async fn require_user(&self) -> Result<User, AppError> {
        Ok(self.auth.ensure_fresh().await?)
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<User, AppError> {
        let result = self.auth.register(email, password, display_name).await;
        self.report_auth(result)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, AppError> {
        let result = self.auth.sign_in(email, password).await;
        self.report_auth(result)
    }

    pub fn logout(&self) -> Result<(), AppError> {
        Ok(self.auth.sign_out()?)
    }

    fn report_auth(&self, result: Result<User, AuthError>) -> Result<User, AppError> {
        result.map_err(|e| {
            self.notifier.error(e.user_message());
            AppError::from(e)
        })
    }

    pub async fn load_weather(&self, trigger: Trigger) -> Result<SyncOutcome, AppError> {
        self.sync.run(trigger).await
    }

    /// Save a trip to the currently displayed location
    pub async fn save_trip(&self, dates: DateRange) -> Result<TripId, AppError> {
        let draft = match self.sync.location_store().current() {
            Some(location) => TripDraft::from_location(&location, dates),
            None => TripDraft {
                dates,
                ..TripDraft::default()
            },
        };
        let owner = self.auth.ensure_fresh().await.ok().map(|user| TripOwner {
            id: user.uid,
            display_name: user.display_name,
        });

        match self.trips.create_trip(owner.as_ref(), draft).await {
            Ok(id) => {
                self.notifier.success("Trip successfully saved!");
                Ok(id)
            }
            Err(e) => {
                self.notifier.error(e.user_message());
                Err(e.into())
            }
        }
    }

    pub async fn my_trips(&self) -> Result<Vec<Trip>, AppError> {
        let user = self.require_user().await?;
        Ok(self.trips.list_trips(&user.uid).await?)
    }

    /// The user's trips plus current weather at each
    pub async fn my_trips_with_weather(&self) -> Result<(Vec<Trip>, TripWeatherMap), AppError> {
        let trips = self.my_trips().await?;
        let overlay = trip_weather_overlay(self.provider.clone(), &trips).await;
        Ok((trips, overlay))
    }

    pub async fn delete_trip(&self, id: &TripId) -> Result<(), AppError> {
        self.require_user().await?;
        match self.trips.delete_trip(id).await {
            Ok(()) => {
                self.notifier.success("Trip deleted successfully.");
                Ok(())
            }
            Err(e) => {
                self.notifier.error("Failed to delete trip. Try again later.");
                Err(e.into())
            }
        }
    }

    /// Apply an inline edit. With `relocate`, the place is looked up first
    /// and replaces the draft's city, country and coordinates.
    pub async fn edit_trip(
        &self,
        id: &TripId,
        mut draft: TripDraft,
        relocate: Option<&str>,
    ) -> Result<(), AppError> {
        self.require_user().await?;

        if let Some(query) = relocate {
            match self.provider.forward_geocode(query).await {
                Ok(location) => {
                    self.notifier.success("Location found");
                    draft.city = location.city;
                    draft.country = location.country;
                    draft.coords = Some(location.coords);
                }
                Err(e) => {
                    self.notifier.error("Failed to find location");
                    return Err(e.into());
                }
            }
        }

        match self.trips.update_trip(id, draft).await {
            Ok(()) => {
                self.notifier.success("Trip updated");
                Ok(())
            }
            Err(e) if e.is_validation() => {
                self.notifier.error(e.user_message());
                Err(e.into())
            }
            Err(e) => {
                self.notifier.error("Could not update trip");
                Err(AppError::Trip(e))
            }
        }
    }

    /// Current trip as an editable draft
    pub fn draft_for(&self, id: &TripId) -> Result<TripDraft, AppError> {
        self.trips
            .cached_trips()
            .into_iter()
            .find(|t| &t.id == id)
            .map(|t| TripDraft {
                city: t.city,
                country: t.country,
                coords: Some(t.coords),
                dates: DateRange::new(t.departure_date, t.arrival_date),
            })
            .ok_or_else(|| TripError::NotFound(id.to_string()).into())
    }
}
