//! Location and weather state containers.
//!
//! Both stores keep their last good data while a refresh is loading, so
//! views can keep showing it until the new data lands.

use parking_lot::RwLock;

use tripcast_weather::{CurrentWeather, ForecastDay, ForecastHour, Location};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum LocationStatus {
    #[default]
    Idle,
    Loading,
    Success(Location),
    Error(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationState {
    pub status: LocationStatus,
    /// Last successfully resolved location, kept through loading and errors
    pub location: Option<Location>,
}

impl LocationState {
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            LocationStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == LocationStatus::Loading
    }
}

#[derive(Default)]
pub struct LocationStore {
    state: RwLock<LocationState>,
}

impl LocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> LocationState {
        self.state.read().clone()
    }

    /// Location to display: the current success, else the last good one
    pub fn current(&self) -> Option<Location> {
        self.state.read().location.clone()
    }

    /// Enter loading; clears the error, keeps the last location
    pub fn begin(&self) {
        self.state.write().status = LocationStatus::Loading;
    }

    pub fn succeed(&self, location: Location) {
        let mut state = self.state.write();
        state.location = Some(location.clone());
        state.status = LocationStatus::Success(location);
    }

    pub fn fail(&self, message: impl Into<String>) {
        self.state.write().status = LocationStatus::Error(message.into());
    }
}

/// Everything one successful trigger fetches for a location
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherBundle {
    pub current: CurrentWeather,
    pub daily: Vec<ForecastDay>,
    pub hourly: Vec<ForecastHour>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherState {
    pub current: Option<CurrentWeather>,
    pub daily: Vec<ForecastDay>,
    pub hourly: Vec<ForecastHour>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Default)]
pub struct WeatherStore {
    state: RwLock<WeatherState>,
}

impl WeatherStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> WeatherState {
        self.state.read().clone()
    }

    pub fn begin(&self) {
        let mut state = self.state.write();
        state.loading = true;
        state.error = None;
    }

    /// Replace all weather data at once
    pub fn apply(&self, bundle: WeatherBundle) {
        let mut state = self.state.write();
        state.current = Some(bundle.current);
        state.daily = bundle.daily;
        state.hourly = bundle.hourly;
        state.loading = false;
        state.error = None;
    }

    pub fn fail(&self, message: impl Into<String>) {
        let mut state = self.state.write();
        state.loading = false;
        state.error = Some(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripcast_weather::Coordinates;

    fn paris() -> Location {
        Location {
            coords: Coordinates::new(48.8566, 2.3522),
            city: "Paris".into(),
            country: "FR".into(),
        }
    }

    #[test]
    fn test_location_lifecycle() {
        let store = LocationStore::new();
        assert_eq!(store.snapshot().status, LocationStatus::Idle);

        store.begin();
        assert!(store.snapshot().is_loading());

        store.succeed(paris());
        assert_eq!(store.snapshot().status, LocationStatus::Success(paris()));
        assert!(store.snapshot().error().is_none());
    }

    #[test]
    fn test_loading_keeps_last_location_and_clears_error() {
        let store = LocationStore::new();
        store.succeed(paris());
        store.fail("Location not found");
        assert_eq!(store.snapshot().error(), Some("Location not found"));
        assert_eq!(store.current(), Some(paris()));

        store.begin();
        let state = store.snapshot();
        assert!(state.error().is_none());
        assert_eq!(state.location, Some(paris()));
    }

    #[test]
    fn test_weather_error_then_loading() {
        let store = WeatherStore::new();
        store.fail("Failed to fetch weather data");
        assert!(!store.snapshot().loading);

        store.begin();
        let state = store.snapshot();
        assert!(state.loading);
        assert!(state.error.is_none());
    }
}
