//! Per-trip current weather, fetched concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;

use tripcast_trips::{Trip, TripId};
use tripcast_weather::{CurrentWeather, ProviderError, WeatherProvider};

/// One result per trip; a failed fetch only affects its own entry
pub type TripWeatherMap = HashMap<TripId, Result<CurrentWeather, ProviderError>>;

/// Fetch current conditions for every trip at once. Each task owns its
/// result until it is collected into the map.
pub async fn trip_weather_overlay(provider: Arc<WeatherProvider>, trips: &[Trip]) -> TripWeatherMap {
    let mut tasks = JoinSet::new();

    for trip in trips {
        let provider = provider.clone();
        let id = trip.id.clone();
        let coords = trip.coords;
        tasks.spawn(async move { (id, provider.current_weather(coords).await) });
    }

    let mut overlay = HashMap::with_capacity(trips.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((id, result)) => {
                if let Err(e) = &result {
                    tracing::warn!("Weather for trip {} failed: {}", id, e);
                }
                overlay.insert(id, result);
            }
            Err(e) => tracing::warn!("Trip weather task failed: {}", e),
        }
    }

    tracing::debug!("Trip weather overlay: {} of {} trips", overlay.len(), trips.len());
    overlay
}
