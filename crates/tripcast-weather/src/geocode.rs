//! Forward and reverse geocoding against the provider's geo endpoints.
//! Both take the first match only. A first match without a name or a
//! country (open water, disputed areas) counts as no match.

use serde::Deserialize;
use tracing::instrument;

use crate::provider::WeatherProvider;
use crate::types::{Coordinates, Location, Place, ProviderError};

#[derive(Debug, Deserialize)]
struct GeoMatch {
    #[serde(default)]
    name: String,
    #[serde(default)]
    country: String,
    lat: f64,
    lon: f64,
}

impl GeoMatch {
    fn is_named(&self) -> bool {
        !self.name.trim().is_empty() && !self.country.trim().is_empty()
    }
}

fn first_named(matches: Vec<GeoMatch>) -> Option<GeoMatch> {
    matches.into_iter().next().filter(GeoMatch::is_named)
}

impl WeatherProvider {
    /// City and country at `coords`. Zero matches is `NotFound`, as is a
    /// match missing its name or country.
    #[instrument(skip(self), level = "info")]
    pub async fn reverse_geocode(&self, coords: Coordinates) -> Result<Place, ProviderError> {
        let matches: Vec<GeoMatch> = self
            .get_json(
                "/geo/1.0/reverse",
                &[
                    ("lat", coords.lat.to_string()),
                    ("lon", coords.lon.to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        let first = first_named(matches)
            .ok_or_else(|| ProviderError::NotFound(format!("no place at {}", coords)))?;

        tracing::info!("Reverse geocoded to: {}, {}", first.name, first.country);
        Ok(Place {
            city: first.name,
            country: first.country,
        })
    }

    /// Resolve a free-text place name to a full location.
    #[instrument(skip(self), level = "info")]
    pub async fn forward_geocode(&self, query: &str) -> Result<Location, ProviderError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ProviderError::NotFound("empty query".to_string()));
        }

        let matches: Vec<GeoMatch> = self
            .get_json(
                "/geo/1.0/direct",
                &[("q", query.to_string()), ("limit", "1".to_string())],
            )
            .await?;

        let first =
            first_named(matches).ok_or_else(|| ProviderError::NotFound(query.to_string()))?;

        tracing::info!("Geocoded {:?} to {}, {}", query, first.name, first.country);
        Ok(Location {
            coords: Coordinates::new(first.lat, first.lon),
            city: first.name,
            country: first.country,
        })
    }
}
