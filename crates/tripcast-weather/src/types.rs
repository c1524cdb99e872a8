use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::icon::WeatherIcon;

/// Latitude/longitude pair in degrees. Serialized as `{lat, lon}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// City and country returned by reverse geocoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub city: String,
    pub country: String,
}

/// A fully resolved location: coordinates plus place name, always together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub coords: Coordinates,
    pub city: String,
    pub country: String,
}

impl Location {
    pub fn new(coords: Coordinates, place: Place) -> Self {
        Self {
            coords,
            city: place.city,
            country: place.country,
        }
    }

    /// "Paris, FR"
    pub fn label(&self) -> String {
        format!("{}, {}", self.city, self.country)
    }
}

/// Current conditions, derived 1:1 from the provider payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    /// Whole degrees
    pub temperature: i32,
    pub feels_like: i32,
    pub description: String,
    /// m/s (metric) or mph (imperial)
    pub wind_speed: f64,
    /// One of the 8 compass points
    pub wind_direction: String,
    pub pressure_hpa: u32,
    pub humidity_pct: u8,
    pub visibility_km: f64,
    /// Provider icon id, e.g. `"01d"`
    pub icon_id: String,
    /// Not yet sourced from the provider
    pub uv_index: Option<f64>,
    /// Estimate from temperature and humidity, not a provider reading
    pub dew_point_estimate: f64,
}

impl CurrentWeather {
    pub fn icon(&self) -> WeatherIcon {
        WeatherIcon::from_icon_id(&self.icon_id)
    }
}

/// One raw step of the provider's 3-hour forecast feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Provider-local timestamp (`dt_txt`)
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub description: String,
    pub icon_id: String,
}

/// One day of the 5-day outlook, taken from the noon step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDateTime,
    /// e.g. `"Wed, May 1"`
    pub display_day: String,
    pub temperature: i32,
    pub description: String,
    pub icon_id: String,
}

/// One 3-hour step of the next 24 hours
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastHour {
    pub time: NaiveDateTime,
    pub temperature: i32,
    pub icon_id: String,
    pub description: String,
}

/// Device position errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeoError {
    #[error("Geolocation not supported")]
    Unsupported,
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Position unavailable")]
    PositionUnavailable,
    #[error("Location request timed out")]
    Timeout,
}

impl GeoError {
    /// Map a platform failure code (1 denied, 2 unavailable, 3 timeout).
    pub fn from_platform_code(code: u16) -> Self {
        match code {
            1 => Self::PermissionDenied,
            3 => Self::Timeout,
            _ => Self::PositionUnavailable,
        }
    }
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Provider returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Invalid API key")]
    InvalidApiKey,
    #[error("Parse error: {0}")]
    Decode(String),
    #[error("Location not found: {0}")]
    NotFound(String),
}
