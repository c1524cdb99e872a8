//! Error taxonomy shared by every Tripcast crate.
//!
//! `Display` carries the detail for logs; `user_message()` is the short text
//! a notification shows. Domain crates map their own errors into `AppError`
//! where an action finishes.

use thiserror::Error;

/// Any failure that reaches an action boundary
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error("Trip error: {0}")]
    Trip(#[from] TripError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for a notification.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Database(e) => e.user_message(),
            AppError::Auth(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
            AppError::Location(e) => e.user_message(),
            AppError::Trip(e) => e.user_message(),
            AppError::Io(_) => "Could not read or write local files.",
            AppError::Other(_) => "Something went wrong. Please try again.",
        }
    }
}

/// HTTP failures below the provider protocol
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Could not reach host: {0}")]
    Unreachable(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed response body: {0}")]
    MalformedBody(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::Unreachable(_) => "You appear to be offline.",
            NetworkError::Timeout => "The weather service took too long to answer.",
            NetworkError::Status { status, .. } if *status >= 500 => {
                "The weather service is having trouble. Try again soon."
            }
            NetworkError::Status { .. } => "Failed to fetch weather data",
            NetworkError::MalformedBody(_) => "Failed to fetch weather data",
        }
    }
}

/// Trip database failures
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Cannot open trip database: {0}")]
    Unavailable(String),

    #[error("Trip database query failed: {0}")]
    QueryFailed(String),

    #[error("Trip database is corrupt: {0}")]
    Corrupt(String),
}

impl DatabaseError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DatabaseError::Unavailable(_) => "Your trips could not be opened.",
            DatabaseError::QueryFailed(_) => "Failed to save the trip. Please try again.",
            DatabaseError::Corrupt(_) => "Your saved trips are damaged and could not be read.",
        }
    }
}

/// Authentication errors (accounts, sessions).
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailInUse,

    #[error("Password too weak")]
    WeakPassword,

    #[error("Session expired")]
    SessionExpired,

    #[error("Auth provider error: {0}")]
    ProviderFailed(String),

    #[error("Session storage error: {0}")]
    StorageError(String),
}

impl AuthError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::NotAuthenticated => "You must be logged in to do that.",
            AuthError::InvalidCredentials => "Invalid email or password.",
            AuthError::EmailInUse => "An account with this email already exists.",
            AuthError::WeakPassword => "Password should be at least 6 characters.",
            AuthError::SessionExpired => "Your session has expired. Please sign in again.",
            AuthError::ProviderFailed(_) => "Sign-in failed. Please try again.",
            AuthError::StorageError(_) => "Failed to save your session. Please try again.",
        }
    }
}

/// Weather provider errors.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Weather API error: {0}")]
    ApiError(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Service unavailable")]
    ServiceUnavailable,
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::LocationNotFound(_) => "Location not found",
            WeatherError::ApiError(_) => "Failed to fetch weather data",
            WeatherError::InvalidApiKey => "Weather API key is invalid. Check settings.",
            WeatherError::ServiceUnavailable => {
                "Weather service unavailable. Please try again later."
            }
        }
    }
}

/// Device position and saved-location errors.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Geolocation not supported")]
    Unsupported,

    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position unavailable")]
    PositionUnavailable,

    #[error("Location request timed out")]
    Timeout,

    #[error("No initial location saved")]
    NoSavedLocation,
}

impl LocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            LocationError::Unsupported => "Geolocation not supported on this device.",
            LocationError::PermissionDenied => "Location permission was denied.",
            LocationError::PositionUnavailable => "Unable to get current location",
            LocationError::Timeout => "Location request timed out. Please try again.",
            LocationError::NoSavedLocation => "No initial location saved",
        }
    }
}

/// Trip validation and persistence errors.
#[derive(Debug, Error)]
pub enum TripError {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Departure or arrival date missing")]
    MissingDates,

    #[error("Trip location missing")]
    MissingLocation,

    #[error("Trip coordinates missing")]
    MissingCoordinates,

    #[error("Incomplete trip: {0}")]
    Incomplete(String),

    #[error("Trip not found: {0}")]
    NotFound(String),

    #[error("Trip storage failed: {0}")]
    Persistence(String),
}

impl TripError {
    /// Rejected before any write was issued
    pub fn is_validation(&self) -> bool {
        !matches!(self, TripError::NotFound(_) | TripError::Persistence(_))
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            TripError::NotAuthenticated => "You must be logged in to save a trip.",
            TripError::MissingDates => "Please select both departure and arrival dates.",
            TripError::MissingLocation => "Location information is missing.",
            TripError::MissingCoordinates => "Coordinates are missing or invalid",
            TripError::Incomplete(_) => "Please complete all fields",
            TripError::NotFound(_) => "That trip no longer exists.",
            TripError::Persistence(_) => "Failed to save the trip. Please try again.",
        }
    }
}

/// Classify a `reqwest` failure
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            return NetworkError::Timeout;
        }
        if self.is_decode() {
            return NetworkError::MalformedBody(self.to_string());
        }
        match self.status() {
            Some(status) => NetworkError::Status {
                status: status.as_u16(),
                message: self.to_string(),
            },
            None => NetworkError::Unreachable(self.to_string()),
        }
    }
}

/// Classify a `rusqlite` failure
pub trait RusqliteErrorExt {
    fn into_database_error(self) -> DatabaseError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_database_error(self) -> DatabaseError {
        match &self {
            rusqlite::Error::SqliteFailure(err, _) => match err.code {
                rusqlite::ErrorCode::DatabaseCorrupt | rusqlite::ErrorCode::NotADatabase => {
                    DatabaseError::Corrupt(self.to_string())
                }
                rusqlite::ErrorCode::CannotOpen | rusqlite::ErrorCode::PermissionDenied => {
                    DatabaseError::Unavailable(self.to_string())
                }
                _ => DatabaseError::QueryFailed(self.to_string()),
            },
            // A stored value that no longer parses
            rusqlite::Error::FromSqlConversionFailure(..) => DatabaseError::Corrupt(self.to_string()),
            _ => DatabaseError::QueryFailed(self.to_string()),
        }
    }
}
