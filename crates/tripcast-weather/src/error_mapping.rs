//! Maps provider and position errors to tripcast_core::AppError for
//! consistent user-facing messages.

use tripcast_core::{AppError, LocationError, NetworkError, ReqwestErrorExt, WeatherError};

use crate::types::{GeoError, ProviderError};

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Network(e) => AppError::Network(e.into_network_error()),
            ProviderError::Status { status, message } if status >= 500 => {
                tracing::debug!("Provider unavailable ({}): {}", status, message);
                AppError::Weather(WeatherError::ServiceUnavailable)
            }
            ProviderError::Status { status, message } => {
                AppError::Network(NetworkError::Status { status, message })
            }
            ProviderError::InvalidApiKey => AppError::Weather(WeatherError::InvalidApiKey),
            ProviderError::Decode(s) => AppError::Weather(WeatherError::ApiError(s)),
            ProviderError::NotFound(s) => AppError::Weather(WeatherError::LocationNotFound(s)),
        }
    }
}

impl From<GeoError> for LocationError {
    fn from(e: GeoError) -> Self {
        match e {
            GeoError::Unsupported => LocationError::Unsupported,
            GeoError::PermissionDenied => LocationError::PermissionDenied,
            GeoError::PositionUnavailable => LocationError::PositionUnavailable,
            GeoError::Timeout => LocationError::Timeout,
        }
    }
}

impl From<GeoError> for AppError {
    fn from(e: GeoError) -> Self {
        AppError::Location(e.into())
    }
}
