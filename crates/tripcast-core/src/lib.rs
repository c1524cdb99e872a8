pub mod config;
pub mod error;
pub mod storage;
pub mod theme;

pub use config::{
    AuthConfig, Config, LocationConfig, StorageConfig, SyncConfig, TemperatureUnit,
    ValidationResult, WeatherConfig,
};
pub use error::{
    AppError, AuthError, DatabaseError, LocationError, NetworkError,
    ReqwestErrorExt, RusqliteErrorExt, TripError, WeatherError,
};
pub use storage::{LocalStorage, INITIAL_LOCATION_KEY, THEME_KEY};
pub use theme::{Theme, ThemeContext};

use anyhow::Result;

/// Initialize the core application
pub fn init() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!("Tripcast core initialized");
    Ok(())
}
