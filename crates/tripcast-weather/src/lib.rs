//! Weather provider client for Tripcast
//!
//! Geocoding, current conditions and the 3-hour forecast feed from an
//! OpenWeather-compatible REST API, plus device position sources and map
//! tile layers.

mod error_mapping;
pub mod forecast;
pub mod geocode;
pub mod icon;
pub mod location;
pub mod provider;
pub mod tiles;
pub mod types;

pub use forecast::{daily_forecast, hourly_forecast, HOURLY_ENTRIES};
pub use icon::WeatherIcon;
pub use location::{
    resolve_current_position, source_from_config, FixedPosition, NoPositionSource, PositionSource,
};
pub use provider::WeatherProvider;
pub use tiles::{tile_for, TileLayer, MAX_ZOOM};
pub use types::*;
