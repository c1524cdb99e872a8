//! Tripcast application layer
//!
//! State stores, the location/weather sync flow, the per-trip weather
//! overlay and the `App` that wires them to config, auth and theme.

pub mod app;
pub mod notify;
pub mod overlay;
pub mod stores;
pub mod sync;

pub use app::App;
pub use notify::{Notification, NotificationKind, Notifier};
pub use overlay::{trip_weather_overlay, TripWeatherMap};
pub use stores::{LocationState, LocationStatus, LocationStore, WeatherBundle, WeatherState, WeatherStore};
pub use sync::{LocationSync, SyncOutcome, Trigger};
