//! Device position sources.

use async_trait::async_trait;
use std::time::Duration;

use tripcast_core::LocationConfig;

use crate::types::{Coordinates, GeoError};

/// Something that can report where the device is.
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, GeoError>;

    /// Whether this host can produce a position at all
    fn is_available(&self) -> bool {
        true
    }
}

/// A position pinned in configuration
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl PositionSource for FixedPosition {
    async fn current_position(&self) -> Result<Coordinates, GeoError> {
        Ok(self.0)
    }
}

/// Hosts with no positioning capability
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPositionSource;

#[async_trait]
impl PositionSource for NoPositionSource {
    async fn current_position(&self) -> Result<Coordinates, GeoError> {
        Err(GeoError::Unsupported)
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Pick the source described by config
pub fn source_from_config(config: &LocationConfig) -> Box<dyn PositionSource> {
    match config.pinned() {
        Some((lat, lon)) => Box::new(FixedPosition(Coordinates::new(lat, lon))),
        None => Box::new(NoPositionSource),
    }
}

/// Ask `source` for a position, giving up after `timeout`.
pub async fn resolve_current_position(
    source: &dyn PositionSource,
    timeout: Duration,
) -> Result<Coordinates, GeoError> {
    if !source.is_available() {
        return Err(GeoError::Unsupported);
    }

    match tokio::time::timeout(timeout, source.current_position()).await {
        Ok(result) => {
            if let Ok(coords) = &result {
                tracing::info!("Got position: {}", coords);
            }
            result
        }
        Err(_) => {
            tracing::warn!("Position request timed out after {:?}", timeout);
            Err(GeoError::Timeout)
        }
    }
}
