//! Provider traits for geocoding and position fixes.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::Coordinate;

/// Geocoding error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    #[error("{0}")]
    Transport(String),
    #[error("unexpected geocoder response: {0}")]
    Malformed(String),
}

/// Trait for address-to-coordinate lookup services.
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Resolve a free-text address.
    ///
    /// Returns `Ok(None)` when the address does not resolve to a place.
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, GeocodeError>;
}

#[async_trait]
impl<T: GeocodingProvider + ?Sized> GeocodingProvider for Arc<T> {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, GeocodeError> {
        (**self).geocode(address).await
    }
}

/// Position error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("{0}")]
    PermissionDenied(String),
    #[error("Geolocation not supported")]
    Unsupported,
    #[error("{0}")]
    Timeout(String),
    #[error("{0}")]
    Unavailable(String),
}

/// Trait for sources of the device's current position.
#[async_trait]
pub trait PositionProvider: Send + Sync {
    /// Fetch the current position.
    async fn current_position(&self) -> Result<Coordinate, PositionError>;
}

#[async_trait]
impl<T: PositionProvider + ?Sized> PositionProvider for Arc<T> {
    async fn current_position(&self) -> Result<Coordinate, PositionError> {
        (**self).current_position().await
    }
}
