//! Errors surfaced by monitor operations.

use thiserror::Error;

use crate::traits::PositionError;

/// Geofence operation error.
///
/// None of these are fatal; each one is also reported as a notice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeofenceError {
    #[error("Could not geocode '{address}': {reason}")]
    GeocodeFailure { address: String, reason: String },
    #[error("Position unavailable: {0}")]
    PositionUnavailable(#[from] PositionError),
    #[error("Cannot start monitoring: {0}")]
    InvalidStartCondition(String),
    #[error("Empty location input")]
    EmptyInput,
}
