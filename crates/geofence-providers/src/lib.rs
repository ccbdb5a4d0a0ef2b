//! Geocoding and position providers for the geofence monitor.
//!
//! Provides:
//! - `NominatimGeocoder` - OpenStreetMap lookups (feature: nominatim)
//! - `PositionFeed` - Latest position pushed by a browser or device client
//! - In-memory `StaticGeocoder` and `ScriptedPositions`

pub mod memory;
pub mod position;

#[cfg(feature = "nominatim")]
pub mod nominatim;

pub use memory::{ScriptedPositions, StaticGeocoder};
#[cfg(feature = "nominatim")]
pub use nominatim::NominatimGeocoder;
pub use position::{PositionFeed, PositionReport};
