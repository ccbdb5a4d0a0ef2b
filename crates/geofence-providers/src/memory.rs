//! In-memory providers.
//!
//! Useful for tests, demos and offline use. Both record how they were called.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use geofence_core::{
    Coordinate, GeocodingProvider, PositionProvider,
    traits::{GeocodeError, PositionError},
};

/// Geocoder backed by a fixed table of places.
#[derive(Debug, Default)]
pub struct StaticGeocoder {
    places: HashMap<String, Coordinate>,
    failure: Option<String>,
    lookups: Mutex<Vec<String>>,
}

impl StaticGeocoder {
    /// Create an empty geocoder; every lookup resolves to nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A geocoder whose every lookup fails with a transport error.
    #[must_use]
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Register a place. Matching is exact on the qualified address.
    #[must_use]
    pub fn with_place(mut self, address: impl Into<String>, location: Coordinate) -> Self {
        self.places.insert(address.into(), location);
        self
    }

    /// Addresses looked up so far, in call order.
    #[must_use]
    pub fn lookups(&self) -> Vec<String> {
        self.lookups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl GeocodingProvider for StaticGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, GeocodeError> {
        self.lookups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(address.to_string());

        if let Some(reason) = &self.failure {
            return Err(GeocodeError::Transport(reason.clone()));
        }
        Ok(self.places.get(address).copied())
    }
}

#[derive(Debug, Default)]
struct Script {
    pending: VecDeque<Result<Coordinate, PositionError>>,
    last: Option<Result<Coordinate, PositionError>>,
    calls: usize,
}

/// Position provider that replays a scripted sequence of fixes.
///
/// The final entry repeats once the script runs out. An empty script reports
/// that geolocation is unsupported.
#[derive(Debug, Default)]
pub struct ScriptedPositions {
    script: Mutex<Script>,
}

impl ScriptedPositions {
    /// Create a provider replaying `script` in order.
    #[must_use]
    pub fn new(script: impl IntoIterator<Item = Result<Coordinate, PositionError>>) -> Self {
        Self {
            script: Mutex::new(Script {
                pending: script.into_iter().collect(),
                ..Script::default()
            }),
        }
    }

    /// Append another entry to the script.
    pub fn push(&self, next: Result<Coordinate, PositionError>) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .push_back(next);
    }

    /// Number of position requests served.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .calls
    }
}

#[async_trait]
impl PositionProvider for ScriptedPositions {
    async fn current_position(&self) -> Result<Coordinate, PositionError> {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        script.calls += 1;
        if let Some(next) = script.pending.pop_front() {
            script.last = Some(next.clone());
            return next;
        }
        match &script.last {
            Some(last) => last.clone(),
            None => Err(PositionError::Unsupported),
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_err, assert_ok};

    use super::*;

    const MADURAI: Coordinate = Coordinate::new(9.9252, 78.1198);

    #[tokio::test]
    async fn test_static_geocoder_lookup() {
        let geocoder = StaticGeocoder::new().with_place("Madurai, Tamil Nadu", MADURAI);

        assert_eq!(
            assert_ok!(geocoder.geocode("Madurai, Tamil Nadu").await),
            Some(MADURAI)
        );
        assert_eq!(assert_ok!(geocoder.geocode("Madurai").await), None);
        assert_eq!(geocoder.lookups(), ["Madurai, Tamil Nadu", "Madurai"]);
    }

    #[tokio::test]
    async fn test_unreachable_geocoder() {
        let geocoder = StaticGeocoder::unreachable("dns failure");
        let err = assert_err!(geocoder.geocode("Madurai, Tamil Nadu").await);
        assert_eq!(err, GeocodeError::Transport("dns failure".to_string()));
    }

    #[tokio::test]
    async fn test_script_repeats_last_entry() {
        let timeout = PositionError::Timeout("Geolocation error: 3 - Timeout expired".to_string());
        let positions = ScriptedPositions::new([Err(timeout.clone()), Ok(MADURAI)]);

        assert_eq!(positions.current_position().await, Err(timeout));
        assert_eq!(positions.current_position().await, Ok(MADURAI));
        assert_eq!(positions.current_position().await, Ok(MADURAI));
        assert_eq!(positions.calls(), 3);
    }

    #[tokio::test]
    async fn test_empty_script_is_unsupported() {
        let positions = ScriptedPositions::default();
        assert_eq!(
            positions.current_position().await,
            Err(PositionError::Unsupported)
        );

        positions.push(Ok(MADURAI));
        assert_eq!(positions.current_position().await, Ok(MADURAI));
    }
}
