//! Position fixes reported by a browser or device client.
//!
//! The client pushes whatever its geolocation API produced; the monitor pulls
//! the latest report on each tick.

use std::{
    sync::{PoisonError, RwLock},
    time::Duration,
};

use async_trait::async_trait;
use geofence_core::{Coordinate, PositionProvider, traits::PositionError};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Oldest report still served as the current position.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(10);

const GEOLOCATION_FAILED: &str = "Geolocation failed. Please ensure permissions are granted.";

const STALE_REPORT: &str = "Geolocation timed out";

/// Raw geolocation callback payload: `{latitude, longitude}` or `{error}`.
///
/// Any other shape, including an empty object, means "unavailable".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PositionReport {
    /// A successful fix.
    #[must_use]
    pub const fn fix(location: Coordinate) -> Self {
        Self {
            latitude: Some(location.latitude),
            longitude: Some(location.longitude),
            error: None,
        }
    }

    /// A failed fix with the client's error text.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Lenient parse of an arbitrary JSON value.
    #[must_use]
    pub fn from_value(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// Interpret the report. Coordinates win over an error field.
    ///
    /// # Errors
    /// Returns the classified client error, or `Unavailable` for an empty or
    /// partial report.
    pub fn into_result(self) -> Result<Coordinate, PositionError> {
        match self {
            Self {
                latitude: Some(latitude),
                longitude: Some(longitude),
                ..
            } => Ok(Coordinate::new(latitude, longitude)),
            Self {
                error: Some(error), ..
            } => Err(classify(error)),
            _ => Err(PositionError::Unavailable(GEOLOCATION_FAILED.to_string())),
        }
    }
}

/// Map browser geolocation error text onto [`PositionError`].
///
/// Browser codes: 1 permission denied, 2 position unavailable, 3 timeout.
fn classify(error: String) -> PositionError {
    let lower = error.to_ascii_lowercase();
    if lower.contains("not supported") {
        PositionError::Unsupported
    } else if lower.contains("denied") || lower.starts_with("geolocation error: 1 ") {
        PositionError::PermissionDenied(error)
    } else if lower.contains("timeout")
        || lower.contains("timed out")
        || lower.starts_with("geolocation error: 3 ")
    {
        PositionError::Timeout(error)
    } else {
        PositionError::Unavailable(error)
    }
}

struct Reported {
    result: Result<Coordinate, PositionError>,
    at: Instant,
}

/// Latest client-reported position, served to the monitor.
pub struct PositionFeed {
    latest: RwLock<Option<Reported>>,
    max_age: Duration,
}

impl Default for PositionFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionFeed {
    /// Create an empty feed with [`DEFAULT_MAX_AGE`].
    #[must_use]
    pub const fn new() -> Self {
        Self::with_max_age(DEFAULT_MAX_AGE)
    }

    /// Create an empty feed that treats older reports as timed out.
    #[must_use]
    pub const fn with_max_age(max_age: Duration) -> Self {
        Self {
            latest: RwLock::new(None),
            max_age,
        }
    }

    /// Record a client report, replacing the previous one.
    pub fn report(&self, report: PositionReport) {
        let result = report.into_result();
        match &result {
            Ok(location) => tracing::debug!(%location, "Position reported"),
            Err(err) => tracing::debug!(error = %err, "Position failure reported"),
        }
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = Some(Reported {
            result,
            at: Instant::now(),
        });
    }
}

#[async_trait]
impl PositionProvider for PositionFeed {
    async fn current_position(&self) -> Result<Coordinate, PositionError> {
        let latest = self.latest.read().unwrap_or_else(PoisonError::into_inner);
        match latest.as_ref() {
            None => Err(PositionError::Unavailable(
                "Unable to get current location.".to_string(),
            )),
            Some(reported) if reported.at.elapsed() > self.max_age => {
                Err(PositionError::Timeout(STALE_REPORT.to_string()))
            }
            Some(reported) => reported.result.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio_test::assert_ok;

    use super::*;

    const BODI: Coordinate = Coordinate::new(10.0102, 77.3510);
    const BROWSER_TIMEOUT: &str = "Geolocation error: 3 - Timeout expired";
    const GEOLOCATION_UNAVAILABLE: &str = "Geolocation error: 2 - Position unavailable";

    #[test]
    fn test_report_shapes() {
        let fix = PositionReport::from_value(&json!({ "latitude": 10.0102, "longitude": 77.351 }));
        assert_eq!(fix.into_result(), Ok(BODI));

        let denied = PositionReport::from_value(
            &json!({ "error": "Geolocation error: 1 - User denied Geolocation" }),
        );
        assert!(matches!(
            denied.into_result(),
            Err(PositionError::PermissionDenied(_))
        ));

        let unsupported = PositionReport::failure("Geolocation not supported by this browser");
        assert_eq!(unsupported.into_result(), Err(PositionError::Unsupported));

        let timeout = PositionReport::failure(BROWSER_TIMEOUT);
        assert_eq!(
            timeout.into_result(),
            Err(PositionError::Timeout(BROWSER_TIMEOUT.to_string()))
        );
    }

    #[test]
    fn test_unexpected_shapes_are_unavailable() {
        for value in [json!({}), json!(null), json!("oops"), json!({ "latitude": 1.0 })] {
            let result = PositionReport::from_value(&value).into_result();
            assert_eq!(
                result,
                Err(PositionError::Unavailable(GEOLOCATION_FAILED.to_string())),
                "{value}"
            );
        }
    }

    #[test]
    fn test_coordinates_win_over_error() {
        let report = PositionReport {
            latitude: Some(BODI.latitude),
            longitude: Some(BODI.longitude),
            error: Some("stale".to_string()),
        };
        assert_eq!(report.into_result(), Ok(BODI));
    }

    #[tokio::test]
    async fn test_feed_serves_latest() {
        let feed = PositionFeed::new();
        assert!(matches!(
            feed.current_position().await,
            Err(PositionError::Unavailable(_))
        ));

        feed.report(PositionReport::fix(BODI));
        assert_eq!(assert_ok!(feed.current_position().await), BODI);

        feed.report(PositionReport::failure(GEOLOCATION_UNAVAILABLE));
        assert_eq!(
            feed.current_position().await,
            Err(PositionError::Unavailable(GEOLOCATION_UNAVAILABLE.to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_expires_old_reports() {
        let feed = PositionFeed::with_max_age(Duration::from_secs(10));
        feed.report(PositionReport::fix(BODI));

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(feed.current_position().await, Ok(BODI));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(
            feed.current_position().await,
            Err(PositionError::Timeout(STALE_REPORT.to_string()))
        );
    }
}
