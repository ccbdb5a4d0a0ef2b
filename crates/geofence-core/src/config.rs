//! Monitor configuration.

use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::notice_store::DEFAULT_HISTORY_LIMIT;

/// Radius within which a reminder counts as reached.
pub const ALERT_RADIUS_KM: f64 = 1.0;

/// Delay between the end of one tick and the start of the next.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Operator-level settings for the monitor.
///
/// Every field defaults to the fixed behaviour; the end user never sees
/// these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Delay between ticks, in milliseconds on the wire.
    #[serde(with = "duration_ms", rename = "poll_interval_ms")]
    pub poll_interval: Duration,

    /// Alert radius in kilometers.
    pub alert_radius_km: f64,

    /// Notices retained for late UI clients.
    pub history_limit: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            alert_radius_km: ALERT_RADIUS_KM,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl MonitorConfig {
    /// Parse a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    /// Returns error if the JSON is malformed or a value is out of range.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&raw)?;
        tracing::debug!(path = %path.display(), "Loaded monitor config");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.alert_radius_km.is_finite() && self.alert_radius_km > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "alert_radius_km must be positive, got {}",
                self.alert_radius_km
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_err, assert_ok};

    use super::*;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert!((config.alert_radius_km - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "poll_interval_ms": 2000 }"#;
        let config = assert_ok!(MonitorConfig::from_json_str(json));
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn test_rejects_bad_radius() {
        let json = r#"{ "alert_radius_km": -1.0 }"#;
        let err = assert_err!(MonitorConfig::from_json_str(json));
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = assert_err!(MonitorConfig::from_path("/nonexistent/geofence.json"));
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let err = MonitorConfig::from_json_str(r#"{ "poll_interval_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
