//! User-visible notices.

use serde::{Deserialize, Serialize};

/// Transient message for the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// A reminder's geofence was entered.
    Toast {
        reminder: String,
        distance_km: f64,
        message: String,
    },
    /// An action succeeded.
    Success { message: String },
    /// A non-fatal failure.
    Error { message: String },
}

impl Notice {
    /// Proximity toast for a reminder, distance shown with two decimals.
    #[must_use]
    pub fn toast(reminder: impl Into<String>, distance_km: f64) -> Self {
        let reminder = reminder.into();
        let message = format!("Approaching {reminder}! Distance: {distance_km:.2} km");
        Self::Toast {
            reminder,
            distance_km,
            message,
        }
    }

    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::Success {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// The human-readable text.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Toast { message, .. } | Self::Success { message } | Self::Error { message } => {
                message
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_formats_two_decimals() {
        let notice = Notice::toast("Andipatti, Tamil Nadu", 0.804_9);
        assert_eq!(
            notice.message(),
            "Approaching Andipatti, Tamil Nadu! Distance: 0.80 km"
        );
    }

    #[test]
    fn test_serialized_kind_tag() {
        let json = serde_json::to_value(Notice::error("boom")).unwrap();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["message"], "boom");
    }
}
