//! Wire protocol for client-server communication.

use geofence_core::{Notice, SessionSnapshot};
use geofence_providers::PositionReport;
use serde::{Deserialize, Serialize};

/// Message from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Add a reminder by place name.
    AddReminder { name: String },
    /// Resolve the route endpoints and start monitoring.
    StartMonitoring { start: String, destination: String },
    /// Stop monitoring and re-arm all reminders.
    StopMonitoring,
    /// Result of the client's geolocation call.
    Position(PositionReport),
    /// Request a status snapshot.
    GetStatus,
    /// Ping for keepalive.
    Ping,
}

/// Message from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Proximity toast.
    Toast {
        reminder: String,
        distance_km: f64,
        message: String,
    },
    /// Action succeeded.
    Success { message: String },
    /// Non-fatal failure.
    Error { message: String },
    /// Current session state.
    Status { snapshot: SessionSnapshot },
    /// Notices published before this client connected. Not to be shown as
    /// fresh toasts.
    History { notices: Vec<Notice> },
    /// Pong response.
    Pong,
}

impl From<Notice> for ServerMessage {
    fn from(notice: Notice) -> Self {
        match notice {
            Notice::Toast {
                reminder,
                distance_km,
                message,
            } => Self::Toast {
                reminder,
                distance_km,
                message,
            },
            Notice::Success { message } => Self::Success { message },
            Notice::Error { message } => Self::Error { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use geofence_core::Coordinate;

    use super::*;

    #[test]
    fn test_parse_position_fix() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"position","latitude":9.9981,"longitude":77.6214}"#)
                .unwrap();
        let ClientMessage::Position(report) = msg else {
            panic!("Wrong message type");
        };
        assert_eq!(report.into_result(), Ok(Coordinate::new(9.9981, 77.6214)));
    }

    #[test]
    fn test_parse_position_error() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"position","error":"Geolocation not supported by this browser"}"#,
        )
        .unwrap();
        assert!(matches!(msg, ClientMessage::Position(ref r) if r.latitude.is_none()));
    }

    #[test]
    fn test_parse_start_monitoring() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"start_monitoring","start":"Theni","destination":"Madurai"}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::StartMonitoring {
                start: "Theni".to_string(),
                destination: "Madurai".to_string(),
            }
        );
    }

    #[test]
    fn test_history_serialization() {
        let msg = ServerMessage::History {
            notices: vec![Notice::toast("Bodi, Tamil Nadu", 0.3)],
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "history");
        assert_eq!(json["notices"][0]["kind"], "toast");
    }

    #[test]
    fn test_toast_serialization() {
        let msg = ServerMessage::from(Notice::toast("Andipatti, Tamil Nadu", 0.42));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "toast");
        assert_eq!(
            json["message"],
            "Approaching Andipatti, Tamil Nadu! Distance: 0.42 km"
        );
    }
}
