//! Routes client messages to the monitor driver and position feed.

use std::sync::Arc;

use futures::{StreamExt, stream::BoxStream};
use geofence_core::NoticeStore;
use geofence_monitor::{DriverError, MonitorHandle};
use geofence_providers::{PositionFeed, PositionReport};

use crate::protocol::{ClientMessage, ServerMessage};

/// Client message dispatcher shared by every connection.
///
/// Rejections are not echoed back: the monitor already published them as
/// notices. State-changing actions answer with a fresh status.
#[derive(Clone)]
pub struct Dispatcher {
    monitor: MonitorHandle,
    positions: Arc<PositionFeed>,
}

impl Dispatcher {
    /// Create a dispatcher.
    #[must_use]
    pub const fn new(monitor: MonitorHandle, positions: Arc<PositionFeed>) -> Self {
        Self { monitor, positions }
    }

    /// Notice channel to forward to clients.
    #[must_use]
    pub fn notices(&self) -> Arc<NoticeStore> {
        self.monitor.notices()
    }

    /// Notices for a newly connected client.
    ///
    /// Past notices arrive as one `History` message; the stream carries only
    /// notices published afterwards.
    #[must_use]
    pub fn open_notices(&self) -> (ServerMessage, BoxStream<'static, ServerMessage>) {
        let (notices, live) = self.notices().history_and_stream();
        (
            ServerMessage::History { notices },
            live.map(ServerMessage::from).boxed(),
        )
    }

    /// Parse a raw text frame.
    ///
    /// `position` frames are read leniently: a garbled report still replaces
    /// the previous fix and reads as unavailable.
    ///
    /// # Errors
    /// Returns an `Error` message for the client if the frame is not valid.
    pub fn parse(text: &str) -> Result<ClientMessage, ServerMessage> {
        let value: serde_json::Value = serde_json::from_str(text).map_err(invalid)?;
        if value.get("type").and_then(serde_json::Value::as_str) == Some("position") {
            return Ok(ClientMessage::Position(PositionReport::from_value(&value)));
        }
        serde_json::from_value(value).map_err(invalid)
    }

    /// Handle one client message, returning the direct reply if any.
    pub async fn dispatch(&self, msg: ClientMessage) -> Option<ServerMessage> {
        let result = match msg {
            ClientMessage::Position(report) => {
                self.positions.report(report);
                return None;
            }
            ClientMessage::Ping => return Some(ServerMessage::Pong),
            ClientMessage::GetStatus => Ok(()),
            ClientMessage::AddReminder { name } => self.monitor.add_reminder(name).await.map(drop),
            ClientMessage::StartMonitoring { start, destination } => {
                self.monitor.start(start, destination).await.map(drop)
            }
            ClientMessage::StopMonitoring => self.monitor.stop().await,
        };

        match result {
            Ok(()) | Err(DriverError::Rejected(_)) => Some(self.status().await),
            Err(DriverError::Closed) => Some(closed()),
        }
    }

    async fn status(&self) -> ServerMessage {
        match self.monitor.snapshot().await {
            Ok(snapshot) => ServerMessage::Status { snapshot },
            Err(_) => closed(),
        }
    }
}

fn invalid(e: serde_json::Error) -> ServerMessage {
    tracing::warn!("Invalid client message: {e}");
    ServerMessage::Error {
        message: format!("Invalid message: {e}"),
    }
}

fn closed() -> ServerMessage {
    ServerMessage::Error {
        message: "Monitor is not running".to_string(),
    }
}
