//! Per-session state owned by the monitor.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    Coordinate,
    error::GeofenceError,
    reminder::{AlertLatch, Reminder, ReminderId, ReminderStore},
};

/// Monitoring status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorStatus {
    /// Not polling.
    #[default]
    Idle,
    /// Polling the position feed.
    Monitoring,
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("Idle"),
            Self::Monitoring => f.write_str("Monitoring..."),
        }
    }
}

/// Start and destination of a trip. Recorded for display only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub start: Coordinate,
    pub destination: Coordinate,
}

/// Mutable state of one user session.
///
/// `Monitoring` is only reachable through [`SessionState::begin_monitoring`],
/// which requires a route and at least one reminder.
#[derive(Debug, Default)]
pub struct SessionState {
    reminders: ReminderStore,
    current_location: Option<Coordinate>,
    status: MonitorStatus,
    route: Option<Route>,
}

impl SessionState {
    /// Create an idle session with no reminders.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn reminders(&self) -> &ReminderStore {
        &self.reminders
    }

    pub const fn reminders_mut(&mut self) -> &mut ReminderStore {
        &mut self.reminders
    }

    #[must_use]
    pub const fn current_location(&self) -> Option<Coordinate> {
        self.current_location
    }

    /// Record the latest position fix.
    pub const fn set_current_location(&mut self, location: Coordinate) {
        self.current_location = Some(location);
    }

    #[must_use]
    pub const fn status(&self) -> MonitorStatus {
        self.status
    }

    #[must_use]
    pub fn is_monitoring(&self) -> bool {
        self.status == MonitorStatus::Monitoring
    }

    #[must_use]
    pub const fn route(&self) -> Option<Route> {
        self.route
    }

    /// Enter `Monitoring` with the given route.
    ///
    /// # Errors
    /// Returns `InvalidStartCondition` when there are no reminders; the state
    /// is left untouched.
    pub fn begin_monitoring(&mut self, route: Route) -> Result<(), GeofenceError> {
        if self.reminders.is_empty() {
            return Err(GeofenceError::InvalidStartCondition(
                "at least one reminder is required".to_string(),
            ));
        }
        self.route = Some(route);
        self.status = MonitorStatus::Monitoring;
        Ok(())
    }

    /// Return to `Idle` and re-arm every reminder.
    ///
    /// The last route stays recorded.
    pub fn end_monitoring(&mut self) {
        self.status = MonitorStatus::Idle;
        self.reminders.reset_alerts();
    }

    /// Read-only view for the UI layer.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let reminders = self.reminders.list();
        SessionSnapshot {
            status: self.status,
            status_label: self.status.to_string(),
            current_location: self.current_location,
            route: self.route,
            reminders: reminders.iter().map(ReminderView::from).collect(),
        }
    }
}

/// Display row for a reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderView {
    pub id: ReminderId,
    pub name: String,
    pub location: Coordinate,
    pub alerted: bool,
}

impl From<&Reminder> for ReminderView {
    fn from(reminder: &Reminder) -> Self {
        Self {
            id: reminder.id,
            name: reminder.name.clone(),
            location: reminder.location,
            alerted: reminder.latch() == AlertLatch::Triggered,
        }
    }
}

/// Serializable view of a [`SessionState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: MonitorStatus,
    /// `Idle` or `Monitoring...`.
    pub status_label: String,
    pub current_location: Option<Coordinate>,
    pub route: Option<Route>,
    pub reminders: Vec<ReminderView>,
}
