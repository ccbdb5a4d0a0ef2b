//! Geofence monitor state machine.

use std::sync::Arc;

use geofence_core::{
    Coordinate, GeocodingProvider, GeofenceError, MonitorConfig, NoticeStore, PositionProvider,
    ReminderId, ReminderStore, Route, SessionSnapshot, SessionState, distance_km, qualify_address,
    session::ReminderView, traits::PositionError,
};

const ADD_REMINDER_EMPTY: &str = "Please enter a reminder location.";
const ADD_REMINDER_UNRESOLVED: &str =
    "Could not geocode. Try a different spelling or add ', Tamil Nadu'.";
const START_PRECONDITION: &str = "Please set start, destination, and at least one reminder.";
const START_UNRESOLVED: &str = "Could not geocode start or destination.";

/// A reminder whose geofence was entered during a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub reminder_id: ReminderId,
    pub name: String,
    pub distance_km: f64,
}

/// Result of one polling tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Not monitoring; nothing was fetched.
    Idle,
    /// The position provider failed; reminders were not evaluated.
    PositionUnavailable(PositionError),
    /// Reminders were evaluated against a fresh position.
    Evaluated {
        position: Coordinate,
        alerts: Vec<Alert>,
    },
}

/// Why a lookup produced no coordinate.
enum LookupFailure {
    Unresolved,
    Transport(String),
}

/// Fire every armed reminder within `radius_km` of `here`.
///
/// Reminders are checked in insertion order and independently of each other;
/// already-triggered reminders are skipped.
pub fn evaluate(store: &mut ReminderStore, here: Coordinate, radius_km: f64) -> Vec<Alert> {
    let mut alerts = Vec::new();
    for reminder in store.armed_mut() {
        let distance = distance_km(here, reminder.location);
        tracing::debug!(reminder = %reminder.name, distance_km = distance, "Checked reminder");
        if distance <= radius_km && reminder.trigger() {
            alerts.push(Alert {
                reminder_id: reminder.id,
                name: reminder.name.clone(),
                distance_km: distance,
            });
        }
    }
    alerts
}

/// State machine tracking a user's position against their reminders.
///
/// The monitor never schedules itself: whoever owns it calls [`tick`] after
/// each poll delay (see [`crate::MonitorDriver`]).
///
/// [`tick`]: GeofenceMonitor::tick
pub struct GeofenceMonitor<G, P>
where
    G: GeocodingProvider,
    P: PositionProvider,
{
    geocoder: G,
    positions: P,
    config: MonitorConfig,
    state: SessionState,
    notices: Arc<NoticeStore>,
}

impl<G, P> GeofenceMonitor<G, P>
where
    G: GeocodingProvider,
    P: PositionProvider,
{
    /// Create an idle monitor with its own notice store.
    #[must_use]
    pub fn new(geocoder: G, positions: P, config: MonitorConfig) -> Self {
        let notices = Arc::new(NoticeStore::with_history_limit(config.history_limit));
        Self::with_notices(geocoder, positions, config, notices)
    }

    /// Create an idle monitor publishing into an existing notice store.
    #[must_use]
    pub fn with_notices(
        geocoder: G,
        positions: P,
        config: MonitorConfig,
        notices: Arc<NoticeStore>,
    ) -> Self {
        Self {
            geocoder,
            positions,
            config,
            state: SessionState::new(),
            notices,
        }
    }

    /// The notice channel this monitor publishes to.
    #[must_use]
    pub fn notices(&self) -> Arc<NoticeStore> {
        Arc::clone(&self.notices)
    }

    #[must_use]
    pub const fn config(&self) -> &MonitorConfig {
        &self.config
    }

    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn is_monitoring(&self) -> bool {
        self.state.is_monitoring()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot()
    }

    /// Geocode `input` and append it as a new reminder.
    ///
    /// Allowed in either state. The stored name is the qualified address.
    ///
    /// # Errors
    /// Returns `EmptyInput` for blank input and `GeocodeFailure` when the
    /// lookup fails. The store is unchanged in both cases.
    pub async fn add_reminder(&mut self, input: &str) -> Result<ReminderView, GeofenceError> {
        let Some(address) = qualify_address(input) else {
            self.notices.push_error(ADD_REMINDER_EMPTY);
            return Err(GeofenceError::EmptyInput);
        };

        let location = match self.lookup(&address).await {
            Ok(location) => location,
            Err(LookupFailure::Unresolved) => {
                self.notices.push_error(ADD_REMINDER_UNRESOLVED);
                return Err(GeofenceError::GeocodeFailure {
                    address,
                    reason: "no match".to_string(),
                });
            }
            Err(LookupFailure::Transport(reason)) => {
                self.notices.push_error(format!(
                    "Geocoding failed: {reason}. Check your internet or try again."
                ));
                return Err(GeofenceError::GeocodeFailure { address, reason });
            }
        };

        let reminder = self.state.reminders_mut().add(address, location);
        tracing::info!(id = %reminder.id, name = %reminder.name, %location, "Reminder added");
        let view = ReminderView::from(reminder);
        self.notices
            .push_success(format!("Added reminder for {}", view.name));
        Ok(view)
    }

    /// Resolve both endpoints and enter `Monitoring`.
    ///
    /// Preconditions are checked before any lookup. Starting while already
    /// monitoring records the new route and keeps alert latches as they are.
    ///
    /// # Errors
    /// Returns `InvalidStartCondition` for blank inputs or an empty reminder
    /// list, and `GeocodeFailure` if either endpoint fails to resolve. The
    /// session is unchanged on error.
    pub async fn start(&mut self, start: &str, destination: &str) -> Result<Route, GeofenceError> {
        let (Some(start), Some(destination)) =
            (qualify_address(start), qualify_address(destination))
        else {
            return Err(self.reject_start("start and destination are required"));
        };
        if self.state.reminders().is_empty() {
            return Err(self.reject_start("at least one reminder is required"));
        }

        let route = match self.resolve_route(&start, &destination).await {
            Ok(route) => route,
            Err((address, LookupFailure::Unresolved)) => {
                self.notices.push_error(START_UNRESOLVED);
                return Err(GeofenceError::GeocodeFailure {
                    address,
                    reason: "no match".to_string(),
                });
            }
            Err((address, LookupFailure::Transport(reason))) => {
                self.notices.push_error(format!("Error: {reason}"));
                return Err(GeofenceError::GeocodeFailure { address, reason });
            }
        };

        self.state.begin_monitoring(route)?;
        tracing::info!(
            start = %route.start,
            destination = %route.destination,
            reminders = self.state.reminders().len(),
            "Monitoring started"
        );
        self.notices.push_success("Monitoring started!");
        Ok(route)
    }

    /// Leave `Monitoring` and re-arm every reminder.
    pub fn stop(&mut self) {
        self.state.end_monitoring();
        tracing::info!("Monitoring stopped");
        self.notices.push_success("Monitoring stopped.");
    }

    /// Run one polling tick.
    ///
    /// Fetches the position, and if one is available records it and fires
    /// every armed reminder inside the alert radius. A failed fetch keeps the
    /// previous location and skips evaluation.
    pub async fn tick(&mut self) -> TickOutcome {
        if !self.state.is_monitoring() {
            return TickOutcome::Idle;
        }

        let position = match self.positions.current_position().await {
            Ok(position) if position.is_valid() => position,
            Ok(position) => {
                let err = PositionError::Unavailable(format!("Invalid position fix: {position}"));
                tracing::warn!(%position, "Discarding invalid position fix");
                self.notices.push_error(err.to_string());
                return TickOutcome::PositionUnavailable(err);
            }
            Err(err) => {
                tracing::warn!(error = %err, "Position unavailable");
                self.notices.push_error(err.to_string());
                return TickOutcome::PositionUnavailable(err);
            }
        };

        self.state.set_current_location(position);
        let alerts = evaluate(
            self.state.reminders_mut(),
            position,
            self.config.alert_radius_km,
        );
        for alert in &alerts {
            tracing::info!(
                reminder = %alert.name,
                distance_km = alert.distance_km,
                "Reminder triggered"
            );
            self.notices.push_toast(&alert.name, alert.distance_km);
        }
        tracing::debug!(%position, alerts = alerts.len(), "Tick complete");

        TickOutcome::Evaluated { position, alerts }
    }

    fn reject_start(&self, reason: &str) -> GeofenceError {
        tracing::warn!(reason, "Start rejected");
        self.notices.push_error(START_PRECONDITION);
        GeofenceError::InvalidStartCondition(reason.to_string())
    }

    async fn resolve_route(
        &self,
        start: &str,
        destination: &str,
    ) -> Result<Route, (String, LookupFailure)> {
        let start_at = self
            .lookup(start)
            .await
            .map_err(|e| (start.to_string(), e))?;
        let destination_at = self
            .lookup(destination)
            .await
            .map_err(|e| (destination.to_string(), e))?;
        Ok(Route {
            start: start_at,
            destination: destination_at,
        })
    }

    async fn lookup(&self, address: &str) -> Result<Coordinate, LookupFailure> {
        match self.geocoder.geocode(address).await {
            Ok(Some(location)) => Ok(location),
            Ok(None) => {
                tracing::warn!(address, "Address did not resolve");
                Err(LookupFailure::Unresolved)
            }
            Err(err) => {
                tracing::warn!(address, error = %err, "Geocoding failed");
                Err(LookupFailure::Transport(err.to_string()))
            }
        }
    }
}
