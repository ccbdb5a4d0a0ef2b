//! Fixed-delay polling driver.
//!
//! One task owns the [`GeofenceMonitor`]. UI actions reach it as commands and
//! ticks run inline between them, so the session state is only ever touched
//! from that task and ticks never overlap.

use std::{future, sync::Arc};

use geofence_core::{
    GeocodingProvider, GeofenceError, NoticeStore, PositionProvider, Route, SessionSnapshot,
    session::ReminderView,
};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{Instant, sleep_until},
};

use crate::{GeofenceMonitor, TickOutcome};

const COMMAND_BUFFER: usize = 32;

/// Driver error.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error(transparent)]
    Rejected(#[from] GeofenceError),
    #[error("Monitor driver is not running")]
    Closed,
}

enum Command {
    AddReminder {
        name: String,
        reply: oneshot::Sender<Result<ReminderView, GeofenceError>>,
    },
    Start {
        start: String,
        destination: String,
        reply: oneshot::Sender<Result<Route, GeofenceError>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Shutdown,
}

/// Cloneable handle for sending UI actions to a running driver.
#[derive(Clone)]
pub struct MonitorHandle {
    tx: mpsc::Sender<Command>,
    notices: Arc<NoticeStore>,
}

impl MonitorHandle {
    /// Notice channel of the driven monitor.
    #[must_use]
    pub fn notices(&self) -> Arc<NoticeStore> {
        Arc::clone(&self.notices)
    }

    /// Add a reminder.
    ///
    /// # Errors
    /// Returns the monitor's rejection, or `Closed` if the driver stopped.
    pub async fn add_reminder(&self, name: impl Into<String>) -> Result<ReminderView, DriverError> {
        let name = name.into();
        self.request(|reply| Command::AddReminder { name, reply })
            .await?
            .map_err(DriverError::from)
    }

    /// Start monitoring.
    ///
    /// # Errors
    /// Returns the monitor's rejection, or `Closed` if the driver stopped.
    pub async fn start(
        &self,
        start: impl Into<String>,
        destination: impl Into<String>,
    ) -> Result<Route, DriverError> {
        let (start, destination) = (start.into(), destination.into());
        self.request(|reply| Command::Start {
            start,
            destination,
            reply,
        })
        .await?
        .map_err(DriverError::from)
    }

    /// Stop monitoring and re-arm all reminders.
    ///
    /// Takes effect between ticks, never in the middle of one.
    ///
    /// # Errors
    /// Returns `Closed` if the driver stopped.
    pub async fn stop(&self) -> Result<(), DriverError> {
        self.request(|reply| Command::Stop { reply }).await
    }

    /// Current session view.
    ///
    /// # Errors
    /// Returns `Closed` if the driver stopped.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, DriverError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Ask the driver task to exit.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown).await;
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, DriverError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| DriverError::Closed)?;
        rx.await.map_err(|_| DriverError::Closed)
    }
}

/// Runs a monitor's polling loop.
pub struct MonitorDriver<G, P>
where
    G: GeocodingProvider,
    P: PositionProvider,
{
    monitor: GeofenceMonitor<G, P>,
    commands: mpsc::Receiver<Command>,
    next_tick: Option<Instant>,
}

impl<G, P> MonitorDriver<G, P>
where
    G: GeocodingProvider + 'static,
    P: PositionProvider + 'static,
{
    /// Wrap a monitor; the driver does nothing until [`run`](Self::run).
    #[must_use]
    pub fn new(monitor: GeofenceMonitor<G, P>) -> (Self, MonitorHandle) {
        let (tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let handle = MonitorHandle {
            tx,
            notices: monitor.notices(),
        };
        let driver = Self {
            monitor,
            commands,
            next_tick: None,
        };
        (driver, handle)
    }

    /// Spawn the driver on the current runtime.
    #[must_use]
    pub fn spawn(monitor: GeofenceMonitor<G, P>) -> (MonitorHandle, JoinHandle<()>) {
        let (driver, handle) = Self::new(monitor);
        (handle, tokio::spawn(driver.run()))
    }

    /// Process commands and ticks until shut down or every handle is dropped.
    ///
    /// Entering `Monitoring` ticks immediately; after that each tick is
    /// scheduled `poll_interval` after the previous one finished.
    pub async fn run(mut self) {
        let interval = self.monitor.config().poll_interval;
        tracing::info!(?interval, "Monitor driver started");

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => {
                    let Some(command) = command else { break };
                    if !self.handle(command).await {
                        break;
                    }
                }
                () = wait_until(self.next_tick) => {
                    match self.monitor.tick().await {
                        TickOutcome::Evaluated { position, alerts } => {
                            tracing::debug!(%position, alerts = alerts.len(), "Tick evaluated");
                        }
                        TickOutcome::PositionUnavailable(err) => {
                            tracing::debug!(error = %err, "Tick skipped evaluation");
                        }
                        TickOutcome::Idle => {}
                    }
                    self.next_tick = self
                        .monitor
                        .is_monitoring()
                        .then(|| Instant::now() + interval);
                }
            }
        }

        tracing::info!("Monitor driver stopped");
    }

    /// Apply one command. Returns `false` on shutdown.
    async fn handle(&mut self, command: Command) -> bool {
        let was_monitoring = self.monitor.is_monitoring();
        match command {
            Command::AddReminder { name, reply } => {
                let _ = reply.send(self.monitor.add_reminder(&name).await);
            }
            Command::Start {
                start,
                destination,
                reply,
            } => {
                let _ = reply.send(self.monitor.start(&start, &destination).await);
            }
            Command::Stop { reply } => {
                self.monitor.stop();
                let _ = reply.send(());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.monitor.snapshot());
            }
            Command::Shutdown => return false,
        }

        match (was_monitoring, self.monitor.is_monitoring()) {
            (false, true) => self.next_tick = Some(Instant::now()),
            (_, false) => self.next_tick = None,
            (true, true) => {}
        }
        true
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use geofence_core::{Coordinate, MonitorConfig, MonitorStatus, Notice, traits::PositionError};
    use geofence_providers::{ScriptedPositions, StaticGeocoder};
    use tokio_test::{assert_err, assert_ok};

    use super::*;

    const THENI: Coordinate = Coordinate::new(10.0104, 77.4768);
    const MADURAI: Coordinate = Coordinate::new(9.9252, 78.1198);
    const ANDIPATTI: Coordinate = Coordinate::new(9.9981, 77.6214);

    fn spawn(positions: Arc<ScriptedPositions>) -> (MonitorHandle, JoinHandle<()>) {
        spawn_with(positions, MonitorConfig::default())
    }

    fn spawn_with(
        positions: Arc<ScriptedPositions>,
        config: MonitorConfig,
    ) -> (MonitorHandle, JoinHandle<()>) {
        let geocoder = StaticGeocoder::new()
            .with_place("Theni, Tamil Nadu", THENI)
            .with_place("Madurai, Tamil Nadu", MADURAI)
            .with_place("Andipatti, Tamil Nadu", ANDIPATTI);
        let monitor = GeofenceMonitor::new(geocoder, positions, config);
        MonitorDriver::spawn(monitor)
    }

    fn toast_count(handle: &MonitorHandle) -> usize {
        handle
            .notices()
            .get_history()
            .iter()
            .filter(|n| matches!(n, Notice::Toast { .. }))
            .count()
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_driver_never_polls() {
        let positions = Arc::new(ScriptedPositions::new([Ok(ANDIPATTI)]));
        let (handle, _task) = spawn(Arc::clone(&positions));

        assert_ok!(handle.add_reminder("Andipatti").await);
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(positions.calls(), 0);
        assert_eq!(
            assert_ok!(handle.snapshot().await).status,
            MonitorStatus::Idle
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_on_start_then_every_interval() {
        let positions = Arc::new(ScriptedPositions::new([Ok(THENI)]));
        let (handle, _task) = spawn(Arc::clone(&positions));

        assert_ok!(handle.add_reminder("Andipatti").await);
        assert_ok!(handle.start("Theni", "Madurai").await);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(positions.calls(), 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(positions.calls(), 2);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(positions.calls(), 3);

        let snapshot = assert_ok!(handle.snapshot().await);
        assert_eq!(snapshot.current_location, Some(THENI));
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_interval_sets_cadence() {
        let positions = Arc::new(ScriptedPositions::new([Ok(THENI)]));
        let config = MonitorConfig {
            poll_interval: Duration::from_secs(2),
            ..MonitorConfig::default()
        };
        let (handle, _task) = spawn_with(Arc::clone(&positions), config);

        assert_ok!(handle.add_reminder("Andipatti").await);
        assert_ok!(handle.start("Theni", "Madurai").await);

        tokio::time::sleep(Duration::from_millis(4_001)).await;
        assert_eq!(positions.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_ticks_inside_radius_alert_once() {
        let positions = Arc::new(ScriptedPositions::new([Ok(ANDIPATTI)]));
        let (handle, _task) = spawn(Arc::clone(&positions));
        let mut notices = handle.notices().get_receiver();

        assert_ok!(handle.add_reminder("Andipatti").await);
        assert_ok!(handle.start("Theni", "Madurai").await);

        tokio::time::sleep(Duration::from_millis(10_001)).await;
        assert_eq!(positions.calls(), 3);
        assert_eq!(toast_count(&handle), 1);

        let mut toasts = 0;
        while let Ok(notice) = notices.try_recv() {
            if matches!(notice, Notice::Toast { .. }) {
                toasts += 1;
            }
        }
        assert_eq!(toasts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_position_error_does_not_stop_polling() {
        let positions = Arc::new(ScriptedPositions::new([
            Err(PositionError::Timeout("Geolocation timed out".to_string())),
            Ok(ANDIPATTI),
        ]));
        let (handle, _task) = spawn(Arc::clone(&positions));

        assert_ok!(handle.add_reminder("Andipatti").await);
        assert_ok!(handle.start("Theni", "Madurai").await);

        tokio::time::sleep(Duration::from_millis(1)).await;
        let snapshot = assert_ok!(handle.snapshot().await);
        assert_eq!(snapshot.status, MonitorStatus::Monitoring);
        assert_eq!(snapshot.current_location, None);

        tokio::time::sleep(Duration::from_secs(5)).await;
        let snapshot = assert_ok!(handle.snapshot().await);
        assert_eq!(snapshot.current_location, Some(ANDIPATTI));
        assert!(snapshot.reminders[0].alerted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_ticks_and_rearms() {
        let positions = Arc::new(ScriptedPositions::new([Ok(ANDIPATTI)]));
        let (handle, _task) = spawn(Arc::clone(&positions));

        assert_ok!(handle.add_reminder("Andipatti").await);
        assert_ok!(handle.start("Theni", "Madurai").await);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_ok!(handle.stop().await);

        let calls = positions.calls();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(positions.calls(), calls);

        let snapshot = assert_ok!(handle.snapshot().await);
        assert_eq!(snapshot.status_label, "Idle");
        assert!(snapshot.reminders.iter().all(|r| !r.alerted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_start_keeps_driver_idle() {
        let positions = Arc::new(ScriptedPositions::new([Ok(ANDIPATTI)]));
        let (handle, _task) = spawn(Arc::clone(&positions));

        let err = assert_err!(handle.start("Theni", "Madurai").await);
        assert!(matches!(
            err,
            DriverError::Rejected(GeofenceError::InvalidStartCondition(_))
        ));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(positions.calls(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_closes_handle() {
        let (handle, task) = spawn(Arc::new(ScriptedPositions::default()));

        handle.shutdown().await;
        assert_ok!(task.await);

        let err = assert_err!(handle.snapshot().await);
        assert!(matches!(err, DriverError::Closed));
    }
}
