//! Geofence monitor and its polling driver.
//!
//! Provides:
//! - `GeofenceMonitor` - Idle/Monitoring state machine and the tick algorithm
//! - `MonitorDriver` - Single-task, fixed-delay re-poll loop
//! - `MonitorHandle` - Cloneable entry point for UI actions

pub mod driver;
pub mod monitor;

pub use driver::{DriverError, MonitorDriver, MonitorHandle};
pub use monitor::{Alert, GeofenceMonitor, TickOutcome, evaluate};
