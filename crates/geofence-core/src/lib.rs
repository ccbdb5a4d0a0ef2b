//! Core abstractions for proximity reminders.
//!
//! This crate provides the fundamental building blocks:
//! - `Coordinate` and great-circle `distance_km`
//! - `ReminderStore` - Ordered reminders with one-shot alert latches
//! - `SessionState` - Reminders, status, route and last known position
//! - `NoticeStore` - Broadcast + history for UI notices
//! - Geocoding and position provider traits

pub mod address;
pub mod config;
pub mod distance;
pub mod error;
pub mod geo;
pub mod notice;
pub mod notice_store;
pub mod reminder;
pub mod session;
pub mod traits;

pub use address::{REGION_QUALIFIER, qualify_address};
pub use config::MonitorConfig;
pub use distance::distance_km;
pub use error::GeofenceError;
pub use geo::Coordinate;
pub use notice::Notice;
pub use notice_store::NoticeStore;
pub use reminder::{AlertLatch, Reminder, ReminderId, ReminderStore};
pub use session::{MonitorStatus, Route, SessionSnapshot, SessionState};
pub use traits::{GeocodingProvider, PositionProvider};
