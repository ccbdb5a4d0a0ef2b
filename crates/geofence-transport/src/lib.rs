//! Transport layer for geofence UI clients.
//!
//! Provides:
//! - Wire protocol (JSON, `type`-tagged)
//! - `Dispatcher` mapping client actions onto the monitor driver
//! - WebSocket transport (feature: websocket)

pub mod dispatch;
pub mod protocol;

#[cfg(feature = "websocket")]
pub mod websocket;

pub use dispatch::Dispatcher;
pub use protocol::{ClientMessage, ServerMessage};
