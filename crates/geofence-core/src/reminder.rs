//! Reminders and the ordered store that holds them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Coordinate;

/// Reminder identifier.
pub type ReminderId = Uuid;

/// One-shot alert latch of a reminder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLatch {
    /// Waiting for the user to enter the radius.
    #[default]
    Armed,
    /// Already fired in this monitoring run.
    Triggered,
}

/// A named target point being monitored for proximity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    /// Unique reminder identifier.
    pub id: ReminderId,
    /// Display name (the qualified address that was geocoded).
    pub name: String,
    /// Resolved target location.
    pub location: Coordinate,
    latch: AlertLatch,
}

impl Reminder {
    /// Create a new armed reminder.
    #[must_use]
    pub fn new(name: impl Into<String>, location: Coordinate) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            location,
            latch: AlertLatch::Armed,
        }
    }

    /// Current latch state.
    #[must_use]
    pub const fn latch(&self) -> AlertLatch {
        self.latch
    }

    /// Whether the reminder already fired.
    #[must_use]
    pub fn is_alerted(&self) -> bool {
        self.latch == AlertLatch::Triggered
    }

    /// Fire the latch. Returns `false` if it had already fired.
    pub fn trigger(&mut self) -> bool {
        let was_armed = self.latch == AlertLatch::Armed;
        self.latch = AlertLatch::Triggered;
        was_armed
    }

    /// Re-arm the latch.
    pub fn rearm(&mut self) {
        self.latch = AlertLatch::Armed;
    }
}

/// Ordered collection of reminders.
///
/// Insertion order is display and evaluation order. Entries are never removed
/// and duplicates are kept as separate reminders.
#[derive(Debug, Clone, Default)]
pub struct ReminderStore {
    reminders: Vec<Reminder>,
}

impl ReminderStore {
    /// Create an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            reminders: Vec::new(),
        }
    }

    /// Append a new armed reminder.
    pub fn add(&mut self, name: impl Into<String>, location: Coordinate) -> &Reminder {
        self.reminders.push(Reminder::new(name, location));
        let last = self.reminders.len() - 1;
        &self.reminders[last]
    }

    /// All reminders in insertion order.
    #[must_use]
    pub fn list(&self) -> &[Reminder] {
        &self.reminders
    }

    /// Armed reminders in insertion order, mutably.
    pub fn armed_mut(&mut self) -> impl Iterator<Item = &mut Reminder> {
        self.reminders.iter_mut().filter(|r| !r.is_alerted())
    }

    /// Re-arm every reminder.
    pub fn reset_alerts(&mut self) {
        for reminder in &mut self.reminders {
            reminder.rearm();
        }
    }

    /// Number of reminders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reminders.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }
}
