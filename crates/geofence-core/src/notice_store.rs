//! Broadcast + history notice store.

use std::{
    collections::VecDeque,
    sync::{PoisonError, RwLock},
};

use futures::{StreamExt, stream::BoxStream};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::Notice;

/// Default number of notices kept for late subscribers.
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

/// Notice store with broadcast and history support.
///
/// Delivery is fire-and-forget: pushing never blocks and nobody acknowledges.
/// A UI client that connects late gets the history once as a batch, kept
/// apart from the live notices that follow.
pub struct NoticeStore {
    history: RwLock<VecDeque<Notice>>,
    limit: usize,
    sender: broadcast::Sender<Notice>,
}

impl Default for NoticeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NoticeStore {
    /// Create a store with the default history limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Create a store keeping at most `limit` notices.
    #[must_use]
    pub fn with_history_limit(limit: usize) -> Self {
        let (sender, _) = broadcast::channel(1024);
        Self {
            history: RwLock::new(VecDeque::with_capacity(limit.min(32))),
            limit,
            sender,
        }
    }

    /// Push a notice to live listeners and history.
    ///
    /// The history lock is held across the broadcast, so a subscriber from
    /// [`history_and_stream`](Self::history_and_stream) sees each notice
    /// exactly once.
    pub fn push(&self, notice: Notice) {
        tracing::trace!(?notice, "Publishing notice");
        let mut history = self.history.write().unwrap_or_else(PoisonError::into_inner);
        let _ = self.sender.send(notice.clone()); // no listeners is fine

        if self.limit == 0 {
            return;
        }
        while history.len() >= self.limit {
            history.pop_front();
        }
        history.push_back(notice);
    }

    /// Push a proximity toast.
    pub fn push_toast(&self, reminder: impl Into<String>, distance_km: f64) {
        self.push(Notice::toast(reminder, distance_km));
    }

    /// Push a success message.
    pub fn push_success(&self, message: impl Into<String>) {
        self.push(Notice::success(message));
    }

    /// Push an error message.
    pub fn push_error(&self, message: impl Into<String>) {
        self.push(Notice::error(message));
    }

    /// Get a receiver for live notices.
    #[must_use]
    pub fn get_receiver(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }

    /// Snapshot of the history, oldest first.
    #[must_use]
    pub fn get_history(&self) -> Vec<Notice> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Past notices, oldest first, plus a stream of every later one.
    ///
    /// Lagged live notices are skipped.
    #[must_use]
    pub fn history_and_stream(&self) -> (Vec<Notice>, BoxStream<'static, Notice>) {
        let history = self.history.read().unwrap_or_else(PoisonError::into_inner);
        let rx = self.get_receiver();
        let past = history.iter().cloned().collect();
        drop(history);

        let live = BroadcastStream::new(rx).filter_map(|res| async move { res.ok() });
        (past, Box::pin(live))
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;

    use super::*;

    #[test]
    fn test_history_is_bounded() {
        let store = NoticeStore::with_history_limit(2);
        store.push_success("one");
        store.push_success("two");
        store.push_error("three");

        let history = store.get_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].message(), "two");
        assert_eq!(history[1].message(), "three");
    }

    #[test]
    fn test_zero_limit_keeps_nothing() {
        let store = NoticeStore::with_history_limit(0);
        store.push_success("dropped");
        assert!(store.get_history().is_empty());
    }

    #[tokio::test]
    async fn test_receiver_gets_live_notices() {
        let store = NoticeStore::new();
        let mut rx = store.get_receiver();
        store.push_toast("Bodi, Tamil Nadu", 0.5);

        let notice = rx.recv().await.unwrap();
        assert!(matches!(notice, Notice::Toast { .. }));
    }

    #[tokio::test]
    async fn test_history_and_stream_split_at_subscription() {
        let store = NoticeStore::new();
        store.push_success("before");

        let (history, mut stream) = store.history_and_stream();
        store.push_success("after");

        assert_eq!(history, [Notice::success("before")]);
        assert_eq!(stream.next().await.unwrap().message(), "after");
        assert!(stream.next().now_or_never().is_none());
    }
}
