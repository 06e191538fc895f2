//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Snapshot store
//!
//! Holds the single live round behind an `Arc`. Publishing swaps the pointer
//! inside a watch channel; readers clone the `Arc` and keep a stable,
//! immutable view for as long as they need it.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use crate::error::{HealthzError, HealthzResult};
use crate::health::CheckRound;

/// Shared reference to a published round
pub type Snapshot = Arc<CheckRound>;

/// Latest published round, shared between the refresher and readers
#[derive(Clone)]
pub struct SnapshotStore {
    sender: Arc<watch::Sender<Snapshot>>,
}

impl SnapshotStore {
    /// Create a store holding the uninitialized placeholder
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(Arc::new(CheckRound::uninitialized()));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Atomically replace the live snapshot
    pub fn publish(&self, round: CheckRound) {
        let sequence = round.sequence;
        let previous = self.sender.send_replace(Arc::new(round));
        debug!(
            "Published snapshot {} (replacing {})",
            sequence, previous.sequence
        );
    }

    /// Current snapshot
    pub fn read(&self) -> Snapshot {
        Arc::clone(&self.sender.borrow())
    }

    /// Whether a real round has been published
    pub fn is_initialized(&self) -> bool {
        self.sender.borrow().is_initialized()
    }

    /// Receiver notified on every publish
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.sender.subscribe()
    }

    /// Wait until the first real round has been published
    pub async fn wait_initialized(&self) -> HealthzResult<Snapshot> {
        let mut receiver = self.subscribe();
        let snapshot = receiver
            .wait_for(|snapshot| snapshot.is_initialized())
            .await
            .map_err(|_| HealthzError::SnapshotClosed)?;
        Ok(Arc::clone(&snapshot))
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::CheckResult;

    fn round(sequence: u64, ok: bool) -> CheckRound {
        CheckRound::new(
            sequence,
            vec![CheckResult::new("db_connection", ok, "db")],
            Vec::new(),
            vec![CheckResult::new("external_api/sms", true, "sms")],
            Vec::new(),
        )
    }

    #[test]
    fn test_read_before_publish_returns_placeholder() {
        let store = SnapshotStore::new();
        let snapshot = store.read();

        assert!(!store.is_initialized());
        assert!(!snapshot.is_initialized());
        assert!(snapshot.critical_results.is_empty());
        assert!(snapshot.dependent_results.is_empty());
        assert!(snapshot.independent_results.is_empty());
        assert_eq!(snapshot.produced_at.timestamp(), 0);
    }

    #[test]
    fn test_publish_replaces_snapshot() {
        let store = SnapshotStore::new();
        store.publish(round(1, true));
        store.publish(round(2, false));

        let snapshot = store.read();
        assert_eq!(snapshot.sequence, 2);
        assert!(!snapshot.overall_ok);
        assert!(store.is_initialized());
    }

    #[test]
    fn test_reader_keeps_stable_reference() {
        let store = SnapshotStore::new();
        store.publish(round(1, true));

        let held = store.read();
        store.publish(round(2, false));

        assert_eq!(held.sequence, 1);
        assert!(held.overall_ok);
        assert_eq!(store.read().sequence, 2);
    }

    #[test]
    fn test_clones_share_state() {
        let store = SnapshotStore::new();
        let reader = store.clone();
        store.publish(round(7, true));
        assert_eq!(reader.read().sequence, 7);
    }

    #[tokio::test]
    async fn test_wait_initialized() {
        let store = SnapshotStore::new();
        let writer = store.clone();

        let waiter = tokio::spawn(async move { store.wait_initialized().await });
        tokio::task::yield_now().await;
        writer.publish(round(1, true));

        let snapshot = waiter.await.unwrap().unwrap();
        assert_eq!(snapshot.sequence, 1);
    }
}
