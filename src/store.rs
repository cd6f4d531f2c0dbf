//! Canonical in-memory status store
//!
//! One authoritative mapping from station id to its latest known status.
//! The stream client is the only writer; the persistence task and anything
//! else that inspects the store read through `snapshot()`, which copies.
//! No operation ever removes an id.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::{ConnectorCounts, StationStatus};

/// Outcome of an upsert, so callers can apply their own update policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// An entry with this id existed and was replaced wholesale
    Replaced,
    /// No entry with this id existed; the value was inserted
    Inserted,
}

/// Shared handle to the canonical store
#[derive(Clone, Default)]
pub struct StatusStore {
    inner: Arc<RwLock<HashMap<String, StationStatus>>>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a full status set, replacing entries id-by-id. Ids already in
    /// the store but absent from `entries` are left untouched.
    pub async fn bulk_load(&self, entries: Vec<StationStatus>) {
        let mut map = self.inner.write().await;
        for entry in entries {
            map.insert(entry.id.clone(), entry);
        }
    }

    /// Replace the entry with the same id, or insert when none exists.
    /// Values are replaced wholesale; there is no field-level merge.
    pub async fn upsert(&self, entry: StationStatus) -> UpsertOutcome {
        let mut map = self.inner.write().await;
        match map.insert(entry.id.clone(), entry) {
            Some(_) => UpsertOutcome::Replaced,
            None => UpsertOutcome::Inserted,
        }
    }

    /// Point-in-time copy of all current values, safe to serialize while
    /// the store keeps mutating
    pub async fn snapshot(&self) -> Vec<StationStatus> {
        self.inner.read().await.values().cloned().collect()
    }

    /// Connector tally across the whole store
    pub async fn counts(&self) -> ConnectorCounts {
        ConnectorCounts::tally(self.inner.read().await.values())
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Connector, ConnectorStatus};

    fn station(id: &str, statuses: &[ConnectorStatus]) -> StationStatus {
        StationStatus {
            id: id.to_string(),
            status: ConnectorStatus::Available,
            connectors: statuses
                .iter()
                .enumerate()
                .map(|(i, &status)| Connector {
                    id: format!("{}-{}", id, i),
                    status,
                    error_code: 0,
                    observed_at: 1_700_000_000_000,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_snapshot_then_updates_is_last_write_wins() {
        let store = StatusStore::new();
        store
            .bulk_load(vec![
                station("A", &[ConnectorStatus::Available]),
                station("B", &[ConnectorStatus::Occupied]),
            ])
            .await;

        store.upsert(station("A", &[ConnectorStatus::Occupied])).await;
        store.upsert(station("A", &[ConnectorStatus::Error])).await;

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        let a = snapshot.iter().find(|s| s.id == "A").unwrap();
        assert_eq!(a.connectors[0].status, ConnectorStatus::Error);
    }

    #[tokio::test]
    async fn test_unknown_id_update_does_not_touch_other_entries() {
        let store = StatusStore::new();
        store
            .bulk_load(vec![
                station("A", &[ConnectorStatus::Available]),
                station("B", &[ConnectorStatus::Available]),
            ])
            .await;

        let outcome = store.upsert(station("C", &[ConnectorStatus::Occupied])).await;
        assert_eq!(outcome, UpsertOutcome::Inserted);

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 3);
        for id in ["A", "B"] {
            let entry = snapshot.iter().find(|s| s.id == id).unwrap();
            assert_eq!(entry.connectors[0].status, ConnectorStatus::Available);
        }
    }

    #[tokio::test]
    async fn test_bulk_load_leaves_absent_ids_untouched() {
        let store = StatusStore::new();
        store.bulk_load(vec![station("A", &[ConnectorStatus::Error])]).await;
        store.bulk_load(vec![station("B", &[ConnectorStatus::Available])]).await;

        assert_eq!(store.len().await, 2);
        let snapshot = store.snapshot().await;
        let a = snapshot.iter().find(|s| s.id == "A").unwrap();
        assert_eq!(a.connectors[0].status, ConnectorStatus::Error);
    }

    #[tokio::test]
    async fn test_snapshot_is_a_copy_not_a_view() {
        let store = StatusStore::new();
        store.bulk_load(vec![station("A", &[ConnectorStatus::Available])]).await;

        let before = store.snapshot().await;
        store.upsert(station("A", &[ConnectorStatus::Occupied])).await;

        assert_eq!(before[0].connectors[0].status, ConnectorStatus::Available);
        let after = store.snapshot().await;
        assert_eq!(after[0].connectors[0].status, ConnectorStatus::Occupied);
    }

    #[tokio::test]
    async fn test_counts_follow_updates() {
        let store = StatusStore::new();
        store
            .bulk_load(vec![
                station("A", &[ConnectorStatus::Available, ConnectorStatus::Occupied]),
                station("B", &[ConnectorStatus::Available, ConnectorStatus::Available]),
            ])
            .await;

        let counts = store.counts().await;
        assert_eq!(
            (counts.available, counts.occupied, counts.error, counts.unknown, counts.total),
            (3, 1, 0, 0, 4)
        );

        store
            .upsert(station("A", &[ConnectorStatus::Occupied, ConnectorStatus::Occupied]))
            .await;
        let counts = store.counts().await;
        assert_eq!((counts.available, counts.occupied), (2, 2));
    }
}
