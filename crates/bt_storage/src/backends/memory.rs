//! In-memory backends, used by tests and local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use bt_core::types::ProjectState;
use bt_core::{Result, SnapshotKind, SnapshotStore, StateStore};

struct StoredState {
    state: ProjectState,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct MemoryStateStore {
    entries: RwLock<HashMap<String, StoredState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get_state(&self, project_id: &str) -> Result<Option<ProjectState>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(project_id)
            .filter(|stored| stored.expires_at > Utc::now())
            .map(|stored| stored.state.clone()))
    }

    async fn put_state(&self, project_id: &str, state: &ProjectState, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            project_id.to_string(),
            StoredState {
                state: state.clone(),
                expires_at: Utc::now() + ttl,
            },
        );
        Ok(())
    }
}

struct StoredSnapshot {
    project_id: String,
    kind: SnapshotKind,
    taken_at: DateTime<Utc>,
    payload: serde_json::Value,
}

#[derive(Default)]
pub struct MemorySnapshotStore {
    snapshots: RwLock<Vec<StoredSnapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    async fn backdate_all(&self, by: Duration) {
        let mut snapshots = self.snapshots.write().await;
        for snapshot in snapshots.iter_mut() {
            snapshot.taken_at -= by;
        }
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn put_snapshot(
        &self,
        project_id: &str,
        kind: SnapshotKind,
        payload: &serde_json::Value,
    ) -> Result<String> {
        let taken_at = Utc::now();
        let key = format!("{}/{}/{}", project_id, kind, taken_at.timestamp_millis());
        let mut snapshots = self.snapshots.write().await;
        snapshots.push(StoredSnapshot {
            project_id: project_id.to_string(),
            kind,
            taken_at,
            payload: payload.clone(),
        });
        Ok(key)
    }

    async fn latest_snapshot(
        &self,
        project_id: &str,
        kind: SnapshotKind,
    ) -> Result<Option<serde_json::Value>> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots
            .iter()
            .filter(|s| s.project_id == project_id && s.kind == kind)
            .last()
            .map(|s| s.payload.clone()))
    }

    async fn prune_snapshots(&self, older_than: Duration) -> Result<usize> {
        let cutoff = Utc::now() - older_than;
        let mut snapshots = self.snapshots.write().await;
        let before = snapshots.len();
        snapshots.retain(|s| s.kind != SnapshotKind::Scraped || s.taken_at >= cutoff);
        Ok(before - snapshots.len())
    }
}
