use async_trait::async_trait;
use chrono::Duration;
use std::fmt;

use crate::types::ProjectState;
use crate::Result;

/// Kinds of timestamped snapshots kept per project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    Scraped,
    Tweets,
}

impl SnapshotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKind::Scraped => "scraped",
            SnapshotKind::Tweets => "tweets",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-project previous/current state. Absence of state means first run.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get_state(&self, project_id: &str) -> Result<Option<ProjectState>>;

    async fn put_state(&self, project_id: &str, state: &ProjectState, ttl: Duration) -> Result<()>;
}

/// Immutable, timestamped payload snapshots (scraped outlines, tweet batches).
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Stores a snapshot and returns its key.
    async fn put_snapshot(
        &self,
        project_id: &str,
        kind: SnapshotKind,
        payload: &serde_json::Value,
    ) -> Result<String>;

    async fn latest_snapshot(
        &self,
        project_id: &str,
        kind: SnapshotKind,
    ) -> Result<Option<serde_json::Value>>;

    /// Removes `Scraped` snapshots older than the cutoff. Tweet snapshots are
    /// kept indefinitely. Returns the number removed.
    async fn prune_snapshots(&self, older_than: Duration) -> Result<usize>;
}
