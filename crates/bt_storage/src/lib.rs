use std::sync::Arc;

use bt_core::{Error, Result, SnapshotStore, StateStore};

pub mod backends;

pub use backends::memory::{MemorySnapshotStore, MemoryStateStore};
pub use backends::rest::{RestSnapshotStore, RestStateStore};

/// Project state lives this long without a refresh.
pub const DEFAULT_STATE_TTL_DAYS: i64 = 90;
/// Scraped snapshots older than this are pruned; tweet snapshots are kept.
pub const SNAPSHOT_RETENTION_DAYS: i64 = 31;

pub fn create_state_store(backend: &str, base_url: Option<&str>) -> Result<Arc<dyn StateStore>> {
    match backend {
        "memory" => Ok(Arc::new(MemoryStateStore::new())),
        "rest" => {
            let url = base_url.ok_or_else(|| {
                Error::Storage("rest state store requires a backend URL".to_string())
            })?;
            Ok(Arc::new(RestStateStore::new(url)))
        }
        other => Err(Error::Storage(format!("Unknown storage backend: {}", other))),
    }
}

pub fn create_snapshot_store(backend: &str, base_url: Option<&str>) -> Result<Arc<dyn SnapshotStore>> {
    match backend {
        "memory" => Ok(Arc::new(MemorySnapshotStore::new())),
        "rest" => {
            let url = base_url.ok_or_else(|| {
                Error::Storage("rest snapshot store requires a backend URL".to_string())
            })?;
            Ok(Arc::new(RestSnapshotStore::new(url)))
        }
        other => Err(Error::Storage(format!("Unknown storage backend: {}", other))),
    }
}

pub mod prelude {
    pub use super::{create_snapshot_store, create_state_store};
    pub use bt_core::{SnapshotKind, SnapshotStore, StateStore};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_backends() {
        assert!(create_state_store("memory", None).is_ok());
        assert!(create_state_store("rest", Some("http://localhost:9000")).is_ok());
        assert!(create_state_store("rest", None).is_err());
        assert!(create_state_store("redis", None).is_err());
        assert!(create_snapshot_store("memory", None).is_ok());
        assert!(create_snapshot_store("bogus", None).is_err());
    }
}
