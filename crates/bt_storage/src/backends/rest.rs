//! REST-backed stores for the external key-value and blob services.
//!
//! Both services are externally consistent; the pipeline only performs point
//! reads and writes keyed by project id, never cross-key transactions.

use async_trait::async_trait;
use chrono::Duration;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use bt_core::types::ProjectState;
use bt_core::{Error, Result, SnapshotKind, SnapshotStore, StateStore};

#[derive(Serialize)]
struct PutStateRequest<'a> {
    state: &'a ProjectState,
    ttl_seconds: i64,
}

#[derive(Deserialize)]
struct PutSnapshotResponse {
    key: String,
}

#[derive(Deserialize)]
struct PruneResponse {
    removed: usize,
}

pub struct RestStateStore {
    http: Client,
    base_url: String,
}

impl RestStateStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }
}

async fn error_from(prefix: &str, response: reqwest::Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Error::Storage(format!("{} ({}): {}", prefix, status, body))
}

#[async_trait]
impl StateStore for RestStateStore {
    async fn get_state(&self, project_id: &str) -> Result<Option<ProjectState>> {
        let response = self
            .http
            .get(format!("{}/state/{}", self.base_url, project_id))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(error_from("get_state failed", response).await);
        }
        Ok(Some(response.json().await?))
    }

    async fn put_state(&self, project_id: &str, state: &ProjectState, ttl: Duration) -> Result<()> {
        let response = self
            .http
            .put(format!("{}/state/{}", self.base_url, project_id))
            .json(&PutStateRequest {
                state,
                ttl_seconds: ttl.num_seconds(),
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from("put_state failed", response).await);
        }
        Ok(())
    }
}

pub struct RestSnapshotStore {
    http: Client,
    base_url: String,
}

impl RestSnapshotStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl SnapshotStore for RestSnapshotStore {
    async fn put_snapshot(
        &self,
        project_id: &str,
        kind: SnapshotKind,
        payload: &serde_json::Value,
    ) -> Result<String> {
        let response = self
            .http
            .post(format!(
                "{}/snapshots/{}/{}",
                self.base_url, project_id, kind
            ))
            .json(payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from("put_snapshot failed", response).await);
        }
        let created: PutSnapshotResponse = response.json().await?;
        Ok(created.key)
    }

    async fn latest_snapshot(
        &self,
        project_id: &str,
        kind: SnapshotKind,
    ) -> Result<Option<serde_json::Value>> {
        let response = self
            .http
            .get(format!(
                "{}/snapshots/{}/{}/latest",
                self.base_url, project_id, kind
            ))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(error_from("latest_snapshot failed", response).await);
        }
        Ok(Some(response.json().await?))
    }

    async fn prune_snapshots(&self, older_than: Duration) -> Result<usize> {
        let response = self
            .http
            .delete(format!(
                "{}/snapshots/{}",
                self.base_url,
                SnapshotKind::Scraped
            ))
            .query(&[("older_than_days", older_than.num_days())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from("prune_snapshots failed", response).await);
        }
        let pruned: PruneResponse = response.json().await?;
        Ok(pruned.removed)
    }
}
