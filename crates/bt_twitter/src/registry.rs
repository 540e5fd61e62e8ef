//! HTTP client for the project registry side of the backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use bt_core::types::Project;
use bt_core::{Error, ProjectRegistry, Result};

const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Deserialize)]
struct AccountResponse {
    account_id: String,
}

pub struct HttpProjectRegistry {
    http: Client,
    base_url: String,
    api_key: String,
}

impl HttpProjectRegistry {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: String) -> Result<T> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Registry(format!(
                "GET {} failed ({}): {}",
                path, status, body
            )));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ProjectRegistry for HttpProjectRegistry {
    async fn get_project(&self, project_id: &str) -> Result<Project> {
        self.get_json(format!("/api/projects/{}", project_id)).await
    }

    async fn get_all_active_projects(&self) -> Result<Vec<Project>> {
        self.get_json("/api/projects?active=true".to_string()).await
    }

    async fn get_account_id_for_project(&self, project_id: &str) -> Result<String> {
        let account: AccountResponse = self
            .get_json(format!("/api/projects/{}/account", project_id))
            .await?;
        Ok(account.account_id)
    }
}
