//! HTTP client for the outline content source.
//!
//! Authenticates once per client, downloads a shared document as a flat node
//! list, and splices in any auxiliary shared subtrees the root document
//! references.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use url::Url;

use bt_core::types::Node;
use bt_core::{Error, OutlineSource, Result, RunContext};

#[derive(Debug, Clone, Serialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct TreeNode {
    id: String,
    name: String,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    order: i64,
}

#[derive(Debug, Deserialize)]
struct SharedProjectRef {
    share_id: String,
    #[serde(default)]
    node_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TreeDataResponse {
    items: Vec<TreeNode>,
    #[serde(default)]
    shared_projects: Vec<SharedProjectRef>,
}

pub struct OutlineClient {
    http: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    session: RwLock<Option<String>>,
}

impl OutlineClient {
    pub fn new(base_url: impl Into<String>, username: Option<String>, password: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            username,
            password,
            session: RwLock::new(None),
        }
    }

    /// The share id is the last path segment of a brainlift URL.
    pub fn share_id_from_url(url: &str) -> Result<String> {
        let parsed = Url::parse(url)
            .map_err(|e| Error::Scraping(format!("Invalid brainlift URL {}: {}", url, e)))?;
        parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(String::from)
            .ok_or_else(|| Error::Scraping(format!("No share id in URL: {}", url)))
    }

    async fn ensure_session(&self) -> Result<Option<String>> {
        let (Some(username), Some(password)) = (self.username.clone(), self.password.clone())
        else {
            // anonymous share links need no session
            return Ok(None);
        };

        if let Some(session) = self.session.read().await.clone() {
            return Ok(Some(session));
        }

        let response = self
            .http
            .post(format!("{}/api/login", self.base_url))
            .json(&LoginRequest { username, password })
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Scraping(format!("Login failed ({}): {}", status, body)));
        }
        let login: LoginResponse = response.json().await?;
        *self.session.write().await = Some(login.session_id.clone());
        Ok(Some(login.session_id))
    }

    async fn get_tree_data(&self, session: Option<&str>, share_id: &str) -> Result<TreeDataResponse> {
        let mut request = self
            .http
            .get(format!("{}/get_tree_data", self.base_url))
            .query(&[("share_id", share_id)]);
        if let Some(session) = session {
            request = request.header("Authorization", format!("Bearer {}", session));
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Scraping(format!(
                "tree_data {} failed ({}): {}",
                share_id, status, body
            )));
        }
        Ok(response.json().await?)
    }

    /// Downloads the document plus one level of auxiliary shared subtrees.
    /// An unreadable auxiliary share is skipped, not fatal.
    pub async fn fetch_tree(&self, ctx: &RunContext, share_id: &str) -> Result<Vec<Node>> {
        let session = self.ensure_session().await?;
        let root = self.get_tree_data(session.as_deref(), share_id).await?;
        let mut nodes: Vec<Node> = root.items.into_iter().map(into_node).collect();
        ctx.info(&format!("📥 Fetched {} outline nodes", nodes.len()));

        for shared in root.shared_projects {
            match self.get_tree_data(session.as_deref(), &shared.share_id).await {
                Ok(aux) => {
                    let mut aux_nodes: Vec<Node> = aux.items.into_iter().map(into_node).collect();
                    for node in aux_nodes.iter_mut() {
                        if node.parent_id.is_none() {
                            node.parent_id = shared.node_id.clone();
                        }
                    }
                    ctx.debug(&format!(
                        "📎 Spliced {} nodes from shared subtree {}",
                        aux_nodes.len(),
                        shared.share_id
                    ));
                    nodes.append(&mut aux_nodes);
                }
                Err(e) => {
                    ctx.warn(&format!(
                        "⚠️ Skipping shared subtree {}: {}",
                        shared.share_id, e
                    ));
                }
            }
        }

        Ok(nodes)
    }
}

fn into_node(raw: TreeNode) -> Node {
    Node {
        id: raw.id,
        name: raw.name,
        parent_id: raw.parent_id,
        note: raw.note,
        order: raw.order,
    }
}

#[async_trait]
impl OutlineSource for OutlineClient {
    async fn fetch_outline(&self, ctx: &RunContext, url: &str) -> Result<Vec<Node>> {
        let share_id = Self::share_id_from_url(url)?;
        self.fetch_tree(ctx, &share_id).await
    }
}
