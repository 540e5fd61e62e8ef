use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// A thread created on the backend: one handle plus per-tweet ids in
/// reply-chain order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedThread {
    pub thread_id: String,
    pub tweet_ids: Vec<String>,
}

/// Which tweets of a thread made it out. Posting stops at the first failing
/// reply, so `failed` plus anything unposted after it stays in `created`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadPostOutcome {
    pub posted: Vec<String>,
    pub failed: Vec<String>,
}

/// The external posting backend (tweet/thread CRUD plus publish).
#[async_trait]
pub trait PostingApi: Send + Sync {
    async fn create_tweet(&self, text: &str, account_id: &str) -> Result<String>;

    async fn post_tweet(&self, tweet_id: &str) -> Result<bool>;

    async fn create_thread(&self, texts: &[String], account_id: &str) -> Result<CreatedThread>;

    async fn post_thread(&self, thread_id: &str) -> Result<ThreadPostOutcome>;
}
