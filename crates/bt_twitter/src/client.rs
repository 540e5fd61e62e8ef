//! HTTP client for the posting backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use bt_core::{CreatedThread, Error, PostingApi, Result, ThreadPostOutcome};

const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Serialize)]
struct CreateTweetRequest<'a> {
    text: &'a str,
    account_id: &'a str,
}

#[derive(Deserialize)]
struct CreateTweetResponse {
    tweet_id: String,
}

#[derive(Deserialize)]
struct PostTweetResponse {
    posted: bool,
}

#[derive(Serialize)]
struct CreateThreadRequest<'a> {
    tweets: &'a [String],
    account_id: &'a str,
}

pub struct HttpPostingApi {
    http: Client,
    base_url: String,
    api_key: String,
}

impl HttpPostingApi {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn check(prefix: &str, response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(Error::Posting(format!("{} ({}): {}", prefix, status, body)))
    }
}

#[async_trait]
impl PostingApi for HttpPostingApi {
    async fn create_tweet(&self, text: &str, account_id: &str) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/api/tweets", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&CreateTweetRequest { text, account_id })
            .send()
            .await?;
        let created: CreateTweetResponse =
            Self::check("create_tweet failed", response).await?.json().await?;
        Ok(created.tweet_id)
    }

    async fn post_tweet(&self, tweet_id: &str) -> Result<bool> {
        let response = self
            .http
            .post(format!("{}/api/tweets/{}/post", self.base_url, tweet_id))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        let posted: PostTweetResponse =
            Self::check("post_tweet failed", response).await?.json().await?;
        Ok(posted.posted)
    }

    async fn create_thread(&self, texts: &[String], account_id: &str) -> Result<CreatedThread> {
        let response = self
            .http
            .post(format!("{}/api/threads", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&CreateThreadRequest {
                tweets: texts,
                account_id,
            })
            .send()
            .await?;
        Ok(Self::check("create_thread failed", response)
            .await?
            .json()
            .await?)
    }

    async fn post_thread(&self, thread_id: &str) -> Result<ThreadPostOutcome> {
        let response = self
            .http
            .post(format!("{}/api/threads/{}/post", self.base_url, thread_id))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        Ok(Self::check("post_thread failed", response)
            .await?
            .json()
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shapes() {
        let create = CreateTweetRequest {
            text: "hello",
            account_id: "acct-1",
        };
        let value = serde_json::to_value(&create).unwrap();
        assert_eq!(value["text"], "hello");
        assert_eq!(value["account_id"], "acct-1");

        let texts = vec!["one".to_string(), "two".to_string()];
        let thread = CreateThreadRequest {
            tweets: &texts,
            account_id: "acct-1",
        };
        let value = serde_json::to_value(&thread).unwrap();
        assert_eq!(value["tweets"].as_array().unwrap().len(), 2);
    }
}
