//! Ordered posting of composed tweets.
//!
//! Threads are created and posted as one unit, replies in ascending part
//! order because each links to the previous post. A failure inside one
//! thread stops that thread only; sibling threads and singles continue.
//! Rate-limit refusal leaves items pending for a later run.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bt_core::types::{ComposedTweet, TweetStatus};
use bt_core::{PostingApi, Result, RunContext};

use crate::ratelimit::AccountRateLimiter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostSummary {
    pub posted: usize,
    pub failed: usize,
    pub deferred: usize,
}

pub struct PostingSequencer {
    api: Arc<dyn PostingApi>,
    limiter: Arc<AccountRateLimiter>,
}

impl PostingSequencer {
    pub fn new(api: Arc<dyn PostingApi>, limiter: Arc<AccountRateLimiter>) -> Self {
        Self { api, limiter }
    }

    /// Posts every pending tweet through the backend, mutating statuses in
    /// place. Non-pending items are left untouched.
    pub async fn post_all(
        &self,
        ctx: &RunContext,
        tweets: &mut [ComposedTweet],
        account_id: &str,
    ) -> Result<PostSummary> {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, tweet) in tweets.iter().enumerate() {
            if tweet.status != TweetStatus::Pending {
                continue;
            }
            if !groups.contains_key(&tweet.thread_id) {
                order.push(tweet.thread_id.clone());
            }
            groups.entry(tweet.thread_id.clone()).or_default().push(idx);
        }

        let mut summary = PostSummary::default();
        for thread_id in order {
            let mut indices = groups.remove(&thread_id).unwrap_or_default();
            indices.sort_by_key(|&i| tweets[i].thread_part);
            if indices.len() == 1 {
                self.post_single(ctx, tweets, indices[0], account_id, &mut summary)
                    .await?;
            } else {
                self.post_thread(ctx, tweets, &indices, account_id, &mut summary)
                    .await?;
            }
        }
        Ok(summary)
    }

    async fn post_single(
        &self,
        ctx: &RunContext,
        tweets: &mut [ComposedTweet],
        idx: usize,
        account_id: &str,
        summary: &mut PostSummary,
    ) -> Result<()> {
        if !self.limiter.try_acquire(account_id, 1).await {
            ctx.info("⏳ Rate limit reached, deferring tweet to a later run");
            summary.deferred += 1;
            return Ok(());
        }

        let tweet_id = match self
            .api
            .create_tweet(&tweets[idx].content_formatted, account_id)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                ctx.warn(&format!("❌ Tweet create failed: {}", e));
                tweets[idx].advance(TweetStatus::Failed)?;
                summary.failed += 1;
                return Ok(());
            }
        };
        tweets[idx].twitter_id = Some(tweet_id.clone());
        tweets[idx].advance(TweetStatus::Created)?;

        match self.api.post_tweet(&tweet_id).await {
            Ok(true) => {
                tweets[idx].advance(TweetStatus::Posted)?;
                summary.posted += 1;
            }
            Ok(false) => {
                tweets[idx].advance(TweetStatus::CreatedNotPosted)?;
                summary.failed += 1;
            }
            Err(e) => {
                ctx.warn(&format!("❌ Tweet post failed: {}", e));
                tweets[idx].advance(TweetStatus::CreatedNotPosted)?;
                summary.failed += 1;
            }
        }
        Ok(())
    }

    async fn post_thread(
        &self,
        ctx: &RunContext,
        tweets: &mut [ComposedTweet],
        indices: &[usize],
        account_id: &str,
        summary: &mut PostSummary,
    ) -> Result<()> {
        // one backend request per constituent tweet
        if !self.limiter.try_acquire(account_id, indices.len() as u32).await {
            ctx.info(&format!(
                "⏳ Rate limit reached, deferring {}-part thread to a later run",
                indices.len()
            ));
            summary.deferred += indices.len();
            return Ok(());
        }

        let texts: Vec<String> = indices
            .iter()
            .map(|&i| tweets[i].content_formatted.clone())
            .collect();
        let created = match self.api.create_thread(&texts, account_id).await {
            Ok(created) => created,
            Err(e) => {
                ctx.warn(&format!("❌ Thread create failed: {}", e));
                for &i in indices {
                    tweets[i].advance(TweetStatus::Failed)?;
                }
                summary.failed += indices.len();
                return Ok(());
            }
        };

        for (slot, &i) in indices.iter().enumerate() {
            tweets[i].twitter_id = created.tweet_ids.get(slot).cloned();
            tweets[i].advance(TweetStatus::Created)?;
        }

        match self.api.post_thread(&created.thread_id).await {
            Ok(outcome) => {
                let posted: HashSet<&str> = outcome.posted.iter().map(String::as_str).collect();
                for &i in indices {
                    let went_out = tweets[i]
                        .twitter_id
                        .as_deref()
                        .map(|id| posted.contains(id))
                        .unwrap_or(false);
                    if went_out {
                        tweets[i].advance(TweetStatus::Posted)?;
                        summary.posted += 1;
                    } else {
                        tweets[i].advance(TweetStatus::CreatedNotPosted)?;
                        summary.failed += 1;
                    }
                }
            }
            Err(e) => {
                ctx.warn(&format!("❌ Thread post failed: {}", e));
                for &i in indices {
                    tweets[i].advance(TweetStatus::CreatedNotPosted)?;
                }
                summary.failed += indices.len();
            }
        }
        Ok(())
    }
}
