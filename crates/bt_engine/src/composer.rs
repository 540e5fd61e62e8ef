//! Turns a diff into ordered, length-bounded tweets.
//!
//! Every classified point becomes one thread: its combined text split into
//! chunks under the character budget, sentence boundaries preferred. Chunks
//! are exact substrings, so concatenating a thread's raw contents reproduces
//! the combined text.

use chrono::Utc;
use uuid::Uuid;

use bt_core::types::{ChangeType, ComposedTweet, DiffResult, Section, TweetStatus};

/// Room left under the platform limit for markers and thread suffixes.
pub const TWEET_CHAR_BUDGET: usize = 230;

#[derive(Debug, Clone)]
pub struct ThreadComposer {
    char_budget: usize,
}

impl Default for ThreadComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadComposer {
    pub fn new() -> Self {
        Self {
            char_budget: TWEET_CHAR_BUDGET,
        }
    }

    pub fn with_budget(char_budget: usize) -> Self {
        assert!(char_budget > 0);
        Self { char_budget }
    }

    /// Composes tweets for one section's diff. On a first run only additions
    /// are emitted, whatever else the diff carries.
    pub fn compose(
        &self,
        diff: &DiffResult,
        section: Section,
        is_first_run: bool,
    ) -> Vec<ComposedTweet> {
        let mut tweets = Vec::new();
        for added in &diff.added {
            tweets.extend(self.compose_point(
                section,
                ChangeType::Added,
                &added.combined_content(),
                None,
            ));
        }
        if is_first_run {
            return tweets;
        }
        for pair in &diff.updated {
            tweets.extend(self.compose_point(
                section,
                ChangeType::Updated,
                &pair.current.combined_content(),
                Some(pair.similarity_score),
            ));
        }
        for deleted in &diff.deleted {
            tweets.extend(self.compose_point(
                section,
                ChangeType::Deleted,
                &deleted.combined_content(),
                None,
            ));
        }
        tweets
    }

    fn compose_point(
        &self,
        section: Section,
        change_type: ChangeType,
        text: &str,
        similarity_score: Option<f64>,
    ) -> Vec<ComposedTweet> {
        let chunks = self.split_chunks(text);
        let total = chunks.len();
        let thread_id = Uuid::new_v4().to_string();
        let created_at = Utc::now();

        chunks
            .into_iter()
            .enumerate()
            .map(|(i, raw)| {
                let part = i + 1;
                let formatted = format_chunk(&raw, change_type, similarity_score, part, total);
                ComposedTweet {
                    id: Uuid::new_v4().to_string(),
                    section,
                    change_type,
                    content_formatted: formatted,
                    content_raw: raw,
                    thread_id: thread_id.clone(),
                    thread_part: part,
                    total_thread_parts: total,
                    status: TweetStatus::Pending,
                    similarity_score,
                    twitter_id: None,
                    posted_at: None,
                    created_at,
                }
            })
            .collect()
    }

    /// Splits into consecutive substrings of at most `char_budget` characters,
    /// cutting at the last sentence end in the window, else the last word
    /// boundary, else the budget itself.
    fn split_chunks(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() <= self.char_budget {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            if chars.len() - start <= self.char_budget {
                chunks.push(chars[start..].iter().collect());
                break;
            }
            let window = &chars[start..start + self.char_budget];
            let mut cut = sentence_cut(window)
                .or_else(|| word_cut(window))
                .unwrap_or(self.char_budget);
            // fold trailing whitespace into this chunk so the next starts clean
            while cut < window.len() && window[cut].is_whitespace() {
                cut += 1;
            }
            chunks.push(window[..cut].iter().collect());
            start += cut;
        }
        chunks
    }
}

/// Index just past the last sentence end inside the window, if any.
fn sentence_cut(window: &[char]) -> Option<usize> {
    let mut cut = None;
    for i in 0..window.len() {
        let terminal = matches!(window[i], '.' | '!' | '?');
        if terminal && (i + 1 == window.len() || window[i + 1].is_whitespace()) {
            cut = Some(i + 1);
        }
    }
    cut
}

/// Index just past the last whitespace run inside the window, if any.
fn word_cut(window: &[char]) -> Option<usize> {
    window
        .iter()
        .rposition(|c| c.is_whitespace())
        .map(|i| i + 1)
}

fn format_chunk(
    raw: &str,
    change_type: ChangeType,
    similarity_score: Option<f64>,
    part: usize,
    total: usize,
) -> String {
    if part == 1 {
        match change_type {
            ChangeType::Added => format!("ADDED: {}", raw),
            ChangeType::Updated => {
                let pct = (similarity_score.unwrap_or(0.0) * 100.0).round() as u32;
                format!("UPDATED ({}% similar): {}", pct, raw)
            }
            ChangeType::Deleted => format!("DELETED: {}", raw),
        }
    } else {
        format!("{} ({}/{})", raw.trim_start(), part, total)
    }
}
