use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// The two tracked outline sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    #[serde(rename = "DOK3")]
    Dok3,
    #[serde(rename = "DOK4")]
    Dok4,
}

impl Section {
    pub fn label(&self) -> &'static str {
        match self {
            Section::Dok3 => "DOK3",
            Section::Dok4 => "DOK4",
        }
    }

    /// The human name the section carries in the outline itself.
    pub fn display_name(&self) -> &'static str {
        match self {
            Section::Dok3 => "Insights",
            Section::Dok4 => "Spiky POV",
        }
    }

    pub fn all() -> [Section; 2] {
        [Section::Dok4, Section::Dok3]
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single node of the raw outline tree, as returned by the content source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub note: Option<String>,
    #[serde(default)]
    pub order: i64,
}

/// One semantic content item inside a section: a main line plus its sub-lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    pub main_content: String,
    pub sub_points: Vec<String>,
    pub section: Section,
    pub point_number: usize,
    pub content_signature: String,
}

impl Point {
    /// Main content and sub-points joined into the text a tweet is built from.
    pub fn combined_content(&self) -> String {
        if self.sub_points.is_empty() {
            self.main_content.clone()
        } else {
            format!("{} {}", self.main_content, self.sub_points.join(" "))
        }
    }
}

/// Persisted per-project section state. Both keys are always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectState {
    pub dok4: Vec<Point>,
    pub dok3: Vec<Point>,
    pub last_updated: DateTime<Utc>,
}

impl ProjectState {
    pub fn empty() -> Self {
        Self {
            dok4: Vec::new(),
            dok3: Vec::new(),
            last_updated: Utc::now(),
        }
    }

    pub fn section(&self, section: Section) -> &[Point] {
        match section {
            Section::Dok3 => &self.dok3,
            Section::Dok4 => &self.dok4,
        }
    }

    pub fn set_section(&mut self, section: Section, points: Vec<Point>) {
        match section {
            Section::Dok3 => self.dok3 = points,
            Section::Dok4 => self.dok4 = points,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub unchanged: usize,
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
}

/// Descriptive label for an update pair. Does not influence classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeLabel {
    Updated,
    Modified,
    Replaced,
}

impl ChangeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeLabel::Updated => "updated",
            ChangeLabel::Modified => "modified",
            ChangeLabel::Replaced => "replaced",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeDetails {
    pub label: ChangeLabel,
    pub additions: usize,
    pub deletions: usize,
    pub unchanged: usize,
}

/// A previous/current pair reconciled into an update by similarity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePair {
    pub previous: Point,
    pub current: Point,
    pub similarity_score: f64,
    pub change_details: ChangeDetails,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffResult {
    pub added: Vec<Point>,
    pub updated: Vec<UpdatePair>,
    pub deleted: Vec<Point>,
    pub stats: DiffStats,
}

impl DiffResult {
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.updated.is_empty() || !self.deleted.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Updated,
    Deleted,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Added => "added",
            ChangeType::Updated => "updated",
            ChangeType::Deleted => "deleted",
        }
    }
}

/// Lifecycle of a composed tweet. Transitions outside the table are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TweetStatus {
    Pending,
    Created,
    Posted,
    Failed,
    CreatedNotPosted,
}

impl TweetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TweetStatus::Pending => "pending",
            TweetStatus::Created => "created",
            TweetStatus::Posted => "posted",
            TweetStatus::Failed => "failed",
            TweetStatus::CreatedNotPosted => "created_not_posted",
        }
    }

    pub fn can_transition(&self, next: TweetStatus) -> bool {
        matches!(
            (self, next),
            (TweetStatus::Pending, TweetStatus::Created)
                | (TweetStatus::Pending, TweetStatus::Failed)
                | (TweetStatus::Created, TweetStatus::Posted)
                | (TweetStatus::Created, TweetStatus::CreatedNotPosted)
        )
    }
}

impl fmt::Display for TweetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single length-bounded post unit, possibly one part of a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposedTweet {
    pub id: String,
    pub section: Section,
    pub change_type: ChangeType,
    pub content_raw: String,
    pub content_formatted: String,
    pub thread_id: String,
    pub thread_part: usize,
    pub total_thread_parts: usize,
    pub status: TweetStatus,
    pub similarity_score: Option<f64>,
    pub twitter_id: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ComposedTweet {
    pub fn is_thread(&self) -> bool {
        self.total_thread_parts > 1
    }

    /// Checked status transition.
    pub fn advance(&mut self, next: TweetStatus) -> Result<()> {
        if !self.status.can_transition(next) {
            return Err(Error::InvalidTransition(format!(
                "{} -> {} for tweet {}",
                self.status, next, self.id
            )));
        }
        self.status = next;
        if next == TweetStatus::Posted {
            self.posted_at = Some(Utc::now());
        }
        Ok(())
    }
}

/// A tracked brainlift document bound to one posting account.
///
/// The pipeline treats this as read-only; updates happen out-of-band through
/// the project registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub project_id: String,
    pub url: String,
    pub name: String,
    pub account_id: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(url: impl Into<String>, name: impl Into<String>, account_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            project_id: uuid::Uuid::new_v4().to_string(),
            url: url.into(),
            name: name.into(),
            account_id: account_id.into(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Partial,
    Failed,
    Skipped,
}

/// Outcome of one project's run, success or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectResult {
    pub project_id: String,
    pub project_name: String,
    pub status: RunStatus,
    pub error: Option<String>,
    pub sections_found: usize,
    pub tweets_composed: usize,
    pub tweets_posted: usize,
    pub first_run: bool,
}

impl ProjectResult {
    pub fn failed(project: &Project, error: impl fmt::Display) -> Self {
        Self {
            project_id: project.project_id.clone(),
            project_name: project.name.clone(),
            status: RunStatus::Failed,
            error: Some(error.to_string()),
            sections_found: 0,
            tweets_composed: 0,
            tweets_posted: 0,
            first_run: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub partial: usize,
    pub failed: usize,
    pub skipped: usize,
    pub results: Vec<ProjectResult>,
}

impl BatchSummary {
    pub fn from_results(results: Vec<ProjectResult>) -> Self {
        let count = |status: RunStatus| results.iter().filter(|r| r.status == status).count();
        Self {
            total: results.len(),
            succeeded: count(RunStatus::Success),
            partial: count(RunStatus::Partial),
            failed: count(RunStatus::Failed),
            skipped: count(RunStatus::Skipped),
            results,
        }
    }
}
