//! One project's scrape -> diff -> compose -> post run.
//!
//! Steps are strictly sequential within a project. Every storage write
//! failure is logged and swallowed; everything else surfaces as a project
//! error at the orchestrator boundary.

use std::sync::Arc;

use chrono::Duration;

use bt_core::types::{Project, ProjectResult, ProjectState, RunStatus, Section};
use bt_core::{
    OutlineSource, PostingApi, Result, RunContext, SectionClassifier, SnapshotKind, SnapshotStore,
    StateStore,
};
use bt_engine::{StateDiffEngine, ThreadComposer};
use bt_outline::{parser, NodeLocator};
use bt_storage::DEFAULT_STATE_TTL_DAYS;
use bt_twitter::{AccountRateLimiter, PostingSequencer};

pub struct ProjectPipeline {
    source: Arc<dyn OutlineSource>,
    locator: NodeLocator,
    state_store: Arc<dyn StateStore>,
    snapshot_store: Arc<dyn SnapshotStore>,
    sequencer: PostingSequencer,
    diff_engine: StateDiffEngine,
    composer: ThreadComposer,
}

impl ProjectPipeline {
    pub fn new(
        source: Arc<dyn OutlineSource>,
        classifier: Arc<dyn SectionClassifier>,
        state_store: Arc<dyn StateStore>,
        snapshot_store: Arc<dyn SnapshotStore>,
        posting_api: Arc<dyn PostingApi>,
        limiter: Arc<AccountRateLimiter>,
    ) -> Self {
        Self {
            source,
            locator: NodeLocator::new(classifier),
            state_store,
            snapshot_store,
            sequencer: PostingSequencer::new(posting_api, limiter),
            diff_engine: StateDiffEngine::new(),
            composer: ThreadComposer::new(),
        }
    }

    /// Runs one project end to end. Never returns an error: failures fold
    /// into the result so sibling projects keep going.
    pub async fn run_project(&self, project: &Project) -> ProjectResult {
        let ctx = RunContext::new(&project.project_id, &project.name);
        ctx.info("🚀 Starting project run");
        match self.run_inner(&ctx, project).await {
            Ok(result) => result,
            Err(e) => {
                ctx.error(&format!("💥 Project run failed: {}", e));
                ProjectResult::failed(project, e)
            }
        }
    }

    async fn run_inner(&self, ctx: &RunContext, project: &Project) -> Result<ProjectResult> {
        let nodes = self.source.fetch_outline(ctx, &project.url).await?;
        let previous = self.state_store.get_state(&project.project_id).await?;

        let mut new_state = ProjectState::empty();
        let mut sections_found = 0;
        for section in Section::all() {
            let ids = self.locator.locate(ctx, section, &nodes).await;
            if ids.is_empty() {
                ctx.warn(&format!("⚠️ Section {} not found, skipping", section));
                continue;
            }
            sections_found += 1;
            let mut points = Vec::new();
            for id in &ids {
                let text = parser::outline_text(&nodes, id);
                points.extend(parser::parse_section(&text, section).points);
            }
            for (i, point) in points.iter_mut().enumerate() {
                point.point_number = i + 1;
            }
            ctx.info(&format!("📖 Parsed {} point(s) from {}", points.len(), section));
            new_state.set_section(section, points);
        }

        if sections_found == 0 {
            ctx.warn("⚠️ No tracked sections found in outline");
            return Ok(self.result(project, RunStatus::Skipped, 0, 0, 0, false));
        }

        self.write_snapshot(ctx, project, SnapshotKind::Scraped, serde_json::to_value(&new_state)?)
            .await;

        let Some(previous) = previous else {
            ctx.info("🌱 First run, establishing baseline without posting");
            self.write_state(ctx, project, &new_state).await;
            return Ok(self.result(project, RunStatus::Success, sections_found, 0, 0, true));
        };

        let mut tweets = Vec::new();
        for section in Section::all() {
            let diff = self
                .diff_engine
                .diff(previous.section(section), new_state.section(section));
            if diff.has_changes() {
                ctx.info(&format!(
                    "🔀 {}: {} added, {} updated, {} deleted, {} unchanged",
                    section,
                    diff.stats.added,
                    diff.stats.updated,
                    diff.stats.deleted,
                    diff.stats.unchanged
                ));
                tweets.extend(self.composer.compose(&diff, section, false));
            }
        }

        if tweets.is_empty() {
            ctx.info("✨ No changes detected");
            self.write_state(ctx, project, &new_state).await;
            return Ok(self.result(project, RunStatus::Success, sections_found, 0, 0, false));
        }

        self.write_snapshot(ctx, project, SnapshotKind::Tweets, serde_json::to_value(&tweets)?)
            .await;

        let summary = self
            .sequencer
            .post_all(ctx, &mut tweets, &project.account_id)
            .await?;

        // second snapshot carries the post-posting statuses and ids
        self.write_snapshot(ctx, project, SnapshotKind::Tweets, serde_json::to_value(&tweets)?)
            .await;
        self.write_state(ctx, project, &new_state).await;

        ctx.info(&format!(
            "✅ Posted {}/{} tweet(s), {} failed, {} deferred",
            summary.posted,
            tweets.len(),
            summary.failed,
            summary.deferred
        ));

        let status = if summary.failed == 0 {
            RunStatus::Success
        } else {
            RunStatus::Partial
        };
        Ok(self.result(project, status, sections_found, tweets.len(), summary.posted, false))
    }

    fn result(
        &self,
        project: &Project,
        status: RunStatus,
        sections_found: usize,
        tweets_composed: usize,
        tweets_posted: usize,
        first_run: bool,
    ) -> ProjectResult {
        ProjectResult {
            project_id: project.project_id.clone(),
            project_name: project.name.clone(),
            status,
            error: None,
            sections_found,
            tweets_composed,
            tweets_posted,
            first_run,
        }
    }

    async fn write_snapshot(
        &self,
        ctx: &RunContext,
        project: &Project,
        kind: SnapshotKind,
        payload: serde_json::Value,
    ) {
        if let Err(e) = self
            .snapshot_store
            .put_snapshot(&project.project_id, kind, &payload)
            .await
        {
            ctx.warn(&format!("⚠️ Failed to store {} snapshot: {}", kind, e));
        }
    }

    async fn write_state(&self, ctx: &RunContext, project: &Project, state: &ProjectState) {
        if let Err(e) = self
            .state_store
            .put_state(
                &project.project_id,
                state,
                Duration::days(DEFAULT_STATE_TTL_DAYS),
            )
            .await
        {
            ctx.warn(&format!("⚠️ Failed to store project state: {}", e));
        }
    }
}
