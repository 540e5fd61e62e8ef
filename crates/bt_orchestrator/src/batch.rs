//! Bounded parallel fan-out over projects.
//!
//! Fixed-size batches run concurrently, with a pause between batches to pace
//! the content source, the classifier, and the posting backend at once.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{info, warn};

use bt_core::types::{BatchSummary, Project};
use bt_core::SnapshotStore;
use bt_storage::SNAPSHOT_RETENTION_DAYS;

use crate::pipeline::ProjectPipeline;

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub batch_size: usize,
    pub delay_between_batches: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            delay_between_batches: Duration::from_secs(30),
        }
    }
}

pub struct BatchOrchestrator {
    pipeline: Arc<ProjectPipeline>,
    snapshot_store: Arc<dyn SnapshotStore>,
    config: BatchConfig,
}

impl BatchOrchestrator {
    pub fn new(
        pipeline: Arc<ProjectPipeline>,
        snapshot_store: Arc<dyn SnapshotStore>,
        config: BatchConfig,
    ) -> Self {
        Self {
            pipeline,
            snapshot_store,
            config,
        }
    }

    pub async fn run(&self, projects: &[Project]) -> BatchSummary {
        let batch_size = self.config.batch_size.max(1);
        let total_batches = projects.len().div_ceil(batch_size);
        let mut results = Vec::with_capacity(projects.len());

        for (i, batch) in projects.chunks(batch_size).enumerate() {
            info!(
                "🚚 Batch {}/{}: {} project(s)",
                i + 1,
                total_batches,
                batch.len()
            );
            let runs = batch.iter().map(|project| self.pipeline.run_project(project));
            results.extend(join_all(runs).await);
            if i + 1 < total_batches {
                tokio::time::sleep(self.config.delay_between_batches).await;
            }
        }

        match self
            .snapshot_store
            .prune_snapshots(chrono::Duration::days(SNAPSHOT_RETENTION_DAYS))
            .await
        {
            Ok(0) => {}
            Ok(removed) => info!("🧹 Pruned {} old scraped snapshot(s)", removed),
            Err(e) => warn!("⚠️ Snapshot retention sweep failed: {}", e),
        }

        let summary = BatchSummary::from_results(results);
        info!(
            "🏁 Run complete: {} succeeded, {} partial, {} failed, {} skipped of {}",
            summary.succeeded, summary.partial, summary.failed, summary.skipped, summary.total
        );
        for result in &summary.results {
            if let Some(error) = &result.error {
                warn!("  ❌ {}: {}", result.project_name, error);
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use bt_core::types::{Node, RunStatus};
    use bt_core::{
        CreatedThread, Error, OutlineSource, PostingApi, Result, RunContext, StateStore,
        ThreadPostOutcome,
    };
    use bt_inference::models::DummyClassifier;
    use bt_storage::{MemorySnapshotStore, MemoryStateStore};
    use bt_twitter::{AccountRateLimiter, RateLimiterConfig};

    struct MockSource {
        outlines: Mutex<HashMap<String, Vec<Node>>>,
    }

    impl MockSource {
        fn new() -> Self {
            Self {
                outlines: Mutex::new(HashMap::new()),
            }
        }

        fn set_outline(&self, url: &str, nodes: Vec<Node>) {
            self.outlines.lock().unwrap().insert(url.to_string(), nodes);
        }
    }

    #[async_trait]
    impl OutlineSource for MockSource {
        async fn fetch_outline(&self, _ctx: &RunContext, url: &str) -> Result<Vec<Node>> {
            self.outlines
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| Error::Scraping(format!("unreachable outline: {}", url)))
        }
    }

    struct MockPostingApi {
        fail_post: bool,
        counter: AtomicUsize,
    }

    impl MockPostingApi {
        fn new(fail_post: bool) -> Self {
            Self {
                fail_post,
                counter: AtomicUsize::new(0),
            }
        }

        fn next_id(&self) -> String {
            format!("tw-{}", self.counter.fetch_add(1, Ordering::SeqCst))
        }
    }

    #[async_trait]
    impl PostingApi for MockPostingApi {
        async fn create_tweet(&self, _text: &str, _account_id: &str) -> Result<String> {
            Ok(self.next_id())
        }

        async fn post_tweet(&self, _tweet_id: &str) -> Result<bool> {
            Ok(!self.fail_post)
        }

        async fn create_thread(&self, texts: &[String], _account_id: &str) -> Result<CreatedThread> {
            Ok(CreatedThread {
                thread_id: "th".to_string(),
                tweet_ids: texts.iter().map(|_| self.next_id()).collect(),
            })
        }

        async fn post_thread(&self, _thread_id: &str) -> Result<ThreadPostOutcome> {
            Ok(ThreadPostOutcome::default())
        }
    }

    fn node(id: &str, name: &str, parent: Option<&str>, order: i64) -> Node {
        Node {
            id: id.to_string(),
            name: name.to_string(),
            parent_id: parent.map(String::from),
            note: None,
            order,
        }
    }

    fn outline(dok4_point: &str, dok3_point: &str) -> Vec<Node> {
        vec![
            node("root", "Brainlift", None, 0),
            node("s4", "Spiky POV", Some("root"), 0),
            node("p1", dok4_point, Some("s4"), 0),
            node("p1a", "supporting evidence", Some("p1"), 0),
            node("s3", "Insights", Some("root"), 1),
            node("i1", dok3_point, Some("s3"), 0),
        ]
    }

    struct Harness {
        source: Arc<MockSource>,
        state_store: Arc<MemoryStateStore>,
        orchestrator: BatchOrchestrator,
    }

    fn harness(fail_post: bool, config: BatchConfig) -> Harness {
        let source = Arc::new(MockSource::new());
        let state_store = Arc::new(MemoryStateStore::new());
        let snapshot_store = Arc::new(MemorySnapshotStore::new());
        let pipeline = Arc::new(ProjectPipeline::new(
            source.clone(),
            Arc::new(DummyClassifier::new()),
            state_store.clone(),
            snapshot_store.clone(),
            Arc::new(MockPostingApi::new(fail_post)),
            Arc::new(AccountRateLimiter::new(RateLimiterConfig::default())),
        ));
        Harness {
            source,
            state_store,
            orchestrator: BatchOrchestrator::new(pipeline, snapshot_store, config),
        }
    }

    fn quick_config() -> BatchConfig {
        BatchConfig {
            batch_size: 5,
            delay_between_batches: Duration::from_millis(0),
        }
    }

    fn project(url: &str, name: &str) -> Project {
        Project::new(url, name, "acct-1")
    }

    #[tokio::test]
    async fn test_first_run_establishes_baseline_without_posting() {
        let h = harness(false, quick_config());
        let p = project("http://bl/one", "one");
        h.source.set_outline("http://bl/one", outline("Original claim", "Original insight"));

        let summary = h.orchestrator.run(std::slice::from_ref(&p)).await;
        assert_eq!(summary.succeeded, 1);
        let result = &summary.results[0];
        assert!(result.first_run);
        assert_eq!(result.tweets_composed, 0);
        assert_eq!(result.sections_found, 2);
        assert!(h.state_store.get_state(&p.project_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unchanged_second_run_posts_nothing() {
        let h = harness(false, quick_config());
        let p = project("http://bl/one", "one");
        h.source.set_outline("http://bl/one", outline("Claim", "Insight"));

        h.orchestrator.run(std::slice::from_ref(&p)).await;
        let summary = h.orchestrator.run(std::slice::from_ref(&p)).await;
        let result = &summary.results[0];
        assert_eq!(result.status, RunStatus::Success);
        assert!(!result.first_run);
        assert_eq!(result.tweets_composed, 0);
        assert_eq!(result.tweets_posted, 0);
    }

    #[tokio::test]
    async fn test_changed_outline_is_diffed_and_posted() {
        let h = harness(false, quick_config());
        let p = project("http://bl/one", "one");
        h.source.set_outline("http://bl/one", outline("The quick brown fox jumps", "Insight"));
        h.orchestrator.run(std::slice::from_ref(&p)).await;

        h.source.set_outline("http://bl/one", outline("The quick brown fox leaps", "Insight"));
        let summary = h.orchestrator.run(std::slice::from_ref(&p)).await;
        let result = &summary.results[0];
        assert_eq!(result.status, RunStatus::Success);
        assert_eq!(result.tweets_composed, 1);
        assert_eq!(result.tweets_posted, 1);

        // third run: the new state became the baseline
        let summary = h.orchestrator.run(std::slice::from_ref(&p)).await;
        assert_eq!(summary.results[0].tweets_composed, 0);
    }

    #[tokio::test]
    async fn test_project_failure_is_isolated() {
        let h = harness(false, quick_config());
        let good = project("http://bl/good", "good");
        let bad = project("http://bl/bad", "bad");
        h.source.set_outline("http://bl/good", outline("Claim", "Insight"));

        let summary = h.orchestrator.run(&[bad.clone(), good.clone()]).await;
        assert_eq!(summary.total, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.succeeded, 1);
        let failed = summary
            .results
            .iter()
            .find(|r| r.project_id == bad.project_id)
            .unwrap();
        assert!(failed.error.as_deref().unwrap().contains("unreachable"));
    }

    #[tokio::test]
    async fn test_outline_without_sections_is_skipped() {
        let h = harness(false, quick_config());
        let p = project("http://bl/none", "none");
        h.source.set_outline(
            "http://bl/none",
            vec![
                node("root", "Brainlift", None, 0),
                node("a", "Groceries", Some("root"), 0),
            ],
        );

        let summary = h.orchestrator.run(std::slice::from_ref(&p)).await;
        assert_eq!(summary.skipped, 1);
        assert!(h.state_store.get_state(&p.project_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_posting_failure_yields_partial() {
        let h = harness(true, quick_config());
        let p = project("http://bl/one", "one");
        h.source.set_outline("http://bl/one", outline("Claim v1", "Insight"));
        h.orchestrator.run(std::slice::from_ref(&p)).await;

        h.source.set_outline("http://bl/one", outline("Claim v2", "Insight"));
        let summary = h.orchestrator.run(std::slice::from_ref(&p)).await;
        let result = &summary.results[0];
        assert_eq!(result.status, RunStatus::Partial);
        assert_eq!(result.tweets_posted, 0);
        assert!(result.tweets_composed > 0);
    }

    #[tokio::test]
    async fn test_all_projects_processed_across_batches() {
        let h = harness(
            false,
            BatchConfig {
                batch_size: 2,
                delay_between_batches: Duration::from_millis(0),
            },
        );
        let mut projects = Vec::new();
        for i in 0..5 {
            let url = format!("http://bl/{}", i);
            h.source.set_outline(&url, outline("Claim", "Insight"));
            projects.push(project(&url, &format!("p{}", i)));
        }
        let summary = h.orchestrator.run(&projects).await;
        assert_eq!(summary.total, 5);
        assert_eq!(summary.succeeded, 5);
    }

    #[tokio::test]
    async fn test_deleted_point_produces_deleted_tweet() {
        let h = harness(false, quick_config());
        let p = project("http://bl/one", "one");
        h.source.set_outline("http://bl/one", outline("Claim", "Totally unrelated insight text"));
        h.orchestrator.run(std::slice::from_ref(&p)).await;

        // DOK3 point replaced with something dissimilar: one add plus one delete
        h.source.set_outline("http://bl/one", outline("Claim", "zzz qqq vvv www"));
        let summary = h.orchestrator.run(std::slice::from_ref(&p)).await;
        assert_eq!(summary.results[0].tweets_composed, 2);
    }
}
