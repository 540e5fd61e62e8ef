use async_trait::async_trait;

use crate::types::Node;
use crate::Result;

/// LLM-backed section classifier.
///
/// Returns the raw model answer: a single node id, or comma-joined ids for
/// multi-match queries. An empty answer means "no match". Callers must treat
/// any error or garbled output as "no answer" and fall back to deterministic
/// matching.
#[async_trait]
pub trait SectionClassifier: Send + Sync {
    fn name(&self) -> &str;

    async fn classify(&self, label: &str, candidates: &[Node]) -> Result<String>;
}
