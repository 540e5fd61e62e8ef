use async_trait::async_trait;

use bt_core::types::Node;
use bt_core::{Result, SectionClassifier};

/// Offline classifier that never answers. Useful for tests and local runs
/// where the fallback matcher should carry the whole load.
#[derive(Debug, Default)]
pub struct DummyClassifier;

impl DummyClassifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SectionClassifier for DummyClassifier {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn classify(&self, _label: &str, _candidates: &[Node]) -> Result<String> {
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dummy_always_declines() {
        let classifier = DummyClassifier::new();
        let answer = classifier.classify("DOK4", &[]).await.unwrap();
        assert!(answer.is_empty());
    }
}
