//! Section node location.
//!
//! Primary path asks the classifier; anything empty, malformed, or
//! code-shaped is discarded and the deterministic three-pass matcher takes
//! over. Missing sections are a normal outcome, not an error.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use lazy_static::lazy_static;

use bt_core::types::{Node, Section};
use bt_core::{RunContext, SectionClassifier};

use crate::strip_markup;

lazy_static! {
    static ref SECTION_SYNONYMS: HashMap<&'static str, Vec<&'static str>> = {
        let mut map = HashMap::new();
        map.insert(
            "DOK4",
            vec!["spiky pov", "spiky povs", "spiky point of view", "dok 4"],
        );
        map.insert("DOK3", vec!["insights", "insight", "dok 3"]);
        map
    };
}

/// Tokens that mark a classifier answer as code or prose, not an id list.
const SUSPICIOUS_TOKENS: &[&str] = &[
    "def ", "function", "import ", "return ", "```", "{", "}", "</", "print(", "console.",
];
const MAX_ANSWER_LEN: usize = 200;

pub struct NodeLocator {
    classifier: Arc<dyn SectionClassifier>,
}

impl NodeLocator {
    pub fn new(classifier: Arc<dyn SectionClassifier>) -> Self {
        Self { classifier }
    }

    /// Node ids matching the section label. Empty means "section not found";
    /// classifier trouble of any kind silently degrades to the fallback.
    pub async fn locate(&self, ctx: &RunContext, section: Section, candidates: &[Node]) -> Vec<String> {
        match self.classifier.classify(section.label(), candidates).await {
            Ok(answer) => {
                if let Some(ids) = accept_answer(&answer, candidates) {
                    ctx.debug(&format!(
                        "🤖 classifier matched {} node(s) for {}",
                        ids.len(),
                        section
                    ));
                    return ids;
                }
                ctx.debug(&format!(
                    "classifier gave no usable answer for {}, using fallback matcher",
                    section
                ));
            }
            Err(e) => {
                ctx.debug(&format!(
                    "classifier failed for {} ({}), using fallback matcher",
                    section, e
                ));
            }
        }
        self.fallback(ctx, section, candidates)
    }

    /// Exact name match, then synonym substring, then raw label containment.
    fn fallback(&self, ctx: &RunContext, section: Section, candidates: &[Node]) -> Vec<String> {
        let cleaned: Vec<(&str, String)> = candidates
            .iter()
            .map(|n| (n.id.as_str(), strip_markup(&n.name).trim().to_lowercase()))
            .collect();

        let label = section.label().to_lowercase();
        let display = section.display_name().to_lowercase();

        let exact: Vec<String> = cleaned
            .iter()
            .filter(|(_, name)| *name == label || *name == display)
            .map(|(id, _)| id.to_string())
            .collect();
        if !exact.is_empty() {
            ctx.debug(&format!("🎯 exact name match for {}", section));
            return exact;
        }

        if let Some(synonyms) = SECTION_SYNONYMS.get(section.label()) {
            let by_synonym: Vec<String> = cleaned
                .iter()
                .filter(|(_, name)| synonyms.iter().any(|syn| name.contains(syn)))
                .map(|(id, _)| id.to_string())
                .collect();
            if !by_synonym.is_empty() {
                ctx.debug(&format!("🎯 synonym match for {}", section));
                return by_synonym;
            }
        }

        cleaned
            .iter()
            .filter(|(_, name)| name.contains(&label))
            .map(|(id, _)| id.to_string())
            .collect()
    }
}

/// Validates a raw classifier answer: non-empty, not code-shaped, and every
/// comma-separated id present among the candidates.
fn accept_answer(answer: &str, candidates: &[Node]) -> Option<Vec<String>> {
    let trimmed = answer.trim();
    if trimmed.is_empty() || is_suspicious(trimmed) {
        return None;
    }
    let known: HashSet<&str> = candidates.iter().map(|n| n.id.as_str()).collect();
    let ids: Vec<String> = trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if ids.is_empty() || !ids.iter().all(|id| known.contains(id.as_str())) {
        return None;
    }
    Some(ids)
}

fn is_suspicious(answer: &str) -> bool {
    answer.len() > MAX_ANSWER_LEN
        || SUSPICIOUS_TOKENS.iter().any(|token| answer.contains(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bt_core::{Error, Result};

    struct FixedClassifier(String);
    struct FailingClassifier;

    #[async_trait]
    impl SectionClassifier for FixedClassifier {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn classify(&self, _label: &str, _candidates: &[Node]) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    #[async_trait]
    impl SectionClassifier for FailingClassifier {
        fn name(&self) -> &str {
            "failing"
        }

        async fn classify(&self, _label: &str, _candidates: &[Node]) -> Result<String> {
            Err(Error::Classifier("model unavailable".to_string()))
        }
    }

    fn node(id: &str, name: &str) -> Node {
        Node {
            id: id.to_string(),
            name: name.to_string(),
            parent_id: None,
            note: None,
            order: 0,
        }
    }

    fn ctx() -> RunContext {
        RunContext::new("p1", "test")
    }

    fn locator(answer: &str) -> NodeLocator {
        NodeLocator::new(Arc::new(FixedClassifier(answer.to_string())))
    }

    #[tokio::test]
    async fn test_classifier_answer_accepted() {
        let candidates = vec![node("n1", "Spiky POV"), node("n2", "Notes")];
        let ids = locator("n1").locate(&ctx(), Section::Dok4, &candidates).await;
        assert_eq!(ids, vec!["n1"]);
    }

    #[tokio::test]
    async fn test_classifier_multi_id_answer() {
        let candidates = vec![node("n1", "Spiky POV"), node("n2", "Spiky POV old")];
        let ids = locator("n1, n2").locate(&ctx(), Section::Dok4, &candidates).await;
        assert_eq!(ids, vec!["n1", "n2"]);
    }

    #[tokio::test]
    async fn test_unknown_id_falls_back() {
        let candidates = vec![node("n1", "Spiky POV")];
        let ids = locator("bogus").locate(&ctx(), Section::Dok4, &candidates).await;
        // fallback still finds the section by exact name
        assert_eq!(ids, vec!["n1"]);
    }

    #[tokio::test]
    async fn test_suspicious_answer_rejected() {
        let candidates = vec![node("n1", "Spiky POV")];
        for bad in ["def match(): n1", "{\"id\": \"n1\"}", "</answer> n1"] {
            let ids = locator(bad).locate(&ctx(), Section::Dok4, &candidates).await;
            assert_eq!(ids, vec!["n1"], "answer {:?} should be discarded", bad);
        }
    }

    #[tokio::test]
    async fn test_classifier_error_degrades_silently() {
        let candidates = vec![node("n1", "Insights")];
        let locator = NodeLocator::new(Arc::new(FailingClassifier));
        let ids = locator.locate(&ctx(), Section::Dok3, &candidates).await;
        assert_eq!(ids, vec!["n1"]);
    }

    #[tokio::test]
    async fn test_exact_match_strips_markup() {
        let candidates = vec![node("n1", "<b>Spiky POV</b>"), node("n2", "Other")];
        let ids = locator("").locate(&ctx(), Section::Dok4, &candidates).await;
        assert_eq!(ids, vec!["n1"]);
    }

    #[tokio::test]
    async fn test_synonym_match() {
        let candidates = vec![node("n1", "All my spiky POVs live here")];
        let ids = locator("").locate(&ctx(), Section::Dok4, &candidates).await;
        assert_eq!(ids, vec!["n1"]);
    }

    #[tokio::test]
    async fn test_containment_match_is_last_resort() {
        let candidates = vec![node("n1", "misc DOK3 archive")];
        let ids = locator("").locate(&ctx(), Section::Dok3, &candidates).await;
        assert_eq!(ids, vec!["n1"]);
    }

    #[tokio::test]
    async fn test_no_match_returns_empty() {
        let candidates = vec![node("n1", "Groceries"), node("n2", "Travel plans")];
        let ids = locator("").locate(&ctx(), Section::Dok4, &candidates).await;
        assert!(ids.is_empty());
    }

    #[test]
    fn test_accept_answer_validation() {
        let candidates = vec![node("n1", "a"), node("n2", "b")];
        assert_eq!(accept_answer("n1", &candidates), Some(vec!["n1".to_string()]));
        assert_eq!(
            accept_answer(" n2 , n1 ", &candidates),
            Some(vec!["n2".to_string(), "n1".to_string()])
        );
        assert_eq!(accept_answer("", &candidates), None);
        assert_eq!(accept_answer("n1, n3", &candidates), None);
        assert_eq!(accept_answer(",,,", &candidates), None);
    }
}
