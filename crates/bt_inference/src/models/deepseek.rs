use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use bt_core::types::Node;
use bt_core::{Error, Result, SectionClassifier};

use crate::Config;

const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
const CHAT_MODEL: &str = "deepseek-chat";

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

pub struct DeepSeekClassifier {
    client: Arc<Client>,
    api_key: String,
    base_url: String,
}

impl fmt::Debug for DeepSeekClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepSeekClassifier")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl DeepSeekClassifier {
    pub fn new(config: Config) -> Result<Self> {
        let api_key = config
            .api_key
            .ok_or_else(|| Error::Classifier("DeepSeek API key is required".to_string()))?;
        Ok(Self {
            client: Arc::new(Client::new()),
            api_key,
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    fn build_prompt(label: &str, candidates: &[Node]) -> String {
        let mut prompt = format!(
            "You match an outline section label to node names.\n\
             Label: {}\n\
             Candidate nodes:\n",
            label
        );
        for node in candidates {
            prompt.push_str(&format!("{}: {}\n", node.id, node.name));
        }
        prompt.push_str(
            "Reply with only the id of the matching node. If several match, \
             reply with their ids comma-separated. If none match, reply with \
             nothing at all.",
        );
        prompt
    }
}

#[async_trait]
impl SectionClassifier for DeepSeekClassifier {
    fn name(&self) -> &str {
        "DeepSeek"
    }

    async fn classify(&self, label: &str, candidates: &[Node]) -> Result<String> {
        let request = ChatRequest {
            model: CHAT_MODEL.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Self::build_prompt(label, candidates),
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?
            .json::<ChatResponse>()
            .await?;

        let answer = response
            .choices
            .first()
            .map(|choice| choice.message.content.trim().to_string())
            .unwrap_or_default();
        tracing::debug!("DeepSeek classified {} as {:?}", label, answer);
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        let result = DeepSeekClassifier::new(Config::default());
        assert!(result.is_err());

        let result = DeepSeekClassifier::new(Config {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        });
        assert!(result.is_ok());
    }

    #[test]
    fn test_prompt_lists_candidates() {
        let candidates = vec![
            Node {
                id: "n1".to_string(),
                name: "Spiky POV".to_string(),
                parent_id: None,
                note: None,
                order: 0,
            },
            Node {
                id: "n2".to_string(),
                name: "Insights".to_string(),
                parent_id: None,
                note: None,
                order: 1,
            },
        ];
        let prompt = DeepSeekClassifier::build_prompt("DOK4", &candidates);
        assert!(prompt.contains("Label: DOK4"));
        assert!(prompt.contains("n1: Spiky POV"));
        assert!(prompt.contains("n2: Insights"));
    }
}
