use std::sync::Arc;

use bt_core::{Error, Result, SectionClassifier};

use crate::Config;

pub mod deepseek;
pub mod dummy;

pub use deepseek::DeepSeekClassifier;
pub use dummy::DummyClassifier;

/// Builds the configured classifier. `dummy` always declines, which pushes
/// every lookup through the deterministic fallback matcher.
pub async fn create_classifier(config: Option<Config>) -> Result<Arc<dyn SectionClassifier>> {
    let config = config.unwrap_or_default();
    match config.model_name.as_deref() {
        Some("deepseek") => Ok(Arc::new(DeepSeekClassifier::new(config)?)),
        Some("dummy") | None => Ok(Arc::new(DummyClassifier::new())),
        Some(other) => Err(Error::Classifier(format!(
            "Unknown classifier model: {}",
            other
        ))),
    }
}
