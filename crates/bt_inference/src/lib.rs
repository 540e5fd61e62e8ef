pub mod models;

pub use models::create_classifier;

/// Classifier construction settings.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub base_url: Option<String>,
}

pub mod prelude {
    pub use super::models::create_classifier;
    pub use super::Config;
    pub use bt_core::{Error, Result, SectionClassifier};
}
