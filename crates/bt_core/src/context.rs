//! Per-project run context.
//!
//! Created once per project task and passed by reference to every sub-call,
//! so log lines stay correlated without any thread-local state.

use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub project_id: String,
    pub project_name: String,
}

impl RunContext {
    pub fn new(project_id: impl Into<String>, project_name: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            project_id: project_id.into(),
            project_name: project_name.into(),
        }
    }

    fn prefix(&self) -> String {
        let short_run = &self.run_id[..8.min(self.run_id.len())];
        format!("[{} {}]", self.project_name, short_run)
    }

    pub fn info(&self, message: &str) {
        tracing::info!("{} {}", self.prefix(), message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!("{} {}", self.prefix(), message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!("{} {}", self.prefix(), message);
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!("{} {}", self.prefix(), message);
    }
}
