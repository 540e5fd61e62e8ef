use async_trait::async_trait;

use crate::types::Project;
use crate::Result;

/// Read-only view of the project registry. Project mutation happens
/// out-of-band through the management API, never here.
#[async_trait]
pub trait ProjectRegistry: Send + Sync {
    async fn get_project(&self, project_id: &str) -> Result<Project>;

    async fn get_all_active_projects(&self) -> Result<Vec<Project>>;

    async fn get_account_id_for_project(&self, project_id: &str) -> Result<String>;
}
